//! Reply templates
//!
//! Every user-facing sentence the router can produce. Skills pick a variant
//! and fill it with figures from tool results; English and Urdu text are
//! both rendered from the same variant, so the two never disagree on a
//! number.

use crate::models::{ErrorKind, Intent, RiskLevel, Slot, TransactionKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetLine {
    pub category: String,
    pub limit: f64,
    pub spent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskLine {
    pub title: String,
    pub due_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "template", rename_all = "snake_case")]
pub enum ReplyTemplate {
    Greeting,
    TransactionRecorded {
        amount: f64,
        currency: String,
        category: String,
        kind: TransactionKind,
        date: Option<String>,
    },
    BudgetSet {
        category: String,
        limit: f64,
        currency: String,
        period: Option<String>,
    },
    BudgetStatus {
        currency: String,
        lines: Vec<BudgetLine>,
    },
    SpendingSummary {
        total: f64,
        currency: String,
        category: Option<String>,
        period: Option<String>,
        transaction_count: u64,
    },
    InvestmentProjection {
        principal: f64,
        currency: String,
        months: u32,
        risk_level: RiskLevel,
        projected_value: f64,
        gain: f64,
    },
    TaskCreated {
        title: String,
        due_date: Option<String>,
    },
    TaskList {
        tasks: Vec<TaskLine>,
    },
    HealthScore {
        score: f64,
        grade: String,
    },
    NoData {
        topic: String,
    },
    Clarify {
        intent: Intent,
        missing: Vec<Slot>,
    },
    Rephrase,
    /// The requested projection horizon is beyond what the tool models.
    HorizonTooLong {
        max_months: u32,
    },
    OffTopicRedirect {
        advice_seeking: bool,
    },
    ServiceUnavailable,
    ProcessingFailed,
    Unsupported,
}

impl ReplyTemplate {
    pub fn for_error(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Transport => ReplyTemplate::ServiceUnavailable,
            ErrorKind::Validation => ReplyTemplate::ProcessingFailed,
            ErrorKind::LowConfidence => ReplyTemplate::Rephrase,
            ErrorKind::UnsupportedRequest => ReplyTemplate::Unsupported,
        }
    }

    /// Templates that carry ledger or projection figures.
    pub fn carries_figures(&self) -> bool {
        matches!(
            self,
            ReplyTemplate::TransactionRecorded { .. }
                | ReplyTemplate::BudgetSet { .. }
                | ReplyTemplate::BudgetStatus { .. }
                | ReplyTemplate::SpendingSummary { .. }
                | ReplyTemplate::InvestmentProjection { .. }
                | ReplyTemplate::HealthScore { .. }
        )
    }

    pub fn render_en(&self) -> String {
        match self {
            ReplyTemplate::Greeting => {
                "Hello! I can record expenses, set budgets, show your spending, keep track of tasks and run investment projections.".to_string()
            }
            ReplyTemplate::TransactionRecorded {
                amount,
                currency,
                category,
                kind,
                date,
            } => {
                let mut text = format!(
                    "Recorded {} of {} for {}",
                    kind,
                    money(currency, *amount),
                    category
                );
                if let Some(date) = date {
                    text.push_str(&format!(" on {}", date));
                }
                text.push('.');
                text
            }
            ReplyTemplate::BudgetSet {
                category,
                limit,
                currency,
                period,
            } => format!(
                "Budget set: {} for {} per {}.",
                money(currency, *limit),
                category,
                period.as_deref().unwrap_or("month")
            ),
            ReplyTemplate::BudgetStatus { currency, lines } => {
                let parts: Vec<String> = lines
                    .iter()
                    .map(|line| {
                        let remaining = line.limit - line.spent;
                        if remaining >= 0.0 {
                            format!(
                                "{}: {} spent of {}, {} left",
                                line.category,
                                money(currency, line.spent),
                                money(currency, line.limit),
                                money(currency, remaining)
                            )
                        } else {
                            format!(
                                "{}: {} spent of {}, over by {}",
                                line.category,
                                money(currency, line.spent),
                                money(currency, line.limit),
                                money(currency, -remaining)
                            )
                        }
                    })
                    .collect();
                format!("Budget status. {}.", parts.join("; "))
            }
            ReplyTemplate::SpendingSummary {
                total,
                currency,
                category,
                period,
                transaction_count,
            } => {
                let scope = match category {
                    Some(c) => format!(" on {}", c),
                    None => String::new(),
                };
                let window = match period.as_deref() {
                    Some("today") => " today".to_string(),
                    Some(p) => format!(" this {}", p),
                    None => String::new(),
                };
                format!(
                    "You spent {}{}{} across {} transaction{}.",
                    money(currency, *total),
                    scope,
                    window,
                    transaction_count,
                    if *transaction_count == 1 { "" } else { "s" }
                )
            }
            ReplyTemplate::InvestmentProjection {
                principal,
                currency,
                months,
                risk_level,
                projected_value,
                gain,
            } => format!(
                "Investing {} at {} risk for {} months could grow to about {} (a gain of {}).",
                money(currency, *principal),
                risk_level,
                months,
                money(currency, *projected_value),
                money(currency, *gain)
            ),
            ReplyTemplate::TaskCreated { title, due_date } => match due_date {
                Some(due) => format!("Task added: {} (due {}).", title, due),
                None => format!("Task added: {}.", title),
            },
            ReplyTemplate::TaskList { tasks } => {
                let items: Vec<String> = tasks
                    .iter()
                    .enumerate()
                    .map(|(i, task)| match &task.due_date {
                        Some(due) => format!("{}. {} (due {})", i + 1, task.title, due),
                        None => format!("{}. {}", i + 1, task.title),
                    })
                    .collect();
                format!("Your tasks: {}", items.join("; "))
            }
            ReplyTemplate::HealthScore { score, grade } => format!(
                "Your financial health score is {} (grade {}).",
                format_amount(*score),
                grade
            ),
            ReplyTemplate::NoData { topic } => {
                format!("No data available for {} yet.", topic)
            }
            ReplyTemplate::Clarify { missing, .. } => {
                if missing.is_empty() {
                    "Could you tell me a bit more about what you'd like to do?".to_string()
                } else {
                    let labels: Vec<String> = missing.iter().map(|s| s.to_string()).collect();
                    format!("I need a bit more detail. What is the {}?", join_and(&labels, "and"))
                }
            }
            ReplyTemplate::Rephrase => {
                "Sorry, I didn't quite understand. Could you rephrase that?".to_string()
            }
            ReplyTemplate::HorizonTooLong { max_months } => format!(
                "I can project at most {} years ({} months). Could you give a shorter period?",
                max_months / 12,
                max_months
            ),
            ReplyTemplate::OffTopicRedirect { advice_seeking: true } => {
                "I can't recommend investments or promise returns. I can track your spending, manage budgets or show an illustrative projection instead.".to_string()
            }
            ReplyTemplate::OffTopicRedirect { advice_seeking: false } => {
                "I can only help with your personal finances, such as expenses, budgets and tasks.".to_string()
            }
            ReplyTemplate::ServiceUnavailable => {
                "I'm having trouble connecting right now. Please try again in a moment.".to_string()
            }
            ReplyTemplate::ProcessingFailed => "Sorry, I couldn't process that.".to_string(),
            ReplyTemplate::Unsupported => "That isn't something I can do.".to_string(),
        }
    }

    pub fn render_ur(&self) -> String {
        match self {
            ReplyTemplate::Greeting => {
                "السلام علیکم! میں اخراجات درج کرنے، بجٹ بنانے، خرچ دکھانے، کام یاد رکھنے اور سرمایہ کاری کا اندازہ لگانے میں مدد کر سکتا ہوں۔".to_string()
            }
            ReplyTemplate::TransactionRecorded {
                amount,
                currency,
                category,
                kind,
                date,
            } => {
                let kind = match kind {
                    TransactionKind::Expense => "خرچ",
                    TransactionKind::Income => "آمدنی",
                };
                let when = match date {
                    Some(d) => format!(" ({})", d),
                    None => String::new(),
                };
                format!(
                    "{} کے لیے {} کا {} درج کر لیا گیا{}۔",
                    category_ur(category),
                    money_ur(currency, *amount),
                    kind,
                    when
                )
            }
            ReplyTemplate::BudgetSet {
                category,
                limit,
                currency,
                period,
            } => format!(
                "{} کا {} بجٹ {} مقرر کر دیا گیا۔",
                category_ur(category),
                period_ur(period.as_deref().unwrap_or("month")),
                money_ur(currency, *limit)
            ),
            ReplyTemplate::BudgetStatus { currency, lines } => {
                let parts: Vec<String> = lines
                    .iter()
                    .map(|line| {
                        let remaining = line.limit - line.spent;
                        if remaining >= 0.0 {
                            format!(
                                "{}: {} میں سے {} خرچ، {} باقی",
                                category_ur(&line.category),
                                money_ur(currency, line.limit),
                                money_ur(currency, line.spent),
                                money_ur(currency, remaining)
                            )
                        } else {
                            format!(
                                "{}: {} میں سے {} خرچ، {} زیادہ",
                                category_ur(&line.category),
                                money_ur(currency, line.limit),
                                money_ur(currency, line.spent),
                                money_ur(currency, -remaining)
                            )
                        }
                    })
                    .collect();
                format!("بجٹ کی صورتحال: {}۔", parts.join("؛ "))
            }
            ReplyTemplate::SpendingSummary {
                total,
                currency,
                category,
                period,
                transaction_count,
            } => {
                let scope = match category {
                    Some(c) => format!("{} پر ", category_ur(c)),
                    None => String::new(),
                };
                let window = match period.as_deref() {
                    Some(p) => format!("{} ", period_ur(p)),
                    None => String::new(),
                };
                format!(
                    "آپ نے {}{}{} لین دین میں {} خرچ کیے۔",
                    window,
                    scope,
                    transaction_count,
                    money_ur(currency, *total)
                )
            }
            ReplyTemplate::InvestmentProjection {
                principal,
                currency,
                months,
                risk_level,
                projected_value,
                gain,
            } => format!(
                "{} کو {} رسک پر {} مہینوں کے لیے لگانے سے یہ تقریباً {} ہو سکتے ہیں ({} کا اضافہ)۔",
                money_ur(currency, *principal),
                risk_ur(*risk_level),
                months,
                money_ur(currency, *projected_value),
                money_ur(currency, *gain)
            ),
            ReplyTemplate::TaskCreated { title, due_date } => match due_date {
                Some(due) => format!("کام شامل کر دیا گیا: {} (آخری تاریخ {})۔", title, due),
                None => format!("کام شامل کر دیا گیا: {}۔", title),
            },
            ReplyTemplate::TaskList { tasks } => {
                let items: Vec<String> = tasks
                    .iter()
                    .enumerate()
                    .map(|(i, task)| match &task.due_date {
                        Some(due) => format!("{}۔ {} ({})", i + 1, task.title, due),
                        None => format!("{}۔ {}", i + 1, task.title),
                    })
                    .collect();
                format!("آپ کے کام: {}", items.join("؛ "))
            }
            ReplyTemplate::HealthScore { score, grade } => format!(
                "آپ کا مالی صحت اسکور {} ہے (گریڈ {})۔",
                format_amount(*score),
                grade
            ),
            ReplyTemplate::NoData { topic } => {
                format!("{} کے لیے ابھی کوئی ڈیٹا دستیاب نہیں۔", topic_ur(topic))
            }
            ReplyTemplate::Clarify { missing, .. } => {
                if missing.is_empty() {
                    "براہ کرم تھوڑا اور بتائیں کہ آپ کیا کرنا چاہتے ہیں؟".to_string()
                } else {
                    let labels: Vec<String> =
                        missing.iter().map(|s| slot_ur(*s).to_string()).collect();
                    format!("مجھے تھوڑی مزید تفصیل چاہیے۔ {} کیا ہے؟", join_and(&labels, "اور"))
                }
            }
            ReplyTemplate::Rephrase => {
                "معذرت، میں سمجھ نہیں سکا۔ کیا آپ دوبارہ بتا سکتے ہیں؟".to_string()
            }
            ReplyTemplate::HorizonTooLong { max_months } => format!(
                "میں زیادہ سے زیادہ {} سال ({} مہینے) کا اندازہ لگا سکتا ہوں۔ کیا آپ کم مدت بتا سکتے ہیں؟",
                max_months / 12,
                max_months
            ),
            ReplyTemplate::OffTopicRedirect { advice_seeking: true } => {
                "میں سرمایہ کاری کا مشورہ یا منافع کی ضمانت نہیں دے سکتا۔ البتہ میں آپ کے اخراجات، بجٹ یا ایک اندازاً تخمینہ دکھا سکتا ہوں۔".to_string()
            }
            ReplyTemplate::OffTopicRedirect { advice_seeking: false } => {
                "میں صرف آپ کے ذاتی مالی معاملات، جیسے اخراجات، بجٹ اور کاموں میں مدد کر سکتا ہوں۔".to_string()
            }
            ReplyTemplate::ServiceUnavailable => {
                "ابھی رابطے میں مسئلہ ہے۔ براہ کرم تھوڑی دیر بعد کوشش کریں۔".to_string()
            }
            ReplyTemplate::ProcessingFailed => "معذرت، میں اس پر عمل نہیں کر سکا۔".to_string(),
            ReplyTemplate::Unsupported => "یہ کام میں نہیں کر سکتا۔".to_string(),
        }
    }
}

/// Thousands separators; two decimals only when there is a fraction.
pub fn format_amount(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let whole = cents / 100;
    let fraction = cents % 100;

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative && cents > 0 { "-" } else { "" };
    if fraction == 0 {
        format!("{}{}", sign, grouped)
    } else {
        format!("{}{}.{:02}", sign, grouped, fraction)
    }
}

fn money(currency: &str, value: f64) -> String {
    format!("{} {}", currency, format_amount(value))
}

fn money_ur(currency: &str, value: f64) -> String {
    match currency {
        "PKR" => format!("{} روپے", format_amount(value)),
        "USD" => format!("{} ڈالر", format_amount(value)),
        other => format!("{} {}", format_amount(value), other),
    }
}

fn join_and(items: &[String], and: &str) -> String {
    match items {
        [] => String::new(),
        [one] => one.clone(),
        [rest @ .., last] => format!("{} {} {}", rest.join("، "), and, last),
    }
}

fn category_ur(category: &str) -> &str {
    match category {
        "Food" => "کھانا",
        "Transport" => "ٹرانسپورٹ",
        "Bills" => "بل",
        "Rent" => "کرایہ",
        "Shopping" => "خریداری",
        "Health" => "صحت",
        "Education" => "تعلیم",
        "Entertainment" => "تفریح",
        "Salary" => "تنخواہ",
        "Other" => "دیگر",
        other => other,
    }
}

fn period_ur(period: &str) -> &str {
    match period {
        "today" => "آج",
        "week" => "اس ہفتے",
        "month" => "ماہانہ",
        "year" => "سالانہ",
        other => other,
    }
}

fn risk_ur(risk: RiskLevel) -> &'static str {
    match risk {
        RiskLevel::Low => "کم",
        RiskLevel::Medium => "درمیانے",
        RiskLevel::High => "زیادہ",
    }
}

fn slot_ur(slot: Slot) -> &'static str {
    match slot {
        Slot::Amount => "رقم",
        Slot::Category => "زمرہ",
        Slot::Date => "تاریخ",
        Slot::RiskLevel => "رسک کی سطح",
        Slot::Title => "کام کا عنوان",
        Slot::Period => "مدت",
        Slot::Horizon => "سرمایہ کاری کی مدت",
    }
}

fn topic_ur(topic: &str) -> &str {
    match topic {
        "spending" => "اخراجات",
        "budgets" => "بجٹ",
        "tasks" => "کاموں",
        "health score" => "مالی صحت اسکور",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(500.0), "500");
        assert_eq!(format_amount(1000.0), "1,000");
        assert_eq!(format_amount(1_234_567.5), "1,234,567.50");
        assert_eq!(format_amount(-2500.0), "-2,500");
        assert_eq!(format_amount(0.0), "0");
    }

    #[test]
    fn test_figures_match_across_languages() {
        let reply = ReplyTemplate::TransactionRecorded {
            amount: 1500.0,
            currency: "PKR".into(),
            category: "Food".into(),
            kind: TransactionKind::Expense,
            date: Some("2024-03-14".into()),
        };
        let en = reply.render_en();
        let ur = reply.render_ur();
        assert_eq!(en, "Recorded expense of PKR 1,500 for Food on 2024-03-14.");
        assert!(ur.contains("1,500 روپے"));
        assert!(ur.contains("کھانا"));
    }

    #[test]
    fn test_clarify_names_missing_slots() {
        let reply = ReplyTemplate::Clarify {
            intent: Intent::SetBudget,
            missing: vec![Slot::Category, Slot::Amount],
        };
        assert_eq!(reply.render_en(), "I need a bit more detail. What is the category and amount?");
        assert!(reply.render_ur().contains("زمرہ اور رقم"));
    }

    #[test]
    fn test_redirects_carry_no_digits() {
        for advice_seeking in [true, false] {
            let reply = ReplyTemplate::OffTopicRedirect { advice_seeking };
            assert!(!reply.render_en().chars().any(|c| c.is_ascii_digit()));
            assert!(!reply.render_ur().chars().any(|c| c.is_numeric()));
        }
    }

    #[test]
    fn test_error_templates() {
        assert_eq!(
            ReplyTemplate::for_error(ErrorKind::Transport),
            ReplyTemplate::ServiceUnavailable
        );
        assert_eq!(
            ReplyTemplate::for_error(ErrorKind::Validation).render_en(),
            "Sorry, I couldn't process that."
        );
        assert!(!ReplyTemplate::ServiceUnavailable.carries_figures());
    }
}
