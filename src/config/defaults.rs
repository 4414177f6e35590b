//! Built-in vocabulary tables
//!
//! Keywords and aliases are written in normalized form: lowercase, no
//! punctuation, Roman-Urdu words in their canonical spelling.

use super::{IntentKeywords, WeightedKeyword};
use crate::models::{Intent, RiskLevel};
use std::collections::BTreeMap;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn keywords(intent: Intent, items: &[(&str, f32)]) -> IntentKeywords {
    IntentKeywords {
        intent,
        keywords: items
            .iter()
            .map(|(phrase, weight)| WeightedKeyword {
                phrase: phrase.to_string(),
                weight: *weight,
            })
            .collect(),
    }
}

pub(super) fn category_aliases() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        (
            "Food",
            &[
                "food", "khana", "groceries", "grocery", "restaurant", "lunch", "dinner",
                "breakfast", "nashta", "sabzi", "kiryana", "کھانا", "راشن",
            ],
        ),
        (
            "Transport",
            &[
                "transport", "petrol", "fuel", "uber", "careem", "rickshaw", "bus", "taxi",
                "kiraya gari", "پٹرول", "سفر",
            ],
        ),
        (
            "Bills",
            &[
                "bills", "bill", "bijli", "electricity", "gas bill", "internet", "utilities",
                "mobile package", "بجلی", "بل",
            ],
        ),
        ("Rent", &["rent", "kiraya", "کرایہ"]),
        (
            "Shopping",
            &["shopping", "kapray", "clothes", "shoes", "joote", "خریداری"],
        ),
        (
            "Health",
            &["medicine", "doctor", "dawai", "hospital", "pharmacy", "دوائی"],
        ),
        (
            "Education",
            &["school", "fees", "tuition", "books", "kitabein", "taleem", "تعلیم"],
        ),
        (
            "Entertainment",
            &["movie", "movies", "cinema", "entertainment", "games", "تفریح"],
        ),
        ("Salary", &["salary", "tankhwah", "تنخواہ"]),
    ];

    table
        .iter()
        .map(|(category, aliases)| (category.to_string(), strings(aliases)))
        .collect()
}

pub(super) fn currency_aliases() -> BTreeMap<String, Vec<String>> {
    let table: &[(&str, &[&str])] = &[
        (
            "PKR",
            &["rs", "rupees", "rupee", "rupay", "rupaye", "pkr", "₨", "روپے", "روپیہ"],
        ),
        ("USD", &["$", "usd", "dollar", "dollars", "ڈالر"]),
        ("EUR", &["€", "eur", "euro", "euros"]),
        ("GBP", &["£", "gbp", "pound", "pounds"]),
    ];

    table
        .iter()
        .map(|(code, aliases)| (code.to_string(), strings(aliases)))
        .collect()
}

pub(super) fn risk_synonyms() -> BTreeMap<String, RiskLevel> {
    [
        ("low", RiskLevel::Low),
        ("conservative", RiskLevel::Low),
        ("safe", RiskLevel::Low),
        ("mehfooz", RiskLevel::Low),
        ("medium", RiskLevel::Medium),
        ("moderate", RiskLevel::Medium),
        ("balanced", RiskLevel::Medium),
        ("darmiyana", RiskLevel::Medium),
        ("high", RiskLevel::High),
        ("aggressive", RiskLevel::High),
    ]
    .iter()
    .map(|(word, level)| (word.to_string(), *level))
    .collect()
}

pub(super) fn spelling_variants() -> BTreeMap<String, String> {
    [
        ("kharcha", "kharch"),
        ("kharach", "kharch"),
        ("kharchay", "kharch"),
        ("khaana", "khana"),
        ("khane", "khana"),
        ("hazaar", "hazar"),
        ("hazzar", "hazar"),
        ("hajar", "hazar"),
        ("lac", "lakh"),
        ("lacs", "lakh"),
        ("lakhs", "lakh"),
        ("karor", "crore"),
        ("karore", "crore"),
        ("crores", "crore"),
        ("budjet", "budget"),
        ("bajat", "budget"),
        ("kitnay", "kitna"),
        ("kitne", "kitna"),
        ("kitni", "kitna"),
        ("hoa", "hua"),
        ("huwa", "hua"),
        ("kia", "kiya"),
        ("salaam", "salam"),
        ("aslam", "assalam"),
        ("asalam", "assalam"),
        ("alaikum", "alaikum"),
        ("alykum", "alaikum"),
        ("mahinay", "mahine"),
        ("mahina", "mahine"),
        ("sal", "saal"),
        ("tankhah", "tankhwah"),
        ("dawa", "dawai"),
    ]
    .iter()
    .map(|(variant, canonical)| (variant.to_string(), canonical.to_string()))
    .collect()
}

pub(super) fn greetings() -> Vec<String> {
    strings(&[
        "hi",
        "hello",
        "hey",
        "salam",
        "assalam o alaikum",
        "assalam alaikum",
        "aoa",
        "adaab",
        "good morning",
        "good evening",
        "السلام علیکم",
        "سلام",
    ])
}

pub(super) fn intent_keywords() -> Vec<IntentKeywords> {
    vec![
        keywords(
            Intent::AddTransaction,
            &[
                ("add", 0.4),
                ("expense", 0.4),
                ("spent", 0.5),
                ("kharch", 0.5),
                ("paid", 0.4),
                ("bought", 0.4),
                ("kharida", 0.4),
                ("income", 0.4),
                ("earned", 0.4),
                ("received", 0.4),
                ("kamaya", 0.4),
                ("record", 0.3),
                ("log", 0.3),
                ("خرچ", 0.5),
            ],
        ),
        keywords(
            Intent::SetBudget,
            &[
                ("budget", 0.4),
                ("set", 0.3),
                ("limit", 0.3),
                ("banao", 0.3),
                ("set budget", 0.2),
                ("بجٹ", 0.4),
            ],
        ),
        keywords(
            Intent::QueryBudgetStatus,
            &[
                ("budget", 0.3),
                ("budget status", 0.3),
                ("remaining", 0.4),
                ("left", 0.3),
                ("bacha", 0.4),
                ("baqi", 0.4),
                ("status", 0.3),
                ("over budget", 0.4),
            ],
        ),
        keywords(
            Intent::SimulateInvestment,
            &[
                ("invest", 0.5),
                ("investment", 0.5),
                ("simulate", 0.5),
                ("projection", 0.4),
                ("returns", 0.3),
                ("return", 0.3),
                ("grow", 0.3),
                ("compound", 0.3),
                ("nivesh", 0.5),
                ("sarmaya", 0.5),
                ("سرمایہ", 0.5),
            ],
        ),
        keywords(
            Intent::CreateTask,
            &[
                ("remind", 0.5),
                ("reminder", 0.4),
                ("task", 0.3),
                ("add task", 0.3),
                ("todo", 0.4),
                ("yaad", 0.4),
            ],
        ),
        keywords(
            Intent::ListTasks,
            &[
                ("tasks", 0.3),
                ("my tasks", 0.3),
                ("reminders", 0.3),
                ("list", 0.3),
                ("show", 0.15),
                ("pending", 0.3),
            ],
        ),
        keywords(
            Intent::HealthScore,
            &[
                ("health score", 0.4),
                ("financial health", 0.5),
                ("score", 0.3),
                ("health", 0.3),
                ("sehat", 0.3),
                ("how am i doing", 0.5),
            ],
        ),
        keywords(
            Intent::QuerySpending,
            &[
                ("how much", 0.5),
                ("spending", 0.4),
                ("spend", 0.3),
                ("kitna", 0.5),
                ("kitna kharch", 0.3),
                ("analyze", 0.4),
                ("analysis", 0.4),
                ("breakdown", 0.4),
                ("summary", 0.3),
                ("show", 0.15),
                ("کتنا", 0.5),
            ],
        ),
        keywords(
            Intent::OffTopic,
            &[
                ("guarantee", 0.6),
                ("guaranteed", 0.6),
                ("stock picks", 0.7),
                ("stock tips", 0.7),
                ("which stock", 0.7),
                ("best stock", 0.7),
                ("should i buy", 0.6),
                ("sure shot", 0.6),
                ("crypto", 0.5),
                ("bitcoin", 0.5),
                ("weather", 0.6),
                ("joke", 0.6),
                ("cricket", 0.6),
                ("politics", 0.6),
                ("recipe", 0.6),
            ],
        ),
    ]
}

pub(super) fn advice_keywords() -> Vec<String> {
    strings(&[
        "guarantee",
        "guaranteed",
        "stock picks",
        "stock tips",
        "which stock",
        "best stock",
        "should i buy",
        "sure shot",
        "crypto",
        "bitcoin",
    ])
}

pub(super) fn past_tense_markers() -> Vec<String> {
    strings(&[
        "tha", "thi", "thay", "thiy", "hua", "hui", "huay", "kiya", "gaya", "gayi", "gaye",
        "liya", "diya", "kharida", "was", "were", "spent", "paid", "bought", "did",
        "تھا", "تھی", "ہوا", "ہوئی", "کیا", "گیا",
    ])
}

pub(super) fn expense_markers() -> Vec<String> {
    strings(&[
        "expense", "spent", "spend", "kharch", "paid", "bought", "kharida", "diya", "خرچ",
    ])
}

pub(super) fn income_markers() -> Vec<String> {
    strings(&[
        "income", "earned", "received", "salary", "tankhwah", "kamaya", "mila", "mili",
        "aamdani", "آمدنی",
    ])
}

pub(super) fn task_triggers() -> Vec<String> {
    strings(&[
        "remind me to",
        "reminder to",
        "add task to",
        "add task",
        "task to",
        "task",
        "todo",
        "yaad dilana",
        "yaad dilao",
    ])
}

pub(super) fn roman_urdu_markers() -> Vec<String> {
    strings(&[
        "hai", "hain", "tha", "thi", "hua", "hui", "kiya", "kya", "kitna", "kharch", "mera",
        "meri", "mujhe", "karo", "kar", "dena", "lena", "ka", "ki", "ke", "ko", "se",
        "mein", "pe", "par", "aur", "nahi", "bacha", "baqi", "yaad", "dilana", "kal", "aaj",
        "parson", "hazar", "lakh", "crore", "khana", "bijli", "kiraya", "salam", "assalam",
        "banao", "mahine", "hafte", "saal", "mili", "mila",
    ])
}
