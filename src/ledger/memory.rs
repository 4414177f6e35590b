//! In-process ledger
//!
//! Serves the same tool contract as the HTTP ledger from plain maps. Used by
//! the CLI when no ledger URL is configured, and by tests.

use super::Ledger;
use crate::clock::{Clock, SystemClock};
use crate::error::RouterError;
use crate::models::ToolCall;
use crate::Result;
use chrono::{Datelike, Duration, NaiveDate};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone)]
struct Transaction {
    id: Uuid,
    amount: f64,
    category: String,
    kind: String,
    date: NaiveDate,
    currency: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Clone)]
struct Budget {
    limit: f64,
    period: String,
    currency: Option<String>,
}

#[derive(Debug, Clone)]
struct Task {
    id: Uuid,
    title: String,
    due_date: Option<String>,
    status: String,
}

#[derive(Default)]
struct LedgerData {
    transactions: Vec<Transaction>,
    budgets: BTreeMap<String, Budget>,
    tasks: Vec<Task>,
}

pub struct InMemoryLedger {
    data: Arc<RwLock<LedgerData>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            data: Arc::new(RwLock::new(LedgerData::default())),
            clock,
        }
    }

    pub async fn transaction_count(&self) -> usize {
        self.data.read().await.transactions.len()
    }

    async fn add_transaction(&self, args: &Map<String, Value>) -> Result<Value> {
        let amount = number(args, "amount")?;
        if amount <= 0.0 {
            return Err(RouterError::Validation("amount must be positive".to_string()));
        }
        let kind = string(args, "type")?;
        if kind != "expense" && kind != "income" {
            return Err(RouterError::Validation(format!("unknown transaction type '{}'", kind)));
        }

        let transaction = Transaction {
            id: Uuid::new_v4(),
            amount,
            category: string(args, "category")?,
            kind,
            date: optional_date(args, "date")?.unwrap_or_else(|| self.clock.today()),
            currency: optional_string(args, "currency"),
            description: optional_string(args, "description"),
        };

        let result = json!({
            "id": transaction.id,
            "amount": transaction.amount,
            "category": transaction.category,
            "type": transaction.kind,
            "date": transaction.date.to_string(),
            "currency": transaction.currency,
            "description": transaction.description,
        });
        self.data.write().await.transactions.push(transaction);
        Ok(result)
    }

    async fn create_budget(&self, args: &Map<String, Value>) -> Result<Value> {
        let category = string(args, "category")?;
        let limit = number(args, "limit")?;
        if limit <= 0.0 {
            return Err(RouterError::Validation("limit must be positive".to_string()));
        }
        let budget = Budget {
            limit,
            period: optional_string(args, "period").unwrap_or_else(|| "month".to_string()),
            currency: optional_string(args, "currency"),
        };

        let result = json!({
            "category": category,
            "limit": budget.limit,
            "period": budget.period,
            "currency": budget.currency,
        });
        self.data.write().await.budgets.insert(category, budget);
        Ok(result)
    }

    async fn get_financial_summary(&self, args: &Map<String, Value>) -> Result<Value> {
        let filter = optional_string(args, "category");
        let today = self.clock.today();
        let data = self.data.read().await;

        let budgets: Vec<Value> = data
            .budgets
            .iter()
            .filter(|(category, _)| filter.as_ref().map(|f| f == *category).unwrap_or(true))
            .map(|(category, budget)| {
                let spent: f64 = data
                    .transactions
                    .iter()
                    .filter(|t| t.kind == "expense" && &t.category == category)
                    .filter(|t| in_period(t.date, &budget.period, today))
                    .map(|t| t.amount)
                    .sum();
                json!({
                    "category": category,
                    "limit": budget.limit,
                    "spent": spent,
                    "remaining": budget.limit - spent,
                    "period": budget.period,
                })
            })
            .collect();

        Ok(json!({ "budgets": budgets }))
    }

    async fn analyze_spending(&self, args: &Map<String, Value>) -> Result<Value> {
        let category = optional_string(args, "category");
        let period = optional_string(args, "period");
        let start = optional_date(args, "start_date")?;
        let end = optional_date(args, "end_date")?;
        let today = self.clock.today();
        let data = self.data.read().await;

        let mut by_category: BTreeMap<String, f64> = BTreeMap::new();
        let mut total = 0.0;
        let mut count = 0usize;

        for t in data.transactions.iter().filter(|t| t.kind == "expense") {
            if category.as_ref().map(|c| c != &t.category).unwrap_or(false) {
                continue;
            }
            if let Some(period) = &period {
                if !in_period(t.date, period, today) {
                    continue;
                }
            }
            let before_start = start.map(|s| t.date < s).unwrap_or(false);
            let after_end = end.map(|e| t.date > e).unwrap_or(false);
            if before_start || after_end {
                continue;
            }
            *by_category.entry(t.category.clone()).or_insert(0.0) += t.amount;
            total += t.amount;
            count += 1;
        }

        if count == 0 {
            return Ok(json!({}));
        }

        Ok(json!({
            "total": total,
            "by_category": by_category,
            "period": period,
            "transaction_count": count,
        }))
    }

    async fn get_health_score(&self) -> Result<Value> {
        let today = self.clock.today();
        let data = self.data.read().await;
        if data.transactions.is_empty() {
            return Ok(json!({}));
        }

        let (income, expense) = data.transactions.iter().fold((0.0, 0.0), |(i, e), t| {
            if t.kind == "income" {
                (i + t.amount, e)
            } else {
                (i, e + t.amount)
            }
        });

        let savings_rate = if income > 0.0 {
            ((income - expense) / income).clamp(-1.0, 1.0)
        } else {
            -1.0
        };

        let overspent = data
            .budgets
            .iter()
            .filter(|(category, budget)| {
                let spent: f64 = data
                    .transactions
                    .iter()
                    .filter(|t| t.kind == "expense" && &t.category == *category)
                    .filter(|t| in_period(t.date, &budget.period, today))
                    .map(|t| t.amount)
                    .sum();
                spent > budget.limit
            })
            .count();

        let score = ((savings_rate + 1.0) * 50.0 - overspent as f64 * 10.0)
            .clamp(0.0, 100.0)
            .round();
        let grade = match score as u32 {
            80..=100 => "A",
            65..=79 => "B",
            50..=64 => "C",
            _ => "D",
        };

        Ok(json!({
            "score": score,
            "grade": grade,
            "savings_rate": savings_rate,
            "budgets_exceeded": overspent,
        }))
    }

    async fn create_task(&self, args: &Map<String, Value>) -> Result<Value> {
        let task = Task {
            id: Uuid::new_v4(),
            title: string(args, "title")?,
            due_date: optional_date(args, "due_date")?.map(|d| d.to_string()),
            status: "pending".to_string(),
        };
        let result = task_json(&task);
        self.data.write().await.tasks.push(task);
        Ok(result)
    }

    async fn list_tasks(&self, args: &Map<String, Value>) -> Result<Value> {
        let status = optional_string(args, "status");
        let data = self.data.read().await;
        let tasks: Vec<Value> = data
            .tasks
            .iter()
            .filter(|t| status.as_ref().map(|s| s == &t.status).unwrap_or(true))
            .map(task_json)
            .collect();
        Ok(json!({ "tasks": tasks }))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Ledger for InMemoryLedger {
    fn name(&self) -> &'static str {
        "in_memory"
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let args = &call.arguments;
        match call.tool_name.as_str() {
            "add_transaction" => self.add_transaction(args).await,
            "create_budget" => self.create_budget(args).await,
            "get_financial_summary" => self.get_financial_summary(args).await,
            "analyze_spending" => self.analyze_spending(args).await,
            "get_health_score" => self.get_health_score().await,
            "create_task" => self.create_task(args).await,
            "list_tasks" => self.list_tasks(args).await,
            other => Err(RouterError::Validation(format!(
                "ledger does not serve '{}'",
                other
            ))),
        }
    }
}

fn task_json(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "due_date": task.due_date,
        "status": task.status,
    })
}

fn in_period(date: NaiveDate, period: &str, today: NaiveDate) -> bool {
    match period {
        "today" => date == today,
        "week" => date <= today && date > today - Duration::days(7),
        "month" => date.year() == today.year() && date.month() == today.month(),
        "year" => date.year() == today.year(),
        _ => true,
    }
}

fn string(args: &Map<String, Value>, key: &str) -> Result<String> {
    optional_string(args, key)
        .ok_or_else(|| RouterError::Validation(format!("expected string '{}'", key)))
}

fn optional_string(args: &Map<String, Value>, key: &str) -> Option<String> {
    args.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

fn number(args: &Map<String, Value>, key: &str) -> Result<f64> {
    args.get(key)
        .and_then(|v| v.as_f64())
        .ok_or_else(|| RouterError::Validation(format!("expected number '{}'", key)))
}

fn optional_date(args: &Map<String, Value>, key: &str) -> Result<Option<NaiveDate>> {
    match args.get(key).and_then(|v| v.as_str()) {
        Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| RouterError::Validation(format!("'{}' is not a YYYY-MM-DD date", key))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    fn ledger() -> InMemoryLedger {
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap());
        InMemoryLedger::with_clock(Arc::new(clock))
    }

    fn expense(amount: f64, category: &str) -> ToolCall {
        ToolCall::new("add_transaction")
            .arg("amount", amount)
            .arg("category", category)
            .arg("type", "expense")
    }

    #[tokio::test]
    async fn test_add_transaction_defaults_date_to_today() {
        let ledger = ledger();
        let result = ledger.execute(&expense(500.0, "Food")).await.unwrap();
        assert_eq!(result["amount"], 500.0);
        assert_eq!(result["category"], "Food");
        assert_eq!(result["date"], "2024-03-15");
        assert_eq!(ledger.transaction_count().await, 1);
    }

    #[tokio::test]
    async fn test_budget_summary_tracks_spending() {
        let ledger = ledger();
        ledger
            .execute(&ToolCall::new("create_budget").arg("category", "Food").arg("limit", 1000.0))
            .await
            .unwrap();
        ledger.execute(&expense(300.0, "Food")).await.unwrap();
        ledger.execute(&expense(50.0, "Transport")).await.unwrap();

        let summary = ledger
            .execute(&ToolCall::new("get_financial_summary"))
            .await
            .unwrap();
        let budgets = summary["budgets"].as_array().unwrap();
        assert_eq!(budgets.len(), 1);
        assert_eq!(budgets[0]["spent"], 300.0);
        assert_eq!(budgets[0]["remaining"], 700.0);
    }

    #[tokio::test]
    async fn test_analyze_spending_empty_and_filtered() {
        let ledger = ledger();
        let empty = ledger.execute(&ToolCall::new("analyze_spending")).await.unwrap();
        assert_eq!(empty, json!({}));

        ledger.execute(&expense(300.0, "Food")).await.unwrap();
        ledger
            .execute(&expense(200.0, "Food").arg("date", "2024-01-02"))
            .await
            .unwrap();

        let month = ledger
            .execute(&ToolCall::new("analyze_spending").arg("period", "month"))
            .await
            .unwrap();
        assert_eq!(month["total"], 300.0);
        assert_eq!(month["transaction_count"], 1);
        assert_eq!(month["by_category"]["Food"], 300.0);
    }

    #[tokio::test]
    async fn test_health_score_grades() {
        let ledger = ledger();
        assert_eq!(ledger.execute(&ToolCall::new("get_health_score")).await.unwrap(), json!({}));

        ledger
            .execute(
                &ToolCall::new("add_transaction")
                    .arg("amount", 1000.0)
                    .arg("category", "Salary")
                    .arg("type", "income"),
            )
            .await
            .unwrap();
        ledger.execute(&expense(400.0, "Food")).await.unwrap();

        let score = ledger.execute(&ToolCall::new("get_health_score")).await.unwrap();
        assert_eq!(score["score"], 80.0);
        assert_eq!(score["grade"], "A");
    }

    #[tokio::test]
    async fn test_tasks_round_trip() {
        let ledger = ledger();
        ledger
            .execute(
                &ToolCall::new("create_task")
                    .arg("title", "pay rent")
                    .arg("due_date", "2024-03-16"),
            )
            .await
            .unwrap();

        let listed = ledger.execute(&ToolCall::new("list_tasks")).await.unwrap();
        assert_eq!(listed["tasks"][0]["title"], "pay rent");
        assert_eq!(listed["tasks"][0]["status"], "pending");
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amount_and_unknown_tool() {
        let ledger = ledger();
        assert!(ledger.execute(&expense(0.0, "Food")).await.is_err());
        assert!(ledger
            .execute(&ToolCall::new("simulate_investment"))
            .await
            .is_err());
    }
}
