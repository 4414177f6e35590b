//! Spending skill: record transactions, summarize spending, health score

use super::{failed, is_empty_result, iso_date, number_field, string_field, SkillContext};
use crate::config::RouterConfig;
use crate::models::{ErrorKind, SkillResult, ToolCall, TransactionKind};
use crate::tools::ToolGateway;
use crate::translation::ReplyTemplate;
use std::sync::Arc;
use tracing::info;

pub struct SpendingSkill {
    gateway: Arc<ToolGateway>,
    config: Arc<RouterConfig>,
}

impl SpendingSkill {
    pub fn new(gateway: Arc<ToolGateway>, config: Arc<RouterConfig>) -> Self {
        Self { gateway, config }
    }

    pub async fn add_transaction(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "add_transaction";
        let entities = &ctx.entities;

        let Some(amount) = entities.amount else {
            return SkillResult::failure(ErrorKind::Validation);
        };
        let category = entities
            .category
            .clone()
            .unwrap_or_else(|| self.config.locale.default_category.clone());
        let kind = entities.transaction_kind.unwrap_or(TransactionKind::Expense);
        let date = iso_date(entities.date.unwrap_or(ctx.today));

        let call = ToolCall::new(TOOL)
            .arg("amount", amount)
            .arg("category", category.clone())
            .arg("type", kind.to_string())
            .arg("date", date.clone())
            .arg_opt("currency", entities.currency.clone());

        match self.gateway.call(&call).await {
            Ok(result) => {
                info!(amount, category = %category, kind = %kind, "Transaction recorded");
                let reply = ReplyTemplate::TransactionRecorded {
                    amount: number_field(&result, "amount").unwrap_or(amount),
                    currency: ctx.currency.clone(),
                    category: string_field(&result, "category").unwrap_or(category),
                    kind,
                    date: string_field(&result, "date").or(Some(date)),
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }

    pub async fn query_spending(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "analyze_spending";
        let entities = &ctx.entities;
        let period = entities.period.map(|p| p.to_string());

        let mut call = ToolCall::new(TOOL)
            .arg_opt("category", entities.category.clone())
            .arg_opt("period", period.clone());
        // A single named day narrows the window to that day.
        if period.is_none() {
            if let Some(date) = entities.date {
                call = call
                    .arg("start_date", iso_date(date))
                    .arg("end_date", iso_date(date));
            }
        }

        match self.gateway.call(&call).await {
            Ok(result) => {
                let count = result
                    .get("transaction_count")
                    .and_then(|v| v.as_u64())
                    .unwrap_or(0);
                let Some(total) = number_field(&result, "total").filter(|_| count > 0) else {
                    return SkillResult::no_data("spending").with_tool_call(TOOL);
                };

                let reply = ReplyTemplate::SpendingSummary {
                    total,
                    currency: ctx.currency.clone(),
                    category: entities.category.clone(),
                    period: string_field(&result, "period").or(period),
                    transaction_count: count,
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }

    pub async fn health_score(&self, _ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "get_health_score";

        match self.gateway.call(&ToolCall::new(TOOL)).await {
            Ok(result) => {
                let score = match number_field(&result, "score") {
                    Some(score) if !is_empty_result(&result) => score,
                    _ => return SkillResult::no_data("health score").with_tool_call(TOOL),
                };
                let reply = ReplyTemplate::HealthScore {
                    score,
                    grade: string_field(&result, "grade").unwrap_or_else(|| "-".to_string()),
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }
}
