//! Budget skill: set a budget, report budget status

use super::{failed, number_field, string_field, SkillContext};
use crate::models::{ErrorKind, SkillResult, ToolCall};
use crate::tools::ToolGateway;
use crate::translation::{BudgetLine, ReplyTemplate};
use std::sync::Arc;

pub struct BudgetSkill {
    gateway: Arc<ToolGateway>,
}

impl BudgetSkill {
    pub fn new(gateway: Arc<ToolGateway>) -> Self {
        Self { gateway }
    }

    pub async fn set_budget(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "create_budget";
        let entities = &ctx.entities;

        let (Some(category), Some(limit)) = (entities.category.clone(), entities.amount) else {
            return SkillResult::failure(ErrorKind::Validation);
        };
        let period = entities.period.map(|p| p.to_string());

        let call = ToolCall::new(TOOL)
            .arg("category", category.clone())
            .arg("limit", limit)
            .arg_opt("period", period.clone())
            .arg_opt("currency", entities.currency.clone());

        match self.gateway.call(&call).await {
            Ok(result) => {
                let reply = ReplyTemplate::BudgetSet {
                    category: string_field(&result, "category").unwrap_or(category),
                    limit: number_field(&result, "limit").unwrap_or(limit),
                    currency: ctx.currency.clone(),
                    period: string_field(&result, "period").or(period),
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }

    pub async fn get_status(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "get_financial_summary";
        let entities = &ctx.entities;

        let call = ToolCall::new(TOOL)
            .arg_opt("category", entities.category.clone())
            .arg_opt("period", entities.period.map(|p| p.to_string()));

        match self.gateway.call(&call).await {
            Ok(result) => {
                let lines: Vec<BudgetLine> = result
                    .get("budgets")
                    .and_then(|b| b.as_array())
                    .map(|budgets| {
                        budgets
                            .iter()
                            .filter_map(|b| {
                                Some(BudgetLine {
                                    category: string_field(b, "category")?,
                                    limit: number_field(b, "limit")?,
                                    spent: number_field(b, "spent")?,
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                if lines.is_empty() {
                    return SkillResult::no_data("budgets").with_tool_call(TOOL);
                }

                let reply = ReplyTemplate::BudgetStatus {
                    currency: ctx.currency.clone(),
                    lines,
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }
}
