//! Investment skill: illustrative compound-growth projection

use super::{failed, number_field, SkillContext};
use crate::config::RouterConfig;
use crate::models::{ErrorKind, RiskLevel, SkillResult, ToolCall};
use crate::tools::simulate::MAX_MONTHS;
use crate::tools::ToolGateway;
use crate::translation::ReplyTemplate;
use std::sync::Arc;
use tracing::debug;

pub struct InvestmentSkill {
    gateway: Arc<ToolGateway>,
    config: Arc<RouterConfig>,
}

impl InvestmentSkill {
    pub fn new(gateway: Arc<ToolGateway>, config: Arc<RouterConfig>) -> Self {
        Self { gateway, config }
    }

    /// Always flags the disclaimer, whatever the outcome.
    pub async fn simulate(&self, ctx: &SkillContext) -> SkillResult {
        let mut result = self.project(ctx).await;
        result.disclaimer_required = true;
        result
    }

    async fn project(&self, ctx: &SkillContext) -> SkillResult {
        const TOOL: &str = "simulate_investment";
        let entities = &ctx.entities;

        let Some(amount) = entities.amount else {
            return SkillResult::failure(ErrorKind::Validation);
        };
        let risk = entities.risk_level.unwrap_or(RiskLevel::Medium);
        let months = entities
            .horizon_months
            .filter(|m| *m > 0)
            .unwrap_or(self.config.locale.default_horizon_months);
        if months > MAX_MONTHS {
            debug!(months, max_months = MAX_MONTHS, "Projection horizon too long");
            return SkillResult::message(ReplyTemplate::HorizonTooLong {
                max_months: MAX_MONTHS,
            });
        }

        let call = ToolCall::new(TOOL)
            .arg("amount", amount)
            .arg("risk_level", risk.to_string())
            .arg("months", months);

        match self.gateway.call(&call).await {
            Ok(result) => {
                let (Some(projected_value), Some(gain)) = (
                    number_field(&result, "projected_value"),
                    number_field(&result, "gain"),
                ) else {
                    return SkillResult::failure(ErrorKind::Validation).with_tool_call(TOOL);
                };

                let reply = ReplyTemplate::InvestmentProjection {
                    principal: number_field(&result, "principal").unwrap_or(amount),
                    currency: ctx.currency.clone(),
                    months: result
                        .get("months")
                        .and_then(|m| m.as_u64())
                        .map(|m| m as u32)
                        .unwrap_or(months),
                    risk_level: risk,
                    projected_value,
                    gain,
                };
                SkillResult::ok(reply, result).with_tool_call(TOOL)
            }
            Err(e) => failed(TOOL, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExtractedEntities;
    use crate::skills::fixtures::{context, gateway};
    use crate::test_support::SpyLedger;

    fn skill() -> InvestmentSkill {
        InvestmentSkill::new(
            gateway(Arc::new(SpyLedger::new())),
            Arc::new(RouterConfig::default()),
        )
    }

    #[tokio::test]
    async fn test_projection_defaults_and_disclaimer() {
        let mut entities = ExtractedEntities::default();
        entities.amount = Some(100_000.0);

        let result = skill().simulate(&context(entities)).await;
        assert!(result.success);
        assert!(result.disclaimer_required);

        let payload = result.structured_payload.unwrap();
        assert_eq!(payload["months"], 12);
        assert_eq!(payload["risk_level"], "medium");
        assert!(result.reply_text_en.contains("medium risk for 12 months"));
    }

    #[tokio::test]
    async fn test_disclaimer_even_without_amount() {
        let result = skill().simulate(&context(ExtractedEntities::default())).await;
        assert!(!result.success);
        assert!(result.disclaimer_required);
    }

    #[tokio::test]
    async fn test_horizon_and_risk_are_passed_through() {
        let mut entities = ExtractedEntities::default();
        entities.amount = Some(50_000.0);
        entities.risk_level = Some(RiskLevel::High);
        entities.horizon_months = Some(60);

        let result = skill().simulate(&context(entities)).await;
        let payload = result.structured_payload.unwrap();
        assert_eq!(payload["months"], 60);
        assert_eq!(payload["annual_rate"], 0.16);
    }

    #[tokio::test]
    async fn test_horizon_beyond_limit_names_the_limit() {
        let spy = Arc::new(SpyLedger::new());
        let skill = InvestmentSkill::new(gateway(spy.clone()), Arc::new(RouterConfig::default()));
        let mut entities = ExtractedEntities::default();
        entities.amount = Some(100_000.0);
        entities.horizon_months = Some(720);

        let result = skill.simulate(&context(entities)).await;
        assert!(result.disclaimer_required);
        assert!(result.structured_payload.is_none());
        assert!(result.tool_calls.is_empty());
        assert_eq!(
            result.reply,
            ReplyTemplate::HorizonTooLong {
                max_months: MAX_MONTHS
            }
        );
        assert!(result.reply_text_en.contains("50 years"));
    }
}
