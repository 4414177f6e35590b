//! Investment projection
//!
//! Deterministic compound-growth figures. This tool never talks to the
//! ledger; every number it returns is derived from the call arguments and
//! the configured risk/return table.

use super::Tool;
use crate::config::RiskReturnTable;
use crate::error::RouterError;
use crate::models::{RiskLevel, ToolCall};
use crate::Result;
use serde_json::{json, Value};

/// Upper bound on the projection horizon (50 years).
pub const MAX_MONTHS: u32 = 600;

pub struct SimulateInvestmentTool {
    rates: RiskReturnTable,
}

impl SimulateInvestmentTool {
    pub fn new(rates: RiskReturnTable) -> Self {
        Self { rates }
    }
}

/// `principal · (1 + r/12)^months`
pub fn project(principal: f64, annual_rate: f64, months: u32) -> f64 {
    principal * (1.0 + annual_rate / 12.0).powi(months as i32)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait::async_trait]
impl Tool for SimulateInvestmentTool {
    fn name(&self) -> &'static str {
        "simulate_investment"
    }

    fn description(&self) -> &'static str {
        "Project compound growth of a lump sum for a risk level and horizon"
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let args = &call.arguments;

        let amount = args
            .get("amount")
            .and_then(|v| v.as_f64())
            .filter(|a| *a > 0.0)
            .ok_or_else(|| {
                RouterError::Validation("amount must be a positive number".to_string())
            })?;

        let risk: RiskLevel = args
            .get("risk_level")
            .cloned()
            .map(serde_json::from_value)
            .transpose()
            .map_err(|_| {
                RouterError::Validation("risk_level must be low, medium or high".to_string())
            })?
            .ok_or_else(|| RouterError::Validation("risk_level is required".to_string()))?;

        let months = args
            .get("months")
            .and_then(|v| v.as_u64())
            .filter(|m| (1..=u64::from(MAX_MONTHS)).contains(m))
            .ok_or_else(|| {
                RouterError::Validation(format!("months must be between 1 and {}", MAX_MONTHS))
            })? as u32;

        let current_balance = args
            .get("current_balance")
            .and_then(|v| v.as_f64())
            .unwrap_or(0.0);

        let annual_rate = self.rates.annual_rate(risk);
        let principal = amount + current_balance;
        let projected = project(principal, annual_rate, months);

        Ok(json!({
            "principal": round2(principal),
            "annual_rate": annual_rate,
            "months": months,
            "projected_value": round2(projected),
            "gain": round2(projected - principal),
            "risk_level": risk,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool() -> SimulateInvestmentTool {
        SimulateInvestmentTool::new(RiskReturnTable::default())
    }

    #[test]
    fn test_projection_formula() {
        let value = project(100_000.0, 0.12, 12);
        assert!((value - 112_682.50).abs() < 0.01);
        assert_eq!(project(5_000.0, 0.10, 0), 5_000.0);
    }

    #[tokio::test]
    async fn test_execute_uses_risk_table() {
        let call = ToolCall::new("simulate_investment")
            .arg("amount", 50_000.0)
            .arg("risk_level", "medium")
            .arg("months", 12);
        let result = tool().execute(&call).await.unwrap();

        assert_eq!(result["annual_rate"], 0.10);
        assert_eq!(result["months"], 12);
        assert_eq!(result["risk_level"], "medium");
        let projected = result["projected_value"].as_f64().unwrap();
        assert!((projected - round2(project(50_000.0, 0.10, 12))).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_rejects_bad_arguments() {
        let zero = ToolCall::new("simulate_investment")
            .arg("amount", 0.0)
            .arg("risk_level", "low")
            .arg("months", 12);
        assert!(tool().execute(&zero).await.is_err());

        let bad_risk = ToolCall::new("simulate_investment")
            .arg("amount", 100.0)
            .arg("risk_level", "yolo")
            .arg("months", 12);
        assert!(tool().execute(&bad_risk).await.is_err());
    }
}
