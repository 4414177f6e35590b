//! Domain skills
//!
//! Each operation turns one classified request into exactly one ToolCall
//! and renders the outcome. Figures shown to the user come from the tool
//! result, falling back only to the arguments the call was validated with.

pub mod budget;
pub mod investment;
pub mod spending;
pub mod task;

pub use budget::BudgetSkill;
pub use investment::InvestmentSkill;
pub use spending::SpendingSkill;
pub use task::TaskSkill;

use crate::error::RouterError;
use crate::models::{ExtractedEntities, Language, SkillResult};
use chrono::NaiveDate;
use serde_json::Value;
use tracing::warn;

/// Everything a skill operation may read.
#[derive(Debug, Clone)]
pub struct SkillContext {
    pub entities: ExtractedEntities,
    /// Currency for replies: the one the user named, else the default.
    pub currency: String,
    pub language: Language,
    pub today: NaiveDate,
}

/// Convert a gateway error into the user-facing failure for this tool.
pub(crate) fn failed(tool_name: &str, error: RouterError) -> SkillResult {
    warn!(tool_name, error = %error, "Skill operation failed");
    SkillResult::failure(error.kind()).with_tool_call(tool_name)
}

pub(crate) fn number_field(value: &Value, key: &str) -> Option<f64> {
    value.get(key).and_then(|v| v.as_f64())
}

pub(crate) fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(|v| v.as_str()).map(|s| s.to_string())
}

/// An empty object, null, or an object with no fields at all.
pub(crate) fn is_empty_result(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

pub(crate) fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}
