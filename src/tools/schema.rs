//! Tool schemas and argument validation
//!
//! The registry is built once at startup and shared read-only. Every
//! ToolCall is checked against it before any backend sees the call.

use crate::error::RouterError;
use crate::models::ToolCall;
use crate::Result;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// `YYYY-MM-DD` string
    Date,
}

impl FieldType {
    fn accepts(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.as_f64().map(f64::is_finite).unwrap_or(false),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Date => value
                .as_str()
                .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok())
                .unwrap_or(false),
        }
    }
}

/// Where a tool runs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Ledger,
    /// Evaluated in-process; never leaves the router.
    Compute,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolSchema {
    pub tool_name: String,
    pub required_fields: Vec<(String, FieldType)>,
    pub optional_fields: Vec<(String, FieldType)>,
    pub backend: Backend,
}

impl ToolSchema {
    pub fn ledger(tool_name: &str) -> Self {
        Self {
            tool_name: tool_name.to_string(),
            required_fields: Vec::new(),
            optional_fields: Vec::new(),
            backend: Backend::Ledger,
        }
    }

    pub fn compute(tool_name: &str) -> Self {
        Self {
            backend: Backend::Compute,
            ..Self::ledger(tool_name)
        }
    }

    pub fn required(mut self, field: &str, ty: FieldType) -> Self {
        self.required_fields.push((field.to_string(), ty));
        self
    }

    pub fn optional(mut self, field: &str, ty: FieldType) -> Self {
        self.optional_fields.push((field.to_string(), ty));
        self
    }

    fn field_type(&self, field: &str) -> Option<FieldType> {
        self.required_fields
            .iter()
            .chain(self.optional_fields.iter())
            .find(|(name, _)| name == field)
            .map(|(_, ty)| *ty)
    }

    /// Check arguments against this schema.
    pub fn validate(&self, arguments: &serde_json::Map<String, Value>) -> Result<()> {
        for (field, _) in &self.required_fields {
            if !arguments.contains_key(field) {
                return Err(RouterError::Validation(format!(
                    "{}: missing required field '{}'",
                    self.tool_name, field
                )));
            }
        }

        for (field, value) in arguments {
            let ty = self.field_type(field).ok_or_else(|| {
                RouterError::Validation(format!(
                    "{}: unknown field '{}'",
                    self.tool_name, field
                ))
            })?;
            if !ty.accepts(value) {
                return Err(RouterError::Validation(format!(
                    "{}: field '{}' expected {:?}, got {}",
                    self.tool_name, field, ty, value
                )));
            }
        }

        Ok(())
    }
}

/// Read-only schema lookup
#[derive(Debug)]
pub struct SchemaRegistry {
    schemas: HashMap<String, ToolSchema>,
}

impl SchemaRegistry {
    /// Fails on duplicate tool names or a field declared twice.
    pub fn new(schemas: Vec<ToolSchema>) -> Result<Self> {
        let mut map = HashMap::with_capacity(schemas.len());

        for schema in schemas {
            let mut names: Vec<&str> = schema
                .required_fields
                .iter()
                .chain(schema.optional_fields.iter())
                .map(|(name, _)| name.as_str())
                .collect();
            let declared = names.len();
            names.sort_unstable();
            names.dedup();
            if names.len() != declared {
                return Err(RouterError::Config(format!(
                    "tool schema '{}' declares a field twice",
                    schema.tool_name
                )));
            }

            if map.contains_key(&schema.tool_name) {
                return Err(RouterError::Config(format!(
                    "tool schema '{}' registered twice",
                    schema.tool_name
                )));
            }
            map.insert(schema.tool_name.clone(), schema);
        }

        Ok(Self { schemas: map })
    }

    /// The eight tools the skills call.
    pub fn builtin() -> Result<Self> {
        use FieldType::*;

        Self::new(vec![
            ToolSchema::ledger("get_financial_summary")
                .optional("category", String)
                .optional("period", String),
            ToolSchema::ledger("create_budget")
                .required("category", String)
                .required("limit", Number)
                .optional("period", String)
                .optional("currency", String),
            ToolSchema::ledger("add_transaction")
                .required("amount", Number)
                .required("category", String)
                .required("type", String)
                .optional("date", Date)
                .optional("currency", String)
                .optional("description", String),
            ToolSchema::ledger("analyze_spending")
                .optional("category", String)
                .optional("period", String)
                .optional("start_date", Date)
                .optional("end_date", Date),
            ToolSchema::compute("simulate_investment")
                .required("amount", Number)
                .required("risk_level", String)
                .required("months", Integer)
                .optional("current_balance", Number),
            ToolSchema::ledger("create_task")
                .required("title", String)
                .optional("due_date", Date),
            ToolSchema::ledger("list_tasks").optional("status", String),
            ToolSchema::ledger("get_health_score"),
        ])
    }

    pub fn get(&self, tool_name: &str) -> Option<&ToolSchema> {
        self.schemas.get(tool_name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Resolve the schema for a call and validate its arguments.
    pub fn validate(&self, call: &ToolCall) -> Result<&ToolSchema> {
        let schema = self.get(&call.tool_name).ok_or_else(|| {
            RouterError::Validation(format!("unknown tool '{}'", call.tool_name))
        })?;
        schema.validate(&call.arguments)?;
        Ok(schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> SchemaRegistry {
        SchemaRegistry::builtin().unwrap()
    }

    #[test]
    fn test_builtin_registry_has_all_tools() {
        assert_eq!(
            registry().tool_names(),
            vec![
                "add_transaction",
                "analyze_spending",
                "create_budget",
                "create_task",
                "get_financial_summary",
                "get_health_score",
                "list_tasks",
                "simulate_investment",
            ]
        );
    }

    #[test]
    fn test_valid_call_passes() {
        let call = ToolCall::new("add_transaction")
            .arg("amount", 500.0)
            .arg("category", "Food")
            .arg("type", "expense")
            .arg("date", "2024-03-14");
        assert_eq!(registry().validate(&call).unwrap().backend, Backend::Ledger);
    }

    #[test]
    fn test_missing_required_field() {
        let call = ToolCall::new("create_budget").arg("category", "Food");
        let err = registry().validate(&call).unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn test_wrong_types_are_rejected() {
        let reg = registry();
        let bad_amount = ToolCall::new("create_budget")
            .arg("category", "Food")
            .arg("limit", "1000");
        assert!(matches!(reg.validate(&bad_amount), Err(RouterError::Validation(_))));

        let bad_date = ToolCall::new("create_task")
            .arg("title", "pay rent")
            .arg("due_date", "tomorrow");
        assert!(reg.validate(&bad_date).is_err());

        let fractional_months = ToolCall::new("simulate_investment")
            .arg("amount", 1000.0)
            .arg("risk_level", "low")
            .arg("months", 1.5);
        assert!(reg.validate(&fractional_months).is_err());
    }

    #[test]
    fn test_unknown_field_and_tool() {
        let reg = registry();
        let extra = ToolCall::new("list_tasks").arg("owner", json!("me"));
        assert!(reg.validate(&extra).is_err());

        let unknown = ToolCall::new("transfer_funds");
        assert!(reg.validate(&unknown).unwrap_err().to_string().contains("unknown tool"));
    }

    #[test]
    fn test_duplicate_schema_is_config_error() {
        let result = SchemaRegistry::new(vec![
            ToolSchema::ledger("list_tasks"),
            ToolSchema::ledger("list_tasks"),
        ]);
        assert!(matches!(result, Err(RouterError::Config(_))));

        let result = SchemaRegistry::new(vec![ToolSchema::ledger("create_task")
            .required("title", FieldType::String)
            .optional("title", FieldType::String)]);
        assert!(result.is_err());
    }
}
