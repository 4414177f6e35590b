//! Tool gateway
//!
//! Single exit point from the router to the outside world. Every call is
//! validated against its schema, then either evaluated in-process (compute
//! tools) or sent to the ledger under a timeout. No retries.

pub mod schema;
pub mod simulate;

pub use schema::{Backend, FieldType, SchemaRegistry, ToolSchema};
pub use simulate::SimulateInvestmentTool;

use crate::config::RouterConfig;
use crate::error::RouterError;
use crate::ledger::Ledger;
use crate::models::ToolCall;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// A tool evaluated inside the router.
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    async fn execute(&self, call: &ToolCall) -> Result<Value>;
}

/// Tool registry for looking up compute tools
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ToolGateway {
    schemas: Arc<SchemaRegistry>,
    ledger: Arc<dyn Ledger>,
    compute: ToolRegistry,
    timeout: Duration,
}

impl ToolGateway {
    /// Every compute schema must have a registered tool.
    pub fn new(
        schemas: Arc<SchemaRegistry>,
        ledger: Arc<dyn Ledger>,
        compute: ToolRegistry,
        timeout: Duration,
    ) -> Result<Self> {
        for name in schemas.tool_names() {
            let backend = schemas.get(name).map(|s| s.backend);
            if backend == Some(Backend::Compute) && compute.get(name).is_none() {
                return Err(RouterError::Config(format!(
                    "compute tool '{}' has a schema but no implementation",
                    name
                )));
            }
        }

        Ok(Self {
            schemas,
            ledger,
            compute,
            timeout,
        })
    }

    /// Built-in schemas and compute tools, timeout from config.
    pub fn from_config(config: &RouterConfig, ledger: Arc<dyn Ledger>) -> Result<Self> {
        let mut compute = ToolRegistry::new();
        compute.register(Arc::new(SimulateInvestmentTool::new(
            config.risk_returns.clone(),
        )));

        Self::new(
            Arc::new(SchemaRegistry::builtin()?),
            ledger,
            compute,
            Duration::from_millis(config.gateway.timeout_ms),
        )
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub async fn call(&self, call: &ToolCall) -> Result<Value> {
        let schema = match self.schemas.validate(call) {
            Ok(schema) => schema,
            Err(e) => {
                warn!(tool_name = %call.tool_name, error = %e, "Tool call rejected");
                return Err(e);
            }
        };

        let start = Instant::now();
        let result = match schema.backend {
            Backend::Compute => {
                let tool = self.compute.get(&call.tool_name).ok_or_else(|| {
                    RouterError::Validation(format!("no compute tool '{}'", call.tool_name))
                })?;
                tool.execute(call).await
            }
            Backend::Ledger => {
                match tokio::time::timeout(self.timeout, self.ledger.execute(call)).await {
                    Ok(result) => result,
                    Err(_) => Err(RouterError::Transport(format!(
                        "{} timed out after {} ms",
                        call.tool_name,
                        self.timeout.as_millis()
                    ))),
                }
            }
        };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => debug!(
                tool_name = %call.tool_name,
                backend = ?schema.backend,
                elapsed_ms,
                "Tool call completed"
            ),
            Err(e) => warn!(
                tool_name = %call.tool_name,
                backend = ?schema.backend,
                elapsed_ms,
                error = %e,
                "Tool call failed"
            ),
        }

        result
    }
}
