//! Ledger backends
//!
//! The ledger owns all financial records. The router only ever reaches it
//! through this trait, one validated ToolCall at a time.

pub mod http;
pub mod memory;

pub use http::HttpLedger;
pub use memory::InMemoryLedger;

use crate::clock::Clock;
use crate::config::RouterConfig;
use crate::models::ToolCall;
use crate::Result;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[async_trait::async_trait]
pub trait Ledger: Send + Sync {
    fn name(&self) -> &'static str;
    async fn execute(&self, call: &ToolCall) -> Result<Value>;
}

/// The HTTP ledger when a base url is configured, the in-memory one otherwise.
pub fn from_config(config: &RouterConfig, clock: Arc<dyn Clock>) -> Result<Arc<dyn Ledger>> {
    let ledger: Arc<dyn Ledger> = match config.gateway.ledger_base_url.as_deref() {
        Some(url) => Arc::new(HttpLedger::new(
            url,
            Duration::from_millis(config.gateway.timeout_ms),
        )?),
        None => Arc::new(InMemoryLedger::with_clock(clock)),
    };
    info!(ledger = ledger.name(), "Ledger selected");
    Ok(ledger)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SystemClock;

    #[test]
    fn test_ledger_selection() {
        let mut config = RouterConfig::default();
        let ledger = from_config(&config, Arc::new(SystemClock)).unwrap();
        assert_eq!(ledger.name(), InMemoryLedger::new().name());

        config.gateway.ledger_base_url = Some("http://localhost:8000".to_string());
        let ledger = from_config(&config, Arc::new(SystemClock)).unwrap();
        assert_eq!(ledger.name(), "http");
    }
}
