use crate::error::RouterError;
use crate::ledger::{InMemoryLedger, Ledger};
use crate::models::ToolCall;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

/// Runs `f` with temporary environment variable overrides under a global
/// process-wide lock to avoid cross-test races.
pub(crate) fn with_locked_env<T>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> T) -> T {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    let _guard = LOCK
        .get_or_init(|| Mutex::new(()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());

    let previous = vars
        .iter()
        .map(|(name, _)| ((*name).to_string(), std::env::var(name).ok()))
        .collect::<Vec<_>>();

    for (name, value) in vars {
        set_or_remove(name, *value);
    }

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

    for (name, value) in &previous {
        set_or_remove(name, value.as_deref());
    }

    match result {
        Ok(output) => output,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn set_or_remove(name: &str, value: Option<&str>) {
    match value {
        Some(v) => {
            #[allow(unused_unsafe)]
            unsafe {
                std::env::set_var(name, v);
            }
        }
        None => {
            #[allow(unused_unsafe)]
            unsafe {
                std::env::remove_var(name);
            }
        }
    }
}

/// Ledger that records every call it receives. Serves canned responses
/// where configured and falls back to an in-memory ledger otherwise.
pub(crate) struct SpyLedger {
    calls: Mutex<Vec<ToolCall>>,
    canned: HashMap<String, Value>,
    inner: InMemoryLedger,
    delay: Option<Duration>,
    fail_transport: bool,
}

impl SpyLedger {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            canned: HashMap::new(),
            inner: InMemoryLedger::new(),
            delay: None,
            fail_transport: false,
        }
    }

    pub(crate) fn respond(mut self, tool_name: &str, response: Value) -> Self {
        self.canned.insert(tool_name.to_string(), response);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn unreachable(mut self) -> Self {
        self.fail_transport = true;
        self
    }

    pub(crate) fn calls(&self) -> Vec<ToolCall> {
        self.calls
            .lock()
            .map(|calls| calls.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl Ledger for SpyLedger {
    fn name(&self) -> &'static str {
        "spy"
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call.clone());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_transport {
            return Err(RouterError::Transport("ledger unreachable".to_string()));
        }
        match self.canned.get(&call.tool_name) {
            Some(response) => Ok(response.clone()),
            None => self.inner.execute(call).await,
        }
    }
}
