//! HTTP ledger client
//!
//! Posts each call's arguments as JSON to `{base_url}/api/tools/{tool_name}`.

use super::Ledger;
use crate::error::RouterError;
use crate::models::ToolCall;
use crate::Result;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

#[derive(Clone)]
pub struct HttpLedger {
    client: Client,
    base_url: String,
}

impl HttpLedger {
    /// `timeout` bounds the HTTP exchange; the gateway applies its own
    /// per-call timeout on top.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/');
        if base_url.is_empty() {
            return Err(RouterError::Config("ledger base url is empty".to_string()));
        }

        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, tool_name: &str) -> String {
        format!("{}/api/tools/{}", self.base_url, tool_name)
    }

    async fn post_json(&self, tool_name: &str, body: &Value) -> Result<Value> {
        let url = self.url_for(tool_name);
        debug!(%url, "Posting ledger call");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| {
                RouterError::Transport(format!("Ledger request failed for {}: {}", tool_name, e))
            })?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are often plain text or HTML; keep them as text.
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(tool_name, status, detail.trim()));
        }

        let body = response
            .json::<Value>()
            .await
            .map_err(|e| RouterError::Transport(format!("Invalid JSON response: {}", e)))?;

        Ok(body)
    }
}

/// A 4xx other than 408 means the ledger rejected the request itself.
fn status_error(tool_name: &str, status: StatusCode, detail: &str) -> RouterError {
    if status.is_client_error() && status != StatusCode::REQUEST_TIMEOUT {
        RouterError::Validation(format!(
            "Ledger rejected {} with {}: {}",
            tool_name, status, detail
        ))
    } else {
        RouterError::Transport(format!(
            "Ledger returned {} for {}: {}",
            status, tool_name, detail
        ))
    }
}

#[async_trait::async_trait]
impl Ledger for HttpLedger {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn execute(&self, call: &ToolCall) -> Result<Value> {
        let body = Value::Object(call.arguments.clone());
        self.post_json(&call.tool_name, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode as AxumStatus, routing::post, Json, Router};
    use serde_json::json;

    /// Serves the given ledger app on an ephemeral local port.
    async fn serve(app: Router) -> HttpLedger {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        HttpLedger::new(&format!("http://{}", addr), Duration::from_secs(2)).unwrap()
    }

    #[test]
    fn test_url_building_trims_slashes() {
        let ledger =
            HttpLedger::new("http://ledger.local:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(ledger.base_url(), "http://ledger.local:8080");
        assert_eq!(
            ledger.url_for("add_transaction"),
            "http://ledger.local:8080/api/tools/add_transaction"
        );
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        assert!(matches!(
            HttpLedger::new("  ", Duration::from_secs(1)),
            Err(RouterError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_ledger_is_transport_error() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let ledger = HttpLedger::new("http://127.0.0.1:9", Duration::from_millis(500)).unwrap();
        let err = ledger
            .execute(&ToolCall::new("list_tasks"))
            .await
            .unwrap_err();
        assert!(matches!(err, RouterError::Transport(_)));
    }

    #[tokio::test]
    async fn test_plain_text_rejection_is_validation_error() {
        let app = Router::new().route(
            "/api/tools/add_transaction",
            post(|| async { (AxumStatus::BAD_REQUEST, "amount must be positive") }),
        );
        let ledger = serve(app).await;

        let err = ledger
            .execute(&ToolCall::new("add_transaction").arg("amount", -5.0))
            .await
            .unwrap_err();
        match err {
            RouterError::Validation(message) => {
                assert!(message.contains("amount must be positive"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_server_error_and_request_timeout_are_transport() {
        let app = Router::new()
            .route(
                "/api/tools/list_tasks",
                post(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "<html>oops</html>") }),
            )
            .route(
                "/api/tools/get_health_score",
                post(|| async { (AxumStatus::REQUEST_TIMEOUT, "slow") }),
            );
        let ledger = serve(app).await;

        for tool in ["list_tasks", "get_health_score"] {
            let err = ledger.execute(&ToolCall::new(tool)).await.unwrap_err();
            assert!(matches!(err, RouterError::Transport(_)), "{}", tool);
        }
    }

    #[tokio::test]
    async fn test_success_body_is_returned() {
        let app = Router::new().route(
            "/api/tools/get_health_score",
            post(|| async { Json(json!({"score": 72, "grade": "B"})) }),
        );
        let ledger = serve(app).await;

        let result = ledger.execute(&ToolCall::new("get_health_score")).await.unwrap();
        assert_eq!(result["score"], 72);
    }
}
