//! Audit trail
//!
//! One record per handled turn. The input text itself is never stored,
//! only its SHA-256, so a record can be matched against a transcript
//! without keeping user content around.

use crate::models::{Intent, TurnOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::VecDeque;
use tokio::sync::RwLock;
use uuid::Uuid;

const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub audit_id: Uuid,
    pub session_id: String,
    pub generation: u64,
    pub intent: Intent,
    pub confidence: f32,
    /// Tools the turn called, in call order.
    pub tool_calls: Vec<String>,
    pub outcome: TurnOutcome,
    pub clarification: bool,
    pub date_low_confidence: bool,
    pub text_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Bounded in-memory audit trail; the oldest records are dropped first.
pub struct AuditLog {
    records: RwLock<VecDeque<AuditRecord>>,
    capacity: usize,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: RwLock::new(VecDeque::new()),
            capacity: capacity.max(1),
        }
    }

    pub async fn record(&self, record: AuditRecord) -> Uuid {
        let audit_id = record.audit_id;
        let mut records = self.records.write().await;
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
        audit_id
    }

    pub async fn get(&self, audit_id: Uuid) -> Option<AuditRecord> {
        let records = self.records.read().await;
        records.iter().find(|r| r.audit_id == audit_id).cloned()
    }

    /// Records for a session, oldest first.
    pub async fn list_for_session(&self, session_id: &str) -> Vec<AuditRecord> {
        let records = self.records.read().await;
        records
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    /// Whether `text` is the input the record was written for.
    pub async fn matches_input(&self, audit_id: Uuid, text: &str) -> bool {
        match self.get(audit_id).await {
            Some(record) => record.text_hash == compute_text_hash(text),
            None => false,
        }
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Hex SHA-256 of the raw input text.
pub fn compute_text_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
