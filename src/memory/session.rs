//! A single conversation session

use crate::models::{ExtractedEntities, Intent, IntentResult, Language, Role, Turn};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Dialogue state machine: IDLE → AWAITING_CLARIFICATION → IDLE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DialogueState {
    #[default]
    Idle,
    AwaitingClarification {
        intent: Intent,
        entities: ExtractedEntities,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub session_id: String,
    pub language: Language,
    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub ttl_seconds: u64,
    pub state: DialogueState,
    /// Bumped by every router pass; older passes may not write.
    pub generation: u64,
    next_seq: u64,
    context_window: usize,
    turns: VecDeque<Turn>,
}

impl ConversationSession {
    pub fn new(
        session_id: impl Into<String>,
        now: DateTime<Utc>,
        ttl_seconds: u64,
        context_window: usize,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            language: Language::default(),
            created_at: now,
            last_active_at: now,
            ttl_seconds,
            state: DialogueState::Idle,
            generation: 0,
            next_seq: 0,
            context_window: context_window.max(1),
            turns: VecDeque::with_capacity(context_window),
        }
    }

    /// The one expiry predicate, shared by the lazy path and the sweep.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.last_active_at > Duration::seconds(self.ttl_seconds as i64)
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active_at = now;
    }

    /// Drop everything the user said. Counters stay monotonic so a pass
    /// started before the wipe still cannot write.
    pub fn wipe(&mut self, now: DateTime<Utc>) {
        self.turns.clear();
        self.state = DialogueState::Idle;
        self.language = Language::default();
        self.created_at = now;
        self.last_active_at = now;
    }

    /// Generations come from the store, so they stay increasing even across
    /// a reset that recreates the session.
    pub fn begin_generation(&mut self, generation: u64) -> u64 {
        self.generation = self.generation.max(generation);
        self.generation
    }

    /// Append with a fresh sequence number, evicting the oldest turn once
    /// the window is full.
    pub fn push_turn(&mut self, mut turn: Turn) {
        turn.seq = self.next_seq;
        self.next_seq += 1;
        self.turns.push_back(turn);
        while self.turns.len() > self.context_window {
            self.turns.pop_front();
        }
    }

    pub fn turns(&self) -> impl DoubleEndedIterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn turn_count(&self) -> usize {
        self.turns.len()
    }

    pub fn last_user_intent(&self) -> Option<&IntentResult> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .and_then(|t| t.intent.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut session = ConversationSession::new("s1", now(), 60, 3);
        for i in 0..5 {
            session.push_turn(Turn::assistant(format!("reply {}", i), 1, now()));
        }

        let seqs: Vec<u64> = session.turns().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert_eq!(session.turn_count(), 3);
    }

    #[test]
    fn test_expiry_is_strictly_after_ttl() {
        let session = ConversationSession::new("s1", now(), 60, 3);
        assert!(!session.is_expired(now() + Duration::seconds(60)));
        assert!(session.is_expired(now() + Duration::seconds(61)));
    }

    #[test]
    fn test_wipe_keeps_counters() {
        let mut session = ConversationSession::new("s1", now(), 60, 3);
        session.begin_generation(1);
        session.push_turn(Turn::assistant("hello", 1, now()));
        session.language = Language::Ur;

        session.wipe(now());
        assert_eq!(session.turn_count(), 0);
        assert_eq!(session.generation, 1);
        assert_eq!(session.language, Language::En);

        session.push_turn(Turn::assistant("again", 1, now()));
        assert_eq!(session.turns().next().map(|t| t.seq), Some(1));
    }
}
