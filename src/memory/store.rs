//! Conversation store
//!
//! Keyed map of per-session mutexes. Same-session access is serialized by
//! the session's own lock; different sessions never contend beyond the
//! brief map lookup.

use super::session::{ConversationSession, DialogueState};
use crate::clock::Clock;
use crate::models::{IntentResult, Language, Turn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// What a router pass needs from the session, taken at the start of a turn.
#[derive(Debug, Clone)]
pub struct TurnSnapshot {
    pub generation: u64,
    pub language: Language,
    pub state: DialogueState,
    pub last_user_intent: Option<IntentResult>,
}

/// The outcome of one router pass, written back in a single step.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub generation: u64,
    pub language: Language,
    pub user: Turn,
    pub assistant: Turn,
    pub state: DialogueState,
}

pub struct ConversationStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<ConversationSession>>>>,
    /// Store-wide, so a session recreated after a reset or purge starts
    /// above every generation already handed out.
    generations: AtomicU64,
    clock: Arc<dyn Clock>,
    ttl_seconds: u64,
    context_window: usize,
}

impl ConversationStore {
    pub fn new(clock: Arc<dyn Clock>, ttl_seconds: u64, context_window: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generations: AtomicU64::new(0),
            clock,
            ttl_seconds,
            context_window,
        }
    }

    async fn existing(&self, session_id: &str) -> Option<Arc<Mutex<ConversationSession>>> {
        self.sessions.read().await.get(session_id).cloned()
    }

    /// Existing session or a fresh one. Only a new turn creates a session.
    async fn session(&self, session_id: &str) -> Arc<Mutex<ConversationSession>> {
        if let Some(session) = self.sessions.read().await.get(session_id) {
            return session.clone();
        }

        let mut sessions = self.sessions.write().await;
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| {
                debug!(session_id, "Creating session");
                Arc::new(Mutex::new(ConversationSession::new(
                    session_id,
                    self.clock.now(),
                    self.ttl_seconds,
                    self.context_window,
                )))
            })
            .clone()
    }

    /// Lazy expiry: an expired session is wiped before anyone reads it.
    fn expire_if_needed(&self, session: &mut ConversationSession) {
        let now = self.clock.now();
        if session.is_expired(now) {
            info!(session_id = %session.session_id, "Session expired, wiping");
            session.wipe(now);
        }
    }

    /// Start a router pass: bump the generation and snapshot the state the
    /// classifier needs.
    pub async fn begin_turn(&self, session_id: &str) -> TurnSnapshot {
        let handle = self.session(session_id).await;
        let mut session = handle.lock().await;
        self.expire_if_needed(&mut session);

        let issued = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let generation = session.begin_generation(issued);
        session.touch(self.clock.now());

        TurnSnapshot {
            generation,
            language: session.language,
            state: session.state.clone(),
            last_user_intent: session.last_user_intent().cloned(),
        }
    }

    /// Write a finished pass back. Returns false (and writes nothing) when a
    /// newer pass has started on the same session, or the session was reset
    /// or purged in the meantime.
    pub async fn commit_exchange(&self, session_id: &str, exchange: Exchange) -> bool {
        let Some(handle) = self.existing(session_id).await else {
            warn!(
                session_id,
                generation = exchange.generation,
                "Discarding turn for a removed session"
            );
            return false;
        };
        let mut session = handle.lock().await;
        self.expire_if_needed(&mut session);

        if exchange.generation < session.generation {
            warn!(
                session_id,
                generation = exchange.generation,
                latest = session.generation,
                "Discarding superseded turn"
            );
            return false;
        }

        session.push_turn(exchange.user);
        session.push_turn(exchange.assistant);
        session.language = exchange.language;
        session.state = exchange.state;
        session.touch(self.clock.now());
        true
    }

    /// Append a single turn. Stale generations are discarded.
    pub async fn append(&self, session_id: &str, turn: Turn) -> bool {
        let Some(handle) = self.existing(session_id).await else {
            warn!(
                session_id,
                generation = turn.generation,
                "Discarding turn for a removed session"
            );
            return false;
        };
        let mut session = handle.lock().await;
        self.expire_if_needed(&mut session);

        if turn.generation < session.generation {
            warn!(
                session_id,
                generation = turn.generation,
                latest = session.generation,
                "Discarding superseded turn"
            );
            return false;
        }

        session.push_turn(turn);
        session.touch(self.clock.now());
        true
    }

    /// Turns in order, oldest first. Empty for unknown or expired sessions.
    pub async fn get_context(&self, session_id: &str) -> Vec<Turn> {
        let Some(handle) = self.existing(session_id).await else {
            return Vec::new();
        };
        let mut session = handle.lock().await;
        self.expire_if_needed(&mut session);
        session.turns().cloned().collect()
    }

    pub async fn language(&self, session_id: &str) -> Option<Language> {
        let handle = self.existing(session_id).await?;
        let session = handle.lock().await;
        Some(session.language)
    }

    /// Destroy a session. Returns whether it existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        let removed = self.sessions.write().await.remove(session_id).is_some();
        if removed {
            info!(session_id, "Session reset");
        }
        removed
    }

    /// Remove every expired session not currently in use. Idempotent.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, handle| match handle.try_lock() {
            Ok(session) => !session.is_expired(now),
            // In use right now, so not idle.
            Err(_) => true,
        });

        let purged = before - sessions.len();
        if purged > 0 {
            info!(purged, remaining = sessions.len(), "Purged expired sessions");
        }
        purged
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Periodic best-effort sweep on the runtime.
    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                self.purge_expired().await;
            }
        })
    }
}
