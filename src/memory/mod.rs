//! Conversation memory
//!
//! Per-session turn history, dialogue state and language, bounded by a
//! sliding window and an idle TTL.

pub mod session;
pub mod store;

pub use session::{ConversationSession, DialogueState};
pub use store::{ConversationStore, Exchange, TurnSnapshot};
