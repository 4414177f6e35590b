//! Finance Intent Router
//!
//! Deterministic conversational router for a personal-finance assistant:
//! - Classifies English, Urdu and Roman Urdu requests
//! - Extracts amounts, categories, dates and risk levels
//! - Carries multi-turn context per session
//! - Routes each request to exactly one skill and one ledger call
//! - Never lets a reply quote a figure the ledger did not supply
//! - Replies in the user's language, with disclaimers on projections
//!
//! ROUTER PASS:
//! INPUT → EXTRACT → CLASSIFY → PRE-CHECK → DISPATCH → POST-CHECK → TRANSLATE → COMMIT

pub mod api;
pub mod audit;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod extraction;
pub mod ledger;
pub mod memory;
pub mod models;
pub mod router;
pub mod safety;
pub mod skills;
pub mod text;
pub mod tools;
pub mod translation;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Result, RouterError};

// Re-export common types
pub use config::RouterConfig;
pub use models::*;
pub use router::Router;
