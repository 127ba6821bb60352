//! Progress and entitlement engine for the course marketplace.
//!
//! This crate holds the storage-free half of the system: every rule that
//! turns raw facts (purchases, lesson progress rows, quiz attempts) into a
//! decision or a rollup lives here, so the HTTP layer and the tests share
//! exactly one definition of "completed", "passed" or "ranked first".

pub mod completion;
pub mod entitlement;
pub mod leaderboard;
pub mod quiz;
pub mod rollup;
pub mod streak;

pub use completion::{Completion, ProgressFact};
pub use entitlement::Gate;
