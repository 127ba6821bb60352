//! Lesson access rules.
//!
//! The gate decides how far a request must go before it may see a lesson:
//! free previews are open to everyone, everything else needs an identity and
//! then a purchase (or ownership) that only storage can confirm.

use uuid::Uuid;

/// First stage of an access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Free preview lesson, no further checks
    Open,
    /// Paid lesson requested without an identity
    Unauthenticated,
    /// Paid lesson; the given learner needs a successful purchase
    RequiresPurchase(Uuid),
}

/// Final outcome once purchase state is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDecision {
    /// The caller may watch the lesson
    Allowed,
    /// No identity was presented for a paid lesson
    Unauthenticated,
    /// Known learner without a successful purchase
    NotEnrolled,
}

/// Decide the gate for a lesson from its preview flag and the caller.
pub const fn gate(is_free_preview: bool, learner: Option<Uuid>) -> Gate {
    if is_free_preview {
        return Gate::Open;
    }
    match learner {
        Some(learner_id) => Gate::RequiresPurchase(learner_id),
        None => Gate::Unauthenticated,
    }
}

/// Resolve a gate once the purchase lookup has run.
///
/// `entitled` is only consulted for [`Gate::RequiresPurchase`].
pub const fn resolve(gate: Gate, entitled: bool) -> AccessDecision {
    match gate {
        Gate::Open => AccessDecision::Allowed,
        Gate::Unauthenticated => AccessDecision::Unauthenticated,
        Gate::RequiresPurchase(_) if entitled => AccessDecision::Allowed,
        Gate::RequiresPurchase(_) => AccessDecision::NotEnrolled,
    }
}
