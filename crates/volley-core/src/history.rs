//! Historical memory records: past resolutions and learned routing patterns.

use serde::{Deserialize, Serialize};

use crate::ids::{PatternId, RecordId, SenderId};

/// A past problem → fix pair, created when a task completes with notes.
///
/// `success_count` is incremented only through the store's explicit
/// record-success operation — retrieval never bumps it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionRecord {
    /// Record identifier.
    pub id: RecordId,
    /// Description of the problem this record addressed.
    pub problem_pattern: String,
    /// What fixed it.
    pub solution: String,
    /// System the fix applied to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
    /// How many times this fix has been confirmed to work.
    pub success_count: u32,
}

/// A learned mapping from a keyword/system to a preferred handler.
///
/// Confidence evolves only through the explicit [`confirmed`](Self::confirmed)
/// and [`conflicted`](Self::conflicted) operations — never silently.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPattern {
    /// Pattern identifier.
    pub id: PatternId,
    /// Keyword or system name this pattern keys on.
    pub key: String,
    /// Preferred assignee.
    pub assignee_id: SenderId,
    /// Confidence in `[0, 1]`.
    pub confidence: f64,
    /// How many times the pattern was applied.
    pub times_used: u32,
    /// How many times a human confirmed the routing.
    pub times_confirmed: u32,
}

impl RoutingPattern {
    /// Apply a confirmation: confidence rises by `step`, capped at 1.0,
    /// and `times_confirmed` increments.
    #[must_use]
    pub fn confirmed(mut self, step: f64) -> Self {
        self.confidence = (self.confidence + step).min(1.0);
        self.times_confirmed += 1;
        self
    }

    /// Apply a conflicting assignment: confidence drops by `step`,
    /// floored at 0.0.
    #[must_use]
    pub fn conflicted(mut self, step: f64) -> Self {
        self.confidence = (self.confidence - step).max(0.0);
        self
    }
}
