//! Month-over-month analytics snapshot.

use serde::{Deserialize, Serialize};

/// A metric's count for the current month and its change from last month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDelta {
    /// Matches in the current calendar month.
    pub count: u64,
    /// `count` minus the previous calendar month's matches. May be negative.
    pub difference: i64,
}

impl MetricDelta {
    /// Builds a delta from the two window counts.
    #[must_use]
    pub fn between(this_month: u64, last_month: u64) -> Self {
        let this = i64::try_from(this_month).unwrap_or(i64::MAX);
        let last = i64::try_from(last_month).unwrap_or(i64::MAX);
        Self {
            count: this_month,
            difference: this.saturating_sub(last),
        }
    }
}

/// Analytics for a workspace or a project.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSnapshot {
    /// All tasks created.
    pub tasks: MetricDelta,
    /// Tasks assigned to the caller's membership.
    pub assigned: MetricDelta,
    /// Tasks whose status is not `DONE`.
    pub incomplete: MetricDelta,
    /// Tasks whose status is `DONE`.
    pub completed: MetricDelta,
    /// Tasks not `DONE` whose due date has passed.
    pub overdue: MetricDelta,
}
