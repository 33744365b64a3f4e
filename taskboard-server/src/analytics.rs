//! Month-over-month task analytics.
//!
//! Each metric is counted twice, once per calendar month window keyed on the
//! task's creation time, and reported as this month's count plus its change
//! from last month. The ten counts are independent reads and run
//! concurrently.
//!
//! "Overdue" compares the due date against `now`, not against the window, so
//! a task created in a previous month still counts as overdue in that month's
//! window if it is late today.

use chrono::{DateTime, Datelike, Months, Utc};
use futures_util::future::try_join_all;
use taskboard_proto::analytics::{AnalyticsSnapshot, MetricDelta};
use taskboard_proto::model::TaskStatus;

use crate::store::query::timestamp;
use crate::store::{CREATED_AT_FIELD, Collection, DocumentStore, Query, StoreError};

/// A half-open Gregorian calendar month `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl MonthWindow {
    /// The month containing `instant`.
    ///
    /// Returns `None` only at the edges of the representable date range.
    #[must_use]
    pub fn containing(instant: DateTime<Utc>) -> Option<Self> {
        let start = instant
            .date_naive()
            .with_day(1)?
            .and_hms_opt(0, 0, 0)?
            .and_utc();
        let end = start.checked_add_months(Months::new(1))?;
        Some(Self { start, end })
    }

    /// The month before this one.
    #[must_use]
    pub fn previous(self) -> Option<Self> {
        let start = self.start.checked_sub_months(Months::new(1))?;
        Some(Self {
            start,
            end: self.start,
        })
    }

    fn restrict(self, query: Query) -> Query {
        query
            .greater_than_equal(CREATED_AT_FIELD, timestamp(self.start))
            .less_than(CREATED_AT_FIELD, timestamp(self.end))
    }
}

/// The five counted metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Tasks,
    Assigned,
    Incomplete,
    Completed,
    Overdue,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Tasks,
        Self::Assigned,
        Self::Incomplete,
        Self::Completed,
        Self::Overdue,
    ];

    fn restrict(self, query: Query, member_id: &str, now: DateTime<Utc>) -> Query {
        let done = TaskStatus::Done.as_str();
        match self {
            Self::Tasks => query,
            Self::Assigned => query.equal("assigneeId", member_id),
            Self::Incomplete => query.not_equal("status", done),
            Self::Completed => query.equal("status", done),
            Self::Overdue => query
                .not_equal("status", done)
                .less_than("dueDate", timestamp(now)),
        }
    }
}

/// Which tasks the analytics cover: a whole workspace or one project in it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsScope {
    pub workspace_id: String,
    pub project_id: Option<String>,
}

impl AnalyticsScope {
    #[must_use]
    pub fn workspace(workspace_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            project_id: None,
        }
    }

    #[must_use]
    pub fn project(workspace_id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            project_id: Some(project_id.into()),
        }
    }

    fn base_query(&self) -> Query {
        let query = Query::new().equal("workspaceId", self.workspace_id.as_str());
        match &self.project_id {
            Some(project_id) => query.equal("projectId", project_id.as_str()),
            None => query,
        }
    }
}

/// Computes the analytics snapshot for `scope` as seen by the member
/// `member_id` at `now`.
///
/// # Errors
///
/// Propagates the first failing count. Returns [`StoreError::Backend`] if
/// `now` is at the edge of the representable calendar.
pub async fn compute_analytics<S: DocumentStore>(
    store: &S,
    scope: &AnalyticsScope,
    member_id: &str,
    now: DateTime<Utc>,
) -> Result<AnalyticsSnapshot, StoreError> {
    let this_month = MonthWindow::containing(now)
        .ok_or_else(|| StoreError::Backend(format!("no calendar month contains {now}")))?;
    let last_month = this_month
        .previous()
        .ok_or_else(|| StoreError::Backend(format!("no calendar month precedes {now}")))?;

    // Two queries per metric, this month first.
    let queries: Vec<Query> = Metric::ALL
        .iter()
        .flat_map(|metric| {
            [this_month, last_month].map(|window| {
                window.restrict(metric.restrict(scope.base_query(), member_id, now))
            })
        })
        .collect();

    let counts = try_join_all(
        queries
            .iter()
            .map(|query| store.count(Collection::Tasks, query)),
    )
    .await?;

    let delta = |metric: Metric| {
        let index = metric as usize * 2;
        MetricDelta::between(counts[index], counts[index + 1])
    };

    tracing::debug!(
        workspace_id = %scope.workspace_id,
        project_id = ?scope.project_id,
        "analytics computed"
    );

    Ok(AnalyticsSnapshot {
        tasks: delta(Metric::Tasks),
        assigned: delta(Metric::Assigned),
        incomplete: delta(Metric::Incomplete),
        completed: delta(Metric::Completed),
        overdue: delta(Metric::Overdue),
    })
}
