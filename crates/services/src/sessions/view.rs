use chrono::{DateTime, Utc};
use std::sync::Arc;

use annotate_core::model::{SessionReport, Task};
use storage::repository::{ReportRepository, ReportRow};

use crate::Clock;
use crate::error::SessionError;

/// Storage identifier for a persisted session report.
///
/// NOTE: This is currently `i64` to match `SQLite` row IDs.
pub type ReportId = i64;

/// Presentation-agnostic list item for a stored report.
///
/// This is intentionally **not** a UI view-model: no pre-formatted strings,
/// no localization assumptions. The surface may format timestamps and
/// percentages as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportListItem {
    pub id: ReportId,
    pub task: Task,
    pub completed_at: DateTime<Utc>,

    pub total: u32,
    pub accuracy: f64,
    pub f1: f64,
}

impl ReportListItem {
    #[must_use]
    pub fn from_row(row: &ReportRow) -> Self {
        Self {
            id: row.id,
            task: row.report.task(),
            completed_at: row.report.completed_at(),
            total: row.report.total(),
            accuracy: row.report.accuracy(),
            f1: row.report.f1(),
        }
    }
}

/// Presentation-facing report facade that hides repositories and time from
/// the interactive surface.
#[derive(Clone)]
pub struct ReportService {
    clock: Clock,
    reports: Arc<dyn ReportRepository>,
}

impl ReportService {
    #[must_use]
    pub fn new(clock: Clock, reports: Arc<dyn ReportRepository>) -> Self {
        Self { clock, reports }
    }

    /// List stored reports, newest first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list(
        &self,
        task: Option<Task>,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<ReportListItem>, SessionError> {
        let rows = self
            .reports
            .list_reports(task, completed_from, completed_until, limit)
            .await?;
        Ok(rows.iter().map(ReportListItem::from_row).collect())
    }

    /// List reports completed within the last `days` days.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` on repository failures.
    pub async fn list_recent(
        &self,
        task: Option<Task>,
        days: i64,
        limit: u32,
    ) -> Result<Vec<ReportListItem>, SessionError> {
        let now = self.clock.now();
        let from = now - chrono::Duration::days(days);
        self.list(task, Some(from), Some(now), limit).await
    }

    /// Fetch a stored report by ID.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the report is missing or storage
    /// fails.
    pub async fn get(&self, id: ReportId) -> Result<SessionReport, SessionError> {
        let report = self.reports.get_report(id).await?;
        Ok(report)
    }
}
