use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use annotate_core::metrics::Confusion;
use annotate_core::model::{ReportError, SessionReport, Task};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persisted shape for a session report.
///
/// This mirrors the domain `SessionReport` so repositories can
/// serialize/deserialize without leaking storage concerns into the domain
/// layer.
#[derive(Debug, Clone)]
pub struct ReportRecord {
    pub task: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub true_positives: u32,
    pub false_positives: u32,
    pub false_negatives: u32,
    pub true_negatives: u32,
}

impl ReportRecord {
    #[must_use]
    pub fn from_report(report: &SessionReport) -> Self {
        let confusion = report.confusion();
        Self {
            task: report.task().discriminator().to_owned(),
            started_at: report.started_at(),
            completed_at: report.completed_at(),
            true_positives: confusion.true_positives(),
            false_positives: confusion.false_positives(),
            false_negatives: confusion.false_negatives(),
            true_negatives: confusion.true_negatives(),
        }
    }

    /// Convert the record back into a domain `SessionReport`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored task is unknown or
    /// the counts fail report validation.
    pub fn into_report(self) -> Result<SessionReport, StorageError> {
        let task: Task = self
            .task
            .parse()
            .map_err(|e: annotate_core::model::ParseTaskError| {
                StorageError::Serialization(e.to_string())
            })?;
        let confusion = Confusion::from_counts(
            self.true_positives,
            self.false_positives,
            self.false_negatives,
            self.true_negatives,
        );
        SessionReport::from_persisted(task, self.started_at, self.completed_at, confusion)
            .map_err(|e: ReportError| StorageError::Serialization(e.to_string()))
    }
}

/// A stored report together with its row identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRow {
    pub id: i64,
    pub report: SessionReport,
}

impl ReportRow {
    #[must_use]
    pub fn new(id: i64, report: SessionReport) -> Self {
        Self { id, report }
    }
}

/// Repository contract for completed session reports.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Append a completed report and return its row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the report cannot be stored.
    async fn append_report(&self, report: &SessionReport) -> Result<i64, StorageError>;

    /// Fetch a report by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_report(&self, id: i64) -> Result<SessionReport, StorageError>;

    /// List stored reports, newest first.
    ///
    /// Filters are optional: by task, and by a `completed_at` window.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on repository failures.
    async fn list_reports(
        &self,
        task: Option<Task>,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<ReportRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    reports: Arc<Mutex<Vec<SessionReport>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            reports: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<SessionReport>>, StorageError> {
        self.reports
            .lock()
            .map_err(|_| StorageError::Connection("poisoned lock".into()))
    }
}

#[async_trait]
impl ReportRepository for InMemoryRepository {
    async fn append_report(&self, report: &SessionReport) -> Result<i64, StorageError> {
        let mut reports = self.lock()?;
        reports.push(report.clone());
        i64::try_from(reports.len())
            .map_err(|_| StorageError::Serialization("report id overflow".into()))
    }

    async fn get_report(&self, id: i64) -> Result<SessionReport, StorageError> {
        let reports = self.lock()?;
        let index = usize::try_from(id.checked_sub(1).ok_or(StorageError::NotFound)?)
            .map_err(|_| StorageError::NotFound)?;
        reports.get(index).cloned().ok_or(StorageError::NotFound)
    }

    async fn list_reports(
        &self,
        task: Option<Task>,
        completed_from: Option<DateTime<Utc>>,
        completed_until: Option<DateTime<Utc>>,
        limit: u32,
    ) -> Result<Vec<ReportRow>, StorageError> {
        let reports = self.lock()?;
        let mut rows: Vec<ReportRow> = reports
            .iter()
            .enumerate()
            .filter(|(_, report)| task.is_none_or(|t| report.task() == t))
            .filter(|(_, report)| completed_from.is_none_or(|from| report.completed_at() >= from))
            .filter(|(_, report)| {
                completed_until.is_none_or(|until| report.completed_at() <= until)
            })
            .map(|(index, report)| ReportRow::new(index as i64 + 1, report.clone()))
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse((row.report.completed_at(), row.id)));
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}
