use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::metrics::Confusion;
use crate::model::{Label, Task};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("report covers no decisions")]
    Empty,

    #[error("too many decisions for a single session: {len}")]
    TooManyDecisions { len: usize },
}

/// Aggregate scoring report for a completed annotation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    task: Task,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    confusion: Confusion,
}

impl SessionReport {
    /// Rehydrate a report from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTimeRange` if `completed_at` is before
    /// `started_at`, or `ReportError::Empty` if the counts are all zero.
    pub fn from_persisted(
        task: Task,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        confusion: Confusion,
    ) -> Result<Self, ReportError> {
        if completed_at < started_at {
            return Err(ReportError::InvalidTimeRange);
        }
        if confusion.total() == 0 {
            return Err(ReportError::Empty);
        }

        Ok(Self {
            task,
            started_at,
            completed_at,
            confusion,
        })
    }

    /// Build a report by scoring `(gold, given)` decision pairs.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidTimeRange` if `completed_at` is before
    /// `started_at`, `ReportError::Empty` for an empty decision list, and
    /// `ReportError::TooManyDecisions` if the count cannot fit in `u32`.
    pub fn from_decisions(
        task: Task,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        decisions: &[(Label, Label)],
    ) -> Result<Self, ReportError> {
        u32::try_from(decisions.len()).map_err(|_| ReportError::TooManyDecisions {
            len: decisions.len(),
        })?;

        let confusion = Confusion::from_pairs(decisions.iter().copied());
        Self::from_persisted(task, started_at, completed_at, confusion)
    }

    #[must_use]
    pub fn task(&self) -> Task {
        self.task
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn confusion(&self) -> Confusion {
        self.confusion
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.confusion.total()
    }

    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.confusion.accuracy()
    }

    #[must_use]
    pub fn f1(&self) -> f64 {
        self.confusion.f1()
    }
}
