use std::sync::Arc;

use annotate_core::model::{Label, Task};
use storage::dataset::DatasetRecord;
use storage::repository::ReportRepository;

use super::plan::SampleBuilder;
use super::service::{AnnotationSession, SessionDecision};
use crate::Clock;
use crate::error::SessionError;

/// Result of confirming a single item in a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSubmitResult {
    pub decision: SessionDecision,
    pub is_complete: bool,
    pub report_id: Option<i64>,
}

/// Orchestrates session start and persisted scoring.
#[derive(Clone)]
pub struct AnnotationLoopService {
    clock: Clock,
    reports: Arc<dyn ReportRepository>,
    sample_size: Option<usize>,
}

impl AnnotationLoopService {
    #[must_use]
    pub fn new(clock: Clock, reports: Arc<dyn ReportRepository>) -> Self {
        Self {
            clock,
            reports,
            sample_size: None,
        }
    }

    /// Override the per-task default sample size.
    #[must_use]
    pub fn with_sample_size(mut self, sample_size: Option<usize>) -> Self {
        self.sample_size = sample_size;
        self
    }

    /// Start a new session by sampling the loaded records for the given task.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` when no records match the task or a matching
    /// record cannot be mapped to an item.
    pub fn start_session(
        &self,
        records: &[DatasetRecord],
        task: Task,
    ) -> Result<AnnotationSession, SessionError> {
        let now = self.clock.now();
        let plan = SampleBuilder::new(task)
            .with_sample_size(self.sample_size)
            .build(records)?;
        AnnotationSession::new(task, plan.items, now)
    }

    /// Confirm a label for the current item; when this completes the session,
    /// score it and persist the report exactly once.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` (nothing recorded) when `choice`
    /// is `None`, `SessionError::Completed` past the end, and storage errors
    /// from report persistence. A persistence failure leaves the decision
    /// recorded; `finalize_report` can retry the append.
    pub async fn submit_current(
        &self,
        session: &mut AnnotationSession,
        choice: Option<Label>,
    ) -> Result<SessionSubmitResult, SessionError> {
        let at = self.clock.now();
        let decision = *session.submit(choice, at)?;

        if session.is_complete() && session.report_id().is_none() {
            let completed_at = session.completed_at().ok_or(SessionError::Incomplete)?;
            let report = session.build_report(completed_at)?;
            let report_id = self.reports.append_report(&report).await?;
            session.set_report_id(report_id);
        }

        Ok(SessionSubmitResult {
            decision,
            is_complete: session.is_complete(),
            report_id: session.report_id(),
        })
    }

    /// Retry report persistence after a completed session.
    ///
    /// This is useful when the final append failed (e.g. transient storage
    /// error); the scores are still held in memory.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if the session is not complete.
    /// Returns `SessionError::Storage` if persistence fails again.
    pub async fn finalize_report(
        &self,
        session: &mut AnnotationSession,
    ) -> Result<i64, SessionError> {
        if let Some(id) = session.report_id() {
            return Ok(id);
        }

        let completed_at = session.completed_at().ok_or(SessionError::Incomplete)?;
        let report = session.build_report(completed_at)?;
        let id = self.reports.append_report(&report).await?;
        session.set_report_id(id);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use annotate_core::time::{fixed_clock, fixed_now};
    use storage::repository::InMemoryRepository;

    fn tweet(hs: u8) -> DatasetRecord {
        DatasetRecord {
            task: Some("hate speech".into()),
            text: format!("tweet {hs}"),
            title: None,
            label: None,
            hs: Some(hs),
            target: None,
        }
    }

    fn service(repo: &InMemoryRepository) -> AnnotationLoopService {
        AnnotationLoopService::new(fixed_clock(), Arc::new(repo.clone()))
    }

    #[tokio::test]
    async fn completing_a_session_persists_the_report_once() {
        let repo = InMemoryRepository::new();
        let loop_svc = service(&repo).with_sample_size(Some(3));
        let records = vec![tweet(1), tweet(0), tweet(1)];

        let mut session = loop_svc.start_session(&records, Task::HateSpeech).unwrap();

        let mut last = None;
        while !session.is_complete() {
            last = Some(
                loop_svc
                    .submit_current(&mut session, Some(Label::Positive))
                    .await
                    .unwrap(),
            );
        }

        let result = last.unwrap();
        assert!(result.is_complete);
        let report_id = result.report_id.expect("report persisted");

        let stored = repo.get_report(report_id).await.unwrap();
        assert_eq!(stored.total(), 3);
        assert_eq!(stored.completed_at(), fixed_now());

        // finalize after success is a no-op returning the same id
        let again = loop_svc.finalize_report(&mut session).await.unwrap();
        assert_eq!(again, report_id);
    }

    #[tokio::test]
    async fn no_selection_does_not_advance_or_persist() {
        let repo = InMemoryRepository::new();
        let loop_svc = service(&repo).with_sample_size(Some(1));
        let records = vec![tweet(1)];

        let mut session = loop_svc.start_session(&records, Task::HateSpeech).unwrap();
        let err = loop_svc
            .submit_current(&mut session, None)
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::NoSelection));
        assert!(!session.is_complete());
        assert!(repo.list_reports(None, None, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn finalize_before_completion_fails() {
        let repo = InMemoryRepository::new();
        let loop_svc = service(&repo).with_sample_size(Some(2));
        let records = vec![tweet(1), tweet(0)];

        let mut session = loop_svc.start_session(&records, Task::HateSpeech).unwrap();
        let err = loop_svc.finalize_report(&mut session).await.unwrap_err();
        assert!(matches!(err, SessionError::Incomplete));
    }
}
