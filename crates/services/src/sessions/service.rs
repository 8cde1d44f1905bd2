use chrono::{DateTime, Utc};
use std::fmt;

use annotate_core::model::{Item, ItemId, Label, SessionReport, Task};

use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── DECISIONS ─────────────────────────────────────────────────────────────────
//

/// Captures one confirmed judgment within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionDecision {
    pub item_id: ItemId,
    pub gold: Label,
    pub given: Label,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory annotation session over a fixed, ordered set of items.
///
/// Steps through the items sequentially, recording exactly one label per
/// item. The cursor only moves forward; there is no way to revisit or undo a
/// confirmed decision.
pub struct AnnotationSession {
    task: Task,
    items: Vec<Item>,
    current: usize,
    decisions: Vec<SessionDecision>,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    report_id: Option<i64>,
}

impl AnnotationSession {
    /// Create a new session over the given items.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no items are provided.
    pub fn new(
        task: Task,
        items: Vec<Item>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            task,
            items,
            current: 0,
            decisions: Vec::new(),
            started_at,
            completed_at: None,
            report_id: None,
        })
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
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn report_id(&self) -> Option<i64> {
        self.report_id
    }

    #[must_use]
    pub fn decisions(&self) -> &[SessionDecision] {
        &self.decisions
    }

    /// Total number of items in this session.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.items.len()
    }

    /// Number of items that have already been labeled.
    #[must_use]
    pub fn answered_count(&self) -> usize {
        self.decisions.len()
    }

    /// Number of remaining items that have not been labeled yet.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items.len().saturating_sub(self.current)
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.total_items(),
            answered: self.answered_count(),
            remaining: self.remaining(),
            is_complete: self.is_complete(),
        }
    }

    #[must_use]
    pub fn current_item(&self) -> Option<&Item> {
        self.items.get(self.current)
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Confirm a label for the current item and advance the session.
    ///
    /// `at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoSelection` when `choice` is `None`; the
    /// session is left untouched so the caller can re-prompt. Returns
    /// `SessionError::Completed` if the session is already finished.
    pub fn submit(
        &mut self,
        choice: Option<Label>,
        at: DateTime<Utc>,
    ) -> Result<&SessionDecision, SessionError> {
        let Some(given) = choice else {
            return Err(SessionError::NoSelection);
        };

        let Some(item) = self.items.get(self.current) else {
            return Err(SessionError::Completed);
        };

        self.decisions.push(SessionDecision {
            item_id: item.id(),
            gold: item.gold(),
            given,
        });

        self.current += 1;
        if self.current >= self.items.len() {
            self.completed_at = Some(at);
        }

        self.decisions.last().ok_or(SessionError::Completed)
    }

    /// Score the collected decisions against the gold labels.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Incomplete` if any item is still unlabeled.
    pub fn build_report(
        &self,
        completed_at: DateTime<Utc>,
    ) -> Result<SessionReport, SessionError> {
        if !self.is_complete() {
            return Err(SessionError::Incomplete);
        }

        let pairs: Vec<_> = self
            .decisions
            .iter()
            .map(|decision| (decision.gold, decision.given))
            .collect();
        Ok(SessionReport::from_decisions(
            self.task,
            self.started_at,
            completed_at,
            &pairs,
        )?)
    }

    pub(crate) fn set_report_id(&mut self, id: i64) {
        self.report_id = Some(id);
    }
}

impl fmt::Debug for AnnotationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnnotationSession")
            .field("task", &self.task)
            .field("items_len", &self.items.len())
            .field("current", &self.current)
            .field("decisions_len", &self.decisions.len())
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .field("report_id", &self.report_id)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use annotate_core::time::fixed_now;

    fn build_item(id: u64, gold: Label) -> Item {
        Item::new(ItemId::new(id), format!("text {id}"), None, gold).unwrap()
    }

    fn build_session(golds: &[Label]) -> AnnotationSession {
        let items = golds
            .iter()
            .enumerate()
            .map(|(i, &gold)| build_item(i as u64, gold))
            .collect();
        AnnotationSession::new(Task::HateSpeech, items, fixed_now()).unwrap()
    }

    #[test]
    fn empty_session_returns_error() {
        let err = AnnotationSession::new(Task::FakeNews, Vec::new(), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn session_advances_and_completes() {
        let mut session = build_session(&[Label::Positive, Label::Negative]);

        assert!(!session.is_complete());
        let first_id = session.current_item().unwrap().id();
        let decision = session.submit(Some(Label::Positive), fixed_now()).unwrap();
        assert_eq!(decision.item_id, first_id);
        assert!(!session.is_complete());

        session.submit(Some(Label::Negative), fixed_now()).unwrap();
        assert!(session.is_complete());
        assert_eq!(session.completed_at(), Some(fixed_now()));
        assert_eq!(session.progress().fraction(), 1.0);
    }

    #[test]
    fn no_selection_leaves_the_session_untouched() {
        let mut session = build_session(&[Label::Positive, Label::Negative]);
        session.submit(Some(Label::Positive), fixed_now()).unwrap();

        let err = session.submit(None, fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::NoSelection));
        assert_eq!(session.answered_count(), 1);
        assert_eq!(session.current_item().unwrap().id(), ItemId::new(1));
    }

    #[test]
    fn submit_after_completion_fails() {
        let mut session = build_session(&[Label::Positive]);
        session.submit(Some(Label::Positive), fixed_now()).unwrap();

        let err = session.submit(Some(Label::Negative), fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Completed));
        assert!(session.current_item().is_none());
    }

    #[test]
    fn progress_is_monotone_and_bounded() {
        let mut session = build_session(&[Label::Positive; 5]);
        let mut last = session.progress().fraction();
        assert_eq!(last, 0.0);

        while !session.is_complete() {
            session.submit(Some(Label::Negative), fixed_now()).unwrap();
            let fraction = session.progress().fraction();
            assert!(fraction >= last);
            assert!((0.0..=1.0).contains(&fraction));
            last = fraction;
        }
        assert_eq!(last, 1.0);
    }

    #[test]
    fn report_before_completion_fails() {
        let mut session = build_session(&[Label::Positive, Label::Negative]);
        session.submit(Some(Label::Positive), fixed_now()).unwrap();

        let err = session.build_report(fixed_now()).unwrap_err();
        assert!(matches!(err, SessionError::Incomplete));
    }

    #[test]
    fn matching_decisions_score_perfectly() {
        let golds = [Label::Positive, Label::Negative, Label::Positive];
        let mut session = build_session(&golds);
        for gold in golds {
            session.submit(Some(gold), fixed_now()).unwrap();
        }

        let report = session.build_report(fixed_now()).unwrap();
        assert_eq!(report.accuracy(), 1.0);
        assert_eq!(report.f1(), 1.0);
    }

    #[test]
    fn complemented_decisions_score_zero_accuracy() {
        let golds = [Label::Positive, Label::Negative, Label::Positive];
        let mut session = build_session(&golds);
        for gold in golds {
            session.submit(Some(gold.complement()), fixed_now()).unwrap();
        }

        let report = session.build_report(fixed_now()).unwrap();
        assert_eq!(report.accuracy(), 0.0);
    }

    #[test]
    fn two_of_three_scenario_scores_two_thirds() {
        // gold = [1, 0, 1], submitted = [1, 0, 0]
        let mut session = build_session(&[Label::Positive, Label::Negative, Label::Positive]);
        session.submit(Some(Label::Positive), fixed_now()).unwrap();
        session.submit(Some(Label::Negative), fixed_now()).unwrap();
        session.submit(Some(Label::Negative), fixed_now()).unwrap();

        assert!(session.is_complete());
        assert!(session.current_item().is_none());

        let report = session.build_report(fixed_now()).unwrap();
        assert!((report.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        assert!((report.f1() - 2.0 / 3.0).abs() < 1e-12);
    }
}
