//! Binary agreement metrics between collected decisions and gold labels.

use crate::model::Label;

/// Confusion counts for a binary task, with class 1 as the positive class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Confusion {
    true_positives: u32,
    false_positives: u32,
    false_negatives: u32,
    true_negatives: u32,
}

impl Confusion {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rehydrate counts from persisted storage.
    #[must_use]
    pub fn from_counts(
        true_positives: u32,
        false_positives: u32,
        false_negatives: u32,
        true_negatives: u32,
    ) -> Self {
        Self {
            true_positives,
            false_positives,
            false_negatives,
            true_negatives,
        }
    }

    /// Tally the confusion counts over `(gold, given)` pairs.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (Label, Label)>) -> Self {
        let mut confusion = Self::new();
        for (gold, given) in pairs {
            confusion.record(gold, given);
        }
        confusion
    }

    /// Count one decision against its gold label.
    pub fn record(&mut self, gold: Label, given: Label) {
        let slot = match (gold, given) {
            (Label::Positive, Label::Positive) => &mut self.true_positives,
            (Label::Negative, Label::Positive) => &mut self.false_positives,
            (Label::Positive, Label::Negative) => &mut self.false_negatives,
            (Label::Negative, Label::Negative) => &mut self.true_negatives,
        };
        *slot = slot.saturating_add(1);
    }

    #[must_use]
    pub fn true_positives(&self) -> u32 {
        self.true_positives
    }

    #[must_use]
    pub fn false_positives(&self) -> u32 {
        self.false_positives
    }

    #[must_use]
    pub fn false_negatives(&self) -> u32 {
        self.false_negatives
    }

    #[must_use]
    pub fn true_negatives(&self) -> u32 {
        self.true_negatives
    }

    /// Total number of counted decisions.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    /// Number of decisions that matched the gold label.
    #[must_use]
    pub fn correct(&self) -> u32 {
        self.true_positives + self.true_negatives
    }

    /// Fraction of decisions matching gold, in [0, 1]. Empty counts score 0.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        f64::from(self.correct()) / f64::from(total)
    }

    /// F1 of the positive class, in [0, 1].
    ///
    /// When the denominator is zero (no positive predictions and no positive
    /// gold labels) the score is 0, matching the usual zero-division
    /// convention.
    #[must_use]
    pub fn f1(&self) -> f64 {
        let denominator =
            2 * u64::from(self.true_positives)
                + u64::from(self.false_positives)
                + u64::from(self.false_negatives);
        if denominator == 0 {
            return 0.0;
        }
        2.0 * f64::from(self.true_positives) / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(gold: &[u8], given: &[u8]) -> Vec<(Label, Label)> {
        gold.iter()
            .zip(given)
            .map(|(&g, &r)| (Label::from_u8(g).unwrap(), Label::from_u8(r).unwrap()))
            .collect()
    }

    #[test]
    fn perfect_agreement_scores_one() {
        let confusion = Confusion::from_pairs(pairs(&[1, 0, 1, 0], &[1, 0, 1, 0]));
        assert_eq!(confusion.accuracy(), 1.0);
        assert_eq!(confusion.f1(), 1.0);
    }

    #[test]
    fn complement_scores_zero_accuracy() {
        let confusion = Confusion::from_pairs(pairs(&[1, 0, 1], &[0, 1, 0]));
        assert_eq!(confusion.accuracy(), 0.0);
        assert_eq!(confusion.f1(), 0.0);
    }

    #[test]
    fn two_of_three_scenario() {
        // gold = [1, 0, 1], submitted = [1, 0, 0]
        let confusion = Confusion::from_pairs(pairs(&[1, 0, 1], &[1, 0, 0]));
        assert_eq!(confusion.true_positives(), 1);
        assert_eq!(confusion.true_negatives(), 1);
        assert_eq!(confusion.false_negatives(), 1);
        assert_eq!(confusion.false_positives(), 0);
        assert!((confusion.accuracy() - 2.0 / 3.0).abs() < 1e-12);
        assert!((confusion.f1() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn empty_counts_score_zero() {
        let confusion = Confusion::new();
        assert_eq!(confusion.accuracy(), 0.0);
        assert_eq!(confusion.f1(), 0.0);
    }

    #[test]
    fn all_negative_agreement_has_zero_f1() {
        // No positives anywhere: accuracy is perfect, F1 degenerates to 0.
        let confusion = Confusion::from_pairs(pairs(&[0, 0], &[0, 0]));
        assert_eq!(confusion.accuracy(), 1.0);
        assert_eq!(confusion.f1(), 0.0);
    }
}
