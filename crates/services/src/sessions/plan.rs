use rand::rng;
use rand::seq::SliceRandom;

use annotate_core::model::{Item, Task};
use storage::dataset::DatasetRecord;

use crate::error::SessionError;

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SamplePlan {
    pub items: Vec<Item>,
    /// How many records matched the task before sampling.
    pub matched: usize,
    pub positives: usize,
    pub negatives: usize,
}

impl SamplePlan {
    /// Total number of items in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.items.len()
    }
}

/// Builds a session sample by filtering records to the task and drawing a
/// uniform random subset.
pub struct SampleBuilder {
    task: Task,
    sample_size: Option<usize>,
}

impl SampleBuilder {
    #[must_use]
    pub fn new(task: Task) -> Self {
        Self {
            task,
            sample_size: None,
        }
    }

    /// Override the task's default sample size.
    #[must_use]
    pub fn with_sample_size(mut self, size: Option<usize>) -> Self {
        self.sample_size = size;
        self
    }

    /// Build a sample plan from loaded dataset records.
    ///
    /// Records that do not belong to the task are skipped. When fewer records
    /// match than the requested size, the sample is the whole matching set.
    /// Record indices double as stable item ids, so a drawn item can be
    /// traced back to its source record.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` when no records match the task, and
    /// `SessionError::Dataset` when a matching record cannot be mapped to an
    /// item (missing or malformed label, empty text).
    pub fn build(self, records: &[DatasetRecord]) -> Result<SamplePlan, SessionError> {
        let mut indices: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, record)| record.matches_task(self.task))
            .map(|(index, _)| index)
            .collect();
        let matched = indices.len();
        if matched == 0 {
            return Err(SessionError::Empty);
        }

        let size = self
            .sample_size
            .unwrap_or_else(|| self.task.default_sample_size());

        let mut rng = rng();
        indices.as_mut_slice().shuffle(&mut rng);
        indices.truncate(size);

        let mut items = Vec::with_capacity(indices.len());
        for index in indices {
            items.push(records[index].to_item(index, self.task)?);
        }

        let positives = items.iter().filter(|item| item.gold().is_positive()).count();
        let negatives = items.len() - positives;

        Ok(SamplePlan {
            items,
            matched,
            positives,
            negatives,
        })
    }
}
