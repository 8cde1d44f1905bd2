use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::Label;

//
// ─── TASK ─────────────────────────────────────────────────────────────────────
//

/// Annotation task a dataset record belongs to.
///
/// The two deployments share the binary-label session machinery but differ in
/// sample size, on-screen class names, and which dataset field carries the
/// gold label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// News articles judged Real (positive) vs Fake (negative).
    FakeNews,
    /// Tweets judged Hate speech (positive) vs Not hate speech (negative).
    HateSpeech,
}

impl Task {
    /// Discriminator value used by the `task` field of dataset records.
    #[must_use]
    pub fn discriminator(self) -> &'static str {
        match self {
            Task::FakeNews => "fake news",
            Task::HateSpeech => "hate speech",
        }
    }

    /// Number of items sampled per session when no override is given.
    #[must_use]
    pub fn default_sample_size(self) -> usize {
        match self {
            Task::FakeNews => 20,
            Task::HateSpeech => 50,
        }
    }

    /// On-screen name of the given class for this task.
    #[must_use]
    pub fn class_name(self, label: Label) -> &'static str {
        match (self, label) {
            (Task::FakeNews, Label::Positive) => "Real",
            (Task::FakeNews, Label::Negative) => "Fake",
            (Task::HateSpeech, Label::Positive) => "Hate speech",
            (Task::HateSpeech, Label::Negative) => "Not hate speech",
        }
    }

    /// What a single item is called in progress messages.
    #[must_use]
    pub fn item_noun(self) -> &'static str {
        match self {
            Task::FakeNews => "article",
            Task::HateSpeech => "tweet",
        }
    }

    /// Whether items for this task carry a headline.
    #[must_use]
    pub fn has_headline(self) -> bool {
        matches!(self, Task::FakeNews)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.discriminator())
    }
}

//
// ─── PARSING ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown task: {raw}")]
pub struct ParseTaskError {
    pub raw: String,
}

impl FromStr for Task {
    type Err = ParseTaskError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fake news" | "fake-news" | "fakenews" => Ok(Task::FakeNews),
            "hate speech" | "hate-speech" | "hatespeech" => Ok(Task::HateSpeech),
            _ => Err(ParseTaskError { raw: s.to_string() }),
        }
    }
}
