//! Pre-labels hate-speech targets by querying a local text-generation
//! service, then draws a balanced sample for annotation.

use std::env;

use rand::rng;
use rand::seq::SliceRandom;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use storage::dataset::DatasetRecord;

use crate::error::PrelabelError;

const PROMPT_PREFIX: &str = "I am developing a study on hate speech. Please, answer only with \
the word women if the following tweet is hate speech against women or with immigrants if the \
following tweet is hate speech against immigrants. The tweet is:\n";

//
// ─── TARGETS ──────────────────────────────────────────────────────────────────
//

/// Target group of a hateful tweet, as pre-labeled by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HateTarget {
    Women,
    Immigrants,
}

impl HateTarget {
    /// Canonical value stored in the dataset's `target` column.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HateTarget::Women => "women",
            HateTarget::Immigrants => "immigrants",
        }
    }

    /// Classify a free-text model response by exact case-insensitive match
    /// against the enumerated word forms. Anything else is unmatched.
    #[must_use]
    pub fn match_response(response: &str) -> Option<Self> {
        let word = response.trim();
        if word.eq_ignore_ascii_case("women") || word.eq_ignore_ascii_case("woman") {
            Some(HateTarget::Women)
        } else if word.eq_ignore_ascii_case("immigrants") || word.eq_ignore_ascii_case("immigrant")
        {
            Some(HateTarget::Immigrants)
        } else {
            None
        }
    }
}

//
// ─── CONFIG ───────────────────────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct PrelabelConfig {
    pub base_url: String,
    pub model: String,
}

impl PrelabelConfig {
    /// Read configuration from the environment, defaulting to a local
    /// generation service.
    #[must_use]
    pub fn from_env() -> Self {
        let base_url = env::var("ANNOTATE_LLM_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:11434".into());
        let model = env::var("ANNOTATE_LLM_MODEL").unwrap_or_else(|_| "llama3.1:8b".into());
        Self { base_url, model }
    }
}

//
// ─── SERVICE ──────────────────────────────────────────────────────────────────
//

/// Outcome counts of a pre-labeling pass over a dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrelabelSummary {
    /// Positive records submitted to the model.
    pub submitted: usize,
    /// Records that received a recognized target.
    pub targeted: usize,
    /// Responses that matched no enumerated target.
    pub unmatched: usize,
    /// Requests that failed at the transport level.
    pub failed: usize,
}

#[derive(Clone)]
pub struct PrelabelService {
    client: Client,
    config: PrelabelConfig,
}

impl PrelabelService {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(PrelabelConfig::from_env())
    }

    #[must_use]
    pub fn new(config: PrelabelConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Ask the model which group a hateful tweet targets.
    ///
    /// Returns `Ok(None)` when the response matches no enumerated target.
    ///
    /// # Errors
    ///
    /// Returns `PrelabelError` when the request fails or the response is
    /// empty.
    pub async fn classify_target(&self, text: &str) -> Result<Option<HateTarget>, PrelabelError> {
        let url = format!("{}/api/generate", self.config.base_url.trim_end_matches('/'));
        let payload = GenerateRequest {
            model: self.config.model.clone(),
            prompt: format!("{PROMPT_PREFIX}{text}"),
            stream: false,
        };

        let response = self.client.post(url).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(PrelabelError::HttpStatus(response.status()));
        }

        let body: GenerateResponse = response.json().await?;
        if body.response.trim().is_empty() {
            return Err(PrelabelError::EmptyResponse);
        }

        Ok(HateTarget::match_response(&body.response))
    }

    /// Pre-label every positive record in place.
    ///
    /// Transport failures are logged and counted but never abort the pass;
    /// failed and unmatched records keep an empty target.
    pub async fn prelabel_records(&self, records: &mut [DatasetRecord]) -> PrelabelSummary {
        let mut summary = PrelabelSummary::default();

        for (index, record) in records.iter_mut().enumerate() {
            if !record.is_hateful() {
                continue;
            }
            summary.submitted += 1;

            match self.classify_target(&record.text).await {
                Ok(Some(target)) => {
                    record.target = Some(target.as_str().to_owned());
                    summary.targeted += 1;
                }
                Ok(None) => {
                    summary.unmatched += 1;
                }
                Err(error) => {
                    warn!("pre-labeling record {index} failed: {error}");
                    summary.failed += 1;
                }
            }
        }

        info!(
            "pre-labeled {} of {} positive records ({} unmatched, {} failed)",
            summary.targeted, summary.submitted, summary.unmatched, summary.failed
        );
        summary
    }
}

//
// ─── BALANCED SAMPLE ──────────────────────────────────────────────────────────
//

/// Draw a balanced annotation sample: up to `per_target` pre-labeled records
/// per target plus up to `negatives` non-hateful records.
#[must_use]
pub fn balanced_sample(
    records: &[DatasetRecord],
    per_target: usize,
    negatives: usize,
) -> Vec<DatasetRecord> {
    let mut sample = Vec::new();
    for target in [HateTarget::Women, HateTarget::Immigrants] {
        let pool: Vec<&DatasetRecord> = records
            .iter()
            .filter(|record| record.is_hateful())
            .filter(|record| record.target.as_deref() == Some(target.as_str()))
            .collect();
        sample.extend(draw(pool, per_target));
    }

    let negative_pool: Vec<&DatasetRecord> = records
        .iter()
        .filter(|record| !record.is_hateful())
        .collect();
    sample.extend(draw(negative_pool, negatives));

    sample
}

fn draw(mut pool: Vec<&DatasetRecord>, count: usize) -> Vec<DatasetRecord> {
    let mut rng = rng();
    pool.as_mut_slice().shuffle(&mut rng);
    pool.truncate(count);
    pool.into_iter().cloned().collect()
}

//
// ─── WIRE TYPES ───────────────────────────────────────────────────────────────
//

#[derive(Debug, Serialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
