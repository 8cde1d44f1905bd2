//! Shared error types for the services crate.

use thiserror::Error;

use annotate_core::model::ReportError;
use storage::dataset::DatasetError;
use storage::repository::StorageError;

/// Errors emitted by annotation sessions and their workflow.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no items available for session")]
    Empty,

    #[error("no option selected")]
    NoSelection,

    #[error("session already completed")]
    Completed,

    #[error("session is not complete yet")]
    Incomplete,

    #[error(transparent)]
    Report(#[from] ReportError),

    #[error(transparent)]
    Dataset(#[from] DatasetError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by the LLM pre-labeling service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PrelabelError {
    #[error("generation returned an empty response")]
    EmptyResponse,

    #[error("generation request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// Errors emitted while delivering a session report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeliveryError {
    #[error("report delivery is not configured")]
    Disabled,

    #[error("annotator name cannot be empty")]
    EmptyName,

    #[error("delivery request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}
