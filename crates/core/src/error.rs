use thiserror::Error;

use crate::model::{ItemError, LabelError, ReportError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    ItemValidation(#[from] ItemError),
    #[error(transparent)]
    LabelValidation(#[from] LabelError),
    #[error(transparent)]
    Report(#[from] ReportError),
}
