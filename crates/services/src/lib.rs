#![forbid(unsafe_code)]

pub mod delivery;
pub mod error;
pub mod prelabel;
pub mod sessions;

pub use annotate_core::Clock;

pub use error::{DeliveryError, PrelabelError, SessionError};

pub use delivery::{AnnotatorName, ReportDelivery, ReportMessage, ReportTransport};
pub use prelabel::{HateTarget, PrelabelConfig, PrelabelService, PrelabelSummary};
pub use sessions::{
    AnnotationLoopService, AnnotationSession, ReportListItem, ReportService, SampleBuilder,
    SamplePlan, SessionDecision, SessionProgress, SessionSubmitResult,
};
