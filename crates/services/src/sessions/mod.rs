mod plan;
mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::{SampleBuilder, SamplePlan};
pub use progress::SessionProgress;
pub use service::{AnnotationSession, SessionDecision};
pub use view::{ReportId, ReportListItem, ReportService};
pub use workflow::{AnnotationLoopService, SessionSubmitResult};
