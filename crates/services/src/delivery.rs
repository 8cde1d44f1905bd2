//! Builds the end-of-session report message and hands it to a transport.
//!
//! The transport itself (mail relay, webhook receiver) is an external
//! collaborator; everything in scope here is composing the subject and body
//! and reporting whether the hand-off worked.

use std::env;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use annotate_core::model::SessionReport;

use crate::error::DeliveryError;

//
// ─── MESSAGE ──────────────────────────────────────────────────────────────────
//

/// Validated annotator name attached to the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotatorName(String);

impl AnnotatorName {
    /// # Errors
    ///
    /// Returns `DeliveryError::EmptyName` for an empty or whitespace-only
    /// name.
    pub fn parse(raw: impl Into<String>) -> Result<Self, DeliveryError> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DeliveryError::EmptyName);
        }
        Ok(Self(trimmed.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Subject and body of an outgoing report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportMessage {
    pub subject: String,
    pub body: String,
}

impl ReportMessage {
    /// Compose the report message for a scored session.
    #[must_use]
    pub fn compose(report: &SessionReport, annotator: &AnnotatorName) -> Self {
        let task = capitalize(report.task().discriminator());
        let subject = format!("{task} classification: {}", annotator.as_str());
        let body = format!(
            "Report of {}:\n\tF1 Score: {:.2}%\n\tAccuracy: {:.2}%",
            annotator.as_str(),
            report.f1() * 100.0,
            report.accuracy() * 100.0,
        );
        Self { subject, body }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

//
// ─── TRANSPORT ────────────────────────────────────────────────────────────────
//

/// External hand-off for a composed report.
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Deliver the message.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` when the hand-off fails.
    async fn deliver(&self, message: &ReportMessage) -> Result<(), DeliveryError>;
}

/// Transport that POSTs the message as JSON to a configured endpoint.
#[derive(Clone)]
pub struct HttpReportTransport {
    client: Client,
    endpoint: String,
}

impl HttpReportTransport {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    /// Build the transport from `ANNOTATE_REPORT_URL`, if set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let endpoint = env::var("ANNOTATE_REPORT_URL").ok()?;
        if endpoint.trim().is_empty() {
            return None;
        }
        Some(Self::new(endpoint))
    }
}

#[async_trait]
impl ReportTransport for HttpReportTransport {
    async fn deliver(&self, message: &ReportMessage) -> Result<(), DeliveryError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(message)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status()));
        }
        Ok(())
    }
}

//
// ─── SERVICE ──────────────────────────────────────────────────────────────────
//

/// Composes report messages and hands them to the configured transport.
#[derive(Clone)]
pub struct ReportDelivery {
    transport: Option<Arc<dyn ReportTransport>>,
}

impl ReportDelivery {
    #[must_use]
    pub fn new(transport: Option<Arc<dyn ReportTransport>>) -> Self {
        Self { transport }
    }

    /// Build delivery from the environment; disabled when no endpoint is
    /// configured.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(
            HttpReportTransport::from_env().map(|t| Arc::new(t) as Arc<dyn ReportTransport>),
        )
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.transport.is_some()
    }

    /// Compose and deliver the report for a scored session.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError::Disabled` when no transport is configured, or
    /// the transport's error when the hand-off fails. The report itself is
    /// unaffected either way; it was scored and persisted before delivery.
    pub async fn send(
        &self,
        report: &SessionReport,
        annotator: &AnnotatorName,
    ) -> Result<(), DeliveryError> {
        let transport = self.transport.as_ref().ok_or(DeliveryError::Disabled)?;
        let message = ReportMessage::compose(report, annotator);
        transport.deliver(&message).await
    }
}
