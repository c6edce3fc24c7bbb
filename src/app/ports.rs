use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{MetricFamily, SourceDocument, TrafficRecord};

/// Failure reported by one of the external extraction services
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// Rate limiting or a server-side hiccup; worth another attempt
    #[error("transient failure (status {status:?}): {message}")]
    Transient { status: Option<u16>, message: String },

    #[error("terminal failure (status {status:?}): {message}")]
    Terminal { status: Option<u16>, message: String },

    #[error("unsupported document type: {0}")]
    UnsupportedDocument(String),
}

impl ExtractionError {
    /// Classify an HTTP status: 429 and 5xx are transient, anything else terminal
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        if status == 429 || status >= 500 {
            ExtractionError::Transient { status: Some(status), message }
        } else {
            ExtractionError::Terminal { status: Some(status), message }
        }
    }

    pub fn terminal(message: impl Into<String>) -> Self {
        ExtractionError::Terminal { status: None, message: message.into() }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::Transient { .. })
    }
}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ExtractionError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_timeout() || err.is_connect() {
            ExtractionError::Transient { status: None, message: err.to_string() }
        } else {
            ExtractionError::terminal(err.to_string())
        }
    }
}

// Extraction-side ports
#[async_trait]
pub trait TextExtractorPort: Send + Sync {
    /// Turn an uploaded document into plain text
    async fn extract_text(&self, document: &SourceDocument) -> Result<String, ExtractionError>;
}

#[async_trait]
pub trait FieldExtractorPort: Send + Sync {
    /// Turn report text into candidate records. Must be idempotent for identical input.
    async fn extract_records(
        &self,
        text: &str,
        hint: Option<MetricFamily>,
    ) -> Result<Vec<TrafficRecord>, ExtractionError>;
}
