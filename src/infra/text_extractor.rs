use crate::app::ports::{ExtractionError, TextExtractorPort};
use crate::common::constants::{PDF_EXTENSIONS, PLAIN_TEXT_EXTENSIONS, SPREADSHEET_EXTENSIONS};
use crate::domain::SourceDocument;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;
use tracing::debug;

/// How a document's text is obtained, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    /// Office Open XML workbook (xlsx)
    Workbook,
    /// Legacy binary workbook (xls)
    LegacyWorkbook,
    /// Comma-separated sheet, already text
    DelimitedSheet,
    PlainText,
}

impl DocumentKind {
    pub fn of(document: &SourceDocument) -> Option<Self> {
        let ext = document.extension()?;
        let ext = ext.as_str();
        if PDF_EXTENSIONS.contains(&ext) {
            Some(DocumentKind::Pdf)
        } else if ext == "csv" {
            Some(DocumentKind::DelimitedSheet)
        } else if ext == "xls" {
            Some(DocumentKind::LegacyWorkbook)
        } else if SPREADSHEET_EXTENSIONS.contains(&ext) {
            Some(DocumentKind::Workbook)
        } else if PLAIN_TEXT_EXTENSIONS.contains(&ext) {
            Some(DocumentKind::PlainText)
        } else {
            None
        }
    }

    fn mime_type(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "application/pdf",
            DocumentKind::Workbook => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            DocumentKind::LegacyWorkbook => "application/vnd.ms-excel",
            DocumentKind::DelimitedSheet => "text/csv",
            DocumentKind::PlainText => "text/plain",
        }
    }

    /// Whether the bytes are already text and need no conversion service
    fn is_textual(&self) -> bool {
        matches!(self, DocumentKind::DelimitedSheet | DocumentKind::PlainText)
    }
}

/// Reads text documents directly and sends PDFs and workbooks to a
/// document-to-text HTTP service, when one is configured.
pub struct DocumentTextExtractor {
    client: reqwest::Client,
    service_url: Option<String>,
}

impl DocumentTextExtractor {
    pub fn new(service_url: Option<String>, timeout: Duration) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, service_url })
    }

    /// Extractor that only handles textual documents
    pub fn local_only() -> Self {
        Self {
            client: reqwest::Client::new(),
            service_url: None,
        }
    }

    async fn convert_remote(
        &self,
        document: &SourceDocument,
        kind: DocumentKind,
    ) -> Result<String, ExtractionError> {
        let url = self.service_url.as_deref().ok_or_else(|| {
            ExtractionError::terminal(format!(
                "no document-to-text service configured for {:?} document {}",
                kind, document.name
            ))
        })?;

        debug!(file = %document.name, url, "Converting document to text");
        let resp = self
            .client
            .post(url)
            .header(CONTENT_TYPE, kind.mime_type())
            .header("X-File-Name", document.name.as_str())
            .body(document.bytes.clone())
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ExtractionError::from_status(status.as_u16(), body));
        }
        Ok(body)
    }
}

#[async_trait]
impl TextExtractorPort for DocumentTextExtractor {
    async fn extract_text(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        let kind = DocumentKind::of(document)
            .ok_or_else(|| ExtractionError::UnsupportedDocument(document.name.clone()))?;

        if kind.is_textual() {
            return Ok(String::from_utf8_lossy(&document.bytes).into_owned());
        }
        self.convert_remote(document, kind).await
    }
}
