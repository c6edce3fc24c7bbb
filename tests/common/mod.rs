#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use airport_traffic::app::ingest_use_case::IngestUseCase;
use airport_traffic::app::ports::{ExtractionError, FieldExtractorPort, TextExtractorPort};
use airport_traffic::app::retry::RetryPolicy;
use airport_traffic::domain::{MetricFamily, SourceDocument, TrafficRecord};

/// Hands back the document bytes as text
pub struct PassthroughText;

#[async_trait]
impl TextExtractorPort for PassthroughText {
    async fn extract_text(&self, document: &SourceDocument) -> Result<String, ExtractionError> {
        Ok(String::from_utf8_lossy(&document.bytes).into_owned())
    }
}

/// Field extractor answering from a table keyed by document text
#[derive(Default)]
pub struct ScriptedFields {
    answers: Mutex<HashMap<String, Result<Vec<TrafficRecord>, ExtractionError>>>,
    calls: AtomicUsize,
    seen: Mutex<Vec<String>>,
}

impl ScriptedFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn answer(self, text: &str, records: Vec<TrafficRecord>) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(text.to_string(), Ok(records));
        self
    }

    pub fn fail(self, text: &str, error: ExtractionError) -> Self {
        self.answers
            .lock()
            .unwrap()
            .insert(text.to_string(), Err(error));
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Texts requested, in call order
    pub fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl FieldExtractorPort for ScriptedFields {
    async fn extract_records(
        &self,
        text: &str,
        _hint: Option<MetricFamily>,
    ) -> Result<Vec<TrafficRecord>, ExtractionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(text.to_string());
        self.answers
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }
}

pub fn record(airport: &str, month: &str, year: i32, pax: f64) -> TrafficRecord {
    let mut record = TrafficRecord {
        airport_name: airport.to_string(),
        month: month.to_string(),
        year,
        ..Default::default()
    };
    record.passengers.total = pax;
    record
}

/// A document whose text is its own name, so scripts can be keyed by name
pub fn document(name: &str) -> SourceDocument {
    SourceDocument::new(name, name.as_bytes().to_vec())
}

pub fn use_case(fields: Arc<ScriptedFields>) -> IngestUseCase {
    IngestUseCase::new(Arc::new(PassthroughText), fields)
        .with_retry_policy(RetryPolicy::new(3, Duration::from_millis(1)))
}
