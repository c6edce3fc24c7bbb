use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{error, info, info_span, warn, Instrument};

use crate::app::ports::{ExtractionError, FieldExtractorPort, TextExtractorPort};
use crate::app::retry::{with_retry, RetryPolicy};
use crate::common::error::{Result, TrafficError};
use crate::domain::{MetricFamily, SourceDocument};
use crate::observability::metrics::IngestMetrics;
use crate::pipeline::dataset::Dataset;
use crate::pipeline::dedup::{DedupMerger, DedupPolicy};
use crate::pipeline::repository::DatasetRepository;

/// Counts reported at the end of a successful ingestion run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestSummary {
    pub accepted: usize,
    pub skipped_records: usize,
    pub skipped_files: usize,
    /// Documents that were extracted and committed, in processing order
    pub files_touched: Vec<String>,
    /// Accepted records per source document
    pub accepted_by_file: BTreeMap<String, usize>,
    pub unrecognized_months: usize,
}

/// How a successful run should be reported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// At least one new record was added
    Imported,
    /// Candidates were found but every one was already present
    AllDuplicates,
    /// Every document was skipped by name
    AllFilesSkipped,
    /// Extraction found no candidates at all
    NothingExtracted,
}

impl IngestSummary {
    pub fn outcome(&self) -> IngestOutcome {
        if self.accepted > 0 {
            IngestOutcome::Imported
        } else if self.skipped_records > 0 {
            IngestOutcome::AllDuplicates
        } else if self.skipped_files > 0 && self.files_touched.is_empty() {
            IngestOutcome::AllFilesSkipped
        } else {
            IngestOutcome::NothingExtracted
        }
    }

    /// One-line human summary of the run
    pub fn message(&self) -> String {
        let mut msg = match self.outcome() {
            IngestOutcome::Imported => format!("Successfully imported {} new records.", self.accepted),
            IngestOutcome::AllDuplicates => format!(
                "Processing complete: all {} data points were already present. No new records added.",
                self.skipped_records
            ),
            IngestOutcome::AllFilesSkipped => format!(
                "Processing complete: all {} files were already processed. No new records added.",
                self.skipped_files
            ),
            IngestOutcome::NothingExtracted => {
                "Processing complete: no records were found in the uploaded files.".to_string()
            }
        };
        if self.outcome() == IngestOutcome::Imported && self.skipped_records > 0 {
            msg.push_str(&format!(" (Skipped {} duplicates)", self.skipped_records));
        }
        if self.skipped_files > 0 && self.outcome() != IngestOutcome::AllFilesSkipped {
            msg.push_str(&format!(" (Skipped {} already processed files)", self.skipped_files));
        }
        msg
    }
}

/// Governs one ingestion run: documents are extracted one at a time, merged
/// against the dataset, and committed file by file.
pub struct IngestUseCase {
    text: Arc<dyn TextExtractorPort>,
    fields: Arc<dyn FieldExtractorPort>,
    policy: DedupPolicy,
    retry: RetryPolicy,
    hint: Option<MetricFamily>,
}

impl IngestUseCase {
    pub fn new(text: Arc<dyn TextExtractorPort>, fields: Arc<dyn FieldExtractorPort>) -> Self {
        Self {
            text,
            fields,
            policy: DedupPolicy::default(),
            retry: RetryPolicy::default(),
            hint: None,
        }
    }

    pub fn with_policy(mut self, policy: DedupPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_hint(mut self, hint: Option<MetricFamily>) -> Self {
        self.hint = hint;
        self
    }

    /// Ingest `documents` into `dataset`, persisting after each committed file.
    ///
    /// Documents are processed in name order. The first extraction failure
    /// aborts the rest of the queue; files committed before it stay committed.
    pub async fn run(
        &self,
        dataset: &mut Dataset,
        repo: &DatasetRepository,
        mut documents: Vec<SourceDocument>,
    ) -> Result<IngestSummary> {
        documents.sort_by(|a, b| a.name.cmp(&b.name));

        let total = documents.len();
        let mut merger = DedupMerger::seeded(self.policy, dataset.records());
        let mut summary = IngestSummary::default();

        info!(files = total, policy = ?self.policy, "Starting ingestion run");

        for (i, document) in documents.iter().enumerate() {
            let span = info_span!("ingest_file", file = %document.name, position = i + 1, total);
            let result = self
                .ingest_document(dataset, repo, &mut merger, &mut summary, document)
                .instrument(span)
                .await;

            if let Err(e) = result {
                error!(
                    file = %document.name,
                    committed_files = summary.files_touched.len(),
                    remaining = total - i - 1,
                    "Ingestion aborted: {}",
                    e
                );
                return Err(e);
            }
        }

        info!(
            accepted = summary.accepted,
            skipped_records = summary.skipped_records,
            skipped_files = summary.skipped_files,
            "Ingestion run complete"
        );
        Ok(summary)
    }

    async fn ingest_document(
        &self,
        dataset: &mut Dataset,
        repo: &DatasetRepository,
        merger: &mut DedupMerger,
        summary: &mut IngestSummary,
        document: &SourceDocument,
    ) -> Result<()> {
        let checksum = document.checksum();

        if merger.should_skip_file(dataset.ledger(), &document.name) {
            let changed = dataset
                .ledger()
                .get(&document.name)
                .and_then(|meta| meta.checksum.as_deref())
                .is_some_and(|known| known != checksum);
            if changed {
                warn!("Content differs from the processed file of the same name; skipping anyway");
            } else {
                info!("Already processed, skipping");
            }
            summary.skipped_files += 1;
            IngestMetrics::file_skipped();
            return Ok(());
        }

        let extraction_failed = |source: ExtractionError| TrafficError::Extraction {
            file: document.name.clone(),
            source,
        };

        let started = Instant::now();
        let text = self
            .text
            .extract_text(document)
            .await
            .map_err(extraction_failed)?;

        let hint = self.hint;
        let candidates = with_retry("field_extraction", &self.retry, || {
            self.fields.extract_records(&text, hint)
        })
        .await
        .map_err(extraction_failed)?;
        IngestMetrics::extraction_duration(started.elapsed().as_secs_f64());

        let found = candidates.len();
        let outcome = merger.merge_batch(&document.name, candidates);
        let accepted = outcome.accepted.len();
        IngestMetrics::records_merged(accepted, outcome.skipped, outcome.unrecognized_months);

        summary.accepted += accepted;
        summary.skipped_records += outcome.skipped;
        summary.unrecognized_months += outcome.unrecognized_months;
        summary.files_touched.push(document.name.clone());
        summary.accepted_by_file.insert(document.name.clone(), accepted);

        dataset.commit_file(&document.name, Some(checksum), outcome.accepted);
        IngestMetrics::file_processed();
        info!(found, accepted, skipped = outcome.skipped, "Merged file");

        repo.save(dataset).await
    }
}
