use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::common::error::TrafficError;
use crate::domain::TrafficRecord;
use crate::pipeline::identity::{resolve_month, IdentityKey};
use crate::pipeline::provenance::ProvenanceLedger;

/// Which duplicate checks an ingestion run applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// Every file is extracted; candidates are checked by identity key only
    Record,
    /// Files whose name is already in the ledger are skipped before
    /// extraction, then the remaining candidates are checked by identity key
    #[default]
    Layered,
}

impl FromStr for DedupPolicy {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "record" => Ok(DedupPolicy::Record),
            "layered" => Ok(DedupPolicy::Layered),
            other => Err(TrafficError::Config(format!("unknown dedup policy '{}'", other))),
        }
    }
}

/// Result of merging one document's candidates
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub accepted: Vec<TrafficRecord>,
    pub skipped: usize,
    /// Accepted candidates whose month label did not resolve and were filed under January
    pub unrecognized_months: usize,
}

/// Decides whether candidate records are new observations or repeats.
///
/// The seen-key set is seeded once from the live records and grows as
/// candidates are accepted, so repeats inside the same run are caught too.
#[derive(Debug)]
pub struct DedupMerger {
    policy: DedupPolicy,
    seen: HashSet<IdentityKey>,
}

impl DedupMerger {
    pub fn seeded<'a>(
        policy: DedupPolicy,
        existing: impl IntoIterator<Item = &'a TrafficRecord>,
    ) -> Self {
        let seen = existing.into_iter().map(IdentityKey::for_record).collect();
        Self { policy, seen }
    }

    /// File-granularity fast path
    pub fn should_skip_file(&self, ledger: &ProvenanceLedger, file_name: &str) -> bool {
        self.policy == DedupPolicy::Layered && ledger.has(file_name)
    }

    /// Partition candidates from `source_file` into accepted and skipped.
    ///
    /// Accepted records are attributed to `source_file`.
    pub fn merge_batch(&mut self, source_file: &str, candidates: Vec<TrafficRecord>) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        for mut candidate in candidates {
            let key = IdentityKey::for_record(&candidate);
            if !self.seen.insert(key.clone()) {
                debug!(file = %source_file, key = %key, "Skipping duplicate record");
                outcome.skipped += 1;
                continue;
            }

            if resolve_month(&candidate.month).is_none() {
                warn!(
                    file = %source_file,
                    airport = %candidate.airport_name,
                    month = %candidate.month,
                    "Unrecognized month label, filing under January"
                );
                outcome.unrecognized_months += 1;
            }

            candidate.source_file = Some(source_file.to_string());
            outcome.accepted.push(candidate);
        }

        outcome
    }
}
