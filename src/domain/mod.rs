use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::common::error::TrafficError;

/// Source name used for records that were not produced from an uploaded document
pub const MANUAL_SOURCE: &str = "Manual";

/// One airport's traffic statistics for one reporting month.
///
/// Field names serialize in camelCase so the same shape is accepted from the
/// field-extraction service and written to the persisted blob.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrafficRecord {
    pub airport_name: String,
    /// Free-form month label as reported, e.g. "Sep" or "September"
    pub month: String,
    #[serde(deserialize_with = "lenient_year")]
    pub year: i32,
    pub passengers: PassengerStats,
    pub cargo: CargoStats,
    pub atms: MovementStats,
    /// Name of the originating document; `None` or "Manual" when not file-derived
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_type: Option<ReportType>,
}

impl TrafficRecord {
    /// True when this record was produced by the named document
    pub fn is_from(&self, file_name: &str) -> bool {
        self.source_file.as_deref() == Some(file_name)
    }

    /// True when this record was not produced from an uploaded document
    pub fn is_manual(&self) -> bool {
        match self.source_file.as_deref() {
            None => true,
            Some(name) => name == MANUAL_SOURCE,
        }
    }
}

/// Accept a year given as an integer, a float, or a numeric string
fn lenient_year<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = serde_json::Value::deserialize(deserializer)?;
    match &value {
        serde_json::Value::Null => Ok(0),
        serde_json::Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(|| D::Error::custom(format!("year out of range: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<i32>()
            .map_err(|e| D::Error::custom(format!("invalid year '{}': {}", s, e))),
        other => Err(D::Error::custom(format!("invalid year: {}", other))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportType {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PassengerStats {
    pub domestic: f64,
    pub international: f64,
    pub total: f64,
    pub previous_year: f64,
    pub previous_month: f64,
    /// Signed year-over-year change in percent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_percentage: Option<f64>,
}

/// Inbound/outbound tonnage for one side of the cargo split
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionalSplit {
    pub inbound: f64,
    pub outbound: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CargoStats {
    pub domestic: DirectionalSplit,
    pub international: DirectionalSplit,
    pub total: f64,
    pub previous_year: f64,
    pub previous_month: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_percentage: Option<f64>,
}

/// Passenger-flight vs cargo-flight aircraft movements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementSplit {
    pub pax: f64,
    pub cargo: f64,
    pub total: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MovementStats {
    pub domestic: MovementSplit,
    pub international: MovementSplit,
    pub total: f64,
    pub previous_year: f64,
    pub previous_month: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_percentage: Option<f64>,
}

/// Provenance entry certifying the records one document contributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileMeta {
    pub id: Uuid,
    pub name: String,
    pub processed_at: DateTime<Utc>,
    pub record_count: usize,
    /// Hex SHA-256 of the document bytes, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
}

/// An uploaded report awaiting ingestion
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Lower-cased extension of the document name, if any
    pub fn extension(&self) -> Option<String> {
        let (stem, ext) = self.name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }

    /// Hex SHA-256 of the document bytes
    pub fn checksum(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        hex::encode(hasher.finalize())
    }
}

/// Metric family hint passed to the field-extraction service when a document
/// is known to carry only one kind of statistic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricFamily {
    Passengers,
    Cargo,
    Movements,
}

impl MetricFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricFamily::Passengers => "Passengers",
            MetricFamily::Cargo => "Cargo",
            MetricFamily::Movements => "ATMs",
        }
    }
}

impl FromStr for MetricFamily {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "passengers" | "pax" => Ok(MetricFamily::Passengers),
            "cargo" => Ok(MetricFamily::Cargo),
            "movements" | "atms" | "atm" => Ok(MetricFamily::Movements),
            other => Err(TrafficError::Config(format!("unknown metric family '{}'", other))),
        }
    }
}
