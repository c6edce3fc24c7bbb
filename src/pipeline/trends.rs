//! Time-series views derived from the flat record set.
//!
//! Everything here is a pure projection of the current records and is never
//! persisted.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use crate::domain::TrafficRecord;
use crate::pipeline::identity::period_sort_key;

/// Headline metric values for one airport in one period
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct AirportMetrics {
    pub passengers: f64,
    pub cargo: f64,
    pub movements: f64,
}

impl AirportMetrics {
    fn from_record(record: &TrafficRecord) -> Self {
        Self {
            passengers: record.passengers.total,
            cargo: record.cargo.total,
            movements: record.atms.total,
        }
    }
}

/// One reporting period with a metric vector per airport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodVector {
    /// Month label as reported plus year, e.g. "Sep 2024"
    pub period: String,
    /// `year * 100 + month_index`
    pub sort_key: i64,
    pub airports: BTreeMap<String, AirportMetrics>,
}

/// Pivot records into periods ordered chronologically.
///
/// Periods are grouped by the month label exactly as given, so two spellings
/// of the same month produce two vectors sharing a sort key. Within a group a
/// later record for the same airport replaces the earlier one.
pub fn aggregate(records: &[TrafficRecord]) -> Vec<PeriodVector> {
    let mut index: HashMap<(String, i32), usize> = HashMap::new();
    let mut periods: Vec<PeriodVector> = Vec::new();

    for record in records {
        let group = (record.month.clone(), record.year);
        let slot = *index.entry(group).or_insert_with(|| {
            periods.push(PeriodVector {
                period: format!("{} {}", record.month, record.year),
                sort_key: period_sort_key(&record.month, record.year),
                airports: BTreeMap::new(),
            });
            periods.len() - 1
        });

        periods[slot]
            .airports
            .insert(record.airport_name.clone(), AirportMetrics::from_record(record));
    }

    // Stable: equal sort keys keep first-seen order
    periods.sort_by_key(|p| p.sort_key);
    periods
}

/// Distinct airport names, sorted
pub fn unique_airports(records: &[TrafficRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.airport_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Dataset-wide totals across every record
pub fn totals(records: &[TrafficRecord]) -> AirportMetrics {
    records.iter().fold(AirportMetrics::default(), |acc, r| AirportMetrics {
        passengers: acc.passengers + r.passengers.total,
        cargo: acc.cargo + r.cargo.total,
        movements: acc.movements + r.atms.total,
    })
}
