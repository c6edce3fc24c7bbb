use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::TrafficError;
use crate::domain::TrafficRecord;
use crate::pipeline::identity::month_index;

/// Projections the record table can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    Year,
    Month,
    AirportName,
    TotalPax,
    PaxYoY,
    DomPax,
    IntlPax,
    TotalCargo,
    CargoYoY,
    DomCargo,
    IntlCargo,
    TotalAtm,
    AtmYoY,
    DomAtm,
    IntlAtm,
    DomPaxAtm,
    DomCargoAtm,
    IntlPaxAtm,
    IntlCargoAtm,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

/// How a key's values are obtained and compared
#[derive(Clone, Copy)]
enum Projection {
    /// Compared case-insensitively
    Text(fn(&TrafficRecord) -> String),
    Numeric(fn(&TrafficRecord) -> f64),
    /// Ordered by year, then by resolved month index
    Period,
}

fn growth(value: Option<f64>) -> f64 {
    value.unwrap_or(0.0)
}

impl SortKey {
    pub const ALL: [SortKey; 19] = [
        SortKey::Year,
        SortKey::Month,
        SortKey::AirportName,
        SortKey::TotalPax,
        SortKey::PaxYoY,
        SortKey::DomPax,
        SortKey::IntlPax,
        SortKey::TotalCargo,
        SortKey::CargoYoY,
        SortKey::DomCargo,
        SortKey::IntlCargo,
        SortKey::TotalAtm,
        SortKey::AtmYoY,
        SortKey::DomAtm,
        SortKey::IntlAtm,
        SortKey::DomPaxAtm,
        SortKey::DomCargoAtm,
        SortKey::IntlPaxAtm,
        SortKey::IntlCargoAtm,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Year => "year",
            SortKey::Month => "month",
            SortKey::AirportName => "airportName",
            SortKey::TotalPax => "totalPax",
            SortKey::PaxYoY => "paxYoY",
            SortKey::DomPax => "domPax",
            SortKey::IntlPax => "intlPax",
            SortKey::TotalCargo => "totalCargo",
            SortKey::CargoYoY => "cargoYoY",
            SortKey::DomCargo => "domCargo",
            SortKey::IntlCargo => "intlCargo",
            SortKey::TotalAtm => "totalAtm",
            SortKey::AtmYoY => "atmYoY",
            SortKey::DomAtm => "domAtm",
            SortKey::IntlAtm => "intlAtm",
            SortKey::DomPaxAtm => "domPaxAtm",
            SortKey::DomCargoAtm => "domCargoAtm",
            SortKey::IntlPaxAtm => "intlPaxAtm",
            SortKey::IntlCargoAtm => "intlCargoAtm",
        }
    }

    fn projection(self) -> Projection {
        use Projection::*;
        match self {
            SortKey::Year => Numeric(|r| f64::from(r.year)),
            SortKey::Month => Period,
            SortKey::AirportName => Text(|r| r.airport_name.to_lowercase()),
            SortKey::TotalPax => Numeric(|r| r.passengers.total),
            SortKey::PaxYoY => Numeric(|r| growth(r.passengers.growth_percentage)),
            SortKey::DomPax => Numeric(|r| r.passengers.domestic),
            SortKey::IntlPax => Numeric(|r| r.passengers.international),
            SortKey::TotalCargo => Numeric(|r| r.cargo.total),
            SortKey::CargoYoY => Numeric(|r| growth(r.cargo.growth_percentage)),
            SortKey::DomCargo => Numeric(|r| r.cargo.domestic.total),
            SortKey::IntlCargo => Numeric(|r| r.cargo.international.total),
            SortKey::TotalAtm => Numeric(|r| r.atms.total),
            SortKey::AtmYoY => Numeric(|r| growth(r.atms.growth_percentage)),
            SortKey::DomAtm => Numeric(|r| r.atms.domestic.total),
            SortKey::IntlAtm => Numeric(|r| r.atms.international.total),
            SortKey::DomPaxAtm => Numeric(|r| r.atms.domestic.pax),
            SortKey::DomCargoAtm => Numeric(|r| r.atms.domestic.cargo),
            SortKey::IntlPaxAtm => Numeric(|r| r.atms.international.pax),
            SortKey::IntlCargoAtm => Numeric(|r| r.atms.international.cargo),
        }
    }

    /// Ascending comparison of two records under this key
    pub fn compare(self, a: &TrafficRecord, b: &TrafficRecord) -> Ordering {
        match self.projection() {
            Projection::Text(project) => project(a).cmp(&project(b)),
            // NaN compares equal so the comparator stays total
            Projection::Numeric(project) => project(a)
                .partial_cmp(&project(b))
                .unwrap_or(Ordering::Equal),
            Projection::Period => a
                .year
                .cmp(&b.year)
                .then_with(|| month_index(&a.month).cmp(&month_index(&b.month))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        SortKey::ALL
            .iter()
            .copied()
            .find(|k| k.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| TrafficError::UnknownSortKey(wanted.to_string()))
    }
}

impl FromStr for SortDirection {
    type Err = TrafficError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Asc),
            "desc" | "descending" => Ok(SortDirection::Desc),
            other => Err(TrafficError::Config(format!("unknown sort direction '{}'", other))),
        }
    }
}

/// Active ordering of the record table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortConfig {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortConfig {
    fn default() -> Self {
        Self {
            key: SortKey::Year,
            direction: SortDirection::Desc,
        }
    }
}

impl SortConfig {
    /// Ordering for an explicit selection: a newly chosen key without a
    /// direction behaves like selecting that column from the default order.
    pub fn from_selection(key: Option<SortKey>, direction: Option<SortDirection>) -> Self {
        let default = Self::default();
        match (key, direction) {
            (None, None) => default,
            (Some(key), None) => default.toggled(key),
            (key, Some(direction)) => Self {
                key: key.unwrap_or(default.key),
                direction,
            },
        }
    }

    /// Selecting the active ascending key flips to descending; anything else starts ascending
    pub fn toggled(self, key: SortKey) -> Self {
        let direction = if self.key == key && self.direction == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        Self { key, direction }
    }
}

/// Return the records ordered by `key`, leaving the input untouched.
///
/// The sort is stable, so records comparing equal keep their relative order
/// in either direction.
pub fn sort_records(
    records: &[TrafficRecord],
    key: SortKey,
    direction: SortDirection,
) -> Vec<&TrafficRecord> {
    let mut ordered: Vec<&TrafficRecord> = records.iter().collect();
    ordered.sort_by(|a, b| {
        let ord = key.compare(a, b);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    ordered
}
