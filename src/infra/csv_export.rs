use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use csv::Writer;
use tracing::info;

use crate::common::constants::EXPORT_SUFFIX;
use crate::common::error::Result;
use crate::domain::TrafficRecord;

/// Column labels of the master export, in output order
pub const EXPORT_HEADERS: [&str; 19] = [
    "Year",
    "Month",
    "Airport",
    "Total Pax",
    "Pax YoY%",
    "DOM Pax",
    "INTL Pax",
    "Total Cargo",
    "Cargo YoY%",
    "DOM Cargo",
    "INTL Cargo",
    "Total ATM",
    "ATM YoY%",
    "DOM ATM",
    "INTL ATM",
    "DOM Pax ATM",
    "DOM Cargo ATM",
    "INTL Pax ATM",
    "INTL Cargo ATM",
];

fn number(value: f64) -> String {
    value.to_string()
}

fn growth(value: Option<f64>) -> String {
    value.map(number).unwrap_or_default()
}

fn row(record: &TrafficRecord) -> [String; 19] {
    let (pax, cargo, atms) = (&record.passengers, &record.cargo, &record.atms);
    [
        record.year.to_string(),
        record.month.clone(),
        record.airport_name.clone(),
        number(pax.total),
        growth(pax.growth_percentage),
        number(pax.domestic),
        number(pax.international),
        number(cargo.total),
        growth(cargo.growth_percentage),
        number(cargo.domestic.total),
        number(cargo.international.total),
        number(atms.total),
        growth(atms.growth_percentage),
        number(atms.domestic.total),
        number(atms.international.total),
        number(atms.domestic.pax),
        number(atms.domestic.cargo),
        number(atms.international.pax),
        number(atms.international.cargo),
    ]
}

/// Write the header row and one row per record
pub fn write_records<W: Write>(records: &[TrafficRecord], out: W) -> Result<()> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.write_record(row(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Export `records` to `<dir>/<name>_Master_Export.csv`
pub fn export_to_file(records: &[TrafficRecord], dir: &Path, name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}{}", name, EXPORT_SUFFIX));
    let file = File::create(&path)?;
    write_records(records, file)?;
    info!(path = %path.display(), rows = records.len(), "Exported dataset");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MovementSplit, PassengerStats};

    fn record() -> TrafficRecord {
        TrafficRecord {
            airport_name: "Goa, Dabolim".to_string(),
            month: "Sep".to_string(),
            year: 2024,
            passengers: PassengerStats {
                domestic: 100.0,
                international: 20.5,
                total: 120.5,
                growth_percentage: Some(-3.2),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_rows_follow_header_order() {
        let mut rec = record();
        rec.atms.international = MovementSplit { pax: 7.0, cargo: 2.0, total: 9.0 };

        let mut buf = Vec::new();
        write_records(&[rec], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(lines.next().unwrap().split(',').count(), 19);
        let row = lines.next().unwrap();
        assert!(row.starts_with("2024,Sep,\"Goa, Dabolim\",120.5,-3.2,100,20.5,0,,"));
        assert!(row.ends_with(",9,0,0,7,2"));
        assert!(lines.next().is_none());
    }

    #[test]
    fn test_export_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to_file(&[record()], dir.path(), "AAI_Master_Database").unwrap();
        assert_eq!(path.file_name().unwrap(), "AAI_Master_Database_Master_Export.csv");
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.starts_with("Year,Month,Airport,Total Pax"));
    }
}
