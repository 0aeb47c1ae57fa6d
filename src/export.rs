//! Reading record collections and writing derived series as CSV or JSON

use crate::efficiency::EfPoint;
use crate::error::TriPaceError;
use crate::models::Sport;
use crate::pmc::PmcMetrics;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Flat CSV row for one PMC day
#[derive(Debug, Serialize)]
struct PmcRow {
    date: NaiveDate,
    ctl: Decimal,
    atl: Decimal,
    tsb: Decimal,
    daily_tss: Decimal,
    ctl_ramp_rate: Option<Decimal>,
    atl_spike: bool,
}

impl From<&PmcMetrics> for PmcRow {
    fn from(m: &PmcMetrics) -> Self {
        PmcRow {
            date: m.date,
            ctl: m.ctl,
            atl: m.atl,
            tsb: m.tsb,
            daily_tss: m.daily_tss,
            ctl_ramp_rate: m.ctl_ramp_rate,
            atl_spike: m.atl_spike,
        }
    }
}

#[derive(Debug, Serialize)]
struct EfRow<'a> {
    date: NaiveDate,
    workout_id: &'a str,
    sport: Sport,
    efficiency_factor: Decimal,
}

pub fn write_pmc_csv<W: Write>(metrics: &[PmcMetrics], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for m in metrics {
        csv.serialize(PmcRow::from(m))?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_ef_csv<W: Write>(points: &[EfPoint], writer: W) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for p in points {
        csv.serialize(EfRow {
            date: p.date,
            workout_id: &p.workout_id,
            sport: p.sport,
            efficiency_factor: p.efficiency_factor,
        })?;
    }
    csv.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize + ?Sized, W: Write>(
    value: &T,
    mut writer: W,
) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer)?;
    Ok(())
}

pub fn export_pmc<P: AsRef<Path>>(
    metrics: &[PmcMetrics],
    format: ExportFormat,
    path: P,
) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_pmc_csv(metrics, writer),
        ExportFormat::Json => write_json(metrics, writer),
    }
}

pub fn export_ef<P: AsRef<Path>>(
    points: &[EfPoint],
    format: ExportFormat,
    path: P,
) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    match format {
        ExportFormat::Csv => write_ef_csv(points, writer),
        ExportFormat::Json => write_json(points, writer),
    }
}

/// Read a JSON array of records supplied by the persistence layer
pub fn read_json_records<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> crate::Result<Vec<T>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| TriPaceError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| TriPaceError::Input {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Workout;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn metrics() -> Vec<PmcMetrics> {
        vec![
            PmcMetrics {
                date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                ctl: dec!(100),
                atl: dec!(100),
                tsb: dec!(0),
                daily_tss: dec!(100),
                ctl_ramp_rate: None,
                atl_spike: false,
            },
            PmcMetrics {
                date: NaiveDate::from_ymd_opt(2024, 3, 2).unwrap(),
                ctl: dec!(97.6),
                atl: dec!(86.7),
                tsb: dec!(10.9),
                daily_tss: dec!(0),
                ctl_ramp_rate: Some(dec!(-2.4)),
                atl_spike: true,
            },
        ]
    }

    #[test]
    fn test_pmc_csv() {
        let mut out = Vec::new();
        write_pmc_csv(&metrics(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "date,ctl,atl,tsb,daily_tss,ctl_ramp_rate,atl_spike");
        assert_eq!(lines[1], "2024-03-01,100,100,0,100,,false");
        assert_eq!(lines[2], "2024-03-02,97.6,86.7,10.9,0,-2.4,true");
    }

    #[test]
    fn test_ef_csv() {
        let points = vec![EfPoint {
            workout_id: "ride-1".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            sport: Sport::Bike,
            efficiency_factor: dec!(1.4),
        }];
        let mut out = Vec::new();
        write_ef_csv(&points, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("date,workout_id,sport,efficiency_factor\n"));
        assert!(text.contains("2024-03-01,ride-1,bike,1.4"));
    }

    #[test]
    fn test_json_export_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pmc.json");
        export_pmc(&metrics(), ExportFormat::Json, &path).unwrap();

        let back: Vec<PmcMetrics> = read_json_records(&path).unwrap();
        assert_eq!(back, metrics());
    }

    #[test]
    fn test_read_missing_file_is_input_error() {
        let dir = tempdir().unwrap();
        let err = read_json_records::<Workout, _>(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, TriPaceError::Input { .. }));
    }

    #[test]
    fn test_parse_format() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(_))
        ));
    }
}
