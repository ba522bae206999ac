#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Accident dataset loading.
//!
//! Reads [`AccidentRecord`]s from a file, choosing the parser by extension:
//! CSV with a header row (optionally gzip-compressed), a JSON array of
//! objects, or newline-delimited JSON. The whole file is loaded up front;
//! reports then run over the in-memory snapshot.

use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use crash_reports_accident_models::AccidentRecord;
use flate2::read::GzDecoder;
use serde::Deserialize;

/// Errors that can occur while loading a dataset.
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// I/O error (file open/read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// The file extension does not name a supported format.
    #[error("Unsupported dataset format: {}", path.display())]
    UnsupportedFormat {
        /// Path that was given.
        path: PathBuf,
    },
}

/// On-disk dataset format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Comma-separated values with a header row.
    Csv,
    /// Gzip-compressed CSV.
    CsvGzip,
    /// A single JSON array of record objects.
    Json,
    /// One JSON record object per line.
    JsonLines,
}

impl Format {
    /// Infers the format from a file name.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_ascii_lowercase();

        if name.ends_with(".csv.gz") {
            Some(Self::CsvGzip)
        } else if name.ends_with(".csv") {
            Some(Self::Csv)
        } else if name.ends_with(".jsonl") || name.ends_with(".ndjson") {
            Some(Self::JsonLines)
        } else if name.ends_with(".json") {
            Some(Self::Json)
        } else {
            None
        }
    }
}

/// A raw CSV row.
///
/// Every column is read as a plain string so the `csv` deserializer never
/// infers a type: `"5.0"`, `"+5"` and `"007"` reach the record verbatim.
#[derive(Debug, Deserialize)]
struct CsvRow {
    #[serde(rename = "Date", alias = "date", default)]
    date: Option<String>,
    #[serde(rename = "Time", alias = "time", default)]
    time: Option<String>,
    #[serde(rename = "Location", alias = "location", default)]
    location: Option<String>,
    #[serde(rename = "Operator", alias = "operator", default)]
    operator: Option<String>,
    #[serde(
        rename = "AC Type",
        alias = "aircraftType",
        alias = "aircraft_type",
        default
    )]
    aircraft_type: Option<String>,
    #[serde(rename = "Route", alias = "route", default)]
    route: Option<String>,
    #[serde(rename = "Aboard", alias = "aboard", default)]
    aboard: Option<String>,
    #[serde(rename = "Fatalities", alias = "fatalities", default)]
    fatalities: Option<String>,
    #[serde(rename = "Ground", alias = "ground", default)]
    ground: Option<String>,
}

impl From<CsvRow> for AccidentRecord {
    fn from(row: CsvRow) -> Self {
        let blank_to_none = |v: Option<String>| v.filter(|s| !s.trim().is_empty());

        Self {
            date: blank_to_none(row.date),
            time: blank_to_none(row.time),
            location: blank_to_none(row.location),
            operator: blank_to_none(row.operator),
            aircraft_type: blank_to_none(row.aircraft_type),
            route: blank_to_none(row.route),
            aboard: blank_to_none(row.aboard),
            fatalities: blank_to_none(row.fatalities),
            ground: blank_to_none(row.ground),
        }
    }
}

/// Options for loading a dataset.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadOptions {
    /// Maximum number of records to read.
    pub max_records: Option<u64>,
}

/// Loads every record from `path`.
///
/// # Errors
///
/// Returns [`DatasetError`] if the extension is not recognised, the file
/// cannot be read, or any row is malformed.
pub fn load_records(path: &Path, options: LoadOptions) -> Result<Vec<AccidentRecord>, DatasetError> {
    let format = Format::from_path(path).ok_or_else(|| DatasetError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;

    log::info!("Loading {format:?} dataset from {}", path.display());
    let file = File::open(path)?;

    let mut records = match format {
        Format::Csv => read_csv(file, options)?,
        Format::CsvGzip => read_csv(GzDecoder::new(file), options)?,
        Format::Json => read_json(BufReader::new(file))?,
        Format::JsonLines => read_json_lines(BufReader::new(file), options)?,
    };

    if let Some(max) = options.max_records {
        records.truncate(usize::try_from(max).unwrap_or(usize::MAX));
    }

    log::info!("Loaded {} records from {}", records.len(), path.display());
    Ok(records)
}

/// Parses CSV with a header row. Unknown columns are ignored.
///
/// # Errors
///
/// Returns [`DatasetError::Csv`] if a row cannot be read.
pub fn read_csv<R: Read>(reader: R, options: LoadOptions) -> Result<Vec<AccidentRecord>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.deserialize::<CsvRow>() {
        records.push(result?.into());

        if reached(&records, options) {
            log::info!("Reached max_records limit, stopping CSV parse");
            break;
        }
    }

    Ok(records)
}

/// Parses a JSON array of record objects.
///
/// # Errors
///
/// Returns [`DatasetError::Json`] if the document is not an array of
/// records.
pub fn read_json<R: Read>(reader: R) -> Result<Vec<AccidentRecord>, DatasetError> {
    Ok(serde_json::from_reader(reader)?)
}

/// Parses newline-delimited JSON, skipping blank lines.
///
/// # Errors
///
/// Returns [`DatasetError`] if a line cannot be read or parsed.
pub fn read_json_lines<R: BufRead>(
    reader: R,
    options: LoadOptions,
) -> Result<Vec<AccidentRecord>, DatasetError> {
    let mut records = Vec::new();

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);

        if reached(&records, options) {
            log::info!("Reached max_records limit, stopping JSON-lines parse");
            break;
        }
    }

    Ok(records)
}

fn reached(records: &[AccidentRecord], options: LoadOptions) -> bool {
    options
        .max_records
        .is_some_and(|max| records.len() as u64 >= max)
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use crash_reports_accident_models::Field;

    use super::*;

    const CSV: &str = "\
Date,Time,Location,Operator,Flight #,Route,AC Type,Registration,cn/In,Aboard,Fatalities,Ground,Summary
09/17/1908,17:18,\"Fort Myer, Virginia\",Military - U.S. Army,,Demonstration,Wright Flyer III,,1,2,1,0,\"Crashed during demo\"
07/12/1912,06:30,\"Atlantic City, New Jersey\",,,Test flight,Dirigible,,,NULL,5,NULL,
";

    #[test]
    fn infers_format_from_extension() {
        assert_eq!(Format::from_path(Path::new("a/crashes.csv")), Some(Format::Csv));
        assert_eq!(
            Format::from_path(Path::new("crashes.CSV.GZ")),
            Some(Format::CsvGzip)
        );
        assert_eq!(Format::from_path(Path::new("crashes.json")), Some(Format::Json));
        assert_eq!(
            Format::from_path(Path::new("crashes.ndjson")),
            Some(Format::JsonLines)
        );
        assert_eq!(Format::from_path(Path::new("crashes.xlsx")), None);
    }

    #[test]
    fn reads_csv_with_dataset_headers() {
        let records = read_csv(CSV.as_bytes(), LoadOptions::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Field::Location), Some("Fort Myer, Virginia"));
        assert_eq!(records[0].count(Field::Aboard), Ok(2));
        assert_eq!(records[1].operator, None);
        assert_eq!(records[1].get(Field::Aboard), Some("NULL"));
        assert!(records[1].count(Field::Aboard).is_err());
    }

    #[test]
    fn csv_fields_are_never_type_inferred() {
        let csv = "Operator,Location,Route,Aboard,Fatalities,Ground\nNan,Inf,007,+5,5.0,1e3\n";

        let records = read_csv(csv.as_bytes(), LoadOptions::default()).unwrap();
        let record = &records[0];

        assert_eq!(record.get(Field::Operator), Some("Nan"));
        assert_eq!(record.get(Field::Location), Some("Inf"));
        assert_eq!(record.get(Field::Route), Some("007"));
        assert_eq!(record.get(Field::Aboard), Some("+5"));
        assert_eq!(record.get(Field::Fatalities), Some("5.0"));
        assert_eq!(record.get(Field::Ground), Some("1e3"));
        assert!(record.count(Field::Aboard).is_err());
        assert!(record.count(Field::Fatalities).is_err());
        assert!(record.count(Field::Ground).is_err());
    }

    #[test]
    fn blank_csv_fields_are_null() {
        let csv = "Operator,Aboard,Fatalities\n   ,,3\n";

        let records = read_csv(csv.as_bytes(), LoadOptions::default()).unwrap();

        assert_eq!(records[0].operator, None);
        assert_eq!(records[0].aboard, None);
        assert_eq!(records[0].count(Field::Fatalities), Ok(3));
    }

    #[test]
    fn csv_respects_max_records() {
        let options = LoadOptions {
            max_records: Some(1),
        };
        let records = read_csv(CSV.as_bytes(), options).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn reads_json_array() {
        let json = r#"[
            {"date": "03/27/1977", "aircraftType": "Boeing 747", "fatalities": 583},
            {"Date": "08/12/1985", "AC Type": "Boeing 747", "Fatalities": "520"}
        ]"#;

        let records = read_json(json.as_bytes()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].count(Field::Fatalities), Ok(583));
        assert_eq!(records[1].get(Field::AircraftType), Some("Boeing 747"));
    }

    #[test]
    fn reads_json_lines_skipping_blanks() {
        let lines = "{\"operator\": \"KLM\"}\n\n{\"operator\": null}\n";

        let records = read_json_lines(lines.as_bytes(), LoadOptions::default()).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(Field::Operator), Some("KLM"));
        assert_eq!(records[1].get(Field::Operator), None);
    }

    #[test]
    fn malformed_json_line_is_an_error() {
        let err = read_json_lines("{not json}\n".as_bytes(), LoadOptions::default()).unwrap_err();
        assert!(matches!(err, DatasetError::Json(_)));
    }

    #[test]
    fn rejects_unknown_extension_before_opening() {
        let err = load_records(Path::new("/nonexistent/crashes.xlsx"), LoadOptions::default())
            .unwrap_err();
        assert!(matches!(err, DatasetError::UnsupportedFormat { .. }));
    }

    #[test]
    fn loads_gzipped_csv_from_disk() {
        let path = std::env::temp_dir().join(format!(
            "crash_reports_dataset_{}.csv.gz",
            std::process::id()
        ));
        let mut encoder =
            flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(CSV.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let records = load_records(&path, LoadOptions::default());
        std::fs::remove_file(&path).unwrap();

        assert_eq!(records.unwrap().len(), 2);
    }
}
