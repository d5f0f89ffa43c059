//! Reading records from files and writing finished documents.
//!
//! The conversion itself never touches the filesystem. These helpers feed it
//! from the record formats listed by [`get_formats`] and persist the result.
//!
//! # Examples
//!
//! ```
//! use geoparse_core::io::{RecordFormat, find_format};
//!
//! let csv = find_format("csv").expect("CSV should exist");
//! assert_eq!(csv, RecordFormat::Csv);
//! assert!(find_format("shapefile").is_none());
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use geojson::{JsonObject, JsonValue};
use log::{debug, info};

use crate::error::{IoError, IoErrorExt, Result, format_not_found};
use crate::types::{FeatureCollection, Record};

/// Record formats the readers understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    /// A JSON array of objects.
    Json,
    /// One JSON object per line.
    NdJson,
    /// Comma separated values with a header row; every value is read as a string.
    Csv,
}

impl RecordFormat {
    /// Short name used on the command line.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            RecordFormat::Json => "JSON",
            RecordFormat::NdJson => "NDJSON",
            RecordFormat::Csv => "CSV",
        }
    }

    /// Descriptive name for display purposes.
    #[must_use]
    pub fn long_name(&self) -> &'static str {
        match self {
            RecordFormat::Json => "JSON array of objects (.json)",
            RecordFormat::NdJson => "Newline delimited JSON objects (.ndjson, .jsonl)",
            RecordFormat::Csv => "Comma Separated Value (.csv)",
        }
    }

    /// File extensions recognized for this format, without the dot.
    #[must_use]
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            RecordFormat::Json => &["json"],
            RecordFormat::NdJson => &["ndjson", "jsonl"],
            RecordFormat::Csv => &["csv"],
        }
    }
}

/// Returns every record format.
#[must_use]
pub fn get_formats() -> Vec<RecordFormat> {
    vec![RecordFormat::Json, RecordFormat::NdJson, RecordFormat::Csv]
}

/// Finds a record format by short name, ignoring case.
#[must_use]
pub fn find_format(name: &str) -> Option<RecordFormat> {
    get_formats()
        .into_iter()
        .find(|f| f.short_name().eq_ignore_ascii_case(name))
}

/// Guesses the record format from a file extension.
#[must_use]
pub fn format_for_path(path: impl AsRef<Path>) -> Option<RecordFormat> {
    let extension = path.as_ref().extension()?.to_str()?;
    get_formats().into_iter().find(|f| {
        f.extensions()
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    })
}

/// Returns all format short names in alphabetically sorted order.
#[must_use]
pub fn get_format_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = get_formats().iter().map(RecordFormat::short_name).collect();
    names.sort_unstable();
    names
}

/// Resolves a format by explicit name, falling back to the file extension.
///
/// # Errors
///
/// Returns [`IoError::UnsupportedFormat`] when neither identifies a format.
pub fn resolve_format(name: Option<&str>, path: impl AsRef<Path>) -> Result<RecordFormat> {
    let path = path.as_ref();
    match name {
        Some(name) => find_format(name).ok_or_else(|| format_not_found(name).into()),
        None => format_for_path(path).ok_or_else(|| {
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or_default();
            format_not_found(extension).into()
        }),
    }
}

/// Reads all records from the file at `path`.
///
/// # Errors
///
/// Returns an I/O error when the file is missing, cannot be parsed, or holds
/// something other than objects.
pub fn read_records(path: impl AsRef<Path>, format: RecordFormat) -> Result<Vec<Record>> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(IoError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    info!("Reading {} file: {}", format.short_name(), path.display());
    let file = File::open(path).with_read_context(format.short_name(), path)?;
    let records = read_records_from(BufReader::new(file), format, path)?;
    info!("Read {} record(s)", records.len());
    Ok(records)
}

/// Reads records from any reader; `origin` names the source in errors.
///
/// # Errors
///
/// Same as [`read_records`].
pub fn read_records_from<R: BufRead>(
    reader: R,
    format: RecordFormat,
    origin: impl AsRef<Path>,
) -> Result<Vec<Record>> {
    let origin = origin.as_ref();
    let name = format.short_name();

    match format {
        RecordFormat::Json => {
            let value: JsonValue = serde_json::from_reader(reader).with_read_context(name, origin)?;
            let JsonValue::Array(items) = value else {
                return Err(not_records(name, origin, "expected a top-level array"));
            };
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    into_record(item).ok_or_else(|| {
                        not_records(name, origin, &format!("element {i} is not an object"))
                    })
                })
                .collect()
        },
        RecordFormat::NdJson => {
            let mut records = Vec::new();
            for (i, line) in reader.lines().enumerate() {
                let line = line.with_read_context(name, origin)?;
                if line.trim().is_empty() {
                    continue;
                }
                let value: JsonValue = serde_json::from_str(&line).with_read_context(name, origin)?;
                let record = into_record(value).ok_or_else(|| {
                    not_records(name, origin, &format!("line {} is not an object", i + 1))
                })?;
                records.push(record);
            }
            Ok(records)
        },
        RecordFormat::Csv => read_csv(reader, origin),
    }
}

fn read_csv<R: Read>(reader: R, origin: &Path) -> Result<Vec<Record>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers().with_read_context("CSV", origin)?.clone();
    debug!("CSV columns: {}", headers.iter().collect::<Vec<_>>().join(", "));

    let mut records = Vec::new();
    for row in csv_reader.records() {
        let row = row.with_read_context("CSV", origin)?;
        let record: JsonObject = headers
            .iter()
            .zip(row.iter())
            .map(|(header, value)| (header.to_string(), JsonValue::String(value.to_string())))
            .collect();
        records.push(record);
    }
    Ok(records)
}

fn into_record(value: JsonValue) -> Option<Record> {
    match value {
        JsonValue::Object(object) => Some(object),
        _ => None,
    }
}

fn not_records(format: &str, path: &Path, message: &str) -> crate::error::GeoParseError {
    IoError::NotRecords {
        format: format.to_string(),
        path: path.to_path_buf(),
        message: message.to_string(),
    }
    .into()
}

/// Writes `document` as `GeoJSON` text to `path`.
///
/// # Errors
///
/// Returns [`IoError::Write`] if the file cannot be created or written.
pub fn write_document(path: impl AsRef<Path>, document: &FeatureCollection, pretty: bool) -> Result<()> {
    let path = path.as_ref();
    info!("Writing GeoJSON file: {}", path.display());

    let file = File::create(path).with_write_context("GeoJSON", path)?;
    let mut writer = BufWriter::new(file);
    write_document_to(&mut writer, document, pretty).with_write_context("GeoJSON", path)?;
    writer.flush().with_write_context("GeoJSON", path)?;
    Ok(())
}

/// Writes `document` as `GeoJSON` text to any writer, ending with a newline.
///
/// # Errors
///
/// Returns an error if serialization or the underlying write fails.
pub fn write_document_to<W: Write>(
    writer: &mut W,
    document: &FeatureCollection,
    pretty: bool,
) -> std::result::Result<(), serde_json::Error> {
    if pretty {
        serde_json::to_writer_pretty(&mut *writer, document)?;
    } else {
        serde_json::to_writer(&mut *writer, document)?;
    }
    writer.write_all(b"\n").map_err(serde_json::Error::io)
}
