//! Command-line interface for `GeoParse`, which turns plain records into `GeoJSON`.
//!
//! This binary provides a thin CLI around the [`geoparse_core`] library: it reads
//! records from a JSON, NDJSON or CSV file, builds conversion settings from a
//! settings file and flags, and writes the resulting `FeatureCollection`.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! It parses arguments, configures logging, and delegates to command handlers.
//!
//! # Available Commands
//!
//! - `convert` - Convert a record file to `GeoJSON`
//! - `formats` - List the record formats that can be read

mod display;

use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::{Level, debug, info};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoparse_core::io::{get_formats, read_records, resolve_format, write_document, write_document_to};
use geoparse_core::types::FeatureCollection;
use geoparse_core::{GeoParseError, GeometrySource, GeometryType, Settings, parse};

#[derive(Parser)]
#[command(
    name = "geoparse",
    version,
    about = "Turn plain records into GeoJSON",
    long_about = "GeoParse converts JSON, NDJSON and CSV records into a GeoJSON FeatureCollection.\n\
                  Geometry comes from [lat, lng] field pairs or JSON-encoded coordinate fields."
)]
/// Command-line arguments and options for the `GeoParse` CLI.
///
/// This struct defines the top-level CLI interface, including global flags for
/// logging verbosity and the subcommand to execute.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `GeoParse` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Converts a record file into a GeoJSON FeatureCollection.
    ///
    /// Settings are read from `--settings` first; flags then override them.
    Convert(ConvertArgs),

    /// Lists the record formats that can be read.
    Formats,
}

#[derive(clap::Args, Debug, Default)]
struct ConvertArgs {
    /// Path to the input record file.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Path for the output GeoJSON file. Writes to standard output when omitted.
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Record format of the input (JSON, NDJSON, CSV). Guessed from the extension when omitted.
    #[arg(long, value_name = "FORMAT")]
    input_format: Option<String>,

    /// JSON file of conversion settings, e.g. {"Point": ["lat", "lng"], "exclude": ["id"]}.
    #[arg(short, long, value_name = "FILE")]
    settings: Option<PathBuf>,

    /// Point geometry from a latitude and a longitude field.
    #[arg(long, value_name = "LAT,LNG")]
    point: Option<String>,

    /// Geometry mapping, e.g. `LineString=path` or `Point=lat,lng`. Repeatable.
    #[arg(short, long, value_name = "TYPE=FIELD")]
    geometry: Vec<String>,

    /// Only these fields become properties.
    #[arg(long, value_name = "FIELD", value_delimiter = ',')]
    include: Option<Vec<String>>,

    /// Fields left out of properties.
    #[arg(long, value_name = "FIELD", value_delimiter = ',')]
    exclude: Option<Vec<String>>,

    /// Property added to every feature. Values are read as JSON when possible. Repeatable.
    #[arg(long, value_name = "KEY=VALUE")]
    extra: Vec<String>,

    /// Document-level property. Values are read as JSON when possible. Repeatable.
    #[arg(long, value_name = "KEY=VALUE")]
    extra_global: Vec<String>,

    /// Bounding box attached to the document.
    #[arg(long, value_name = "MINX,MINY,MAXX,MAXY")]
    bbox: Option<String>,

    /// Named CRS attached to the document, e.g. `urn:ogc:def:crs:OGC:1.3:CRS84`.
    #[arg(long, value_name = "NAME")]
    crs_name: Option<String>,

    /// Indent the output.
    #[arg(long)]
    pretty: bool,

    /// Fail unless the document converts to strict GeoJSON types.
    #[arg(long)]
    strict: bool,
}

/// Entry point for the `GeoParse` command-line interface.
///
/// # Errors
///
/// Returns an error if command execution fails or if the logging system cannot be initialized.
fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true) // Show module paths for better context
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Convert(args) => {
            info!("Converting {}", args.input.display());
            handle_convert(&args)?;
        },
        Commands::Formats => {
            handle_formats();
        },
    }

    Ok(())
}

fn handle_convert(args: &ConvertArgs) -> Result<()> {
    let format = resolve_format(args.input_format.as_deref(), &args.input).map_err(describe)?;
    let settings = build_settings(args)?;
    debug!("Settings: {settings:?}");

    let records = read_records(&args.input, format).map_err(describe)?;
    let document = parse(&records, Some(settings)).map_err(describe)?;

    if args.strict {
        document.to_geojson().map_err(describe)?;
        info!("Document passed strict GeoJSON conversion");
    }

    match &args.output {
        Some(output) => {
            write_document(output, &document, args.pretty).map_err(describe)?;
            display::display_summary(&output.display().to_string(), &document);
        },
        None => write_stdout(&document, args.pretty)?,
    }

    info!("Conversion complete.");
    Ok(())
}

fn handle_formats() {
    display::display_formats(&get_formats());
}

fn write_stdout(document: &FeatureCollection, pretty: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write_document_to(&mut handle, document, pretty).context("Failed to write GeoJSON to stdout")?;
    handle.flush()?;
    Ok(())
}

/// Turns a library error into a message with its recovery hint.
fn describe(err: GeoParseError) -> anyhow::Error {
    match err.recovery_suggestion() {
        Some(hint) => anyhow!("{}\n\nHint: {hint}", err.user_message()),
        None => anyhow!("{}", err.user_message()),
    }
}

fn build_settings(args: &ConvertArgs) -> Result<Settings> {
    let mut settings = match &args.settings {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("Failed to open settings file '{}'", path.display()))?;
            serde_json::from_reader::<_, Settings>(BufReader::new(file))
                .with_context(|| format!("Invalid settings file '{}'", path.display()))?
        },
        None => Settings::new(),
    };

    if let Some(point) = &args.point {
        settings.geom.insert(GeometryType::Point, parse_pair(point)?);
    }
    for mapping in &args.geometry {
        let (geometry_type, source) = parse_geometry(mapping)?;
        settings.geom.insert(geometry_type, source);
    }
    if let Some(include) = &args.include {
        settings.include = Some(include.clone());
    }
    if let Some(exclude) = &args.exclude {
        settings.exclude = Some(exclude.clone());
    }
    for entry in &args.extra {
        let (key, value) = parse_key_value(entry)?;
        settings.extra.get_or_insert_default().insert(key, value);
    }
    for entry in &args.extra_global {
        let (key, value) = parse_key_value(entry)?;
        settings.extra_global.get_or_insert_default().insert(key, value);
    }
    if let Some(bbox) = &args.bbox {
        settings.bbox = Some(parse_bbox(bbox)?);
    }
    if let Some(name) = &args.crs_name {
        settings.crs = Some(serde_json::json!({"type": "name", "properties": {"name": name}}));
    }

    Ok(settings)
}

/// Parses `LAT,LNG` into a latitude/longitude source.
fn parse_pair(value: &str) -> Result<GeometrySource> {
    match value.split_once(',') {
        Some((lat, lng)) if !lat.trim().is_empty() && !lng.trim().is_empty() => {
            Ok(GeometrySource::lat_lng(lat.trim(), lng.trim()))
        },
        _ => Err(anyhow!("Expected LAT,LNG field names, got '{value}'")),
    }
}

/// Parses `TYPE=FIELD` or `TYPE=LAT,LNG`.
fn parse_geometry(value: &str) -> Result<(GeometryType, GeometrySource)> {
    let (name, fields) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected TYPE=FIELD, got '{value}'"))?;
    let geometry_type: GeometryType = name.trim().parse().map_err(|e: String| anyhow!(e))?;

    let source = if fields.contains(',') {
        parse_pair(fields)?
    } else if fields.trim().is_empty() {
        return Err(anyhow!("Missing field name in '{value}'"));
    } else {
        GeometrySource::field(fields.trim())
    };
    Ok((geometry_type, source))
}

/// Parses `KEY=VALUE`; the value is JSON if it parses, a string otherwise.
fn parse_key_value(value: &str) -> Result<(String, serde_json::Value)> {
    let (key, raw) = value
        .split_once('=')
        .ok_or_else(|| anyhow!("Expected KEY=VALUE, got '{value}'"))?;
    let parsed = serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()));
    Ok((key.to_string(), parsed))
}

fn parse_bbox(value: &str) -> Result<serde_json::Value> {
    let numbers = value
        .split(',')
        .map(|n| {
            n.trim()
                .parse::<f64>()
                .with_context(|| format!("Invalid bbox value '{n}'"))
        })
        .collect::<Result<Vec<f64>>>()?;
    Ok(serde_json::json!(numbers))
}
