//! `geoparse-core` is the core library for the `GeoParse` project. It turns plain
//! records into `GeoJSON` `FeatureCollection` documents.
//!
//! This crate includes:
//! - **Settings**: geometry field mappings, property selection and document
//!   options, merged with defaults and validated before a conversion runs.
//! - **Geometry**: extraction of point coordinates from `[lat, lng]` field pairs
//!   or of full coordinate arrays from JSON-encoded fields.
//! - **Properties**: include, exclude or default projection of record fields.
//! - **Operations**: the [`parse`] and [`parse_with`] entry points.
//! - **I/O**: record readers (JSON, NDJSON, CSV) and a document writer.

pub mod error;
pub mod geometry;
pub mod io;
pub mod operations;
pub mod properties;
pub mod settings;
pub mod types;

pub use error::{ConfigError, GeoParseError, GeometryError, Result};
pub use operations::{Converter, parse, parse_with};
pub use settings::{GeometrySource, Settings};
pub use types::{Feature, FeatureCollection, Geometry, GeometryType, Record};
