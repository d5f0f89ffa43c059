//! Display utilities for formatting CLI output.
//!
//! This module provides table row structures and formatting functions
//! for presenting record formats and conversion summaries.

use tabled::{Table, Tabled};

use geoparse_core::io::RecordFormat;
use geoparse_core::types::{FeatureCollection, GeometryType};

/// Table row representation for displaying record format information.
#[derive(Tabled)]
pub struct FormatRow {
    /// Short identifier for the format (e.g., `CSV`).
    #[tabled(rename = "Short Name")]
    pub short_name: String,
    /// Full descriptive name of the format.
    #[tabled(rename = "Long Name")]
    pub long_name: String,
    /// File extensions mapped to the format.
    #[tabled(rename = "Extensions")]
    pub extensions: String,
}

impl From<&RecordFormat> for FormatRow {
    fn from(format: &RecordFormat) -> Self {
        Self {
            short_name: format.short_name().to_string(),
            long_name: format.long_name().to_string(),
            extensions: format
                .extensions()
                .iter()
                .map(|e| format!(".{e}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

/// Table row counting features per geometry type.
#[derive(Tabled)]
pub struct GeometryCountRow {
    #[tabled(rename = "Geometry")]
    pub geometry: String,
    #[tabled(rename = "Features")]
    pub features: usize,
}

/// Counts features per geometry type, listing types in their documented order
/// and records without geometry last.
#[must_use]
pub fn geometry_counts(document: &FeatureCollection) -> Vec<GeometryCountRow> {
    let count = |wanted: Option<GeometryType>| {
        document
            .features
            .iter()
            .filter(|f| f.geometry.geometry_type() == wanted)
            .count()
    };

    GeometryType::ALL
        .into_iter()
        .map(Some)
        .chain(std::iter::once(None))
        .filter_map(|geometry_type| {
            let features = count(geometry_type);
            (features > 0).then(|| GeometryCountRow {
                geometry: geometry_type.map_or_else(|| "(none)".to_string(), |t| t.to_string()),
                features,
            })
        })
        .collect()
}

/// Display the record formats in a formatted table.
pub fn display_formats(formats: &[RecordFormat]) {
    println!("\nRecord Formats ({} total):\n", formats.len());

    let rows: Vec<FormatRow> = formats.iter().map(FormatRow::from).collect();
    let table = Table::new(rows).to_string();
    println!("{table}");
}

/// Display a summary of a written document.
///
/// # Arguments
///
/// * `output` - Where the document was written
/// * `document` - The converted document
pub fn display_summary(output: &str, document: &FeatureCollection) {
    println!("\nOutput: {output}");
    println!("Features: {}", document.features.len());

    let rows = geometry_counts(document);
    if !rows.is_empty() {
        println!("\n=== Geometries ===");
        let table = Table::new(rows).to_string();
        println!("{table}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geoparse_core::types::{Feature, Geometry};

    fn feature(geometry_type: Option<GeometryType>) -> Feature {
        Feature {
            geometry: geometry_type.map_or(Geometry::Empty, |geometry_type| Geometry::Shape {
                geometry_type,
                coordinates: serde_json::json!([0, 0]),
            }),
            properties: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_format_row_creation() {
        let row = FormatRow::from(&RecordFormat::NdJson);
        assert_eq!(row.short_name, "NDJSON");
        assert_eq!(row.extensions, ".ndjson, .jsonl");
    }

    #[test]
    fn test_geometry_counts() {
        let document = FeatureCollection {
            features: vec![
                feature(Some(GeometryType::Polygon)),
                feature(None),
                feature(Some(GeometryType::Point)),
                feature(Some(GeometryType::Point)),
            ],
            ..FeatureCollection::default()
        };

        let rows = geometry_counts(&document);
        let summary: Vec<(&str, usize)> = rows
            .iter()
            .map(|r| (r.geometry.as_str(), r.features))
            .collect();
        assert_eq!(summary, vec![("Point", 2), ("Polygon", 1), ("(none)", 1)]);
    }

    #[test]
    fn test_display_formats() {
        // This test just ensures the function runs without panicking
        display_formats(&geoparse_core::io::get_formats());
    }

    #[test]
    fn test_display_summary_empty() {
        // This test ensures empty documents are handled correctly
        display_summary("out.geojson", &FeatureCollection::new());
    }
}
