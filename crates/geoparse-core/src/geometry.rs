//! Geometry extraction from records.
//!
//! [`GeometryAttributes`] names the record fields that feed geometries, so the
//! property projection can leave them out. [`build_geometry`] assembles the
//! geometry of a single record from the configured mapping.

use geojson::JsonValue;
use log::debug;

use crate::error::{ConfigError, GeometryError};
use crate::settings::{GeometryMapping, GeometrySource, is_truthy};
use crate::types::{Geometry, Record};

/// Record fields reserved for geometry during one conversion.
///
/// Built fresh from the resolved mapping for every call and passed along
/// explicitly, so calls never see each other's fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryAttributes {
    fields: Vec<String>,
}

impl GeometryAttributes {
    /// Collects the fields used by every entry of `mapping`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoGeometryAttributes`] when the mapping names no
    /// field at all.
    pub fn from_mapping(mapping: &GeometryMapping) -> Result<Self, ConfigError> {
        let mut fields = Vec::new();
        for (_, source) in mapping.iter() {
            fields.extend(source.fields().into_iter().map(str::to_string));
        }

        if fields.is_empty() {
            return Err(ConfigError::NoGeometryAttributes);
        }
        Ok(Self { fields })
    }

    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builds the geometry of the record at position `index`.
///
/// Every mapping entry is tried in order and each match replaces the previous
/// one, so when several entries apply to the same record the last one wins.
/// A record no entry applies to gets [`Geometry::Empty`].
///
/// # Errors
///
/// Returns a [`GeometryError`] when a single-field source holds text that is
/// not JSON, or a value that cannot hold coordinates.
pub fn build_geometry(
    index: usize,
    record: &Record,
    mapping: &GeometryMapping,
) -> Result<Geometry, GeometryError> {
    let mut geometry = Geometry::Empty;

    for (geometry_type, source) in mapping.iter() {
        let coordinates = match source {
            GeometrySource::Field(field) => match record.get(field) {
                Some(value) if is_truthy(value) => decode_coordinates(index, field, value)?,
                _ => continue,
            },
            GeometrySource::LatLng { lat, lng } => match (record.get(lat), record.get(lng)) {
                (Some(lat), Some(lng)) => JsonValue::Array(vec![lng.clone(), lat.clone()]),
                _ => continue,
            },
        };

        if let Some(previous) = geometry.geometry_type() {
            debug!("Record {index}: {geometry_type} mapping overrides {previous}");
        }
        geometry = Geometry::Shape {
            geometry_type,
            coordinates,
        };
    }

    Ok(geometry)
}

fn decode_coordinates(
    index: usize,
    field: &str,
    value: &JsonValue,
) -> Result<JsonValue, GeometryError> {
    match value {
        JsonValue::String(text) => {
            serde_json::from_str(text).map_err(|source| GeometryError::Parse {
                record: index,
                field: field.to_string(),
                source,
            })
        },
        JsonValue::Array(_) => Ok(value.clone()),
        other => Err(GeometryError::UnexpectedValue {
            record: index,
            field: field.to_string(),
            found: value_kind(other).to_string(),
        }),
    }
}

fn value_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GeometryType;
    use serde_json::json;

    fn record(value: JsonValue) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn mapping(entries: &[(GeometryType, GeometrySource)]) -> GeometryMapping {
        let mut mapping = GeometryMapping::new();
        for (geometry_type, source) in entries {
            mapping.insert(*geometry_type, source.clone());
        }
        mapping
    }

    #[test]
    fn test_attributes_from_mapping() {
        let attributes = GeometryAttributes::from_mapping(&mapping(&[
            (GeometryType::Point, GeometrySource::lat_lng("lat", "lng")),
            (GeometryType::Polygon, GeometrySource::field("shape")),
        ]))
        .unwrap();

        assert_eq!(attributes.iter().collect::<Vec<_>>(), vec!["lat", "lng", "shape"]);
        assert!(attributes.contains("shape"));
        assert!(!attributes.contains("name"));
    }

    #[test]
    fn test_attributes_require_a_mapping() {
        let err = GeometryAttributes::from_mapping(&GeometryMapping::new()).unwrap_err();
        assert_eq!(err.to_string(), "No geometry attributes specified");
    }

    #[test]
    fn test_lat_lng_emits_lng_first() {
        let geometry = build_geometry(
            0,
            &record(json!({"lat": 13.6, "lng": 100.5})),
            &mapping(&[(GeometryType::Point, GeometrySource::lat_lng("lat", "lng"))]),
        )
        .unwrap();

        assert_eq!(geometry.geometry_type(), Some(GeometryType::Point));
        assert_eq!(geometry.coordinates(), Some(&json!([100.5, 13.6])));
    }

    #[test]
    fn test_lat_lng_passes_values_through() {
        let geometry = build_geometry(
            0,
            &record(json!({"lat": "13.6", "lng": null})),
            &mapping(&[(GeometryType::Point, GeometrySource::lat_lng("lat", "lng"))]),
        )
        .unwrap();

        assert_eq!(geometry.coordinates(), Some(&json!([null, "13.6"])));
    }

    #[test]
    fn test_single_field_parses_json_text() {
        let geometry = build_geometry(
            0,
            &record(json!({"coords": "[[1,2],[3,4]]"})),
            &mapping(&[(GeometryType::LineString, GeometrySource::field("coords"))]),
        )
        .unwrap();

        assert_eq!(
            geometry.to_json_value(),
            json!({"type": "LineString", "coordinates": [[1, 2], [3, 4]]})
        );
    }

    #[test]
    fn test_single_field_accepts_decoded_array() {
        let geometry = build_geometry(
            0,
            &record(json!({"coords": [[1, 2], [3, 4]]})),
            &mapping(&[(GeometryType::MultiPoint, GeometrySource::field("coords"))]),
        )
        .unwrap();

        assert_eq!(geometry.coordinates(), Some(&json!([[1, 2], [3, 4]])));
    }

    #[test]
    fn test_single_field_bad_json() {
        let err = build_geometry(
            7,
            &record(json!({"coords": "[[1,2],"})),
            &mapping(&[(GeometryType::LineString, GeometrySource::field("coords"))]),
        )
        .unwrap_err();

        assert!(matches!(err, GeometryError::Parse { record: 7, ref field, .. } if field == "coords"));
    }

    #[test]
    fn test_single_field_unexpected_value() {
        let err = build_geometry(
            2,
            &record(json!({"coords": {"x": 1}})),
            &mapping(&[(GeometryType::Point, GeometrySource::field("coords"))]),
        )
        .unwrap_err();

        assert!(err.to_string().contains("an object"));
    }

    #[test]
    fn test_falsy_field_is_skipped() {
        let geometry_mapping = mapping(&[(GeometryType::Polygon, GeometrySource::field("shape"))]);
        for value in [json!(""), json!(0), json!(null), json!(false)] {
            let geometry =
                build_geometry(0, &record(json!({ "shape": value })), &geometry_mapping).unwrap();
            assert!(geometry.is_empty());
        }
    }

    #[test]
    fn test_no_match_yields_empty_geometry() {
        let geometry = build_geometry(
            0,
            &record(json!({"lat": 1.0})),
            &mapping(&[(GeometryType::Point, GeometrySource::lat_lng("lat", "lng"))]),
        )
        .unwrap();

        assert!(geometry.is_empty());
        assert_eq!(geometry.to_json_value(), json!({}));
    }

    #[test]
    fn test_last_match_wins() {
        let geometry = build_geometry(
            0,
            &record(json!({"lat": 1.0, "lng": 2.0, "line": "[[0,0],[1,1]]"})),
            &mapping(&[
                (GeometryType::Point, GeometrySource::lat_lng("lat", "lng")),
                (GeometryType::LineString, GeometrySource::field("line")),
            ]),
        )
        .unwrap();

        assert_eq!(geometry.geometry_type(), Some(GeometryType::LineString));

        let geometry = build_geometry(
            0,
            &record(json!({"lat": 1.0, "lng": 2.0})),
            &mapping(&[
                (GeometryType::Point, GeometrySource::lat_lng("lat", "lng")),
                (GeometryType::LineString, GeometrySource::field("line")),
            ]),
        )
        .unwrap();

        assert_eq!(geometry.geometry_type(), Some(GeometryType::Point));
    }
}
