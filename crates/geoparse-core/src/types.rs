//! Data types for records and the `GeoJSON` documents built from them.
//!
//! Records are plain JSON objects. The output types serialize to the exact
//! member layout of a `GeoJSON` `FeatureCollection`, including the empty
//! geometry object `{}` for records that matched no geometry mapping.

use std::fmt;
use std::str::FromStr;

use geojson::{JsonObject, JsonValue};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// A single input record: field name to value, in insertion order.
pub type Record = JsonObject;

/// The geometry types a record field can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    MultiPoint,
    LineString,
    MultiLineString,
    Polygon,
    MultiPolygon,
}

impl GeometryType {
    /// Every supported geometry type, in the order they are documented.
    pub const ALL: [GeometryType; 6] = [
        GeometryType::Point,
        GeometryType::MultiPoint,
        GeometryType::LineString,
        GeometryType::MultiLineString,
        GeometryType::Polygon,
        GeometryType::MultiPolygon,
    ];

    /// Returns the `GeoJSON` name of this geometry type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryType::Point => "Point",
            GeometryType::MultiPoint => "MultiPoint",
            GeometryType::LineString => "LineString",
            GeometryType::MultiLineString => "MultiLineString",
            GeometryType::Polygon => "Polygon",
            GeometryType::MultiPolygon => "MultiPolygon",
        }
    }

    /// Looks up a geometry type by its exact `GeoJSON` name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GeometryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| {
            let names: Vec<&str> = Self::ALL.iter().map(GeometryType::as_str).collect();
            format!("unknown geometry type '{s}', expected one of {}", names.join(", "))
        })
    }
}

/// Geometry of one feature.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Geometry {
    /// No mapping matched the record; serialized as `{}`.
    #[default]
    Empty,
    /// A typed geometry with coordinates passed through as found.
    Shape {
        geometry_type: GeometryType,
        coordinates: JsonValue,
    },
}

impl Geometry {
    /// Returns `true` when no geometry mapping matched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Geometry::Empty)
    }

    #[must_use]
    pub fn geometry_type(&self) -> Option<GeometryType> {
        match self {
            Geometry::Empty => None,
            Geometry::Shape { geometry_type, .. } => Some(*geometry_type),
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<&JsonValue> {
        match self {
            Geometry::Empty => None,
            Geometry::Shape { coordinates, .. } => Some(coordinates),
        }
    }

    /// Converts to a JSON value; the empty geometry becomes `{}`.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        let mut object = JsonObject::new();
        if let Geometry::Shape {
            geometry_type,
            coordinates,
        } = self
        {
            object.insert("type".to_string(), geometry_type.as_str().into());
            object.insert("coordinates".to_string(), coordinates.clone());
        }
        JsonValue::Object(object)
    }
}

impl Serialize for Geometry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Geometry::Empty => serializer.serialize_map(Some(0))?.end(),
            Geometry::Shape {
                geometry_type,
                coordinates,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("type", geometry_type.as_str())?;
                map.serialize_entry("coordinates", coordinates)?;
                map.end()
            },
        }
    }
}

/// One output feature, built from one record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: JsonObject,
}

impl Feature {
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        let mut object = JsonObject::new();
        object.insert("type".to_string(), "Feature".into());
        object.insert("geometry".to_string(), self.geometry.to_json_value());
        object.insert(
            "properties".to_string(),
            JsonValue::Object(self.properties.clone()),
        );
        JsonValue::Object(object)
    }
}

impl Serialize for Feature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("type", "Feature")?;
        map.serialize_entry("geometry", &self.geometry)?;
        map.serialize_entry("properties", &self.properties)?;
        map.end()
    }
}

/// The assembled `GeoJSON` document.
///
/// `crs`, `bbox` and the document-level `properties` are only emitted when set.
/// Document-level `properties` is not part of RFC 7946; it carries the
/// `extraGlobal` option.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: Option<JsonValue>,
    pub bbox: Option<JsonValue>,
    pub properties: Option<JsonObject>,
}

impl FeatureCollection {
    /// Creates an empty collection with no optional members.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Converts the document to a JSON value with `GeoJSON` member order.
    #[must_use]
    pub fn to_json_value(&self) -> JsonValue {
        JsonValue::Object(self.to_json_object(Feature::to_json_value))
    }

    /// Serializes the document to compact JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Serializes the document to indented JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_string_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Converts the document into strict `geojson` crate types.
    ///
    /// Empty geometries become `null` geometries, and `crs` and document
    /// `properties` are kept as foreign members.
    ///
    /// # Errors
    ///
    /// Returns an error when a geometry does not have the coordinate structure
    /// its type requires, for instance string coordinates read from CSV.
    pub fn to_geojson(&self) -> crate::error::Result<geojson::FeatureCollection> {
        let object = self.to_json_object(|feature| {
            let mut value = feature.to_json_value();
            if feature.geometry.is_empty() {
                value["geometry"] = JsonValue::Null;
            }
            value
        });
        Ok(geojson::FeatureCollection::try_from(object)?)
    }

    fn to_json_object(&self, feature_value: impl Fn(&Feature) -> JsonValue) -> JsonObject {
        let mut object = JsonObject::new();
        object.insert("type".to_string(), "FeatureCollection".into());
        object.insert(
            "features".to_string(),
            JsonValue::Array(self.features.iter().map(feature_value).collect()),
        );
        if let Some(crs) = &self.crs {
            object.insert("crs".to_string(), crs.clone());
        }
        if let Some(bbox) = &self.bbox {
            object.insert("bbox".to_string(), bbox.clone());
        }
        if let Some(properties) = &self.properties {
            object.insert(
                "properties".to_string(),
                JsonValue::Object(properties.clone()),
            );
        }
        object
    }
}

impl Serialize for FeatureCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("type", "FeatureCollection")?;
        map.serialize_entry("features", &self.features)?;
        if let Some(crs) = &self.crs {
            map.serialize_entry("crs", crs)?;
        }
        if let Some(bbox) = &self.bbox {
            map.serialize_entry("bbox", bbox)?;
        }
        if let Some(properties) = &self.properties {
            map.serialize_entry("properties", properties)?;
        }
        map.end()
    }
}
