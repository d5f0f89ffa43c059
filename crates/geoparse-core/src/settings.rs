//! Conversion settings and their resolution.
//!
//! Settings come either from the typed builder methods on [`Settings`] or from
//! a JSON object of options, where each geometry mapping is a top-level key
//! named after its geometry type:
//!
//! ```
//! use geoparse_core::settings::{GeometrySource, Settings};
//! use geoparse_core::types::GeometryType;
//!
//! let options = serde_json::json!({
//!     "Point": ["lat", "lng"],
//!     "exclude": ["internal_id"],
//!     "extra": {"source": "survey"}
//! });
//! let settings: Settings = serde_json::from_value(options).unwrap();
//!
//! assert_eq!(
//!     settings.geom.get(GeometryType::Point),
//!     Some(&GeometrySource::lat_lng("lat", "lng"))
//! );
//! assert_eq!(settings.exclude, Some(vec!["internal_id".to_string()]));
//! ```
//!
//! Before a conversion runs, the caller's settings are merged with the
//! defaults and validated by [`resolve`].

use std::sync::{LazyLock, PoisonError, RwLock};

use geojson::{JsonObject, JsonValue};
use log::debug;
use serde::de::{Deserialize, Deserializer, Error as DeError};

use crate::error::ConfigError;
use crate::geometry::GeometryAttributes;
use crate::types::GeometryType;

/// Where a geometry's coordinates are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeometrySource {
    /// A single field holding JSON-encoded coordinates, e.g. `"[[1,2],[3,4]]"`.
    Field(String),
    /// Two fields holding latitude and longitude, emitted as `[lng, lat]`.
    LatLng { lat: String, lng: String },
}

impl GeometrySource {
    #[must_use]
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    #[must_use]
    pub fn lat_lng(lat: impl Into<String>, lng: impl Into<String>) -> Self {
        Self::LatLng {
            lat: lat.into(),
            lng: lng.into(),
        }
    }

    /// Record fields consumed by this source.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Field(name) => vec![name.as_str()],
            Self::LatLng { lat, lng } => vec![lat.as_str(), lng.as_str()],
        }
    }

    fn from_json(geometry_type: GeometryType, value: &JsonValue) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidOption {
            option: geometry_type.to_string(),
            message: format!(
                "expected a field name or a [lat, lng] pair of field names, found {value}"
            ),
        };

        match value {
            JsonValue::String(name) => Ok(Self::Field(name.clone())),
            JsonValue::Array(pair) => match pair.as_slice() {
                [JsonValue::String(lat), JsonValue::String(lng)] => {
                    Ok(Self::lat_lng(lat.as_str(), lng.as_str()))
                },
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

/// Geometry type to source mapping, kept in insertion order.
///
/// Mapping a type a second time replaces its source in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeometryMapping {
    entries: Vec<(GeometryType, GeometrySource)>,
}

impl GeometryMapping {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, geometry_type: GeometryType, source: GeometrySource) {
        match self.entries.iter_mut().find(|(t, _)| *t == geometry_type) {
            Some(entry) => entry.1 = source,
            None => self.entries.push((geometry_type, source)),
        }
    }

    #[must_use]
    pub fn get(&self, geometry_type: GeometryType) -> Option<&GeometrySource> {
        self.entries
            .iter()
            .find(|(t, _)| *t == geometry_type)
            .map(|(_, source)| source)
    }

    #[must_use]
    pub fn contains(&self, geometry_type: GeometryType) -> bool {
        self.get(geometry_type).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (GeometryType, &GeometrySource)> {
        self.entries.iter().map(|(t, source)| (*t, source))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Options controlling one conversion.
///
/// Every option is unset by default. Unset options take their value from the
/// defaults when the settings are resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    /// Geometry type to source field(s).
    pub geom: GeometryMapping,
    /// Only these fields become properties, in this order.
    pub include: Option<Vec<String>>,
    /// Fields left out of properties. Ignored when `include` is set.
    pub exclude: Option<Vec<String>>,
    /// Added to every feature's properties, overwriting record fields.
    pub extra: Option<JsonObject>,
    /// Emitted as the document-level `properties` member.
    pub extra_global: Option<JsonObject>,
    /// Coordinate reference system object, validated on resolve.
    pub crs: Option<JsonValue>,
    /// Bounding box, passed through as given.
    pub bbox: Option<JsonValue>,
}

impl Settings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps a geometry type to its source field(s).
    #[must_use]
    pub fn with_geometry(mut self, geometry_type: GeometryType, source: GeometrySource) -> Self {
        self.geom.insert(geometry_type, source);
        self
    }

    #[must_use]
    pub fn with_include<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_exclude<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_extra(mut self, extra: JsonObject) -> Self {
        self.extra = Some(extra);
        self
    }

    #[must_use]
    pub fn with_extra_global(mut self, extra_global: JsonObject) -> Self {
        self.extra_global = Some(extra_global);
        self
    }

    #[must_use]
    pub fn with_crs(mut self, crs: JsonValue) -> Self {
        self.crs = Some(crs);
        self
    }

    #[must_use]
    pub fn with_bbox(mut self, bbox: JsonValue) -> Self {
        self.bbox = Some(bbox);
        self
    }

    /// Fills every unset option from `defaults`.
    ///
    /// Options the caller set are never overwritten. Geometry mappings merge
    /// per geometry type, and default mappings follow the caller's own.
    pub fn apply_defaults(&mut self, defaults: &Settings) {
        for (geometry_type, source) in defaults.geom.iter() {
            if !self.geom.contains(geometry_type) {
                self.geom.insert(geometry_type, source.clone());
            }
        }

        fill(&mut self.include, &defaults.include);
        fill(&mut self.exclude, &defaults.exclude);
        fill(&mut self.extra, &defaults.extra);
        fill(&mut self.extra_global, &defaults.extra_global);
        fill(&mut self.crs, &defaults.crs);
        fill(&mut self.bbox, &defaults.bbox);
    }
}

fn fill<T: Clone>(option: &mut Option<T>, default: &Option<T>) {
    if option.is_none() {
        option.clone_from(default);
    }
}

impl TryFrom<JsonObject> for Settings {
    type Error = ConfigError;

    /// Reads settings from a JSON options object.
    ///
    /// Keys named after a geometry type become geometry mappings. A `null`
    /// value leaves the option unset. Unrecognized keys are ignored.
    fn try_from(options: JsonObject) -> Result<Self, Self::Error> {
        let mut settings = Settings::default();

        for (key, value) in options {
            if value.is_null() {
                continue;
            }
            if let Some(geometry_type) = GeometryType::from_name(&key) {
                let source = GeometrySource::from_json(geometry_type, &value)?;
                settings.geom.insert(geometry_type, source);
                continue;
            }
            match key.as_str() {
                "include" => settings.include = Some(string_list(&key, value)?),
                "exclude" => settings.exclude = Some(string_list(&key, value)?),
                "extra" => settings.extra = Some(object(&key, value)?),
                "extraGlobal" => settings.extra_global = Some(object(&key, value)?),
                "crs" => {
                    if !value.is_object() {
                        return Err(ConfigError::InvalidCrs {
                            message: format!("Expected an object, found {value}"),
                        });
                    }
                    settings.crs = Some(value);
                },
                "bbox" => settings.bbox = Some(value),
                _ => debug!("Ignoring unrecognized option '{key}'"),
            }
        }

        Ok(settings)
    }
}

impl TryFrom<JsonValue> for Settings {
    type Error = ConfigError;

    fn try_from(value: JsonValue) -> Result<Self, Self::Error> {
        match value {
            JsonValue::Object(options) => Settings::try_from(options),
            JsonValue::Null => Ok(Settings::default()),
            other => Err(ConfigError::InvalidOption {
                option: "settings".to_string(),
                message: format!("expected an object of options, found {other}"),
            }),
        }
    }
}

impl<'de> Deserialize<'de> for Settings {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = JsonValue::deserialize(deserializer)?;
        Settings::try_from(value).map_err(D::Error::custom)
    }
}

fn string_list(option: &str, value: JsonValue) -> Result<Vec<String>, ConfigError> {
    let invalid = |found: &JsonValue| ConfigError::InvalidOption {
        option: option.to_string(),
        message: format!("expected an array of field names, found {found}"),
    };

    let JsonValue::Array(items) = value else {
        return Err(invalid(&value));
    };
    items
        .into_iter()
        .map(|item| match item {
            JsonValue::String(name) => Ok(name),
            other => Err(invalid(&other)),
        })
        .collect()
}

fn object(option: &str, value: JsonValue) -> Result<JsonObject, ConfigError> {
    match value {
        JsonValue::Object(object) => Ok(object),
        other => Err(ConfigError::InvalidOption {
            option: option.to_string(),
            message: format!("expected an object, found {other}"),
        }),
    }
}

/// Loose truthiness used for record values and CRS members.
///
/// `null`, `false`, `0` and the empty string are falsy; everything else,
/// including empty arrays and objects, is truthy.
#[must_use]
pub fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

/// Checks the structure of a CRS object.
///
/// A `name` CRS needs `properties.name`; a `link` CRS needs
/// `properties.href` and `properties.type`.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidCrs`] for any other shape.
pub fn validate_crs(crs: &JsonValue) -> Result<(), ConfigError> {
    let has = |key: &str| {
        crs.get("properties")
            .and_then(|properties| properties.get(key))
            .is_some_and(is_truthy)
    };

    match crs.get("type").and_then(JsonValue::as_str) {
        Some("name") if has("name") => Ok(()),
        Some("name") => Err(ConfigError::InvalidCrs {
            message: "Properties must contain \"name\" key".to_string(),
        }),
        Some("link") if has("href") && has("type") => Ok(()),
        Some("link") => Err(ConfigError::InvalidCrs {
            message: "Properties must contain \"href\" and \"type\" key".to_string(),
        }),
        _ => Err(ConfigError::InvalidCrs {
            message: "Type attribute must be \"name\" or \"link\"".to_string(),
        }),
    }
}

/// Settings ready for one conversion, together with the geometry attributes
/// derived from them.
#[derive(Debug, Clone)]
pub struct ResolvedSettings {
    pub settings: Settings,
    pub attributes: GeometryAttributes,
}

/// Merges `settings` with `defaults` and validates the result.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the CRS is malformed or no geometry mapping
/// is configured.
pub fn resolve(
    settings: Option<Settings>,
    defaults: &Settings,
) -> Result<ResolvedSettings, ConfigError> {
    let mut settings = settings.unwrap_or_default();
    settings.apply_defaults(defaults);

    if let Some(crs) = &settings.crs {
        validate_crs(crs)?;
    }

    let attributes = GeometryAttributes::from_mapping(&settings.geom)?;
    debug!(
        "Resolved {} geometry mapping(s) over fields [{}]",
        settings.geom.len(),
        attributes.iter().collect::<Vec<_>>().join(", ")
    );

    Ok(ResolvedSettings {
        settings,
        attributes,
    })
}

static DEFAULTS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

/// Returns a copy of the process-wide default settings.
#[must_use]
pub fn defaults() -> Settings {
    DEFAULTS
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Replaces the process-wide default settings.
pub fn set_defaults(settings: Settings) {
    *DEFAULTS.write().unwrap_or_else(PoisonError::into_inner) = settings;
}

/// Edits the process-wide default settings in place.
pub fn update_defaults(update: impl FnOnce(&mut Settings)) {
    let mut guard = DEFAULTS.write().unwrap_or_else(PoisonError::into_inner);
    update(&mut *guard);
}

/// Clears every process-wide default.
pub fn reset_defaults() {
    set_defaults(Settings::default());
}
