//! Record to `GeoJSON` conversion.
//!
//! This module provides the entry points that turn a slice of records into a
//! [`FeatureCollection`]: [`parse`] returns the document, [`parse_with`] hands
//! it to a callback. Both consult the process-wide defaults; a [`Converter`]
//! carries its own defaults instead.

use log::{debug, info};

use crate::error::Result;
use crate::geometry::build_geometry;
use crate::properties::PropertyProjection;
use crate::settings::{self, Settings, resolve, validate_crs};
use crate::types::{Feature, FeatureCollection, Record};

/// Converts records into a `GeoJSON` `FeatureCollection`.
///
/// The settings are merged with the process-wide defaults (see
/// [`settings::set_defaults`]) before the conversion starts.
///
/// # Arguments
///
/// * `records` - The records to convert; one feature is produced per record,
///   in the same order.
/// * `settings` - Geometry mappings and property options. `None` uses the
///   defaults alone.
///
/// # Errors
///
/// Returns a configuration error when the settings are invalid, or a geometry
/// error when any record holds an unreadable geometry. No partial document is
/// produced in either case.
///
/// # Examples
///
/// ```
/// use geoparse_core::operations::parse;
/// use geoparse_core::settings::{GeometrySource, Settings};
/// use geoparse_core::types::GeometryType;
///
/// let records = vec![
///     serde_json::json!({"name": "Bangkok", "lat": 13.75, "lng": 100.5})
///         .as_object()
///         .cloned()
///         .unwrap(),
/// ];
/// let settings = Settings::new()
///     .with_geometry(GeometryType::Point, GeometrySource::lat_lng("lat", "lng"));
///
/// let document = parse(&records, Some(settings)).unwrap();
/// assert_eq!(document.features.len(), 1);
/// assert_eq!(
///     document.features[0].properties.get("name"),
///     Some(&serde_json::json!("Bangkok"))
/// );
/// ```
pub fn parse(records: &[Record], settings: Option<Settings>) -> Result<FeatureCollection> {
    Converter::from_process_defaults().parse(records, settings)
}

/// Converts records and delivers the document to `on_complete`.
///
/// The callback runs inline, exactly once, before this function returns.
/// Nothing is delivered when the conversion fails.
///
/// # Errors
///
/// Same as [`parse`].
pub fn parse_with<F>(records: &[Record], settings: Option<Settings>, on_complete: F) -> Result<()>
where
    F: FnOnce(FeatureCollection),
{
    Converter::from_process_defaults().parse_with(records, settings, on_complete)
}

/// A converter with its own defaults.
#[derive(Debug, Clone, Default)]
pub struct Converter {
    defaults: Settings,
}

impl Converter {
    /// Creates a converter without defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a converter from a snapshot of the process-wide defaults.
    #[must_use]
    pub fn from_process_defaults() -> Self {
        Self::with_defaults(settings::defaults())
    }

    #[must_use]
    pub fn with_defaults(defaults: Settings) -> Self {
        Self { defaults }
    }

    #[must_use]
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    pub fn defaults_mut(&mut self) -> &mut Settings {
        &mut self.defaults
    }

    /// Converts records using this converter's defaults.
    ///
    /// # Errors
    ///
    /// Same as [`parse`].
    pub fn parse(&self, records: &[Record], settings: Option<Settings>) -> Result<FeatureCollection> {
        let resolved = resolve(settings, &self.defaults)?;
        let settings = &resolved.settings;
        let projection = PropertyProjection::from_settings(settings);

        info!("Converting {} record(s) to GeoJSON", records.len());
        debug!("Property projection: {projection:?}");

        let mut document = FeatureCollection::new();
        document.features.reserve(records.len());

        for (index, record) in records.iter().enumerate() {
            let geometry = build_geometry(index, record, &settings.geom)?;
            let properties = projection.project(record, &resolved.attributes, settings.extra.as_ref());
            document.features.push(Feature {
                geometry,
                properties,
            });
        }

        if let Some(crs) = &settings.crs {
            validate_crs(crs)?;
            document.crs = Some(crs.clone());
        }
        document.bbox.clone_from(&settings.bbox);
        document.properties.clone_from(&settings.extra_global);

        let empty = document
            .features
            .iter()
            .filter(|feature| feature.geometry.is_empty())
            .count();
        if empty > 0 {
            debug!("{empty} record(s) matched no geometry mapping");
        }
        info!("Built {} feature(s)", document.features.len());

        Ok(document)
    }

    /// Converts records and delivers the document to `on_complete`.
    ///
    /// # Errors
    ///
    /// Same as [`parse`].
    pub fn parse_with<F>(&self, records: &[Record], settings: Option<Settings>, on_complete: F) -> Result<()>
    where
        F: FnOnce(FeatureCollection),
    {
        let document = self.parse(records, settings)?;
        on_complete(document);
        Ok(())
    }
}
