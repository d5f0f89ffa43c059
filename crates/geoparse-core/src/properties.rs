//! Property projection.
//!
//! A [`PropertyProjection`] is chosen once per conversion from the settings and
//! then applied to each record in turn.

use geojson::JsonObject;

use crate::geometry::GeometryAttributes;
use crate::settings::Settings;
use crate::types::Record;

/// How record fields become feature properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyProjection {
    /// Exactly these fields, in this order. Missing fields are skipped.
    IncludeOnly(Vec<String>),
    /// Every field except geometry fields and these.
    ExcludeSet(Vec<String>),
    /// Every field except geometry fields.
    DefaultProjection,
}

impl PropertyProjection {
    /// Picks the projection for a batch: `include` wins over `exclude`.
    #[must_use]
    pub fn from_settings(settings: &Settings) -> Self {
        if let Some(include) = &settings.include {
            Self::IncludeOnly(include.clone())
        } else if let Some(exclude) = &settings.exclude {
            Self::ExcludeSet(exclude.clone())
        } else {
            Self::DefaultProjection
        }
    }

    /// Builds a fresh properties object for `record`, then merges `extra`
    /// over it.
    #[must_use]
    pub fn project(
        &self,
        record: &Record,
        attributes: &GeometryAttributes,
        extra: Option<&JsonObject>,
    ) -> JsonObject {
        let mut properties: JsonObject = match self {
            Self::IncludeOnly(fields) => fields
                .iter()
                .filter_map(|field| {
                    record
                        .get(field)
                        .map(|value| (field.clone(), value.clone()))
                })
                .collect(),
            Self::ExcludeSet(excluded) => copy_fields(record, |field| {
                !attributes.contains(field) && !excluded.iter().any(|e| e == field)
            }),
            Self::DefaultProjection => copy_fields(record, |field| !attributes.contains(field)),
        };

        if let Some(extra) = extra {
            for (key, value) in extra {
                properties.insert(key.clone(), value.clone());
            }
        }

        properties
    }
}

fn copy_fields(record: &Record, keep: impl Fn(&str) -> bool) -> JsonObject {
    record
        .iter()
        .filter(|(field, _)| keep(field))
        .map(|(field, value)| (field.clone(), value.clone()))
        .collect()
}
