use geoparse_core::{
    ConfigError, GeoParseError, GeometrySource, GeometryType, Record, Settings, parse, parse_with,
};
use serde_json::{Value, json};

fn records(value: Value) -> Vec<Record> {
    value
        .as_array()
        .expect("fixture should be an array")
        .iter()
        .map(|r| r.as_object().cloned().expect("fixture rows should be objects"))
        .collect()
}

fn settings(value: Value) -> Settings {
    serde_json::from_value(value).expect("fixture settings should be valid")
}

fn sample() -> Vec<Record> {
    records(json!([{"a": 1, "b": "x", "lat": 13.6, "lng": 100.5}]))
}

/// Test a full document built from a mix of matching and non-matching records
#[test]
fn test_point_collection() -> anyhow::Result<()> {
    let input = records(json!([
        {"name": "Location A", "category": "Store", "street": "Market", "lat": 39.984, "lng": -75.343},
        {"name": "Location B", "category": "House", "street": "Broad", "lat": 39.284, "lng": -75.833},
        {"name": "Location C", "category": "Office", "street": "South"}
    ]));

    let document = parse(&input, Some(settings(json!({"Point": ["lat", "lng"]}))))?;

    assert_eq!(
        document.to_json_value(),
        json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-75.343, 39.984]},
                    "properties": {"name": "Location A", "category": "Store", "street": "Market"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [-75.833, 39.284]},
                    "properties": {"name": "Location B", "category": "House", "street": "Broad"}
                },
                {
                    "type": "Feature",
                    "geometry": {},
                    "properties": {"name": "Location C", "category": "Office", "street": "South"}
                }
            ]
        })
    );
    Ok(())
}

#[test]
fn test_feature_count_and_order() -> anyhow::Result<()> {
    let input: Vec<Record> = (0..25)
        .map(|i| {
            json!({"id": i, "lat": f64::from(i), "lng": -f64::from(i)})
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect();

    let document = parse(&input, Some(settings(json!({"Point": ["lat", "lng"]}))))?;

    assert_eq!(document.features.len(), 25);
    for (i, feature) in document.features.iter().enumerate() {
        assert_eq!(feature.properties.get("id"), Some(&json!(i)));
    }
    Ok(())
}

#[test]
fn test_default_include_exclude_projections() -> anyhow::Result<()> {
    let default = parse(&sample(), Some(settings(json!({"Point": ["lat", "lng"]}))))?;
    assert_eq!(
        Value::Object(default.features[0].properties.clone()),
        json!({"a": 1, "b": "x"})
    );

    let include = parse(
        &sample(),
        Some(settings(json!({"Point": ["lat", "lng"], "include": ["a"]}))),
    )?;
    assert_eq!(
        Value::Object(include.features[0].properties.clone()),
        json!({"a": 1})
    );

    let exclude = parse(
        &sample(),
        Some(settings(json!({"Point": ["lat", "lng"], "exclude": ["b"]}))),
    )?;
    assert_eq!(
        Value::Object(exclude.features[0].properties.clone()),
        json!({"a": 1})
    );
    Ok(())
}

#[test]
fn test_mixed_geometry_types() -> anyhow::Result<()> {
    let input = records(json!([
        {"name": "Spot", "x": 0.5, "y": 10.5},
        {"name": "Road", "line": "[[102.0,0.0],[103.0,1.0],[104.0,0.0],[105.0,1.0]]"},
        {"name": "Park", "polygon": "[[[100.0,0.0],[101.0,0.0],[101.0,1.0],[100.0,1.0],[100.0,0.0]]]"}
    ]));

    let document = parse(
        &input,
        Some(settings(json!({
            "Point": ["x", "y"],
            "LineString": "line",
            "Polygon": "polygon"
        }))),
    )?;

    let types: Vec<Option<GeometryType>> = document
        .features
        .iter()
        .map(|f| f.geometry.geometry_type())
        .collect();
    assert_eq!(
        types,
        vec![
            Some(GeometryType::Point),
            Some(GeometryType::LineString),
            Some(GeometryType::Polygon)
        ]
    );
    assert_eq!(
        document.features[0].geometry.coordinates(),
        Some(&json!([10.5, 0.5]))
    );
    for feature in &document.features {
        assert_eq!(feature.properties.len(), 1);
        assert!(feature.properties.contains_key("name"));
    }

    let strict = document.to_geojson()?;
    assert_eq!(strict.features.len(), 3);
    Ok(())
}

#[test]
fn test_extra_in_every_feature() -> anyhow::Result<()> {
    let input = records(json!([
        {"lat": 1, "lng": 2, "source": "record"},
        {"lat": 3, "lng": 4}
    ]));

    let document = parse(
        &input,
        Some(settings(json!({
            "Point": ["lat", "lng"],
            "extra": {"source": "test"},
            "extraGlobal": {"Creator": "Mr. Example", "records": 2}
        }))),
    )?;

    for feature in &document.features {
        assert_eq!(feature.properties.get("source"), Some(&json!("test")));
    }
    assert_eq!(
        document.to_json_value()["properties"],
        json!({"Creator": "Mr. Example", "records": 2})
    );
    Ok(())
}

#[test]
fn test_crs_and_bbox_pass_through() -> anyhow::Result<()> {
    let crs = json!({
        "type": "link",
        "properties": {"href": "http://example.com/crs/42", "type": "proj4"}
    });
    let document = parse(
        &sample(),
        Some(settings(json!({
            "Point": ["lat", "lng"],
            "crs": crs.clone(),
            "bbox": [-180.0, -90.0, 180.0, 90.0]
        }))),
    )?;

    let value = document.to_json_value();
    assert_eq!(value["crs"], crs);
    assert_eq!(value["bbox"], json!([-180.0, -90.0, 180.0, 90.0]));
    Ok(())
}

#[test]
fn test_invalid_crs_is_rejected() {
    let err = parse(
        &sample(),
        Some(settings(json!({"Point": ["lat", "lng"], "crs": {"type": "bogus"}}))),
    )
    .unwrap_err();

    assert!(matches!(err, GeoParseError::Config(ConfigError::InvalidCrs { .. })));
}

#[test]
fn test_missing_geometry_settings() {
    for options in [None, Some(settings(json!({"include": ["a"]})))] {
        let err = parse(&sample(), options).unwrap_err();
        assert!(matches!(
            err,
            GeoParseError::Config(ConfigError::NoGeometryAttributes)
        ));
        assert_eq!(err.to_string(), "No geometry attributes specified");
    }
}

#[test]
fn test_geometry_fields_do_not_leak_between_calls() -> anyhow::Result<()> {
    let input = records(json!([{"lat": 1, "lng": 2, "x": 3, "y": 4}]));

    let first = parse(
        &input,
        Some(Settings::new().with_geometry(GeometryType::Point, GeometrySource::lat_lng("lat", "lng"))),
    )?;
    assert_eq!(
        Value::Object(first.features[0].properties.clone()),
        json!({"x": 3, "y": 4})
    );

    let second = parse(
        &input,
        Some(Settings::new().with_geometry(GeometryType::Point, GeometrySource::lat_lng("y", "x"))),
    )?;
    assert_eq!(
        Value::Object(second.features[0].properties.clone()),
        json!({"lat": 1, "lng": 2})
    );
    assert_eq!(second.features[0].geometry.coordinates(), Some(&json!([3, 4])));
    Ok(())
}

#[test]
fn test_reentrant_call_from_callback() -> anyhow::Result<()> {
    let input = records(json!([{"lat": 1, "lng": 2, "x": 3, "y": 4}]));
    let mut inner_properties = None;
    let mut outer_properties = None;

    parse_with(
        &input,
        Some(settings(json!({"Point": ["lat", "lng"]}))),
        |outer| {
            let inner = parse(&input, Some(settings(json!({"Point": ["y", "x"]}))))
                .expect("inner conversion should succeed");
            inner_properties = Some(inner.features[0].properties.clone());
            outer_properties = Some(outer.features[0].properties.clone());
        },
    )?;

    assert_eq!(
        inner_properties.map(Value::Object),
        Some(json!({"lat": 1, "lng": 2}))
    );
    assert_eq!(
        outer_properties.map(Value::Object),
        Some(json!({"x": 3, "y": 4}))
    );
    Ok(())
}

#[test]
fn test_parallel_calls_keep_their_own_fields() {
    let input = records(json!([{"lat": 1, "lng": 2, "x": 3, "y": 4}]));

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let input = &input;
                scope.spawn(move || {
                    let options = if i % 2 == 0 {
                        json!({"Point": ["lat", "lng"]})
                    } else {
                        json!({"Point": ["y", "x"]})
                    };
                    let document = parse(input, Some(settings(options))).unwrap();
                    (i, document.features[0].properties.clone())
                })
            })
            .collect();

        for handle in handles {
            let (i, properties) = handle.join().unwrap();
            let expected = if i % 2 == 0 {
                json!({"x": 3, "y": 4})
            } else {
                json!({"lat": 1, "lng": 2})
            };
            assert_eq!(Value::Object(properties), expected);
        }
    });
}
