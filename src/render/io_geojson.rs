use log::{debug, info, warn};

use serde_json::Value as JSValue;

use std::fs;
use std::path::Path;

use crate::render::*;

/// Reads the features of a GeoJSON feature collection.
///
/// id_property: the property holding the unit identifier (a string or a number)
pub fn read_features(path: &Path, id_property: &str) -> MapResult<Vec<Feature>> {
    let path_str = path.display().to_string();
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path: &path_str })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    let features = parse_features(&js, id_property)?;
    info!("read_features: {} features in {}", features.len(), path_str);
    Ok(features)
}

/// Features without an identifier or with an unsupported geometry are
/// skipped.
pub fn parse_features(js: &JSValue, id_property: &str) -> MapResult<Vec<Feature>> {
    let features = match js["features"].as_array() {
        Some(l) => l,
        None => {
            return GeoJsonFormatSnafu {
                message: "missing features array",
            }
            .fail()
        }
    };

    let mut res: Vec<Feature> = Vec::new();
    for (idx, feature) in features.iter().enumerate() {
        let unit_id = match &feature["properties"][id_property] {
            JSValue::String(s) => s.trim().to_string(),
            JSValue::Number(n) => n.to_string(),
            _ => {
                warn!("parse_features: feature {} has no {} property", idx, id_property);
                continue;
            }
        };
        match parse_geometry(&feature["geometry"])? {
            Some(geometry) => res.push(Feature { unit_id, geometry }),
            None => {
                warn!("parse_features: feature {} has no supported geometry", unit_id);
            }
        }
    }
    Ok(res)
}

fn parse_geometry(js: &JSValue) -> MapResult<Option<Geometry>> {
    let coords = &js["coordinates"];
    let g = match js["type"].as_str() {
        Some("Point") => Geometry::Point(parse_position(coords)?),
        Some("Polygon") => Geometry::Polygon(parse_rings(coords)?),
        Some("MultiPolygon") => Geometry::MultiPolygon(
            as_array(coords)?
                .iter()
                .map(parse_rings)
                .collect::<MapResult<Vec<Vec<Ring>>>>()?,
        ),
        x => {
            debug!("parse_geometry: unsupported geometry type {:?}", x);
            return Ok(None);
        }
    };
    Ok(Some(g))
}

fn as_array(js: &JSValue) -> MapResult<&Vec<JSValue>> {
    js.as_array().with_context(|| GeoJsonFormatSnafu {
        message: format!("expected an array of coordinates, got {}", js),
    })
}

fn parse_rings(js: &JSValue) -> MapResult<Vec<Ring>> {
    as_array(js)?
        .iter()
        .map(|ring| -> MapResult<Ring> { as_array(ring)?.iter().map(parse_position).collect() })
        .collect()
}

fn parse_position(js: &JSValue) -> MapResult<LngLat> {
    match as_array(js)?.as_slice() {
        [lng, lat, ..] => match (lng.as_f64(), lat.as_f64()) {
            (Some(lng), Some(lat)) => Ok(LngLat { lng, lat }),
            _ => GeoJsonFormatSnafu {
                message: format!("invalid position {}", js),
            }
            .fail(),
        },
        _ => GeoJsonFormatSnafu {
            message: format!("invalid position {}", js),
        }
        .fail(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn features_by_id_property() {
        let js = json!({
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "properties": {"PRECINCT": "01-01", "NAME": "a"},
                 "geometry": {"type": "Polygon",
                              "coordinates": [[[0.0, 0.0], [4.0, 0.0], [4.0, 2.0], [0.0, 0.0]]]}},
                {"type": "Feature", "properties": {"PRECINCT": 17},
                 "geometry": {"type": "MultiPolygon",
                              "coordinates": [[[[1, 1], [2, 1], [2, 3], [1, 1]]],
                                              [[[5, 5], [6, 5], [6, 6], [5, 5]]]]}},
                {"type": "Feature", "properties": {"NAME": "no id"},
                 "geometry": {"type": "Point", "coordinates": [0, 0]}},
                {"type": "Feature", "properties": {"PRECINCT": "line"},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
                {"type": "Feature", "properties": {"PRECINCT": "null"}, "geometry": null}
            ]
        });
        let features = parse_features(&js, "PRECINCT").unwrap();
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].unit_id, "01-01");
        assert_eq!(
            features[0].geometry.anchor(),
            Some(LngLat { lng: 2.0, lat: 1.0 })
        );
        assert_eq!(features[1].unit_id, "17");
        assert_eq!(
            features[1].geometry.anchor(),
            Some(LngLat { lng: 3.5, lat: 3.5 })
        );
    }

    #[test]
    fn malformed_collections() {
        assert!(matches!(
            parse_features(&json!({"type": "Feature"}), "PRECINCT"),
            Err(MapError::GeoJsonFormat { .. })
        ));
        let bad_position = json!({"features": [
            {"properties": {"PRECINCT": "1"}, "geometry": {"type": "Point", "coordinates": ["a", 1]}}
        ]});
        assert!(matches!(
            parse_features(&bad_position, "PRECINCT"),
            Err(MapError::GeoJsonFormat { .. })
        ));
    }
}
