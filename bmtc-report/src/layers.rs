//! GeoJSON renderings of the summaries: stops as point features, routes
//! as line features following their shapes.
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use gtfs_structures::Gtfs;
use itertools::Itertools;
use serde::Serialize;

use crate::report_error::ReportError;
use crate::summary::{RouteSummary, StopSummary};

fn properties_of(value: &impl Serialize) -> Option<JsonObject> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        _ => None,
    }
}

pub fn stop_feature(summary: &StopSummary, lon: f64, lat: f64) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![lon, lat]))),
        id: None,
        properties: properties_of(summary),
        foreign_members: None,
    }
}

pub fn route_feature(summary: &RouteSummary, line: Vec<Vec<f64>>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::LineString(line))),
        id: None,
        properties: properties_of(summary),
        foreign_members: None,
    }
}

/// point features for every stop that carries a coordinate.
pub fn stops_layer(gtfs: &Gtfs, stops: &[StopSummary]) -> FeatureCollection {
    let features = stops
        .iter()
        .filter_map(|summary| {
            let stop = gtfs.stops.get(&summary.id)?;
            let (lon, lat) = (stop.longitude?, stop.latitude?);
            Some(stop_feature(summary, lon, lat))
        })
        .collect_vec();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// line features for every route-direction whose representative trip has
/// a shape on file.
pub fn routes_layer(gtfs: &Gtfs, routes: &[RouteSummary]) -> FeatureCollection {
    let features = routes
        .iter()
        .filter_map(|summary| {
            let shape_id = summary.shape_id.as_ref()?;
            let points = gtfs.shapes.get(shape_id)?;
            let line = points
                .iter()
                .sorted_by_key(|p| p.sequence)
                .map(|p| vec![p.longitude, p.latitude])
                .collect_vec();
            if line.is_empty() {
                return None;
            }
            Some(route_feature(summary, line))
        })
        .collect_vec();
    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

pub fn write_geojson(collection: &FeatureCollection, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|e| ReportError::OutputIoError {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::to_writer(BufWriter::new(file), collection).map_err(|e| {
        ReportError::LayerSerializeError {
            path: path.display().to_string(),
            source: e,
        }
    })
}

pub fn write_csv<T: Serialize>(rows: &[T], path: &Path) -> Result<(), ReportError> {
    let to_write_error = |e| ReportError::SummaryWriteError {
        path: path.display().to_string(),
        source: e,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_write_error)?;
    for row in rows {
        writer.serialize(row).map_err(to_write_error)?;
    }
    writer.flush().map_err(|e| ReportError::OutputIoError {
        path: path.display().to_string(),
        source: e,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn summary() -> StopSummary {
        StopSummary {
            id: "101".to_string(),
            name: "Kempegowda Bus Station".to_string(),
            trip_count: 1,
            trip_list: vec!["08:00:00".to_string()],
            route_count: 1,
            route_list: vec!["335-E".to_string()],
        }
    }

    #[test]
    fn test_stop_feature_carries_point_and_properties() {
        let feature = stop_feature(&summary(), 77.5713, 12.9779);
        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::Point(coordinates)) => {
                assert_eq!(coordinates, &vec![77.5713, 12.9779]);
            }
            other => panic!("expected a point geometry, got {other:?}"),
        }
        let properties = feature.properties.expect("properties should serialize");
        assert_eq!(
            properties.get("name").and_then(|v| v.as_str()),
            Some("Kempegowda Bus Station")
        );
        assert_eq!(
            properties.get("trip_count").and_then(|v| v.as_u64()),
            Some(1)
        );
        assert_eq!(
            properties
                .get("route_list")
                .and_then(|v| v.as_array())
                .map(|a| a.len()),
            Some(1)
        );
    }

    #[test]
    fn test_route_feature_line_geometry() {
        let summary = RouteSummary {
            id: "335-E".to_string(),
            name: "335-E".to_string(),
            full_name: "Kempegowda Bus Station → Kadugodi".to_string(),
            direction_id: 0,
            trip_count: 1,
            trip_list: vec!["08:00:00".to_string()],
            stop_count: 2,
            stop_list: vec!["Kempegowda Bus Station".to_string(), "Kadugodi".to_string()],
            shape_id: Some("335-E UP".to_string()),
        };
        let line = vec![vec![77.5713, 12.9779], vec![77.7611, 12.9963]];
        let feature = route_feature(&summary, line.clone());
        match feature.geometry.as_ref().map(|g| &g.value) {
            Some(Value::LineString(coordinates)) => assert_eq!(coordinates, &line),
            other => panic!("expected a line geometry, got {other:?}"),
        }
    }
}
