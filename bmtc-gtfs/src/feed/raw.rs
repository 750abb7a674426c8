//! serde shapes for the scraped operator documents. every field the
//! pipeline does not consume is left out; serde ignores the remainder of
//! each record. fields the portal omits or nulls on some records are
//! modeled as `Option` or defaulted so one sparse record never fails a
//! whole document.
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::feed::feed_error::FeedError;

/// reads and parses one raw JSON document. callers at the unit boundary
/// convert the error into a skip-with-reason; only the routes catalog
/// treats it as fatal.
pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, FeedError> {
    let file = File::open(path).map_err(|e| FeedError::RawReadError {
        path: path.display().to_string(),
        source: e,
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| FeedError::RawParseError {
        path: path.display().to_string(),
        source: e,
    })
}

/// a stop-list document: `stops/<ROUTE> <DIR>.json`. both travel
/// directions of the route appear in the same document.
#[derive(Debug, Default, Deserialize)]
pub struct StopListDoc {
    #[serde(default)]
    pub up: DirectionStops,
    #[serde(default)]
    pub down: DirectionStops,
}

#[derive(Debug, Default, Deserialize)]
pub struct DirectionStops {
    #[serde(default)]
    pub data: Vec<RawStation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStation {
    pub stationid: i64,
    pub stationname: String,
    #[serde(default)]
    pub centerlat: Option<f64>,
    #[serde(default)]
    pub centerlong: Option<f64>,
}

/// the route catalog: `routes.json`. route numbers carry an ` UP`/` DOWN`
/// suffix that is stripped to obtain the canonical route id.
#[derive(Debug, Default, Deserialize)]
pub struct RouteCatalogDoc {
    #[serde(default)]
    pub data: Vec<RawRouteEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRouteEntry {
    pub routeno: String,
    #[serde(default)]
    pub fromstation: String,
    #[serde(default)]
    pub tostation: String,
}

/// a route-direction polyline: `routelines/<ROUTE> <DIR>.json`, ordered by
/// traversal sequence.
#[derive(Debug, Default, Deserialize)]
pub struct RouteLineDoc {
    #[serde(default)]
    pub data: Vec<RawShapePoint>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawShapePoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// a timetable document: `timetables/<Day>/<ROUTE> <DIR>.json`. the portal
/// signals an empty timetable either with an empty `data` array or with a
/// "No Records Found." sentinel message.
#[derive(Debug, Default, Deserialize)]
pub struct TimetableDoc {
    #[serde(default)]
    pub data: Vec<RawTimetableEntry>,
    #[serde(rename = "Message", default)]
    pub message: Option<String>,
}

impl TimetableDoc {
    const NO_RECORDS_SENTINEL: &'static str = "No Records Found.";

    pub fn has_no_records(&self) -> bool {
        self.data.is_empty() || self.message.as_deref() == Some(Self::NO_RECORDS_SENTINEL)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RawTimetableEntry {
    #[serde(default)]
    pub tostationname: String,
    #[serde(default)]
    pub tripdetails: Vec<RawTripDetail>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTripDetail {
    #[serde(default)]
    pub starttime: Option<String>,
    #[serde(default)]
    pub endtime: Option<String>,
}

/// one fare quote for a stop-code pair: `fares/<ROUTE>/<FROM>_<TO>.json`.
#[derive(Debug, Default, Deserialize)]
pub struct FareDoc {
    #[serde(default)]
    pub data: Vec<RawFareQuote>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RawFareQuote {
    pub fare: f64,
}

/// the stop-code map: `fares/stopcodes.json`, translating station ids to
/// the codes used as fare-document keys.
#[derive(Debug, Default, Deserialize)]
pub struct StopCodeDoc {
    #[serde(default)]
    pub data: Vec<RawStopCode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawStopCode {
    pub stationid: i64,
    pub stationcode: String,
}

/// a translation shard: `translations/<shard>_<lang>.json`.
#[derive(Debug, Default, Deserialize)]
pub struct TranslationDoc {
    #[serde(default)]
    pub data: Vec<RawGeofence>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawGeofence {
    pub stopid: i64,
    #[serde(default)]
    pub geofencename: String,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_stop_list_doc() {
        let doc: StopListDoc = serde_json::from_str(
            r#"{
                "up": {"data": [
                    {"stationid": 20558, "stationname": "Kempegowda Bus Station", "centerlat": 12.9779, "centerlong": 77.5713},
                    {"stationid": 29374, "stationname": "Corporation"}
                ]},
                "down": {"data": []}
            }"#,
        )
        .expect("stop list should parse");
        assert_eq!(doc.up.data.len(), 2);
        assert_eq!(doc.up.data[0].stationid, 20558);
        assert_eq!(doc.up.data[1].centerlat, None);
        assert!(doc.down.data.is_empty());
    }

    #[test]
    fn test_parse_stop_list_doc_missing_direction() {
        let doc: StopListDoc =
            serde_json::from_str(r#"{"up": {"data": []}}"#).expect("missing down should default");
        assert!(doc.down.data.is_empty());
    }

    #[test]
    fn test_parse_route_catalog_ignores_extra_fields() {
        let doc: RouteCatalogDoc = serde_json::from_str(
            r#"{"data": [{"routeno": "335-E UP", "fromstation": "Kempegowda Bus Station",
                          "tostation": "Kadugodi", "routeid": 4477, "servicetype": "Non AC"}]}"#,
        )
        .expect("route catalog should parse");
        assert_eq!(doc.data[0].routeno, "335-E UP");
        assert_eq!(doc.data[0].tostation, "Kadugodi");
    }

    #[test]
    fn test_timetable_no_records_sentinel() {
        let doc: TimetableDoc =
            serde_json::from_str(r#"{"Message": "No Records Found.", "data": []}"#)
                .expect("sentinel timetable should parse");
        assert!(doc.has_no_records());

        let doc: TimetableDoc = serde_json::from_str(
            r#"{"data": [{"tostationname": "Kadugodi",
                          "tripdetails": [{"starttime": "08:00", "endtime": "09:10"}]}]}"#,
        )
        .expect("populated timetable should parse");
        assert!(!doc.has_no_records());
        assert_eq!(doc.data[0].tripdetails.len(), 1);
        assert_eq!(doc.data[0].tripdetails[0].starttime.as_deref(), Some("08:00"));
    }

    #[test]
    fn test_parse_fare_doc() {
        let doc: FareDoc = serde_json::from_str(r#"{"data": [{"fare": 25}]}"#)
            .expect("fare doc should parse");
        assert_eq!(doc.data[0].fare, 25.0);
    }

    #[test]
    fn test_parse_translation_doc() {
        let doc: TranslationDoc = serde_json::from_str(
            r#"{"data": [{"stopid": 20558, "geofencename": "ಕೆಂಪೇಗೌಡ ಬಸ್ ನಿಲ್ದಾಣ"},
                         {"stopid": 29374}]}"#,
        )
        .expect("translation doc should parse");
        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.data[1].geofencename, "");
    }
}
