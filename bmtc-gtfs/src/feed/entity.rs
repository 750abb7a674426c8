use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Serialize, Serializer};

/// a time of day in seconds since midnight. values at or past 86400 are
/// permitted, GTFS-style, for service running over midnight.
pub type TimeOfDay = u32;

/// renders a [TimeOfDay] as `HH:MM:SS`, the fixed format of the
/// stop_times table.
pub fn format_time_of_day(t: TimeOfDay) -> String {
    format!("{:02}:{:02}:{:02}", t / 3600, (t % 3600) / 60, t % 60)
}

/// parses an `HH:MM` 24-hour timetable field. returns None for anything
/// the upstream portal writes outside that shape, which the caller treats
/// as a malformed trip.
pub fn parse_time_of_day(value: &str) -> Option<TimeOfDay> {
    let parsed = NaiveTime::parse_from_str(value.trim(), "%H:%M").ok()?;
    Some(parsed.num_seconds_from_midnight())
}

fn serialize_time_of_day<S: Serializer>(t: &TimeOfDay, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&format_time_of_day(*t))
}

fn serialize_compact_date<S: Serializer>(d: &NaiveDate, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&d.format("%Y%m%d").to_string())
}

/// a row of the stops table. created once on first sighting of a station id
/// across all stop-list documents and never mutated afterwards.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Stop {
    pub stop_id: String,
    pub stop_name: String,
    /// latitude, absent when the source document carried no coordinate.
    pub stop_lat: Option<f64>,
    pub stop_lon: Option<f64>,
    /// fare rules address origin/destination at stop granularity, so every
    /// stop is its own fare zone and carries its own id here.
    pub zone_id: String,
}

/// a row of the routes table, one per canonical route number (direction
/// suffix stripped).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Route {
    pub route_id: String,
    pub route_short_name: String,
    /// `"<origin> ⇔ <destination>"` as scraped from the route catalog.
    pub route_long_name: String,
    /// always 3 (bus).
    pub route_type: u8,
}

/// a single point of a route-direction's polyline, sequenced 1-based in
/// source traversal order.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ShapePoint {
    pub shape_id: String,
    pub shape_pt_lat: f64,
    pub shape_pt_lon: f64,
    pub shape_pt_sequence: u32,
}

/// a row of the trips table. trip ids are assigned from a monotonic
/// counter by the registry.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Trip {
    pub route_id: String,
    pub service_id: String,
    pub trip_id: String,
    pub trip_headsign: String,
    /// 0 for UP, 1 for DOWN.
    pub direction_id: u8,
    pub shape_id: String,
}

/// a row of the stop_times table, produced by the trip time synthesizer.
/// arrival and departure are always equal (no dwell time is modeled).
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StopTime {
    pub trip_id: String,
    #[serde(serialize_with = "serialize_time_of_day")]
    pub arrival_time: TimeOfDay,
    #[serde(serialize_with = "serialize_time_of_day")]
    pub departure_time: TimeOfDay,
    pub stop_id: String,
    /// strictly increasing from 1 within a trip.
    pub stop_sequence: u32,
}

/// a row of the fare_attributes table, one per distinct observed fare
/// value. the fare id is derived from the price formatted to two decimal
/// places, so quotes differing only beyond the hundredths place collapse.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FareAttribute {
    pub fare_id: String,
    pub price: String,
    pub currency_type: String,
    pub payment_method: u8,
    /// empty means unlimited transfers are permitted on this fare.
    pub transfers: Option<u8>,
    pub agency_id: String,
}

/// a row of the fare_rules table keying one observed stop pair on a route
/// to its fare attribute.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FareRule {
    pub fare_id: String,
    pub route_id: String,
    pub origin_id: String,
    pub destination_id: String,
}

/// a row of the translations table. record ids reference stops and are
/// pruned by the cleaner when the referenced stop is gone.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Translation {
    pub table_name: String,
    pub field_name: String,
    pub record_id: String,
    pub language: String,
    pub translation: String,
}

/// the static agency row, built from configuration.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Agency {
    pub agency_id: String,
    pub agency_name: String,
    pub agency_url: String,
    pub agency_timezone: String,
}

/// the static calendar row: a single all-week service over the configured
/// window.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Calendar {
    pub service_id: String,
    pub monday: u8,
    pub tuesday: u8,
    pub wednesday: u8,
    pub thursday: u8,
    pub friday: u8,
    pub saturday: u8,
    pub sunday: u8,
    #[serde(serialize_with = "serialize_compact_date")]
    pub start_date: NaiveDate,
    #[serde(serialize_with = "serialize_compact_date")]
    pub end_date: NaiveDate,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_format_time_of_day() {
        assert_eq!(format_time_of_day(0), "00:00:00");
        assert_eq!(format_time_of_day(8 * 3600 + 8 * 60 + 53), "08:08:53");
        // past-midnight times stay on the extended clock
        assert_eq!(format_time_of_day(25 * 3600 + 30 * 60), "25:30:00");
    }

    #[test]
    fn test_parse_time_of_day() {
        assert_eq!(parse_time_of_day("08:00"), Some(8 * 3600));
        assert_eq!(parse_time_of_day("23:59"), Some(23 * 3600 + 59 * 60));
        assert_eq!(parse_time_of_day(" 06:15 "), Some(6 * 3600 + 15 * 60));
        assert_eq!(parse_time_of_day(""), None);
        assert_eq!(parse_time_of_day("8 o'clock"), None);
        assert_eq!(parse_time_of_day("25:00"), None);
    }

    #[test]
    fn test_stop_time_serializes_formatted_times() {
        let row = StopTime {
            trip_id: "1".to_string(),
            arrival_time: 8 * 3600,
            departure_time: 8 * 3600,
            stop_id: "20558".to_string(),
            stop_sequence: 1,
        };
        let mut writer = csv::Writer::from_writer(vec![]);
        writer.serialize(&row).expect("serialize stop time");
        let bytes = writer.into_inner().expect("flush csv writer");
        let csv = String::from_utf8(bytes).expect("utf8 csv");
        assert!(csv.starts_with("trip_id,arrival_time,departure_time,stop_id,stop_sequence"));
        assert!(csv.contains("1,08:00:00,08:00:00,20558,1"));
    }
}
