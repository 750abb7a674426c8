//! the in-memory entity registry. built once per run and handed by
//! mutable reference into each pipeline stage; there is no process-wide
//! accumulator. keyed collections enforce the identity invariants
//! (first sighting wins), and [FeedRegistry::snapshot] freezes an ordered
//! view per table for the packager.
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::feed::entity::{
    FareAttribute, FareRule, Route, ShapePoint, Stop, StopTime, Translation, Trip,
};

type TranslationKey = (String, String, String, String);

#[derive(Debug, Default)]
pub struct FeedRegistry {
    stops: BTreeMap<String, Stop>,
    routes: BTreeMap<String, Route>,
    shapes: BTreeMap<String, Vec<ShapePoint>>,
    trips: Vec<Trip>,
    stop_times: Vec<StopTime>,
    fare_attributes: BTreeMap<String, FareAttribute>,
    fare_rules: Vec<FareRule>,
    translations: BTreeMap<TranslationKey, Translation>,
    trip_counter: u64,
}

impl FeedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// registers a stop on first sighting. re-adding an existing id is a
    /// no-op, per the identity invariant.
    pub fn add_stop(&mut self, stop: Stop) -> bool {
        if self.stops.contains_key(&stop.stop_id) {
            return false;
        }
        self.stops.insert(stop.stop_id.clone(), stop);
        true
    }

    pub fn contains_stop(&self, stop_id: &str) -> bool {
        self.stops.contains_key(stop_id)
    }

    pub fn stop_count(&self) -> usize {
        self.stops.len()
    }

    /// registers a route on first sighting; duplicates are a no-op.
    pub fn add_route(&mut self, route: Route) -> bool {
        if self.routes.contains_key(&route.route_id) {
            return false;
        }
        self.routes.insert(route.route_id.clone(), route);
        true
    }

    pub fn contains_route(&self, route_id: &str) -> bool {
        self.routes.contains_key(route_id)
    }

    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// canonical route ids in stable (sorted) order, the iteration order
    /// of the trip and fare stages.
    pub fn route_ids(&self) -> Vec<String> {
        self.routes.keys().cloned().collect()
    }

    /// appends a point to a shape in source order, assigning the 1-based
    /// sequence number.
    pub fn add_shape_point(&mut self, shape_id: &str, lat: f64, lon: f64) {
        let points = self.shapes.entry(shape_id.to_string()).or_default();
        let sequence = points.len() as u32 + 1;
        points.push(ShapePoint {
            shape_id: shape_id.to_string(),
            shape_pt_lat: lat,
            shape_pt_lon: lon,
            shape_pt_sequence: sequence,
        });
    }

    pub fn has_shape(&self, shape_id: &str) -> bool {
        self.shapes.contains_key(shape_id)
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }

    /// hands out the next trip id from the monotonic counter.
    pub fn next_trip_id(&mut self) -> String {
        self.trip_counter += 1;
        self.trip_counter.to_string()
    }

    pub fn add_trip(&mut self, trip: Trip) {
        self.trips.push(trip);
    }

    pub fn trip_count(&self) -> usize {
        self.trips.len()
    }

    pub fn trip_ids(&self) -> Vec<String> {
        self.trips.iter().map(|t| t.trip_id.clone()).collect()
    }

    pub fn add_stop_time(&mut self, stop_time: StopTime) {
        self.stop_times.push(stop_time);
    }

    pub fn stop_time_count(&self) -> usize {
        self.stop_times.len()
    }

    /// registers a fare attribute; one row exists per fare id, so a
    /// duplicate price is a no-op.
    pub fn add_fare_attribute(&mut self, attribute: FareAttribute) -> bool {
        if self.fare_attributes.contains_key(&attribute.fare_id) {
            return false;
        }
        self.fare_attributes
            .insert(attribute.fare_id.clone(), attribute);
        true
    }

    pub fn contains_fare_attribute(&self, fare_id: &str) -> bool {
        self.fare_attributes.contains_key(fare_id)
    }

    pub fn add_fare_rule(&mut self, rule: FareRule) {
        self.fare_rules.push(rule);
    }

    pub fn fare_rule_count(&self) -> usize {
        self.fare_rules.len()
    }

    /// registers a translation keyed by (table, field, record, language);
    /// duplicates are a no-op.
    pub fn add_translation(&mut self, translation: Translation) -> bool {
        let key = (
            translation.table_name.clone(),
            translation.field_name.clone(),
            translation.record_id.clone(),
            translation.language.clone(),
        );
        if self.translations.contains_key(&key) {
            return false;
        }
        self.translations.insert(key, translation);
        true
    }

    pub fn translation_count(&self) -> usize {
        self.translations.len()
    }

    /// stop-time row counts grouped by owning trip id, the cleaner's view
    /// of trip viability.
    pub fn stop_time_counts_by_trip(&self) -> HashMap<String, usize> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for stop_time in &self.stop_times {
            *counts.entry(stop_time.trip_id.clone()).or_default() += 1;
        }
        counts
    }

    /// removes the given trips and their stop times. remaining trip ids
    /// are not renumbered. returns (trips removed, stop times removed).
    pub fn remove_trips(&mut self, trip_ids: &HashSet<String>) -> (usize, usize) {
        let trips_before = self.trips.len();
        let stop_times_before = self.stop_times.len();
        self.trips.retain(|t| !trip_ids.contains(&t.trip_id));
        self.stop_times.retain(|st| !trip_ids.contains(&st.trip_id));
        (
            trips_before - self.trips.len(),
            stop_times_before - self.stop_times.len(),
        )
    }

    /// drops translations whose record no longer references a registered
    /// stop. returns the number removed.
    pub fn remove_orphan_translations(&mut self) -> usize {
        let before = self.translations.len();
        let stops = &self.stops;
        self.translations
            .retain(|_, t| stops.contains_key(&t.record_id));
        before - self.translations.len()
    }

    /// freezes an ordered snapshot of every table for the packager. row
    /// order is stable: keyed tables in key order, appended tables in
    /// insertion order.
    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            stops: self.stops.values().cloned().collect(),
            routes: self.routes.values().cloned().collect(),
            shape_points: self.shapes.values().flatten().cloned().collect(),
            trips: self.trips.clone(),
            stop_times: self.stop_times.clone(),
            fare_attributes: self.fare_attributes.values().cloned().collect(),
            fare_rules: self.fare_rules.clone(),
            translations: self.translations.values().cloned().collect(),
        }
    }
}

/// a frozen, ordered view of the registry, one collection per output
/// table. the packager must neither reorder nor drop rows, and omits a
/// table entirely when its collection is empty.
#[derive(Debug, Clone)]
pub struct FeedSnapshot {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub shape_points: Vec<ShapePoint>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub fare_attributes: Vec<FareAttribute>,
    pub fare_rules: Vec<FareRule>,
    pub translations: Vec<Translation>,
}

#[cfg(test)]
mod test {
    use super::*;

    fn stop(id: &str) -> Stop {
        Stop {
            stop_id: id.to_string(),
            stop_name: format!("stop {id}"),
            stop_lat: Some(12.97),
            stop_lon: Some(77.59),
            zone_id: id.to_string(),
        }
    }

    #[test]
    fn test_re_adding_a_stop_is_a_no_op() {
        let mut registry = FeedRegistry::new();
        assert!(registry.add_stop(stop("20558")));
        let mut renamed = stop("20558");
        renamed.stop_name = "something else".to_string();
        assert!(!registry.add_stop(renamed));
        assert_eq!(registry.stop_count(), 1);
        assert_eq!(registry.snapshot().stops[0].stop_name, "stop 20558");
    }

    #[test]
    fn test_route_dedup_and_stable_order() {
        let mut registry = FeedRegistry::new();
        for id in ["335-E", "201-R", "335-E"] {
            registry.add_route(Route {
                route_id: id.to_string(),
                route_short_name: id.to_string(),
                route_long_name: String::new(),
                route_type: 3,
            });
        }
        assert_eq!(registry.route_ids(), vec!["201-R", "335-E"]);
    }

    #[test]
    fn test_shape_points_sequence_from_one() {
        let mut registry = FeedRegistry::new();
        registry.add_shape_point("335-E UP", 12.97, 77.59);
        registry.add_shape_point("335-E UP", 12.98, 77.60);
        let snapshot = registry.snapshot();
        let sequences: Vec<u32> = snapshot
            .shape_points
            .iter()
            .map(|p| p.shape_pt_sequence)
            .collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_trip_ids_are_monotonic() {
        let mut registry = FeedRegistry::new();
        assert_eq!(registry.next_trip_id(), "1");
        assert_eq!(registry.next_trip_id(), "2");
        assert_eq!(registry.next_trip_id(), "3");
    }

    #[test]
    fn test_fare_attribute_dedup() {
        let mut registry = FeedRegistry::new();
        let attribute = FareAttribute {
            fare_id: "F10.00".to_string(),
            price: "10.00".to_string(),
            currency_type: "INR".to_string(),
            payment_method: 0,
            transfers: None,
            agency_id: "1".to_string(),
        };
        assert!(registry.add_fare_attribute(attribute.clone()));
        assert!(!registry.add_fare_attribute(attribute));
        assert!(registry.contains_fare_attribute("F10.00"));
    }

    #[test]
    fn test_translation_dedup_by_full_key() {
        let mut registry = FeedRegistry::new();
        let t = Translation {
            table_name: "stops".to_string(),
            field_name: "stop_name".to_string(),
            record_id: "20558".to_string(),
            language: "kn".to_string(),
            translation: "ಮೆಜೆಸ್ಟಿಕ್".to_string(),
        };
        assert!(registry.add_translation(t.clone()));
        assert!(!registry.add_translation(t.clone()));
        let mut other_language = t;
        other_language.language = "hi".to_string();
        assert!(registry.add_translation(other_language));
        assert_eq!(registry.translation_count(), 2);
    }

    #[test]
    fn test_remove_trips_takes_stop_times_along() {
        let mut registry = FeedRegistry::new();
        for trip_id in ["1", "2"] {
            registry.add_trip(Trip {
                route_id: "335-E".to_string(),
                service_id: "1".to_string(),
                trip_id: trip_id.to_string(),
                trip_headsign: String::new(),
                direction_id: 0,
                shape_id: "335-E UP".to_string(),
            });
        }
        for (trip_id, sequence) in [("1", 1), ("1", 2), ("2", 1)] {
            registry.add_stop_time(StopTime {
                trip_id: trip_id.to_string(),
                arrival_time: 28800,
                departure_time: 28800,
                stop_id: "20558".to_string(),
                stop_sequence: sequence,
            });
        }
        let removed = registry.remove_trips(&HashSet::from(["2".to_string()]));
        assert_eq!(removed, (1, 1));
        assert_eq!(registry.trip_count(), 1);
        assert_eq!(registry.stop_time_count(), 2);
    }
}
