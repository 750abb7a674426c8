//! read-only aggregation over a loaded feed: per-stop and per
//! route-direction activity summaries, shared by the GeoJSON layers and
//! the CSV tables.
use std::collections::{BTreeMap, BTreeSet};

use gtfs_structures::{DirectionType, Gtfs, Trip};
use itertools::Itertools;
use serde::Serialize;

fn format_time(seconds: u32) -> String {
    format!(
        "{:02}:{:02}:{:02}",
        seconds / 3600,
        (seconds % 3600) / 60,
        seconds % 60
    )
}

fn direction_bit(trip: &Trip) -> u8 {
    match trip.direction_id {
        Some(DirectionType::Inbound) => 1,
        _ => 0,
    }
}

/// activity at one stop: every visiting trip's arrival time and the set
/// of routes serving it.
#[derive(Debug, Clone, Serialize)]
pub struct StopSummary {
    pub id: String,
    pub name: String,
    pub trip_count: usize,
    pub trip_list: Vec<String>,
    pub route_count: usize,
    pub route_list: Vec<String>,
}

/// one route-direction: its trips' start times and the stop walk of a
/// representative trip.
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub direction_id: u8,
    pub trip_count: usize,
    pub trip_list: Vec<String>,
    pub stop_count: usize,
    pub stop_list: Vec<String>,
    #[serde(skip)]
    pub shape_id: Option<String>,
}

/// flat CSV renderings; the list-valued columns join on ';'.
#[derive(Debug, Clone, Serialize)]
pub struct StopCsvRow {
    pub id: String,
    pub name: String,
    pub trip_count: usize,
    pub trip_list: String,
    pub route_count: usize,
    pub route_list: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteCsvRow {
    pub id: String,
    pub name: String,
    pub full_name: String,
    pub direction_id: u8,
    pub trip_count: usize,
    pub trip_list: String,
    pub stop_count: usize,
    pub stop_list: String,
}

impl StopSummary {
    pub fn csv_row(&self) -> StopCsvRow {
        StopCsvRow {
            id: self.id.clone(),
            name: self.name.clone(),
            trip_count: self.trip_count,
            trip_list: self.trip_list.iter().join(";"),
            route_count: self.route_count,
            route_list: self.route_list.iter().join(";"),
        }
    }
}

impl RouteSummary {
    pub fn csv_row(&self) -> RouteCsvRow {
        RouteCsvRow {
            id: self.id.clone(),
            name: self.name.clone(),
            full_name: self.full_name.clone(),
            direction_id: self.direction_id,
            trip_count: self.trip_count,
            trip_list: self.trip_list.iter().join(";"),
            stop_count: self.stop_count,
            stop_list: self.stop_list.iter().join(";"),
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct FeedSummary {
    pub stops: Vec<StopSummary>,
    pub routes: Vec<RouteSummary>,
}

/// aggregates the loaded feed into per-stop and per-route-direction
/// summaries, both in stable id order.
pub fn summarize(gtfs: &Gtfs) -> FeedSummary {
    #[derive(Default)]
    struct StopActivity {
        arrivals: Vec<String>,
        route_ids: BTreeSet<String>,
    }

    let mut activity: BTreeMap<String, StopActivity> = BTreeMap::new();
    let mut groups: BTreeMap<(String, u8), Vec<&Trip>> = BTreeMap::new();

    for trip in gtfs.trips.values() {
        groups
            .entry((trip.route_id.clone(), direction_bit(trip)))
            .or_default()
            .push(trip);
        for stop_time in &trip.stop_times {
            let entry = activity.entry(stop_time.stop.id.clone()).or_default();
            if let Some(arrival) = stop_time.arrival_time {
                entry.arrivals.push(format_time(arrival));
            }
            entry.route_ids.insert(trip.route_id.clone());
        }
    }

    let route_short_name = |route_id: &str| -> String {
        gtfs.routes
            .get(route_id)
            .and_then(|r| r.short_name.clone())
            .unwrap_or_else(|| route_id.to_string())
    };

    let stops = gtfs
        .stops
        .iter()
        .sorted_by(|a, b| a.0.cmp(b.0))
        .map(|(stop_id, stop)| {
            let activity = activity.remove(stop_id).unwrap_or_default();
            let mut trip_list = activity.arrivals;
            trip_list.sort();
            let route_list = activity
                .route_ids
                .iter()
                .map(|id| route_short_name(id))
                .collect_vec();
            StopSummary {
                id: stop_id.clone(),
                name: stop.name.clone().unwrap_or_default(),
                trip_count: trip_list.len(),
                trip_list,
                route_count: route_list.len(),
                route_list,
            }
        })
        .collect_vec();

    let routes = groups
        .into_iter()
        .map(|((route_id, direction_id), mut trips)| {
            trips.sort_by(|a, b| a.id.cmp(&b.id));
            let mut trip_list = trips
                .iter()
                .filter_map(|t| t.stop_times.first().and_then(|st| st.arrival_time))
                .map(format_time)
                .collect_vec();
            trip_list.sort();

            // the stop walk is identical across a direction's trips, so
            // any representative will do
            let representative = trips.first();
            let stop_list = representative
                .map(|t| {
                    t.stop_times
                        .iter()
                        .map(|st| st.stop.name.clone().unwrap_or_default())
                        .collect_vec()
                })
                .unwrap_or_default();
            let full_name = match (stop_list.first(), stop_list.last()) {
                (Some(first), Some(last)) => format!("{first} → {last}"),
                _ => "No active trips".to_string(),
            };
            RouteSummary {
                id: route_id.clone(),
                name: route_short_name(&route_id),
                full_name,
                direction_id,
                trip_count: trips.len(),
                trip_list,
                stop_count: stop_list.len(),
                stop_list,
                shape_id: representative.and_then(|t| t.shape_id.clone()),
            }
        })
        .collect_vec();

    FeedSummary { stops, routes }
}
