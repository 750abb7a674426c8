//! per-stage ingestion of the scraped documents into the registry. every
//! stage takes the raw source and the registry by reference, skips past
//! bad units, and reports an aggregate [StageSummary]; only systemic
//! problems (an unreadable or empty route catalog) abort the build.
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Display;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use geo::Point;
use itertools::Itertools;
use kdam::tqdm;

use crate::feed::config::FeedConfig;
use crate::feed::entity::{
    parse_time_of_day, FareAttribute, FareRule, Route, Stop, StopTime, TimeOfDay, Translation,
    Trip,
};
use crate::feed::fare;
use crate::feed::feed_error::FeedError;
use crate::feed::raw::{
    self, FareDoc, RawStation, RouteCatalogDoc, RouteLineDoc, StopCodeDoc, StopListDoc,
    TimetableDoc, TranslationDoc,
};
use crate::feed::registry::FeedRegistry;
use crate::feed::synth;

/// locations of the scraped documents beneath one raw-data root.
#[derive(Debug, Clone)]
pub struct RawDataSource {
    root: PathBuf,
    timetable_day: String,
}

impl RawDataSource {
    pub fn new(root: impl Into<PathBuf>, timetable_day: impl Into<String>) -> Self {
        RawDataSource {
            root: root.into(),
            timetable_day: timetable_day.into(),
        }
    }

    fn stops_dir(&self) -> PathBuf {
        self.root.join("stops")
    }

    fn routes_path(&self) -> PathBuf {
        self.root.join("routes.json")
    }

    fn routelines_dir(&self) -> PathBuf {
        self.root.join("routelines")
    }

    fn timetables_dir(&self) -> PathBuf {
        self.root.join("timetables").join(&self.timetable_day)
    }

    fn fares_dir(&self) -> PathBuf {
        self.root.join("fares")
    }

    fn stop_codes_path(&self) -> PathBuf {
        self.fares_dir().join("stopcodes.json")
    }

    fn route_fares_dir(&self, route_id: &str) -> PathBuf {
        self.fares_dir().join(route_id)
    }

    fn translations_dir(&self) -> PathBuf {
        self.root.join("translations")
    }

    fn stop_list_path(&self, route_direction: &str) -> PathBuf {
        self.stops_dir().join(format!("{route_direction}.json"))
    }

    fn timetable_path(&self, route_direction: &str) -> PathBuf {
        self.timetables_dir().join(format!("{route_direction}.json"))
    }
}

/// a travel direction of a route; the unit of stop-list, timetable, and
/// shape association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub const BOTH: [Direction; 2] = [Direction::Up, Direction::Down];

    pub fn suffix(&self) -> &'static str {
        match self {
            Direction::Up => "UP",
            Direction::Down => "DOWN",
        }
    }

    pub fn direction_id(&self) -> u8 {
        match self {
            Direction::Up => 0,
            Direction::Down => 1,
        }
    }
}

/// aggregate outcome of one ingestion stage.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StageSummary {
    pub added: usize,
    pub failed: usize,
}

impl StageSummary {
    fn count_added(&mut self) {
        self.added += 1;
    }

    fn count_failed(&mut self) {
        self.failed += 1;
    }
}

impl Display for StageSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} added ({} errors)", self.added, self.failed)
    }
}

/// route-directions that contributed nothing, and why; written out as
/// line-delimited review lists next to the dataset.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildDiagnostics {
    pub missing_timetables: Vec<String>,
    pub missing_stops: Vec<String>,
    pub missing_shapes: Vec<String>,
    pub fareless_routes: Vec<String>,
}

impl BuildDiagnostics {
    pub fn write_to(&self, directory: &Path) -> Result<(), FeedError> {
        std::fs::create_dir_all(directory).map_err(|e| FeedError::OutputIoError {
            path: directory.display().to_string(),
            source: e,
        })?;
        let lists = [
            ("missing_timetables.txt", &self.missing_timetables),
            ("missing_stops.txt", &self.missing_stops),
            ("missing_shapes.txt", &self.missing_shapes),
            ("fareless_routes.txt", &self.fareless_routes),
        ];
        for (filename, entries) in lists {
            let path = directory.join(filename);
            let to_io_error = |e| FeedError::OutputIoError {
                path: path.display().to_string(),
                source: e,
            };
            let mut file = File::create(&path).map_err(to_io_error)?;
            for entry in entries {
                writeln!(file, "{entry}").map_err(to_io_error)?;
            }
        }
        Ok(())
    }
}

/// strips the direction suffix from a scraped route number to obtain the
/// canonical route id.
pub fn canonical_route_id(routeno: &str) -> String {
    routeno
        .replace(" UP", "")
        .replace(" DOWN", "")
        .trim()
        .to_string()
}

fn non_empty_file(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false)
}

/// json documents beneath a directory, sorted for a stable ingestion
/// order. zero-byte files (stubs from an aborted scrape) are left out.
fn list_json_files(directory: &Path) -> Result<Vec<PathBuf>, FeedError> {
    let entries = std::fs::read_dir(directory).map_err(|e| FeedError::RawReadError {
        path: directory.display().to_string(),
        source: e,
    })?;
    Ok(entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter(|path| non_empty_file(path))
        .sorted()
        .collect_vec())
}

fn register_station(registry: &mut FeedRegistry, station: &RawStation) -> bool {
    let stop_id = station.stationid.to_string();
    registry.add_stop(Stop {
        stop_id: stop_id.clone(),
        stop_name: station.stationname.clone(),
        stop_lat: station.centerlat,
        stop_lon: station.centerlong,
        zone_id: stop_id,
    })
}

/// registers every station of every stop-list document, first sighting
/// winning across route files.
pub fn add_stops(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
) -> Result<StageSummary, FeedError> {
    let mut summary = StageSummary::default();
    for path in list_json_files(&source.stops_dir())? {
        let doc: StopListDoc = match raw::read_json(&path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping stop list: {e}");
                summary.count_failed();
                continue;
            }
        };
        for station in doc.up.data.iter().chain(doc.down.data.iter()) {
            if register_station(registry, station) {
                summary.count_added();
            }
        }
    }
    log::info!("stops stage: {summary}");
    Ok(summary)
}

/// registers one route per distinct canonical route number. an unreadable
/// or empty catalog is the systemic failure that aborts the run.
pub fn add_routes(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
) -> Result<StageSummary, FeedError> {
    let path = source.routes_path();
    let catalog: RouteCatalogDoc = raw::read_json(&path)?;
    if catalog.data.is_empty() {
        return Err(FeedError::EmptyRouteCatalogError(
            path.display().to_string(),
        ));
    }

    let mut summary = StageSummary::default();
    for entry in &catalog.data {
        let route_id = canonical_route_id(&entry.routeno);
        if route_id.is_empty() {
            log::warn!("route entry with blank route number skipped");
            summary.count_failed();
            continue;
        }
        let added = registry.add_route(Route {
            route_id: route_id.clone(),
            route_short_name: route_id,
            route_long_name: format!("{} ⇔ {}", entry.fromstation, entry.tostation),
            route_type: 3,
        });
        if added {
            summary.count_added();
        }
    }
    log::info!("routes stage: {summary}");
    Ok(summary)
}

/// registers one shape per route-direction polyline document, sequencing
/// points 1-based in source order.
pub fn add_shapes(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
) -> Result<StageSummary, FeedError> {
    let mut summary = StageSummary::default();
    for path in list_json_files(&source.routelines_dir())? {
        let doc: RouteLineDoc = match raw::read_json(&path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping routeline: {e}");
                summary.count_failed();
                continue;
            }
        };
        if doc.data.is_empty() {
            continue;
        }
        let shape_id = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => stem.to_string(),
            None => {
                summary.count_failed();
                continue;
            }
        };
        for point in &doc.data {
            registry.add_shape_point(&shape_id, point.latitude, point.longitude);
        }
        summary.count_added();
    }
    log::info!("shapes stage: {summary}");
    Ok(summary)
}

fn station_coordinates(stations: &[RawStation]) -> Vec<Option<Point<f64>>> {
    stations
        .iter()
        .map(|s| match (s.centerlat, s.centerlong) {
            (Some(lat), Some(lon)) => Some(Point::new(lon, lat)),
            _ => None,
        })
        .collect()
}

fn parse_trip_window(start: Option<&str>, end: Option<&str>) -> Option<(TimeOfDay, TimeOfDay)> {
    let start = parse_time_of_day(start?)?;
    let end = parse_time_of_day(end?)?;
    if end <= start {
        return None;
    }
    Some((start, end))
}

/// synthesizes every trip of every route-direction with a stop list, a
/// shape, and a timetable; the rest land on the diagnostics lists. a trip
/// with malformed time fields is skipped and logged without failing its
/// route-direction.
pub fn add_trips(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
    config: &FeedConfig,
    diagnostics: &mut BuildDiagnostics,
) -> Result<StageSummary, FeedError> {
    let mut summary = StageSummary::default();
    let route_ids = registry.route_ids();
    let route_iter = tqdm!(
        route_ids.iter(),
        total = route_ids.len(),
        desc = "synthesize trips"
    );
    for route_id in route_iter {
        for direction in Direction::BOTH {
            let route_direction = format!("{} {}", route_id, direction.suffix());

            let stop_list_path = source.stop_list_path(&route_direction);
            if !non_empty_file(&stop_list_path) {
                diagnostics.missing_stops.push(route_direction);
                continue;
            }
            if !registry.has_shape(&route_direction) {
                diagnostics.missing_shapes.push(route_direction);
                continue;
            }
            let timetable_path = source.timetable_path(&route_direction);
            if !non_empty_file(&timetable_path) {
                diagnostics.missing_timetables.push(route_direction);
                continue;
            }
            let timetable: TimetableDoc = match raw::read_json(&timetable_path) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("skipping route-direction '{route_direction}': {e}");
                    summary.count_failed();
                    continue;
                }
            };
            if timetable.has_no_records() {
                diagnostics.missing_timetables.push(route_direction);
                continue;
            }
            let stop_list: StopListDoc = match raw::read_json(&stop_list_path) {
                Ok(doc) => doc,
                Err(e) => {
                    log::warn!("skipping route-direction '{route_direction}': {e}");
                    summary.count_failed();
                    continue;
                }
            };
            let stations = match direction {
                Direction::Up => &stop_list.up.data,
                Direction::Down => &stop_list.down.data,
            };
            if stations.is_empty() {
                diagnostics.missing_stops.push(route_direction);
                continue;
            }

            // stations may appear here before any stop list registered
            // them; first sighting still wins
            for station in stations {
                register_station(registry, station);
            }

            let entry = &timetable.data[0];
            let coords = station_coordinates(stations);
            for detail in &entry.tripdetails {
                let window =
                    parse_trip_window(detail.starttime.as_deref(), detail.endtime.as_deref());
                let (start, end) = match window {
                    Some(window) => window,
                    None => {
                        log::warn!(
                            "trip with malformed time fields on '{route_direction}' skipped ({:?}..{:?})",
                            detail.starttime,
                            detail.endtime
                        );
                        summary.count_failed();
                        continue;
                    }
                };
                let trip_id = registry.next_trip_id();
                registry.add_trip(Trip {
                    route_id: route_id.clone(),
                    service_id: config.service.service_id.clone(),
                    trip_id: trip_id.clone(),
                    trip_headsign: entry.tostationname.clone(),
                    direction_id: direction.direction_id(),
                    shape_id: route_direction.clone(),
                });
                let timestamps = synth::synthesize_stop_times(start, end, &coords, &config.synthesis);
                for (index, (station, timestamp)) in
                    stations.iter().zip(timestamps.iter()).enumerate()
                {
                    registry.add_stop_time(StopTime {
                        trip_id: trip_id.clone(),
                        arrival_time: *timestamp,
                        departure_time: *timestamp,
                        stop_id: station.stationid.to_string(),
                        stop_sequence: index as u32 + 1,
                    });
                }
                summary.count_added();
            }
        }
    }
    log::info!("trips stage: {summary}");
    log::info!(
        "missing timetable for {} route-directions, stop list for {}, shape for {}",
        diagnostics.missing_timetables.len(),
        diagnostics.missing_stops.len(),
        diagnostics.missing_shapes.len()
    );
    Ok(summary)
}

fn load_stop_codes(source: &RawDataSource) -> HashMap<String, String> {
    let path = source.stop_codes_path();
    if !non_empty_file(&path) {
        log::warn!("no stop-code map at '{}'; fares cannot be resolved", path.display());
        return HashMap::new();
    }
    match raw::read_json::<StopCodeDoc>(&path) {
        Ok(doc) => doc
            .data
            .into_iter()
            .map(|c| (c.stationcode, c.stationid.to_string()))
            .collect(),
        Err(e) => {
            log::warn!("unreadable stop-code map: {e}");
            HashMap::new()
        }
    }
}

/// the distinct stops of a route across both directions, ascending by
/// numeric station id — the stable order the stage inference walks.
fn distinct_route_stops(stop_list: &StopListDoc) -> Vec<String> {
    stop_list
        .up
        .data
        .iter()
        .chain(stop_list.down.data.iter())
        .map(|s| s.stationid)
        .sorted()
        .dedup()
        .map(|id| id.to_string())
        .collect_vec()
}

/// reads every fare-quote document of one route into a pair-keyed map.
/// pairs whose codes are unknown or that do not belong to the route are
/// ignored; an unparseable quote counts as failed.
fn observed_fares(
    source: &RawDataSource,
    route_id: &str,
    route_stops: &HashSet<String>,
    code_to_stop: &HashMap<String, String>,
    summary: &mut StageSummary,
) -> BTreeMap<(String, String), f64> {
    let mut observations = BTreeMap::new();
    let fares_dir = source.route_fares_dir(route_id);
    if !fares_dir.is_dir() {
        return observations;
    }
    let quote_files = match list_json_files(&fares_dir) {
        Ok(files) => files,
        Err(e) => {
            log::warn!("unreadable fare directory: {e}");
            summary.count_failed();
            return observations;
        }
    };
    for path in quote_files {
        let stem = match path.file_stem().and_then(|stem| stem.to_str()) {
            Some(stem) => stem,
            None => continue,
        };
        let Some((from_code, to_code)) = stem.split_once('_') else {
            continue;
        };
        let (Some(origin), Some(destination)) =
            (code_to_stop.get(from_code), code_to_stop.get(to_code))
        else {
            continue;
        };
        if !route_stops.contains(origin) || !route_stops.contains(destination) {
            continue;
        }
        match raw::read_json::<FareDoc>(&path) {
            Ok(doc) => {
                if let Some(quote) = doc.data.first() {
                    observations.insert((origin.clone(), destination.clone()), quote.fare);
                }
            }
            Err(e) => {
                log::warn!("skipping fare quote: {e}");
                summary.count_failed();
            }
        }
    }
    observations
}

/// runs fare-stage inference per route and registers the resulting fare
/// attributes and rules. a route with zero observed fares is recorded on
/// the fareless list, not counted as failed.
pub fn add_fares(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
    config: &FeedConfig,
    diagnostics: &mut BuildDiagnostics,
) -> Result<StageSummary, FeedError> {
    let mut summary = StageSummary::default();
    let code_to_stop = load_stop_codes(source);

    for route_id in registry.route_ids() {
        let stop_list_path = Direction::BOTH
            .iter()
            .map(|d| source.stop_list_path(&format!("{} {}", route_id, d.suffix())))
            .find(|path| non_empty_file(path));
        let Some(stop_list_path) = stop_list_path else {
            diagnostics.fareless_routes.push(route_id);
            continue;
        };
        let stop_list: StopListDoc = match raw::read_json(&stop_list_path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping fares for route '{route_id}': {e}");
                summary.count_failed();
                continue;
            }
        };

        let ordered_stops = distinct_route_stops(&stop_list);
        let route_stops: HashSet<String> = ordered_stops.iter().cloned().collect();
        let observations =
            observed_fares(source, &route_id, &route_stops, &code_to_stop, &mut summary);
        if observations.is_empty() {
            diagnostics.fareless_routes.push(route_id);
            continue;
        }

        let pairwise: fare::FareObservations = observations
            .iter()
            .map(|(pair, fare)| (pair.clone(), *fare))
            .collect();
        let stages = fare::infer_stages(&ordered_stops, &pairwise);
        log::debug!("route '{route_id}' fare stages: {stages:?}");

        for ((origin, destination), price) in observations {
            let fare_id = fare::fare_id(price);
            if !registry.contains_fare_attribute(&fare_id) {
                registry.add_fare_attribute(FareAttribute {
                    fare_id: fare_id.clone(),
                    price: fare::format_price(price),
                    currency_type: config.fares.currency.clone(),
                    payment_method: config.fares.payment_method,
                    transfers: config.fares.transfers,
                    agency_id: config.agency.agency_id.clone(),
                });
            }
            registry.add_fare_rule(FareRule {
                fare_id,
                route_id: route_id.clone(),
                origin_id: origin,
                destination_id: destination,
            });
        }
        summary.count_added();
    }
    log::info!(
        "fares stage: {summary}; {} routes with no observed fares",
        diagnostics.fareless_routes.len()
    );
    Ok(summary)
}

/// language of a translation shard, taken from the `_<lang>` filename
/// suffix.
fn shard_language(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    let (_, language) = stem.rsplit_once('_')?;
    if language.is_empty() || !language.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(language.to_string())
}

/// registers stop-name translations from every language shard, dropping
/// records that name a stop the registry never saw.
pub fn add_translations(
    source: &RawDataSource,
    registry: &mut FeedRegistry,
) -> Result<StageSummary, FeedError> {
    let mut summary = StageSummary::default();
    for path in list_json_files(&source.translations_dir())? {
        let Some(language) = shard_language(&path) else {
            log::debug!("no language suffix on '{}'", path.display());
            continue;
        };
        let doc: TranslationDoc = match raw::read_json(&path) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("skipping translation shard: {e}");
                summary.count_failed();
                continue;
            }
        };
        for record in &doc.data {
            if record.geofencename.is_empty() {
                continue;
            }
            let record_id = record.stopid.to_string();
            if !registry.contains_stop(&record_id) {
                continue;
            }
            let added = registry.add_translation(Translation {
                table_name: "stops".to_string(),
                field_name: "stop_name".to_string(),
                record_id,
                language: language.clone(),
                translation: record.geofencename.clone(),
            });
            if added {
                summary.count_added();
            }
        }
    }
    log::info!("translations stage: {summary}");
    Ok(summary)
}
