mod build;
mod clean;
mod config;
mod entity;
mod fare;
mod feed_error;
mod ingest;
mod package;
mod raw;
mod registry;
mod synth;

pub use build::{build_feed, BuildOutcome};
pub use clean::{clean, CleanSummary};
pub use config::{AgencyConfig, FareConfig, FeedConfig, ServiceConfig};
pub use entity::{
    format_time_of_day, parse_time_of_day, Agency, Calendar, FareAttribute, FareRule, Route,
    ShapePoint, Stop, StopTime, TimeOfDay, Translation, Trip,
};
pub use fare::{fare_id, format_price, infer_stages, FareObservations};
pub use feed_error::FeedError;
pub use ingest::{
    add_fares, add_routes, add_shapes, add_stops, add_translations, add_trips,
    canonical_route_id, BuildDiagnostics, Direction, RawDataSource, StageSummary,
};
pub use package::write_feed;
pub use registry::{FeedRegistry, FeedSnapshot};
pub use synth::{allocate_offsets, haversine_km, synthesize_stop_times, SynthesisParams};
