pub mod app;
mod layers;
mod report_error;
mod summary;

pub use layers::{routes_layer, stops_layer, write_csv, write_geojson};
pub use report_error::ReportError;
pub use summary::{summarize, FeedSummary, RouteSummary, StopSummary};
