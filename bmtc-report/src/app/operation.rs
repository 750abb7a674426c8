use clap::Subcommand;
use gtfs_structures::Gtfs;
use std::path::Path;

use crate::layers;
use crate::report_error::ReportError;
use crate::summary::{self, FeedSummary};

#[derive(Debug, Clone, Subcommand)]
pub enum ReportOperation {
    /// render a feed archive into GeoJSON layers and CSV summary tables
    Layers {
        /// path of the GTFS zip archive to read
        #[arg(long)]
        feed: String,
        /// directory receiving stops.geojson and routes.geojson
        #[arg(long, default_value_t = String::from("geojson"))]
        geojson_dir: String,
        /// directory receiving stops.csv and routes.csv
        #[arg(long, default_value_t = String::from("csv"))]
        csv_dir: String,
    },
}

impl ReportOperation {
    pub fn run(&self) -> Result<(), ReportError> {
        match self {
            ReportOperation::Layers {
                feed,
                geojson_dir,
                csv_dir,
            } => {
                let gtfs = Gtfs::new(feed)?;
                let summary = summary::summarize(&gtfs);
                log::info!(
                    "summarized {} stops and {} route-directions",
                    summary.stops.len(),
                    summary.routes.len()
                );
                write_layers(&gtfs, &summary, Path::new(geojson_dir))?;
                write_tables(&summary, Path::new(csv_dir))?;
                Ok(())
            }
        }
    }
}

fn ensure_dir(directory: &Path) -> Result<(), ReportError> {
    std::fs::create_dir_all(directory).map_err(|e| ReportError::OutputIoError {
        path: directory.display().to_string(),
        source: e,
    })
}

fn write_layers(gtfs: &Gtfs, summary: &FeedSummary, directory: &Path) -> Result<(), ReportError> {
    ensure_dir(directory)?;
    let stops = layers::stops_layer(gtfs, &summary.stops);
    layers::write_geojson(&stops, &directory.join("stops.geojson"))?;
    let routes = layers::routes_layer(gtfs, &summary.routes);
    layers::write_geojson(&routes, &directory.join("routes.geojson"))?;
    log::info!(
        "wrote {} stop features and {} route features under '{}'",
        stops.features.len(),
        routes.features.len(),
        directory.display()
    );
    Ok(())
}

fn write_tables(summary: &FeedSummary, directory: &Path) -> Result<(), ReportError> {
    ensure_dir(directory)?;
    let stop_rows = summary.stops.iter().map(|s| s.csv_row()).collect::<Vec<_>>();
    layers::write_csv(&stop_rows, &directory.join("stops.csv"))?;
    let route_rows = summary
        .routes
        .iter()
        .map(|r| r.csv_row())
        .collect::<Vec<_>>();
    layers::write_csv(&route_rows, &directory.join("routes.csv"))?;
    Ok(())
}
