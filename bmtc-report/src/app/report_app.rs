use super::ReportOperation;
use clap::Parser;

/// command line tool for rendering a packaged GTFS dataset into map
/// layers and flat summaries
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct ReportApp {
    #[command(subcommand)]
    pub op: ReportOperation,
}
