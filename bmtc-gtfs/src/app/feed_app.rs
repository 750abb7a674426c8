use super::FeedOperation;
use clap::Parser;

/// command line tool for synthesizing a GTFS dataset from scraped
/// transit-operator documents
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct FeedApp {
    #[command(subcommand)]
    pub op: FeedOperation,
}
