//! builds the BMTC GTFS dataset from a directory of scraped operator
//! documents.
use bmtc_gtfs::app::FeedApp;
use clap::Parser;

fn main() {
    env_logger::init();
    let args = FeedApp::parse();
    if let Err(e) = args.op.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
