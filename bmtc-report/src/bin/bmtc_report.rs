//! renders a packaged GTFS dataset into GeoJSON map layers and CSV
//! summaries for operator review.
use bmtc_report::app::ReportApp;
use clap::Parser;

fn main() {
    env_logger::init();
    let args = ReportApp::parse();
    if let Err(e) = args.op.run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
