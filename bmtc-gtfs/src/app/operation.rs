//! build operations over a directory of scraped operator documents.
use crate::feed::{build_feed, write_feed, FeedConfig, FeedError, RawDataSource};
use chrono::NaiveDate;
use clap::{value_parser, Subcommand};
use std::path::Path;

#[derive(Debug, Clone, Subcommand)]
pub enum FeedOperation {
    /// synthesize the GTFS dataset from a raw-data directory
    Build {
        /// directory holding the scraped stops/, routes.json, routelines/,
        /// timetables/, fares/, and translations/ documents
        #[arg(long)]
        raw_dir: String,
        /// path of the GTFS zip archive to write
        #[arg(long, default_value_t = String::from("bmtc.zip"))]
        output: String,
        /// directory receiving the line-delimited diagnostics lists
        #[arg(long, default_value_t = String::from("."))]
        diagnostics_dir: String,
        /// day-of-week subdirectory of timetables/ to build the service from
        #[arg(long, default_value_t = String::from("Monday"))]
        timetable_day: String,
        /// optional TOML file overriding agency, service-window, fare, and
        /// synthesis settings
        #[arg(long)]
        config: Option<String>,
        /// override the configured first day of the service window
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        start_date: Option<NaiveDate>,
        /// override the configured last day of the service window
        #[arg(long, value_parser = value_parser!(NaiveDate))]
        end_date: Option<NaiveDate>,
    },
}

impl FeedOperation {
    pub fn run(&self) -> Result<(), FeedError> {
        match self {
            FeedOperation::Build {
                raw_dir,
                output,
                diagnostics_dir,
                timetable_day,
                config,
                start_date,
                end_date,
            } => {
                let mut config = match config {
                    Some(filepath) => FeedConfig::from_file(filepath)?,
                    None => FeedConfig::default(),
                };
                if let Some(start_date) = start_date {
                    config.service.start_date = *start_date;
                }
                if let Some(end_date) = end_date {
                    config.service.end_date = *end_date;
                }

                let source = RawDataSource::new(raw_dir, timetable_day.as_str());
                let outcome = build_feed(&source, &config)?;
                write_feed(&outcome.registry.snapshot(), &config, Path::new(output))?;
                outcome.diagnostics.write_to(Path::new(diagnostics_dir))?;
                Ok(())
            }
        }
    }
}
