//! the pipeline driver: runs every ingestion stage in order against one
//! registry, with a cleaning pass after trip synthesis and another after
//! fare processing.
use crate::feed::clean;
use crate::feed::config::FeedConfig;
use crate::feed::feed_error::FeedError;
use crate::feed::ingest::{self, BuildDiagnostics, RawDataSource};
use crate::feed::registry::FeedRegistry;

/// everything a build produces besides the packaged archive itself.
#[derive(Debug)]
pub struct BuildOutcome {
    pub registry: FeedRegistry,
    pub diagnostics: BuildDiagnostics,
}

/// ingests the raw documents into a fresh registry: stops, routes,
/// shapes, synthesized trips, inferred fares, translations, with the
/// cleaner run after synthesis and again after fares. fails only on the
/// systemic errors of [FeedError]; everything else is skipped and
/// reported.
pub fn build_feed(source: &RawDataSource, config: &FeedConfig) -> Result<BuildOutcome, FeedError> {
    let mut registry = FeedRegistry::new();
    let mut diagnostics = BuildDiagnostics::default();

    ingest::add_stops(source, &mut registry)?;
    ingest::add_routes(source, &mut registry)?;
    ingest::add_shapes(source, &mut registry)?;
    ingest::add_trips(source, &mut registry, config, &mut diagnostics)?;
    clean::clean(&mut registry);
    ingest::add_fares(source, &mut registry, config, &mut diagnostics)?;
    ingest::add_translations(source, &mut registry)?;
    clean::clean(&mut registry);

    log::info!(
        "registry holds {} stops, {} routes, {} shapes, {} trips, {} stop times, {} fare rules, {} translations",
        registry.stop_count(),
        registry.route_count(),
        registry.shape_count(),
        registry.trip_count(),
        registry.stop_time_count(),
        registry.fare_rule_count(),
        registry.translation_count()
    );

    Ok(BuildOutcome {
        registry,
        diagnostics,
    })
}
