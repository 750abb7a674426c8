//! post-synthesis consistency pass: drops trips that cannot form a
//! schedule (fewer than two stop times) and translations that reference a
//! stop no longer present. runs after trip synthesis and again after fare
//! processing; both passes are idempotent.
use std::collections::HashSet;
use std::fmt::Display;

use crate::feed::registry::FeedRegistry;

/// a trip needs at least two stop times to describe travel.
const MIN_STOP_TIMES_PER_TRIP: usize = 2;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CleanSummary {
    pub trips_removed: usize,
    pub stop_times_removed: usize,
    pub translations_removed: usize,
}

impl Display for CleanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "removed {} degenerate trips ({} stop times), {} orphaned translations",
            self.trips_removed, self.stop_times_removed, self.translations_removed
        )
    }
}

/// enforces the trip/stop-time and translation invariants on the
/// registry. a pure filter: surviving trip ids are not renumbered.
pub fn clean(registry: &mut FeedRegistry) -> CleanSummary {
    let counts = registry.stop_time_counts_by_trip();
    let degenerate: HashSet<String> = registry
        .trip_ids()
        .into_iter()
        .filter(|id| counts.get(id).copied().unwrap_or(0) < MIN_STOP_TIMES_PER_TRIP)
        .collect();

    let (trips_removed, stop_times_removed) = registry.remove_trips(&degenerate);
    let translations_removed = registry.remove_orphan_translations();

    let summary = CleanSummary {
        trips_removed,
        stop_times_removed,
        translations_removed,
    };
    if trips_removed > 0 || translations_removed > 0 {
        log::info!("cleaner {summary}");
    }
    summary
}
