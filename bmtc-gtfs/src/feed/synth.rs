//! trip time synthesis: turns a trip's nominal start/end window and an
//! ordered sequence of stop coordinates into per-stop timestamps that are
//! monotonic, fit the window where physically possible, and never imply
//! travel faster than the maximum plausible speed.
use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};

use crate::feed::entity::TimeOfDay;

fn default_max_speed_kmh() -> f64 {
    75.0
}

fn default_segment_km() -> f64 {
    0.5
}

/// tuning knobs of the synthesizer, overridable from the feed TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisParams {
    /// maximum plausible bus speed; segments whose proportional share
    /// implies a faster traversal are stretched to this floor.
    #[serde(default = "default_max_speed_kmh")]
    pub max_speed_kmh: f64,
    /// inter-stop distance assumed when either stop of a pair has no
    /// coordinate.
    #[serde(default = "default_segment_km")]
    pub default_segment_km: f64,
}

impl Default for SynthesisParams {
    fn default() -> Self {
        SynthesisParams {
            max_speed_kmh: default_max_speed_kmh(),
            default_segment_km: default_segment_km(),
        }
    }
}

/// great-circle distance between two stops in kilometers.
pub fn haversine_km(src: Point<f64>, dst: Point<f64>) -> f64 {
    Haversine.distance(src, dst) / 1000.0
}

/// distance of one consecutive stop pair, falling back to the configured
/// default when either coordinate is absent rather than failing the trip.
fn segment_km(src: &Option<Point<f64>>, dst: &Option<Point<f64>>, params: &SynthesisParams) -> f64 {
    match (src, dst) {
        (Some(a), Some(b)) => haversine_km(*a, *b),
        _ => params.default_segment_km,
    }
}

/// allocates a per-stop offset-from-start (seconds) for each stop of a
/// trip, given the consecutive segment distances.
///
/// each segment receives the larger of its duration-proportional share and
/// its minimum plausible travel time. if the floors push the provisional
/// end past the window, all offsets are rescaled back onto it; the first
/// offset is always zero. a pathologically short window therefore yields a
/// compressed but still monotonic schedule rather than an error.
pub fn allocate_offsets(total_duration: f64, distances: &[f64], max_speed_kmh: f64) -> Vec<f64> {
    let total_distance: f64 = distances.iter().sum();
    let allocated = distances.iter().map(|d| {
        let proportional = if total_distance > 0.0 {
            total_duration * d / total_distance
        } else {
            total_duration / distances.len() as f64
        };
        let floor = d / max_speed_kmh * 3600.0;
        proportional.max(floor)
    });

    let mut offsets = Vec::with_capacity(distances.len() + 1);
    let mut elapsed = 0.0;
    offsets.push(0.0);
    for seconds in allocated {
        elapsed += seconds;
        offsets.push(elapsed);
    }

    if elapsed > total_duration && elapsed > 0.0 {
        let scale = total_duration / elapsed;
        for offset in offsets.iter_mut() {
            *offset *= scale;
        }
    }
    offsets
}

/// synthesizes one timestamp per stop for a trip running `start..end`
/// (seconds since midnight, end > start) over the given ordered stop
/// coordinates. a single-stop input yields the single timestamp `start`;
/// the cleaner removes the degenerate trip downstream.
pub fn synthesize_stop_times(
    start: TimeOfDay,
    end: TimeOfDay,
    coords: &[Option<Point<f64>>],
    params: &SynthesisParams,
) -> Vec<TimeOfDay> {
    if coords.is_empty() {
        return vec![];
    }
    let distances: Vec<f64> = coords
        .windows(2)
        .map(|pair| segment_km(&pair[0], &pair[1], params))
        .collect();
    if distances.is_empty() {
        return vec![start];
    }
    let total_duration = end.saturating_sub(start) as f64;
    allocate_offsets(total_duration, &distances, params.max_speed_kmh)
        .iter()
        .map(|offset| start + offset.round() as TimeOfDay)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_haversine_one_degree_of_latitude() {
        // one degree of latitude is ~111.2 km on the mean-radius sphere
        let a = Point::new(77.5946, 12.0);
        let b = Point::new(77.5946, 13.0);
        assert_relative_eq!(haversine_km(a, b), 111.195, max_relative = 1e-3);
    }

    #[test]
    fn test_proportional_allocation_without_rescale() {
        // 600s window over 2km + 0.5km: proportional shares 480/120 beat
        // the 96/24 floors, so the window is met exactly
        let offsets = allocate_offsets(600.0, &[2.0, 0.5], 75.0);
        assert_eq!(offsets.len(), 3);
        assert_relative_eq!(offsets[0], 0.0);
        assert_relative_eq!(offsets[1], 480.0);
        assert_relative_eq!(offsets[2], 600.0);
    }

    #[test]
    fn test_floor_dominates_and_rescales_onto_window() {
        // 60s window over the same segments: floors 96/24 win, provisional
        // end 120s, rescale by 0.5 puts the last stop back on the window
        let offsets = allocate_offsets(60.0, &[2.0, 0.5], 75.0);
        assert_relative_eq!(offsets[0], 0.0);
        assert_relative_eq!(offsets[1], 48.0);
        assert_relative_eq!(offsets[2], 60.0);
    }

    #[test]
    fn test_zero_total_distance_splits_equally() {
        let offsets = allocate_offsets(300.0, &[0.0, 0.0, 0.0], 75.0);
        assert_relative_eq!(offsets[1], 100.0);
        assert_relative_eq!(offsets[2], 200.0);
        assert_relative_eq!(offsets[3], 300.0);
    }

    #[test]
    fn test_pathological_window_stays_monotonic() {
        // absurdly short window over long segments: the scale factor
        // compresses hard but ordering is preserved, by design unclamped
        let offsets = allocate_offsets(10.0, &[10.0, 10.0], 75.0);
        assert_relative_eq!(offsets[1], 5.0);
        assert_relative_eq!(offsets[2], 10.0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_missing_coordinates_use_default_segment() {
        // three coordinate-less stops: two default 0.5km segments split
        // the window evenly
        let coords = vec![None, None, None];
        let times =
            synthesize_stop_times(28800, 29400, &coords, &SynthesisParams::default());
        assert_eq!(times, vec![28800, 29100, 29400]);
    }

    #[test]
    fn test_first_stop_pinned_to_start_after_rescale() {
        let coords = vec![None, None, None, None];
        // a 10s window cannot cover three 0.5km segments at 75 km/h, so a
        // rescale triggers; stop 0 must still sit exactly on the start
        let times = synthesize_stop_times(36000, 36010, &coords, &SynthesisParams::default());
        assert_eq!(times[0], 36000);
        assert_eq!(*times.last().expect("non-empty"), 36010);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_single_stop_trip_yields_start_only() {
        let times = synthesize_stop_times(28800, 29400, &[None], &SynthesisParams::default());
        assert_eq!(times, vec![28800]);
    }

    #[test]
    fn test_empty_coordinates_yield_nothing() {
        let times = synthesize_stop_times(28800, 29400, &[], &SynthesisParams::default());
        assert!(times.is_empty());
    }

    #[test]
    fn test_real_coordinates_monotonic_and_windowed() {
        // a short hop across central Bengaluru with one missing coordinate
        let coords = vec![
            Some(Point::new(77.5713, 12.9779)),
            None,
            Some(Point::new(77.5806, 12.9698)),
            Some(Point::new(77.5946, 12.9716)),
        ];
        let times = synthesize_stop_times(21600, 22500, &coords, &SynthesisParams::default());
        assert_eq!(times.len(), 4);
        assert_eq!(times[0], 21600);
        assert!(times.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*times.last().expect("non-empty"), 22500);
    }
}
