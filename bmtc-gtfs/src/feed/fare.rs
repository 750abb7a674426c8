//! fare-stage inference: collapses a sparse table of observed
//! point-to-point fares for a route into an ordered per-stop stage
//! assignment, and fixes the identity rules for fare attributes.
use std::collections::HashMap;

/// a sparse map of observed fares, keyed by (origin stop id,
/// destination stop id).
pub type FareObservations = HashMap<(String, String), f64>;

/// fares are compared and deduplicated on their two-decimal rendering;
/// quotes differing only beyond the hundredths place are the same fare.
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

/// the fare id is derived from the formatted price, making one attribute
/// row per distinct fare value across the whole system.
pub fn fare_id(price: f64) -> String {
    format!("F{}", format_price(price))
}

/// assigns a fare stage to every stop of a route in one left-to-right
/// pass over the stop order.
///
/// stop 0 is always stage 0. each later stop looks up the fare from its
/// predecessor, falling back to the fare quoted from the route origin
/// when the adjacent pair was never observed. an unknown fare carries the
/// predecessor's stage and running max-fare forward (no information, no
/// boundary). the first observed fare establishes the boundary baseline
/// without opening a stage; a later fare above the running max opens the
/// next stage and raises the baseline. stage numbers are therefore
/// non-decreasing along the route.
pub fn infer_stages(ordered_stops: &[String], fares: &FareObservations) -> Vec<u32> {
    let mut stages = Vec::with_capacity(ordered_stops.len());
    let mut stage = 0u32;
    let mut max_fare_seen: Option<f64> = None;
    for (i, stop) in ordered_stops.iter().enumerate() {
        if i > 0 {
            let previous = &ordered_stops[i - 1];
            let origin = &ordered_stops[0];
            let quote = fares
                .get(&(previous.clone(), stop.clone()))
                .or_else(|| fares.get(&(origin.clone(), stop.clone())));
            match (quote, max_fare_seen) {
                (Some(&fare), Some(max)) if fare > max => {
                    stage += 1;
                    max_fare_seen = Some(fare);
                }
                (Some(&fare), None) => max_fare_seen = Some(fare),
                _ => {}
            }
        }
        stages.push(stage);
    }
    stages
}
