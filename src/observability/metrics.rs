//! Navigation metrics.
//!
//! # Metrics
//! - `route_manager_triggers_total` (counter): resolutions started
//! - `route_manager_outcomes_total` (counter): by outcome
//!   (`navigated`, `not_found`, `fallback`, `stale`)
//! - `route_manager_gate_rejections_total` (counter): candidates vetoed by gates

use metrics::counter;

/// Record the start of a resolution.
pub fn record_trigger() {
    counter!("route_manager_triggers_total").increment(1);
}

/// Record how a resolution ended.
pub fn record_outcome(outcome: &'static str) {
    counter!("route_manager_outcomes_total", "outcome" => outcome).increment(1);
}

/// Record a gate veto.
pub fn record_gate_rejection() {
    counter!("route_manager_gate_rejections_total").increment(1);
}
