// ============================================================================
// Monotonic Clock
// Nanosecond timestamps for orders and trades
// ============================================================================

use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

struct ClockAnchor {
    wall_ns: u64,
    started: Instant,
}

static ANCHOR: OnceLock<ClockAnchor> = OnceLock::new();

/// Current timestamp in nanoseconds.
///
/// Anchored to the Unix epoch on first use and advanced by a monotonic clock
/// afterwards, so successive calls never go backwards even if the system
/// clock is adjusted.
///
/// Timestamps produced here are advisory. Time priority inside the book is
/// enforced by queue position, never by comparing these values.
pub fn monotonic_ns() -> u64 {
    let anchor = ANCHOR.get_or_init(|| ClockAnchor {
        wall_ns: SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0),
        started: Instant::now(),
    });

    anchor
        .wall_ns
        .saturating_add(anchor.started.elapsed().as_nanos() as u64)
}
