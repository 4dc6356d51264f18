//! Derived statistics over the authoritative mission logs.
//!
//! These are synchronous projections computed at request time. Nothing
//! here is cached or mutated: the same log always yields the same
//! output, so restarts and retries are free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hoverfly_domain::{StoredSample, Threat, ThreatTally};

/// Default window for rolling averages, in samples.
pub const DEFAULT_WINDOW: usize = 100;

/// Arithmetic means over a recent telemetry window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentAverages {
    pub altitude: f64,
    pub speed: f64,
    pub battery_level: f64,
}

/// One flight-path vertex, projected from a telemetry sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PathPoint {
    pub lat: f64,
    pub lng: f64,
    pub altitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Mean altitude/speed/battery over the given samples.
///
/// An empty window yields all-zero averages rather than dividing by
/// zero.
#[must_use]
pub fn recent_averages(window: &[StoredSample]) -> RecentAverages {
    if window.is_empty() {
        return RecentAverages::default();
    }

    let n = window.len() as f64;
    let mut sums = RecentAverages::default();
    for stored in window {
        sums.altitude += stored.sample.altitude;
        sums.speed += stored.sample.speed;
        sums.battery_level += stored.sample.battery_level;
    }

    RecentAverages {
        altitude: sums.altitude / n,
        speed: sums.speed / n,
        battery_level: sums.battery_level / n,
    }
}

/// Tally of the mission's current threat log by category.
#[must_use]
pub fn threats_by_type(threats: &[Threat]) -> ThreatTally {
    let mut tally = ThreatTally::new();
    for threat in threats {
        *tally.entry(threat.threat_type).or_insert(0) += 1;
    }
    tally
}

/// Flight path projection, one vertex per telemetry sample in log order.
#[must_use]
pub fn flight_path(log: &[StoredSample]) -> Vec<PathPoint> {
    log.iter()
        .map(|stored| PathPoint {
            lat: stored.sample.position.lat,
            lng: stored.sample.position.lng,
            altitude: stored.sample.altitude,
            timestamp: stored.sample.timestamp,
        })
        .collect()
}
