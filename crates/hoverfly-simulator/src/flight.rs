//! Random-walk flight generation.

use rand::Rng;
use serde::Serialize;

use hoverfly_domain::Coordinate;

/// Approximate degrees of latitude per meter.
const DEG_PER_METER: f64 = 1.0 / 111_320.0;

/// One generated telemetry payload, shaped like the ingestion body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedSample {
    pub position: Coordinate,
    pub altitude: f64,
    pub speed: f64,
    pub battery_level: f64,
    pub heading: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Random-walk flight simulator.
///
/// The drone wanders from its start point with a drifting heading,
/// jittering altitude around the initial value and draining the battery
/// a little each tick.
pub struct FlightSimulator {
    position: Coordinate,
    altitude: f64,
    base_altitude: f64,
    heading: f64,
    battery: f64,
    tick: u64,
    interval_secs: f64,
    image_every: u64,
    rng: rand::rngs::ThreadRng,
}

impl FlightSimulator {
    pub fn new(start: Coordinate, altitude: f64, interval_secs: f64, image_every: u64) -> Self {
        Self {
            position: start,
            altitude,
            base_altitude: altitude,
            heading: 0.0,
            battery: 100.0,
            tick: 0,
            interval_secs,
            image_every,
            rng: rand::thread_rng(),
        }
    }

    /// Whether the battery still has charge.
    #[must_use]
    pub fn airborne(&self) -> bool {
        self.battery > 0.0
    }

    /// Advance one tick and produce the next sample.
    pub fn next_sample(&mut self) -> SimulatedSample {
        self.tick += 1;

        self.heading = (self.heading + self.rng.gen_range(-15.0..15.0)).rem_euclid(360.0);
        let speed = self.rng.gen_range(4.0..12.0);

        let distance = speed * self.interval_secs;
        let heading_rad = self.heading.to_radians();
        self.position.lat += distance * heading_rad.cos() * DEG_PER_METER;
        self.position.lng += distance * heading_rad.sin() * DEG_PER_METER
            / self.position.lat.to_radians().cos().max(0.01);

        self.altitude = (self.altitude + self.rng.gen_range(-2.0..2.0))
            .clamp(self.base_altitude - 15.0, self.base_altitude + 15.0);
        self.battery = (self.battery - self.rng.gen_range(0.05..0.20)).max(0.0);

        let image_url = (self.image_every > 0 && self.tick % self.image_every == 0)
            .then(|| format!("https://img.hoverfly.local/capture-{}.jpg", self.tick));

        SimulatedSample {
            position: self.position,
            altitude: self.altitude,
            speed,
            battery_level: self.battery,
            heading: self.heading,
            image_url,
        }
    }
}
