//! # Hoverfly Analytics
//!
//! Derived statistics for drone missions, beyond the incrementally
//! maintained counters the store keeps. Everything here is a pure
//! function over the authoritative logs, computed at request time and
//! never cached.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod aggregate;
pub mod suitability;

pub use aggregate::{
    DEFAULT_WINDOW, PathPoint, RecentAverages, flight_path, recent_averages, threats_by_type,
};
pub use suitability::{FlightConditions, WeatherObservation, flight_suitability};
