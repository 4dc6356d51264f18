//! # Hoverfly Simulator
//!
//! Telemetry generator for exercising the mission API: flies a
//! random-walk pattern and posts each sample to the ingestion endpoint.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod flight;

pub use flight::{FlightSimulator, SimulatedSample};
