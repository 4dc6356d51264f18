//! # Hoverfly Persistence Library
//!
//! Mission store for the Hoverfly drone mission tracking service.
//!
//! This crate defines the [`MissionStore`] repository trait and its
//! backends. Mission documents and their append-only telemetry/threat
//! logs are kept as separate keyed collections (mission id + sequence
//! number) rather than ever-growing arrays embedded in one document, so
//! appends stay cheap as a mission's history grows.
//!
//! ## Backends
//!
//! - [`MemoryMissionStore`]: in-process reference backend (default),
//!   used by the test suite and local development.
//! - `ScyllaMissionStore`: ScyllaDB backend, behind the `scylla`
//!   feature.

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod memory;
pub mod store;

#[cfg(feature = "scylla")]
pub mod scylla_store;

pub use error::{PersistenceError, Result};
pub use memory::MemoryMissionStore;
pub use store::MissionStore;

#[cfg(feature = "scylla")]
pub use scylla_store::{ScyllaClient, ScyllaConfig, ScyllaMissionStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
