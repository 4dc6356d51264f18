//! HTTP route handlers.

pub mod missions;
pub mod weather;
pub mod ws;
