//! Scorecard Explorer – linked map and scatter views over U.S. college outcomes.
//!
//! The library holds everything below the window: loading, normalization,
//! filtering, configuration and the session state. The `scorecard-explorer`
//! binary draws it with egui.

pub mod color;
pub mod config;
pub mod data;
pub mod state;
