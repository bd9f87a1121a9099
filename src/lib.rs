//! Curing concrete slab simulator.
//!
//! Advances a slab, the air above it, a four-cell battery bank and a
//! pump/heater pair in discrete steps under a diurnal outside forcing, and
//! persists the state as JSON documents for external readers.

pub mod cli;
pub mod config;
pub mod devices;
pub mod error;
/// JSON document store and CSV export.
pub mod io;
pub mod runner;
/// Simulation engine, clock, forcing and commands.
pub mod sim;
pub mod telemetry;
