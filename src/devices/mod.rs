//! Physical and resource models of the instrumented slab.

/// Pump, heater and water reservoir.
pub mod actuator;
/// Air boundary layer above the slab.
pub mod air;
/// Four-cell battery bank for sensors and actuators.
pub mod battery;
/// Curing concrete slab.
pub mod concrete;
pub mod types;

// Re-export the main types for convenience
pub use actuator::ActuatorController;
pub use air::AirLayer;
pub use battery::{BatteryBank, CellRole};
pub use concrete::ConcreteSlab;
pub use types::Model;
pub use types::StepContext;
