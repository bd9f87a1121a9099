/// Simulated wall clock and day-cycle signals.
pub mod clock;
pub mod command;
pub mod engine;
/// Diurnal outside-condition forcing.
pub mod forcing;
pub mod summary;
pub mod types;
