//! Continuous-mode driver: step, sleep, repeat until stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use tracing::info;

use crate::error::SimError;
use crate::io::store::StateStore;
use crate::sim::engine::Engine;
use crate::sim::types::StepResult;

/// Runs steps until `stop` is set or `max_steps` have been taken.
///
/// `stop` is checked before each step and after each pause, so a step in
/// progress always completes. `on_step` sees every result as it is produced.
///
/// # Arguments
///
/// * `engine` - Engine to drive
/// * `interval` - Real time to wait between steps
/// * `stop` - External stop flag
/// * `max_steps` - Optional step limit
/// * `on_step` - Callback for each result
///
/// # Errors
///
/// Returns the first step error; steps taken before it are kept in the engine.
pub fn run_continuous<S, F>(
    engine: &mut Engine<S>,
    interval: Duration,
    stop: &AtomicBool,
    max_steps: Option<usize>,
    mut on_step: F,
) -> Result<usize, SimError>
where
    S: StateStore,
    F: FnMut(&StepResult),
{
    info!(interval_ms = interval.as_millis() as u64, "continuous run started");

    let mut taken = 0;
    while !stop.load(Ordering::Relaxed) && max_steps.is_none_or(|max| taken < max) {
        let result = engine.step()?;
        on_step(&result);
        taken += 1;

        if max_steps.is_some_and(|max| taken >= max) || stop.load(Ordering::Relaxed) {
            break;
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    info!(steps = taken, "continuous run stopped");
    Ok(taken)
}
