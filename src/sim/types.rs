//! Per-step result record.

use std::fmt;

use chrono::NaiveDateTime;

use crate::devices::battery::CELL_COUNT;
use crate::devices::types::{AirSnapshot, ConcreteSnapshot, ExternalConditions};

/// Complete record of one simulation step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    /// Steps taken by this engine since creation or the last reset.
    pub step: u64,
    /// Simulated time after the advance.
    pub timestamp: NaiveDateTime,
    pub step_minutes: i64,
    /// Days since the simulation origin.
    pub elapsed_days: f64,
    /// Outside conditions used for this step.
    pub external: ExternalConditions,
    pub concrete: ConcreteSnapshot,
    pub air: AirSnapshot,
    /// Cell levels in role order: concrete sensor, air sensor, pump, heater (%).
    pub battery_levels: [f64; CELL_COUNT],
    pub cells_alive: usize,
    pub pump_on: bool,
    /// Pump runtime left after this step (minutes).
    pub pump_time_remaining: f64,
    pub pump_intensity: f64,
    pub heater_on: bool,
    pub heater_target: f64,
    pub water_temperature: f64,
    /// Reservoir level (%).
    pub water_level: f64,
    /// Whether the documents for this step were written.
    pub persisted: bool,
}

impl fmt::Display for StepResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{:>4} {} | out {:>5.1}°C {:>4.1}% | slab {:>5.2}°C {:>6.2}% | \
             air {:>5.2}°C {:>5.2}% | pump={} ({:.0} min) heater={} | \
             water {:.1}°C {:.1}% | cells {}/{}",
            self.step,
            self.timestamp.format("%Y-%m-%d %H:%M"),
            self.external.temperature,
            self.external.humidity,
            self.concrete.temperature,
            self.concrete.humidity,
            self.air.temperature,
            self.air.humidity,
            on_off(self.pump_on),
            self.pump_time_remaining,
            on_off(self.heater_on),
            self.water_temperature,
            self.water_level,
            self.cells_alive,
            CELL_COUNT,
        )
    }
}

fn on_off(on: bool) -> &'static str {
    if on { "on" } else { "off" }
}


#[cfg(test)]
mod tests {
    use super::fixtures::sample_step;

    #[test]
    fn display_does_not_panic() {
        let s = format!("{}", sample_step(3));
        assert!(s.contains("#   3"));
        assert!(s.contains("pump=off"));
        assert!(s.contains("cells 4/4"));
    }
}
