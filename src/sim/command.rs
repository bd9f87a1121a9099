//! Typed actuator commands.
//!
//! Commands are read once per step from the persisted command document and
//! validated here, so the physics code only ever sees these records.

use crate::devices::battery::CellRole;

/// Heater target used when no command document is available (°C).
pub const DEFAULT_HEATER_TARGET: f64 = 25.0;

/// Pump request for this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpCommand {
    pub on: bool,
    /// Requested runtime when starting (minutes, never negative).
    pub runtime_minutes: f64,
}

impl Default for PumpCommand {
    fn default() -> Self {
        Self {
            on: false,
            runtime_minutes: 0.0,
        }
    }
}

/// Heater request for this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterCommand {
    pub on: bool,
    pub target_temperature: f64,
}

impl Default for HeaterCommand {
    fn default() -> Self {
        Self {
            on: false,
            target_temperature: DEFAULT_HEATER_TARGET,
        }
    }
}

/// Both actuator requests for one step. `Default` is everything off.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ActuatorCommands {
    pub pump: PumpCommand,
    pub heater: HeaterCommand,
}

impl ActuatorCommands {
    /// Builds commands from the raw document fields.
    ///
    /// A status of exactly 1 means on. Negative runtimes become 0 and a
    /// non-finite heater target falls back to the default target.
    pub fn from_fields(
        pump_status: i64,
        runtime_minutes: f64,
        heater_status: i64,
        target_temperature: f64,
    ) -> Self {
        let runtime_minutes = if runtime_minutes.is_finite() {
            runtime_minutes.max(0.0)
        } else {
            0.0
        };
        let target_temperature = if target_temperature.is_finite() {
            target_temperature
        } else {
            DEFAULT_HEATER_TARGET
        };

        Self {
            pump: PumpCommand {
                on: pump_status == 1,
                runtime_minutes,
            },
            heater: HeaterCommand {
                on: heater_status == 1,
                target_temperature,
            },
        }
    }

    /// Actuator battery cells whose actuator is commanded on.
    pub fn active_cells(&self) -> Vec<CellRole> {
        let mut cells = Vec::with_capacity(2);
        if self.pump.on {
            cells.push(CellRole::Pump);
        }
        if self.heater.on {
            cells.push(CellRole::Heater);
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_all_off() {
        let cmd = ActuatorCommands::default();
        assert!(!cmd.pump.on);
        assert!(!cmd.heater.on);
        assert_eq!(cmd.heater.target_temperature, 25.0);
        assert!(cmd.active_cells().is_empty());
    }

    #[test]
    fn status_one_means_on() {
        let cmd = ActuatorCommands::from_fields(1, 30.0, 1, 40.0);
        assert!(cmd.pump.on);
        assert_eq!(cmd.pump.runtime_minutes, 30.0);
        assert!(cmd.heater.on);
        assert_eq!(cmd.active_cells(), vec![CellRole::Pump, CellRole::Heater]);

        let odd = ActuatorCommands::from_fields(2, 30.0, -1, 40.0);
        assert!(!odd.pump.on);
        assert!(!odd.heater.on);
    }

    #[test]
    fn bad_numbers_are_sanitised() {
        let cmd = ActuatorCommands::from_fields(1, -15.0, 1, f64::NAN);
        assert_eq!(cmd.pump.runtime_minutes, 0.0);
        assert_eq!(cmd.heater.target_temperature, DEFAULT_HEATER_TARGET);
    }

    #[test]
    fn only_heater_active() {
        let cmd = ActuatorCommands::from_fields(0, 0.0, 1, 30.0);
        assert_eq!(cmd.active_cells(), vec![CellRole::Heater]);
    }
}
