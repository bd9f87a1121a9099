//! TOML-based engine configuration and preset definitions.

use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::devices::actuator::ActuatorController;
use crate::devices::air::AirLayer;
use crate::devices::battery::BatteryBank;
use crate::sim::clock::parse_timestamp;
use crate::sim::forcing::DiurnalForcing;

/// Top-level engine configuration parsed from TOML.
///
/// All fields have defaults matching the baseline scenario. Load from
/// TOML with [`EngineConfig::from_toml_file`] or use
/// [`EngineConfig::baseline`] for the built-in default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Step timing, origin and output location.
    #[serde(default)]
    pub simulation: SimulationConfig,
    /// Diurnal outside-condition forcing.
    #[serde(default)]
    pub external: ExternalConfig,
    /// Battery drain rates.
    #[serde(default)]
    pub battery: BatteryConfig,
    /// Pump, heater and reservoir parameters.
    #[serde(default)]
    pub actuators: ActuatorConfig,
    /// Air layer parameters.
    #[serde(default)]
    pub air: AirConfig,
}

/// Step timing and global parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Simulated minutes per step (must be >= 0).
    pub step_minutes: i64,
    /// Start and reset timestamp, `YYYY-MM-DDTHH:MM:SS`.
    pub origin: String,
    /// Real seconds between steps in continuous mode.
    pub interval_secs: f64,
    /// Directory holding the JSON documents.
    pub data_dir: String,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_minutes: 10,
            origin: "2025-05-05T12:00:00".to_string(),
            interval_secs: 1.0,
            data_dir: "SimData".to_string(),
        }
    }
}

/// Outside conditions at noon and their daily swing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExternalConfig {
    /// Base temperature (°C).
    pub base_temperature: f64,
    /// Base relative humidity (%).
    pub base_humidity: f64,
    pub temperature_amplitude: f64,
    pub humidity_amplitude: f64,
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            base_temperature: 25.0,
            base_humidity: 60.0,
            temperature_amplitude: 8.0,
            humidity_amplitude: 25.0,
        }
    }
}

/// Battery drain rates (% per hour).
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BatteryConfig {
    pub normal_drain_per_hour: f64,
    /// Applied instead of the normal rate to cells flagged bad.
    pub bad_drain_per_hour: f64,
    /// Added to an actuator cell while its actuator is commanded on.
    pub actuator_active_drain_per_hour: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            normal_drain_per_hour: 0.5,
            bad_drain_per_hour: 4.0,
            actuator_active_drain_per_hour: 2.0,
        }
    }
}

/// Pump, heater and reservoir parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ActuatorConfig {
    /// Pump flow at full intensity (L/min).
    pub pump_max_flow_lpm: f64,
    /// Reservoir size (L).
    pub reservoir_capacity_l: f64,
    /// Heater electrical power (W).
    pub heater_max_power_w: f64,
    /// Temperature the water cools toward (°C).
    pub ambient_temperature: f64,
    /// Newton cooling constant (per minute).
    pub water_cooling_rate_per_minute: f64,
    /// Background top-up (% of capacity per hour).
    pub refill_per_hour: f64,
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            pump_max_flow_lpm: 10.0,
            reservoir_capacity_l: 50.0,
            heater_max_power_w: 2000.0,
            ambient_temperature: 25.0,
            water_cooling_rate_per_minute: 0.02,
            refill_per_hour: 2.0,
        }
    }
}

/// Air layer parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AirConfig {
    pub thermal_responsiveness: f64,
    /// Apply the hour-of-day nudge after each air update.
    pub apply_daily_cycle: bool,
}

impl Default for AirConfig {
    fn default() -> Self {
        Self {
            thermal_responsiveness: 0.6,
            apply_daily_cycle: false,
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"simulation.step_minutes"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl EngineConfig {
    /// Returns the baseline scenario: mild spring day, 10-minute steps.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Returns the heatwave preset: hot, dry air that stresses the slab.
    pub fn heatwave() -> Self {
        Self {
            external: ExternalConfig {
                base_temperature: 38.0,
                base_humidity: 30.0,
                ..ExternalConfig::default()
            },
            actuators: ActuatorConfig {
                ambient_temperature: 32.0,
                ..ActuatorConfig::default()
            },
            ..Self::default()
        }
    }

    /// Returns the cold-snap preset: near-freezing, humid air.
    pub fn cold_snap() -> Self {
        Self {
            external: ExternalConfig {
                base_temperature: 4.0,
                base_humidity: 80.0,
                temperature_amplitude: 5.0,
                ..ExternalConfig::default()
            },
            actuators: ActuatorConfig {
                ambient_temperature: 8.0,
                ..ActuatorConfig::default()
            },
            ..Self::default()
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "heatwave", "cold_snap"];

    /// Loads a configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "heatwave" => Ok(Self::heatwave()),
            "cold_snap" => Ok(Self::cold_snap()),
            _ => Err(ConfigError::new(
                "preset",
                format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            )),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let s = &self.simulation;
        if s.step_minutes < 0 {
            errors.push(ConfigError::new("simulation.step_minutes", "must be >= 0"));
        }
        if parse_timestamp(&s.origin).is_err() {
            errors.push(ConfigError::new(
                "simulation.origin",
                format!("must be YYYY-MM-DDTHH:MM:SS, got \"{}\"", s.origin),
            ));
        }
        if !(s.interval_secs.is_finite() && s.interval_secs >= 0.0) {
            errors.push(ConfigError::new("simulation.interval_secs", "must be >= 0"));
        }

        let e = &self.external;
        for (field, value) in [
            ("external.base_temperature", e.base_temperature),
            ("external.base_humidity", e.base_humidity),
        ] {
            if !value.is_finite() {
                errors.push(ConfigError::new(field, "must be a finite number"));
            }
        }
        if !(0.0..=100.0).contains(&e.base_humidity) {
            errors.push(ConfigError::new("external.base_humidity", "must be in [0, 100]"));
        }
        non_negative(&mut errors, "external.temperature_amplitude", e.temperature_amplitude);
        non_negative(&mut errors, "external.humidity_amplitude", e.humidity_amplitude);

        let b = &self.battery;
        non_negative(&mut errors, "battery.normal_drain_per_hour", b.normal_drain_per_hour);
        non_negative(&mut errors, "battery.bad_drain_per_hour", b.bad_drain_per_hour);
        non_negative(
            &mut errors,
            "battery.actuator_active_drain_per_hour",
            b.actuator_active_drain_per_hour,
        );

        let a = &self.actuators;
        positive(&mut errors, "actuators.pump_max_flow_lpm", a.pump_max_flow_lpm);
        positive(&mut errors, "actuators.reservoir_capacity_l", a.reservoir_capacity_l);
        positive(&mut errors, "actuators.heater_max_power_w", a.heater_max_power_w);
        if !a.ambient_temperature.is_finite() {
            errors.push(ConfigError::new(
                "actuators.ambient_temperature",
                "must be a finite number",
            ));
        }
        non_negative(
            &mut errors,
            "actuators.water_cooling_rate_per_minute",
            a.water_cooling_rate_per_minute,
        );
        non_negative(&mut errors, "actuators.refill_per_hour", a.refill_per_hour);

        non_negative(
            &mut errors,
            "air.thermal_responsiveness",
            self.air.thermal_responsiveness,
        );

        errors
    }

    /// Parsed `simulation.origin`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the origin is malformed.
    pub fn origin(&self) -> Result<NaiveDateTime, ConfigError> {
        parse_timestamp(&self.simulation.origin)
            .map_err(|e| ConfigError::new("simulation.origin", e.to_string()))
    }

    /// # Errors
    ///
    /// Returns a `ConfigError` if a forcing value is not finite.
    pub fn forcing(&self) -> Result<DiurnalForcing, ConfigError> {
        let e = &self.external;
        DiurnalForcing::new(
            e.base_temperature,
            e.base_humidity,
            e.temperature_amplitude,
            e.humidity_amplitude,
        )
        .map_err(|err| ConfigError::new("external", err.to_string()))
    }

    /// Builds a fully charged battery bank.
    ///
    /// # Panics
    ///
    /// Panics if a drain rate is negative; call [`validate`](Self::validate) first.
    pub fn battery_bank(&self) -> BatteryBank {
        let b = &self.battery;
        BatteryBank::new(
            b.normal_drain_per_hour,
            b.bad_drain_per_hour,
            b.actuator_active_drain_per_hour,
        )
    }

    pub fn actuator_controller(&self) -> ActuatorController {
        let a = &self.actuators;
        ActuatorController::new(
            a.pump_max_flow_lpm,
            a.reservoir_capacity_l,
            a.heater_max_power_w,
            a.ambient_temperature,
            a.water_cooling_rate_per_minute,
            a.refill_per_hour,
        )
    }

    pub fn air_layer(&self) -> AirLayer {
        AirLayer::new(self.air.thermal_responsiveness)
    }
}

fn non_negative(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value >= 0.0) {
        errors.push(ConfigError::new(field, "must be >= 0"));
    }
}

fn positive(errors: &mut Vec<ConfigError>, field: &str, value: f64) {
    if !(value.is_finite() && value > 0.0) {
        errors.push(ConfigError::new(field, "must be > 0"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_preset_valid() {
        let cfg = EngineConfig::baseline();
        let errors = cfg.validate();
        assert!(errors.is_empty(), "baseline should be valid: {errors:?}");
    }

    #[test]
    fn from_preset_unknown() {
        let err = EngineConfig::from_preset("nonexistent");
        assert!(err.is_err());
        let e = err.unwrap_err();
        assert!(e.message.contains("unknown preset"));
        assert!(e.to_string().starts_with("config error: preset"));
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[simulation]
step_minutes = 30
origin = "2025-06-01T08:00:00"
interval_secs = 0.5
data_dir = "out"

[external]
base_temperature = 30.0
base_humidity = 45.0
temperature_amplitude = 6.0
humidity_amplitude = 20.0

[battery]
normal_drain_per_hour = 0.25
bad_drain_per_hour = 5.0
actuator_active_drain_per_hour = 1.0

[actuators]
pump_max_flow_lpm = 12.0
reservoir_capacity_l = 80.0
heater_max_power_w = 1500.0
ambient_temperature = 22.0
water_cooling_rate_per_minute = 0.01
refill_per_hour = 3.0

[air]
thermal_responsiveness = 0.4
apply_daily_cycle = true
"#;
        let cfg = EngineConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.simulation.step_minutes), Some(30));
        assert_eq!(cfg.as_ref().map(|c| &*c.simulation.data_dir), Some("out"));
        assert_eq!(cfg.as_ref().map(|c| c.air.apply_daily_cycle), Some(true));
        assert!(cfg.map(|c| c.validate().is_empty()).unwrap_or(false));
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[simulation]
step_minutes = 10
bogus_field = true
"#;
        assert!(EngineConfig::from_toml_str(toml).is_err());
        assert!(EngineConfig::from_toml_str("[weather]\nrain = 1\n").is_err());
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[external]
base_temperature = 31.0
"#;
        let cfg = EngineConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.external.base_temperature, 31.0);
        assert_eq!(cfg.external.base_humidity, 60.0);
        assert_eq!(cfg.simulation.step_minutes, 10);
        assert_eq!(cfg.actuators.reservoir_capacity_l, 50.0);
    }

    #[test]
    fn validation_catches_negative_step() {
        let mut cfg = EngineConfig::baseline();
        cfg.simulation.step_minutes = -10;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "simulation.step_minutes"));
    }

    #[test]
    fn validation_catches_bad_origin() {
        let mut cfg = EngineConfig::baseline();
        cfg.simulation.origin = "yesterday".to_string();
        assert!(cfg.validate().iter().any(|e| e.field == "simulation.origin"));
        assert!(cfg.origin().is_err());
    }

    #[test]
    fn validation_catches_non_finite_conditions() {
        let mut cfg = EngineConfig::baseline();
        cfg.external.base_temperature = f64::NAN;
        cfg.external.base_humidity = 140.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "external.base_temperature"));
        assert!(errors.iter().any(|e| e.field == "external.base_humidity"));
        assert!(cfg.forcing().is_err());
    }

    #[test]
    fn validation_catches_empty_reservoir() {
        let mut cfg = EngineConfig::baseline();
        cfg.actuators.reservoir_capacity_l = 0.0;
        cfg.battery.bad_drain_per_hour = -1.0;
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "actuators.reservoir_capacity_l"));
        assert!(errors.iter().any(|e| e.field == "battery.bad_drain_per_hour"));
    }

    #[test]
    fn all_presets_are_valid() {
        for name in EngineConfig::PRESETS {
            let cfg = EngineConfig::from_preset(name);
            assert!(cfg.is_ok(), "preset \"{name}\" should load");
            let errors = cfg.as_ref().map(|c| c.validate()).unwrap_or_default();
            assert!(
                errors.is_empty(),
                "preset \"{name}\" should be valid: {errors:?}"
            );
        }
    }

    #[test]
    fn weather_presets_bracket_baseline() {
        let base = EngineConfig::baseline();
        let hot = EngineConfig::heatwave();
        let cold = EngineConfig::cold_snap();
        assert!(hot.external.base_temperature > base.external.base_temperature);
        assert!(hot.external.base_humidity < base.external.base_humidity);
        assert!(cold.external.base_temperature < base.external.base_temperature);
        assert!(cold.external.base_humidity > base.external.base_humidity);
    }

    #[test]
    fn builders_use_config_values() {
        let mut cfg = EngineConfig::baseline();
        cfg.battery.normal_drain_per_hour = 1.5;
        cfg.air.thermal_responsiveness = 0.3;
        assert_eq!(cfg.battery_bank().normal_drain_per_hour, 1.5);
        assert_eq!(cfg.air_layer().thermal_responsiveness, 0.3);
        assert_eq!(cfg.forcing().unwrap().base_temperature(), 25.0);
        assert_eq!(cfg.origin().unwrap().to_string(), "2025-05-05 12:00:00");
    }
}
