//! Common types and traits shared by the physical models.
//!
//! Models never hold references into each other. Whatever one model needs
//! from another arrives as one of the plain snapshot records below.

/// Step timing passed to every model update.
///
/// # Fields
/// * `step_minutes` - Length of the step in minutes
/// * `elapsed_days` - Days since the simulation origin, after this step's advance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepContext {
    pub step_minutes: f64,
    pub elapsed_days: f64,
}

impl StepContext {
    /// Creates a context for a step of `step_minutes` at time zero.
    pub fn new(step_minutes: f64) -> Self {
        Self {
            step_minutes,
            elapsed_days: 0.0,
        }
    }

    /// Creates a context for a step ending `elapsed_days` after the origin.
    pub fn at_day(step_minutes: f64, elapsed_days: f64) -> Self {
        Self {
            step_minutes,
            elapsed_days,
        }
    }

    pub fn step_hours(&self) -> f64 {
        self.step_minutes / 60.0
    }
}

/// External air conditions around the slab for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternalConditions {
    /// Outside temperature (°C).
    pub temperature: f64,
    /// Outside relative humidity (%).
    pub humidity: f64,
}

/// What the pump does to the slab and air this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PumpEffect {
    pub active: bool,
    /// 0.0 to 1.0, from the reservoir level.
    pub intensity: f64,
    /// Cooling magnitude (°C), already scaled by intensity and efficiency.
    pub cooling_effect: f64,
    /// Humidifying magnitude (%), already scaled by intensity and efficiency.
    pub humidifying_effect: f64,
    pub water_temperature: f64,
    /// Water delivered per minute while running (L/min).
    pub flow_rate_lpm: f64,
}

impl PumpEffect {
    pub fn idle(water_temperature: f64) -> Self {
        Self {
            active: false,
            intensity: 0.0,
            cooling_effect: 0.0,
            humidifying_effect: 0.0,
            water_temperature,
            flow_rate_lpm: 0.0,
        }
    }
}

/// What the heater does to the slab this step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeaterEffect {
    pub active: bool,
    /// 0.0 to 1.0, from the gap between target and water temperature.
    pub intensity: f64,
    /// Heating magnitude (°C), already scaled by intensity and efficiency.
    pub heating_effect: f64,
    /// Commanded target temperature (°C).
    pub target_temperature: f64,
    pub water_temperature: f64,
    /// Electrical draw (W).
    pub power_w: f64,
}

impl HeaterEffect {
    pub fn idle(target_temperature: f64, water_temperature: f64) -> Self {
        Self {
            active: false,
            intensity: 0.0,
            heating_effect: 0.0,
            target_temperature,
            water_temperature,
            power_w: 0.0,
        }
    }
}

/// Read-only view of the slab handed to the air layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteSnapshot {
    pub temperature: f64,
    pub humidity: f64,
}

/// Read-only view of the air layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirSnapshot {
    pub temperature: f64,
    pub humidity: f64,
}

/// Trait implemented by every stateful model the engine owns.
///
/// Gives the engine one way to return all models to their initial state
/// on a full reset and to name them in logs.
pub trait Model {
    /// Returns the model to its initial state, keeping its parameters.
    fn reset(&mut self);

    /// Returns a human-readable model name.
    fn model_type(&self) -> &'static str;
}

/// Clamps `value` into `[min, max]`, mapping NaN to `min`.
pub(crate) fn clamp_finite(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() { min } else { value.clamp(min, max) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_hours_converts_minutes() {
        assert_eq!(StepContext::new(30.0).step_hours(), 0.5);
        assert_eq!(StepContext::at_day(90.0, 2.0).elapsed_days, 2.0);
    }

    #[test]
    fn clamp_finite_handles_nan_and_infinities() {
        assert_eq!(clamp_finite(f64::NAN, 10.0, 95.0), 10.0);
        assert_eq!(clamp_finite(f64::INFINITY, 10.0, 95.0), 95.0);
        assert_eq!(clamp_finite(f64::NEG_INFINITY, 10.0, 95.0), 10.0);
        assert_eq!(clamp_finite(42.0, 10.0, 95.0), 42.0);
    }

    #[test]
    fn idle_effects_carry_water_temperature() {
        let pump = PumpEffect::idle(18.0);
        assert!(!pump.active);
        assert_eq!(pump.water_temperature, 18.0);
        let heater = HeaterEffect::idle(30.0, 22.0);
        assert_eq!(heater.intensity, 0.0);
        assert_eq!(heater.target_temperature, 30.0);
    }
}
