use crate::devices::types::{
    ConcreteSnapshot, ExternalConditions, HeaterEffect, Model, PumpEffect, StepContext,
    clamp_finite,
};

pub const MIN_TEMPERATURE: f64 = -10.0;
pub const MAX_TEMPERATURE: f64 = 60.0;
pub const MAX_HUMIDITY: f64 = 100.0;

const INITIAL_TEMPERATURE: f64 = 25.0;
const INITIAL_HUMIDITY: f64 = 100.0;

/// Temperature and moisture of the curing slab.
///
/// Temperature relaxes slowly toward the outside air (damped by thermal
/// mass), is pushed by the pump and heater, and gains a small hydration
/// heat term. Humidity follows an exponential drying curve over
/// `drying_duration_days`, faster when warm, and slows to zero as it nears
/// `final_humidity`.
#[derive(Debug, Clone)]
pub struct ConcreteSlab {
    temperature: f64,
    humidity: f64,

    /// Damping of the outside-temperature pull (< 1 slows the slab).
    pub thermal_mass: f64,

    /// Outside-temperature pull (fraction of the gap per minute).
    pub external_temp_influence: f64,

    /// Outside-humidity pull (fraction of the gap per hour).
    pub external_humidity_influence: f64,

    /// Cap on the outside-humidity pull (% per hour).
    pub external_humidity_cap_per_hour: f64,

    /// Pump cooling at full intensity (°C per hour).
    pub pump_cooling_per_hour: f64,

    /// Pump wetting at full intensity (% per hour).
    pub pump_humidity_per_hour: f64,

    /// Heater warming at full intensity (°C per hour).
    pub heater_warming_per_hour: f64,

    /// Heater drying at full intensity (% per hour).
    pub heater_drying_per_hour: f64,

    /// Length of the drying curve (days); no natural drying afterwards.
    pub drying_duration_days: f64,

    /// Drying rate on the day of the pour (% per hour).
    pub max_drying_rate_per_hour: f64,

    /// Humidity the slab dries toward and never drops below (%).
    pub final_humidity: f64,
}

impl Default for ConcreteSlab {
    fn default() -> Self {
        Self {
            temperature: INITIAL_TEMPERATURE,
            humidity: INITIAL_HUMIDITY,
            thermal_mass: 0.95,
            external_temp_influence: 0.01,
            external_humidity_influence: 0.005,
            external_humidity_cap_per_hour: 2.0,
            pump_cooling_per_hour: 4.0,
            pump_humidity_per_hour: 20.0,
            heater_warming_per_hour: 10.0,
            heater_drying_per_hour: 5.0,
            drying_duration_days: 7.0,
            max_drying_rate_per_hour: 15.0,
            final_humidity: 25.0,
        }
    }
}

impl ConcreteSlab {
    /// Fresh slab at pour: 25 °C, 100 % humidity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a persisted reading instead of the pour state.
    pub fn with_state(temperature: f64, humidity: f64) -> Self {
        let mut slab = Self::default();
        slab.temperature = temperature;
        slab.humidity = humidity;
        slab.clamp_state();
        slab
    }

    /// Advances the slab by one step.
    pub fn update(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        pump: &PumpEffect,
        heater: &HeaterEffect,
    ) {
        self.update_temperature(context, external, pump, heater);
        self.update_humidity(context, external, pump, heater);
        self.clamp_state();
    }

    fn update_temperature(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        pump: &PumpEffect,
        heater: &HeaterEffect,
    ) {
        let hours = context.step_hours();

        let pull = (self.external_temp_influence * context.step_minutes).min(1.0);
        let external_change = (external.temperature - self.temperature) * pull * self.thermal_mass;

        let pump_change = if pump.active {
            -self.pump_cooling_per_hour * pump.intensity * hours
        } else {
            0.0
        };

        let heater_change = if heater.active && heater.target_temperature > self.temperature {
            self.heater_warming_per_hour * heater.intensity * hours
        } else {
            0.0
        };

        let next = self.temperature + external_change + pump_change + heater_change;
        self.temperature = clamp_finite(next + hydration_heat(hours), MIN_TEMPERATURE, MAX_TEMPERATURE);
    }

    fn update_humidity(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        pump: &PumpEffect,
        heater: &HeaterEffect,
    ) {
        let hours = context.step_hours();

        let temp_factor = ((self.temperature - 10.0) / 30.0).max(0.5);
        let drying = self.drying_rate(context.elapsed_days) * hours * temp_factor;

        let cap = self.external_humidity_cap_per_hour * hours;
        let external_change = ((external.humidity - self.humidity)
            * self.external_humidity_influence
            * hours)
            .clamp(-cap, cap);

        let pump_change = if pump.active {
            self.pump_humidity_per_hour * pump.intensity * hours
        } else {
            0.0
        };

        let heater_change = if heater.active {
            -self.heater_drying_per_hour * heater.intensity * hours
        } else {
            0.0
        };

        self.humidity += -drying + external_change + pump_change + heater_change;
    }

    /// Natural drying rate (% per hour) at `elapsed_days`, before the
    /// temperature factor.
    ///
    /// `max_rate · exp(−k · days)` with `k = 2 / drying_duration_days`,
    /// scaled by the remaining distance to `final_humidity`.
    pub fn drying_rate(&self, elapsed_days: f64) -> f64 {
        if elapsed_days >= self.drying_duration_days {
            return 0.0;
        }
        let k = 2.0 / self.drying_duration_days;
        let curve = self.max_drying_rate_per_hour * (-k * elapsed_days.max(0.0)).exp();

        let remaining = ((self.humidity - self.final_humidity)
            / (INITIAL_HUMIDITY - self.final_humidity))
            .clamp(0.0, 1.0);

        curve * remaining
    }

    /// Sudden disturbance such as rain or wind, clamped like a normal step.
    pub fn apply_shock(&mut self, temperature_change: f64, humidity_change: f64) {
        self.temperature += temperature_change;
        self.humidity += humidity_change;
        self.clamp_state();
    }

    fn clamp_state(&mut self) {
        self.temperature = clamp_finite(self.temperature, MIN_TEMPERATURE, MAX_TEMPERATURE);
        self.humidity = clamp_finite(self.humidity, self.final_humidity, MAX_HUMIDITY);
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn snapshot(&self) -> ConcreteSnapshot {
        ConcreteSnapshot {
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }

    /// Curing progress in [0, 1] from dryness and a temperature factor that
    /// is best between 15 and 30 °C.
    pub fn curing_progress(&self) -> f64 {
        let dryness = ((90.0 - self.humidity) / (90.0 - self.final_humidity)).clamp(0.0, 1.0);

        let temp_factor = match self.temperature {
            t if (15.0..=30.0).contains(&t) => 1.0,
            t if t < 15.0 => (0.5 + t / 30.0).max(0.0),
            t => (1.0 - (t - 30.0) / 30.0).max(0.3),
        };

        dryness * temp_factor
    }

    /// Curing stage by humidity band.
    pub fn stage(&self) -> &'static str {
        match self.humidity {
            h if h > 80.0 => "very wet, initial phase",
            h if h > 60.0 => "moderately wet, drying",
            h if h > 40.0 => "dry, advanced phase",
            h if h > self.final_humidity => "very dry, nearly cured",
            _ => "fully dry",
        }
    }

    pub fn thermal_condition(&self) -> &'static str {
        match self.temperature {
            t if t < 10.0 => "cold, slow hardening",
            t if t < 20.0 => "moderate, normal hardening",
            t if t < 30.0 => "warm, accelerated hardening",
            t if t < 40.0 => "very warm, fast drying",
            _ => "too hot, risk of cracking",
        }
    }
}

impl Model for ConcreteSlab {
    fn reset(&mut self) {
        self.temperature = INITIAL_TEMPERATURE;
        self.humidity = INITIAL_HUMIDITY;
    }

    fn model_type(&self) -> &'static str {
        "ConcreteSlab"
    }
}

/// Early cement self-heating (°C) over a step of `hours`.
pub fn hydration_heat(hours: f64) -> f64 {
    0.5 * hours * (-0.1 * hours).exp()
}
