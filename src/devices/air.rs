use std::f64::consts::PI;

use crate::devices::types::{
    AirSnapshot, ConcreteSnapshot, ExternalConditions, Model, PumpEffect, StepContext,
    clamp_finite,
};

pub const MIN_TEMPERATURE: f64 = -20.0;
pub const MAX_TEMPERATURE: f64 = 50.0;
pub const MIN_HUMIDITY: f64 = 10.0;
pub const MAX_HUMIDITY: f64 = 95.0;

const INITIAL_TEMPERATURE: f64 = 25.0;
const INITIAL_HUMIDITY: f64 = 60.0;

const BASE_CIRCULATION: f64 = 0.2;

/// Share of the slab exchange rate available when the slab is drier than
/// the air. Applied on top of `concrete_influence_factor`.
const AIR_TO_SLAB_FACTOR: f64 = 0.3;

/// Exchange gradients between the air layer and the slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConcreteExchange {
    pub temperature_exchange: f64,
    pub humidity_exchange: f64,
    pub thermal_gradient: f64,
    pub humidity_gradient: f64,
}

/// Air movement over the slab.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circulation {
    pub strength: f64,
    /// True when the pump drives the flow.
    pub forced: bool,
    pub cooling_effect: f64,
    pub drying_effect: f64,
}

/// Boundary layer of air directly above the slab.
///
/// Reacts to the outside faster than the slab does and exchanges heat and
/// moisture with it. Slab-to-air moisture release is stronger than the air
/// drying the slab.
#[derive(Debug, Clone)]
pub struct AirLayer {
    temperature: f64,
    humidity: f64,

    /// Outside-temperature pull, scaled by 0.1 per minute.
    pub thermal_responsiveness: f64,
    /// Outside-humidity exchange per minute.
    pub humidity_exchange_rate: f64,
    pub concrete_influence_factor: f64,
    pub concrete_temp_transfer: f64,
    pub concrete_humidity_transfer: f64,
    /// Pump cooling at full intensity (°C per hour).
    pub pump_air_cooling: f64,
    /// Pump humidifying at full intensity (% per hour).
    pub pump_air_humidifying: f64,
    pub air_circulation_factor: f64,
    pub daily_temp_variation: f64,
    pub daily_humidity_variation: f64,
}

impl Default for AirLayer {
    fn default() -> Self {
        Self {
            temperature: INITIAL_TEMPERATURE,
            humidity: INITIAL_HUMIDITY,
            thermal_responsiveness: 0.6,
            humidity_exchange_rate: 0.015,
            concrete_influence_factor: 0.25,
            concrete_temp_transfer: 0.08,
            concrete_humidity_transfer: 0.04,
            pump_air_cooling: 1.5,
            pump_air_humidifying: 10.0,
            air_circulation_factor: 1.3,
            daily_temp_variation: 8.0,
            daily_humidity_variation: 20.0,
        }
    }
}

impl AirLayer {
    pub fn new(thermal_responsiveness: f64) -> Self {
        assert!(
            thermal_responsiveness >= 0.0,
            "thermal_responsiveness must be >= 0"
        );
        Self {
            thermal_responsiveness,
            ..Self::default()
        }
    }

    /// Starts from a persisted reading.
    pub fn with_state(temperature: f64, humidity: f64) -> Self {
        let mut air = Self::default();
        air.temperature = temperature;
        air.humidity = humidity;
        air.clamp_state();
        air
    }

    pub fn update(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        concrete: &ConcreteSnapshot,
        pump: &PumpEffect,
    ) {
        self.update_temperature(context, external, concrete, pump);
        self.update_humidity(context, external, concrete, pump);
        self.clamp_state();
    }

    fn update_temperature(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        concrete: &ConcreteSnapshot,
        pump: &PumpEffect,
    ) {
        let minutes = context.step_minutes;
        let hours = context.step_hours();

        let external_pull = (self.thermal_responsiveness * 0.1 * minutes).min(1.0);
        let external_change = (external.temperature - self.temperature) * external_pull;

        let diff = concrete.temperature - self.temperature;
        let transfer_intensity = (diff.abs() / 10.0).min(1.0);
        let concrete_pull = (self.concrete_temp_transfer
            * self.concrete_influence_factor
            * transfer_intensity
            * minutes)
            .min(1.0);
        let concrete_change = diff * concrete_pull;

        let pump_change = if pump.active {
            -self.pump_air_cooling * pump.intensity * hours * self.air_circulation_factor
        } else {
            0.0
        };

        let next = self.temperature + external_change + concrete_change + pump_change;
        self.temperature = clamp_finite(
            next + self.heat_island(hours),
            MIN_TEMPERATURE,
            MAX_TEMPERATURE,
        );
    }

    fn update_humidity(
        &mut self,
        context: &StepContext,
        external: &ExternalConditions,
        concrete: &ConcreteSnapshot,
        pump: &PumpEffect,
    ) {
        let minutes = context.step_minutes;
        let hours = context.step_hours();

        let external_pull = (self.humidity_exchange_rate * minutes).min(1.0);
        let external_change = (external.humidity - self.humidity) * external_pull;

        let diff = concrete.humidity - self.humidity;
        let transfer_intensity = (diff.abs() / 20.0).min(1.0);
        let concrete_pull = if diff > 0.0 {
            // slab releasing moisture
            let temp_boost = 1.0 + (self.temperature - 20.0).max(0.0) / 30.0;
            self.concrete_humidity_transfer
                * self.concrete_influence_factor
                * transfer_intensity
                * temp_boost
                * minutes
        } else {
            self.concrete_humidity_transfer
                * self.concrete_influence_factor
                * AIR_TO_SLAB_FACTOR
                * transfer_intensity
                * minutes
        };
        let concrete_change = diff * concrete_pull.min(1.0);

        let pump_change = if pump.active {
            self.pump_air_humidifying * pump.intensity * hours * self.air_circulation_factor
        } else {
            0.0
        };

        self.humidity += external_change + concrete_change + pump_change + self.evaporation(hours);
    }

    /// Self-reinforcing warming above 25 °C (°C over `hours`).
    fn heat_island(&self, hours: f64) -> f64 {
        if self.temperature > 25.0 {
            0.5 * hours * (1.0 + (self.temperature - 25.0) / 10.0).ln()
        } else {
            0.0
        }
    }

    /// Evaporative moisture loss when warm and humid (negative, % over `hours`).
    fn evaporation(&self, hours: f64) -> f64 {
        if self.temperature > 20.0 && self.humidity > 30.0 {
            -0.5 * hours * (self.temperature - 20.0) / 20.0 * (self.humidity / 100.0)
        } else {
            0.0
        }
    }

    /// Sinusoidal nudge keyed to the hour: warmer and drier through the day,
    /// cooler and wetter at night. Clamped like a normal update.
    pub fn apply_daily_cycle(&mut self, hour_of_day: f64) {
        let factor = ((hour_of_day - 6.0) * PI / 12.0).sin();
        self.temperature += self.daily_temp_variation * factor * 0.1;
        self.humidity -= self.daily_humidity_variation * factor * 0.1;
        self.clamp_state();
    }

    fn clamp_state(&mut self) {
        self.temperature = clamp_finite(self.temperature, MIN_TEMPERATURE, MAX_TEMPERATURE);
        self.humidity = clamp_finite(self.humidity, MIN_HUMIDITY, MAX_HUMIDITY);
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    pub fn snapshot(&self) -> AirSnapshot {
        AirSnapshot {
            temperature: self.temperature,
            humidity: self.humidity,
        }
    }

    /// 0.0 to 1.0; best at 22.5 °C and 50 %.
    pub fn comfort_index(&self) -> f64 {
        let temp_comfort = (1.0 - (self.temperature - 22.5).abs() / 22.5).max(0.0);
        let humidity_comfort = (1.0 - (self.humidity - 50.0).abs() / 50.0).max(0.0);
        (temp_comfort + humidity_comfort) / 2.0
    }

    pub fn air_quality(&self) -> &'static str {
        match self.comfort_index() {
            c if c > 0.8 => "excellent",
            c if c > 0.6 => "good",
            c if c > 0.4 => "moderate",
            c if c > 0.2 => "poor",
            _ => "very poor",
        }
    }

    pub fn microclimate(&self) -> &'static str {
        let (t, h) = (self.temperature, self.humidity);
        if t > 30.0 && h > 70.0 {
            "warm and humid"
        } else if t > 25.0 && h < 40.0 {
            "warm and dry"
        } else if t < 15.0 && h > 80.0 {
            "cold and humid, condensation possible"
        } else if (20.0..=25.0).contains(&t) && (40.0..=60.0).contains(&h) {
            "optimal"
        } else {
            "variable"
        }
    }

    pub fn exchange_with(&self, concrete: &ConcreteSnapshot) -> ConcreteExchange {
        let dt = concrete.temperature - self.temperature;
        let dh = concrete.humidity - self.humidity;
        ConcreteExchange {
            temperature_exchange: dt * self.concrete_temp_transfer,
            humidity_exchange: dh * self.concrete_humidity_transfer,
            thermal_gradient: dt.abs(),
            humidity_gradient: dh.abs(),
        }
    }

    pub fn circulation(&self, pump_active: bool) -> Circulation {
        let strength = if pump_active {
            BASE_CIRCULATION * self.air_circulation_factor
        } else {
            BASE_CIRCULATION
        };
        Circulation {
            strength,
            forced: pump_active,
            cooling_effect: strength * 2.0,
            drying_effect: strength * 3.0,
        }
    }
}

impl Model for AirLayer {
    fn reset(&mut self) {
        self.temperature = INITIAL_TEMPERATURE;
        self.humidity = INITIAL_HUMIDITY;
    }

    fn model_type(&self) -> &'static str {
        "AirLayer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outside(temperature: f64, humidity: f64) -> ExternalConditions {
        ExternalConditions {
            temperature,
            humidity,
        }
    }

    fn slab(temperature: f64, humidity: f64) -> ConcreteSnapshot {
        ConcreteSnapshot {
            temperature,
            humidity,
        }
    }

    fn pump_on() -> PumpEffect {
        PumpEffect {
            active: true,
            intensity: 1.0,
            ..PumpEffect::idle(25.0)
        }
    }

    #[test]
    fn initial_state() {
        let air = AirLayer::default();
        assert_eq!(air.temperature(), 25.0);
        assert_eq!(air.humidity(), 60.0);
    }

    #[test]
    fn no_change_when_everything_matches() {
        let mut air = AirLayer::with_state(20.0, 25.0);
        air.update(
            &StepContext::new(10.0),
            &outside(20.0, 25.0),
            &slab(20.0, 25.0),
            &PumpEffect::idle(25.0),
        );
        assert!((air.temperature() - 20.0).abs() < 1e-12);
        assert!((air.humidity() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn moves_toward_warmer_outside() {
        let mut air = AirLayer::with_state(20.0, 50.0);
        air.update(
            &StepContext::new(10.0),
            &outside(30.0, 50.0),
            &slab(20.0, 50.0),
            &PumpEffect::idle(25.0),
        );
        // 10 °C gap × 0.06/min × 10 min
        assert!((air.temperature() - 26.0).abs() < 1e-9);
    }

    #[test]
    fn pull_never_overshoots_on_long_steps() {
        let mut air = AirLayer::with_state(10.0, 50.0);
        air.update(
            &StepContext::new(240.0),
            &outside(20.0, 50.0),
            &slab(10.0, 50.0),
            &PumpEffect::idle(25.0),
        );
        assert!(air.temperature() <= 20.0 + 1e-9);
    }

    #[test]
    fn warm_slab_heats_and_wets_air() {
        let mut air = AirLayer::with_state(20.0, 40.0);
        air.update(
            &StepContext::new(10.0),
            &outside(20.0, 40.0),
            &slab(30.0, 90.0),
            &PumpEffect::idle(25.0),
        );
        assert!(air.temperature() > 20.0);
        assert!(air.humidity() > 40.0);
    }

    #[test]
    fn slab_release_is_faster_than_air_drying() {
        let ctx = StepContext::new(10.0);
        let idle = PumpEffect::idle(25.0);

        let mut wetted = AirLayer::with_state(20.0, 50.0);
        wetted.update(&ctx, &outside(20.0, 50.0), &slab(20.0, 70.0), &idle);
        let gain = wetted.humidity() - 50.0;

        let mut dried = AirLayer::with_state(20.0, 50.0);
        dried.update(&ctx, &outside(20.0, 50.0), &slab(20.0, 30.0), &idle);
        let loss = 50.0 - dried.humidity();

        assert!(gain > 0.0 && loss > 0.0);
        assert!(gain > loss);
    }

    #[test]
    fn drier_slab_takes_moisture_at_reduced_rate() {
        let air = AirLayer::default();
        let mut dried = AirLayer::with_state(20.0, 50.0);
        dried.update(
            &StepContext::new(10.0),
            &outside(20.0, 50.0),
            &slab(20.0, 30.0),
            &PumpEffect::idle(25.0),
        );
        // 20 % gap at full transfer intensity over 10 minutes
        let rate = air.concrete_humidity_transfer * air.concrete_influence_factor * 0.3 * 10.0;
        assert!((50.0 - dried.humidity() - 20.0 * rate).abs() < 1e-9);
    }

    #[test]
    fn pump_cools_and_humidifies_with_circulation() {
        let ctx = StepContext::new(60.0);
        let mut base = AirLayer::with_state(20.0, 30.0);
        let mut pumped = base.clone();
        base.update(&ctx, &outside(20.0, 30.0), &slab(20.0, 30.0), &PumpEffect::idle(25.0));
        pumped.update(&ctx, &outside(20.0, 30.0), &slab(20.0, 30.0), &pump_on());
        assert!((base.temperature() - pumped.temperature() - 1.95).abs() < 1e-9);
        assert!(pumped.humidity() > base.humidity());
    }

    #[test]
    fn heat_island_only_above_25() {
        let hot = AirLayer::with_state(35.0, 20.0);
        assert!((hot.heat_island(1.0) - 0.5 * 2.0_f64.ln()).abs() < 1e-12);
        let mild = AirLayer::with_state(24.0, 20.0);
        assert_eq!(mild.heat_island(1.0), 0.0);
    }

    #[test]
    fn evaporation_needs_warmth_and_moisture() {
        assert!(AirLayer::with_state(30.0, 80.0).evaporation(1.0) < 0.0);
        assert_eq!(AirLayer::with_state(15.0, 80.0).evaporation(1.0), 0.0);
        assert_eq!(AirLayer::with_state(30.0, 20.0).evaporation(1.0), 0.0);
    }

    #[test]
    fn extreme_inputs_stay_in_range() {
        let mut air = AirLayer::default();
        let ctx = StepContext::new(600.0);
        air.update(&ctx, &outside(1e9, 1e9), &slab(60.0, 100.0), &PumpEffect::idle(25.0));
        assert_eq!(air.temperature(), MAX_TEMPERATURE);
        assert_eq!(air.humidity(), MAX_HUMIDITY);
        air.update(&ctx, &outside(-1e9, -1e9), &slab(-10.0, 25.0), &pump_on());
        assert_eq!(air.temperature(), MIN_TEMPERATURE);
        assert_eq!(air.humidity(), MIN_HUMIDITY);
    }

    #[test]
    fn daily_cycle_peaks_midday() {
        let mut noon = AirLayer::with_state(20.0, 50.0);
        noon.apply_daily_cycle(12.0);
        assert!((noon.temperature() - 20.8).abs() < 1e-9);
        assert!((noon.humidity() - 48.0).abs() < 1e-9);

        let mut night = AirLayer::with_state(20.0, 50.0);
        night.apply_daily_cycle(0.0);
        assert!(night.temperature() < 20.0);
        assert!(night.humidity() > 50.0);
    }

    #[test]
    fn comfort_and_quality() {
        let ideal = AirLayer::with_state(22.5, 50.0);
        assert_eq!(ideal.comfort_index(), 1.0);
        assert_eq!(ideal.air_quality(), "excellent");
        assert_eq!(ideal.microclimate(), "optimal");

        let harsh = AirLayer::with_state(50.0, 95.0);
        assert!(harsh.comfort_index() < 0.2);
        assert_eq!(harsh.air_quality(), "very poor");
        assert_eq!(harsh.microclimate(), "warm and humid");
    }

    #[test]
    fn exchange_and_circulation() {
        let air = AirLayer::with_state(20.0, 50.0);
        let ex = air.exchange_with(&slab(30.0, 70.0));
        assert!((ex.temperature_exchange - 0.8).abs() < 1e-12);
        assert!((ex.humidity_exchange - 0.8).abs() < 1e-12);
        assert_eq!(ex.thermal_gradient, 10.0);

        let natural = air.circulation(false);
        let forced = air.circulation(true);
        assert!(!natural.forced && forced.forced);
        assert!((forced.strength - 0.26).abs() < 1e-12);
        assert!((natural.drying_effect - 0.6).abs() < 1e-12);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut air = AirLayer::with_state(40.0, 90.0);
        air.reset();
        assert_eq!(air.snapshot(), AirSnapshot { temperature: 25.0, humidity: 60.0 });
    }
}
