use crate::devices::types::{HeaterEffect, Model, PumpEffect, StepContext};
use crate::sim::command::{ActuatorCommands, HeaterCommand, PumpCommand};

const PUMP_COOLING_EFFICIENCY: f64 = 0.8;
const PUMP_HUMIDIFYING_EFFICIENCY: f64 = 0.9;
const HEATER_EFFICIENCY: f64 = 0.85;

const PUMP_BASE_COOLING: f64 = 5.0;
const PUMP_BASE_HUMIDIFYING: f64 = 20.0;
const HEATER_BASE_HEATING: f64 = 10.0;

/// Water colder than this cools 1.5× better.
const COLD_WATER_THRESHOLD: f64 = 20.0;
const COLD_WATER_BOOST: f64 = 1.5;

/// Electrical draw of a running pump (W).
const PUMP_POWER_W: f64 = 200.0;

/// Background top-up stops at this reservoir level (%).
const REFILL_TARGET_PCT: f64 = 95.0;

const INITIAL_WATER_TEMPERATURE: f64 = 25.0;
const INITIAL_HEATER_TARGET: f64 = 25.0;

/// Pump run state. Running only while runtime is left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpState {
    Off,
    Running { remaining_minutes: f64 },
}

/// Snapshot of the controller for reporting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActuatorState {
    pub pump_on: bool,
    pub pump_time_remaining_minutes: f64,
    pub pump_intensity: f64,
    pub heater_on: bool,
    pub heater_target_temperature: f64,
    pub heater_intensity: f64,
    pub water_temperature: f64,
    pub water_level_pct: f64,
}

/// Instantaneous electrical draw of the actuators.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyConsumption {
    pub pump_w: f64,
    pub heater_w: f64,
}

impl EnergyConsumption {
    pub fn total_w(&self) -> f64 {
        self.pump_w + self.heater_w
    }
}

/// Pump, heater and the water reservoir they share.
///
/// The pump draws from the reservoir for a commanded runtime; the heater
/// warms the reservoir toward a commanded target. Independently of any
/// command the water relaxes toward ambient temperature and is topped up
/// slowly. The controller never reads slab or air state; it only publishes
/// [`PumpEffect`] and [`HeaterEffect`] snapshots.
#[derive(Debug, Clone)]
pub struct ActuatorController {
    pump: PumpState,
    pump_intensity: f64,

    heater_on: bool,
    heater_target: f64,
    heater_intensity: f64,

    water_temperature: f64,
    water_level_pct: f64,

    /// Pump flow at full intensity (L/min).
    pub pump_max_flow_lpm: f64,

    /// Reservoir capacity (L).
    pub reservoir_capacity_l: f64,

    /// Heater power at full intensity (W).
    pub heater_max_power_w: f64,

    /// Temperature the water relaxes toward (°C).
    pub ambient_temperature: f64,

    /// Newton cooling constant (per minute).
    pub water_cooling_rate_per_minute: f64,

    /// Background refill (% of capacity per hour).
    pub refill_per_hour: f64,
}

impl ActuatorController {
    /// Creates a controller with both actuators off and a full reservoir.
    ///
    /// # Panics
    ///
    /// Panics if flow, capacity or power is not positive, or a rate is negative.
    pub fn new(
        pump_max_flow_lpm: f64,
        reservoir_capacity_l: f64,
        heater_max_power_w: f64,
        ambient_temperature: f64,
        water_cooling_rate_per_minute: f64,
        refill_per_hour: f64,
    ) -> Self {
        assert!(pump_max_flow_lpm > 0.0);
        assert!(reservoir_capacity_l > 0.0);
        assert!(heater_max_power_w > 0.0);
        assert!(water_cooling_rate_per_minute >= 0.0);
        assert!(refill_per_hour >= 0.0);

        Self {
            pump: PumpState::Off,
            pump_intensity: 1.0,
            heater_on: false,
            heater_target: INITIAL_HEATER_TARGET,
            heater_intensity: 0.0,
            water_temperature: INITIAL_WATER_TEMPERATURE,
            water_level_pct: 100.0,
            pump_max_flow_lpm,
            reservoir_capacity_l,
            heater_max_power_w,
            ambient_temperature,
            water_cooling_rate_per_minute,
            refill_per_hour,
        }
    }

    /// Applies this step's commands and advances the reservoir.
    pub fn update(&mut self, commands: &ActuatorCommands, context: &StepContext) {
        self.update_pump(&commands.pump, context.step_minutes);
        self.update_heater(&commands.heater, context.step_hours());
        self.update_water(context);
    }

    fn update_pump(&mut self, command: &PumpCommand, step_minutes: f64) {
        if !command.on {
            self.pump = PumpState::Off;
        } else if self.pump == PumpState::Off {
            self.pump = PumpState::Running {
                remaining_minutes: command.runtime_minutes,
            };
        }

        let runtime = match self.pump {
            PumpState::Running { remaining_minutes } if remaining_minutes > 0.0 => {
                let runtime = step_minutes.min(remaining_minutes);
                let left = remaining_minutes - runtime;
                self.pump = if left > 0.0 {
                    PumpState::Running {
                        remaining_minutes: left,
                    }
                } else {
                    PumpState::Off
                };
                runtime
            }
            _ => {
                self.pump = PumpState::Off;
                0.0
            }
        };

        self.pump_intensity = pump_intensity(self.water_level_pct);

        if runtime > 0.0 {
            let litres = self.pump_max_flow_lpm * self.pump_intensity * runtime;
            let consumed_pct = litres / self.reservoir_capacity_l * 100.0;
            self.water_level_pct = (self.water_level_pct - consumed_pct).max(0.0);
        }
    }

    fn update_heater(&mut self, command: &HeaterCommand, step_hours: f64) {
        self.heater_on = command.on;
        self.heater_target = command.target_temperature;
        self.heater_intensity = if self.heater_on {
            heater_intensity((self.heater_target - self.water_temperature).abs())
        } else {
            0.0
        };

        if self.heater_on && self.water_temperature < self.heater_target {
            // roughly 1 °C per hour per kW
            let rate_per_hour = self.heater_max_power_w * self.heater_intensity / 1000.0;
            let rise = rate_per_hour * step_hours * HEATER_EFFICIENCY;
            self.water_temperature = (self.water_temperature + rise).min(self.heater_target);
        }
    }

    fn update_water(&mut self, context: &StepContext) {
        let decay = (-self.water_cooling_rate_per_minute * context.step_minutes).exp();
        self.water_temperature =
            self.ambient_temperature + (self.water_temperature - self.ambient_temperature) * decay;

        if self.water_level_pct < REFILL_TARGET_PCT {
            let refill = self.refill_per_hour * context.step_hours();
            self.water_level_pct = (self.water_level_pct + refill).min(REFILL_TARGET_PCT);
        }
    }

    pub fn pump_state(&self) -> PumpState {
        self.pump
    }

    pub fn pump_on(&self) -> bool {
        matches!(self.pump, PumpState::Running { .. })
    }

    pub fn pump_time_remaining(&self) -> f64 {
        match self.pump {
            PumpState::Running { remaining_minutes } => remaining_minutes,
            PumpState::Off => 0.0,
        }
    }

    pub fn heater_on(&self) -> bool {
        self.heater_on
    }

    pub fn water_temperature(&self) -> f64 {
        self.water_temperature
    }

    pub fn water_level(&self) -> f64 {
        self.water_level_pct
    }

    pub fn pump_effect(&self) -> PumpEffect {
        if !self.pump_on() || self.pump_intensity <= 0.0 {
            return PumpEffect::idle(self.water_temperature);
        }

        let mut cooling = PUMP_BASE_COOLING * self.pump_intensity * PUMP_COOLING_EFFICIENCY;
        if self.water_temperature < COLD_WATER_THRESHOLD {
            cooling *= COLD_WATER_BOOST;
        }

        PumpEffect {
            active: true,
            intensity: self.pump_intensity,
            cooling_effect: cooling,
            humidifying_effect: PUMP_BASE_HUMIDIFYING
                * self.pump_intensity
                * PUMP_HUMIDIFYING_EFFICIENCY,
            water_temperature: self.water_temperature,
            flow_rate_lpm: self.pump_max_flow_lpm * self.pump_intensity,
        }
    }

    pub fn heater_effect(&self) -> HeaterEffect {
        if !self.heater_on {
            return HeaterEffect::idle(self.heater_target, self.water_temperature);
        }

        HeaterEffect {
            active: true,
            intensity: self.heater_intensity,
            heating_effect: HEATER_BASE_HEATING * self.heater_intensity * HEATER_EFFICIENCY,
            target_temperature: self.heater_target,
            water_temperature: self.water_temperature,
            power_w: self.heater_max_power_w * self.heater_intensity,
        }
    }

    pub fn state(&self) -> ActuatorState {
        ActuatorState {
            pump_on: self.pump_on(),
            pump_time_remaining_minutes: self.pump_time_remaining(),
            pump_intensity: self.pump_intensity,
            heater_on: self.heater_on,
            heater_target_temperature: self.heater_target,
            heater_intensity: self.heater_intensity,
            water_temperature: self.water_temperature,
            water_level_pct: self.water_level_pct,
        }
    }

    pub fn energy_consumption(&self) -> EnergyConsumption {
        EnergyConsumption {
            pump_w: if self.pump_on() { PUMP_POWER_W } else { 0.0 },
            heater_w: if self.heater_on {
                self.heater_max_power_w * self.heater_intensity
            } else {
                0.0
            },
        }
    }

    pub fn pump_status(&self) -> String {
        let remaining = self.pump_time_remaining();
        match self.pump_intensity {
            _ if !self.pump_on() => "off".to_string(),
            i if i > 0.8 => format!("full flow, {remaining:.0} min left"),
            i if i > 0.5 => format!("moderate flow, {remaining:.0} min left"),
            _ => format!("reduced flow, {remaining:.0} min left"),
        }
    }

    pub fn heater_status(&self) -> String {
        if !self.heater_on {
            "off".to_string()
        } else if self.water_temperature >= self.heater_target - 1.0 {
            format!("holding {:.0}°C", self.heater_target)
        } else {
            format!("heating to {:.0}°C", self.heater_target)
        }
    }

    pub fn water_status(&self) -> &'static str {
        match self.water_level_pct {
            l if l < 20.0 => "low",
            l if l < 50.0 => "moderate",
            _ => "sufficient",
        }
    }
}

impl Model for ActuatorController {
    fn reset(&mut self) {
        self.pump = PumpState::Off;
        self.pump_intensity = 1.0;
        self.heater_on = false;
        self.heater_target = INITIAL_HEATER_TARGET;
        self.heater_intensity = 0.0;
        self.water_temperature = INITIAL_WATER_TEMPERATURE;
        self.water_level_pct = 100.0;
    }

    fn model_type(&self) -> &'static str {
        "ActuatorController"
    }
}

/// Four-band pump intensity from the reservoir level (%).
pub fn pump_intensity(water_level_pct: f64) -> f64 {
    match water_level_pct {
        l if l <= 0.0 => 0.0,
        l if l < 20.0 => 0.3,
        l if l < 50.0 => 0.7,
        _ => 1.0,
    }
}

/// Four-band heater intensity from the gap to target (°C).
pub fn heater_intensity(gap: f64) -> f64 {
    match gap {
        g if g > 20.0 => 1.0,
        g if g > 10.0 => 0.8,
        g if g > 5.0 => 0.5,
        _ => 0.2,
    }
}
