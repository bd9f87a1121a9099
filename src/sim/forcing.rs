//! Diurnal external-condition forcing.

use std::f64::consts::PI;

use crate::devices::types::ExternalConditions;
use crate::error::SimError;

use super::clock::SimulationClock;

pub const MIN_EXTERNAL_HUMIDITY: f64 = 15.0;
pub const MAX_EXTERNAL_HUMIDITY: f64 = 95.0;

/// Outside temperature and humidity over a 24-hour cycle.
///
/// Temperature peaks at noon at `base_temperature + temperature_amplitude`;
/// humidity runs in opposite phase and is kept within 15 to 95 %.
///
/// # Examples
///
/// ```
/// use slab_sim::sim::forcing::DiurnalForcing;
///
/// let forcing = DiurnalForcing::new(25.0, 60.0, 8.0, 25.0).unwrap();
/// let noon = forcing.at_hour(12.0);
/// assert_eq!(noon.temperature, 33.0);
/// assert_eq!(noon.humidity, 35.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiurnalForcing {
    base_temperature: f64,
    base_humidity: f64,
    /// Half the daily temperature swing (°C).
    pub temperature_amplitude: f64,
    /// Half the daily humidity swing (%).
    pub humidity_amplitude: f64,
}

impl DiurnalForcing {
    /// # Errors
    ///
    /// Returns `SimError::InvalidCondition` if any input is not finite.
    pub fn new(
        base_temperature: f64,
        base_humidity: f64,
        temperature_amplitude: f64,
        humidity_amplitude: f64,
    ) -> Result<Self, SimError> {
        let mut forcing = Self {
            base_temperature: 0.0,
            base_humidity: 0.0,
            temperature_amplitude: finite("temperature_amplitude", temperature_amplitude)?,
            humidity_amplitude: finite("humidity_amplitude", humidity_amplitude)?,
        };
        forcing.set_base(base_temperature, base_humidity)?;
        Ok(forcing)
    }

    /// Replaces the base values. Leaves the forcing unchanged on error.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCondition` for a non-finite value.
    pub fn set_base(&mut self, temperature: f64, humidity: f64) -> Result<(), SimError> {
        let temperature = finite("base_temperature", temperature)?;
        let humidity = finite("base_humidity", humidity)?;
        self.base_temperature = temperature;
        self.base_humidity = humidity;
        Ok(())
    }

    pub fn base_temperature(&self) -> f64 {
        self.base_temperature
    }

    pub fn base_humidity(&self) -> f64 {
        self.base_humidity
    }

    /// Conditions at a fractional hour of the day.
    pub fn at_hour(&self, hour: f64) -> ExternalConditions {
        let wave = (2.0 * PI * (hour - 12.0) / 24.0).cos();
        ExternalConditions {
            temperature: self.base_temperature + self.temperature_amplitude * wave,
            humidity: (self.base_humidity - self.humidity_amplitude * wave)
                .clamp(MIN_EXTERNAL_HUMIDITY, MAX_EXTERNAL_HUMIDITY),
        }
    }

    /// Conditions at the clock's current time.
    pub fn at(&self, clock: &SimulationClock) -> ExternalConditions {
        self.at_hour(clock.fractional_hour())
    }
}

fn finite(field: &'static str, value: f64) -> Result<f64, SimError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(SimError::InvalidCondition { field, value })
    }
}
