//! Serde records for the persisted JSON documents.
//!
//! These are the interchange formats shared with the sensor emulators,
//! control backend and dashboard. Field names are fixed by those readers.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::sim::clock::join_date_time;
use crate::sim::command::{ActuatorCommands, DEFAULT_HEATER_TARGET};

/// `time` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeDocument {
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM:SS`.
    pub time: String,
    pub step_minutes: i64,
}

impl TimeDocument {
    pub fn new(timestamp: NaiveDateTime, step_minutes: i64) -> Self {
        Self {
            date: timestamp.format("%Y-%m-%d").to_string(),
            time: timestamp.format("%H:%M:%S").to_string(),
            step_minutes,
        }
    }

    /// # Errors
    ///
    /// Returns `SimError::InvalidTimestamp` if either field is malformed.
    pub fn timestamp(&self) -> Result<NaiveDateTime, SimError> {
        join_date_time(&self.date, &self.time)
    }
}

/// `concrete` and `air` documents: one sensor reading plus its battery.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorDocument {
    pub temperature: f64,
    pub humidity: f64,
    pub battery_level: f64,
}

impl SensorDocument {
    /// Builds a document with every value rounded to two decimals.
    pub fn rounded(temperature: f64, humidity: f64, battery_level: f64) -> Self {
        Self {
            temperature: round2(temperature),
            humidity: round2(humidity),
            battery_level: round2(battery_level),
        }
    }
}

/// `batteries` document for the two actuator cells.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteriesDocument {
    pub pump_battery: f64,
    pub heater_battery: f64,
}

impl BatteriesDocument {
    pub fn rounded(pump_battery: f64, heater_battery: f64) -> Self {
        Self {
            pump_battery: round2(pump_battery),
            heater_battery: round2(heater_battery),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpDocument {
    pub status: i64,
    pub runtime_minutes: f64,
}

impl Default for PumpDocument {
    fn default() -> Self {
        Self {
            status: 0,
            runtime_minutes: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaterDocument {
    pub status: i64,
    pub temperature: f64,
}

impl Default for HeaterDocument {
    fn default() -> Self {
        Self {
            status: 0,
            temperature: DEFAULT_HEATER_TARGET,
        }
    }
}

/// `actuators` document, written by the control backend.
///
/// Missing sections or fields take the all-off defaults.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorsDocument {
    pub pump: PumpDocument,
    pub heater: HeaterDocument,
}

impl ActuatorsDocument {
    pub fn to_commands(&self) -> ActuatorCommands {
        ActuatorCommands::from_fields(
            self.pump.status,
            self.pump.runtime_minutes,
            self.heater.status,
            self.heater.temperature,
        )
    }
}

/// All engine-written documents for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub time: TimeDocument,
    pub concrete: SensorDocument,
    pub air: SensorDocument,
    pub batteries: BatteriesDocument,
}

/// Whatever documents could be read back; missing or unreadable ones are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoredState {
    pub time: Option<TimeDocument>,
    pub concrete: Option<SensorDocument>,
    pub air: Option<SensorDocument>,
    pub batteries: Option<BatteriesDocument>,
}

impl StoredState {
    pub fn is_empty(&self) -> bool {
        self.time.is_none()
            && self.concrete.is_none()
            && self.air.is_none()
            && self.batteries.is_none()
    }
}

impl From<Snapshot> for StoredState {
    fn from(snapshot: Snapshot) -> Self {
        Self {
            time: Some(snapshot.time),
            concrete: Some(snapshot.concrete),
            air: Some(snapshot.air),
            batteries: Some(snapshot.batteries),
        }
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
