//! Shared test fixtures for integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use slab_sim::config::EngineConfig;
use slab_sim::io::documents::{ActuatorsDocument, HeaterDocument, PumpDocument};
use slab_sim::io::store::MemoryStore;
use slab_sim::sim::engine::Engine;

/// Baseline engine (origin 2025-05-05T12:00:00, 10-minute steps) on an
/// in-memory store.
pub fn baseline_engine() -> Engine<MemoryStore> {
    engine_with(EngineConfig::baseline())
}

pub fn engine_with(config: EngineConfig) -> Engine<MemoryStore> {
    Engine::new(config, MemoryStore::new()).expect("valid config")
}

/// Constant outside air at 25 °C and the slab's final humidity: no diurnal
/// swing and no pull away from the drying curve's end point.
pub fn steady_neutral_config() -> EngineConfig {
    let mut config = EngineConfig::baseline();
    config.external.base_temperature = 25.0;
    config.external.base_humidity = 25.0;
    config.external.temperature_amplitude = 0.0;
    config.external.humidity_amplitude = 0.0;
    config
}

pub fn pump_command(runtime_minutes: f64) -> ActuatorsDocument {
    ActuatorsDocument {
        pump: PumpDocument {
            status: 1,
            runtime_minutes,
        },
        ..ActuatorsDocument::default()
    }
}

pub fn heater_command(temperature: f64) -> ActuatorsDocument {
    ActuatorsDocument {
        heater: HeaterDocument {
            status: 1,
            temperature,
        },
        ..ActuatorsDocument::default()
    }
}

/// Fresh, empty directory under the system temp dir.
pub fn temp_data_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("slab-sim-it-{tag}-{}", std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}
