//! Simulation engine that sequences the physical models through one step.

use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::devices::actuator::ActuatorController;
use crate::devices::air::AirLayer;
use crate::devices::battery::{BatteryBank, CellRole};
use crate::devices::concrete::ConcreteSlab;
use crate::devices::types::{ExternalConditions, Model, StepContext};
use crate::error::{SimError, StoreError};
use crate::io::documents::{BatteriesDocument, SensorDocument, Snapshot, TimeDocument};
use crate::io::store::StateStore;

use super::clock::SimulationClock;
use super::forcing::DiurnalForcing;
use super::types::StepResult;

/// Every stateful model, owned exclusively by the engine.
///
/// Models never see each other; the engine passes snapshots between them
/// in a fixed order.
#[derive(Debug, Clone)]
pub struct EngineState {
    pub clock: SimulationClock,
    pub battery: BatteryBank,
    pub actuators: ActuatorController,
    pub concrete: ConcreteSlab,
    pub air: AirLayer,
}

impl EngineState {
    fn fresh(config: &EngineConfig, clock: SimulationClock) -> Self {
        Self {
            clock,
            battery: config.battery_bank(),
            actuators: config.actuator_controller(),
            concrete: ConcreteSlab::new(),
            air: config.air_layer(),
        }
    }
}

/// Simulation engine owning the model state, the forcing and the store.
///
/// Generic over `S: StateStore` for static dispatch. Steps are synchronous
/// and must not overlap; callers drive them one at a time.
pub struct Engine<S: StateStore> {
    config: EngineConfig,
    state: EngineState,
    forcing: DiurnalForcing,
    bad_cells: Vec<CellRole>,
    store: S,
    steps: u64,
    last_external: Option<ExternalConditions>,
}

impl<S: StateStore> Engine<S> {
    /// Creates an engine at the configured origin with every model in its
    /// initial state. The store is not touched.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` reported by [`EngineConfig::validate`].
    pub fn new(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        if let Some(err) = config.validate().into_iter().next() {
            return Err(err);
        }
        let origin = config.origin()?;
        let forcing = config.forcing()?;
        let state = EngineState::fresh(&config, SimulationClock::new(origin));

        Ok(Self {
            config,
            state,
            forcing,
            bad_cells: Vec::new(),
            store,
            steps: 0,
            last_external: None,
        })
    }

    /// Creates an engine and restores whatever the store holds: current
    /// time, slab and air readings, and battery levels. Missing documents
    /// are then written with the restored values.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` for an invalid configuration. Store failures
    /// are logged, not returned.
    pub fn resume(config: EngineConfig, store: S) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config, store)?;
        let stored = engine.store.load_state();

        if stored.is_empty() {
            info!(origin = %engine.state.clock, "no saved state, starting fresh");
        }

        if let Some(time) = &stored.time {
            match time.timestamp() {
                Ok(current) => {
                    let start = engine.state.clock.start();
                    engine.state.clock = SimulationClock::resume(start, current);
                }
                Err(e) => warn!(error = %e, "ignoring saved time"),
            }
        }
        if let Some(doc) = stored.concrete {
            engine.state.concrete = ConcreteSlab::with_state(doc.temperature, doc.humidity);
            engine
                .state
                .battery
                .restore(CellRole::ConcreteSensor, doc.battery_level);
        }
        if let Some(doc) = stored.air {
            let mut air = AirLayer::with_state(doc.temperature, doc.humidity);
            air.thermal_responsiveness = engine.config.air.thermal_responsiveness;
            engine.state.air = air;
            engine.state.battery.restore(CellRole::AirSensor, doc.battery_level);
        }
        if let Some(doc) = stored.batteries {
            engine.state.battery.restore(CellRole::Pump, doc.pump_battery);
            engine.state.battery.restore(CellRole::Heater, doc.heater_battery);
        }

        if !stored.is_empty() {
            info!(
                current = %engine.state.clock,
                elapsed_days = engine.state.clock.elapsed_days(),
                "resumed saved state"
            );
        }

        let initial = engine.snapshot();
        if let Err(e) = engine.store.create_initial(&initial) {
            warn!(error = %e, "could not create initial documents");
        }
        Ok(engine)
    }

    /// Advances by the configured step size.
    ///
    /// # Errors
    ///
    /// See [`step_by`](Self::step_by).
    pub fn step(&mut self) -> Result<StepResult, SimError> {
        self.step_by(self.config.simulation.step_minutes)
    }

    /// Executes one step of `step_minutes` and returns the result.
    ///
    /// Order: clock advance, command load, battery drain, actuator update,
    /// external forcing, slab update, air update, persist. A persistence
    /// failure is logged and reported in [`StepResult::persisted`]; the
    /// in-memory step still completes.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidStep` for a negative step and
    /// `SimError::StepOverflow` for one the calendar cannot hold, before any
    /// state changes.
    pub fn step_by(&mut self, step_minutes: i64) -> Result<StepResult, SimError> {
        if step_minutes < 0 {
            return Err(SimError::InvalidStep(step_minutes));
        }

        let state = &mut self.state;
        state.clock.advance(step_minutes)?;
        let context = StepContext::at_day(step_minutes as f64, state.clock.elapsed_days());

        let commands = self.store.load_commands();

        state
            .battery
            .update(&context, &self.bad_cells, &commands.active_cells());
        state.actuators.update(&commands, &context);

        let external = self.forcing.at(&state.clock);

        let pump = state.actuators.pump_effect();
        let heater = state.actuators.heater_effect();
        state.concrete.update(&context, &external, &pump, &heater);

        let concrete = state.concrete.snapshot();
        state.air.update(&context, &external, &concrete, &pump);
        if self.config.air.apply_daily_cycle {
            state.air.apply_daily_cycle(state.clock.fractional_hour());
        }

        self.steps += 1;
        self.last_external = Some(external);

        let snapshot = self.snapshot();
        let persisted = match self.store.save_snapshot(&snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, step = self.steps, "state not persisted");
                false
            }
        };

        let result = self.result(external, step_minutes, persisted);
        debug!(
            step = result.step,
            time = %self.state.clock,
            concrete_temp = result.concrete.temperature,
            concrete_humidity = result.concrete.humidity,
            air_temp = result.air.temperature,
            air_humidity = result.air.humidity,
            pump_on = result.pump_on,
            heater_on = result.heater_on,
            "step complete"
        );
        Ok(result)
    }

    /// Executes `n` steps of the configured size.
    ///
    /// # Errors
    ///
    /// Stops at and returns the first step error.
    pub fn run(&mut self, n: usize) -> Result<Vec<StepResult>, SimError> {
        let mut results = Vec::with_capacity(n);
        for _ in 0..n {
            results.push(self.step()?);
        }
        Ok(results)
    }

    /// Full reset: every model back to its initial state, the clock back to
    /// the origin, the forcing back to the configured base conditions, all
    /// documents deleted and recreated.
    ///
    /// The in-memory reset always happens.
    ///
    /// # Errors
    ///
    /// Returns a `StoreError` if the documents cannot be cleared or rewritten.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        let origin = self.state.clock.start();
        let origin = self.config.origin().unwrap_or(origin);

        self.state.clock.reset(origin);
        if let Ok(forcing) = self.config.forcing() {
            self.forcing = forcing;
        }
        self.state.battery.reset();
        self.state.actuators.reset();
        self.state.concrete.reset();
        self.state.air.reset();
        self.bad_cells.clear();
        self.steps = 0;
        self.last_external = None;

        info!(origin = %self.state.clock, "engine reset");

        self.store.clear()?;
        let initial = self.snapshot();
        self.store.create_initial(&initial)
    }

    /// Replaces the noon base temperature and humidity of the forcing.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidCondition` for a non-finite value; the
    /// forcing is left unchanged.
    pub fn set_base_conditions(&mut self, temperature: f64, humidity: f64) -> Result<(), SimError> {
        self.forcing.set_base(temperature, humidity)?;
        info!(temperature, humidity, "base conditions changed");
        Ok(())
    }

    /// Flags a cell as bad (fast drain) or clears the flag.
    pub fn set_bad_cell(&mut self, role: CellRole, bad: bool) {
        self.bad_cells.retain(|r| *r != role);
        if bad {
            self.bad_cells.push(role);
        }
        debug!(cell = role.name(), bad, "battery flag changed");
    }

    /// Empties a cell immediately.
    pub fn kill_cell(&mut self, role: CellRole) {
        self.state.battery.kill(role);
        info!(cell = role.name(), "battery killed");
    }

    /// The documents describing the current state.
    pub fn snapshot(&self) -> Snapshot {
        let s = &self.state;
        Snapshot {
            time: TimeDocument::new(s.clock.current(), self.config.simulation.step_minutes),
            concrete: SensorDocument::rounded(
                s.concrete.temperature(),
                s.concrete.humidity(),
                s.battery.level(CellRole::ConcreteSensor),
            ),
            air: SensorDocument::rounded(
                s.air.temperature(),
                s.air.humidity(),
                s.battery.level(CellRole::AirSensor),
            ),
            batteries: BatteriesDocument::rounded(
                s.battery.level(CellRole::Pump),
                s.battery.level(CellRole::Heater),
            ),
        }
    }

    fn result(&self, external: ExternalConditions, step_minutes: i64, persisted: bool) -> StepResult {
        let s = &self.state;
        let actuators = s.actuators.state();
        StepResult {
            step: self.steps,
            timestamp: s.clock.current(),
            step_minutes,
            elapsed_days: s.clock.elapsed_days(),
            external,
            concrete: s.concrete.snapshot(),
            air: s.air.snapshot(),
            battery_levels: s.battery.levels(),
            cells_alive: s.battery.summary().alive_count,
            pump_on: actuators.pump_on,
            pump_time_remaining: actuators.pump_time_remaining_minutes,
            pump_intensity: actuators.pump_intensity,
            heater_on: actuators.heater_on,
            heater_target: actuators.heater_target_temperature,
            water_temperature: actuators.water_temperature,
            water_level: actuators.water_level_pct,
            persisted,
        }
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn clock(&self) -> &SimulationClock {
        &self.state.clock
    }

    pub fn battery(&self) -> &BatteryBank {
        &self.state.battery
    }

    pub fn actuators(&self) -> &ActuatorController {
        &self.state.actuators
    }

    pub fn concrete(&self) -> &ConcreteSlab {
        &self.state.concrete
    }

    pub fn air(&self) -> &AirLayer {
        &self.state.air
    }

    pub fn forcing(&self) -> &DiurnalForcing {
        &self.forcing
    }

    /// Outside conditions of the most recent step, if any.
    pub fn last_external(&self) -> Option<ExternalConditions> {
        self.last_external
    }

    pub fn bad_cells(&self) -> &[CellRole] {
        &self.bad_cells
    }

    /// Steps taken since creation or the last reset.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::documents::{ActuatorsDocument, PumpDocument};
    use crate::io::store::MemoryStore;

    fn engine() -> Engine<MemoryStore> {
        Engine::new(EngineConfig::baseline(), MemoryStore::new()).unwrap()
    }

    #[test]
    fn new_rejects_invalid_config() {
        let mut cfg = EngineConfig::baseline();
        cfg.simulation.step_minutes = -1;
        let err = Engine::new(cfg, MemoryStore::new()).err().unwrap();
        assert_eq!(err.field, "simulation.step_minutes");
    }

    #[test]
    fn negative_step_leaves_state_untouched() {
        let mut e = engine();
        let before = e.snapshot();
        assert_eq!(e.step_by(-10).unwrap_err(), SimError::InvalidStep(-10));
        assert_eq!(e.snapshot(), before);
        assert_eq!(e.steps(), 0);
        assert_eq!(e.store().saves, 0);
    }

    #[test]
    fn oversized_step_is_an_error_not_a_panic() {
        let mut e = engine();
        let before = e.snapshot();
        let huge = 1_000_000_000_000;
        assert_eq!(e.step_by(huge).unwrap_err(), SimError::StepOverflow(huge));
        assert_eq!(e.snapshot(), before);
        assert_eq!(e.steps(), 0);
        assert_eq!(e.store().saves, 0);
    }

    #[test]
    fn step_advances_clock_and_persists() {
        let mut e = engine();
        let r = e.step().unwrap();
        assert_eq!(r.step, 1);
        assert_eq!(e.clock().time_string(), "12:10:00");
        assert!(r.persisted);
        assert_eq!(e.store().saves, 1);
        assert_eq!(e.store().time.as_ref().map(|t| t.time.as_str()), Some("12:10:00"));
    }

    #[test]
    fn persistence_failure_does_not_stop_physics() {
        let mut e = engine();
        e.store_mut().fail_writes = true;
        let r = e.step().unwrap();
        assert!(!r.persisted);
        assert!(e.concrete().humidity() < 100.0);
        let r = e.step().unwrap();
        assert_eq!(r.step, 2);
    }

    #[test]
    fn commands_are_read_each_step() {
        let mut e = engine();
        e.store_mut().set_commands(ActuatorsDocument {
            pump: PumpDocument {
                status: 1,
                runtime_minutes: 20.0,
            },
            ..ActuatorsDocument::default()
        });
        let r = e.step().unwrap();
        assert!(r.pump_on);
        assert_eq!(r.pump_time_remaining, 10.0);
        // pump cell pays the actuator surcharge
        assert!(r.battery_levels[2] < r.battery_levels[0]);
    }

    #[test]
    fn bad_and_killed_cells() {
        let mut e = engine();
        e.set_bad_cell(CellRole::AirSensor, true);
        e.kill_cell(CellRole::Heater);
        let r = e.step().unwrap();
        assert!(r.battery_levels[1] < r.battery_levels[0]);
        assert_eq!(r.battery_levels[3], 0.0);
        assert_eq!(r.cells_alive, 3);

        e.set_bad_cell(CellRole::AirSensor, false);
        assert!(e.bad_cells().is_empty());
    }

    #[test]
    fn base_conditions_are_validated() {
        let mut e = engine();
        assert!(e.set_base_conditions(f64::NAN, 50.0).is_err());
        assert_eq!(e.forcing().base_temperature(), 25.0);
        e.set_base_conditions(30.0, 50.0).unwrap();
        assert_eq!(e.forcing().base_temperature(), 30.0);
    }

    #[test]
    fn reset_restores_origin_and_documents() {
        let mut e = engine();
        e.kill_cell(CellRole::Pump);
        e.run(12).unwrap();
        e.reset().unwrap();
        assert_eq!(e.steps(), 0);
        assert_eq!(e.clock().elapsed_days(), 0.0);
        assert_eq!(e.concrete().humidity(), 100.0);
        assert!(e.battery().is_alive(CellRole::Pump));
        let store = e.store();
        assert_eq!(store.concrete.map(|c| c.humidity), Some(100.0));
        assert_eq!(store.commands, Some(ActuatorsDocument::default()));
    }

    #[test]
    fn reset_restores_configured_base_conditions() {
        let mut e = engine();
        e.set_base_conditions(40.0, 20.0).unwrap();
        e.reset().unwrap();
        assert_eq!(e.forcing().base_temperature(), 25.0);
        assert_eq!(e.forcing().base_humidity(), 60.0);
        assert_eq!(e.forcing(), &e.config().forcing().unwrap());
    }

    #[test]
    fn resume_restores_saved_state() {
        let mut first = engine();
        first.kill_cell(CellRole::Heater);
        first.run(6).unwrap();
        let saved = first.snapshot();
        let store = first.store().clone();

        let resumed = Engine::resume(EngineConfig::baseline(), store).unwrap();
        assert_eq!(resumed.clock().current(), first.clock().current());
        assert_eq!(resumed.snapshot(), saved);
        assert!(!resumed.battery().is_alive(CellRole::Heater));
        assert_eq!(resumed.clock().start(), first.clock().start());
    }

    #[test]
    fn resume_on_empty_store_starts_fresh_and_creates_documents() {
        let e = Engine::resume(EngineConfig::baseline(), MemoryStore::new()).unwrap();
        assert_eq!(e.clock().elapsed_days(), 0.0);
        assert!(e.store().time.is_some());
        assert!(e.store().commands.is_some());
    }
}
