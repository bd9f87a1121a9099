use std::fmt;

use crate::devices::types::{Model, StepContext};
use crate::error::SimError;

/// Number of cells in the bank.
pub const CELL_COUNT: usize = 4;

/// Fixed role of each cell; the discriminant is the cell index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellRole {
    ConcreteSensor = 0,
    AirSensor = 1,
    Pump = 2,
    Heater = 3,
}

impl CellRole {
    pub const ALL: [CellRole; CELL_COUNT] = [
        CellRole::ConcreteSensor,
        CellRole::AirSensor,
        CellRole::Pump,
        CellRole::Heater,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn is_sensor(self) -> bool {
        matches!(self, CellRole::ConcreteSensor | CellRole::AirSensor)
    }

    pub fn is_actuator(self) -> bool {
        !self.is_sensor()
    }

    pub fn name(self) -> &'static str {
        match self {
            CellRole::ConcreteSensor => "concrete sensor",
            CellRole::AirSensor => "air sensor",
            CellRole::Pump => "pump",
            CellRole::Heater => "heater",
        }
    }
}

impl TryFrom<usize> for CellRole {
    type Error = SimError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        CellRole::ALL
            .get(index)
            .copied()
            .ok_or(SimError::UnknownCell(index))
    }
}

/// Charge state of one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryCell {
    /// Charge level (0.0 to 100.0 %).
    pub level: f64,
    /// False once the level has reached zero; never flips back.
    pub alive: bool,
}

impl BatteryCell {
    fn full() -> Self {
        Self {
            level: 100.0,
            alive: true,
        }
    }

    fn kill(&mut self) {
        self.level = 0.0;
        self.alive = false;
    }
}

/// Coarse health band of a cell, for dashboards and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Excellent,
    Good,
    Weak,
    Critical,
    VeryLow,
    Dead,
}

impl BatteryStatus {
    fn of(cell: &BatteryCell) -> Self {
        match cell.level {
            _ if !cell.alive => BatteryStatus::Dead,
            l if l > 75.0 => BatteryStatus::Excellent,
            l if l > 50.0 => BatteryStatus::Good,
            l if l > 25.0 => BatteryStatus::Weak,
            l if l > 10.0 => BatteryStatus::Critical,
            _ => BatteryStatus::VeryLow,
        }
    }
}

impl fmt::Display for BatteryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BatteryStatus::Excellent => "excellent",
            BatteryStatus::Good => "good",
            BatteryStatus::Weak => "weak",
            BatteryStatus::Critical => "critical",
            BatteryStatus::VeryLow => "very low",
            BatteryStatus::Dead => "dead",
        };
        f.write_str(s)
    }
}

/// Aggregate view over the whole bank.
#[derive(Debug, Clone, PartialEq)]
pub struct BankSummary {
    pub alive_count: usize,
    pub average_level: f64,
    /// Alive cells below 20 %.
    pub critical: Vec<CellRole>,
}

/// Four independent cells powering the two sensors and two actuators.
///
/// Each step drains a cell by `rate × step_hours`. The rate is the normal one
/// unless the operator flagged the cell as bad, and actuator cells pay an
/// extra rate while their actuator runs. Dead cells are skipped.
///
/// The functionality lookups are advisory outputs; the bank does not apply
/// them to any other model.
#[derive(Debug, Clone)]
pub struct BatteryBank {
    cells: [BatteryCell; CELL_COUNT],

    /// Drain for a healthy cell (% per hour).
    pub normal_drain_per_hour: f64,

    /// Drain for a cell flagged as bad (% per hour).
    pub bad_drain_per_hour: f64,

    /// Extra drain on an actuator cell while its actuator is active (% per hour).
    pub actuator_active_drain_per_hour: f64,
}

impl BatteryBank {
    /// Creates a bank of four full cells.
    ///
    /// # Panics
    ///
    /// Panics if any rate is negative.
    pub fn new(
        normal_drain_per_hour: f64,
        bad_drain_per_hour: f64,
        actuator_active_drain_per_hour: f64,
    ) -> Self {
        assert!(normal_drain_per_hour >= 0.0);
        assert!(bad_drain_per_hour >= 0.0);
        assert!(actuator_active_drain_per_hour >= 0.0);

        Self {
            cells: [BatteryCell::full(); CELL_COUNT],
            normal_drain_per_hour,
            bad_drain_per_hour,
            actuator_active_drain_per_hour,
        }
    }

    /// Drains every live cell for one step.
    ///
    /// # Arguments
    ///
    /// * `context` - Step timing
    /// * `bad` - Cells flagged as bad this step
    /// * `active` - Actuator cells whose actuator is active this step
    pub fn update(&mut self, context: &StepContext, bad: &[CellRole], active: &[CellRole]) {
        let step_hours = context.step_hours();

        for role in CellRole::ALL {
            let cell = &mut self.cells[role.index()];
            if !cell.alive {
                continue;
            }

            let mut rate = if bad.contains(&role) {
                self.bad_drain_per_hour
            } else {
                self.normal_drain_per_hour
            };
            if role.is_actuator() && active.contains(&role) {
                rate += self.actuator_active_drain_per_hour;
            }

            cell.level = (cell.level - rate * step_hours).max(0.0);
            if cell.level <= 0.0 {
                cell.kill();
            }
        }
    }

    /// Immediately empties a cell. Calling it again changes nothing.
    pub fn kill(&mut self, role: CellRole) {
        self.cells[role.index()].kill();
    }

    /// Restores a persisted level; a level of zero restores a dead cell.
    pub fn restore(&mut self, role: CellRole, level: f64) {
        let cell = &mut self.cells[role.index()];
        let level = if level.is_finite() {
            level.clamp(0.0, 100.0)
        } else {
            0.0
        };
        cell.level = level;
        cell.alive = level > 0.0;
    }

    pub fn cell(&self, role: CellRole) -> BatteryCell {
        self.cells[role.index()]
    }

    pub fn level(&self, role: CellRole) -> f64 {
        self.cells[role.index()].level
    }

    pub fn is_alive(&self, role: CellRole) -> bool {
        self.cells[role.index()].alive
    }

    /// All four levels in index order.
    pub fn levels(&self) -> [f64; CELL_COUNT] {
        self.cells.map(|c| c.level)
    }

    pub fn status(&self, role: CellRole) -> BatteryStatus {
        BatteryStatus::of(&self.cells[role.index()])
    }

    /// Capability multiplier for a sensor cell.
    ///
    /// Returns 0.0 for dead cells and for actuator roles.
    pub fn sensor_functionality(&self, role: CellRole) -> f64 {
        if !role.is_sensor() {
            return 0.0;
        }
        match self.cells[role.index()] {
            BatteryCell { alive: false, .. } => 0.0,
            BatteryCell { level, .. } if level > 20.0 => 1.0,
            BatteryCell { level, .. } if level > 10.0 => 0.8,
            BatteryCell { level, .. } if level > 5.0 => 0.5,
            _ => 0.2,
        }
    }

    /// Capability multiplier for an actuator cell.
    ///
    /// Returns 0.0 for dead cells, for cells at or below 5 %, and for sensor roles.
    pub fn actuator_functionality(&self, role: CellRole) -> f64 {
        if !role.is_actuator() {
            return 0.0;
        }
        match self.cells[role.index()] {
            BatteryCell { alive: false, .. } => 0.0,
            BatteryCell { level, .. } if level > 15.0 => 1.0,
            BatteryCell { level, .. } if level > 10.0 => 0.7,
            BatteryCell { level, .. } if level > 5.0 => 0.4,
            _ => 0.0,
        }
    }

    pub fn summary(&self) -> BankSummary {
        let alive_count = self.cells.iter().filter(|c| c.alive).count();
        let average_level = self.cells.iter().map(|c| c.level).sum::<f64>() / CELL_COUNT as f64;
        let critical = CellRole::ALL
            .into_iter()
            .filter(|r| {
                let c = self.cells[r.index()];
                c.alive && c.level < 20.0
            })
            .collect();

        BankSummary {
            alive_count,
            average_level,
            critical,
        }
    }
}

impl Model for BatteryBank {
    fn reset(&mut self) {
        self.cells = [BatteryCell::full(); CELL_COUNT];
    }

    fn model_type(&self) -> &'static str {
        "BatteryBank"
    }
}
