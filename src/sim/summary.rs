//! Run summary folded from step results.

use std::fmt;

use super::types::StepResult;

/// Aggregate figures for a completed run.
///
/// Built from the step records, either all at once or one step at a time,
/// so the report always agrees with them.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub steps: usize,
    /// Simulated time covered (hours).
    pub simulated_hours: f64,
    pub min_concrete_temp: f64,
    pub max_concrete_temp: f64,
    pub final_concrete_humidity: f64,
    pub final_air_temp: f64,
    pub final_air_humidity: f64,
    /// Lowest reservoir level seen (%).
    pub min_water_level: f64,
    /// Steps that ended with the pump running.
    pub pump_on_steps: usize,
    /// Steps that ended with the heater on.
    pub heater_on_steps: usize,
    /// Live cells after the last step.
    pub cells_alive: usize,
    /// Steps whose documents could not be written.
    pub unpersisted_steps: usize,
    minutes: i64,
}

impl RunSummary {
    /// Summary of a run that so far consists of `first`.
    pub fn starting_with(first: &StepResult) -> Self {
        let mut summary = Self {
            steps: 0,
            simulated_hours: 0.0,
            min_concrete_temp: f64::INFINITY,
            max_concrete_temp: f64::NEG_INFINITY,
            final_concrete_humidity: 0.0,
            final_air_temp: 0.0,
            final_air_humidity: 0.0,
            min_water_level: f64::INFINITY,
            pump_on_steps: 0,
            heater_on_steps: 0,
            cells_alive: 0,
            unpersisted_steps: 0,
            minutes: 0,
        };
        summary.record(first);
        summary
    }

    /// Folds one more step into the summary.
    pub fn record(&mut self, r: &StepResult) {
        self.steps += 1;
        self.minutes += r.step_minutes;
        self.simulated_hours = self.minutes as f64 / 60.0;
        self.min_concrete_temp = self.min_concrete_temp.min(r.concrete.temperature);
        self.max_concrete_temp = self.max_concrete_temp.max(r.concrete.temperature);
        self.final_concrete_humidity = r.concrete.humidity;
        self.final_air_temp = r.air.temperature;
        self.final_air_humidity = r.air.humidity;
        self.min_water_level = self.min_water_level.min(r.water_level);
        self.pump_on_steps += usize::from(r.pump_on);
        self.heater_on_steps += usize::from(r.heater_on);
        self.cells_alive = r.cells_alive;
        self.unpersisted_steps += usize::from(!r.persisted);
    }

    /// Summarises `results`; `None` for an empty run.
    pub fn from_results(results: &[StepResult]) -> Option<Self> {
        let (first, rest) = results.split_first()?;
        let mut summary = Self::starting_with(first);
        for r in rest {
            summary.record(r);
        }
        Some(summary)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Run Summary ---")?;
        writeln!(
            f,
            "Steps:                 {} ({:.1} h simulated)",
            self.steps, self.simulated_hours
        )?;
        writeln!(
            f,
            "Slab temperature:      {:.2} .. {:.2} °C",
            self.min_concrete_temp, self.max_concrete_temp
        )?;
        writeln!(f, "Final slab humidity:   {:.2}%", self.final_concrete_humidity)?;
        writeln!(
            f,
            "Final air:             {:.2} °C, {:.2}%",
            self.final_air_temp, self.final_air_humidity
        )?;
        writeln!(f, "Lowest water level:    {:.1}%", self.min_water_level)?;
        writeln!(
            f,
            "Pump / heater steps:   {} / {}",
            self.pump_on_steps, self.heater_on_steps
        )?;
        writeln!(f, "Cells alive:           {}/4", self.cells_alive)?;
        write!(f, "Unpersisted steps:     {}", self.unpersisted_steps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::types::fixtures::sample_step;

    #[test]
    fn empty_run_has_no_summary() {
        assert!(RunSummary::from_results(&[]).is_none());
    }

    #[test]
    fn aggregates_over_steps() {
        let mut results: Vec<StepResult> = (0..6).map(sample_step).collect();
        results[2].concrete.temperature = 31.0;
        results[4].concrete.temperature = 18.5;
        results[3].water_level = 42.0;
        results[5].persisted = false;
        results[5].cells_alive = 3;

        let s = RunSummary::from_results(&results).unwrap();
        assert_eq!(s.steps, 6);
        assert_eq!(s.simulated_hours, 1.0);
        assert_eq!(s.max_concrete_temp, 31.0);
        assert_eq!(s.min_concrete_temp, 18.5);
        assert_eq!(s.min_water_level, 42.0);
        // sample steps 0, 2, 4 have the pump on
        assert_eq!(s.pump_on_steps, 3);
        assert_eq!(s.unpersisted_steps, 1);
        assert_eq!(s.cells_alive, 3);
    }

    #[test]
    fn incremental_summary_matches_batch() {
        let results: Vec<StepResult> = (0..12).map(sample_step).collect();
        let mut running = RunSummary::starting_with(&results[0]);
        for r in &results[1..] {
            running.record(r);
        }
        assert_eq!(Some(running), RunSummary::from_results(&results));
    }

    #[test]
    fn display_does_not_panic() {
        let results: Vec<StepResult> = (0..3).map(sample_step).collect();
        let text = RunSummary::from_results(&results).unwrap().to_string();
        assert!(text.starts_with("--- Run Summary ---"));
        assert!(text.contains("Cells alive:           4/4"));
    }
}
