use std::f64::consts::PI;
use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, Timelike};

use crate::error::SimError;

/// Timestamp format used by configuration and the reset origin.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Simulated wall clock anchored at a fixed start time.
///
/// Time only moves forward, in whole-step increments. Every daily signal
/// (hour, day fraction, sun curve) is derived from `current` on demand.
///
/// # Examples
///
/// ```
/// use slab_sim::sim::clock::SimulationClock;
///
/// let mut clock = SimulationClock::parse("2025-05-05T12:00:00").unwrap();
/// clock.advance(90).unwrap();
/// assert_eq!(clock.hour_of_day(), 13);
/// assert!((clock.elapsed_days() - 90.0 / 1440.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationClock {
    current: NaiveDateTime,
    start: NaiveDateTime,
}

impl SimulationClock {
    /// Creates a clock whose current time equals its start time.
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            current: start,
            start,
        }
    }

    /// Creates a clock from a `YYYY-MM-DDTHH:MM:SS` timestamp.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidTimestamp` if the string does not parse.
    pub fn parse(start: &str) -> Result<Self, SimError> {
        parse_timestamp(start).map(Self::new)
    }

    /// Rebuilds a clock that started at `start` and has reached `current`.
    ///
    /// A `current` earlier than `start` is pulled up to `start`.
    pub fn resume(start: NaiveDateTime, current: NaiveDateTime) -> Self {
        Self {
            current: current.max(start),
            start,
        }
    }

    /// Advances the clock by `step_minutes`.
    ///
    /// # Errors
    ///
    /// Returns `SimError::InvalidStep` for a negative step and
    /// `SimError::StepOverflow` when the new time is past the calendar
    /// range. The clock is left unchanged in both cases.
    pub fn advance(&mut self, step_minutes: i64) -> Result<(), SimError> {
        if step_minutes < 0 {
            return Err(SimError::InvalidStep(step_minutes));
        }
        self.current = Duration::try_minutes(step_minutes)
            .and_then(|step| self.current.checked_add_signed(step))
            .ok_or(SimError::StepOverflow(step_minutes))?;
        Ok(())
    }

    /// Re-anchors both the start and the current time.
    pub fn reset(&mut self, origin: NaiveDateTime) {
        self.current = origin;
        self.start = origin;
    }

    pub fn current(&self) -> NaiveDateTime {
        self.current
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Hour of the day, 0 to 23.
    pub fn hour_of_day(&self) -> u32 {
        self.current.hour()
    }

    /// Hour of the day including the minute and second fraction.
    pub fn fractional_hour(&self) -> f64 {
        self.day_fraction() * 24.0
    }

    /// Progress through the current day: 0.0 at midnight, 0.5 at noon.
    pub fn day_fraction(&self) -> f64 {
        f64::from(self.current.num_seconds_from_midnight()) / SECONDS_PER_DAY
    }

    /// Days elapsed since the start time, including the fractional part.
    pub fn elapsed_days(&self) -> f64 {
        (self.current - self.start).num_seconds() as f64 / SECONDS_PER_DAY
    }

    /// Phase of the 24-hour cycle in radians, zero at noon.
    pub fn diurnal_phase(&self) -> f64 {
        2.0 * PI * (self.fractional_hour() - 12.0) / 24.0
    }

    /// True between 06:00 (inclusive) and 18:00 (exclusive).
    pub fn is_daytime(&self) -> bool {
        (6..18).contains(&self.hour_of_day())
    }

    pub fn is_nighttime(&self) -> bool {
        !self.is_daytime()
    }

    /// One-humped daylight curve: 0 at 06:00 and 18:00, 1 at noon, 0 at night.
    pub fn sun_intensity(&self) -> f64 {
        let hour = self.fractional_hour();
        if (6.0..=18.0).contains(&hour) {
            (PI * (hour - 6.0) / 12.0).sin().max(0.0)
        } else {
            0.0
        }
    }

    /// Full-day sine in [-1, 1], negative through the night.
    pub fn temperature_factor(&self) -> f64 {
        (PI * (self.fractional_hour() - 6.0) / 12.0).sin()
    }

    /// Date part as `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.current.format("%Y-%m-%d").to_string()
    }

    /// Time part as `HH:MM:SS`.
    pub fn time_string(&self) -> String {
        self.current.format("%H:%M:%S").to_string()
    }
}

impl fmt::Display for SimulationClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.current.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// Parses a `YYYY-MM-DDTHH:MM:SS` timestamp.
///
/// # Errors
///
/// Returns `SimError::InvalidTimestamp` on any format mismatch.
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, SimError> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .map_err(|_| SimError::InvalidTimestamp(s.to_string()))
}

/// Joins separate `YYYY-MM-DD` and `HH:MM:SS` fields into a timestamp.
pub fn join_date_time(date: &str, time: &str) -> Result<NaiveDateTime, SimError> {
    let day = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| SimError::InvalidTimestamp(format!("{date}T{time}")))?;
    let clock = chrono::NaiveTime::parse_from_str(time, "%H:%M:%S")
        .map_err(|_| SimError::InvalidTimestamp(format!("{date}T{time}")))?;
    Ok(day.and_time(clock))
}
