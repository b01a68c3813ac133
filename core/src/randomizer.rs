//! Bounded randomness for the planner: interval jitter, "human looking"
//! amounts and times of day inside a strategy's window.

use crate::{
    config::{PlannerConfig, MINUTES_PER_DAY},
    rng::UniformSource,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

pub trait Randomizer {
    /// Uniform whole number of days in [min, max]. A max below min is
    /// treated as min.
    fn interval_days(&mut self, min: i64, max: i64) -> i64;

    /// Uniform amount in [min, max), truncated to 0, 1 or 2 decimals
    /// (the precision itself is drawn uniformly).
    fn amount(&mut self, min: f64, max: f64) -> f64;

    /// A timestamp on `date` inside the "HH:MM" window [start, end).
    fn time_of_day(&mut self, date: NaiveDate, start: &str, end: &str) -> NaiveDateTime;

    /// Uniform index in [0, n). Drives the pair shuffle.
    fn index_below(&mut self, n: usize) -> usize;
}

/// Parse a strict "HH:MM" wall-clock time into (hour, minute).
pub fn parse_clock_time(s: &str) -> Option<(u32, u32)> {
    if s.len() < 5 {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .ok()
        .map(|t| (t.hour(), t.minute()))
}

/// The standard Randomizer over any uniform source.
pub struct SourceRandomizer<S: UniformSource> {
    source: S,
    fallback_minutes: u32,
    fallback_window_minutes: u32,
}

impl<S: UniformSource> SourceRandomizer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, &PlannerConfig::default())
    }

    pub fn with_config(source: S, config: &PlannerConfig) -> Self {
        let (h, m) = parse_clock_time(&config.fallback_time).unwrap_or((9, 0));
        Self {
            source,
            fallback_minutes: h * 60 + m,
            fallback_window_minutes: config.fallback_window_minutes.max(1),
        }
    }

    fn minutes_of(&self, s: &str) -> u32 {
        match parse_clock_time(s) {
            Some((h, m)) => h * 60 + m,
            None => {
                log::warn!("unparseable time '{s}', falling back to default start");
                self.fallback_minutes
            }
        }
    }
}

impl<S: UniformSource> Randomizer for SourceRandomizer<S> {
    fn interval_days(&mut self, min: i64, max: i64) -> i64 {
        let max = max.max(min);
        min + self.source.below((max - min + 1) as u64) as i64
    }

    fn amount(&mut self, min: f64, max: f64) -> f64 {
        let base = min + self.source.unit() * (max - min);
        match self.source.below(3) {
            0 => base.trunc(),
            1 => (base * 10.0).trunc() / 10.0,
            _ => (base * 100.0).trunc() / 100.0,
        }
    }

    fn time_of_day(&mut self, date: NaiveDate, start: &str, end: &str) -> NaiveDateTime {
        let start_minutes = self.minutes_of(start);
        let mut end_minutes = self.minutes_of(end);
        if end_minutes <= start_minutes {
            end_minutes = (start_minutes + self.fallback_window_minutes).min(MINUTES_PER_DAY);
        }

        let offset = self.source.below(u64::from(end_minutes - start_minutes));
        let second = self.source.below(60);

        // end_minutes <= MINUTES_PER_DAY, so the result stays on `date`.
        date.and_time(NaiveTime::MIN)
            + Duration::minutes(i64::from(start_minutes) + offset as i64)
            + Duration::seconds(second as i64)
    }

    fn index_below(&mut self, n: usize) -> usize {
        self.source.below(n as u64) as usize
    }
}
