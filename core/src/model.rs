//! Domain records shared by the engine and the store.

use crate::{
    config::{StrategyPreset, DEFAULT_FALLBACK_WINDOW_MINUTES, MINUTES_PER_DAY},
    error::{PlanError, PlanResult},
    randomizer::parse_clock_time,
    types::{Cycle, EntityId, GroupLabel, UserId},
};
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A tracked bank account. Read-only to the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: EntityId,
    pub user_id: UserId,
    pub name: String,
    pub amount_min: f64,
    pub amount_max: f64,
    pub strategy_id: Option<EntityId>,
    pub group_label: Option<GroupLabel>,
    pub is_active: bool,
}

impl Account {
    /// An active, ungrouped account with the default amount range.
    pub fn new(
        id: impl Into<EntityId>,
        user_id: impl Into<UserId>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            user_id: user_id.into(),
            name: name.into(),
            amount_min: 10.0,
            amount_max: 100.0,
            strategy_id: None,
            group_label: None,
            is_active: true,
        }
    }

    pub fn in_group(mut self, group: impl Into<GroupLabel>) -> Self {
        self.group_label = Some(group.into());
        self
    }
}

/// Keep-alive strategy. Every range is min <= max once validated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Strategy {
    pub id: EntityId,
    /// None for system presets.
    pub user_id: Option<UserId>,
    pub name: String,
    pub interval_min: i64,
    pub interval_max: i64,
    /// "HH:MM", same-day window start.
    pub time_start: String,
    /// "HH:MM", same-day window end.
    pub time_end: String,
    pub skip_weekend: bool,
    pub amount_min: f64,
    pub amount_max: f64,
    pub daily_limit: u32,
    pub is_system: bool,
}

impl Strategy {
    pub fn from_preset(id: impl Into<EntityId>, preset: &StrategyPreset) -> Self {
        Self {
            id: id.into(),
            user_id: None,
            name: preset.name.clone(),
            interval_min: preset.interval_min,
            interval_max: preset.interval_max,
            time_start: preset.time_start.clone(),
            time_end: preset.time_end.clone(),
            skip_weekend: preset.skip_weekend,
            amount_min: preset.amount_min,
            amount_max: preset.amount_max,
            daily_limit: preset.daily_limit,
            is_system: true,
        }
    }

    /// Reject strategies the scheduler should never see. The store
    /// calls this before persisting.
    pub fn validate(&self) -> PlanResult<()> {
        self.validate_with_window(DEFAULT_FALLBACK_WINDOW_MINUTES)
    }

    /// As [`Strategy::validate`], with the width an inverted daily window
    /// widens to. The effective window must end by midnight.
    pub fn validate_with_window(&self, fallback_window_minutes: u32) -> PlanResult<()> {
        let invalid = |reason: String| Err(PlanError::InvalidStrategy { reason });

        if self.interval_min < 0 || self.interval_min > self.interval_max {
            return invalid(format!(
                "interval range {}..{} days is not ordered",
                self.interval_min, self.interval_max
            ));
        }
        if !(self.amount_min >= 0.0 && self.amount_min <= self.amount_max) {
            return invalid(format!(
                "amount range {}..{} is not ordered",
                self.amount_min, self.amount_max
            ));
        }
        let minutes_of = |field: &str, value: &str| {
            parse_clock_time(value)
                .map(|(h, m)| h * 60 + m)
                .ok_or_else(|| PlanError::InvalidStrategy {
                    reason: format!("{field} '{value}' is not HH:MM"),
                })
        };
        let start = minutes_of("time_start", &self.time_start)?;
        let end = minutes_of("time_end", &self.time_end)?;
        if end <= start && start + fallback_window_minutes > MINUTES_PER_DAY {
            return invalid(format!(
                "window {}..{} runs past midnight",
                self.time_start, self.time_end
            ));
        }
        if self.daily_limit == 0 {
            return invalid("daily_limit must be at least 1".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Completed,
    Skipped,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Skipped => "skipped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            "skipped" => Some(Self::Skipped),
            _ => None,
        }
    }
}

/// One scheduled transfer. Created by the engine, persisted as-is.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedTask {
    pub id: EntityId,
    pub user_id: UserId,
    /// Empty string means "all accounts".
    pub group_label: GroupLabel,
    pub cycle: Cycle,
    /// Nominal start date of the cycle.
    pub anchor_date: NaiveDate,
    pub exec_at: NaiveDateTime,
    pub from_account_id: EntityId,
    pub to_account_id: EntityId,
    pub amount: f64,
    pub status: TaskStatus,
    pub completed_at: Option<NaiveDateTime>,
}

impl GeneratedTask {
    pub fn exec_date(&self) -> NaiveDate {
        self.exec_at.date()
    }
}

/// Where the previous generation for a (user, group) scope left off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GenerationHistory {
    pub last_cycle: Cycle,
    pub last_exec_at: Option<NaiveDateTime>,
}

impl GenerationHistory {
    /// The last execution date, if the history is usable as a seed.
    /// A missing cycle or an implausibly old date counts as no history.
    pub fn resume_date(&self, min_year: i32) -> Option<NaiveDate> {
        use chrono::Datelike;
        if self.last_cycle == 0 {
            return None;
        }
        self.last_exec_at
            .map(|at| at.date())
            .filter(|d| d.year() >= min_year)
    }
}
