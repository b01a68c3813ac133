use crate::model::Strategy;
use serde::{Deserialize, Serialize};

/// A strategy installed for every user when the store is first seeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyPreset {
    pub name: String,
    pub interval_min: i64,
    pub interval_max: i64,
    pub time_start: String,
    pub time_end: String,
    #[serde(default)]
    pub skip_weekend: bool,
    pub amount_min: f64,
    pub amount_max: f64,
    pub daily_limit: u32,
}

/// Width of the daily window when its end is not after its start.
pub const DEFAULT_FALLBACK_WINDOW_MINUTES: u32 = 60;

/// Minutes in a calendar day; a daily window never ends after this.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlannerConfig {
    /// Cycles generated when the request asks for zero or fewer.
    pub default_cycle_count: u32,
    /// Minimum days between A->B and a later B->A.
    pub reversal_spacing_days: i64,
    /// Used when a strategy's "HH:MM" field cannot be parsed.
    pub fallback_time: String,
    /// Window width when the end of the daily window is not after its start.
    pub fallback_window_minutes: u32,
    /// History dated before this year is treated as absent.
    pub min_history_year: i32,
    pub system_strategies: Vec<StrategyPreset>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            default_cycle_count: 4,
            reversal_spacing_days: 3,
            fallback_time: "09:00".to_string(),
            fallback_window_minutes: DEFAULT_FALLBACK_WINDOW_MINUTES,
            min_history_year: 2000,
            system_strategies: vec![
                StrategyPreset {
                    name: "Default keep-alive".to_string(),
                    interval_min: 30,
                    interval_max: 60,
                    time_start: "09:00".to_string(),
                    time_end: "21:00".to_string(),
                    skip_weekend: false,
                    amount_min: 10.0,
                    amount_max: 30.0,
                    daily_limit: 3,
                },
                StrategyPreset {
                    name: "Long-term keep-alive".to_string(),
                    interval_min: 90,
                    interval_max: 120,
                    time_start: "09:00".to_string(),
                    time_end: "21:00".to_string(),
                    skip_weekend: false,
                    amount_min: 10.0,
                    amount_max: 30.0,
                    daily_limit: 3,
                },
            ],
        }
    }
}

impl PlannerConfig {
    /// Load from a JSON file. Fields missing from the file keep their
    /// default values.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PlannerConfig = serde_json::from_str(&content)?;
        if config.reversal_spacing_days < 0 {
            anyhow::bail!("reversal_spacing_days must be >= 0 in {path}");
        }
        if config.fallback_window_minutes == 0 {
            anyhow::bail!("fallback_window_minutes must be > 0 in {path}");
        }
        for preset in &config.system_strategies {
            Strategy::from_preset(preset.name.as_str(), preset)
                .validate_with_window(config.fallback_window_minutes)
                .map_err(|e| anyhow::anyhow!("preset '{}' in {path}: {e}", preset.name))?;
        }
        Ok(config)
    }
}
