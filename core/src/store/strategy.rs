use super::SqliteStore;
use crate::{config::StrategyPreset, error::PlanResult, model::Strategy};
use rusqlite::{params, OptionalExtension, Row};
use uuid::Uuid;

const STRATEGY_COLUMNS: &str = "strategy_id, user_id, name, interval_min, interval_max,
    time_start, time_end, skip_weekend, amount_min, amount_max, daily_limit, is_system";

fn strategy_from_row(row: &Row<'_>) -> rusqlite::Result<Strategy> {
    Ok(Strategy {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        interval_min: row.get(3)?,
        interval_max: row.get(4)?,
        time_start: row.get(5)?,
        time_end: row.get(6)?,
        skip_weekend: row.get::<_, i32>(7)? != 0,
        amount_min: row.get(8)?,
        amount_max: row.get(9)?,
        daily_limit: row.get(10)?,
        is_system: row.get::<_, i32>(11)? != 0,
    })
}

impl SqliteStore {
    // ── Strategy ──────────────────────────────────────────────────

    /// Validates before writing; malformed strategies never reach the
    /// scheduler through this store.
    pub fn insert_strategy(&self, s: &Strategy) -> PlanResult<()> {
        s.validate()?;
        self.conn.execute(
            &format!(
                "INSERT INTO strategy ({STRATEGY_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                &s.id,
                &s.user_id,
                &s.name,
                s.interval_min,
                s.interval_max,
                &s.time_start,
                &s.time_end,
                if s.skip_weekend { 1 } else { 0 },
                s.amount_min,
                s.amount_max,
                s.daily_limit,
                if s.is_system { 1 } else { 0 }
            ],
        )?;
        Ok(())
    }

    pub fn find_strategy(&self, strategy_id: &str) -> PlanResult<Option<Strategy>> {
        let strategy = self
            .conn
            .query_row(
                &format!("SELECT {STRATEGY_COLUMNS} FROM strategy WHERE strategy_id = ?1"),
                params![strategy_id],
                strategy_from_row,
            )
            .optional()?;
        Ok(strategy)
    }

    /// System presets first, then the user's own strategies.
    pub fn strategies_for_user(&self, user_id: &str) -> PlanResult<Vec<Strategy>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {STRATEGY_COLUMNS} FROM strategy
             WHERE is_system = 1 OR user_id = ?1
             ORDER BY is_system DESC, name ASC"
        ))?;
        let rows = stmt.query_map(params![user_id], strategy_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Install the system presets unless some already exist.
    /// Returns how many were inserted.
    pub fn seed_system_strategies(&self, presets: &[StrategyPreset]) -> PlanResult<usize> {
        let existing: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM strategy WHERE is_system = 1",
            [],
            |row| row.get(0),
        )?;
        if existing > 0 {
            return Ok(0);
        }

        for preset in presets {
            let strategy = Strategy::from_preset(Uuid::new_v4().to_string(), preset);
            self.insert_strategy(&strategy)?;
        }
        log::info!("seeded {} system strategies", presets.len());
        Ok(presets.len())
    }
}
