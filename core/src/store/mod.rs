//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! The engine sees it through the PlanStore trait and never runs SQL.

use crate::{
    error::PlanResult,
    model::{Account, GeneratedTask, GenerationHistory, Strategy},
};
use rusqlite::Connection;

mod account;
mod strategy;
mod task;

pub use task::TaskFilter;

/// The reads and the single batched write a generation run needs.
pub trait PlanStore {
    /// None when the identifier does not resolve.
    fn strategy(&self, strategy_id: &str) -> PlanResult<Option<Strategy>>;

    /// Active accounts of the user, restricted to one group when given.
    fn active_accounts(&self, user_id: &str, group: Option<&str>) -> PlanResult<Vec<Account>>;

    /// The highest cycle of the (user, group) scope and its latest
    /// execution time. Default history when nothing exists.
    fn last_cycle_and_date(
        &self,
        user_id: &str,
        group_label: &str,
    ) -> PlanResult<GenerationHistory>;

    /// Persist every task or none of them.
    fn create_tasks_batch(&self, tasks: &[GeneratedTask]) -> PlanResult<()>;
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &str) -> PlanResult<Self> {
        let conn = Connection::open(path)?;
        // WAL is ignored for :memory:.
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PlanResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PlanResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_foundation.sql"))?;
        Ok(())
    }
}

impl PlanStore for SqliteStore {
    fn strategy(&self, strategy_id: &str) -> PlanResult<Option<Strategy>> {
        self.find_strategy(strategy_id)
    }

    fn active_accounts(&self, user_id: &str, group: Option<&str>) -> PlanResult<Vec<Account>> {
        self.list_active_accounts(user_id, group)
    }

    fn last_cycle_and_date(
        &self,
        user_id: &str,
        group_label: &str,
    ) -> PlanResult<GenerationHistory> {
        self.last_task_cycle_and_date(user_id, group_label)
    }

    fn create_tasks_batch(&self, tasks: &[GeneratedTask]) -> PlanResult<()> {
        self.insert_tasks(tasks)
    }
}
