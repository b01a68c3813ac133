use super::SqliteStore;
use crate::{
    error::{PlanError, PlanResult},
    model::{GeneratedTask, GenerationHistory, TaskStatus},
    types::Cycle,
};
use chrono::NaiveDateTime;
use rusqlite::{params, params_from_iter, types::Value, OptionalExtension, Row};

/// Narrows a task listing. `None` fields do not filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    /// `Some("")` selects tasks generated over all accounts.
    pub group: Option<String>,
    pub cycle: Option<Cycle>,
}

const TASK_COLUMNS: &str = "task_id, user_id, group_label, cycle, anchor_date, exec_at,
    from_account_id, to_account_id, amount, status, completed_at";

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<GeneratedTask> {
    let status: String = row.get(9)?;
    let status = TaskStatus::parse(&status).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            format!("unknown task status '{status}'").into(),
        )
    })?;
    Ok(GeneratedTask {
        id: row.get(0)?,
        user_id: row.get(1)?,
        group_label: row.get(2)?,
        cycle: row.get(3)?,
        anchor_date: row.get(4)?,
        exec_at: row.get(5)?,
        from_account_id: row.get(6)?,
        to_account_id: row.get(7)?,
        amount: row.get(8)?,
        status,
        completed_at: row.get(10)?,
    })
}

impl SqliteStore {
    // ── Transfer tasks ────────────────────────────────────────────

    /// Insert the whole batch in one transaction. Any failure rolls
    /// back every row of the batch.
    pub fn insert_tasks(&self, tasks: &[GeneratedTask]) -> PlanResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare_cached(&format!(
                "INSERT INTO transfer_task ({TASK_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ))?;
            for t in tasks {
                stmt.execute(params![
                    &t.id,
                    &t.user_id,
                    &t.group_label,
                    t.cycle,
                    t.anchor_date,
                    t.exec_at,
                    &t.from_account_id,
                    &t.to_account_id,
                    t.amount,
                    t.status.as_str(),
                    t.completed_at,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    pub fn last_task_cycle_and_date(
        &self,
        user_id: &str,
        group_label: &str,
    ) -> PlanResult<GenerationHistory> {
        let last = self
            .conn
            .query_row(
                "SELECT cycle, exec_at FROM transfer_task
                 WHERE user_id = ?1 AND group_label = ?2
                 ORDER BY cycle DESC, exec_at DESC
                 LIMIT 1",
                params![user_id, group_label],
                |row| Ok((row.get::<_, Cycle>(0)?, row.get::<_, NaiveDateTime>(1)?)),
            )
            .optional()?;
        Ok(match last {
            Some((cycle, exec_at)) => GenerationHistory {
                last_cycle: cycle,
                last_exec_at: Some(exec_at),
            },
            None => GenerationHistory::default(),
        })
    }

    pub fn tasks_for_user(
        &self,
        user_id: &str,
        filter: &TaskFilter,
    ) -> PlanResult<Vec<GeneratedTask>> {
        let mut sql = format!("SELECT {TASK_COLUMNS} FROM transfer_task WHERE user_id = ?1");
        let mut args = vec![Value::Text(user_id.to_string())];

        if let Some(status) = filter.status {
            args.push(Value::Text(status.as_str().to_string()));
            sql.push_str(&format!(" AND status = ?{}", args.len()));
        }
        if let Some(group) = &filter.group {
            args.push(Value::Text(group.clone()));
            sql.push_str(&format!(" AND group_label = ?{}", args.len()));
        }
        if let Some(cycle) = filter.cycle {
            args.push(Value::Integer(i64::from(cycle)));
            sql.push_str(&format!(" AND cycle = ?{}", args.len()));
        }
        sql.push_str(" ORDER BY exec_at ASC, task_id ASC");

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(args), task_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn task_cycles(&self, user_id: &str) -> PlanResult<Vec<Cycle>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT cycle FROM transfer_task WHERE user_id = ?1 ORDER BY cycle ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    pub fn complete_task(&self, user_id: &str, task_id: &str, at: NaiveDateTime) -> PlanResult<()> {
        let changed = self.conn.execute(
            "UPDATE transfer_task SET status = 'completed', completed_at = ?1
             WHERE task_id = ?2 AND user_id = ?3",
            params![at, task_id, user_id],
        )?;
        ensure_task_found(changed, task_id)
    }

    pub fn skip_task(&self, user_id: &str, task_id: &str) -> PlanResult<()> {
        let changed = self.conn.execute(
            "UPDATE transfer_task SET status = 'skipped', completed_at = NULL
             WHERE task_id = ?1 AND user_id = ?2",
            params![task_id, user_id],
        )?;
        ensure_task_found(changed, task_id)
    }

    /// Returns how many tasks were removed.
    pub fn delete_tasks_for_user(&self, user_id: &str) -> PlanResult<usize> {
        let removed = self
            .conn
            .execute("DELETE FROM transfer_task WHERE user_id = ?1", params![user_id])?;
        Ok(removed)
    }
}

fn ensure_task_found(changed: usize, task_id: &str) -> PlanResult<()> {
    if changed == 0 {
        return Err(PlanError::TaskNotFound {
            task_id: task_id.to_string(),
        });
    }
    Ok(())
}
