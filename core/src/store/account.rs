use super::SqliteStore;
use crate::{
    error::{PlanError, PlanResult},
    model::Account,
};
use rusqlite::{params, Row};

fn account_from_row(row: &Row<'_>) -> rusqlite::Result<Account> {
    Ok(Account {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        amount_min: row.get(3)?,
        amount_max: row.get(4)?,
        strategy_id: row.get(5)?,
        group_label: row.get(6)?,
        is_active: row.get::<_, i32>(7)? != 0,
    })
}

const ACCOUNT_COLUMNS: &str =
    "account_id, user_id, name, amount_min, amount_max, strategy_id, group_label, is_active";

impl SqliteStore {
    // ── Account ───────────────────────────────────────────────────

    pub fn insert_account(&self, a: &Account) -> PlanResult<()> {
        self.conn.execute(
            "INSERT INTO account (account_id, user_id, name, amount_min, amount_max,
                                  strategy_id, group_label, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &a.id,
                &a.user_id,
                &a.name,
                a.amount_min,
                a.amount_max,
                &a.strategy_id,
                &a.group_label,
                if a.is_active { 1 } else { 0 }
            ],
        )?;
        Ok(())
    }

    pub fn set_account_active(&self, account_id: &str, active: bool) -> PlanResult<()> {
        let changed = self.conn.execute(
            "UPDATE account SET is_active = ?1 WHERE account_id = ?2",
            params![if active { 1 } else { 0 }, account_id],
        )?;
        if changed == 0 {
            return Err(PlanError::AccountNotFound {
                account_id: account_id.to_string(),
            });
        }
        Ok(())
    }

    /// Active accounts in a stable order, so a seeded shuffle replays.
    pub fn list_active_accounts(
        &self,
        user_id: &str,
        group: Option<&str>,
    ) -> PlanResult<Vec<Account>> {
        let rows = match group {
            Some(label) => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM account
                     WHERE user_id = ?1 AND is_active = 1 AND group_label = ?2
                     ORDER BY name ASC, account_id ASC"
                ))?;
                let rows = stmt.query_map(params![user_id, label], account_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    "SELECT {ACCOUNT_COLUMNS} FROM account
                     WHERE user_id = ?1 AND is_active = 1
                     ORDER BY name ASC, account_id ASC"
                ))?;
                let rows = stmt.query_map(params![user_id], account_from_row)?;
                rows.collect::<Result<Vec<_>, _>>()?
            }
        };
        Ok(rows)
    }

    /// Distinct non-empty group labels of the user's accounts.
    pub fn account_groups(&self, user_id: &str) -> PlanResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT group_label FROM account
             WHERE user_id = ?1 AND group_label IS NOT NULL AND group_label != ''
             ORDER BY group_label ASC",
        )?;
        let rows = stmt.query_map(params![user_id], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
