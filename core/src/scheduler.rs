//! Assigns each pair of a cycle a concrete date and time.
//!
//! Constraints, checked per pair in pairing order:
//!   - at most `daily_limit` tasks on one date;
//!   - an account never both receives and then sends (or the reverse)
//!     on the same date;
//!   - B->A lands at least `reversal_spacing_days` after the last A->B;
//!   - optionally, no task on a Saturday or Sunday.
//!
//! Dates only ever move forward while a cycle is scheduled.

use crate::{
    model::{GeneratedTask, Strategy, TaskStatus},
    pairing::TransferPair,
    randomizer::Randomizer,
    types::Cycle,
};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    In,
    Out,
}

/// Identifies the cycle being scheduled.
#[derive(Debug, Clone, Copy)]
pub struct CycleScope<'a> {
    pub user_id: &'a str,
    pub group_label: &'a str,
    pub cycle: Cycle,
    /// The cycle's nominal start date, recorded as every task's anchor.
    pub base_date: NaiveDate,
}

pub struct Scheduler {
    reversal_spacing_days: i64,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Scheduler {
    pub fn new(reversal_spacing_days: i64) -> Self {
        Self { reversal_spacing_days }
    }

    /// Schedule one cycle. The result is sorted by execution time.
    pub fn schedule(
        &self,
        scope: CycleScope<'_>,
        pairs: &[TransferPair<'_>],
        strategy: &Strategy,
        rng: &mut dyn Randomizer,
    ) -> Vec<GeneratedTask> {
        let mut tasks = Vec::with_capacity(pairs.len());

        let mut day_direction: HashMap<(&str, NaiveDate), Direction> = HashMap::new();
        let mut last_flow: HashMap<(&str, &str), NaiveDate> = HashMap::new();

        let mut current = scope.base_date;
        let mut daily_count: u32 = 0;

        for pair in pairs {
            let from = pair.from.id.as_str();
            let to = pair.to.id.as_str();

            let need_new_day = daily_count >= strategy.daily_limit
                || day_direction.get(&(from, current)) == Some(&Direction::In)
                || day_direction.get(&(to, current)) == Some(&Direction::Out);

            if let Some(&last) = last_flow.get(&(to, from)) {
                let earliest = last + Duration::days(self.reversal_spacing_days);
                if current < earliest {
                    current = earliest;
                    daily_count = 0;
                    day_direction.retain(|&(_, date), _| date == current);
                }
            }

            if need_new_day {
                current += Duration::days(1);
                daily_count = 0;
            }

            if strategy.skip_weekend {
                current = next_weekday(current);
            }

            day_direction.insert((from, current), Direction::Out);
            day_direction.insert((to, current), Direction::In);
            last_flow.insert((from, to), current);

            let amount = rng.amount(strategy.amount_min, strategy.amount_max);
            let exec_at = rng.time_of_day(current, &strategy.time_start, &strategy.time_end);

            tasks.push(GeneratedTask {
                id: Uuid::new_v4().to_string(),
                user_id: scope.user_id.to_string(),
                group_label: scope.group_label.to_string(),
                cycle: scope.cycle,
                anchor_date: scope.base_date,
                exec_at,
                from_account_id: from.to_string(),
                to_account_id: to.to_string(),
                amount,
                status: TaskStatus::Pending,
                completed_at: None,
            });
            daily_count += 1;
        }

        // A reversal jump can place a later pair before an earlier one.
        tasks.sort_by_key(|t| t.exec_at);

        log::debug!(
            "cycle {} from {}: {} tasks, last on {}",
            scope.cycle,
            scope.base_date,
            tasks.len(),
            tasks.last().map(|t| t.exec_date()).unwrap_or(scope.base_date)
        );

        tasks
    }
}

/// `date` itself if it is a weekday, otherwise the following Monday.
pub fn next_weekday(mut date: NaiveDate) -> NaiveDate {
    while matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        date += Duration::days(1);
    }
    date
}
