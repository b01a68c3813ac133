//! Multi-cycle task generation.
//!
//! A run resolves the strategy and the eligible accounts, picks up
//! where the scope's history left off, schedules every cycle and hands
//! the whole batch to the store in one write. Nothing is persisted
//! unless every step succeeds.

use crate::{
    clock::Clock,
    config::PlannerConfig,
    error::{PlanError, PlanResult},
    model::{Account, GeneratedTask, Strategy},
    pairing::generate_balanced_pairs,
    randomizer::Randomizer,
    scheduler::{CycleScope, Scheduler},
    store::PlanStore,
    types::Cycle,
};
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GenerateRequest {
    pub strategy_id: String,
    /// Empty means every active account of the user.
    #[serde(default)]
    pub group_label: String,
    /// Zero or negative selects the configured default.
    #[serde(default)]
    pub cycle_count: i32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub tasks_created: usize,
    pub start_cycle: Cycle,
    pub end_cycle: Cycle,
}

/// Inputs of one multi-cycle run once history has been resolved.
#[derive(Debug, Clone, Copy)]
pub struct CycleRun<'a> {
    pub user_id: &'a str,
    pub group_label: &'a str,
    pub start_cycle: Cycle,
    pub cycle_count: u32,
    pub start_date: NaiveDate,
}

/// Schedule `run.cycle_count` consecutive cycles.
///
/// Each cycle after the first starts a random interval after the date
/// of the previous cycle's last task, not after its anchor. Constraint
/// pushes therefore carry into later cycles.
pub fn generate_cycles(
    run: CycleRun<'_>,
    accounts: &[Account],
    strategy: &Strategy,
    scheduler: &Scheduler,
    rng: &mut dyn Randomizer,
) -> Vec<GeneratedTask> {
    let mut all_tasks = Vec::new();
    let mut current = run.start_date;

    for i in 0..run.cycle_count {
        if i > 0 {
            let days = rng.interval_days(strategy.interval_min, strategy.interval_max);
            current += Duration::days(days);
        }

        let pairs = generate_balanced_pairs(accounts, rng);
        let scope = CycleScope {
            user_id: run.user_id,
            group_label: run.group_label,
            cycle: run.start_cycle + i,
            base_date: current,
        };
        let cycle_tasks = scheduler.schedule(scope, &pairs, strategy, rng);

        if let Some(last) = cycle_tasks.last() {
            current = last.exec_date();
        }
        all_tasks.extend(cycle_tasks);
    }

    all_tasks
}

pub struct GenerationService<'a> {
    store: &'a dyn PlanStore,
    clock: &'a dyn Clock,
    config: PlannerConfig,
    scheduler: Scheduler,
}

impl<'a> GenerationService<'a> {
    pub fn new(store: &'a dyn PlanStore, clock: &'a dyn Clock) -> Self {
        Self::with_config(store, clock, PlannerConfig::default())
    }

    pub fn with_config(
        store: &'a dyn PlanStore,
        clock: &'a dyn Clock,
        config: PlannerConfig,
    ) -> Self {
        let scheduler = Scheduler::new(config.reversal_spacing_days);
        Self {
            store,
            clock,
            config,
            scheduler,
        }
    }

    /// Generate and persist `request.cycle_count` cycles for the user.
    ///
    /// The randomizer is owned by this call; pass a fresh one per
    /// request.
    pub fn generate(
        &self,
        user_id: &str,
        request: &GenerateRequest,
        rng: &mut dyn Randomizer,
    ) -> PlanResult<GenerationResult> {
        if request.strategy_id.is_empty() {
            return Err(PlanError::StrategyRequired);
        }

        let strategy = self
            .store
            .strategy(&request.strategy_id)?
            .ok_or_else(|| PlanError::StrategyNotFound {
                strategy_id: request.strategy_id.clone(),
            })?;

        let group = Some(request.group_label.as_str()).filter(|g| !g.is_empty());
        let accounts = self.store.active_accounts(user_id, group)?;
        if accounts.len() < 2 {
            return Err(PlanError::NotEnoughAccounts {
                found: accounts.len(),
            });
        }

        let cycle_count = match u32::try_from(request.cycle_count) {
            Ok(n) if n > 0 => n,
            _ => self.config.default_cycle_count,
        };

        let history = self
            .store
            .last_cycle_and_date(user_id, &request.group_label)?;
        let start_cycle = history.last_cycle + 1;
        let start_date = match history.resume_date(self.config.min_history_year) {
            Some(last) => {
                last + Duration::days(
                    rng.interval_days(strategy.interval_min, strategy.interval_max),
                )
            }
            None => self.clock.today() + Duration::days(1),
        };
        log::debug!(
            "user={user_id} group='{}' strategy={}: cycles {start_cycle}.. from {start_date}",
            request.group_label,
            strategy.id
        );

        let run = CycleRun {
            user_id,
            group_label: &request.group_label,
            start_cycle,
            cycle_count,
            start_date,
        };
        let tasks = generate_cycles(run, &accounts, &strategy, &self.scheduler, rng);

        self.store.create_tasks_batch(&tasks)?;

        let result = GenerationResult {
            tasks_created: tasks.len(),
            start_cycle,
            end_cycle: start_cycle + cycle_count - 1,
        };
        log::info!(
            "user={user_id} generated {} tasks for cycles {}..={}",
            result.tasks_created,
            result.start_cycle,
            result.end_cycle
        );
        Ok(result)
    }
}
