//! End-to-end generation through the service and the SQLite store.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use keepalive_core::{
    clock::FixedClock,
    error::{PlanError, PlanResult},
    model::{Account, GeneratedTask, GenerationHistory, Strategy, TaskStatus},
    randomizer::{Randomizer, SourceRandomizer},
    rng::PlanRng,
    scheduler::Scheduler,
    service::{generate_cycles, CycleRun, GenerateRequest, GenerationService},
    store::{PlanStore, SqliteStore, TaskFilter},
};
use std::cell::Cell;

const USER: &str = "user-1";

struct FixedRandomizer;

impl Randomizer for FixedRandomizer {
    fn interval_days(&mut self, min: i64, _max: i64) -> i64 {
        min
    }
    fn amount(&mut self, min: f64, _max: f64) -> f64 {
        min
    }
    fn time_of_day(&mut self, date: NaiveDate, _start: &str, _end: &str) -> NaiveDateTime {
        date.and_time(NaiveTime::from_hms_opt(9, 0, 0).unwrap())
    }
    fn index_below(&mut self, _n: usize) -> usize {
        0
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 1, 19).unwrap()
}

fn test_strategy() -> Strategy {
    Strategy {
        id: "strategy-1".into(),
        user_id: Some(USER.into()),
        name: "S".into(),
        interval_min: 1,
        interval_max: 1,
        time_start: "09:00".into(),
        time_end: "10:00".into(),
        skip_weekend: false,
        amount_min: 10.0,
        amount_max: 20.0,
        daily_limit: 2,
        is_system: false,
    }
}

fn setup(account_count: usize) -> SqliteStore {
    let store = SqliteStore::in_memory().expect("in-memory store");
    store.migrate().expect("migration");
    store.insert_strategy(&test_strategy()).expect("insert strategy");
    for i in 0..account_count {
        store
            .insert_account(&Account::new(format!("acct-{i}"), USER, format!("Bank {i}")))
            .expect("insert account");
    }
    store
}

fn request(cycle_count: i32) -> GenerateRequest {
    GenerateRequest {
        strategy_id: "strategy-1".into(),
        group_label: String::new(),
        cycle_count,
    }
}

fn all_tasks(store: &SqliteStore) -> Vec<GeneratedTask> {
    store.tasks_for_user(USER, &TaskFilter::default()).unwrap()
}

#[test]
fn generate_persists_pending_tasks_from_tomorrow() {
    let store = setup(2);
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);

    let result = service
        .generate(USER, &request(1), &mut FixedRandomizer)
        .expect("generate");
    assert_eq!(result.tasks_created, 2);
    assert_eq!((result.start_cycle, result.end_cycle), (1, 1));

    let tasks = all_tasks(&store);
    assert_eq!(tasks.len(), 2);
    let tomorrow = today() + Duration::days(1);
    for t in &tasks {
        assert_eq!(t.status, TaskStatus::Pending);
        assert_eq!(t.cycle, 1);
        assert_eq!(t.anchor_date, tomorrow);
        assert_eq!(t.group_label, "");
    }
    assert_eq!(tasks[0].exec_date(), tomorrow);
}

#[test]
fn non_positive_cycle_count_defaults_to_four() {
    let store = setup(3);
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let mut rng = SourceRandomizer::new(PlanRng::new(9));

    let result = service.generate(USER, &request(0), &mut rng).unwrap();
    assert_eq!((result.start_cycle, result.end_cycle), (1, 4));
    assert_eq!(store.task_cycles(USER).unwrap(), vec![1, 2, 3, 4]);
    // Three accounts: four pairs per cycle.
    assert_eq!(result.tasks_created, 16);

    let result = service.generate(USER, &request(-3), &mut rng).unwrap();
    assert_eq!((result.start_cycle, result.end_cycle), (5, 8));
}

#[test]
fn second_run_continues_numbering_and_dates() {
    let store = setup(4);
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let mut rng = SourceRandomizer::new(PlanRng::new(31));

    service.generate(USER, &request(2), &mut rng).unwrap();
    let last_exec = all_tasks(&store).iter().map(|t| t.exec_at).max().unwrap();

    let result = service.generate(USER, &request(1), &mut rng).unwrap();
    assert_eq!((result.start_cycle, result.end_cycle), (3, 3));

    let cycle3 = store
        .tasks_for_user(USER, &TaskFilter { cycle: Some(3), ..TaskFilter::default() })
        .unwrap();
    assert!(!cycle3.is_empty());
    // interval is fixed at one day
    assert!(cycle3.iter().all(|t| t.anchor_date == last_exec.date() + Duration::days(1)));
}

#[test]
fn implausible_history_date_restarts_from_tomorrow() {
    let store = setup(2);
    let old = NaiveDate::from_ymd_opt(1999, 6, 1).unwrap();
    let stale = GeneratedTask {
        id: "stale".into(),
        user_id: USER.into(),
        group_label: String::new(),
        cycle: 2,
        anchor_date: old,
        exec_at: old.and_time(NaiveTime::from_hms_opt(10, 0, 0).unwrap()),
        from_account_id: "acct-0".into(),
        to_account_id: "acct-1".into(),
        amount: 12.0,
        status: TaskStatus::Completed,
        completed_at: None,
    };
    store.insert_tasks(&[stale]).unwrap();

    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let result = service.generate(USER, &request(1), &mut FixedRandomizer).unwrap();
    assert_eq!(result.start_cycle, 3);

    let fresh = store
        .tasks_for_user(USER, &TaskFilter { cycle: Some(3), ..TaskFilter::default() })
        .unwrap();
    assert!(fresh.iter().all(|t| t.anchor_date == today() + Duration::days(1)));
}

#[test]
fn later_cycles_start_after_the_previous_cycles_last_task() {
    let accts = vec![Account::new("A", USER, "A"), Account::new("B", USER, "B")];
    let mut strategy = test_strategy();
    strategy.interval_min = 2;
    strategy.interval_max = 2;
    let start = NaiveDate::from_ymd_opt(2026, 2, 2).unwrap();

    let run = CycleRun {
        user_id: USER,
        group_label: "",
        start_cycle: 1,
        cycle_count: 3,
        start_date: start,
    };
    let scheduler = Scheduler::default();
    let tasks = generate_cycles(run, &accts, &strategy, &scheduler, &mut FixedRandomizer);
    assert_eq!(tasks.len(), 6);

    for cycle in 2..=3 {
        let prev_last = tasks
            .iter()
            .filter(|t| t.cycle == cycle - 1)
            .map(|t| t.exec_date())
            .max()
            .unwrap();
        let anchor = tasks.iter().find(|t| t.cycle == cycle).unwrap().anchor_date;
        assert_eq!(anchor, prev_last + Duration::days(2), "cycle {cycle}");
    }
    // The reversal push in cycle 1 (4 days) shows up in cycle 2's anchor,
    // which is later than the nominal start + interval.
    let cycle2_anchor = tasks.iter().find(|t| t.cycle == 2).unwrap().anchor_date;
    assert!(cycle2_anchor > start + Duration::days(2));
}

#[test]
fn empty_strategy_id_is_rejected() {
    let store = setup(2);
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let req = GenerateRequest {
        strategy_id: String::new(),
        ..request(1)
    };

    let err = service.generate(USER, &req, &mut FixedRandomizer).unwrap_err();
    assert!(matches!(err, PlanError::StrategyRequired), "{err}");
    assert!(err.is_caller_error());
}

#[test]
fn unknown_strategy_is_rejected() {
    let store = setup(2);
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let req = GenerateRequest {
        strategy_id: "missing".into(),
        ..request(1)
    };

    let err = service.generate(USER, &req, &mut FixedRandomizer).unwrap_err();
    assert!(matches!(err, PlanError::StrategyNotFound { .. }), "{err}");
    assert!(all_tasks(&store).is_empty());
}

#[test]
fn single_active_account_is_not_enough() {
    let store = setup(1);
    store
        .insert_account(&Account {
            is_active: false,
            ..Account::new("inactive", USER, "Dormant")
        })
        .unwrap();
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);

    let err = service.generate(USER, &request(1), &mut FixedRandomizer).unwrap_err();
    assert!(matches!(err, PlanError::NotEnoughAccounts { found: 1 }), "{err}");
    assert!(all_tasks(&store).is_empty());
}

#[test]
fn group_scope_filters_accounts_and_history() {
    let store = setup(0);
    for (id, group) in [("s1", "savings"), ("s2", "savings"), ("c1", "cards")] {
        store
            .insert_account(&Account::new(id, USER, id).in_group(group))
            .unwrap();
    }
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);
    let mut rng = SourceRandomizer::new(PlanRng::new(4));

    let savings = GenerateRequest {
        group_label: "savings".into(),
        ..request(1)
    };
    service.generate(USER, &savings, &mut rng).unwrap();
    let tasks = all_tasks(&store);
    assert!(tasks.iter().all(|t| t.group_label == "savings"));
    assert!(tasks
        .iter()
        .all(|t| t.from_account_id.starts_with('s') && t.to_account_id.starts_with('s')));

    let cards = GenerateRequest {
        group_label: "cards".into(),
        ..request(1)
    };
    let err = service.generate(USER, &cards, &mut rng).unwrap_err();
    assert!(matches!(err, PlanError::NotEnoughAccounts { found: 1 }), "{err}");

    // The all-accounts scope has its own cycle numbering.
    let result = service.generate(USER, &request(1), &mut rng).unwrap();
    assert_eq!(result.start_cycle, 1);
}

/// Serves valid inputs but refuses every batch write.
struct RejectingStore {
    strategy: Strategy,
    accounts: Vec<Account>,
    batch_calls: Cell<usize>,
}

impl PlanStore for RejectingStore {
    fn strategy(&self, _strategy_id: &str) -> PlanResult<Option<Strategy>> {
        Ok(Some(self.strategy.clone()))
    }

    fn active_accounts(
        &self,
        _user_id: &str,
        _group: Option<&str>,
    ) -> PlanResult<Vec<Account>> {
        Ok(self.accounts.clone())
    }

    fn last_cycle_and_date(
        &self,
        _user_id: &str,
        _group_label: &str,
    ) -> PlanResult<GenerationHistory> {
        Ok(GenerationHistory::default())
    }

    fn create_tasks_batch(&self, _tasks: &[GeneratedTask]) -> PlanResult<()> {
        self.batch_calls.set(self.batch_calls.get() + 1);
        Err(PlanError::Database(rusqlite_error()))
    }
}

fn rusqlite_error() -> rusqlite::Error {
    rusqlite::Error::InvalidQuery
}

#[test]
fn persistence_failure_is_surfaced_without_retry() {
    let store = RejectingStore {
        strategy: test_strategy(),
        accounts: vec![Account::new("A", USER, "A"), Account::new("B", USER, "B")],
        batch_calls: Cell::new(0),
    };
    let clock = FixedClock(today());
    let service = GenerationService::new(&store, &clock);

    let err = service.generate(USER, &request(2), &mut FixedRandomizer).unwrap_err();
    assert!(matches!(err, PlanError::Database(rusqlite::Error::InvalidQuery)), "{err}");
    assert!(!err.is_caller_error());
    assert_eq!(store.batch_calls.get(), 1);
}
