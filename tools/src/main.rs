//! plan-runner: headless keep-alive task generation.
//!
//! Usage:
//!   plan-runner --user alice --demo-accounts 4 --cycles 2
//!   plan-runner --db plan.db --user alice --strategy <id> --group savings --seed 42
//!   plan-runner --user alice --demo-accounts 3 --today 2026-01-19 --json

use anyhow::{Context, Result};
use chrono::NaiveDate;
use keepalive_core::{
    clock::{Clock, FixedClock, SystemClock},
    config::PlannerConfig,
    model::{Account, GeneratedTask},
    randomizer::SourceRandomizer,
    rng::PlanRng,
    service::{GenerateRequest, GenerationResult, GenerationService},
    store::{SqliteStore, TaskFilter},
    summary::TaskSummary,
};
use std::env;

#[derive(serde::Serialize)]
struct RunReport<'a> {
    seed: u64,
    strategy_id: &'a str,
    group: &'a str,
    result: GenerationResult,
    summary: TaskSummary,
    tasks: Vec<&'a GeneratedTask>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = str_arg(&args, "--db").unwrap_or(":memory:");
    let user = str_arg(&args, "--user").unwrap_or("demo-user");
    let group = str_arg(&args, "--group").unwrap_or("");
    let cycles = parse_arg(&args, "--cycles", 0i32);
    let demo_accounts = parse_arg(&args, "--demo-accounts", 0usize);
    let json = args.iter().any(|a| a == "--json");
    let clock: Box<dyn Clock> = match str_arg(&args, "--today") {
        Some(raw) => Box::new(FixedClock(
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("--today '{raw}' is not YYYY-MM-DD"))?,
        )),
        None => Box::new(SystemClock),
    };
    let seed = str_arg(&args, "--seed")
        .map(|s| s.parse::<u64>().context("--seed must be an unsigned integer"))
        .transpose()?;

    let config = match str_arg(&args, "--config") {
        Some(path) => PlannerConfig::load(path)?,
        None => PlannerConfig::default(),
    };

    let store = SqliteStore::open(db)?;
    store.migrate()?;
    store.seed_system_strategies(&config.system_strategies)?;

    for i in 0..demo_accounts {
        let mut account = Account::new(
            format!("{user}-acct-{i:03}"),
            user,
            format!("Demo account {}", i + 1),
        );
        if !group.is_empty() {
            account = account.in_group(group);
        }
        store.insert_account(&account)?;
    }

    let strategy_id = match str_arg(&args, "--strategy") {
        Some(id) => id.to_string(),
        None => store
            .strategies_for_user(user)?
            .into_iter()
            .next()
            .map(|s| s.id)
            .context("no strategy available; pass --strategy")?,
    };

    let rng = match seed {
        Some(seed) => PlanRng::new(seed),
        None => PlanRng::from_entropy(),
    };

    let seed = rng.seed();
    log::debug!("plan-runner seed={seed} db={db}");

    let mut randomizer = SourceRandomizer::with_config(rng, &config);
    let service = GenerationService::with_config(&store, clock.as_ref(), config);
    let request = GenerateRequest {
        strategy_id,
        group_label: group.to_string(),
        cycle_count: cycles,
    };
    let result = service.generate(user, &request, &mut randomizer)?;

    let filter = TaskFilter {
        group: Some(group.to_string()),
        ..TaskFilter::default()
    };
    let tasks = store.tasks_for_user(user, &filter)?;
    let summary = TaskSummary::from_tasks(&tasks);
    let new_tasks: Vec<&GeneratedTask> = tasks
        .iter()
        .filter(|t| t.cycle >= result.start_cycle)
        .collect();

    if json {
        let report = RunReport {
            seed,
            strategy_id: &request.strategy_id,
            group,
            result,
            summary,
            tasks: new_tasks,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("keep-alive plan-runner");
    println!("  db:        {db}");
    println!("  user:      {user}");
    println!("  group:     {}", if group.is_empty() { "(all)" } else { group });
    println!("  strategy:  {}", request.strategy_id);
    println!("  seed:      {seed}");
    println!();
    println!("=== GENERATION ===");
    println!("  created:    {}", result.tasks_created);
    println!("  cycles:     {}..={}", result.start_cycle, result.end_cycle);
    println!("  pending:    {} of {}", summary.pending, summary.total);
    println!();
    println!("=== SCHEDULE ===");
    for t in &new_tasks {
        println!(
            "  c{:<3} {} {} -> {}  {:>8.2}",
            t.cycle,
            t.exec_at.format("%a %Y-%m-%d %H:%M:%S"),
            t.from_account_id,
            t.to_account_id,
            t.amount
        );
    }
    Ok(())
}

fn str_arg<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    match str_arg(args, flag) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            log::warn!("ignoring unparseable {flag} '{raw}'");
            default
        }),
        None => default,
    }
}
