use anyhow::{Context, Result};
use std::path::PathBuf;

use trade_journal_lib::metrics::DateRange;
use trade_journal_lib::{
    DocumentStore, JournalError, MetricsEngine, SimulationConfig, SqliteStore, TradeFilter,
};

const DEFAULT_DB_FILE: &str = "trade_journal.db";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut db_path = PathBuf::from(DEFAULT_DB_FILE);
    let mut rules_followed_only = false;
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--rules-followed" => rules_followed_only = true,
            _ => db_path = PathBuf::from(arg),
        }
    }

    log::info!("Database path: {:?}", db_path);
    let store = SqliteStore::open(&db_path)
        .with_context(|| format!("Failed to open journal database at {}", db_path.display()))?;
    let ledger = store.load_ledger().context("Failed to load journal document")?;

    let engine = MetricsEngine::new(&ledger);
    let filter = if rules_followed_only {
        TradeFilter::rules_followed()
    } else {
        TradeFilter::all()
    };
    let today = chrono::Utc::now().date_naive();

    let report = serde_json::json!({
        "account": engine.account_summary(),
        "performance": engine.performance(filter),
        "fiscalYearToDate": engine.performance(
            engine.filter_for_range(rules_followed_only, DateRange::FiscalYearToDate, today)
        ),
        "equityCurve": engine.equity_curve(filter),
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    match engine.monte_carlo(filter, &SimulationConfig::default(), &mut rand::thread_rng()) {
        Ok(simulation) => println!("{}", serde_json::to_string_pretty(&simulation.summary)?),
        Err(JournalError::InsufficientData { required, available }) => log::warn!(
            "Skipping Monte Carlo: {} closed trades required, {} available",
            required,
            available
        ),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
