pub mod db;
pub mod document;
pub mod error;
pub mod export;
pub mod ledger;
pub mod metrics;
pub mod models;

pub use db::{Database, DocumentStore, MemoryStore, SqliteStore};
pub use document::JournalDocument;
pub use error::{JournalError, Result};
pub use ledger::Ledger;
pub use metrics::{MetricsEngine, SimulationConfig, TradeFilter};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTradeInput, DecisionInput, FundMovementInput, UpdateSettingsInput};
    use chrono::NaiveDate;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_end_to_end_balance() {
        init_logger();
        let store = SqliteStore::open_in_memory().unwrap();
        let mut ledger = store.load_ledger().unwrap();

        ledger
            .update_settings(UpdateSettingsInput {
                starting_balance: Some(100_000.0),
                ..Default::default()
            })
            .unwrap();
        ledger
            .add_fund_movement(FundMovementInput {
                date: NaiveDate::from_ymd_opt(2025, 2, 1),
                amount: 25_000.0,
                movement_type: "Addition".to_string(),
                comments: "Bonus".to_string(),
            })
            .unwrap();

        let trade_id = ledger
            .add_trade(CreateTradeInput {
                symbol: "spy".to_string(),
                setup: "Pullback".to_string(),
                situation: "Trending".to_string(),
                initial_risk: 500.0,
                all_rules_followed: true,
                created_date: NaiveDate::from_ymd_opt(2025, 2, 3),
                ..Default::default()
            })
            .unwrap()
            .id
            .clone();
        for (action, price) in [("Buy", 500.0), ("Sell", 507.5)] {
            ledger
                .add_decision(
                    &trade_id,
                    DecisionInput {
                        date: NaiveDate::from_ymd_opt(2025, 2, 3),
                        action: action.to_string(),
                        quantity: 100.0,
                        price,
                        comments: String::new(),
                    },
                )
                .unwrap();
        }

        let engine = MetricsEngine::new(&ledger);
        assert_eq!(ledger.trade(&trade_id).unwrap().net_pnl(), 750.0);
        assert_eq!(engine.account_balance(), 125_750.0);

        store.save_ledger(&ledger).unwrap();
        let reloaded = store.load_ledger().unwrap();
        assert_eq!(MetricsEngine::new(&reloaded).account_balance(), 125_750.0);
        assert_eq!(reloaded, ledger);
    }
}
