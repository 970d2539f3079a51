use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};
use crate::ledger::Ledger;
use crate::models::{FundMovement, Settings, Trade, TradeTemplate};

/// The persisted journal: `trades`, `fundMovements` and `settings` are
/// required; `templates` is optional and unknown keys are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalDocument {
    pub trades: Vec<Trade>,
    pub fund_movements: Vec<FundMovement>,
    pub settings: Settings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub templates: Vec<TradeTemplate>,
}

impl JournalDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| JournalError::Format(e.to_string()))
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if !value.is_object() {
            return Err(JournalError::Format(
                "Journal document must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value).map_err(|e| JournalError::Format(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Ledger {
    /// Snapshot the ledger as a persistable document.
    pub fn serialize(&self) -> JournalDocument {
        JournalDocument {
            trades: self.trades().to_vec(),
            fund_movements: self.fund_movements().to_vec(),
            settings: self.settings().clone(),
            templates: self.templates().to_vec(),
        }
    }

    /// Rebuild a ledger from a document. Stored derived trade fields are
    /// ignored and recomputed from each trade's decisions; records that
    /// break the input rules (non-positive amounts, quantities, prices or
    /// risk, sentiment outside 1 to 5) are a `Format` error.
    pub fn deserialize(document: JournalDocument) -> Result<Self> {
        Ledger::from_parts(
            document.trades,
            document.fund_movements,
            document.templates,
            document.settings,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        self.serialize().to_json()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ledger::deserialize(JournalDocument::from_json(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CreateTradeInput, DecisionInput, FundMovementInput, TemplateInput, TradeStatus,
        UpdateSettingsInput,
    };
    use chrono::NaiveDate;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn populated_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .update_settings(UpdateSettingsInput {
                starting_balance: Some(10_000.0),
                add_tags: vec!["Earnings Play".to_string()],
                ..Default::default()
            })
            .unwrap();
        let id = ledger
            .add_trade(CreateTradeInput {
                symbol: "AAPL".to_string(),
                setup: "Breakout".to_string(),
                situation: "Trending".to_string(),
                tags: vec!["A+ Setup".to_string(), "Scaled Out".to_string()],
                initial_risk: 325.0,
                all_rules_followed: true,
                sentiment: Some(4),
                notes: "Strong volume".to_string(),
                created_date: Some(date("2025-01-15")),
            })
            .unwrap()
            .id
            .clone();
        for (action, quantity, price) in [("Buy", 100.0, 150.0), ("Sell", 50.0, 155.0), ("Sell", 50.0, 158.0)] {
            ledger
                .add_decision(
                    &id,
                    DecisionInput {
                        date: Some(date("2025-01-16")),
                        action: action.to_string(),
                        quantity,
                        price,
                        comments: "fill".to_string(),
                    },
                )
                .unwrap();
        }
        ledger
            .add_fund_movement(FundMovementInput {
                date: Some(date("2025-01-20")),
                amount: 1000.0,
                movement_type: "Withdrawal".to_string(),
                comments: "Partial withdrawal for expenses".to_string(),
            })
            .unwrap();
        ledger
            .add_template(TemplateInput {
                name: "Momentum".to_string(),
                setup: "Breakout".to_string(),
                ..Default::default()
            })
            .unwrap();
        ledger
    }

    #[test]
    fn test_round_trip_reproduces_ledger() {
        let ledger = populated_ledger();
        let json = ledger.to_json().unwrap();
        let restored = Ledger::from_json(&json).unwrap();
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_document_uses_camel_case_shape() {
        let value = serde_json::to_value(populated_ledger().serialize()).unwrap();
        assert!(value["fundMovements"].is_array());
        assert_eq!(value["trades"][0]["status"], "Closed");
        assert_eq!(value["trades"][0]["initialRisk"], 325.0);
        assert_eq!(value["trades"][0]["sentiment"], 4);
        assert!(value["trades"][0]["decisions"][0]["action"].is_string());
        assert_eq!(value["settings"]["isFirstLaunch"], false);
        assert_eq!(value["settings"]["fiscalYearStart"], 1);
    }

    #[test]
    fn test_missing_required_key_is_format_error() {
        let result = Ledger::from_json(r#"{"trades": [], "settings": {}}"#);
        assert!(matches!(result, Err(JournalError::Format(_))));

        let result = JournalDocument::from_value(serde_json::json!([1, 2, 3]));
        assert!(matches!(result, Err(JournalError::Format(_))));
    }

    #[test]
    fn test_unknown_keys_ignored_and_settings_defaulted() {
        let json = r#"{
            "trades": [],
            "fundMovements": [],
            "settings": {"startingBalance": 5000},
            "exportDate": "2025-01-31T00:00:00Z",
            "moneyEntries": []
        }"#;
        let ledger = Ledger::from_json(json).unwrap();
        assert_eq!(ledger.settings().starting_balance, 5000.0);
        assert!(ledger.settings().is_first_launch);
        assert!(ledger.templates().is_empty());
    }

    #[test]
    fn test_stored_derived_fields_are_recomputed() {
        let json = r#"{
            "trades": [{
                "id": "TRADE-1",
                "symbol": "TSLA",
                "setup": "Pullback",
                "situation": "Ranging",
                "initialRisk": 100.0,
                "createdDate": "2025-01-20",
                "status": "Closed",
                "netQuantity": 0.0,
                "netPnl": 99999.0,
                "rMultiple": 999.0,
                "decisions": [
                    {"id": "D1", "date": "2025-01-20", "action": "Buy", "quantity": 50.0, "price": 200.0}
                ]
            }],
            "fundMovements": [],
            "settings": {}
        }"#;
        let ledger = Ledger::from_json(json).unwrap();
        let trade = ledger.trade("TRADE-1").unwrap();
        assert_eq!(trade.status(), TradeStatus::Open);
        assert_eq!(trade.net_quantity(), 50.0);
        assert_eq!(trade.net_pnl(), 0.0);
    }

    #[test]
    fn test_round_trip_keeps_full_float_precision() {
        let mut ledger = Ledger::new();
        let prices = [175.47217903306625, 0.1 + 0.2, 1.0 / 3.0, 999.9999999999999];
        let id = ledger
            .add_trade(CreateTradeInput {
                symbol: "NVDA".to_string(),
                setup: "Breakout".to_string(),
                situation: "Trending".to_string(),
                initial_risk: 123.45678901234567,
                created_date: Some(date("2025-03-03")),
                ..Default::default()
            })
            .unwrap()
            .id
            .clone();
        for price in prices {
            ledger
                .add_decision(
                    &id,
                    DecisionInput {
                        date: Some(date("2025-03-03")),
                        action: "Buy".to_string(),
                        quantity: 7.0 / 3.0,
                        price,
                        comments: String::new(),
                    },
                )
                .unwrap();
        }
        ledger
            .add_fund_movement(FundMovementInput {
                date: Some(date("2025-03-01")),
                amount: 2.0_f64.sqrt() * 10_000.0,
                movement_type: "Addition".to_string(),
                comments: String::new(),
            })
            .unwrap();

        let restored = Ledger::from_json(&ledger.to_json().unwrap()).unwrap();
        let stored_prices: Vec<f64> = restored
            .trade(&id)
            .unwrap()
            .decisions()
            .iter()
            .map(|d| d.price)
            .collect();
        assert_eq!(stored_prices, prices);
        assert_eq!(restored, ledger);
    }

    #[test]
    fn test_records_breaking_input_rules_are_format_errors() {
        let document = |trade: &str, movement: &str| {
            format!(
                r#"{{"trades": [{}], "fundMovements": [{}], "settings": {{}}}}"#,
                trade, movement
            )
        };
        let trade = |risk: f64, quantity: f64, price: f64, sentiment: u8| {
            format!(
                r#"{{"id": "TRADE-1", "symbol": "TSLA", "setup": "Pullback", "situation": "Ranging",
                    "initialRisk": {}, "sentiment": {}, "createdDate": "2025-01-20",
                    "decisions": [
                        {{"id": "D1", "date": "2025-01-20", "action": "Buy", "quantity": {}, "price": {}}},
                        {{"id": "D2", "date": "2025-01-21", "action": "Sell", "quantity": {}, "price": {}}}
                    ]}}"#,
                risk, sentiment, quantity, price, quantity, price
            )
        };
        let withdrawal = |amount: f64| {
            format!(
                r#"{{"id": "FUND-1", "date": "2025-01-01", "amount": {}, "type": "Withdrawal"}}"#,
                amount
            )
        };

        let valid =
            Ledger::from_json(&document(&trade(100.0, 5.0, 50.0, 3), &withdrawal(1000.0))).unwrap();
        assert_eq!(valid.trades()[0].status(), TradeStatus::Closed);

        let invalid = [
            document("", &withdrawal(-1000.0)),
            document("", &withdrawal(0.0)),
            document(&trade(-100.0, 5.0, 50.0, 3), ""),
            document(&trade(100.0, -5.0, 50.0, 3), ""),
            document(&trade(100.0, 5.0, 0.0, 3), ""),
            document(&trade(100.0, 5.0, 50.0, 0), ""),
            document(&trade(100.0, 5.0, 50.0, 6), ""),
        ];
        for json in invalid {
            let result = Ledger::from_json(&json);
            assert!(matches!(result, Err(JournalError::Format(_))), "accepted: {}", json);
        }

        let err = Ledger::from_json(&document("", &withdrawal(-1000.0))).unwrap_err();
        assert!(err.to_string().contains("Fund movement FUND-1"));
    }
}
