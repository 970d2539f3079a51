use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::JournalError;
use crate::metrics::position::PositionSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Buy,
    Sell,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Buy => write!(f, "Buy"),
            Action::Sell => write!(f, "Sell"),
        }
    }
}

impl FromStr for Action {
    type Err = JournalError;

    /// Accepts the form values used by older journal drafts ("entry"/"exit") as well.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buy" | "entry" => Ok(Action::Buy),
            "sell" | "exit" => Ok(Action::Sell),
            other => Err(JournalError::validation(format!(
                "Unknown decision action '{}', expected Buy or Sell",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TradeStatus {
    #[default]
    Open,
    Closed,
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeStatus::Open => write!(f, "Open"),
            TradeStatus::Closed => write!(f, "Closed"),
        }
    }
}

pub const DEFAULT_SENTIMENT: u8 = 3;
/// Conviction rating given to a trade when it is journaled.
pub const SENTIMENT_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

fn default_sentiment() -> u8 {
    DEFAULT_SENTIMENT
}

/// A single fill against a trade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub id: String,
    pub date: NaiveDate,
    pub action: Action,
    pub quantity: f64,
    pub price: f64,
    #[serde(default)]
    pub comments: String,
}

impl Decision {
    /// Signed quantity: positive for buys, negative for sells.
    pub fn signed_quantity(&self) -> f64 {
        match self.action {
            Action::Buy => self.quantity,
            Action::Sell => -self.quantity,
        }
    }
}

/// A journaled trade.
///
/// `status`, `net_quantity`, `net_pnl` and `r_multiple` are cached values
/// derived from `decisions` and `initial_risk`. They are private and only
/// refreshed by [`Trade::recalculate`], which every mutation below ends with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: String,
    pub symbol: String,
    pub setup: String,
    pub situation: String,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    pub initial_risk: f64,
    #[serde(default)]
    pub all_rules_followed: bool,
    #[serde(default = "default_sentiment")]
    pub sentiment: u8,
    pub created_date: NaiveDate,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    status: TradeStatus,
    #[serde(default)]
    net_quantity: f64,
    #[serde(default)]
    net_pnl: f64,
    #[serde(default)]
    r_multiple: f64,
    #[serde(default)]
    decisions: Vec<Decision>,
}

impl Trade {
    pub(crate) fn new(id: String, input: CreateTradeInput, created_date: NaiveDate) -> Self {
        Self {
            id,
            symbol: input.symbol.trim().to_uppercase(),
            setup: input.setup.trim().to_string(),
            situation: input.situation.trim().to_string(),
            tags: normalize_tags(input.tags),
            initial_risk: input.initial_risk,
            all_rules_followed: input.all_rules_followed,
            sentiment: input.sentiment.unwrap_or(DEFAULT_SENTIMENT),
            created_date,
            notes: input.notes.trim().to_string(),
            status: TradeStatus::Open,
            net_quantity: 0.0,
            net_pnl: 0.0,
            r_multiple: 0.0,
            decisions: Vec::new(),
        }
    }

    pub fn status(&self) -> TradeStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        self.status == TradeStatus::Closed
    }

    pub fn net_quantity(&self) -> f64 {
        self.net_quantity
    }

    pub fn net_pnl(&self) -> f64 {
        self.net_pnl
    }

    pub fn r_multiple(&self) -> f64 {
        self.r_multiple
    }

    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// Refresh every derived field from the decision sequence.
    pub(crate) fn recalculate(&mut self) {
        let summary = PositionSummary::from_decisions(&self.decisions, self.initial_risk);
        self.status = summary.status;
        self.net_quantity = summary.net_quantity;
        self.net_pnl = summary.net_pnl;
        self.r_multiple = summary.r_multiple;
    }

    pub(crate) fn push_decision(&mut self, decision: Decision) {
        self.decisions.push(decision);
        self.recalculate();
    }

    pub(crate) fn remove_decision(&mut self, decision_id: &str) -> Option<Decision> {
        let index = self.decisions.iter().position(|d| d.id == decision_id)?;
        let removed = self.decisions.remove(index);
        self.recalculate();
        Some(removed)
    }

    /// Copy of the plan fields with no fills, ready to be journaled again.
    pub(crate) fn duplicate(&self, id: String, created_date: NaiveDate) -> Self {
        let notes = if self.notes.is_empty() {
            "(Copy)".to_string()
        } else {
            format!("{} (Copy)", self.notes)
        };

        Self {
            id,
            symbol: self.symbol.clone(),
            setup: self.setup.clone(),
            situation: self.situation.clone(),
            tags: self.tags.clone(),
            initial_risk: self.initial_risk,
            all_rules_followed: self.all_rules_followed,
            sentiment: self.sentiment,
            created_date,
            notes,
            status: TradeStatus::Open,
            net_quantity: 0.0,
            net_pnl: 0.0,
            r_multiple: 0.0,
            decisions: Vec::new(),
        }
    }
}

pub(crate) fn normalize_tags(tags: impl IntoIterator<Item = String>) -> BTreeSet<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateTradeInput {
    pub symbol: String,
    pub setup: String,
    pub situation: String,
    pub tags: Vec<String>,
    pub initial_risk: f64,
    pub all_rules_followed: bool,
    /// Defaults to [`DEFAULT_SENTIMENT`].
    pub sentiment: Option<u8>,
    pub notes: String,
    /// Defaults to today (UTC) when not supplied.
    pub created_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateTradeInput {
    pub symbol: Option<String>,
    pub setup: Option<String>,
    pub situation: Option<String>,
    pub tags: Option<Vec<String>>,
    pub initial_risk: Option<f64>,
    pub all_rules_followed: Option<bool>,
    pub sentiment: Option<u8>,
    pub notes: Option<String>,
}

/// Raw decision form input. `action` stays a string so unknown values are
/// rejected as validation failures instead of parse failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecisionInput {
    pub date: Option<NaiveDate>,
    pub action: String,
    pub quantity: f64,
    pub price: f64,
    pub comments: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn decision(action: Action, quantity: f64, price: f64) -> Decision {
        Decision {
            id: format!("DEC-{}-{}", quantity, price),
            date: date("2025-01-15"),
            action,
            quantity,
            price,
            comments: String::new(),
        }
    }

    fn sample_trade() -> Trade {
        let input = CreateTradeInput {
            symbol: " aapl ".to_string(),
            setup: "Breakout".to_string(),
            situation: "Trend day".to_string(),
            tags: vec!["momentum".to_string(), " momentum ".to_string(), "".to_string()],
            initial_risk: 50.0,
            ..Default::default()
        };
        Trade::new("TRADE-1".to_string(), input, date("2025-01-15"))
    }

    #[test]
    fn test_new_trade_is_open_and_normalized() {
        let trade = sample_trade();
        assert_eq!(trade.symbol, "AAPL");
        assert_eq!(trade.status(), TradeStatus::Open);
        assert_eq!(trade.sentiment, DEFAULT_SENTIMENT);
        assert_eq!(trade.tags.len(), 1);
        assert!(trade.decisions().is_empty());
        assert_eq!(trade.net_pnl(), 0.0);
    }

    #[test]
    fn test_action_parsing() {
        assert_eq!("BUY".parse::<Action>().unwrap(), Action::Buy);
        assert_eq!("exit".parse::<Action>().unwrap(), Action::Sell);
        assert!(matches!(
            "hold".parse::<Action>(),
            Err(JournalError::Validation(_))
        ));
    }

    #[test]
    fn test_push_and_remove_decision_recalculate() {
        let mut trade = sample_trade();
        trade.push_decision(decision(Action::Buy, 5.0, 100.0));
        trade.push_decision(decision(Action::Sell, 5.0, 120.0));
        assert!(trade.is_closed());
        assert_eq!(trade.net_pnl(), 100.0);
        assert_eq!(trade.r_multiple(), 2.0);

        let removed = trade.remove_decision("DEC-5-120").unwrap();
        assert_eq!(removed.action, Action::Sell);
        assert_eq!(trade.status(), TradeStatus::Open);
        assert_eq!(trade.net_quantity(), 5.0);
        assert_eq!(trade.net_pnl(), 0.0);
        assert!(trade.remove_decision("missing").is_none());
    }

    #[test]
    fn test_duplicate_resets_fills() {
        let mut trade = sample_trade();
        trade.push_decision(decision(Action::Buy, 5.0, 100.0));
        let copy = trade.duplicate("TRADE-2".to_string(), date("2025-02-01"));
        assert_eq!(copy.notes, "(Copy)");
        assert!(copy.decisions().is_empty());
        assert_eq!(copy.status(), TradeStatus::Open);
        assert_eq!(copy.symbol, trade.symbol);
    }

    #[test]
    fn test_deserialize_uses_camel_case_keys() {
        let json = r#"{
            "id": "TRADE-9",
            "symbol": "TSLA",
            "setup": "Pullback",
            "situation": "Range",
            "initialRisk": 100.0,
            "createdDate": "2025-01-20",
            "decisions": [
                {"id": "D1", "date": "2025-01-20", "action": "Buy", "quantity": 50.0, "price": 200.0}
            ]
        }"#;

        let trade: Trade = serde_json::from_str(json).unwrap();
        assert_eq!(trade.initial_risk, 100.0);
        assert_eq!(trade.decisions().len(), 1);
        assert_eq!(trade.decisions()[0].comments, "");
        assert!(!trade.all_rules_followed);
        assert_eq!(trade.sentiment, DEFAULT_SENTIMENT);
    }
}
