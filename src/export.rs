//! CSV and JSON exports built on top of ledger and metrics output.

use chrono::{DateTime, NaiveDate, Utc};
use csv::{Writer, WriterBuilder};
use serde::Serialize;

use crate::document::JournalDocument;
use crate::error::{JournalError, Result};
use crate::ledger::Ledger;
use crate::metrics::{MetricsEngine, TradeFilter};
use crate::models::{FundMovement, Trade};

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Serialize)]
struct TradeRow<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Setup")]
    setup: &'a str,
    #[serde(rename = "Situation")]
    situation: &'a str,
    #[serde(rename = "Tags")]
    tags: String,
    #[serde(rename = "Initial Risk")]
    initial_risk: f64,
    #[serde(rename = "Rules Followed")]
    all_rules_followed: bool,
    #[serde(rename = "Sentiment")]
    sentiment: u8,
    #[serde(rename = "Created Date")]
    created_date: NaiveDate,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Net Quantity")]
    net_quantity: f64,
    #[serde(rename = "Net P/L")]
    net_pnl: String,
    #[serde(rename = "R-Multiple")]
    r_multiple: String,
    #[serde(rename = "Decisions")]
    decisions: usize,
    #[serde(rename = "Notes")]
    notes: &'a str,
}

#[derive(Serialize)]
struct DecisionRow<'a> {
    #[serde(rename = "Trade Id")]
    trade_id: &'a str,
    #[serde(rename = "Symbol")]
    symbol: &'a str,
    #[serde(rename = "Decision Id")]
    decision_id: &'a str,
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Action")]
    action: String,
    #[serde(rename = "Quantity")]
    quantity: f64,
    #[serde(rename = "Price")]
    price: f64,
    #[serde(rename = "Comments")]
    comments: &'a str,
}

#[derive(Serialize)]
struct FundMovementRow<'a> {
    #[serde(rename = "Id")]
    id: &'a str,
    #[serde(rename = "Date")]
    date: NaiveDate,
    #[serde(rename = "Type")]
    movement_type: String,
    #[serde(rename = "Amount")]
    amount: String,
    #[serde(rename = "Comments")]
    comments: &'a str,
}

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn finish(writer: Writer<Vec<u8>>) -> Result<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| JournalError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| JournalError::Export(e.to_string()))
}

fn trade_row(trade: &Trade) -> TradeRow<'_> {
    TradeRow {
        id: &trade.id,
        symbol: &trade.symbol,
        setup: &trade.setup,
        situation: &trade.situation,
        tags: trade.tags.iter().cloned().collect::<Vec<_>>().join(";"),
        initial_risk: trade.initial_risk,
        all_rules_followed: trade.all_rules_followed,
        sentiment: trade.sentiment,
        created_date: trade.created_date,
        status: trade.status().to_string(),
        net_quantity: trade.net_quantity(),
        net_pnl: money(trade.net_pnl()),
        r_multiple: format!("{:.2}", trade.r_multiple()),
        decisions: trade.decisions().len(),
        notes: &trade.notes,
    }
}

fn fund_movement_row(movement: &FundMovement) -> FundMovementRow<'_> {
    FundMovementRow {
        id: &movement.id,
        date: movement.date,
        movement_type: movement.movement_type.to_string(),
        amount: money(movement.amount),
        comments: &movement.comments,
    }
}

/// One row per trade.
pub fn trades_csv(trades: &[Trade]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    for trade in trades {
        writer.serialize(trade_row(trade))?;
    }
    finish(writer)
}

/// One row per decision, in trade then fill order.
pub fn decisions_csv(trades: &[Trade]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    for trade in trades {
        for decision in trade.decisions() {
            writer.serialize(DecisionRow {
                trade_id: &trade.id,
                symbol: &trade.symbol,
                decision_id: &decision.id,
                date: decision.date,
                action: decision.action.to_string(),
                quantity: decision.quantity,
                price: decision.price,
                comments: &decision.comments,
            })?;
        }
    }
    finish(writer)
}

pub fn fund_movements_csv(fund_movements: &[FundMovement]) -> Result<String> {
    let mut writer = Writer::from_writer(Vec::new());
    for movement in fund_movements {
        writer.serialize(fund_movement_row(movement))?;
    }
    finish(writer)
}

/// Single-file report with an account summary, fund movements and trades.
pub fn report_csv(ledger: &Ledger, exported_on: NaiveDate) -> Result<String> {
    let engine = MetricsEngine::new(ledger);
    let summary = engine.account_summary();
    let stats = engine.performance(TradeFilter::all());

    let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());

    writer.write_record(["Trade Journal Export"])?;
    writer.write_record(["Exported on", exported_on.to_string().as_str()])?;

    writer.write_record(["=== ACCOUNT SUMMARY ==="])?;
    writer.write_record(["Current Balance", money(summary.current_balance).as_str()])?;
    writer.write_record(["Total Deposits", money(summary.total_deposits).as_str()])?;
    writer.write_record(["Total Withdrawals", money(summary.total_withdrawals).as_str()])?;
    writer.write_record(["Net Funding", money(summary.net_funding).as_str()])?;
    writer.write_record(["Trading P/L", money(summary.trading_pnl).as_str()])?;
    writer.write_record(["Win Rate", format!("{:.1}%", stats.win_rate).as_str()])?;

    writer.write_record(["=== FUND MOVEMENTS ==="])?;
    writer.write_record(["Id", "Date", "Type", "Amount", "Comments"])?;
    for movement in ledger.fund_movements() {
        let row = fund_movement_row(movement);
        writer.write_record([
            row.id,
            row.date.to_string().as_str(),
            row.movement_type.as_str(),
            row.amount.as_str(),
            row.comments,
        ])?;
    }

    writer.write_record(["=== TRADES ==="])?;
    writer.write_record([
        "Id",
        "Symbol",
        "Setup",
        "Situation",
        "Status",
        "Sentiment",
        "Created Date",
        "Net P/L",
        "R-Multiple",
        "Notes",
    ])?;
    for trade in ledger.trades() {
        let row = trade_row(trade);
        writer.write_record([
            row.id,
            row.symbol,
            row.setup,
            row.situation,
            row.status.as_str(),
            row.sentiment.to_string().as_str(),
            row.created_date.to_string().as_str(),
            row.net_pnl.as_str(),
            row.r_multiple.as_str(),
            row.notes,
        ])?;
    }

    finish(writer)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupData<'a> {
    #[serde(flatten)]
    document: &'a JournalDocument,
    export_date: String,
    version: &'static str,
}

/// Pretty-printed full document plus export metadata. The extra keys are
/// ignored when the backup is loaded back with [`Ledger::from_json`].
pub fn json_backup(ledger: &Ledger, exported_at: DateTime<Utc>) -> Result<String> {
    let document = ledger.serialize();
    let backup = BackupData {
        document: &document,
        export_date: exported_at.to_rfc3339(),
        version: EXPORT_VERSION,
    };
    Ok(serde_json::to_string_pretty(&backup)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateTradeInput, DecisionInput, FundMovementInput};

    fn date(d: &str) -> NaiveDate {
        NaiveDate::parse_from_str(d, "%Y-%m-%d").unwrap()
    }

    fn sample_ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger
            .add_fund_movement(FundMovementInput {
                date: Some(date("2025-01-01")),
                amount: 10000.0,
                movement_type: "StartingBalance".to_string(),
                comments: "Initial account funding".to_string(),
            })
            .unwrap();
        let id = ledger
            .add_trade(CreateTradeInput {
                symbol: "AAPL".to_string(),
                setup: "Breakout".to_string(),
                situation: "Trending".to_string(),
                tags: vec!["A+ Setup".to_string(), "Scaled Out".to_string()],
                initial_risk: 50.0,
                sentiment: Some(5),
                notes: "Strong volume, \"clean\" breakout".to_string(),
                created_date: Some(date("2025-01-15")),
                ..Default::default()
            })
            .unwrap()
            .id
            .clone();
        for (action, price) in [("Buy", 100.0), ("Sell", 120.0)] {
            ledger
                .add_decision(
                    &id,
                    DecisionInput {
                        date: Some(date("2025-01-15")),
                        action: action.to_string(),
                        quantity: 5.0,
                        price,
                        comments: String::new(),
                    },
                )
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_trades_csv_column_order() {
        let csv = trades_csv(sample_ledger().trades()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Id,Symbol,Setup,Situation,Tags,Initial Risk,Rules Followed,Sentiment,Created Date,Status,Net Quantity,Net P/L,R-Multiple,Decisions,Notes"
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",AAPL,Breakout,Trending,A+ Setup;Scaled Out,50.0,false,5,2025-01-15,Closed,"));
        assert!(row.contains(",100.00,2.00,2,"));
        assert!(row.ends_with("\"Strong volume, \"\"clean\"\" breakout\""));
    }

    #[test]
    fn test_decisions_csv_has_one_row_per_fill() {
        let csv = decisions_csv(sample_ledger().trades()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Trade Id,Symbol,Decision Id,Date,Action"));
        assert!(lines[1].contains(",Buy,5.0,100.0,"));
        assert!(lines[2].contains(",Sell,5.0,120.0,"));
    }

    #[test]
    fn test_fund_movements_csv() {
        let csv = fund_movements_csv(sample_ledger().fund_movements()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Id,Date,Type,Amount,Comments");
        assert!(lines[1].ends_with(",2025-01-01,StartingBalance,10000.00,Initial account funding"));
    }

    #[test]
    fn test_report_sections() {
        let report = report_csv(&sample_ledger(), date("2025-01-31")).unwrap();
        assert!(report.contains("Exported on,2025-01-31"));
        assert!(report.contains("Current Balance,10100.00"));
        assert!(report.contains("Win Rate,100.0%"));
        assert!(report.contains("=== FUND MOVEMENTS ==="));
        assert!(report.contains("=== TRADES ==="));
        assert!(report.contains("Id,Symbol,Setup,Situation,Status,Sentiment,Created Date"));
        assert!(report.contains(",AAPL,Breakout,Trending,Closed,5,2025-01-15,100.00,2.00,"));
    }

    #[test]
    fn test_json_backup_reloads() {
        let ledger = sample_ledger();
        let exported_at = DateTime::parse_from_rfc3339("2025-01-31T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = json_backup(&ledger, exported_at).unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], EXPORT_VERSION);
        assert!(value["exportDate"].as_str().unwrap().starts_with("2025-01-31T12:00:00"));

        assert_eq!(Ledger::from_json(&json).unwrap(), ledger);
    }
}
