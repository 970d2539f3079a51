use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Trade;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquityCurvePoint {
    pub date: NaiveDate,
    pub cumulative_pnl: f64,
    pub trade_pnl: f64,
    /// `None` for the zero point the curve starts from.
    pub trade_id: Option<String>,
}

/// Cumulative realized P/L of closed trades ordered by creation date.
///
/// The curve starts at `(first date, 0)`. Trades sharing a date keep their
/// relative order.
pub fn equity_curve<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Vec<EquityCurvePoint> {
    let mut closed: Vec<&Trade> = trades.into_iter().filter(|t| t.is_closed()).collect();
    closed.sort_by_key(|t| t.created_date);

    let Some(first) = closed.first() else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(closed.len() + 1);
    points.push(EquityCurvePoint {
        date: first.created_date,
        cumulative_pnl: 0.0,
        trade_pnl: 0.0,
        trade_id: None,
    });

    let mut cumulative_pnl = 0.0;
    for trade in closed {
        cumulative_pnl += trade.net_pnl();
        points.push(EquityCurvePoint {
            date: trade.created_date,
            cumulative_pnl,
            trade_pnl: trade.net_pnl(),
            trade_id: Some(trade.id.clone()),
        });
    }

    points
}
