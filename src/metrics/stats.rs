use serde::{Deserialize, Serialize};

use crate::models::{Trade, TradeStatus};

/// Aggregate performance over a filtered set of trades. Only closed trades
/// contribute to P/L figures; open trades are counted and nothing else.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceStats {
    pub total_trades: usize,
    pub open_trades: usize,
    pub closed_trades: usize,
    pub wins: usize,
    pub losses: usize,
    pub breakevens: usize,
    /// Percentage of closed trades with positive P/L, 0 when none are closed.
    pub win_rate: f64,
    pub net_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    /// Gross profit over gross loss. +inf with winners and no losers, 0 with neither.
    #[serde(with = "ratio")]
    pub profit_factor: f64,
    pub avg_winner: f64,
    pub avg_loser: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
    pub avg_r_multiple: f64,
    /// Mean P/L per closed trade.
    pub expectancy: f64,
}

impl PerformanceStats {
    pub fn from_trades<'a>(trades: impl IntoIterator<Item = &'a Trade>) -> Self {
        let mut stats = PerformanceStats::default();
        let mut r_sum = 0.0;
        let mut best: Option<f64> = None;
        let mut worst: Option<f64> = None;

        for trade in trades {
            stats.total_trades += 1;
            if trade.status() == TradeStatus::Open {
                stats.open_trades += 1;
                continue;
            }

            let pnl = trade.net_pnl();
            stats.closed_trades += 1;
            stats.net_pnl += pnl;
            r_sum += trade.r_multiple();

            if pnl > 0.0 {
                stats.wins += 1;
                stats.gross_profit += pnl;
            } else if pnl < 0.0 {
                stats.losses += 1;
                stats.gross_loss += pnl.abs();
            } else {
                stats.breakevens += 1;
            }

            best = Some(best.map_or(pnl, |b| b.max(pnl)));
            worst = Some(worst.map_or(pnl, |w| w.min(pnl)));
        }

        if stats.closed_trades > 0 {
            let closed = stats.closed_trades as f64;
            stats.win_rate = (stats.wins as f64 / closed) * 100.0;
            stats.avg_r_multiple = r_sum / closed;
            stats.expectancy = stats.net_pnl / closed;
        }

        stats.profit_factor = if stats.gross_loss > 0.0 {
            stats.gross_profit / stats.gross_loss
        } else if stats.gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        if stats.wins > 0 {
            stats.avg_winner = stats.gross_profit / stats.wins as f64;
        }
        if stats.losses > 0 {
            stats.avg_loser = stats.gross_loss / stats.losses as f64;
        }

        stats.best_trade = best.unwrap_or(0.0);
        stats.worst_trade = worst.unwrap_or(0.0);

        stats
    }
}

/// JSON numbers cannot hold infinity, so an unbounded ratio is written as the
/// string `"Infinity"`.
mod ratio {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
        if *value == f64::INFINITY {
            serializer.serialize_str("Infinity")
        } else {
            serializer.serialize_f64(*value)
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        match Repr::deserialize(deserializer)? {
            Repr::Number(value) => Ok(value),
            Repr::Text(text) if text == "Infinity" => Ok(f64::INFINITY),
            Repr::Text(text) => Err(de::Error::custom(format!("invalid ratio '{}'", text))),
        }
    }
}
