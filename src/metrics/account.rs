use serde::{Deserialize, Serialize};

use crate::models::{FundMovement, Trade};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    /// Starting balance plus every addition.
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub net_funding: f64,
    /// Realized P/L of every trade, ignoring any metrics filter.
    pub trading_pnl: f64,
    pub current_balance: f64,
    /// Trading P/L as a percentage of total deposits.
    pub trading_return: f64,
}

impl AccountSummary {
    pub fn compute(fund_movements: &[FundMovement], trades: &[Trade]) -> Self {
        let total_deposits: f64 = fund_movements
            .iter()
            .filter(|m| m.movement_type.is_deposit())
            .map(|m| m.amount)
            .sum();
        let total_withdrawals: f64 = fund_movements
            .iter()
            .filter(|m| !m.movement_type.is_deposit())
            .map(|m| m.amount)
            .sum();
        let net_funding = total_deposits - total_withdrawals;
        let trading_pnl: f64 = trades.iter().map(|t| t.net_pnl()).sum();

        let trading_return = if total_deposits > 0.0 {
            (trading_pnl / total_deposits) * 100.0
        } else {
            0.0
        };

        Self {
            total_deposits,
            total_withdrawals,
            net_funding,
            trading_pnl,
            current_balance: net_funding + trading_pnl,
            trading_return,
        }
    }
}

/// A fund movement with the funding balance right after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FundLedgerEntry<'a> {
    pub movement: &'a FundMovement,
    pub running_balance: f64,
}

/// Fund movements in date order (insertion order on ties) with running balances.
pub fn fund_ledger(fund_movements: &[FundMovement]) -> Vec<FundLedgerEntry<'_>> {
    let mut sorted: Vec<&FundMovement> = fund_movements.iter().collect();
    sorted.sort_by_key(|m| m.date);

    let mut running_balance = 0.0;
    sorted
        .into_iter()
        .map(|movement| {
            running_balance += movement.signed_amount();
            FundLedgerEntry {
                movement,
                running_balance,
            }
        })
        .collect()
}
