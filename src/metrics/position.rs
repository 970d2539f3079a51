use crate::models::{Action, Decision, TradeStatus};

/// Residual quantity treated as flat. Keeps fractional fills such as
/// 0.1 + 0.2 - 0.3 from leaving a trade open forever.
pub const FLAT_EPSILON: f64 = 1e-9;

/// Position math for one trade, computed from its fills in insertion order.
///
/// Realized P/L uses a single blended average cost across every buy, applied
/// to every sell regardless of fill order. FIFO lot matching and short
/// positions are not modelled: a sequence that goes net short and is then
/// covered runs through the same formula.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionSummary {
    pub status: TradeStatus,
    pub net_quantity: f64,
    pub total_bought: f64,
    pub buy_value: f64,
    pub total_sold: f64,
    pub sell_value: f64,
    pub avg_buy_price: f64,
    pub net_pnl: f64,
    pub r_multiple: f64,
}

impl PositionSummary {
    pub fn from_decisions(decisions: &[Decision], initial_risk: f64) -> Self {
        let mut summary = PositionSummary::default();

        for decision in decisions {
            match decision.action {
                Action::Buy => {
                    summary.total_bought += decision.quantity;
                    summary.buy_value += decision.quantity * decision.price;
                }
                Action::Sell => {
                    summary.total_sold += decision.quantity;
                    summary.sell_value += decision.quantity * decision.price;
                }
            }
            summary.net_quantity += decision.signed_quantity();
        }

        if summary.net_quantity.abs() < FLAT_EPSILON {
            summary.net_quantity = 0.0;
        }

        summary.status = if !decisions.is_empty() && summary.net_quantity == 0.0 {
            TradeStatus::Closed
        } else {
            TradeStatus::Open
        };

        if summary.total_bought > 0.0 {
            summary.avg_buy_price = summary.buy_value / summary.total_bought;
        }

        if summary.status == TradeStatus::Closed
            && summary.total_bought > 0.0
            && summary.total_sold > 0.0
        {
            summary.net_pnl = summary.sell_value - summary.total_sold * summary.avg_buy_price;
            summary.r_multiple = if initial_risk > 0.0 {
                summary.net_pnl / initial_risk
            } else {
                0.0
            };
        }

        summary
    }
}
