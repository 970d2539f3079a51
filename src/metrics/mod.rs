pub mod account;
pub mod equity;
pub mod monte_carlo;
pub mod position;
pub mod stats;

pub use account::{AccountSummary, FundLedgerEntry, fund_ledger};
pub use equity::{EquityCurvePoint, equity_curve};
pub use monte_carlo::{
    HistogramBin, MIN_SIMULATION_TRADES, SimulationConfig, SimulationResult, SimulationSummary,
    histogram, simulate,
};
pub use position::PositionSummary;
pub use stats::PerformanceStats;

use chrono::{Datelike, Duration, NaiveDate};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ledger::Ledger;
use crate::models::Trade;

/// Look-back window applied to a trade's creation date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DateRange {
    #[default]
    All,
    Today,
    Week,
    Month,
    ThreeMonths,
    SixMonths,
    Year,
    FiscalYearToDate,
}

impl DateRange {
    /// First date included in the window ending at `as_of`.
    pub fn start_date(&self, as_of: NaiveDate, fiscal_year_start: u32) -> Option<NaiveDate> {
        match self {
            DateRange::All => None,
            DateRange::Today => Some(as_of),
            DateRange::Week => Some(as_of - Duration::days(7)),
            DateRange::Month => Some(as_of - Duration::days(30)),
            DateRange::ThreeMonths => Some(as_of - Duration::days(90)),
            DateRange::SixMonths => Some(as_of - Duration::days(180)),
            DateRange::Year => Some(as_of - Duration::days(365)),
            DateRange::FiscalYearToDate => {
                let month = fiscal_year_start.clamp(1, 12);
                let year = if as_of.month() >= month {
                    as_of.year()
                } else {
                    as_of.year() - 1
                };
                NaiveDate::from_ymd_opt(year, month, 1)
            }
        }
    }
}

/// Which trades an aggregate looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TradeFilter {
    pub rules_followed_only: bool,
    pub since: Option<NaiveDate>,
}

impl TradeFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn rules_followed() -> Self {
        Self {
            rules_followed_only: true,
            since: None,
        }
    }

    pub fn since(mut self, date: NaiveDate) -> Self {
        self.since = Some(date);
        self
    }

    pub fn matches(&self, trade: &Trade) -> bool {
        if self.rules_followed_only && !trade.all_rules_followed {
            return false;
        }
        match self.since {
            Some(start) => trade.created_date >= start,
            None => true,
        }
    }
}

/// Read-only view deriving performance figures from a ledger snapshot.
pub struct MetricsEngine<'a> {
    ledger: &'a Ledger,
}

impl<'a> MetricsEngine<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Self { ledger }
    }

    fn filtered(&self, filter: TradeFilter) -> impl Iterator<Item = &'a Trade> + 'a {
        self.ledger
            .trades()
            .iter()
            .filter(move |t| filter.matches(t))
    }

    /// Resolve a date range against the ledger's fiscal year settings.
    pub fn filter_for_range(
        &self,
        rules_followed_only: bool,
        range: DateRange,
        as_of: NaiveDate,
    ) -> TradeFilter {
        TradeFilter {
            rules_followed_only,
            since: range.start_date(as_of, self.ledger.settings().fiscal_year_start),
        }
    }

    pub fn performance(&self, filter: TradeFilter) -> PerformanceStats {
        PerformanceStats::from_trades(self.filtered(filter))
    }

    /// Fund movements plus realized P/L of every trade, whatever the filter.
    pub fn account_balance(&self) -> f64 {
        self.account_summary().current_balance
    }

    pub fn account_summary(&self) -> AccountSummary {
        AccountSummary::compute(self.ledger.fund_movements(), self.ledger.trades())
    }

    pub fn fund_ledger(&self) -> Vec<FundLedgerEntry<'a>> {
        fund_ledger(self.ledger.fund_movements())
    }

    pub fn equity_curve(&self, filter: TradeFilter) -> Vec<EquityCurvePoint> {
        equity_curve(self.filtered(filter))
    }

    pub fn r_multiples(&self, filter: TradeFilter) -> Vec<f64> {
        self.filtered(filter)
            .filter(|t| t.is_closed())
            .map(|t| t.r_multiple())
            .collect()
    }

    pub fn monte_carlo<R: Rng + ?Sized>(
        &self,
        filter: TradeFilter,
        config: &SimulationConfig,
        rng: &mut R,
    ) -> Result<SimulationResult> {
        simulate(&self.r_multiples(filter), config, rng)
    }
}
