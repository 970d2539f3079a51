use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{JournalError, Result};

/// Closed trades needed before resampling means anything.
pub const MIN_SIMULATION_TRADES: usize = 5;

/// Bootstrap simulation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationConfig {
    /// Independent equity paths.
    pub simulations: usize,
    /// Trades drawn per path.
    pub periods: usize,
    /// Fraction of equity risked per trade; each draw moves equity by `r * risk_fraction`.
    pub risk_fraction: f64,
    /// Histogram bin count.
    pub bins: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            simulations: 1000,
            periods: 100,
            risk_fraction: 0.01,
            bins: 20,
        }
    }
}

impl SimulationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.simulations == 0 {
            return Err(JournalError::validation("Simulation count must be positive"));
        }
        if self.periods == 0 {
            return Err(JournalError::validation("Period count must be positive"));
        }
        if self.bins == 0 {
            return Err(JournalError::validation("Histogram bin count must be positive"));
        }
        if !(self.risk_fraction > 0.0 && self.risk_fraction.is_finite()) {
            return Err(JournalError::validation("Risk fraction must be a positive number"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub percentile_5: f64,
    pub percentile_95: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// Final equity multiplier per path, in path order.
    pub final_equities: Vec<f64>,
    pub histogram: Vec<HistogramBin>,
    pub summary: SimulationSummary,
}

/// Resample historical R-multiples with replacement.
///
/// Every path starts at equity 1.0 and draws `periods` R-multiples uniformly
/// from `r_multiples`, adding `r * risk_fraction` each time. The randomness
/// source is injected so runs can be seeded.
pub fn simulate<R: Rng + ?Sized>(
    r_multiples: &[f64],
    config: &SimulationConfig,
    rng: &mut R,
) -> Result<SimulationResult> {
    config.validate()?;

    if r_multiples.len() < MIN_SIMULATION_TRADES {
        return Err(JournalError::InsufficientData {
            required: MIN_SIMULATION_TRADES,
            available: r_multiples.len(),
        });
    }

    log::debug!(
        "Running {} simulation paths of {} periods over {} R-multiples",
        config.simulations,
        config.periods,
        r_multiples.len()
    );

    let final_equities: Vec<f64> = (0..config.simulations)
        .map(|_| {
            let mut equity = 1.0;
            for _ in 0..config.periods {
                let r = r_multiples[rng.gen_range(0..r_multiples.len())];
                equity += r * config.risk_fraction;
            }
            equity
        })
        .collect();

    let histogram = histogram(&final_equities, config.bins);
    let summary = summarize(&final_equities);

    Ok(SimulationResult {
        final_equities,
        histogram,
        summary,
    })
}

/// Linear bins from the smallest to the largest value; the maximum falls in
/// the last bin. When every value is equal a single bin holds them all.
pub fn histogram(values: &[f64], bin_count: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bin_count == 0 {
        return Vec::new();
    }

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if max == min {
        return vec![HistogramBin {
            lower: min,
            upper: max,
            count: values.len(),
        }];
    }

    let width = (max - min) / bin_count as f64;
    let mut bins: Vec<HistogramBin> = (0..bin_count)
        .map(|i| HistogramBin {
            lower: min + width * i as f64,
            upper: if i + 1 == bin_count {
                max
            } else {
                min + width * (i + 1) as f64
            },
            count: 0,
        })
        .collect();

    for value in values {
        let index = (((value - min) / width).floor() as usize).min(bin_count - 1);
        bins[index].count += 1;
    }

    bins
}

fn summarize(values: &[f64]) -> SimulationSummary {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mean = sorted.iter().sum::<f64>() / sorted.len() as f64;

    SimulationSummary {
        min: sorted[0],
        max: sorted[sorted.len() - 1],
        mean,
        median: percentile(&sorted, 50.0),
        percentile_5: percentile(&sorted, 5.0),
        percentile_95: percentile(&sorted, 95.0),
    }
}

/// Nearest-rank percentile over already sorted values.
fn percentile(sorted: &[f64], pct: f64) -> f64 {
    let rank = ((pct / 100.0) * sorted.len() as f64).ceil() as usize;
    sorted[rank.clamp(1, sorted.len()) - 1]
}
