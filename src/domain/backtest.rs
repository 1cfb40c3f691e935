//! Single-asset backtest: a lagged signal applied to market returns, compared
//! against buy-and-hold.

use crate::domain::error::QuantError;
use crate::domain::metrics::{MetricsSnapshot, RiskConfig};
use crate::domain::price::PriceSeries;
use crate::domain::returns::cumulative_growth;
use crate::domain::signal::{lag_signal, SignalRule, SignalSeries};
use chrono::NaiveDate;

/// Cumulative curves in this module start at this value.
pub const BASE_INDEX: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub strategy_name: String,
    pub dates: Vec<NaiveDate>,
    pub signal: SignalSeries,
    /// Exposure held over the period ending at each date; `positions[0] = 0`.
    pub positions: Vec<f64>,
    /// Returns indexed by the later of the two prices, so one shorter than `dates`.
    pub market_returns: Vec<f64>,
    pub strategy_returns: Vec<f64>,
    pub strategy_cumulative: Vec<f64>,
    pub benchmark_cumulative: Vec<f64>,
    pub strategy_metrics: MetricsSnapshot,
    pub benchmark_metrics: MetricsSnapshot,
    pub last_price: f64,
}

impl BacktestResult {
    /// Final strategy value minus the base, in index points (percent of start).
    pub fn strategy_total_return_pct(&self) -> f64 {
        self.strategy_cumulative.last().copied().unwrap_or(BASE_INDEX) - BASE_INDEX
    }

    pub fn benchmark_total_return_pct(&self) -> f64 {
        self.benchmark_cumulative.last().copied().unwrap_or(BASE_INDEX) - BASE_INDEX
    }

    /// Fraction of return periods spent invested.
    pub fn exposure(&self) -> f64 {
        let held = self.positions.get(1..).unwrap_or_default();
        if held.is_empty() {
            return 0.0;
        }
        held.iter().sum::<f64>() / held.len() as f64
    }

    pub fn entries(&self) -> usize {
        self.signal.entries()
    }
}

/// Apply positions to market returns.
///
/// `market_returns[t]` is the move from price `t` to `t + 1`, earned by the
/// position held at `t + 1`, which was decided at `t`.
pub fn apply_positions(market_returns: &[f64], positions: &[f64]) -> Result<Vec<f64>, QuantError> {
    if positions.len() != market_returns.len() + 1 {
        return Err(QuantError::degenerate(format!(
            "{} positions cannot be applied to {} returns",
            positions.len(),
            market_returns.len()
        )));
    }
    Ok(market_returns
        .iter()
        .zip(&positions[1..])
        .map(|(r, p)| r * p)
        .collect())
}

pub fn run_backtest(
    prices: &PriceSeries,
    rule: &dyn SignalRule,
    config: &RiskConfig,
) -> Result<BacktestResult, QuantError> {
    let _span = tracing::debug_span!("backtest", symbol = prices.symbol(), rule = %rule.name())
        .entered();

    let market_returns = prices.returns()?;
    let signal = rule.evaluate(prices)?;
    let positions = lag_signal(&signal);
    let strategy_returns = apply_positions(&market_returns, &positions)?;

    let strategy_cumulative = cumulative_growth(&strategy_returns, BASE_INDEX);
    let benchmark_cumulative = cumulative_growth(&market_returns, BASE_INDEX);

    let strategy_metrics = MetricsSnapshot::from_returns(&strategy_returns, config)?;
    let benchmark_metrics = MetricsSnapshot::from_returns(&market_returns, config)?;

    let last_price = prices
        .last()
        .map(|p| p.price)
        .ok_or_else(|| QuantError::insufficient(prices.symbol(), 0, 2))?;

    tracing::debug!(
        periods = market_returns.len(),
        entries = signal.entries(),
        "backtest complete"
    );

    Ok(BacktestResult {
        strategy_name: rule.name(),
        dates: prices.dates(),
        signal,
        positions,
        market_returns,
        strategy_returns,
        strategy_cumulative,
        benchmark_cumulative,
        strategy_metrics,
        benchmark_metrics,
        last_price,
    })
}
