//! Risk and performance metrics over a return series.
//!
//! Every function takes the return series by slice and the annualization
//! parameters explicitly; nothing here reads ambient defaults.

use crate::domain::error::QuantError;
use crate::domain::portfolio::CorrelationMatrix;
use crate::domain::returns::cumulative_growth;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Per-period deviations at or below this, scaled by `1 + |mean|`, are
/// rounding noise from price ratios and count as exactly zero.
pub const ZERO_DEVIATION_TOLERANCE: f64 = 1e-12;

/// Annualization and risk-free parameters threaded through every metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskConfig {
    pub periods_per_year: f64,
    /// Annual rate, e.g. 0.02 for 2%.
    pub risk_free_rate: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            periods_per_year: TRADING_DAYS_PER_YEAR,
            risk_free_rate: 0.0,
        }
    }
}

impl RiskConfig {
    pub fn new(periods_per_year: f64, risk_free_rate: f64) -> Self {
        Self {
            periods_per_year,
            risk_free_rate,
        }
    }

    pub fn with_risk_free_rate(self, risk_free_rate: f64) -> Self {
        Self {
            risk_free_rate,
            ..self
        }
    }
}

/// Metrics for one analysis run. Built once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsSnapshot {
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Fraction <= 0; 0 means the curve never fell below a prior peak.
    pub max_drawdown: f64,
    /// Longest run of periods spent below a prior peak.
    pub max_drawdown_duration: usize,
    pub diversification_effect: Option<f64>,
    pub correlation: Option<CorrelationMatrix>,
}

impl MetricsSnapshot {
    pub fn from_returns(returns: &[f64], config: &RiskConfig) -> Result<Self, QuantError> {
        let ppy = config.periods_per_year;
        let rf = config.risk_free_rate;

        let snapshot = MetricsSnapshot {
            total_return: total_return(returns)?,
            annualized_return: annualized_return(returns, ppy)?,
            annualized_volatility: annualized_volatility(returns, ppy)?,
            sharpe_ratio: sharpe_ratio(returns, rf, ppy)?,
            sortino_ratio: sortino_ratio(returns, rf, ppy)?,
            max_drawdown: max_drawdown(returns)?,
            max_drawdown_duration: max_drawdown_duration(returns)?,
            diversification_effect: None,
            correlation: None,
        };
        tracing::debug!(
            periods = returns.len(),
            sharpe = snapshot.sharpe_ratio,
            max_drawdown = snapshot.max_drawdown,
            "computed metrics snapshot"
        );
        Ok(snapshot)
    }
}

fn check_returns(returns: &[f64], context: &str, need: usize) -> Result<(), QuantError> {
    if returns.len() < need {
        return Err(QuantError::insufficient(context, returns.len(), need));
    }
    if let Some(r) = returns.iter().find(|r| !r.is_finite()) {
        return Err(QuantError::degenerate(format!(
            "{context}: non-finite return {r}"
        )));
    }
    Ok(())
}

fn check_periods(periods_per_year: f64) -> Result<(), QuantError> {
    if !(periods_per_year.is_finite() && periods_per_year > 0.0) {
        return Err(QuantError::invalid_parameter(
            "periods_per_year",
            "must be a positive number",
        ));
    }
    Ok(())
}

pub fn mean(returns: &[f64]) -> Result<f64, QuantError> {
    check_returns(returns, "mean", 1)?;
    Ok(returns.iter().sum::<f64>() / returns.len() as f64)
}

/// True when `deviation` is within rounding noise of zero for values around
/// `mean`.
pub fn is_negligible_deviation(deviation: f64, mean: f64) -> bool {
    deviation <= ZERO_DEVIATION_TOLERANCE * (1.0 + mean.abs())
}

/// Sample standard deviation (n - 1 denominator).
///
/// A series whose values are all identical, or identical up to rounding
/// noise, has a deviation of exactly 0.
pub fn sample_std(returns: &[f64]) -> Result<f64, QuantError> {
    check_returns(returns, "standard deviation", 2)?;
    if returns.iter().all(|r| *r == returns[0]) {
        return Ok(0.0);
    }
    let m = returns.iter().sum::<f64>() / returns.len() as f64;
    let variance = returns.iter().map(|r| (r - m).powi(2)).sum::<f64>()
        / (returns.len() - 1) as f64;
    let deviation = variance.sqrt();
    if is_negligible_deviation(deviation, m) {
        return Ok(0.0);
    }
    Ok(deviation)
}

pub fn annualized_return(returns: &[f64], periods_per_year: f64) -> Result<f64, QuantError> {
    check_periods(periods_per_year)?;
    Ok(mean(returns)? * periods_per_year)
}

pub fn annualized_volatility(returns: &[f64], periods_per_year: f64) -> Result<f64, QuantError> {
    check_periods(periods_per_year)?;
    Ok(sample_std(returns)? * periods_per_year.sqrt())
}

/// `(annualized return - risk_free_rate) / annualized volatility`, or exactly
/// 0 when volatility is 0.
pub fn sharpe_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: f64,
) -> Result<f64, QuantError> {
    let vol = annualized_volatility(returns, periods_per_year)?;
    if vol == 0.0 {
        return Ok(0.0);
    }
    let excess = annualized_return(returns, periods_per_year)? - risk_free_rate;
    Ok(excess / vol)
}

/// Like Sharpe, but only returns below the per-period risk-free rate count
/// towards the deviation. 0 when there is no downside.
pub fn sortino_ratio(
    returns: &[f64],
    risk_free_rate: f64,
    periods_per_year: f64,
) -> Result<f64, QuantError> {
    check_returns(returns, "sortino ratio", 2)?;
    check_periods(periods_per_year)?;

    let per_period_rf = risk_free_rate / periods_per_year;
    let n = returns.len() as f64;
    let downside_sq: f64 = returns
        .iter()
        .filter(|&&r| r < per_period_rf)
        .map(|&r| (r - per_period_rf).powi(2))
        .sum();
    let per_period_dev = (downside_sq / n).sqrt();
    if is_negligible_deviation(per_period_dev, per_period_rf) {
        return Ok(0.0);
    }

    let downside_dev = per_period_dev * periods_per_year.sqrt();
    let excess = annualized_return(returns, periods_per_year)? - risk_free_rate;
    Ok(excess / downside_dev)
}

/// Growth of 1 compounded over the whole series, minus 1.
pub fn total_return(returns: &[f64]) -> Result<f64, QuantError> {
    check_returns(returns, "total return", 1)?;
    let growth = cumulative_growth(returns, 1.0);
    Ok(growth[growth.len() - 1] - 1.0)
}

/// Drawdown at every point of the growth curve, including its base point.
pub fn drawdown_series(returns: &[f64]) -> Result<Vec<f64>, QuantError> {
    check_returns(returns, "drawdown", 1)?;
    let growth = cumulative_growth(returns, 1.0);

    let mut peak = growth[0];
    Ok(growth
        .iter()
        .map(|&g| {
            if g > peak {
                peak = g;
            }
            (g - peak) / peak
        })
        .collect())
}

/// Most negative drawdown. Values are <= 0.
pub fn max_drawdown(returns: &[f64]) -> Result<f64, QuantError> {
    let dd = drawdown_series(returns)?;
    Ok(dd.into_iter().fold(0.0, f64::min))
}

pub fn max_drawdown_duration(returns: &[f64]) -> Result<usize, QuantError> {
    let dd = drawdown_series(returns)?;

    let mut longest = 0usize;
    let mut current = 0usize;
    for d in dd {
        if d < 0.0 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    Ok(longest)
}
