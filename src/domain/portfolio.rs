//! Multi-asset portfolio simulation: weight normalization, weighted value,
//! correlation and diversification effect.

use crate::domain::error::QuantError;
use crate::domain::metrics::{
    annualized_volatility, is_negligible_deviation, MetricsSnapshot, RiskConfig,
};
use crate::domain::price::PriceTable;
use crate::domain::returns::{cumulative_growth, normalize_to_base, simple_returns};
use chrono::NaiveDate;
use std::collections::HashMap;

pub const BASE_INDEX: f64 = 100.0;

/// Negative diversification effects smaller than this are rounding noise.
pub const DIVERSIFICATION_EPSILON: f64 = 1e-12;

/// Normalized weights, one per column of the table they were built for.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightVector {
    pub symbols: Vec<String>,
    pub weights: Vec<f64>,
}

impl WeightVector {
    /// Order raw weights by `symbols`, defaulting absent symbols to 0, and
    /// scale them to sum to 1. An all-zero vector becomes equal weighting.
    pub fn normalize(symbols: &[&str], raw: &HashMap<String, f64>) -> Result<Self, QuantError> {
        if symbols.is_empty() {
            return Err(QuantError::degenerate("cannot weight an empty set of assets"));
        }

        for (symbol, &w) in raw {
            if !w.is_finite() || w < 0.0 {
                return Err(QuantError::degenerate(format!(
                    "weight for {symbol} must be finite and non-negative, got {w}"
                )));
            }
            if !symbols.contains(&symbol.as_str()) {
                tracing::warn!(symbol = %symbol, "weight given for symbol not in price table");
            }
        }

        let ordered: Vec<f64> = symbols
            .iter()
            .map(|s| raw.get(*s).copied().unwrap_or(0.0))
            .collect();
        let sum: f64 = ordered.iter().sum();

        let weights = if sum == 0.0 {
            tracing::debug!("all weights zero, falling back to equal weighting");
            vec![1.0 / symbols.len() as f64; symbols.len()]
        } else {
            ordered.iter().map(|w| w / sum).collect()
        };

        Ok(Self {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            weights,
        })
    }

    pub fn get(&self, symbol: &str) -> Option<f64> {
        self.symbols
            .iter()
            .position(|s| s == symbol)
            .map(|i| self.weights[i])
    }

    pub fn dot(&self, values: &[f64]) -> f64 {
        self.weights.iter().zip(values).map(|(w, v)| w * v).sum()
    }
}

/// Pairwise Pearson correlation; symmetric with a unit diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub symbols: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.symbols.iter().position(|s| s == a)?;
        let j = self.symbols.iter().position(|s| s == b)?;
        Some(self.values[i][j])
    }

    pub fn compute(symbols: &[String], series: &[Vec<f64>]) -> Result<Self, QuantError> {
        let n = series.len();
        let mut values = vec![vec![0.0; n]; n];
        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = pearson(&series[i], &series[j]).ok_or_else(|| {
                    QuantError::degenerate(format!(
                        "correlation of {} and {} is undefined (zero variance)",
                        symbols[i], symbols[j]
                    ))
                })?;
                values[i][j] = r;
                values[j][i] = r;
            }
        }
        Ok(Self {
            symbols: symbols.to_vec(),
            values,
        })
    }
}

fn pearson(a: &[f64], b: &[f64]) -> Option<f64> {
    let n = a.len().min(b.len());
    if n < 2 {
        return None;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (x, y) in a[..n].iter().zip(&b[..n]) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }
    let dof = (n - 1) as f64;
    if is_negligible_deviation((var_a / dof).sqrt(), mean_a)
        || is_negligible_deviation((var_b / dof).sqrt(), mean_b)
    {
        return None;
    }
    Some((cov / (var_a.sqrt() * var_b.sqrt())).clamp(-1.0, 1.0))
}

#[derive(Debug, Clone)]
pub struct AssetCurve {
    pub symbol: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct PortfolioResult {
    pub dates: Vec<NaiveDate>,
    pub weights: WeightVector,
    /// Buy-and-hold value of the weighted basket, base 100.
    pub portfolio_value: Vec<f64>,
    /// Growth of the daily-rebalanced portfolio return, base 100.
    pub rebalanced_growth: Vec<f64>,
    pub asset_curves: Vec<AssetCurve>,
    pub daily_returns: Vec<f64>,
    pub asset_volatilities: Vec<f64>,
    pub annual_return: f64,
    pub annual_volatility: f64,
    pub sharpe_ratio: f64,
    pub diversification_effect: f64,
    pub correlation: CorrelationMatrix,
    pub metrics: MetricsSnapshot,
}

/// Clamp rounding noise below zero; leave real negatives visible.
pub fn settle_diversification(raw: f64) -> f64 {
    if raw < 0.0 && raw.abs() < DIVERSIFICATION_EPSILON {
        0.0
    } else {
        if raw < 0.0 {
            tracing::warn!(effect = raw, "negative diversification effect");
        }
        raw
    }
}

/// Needs at least 3 aligned rows: 2 returns are the minimum for a sample
/// volatility.
pub fn simulate_portfolio(
    table: &PriceTable,
    raw_weights: &HashMap<String, f64>,
    config: &RiskConfig,
) -> Result<PortfolioResult, QuantError> {
    let _span = tracing::debug_span!("portfolio", assets = table.column_count()).entered();

    if table.column_count() < 2 {
        return Err(QuantError::InsufficientAssets {
            have: table.column_count(),
        });
    }
    if table.is_empty() {
        return Err(QuantError::InsufficientAssets { have: 0 });
    }

    let weights = WeightVector::normalize(&table.symbols(), raw_weights)?;
    let rows = table.row_count();

    let mut asset_curves = Vec::with_capacity(table.column_count());
    let mut asset_returns = Vec::with_capacity(table.column_count());
    for col in table.columns() {
        let normalized = normalize_to_base(&col.values, 1.0)?;
        asset_curves.push(AssetCurve {
            symbol: col.symbol.clone(),
            values: normalized.iter().map(|v| v * BASE_INDEX).collect(),
        });
        asset_returns.push(simple_returns(&col.values)?);
    }

    let portfolio_value: Vec<f64> = (0..rows)
        .map(|t| {
            let row: Vec<f64> = asset_curves.iter().map(|c| c.values[t]).collect();
            weights.dot(&row)
        })
        .collect();

    let daily_returns: Vec<f64> = (0..rows - 1)
        .map(|t| {
            let row: Vec<f64> = asset_returns.iter().map(|r| r[t]).collect();
            weights.dot(&row)
        })
        .collect();

    let mut metrics = MetricsSnapshot::from_returns(&daily_returns, config)?;

    let asset_volatilities = asset_returns
        .iter()
        .map(|r| annualized_volatility(r, config.periods_per_year))
        .collect::<Result<Vec<f64>, QuantError>>()?;
    let weighted_vol = weights.dot(&asset_volatilities);
    let diversification_effect =
        settle_diversification(weighted_vol - metrics.annualized_volatility);

    let correlation = CorrelationMatrix::compute(&weights.symbols, &asset_returns)?;

    metrics.diversification_effect = Some(diversification_effect);
    metrics.correlation = Some(correlation.clone());

    tracing::debug!(
        rows,
        volatility = metrics.annualized_volatility,
        diversification_effect,
        "portfolio simulated"
    );

    Ok(PortfolioResult {
        dates: table.index().to_vec(),
        rebalanced_growth: cumulative_growth(&daily_returns, BASE_INDEX),
        portfolio_value,
        asset_curves,
        daily_returns,
        asset_volatilities,
        annual_return: metrics.annualized_return,
        annual_volatility: metrics.annualized_volatility,
        sharpe_ratio: metrics.sharpe_ratio,
        diversification_effect,
        correlation,
        weights,
        metrics,
    })
}
