//! Simple returns and cumulative growth curves.

use crate::domain::error::QuantError;

/// `r[t] = p[t+1] / p[t] - 1`, one element shorter than `prices`.
pub fn simple_returns(prices: &[f64]) -> Result<Vec<f64>, QuantError> {
    if prices.len() < 2 {
        return Err(QuantError::insufficient("returns", prices.len(), 2));
    }
    Ok(prices.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Running product of `(1 + r)` scaled by `base`.
///
/// The curve starts with `base` itself, so it has one more point than
/// `returns` and lines up with the price index the returns came from.
pub fn cumulative_growth(returns: &[f64], base: f64) -> Vec<f64> {
    let mut curve = Vec::with_capacity(returns.len() + 1);
    let mut value = base;
    curve.push(value);
    for r in returns {
        value *= 1.0 + r;
        curve.push(value);
    }
    curve
}

/// Inverse of [`cumulative_growth`]: `g[t] / g[t-1] - 1`.
pub fn growth_to_returns(growth: &[f64]) -> Result<Vec<f64>, QuantError> {
    if growth.len() < 2 {
        return Err(QuantError::insufficient("growth curve", growth.len(), 2));
    }
    if growth[..growth.len() - 1].contains(&0.0) {
        return Err(QuantError::degenerate("growth curve reaches zero"));
    }
    Ok(growth.windows(2).map(|w| w[1] / w[0] - 1.0).collect())
}

/// Rescale prices so the first observation equals `base`.
pub fn normalize_to_base(prices: &[f64], base: f64) -> Result<Vec<f64>, QuantError> {
    let first = *prices
        .first()
        .ok_or_else(|| QuantError::insufficient("normalization", 0, 1))?;
    if first == 0.0 || !first.is_finite() {
        return Err(QuantError::degenerate("first price must be finite and non-zero"));
    }
    Ok(prices.iter().map(|p| base * p / first).collect())
}
