//! Linear trend extrapolation.
//!
//! Fits price = intercept + slope * t by ordinary least squares over the
//! index t = 0..n, then extends the line `horizon` steps past the last
//! observation. The band is `prediction ± 1.96 * residual_std`: an approximate
//! 95% band that assumes normal, independent residuals. It is not a
//! calibrated prediction interval and ignores parameter uncertainty.

use crate::domain::error::QuantError;
use crate::domain::metrics::sample_std;
use crate::domain::price::PriceSeries;

/// z-score of the two-sided 95% normal quantile.
pub const CONFIDENCE_Z: f64 = 1.96;

pub const MIN_PREDICTION_POINTS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictionPoint {
    /// Steps past the last observation, starting at 1.
    pub step: usize,
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    pub slope: f64,
    pub intercept: f64,
    pub residual_std: f64,
    pub points: Vec<PredictionPoint>,
}

impl PredictionResult {
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn half_width(&self) -> f64 {
        CONFIDENCE_Z * self.residual_std
    }
}

/// OLS fit of `values` against their index.
pub fn fit_linear_trend(values: &[f64]) -> Result<(f64, f64), QuantError> {
    if values.len() < MIN_PREDICTION_POINTS {
        return Err(QuantError::insufficient(
            "trend fit",
            values.len(),
            MIN_PREDICTION_POINTS,
        ));
    }

    let n = values.len() as f64;
    let mean_x = (n - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, y) in values.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxy += dx * (y - mean_y);
        sxx += dx * dx;
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    Ok((slope, intercept))
}

pub fn predict_trend(prices: &PriceSeries, horizon: usize) -> Result<PredictionResult, QuantError> {
    if horizon == 0 {
        return Err(QuantError::invalid_parameter("horizon", "must be at least 1"));
    }
    let values = prices.prices();
    let (slope, intercept) = fit_linear_trend(&values)?;

    let residuals: Vec<f64> = values
        .iter()
        .enumerate()
        .map(|(i, y)| y - (intercept + slope * i as f64))
        .collect();
    let residual_std = sample_std(&residuals)?;
    let half_width = CONFIDENCE_Z * residual_std;

    let last = values.len() - 1;
    let points = (1..=horizon)
        .map(|step| {
            let value = intercept + slope * (last + step) as f64;
            PredictionPoint {
                step,
                value,
                lower: value - half_width,
                upper: value + half_width,
            }
        })
        .collect();

    tracing::debug!(
        symbol = prices.symbol(),
        slope,
        residual_std,
        horizon,
        "fitted trend"
    );

    Ok(PredictionResult {
        slope,
        intercept,
        residual_std,
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;
    use approx::assert_abs_diff_eq;
    use chrono::NaiveDate;

    fn make_series(prices: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        PriceSeries::new(
            "TEST",
            prices
                .iter()
                .enumerate()
                .map(|(i, &p)| PricePoint::new(start + chrono::Duration::days(i as i64), p))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn fit_exact_line() {
        let (slope, intercept) = fit_linear_trend(&[10.0, 12.0, 14.0, 16.0]).unwrap();
        assert_abs_diff_eq!(slope, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(intercept, 10.0, epsilon = 1e-12);
    }

    #[test]
    fn predicts_past_last_index() {
        let result = predict_trend(&make_series(&[10.0, 12.0, 14.0, 16.0]), 3).unwrap();
        assert_eq!(result.points.len(), 3);
        assert_abs_diff_eq!(result.points[0].value, 18.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.points[2].value, 22.0, epsilon = 1e-9);
        assert_eq!(result.points[0].step, 1);
        assert_abs_diff_eq!(result.residual_std, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn band_is_symmetric() {
        let result = predict_trend(&make_series(&[10.0, 13.0, 11.0, 15.0, 14.0, 17.0]), 5).unwrap();
        assert!(result.residual_std > 0.0);
        for p in &result.points {
            assert_abs_diff_eq!(p.upper - p.value, result.half_width(), epsilon = 1e-9);
            assert_abs_diff_eq!(p.value - p.lower, result.half_width(), epsilon = 1e-9);
        }
        assert_abs_diff_eq!(result.half_width(), 1.96 * result.residual_std);
    }

    #[test]
    fn residual_std_is_sample_std() {
        // y = 1, 3, 1, 3: slope 0.4, intercept 1.4 → residuals -0.4, 1.2, -1.2, 0.4
        let result = predict_trend(&make_series(&[1.0, 3.0, 1.0, 3.0]), 1).unwrap();
        assert_abs_diff_eq!(result.slope, 0.4, epsilon = 1e-12);
        let resid = [-0.4_f64, 1.2, -1.2, 0.4];
        let expected = (resid.iter().map(|r| r * r).sum::<f64>() / 3.0).sqrt();
        assert_abs_diff_eq!(result.residual_std, expected, epsilon = 1e-12);
    }

    #[test]
    fn two_points_is_enough() {
        let result = predict_trend(&make_series(&[5.0, 6.0]), 2).unwrap();
        assert_abs_diff_eq!(result.values()[1], 8.0, epsilon = 1e-12);
    }

    #[test]
    fn one_point_is_not() {
        assert!(matches!(
            predict_trend(&make_series(&[5.0]), 2),
            Err(QuantError::InsufficientData { have: 1, need: 2, .. })
        ));
    }

    #[test]
    fn zero_horizon_rejected() {
        assert!(matches!(
            predict_trend(&make_series(&[5.0, 6.0]), 0),
            Err(QuantError::InvalidParameter { .. })
        ));
    }
}
