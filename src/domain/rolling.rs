//! Trailing-window statistics over a price sequence.
//!
//! MEAN(n)[i] = sum(P[i-j] for j in 0..n) / n
//! Warmup: the first (n-1) entries are undefined.

use crate::domain::error::QuantError;

#[derive(Debug, Clone, PartialEq)]
pub struct RollingSeries {
    pub window: usize,
    pub values: Vec<Option<f64>>,
}

impl RollingSeries {
    pub fn get(&self, i: usize) -> Option<f64> {
        self.values.get(i).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Simple arithmetic mean over the trailing `window` values.
///
/// Each window is summed afresh, never kept as a running total.
pub fn rolling_mean(values: &[f64], window: usize) -> Result<RollingSeries, QuantError> {
    if window == 0 {
        return Err(QuantError::invalid_parameter("window", "must be at least 1"));
    }

    let warmup = window - 1;
    let out = (0..values.len())
        .map(|i| {
            if i < warmup {
                return None;
            }
            let start = i + 1 - window;
            let sum: f64 = values[start..=i].iter().sum();
            Some(sum / window as f64)
        })
        .collect();

    Ok(RollingSeries {
        window,
        values: out,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn mean_warmup() {
        let series = rolling_mean(&[10.0, 20.0, 30.0, 40.0, 50.0], 3).unwrap();
        assert_eq!(series.len(), 5);
        assert!(series.get(0).is_none());
        assert!(series.get(1).is_none());
        assert!(series.get(2).is_some());
        assert!(series.get(4).is_some());
    }

    #[test]
    fn mean_values() {
        let series = rolling_mean(&[10.0, 20.0, 30.0, 40.0, 50.0], 3).unwrap();
        assert_abs_diff_eq!(series.get(2).unwrap(), 20.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series.get(3).unwrap(), 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(series.get(4).unwrap(), 40.0, epsilon = 1e-12);
    }

    #[test]
    fn window_of_one_is_identity() {
        let series = rolling_mean(&[3.0, 1.0, 4.0], 1).unwrap();
        assert_eq!(series.values, vec![Some(3.0), Some(1.0), Some(4.0)]);
    }

    #[test]
    fn window_longer_than_data() {
        let series = rolling_mean(&[1.0, 2.0], 5).unwrap();
        assert!(series.values.iter().all(Option::is_none));
    }

    #[test]
    fn zero_window_rejected() {
        assert!(matches!(
            rolling_mean(&[1.0], 0),
            Err(QuantError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn constant_input_has_exact_mean() {
        let values = vec![0.1; 50];
        let series = rolling_mean(&values, 10).unwrap();
        for i in 9..50 {
            assert_abs_diff_eq!(series.get(i).unwrap(), 0.1, epsilon = 1e-15);
        }
    }

    #[test]
    fn out_of_range_index_is_none() {
        let series = rolling_mean(&[1.0, 2.0], 1).unwrap();
        assert!(series.get(5).is_none());
    }
}
