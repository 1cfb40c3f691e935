//! Rule-based exposure signals.
//!
//! A rule maps a price series to a 0/1 target exposure per date, using only
//! prices up to and including that date. Signals are never shifted here: the
//! consumer applies [`lag_signal`] before multiplying into returns.

use crate::domain::error::QuantError;
use crate::domain::price::PriceSeries;
use crate::domain::rolling::rolling_mean;
use chrono::NaiveDate;
use std::fmt;

pub const FLAT: f64 = 0.0;
pub const LONG: f64 = 1.0;

/// Target exposure per date, aligned with the price series it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl SignalSeries {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Number of flat-to-long transitions.
    pub fn entries(&self) -> usize {
        let mut prev = FLAT;
        let mut count = 0;
        for &v in &self.values {
            if v == LONG && prev == FLAT {
                count += 1;
            }
            prev = v;
        }
        count
    }
}

/// A trading rule that can turn prices into a signal.
pub trait SignalRule: fmt::Debug {
    fn name(&self) -> String;

    /// First index at which the rule may emit a long signal.
    fn warmup(&self) -> usize;

    fn evaluate(&self, prices: &PriceSeries) -> Result<SignalSeries, QuantError>;
}

/// Long while the short moving average is strictly above the long one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmaCrossover {
    pub short_window: usize,
    pub long_window: usize,
}

impl SignalRule for SmaCrossover {
    fn name(&self) -> String {
        format!("SMA_CROSSOVER({},{})", self.short_window, self.long_window)
    }

    fn warmup(&self) -> usize {
        self.short_window.max(self.long_window)
    }

    fn evaluate(&self, prices: &PriceSeries) -> Result<SignalSeries, QuantError> {
        check_window("short_window", self.short_window)?;
        check_window("long_window", self.long_window)?;
        prices.require(self.warmup() + 1)?;

        let closes = prices.prices();
        let short = rolling_mean(&closes, self.short_window)?;
        let long = rolling_mean(&closes, self.long_window)?;

        let signal = emit(prices, self.warmup(), |i| match (short.get(i), long.get(i)) {
            (Some(s), Some(l)) => s > l,
            _ => false,
        });
        tracing::debug!(rule = %self.name(), entries = signal.entries(), "evaluated signal");
        Ok(signal)
    }
}

/// Long while price is strictly above its trailing mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Momentum {
    pub lookback: usize,
}

impl SignalRule for Momentum {
    fn name(&self) -> String {
        format!("MOMENTUM({})", self.lookback)
    }

    fn warmup(&self) -> usize {
        self.lookback
    }

    fn evaluate(&self, prices: &PriceSeries) -> Result<SignalSeries, QuantError> {
        check_window("lookback", self.lookback)?;
        prices.require(self.warmup() + 1)?;

        let closes = prices.prices();
        let mean = rolling_mean(&closes, self.lookback)?;

        let signal = emit(prices, self.warmup(), |i| match mean.get(i) {
            Some(m) => closes[i] > m,
            None => false,
        });
        tracing::debug!(rule = %self.name(), entries = signal.entries(), "evaluated signal");
        Ok(signal)
    }
}

/// Built-in rules, selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    SmaCrossover(SmaCrossover),
    Momentum(Momentum),
}

impl Strategy {
    pub fn sma_crossover(short_window: usize, long_window: usize) -> Self {
        Strategy::SmaCrossover(SmaCrossover {
            short_window,
            long_window,
        })
    }

    pub fn momentum(lookback: usize) -> Self {
        Strategy::Momentum(Momentum { lookback })
    }

    fn rule(&self) -> &dyn SignalRule {
        match self {
            Strategy::SmaCrossover(r) => r,
            Strategy::Momentum(r) => r,
        }
    }
}

impl SignalRule for Strategy {
    fn name(&self) -> String {
        self.rule().name()
    }

    fn warmup(&self) -> usize {
        self.rule().warmup()
    }

    fn evaluate(&self, prices: &PriceSeries) -> Result<SignalSeries, QuantError> {
        self.rule().evaluate(prices)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Positions actually held, aligned with the price index.
///
/// `position[t] = signal[t - 1]` and `position[0] = 0`: a signal computed
/// from the close at `t` can only be acted on for the period after `t`.
pub fn lag_signal(signal: &SignalSeries) -> Vec<f64> {
    if signal.values.is_empty() {
        return Vec::new();
    }
    let mut positions = Vec::with_capacity(signal.values.len());
    positions.push(FLAT);
    positions.extend_from_slice(&signal.values[..signal.values.len() - 1]);
    positions
}

fn check_window(name: &str, window: usize) -> Result<(), QuantError> {
    if window == 0 {
        return Err(QuantError::invalid_parameter(name, "must be at least 1"));
    }
    Ok(())
}

fn emit(prices: &PriceSeries, warmup: usize, is_long: impl Fn(usize) -> bool) -> SignalSeries {
    let values = (0..prices.len())
        .map(|i| {
            if i >= warmup && is_long(i) {
                LONG
            } else {
                FLAT
            }
        })
        .collect();
    SignalSeries {
        dates: prices.dates(),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::price::PricePoint;

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

    fn rising(n: usize) -> PriceSeries {
        make_series(&(0..n).map(|i| 100.0 + i as f64).collect::<Vec<_>>())
    }

    #[test]
    fn sma_flat_during_warmup() {
        let rule = SmaCrossover {
            short_window: 3,
            long_window: 5,
        };
        let signal = rule.evaluate(&rising(20)).unwrap();
        assert_eq!(signal.len(), 20);
        for i in 0..5 {
            assert_eq!(signal.values[i], FLAT, "index {i}");
        }
    }

    #[test]
    fn sma_long_on_rising_prices_after_warmup() {
        let rule = SmaCrossover {
            short_window: 3,
            long_window: 5,
        };
        let signal = rule.evaluate(&rising(20)).unwrap();
        for i in 5..20 {
            assert_eq!(signal.values[i], LONG, "index {i}");
        }
        assert_eq!(signal.entries(), 1);
    }

    #[test]
    fn sma_flat_on_falling_prices() {
        let prices: Vec<f64> = (0..20).map(|i| 200.0 - i as f64).collect();
        let rule = SmaCrossover {
            short_window: 3,
            long_window: 5,
        };
        let signal = rule.evaluate(&make_series(&prices)).unwrap();
        assert!(signal.values.iter().all(|&v| v == FLAT));
    }

    #[test]
    fn sma_crossover_turns_on_and_off() {
        let prices = [10.0, 10.0, 10.0, 10.0, 12.0, 14.0, 16.0, 8.0, 6.0, 4.0];
        let rule = SmaCrossover {
            short_window: 2,
            long_window: 4,
        };
        let signal = rule.evaluate(&make_series(&prices)).unwrap();
        // idx 4: short (10+12)/2=11 > long 10.5 → long
        // idx 7: short 12 < long 12.5 → flat
        assert_eq!(
            signal.values,
            vec![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn sma_window_order_not_enforced() {
        let rule = SmaCrossover {
            short_window: 5,
            long_window: 3,
        };
        let signal = rule.evaluate(&rising(20)).unwrap();
        // "short" is the slower average here, so it sits below the "long" one.
        assert!(signal.values.iter().all(|&v| v == FLAT));
        assert_eq!(rule.warmup(), 5);
    }

    #[test]
    fn sma_equal_windows_never_long() {
        let rule = SmaCrossover {
            short_window: 4,
            long_window: 4,
        };
        let signal = rule.evaluate(&rising(20)).unwrap();
        assert!(signal.values.iter().all(|&v| v == FLAT));
    }

    #[test]
    fn sma_zero_window_rejected() {
        let rule = SmaCrossover {
            short_window: 0,
            long_window: 4,
        };
        assert!(matches!(
            rule.evaluate(&rising(20)),
            Err(QuantError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn sma_series_too_short() {
        let rule = SmaCrossover {
            short_window: 3,
            long_window: 5,
        };
        assert!(matches!(
            rule.evaluate(&rising(5)),
            Err(QuantError::InsufficientData { have: 5, need: 6, .. })
        ));
        assert!(rule.evaluate(&rising(6)).is_ok());
    }

    #[test]
    fn momentum_long_above_mean() {
        let rule = Momentum { lookback: 3 };
        let signal = rule.evaluate(&rising(10)).unwrap();
        assert_eq!(&signal.values[..3], &[FLAT, FLAT, FLAT]);
        assert!(signal.values[3..].iter().all(|&v| v == LONG));
    }

    #[test]
    fn momentum_flat_below_mean() {
        let prices = [10.0, 11.0, 12.0, 13.0, 9.0, 8.0];
        let rule = Momentum { lookback: 2 };
        let signal = rule.evaluate(&make_series(&prices)).unwrap();
        assert_eq!(signal.values, vec![0.0, 0.0, 1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn momentum_lookback_one_never_long() {
        let rule = Momentum { lookback: 1 };
        let signal = rule.evaluate(&rising(10)).unwrap();
        assert!(signal.values.iter().all(|&v| v == FLAT));
    }

    #[test]
    fn signal_does_not_depend_on_future_prices() {
        let rule = SmaCrossover {
            short_window: 2,
            long_window: 4,
        };
        let base = [10.0, 11.0, 12.0, 11.0, 13.0, 14.0, 12.0, 15.0];
        let mut altered = base;
        altered[7] = 1.0;

        let a = rule.evaluate(&make_series(&base)).unwrap();
        let b = rule.evaluate(&make_series(&altered)).unwrap();
        assert_eq!(a.values[..7], b.values[..7]);
    }

    #[test]
    fn strategy_enum_delegates() {
        let s = Strategy::sma_crossover(3, 5);
        let direct = SmaCrossover {
            short_window: 3,
            long_window: 5,
        };
        let series = rising(12);
        assert_eq!(s.evaluate(&series).unwrap(), direct.evaluate(&series).unwrap());
        assert_eq!(s.warmup(), 5);
        assert_eq!(s.to_string(), "SMA_CROSSOVER(3,5)");
        assert_eq!(Strategy::momentum(20).to_string(), "MOMENTUM(20)");
    }

    #[test]
    fn custom_rules_plug_in() {
        #[derive(Debug)]
        struct AlwaysLong;

        impl SignalRule for AlwaysLong {
            fn name(&self) -> String {
                "ALWAYS".into()
            }
            fn warmup(&self) -> usize {
                0
            }
            fn evaluate(&self, prices: &PriceSeries) -> Result<SignalSeries, QuantError> {
                Ok(emit(prices, 0, |_| true))
            }
        }

        let rule: &dyn SignalRule = &AlwaysLong;
        let signal = rule.evaluate(&rising(4)).unwrap();
        assert_eq!(signal.values, vec![1.0; 4]);
    }

    #[test]
    fn lag_shifts_by_one_period() {
        let signal = SignalSeries {
            dates: vec![],
            values: vec![1.0, 0.0, 1.0, 1.0],
        };
        assert_eq!(lag_signal(&signal), vec![0.0, 1.0, 0.0, 1.0]);
    }

    #[test]
    fn lag_of_single_value_is_flat() {
        let signal = SignalSeries {
            dates: vec![],
            values: vec![1.0],
        };
        assert_eq!(lag_signal(&signal), vec![0.0]);
    }

    #[test]
    fn lag_of_empty_is_empty() {
        let signal = SignalSeries {
            dates: vec![],
            values: vec![],
        };
        assert!(lag_signal(&signal).is_empty());
    }

    #[test]
    fn entries_counts_transitions() {
        let signal = SignalSeries {
            dates: vec![],
            values: vec![0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
        };
        assert_eq!(signal.entries(), 2);
    }
}
