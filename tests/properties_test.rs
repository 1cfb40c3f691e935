//! Property tests over generated return and price series.

mod common;

use common::*;
use proptest::prelude::*;
use quantlens::domain::metrics::{self, RiskConfig, TRADING_DAYS_PER_YEAR};
use quantlens::domain::portfolio::WeightVector;
use quantlens::domain::returns::{cumulative_growth, growth_to_returns, simple_returns};
use quantlens::domain::signal::{lag_signal, SignalRule, SmaCrossover, FLAT};
use std::collections::HashMap;

fn returns_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-0.2f64..0.2, 2..200)
}

fn prices_strategy() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(1.0f64..500.0, 2..200)
}

proptest! {
    #[test]
    fn constant_returns_annualize_linearly(c in -0.01f64..0.01, n in 2usize..300) {
        let returns = vec![c; n];
        let annual = metrics::annualized_return(&returns, TRADING_DAYS_PER_YEAR).unwrap();
        prop_assert!((annual - c * 252.0).abs() < 1e-9);
        prop_assert_eq!(metrics::annualized_volatility(&returns, TRADING_DAYS_PER_YEAR).unwrap(), 0.0);
        prop_assert_eq!(metrics::sharpe_ratio(&returns, 0.01, TRADING_DAYS_PER_YEAR).unwrap(), 0.0);
        if c >= 0.0 {
            prop_assert_eq!(metrics::max_drawdown(&returns).unwrap(), 0.0);
        }
    }

    #[test]
    fn constant_growth_prices_have_zero_risk(
        c in -0.01f64..0.01,
        p0 in 1.0f64..1000.0,
        n in 3usize..300,
    ) {
        let returns = make_series("C", &generate_prices(n, p0, c)).returns().unwrap();
        let snapshot = metrics::MetricsSnapshot::from_returns(&returns, &RiskConfig::default()).unwrap();
        prop_assert_eq!(snapshot.annualized_volatility, 0.0);
        prop_assert_eq!(snapshot.sharpe_ratio, 0.0);
        prop_assert!((snapshot.annualized_return - c * 252.0).abs() < 1e-9);
        if c > 1e-9 {
            prop_assert_eq!(snapshot.sortino_ratio, 0.0);
            prop_assert_eq!(snapshot.max_drawdown, 0.0);
        }
    }

    #[test]
    fn growth_round_trips(returns in returns_strategy()) {
        let growth = cumulative_growth(&returns, 1.0);
        prop_assert_eq!(growth.len(), returns.len() + 1);
        let back = growth_to_returns(&growth).unwrap();
        prop_assert_eq!(back.len(), returns.len());
        for (a, b) in back.iter().zip(&returns) {
            prop_assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn drawdown_is_bounded(returns in returns_strategy()) {
        let mdd = metrics::max_drawdown(&returns).unwrap();
        prop_assert!(mdd <= 0.0);
        prop_assert!(mdd > -1.0);
        let series = metrics::drawdown_series(&returns).unwrap();
        prop_assert!(series.iter().all(|d| *d <= 0.0 && *d >= mdd));
    }

    #[test]
    fn returns_are_one_shorter_and_finite(prices in prices_strategy()) {
        let returns = simple_returns(&prices).unwrap();
        prop_assert_eq!(returns.len(), prices.len() - 1);
        prop_assert!(returns.iter().all(|r| r.is_finite()));
    }

    #[test]
    fn metrics_are_finite(returns in returns_strategy(), rf in 0.0f64..0.1) {
        let snapshot = metrics::MetricsSnapshot::from_returns(
            &returns,
            &RiskConfig::default().with_risk_free_rate(rf),
        )
        .unwrap();
        prop_assert!(snapshot.annualized_volatility >= 0.0);
        prop_assert!(snapshot.sharpe_ratio.is_finite());
        prop_assert!(snapshot.sortino_ratio.is_finite());
        prop_assert!(snapshot.total_return.is_finite());
    }

    #[test]
    fn sma_signal_is_flat_during_warmup(
        prices in prop::collection::vec(1.0f64..500.0, 30..150),
        short in 1usize..10,
        long in 10usize..25,
    ) {
        let rule = SmaCrossover { short_window: short, long_window: long };
        let signal = rule.evaluate(&make_series("P", &prices)).unwrap();
        prop_assert_eq!(signal.len(), prices.len());
        prop_assert!(signal.values[..long].iter().all(|&v| v == FLAT));
        prop_assert!(signal.values.iter().all(|&v| v == 0.0 || v == 1.0));

        let positions = lag_signal(&signal);
        prop_assert_eq!(positions.len(), signal.len());
        prop_assert_eq!(positions[0], FLAT);
        prop_assert_eq!(&positions[1..], &signal.values[..signal.len() - 1]);
    }

    #[test]
    fn strictly_rising_prices_go_long_after_warmup(
        start in 10.0f64..100.0,
        rate in 0.001f64..0.05,
        long in 3usize..20,
    ) {
        let prices = generate_prices(long + 20, start, rate);
        let rule = SmaCrossover { short_window: 1, long_window: long };
        let signal = rule.evaluate(&make_series("UP", &prices)).unwrap();
        prop_assert!(signal.values[long..].iter().all(|&v| v == 1.0));
    }

    #[test]
    fn normalized_weights_sum_to_one(raw in prop::collection::vec(0.0f64..10.0, 2..8)) {
        let symbols: Vec<String> = (0..raw.len()).map(|i| format!("S{i}")).collect();
        let refs: Vec<&str> = symbols.iter().map(String::as_str).collect();
        let map: HashMap<String, f64> = symbols.iter().cloned().zip(raw.iter().copied()).collect();

        let weights = WeightVector::normalize(&refs, &map).unwrap();
        let sum: f64 = weights.weights.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        prop_assert!(weights.weights.iter().all(|w| *w >= 0.0));
    }
}
