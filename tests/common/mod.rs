#![allow(dead_code)]

use chrono::NaiveDate;
use quantlens::domain::error::QuantError;
use quantlens::domain::price::{PricePoint, PriceSeries};
use quantlens::ports::data_port::PriceDataPort;
use std::collections::HashMap;

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PricePoint>>,
    pub errors: HashMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_prices(mut self, symbol: &str, points: Vec<PricePoint>) -> Self {
        self.data.insert(symbol.to_string(), points);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl PriceDataPort for MockDataPort {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, QuantError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(QuantError::DataSource {
                reason: reason.clone(),
            });
        }
        let points = self
            .data
            .get(symbol)
            .cloned()
            .unwrap_or_default()
            .into_iter()
            .filter(|p| start_date.is_none_or(|s| p.date >= s))
            .filter(|p| end_date.is_none_or(|e| p.date <= e))
            .collect();
        PriceSeries::new(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let mut symbols: Vec<String> = self.data.keys().cloned().collect();
        symbols.sort();
        Ok(symbols)
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Consecutive daily points starting at `start`.
pub fn make_points(start: &str, prices: &[f64]) -> Vec<PricePoint> {
    let start = NaiveDate::parse_from_str(start, "%Y-%m-%d").unwrap();
    prices
        .iter()
        .enumerate()
        .map(|(i, &p)| PricePoint::new(start + chrono::Duration::days(i as i64), p))
        .collect()
}

pub fn make_series(symbol: &str, prices: &[f64]) -> PriceSeries {
    PriceSeries::new(symbol, make_points("2024-01-01", prices)).unwrap()
}

/// Prices compounding at a fixed rate per period.
pub fn generate_prices(count: usize, start_price: f64, rate: f64) -> Vec<f64> {
    (0..count)
        .map(|i| start_price * (1.0 + rate).powi(i as i32))
        .collect()
}

/// Deterministic oscillating prices around a drift.
pub fn generate_wave(count: usize, start_price: f64, drift: f64, amplitude: f64) -> Vec<f64> {
    (0..count)
        .map(|i| {
            let t = i as f64;
            start_price + drift * t + amplitude * (t * 0.37).sin()
        })
        .collect()
}

/// Render closes as a CSV file body with a `Date,Close` header.
pub fn csv_body(points: &[PricePoint]) -> String {
    let mut out = String::from("Date,Close\n");
    for p in points {
        out.push_str(&format!("{},{}\n", p.date, p.price));
    }
    out
}
