//! Price series and aligned multi-asset price tables.

use crate::domain::error::QuantError;
use crate::domain::returns::simple_returns;
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, price: f64) -> Self {
        Self { date, price }
    }

    /// A missing or unusable observation: NaN, infinite, zero or negative.
    pub fn is_gap(&self) -> bool {
        !self.price.is_finite() || self.price <= 0.0
    }
}

/// Price observations for one symbol, strictly increasing by date.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series from untrusted observations.
    ///
    /// Observations are sorted by date and gaps are dropped, never
    /// interpolated. Two observations on the same date are rejected.
    pub fn new(symbol: impl Into<String>, points: Vec<PricePoint>) -> Result<Self, QuantError> {
        let symbol = symbol.into();
        let before = points.len();
        let mut points: Vec<PricePoint> = points.into_iter().filter(|p| !p.is_gap()).collect();
        points.sort_by_key(|p| p.date);

        if let Some(w) = points.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(QuantError::InvalidSeries {
                symbol,
                reason: format!("duplicate observation on {}", w[0].date),
            });
        }

        let dropped = before - points.len();
        if dropped > 0 {
            tracing::debug!(symbol = %symbol, dropped, "dropped gap observations");
        }

        Ok(Self { symbol, points })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.points.iter().map(|p| p.date).collect()
    }

    pub fn first(&self) -> Option<&PricePoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Simple returns, one shorter than the series.
    pub fn returns(&self) -> Result<Vec<f64>, QuantError> {
        simple_returns(&self.prices())
    }

    /// Fail with `InsufficientData` unless at least `need` observations exist.
    pub fn require(&self, need: usize) -> Result<(), QuantError> {
        if self.points.len() < need {
            return Err(QuantError::InsufficientData {
                context: self.symbol.clone(),
                have: self.points.len(),
                need,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceColumn {
    pub symbol: String,
    pub values: Vec<f64>,
}

/// Several price series aligned on the intersection of their dates.
///
/// Every column has exactly `index.len()` values, and columns keep the order
/// in which the series were supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    /// Align series on the dates present in all of them.
    ///
    /// A date missing from any one series drops that row for every column, so
    /// an empty series leaves an empty index.
    pub fn align(series: &[PriceSeries]) -> Result<Self, QuantError> {
        let mut seen = HashSet::new();
        for s in series {
            if !seen.insert(s.symbol()) {
                return Err(QuantError::InvalidSeries {
                    symbol: s.symbol().to_string(),
                    reason: "symbol appears more than once".into(),
                });
            }
        }

        let mut common: Option<BTreeSet<NaiveDate>> = None;
        for s in series {
            let dates: BTreeSet<NaiveDate> = s.points().iter().map(|p| p.date).collect();
            common = Some(match common {
                None => dates,
                Some(acc) => acc.intersection(&dates).copied().collect(),
            });
        }
        let index: Vec<NaiveDate> = common.unwrap_or_default().into_iter().collect();

        let columns = series
            .iter()
            .map(|s| {
                // Both sides are sorted by date, so a merge walk is enough.
                let mut values = Vec::with_capacity(index.len());
                let mut points = s.points().iter();
                for date in &index {
                    for p in points.by_ref() {
                        if p.date == *date {
                            values.push(p.price);
                            break;
                        }
                    }
                }
                PriceColumn {
                    symbol: s.symbol().to_string(),
                    values,
                }
            })
            .collect();

        let table = Self { index, columns };
        tracing::debug!(
            assets = table.column_count(),
            rows = table.row_count(),
            "aligned price table"
        );
        Ok(table)
    }

    pub fn index(&self) -> &[NaiveDate] {
        &self.index
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn symbols(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.symbol.as_str()).collect()
    }

    pub fn column(&self, symbol: &str) -> Option<&PriceColumn> {
        self.columns.iter().find(|c| c.symbol == symbol)
    }

    pub fn row_count(&self) -> usize {
        self.index.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
