//! End-of-day summary for a single symbol.

use crate::domain::error::QuantError;
use crate::domain::metrics::{annualized_volatility, max_drawdown, RiskConfig};
use crate::domain::price::PriceSeries;
use chrono::{NaiveDate, NaiveDateTime};

/// Two returns are needed for a volatility figure.
pub const MIN_REPORT_POINTS: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub symbol: String,
    pub generated_at: NaiveDateTime,
    pub as_of: NaiveDate,
    pub last_close: f64,
    pub previous_close: f64,
    pub daily_return: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
}

impl DailyReport {
    pub fn from_series(
        prices: &PriceSeries,
        config: &RiskConfig,
        generated_at: NaiveDateTime,
    ) -> Result<Self, QuantError> {
        prices.require(MIN_REPORT_POINTS)?;
        let points = prices.points();
        let last = points[points.len() - 1];
        let previous = points[points.len() - 2];

        let returns = prices.returns()?;
        let report = DailyReport {
            symbol: prices.symbol().to_string(),
            generated_at,
            as_of: last.date,
            last_close: last.price,
            previous_close: previous.price,
            daily_return: last.price / previous.price - 1.0,
            annualized_volatility: annualized_volatility(&returns, config.periods_per_year)?,
            max_drawdown: max_drawdown(&returns)?,
        };
        tracing::debug!(symbol = %report.symbol, as_of = %report.as_of, "built daily report");
        Ok(report)
    }
}
