//! Price data access port.

use crate::domain::error::QuantError;
use crate::domain::price::PriceSeries;
use chrono::NaiveDate;

pub trait PriceDataPort {
    /// Daily closes for `symbol`, restricted to the inclusive date range when
    /// bounds are given. Implementations may return an empty series; callers
    /// decide how much history they need.
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, QuantError>;

    fn list_symbols(&self) -> Result<Vec<String>, QuantError>;
}
