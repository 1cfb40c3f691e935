//! CSV file price adapter.
//!
//! One file per symbol, `<base>/<SYMBOL>.csv`, with a header row. The date
//! column is `date`; the price column is `adj close` (or `adj_close`) when
//! present, otherwise `close`. Header matching ignores case. Empty, `NaN` or
//! non-positive prices are treated as gaps and dropped.

use crate::domain::error::QuantError;
use crate::domain::price::{PricePoint, PriceSeries};
use crate::ports::data_port::PriceDataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::PathBuf;

const DATE_COLUMNS: &[&str] = &["date"];
const ADJUSTED_COLUMNS: &[&str] = &["adj close", "adj_close", "adjclose"];
const CLOSE_COLUMNS: &[&str] = &["close"];

#[derive(Debug)]
pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", symbol))
    }
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.contains(&h.trim().to_lowercase().as_str()))
}

fn parse_price(cell: Option<&str>) -> Result<f64, QuantError> {
    match cell.map(str::trim) {
        None | Some("") => Ok(f64::NAN),
        Some(s) if s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("null") => {
            Ok(f64::NAN)
        }
        Some(s) => s.parse().map_err(|e| QuantError::DataSource {
            reason: format!("invalid price value '{}': {}", s, e),
        }),
    }
}

impl PriceDataPort for CsvAdapter {
    fn fetch_prices(
        &self,
        symbol: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<PriceSeries, QuantError> {
        let path = self.csv_path(symbol);
        let content = fs::read_to_string(&path).map_err(|e| QuantError::DataSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| QuantError::DataSource {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let date_col = find_column(&headers, DATE_COLUMNS).ok_or_else(|| QuantError::DataSource {
            reason: format!("{} has no date column", path.display()),
        })?;
        let price_col = match find_column(&headers, ADJUSTED_COLUMNS) {
            Some(col) => col,
            None => find_column(&headers, CLOSE_COLUMNS).ok_or_else(|| QuantError::DataSource {
                reason: format!("{} has no close or adj close column", path.display()),
            })?,
        };

        let mut points = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| QuantError::DataSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(date_col).ok_or_else(|| QuantError::DataSource {
                reason: "missing date value".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").map_err(|e| {
                QuantError::DataSource {
                    reason: format!("invalid date '{}': {}", date_str, e),
                }
            })?;

            if start_date.is_some_and(|s| date < s) || end_date.is_some_and(|e| date > e) {
                continue;
            }

            points.push(PricePoint::new(date, parse_price(record.get(price_col))?));
        }

        tracing::debug!(symbol, rows = points.len(), path = %path.display(), "read price file");
        PriceSeries::new(symbol, points)
    }

    fn list_symbols(&self) -> Result<Vec<String>, QuantError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| QuantError::DataSource {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let mut symbols = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| QuantError::DataSource {
                reason: format!("directory entry error: {}", e),
            })?;

            let path = entry.path();
            let is_csv = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
            if !is_csv {
                continue;
            }
            if let Some(stem) = path.file_stem() {
                symbols.push(stem.to_string_lossy().into_owned());
            }
        }

        symbols.sort();
        Ok(symbols)
    }
}
