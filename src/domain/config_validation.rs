//! Configuration validation.
//!
//! Every field is checked before any data is loaded, so a bad key fails fast
//! with the section and key that caused it.

use crate::domain::error::QuantError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const STRATEGY_SMA_CROSSOVER: &str = "sma_crossover";
pub const STRATEGY_MOMENTUM: &str = "momentum";

pub const DEFAULT_SHORT_WINDOW: i64 = 20;
pub const DEFAULT_LONG_WINDOW: i64 = 100;
pub const DEFAULT_LOOKBACK: i64 = 20;
pub const DEFAULT_HORIZON: i64 = 30;

/// Validate every section a run may touch. `[portfolio]` is only checked when
/// it lists symbols.
pub fn validate_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    validate_data_config(config)?;
    validate_analysis_config(config)?;
    validate_strategy_config(config)?;
    validate_prediction_config(config)?;
    if config.get_string("portfolio", "symbols").is_some() {
        validate_portfolio_config(config)?;
    }
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    match config.get_string("data", "path") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(QuantError::ConfigMissing {
                section: "data".to_string(),
                key: "path".to_string(),
            });
        }
    }

    let start = read_date(config, "data", "start_date")?;
    let end = read_date(config, "data", "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("data", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

pub fn validate_analysis_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let periods = read_double(config, "analysis", "periods_per_year", 252.0)?;
    if periods <= 0.0 {
        return Err(invalid(
            "analysis",
            "periods_per_year",
            "periods_per_year must be positive",
        ));
    }
    validate_rate(config, "analysis", 0.0)
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let kind = config
        .get_string("strategy", "type")
        .unwrap_or_else(|| STRATEGY_SMA_CROSSOVER.to_string());

    match kind.trim().to_lowercase().as_str() {
        STRATEGY_SMA_CROSSOVER => {
            let short = read_window(config, "short_window", DEFAULT_SHORT_WINDOW)?;
            let long = read_window(config, "long_window", DEFAULT_LONG_WINDOW)?;
            if short >= long {
                tracing::warn!(
                    short_window = short,
                    long_window = long,
                    "short_window is not below long_window; the crossover will rarely trade"
                );
            }
            Ok(())
        }
        STRATEGY_MOMENTUM => read_window(config, "lookback", DEFAULT_LOOKBACK).map(|_| ()),
        other => Err(invalid(
            "strategy",
            "type",
            &format!("unknown strategy type '{other}', expected sma_crossover or momentum"),
        )),
    }
}

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    let symbols = match config.get_string("portfolio", "symbols") {
        Some(s) => parse_symbol_list(&s),
        None => {
            return Err(QuantError::ConfigMissing {
                section: "portfolio".to_string(),
                key: "symbols".to_string(),
            });
        }
    };
    if symbols.len() < 2 {
        return Err(invalid(
            "portfolio",
            "symbols",
            "a portfolio needs at least two symbols",
        ));
    }

    if let Some(raw) = config.get_string("portfolio", "weights") {
        let weights = parse_weight_list(&raw)?;
        if weights.len() != symbols.len() {
            return Err(invalid(
                "portfolio",
                "weights",
                &format!(
                    "{} weights given for {} symbols",
                    weights.len(),
                    symbols.len()
                ),
            ));
        }
    }

    validate_rate(config, "portfolio", 0.02)
}

pub fn validate_prediction_config(config: &dyn ConfigPort) -> Result<(), QuantError> {
    read_bool(config, "prediction", "enabled", false)?;
    let horizon = read_int(config, "prediction", "horizon", DEFAULT_HORIZON)?;
    if horizon < 1 {
        return Err(invalid("prediction", "horizon", "horizon must be at least 1"));
    }
    Ok(())
}

/// Split a comma-separated symbol list, trimming and upper-casing each entry.
pub fn parse_symbol_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma-separated list of non-negative weights.
pub fn parse_weight_list(raw: &str) -> Result<Vec<f64>, QuantError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            let w: f64 = s.parse().map_err(|_| {
                invalid("portfolio", "weights", &format!("'{s}' is not a number"))
            })?;
            if !w.is_finite() || w < 0.0 {
                return Err(invalid(
                    "portfolio",
                    "weights",
                    "weights must be finite and non-negative",
                ));
            }
            Ok(w)
        })
        .collect()
}

/// Read an optional `YYYY-MM-DD` date.
pub fn read_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, QuantError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                invalid(
                    section,
                    key,
                    &format!("invalid {key} format, expected YYYY-MM-DD"),
                )
            }),
    }
}

/// Read an integer, failing on a present but non-numeric value.
pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
) -> Result<i64, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(section, key, &format!("{key} must be an integer"))),
    }
}

/// Read a float, failing on a present but non-numeric value.
pub fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => match s.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(invalid(section, key, &format!("{key} must be a number"))),
        },
    }
}

/// Read a boolean (`true/yes/on/1` or `false/no/off/0`), failing on anything
/// else.
pub fn read_bool(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: bool,
) -> Result<bool, QuantError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(invalid(section, key, &format!("{key} must be true or false"))),
        },
    }
}

fn read_window(config: &dyn ConfigPort, key: &str, default: i64) -> Result<i64, QuantError> {
    let value = read_int(config, "strategy", key, default)?;
    if value < 1 {
        return Err(invalid("strategy", key, &format!("{key} must be at least 1")));
    }
    Ok(value)
}

fn validate_rate(config: &dyn ConfigPort, section: &str, default: f64) -> Result<(), QuantError> {
    let value = read_double(config, section, "risk_free_rate", default)?;
    if value <= -1.0 || value >= 1.0 {
        return Err(invalid(
            section,
            "risk_free_rate",
            "risk_free_rate must be between -1 and 1",
        ));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> QuantError {
    QuantError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
