//! CLI definition and dispatch.

use chrono::{Local, NaiveDate, NaiveDateTime};
use clap::{Parser, Subcommand};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::text_report_adapter::TextReportAdapter;
use crate::domain::backtest::{run_backtest, BacktestResult};
use crate::domain::config_validation::{
    parse_symbol_list, parse_weight_list, read_bool, read_date, read_double, read_int,
    validate_analysis_config, validate_config, validate_data_config, validate_portfolio_config,
    validate_prediction_config, validate_strategy_config, DEFAULT_HORIZON, DEFAULT_LONG_WINDOW, DEFAULT_LOOKBACK,
    DEFAULT_SHORT_WINDOW, STRATEGY_MOMENTUM, STRATEGY_SMA_CROSSOVER,
};
use crate::domain::error::QuantError;
use crate::domain::metrics::{MetricsSnapshot, RiskConfig, TRADING_DAYS_PER_YEAR};
use crate::domain::portfolio::{simulate_portfolio, PortfolioResult};
use crate::domain::predict::{predict_trend, PredictionResult};
use crate::domain::price::{PriceSeries, PriceTable};
use crate::domain::report::DailyReport;
use crate::domain::signal::Strategy;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::PriceDataPort;
use crate::ports::report_port::ReportPort;

pub const DEFAULT_PORTFOLIO_RISK_FREE_RATE: f64 = 0.02;
pub const DEFAULT_REPORT_PATH: &str = "daily_report.txt";

#[derive(Parser, Debug)]
#[command(
    name = "quantlens",
    about = "Return analytics, rule backtests, portfolio simulation and trend extrapolation"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Backtest the configured strategy on one symbol against buy-and-hold
    Analyze {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        /// Also extrapolate the price trend
        #[arg(long)]
        predict: bool,
    },
    /// Simulate a weighted portfolio
    Portfolio {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [portfolio] symbols
        #[arg(long)]
        symbols: Option<String>,
    },
    /// Extrapolate the linear price trend of one symbol
    Predict {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(long)]
        horizon: Option<usize>,
    },
    /// Append a daily summary for one symbol to the report file
    Report {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in the data directory
    ListSymbols {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Everything `analyze` computes for one symbol.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub backtest: BacktestResult,
    pub prediction: Option<PredictionResult>,
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Analyze {
            config,
            symbol,
            predict,
        } => run_analyze(&config, &symbol, predict),
        Command::Portfolio { config, symbols } => run_portfolio(&config, symbols.as_deref()),
        Command::Predict {
            config,
            symbol,
            horizon,
        } => run_predict(&config, &symbol, horizon),
        Command::Report { config, symbol } => run_report(&config, &symbol),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { config } => run_list_symbols(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, QuantError> {
    tracing::info!(path = %path.display(), "loading config");
    FileConfigAdapter::from_file(path)
}

fn run_analyze(config_path: &Path, symbol: &str, predict: bool) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    validate_analysis_config(&config)?;
    validate_strategy_config(&config)?;

    let horizon = if predict || read_bool(&config, "prediction", "enabled", false)? {
        validate_prediction_config(&config)?;
        Some(build_horizon(&config, None)?)
    } else {
        None
    };

    let data_port = build_data_port(&config)?;
    let (start, end) = build_date_range(&config)?;
    let strategy = build_strategy(&config)?;
    let risk = build_risk_config(&config)?;

    let outcome = run_analysis_pipeline(
        &data_port,
        &symbol.to_uppercase(),
        start,
        end,
        &strategy,
        &risk,
        horizon,
    )?;

    print_backtest(&outcome.backtest);
    if let Some(prediction) = &outcome.prediction {
        print_prediction(prediction, outcome.backtest.last_price);
    }
    Ok(())
}

fn run_portfolio(config_path: &Path, symbols_override: Option<&str>) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    validate_analysis_config(&config)?;
    if symbols_override.is_none() {
        validate_portfolio_config(&config)?;
    }

    let data_port = build_data_port(&config)?;
    let (start, end) = build_date_range(&config)?;
    let symbols = resolve_symbols(symbols_override, &config)?;
    let weights = resolve_weights(&symbols, &config)?;
    let risk = build_portfolio_risk_config(&config)?;

    let result = run_portfolio_pipeline(&data_port, &symbols, start, end, &weights, &risk)?;
    print_portfolio(&result);
    Ok(())
}

fn run_predict(
    config_path: &Path,
    symbol: &str,
    horizon_override: Option<usize>,
) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    if horizon_override.is_none() {
        validate_prediction_config(&config)?;
    }

    let data_port = build_data_port(&config)?;
    let (start, end) = build_date_range(&config)?;
    let horizon = build_horizon(&config, horizon_override)?;

    let prices = fetch_series(&data_port, &symbol.to_uppercase(), start, end)?;
    let prediction = predict_trend(&prices, horizon)?;
    let last_price = prices.last().map(|p| p.price).unwrap_or(f64::NAN);
    print_prediction(&prediction, last_price);
    Ok(())
}

fn run_report(config_path: &Path, symbol: &str) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    validate_analysis_config(&config)?;

    let data_port = build_data_port(&config)?;
    let (start, end) = build_date_range(&config)?;
    let risk = build_risk_config(&config)?;
    let report_port = TextReportAdapter::new(build_report_path(&config));

    let report = run_report_pipeline(
        &data_port,
        &report_port,
        &symbol.to_uppercase(),
        start,
        end,
        &risk,
        Local::now().naive_local(),
    )?;
    println!(
        "Report for {} ({}) appended to {}",
        report.symbol,
        report.as_of,
        report_port.path().display()
    );
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_config(&config)?;

    let strategy = build_strategy(&config)?;
    let risk = build_risk_config(&config)?;
    println!("Data path:        {}", config.get_string("data", "path").unwrap_or_default());
    println!("Strategy:         {}", strategy);
    println!("Periods per year: {}", risk.periods_per_year);
    println!("Risk-free rate:   {:.2}%", risk.risk_free_rate * 100.0);
    if let Some(symbols) = config.get_string("portfolio", "symbols") {
        println!("Portfolio:        {}", parse_symbol_list(&symbols).join(", "));
    }
    println!("\nConfiguration is valid.");
    Ok(())
}

fn run_list_symbols(config_path: &Path) -> Result<(), QuantError> {
    let config = load_config(config_path)?;
    validate_data_config(&config)?;
    let data_port = build_data_port(&config)?;

    let symbols = data_port.list_symbols()?;
    if symbols.is_empty() {
        eprintln!("No symbols found");
    } else {
        for symbol in &symbols {
            println!("{}", symbol);
        }
        eprintln!("{} symbols found", symbols.len());
    }
    Ok(())
}

/// Fetch a series and reject an empty result.
pub fn fetch_series(
    data_port: &dyn PriceDataPort,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<PriceSeries, QuantError> {
    let series = data_port.fetch_prices(symbol, start, end)?;
    if series.is_empty() {
        return Err(QuantError::insufficient(symbol, 0, 2));
    }
    tracing::info!(symbol, observations = series.len(), "fetched prices");
    Ok(series)
}

pub fn run_analysis_pipeline(
    data_port: &dyn PriceDataPort,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    strategy: &Strategy,
    risk: &RiskConfig,
    horizon: Option<usize>,
) -> Result<AnalysisOutcome, QuantError> {
    let prices = fetch_series(data_port, symbol, start, end)?;
    let backtest = run_backtest(&prices, strategy, risk)?;
    let prediction = horizon
        .map(|h| predict_trend(&prices, h))
        .transpose()?;
    Ok(AnalysisOutcome {
        backtest,
        prediction,
    })
}

pub fn run_portfolio_pipeline(
    data_port: &dyn PriceDataPort,
    symbols: &[String],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    weights: &HashMap<String, f64>,
    risk: &RiskConfig,
) -> Result<PortfolioResult, QuantError> {
    let series = symbols
        .iter()
        .map(|s| fetch_series(data_port, s, start, end))
        .collect::<Result<Vec<_>, _>>()?;
    let table = PriceTable::align(&series)?;
    tracing::info!(
        assets = table.column_count(),
        rows = table.row_count(),
        "aligned price table"
    );
    simulate_portfolio(&table, weights, risk)
}

pub fn run_report_pipeline(
    data_port: &dyn PriceDataPort,
    report_port: &dyn ReportPort,
    symbol: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    risk: &RiskConfig,
    generated_at: NaiveDateTime,
) -> Result<DailyReport, QuantError> {
    let prices = fetch_series(data_port, symbol, start, end)?;
    let report = DailyReport::from_series(&prices, risk, generated_at)?;
    report_port.append(&report)?;
    Ok(report)
}

pub fn build_data_port(config: &dyn ConfigPort) -> Result<CsvAdapter, QuantError> {
    let path = config
        .get_string("data", "path")
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| QuantError::ConfigMissing {
            section: "data".into(),
            key: "path".into(),
        })?;
    Ok(CsvAdapter::new(PathBuf::from(path.trim())))
}

pub fn build_date_range(
    config: &dyn ConfigPort,
) -> Result<(Option<NaiveDate>, Option<NaiveDate>), QuantError> {
    Ok((
        read_date(config, "data", "start_date")?,
        read_date(config, "data", "end_date")?,
    ))
}

pub fn build_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, QuantError> {
    Ok(RiskConfig::new(
        read_double(config, "analysis", "periods_per_year", TRADING_DAYS_PER_YEAR)?,
        read_double(config, "analysis", "risk_free_rate", 0.0)?,
    ))
}

/// Annualization from `[analysis]`, risk-free rate from `[portfolio]`.
pub fn build_portfolio_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, QuantError> {
    let rate = read_double(
        config,
        "portfolio",
        "risk_free_rate",
        DEFAULT_PORTFOLIO_RISK_FREE_RATE,
    )?;
    Ok(build_risk_config(config)?.with_risk_free_rate(rate))
}

pub fn build_strategy(config: &dyn ConfigPort) -> Result<Strategy, QuantError> {
    let kind = config
        .get_string("strategy", "type")
        .unwrap_or_else(|| STRATEGY_SMA_CROSSOVER.to_string())
        .trim()
        .to_lowercase();

    match kind.as_str() {
        STRATEGY_SMA_CROSSOVER => Ok(Strategy::sma_crossover(
            read_window(config, "short_window", DEFAULT_SHORT_WINDOW)?,
            read_window(config, "long_window", DEFAULT_LONG_WINDOW)?,
        )),
        STRATEGY_MOMENTUM => Ok(Strategy::momentum(read_window(
            config,
            "lookback",
            DEFAULT_LOOKBACK,
        )?)),
        other => Err(QuantError::ConfigInvalid {
            section: "strategy".into(),
            key: "type".into(),
            reason: format!("unknown strategy type '{other}'"),
        }),
    }
}

pub fn build_horizon(
    config: &dyn ConfigPort,
    horizon_override: Option<usize>,
) -> Result<usize, QuantError> {
    if let Some(h) = horizon_override {
        return Ok(h);
    }
    let horizon = read_int(config, "prediction", "horizon", DEFAULT_HORIZON)?;
    usize::try_from(horizon).map_err(|_| QuantError::ConfigInvalid {
        section: "prediction".into(),
        key: "horizon".into(),
        reason: "horizon must be at least 1".into(),
    })
}

pub fn build_report_path(config: &dyn ConfigPort) -> PathBuf {
    config
        .get_string("report", "path")
        .filter(|p| !p.trim().is_empty())
        .map(|p| PathBuf::from(p.trim()))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_REPORT_PATH))
}

/// Symbols from the command-line override, else `[portfolio] symbols`.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
) -> Result<Vec<String>, QuantError> {
    let symbols = match symbols_override {
        Some(s) => parse_symbol_list(s),
        None => config
            .get_string("portfolio", "symbols")
            .map(|s| parse_symbol_list(&s))
            .unwrap_or_default(),
    };
    if symbols.is_empty() {
        return Err(QuantError::ConfigMissing {
            section: "portfolio".into(),
            key: "symbols".into(),
        });
    }
    Ok(symbols)
}

/// Pair `[portfolio] weights` with `symbols` by position.
///
/// Missing weights mean equal weighting. A weight list whose length differs
/// from `symbols` (possible when symbols were overridden) is ignored.
pub fn resolve_weights(
    symbols: &[String],
    config: &dyn ConfigPort,
) -> Result<HashMap<String, f64>, QuantError> {
    let Some(raw) = config.get_string("portfolio", "weights") else {
        return Ok(HashMap::new());
    };
    let weights = parse_weight_list(&raw)?;
    if weights.len() != symbols.len() {
        tracing::warn!(
            weights = weights.len(),
            symbols = symbols.len(),
            "weight count does not match symbols, using equal weights"
        );
        return Ok(HashMap::new());
    }
    Ok(symbols.iter().cloned().zip(weights).collect())
}

fn read_window(config: &dyn ConfigPort, key: &str, default: i64) -> Result<usize, QuantError> {
    let value = read_int(config, "strategy", key, default)?;
    usize::try_from(value).map_err(|_| QuantError::ConfigInvalid {
        section: "strategy".into(),
        key: key.into(),
        reason: format!("{key} must be at least 1"),
    })
}

fn print_metrics(label: &str, m: &MetricsSnapshot) {
    println!("\n=== {label} ===");
    println!("Total Return:     {:.2}%", m.total_return * 100.0);
    println!("Annualized:       {:.2}%", m.annualized_return * 100.0);
    println!("Volatility:       {:.2}%", m.annualized_volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", m.sharpe_ratio);
    println!("Sortino Ratio:    {:.2}", m.sortino_ratio);
    println!("Max Drawdown:     {:.2}%", m.max_drawdown * 100.0);
    println!("Drawdown Length:  {} periods", m.max_drawdown_duration);
}

fn print_backtest(result: &BacktestResult) {
    let first = result.dates.first().map(|d| d.to_string()).unwrap_or_default();
    let last = result.dates.last().map(|d| d.to_string()).unwrap_or_default();
    println!("Strategy:         {}", result.strategy_name);
    println!("Period:           {first} to {last} ({} prices)", result.dates.len());
    println!("Last Price:       {:.2}", result.last_price);
    println!("Entries:          {}", result.entries());
    println!("Exposure:         {:.1}%", result.exposure() * 100.0);
    println!(
        "Strategy Index:   {:.2} ({:+.2})",
        100.0 + result.strategy_total_return_pct(),
        result.strategy_total_return_pct()
    );
    println!(
        "Buy & Hold Index: {:.2} ({:+.2})",
        100.0 + result.benchmark_total_return_pct(),
        result.benchmark_total_return_pct()
    );
    print_metrics("Strategy", &result.strategy_metrics);
    print_metrics("Buy & Hold", &result.benchmark_metrics);
}

fn print_prediction(prediction: &PredictionResult, last_price: f64) {
    println!("\n=== Trend Prediction ===");
    println!("Last Price:       {:.2}", last_price);
    println!("Slope per Period: {:+.4}", prediction.slope);
    println!("Band:             ±{:.2} (approximate 95%)", prediction.half_width());
    for p in &prediction.points {
        println!(
            "  t+{:<4} {:>12.2}   [{:.2}, {:.2}]",
            p.step, p.value, p.lower, p.upper
        );
    }
}

fn print_portfolio(result: &PortfolioResult) {
    println!("=== Portfolio ===");
    for (symbol, w) in result.weights.symbols.iter().zip(&result.weights.weights) {
        println!("  {:<10} {:>6.1}%", symbol, w * 100.0);
    }
    let final_value = result.portfolio_value.last().copied().unwrap_or(f64::NAN);
    println!("Rows:             {}", result.dates.len());
    println!("Final Value:      {:.2}", final_value);
    println!("Annual Return:    {:.2}%", result.annual_return * 100.0);
    println!("Annual Vol:       {:.2}%", result.annual_volatility * 100.0);
    println!("Sharpe Ratio:     {:.2}", result.sharpe_ratio);
    println!(
        "Diversification:  {:.2}% volatility reduction",
        result.diversification_effect * 100.0
    );

    println!("\n=== Asset Volatility ===");
    for (curve, vol) in result.asset_curves.iter().zip(&result.asset_volatilities) {
        let last = curve.values.last().copied().unwrap_or(f64::NAN);
        println!("  {:<10} vol {:>6.2}%   index {:.2}", curve.symbol, vol * 100.0, last);
    }

    println!("\n=== Correlation ===");
    let symbols = &result.correlation.symbols;
    print!("{:<10}", "");
    for s in symbols {
        print!(" {:>8}", s);
    }
    println!();
    for (i, row) in result.correlation.values.iter().enumerate() {
        print!("{:<10}", symbols[i]);
        for v in row {
            print!(" {:>8.3}", v);
        }
        println!();
    }
}
