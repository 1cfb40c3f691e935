//! Plain-text daily report log, appended to on every run.

use crate::domain::error::QuantError;
use crate::domain::report::DailyReport;
use crate::ports::report_port::ReportPort;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

const SEPARATOR: &str = "-----------------------------------";

pub struct TextReportAdapter {
    path: PathBuf,
}

impl TextReportAdapter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

/// Render one report entry, terminated by a separator line.
pub fn format_report(report: &DailyReport) -> String {
    format!(
        "\n[Daily Report - {generated}]\n\
         Asset: {symbol}\n\
         As of: {as_of}\n\
         Previous Close: {previous:.2}\n\
         Close: {close:.2}\n\
         Daily Return: {daily:.2}%\n\
         Volatility (Ann.): {vol:.2}%\n\
         Max Drawdown: {mdd:.2}%\n\
         {SEPARATOR}\n",
        generated = report.generated_at.format("%Y-%m-%d %H:%M:%S"),
        symbol = report.symbol,
        as_of = report.as_of,
        previous = report.previous_close,
        close = report.last_close,
        daily = report.daily_return * 100.0,
        vol = report.annualized_volatility * 100.0,
        mdd = report.max_drawdown * 100.0,
    )
}

impl ReportPort for TextReportAdapter {
    fn append(&self, report: &DailyReport) -> Result<(), QuantError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(format_report(report).as_bytes())?;
        tracing::info!(symbol = %report.symbol, path = %self.path.display(), "appended daily report");
        Ok(())
    }
}
