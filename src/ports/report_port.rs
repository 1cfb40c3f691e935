//! Report output port.

use crate::domain::error::QuantError;
use crate::domain::report::DailyReport;

pub trait ReportPort {
    /// Append one report entry. Earlier entries are never rewritten.
    fn append(&self, report: &DailyReport) -> Result<(), QuantError>;
}
