//! Core domain types and computations.

pub mod error;
pub mod price;
pub mod returns;
pub mod rolling;
pub mod metrics;
pub mod signal;
pub mod backtest;
pub mod portfolio;
pub mod predict;
pub mod report;
pub mod config_validation;
