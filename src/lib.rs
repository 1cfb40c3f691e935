//! quantlens: return analytics, rule backtests, portfolio simulation and
//! trend extrapolation over daily price series.
//!
//! Hexagonal layout: computations in [`domain`], port traits in [`ports`],
//! file-backed implementations in [`adapters`], command wiring in [`cli`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;
