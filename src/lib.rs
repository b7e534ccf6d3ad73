//! `leadlag` library crate.
//!
//! Lead-lag, Granger-causality and regime analysis of institutional flow
//! series against a financial stress index. The binary (`leadlag`) is a thin
//! wrapper around this library so the statistics are testable without
//! spawning processes.

pub mod analysis;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod indicators;
pub mod io;
pub mod math;
pub mod report;
