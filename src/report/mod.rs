//! Reporting: plain-text summaries of analysis results.

pub mod format;

pub use format::*;
