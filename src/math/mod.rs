//! Mathematical utilities: descriptive statistics, t-tests and least squares.

pub mod ols;
pub mod stats;
pub mod ttest;

pub use ols::*;
pub use stats::*;
pub use ttest::*;
