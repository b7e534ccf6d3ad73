//! Input data sources.

pub mod synthetic;

pub use synthetic::{SyntheticConfig, SyntheticData, generate_synthetic};
