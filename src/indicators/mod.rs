//! Indicator construction from raw market and macro series.

pub mod composite;
pub mod transform;

pub use composite::{
    DEFAULT_FLOW_WINDOW, DEFAULT_STRESS_SMOOTHING, STRESS_INDEX_NAME, StressComponent, flow_index, rebased_ratio,
    stress_index,
};
pub use transform::{annualized_volatility, log_returns, pct_change, rolling_mean, rolling_std, zscore};
