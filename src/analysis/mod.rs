//! Lead-lag and regime analysis.
//!
//! Workflow for one stress/flow pair:
//!
//! - `align`: first-difference both series and keep shared dates
//! - `ccf`: cross-correlation over a symmetric lag window
//! - `granger`: F-tests in both directions at several lag orders
//! - `interpret`: reduce the two best p-values to a verdict
//!
//! Sample-wide comparisons live in `regime` (calm vs stress correlations),
//! `sync` (rolling cross-asset synchronization) and `events` (event study).

pub mod align;
pub mod ccf;
pub mod events;
pub mod granger;
pub mod interpret;
pub mod regime;
pub mod sync;

pub use align::{AlignedPair, align, align_and_difference};
pub use ccf::{CrossCorrelation, DominantLag, LagCorrelation, cross_correlation};
pub use granger::{BidirectionalGranger, GrangerLagResult, GrangerOutcome, granger_bidirectional, granger_test};
pub use interpret::{CausalSummary, interpret, summarize};
pub use regime::{RegimeComparison, compare_regimes, compare_with_split};
