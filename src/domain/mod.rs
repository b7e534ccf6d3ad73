//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - date-indexed data (`TimeSeries`, `Frame`)
//! - analysis configuration (`AnalysisConfig`, `LagWindow`)
//! - categorical outcomes (`RelationshipVerdict`, `RegimeShift`, `LeadRole`, `CoMovement`)

pub mod types;

pub use types::*;
