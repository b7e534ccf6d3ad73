//! Error types.
//!
//! Two layers:
//! - [`AppError`]: fatal at the binary boundary, carries a process exit code.
//! - [`AnalysisError`]: a single computation could not produce a result. These
//!   are recovered locally (logged, reported as "no result") so a batch of pairs
//!   can complete with partial output.

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Non-fatal failure of one analysis step.
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisError {
    /// Not enough (overlapping) observations for the requested computation.
    InsufficientData { needed: usize, got: usize },
    /// A requested column is absent from the input table.
    MissingColumn(String),
    /// Zero-variance or otherwise singular input.
    DegenerateSeries(String),
    /// Input violates a structural invariant (ordering, finiteness).
    InvalidSeries(String),
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnalysisError::InsufficientData { needed, got } => {
                write!(f, "insufficient data: need {needed} observations, got {got}")
            }
            AnalysisError::MissingColumn(name) => write!(f, "missing column `{name}`"),
            AnalysisError::DegenerateSeries(msg) => write!(f, "degenerate series: {msg}"),
            AnalysisError::InvalidSeries(msg) => write!(f, "invalid series: {msg}"),
        }
    }
}

impl std::error::Error for AnalysisError {}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        let code = match err {
            AnalysisError::MissingColumn(_) | AnalysisError::InvalidSeries(_) => 2,
            AnalysisError::InsufficientData { .. } | AnalysisError::DegenerateSeries(_) => 3,
        };
        AppError::new(code, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn analysis_error_maps_to_exit_codes() {
        let missing: AppError = AnalysisError::MissingColumn("VIX".to_string()).into();
        assert_eq!(missing.exit_code(), 2);
        assert_eq!(missing.to_string(), "missing column `VIX`");

        let short: AppError = AnalysisError::InsufficientData { needed: 30, got: 4 }.into();
        assert_eq!(short.exit_code(), 3);
    }
}
