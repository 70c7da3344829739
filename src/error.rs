use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Everything that can go wrong while summarising a dataset.
///
/// `UnreadableExperiment`, `MissingParameter` and `InvalidParameter` are
/// recovered per experiment by the aggregator; the rest abort the run.
#[derive(Debug, Error)]
pub enum SummaryError {
    #[error("'{}' has no readable NMR data: {reason}", path.display())]
    UnreadableExperiment { path: PathBuf, reason: String },

    #[error("missing parameter '{key}' in '{section}'")]
    MissingParameter { section: String, key: String },

    #[error("parameter '{key}' in '{section}' is not {expected}")]
    InvalidParameter {
        section: String,
        key: String,
        expected: &'static str,
    },

    #[error("dataset path '{}' {reason}", path.display())]
    FatalInput { path: PathBuf, reason: &'static str },

    #[error("display window is empty: x_min ({x_min}) must be below x_max ({x_max})")]
    InvalidWindow { x_min: f64, x_max: f64 },

    #[error("invalid date format '{0}'")]
    InvalidDateFormat(String),

    #[error("failed to render plot: {0}")]
    Plot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SummaryError {
    pub fn unreadable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        SummaryError::UnreadableExperiment {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn missing(section: &str, key: &str) -> Self {
        SummaryError::MissingParameter {
            section: section.to_string(),
            key: key.to_string(),
        }
    }

    pub fn invalid(section: &str, key: &str, expected: &'static str) -> Self {
        SummaryError::InvalidParameter {
            section: section.to_string(),
            key: key.to_string(),
            expected,
        }
    }

    /// Whether the aggregator may skip the experiment and carry on.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SummaryError::UnreadableExperiment { .. }
                | SummaryError::MissingParameter { .. }
                | SummaryError::InvalidParameter { .. }
        )
    }
}

impl<E: std::error::Error + Send + Sync + 'static> From<plotters::drawing::DrawingAreaErrorKind<E>>
    for SummaryError
{
    fn from(value: plotters::drawing::DrawingAreaErrorKind<E>) -> Self {
        SummaryError::Plot(format!("{value:?}"))
    }
}

impl From<image::ImageError> for SummaryError {
    fn from(value: image::ImageError) -> Self {
        SummaryError::Plot(value.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SummaryError>;
