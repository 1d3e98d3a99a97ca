//! Error taxonomy shared by every stage of the simulation pipeline.

use thiserror::Error;

/// Errors surfaced by configuration, integration and analysis.
///
/// None of these are retried internally; the caller decides what to show.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    /// Shape or dimension mismatch detected before integration begins.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The solver failed, was cancelled, or exceeded its step budget.
    #[error("integration error: {0}")]
    Integration(String),

    /// Degenerate input handed to the metrics stage.
    #[error("precondition error: {0}")]
    Precondition(String),
}

pub type Result<T> = std::result::Result<T, SimulationError>;

macro_rules! config_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::SimulationError::Configuration(format!($($arg)*)))
    };
}

pub(crate) use config_bail;
