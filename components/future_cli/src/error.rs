//! Error types for the CLI

use core_types::JsError;
use thiserror::Error;

/// CLI-specific errors
#[derive(Debug, Error)]
pub enum CliError {
    /// No scenario with this name exists
    #[error("unknown scenario '{0}' (see --list)")]
    UnknownScenario(String),

    /// The event loop failed while running a scenario
    #[error("runtime error: {0}")]
    Runtime(#[from] JsError),

    /// The JSON report could not be produced
    #[error("report error: {0}")]
    Report(#[from] serde_json::Error),

    /// Some scenarios did not behave as expected
    #[error("{failed} of {total} scenarios failed")]
    Failed {
        /// Number of failing scenarios
        failed: usize,
        /// Number of scenarios run
        total: usize,
    },
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
