//! Error types for the timetally crates.

use thiserror::Error;

/// Errors that can occur in timetally operations.
///
/// The aggregation engine itself never fails; these cover input parsing
/// and serialization at the edges.
#[derive(Error, Debug)]
pub enum TallyError {
    #[error("Invalid date '{0}'. Expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Start date must be before end date")]
    InvalidRange,

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for timetally operations.
pub type TallyResult<T> = Result<T, TallyError>;
