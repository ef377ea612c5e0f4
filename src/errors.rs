//! Error types for the position pipeline

use crate::planetlib::EphemerisError;
use crate::time::TimeError;
use thiserror::Error;

/// Main error type for position calculations
#[derive(Debug, Error)]
pub enum PositionError {
    /// A malformed argument was passed, e.g. an unknown epoch or a bad
    /// latitude string
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Horizon coordinates were requested without a reachable Earth location
    #[error(
        "to compute an altazimuth position, you must observe from a specific \
         Earth location that you specify using a Topos instance"
    )]
    MissingObserver,

    /// The observation target lacks the capability this frame needs
    #[error("Unsupported target {target}: {reason}")]
    UnsupportedTarget {
        /// Name of the target
        target: String,
        /// What capability was missing
        reason: &'static str,
    },

    /// A frame-specific operation was called on a position in another frame
    #[error("{operation}() is not available on a {frame} position")]
    WrongFrame {
        /// The operation that was attempted
        operation: &'static str,
        /// The frame the position is in
        frame: String,
    },

    /// The position has no time attached
    #[error("{0} requires a position with a time")]
    MissingTime(&'static str),

    /// The position has no velocity attached
    #[error("{0} requires the observer's velocity")]
    MissingVelocity(&'static str),

    /// No ephemeris was injected where one is needed
    #[error("{0} requires an ephemeris")]
    MissingEphemeris(&'static str),

    /// Batch lengths disagree
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Light-time iteration did not settle
    #[error("light-travel time failed to converge after {iterations} iterations")]
    LightTimeDidNotConverge {
        /// Number of iterations attempted
        iterations: usize,
    },

    #[error("Ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),

    #[error("Time error: {0}")]
    Time(#[from] TimeError),
}

/// Result type for position operations
pub type Result<T> = std::result::Result<T, PositionError>;
