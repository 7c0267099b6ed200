//! Error handling for seamshift
//!
//! Provides error types for all layers of the post-processor:
//! - G-Code errors (line parsing)
//! - Seam errors (loop invariants broken while rewriting)
//! - Configuration errors (settings files and validation)
//!
//! Only the variants here are fatal. A loop that simply does not match the
//! external perimeter pattern is not an error; the detector abandons it and
//! the lines pass through unchanged.

use thiserror::Error;

/// G-Code parsing error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// A `G92` line that does not reset the extrusion axis, and only it
    #[error("Malformed position reset at line {line_number}: {line:?}")]
    MalformedReset {
        /// The 1-based line number of the offending line.
        line_number: u64,
        /// The offending line, without its terminator.
        line: String,
    },

    /// A numeric word whose value is not a finite number
    #[error("Invalid number {word:?} at line {line_number}")]
    InvalidNumber {
        /// The 1-based line number of the offending line.
        line_number: u64,
        /// The offending word, letter included.
        word: String,
    },
}

/// Seam rewriting error type
///
/// Raised when an external perimeter loop that was already accepted by the
/// detector breaks an assumption the rewrite relies on.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SeamError {
    /// An accepted print move broke a loop invariant
    #[error("Loop invariant violated at line {line_number}: {reason}")]
    InvariantViolation {
        /// The 1-based line number of the offending move.
        line_number: u64,
        /// What was violated.
        reason: String,
    },
}

/// Configuration error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// A setting has a value outside its valid range
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue {
        /// The setting name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The settings file extension is not recognized
    #[error("Unsupported config format: {0} (expected .toml or .json)")]
    UnsupportedFormat(String),

    /// The settings file could not be decoded or encoded
    #[error("Config parse error: {0}")]
    Parse(String),
}

/// Main error type for seamshift
///
/// A unified error type that can represent any error from all layers.
#[derive(Error, Debug)]
pub enum Error {
    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Seam error
    #[error(transparent)]
    Seam(#[from] SeamError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a malformed `G92` error
    pub fn is_malformed_reset(&self) -> bool {
        matches!(self, Error::Gcode(GcodeError::MalformedReset { .. }))
    }

    /// Check if this is a loop invariant violation
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::Seam(SeamError::InvariantViolation { .. }))
    }

    /// Check if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
