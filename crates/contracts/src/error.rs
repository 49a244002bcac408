//! Layered error definitions
//!
//! Categorized by source: registration / phase / sync context / config.
//! Everything here is a hard validation failure; recoverable per-pair
//! alignment problems are [`AlignmentWarning`](crate::AlignmentWarning)s
//! instead and never abort a run.

use std::fmt;

use thiserror::Error;

/// Lifecycle phase of the engine.
///
/// Mutating operations are checked against the current phase and rejected
/// deterministically when they arrive out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Segments may still be registered; queries are rejected
    Building,
    /// Timeline is frozen; sync contexts may be registered and queried
    Frozen,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Building => write!(f, "building"),
            Phase::Frozen => write!(f, "frozen"),
        }
    }
}

/// Unified error type
#[derive(Debug, Error)]
pub enum CoreError {
    // ===== Registration Errors =====
    /// Segment name already used on this timeline
    #[error("duplicate segment name: '{name}'")]
    DuplicateSegment { name: String },

    /// Sync context name already registered
    #[error("duplicate sync context name: '{name}'")]
    DuplicateContext { name: String },

    /// Event time does not admit a total order
    #[error("segment '{segment}': event record {index} has a non-finite time")]
    NonFiniteEventTime { segment: String, index: usize },

    // ===== Phase Errors =====
    /// Operation issued in the wrong lifecycle phase
    #[error("'{operation}' requires the {required} phase, but the timeline is {actual}")]
    Phase {
        operation: &'static str,
        required: Phase,
        actual: Phase,
    },

    /// `build()` called with nothing registered
    #[error("cannot build an empty timeline: no segments registered")]
    NoSegments,

    // ===== Sync Context Errors =====
    /// Ephys time and index arrays differ in length
    #[error("sync context '{name}': ephys times and indices differ in length ({times} vs {indices})")]
    EphysLengthMismatch {
        name: String,
        times: usize,
        indices: usize,
    },

    /// Ephys array is not strictly ascending
    #[error("sync context '{name}': {column} must be strictly ascending (violation at position {position})")]
    EphysNotAscending {
        name: String,
        column: &'static str,
        position: usize,
    },

    /// Sampling rate outside (0, inf)
    #[error("sync context '{name}': sampling rate must be a positive finite number, got {rate}")]
    InvalidSamplingRate { name: String, rate: f64 },

    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a phase violation error
    pub fn phase(operation: &'static str, required: Phase, actual: Phase) -> Self {
        Self::Phase {
            operation,
            required,
            actual,
        }
    }

    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }
}
