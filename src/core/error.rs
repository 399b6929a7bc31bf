// Engine error taxonomy.
//
// Construction and configuration errors surface immediately; a failed
// constructor leaves no new entities registered. Runtime step errors abort
// the current call before any synapse or activation is mutated.

#[cfg(not(feature = "std"))]
use alloc::string::String;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A synapse references a neuron outside the network, or a duplicate
    /// edge where uniqueness is assumed.
    #[error("invalid topology: {0}")]
    InvalidTopology(String),

    /// Non-positive sizes, out-of-range learning parameters, inverted bounds.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// An input pattern's length does not match the addressed group.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// A group refers to a neuron or synapse that has been removed.
    #[error("stale reference in group '{group}': {what}")]
    StaleReference { group: String, what: String },
}

impl EngineError {
    pub(crate) fn topology(msg: impl Into<String>) -> Self {
        EngineError::InvalidTopology(msg.into())
    }

    pub(crate) fn config(msg: impl Into<String>) -> Self {
        EngineError::InvalidConfiguration(msg.into())
    }

    pub(crate) fn stale(group: impl Into<String>, what: impl Into<String>) -> Self {
        EngineError::StaleReference {
            group: group.into(),
            what: what.into(),
        }
    }
}
