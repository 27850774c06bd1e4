// Engine error taxonomy and the degraded-result wrapper.
//
// Application code (config, storage, CLI) uses anyhow. The engine boundary uses
// a typed error so callers can tell a fatal state (encoder never initialized)
// from a recoverable one, and Outcome so they can tell a clean empty result
// from one produced after a caught failure.

use thiserror::Error;

pub type EngineResult<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The engine handle was used before `initialize` completed.
    #[error("classification engine is not initialized")]
    NotInitialized,

    /// The text encoder failed to produce a vector.
    #[error("text encoding failed: {0}")]
    Encoding(#[source] anyhow::Error),

    /// Two vectors with different lengths were compared.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("incident not found: {0}")]
    NotFound(String),

    /// The storage collaborator failed.
    #[error("storage error: {0}")]
    Storage(#[source] anyhow::Error),
}

/// Result of an engine call that may have degraded instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Complete(T),
    /// A failure was caught and logged; `value` is the documented fallback.
    Degraded { value: T, reason: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, reason: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            reason: reason.into(),
        }
    }

    /// Transform the value, keeping the degradation reason.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Outcome::Complete(v) => Outcome::Complete(f(v)),
            Outcome::Degraded { value, reason } => Outcome::Degraded {
                value: f(value),
                reason,
            },
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Complete(v) | Outcome::Degraded { value: v, .. } => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Complete(v) | Outcome::Degraded { value: v, .. } => v,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Complete(_) => None,
            Outcome::Degraded { reason, .. } => Some(reason),
        }
    }
}
