//! Error taxonomy for the aggregation core.
//!
//! Malformed input is rejected eagerly with no partial state mutation. A
//! cryptographically invalid nested proof is *not* an error anywhere in this
//! crate; it surfaces as a cleared validity bit in the aggregated output.

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

/// Errors raised by the admission pool and application registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// An application with this name is already registered.
    #[error("application `{0}` is already registered")]
    DuplicateApplication(String),

    /// No application with this name has been registered.
    #[error("unknown application `{0}`")]
    UnknownApplication(String),
}

/// Errors raised by circuit construction, setup, and proving.
#[derive(Debug, Error)]
pub enum AggregationError {
    /// A nested proof carries a different number of primary inputs than the
    /// circuit was built for. Rejected before any proving attempt.
    #[error("nested proof carries {got} primary inputs, circuit expects {expected}")]
    InputCountMismatch { expected: usize, got: usize },

    /// A batch was requested but the pool held zero pending entries. This is
    /// retryable: the caller may wait for submissions and ask again.
    #[error("no pending transactions available for application `{0}`")]
    InsufficientPendingEntries(String),

    /// Key material contains a point at infinity or is otherwise unusable.
    #[error("malformed key material: {0}")]
    MalformedKey(&'static str),

    #[error(transparent)]
    Pool(#[from] PoolError),

    /// Constraint synthesis or witness generation failed. Fatal for the call;
    /// no partial proof is returned.
    #[error("constraint synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    #[error("keypair io: {0}")]
    Io(#[from] std::io::Error),

    #[error("keypair serialization: {0}")]
    Serialization(#[from] ark_serialize::SerializationError),
}
