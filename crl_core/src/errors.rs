//! Error types for the concept graph store.

use thiserror::Error;

use crate::concept::{AttributeName, ConceptId, ConceptKindTag};

/// Errors raised by store queries, mutations and dispatch.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Concept not found: {0}")]
    ConceptNotFound(ConceptId),

    #[error("No concept with URI: {0}")]
    UriNotFound(String),

    #[error("URI already in use: {0}")]
    UriInUse(String),

    /// A kind-specific accessor was used on a concept of another kind.
    #[error("Concept {concept} is a {found}, expected a {expected}")]
    WrongKind {
        concept: ConceptId,
        expected: ConceptKindTag,
        found: ConceptKindTag,
    },

    #[error("Attribute {0} does not hold a concept ID")]
    NotAPointer(AttributeName),

    #[error("Attribute {0} does not hold a string value")]
    NotAScalar(AttributeName),

    #[error("Concept {0} is read-only")]
    ReadOnly(ConceptId),

    #[error("Making {owner} the owner of {concept} would create an ownership cycle")]
    OwningCycle { concept: ConceptId, owner: ConceptId },

    /// Dispatch exceeded the configured number of function calls.
    #[error("Function call limit of {0} exceeded during dispatch")]
    FunctionCallLimit(usize),

    #[error("Function {uri} failed on concept {concept}: {message}")]
    FunctionFailed {
        uri: String,
        concept: ConceptId,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result alias for store operations.
pub type CoreResult<T> = Result<T, CoreError>;
