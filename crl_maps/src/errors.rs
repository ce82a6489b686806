//! Error types for the mapping engine.

use crl_core::{ConceptId, CoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The target a map instance points at does not refine the target of its defining map.
    #[error("Target {target} of map {map_instance} is not a refinement of {abstract_target}")]
    TargetNotRefinement {
        map_instance: ConceptId,
        target: ConceptId,
        abstract_target: ConceptId,
    },

    #[error("Map {0} has no source reference")]
    MissingSourceReference(ConceptId),

    #[error("Map {0} has no target reference")]
    MissingTargetReference(ConceptId),
}

impl MapError {
    /// Express this error as the store error a registered function returns.
    pub fn into_core_error(self, uri: &str, concept: ConceptId) -> CoreError {
        match self {
            MapError::Core(err) => err,
            other => CoreError::FunctionFailed {
                uri: uri.to_string(),
                concept,
                message: other.to_string(),
            },
        }
    }
}

pub type MapResult<T> = Result<T, MapError>;
