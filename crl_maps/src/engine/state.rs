//! Map instance state, derived from the graph on every call.

use serde::{Deserialize, Serialize};

use crl_core::{AttributeName, ConceptId, UniverseOfDiscourse};

use crate::errors::MapResult;
use crate::resolution::{get_parent_map_target, is_root_map_instance};
use crate::schema::{
    CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_URI, CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_URI,
    CRL_ONE_TO_ONE_MAP_URI,
};

/// Where a map instance stands. Every state but `Converged` is a transient
/// the handler waits out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MapState {
    /// The instance has no owner yet.
    Unanchored,
    /// No defining map among the immediate abstractions.
    Unbound,
    /// The defining map lacks a source or target reference, or one of them is unset.
    Malformed,
    /// The instance has no source yet.
    SourceUnresolved,
    /// The source does not refine the defining map's source.
    SourcePending,
    /// The target is missing or not yet in place.
    TargetMaterializing,
    Converged,
}

/// Everything the handler needs to know about a bound map instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapContext {
    pub map_instance: ConceptId,
    pub owner: ConceptId,
    pub defining_map: ConceptId,

    pub abstract_source_reference: ConceptId,
    pub abstract_source: ConceptId,
    pub abstract_target_reference: ConceptId,
    pub abstract_target: ConceptId,
    /// Attribute the defining map's target reference points at.
    pub target_attribute: AttributeName,

    pub source_reference: Option<ConceptId>,
    pub source: Option<ConceptId>,
    pub target_reference: Option<ConceptId>,
    pub target: Option<ConceptId>,
}

/// A bound context, or the state that kept the instance from binding.
pub type Resolution = Result<MapContext, MapState>;

/// The defining map of an instance: an immediate abstraction that refines
/// CrlOneToOneMap without being it.
pub fn find_defining_map(uofd: &UniverseOfDiscourse, map_instance: ConceptId) -> Option<ConceptId> {
    uofd.find_immediate_abstractions(map_instance)
        .into_iter()
        .find(|abstraction| {
            let is_prototype = uofd
                .get_concept(*abstraction)
                .and_then(|concept| concept.uri.as_deref())
                == Some(CRL_ONE_TO_ONE_MAP_URI);
            !is_prototype && uofd.is_refinement_of_uri(*abstraction, CRL_ONE_TO_ONE_MAP_URI)
        })
}

impl MapContext {
    /// Bind `map_instance` to its defining map.
    pub fn resolve(uofd: &UniverseOfDiscourse, map_instance: ConceptId) -> MapResult<Resolution> {
        let Some(owner) = uofd.owning_concept(map_instance) else {
            return Ok(Err(MapState::Unanchored));
        };
        let Some(defining_map) = find_defining_map(uofd, map_instance) else {
            return Ok(Err(MapState::Unbound));
        };

        let Some(abstract_source_reference) = uofd
            .get_first_owned_reference_refined_from_uri(defining_map, CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_URI)
        else {
            return Ok(Err(MapState::Malformed));
        };
        let Some(abstract_target_reference) = uofd
            .get_first_owned_reference_refined_from_uri(defining_map, CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_URI)
        else {
            return Ok(Err(MapState::Malformed));
        };
        let Some(abstract_source) = uofd.referenced_concept(abstract_source_reference)? else {
            return Ok(Err(MapState::Malformed));
        };
        let Some(abstract_target) = uofd.referenced_concept(abstract_target_reference)? else {
            return Ok(Err(MapState::Malformed));
        };
        let target_attribute = uofd
            .concept(abstract_target_reference)?
            .referenced_attribute_name()?;

        let source_reference =
            uofd.get_first_owned_reference_refined_from(map_instance, abstract_source_reference);
        let source = match source_reference {
            Some(reference) => uofd.referenced_concept(reference)?,
            None => None,
        };
        let target_reference =
            uofd.get_first_owned_reference_refined_from(map_instance, abstract_target_reference);
        let target = match target_reference {
            Some(reference) => uofd.referenced_concept(reference)?,
            None => None,
        };

        Ok(Ok(MapContext {
            map_instance,
            owner,
            defining_map,
            abstract_source_reference,
            abstract_source,
            abstract_target_reference,
            abstract_target,
            target_attribute,
            source_reference,
            source,
            target_reference,
            target,
        }))
    }

    /// State of a bound instance.
    pub fn state(&self, uofd: &UniverseOfDiscourse) -> MapResult<MapState> {
        let Some(source) = self.source else {
            return Ok(MapState::SourceUnresolved);
        };
        if !uofd.is_refinement_of(source, self.abstract_source) {
            return Ok(MapState::SourcePending);
        }

        let (Some(target_reference), Some(target)) = (self.target_reference, self.target) else {
            return Ok(MapState::TargetMaterializing);
        };
        let attribute = uofd.concept(target_reference)?.referenced_attribute_name()?;
        if attribute != self.target_attribute {
            return Ok(MapState::TargetMaterializing);
        }
        if attribute == AttributeName::NoAttribute {
            let expected_owner = if is_root_map_instance(uofd, self.map_instance) {
                Some(self.owner)
            } else {
                get_parent_map_target(uofd, self.map_instance)
            };
            if expected_owner.is_some() && uofd.owning_concept(target) != expected_owner {
                return Ok(MapState::TargetMaterializing);
            }
        }

        Ok(MapState::Converged)
    }
}

/// Derive the state of `map_instance` without changing anything.
pub fn derive_map_state(uofd: &UniverseOfDiscourse, map_instance: ConceptId) -> MapResult<MapState> {
    match MapContext::resolve(uofd, map_instance)? {
        Ok(context) => context.state(uofd),
        Err(state) => Ok(state),
    }
}
