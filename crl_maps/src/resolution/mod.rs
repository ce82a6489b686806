//! Navigation over maps: their sources and targets, their place in the map
//! tree, and lookup of the map responsible for a given source.

mod attribute_target;

pub use attribute_target::*;

use std::collections::HashSet;

use crl_core::{AttributeName, ConceptId, Transaction, UniverseOfDiscourse};

use crate::errors::{MapError, MapResult};
use crate::schema::{CRL_MAP_SOURCE_URI, CRL_MAP_TARGET_URI, CRL_MAP_URI};

/// Whether `candidate` is a map of any kind.
pub fn is_map(uofd: &UniverseOfDiscourse, candidate: ConceptId) -> bool {
    uofd.is_refinement_of_uri(candidate, CRL_MAP_URI)
}

pub fn get_source_reference(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<ConceptId> {
    uofd.get_first_owned_reference_refined_from_uri(map, CRL_MAP_SOURCE_URI)
}

pub fn get_target_reference(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<ConceptId> {
    uofd.get_first_owned_reference_refined_from_uri(map, CRL_MAP_TARGET_URI)
}

/// The concept the map's source reference points at.
pub fn get_source(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<ConceptId> {
    let reference = get_source_reference(uofd, map)?;
    uofd.referenced_concept(reference).ok().flatten()
}

/// The concept the map's target reference points at.
pub fn get_target(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<ConceptId> {
    let reference = get_target_reference(uofd, map)?;
    uofd.referenced_concept(reference).ok().flatten()
}

fn source_attribute(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<AttributeName> {
    let reference = get_source_reference(uofd, map)?;
    uofd.concept(reference).ok()?.referenced_attribute_name().ok()
}

pub fn set_source(
    trans: &mut Transaction<'_>,
    map: ConceptId,
    source: Option<ConceptId>,
    attribute: AttributeName,
) -> MapResult<()> {
    let reference =
        get_source_reference(trans.uofd(), map).ok_or(MapError::MissingSourceReference(map))?;
    trans.set_referenced_concept(reference, source, attribute)?;
    Ok(())
}

pub fn set_target(
    trans: &mut Transaction<'_>,
    map: ConceptId,
    target: Option<ConceptId>,
    attribute: AttributeName,
) -> MapResult<()> {
    let reference =
        get_target_reference(trans.uofd(), map).ok_or(MapError::MissingTargetReference(map))?;
    trans.set_referenced_concept(reference, target, attribute)?;
    Ok(())
}

/// The outermost map above `map` (or `map` itself), following owners while they are maps.
pub fn get_root_map(uofd: &UniverseOfDiscourse, map: ConceptId) -> ConceptId {
    let mut root = map;
    let mut visited = HashSet::from([map]);
    while let Some(owner) = uofd.owning_concept(root) {
        if !is_map(uofd, owner) || !visited.insert(owner) {
            break;
        }
        root = owner;
    }
    root
}

/// A map instance is a root when its owner is absent or is not a map.
pub fn is_root_map_instance(uofd: &UniverseOfDiscourse, map: ConceptId) -> bool {
    match uofd.owning_concept(map) {
        Some(owner) => !is_map(uofd, owner),
        None => true,
    }
}

/// The target of the map owning `map`, if that owner is a map.
pub fn get_parent_map_target(uofd: &UniverseOfDiscourse, map: ConceptId) -> Option<ConceptId> {
    let parent = uofd.owning_concept(map)?;
    if !is_map(uofd, parent) {
        return None;
    }
    get_target(uofd, parent)
}

/// Depth-first search of `map` and its owned maps for the one whose
/// whole-concept source is `source`.
pub fn find_map_for_source(
    uofd: &UniverseOfDiscourse,
    map: ConceptId,
    source: ConceptId,
) -> Option<ConceptId> {
    find_map_for_source_attribute(uofd, map, source, AttributeName::NoAttribute)
}

/// Like [`find_map_for_source`], matching a specific source attribute.
pub fn find_map_for_source_attribute(
    uofd: &UniverseOfDiscourse,
    map: ConceptId,
    source: ConceptId,
    attribute: AttributeName,
) -> Option<ConceptId> {
    if get_source(uofd, map) == Some(source) && source_attribute(uofd, map) == Some(attribute) {
        return Some(map);
    }
    uofd.get_owned_concepts_refined_from_uri(map, CRL_MAP_URI)
        .into_iter()
        .find_map(|child| find_map_for_source_attribute(uofd, child, source, attribute))
}

/// Search from `map` downward, then from each enclosing map in turn.
///
/// The first match wins, which is not necessarily the nearest.
pub fn search_for_map_for_source(
    uofd: &UniverseOfDiscourse,
    map: ConceptId,
    source: ConceptId,
) -> Option<ConceptId> {
    let mut current = Some(map);
    let mut visited = HashSet::new();
    while let Some(scope) = current {
        if !visited.insert(scope) {
            break;
        }
        if let Some(found) = find_map_for_source(uofd, scope, source) {
            return Some(found);
        }
        current = uofd
            .owning_concept(scope)
            .filter(|owner| is_map(uofd, *owner));
    }
    None
}

/// Target of the map for `source`, searched from the root map above `map`.
pub fn find_target_for_source(
    uofd: &UniverseOfDiscourse,
    map: ConceptId,
    source: ConceptId,
) -> Option<ConceptId> {
    let root = get_root_map(uofd, map);
    let found = find_map_for_source(uofd, root, source)?;
    get_target(uofd, found)
}
