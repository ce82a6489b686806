//! Target selection for maps that write into an attribute slot.

use crl_core::{ConceptId, Transaction, UniverseOfDiscourse};
use tracing::debug;

use crate::errors::MapResult;
use crate::schema::CRL_MAP_TARGET_URI;

/// Whether some map's target reference already points at `concept`.
pub fn has_target_listener(uofd: &UniverseOfDiscourse, concept: ConceptId) -> bool {
    uofd.listeners(concept).iter().any(|listener| {
        let points_here = uofd
            .referenced_concept(*listener)
            .map(|referenced| referenced == Some(concept))
            .unwrap_or(false);
        points_here && uofd.is_refinement_of_uri(*listener, CRL_MAP_TARGET_URI)
    })
}

/// Pick the concept an attribute map writes into, under `parent_target`.
///
/// Returns `parent_target` itself when it already refines
/// `abstract_target`, else an owned refinement of `abstract_target` that no
/// other map targets yet, else a new one.
pub fn get_attribute_target(
    trans: &mut Transaction<'_>,
    parent_target: ConceptId,
    abstract_target: ConceptId,
) -> MapResult<ConceptId> {
    let uofd = trans.uofd();
    if uofd.is_refinement_of(parent_target, abstract_target) {
        return Ok(parent_target);
    }

    let free = uofd
        .get_owned_concepts_refined_from(parent_target, abstract_target)
        .into_iter()
        .find(|candidate| !has_target_listener(uofd, *candidate));
    if let Some(free) = free {
        return Ok(free);
    }

    let label = uofd.concept(abstract_target)?.label.clone();
    let created = trans.new_refinement_of(abstract_target, parent_target)?;
    trans.set_label(created, &label)?;
    debug!(target = %created, parent = %parent_target, "Created attribute target");
    Ok(created)
}
