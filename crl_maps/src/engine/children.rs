//! Child map instantiation.

use crl_core::{AttributeName, ConceptId, Transaction, UniverseOfDiscourse};
use tracing::{debug, info};

use crate::errors::MapResult;
use crate::resolution::{get_source, get_source_reference, set_source};
use crate::schema::CRL_MAP_URI;

/// Mirror the child maps of `defining_map` under `map_instance`, one child
/// instance per matching part of `source`.
///
/// A child map whose source names an attribute gets exactly one instance,
/// sourced from `source` itself or (for `ReferencedConceptID`) from the first
/// matching Reference `source` owns. Any other child map gets one instance
/// per descendant of `source` refining its abstract source. Existing
/// instances are reused, so an unchanged source creates nothing.
pub fn instantiate_map_children(
    trans: &mut Transaction<'_>,
    defining_map: ConceptId,
    map_instance: ConceptId,
    source: ConceptId,
) -> MapResult<()> {
    let child_definitions = trans
        .uofd()
        .get_owned_concepts_refined_from_uri(defining_map, CRL_MAP_URI);

    for child_definition in child_definitions {
        let uofd = trans.uofd();
        let Some(source_reference) = get_source_reference(uofd, child_definition) else {
            continue;
        };
        let Some(abstract_source) = uofd.referenced_concept(source_reference)? else {
            continue;
        };
        let attribute = uofd.concept(source_reference)?.referenced_attribute_name()?;

        if attribute == AttributeName::NoAttribute {
            let descendants = uofd.get_owned_descendants_refined_from(source, abstract_source);
            for descendant in descendants {
                let child = find_or_create_child(trans, child_definition, map_instance, descendant)?;
                set_source(trans, child, Some(descendant), AttributeName::NoAttribute)?;
            }
            continue;
        }

        let child_source = if uofd.is_refinement_of(source, abstract_source) {
            Some(source)
        } else if attribute == AttributeName::ReferencedConceptID {
            uofd.get_first_owned_reference_refined_from(source, abstract_source)
        } else {
            None
        };
        let Some(child_source) = child_source else {
            debug!(map = %map_instance, child = %child_definition, "No source for attribute map");
            continue;
        };
        let child = find_or_create_child(trans, child_definition, map_instance, child_source)?;
        set_source(trans, child, Some(child_source), attribute)?;
    }
    Ok(())
}

/// An instance of `child_definition` under `parent` already sourced from
/// `source`, else one with no source yet.
fn find_child(
    uofd: &UniverseOfDiscourse,
    child_definition: ConceptId,
    parent: ConceptId,
    source: ConceptId,
) -> Option<ConceptId> {
    let candidates = uofd.get_owned_concepts_refined_from(parent, child_definition);
    candidates
        .iter()
        .copied()
        .find(|candidate| get_source(uofd, *candidate) == Some(source))
        .or_else(|| {
            candidates
                .iter()
                .copied()
                .find(|candidate| get_source(uofd, *candidate).is_none())
        })
}

fn find_or_create_child(
    trans: &mut Transaction<'_>,
    child_definition: ConceptId,
    parent: ConceptId,
    source: ConceptId,
) -> MapResult<ConceptId> {
    if let Some(existing) = find_child(trans.uofd(), child_definition, parent, source) {
        return Ok(existing);
    }

    let child = trans.create_replicate_as_refinement(child_definition, None)?;
    trans.set_owning_concept(child, Some(parent))?;
    info!(parent = %parent, child = %child, source = %source, "Created child map instance");
    Ok(child)
}
