//! Map schema - the prototype concepts every map refines.
//!
//! The schema is built once per store and then frozen (read-only, core):
//! - **CrlMap** with its **MapSource** and **MapTarget** references
//! - **CrlOneToOneMap**, refining CrlMap, whose instances the engine drives
//! - **ReferenceToElementMap** and **IDToReferenceMap**, declared for
//!   authoring but without a handler

mod domain;

pub use domain::*;

use crl_core::{ConceptId, Transaction};
use tracing::{debug, info};

use crate::errors::MapResult;

pub const CRL_MAPS_DOMAIN_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps";

pub const CRL_MAP_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps/Map";
pub const CRL_MAP_SOURCE_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps/Map/Source";
pub const CRL_MAP_TARGET_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps/Map/Target";

pub const CRL_ONE_TO_ONE_MAP_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap";
pub const CRL_ONE_TO_ONE_MAP_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap/Refinement";
pub const CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap/SourceReference";
pub const CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap/SourceReference/Refinement";
pub const CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap/TargetReference";
pub const CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/OneToOneMap/TargetReference/Refinement";

pub const CRL_REFERENCE_TO_ELEMENT_MAP_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap";
pub const CRL_REFERENCE_TO_ELEMENT_MAP_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap/Refinement";
pub const CRL_REFERENCE_TO_ELEMENT_MAP_SOURCE_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap/Source";
pub const CRL_REFERENCE_TO_ELEMENT_MAP_SOURCE_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap/Source/Refinement";
pub const CRL_REFERENCE_TO_ELEMENT_MAP_TARGET_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap/Target";
pub const CRL_REFERENCE_TO_ELEMENT_MAP_TARGET_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/ReferenceToElementMap/Target/Refinement";

pub const CRL_ID_TO_REFERENCE_MAP_URI: &str = "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap";
pub const CRL_ID_TO_REFERENCE_MAP_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap/Refinement";
pub const CRL_ID_TO_REFERENCE_MAP_SOURCE_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap/Source";
pub const CRL_ID_TO_REFERENCE_MAP_SOURCE_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap/Source/Refinement";
pub const CRL_ID_TO_REFERENCE_MAP_TARGET_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap/Target";
pub const CRL_ID_TO_REFERENCE_MAP_TARGET_REFINEMENT_URI: &str =
    "http://activeCRL.com/crlmaps/CrlMaps/IDToReferenceMap/Target/Refinement";

/// URIs of one map prototype refining CrlMap.
struct MapPrototype {
    label: &'static str,
    uri: &'static str,
    refinement_uri: &'static str,
    source_label: &'static str,
    source_uri: &'static str,
    source_refinement_uri: &'static str,
    target_label: &'static str,
    target_uri: &'static str,
    target_refinement_uri: &'static str,
}

const MAP_PROTOTYPES: [MapPrototype; 3] = [
    MapPrototype {
        label: "CrlOneToOneMap",
        uri: CRL_ONE_TO_ONE_MAP_URI,
        refinement_uri: CRL_ONE_TO_ONE_MAP_REFINEMENT_URI,
        source_label: "SourceReference",
        source_uri: CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_URI,
        source_refinement_uri: CRL_ONE_TO_ONE_MAP_SOURCE_REFERENCE_REFINEMENT_URI,
        target_label: "TargetReference",
        target_uri: CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_URI,
        target_refinement_uri: CRL_ONE_TO_ONE_MAP_TARGET_REFERENCE_REFINEMENT_URI,
    },
    MapPrototype {
        label: "ReferenceToElementMap",
        uri: CRL_REFERENCE_TO_ELEMENT_MAP_URI,
        refinement_uri: CRL_REFERENCE_TO_ELEMENT_MAP_REFINEMENT_URI,
        source_label: "Source",
        source_uri: CRL_REFERENCE_TO_ELEMENT_MAP_SOURCE_URI,
        source_refinement_uri: CRL_REFERENCE_TO_ELEMENT_MAP_SOURCE_REFINEMENT_URI,
        target_label: "Target",
        target_uri: CRL_REFERENCE_TO_ELEMENT_MAP_TARGET_URI,
        target_refinement_uri: CRL_REFERENCE_TO_ELEMENT_MAP_TARGET_REFINEMENT_URI,
    },
    MapPrototype {
        label: "IDToReferenceMap",
        uri: CRL_ID_TO_REFERENCE_MAP_URI,
        refinement_uri: CRL_ID_TO_REFERENCE_MAP_REFINEMENT_URI,
        source_label: "Source",
        source_uri: CRL_ID_TO_REFERENCE_MAP_SOURCE_URI,
        source_refinement_uri: CRL_ID_TO_REFERENCE_MAP_SOURCE_REFINEMENT_URI,
        target_label: "Target",
        target_uri: CRL_ID_TO_REFERENCE_MAP_TARGET_URI,
        target_refinement_uri: CRL_ID_TO_REFERENCE_MAP_TARGET_REFINEMENT_URI,
    },
];

/// Build the map schema unless the store already has it.
///
/// Returns the schema's root concept. The handler is registered separately
/// by [`CrlMapsDomain::install`].
pub fn build_crl_maps_domain(trans: &mut Transaction<'_>) -> MapResult<ConceptId> {
    if let Some(existing) = trans.uofd().get_concept_id_with_uri(CRL_MAPS_DOMAIN_URI) {
        debug!(domain = %existing, "Map schema already present");
        return Ok(existing);
    }

    let domain = trans.new_element(Some(CRL_MAPS_DOMAIN_URI))?;
    trans.set_label(domain, "CrlMapsDomain")?;

    let crl_map = trans.new_owned_element(domain, "CrlMap", Some(CRL_MAP_URI))?;
    let map_source = trans.new_owned_reference(crl_map, "MapSource", Some(CRL_MAP_SOURCE_URI))?;
    let map_target = trans.new_owned_reference(crl_map, "MapTarget", Some(CRL_MAP_TARGET_URI))?;

    for prototype in &MAP_PROTOTYPES {
        let map = trans.new_owned_element(domain, prototype.label, Some(prototype.uri))?;
        trans.new_complete_refinement(
            crl_map,
            map,
            "Refines CrlMap",
            Some(prototype.refinement_uri),
        )?;

        let source =
            trans.new_owned_reference(map, prototype.source_label, Some(prototype.source_uri))?;
        trans.new_complete_refinement(
            map_source,
            source,
            "Refines CrlMapSource",
            Some(prototype.source_refinement_uri),
        )?;

        let target =
            trans.new_owned_reference(map, prototype.target_label, Some(prototype.target_uri))?;
        trans.new_complete_refinement(
            map_target,
            target,
            "Refines CrlMapTarget",
            Some(prototype.target_refinement_uri),
        )?;
    }

    trans.set_read_only_recursively(domain, true)?;
    trans.set_is_core_recursively(domain)?;

    info!(domain = %domain, "Built map schema");
    Ok(domain)
}

/// Create a new defining map: a refinement of CrlOneToOneMap with its own
/// source and target references.
pub fn new_one_to_one_map(
    trans: &mut Transaction<'_>,
    label: &str,
    owner: Option<ConceptId>,
) -> MapResult<ConceptId> {
    let map = trans.create_replicate_as_refinement_from_uri(CRL_ONE_TO_ONE_MAP_URI, None)?;
    trans.set_label(map, label)?;
    if owner.is_some() {
        trans.set_owning_concept(map, owner)?;
    }
    Ok(map)
}
