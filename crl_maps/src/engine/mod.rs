//! The one-to-one map handler.
//!
//! Runs whenever a map instance (or something it listens to) changes. Each
//! run re-derives where the instance stands from the graph, then does the
//! next piece of work it can:
//! - Give the instance its own source and target references
//! - Materialize the target, or pick it inside the parent map's target
//! - Copy the mapped value across when the source names an attribute
//! - Instantiate and converge child maps
//!
//! Missing prerequisites are waited out, not reported. Changes that began
//! in the instance's own child maps or target skip the child map work: the
//! run that made them already converged those children.

mod children;
mod convergence;
mod state;

pub use children::*;
pub use convergence::*;
pub use state::*;

use std::collections::HashSet;

use crl_core::{AttributeName, ChangeNotification, ConceptId, Transaction, UniverseOfDiscourse};
use tracing::{debug, info, trace};

use crate::config::MapEngineConfig;
use crate::errors::{MapError, MapResult};
use crate::resolution::{
    get_attribute_target, get_parent_map_target, get_target, is_map, is_root_map_instance,
    search_for_map_for_source,
};

/// A value read off the source, ready to be written into the target.
#[derive(Debug, Clone, PartialEq, Eq)]
enum MappedValue {
    /// Counterpart of the source's pointee, or `None` for an unset pointer.
    Pointer(Option<ConceptId>),
    Scalar(String),
}

/// Bring `map_instance` one step closer to its converged state.
pub fn execute_one_to_one_map(
    map_instance: ConceptId,
    notification: &ChangeNotification,
    trans: &mut Transaction<'_>,
    config: &MapEngineConfig,
) -> MapResult<()> {
    trans.write_lock(map_instance)?;

    let context = match MapContext::resolve(trans.uofd(), map_instance)? {
        Ok(context) => context,
        Err(state) => {
            trace!(map = %map_instance, state = ?state, nature = ?notification.nature, "Map not bound");
            return Ok(());
        }
    };

    let source_reference = match context.source_reference {
        Some(reference) => reference,
        None => own_reference(trans, map_instance, context.abstract_source_reference)?,
    };
    let target_reference = match context.target_reference {
        Some(reference) => reference,
        None => own_reference(trans, map_instance, context.abstract_target_reference)?,
    };
    let current_target = trans.uofd().referenced_concept(target_reference)?;
    trans.set_referenced_concept(target_reference, current_target, context.target_attribute)?;

    let source = match context.source {
        Some(source) if trans.uofd().is_refinement_of(source, context.abstract_source) => source,
        Some(_) => {
            debug!(map = %map_instance, state = ?MapState::SourcePending, "Map waiting");
            return Ok(());
        }
        None => {
            debug!(map = %map_instance, state = ?MapState::SourceUnresolved, "Map waiting");
            return Ok(());
        }
    };

    let target = if context.target_attribute == AttributeName::NoAttribute {
        materialize_target(trans, &context, source, target_reference, config)?
    } else {
        match attribute_target(trans, &context, target_reference)? {
            Some(target) => target,
            None => {
                debug!(map = %map_instance, "Map waiting for parent target");
                return Ok(());
            }
        }
    };

    let source_attribute = trans
        .uofd()
        .concept(source_reference)?
        .referenced_attribute_name()?;
    if source_attribute != AttributeName::NoAttribute {
        if let Some(value) = read_value(trans, map_instance, source, source_attribute)? {
            write_value(trans, map_instance, target, context.target_attribute, value)?;
        }
    }

    if raised_by_own_output(trans.uofd(), map_instance, target, notification) {
        trace!(
            map = %map_instance,
            origin = %notification.root_cause().reporting_concept_id,
            "Change came from own output"
        );
        return Ok(());
    }

    instantiate_map_children(trans, context.defining_map, map_instance, source)?;
    let report = converge_map_children(trans, map_instance, config)?;

    debug!(
        map = %map_instance,
        source = %source,
        target = %target,
        passes = report.passes,
        converged = report.converged,
        "Executed one-to-one map"
    );
    Ok(())
}

/// Whether the chain behind `notification` started in a child map owned by
/// `map_instance` or anywhere in `target`'s subtree.
fn raised_by_own_output(
    uofd: &UniverseOfDiscourse,
    map_instance: ConceptId,
    target: ConceptId,
    notification: &ChangeNotification,
) -> bool {
    let mut current = notification.root_cause().reporting_concept_id;
    let mut visited = HashSet::new();
    while visited.insert(current) {
        if current == target {
            return true;
        }
        let Some(owner) = uofd.owning_concept(current) else {
            return false;
        };
        if owner == map_instance {
            return is_map(uofd, current);
        }
        current = owner;
    }
    false
}

/// Give `map_instance` its own refinement of a defining reference.
fn own_reference(
    trans: &mut Transaction<'_>,
    map_instance: ConceptId,
    abstract_reference: ConceptId,
) -> MapResult<ConceptId> {
    let label = trans.uofd().concept(abstract_reference)?.label.clone();
    let reference = trans.new_refinement_of(abstract_reference, map_instance)?;
    trans.set_label(reference, &label)?;
    Ok(reference)
}

fn ensure_refines(trans: &Transaction<'_>, context: &MapContext, target: ConceptId) -> MapResult<()> {
    if trans.uofd().is_refinement_of(target, context.abstract_target) {
        return Ok(());
    }
    Err(MapError::TargetNotRefinement {
        map_instance: context.map_instance,
        target,
        abstract_target: context.abstract_target,
    })
}

/// Whole-concept target: create it if needed and keep it where it belongs.
///
/// A root instance's target lives under the instance's owner; a nested
/// instance's target lives under the parent map's target once that exists.
fn materialize_target(
    trans: &mut Transaction<'_>,
    context: &MapContext,
    source: ConceptId,
    target_reference: ConceptId,
    config: &MapEngineConfig,
) -> MapResult<ConceptId> {
    let target = match context.target {
        Some(target) => target,
        None => {
            let (tag, abstract_label) = {
                let abstract_target = trans.uofd().concept(context.abstract_target)?;
                (abstract_target.kind_tag(), abstract_target.label.clone())
            };
            let source_label = trans.uofd().concept(source)?.label.clone();

            let target = trans.new_concept(tag, None)?;
            trans.new_complete_refinement(
                context.abstract_target,
                target,
                &format!("Refines {}", abstract_label),
                None,
            )?;
            trans.set_label(target, &config.target_label(&abstract_label, &source_label))?;
            trans.set_referenced_concept(target_reference, Some(target), AttributeName::NoAttribute)?;
            info!(map = %context.map_instance, target = %target, kind = %tag, "Created map target");
            target
        }
    };
    ensure_refines(trans, context, target)?;

    let owner = if is_root_map_instance(trans.uofd(), context.map_instance) {
        Some(context.owner)
    } else {
        get_parent_map_target(trans.uofd(), context.map_instance)
    };
    if let Some(owner) = owner {
        trans.set_owning_concept(target, Some(owner))?;
    }
    Ok(target)
}

/// Attribute target: the parent map's target or one of its children.
/// `None` while the parent target does not exist yet.
fn attribute_target(
    trans: &mut Transaction<'_>,
    context: &MapContext,
    target_reference: ConceptId,
) -> MapResult<Option<ConceptId>> {
    let target = match context.target {
        Some(target) => target,
        None => {
            let Some(parent_target) = get_parent_map_target(trans.uofd(), context.map_instance)
            else {
                return Ok(None);
            };
            let target = get_attribute_target(trans, parent_target, context.abstract_target)?;
            trans.set_referenced_concept(target_reference, Some(target), context.target_attribute)?;
            target
        }
    };
    ensure_refines(trans, context, target)?;
    Ok(Some(target))
}

/// Read `attribute` off `source`. Pointers are translated to the target of
/// the map responsible for the pointee; `None` until that map has one.
fn read_value(
    trans: &Transaction<'_>,
    map_instance: ConceptId,
    source: ConceptId,
    attribute: AttributeName,
) -> MapResult<Option<MappedValue>> {
    let uofd = trans.uofd();
    let concept = uofd.concept(source)?;
    if !attribute.is_pointer() {
        return Ok(Some(MappedValue::Scalar(concept.scalar_attribute(attribute)?)));
    }

    let Some(pointee) = concept.pointer_attribute(attribute)? else {
        return Ok(Some(MappedValue::Pointer(None)));
    };
    let counterpart = search_for_map_for_source(uofd, map_instance, pointee)
        .and_then(|found| get_target(uofd, found));
    match counterpart {
        Some(counterpart) => Ok(Some(MappedValue::Pointer(Some(counterpart)))),
        None => {
            debug!(map = %map_instance, pointee = %pointee, "Pointee not mapped yet");
            Ok(None)
        }
    }
}

fn write_value(
    trans: &mut Transaction<'_>,
    map_instance: ConceptId,
    target: ConceptId,
    attribute: AttributeName,
    value: MappedValue,
) -> MapResult<()> {
    match (attribute, value) {
        (AttributeName::NoAttribute, MappedValue::Pointer(pointer)) => {
            if trans.uofd().concept(target)?.is_reference() {
                trans.set_pointer_attribute(target, AttributeName::ReferencedConceptID, pointer)?;
            } else {
                debug!(map = %map_instance, target = %target, "Pointer value needs a Reference target");
            }
        }
        (attribute, MappedValue::Pointer(pointer)) if attribute.is_pointer() => {
            trans.set_pointer_attribute(target, attribute, pointer)?;
        }
        (attribute, MappedValue::Pointer(pointer)) if attribute.is_scalar() => {
            let value = pointer.map(|id| id.to_string()).unwrap_or_default();
            trans.set_scalar_attribute(target, attribute, &value)?;
        }
        (attribute, MappedValue::Scalar(value)) if attribute.is_scalar() => {
            trans.set_scalar_attribute(target, attribute, &value)?;
        }
        (attribute, value) => {
            debug!(map = %map_instance, attribute = %attribute, value = ?value, "Value does not fit target slot");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolution::{get_source, get_source_reference, set_source, set_target};
    use crate::schema::{new_one_to_one_map, CrlMapsDomain};
    use crl_core::NatureOfChange;

    struct Fixture {
        uofd: UniverseOfDiscourse,
        abstract_source: ConceptId,
        abstract_target: ConceptId,
        instance_folder: ConceptId,
        instance: ConceptId,
    }

    /// A defining map from an Element to a Literal, and an anchored instance.
    fn fixture() -> Fixture {
        let mut uofd = UniverseOfDiscourse::new();
        CrlMapsDomain::install(&mut uofd, MapEngineConfig::default()).unwrap();

        let mut trans = uofd.new_transaction();
        let abstract_folder = trans.new_element(None).unwrap();
        let abstract_source = trans
            .new_owned_element(abstract_folder, "Person", None)
            .unwrap();
        let abstract_target = trans
            .new_owned_literal(abstract_folder, "Record", None)
            .unwrap();
        let defining = new_one_to_one_map(&mut trans, "PersonToRecord", Some(abstract_folder)).unwrap();
        set_source(&mut trans, defining, Some(abstract_source), AttributeName::NoAttribute).unwrap();
        set_target(&mut trans, defining, Some(abstract_target), AttributeName::NoAttribute).unwrap();

        let instance_folder = trans.new_element(None).unwrap();
        let instance = trans.create_replicate_as_refinement(defining, None).unwrap();
        trans.set_owning_concept(instance, Some(instance_folder)).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        Fixture {
            uofd,
            abstract_source,
            abstract_target,
            instance_folder,
            instance,
        }
    }

    #[test]
    fn test_target_created_under_instance_owner() {
        let mut f = fixture();
        let mut trans = f.uofd.new_transaction();
        let source = trans.create_replicate_as_refinement(f.abstract_source, None).unwrap();
        trans.set_label(source, "alice").unwrap();
        set_source(&mut trans, f.instance, Some(source), AttributeName::NoAttribute).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let target = get_target(&f.uofd, f.instance).unwrap();
        let concept = f.uofd.concept(target).unwrap();
        assert!(concept.is_literal());
        assert_eq!(concept.label, "RecordFromalice");
        assert!(f.uofd.is_refinement_of(target, f.abstract_target));
        assert_eq!(concept.owning_concept_id, Some(f.instance_folder));
        assert_eq!(
            derive_map_state(&f.uofd, f.instance).unwrap(),
            MapState::Converged
        );
    }

    #[test]
    fn test_wrong_source_is_ignored() {
        let mut f = fixture();
        let mut trans = f.uofd.new_transaction();
        let stranger = trans.new_element(None).unwrap();
        set_source(&mut trans, f.instance, Some(stranger), AttributeName::NoAttribute).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        assert_eq!(get_source(&f.uofd, f.instance), Some(stranger));
        assert_eq!(get_target(&f.uofd, f.instance), None);
        assert_eq!(
            derive_map_state(&f.uofd, f.instance).unwrap(),
            MapState::SourcePending
        );
    }

    #[test]
    fn test_foreign_target_is_rejected() {
        let mut f = fixture();
        let mut trans = f.uofd.new_transaction();
        let source = trans.create_replicate_as_refinement(f.abstract_source, None).unwrap();
        let foreign = trans.new_literal(None).unwrap();
        set_target(&mut trans, f.instance, Some(foreign), AttributeName::NoAttribute).unwrap();
        trans.release_locks_and_wait().unwrap();

        set_source(&mut trans, f.instance, Some(source), AttributeName::NoAttribute).unwrap();
        let err = execute_one_to_one_map(
            f.instance,
            &ChangeNotification::tickle(f.instance),
            &mut trans,
            &MapEngineConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, MapError::TargetNotRefinement { target, .. } if target == foreign));
    }

    #[test]
    fn test_rerun_changes_nothing() {
        let mut f = fixture();
        let mut trans = f.uofd.new_transaction();
        let source = trans.create_replicate_as_refinement(f.abstract_source, None).unwrap();
        set_source(&mut trans, f.instance, Some(source), AttributeName::NoAttribute).unwrap();
        trans.release_locks_and_wait().unwrap();

        let count = trans.uofd().len();
        let changes = trans.change_count();
        execute_one_to_one_map(
            f.instance,
            &ChangeNotification::tickle(f.instance),
            &mut trans,
            &MapEngineConfig::default(),
        )
        .unwrap();
        assert_eq!(trans.uofd().len(), count);
        assert_eq!(trans.change_count(), changes);
    }

    #[test]
    fn test_own_output_is_recognized() {
        let mut f = fixture();
        let mut trans = f.uofd.new_transaction();
        let source = trans.create_replicate_as_refinement(f.abstract_source, None).unwrap();
        set_source(&mut trans, f.instance, Some(source), AttributeName::NoAttribute).unwrap();
        let nested = new_one_to_one_map(&mut trans, "Nested", Some(f.instance)).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let uofd = &f.uofd;
        let target = get_target(uofd, f.instance).unwrap();
        let own_reference = get_source_reference(uofd, f.instance).unwrap();
        let nested_reference = get_source_reference(uofd, nested).unwrap();
        let changed = |concept| ChangeNotification::concept_changed(concept, AttributeName::Label);

        assert!(raised_by_own_output(uofd, f.instance, target, &changed(target)));
        assert!(raised_by_own_output(
            uofd,
            f.instance,
            target,
            &changed(nested_reference).forward(NatureOfChange::ForwardedChange, nested_reference)
        ));
        assert!(!raised_by_own_output(
            uofd,
            f.instance,
            target,
            &changed(own_reference).forward(NatureOfChange::ForwardedChange, own_reference)
        ));
        assert!(!raised_by_own_output(uofd, f.instance, target, &changed(source)));
        assert!(!raised_by_own_output(
            uofd,
            f.instance,
            target,
            &ChangeNotification::tickle(f.instance_folder)
        ));
    }
}
