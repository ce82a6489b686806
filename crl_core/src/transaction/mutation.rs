//! Attribute setters.
//!
//! Every setter write-locks the concept, refuses read-only concepts, and is
//! a no-op when the value is unchanged.

use tracing::trace;

use super::{ChangeNotification, NatureOfChange, Transaction};
use crate::concept::{AttributeName, Concept, ConceptId, ConceptKind, ConceptKindTag};
use crate::errors::{CoreError, CoreResult};

fn wrong_kind(concept: ConceptId, expected: ConceptKindTag, found: ConceptKindTag) -> CoreError {
    CoreError::WrongKind {
        concept,
        expected,
        found,
    }
}

impl Transaction<'_> {
    /// Lock a concept and hand it out for modification.
    fn writable(&mut self, id: ConceptId) -> CoreResult<&mut Concept> {
        self.write_lock(id)?;
        let concept = self
            .uofd
            .concept_mut(id)
            .ok_or(CoreError::ConceptNotFound(id))?;
        if concept.read_only {
            return Err(CoreError::ReadOnly(id));
        }
        Ok(concept)
    }

    /// Record an effective change to `attribute` of `id`.
    fn mark_changed(&mut self, id: ConceptId, attribute: AttributeName) {
        if let Some(concept) = self.uofd.concept_mut(id) {
            concept.version += 1;
        }
        self.change_count += 1;
        trace!(concept = %id, attribute = %attribute, "Concept changed");
        self.queue(id, ChangeNotification::concept_changed(id, attribute));
    }

    /// Move `id` under `owner`, or detach it with `None`.
    pub fn set_owning_concept(&mut self, id: ConceptId, owner: Option<ConceptId>) -> CoreResult<()> {
        if let Some(owner) = owner {
            self.uofd.concept(owner)?;
            if owner == id || self.uofd.is_descendant_of(owner, id) {
                return Err(CoreError::OwningCycle { concept: id, owner });
            }
        }

        let concept = self.writable(id)?;
        let previous = concept.owning_concept_id;
        if previous == owner {
            return Ok(());
        }
        concept.owning_concept_id = owner;

        if let Some(previous) = previous {
            self.uofd.detach_owned(previous, id);
        }
        if let Some(owner) = owner {
            self.uofd.attach_owned(owner, id);
        }
        self.mark_changed(id, AttributeName::OwningConceptID);

        // The new owner hears about it through the ConceptChanged above.
        if let Some(previous) = previous {
            let notification =
                ChangeNotification::concept_changed(id, AttributeName::OwningConceptID)
                    .forward(NatureOfChange::ChildChanged, id);
            self.queue(previous, notification);
        }
        Ok(())
    }

    pub fn set_label(&mut self, id: ConceptId, label: &str) -> CoreResult<()> {
        let concept = self.writable(id)?;
        if concept.label == label {
            return Ok(());
        }
        concept.label = label.to_string();
        self.mark_changed(id, AttributeName::Label);
        Ok(())
    }

    pub fn set_definition(&mut self, id: ConceptId, definition: &str) -> CoreResult<()> {
        let concept = self.writable(id)?;
        if concept.definition == definition {
            return Ok(());
        }
        concept.definition = definition.to_string();
        self.mark_changed(id, AttributeName::Definition);
        Ok(())
    }

    pub fn set_literal_value(&mut self, id: ConceptId, value: &str) -> CoreResult<()> {
        let concept = self.writable(id)?;
        let found = concept.kind_tag();
        let ConceptKind::Literal { literal_value } = &mut concept.kind else {
            return Err(wrong_kind(id, ConceptKindTag::Literal, found));
        };
        if literal_value.as_str() == value {
            return Ok(());
        }
        *literal_value = value.to_string();
        self.mark_changed(id, AttributeName::LiteralValue);
        Ok(())
    }

    /// Point a Reference at `target`, or at one attribute slot of it.
    pub fn set_referenced_concept(
        &mut self,
        reference: ConceptId,
        target: Option<ConceptId>,
        attribute: AttributeName,
    ) -> CoreResult<()> {
        if let Some(target) = target {
            self.uofd.concept(target)?;
        }

        let concept = self.writable(reference)?;
        let found = concept.kind_tag();
        let ConceptKind::Reference {
            referenced_concept_id,
            referenced_attribute_name,
        } = &mut concept.kind
        else {
            return Err(wrong_kind(reference, ConceptKindTag::Reference, found));
        };
        if *referenced_concept_id == target && *referenced_attribute_name == attribute {
            return Ok(());
        }
        let previous = *referenced_concept_id;
        *referenced_concept_id = target;
        *referenced_attribute_name = attribute;

        self.relink(reference, previous, target);
        self.mark_changed(reference, AttributeName::ReferencedConceptID);
        Ok(())
    }

    pub fn set_abstract_concept(
        &mut self,
        refinement: ConceptId,
        abstraction: Option<ConceptId>,
    ) -> CoreResult<()> {
        self.set_refinement_end(refinement, abstraction, AttributeName::AbstractConceptID)
    }

    pub fn set_refined_concept(
        &mut self,
        refinement: ConceptId,
        refined: Option<ConceptId>,
    ) -> CoreResult<()> {
        self.set_refinement_end(refinement, refined, AttributeName::RefinedConceptID)
    }

    fn set_refinement_end(
        &mut self,
        refinement: ConceptId,
        value: Option<ConceptId>,
        end: AttributeName,
    ) -> CoreResult<()> {
        if let Some(value) = value {
            self.uofd.concept(value)?;
        }

        let concept = self.writable(refinement)?;
        let found = concept.kind_tag();
        let ConceptKind::Refinement {
            abstract_concept_id,
            refined_concept_id,
        } = &mut concept.kind
        else {
            return Err(wrong_kind(refinement, ConceptKindTag::Refinement, found));
        };
        let slot = if end == AttributeName::AbstractConceptID {
            abstract_concept_id
        } else {
            refined_concept_id
        };
        if *slot == value {
            return Ok(());
        }
        let previous = *slot;
        *slot = value;

        self.relink(refinement, previous, value);
        if end == AttributeName::RefinedConceptID {
            self.uofd.move_refined_end(refinement, previous, value);
        }
        self.mark_changed(refinement, end);
        Ok(())
    }

    /// Move `listener` from the listener list of `previous` to that of `next`.
    fn relink(&mut self, listener: ConceptId, previous: Option<ConceptId>, next: Option<ConceptId>) {
        if let Some(previous) = previous {
            self.uofd.remove_listener(previous, listener);
        }
        if let Some(next) = next {
            self.uofd.add_listener(next, listener);
        }
    }

    /// Assign a pointer-valued attribute.
    ///
    /// `ReferencedConceptID` keeps the Reference's current attribute name.
    pub fn set_pointer_attribute(
        &mut self,
        id: ConceptId,
        attribute: AttributeName,
        value: Option<ConceptId>,
    ) -> CoreResult<()> {
        match attribute {
            AttributeName::OwningConceptID => self.set_owning_concept(id, value),
            AttributeName::ReferencedConceptID => {
                let attribute_name = self.uofd.concept(id)?.referenced_attribute_name()?;
                self.set_referenced_concept(id, value, attribute_name)
            }
            AttributeName::AbstractConceptID => self.set_abstract_concept(id, value),
            AttributeName::RefinedConceptID => self.set_refined_concept(id, value),
            other => Err(CoreError::NotAPointer(other)),
        }
    }

    /// Assign a string-valued attribute.
    pub fn set_scalar_attribute(
        &mut self,
        id: ConceptId,
        attribute: AttributeName,
        value: &str,
    ) -> CoreResult<()> {
        match attribute {
            AttributeName::Label => self.set_label(id, value),
            AttributeName::Definition => self.set_definition(id, value),
            AttributeName::LiteralValue => self.set_literal_value(id, value),
            other => Err(CoreError::NotAScalar(other)),
        }
    }

    /// Set the read-only flag on `root` and everything it owns.
    ///
    /// Core concepts cannot be made writable again.
    pub fn set_read_only_recursively(&mut self, root: ConceptId, read_only: bool) -> CoreResult<()> {
        let mut subtree = vec![root];
        subtree.extend(self.uofd.get_owned_descendants(root));

        for id in subtree {
            self.write_lock(id)?;
            let concept = self
                .uofd
                .concept_mut(id)
                .ok_or(CoreError::ConceptNotFound(id))?;
            if concept.read_only == read_only {
                continue;
            }
            if concept.is_core && !read_only {
                return Err(CoreError::ReadOnly(id));
            }
            concept.read_only = read_only;
            concept.version += 1;
            self.change_count += 1;
        }
        Ok(())
    }

    /// Mark `root` and everything it owns as part of a core schema.
    pub fn set_is_core_recursively(&mut self, root: ConceptId) -> CoreResult<()> {
        let mut subtree = vec![root];
        subtree.extend(self.uofd.get_owned_descendants(root));

        for id in subtree {
            self.write_lock(id)?;
            let concept = self
                .uofd
                .concept_mut(id)
                .ok_or(CoreError::ConceptNotFound(id))?;
            if concept.is_core {
                continue;
            }
            concept.is_core = true;
            concept.version += 1;
            self.change_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::concept::{AttributeName, ConceptKindTag};
    use crate::errors::CoreError;
    use crate::uofd::UniverseOfDiscourse;

    #[test]
    fn test_unchanged_value_is_a_no_op() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let element = trans.new_element(None).unwrap();
        trans.set_label(element, "A").unwrap();
        trans.release_locks_and_wait().unwrap();

        let before = trans.change_count();
        trans.set_label(element, "A").unwrap();
        assert_eq!(trans.change_count(), before);
        assert_eq!(trans.pending_notification_count(), 0);

        trans.set_label(element, "B").unwrap();
        assert_eq!(trans.change_count(), before + 1);
        assert_eq!(trans.pending_notification_count(), 1);
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        assert_eq!(uofd.concept(element).unwrap().version, 2);
    }

    #[test]
    fn test_read_only_refuses_changes() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let root = trans.new_element(None).unwrap();
        let child = trans.new_owned_literal(root, "child", None).unwrap();
        trans.set_read_only_recursively(root, true).unwrap();

        assert!(matches!(
            trans.set_label(root, "x"),
            Err(CoreError::ReadOnly(_))
        ));
        assert!(matches!(
            trans.set_literal_value(child, "x"),
            Err(CoreError::ReadOnly(_))
        ));

        trans.set_read_only_recursively(root, false).unwrap();
        trans.set_literal_value(child, "x").unwrap();
    }

    #[test]
    fn test_core_stays_read_only() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let root = trans.new_element(None).unwrap();
        trans.set_read_only_recursively(root, true).unwrap();
        trans.set_is_core_recursively(root).unwrap();

        assert!(matches!(
            trans.set_read_only_recursively(root, false),
            Err(CoreError::ReadOnly(_))
        ));
        assert!(trans.uofd().concept(root).unwrap().is_core);
    }

    #[test]
    fn test_ownership_cycle_rejected() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let root = trans.new_element(None).unwrap();
        let child = trans.new_owned_element(root, "child", None).unwrap();

        assert!(matches!(
            trans.set_owning_concept(root, Some(child)),
            Err(CoreError::OwningCycle { .. })
        ));
        assert!(matches!(
            trans.set_owning_concept(root, Some(root)),
            Err(CoreError::OwningCycle { .. })
        ));
    }

    #[test]
    fn test_reparenting_updates_indexes() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let first = trans.new_element(None).unwrap();
        let second = trans.new_element(None).unwrap();
        let child = trans.new_owned_element(first, "child", None).unwrap();
        trans.set_owning_concept(child, Some(second)).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        assert!(uofd.owned_concepts(first).is_empty());
        assert_eq!(uofd.owned_concepts(second), &[child]);
    }

    #[test]
    fn test_reference_listeners() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let a = trans.new_element(None).unwrap();
        let b = trans.new_element(None).unwrap();
        let reference = trans.new_reference(None).unwrap();

        trans
            .set_referenced_concept(reference, Some(a), AttributeName::Label)
            .unwrap();
        assert_eq!(trans.uofd().listeners(a), &[reference]);

        trans
            .set_pointer_attribute(reference, AttributeName::ReferencedConceptID, Some(b))
            .unwrap();
        assert!(trans.uofd().listeners(a).is_empty());
        assert_eq!(trans.uofd().listeners(b), &[reference]);

        let concept = trans.uofd().concept(reference).unwrap();
        assert_eq!(concept.referenced_concept_id().unwrap(), Some(b));
        assert_eq!(
            concept.referenced_attribute_name().unwrap(),
            AttributeName::Label
        );
    }

    #[test]
    fn test_wrong_kind_setter() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();
        let element = trans.new_element(None).unwrap();

        match trans.set_literal_value(element, "x") {
            Err(CoreError::WrongKind { found, .. }) => assert_eq!(found, ConceptKindTag::Element),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(trans
            .set_scalar_attribute(element, AttributeName::OwningConceptID, "x")
            .is_err());
    }
}
