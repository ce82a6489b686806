//! Transactions - the only way to mutate a Universe of Discourse.
//!
//! A transaction write-locks every concept it touches and queues a
//! `ConceptChanged` notification for every effective change. The queue is
//! delivered by [`Transaction::release_locks_and_wait`], which also releases
//! the locks.

mod dispatch;
mod mutation;
mod notification;
mod replication;

pub use notification::*;

use std::collections::{HashSet, VecDeque};

use tracing::{trace, warn};

use crate::concept::{Concept, ConceptId, ConceptKind, ConceptKindTag};
use crate::errors::{CoreError, CoreResult};
use crate::uofd::UniverseOfDiscourse;

/// A unit of work against the store.
pub struct Transaction<'u> {
    uofd: &'u mut UniverseOfDiscourse,

    held_write_locks: HashSet<ConceptId>,

    /// Notifications awaiting delivery: (receiving concept, notification).
    pending: VecDeque<(ConceptId, ChangeNotification)>,

    /// Effective mutations performed so far.
    change_count: u64,

    /// Function invocations since the last release.
    function_calls: usize,

    draining: bool,
}

impl<'u> Transaction<'u> {
    pub(crate) fn new(uofd: &'u mut UniverseOfDiscourse) -> Self {
        Self {
            uofd,
            held_write_locks: HashSet::new(),
            pending: VecDeque::new(),
            change_count: 0,
            function_calls: 0,
            draining: false,
        }
    }

    /// Read access to the store.
    pub fn uofd(&self) -> &UniverseOfDiscourse {
        &*self.uofd
    }

    /// Acquire the write lock on a concept for the rest of the transaction.
    pub fn write_lock(&mut self, id: ConceptId) -> CoreResult<()> {
        self.uofd.concept(id)?;
        self.held_write_locks.insert(id);
        Ok(())
    }

    pub fn holds_write_lock(&self, id: ConceptId) -> bool {
        self.held_write_locks.contains(&id)
    }

    pub fn held_write_lock_count(&self) -> usize {
        self.held_write_locks.len()
    }

    /// Monotonic count of effective mutations made through this transaction.
    pub fn change_count(&self) -> u64 {
        self.change_count
    }

    pub fn pending_notification_count(&self) -> usize {
        self.pending.len()
    }

    // Creation

    /// Create an unowned concept of the given kind.
    ///
    /// A concept created with a URI gets the ID derived from that URI.
    pub fn new_concept(&mut self, tag: ConceptKindTag, uri: Option<&str>) -> CoreResult<ConceptId> {
        let id = match uri {
            Some(uri) => {
                if self.uofd.get_concept_id_with_uri(uri).is_some() {
                    return Err(CoreError::UriInUse(uri.to_string()));
                }
                ConceptId::from_uri(uri)
            }
            None => ConceptId::new(),
        };

        let mut concept = Concept::new(id, ConceptKind::empty(tag));
        concept.uri = uri.map(str::to_string);
        self.uofd.insert_concept(concept);
        self.held_write_locks.insert(id);
        self.change_count += 1;

        trace!(concept = %id, kind = %tag, uri = ?uri, "Created concept");
        Ok(id)
    }

    pub fn new_element(&mut self, uri: Option<&str>) -> CoreResult<ConceptId> {
        self.new_concept(ConceptKindTag::Element, uri)
    }

    pub fn new_reference(&mut self, uri: Option<&str>) -> CoreResult<ConceptId> {
        self.new_concept(ConceptKindTag::Reference, uri)
    }

    pub fn new_refinement(&mut self, uri: Option<&str>) -> CoreResult<ConceptId> {
        self.new_concept(ConceptKindTag::Refinement, uri)
    }

    pub fn new_literal(&mut self, uri: Option<&str>) -> CoreResult<ConceptId> {
        self.new_concept(ConceptKindTag::Literal, uri)
    }

    /// Create a labelled concept owned by `owner`.
    pub fn new_owned_concept(
        &mut self,
        tag: ConceptKindTag,
        owner: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.uofd.concept(owner)?;
        let id = self.new_concept(tag, uri)?;
        self.set_label(id, label)?;
        self.set_owning_concept(id, Some(owner))?;
        Ok(id)
    }

    pub fn new_owned_element(
        &mut self,
        owner: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.new_owned_concept(ConceptKindTag::Element, owner, label, uri)
    }

    pub fn new_owned_reference(
        &mut self,
        owner: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.new_owned_concept(ConceptKindTag::Reference, owner, label, uri)
    }

    pub fn new_owned_refinement(
        &mut self,
        owner: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.new_owned_concept(ConceptKindTag::Refinement, owner, label, uri)
    }

    pub fn new_owned_literal(
        &mut self,
        owner: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.new_owned_concept(ConceptKindTag::Literal, owner, label, uri)
    }

    /// Create a Refinement from `abstraction` to `refined`, owned by `refined`.
    pub fn new_complete_refinement(
        &mut self,
        abstraction: ConceptId,
        refined: ConceptId,
        label: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        self.uofd.concept(abstraction)?;
        self.uofd.concept(refined)?;

        let refinement = self.new_refinement(uri)?;
        self.set_label(refinement, label)?;
        self.set_abstract_concept(refinement, Some(abstraction))?;
        self.set_refined_concept(refinement, Some(refined))?;
        self.set_owning_concept(refinement, Some(refined))?;
        Ok(refinement)
    }

    /// Create a concept of `abstraction`'s kind, owned by `owner` and refined
    /// from `abstraction`.
    pub fn new_refinement_of(
        &mut self,
        abstraction: ConceptId,
        owner: ConceptId,
    ) -> CoreResult<ConceptId> {
        let (tag, label) = {
            let abstract_concept = self.uofd.concept(abstraction)?;
            (abstract_concept.kind_tag(), abstract_concept.label.clone())
        };
        let refined = self.new_owned_concept(tag, owner, "", None)?;
        self.new_complete_refinement(abstraction, refined, &format!("Refines {}", label), None)?;
        Ok(refined)
    }

    /// Queue a notification for delivery.
    pub(crate) fn queue(&mut self, target: ConceptId, notification: ChangeNotification) {
        self.pending.push_back((target, notification));
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if !self.pending.is_empty() {
            warn!(
                pending = self.pending.len(),
                "Transaction dropped with undelivered notifications"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::concept::AttributeName;

    #[test]
    fn test_creation_takes_write_locks() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();

        let element = trans.new_element(None).unwrap();
        assert!(trans.holds_write_lock(element));
        assert_eq!(trans.change_count(), 1);

        trans.release_locks_and_wait().unwrap();
        assert_eq!(trans.held_write_lock_count(), 0);
    }

    #[test]
    fn test_duplicate_uri_rejected() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();

        trans.new_element(Some("http://test/A")).unwrap();
        assert!(matches!(
            trans.new_literal(Some("http://test/A")),
            Err(CoreError::UriInUse(_))
        ));
    }

    #[test]
    fn test_owned_creation() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();

        let owner = trans.new_element(None).unwrap();
        let literal = trans.new_owned_literal(owner, "Value", None).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let concept = uofd.concept(literal).unwrap();
        assert_eq!(concept.label, "Value");
        assert_eq!(concept.owning_concept_id, Some(owner));
        assert_eq!(concept.literal_value().unwrap(), "");
        assert_eq!(uofd.owned_concepts(owner), &[literal]);
    }

    #[test]
    fn test_new_refinement_of_copies_kind() {
        let mut uofd = UniverseOfDiscourse::new();
        let mut trans = uofd.new_transaction();

        let abstraction = trans.new_reference(Some("http://test/Pointer")).unwrap();
        trans.set_label(abstraction, "Pointer").unwrap();
        let owner = trans.new_element(None).unwrap();
        let refined = trans.new_refinement_of(abstraction, owner).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let concept = uofd.concept(refined).unwrap();
        assert!(concept.is_reference());
        assert_eq!(
            concept.referenced_attribute_name().unwrap(),
            AttributeName::NoAttribute
        );
        assert!(uofd.is_refinement_of(refined, abstraction));

        let edge = uofd.owned_concepts(refined)[0];
        assert_eq!(uofd.concept(edge).unwrap().label, "Refines Pointer");
    }
}
