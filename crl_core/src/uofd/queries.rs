//! Read-only queries over the store: lookup, ownership and refinement.

use std::collections::HashSet;

use super::UniverseOfDiscourse;
use crate::concept::{Concept, ConceptId, ConceptKind};
use crate::errors::{CoreError, CoreResult};

impl UniverseOfDiscourse {
    pub fn get_concept(&self, id: ConceptId) -> Option<&Concept> {
        self.concepts.get(&id)
    }

    /// Like `get_concept`, but a missing concept is an error.
    pub fn concept(&self, id: ConceptId) -> CoreResult<&Concept> {
        self.concepts
            .get(&id)
            .ok_or(CoreError::ConceptNotFound(id))
    }

    pub fn get_concept_with_uri(&self, uri: &str) -> Option<&Concept> {
        self.uri_index
            .get(uri)
            .and_then(|id| self.concepts.get(id))
    }

    pub fn get_concept_id_with_uri(&self, uri: &str) -> Option<ConceptId> {
        self.uri_index.get(uri).copied()
    }

    /// Concepts owned by `owner`, in the order they were attached.
    pub fn owned_concepts(&self, owner: ConceptId) -> &[ConceptId] {
        self.owned.get(&owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn owning_concept(&self, id: ConceptId) -> Option<ConceptId> {
        self.concepts.get(&id)?.owning_concept_id
    }

    /// References and Refinements pointing at `id`.
    pub fn listeners(&self, id: ConceptId) -> &[ConceptId] {
        self.listeners.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The concept a Reference points at.
    pub fn referenced_concept(&self, reference: ConceptId) -> CoreResult<Option<ConceptId>> {
        self.concept(reference)?.referenced_concept_id()
    }

    /// Refinements whose refined end is `id`.
    pub fn refinements_of(&self, id: ConceptId) -> &[ConceptId] {
        self.refinements.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Abstractions reached through one Refinement whose refined concept is `id`.
    pub fn find_immediate_abstractions(&self, id: ConceptId) -> Vec<ConceptId> {
        let mut abstractions = Vec::new();
        for refinement in self.refinements_of(id) {
            if let Some(Concept {
                kind:
                    ConceptKind::Refinement {
                        abstract_concept_id: Some(abstraction),
                        ..
                    },
                ..
            }) = self.concepts.get(refinement)
            {
                if *abstraction != id && !abstractions.contains(abstraction) {
                    abstractions.push(*abstraction);
                }
            }
        }
        abstractions
    }

    /// Every direct and transitive abstraction of `id`, nearest first.
    ///
    /// Refinement cycles are tolerated; `id` itself is never included.
    pub fn find_abstractions(&self, id: ConceptId) -> Vec<ConceptId> {
        let mut found = Vec::new();
        let mut visited = HashSet::from([id]);
        let mut frontier = vec![id];

        while !frontier.is_empty() {
            let mut next = Vec::new();
            for current in frontier {
                for abstraction in self.find_immediate_abstractions(current) {
                    if visited.insert(abstraction) {
                        found.push(abstraction);
                        next.push(abstraction);
                    }
                }
            }
            frontier = next;
        }

        found
    }

    /// Whether `id` directly or transitively refines `abstraction`.
    pub fn is_refinement_of(&self, id: ConceptId, abstraction: ConceptId) -> bool {
        if id == abstraction {
            return false;
        }
        self.find_abstractions(id).contains(&abstraction)
    }

    pub fn is_refinement_of_uri(&self, id: ConceptId, uri: &str) -> bool {
        match self.get_concept_id_with_uri(uri) {
            Some(abstraction) => self.is_refinement_of(id, abstraction),
            None => false,
        }
    }

    pub fn get_first_owned_concept_refined_from(
        &self,
        owner: ConceptId,
        abstraction: ConceptId,
    ) -> Option<ConceptId> {
        self.owned_concepts(owner)
            .iter()
            .copied()
            .find(|child| self.is_refinement_of(*child, abstraction))
    }

    pub fn get_first_owned_concept_refined_from_uri(
        &self,
        owner: ConceptId,
        uri: &str,
    ) -> Option<ConceptId> {
        let abstraction = self.get_concept_id_with_uri(uri)?;
        self.get_first_owned_concept_refined_from(owner, abstraction)
    }

    /// First owned Reference of `owner` refining `abstraction`.
    pub fn get_first_owned_reference_refined_from(
        &self,
        owner: ConceptId,
        abstraction: ConceptId,
    ) -> Option<ConceptId> {
        self.owned_concepts(owner).iter().copied().find(|child| {
            self.concepts
                .get(child)
                .map(Concept::is_reference)
                .unwrap_or(false)
                && self.is_refinement_of(*child, abstraction)
        })
    }

    pub fn get_first_owned_reference_refined_from_uri(
        &self,
        owner: ConceptId,
        uri: &str,
    ) -> Option<ConceptId> {
        let abstraction = self.get_concept_id_with_uri(uri)?;
        self.get_first_owned_reference_refined_from(owner, abstraction)
    }

    pub fn get_owned_concepts_refined_from(
        &self,
        owner: ConceptId,
        abstraction: ConceptId,
    ) -> Vec<ConceptId> {
        self.owned_concepts(owner)
            .iter()
            .copied()
            .filter(|child| self.is_refinement_of(*child, abstraction))
            .collect()
    }

    pub fn get_owned_concepts_refined_from_uri(&self, owner: ConceptId, uri: &str) -> Vec<ConceptId> {
        match self.get_concept_id_with_uri(uri) {
            Some(abstraction) => self.get_owned_concepts_refined_from(owner, abstraction),
            None => Vec::new(),
        }
    }

    /// Every concept below `owner` in the ownership tree, depth-first, pre-order.
    pub fn get_owned_descendants(&self, owner: ConceptId) -> Vec<ConceptId> {
        let mut found = Vec::new();
        let mut stack: Vec<ConceptId> = self.owned_concepts(owner).iter().rev().copied().collect();
        let mut visited = HashSet::from([owner]);

        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            found.push(current);
            stack.extend(self.owned_concepts(current).iter().rev().copied());
        }

        found
    }

    /// All descendants of `owner` (depth-first, pre-order) refining `abstraction`.
    pub fn get_owned_descendants_refined_from(
        &self,
        owner: ConceptId,
        abstraction: ConceptId,
    ) -> Vec<ConceptId> {
        self.get_owned_descendants(owner)
            .into_iter()
            .filter(|descendant| self.is_refinement_of(*descendant, abstraction))
            .collect()
    }

    /// Whether `ancestor` appears on the ownership chain above `id`.
    pub fn is_descendant_of(&self, id: ConceptId, ancestor: ConceptId) -> bool {
        let mut visited = HashSet::new();
        let mut current = self.owning_concept(id);
        while let Some(owner) = current {
            if owner == ancestor {
                return true;
            }
            if !visited.insert(owner) {
                return false;
            }
            current = self.owning_concept(owner);
        }
        false
    }
}
