//! Replication as refinement.

use super::Transaction;
use crate::concept::ConceptId;
use crate::errors::{CoreError, CoreResult};

impl Transaction<'_> {
    /// Create a replica of `original` and its owned sub-tree, each replica
    /// refined from its original. Refinements owned by the original are not
    /// replicated.
    pub fn create_replicate_as_refinement(
        &mut self,
        original: ConceptId,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        let tag = self.uofd.concept(original)?.kind_tag();
        let replicate = self.new_concept(tag, uri)?;
        self.replicate_as_refinement(original, replicate)?;
        Ok(replicate)
    }

    pub fn create_replicate_as_refinement_from_uri(
        &mut self,
        original_uri: &str,
        uri: Option<&str>,
    ) -> CoreResult<ConceptId> {
        let original = self
            .uofd
            .get_concept_id_with_uri(original_uri)
            .ok_or_else(|| CoreError::UriNotFound(original_uri.to_string()))?;
        self.create_replicate_as_refinement(original, uri)
    }

    /// Bring `replicate` in line with the structure of `original`.
    ///
    /// Owned children of the replicate that already refine an original child
    /// are reused, so applying this twice creates nothing new.
    pub fn replicate_as_refinement(
        &mut self,
        original: ConceptId,
        replicate: ConceptId,
    ) -> CoreResult<()> {
        let label = self.uofd.concept(original)?.label.clone();
        self.write_lock(replicate)?;
        self.set_label(replicate, &label)?;

        if !self.uofd.is_refinement_of(replicate, original) {
            self.new_complete_refinement(original, replicate, &format!("Refines {}", label), None)?;
        }

        let original_children = self.uofd.owned_concepts(original).to_vec();
        for original_child in original_children {
            let child = self.uofd.concept(original_child)?;
            if child.is_refinement() {
                continue;
            }
            let tag = child.kind_tag();

            let existing = self
                .uofd
                .owned_concepts(replicate)
                .iter()
                .copied()
                .find(|candidate| self.uofd.is_refinement_of(*candidate, original_child));
            let replicate_child = match existing {
                Some(existing) => existing,
                None => self.new_owned_concept(tag, replicate, "", None)?,
            };
            self.replicate_as_refinement(original_child, replicate_child)?;
        }
        Ok(())
    }
}
