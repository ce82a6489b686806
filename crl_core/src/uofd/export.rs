//! Diagnostic JSON export of a concept sub-tree.

use serde::Serialize;

use super::UniverseOfDiscourse;
use crate::concept::{ConceptId, ConceptKind};
use crate::errors::CoreResult;

/// One concept of an exported sub-tree, with its owned concepts nested.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportedConcept {
    pub id: ConceptId,
    pub uri: Option<String>,
    pub label: String,
    pub definition: String,
    pub read_only: bool,
    pub is_core: bool,
    pub kind: ConceptKind,
    pub owned: Vec<ExportedConcept>,
}

impl UniverseOfDiscourse {
    /// Snapshot `root` and everything it owns.
    ///
    /// Versions are left out so that two stores built by the same steps
    /// export identically.
    pub fn export_tree(&self, root: ConceptId) -> CoreResult<ExportedConcept> {
        let concept = self.concept(root)?;
        let owned = self
            .owned_concepts(root)
            .iter()
            .map(|child| self.export_tree(*child))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(ExportedConcept {
            id: concept.id,
            uri: concept.uri.clone(),
            label: concept.label.clone(),
            definition: concept.definition.clone(),
            read_only: concept.read_only,
            is_core: concept.is_core,
            kind: concept.kind.clone(),
            owned,
        })
    }

    /// Pretty-printed JSON of `export_tree`.
    pub fn export_concept_space(&self, root: ConceptId) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.export_tree(root)?)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(uofd: &mut UniverseOfDiscourse) -> ConceptId {
        let mut trans = uofd.new_transaction();
        let root = trans.new_element(Some("http://test/Root")).unwrap();
        trans.set_label(root, "Root").unwrap();
        trans
            .new_owned_literal(root, "Value", Some("http://test/Root/Value"))
            .unwrap();
        trans.release_locks_and_wait().unwrap();
        root
    }

    #[test]
    fn test_same_steps_export_identically() {
        let mut first = UniverseOfDiscourse::new();
        let mut second = UniverseOfDiscourse::new();
        let a = build(&mut first);
        let b = build(&mut second);

        assert_eq!(
            first.export_concept_space(a).unwrap(),
            second.export_concept_space(b).unwrap()
        );
    }

    #[test]
    fn test_export_is_json() {
        let mut uofd = UniverseOfDiscourse::new();
        let root = build(&mut uofd);

        let json = uofd.export_concept_space(root).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["label"], "Root");
        assert_eq!(value["owned"][0]["label"], "Value");
    }

    #[test]
    fn test_export_missing_root() {
        let uofd = UniverseOfDiscourse::new();
        assert!(uofd.export_concept_space(ConceptId::new()).is_err());
    }
}
