//! Concept definitions - the nodes of the Universe of Discourse.

mod attribute;
mod kind;

pub use attribute::*;
pub use kind::*;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};

/// Unique identifier for every concept in a Universe of Discourse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConceptId(pub Uuid);

impl ConceptId {
    /// Create a new random concept ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derive the concept ID for a URI.
    ///
    /// The same URI always yields the same ID, so prototypes built in two
    /// stores line up.
    pub fn from_uri(uri: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_URL, uri.as_bytes()))
    }
}

impl Default for ConceptId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConceptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A node in the concept graph.
///
/// Relations to other concepts are held as IDs only; the
/// `UniverseOfDiscourse` owns every concept and the indexes over them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concept {
    pub id: ConceptId,

    /// Designer-assigned stable identifier, if any.
    pub uri: Option<String>,

    pub label: String,
    pub definition: String,

    /// Parent in the ownership tree.
    pub owning_concept_id: Option<ConceptId>,

    /// Incremented on every effective change.
    pub version: u64,

    pub read_only: bool,
    pub is_core: bool,

    pub kind: ConceptKind,
}

impl Concept {
    /// Create a new concept of the given kind.
    pub fn new(id: ConceptId, kind: ConceptKind) -> Self {
        Self {
            id,
            uri: None,
            label: String::new(),
            definition: String::new(),
            owning_concept_id: None,
            version: 0,
            read_only: false,
            is_core: false,
            kind,
        }
    }

    /// Set the URI.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Set the label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn kind_tag(&self) -> ConceptKindTag {
        self.kind.tag()
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, ConceptKind::Reference { .. })
    }

    pub fn is_refinement(&self) -> bool {
        matches!(self.kind, ConceptKind::Refinement { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self.kind, ConceptKind::Literal { .. })
    }

    fn wrong_kind(&self, expected: ConceptKindTag) -> CoreError {
        CoreError::WrongKind {
            concept: self.id,
            expected,
            found: self.kind_tag(),
        }
    }

    /// The concept a Reference points at.
    pub fn referenced_concept_id(&self) -> CoreResult<Option<ConceptId>> {
        match &self.kind {
            ConceptKind::Reference {
                referenced_concept_id,
                ..
            } => Ok(*referenced_concept_id),
            _ => Err(self.wrong_kind(ConceptKindTag::Reference)),
        }
    }

    /// The attribute slot of the referenced concept a Reference points at.
    pub fn referenced_attribute_name(&self) -> CoreResult<AttributeName> {
        match &self.kind {
            ConceptKind::Reference {
                referenced_attribute_name,
                ..
            } => Ok(*referenced_attribute_name),
            _ => Err(self.wrong_kind(ConceptKindTag::Reference)),
        }
    }

    pub fn abstract_concept_id(&self) -> CoreResult<Option<ConceptId>> {
        match &self.kind {
            ConceptKind::Refinement {
                abstract_concept_id,
                ..
            } => Ok(*abstract_concept_id),
            _ => Err(self.wrong_kind(ConceptKindTag::Refinement)),
        }
    }

    pub fn refined_concept_id(&self) -> CoreResult<Option<ConceptId>> {
        match &self.kind {
            ConceptKind::Refinement {
                refined_concept_id, ..
            } => Ok(*refined_concept_id),
            _ => Err(self.wrong_kind(ConceptKindTag::Refinement)),
        }
    }

    pub fn literal_value(&self) -> CoreResult<&str> {
        match &self.kind {
            ConceptKind::Literal { literal_value } => Ok(literal_value),
            _ => Err(self.wrong_kind(ConceptKindTag::Literal)),
        }
    }

    /// Read a pointer-valued attribute.
    ///
    /// Fails when the attribute is scalar or the concept's kind lacks it.
    pub fn pointer_attribute(&self, attribute: AttributeName) -> CoreResult<Option<ConceptId>> {
        match attribute {
            AttributeName::OwningConceptID => Ok(self.owning_concept_id),
            AttributeName::ReferencedConceptID => self.referenced_concept_id(),
            AttributeName::AbstractConceptID => self.abstract_concept_id(),
            AttributeName::RefinedConceptID => self.refined_concept_id(),
            other => Err(CoreError::NotAPointer(other)),
        }
    }

    /// Read a scalar attribute as a string.
    pub fn scalar_attribute(&self, attribute: AttributeName) -> CoreResult<String> {
        match attribute {
            AttributeName::Label => Ok(self.label.clone()),
            AttributeName::Definition => Ok(self.definition.clone()),
            AttributeName::LiteralValue => self.literal_value().map(str::to_string),
            other => Err(CoreError::NotAScalar(other)),
        }
    }

    /// IDs of every concept this concept points at through its kind fields.
    pub fn pointees(&self) -> Vec<ConceptId> {
        match &self.kind {
            ConceptKind::Reference {
                referenced_concept_id,
                ..
            } => referenced_concept_id.iter().copied().collect(),
            ConceptKind::Refinement {
                abstract_concept_id,
                refined_concept_id,
            } => abstract_concept_id
                .iter()
                .chain(refined_concept_id.iter())
                .copied()
                .collect(),
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_ids_are_stable() {
        let a = ConceptId::from_uri("http://activeCRL.com/test");
        let b = ConceptId::from_uri("http://activeCRL.com/test");
        let c = ConceptId::from_uri("http://activeCRL.com/other");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(ConceptId::new(), ConceptId::new());
    }

    #[test]
    fn test_kind_accessors() {
        let reference = Concept::new(ConceptId::new(), ConceptKind::reference());
        assert_eq!(reference.referenced_concept_id().unwrap(), None);
        assert_eq!(
            reference.referenced_attribute_name().unwrap(),
            AttributeName::NoAttribute
        );
        assert!(reference.literal_value().is_err());

        let refinement = Concept::new(ConceptId::new(), ConceptKind::refinement());
        assert_eq!(refinement.kind_tag(), ConceptKindTag::Refinement);
        assert_eq!(refinement.abstract_concept_id().unwrap(), None);
        assert_eq!(refinement.refined_concept_id().unwrap(), None);
        assert!(refinement.pointees().is_empty());
        assert!(refinement.referenced_concept_id().is_err());
    }

    #[test]
    fn test_wrong_kind_error() {
        let element = Concept::new(ConceptId::new(), ConceptKind::Element);

        match element.abstract_concept_id() {
            Err(CoreError::WrongKind {
                expected, found, ..
            }) => {
                assert_eq!(expected, ConceptKindTag::Refinement);
                assert_eq!(found, ConceptKindTag::Element);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_attribute_reads() {
        let owner = ConceptId::new();
        let mut literal = Concept::new(ConceptId::new(), ConceptKind::literal("42"))
            .with_label("Answer");
        literal.owning_concept_id = Some(owner);

        assert_eq!(
            literal.pointer_attribute(AttributeName::OwningConceptID).unwrap(),
            Some(owner)
        );
        assert_eq!(literal.scalar_attribute(AttributeName::Label).unwrap(), "Answer");
        assert_eq!(
            literal.scalar_attribute(AttributeName::LiteralValue).unwrap(),
            "42"
        );
        assert!(literal.pointer_attribute(AttributeName::Label).is_err());
        assert!(literal
            .pointer_attribute(AttributeName::ReferencedConceptID)
            .is_err());
    }

    #[test]
    fn test_pointees() {
        let a = ConceptId::new();
        let b = ConceptId::new();
        let refinement = Concept::new(
            ConceptId::new(),
            ConceptKind::Refinement {
                abstract_concept_id: Some(a),
                refined_concept_id: Some(b),
            },
        );
        assert_eq!(refinement.pointees(), vec![a, b]);

        let element = Concept::new(ConceptId::new(), ConceptKind::Element);
        assert!(element.pointees().is_empty());
    }
}
