//! Concept kinds.

use serde::{Deserialize, Serialize};

use super::{AttributeName, ConceptId};

/// Kind-specific data carried by a concept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConceptKind {
    /// A plain node.
    Element,

    /// Points at another concept, optionally at one of its attribute slots.
    Reference {
        referenced_concept_id: Option<ConceptId>,
        referenced_attribute_name: AttributeName,
    },

    /// An "is-a" edge: the refined concept specializes the abstract one.
    Refinement {
        abstract_concept_id: Option<ConceptId>,
        refined_concept_id: Option<ConceptId>,
    },

    /// Carries a string value.
    Literal { literal_value: String },
}

impl ConceptKind {
    /// An empty Reference.
    pub fn reference() -> Self {
        ConceptKind::Reference {
            referenced_concept_id: None,
            referenced_attribute_name: AttributeName::NoAttribute,
        }
    }

    /// An empty Refinement.
    pub fn refinement() -> Self {
        ConceptKind::Refinement {
            abstract_concept_id: None,
            refined_concept_id: None,
        }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        ConceptKind::Literal {
            literal_value: value.into(),
        }
    }

    /// A fresh, empty kind of the given tag.
    pub fn empty(tag: ConceptKindTag) -> Self {
        match tag {
            ConceptKindTag::Element => ConceptKind::Element,
            ConceptKindTag::Reference => Self::reference(),
            ConceptKindTag::Refinement => Self::refinement(),
            ConceptKindTag::Literal => Self::literal(""),
        }
    }

    pub fn tag(&self) -> ConceptKindTag {
        match self {
            ConceptKind::Element => ConceptKindTag::Element,
            ConceptKind::Reference { .. } => ConceptKindTag::Reference,
            ConceptKind::Refinement { .. } => ConceptKindTag::Refinement,
            ConceptKind::Literal { .. } => ConceptKindTag::Literal,
        }
    }
}

/// Discriminant of `ConceptKind` without its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConceptKindTag {
    Element,
    Reference,
    Refinement,
    Literal,
}

impl std::fmt::Display for ConceptKindTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConceptKindTag::Element => "Element",
            ConceptKindTag::Reference => "Reference",
            ConceptKindTag::Refinement => "Refinement",
            ConceptKindTag::Literal => "Literal",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_kind_matches_tag() {
        for tag in [
            ConceptKindTag::Element,
            ConceptKindTag::Reference,
            ConceptKindTag::Refinement,
            ConceptKindTag::Literal,
        ] {
            assert_eq!(ConceptKind::empty(tag).tag(), tag);
        }
    }

    #[test]
    fn test_tag_display() {
        assert_eq!(ConceptKindTag::Refinement.to_string(), "Refinement");
    }
}
