//! Attribute names - the slots a Reference can point at.

use serde::{Deserialize, Serialize};

/// Names of the attribute slots of a concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttributeName {
    /// The reference indicates the whole concept.
    #[default]
    NoAttribute,
    OwningConceptID,
    ReferencedConceptID,
    AbstractConceptID,
    RefinedConceptID,
    Label,
    Definition,
    LiteralValue,
}

impl AttributeName {
    /// Attributes whose value is the ID of another concept.
    pub fn is_pointer(&self) -> bool {
        matches!(
            self,
            AttributeName::OwningConceptID
                | AttributeName::ReferencedConceptID
                | AttributeName::AbstractConceptID
                | AttributeName::RefinedConceptID
        )
    }

    /// Attributes whose value is a plain string.
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            AttributeName::Label | AttributeName::Definition | AttributeName::LiteralValue
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AttributeName::NoAttribute => "NoAttribute",
            AttributeName::OwningConceptID => "OwningConceptID",
            AttributeName::ReferencedConceptID => "ReferencedConceptID",
            AttributeName::AbstractConceptID => "AbstractConceptID",
            AttributeName::RefinedConceptID => "RefinedConceptID",
            AttributeName::Label => "Label",
            AttributeName::Definition => "Definition",
            AttributeName::LiteralValue => "LiteralValue",
        }
    }
}

impl std::fmt::Display for AttributeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pointer_and_scalar_are_disjoint() {
        let all = [
            AttributeName::NoAttribute,
            AttributeName::OwningConceptID,
            AttributeName::ReferencedConceptID,
            AttributeName::AbstractConceptID,
            AttributeName::RefinedConceptID,
            AttributeName::Label,
            AttributeName::Definition,
            AttributeName::LiteralValue,
        ];

        for attribute in all {
            assert!(!(attribute.is_pointer() && attribute.is_scalar()));
        }
        assert!(!AttributeName::NoAttribute.is_pointer());
        assert!(!AttributeName::NoAttribute.is_scalar());
    }

    #[test]
    fn test_default_is_no_attribute() {
        assert_eq!(AttributeName::default(), AttributeName::NoAttribute);
    }
}
