//! Change notifications passed between concepts during dispatch.

use serde::{Deserialize, Serialize};

use crate::concept::{AttributeName, ConceptId};

/// What happened to the reporting concept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NatureOfChange {
    /// An attribute of the reporting concept changed.
    ConceptChanged,
    /// Something owned by the reporting concept changed.
    ChildChanged,
    /// The concept a Reference points at changed.
    IndicatedConceptChanged,
    /// An abstraction of the receiving concept changed.
    AbstractionChanged,
    /// A Reference passed a change on to its owner.
    ForwardedChange,
    /// Re-evaluation request with no underlying data change.
    Tickle,
}

/// A change report, optionally caused by an underlying report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotification {
    pub nature: NatureOfChange,
    pub reporting_concept_id: ConceptId,
    /// The attribute that changed, for `ConceptChanged`.
    pub attribute: AttributeName,
    pub underlying: Option<Box<ChangeNotification>>,
}

impl ChangeNotification {
    pub fn new(nature: NatureOfChange, reporting_concept_id: ConceptId) -> Self {
        Self {
            nature,
            reporting_concept_id,
            attribute: AttributeName::NoAttribute,
            underlying: None,
        }
    }

    /// A `ConceptChanged` report for one attribute.
    pub fn concept_changed(reporting_concept_id: ConceptId, attribute: AttributeName) -> Self {
        Self::new(NatureOfChange::ConceptChanged, reporting_concept_id).with_attribute(attribute)
    }

    pub fn tickle(origin: ConceptId) -> Self {
        Self::new(NatureOfChange::Tickle, origin)
    }

    pub fn with_attribute(mut self, attribute: AttributeName) -> Self {
        self.attribute = attribute;
        self
    }

    pub fn with_underlying(mut self, underlying: ChangeNotification) -> Self {
        self.underlying = Some(Box::new(underlying));
        self
    }

    /// A new report from `reporter` caused by this one.
    pub fn forward(&self, nature: NatureOfChange, reporter: ConceptId) -> Self {
        Self::new(nature, reporter).with_underlying(self.clone())
    }

    /// Number of notifications in the chain, this one included.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut current = self.underlying.as_deref();
        while let Some(notification) = current {
            depth += 1;
            current = notification.underlying.as_deref();
        }
        depth
    }

    /// Whether `concept` reported any notification beneath this one.
    pub fn has_reported_previously(&self, concept: ConceptId) -> bool {
        let mut current = self.underlying.as_deref();
        while let Some(notification) = current {
            if notification.reporting_concept_id == concept {
                return true;
            }
            current = notification.underlying.as_deref();
        }
        false
    }

    /// The notification at the bottom of the chain.
    pub fn root_cause(&self) -> &ChangeNotification {
        let mut current = self;
        while let Some(underlying) = current.underlying.as_deref() {
            current = underlying;
        }
        current
    }
}
