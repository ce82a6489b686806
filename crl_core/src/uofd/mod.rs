//! Universe of Discourse - the arena that owns every concept.
//!
//! The store keeps:
//! - **Concepts**: every node, keyed by `ConceptId`
//! - **URI index**: designer-assigned URIs to IDs
//! - **Ownership index**: owner to ordered owned IDs
//! - **Listener index**: concept to the References and Refinements pointing at it
//! - **Functions**: reactive handlers keyed by the URI of the abstraction they serve
//!
//! Reads go straight through `&self`; every mutation goes through a
//! [`Transaction`].

mod export;
mod queries;

pub use export::*;

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::concept::{Concept, ConceptId};
use crate::config::UniverseConfig;
use crate::errors::CoreResult;
use crate::transaction::{ChangeNotification, Transaction};

/// A reactive handler attached to every concept refining the URI it is
/// registered under.
pub type ConceptFunction = Arc<
    dyn Fn(ConceptId, &ChangeNotification, &mut Transaction<'_>) -> CoreResult<()> + Send + Sync,
>;

/// Wrap a closure as a [`ConceptFunction`].
pub fn concept_function<F>(function: F) -> ConceptFunction
where
    F: Fn(ConceptId, &ChangeNotification, &mut Transaction<'_>) -> CoreResult<()>
        + Send
        + Sync
        + 'static,
{
    Arc::new(function)
}

/// The concept graph store.
#[derive(Default)]
pub struct UniverseOfDiscourse {
    concepts: HashMap<ConceptId, Concept>,

    /// Index: URI -> concept.
    uri_index: HashMap<String, ConceptId>,

    /// Index: owner -> owned concepts, in insertion order.
    owned: HashMap<ConceptId, Vec<ConceptId>>,

    /// Index: concept -> References and Refinements pointing at it.
    listeners: HashMap<ConceptId, Vec<ConceptId>>,

    /// Index: refined concept -> Refinements whose refined end it is.
    refinements: HashMap<ConceptId, Vec<ConceptId>>,

    functions: HashMap<String, ConceptFunction>,

    config: UniverseConfig,
}

impl std::fmt::Debug for UniverseOfDiscourse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut function_uris: Vec<&String> = self.functions.keys().collect();
        function_uris.sort();
        f.debug_struct("UniverseOfDiscourse")
            .field("concepts", &self.concepts.len())
            .field("functions", &function_uris)
            .field("config", &self.config)
            .finish()
    }
}

impl UniverseOfDiscourse {
    /// Create an empty store with default limits.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given limits.
    pub fn with_config(config: UniverseConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &UniverseConfig {
        &self.config
    }

    /// Open a transaction for mutating the store.
    pub fn new_transaction(&mut self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Number of concepts in the store.
    pub fn len(&self) -> usize {
        self.concepts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.concepts.is_empty()
    }

    /// Register a function for concepts refining `uri`.
    ///
    /// Returns false, leaving the existing registration in place, when the
    /// URI already has a function.
    pub fn add_function(&mut self, uri: impl Into<String>, function: ConceptFunction) -> bool {
        let uri = uri.into();
        if self.functions.contains_key(&uri) {
            debug!(uri = %uri, "Function already registered");
            return false;
        }
        debug!(uri = %uri, "Registering function");
        self.functions.insert(uri, function);
        true
    }

    /// Remove the function registered for `uri`.
    pub fn remove_function(&mut self, uri: &str) -> bool {
        self.functions.remove(uri).is_some()
    }

    pub fn has_function(&self, uri: &str) -> bool {
        self.functions.contains_key(uri)
    }

    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    /// Functions that apply to a concept: one per transitive abstraction
    /// whose URI has a registration, in abstraction order.
    pub(crate) fn functions_for(&self, id: ConceptId) -> Vec<(String, ConceptFunction)> {
        if self.functions.is_empty() {
            return Vec::new();
        }
        self.find_abstractions(id)
            .into_iter()
            .filter_map(|abstraction| self.concepts.get(&abstraction)?.uri.clone())
            .filter_map(|uri| {
                let function = self.functions.get(&uri)?.clone();
                Some((uri, function))
            })
            .collect()
    }

    // Low-level index maintenance, used by `Transaction` only.

    pub(crate) fn insert_concept(&mut self, concept: Concept) {
        if let Some(uri) = &concept.uri {
            self.uri_index.insert(uri.clone(), concept.id);
        }
        self.concepts.insert(concept.id, concept);
    }

    pub(crate) fn concept_mut(&mut self, id: ConceptId) -> Option<&mut Concept> {
        self.concepts.get_mut(&id)
    }

    pub(crate) fn attach_owned(&mut self, owner: ConceptId, child: ConceptId) {
        let owned = self.owned.entry(owner).or_default();
        if !owned.contains(&child) {
            owned.push(child);
        }
    }

    pub(crate) fn detach_owned(&mut self, owner: ConceptId, child: ConceptId) {
        if let Some(owned) = self.owned.get_mut(&owner) {
            owned.retain(|id| *id != child);
        }
    }

    pub(crate) fn add_listener(&mut self, pointee: ConceptId, listener: ConceptId) {
        let listeners = self.listeners.entry(pointee).or_default();
        if !listeners.contains(&listener) {
            listeners.push(listener);
        }
    }

    /// Move `refinement` from the refinement list of `previous` to that of `next`.
    pub(crate) fn move_refined_end(
        &mut self,
        refinement: ConceptId,
        previous: Option<ConceptId>,
        next: Option<ConceptId>,
    ) {
        if let Some(edges) = previous.and_then(|previous| self.refinements.get_mut(&previous)) {
            edges.retain(|id| *id != refinement);
        }
        if let Some(next) = next {
            let edges = self.refinements.entry(next).or_default();
            if !edges.contains(&refinement) {
                edges.push(refinement);
            }
        }
    }

    /// Drop `listener` from `pointee` unless it still points there through another field.
    pub(crate) fn remove_listener(&mut self, pointee: ConceptId, listener: ConceptId) {
        let still_points = self
            .concepts
            .get(&listener)
            .map(|concept| concept.pointees().contains(&pointee))
            .unwrap_or(false);
        if still_points {
            return;
        }
        if let Some(listeners) = self.listeners.get_mut(&pointee) {
            listeners.retain(|id| *id != listener);
        }
    }
}
