//! Notification delivery.
//!
//! Delivering a notification to a concept first runs the functions
//! registered for the concept's abstractions, then passes the change on to
//! whoever depends on the concept:
//! - References pointing at it get `IndicatedConceptChanged`
//! - Concepts refined from it get `AbstractionChanged`
//! - Its owner gets `ForwardedChange` if it is a Reference, otherwise
//!   `ChildChanged` for concept and child changes
//!
//! A concept that already reported beneath a notification does not pass it
//! on again.

use tracing::{debug, error, trace};

use super::{ChangeNotification, NatureOfChange, Transaction};
use crate::concept::{ConceptId, ConceptKind};
use crate::errors::{CoreError, CoreResult};

impl Transaction<'_> {
    /// Deliver every queued notification, including the ones raised while
    /// delivering, then release all write locks.
    ///
    /// Calls made from inside a function during delivery return immediately.
    /// A failing function does not stop delivery; the first failure is
    /// returned once the queue is empty.
    pub fn release_locks_and_wait(&mut self) -> CoreResult<()> {
        if self.draining {
            return Ok(());
        }

        self.draining = true;
        let result = self.drain();
        self.draining = false;

        self.held_write_locks.clear();
        self.function_calls = 0;
        result
    }

    fn drain(&mut self) -> CoreResult<()> {
        let mut first_failure = None;
        let mut delivered = 0usize;

        while let Some((target, notification)) = self.pending.pop_front() {
            if self.uofd.get_concept(target).is_none() {
                continue;
            }
            delivered += 1;

            for (uri, function) in self.uofd.functions_for(target) {
                self.count_function_call()?;
                if let Err(err) = function(target, &notification, self) {
                    error!(
                        uri = %uri,
                        concept = %target,
                        nature = ?notification.nature,
                        error = %err,
                        "Function failed during dispatch"
                    );
                    if first_failure.is_none() {
                        first_failure = Some(as_function_failure(&uri, target, err));
                    }
                }
            }

            self.forward(target, &notification);
        }

        debug!(delivered, function_calls = self.function_calls, "Dispatch complete");
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn count_function_call(&mut self) -> CoreResult<()> {
        self.function_calls += 1;
        let limit = self.uofd.config().max_function_calls;
        if self.function_calls > limit {
            error!(limit, pending = self.pending.len(), "Function call limit exceeded");
            self.pending.clear();
            return Err(CoreError::FunctionCallLimit(limit));
        }
        Ok(())
    }

    /// Queue the follow-up notifications caused by delivering `notification` to `target`.
    fn forward(&mut self, target: ConceptId, notification: &ChangeNotification) {
        if notification.has_reported_previously(target) {
            return;
        }
        if notification.depth() > self.uofd.config().max_notification_depth {
            trace!(concept = %target, depth = notification.depth(), "Notification chain too deep");
            return;
        }

        let mut follow_ups = Vec::new();
        for listener in self.uofd.listeners(target) {
            let Some(concept) = self.uofd.get_concept(*listener) else {
                continue;
            };
            match &concept.kind {
                ConceptKind::Reference {
                    referenced_concept_id: Some(referenced),
                    ..
                } if *referenced == target => {
                    follow_ups.push((
                        *listener,
                        notification.forward(NatureOfChange::IndicatedConceptChanged, target),
                    ));
                }
                ConceptKind::Refinement {
                    abstract_concept_id: Some(abstraction),
                    refined_concept_id: Some(refined),
                } if *abstraction == target && *refined != target => {
                    follow_ups.push((
                        *refined,
                        notification.forward(NatureOfChange::AbstractionChanged, target),
                    ));
                }
                _ => {}
            }
        }

        if let Some(concept) = self.uofd.get_concept(target) {
            if let Some(owner) = concept.owning_concept_id {
                if concept.is_reference() {
                    follow_ups.push((
                        owner,
                        notification.forward(NatureOfChange::ForwardedChange, target),
                    ));
                } else if matches!(
                    notification.nature,
                    NatureOfChange::ConceptChanged | NatureOfChange::ChildChanged
                ) {
                    follow_ups.push((
                        owner,
                        notification.forward(NatureOfChange::ChildChanged, target),
                    ));
                }
            }
        }

        for (receiver, follow_up) in follow_ups {
            self.queue(receiver, follow_up);
        }
    }

    /// Run the functions of `target` right away with a `Tickle` from `origin`.
    ///
    /// Nothing is forwarded, and a failing function's error is returned as is.
    pub fn send_tickle_notification(&mut self, origin: ConceptId, target: ConceptId) -> CoreResult<()> {
        self.uofd.concept(target)?;
        let notification = ChangeNotification::tickle(origin);

        for (uri, function) in self.uofd.functions_for(target) {
            self.count_function_call()?;
            trace!(uri = %uri, origin = %origin, concept = %target, "Tickle");
            function(target, &notification, self)?;
        }
        Ok(())
    }
}

fn as_function_failure(uri: &str, concept: ConceptId, err: CoreError) -> CoreError {
    match err {
        CoreError::FunctionFailed { .. } | CoreError::FunctionCallLimit(_) => err,
        other => CoreError::FunctionFailed {
            uri: uri.to_string(),
            concept,
            message: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use crate::concept::{AttributeName, ConceptId};
    use crate::config::UniverseConfig;
    use crate::errors::CoreError;
    use crate::transaction::NatureOfChange;
    use crate::uofd::{concept_function, ConceptFunction, UniverseOfDiscourse};

    const WATCHED_URI: &str = "http://test/Watched";

    type Log = Arc<Mutex<Vec<(ConceptId, NatureOfChange)>>>;

    fn recorder(log: &Log) -> ConceptFunction {
        let log = Arc::clone(log);
        concept_function(move |concept, notification, _| {
            log.lock().unwrap().push((concept, notification.nature));
            Ok(())
        })
    }

    /// A watched concept owning a Reference that points at `target`.
    fn watch(uofd: &mut UniverseOfDiscourse) -> (ConceptId, ConceptId, ConceptId) {
        let mut trans = uofd.new_transaction();
        let prototype = trans.new_element(Some(WATCHED_URI)).unwrap();
        let owner = trans.new_element(None).unwrap();
        let watcher = trans.new_refinement_of(prototype, owner).unwrap();
        let target = trans.new_element(None).unwrap();
        let reference = trans.new_owned_reference(watcher, "ref", None).unwrap();
        trans
            .set_referenced_concept(reference, Some(target), AttributeName::NoAttribute)
            .unwrap();
        trans.release_locks_and_wait().unwrap();
        (watcher, reference, target)
    }

    #[test]
    fn test_change_reaches_reference_owner() {
        let mut uofd = UniverseOfDiscourse::new();
        let (watcher, _, target) = watch(&mut uofd);
        let log: Log = Arc::default();
        uofd.add_function(WATCHED_URI, recorder(&log));

        let mut trans = uofd.new_transaction();
        trans.set_label(target, "changed").unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let entries = log.lock().unwrap().clone();
        assert_eq!(entries, vec![(watcher, NatureOfChange::ForwardedChange)]);
    }

    #[test]
    fn test_child_change_reaches_owner() {
        let mut uofd = UniverseOfDiscourse::new();
        let (watcher, _, _) = watch(&mut uofd);
        let log: Log = Arc::default();
        uofd.add_function(WATCHED_URI, recorder(&log));

        let mut trans = uofd.new_transaction();
        trans.new_owned_literal(watcher, "value", None).unwrap();
        trans.release_locks_and_wait().unwrap();
        drop(trans);

        let entries = log.lock().unwrap().clone();
        assert!(entries.contains(&(watcher, NatureOfChange::ChildChanged)));
        assert!(entries.iter().all(|(concept, _)| *concept == watcher));
    }

    #[test]
    fn test_failures_are_collected() {
        let mut uofd = UniverseOfDiscourse::new();
        let (_, _, target) = watch(&mut uofd);
        uofd.add_function(
            WATCHED_URI,
            concept_function(|_, _, _| Err(CoreError::UriNotFound("boom".to_string()))),
        );

        let mut trans = uofd.new_transaction();
        trans.set_label(target, "changed").unwrap();
        let result = trans.release_locks_and_wait();

        assert!(matches!(result, Err(CoreError::FunctionFailed { .. })));
        assert_eq!(trans.pending_notification_count(), 0);
    }

    #[test]
    fn test_function_call_limit() {
        let mut uofd = UniverseOfDiscourse::with_config(UniverseConfig {
            max_function_calls: 3,
            ..UniverseConfig::default()
        });
        let (watcher, _, _) = watch(&mut uofd);
        let counter = Arc::new(Mutex::new(0u32));
        let seen = Arc::clone(&counter);
        // Every call changes the watcher again.
        uofd.add_function(
            WATCHED_URI,
            concept_function(move |concept, _, trans| {
                let mut count = seen.lock().unwrap();
                *count += 1;
                trans.set_definition(concept, &count.to_string())
            }),
        );

        let mut trans = uofd.new_transaction();
        trans.set_label(watcher, "start").unwrap();
        assert!(matches!(
            trans.release_locks_and_wait(),
            Err(CoreError::FunctionCallLimit(3))
        ));
        drop(trans);
        assert_eq!(*counter.lock().unwrap(), 3);
    }

    #[test]
    fn test_tickle_runs_functions_synchronously() {
        let mut uofd = UniverseOfDiscourse::new();
        let (watcher, reference, _) = watch(&mut uofd);
        let log: Log = Arc::default();
        uofd.add_function(WATCHED_URI, recorder(&log));

        let mut trans = uofd.new_transaction();
        trans.send_tickle_notification(reference, watcher).unwrap();
        assert_eq!(
            log.lock().unwrap().clone(),
            vec![(watcher, NatureOfChange::Tickle)]
        );
        assert_eq!(trans.pending_notification_count(), 0);
    }

    #[test]
    fn test_tickle_propagates_errors() {
        let mut uofd = UniverseOfDiscourse::new();
        let (watcher, reference, _) = watch(&mut uofd);
        uofd.add_function(
            WATCHED_URI,
            concept_function(|concept, _, _| Err(CoreError::ReadOnly(concept))),
        );

        let mut trans = uofd.new_transaction();
        assert!(matches!(
            trans.send_tickle_notification(reference, watcher),
            Err(CoreError::ReadOnly(_))
        ));
    }
}
