//! Installing the map schema and handler into a store.

use crl_core::{concept_function, ChangeNotification, ConceptId, Transaction, UniverseOfDiscourse};
use tracing::info;

use super::{build_crl_maps_domain, CRL_ONE_TO_ONE_MAP_URI};
use crate::config::MapEngineConfig;
use crate::engine::execute_one_to_one_map;
use crate::errors::MapResult;

/// The map schema as installed in one store.
#[derive(Debug, Clone)]
pub struct CrlMapsDomain {
    domain: ConceptId,
    config: MapEngineConfig,
}

impl CrlMapsDomain {
    /// Build the schema if absent and register the one-to-one map handler.
    ///
    /// Installing again replaces the registered handler, so the returned
    /// config is always the one in effect.
    pub fn install(uofd: &mut UniverseOfDiscourse, config: MapEngineConfig) -> MapResult<Self> {
        let mut trans = uofd.new_transaction();
        let domain = build_crl_maps_domain(&mut trans)?;
        trans.release_locks_and_wait()?;
        drop(trans);

        let handler_config = config.clone();
        let handler = concept_function(
            move |map_instance: ConceptId,
                  notification: &ChangeNotification,
                  trans: &mut Transaction<'_>| {
                execute_one_to_one_map(map_instance, notification, trans, &handler_config)
                    .map_err(|err| err.into_core_error(CRL_ONE_TO_ONE_MAP_URI, map_instance))
            },
        );
        let replaced = uofd.remove_function(CRL_ONE_TO_ONE_MAP_URI);
        uofd.add_function(CRL_ONE_TO_ONE_MAP_URI, handler);
        if replaced {
            info!(domain = %domain, "Replaced one-to-one map handler");
        } else {
            info!(domain = %domain, "Installed one-to-one map handler");
        }

        Ok(Self { domain, config })
    }

    /// Remove the handler. The schema concepts stay in the store.
    pub fn uninstall(&self, uofd: &mut UniverseOfDiscourse) -> bool {
        let removed = uofd.remove_function(CRL_ONE_TO_ONE_MAP_URI);
        if removed {
            info!(domain = %self.domain, "Removed one-to-one map handler");
        }
        removed
    }

    /// Root concept of the schema.
    pub fn domain(&self) -> ConceptId {
        self.domain
    }

    pub fn config(&self) -> &MapEngineConfig {
        &self.config
    }
}
