//! Re-running child maps until their results settle.
//!
//! A child map can depend on the target of a sibling that has not run yet.
//! Each pass tickles every directly owned child map; in fixed-point mode the
//! passes stop as soon as one leaves the store untouched.

use serde::Serialize;

use crl_core::{ConceptId, Transaction, UniverseOfDiscourse};
use tracing::{trace, warn};

use crate::config::{ConvergenceMode, MapEngineConfig};
use crate::errors::MapResult;
use crate::schema::CRL_MAP_URI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ConvergenceReport {
    pub passes: u32,
    /// Whether the last pass changed nothing.
    pub converged: bool,
}

/// Height of the tree of maps owned below `map` (0 when it owns none).
pub fn map_tree_height(uofd: &UniverseOfDiscourse, map: ConceptId) -> u32 {
    uofd.get_owned_concepts_refined_from_uri(map, CRL_MAP_URI)
        .into_iter()
        .map(|child| map_tree_height(uofd, child) + 1)
        .max()
        .unwrap_or(0)
}

/// Number of passes allowed in fixed-point mode for a tree of the given height.
pub fn fixed_point_bound(height: u32, config: &MapEngineConfig) -> u32 {
    (height + 1).max(2).min(config.max_convergence_passes)
}

pub fn converge_map_children(
    trans: &mut Transaction<'_>,
    map_instance: ConceptId,
    config: &MapEngineConfig,
) -> MapResult<ConvergenceReport> {
    let children = trans
        .uofd()
        .get_owned_concepts_refined_from_uri(map_instance, CRL_MAP_URI);
    if children.is_empty() {
        return Ok(ConvergenceReport {
            passes: 0,
            converged: true,
        });
    }

    let (limit, stop_when_quiet) = match config.convergence {
        ConvergenceMode::FixedPoint => {
            let height = map_tree_height(trans.uofd(), map_instance);
            (fixed_point_bound(height, config), true)
        }
        ConvergenceMode::FixedPasses(passes) => (passes, false),
    };

    let mut report = ConvergenceReport {
        passes: 0,
        converged: false,
    };
    while report.passes < limit {
        let before = trans.change_count();
        for child in &children {
            trans.send_tickle_notification(map_instance, *child)?;
        }
        report.passes += 1;
        report.converged = trans.change_count() == before;
        trace!(map = %map_instance, pass = report.passes, quiet = report.converged, "Convergence pass");
        if stop_when_quiet && report.converged {
            break;
        }
    }

    if !report.converged {
        warn!(
            map = %map_instance,
            passes = report.passes,
            children = children.len(),
            "Child maps did not converge"
        );
    }
    Ok(report)
}
