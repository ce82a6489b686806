//! # CRL Core
//!
//! The concept graph store - the "Universe of Discourse". Every modelled
//! thing is a concept: an Element, a Reference to another concept, a
//! Refinement ("is-a") between two concepts, or a Literal value.
//!
//! ## Core Components
//!
//! - **concept**: Concept identity, kinds and attribute names
//! - **uofd**: The arena owning all concepts, its indexes and refinement queries
//! - **transaction**: Write-locked mutation, change notifications and dispatch
//! - **config**: Dispatch limits and the TOML loader
//!
//! Concepts hold each other by ID only. Domain packages react to changes by
//! registering a function under the URI of a prototype concept; the function
//! then runs for every concept refining that prototype.

pub mod concept;
pub mod config;
pub mod errors;
pub mod transaction;
pub mod uofd;

pub use concept::*;
pub use config::*;
pub use errors::*;
pub use transaction::*;
pub use uofd::*;
