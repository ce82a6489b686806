//! # CRL Maps
//!
//! Declarative one-to-one mapping between concept graphs. A designer
//! describes, once, how an abstract source domain corresponds to an
//! abstract target domain; every instance of that description then keeps a
//! concrete target graph in step with a concrete source graph as the source
//! changes.
//!
//! ## Core Components
//!
//! - **schema**: The map prototypes (CrlMap, CrlOneToOneMap, ...) and the
//!   lifecycle object that installs them into a store
//! - **engine**: The reactive handler, child instantiation, convergence and
//!   the derived map state
//! - **resolution**: Source/target accessors and lookup of the map
//!   responsible for a source
//! - **config**: Convergence mode and target naming
//!
//! ## Usage
//!
//! ```ignore
//! let mut uofd = UniverseOfDiscourse::new();
//! let maps = CrlMapsDomain::install(&mut uofd, MapEngineConfig::default())?;
//!
//! let mut trans = uofd.new_transaction();
//! let defining = new_one_to_one_map(&mut trans, "PersonToEmployee", Some(folder))?;
//! set_source(&mut trans, defining, Some(person), AttributeName::NoAttribute)?;
//! set_target(&mut trans, defining, Some(employee), AttributeName::NoAttribute)?;
//! trans.release_locks_and_wait()?;
//! ```

pub mod config;
pub mod engine;
pub mod errors;
pub mod resolution;
pub mod schema;

pub use config::*;
pub use engine::*;
pub use errors::*;
pub use resolution::*;
pub use schema::*;
