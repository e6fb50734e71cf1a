//! Core types for the Percol percolation toolkit.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! fundamental abstractions used throughout the Percol workspace: typed
//! ids, species interning, the configuration model, and load-time errors.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod id;
pub mod species;

pub use config::{
    BondSpec, FlipLimit, FlipStep, RuleSpec, ShellCondition, SimulationConfig, SiteSelector,
    SublatticeSpec, OCCUPANCY_TOL,
};
pub use error::ConfigError;
pub use id::{ClusterId, Offset, SiteId, Species, SublatticeId};
pub use species::SpeciesTable;
