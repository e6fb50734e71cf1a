//! Periodic lattice construction for Percol percolation analysis.
//!
//! This crate turns an already-parsed crystal structure plus a
//! [`SimulationConfig`](percol_core::SimulationConfig) into an immutable
//! [`Lattice`]: a supercell of sites partitioned into sublattices, with
//! every bond between bond-eligible sublattice pairs within the cutoff
//! distance enumerated along with its periodic-image offset, and bonded
//! neighbours grouped into distance shells for rule evaluation.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod error;
pub mod lattice;
pub mod nblist;
pub mod site;
pub mod structure;

pub use cell::Cell;
pub use error::{GeometryError, LatticeError};
pub use lattice::{Face, Lattice, SublatticeInfo, SHELL_TOL};
pub use nblist::{NeighbourHit, NeighbourSearch};
pub use site::{Bond, Neighbour, Site};
pub use structure::StructureData;
