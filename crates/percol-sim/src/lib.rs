//! Percolation simulation over a prebuilt [`Lattice`](percol_lattice::Lattice):
//! occupancy sampling, site rules, flip sequencing, union-find
//! connectivity with periodic wrapping detection, derived analyses, and
//! trajectory/ensemble drivers.
//!
//! The layering is strict: the lattice is immutable and shared, every
//! mutable quantity (occupancy, union-find state, RNG) lives in
//! per-trajectory values, and parallelism exists only across
//! trajectories, never inside one.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod analysis;
pub mod ensemble;
pub mod error;
pub mod flip;
pub mod occupancy;
pub mod percolator;
pub mod rule;
pub mod trajectory;

pub use analysis::{accessible_sites, boundary_seeds, tortuosity, TortuosityStats};
pub use ensemble::{Ensemble, PercolationCurve};
pub use error::BuildError;
pub use flip::{AppliedChanges, FlipSequencer};
pub use occupancy::Occupancy;
pub use percolator::{Cluster, Percolator, SpeciesClasses, UpdateOutcome};
pub use rule::{build_rules, NeighbourShellRule, SiteRule, STABLE_NEIGHBOUR_SHELL};
pub use trajectory::{SnapshotSummary, StepRecord, Trajectory};
