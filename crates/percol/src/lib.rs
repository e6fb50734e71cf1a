//! Percol: site percolation analysis on periodic crystal lattices.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Percol sub-crates. For most users, adding `percol` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use indexmap::indexmap;
//! use percol::prelude::*;
//! use std::sync::Arc;
//!
//! // A simple cubic structure: one lithium site per 3 Å cell.
//! let structure = StructureData::new(
//!     Cell::cubic(3.0).unwrap(),
//!     vec![[0.0, 0.0, 0.0]],
//!     vec!["Li".into()],
//! )
//! .unwrap();
//!
//! // 4x4x4 supercell, 30% Li / 70% TM, one flip step to full lithium.
//! let config = SimulationConfig {
//!     formula_units: 4,
//!     cutoff: 3.1,
//!     sublattices: vec![SublatticeSpec::new(
//!         "octahedral",
//!         SiteSelector::Species(vec!["Li".into()]),
//!         indexmap! { "Li".into() => 0.3, "TM".into() => 0.7 },
//!     )],
//!     bonds: vec![BondSpec {
//!         sublattices: ("octahedral".into(), "octahedral".into()),
//!     }],
//!     percolating_species: vec!["Li".into()],
//!     static_species: vec![],
//!     flip_sequence: vec![FlipStep::all("TM", "Li")],
//!     seed: 42,
//! };
//!
//! let mut species = SpeciesTable::new();
//! let lattice = Arc::new(Lattice::build(&structure, &config, &mut species).unwrap());
//!
//! let mut trajectory =
//!     Trajectory::new(Arc::clone(&lattice), &config, &species, config.seed).unwrap();
//! trajectory.run();
//!
//! // After the flip everything is lithium: one wrapping cluster.
//! let last = &trajectory.records().last().unwrap().summary;
//! assert!(last.percolates);
//! assert_eq!(last.wrapping, [true, true, true]);
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the
//! prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `percol-core` | IDs, species interning, configuration model, errors |
//! | [`lattice`] | `percol-lattice` | Cells, structures, neighbour search, lattice building |
//! | [`sim`] | `percol-sim` | Occupancy, rules, flips, connectivity, analyses, drivers |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and the configuration model (`percol-core`).
///
/// Contains the id newtypes, [`types::SpeciesTable`], the whole
/// [`types::SimulationConfig`] tree, and [`types::ConfigError`].
pub use percol_core as types;

/// Periodic lattice construction (`percol-lattice`).
///
/// Provides [`lattice::Cell`], [`lattice::StructureData`], the
/// cutoff-distance [`lattice::NeighbourSearch`], and the immutable
/// [`lattice::Lattice`] that every simulation shares.
pub use percol_lattice as lattice;

/// Simulation engine (`percol-sim`).
///
/// [`sim::Occupancy`] sampling, the [`sim::SiteRule`] registry,
/// [`sim::FlipSequencer`], the union-find [`sim::Percolator`],
/// accessibility/tortuosity analyses, and the [`sim::Trajectory`] and
/// [`sim::Ensemble`] drivers.
pub use percol_sim as sim;

/// Common imports for typical Percol usage.
///
/// ```rust
/// use percol::prelude::*;
/// ```
pub mod prelude {
    // Ids and species
    pub use percol_core::{SiteId, Species, SpeciesTable, SublatticeId};

    // Configuration model
    pub use percol_core::{
        BondSpec, ConfigError, FlipLimit, FlipStep, RuleSpec, ShellCondition, SimulationConfig,
        SiteSelector, SublatticeSpec,
    };

    // Geometry
    pub use percol_lattice::{Cell, GeometryError, Lattice, StructureData};

    // Simulation
    pub use percol_sim::{
        BuildError, Ensemble, Occupancy, PercolationCurve, Percolator, SiteRule, SnapshotSummary,
        SpeciesClasses, Trajectory,
    };
}
