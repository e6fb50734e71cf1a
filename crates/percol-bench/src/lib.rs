//! Benchmark profiles for the Percol percolation toolkit.
//!
//! Provides a pre-built simple-cubic reference profile so benchmarks and
//! examples construct identical inputs:
//!
//! - [`reference_config`]: 8x8x8 supercell, 30% Li / 70% TM, one TM→Li flip
//! - [`reference_lattice`]: the lattice built from that configuration

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_docs)]

use indexmap::indexmap;
use percol_core::{
    BondSpec, FlipStep, SimulationConfig, SiteSelector, SpeciesTable, SublatticeSpec,
};
use percol_lattice::{Cell, Lattice, StructureData};
use std::sync::Arc;

/// Reference configuration: simple cubic, 512 sites, one flip step.
pub fn reference_config() -> SimulationConfig {
    SimulationConfig {
        formula_units: 8,
        cutoff: 3.1,
        sublattices: vec![SublatticeSpec::new(
            "octahedral",
            SiteSelector::Species(vec!["Li".into()]),
            indexmap! { "Li".into() => 0.3, "TM".into() => 0.7 },
        )],
        bonds: vec![BondSpec {
            sublattices: ("octahedral".into(), "octahedral".into()),
        }],
        percolating_species: vec!["Li".into()],
        static_species: vec![],
        flip_sequence: vec![FlipStep::all("TM", "Li")],
        seed: 42,
    }
}

/// Build the reference lattice and its species table.
pub fn reference_lattice() -> (Arc<Lattice>, SpeciesTable) {
    let structure = StructureData::new(
        Cell::cubic(3.0).expect("cubic cell is never degenerate"),
        vec![[0.0, 0.0, 0.0]],
        vec!["Li".into()],
    )
    .expect("reference structure is well-formed");
    let mut species = SpeciesTable::new();
    let lattice = Lattice::build(&structure, &reference_config(), &mut species)
        .expect("reference configuration is valid");
    (Arc::new(lattice), species)
}
