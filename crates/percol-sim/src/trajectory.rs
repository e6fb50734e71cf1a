//! Single-run driver: one occupancy, one connectivity engine, one flip
//! sequence, stepped to completion with a summary record per step.
//!
//! A trajectory is strictly single-threaded and deterministic given its
//! seed; parallelism lives one level up, across trajectories.

use crate::analysis::{accessible_sites, boundary_seeds, tortuosity, TortuosityStats};
use crate::error::BuildError;
use crate::flip::{AppliedChanges, FlipSequencer};
use crate::occupancy::Occupancy;
use crate::percolator::{Percolator, SpeciesClasses, UpdateOutcome};
use percol_core::{SimulationConfig, SpeciesTable};
use percol_lattice::Lattice;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

/// Connectivity summary of one occupancy snapshot.
///
/// Fractions are relative to the active-site (or active-bond) count and
/// report 0.0 when the denominator is empty.
#[derive(Clone, Debug, PartialEq)]
pub struct SnapshotSummary {
    /// Sites whose species currently percolates.
    pub active_sites: usize,
    /// Bonds with both endpoints active.
    pub active_bonds: usize,
    /// Number of clusters (singletons included).
    pub cluster_count: usize,
    /// Largest cluster size over active sites.
    pub largest_cluster_fraction: f64,
    /// Per-axis boundary-face spanning.
    pub spanning: [bool; 3],
    /// Per-axis periodic wrapping.
    pub wrapping: [bool; 3],
    /// Spans or wraps along at least one axis.
    pub percolates: bool,
    /// Active sites reachable from the boundary, over active sites.
    pub accessible_fraction: f64,
    /// Complement of `accessible_fraction`.
    pub inaccessible_fraction: f64,
    /// Active bonds inside wrapping clusters, over active bonds.
    pub percolating_bond_fraction: f64,
    /// Tortuosity aggregated over active sites; `None` with none active.
    pub tortuosity: Option<TortuosityStats>,
}

/// Outcome of one flip step plus the post-step snapshot summary.
#[derive(Clone, Debug, PartialEq)]
pub struct StepRecord {
    /// 1-based step index within the flip sequence.
    pub step: usize,
    /// What the sequencer flipped, including partial-fulfilment counts.
    pub changes: AppliedChanges,
    /// Whether the engine absorbed the step incrementally or rebuilt.
    pub outcome: UpdateOutcome,
    /// Connectivity after the step.
    pub summary: SnapshotSummary,
}

/// One seeded percolation run over a shared lattice.
#[derive(Debug)]
pub struct Trajectory {
    lattice: Arc<Lattice>,
    occupancy: Occupancy,
    percolator: Percolator,
    sequencer: FlipSequencer,
    initial: SnapshotSummary,
    records: Vec<StepRecord>,
}

impl Trajectory {
    /// Sample an initial occupancy and prepare the flip sequence.
    ///
    /// All name resolution happens here; a misconfigured run fails before
    /// its first step. The seed fixes the occupancy sample and every flip
    /// selection of this trajectory.
    pub fn new(
        lattice: Arc<Lattice>,
        config: &SimulationConfig,
        species: &SpeciesTable,
        seed: u64,
    ) -> Result<Self, BuildError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let occupancy = Occupancy::sample(&lattice, config, species, &mut rng)?;
        let sequencer = FlipSequencer::new(&lattice, config, species, rng)?;
        let classes = SpeciesClasses::from_config(config, species)?;
        let mut percolator = Percolator::new(Arc::clone(&lattice), classes);
        percolator.rebuild(&occupancy);
        let initial = summarize(&percolator);
        Ok(Self {
            lattice,
            occupancy,
            percolator,
            sequencer,
            initial,
            records: Vec::new(),
        })
    }

    /// The shared lattice geometry.
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// The current occupancy snapshot.
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// The connectivity engine in its current state.
    pub fn percolator(&self) -> &Percolator {
        &self.percolator
    }

    /// Summary of the initial snapshot, before any flip.
    pub fn initial(&self) -> &SnapshotSummary {
        &self.initial
    }

    /// Records of the steps applied so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Apply the next flip step, or `None` when the sequence is done.
    pub fn step(&mut self) -> Option<&StepRecord> {
        let changes = self
            .sequencer
            .apply_next(&self.lattice, &mut self.occupancy)?;
        let outcome = self.percolator.update(&self.occupancy, &changes.flipped);
        let summary = summarize(&self.percolator);
        self.records.push(StepRecord {
            step: self.sequencer.position(),
            changes,
            outcome,
            summary,
        });
        self.records.last()
    }

    /// Run the remaining steps and return all records.
    pub fn run(&mut self) -> &[StepRecord] {
        while self.step().is_some() {}
        &self.records
    }

    /// Initial summary followed by one summary per applied step.
    pub fn summaries(&self) -> Vec<SnapshotSummary> {
        let mut out = Vec::with_capacity(self.records.len() + 1);
        out.push(self.initial.clone());
        out.extend(self.records.iter().map(|r| r.summary.clone()));
        out
    }
}

/// Summarize the engine's current snapshot.
fn summarize(percolator: &Percolator) -> SnapshotSummary {
    let lattice = percolator.lattice();
    let active_sites = percolator.active_site_count();
    let active_bonds = percolator.active_bond_count();
    let clusters = percolator.clusters();

    let largest_cluster_fraction = if active_sites > 0 {
        percolator.largest_cluster_size() as f64 / active_sites as f64
    } else {
        0.0
    };

    // bonds inside wrapping clusters; an active bond's endpoints share a
    // cluster, so one endpoint decides membership
    let percolating_bond_fraction = if active_bonds > 0 {
        let mut in_wrapping = vec![false; lattice.len()];
        for cluster in &clusters {
            if cluster.is_wrapping() {
                for site in &cluster.sites {
                    in_wrapping[site.index()] = true;
                }
            }
        }
        let count = (0..lattice.bonds().len())
            .filter(|&idx| {
                percolator.bond_is_active(idx) && in_wrapping[lattice.bonds()[idx].a.index()]
            })
            .count();
        count as f64 / active_bonds as f64
    } else {
        0.0
    };

    let seeds = boundary_seeds(percolator);
    let (accessible_fraction, inaccessible_fraction) = if active_sites > 0 {
        let reach = accessible_sites(percolator, &seeds);
        let accessible = reach.iter().filter(|&&r| r).count();
        let fraction = accessible as f64 / active_sites as f64;
        (fraction, 1.0 - fraction)
    } else {
        (0.0, 0.0)
    };

    let tortuosity_stats = if active_sites > 0 {
        let per_site = tortuosity(percolator, &seeds);
        // aggregate over active sites only; inactive sites are not missing,
        // they are simply outside the graph
        let active_values: Vec<Option<f64>> = per_site
            .iter()
            .enumerate()
            .filter(|(i, _)| percolator.site_is_active(percol_core::SiteId(*i as u32)))
            .map(|(_, v)| *v)
            .collect();
        TortuosityStats::aggregate(&active_values)
    } else {
        None
    };

    SnapshotSummary {
        active_sites,
        active_bonds,
        cluster_count: clusters.len(),
        largest_cluster_fraction,
        spanning: percolator.spanning_axes(),
        wrapping: percolator.wrapping_axes(),
        percolates: percolator.percolates(),
        accessible_fraction,
        inaccessible_fraction,
        percolating_bond_fraction,
        tortuosity: tortuosity_stats,
    }
}
