//! Monte Carlo ensembles: many independent trajectories over one shared
//! lattice, fanned out across scoped worker threads.
//!
//! Sample `k` runs with seed `base_seed + k`, so the ensemble is
//! deterministic regardless of worker count or scheduling order.

use crate::error::BuildError;
use crate::trajectory::{SnapshotSummary, Trajectory};
use crossbeam_channel::{bounded, unbounded};
use percol_core::{SimulationConfig, SpeciesTable};
use percol_lattice::Lattice;
use std::sync::Arc;

/// Per-step averages over an ensemble of trajectories.
///
/// Index 0 is the initial snapshot (before any flip); index `s` is the
/// state after flip step `s`.
#[derive(Clone, Debug, PartialEq)]
pub struct PercolationCurve {
    /// Number of trajectories aggregated.
    pub samples: usize,
    /// Fraction of trajectories that percolate at each step.
    pub percolation_probability: Vec<f64>,
    /// Per-axis fraction of trajectories with a wrapping cluster.
    pub wrapping_probability: Vec<[f64; 3]>,
    /// Mean largest-cluster fraction.
    pub mean_largest_cluster: Vec<f64>,
    /// Mean boundary-accessible fraction.
    pub mean_accessible: Vec<f64>,
    /// Mean of the per-trajectory mean tortuosity; `None` at a step
    /// where no trajectory had a finite value.
    pub mean_tortuosity: Vec<Option<f64>>,
}

impl PercolationCurve {
    /// First step at which the percolation probability reaches `level`,
    /// or `None` if it never does.
    ///
    /// With `level = 0.5` this is the usual finite-size estimate of the
    /// percolation threshold, in flip-step units; interpolate against
    /// the per-step occupancy census for a site-fraction estimate.
    pub fn percolation_onset(&self, level: f64) -> Option<usize> {
        self.percolation_probability
            .iter()
            .position(|&p| p >= level)
    }

    /// Per-axis first step at which the wrapping probability reaches
    /// `level`.
    pub fn wrapping_onset(&self, level: f64) -> [Option<usize>; 3] {
        let axis = |a: usize| {
            self.wrapping_probability
                .iter()
                .position(|w| w[a] >= level)
        };
        [axis(0), axis(1), axis(2)]
    }
}

/// Runs independent trajectories and aggregates their summaries.
pub struct Ensemble<'a> {
    lattice: Arc<Lattice>,
    config: &'a SimulationConfig,
    species: &'a SpeciesTable,
    samples: usize,
    workers: usize,
}

impl<'a> Ensemble<'a> {
    /// Prepare an ensemble of `samples` runs seeded from the config.
    pub fn new(
        lattice: Arc<Lattice>,
        config: &'a SimulationConfig,
        species: &'a SpeciesTable,
        samples: usize,
    ) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            lattice,
            config,
            species,
            samples,
            workers,
        }
    }

    /// Override the worker-thread count (clamped to at least one).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Run every trajectory to completion and aggregate the curve.
    ///
    /// Workers pull sample indices from a shared queue; each builds its
    /// own trajectory against the shared lattice and sends back the
    /// per-step summaries. Results are reassembled in sample order, so
    /// the curve does not depend on thread scheduling.
    pub fn run(&self) -> Result<PercolationCurve, BuildError> {
        let samples = self.samples;
        let steps = self.config.flip_sequence.len() + 1;
        let mut collected: Vec<Option<Vec<SnapshotSummary>>> = vec![None; samples];

        if samples > 0 {
            let (job_tx, job_rx) = bounded::<usize>(samples);
            for k in 0..samples {
                // a bounded(samples) queue never blocks here
                let _ = job_tx.send(k);
            }
            drop(job_tx);

            let (result_tx, result_rx) =
                unbounded::<(usize, Result<Vec<SnapshotSummary>, BuildError>)>();
            let workers = self.workers.min(samples);

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    let job_rx = job_rx.clone();
                    let result_tx = result_tx.clone();
                    let lattice = Arc::clone(&self.lattice);
                    let config = self.config;
                    let species = self.species;
                    scope.spawn(move || {
                        while let Ok(k) = job_rx.recv() {
                            let seed = config.seed.wrapping_add(k as u64);
                            let outcome = Trajectory::new(
                                Arc::clone(&lattice),
                                config,
                                species,
                                seed,
                            )
                            .map(|mut trajectory| {
                                trajectory.run();
                                trajectory.summaries()
                            });
                            if result_tx.send((k, outcome)).is_err() {
                                break;
                            }
                        }
                    });
                }
                drop(result_tx);

                for (k, outcome) in result_rx.iter() {
                    collected[k] = Some(outcome?);
                }
                Ok::<(), BuildError>(())
            })?;
        }

        let mut curve = PercolationCurve {
            samples,
            percolation_probability: vec![0.0; steps],
            wrapping_probability: vec![[0.0; 3]; steps],
            mean_largest_cluster: vec![0.0; steps],
            mean_accessible: vec![0.0; steps],
            mean_tortuosity: vec![None; steps],
        };
        if samples == 0 {
            return Ok(curve);
        }

        let mut tortuosity_sums = vec![(0.0f64, 0usize); steps];
        for summaries in collected.iter().flatten() {
            for (s, summary) in summaries.iter().enumerate() {
                if summary.percolates {
                    curve.percolation_probability[s] += 1.0;
                }
                for axis in 0..3 {
                    if summary.wrapping[axis] {
                        curve.wrapping_probability[s][axis] += 1.0;
                    }
                }
                curve.mean_largest_cluster[s] += summary.largest_cluster_fraction;
                curve.mean_accessible[s] += summary.accessible_fraction;
                if let Some(stats) = summary.tortuosity {
                    tortuosity_sums[s].0 += stats.mean;
                    tortuosity_sums[s].1 += 1;
                }
            }
        }
        let norm = samples as f64;
        for s in 0..steps {
            curve.percolation_probability[s] /= norm;
            for axis in 0..3 {
                curve.wrapping_probability[s][axis] /= norm;
            }
            curve.mean_largest_cluster[s] /= norm;
            curve.mean_accessible[s] /= norm;
            let (sum, count) = tortuosity_sums[s];
            if count > 0 {
                curve.mean_tortuosity[s] = Some(sum / count as f64);
            }
        }
        Ok(curve)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use percol_core::{BondSpec, FlipStep, SiteSelector, SublatticeSpec};
    use percol_lattice::{Cell, StructureData};

    fn fixture() -> (Arc<Lattice>, SpeciesTable, SimulationConfig) {
        let structure = StructureData::new(
            Cell::cubic(3.0).unwrap(),
            vec![[0.0, 0.0, 0.0]],
            vec!["Li".into()],
        )
        .unwrap();
        let config = SimulationConfig {
            formula_units: 3,
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
            seed: 11,
        };
        let mut table = SpeciesTable::new();
        let lattice = Lattice::build(&structure, &config, &mut table).unwrap();
        (Arc::new(lattice), table, config)
    }

    #[test]
    fn curve_is_independent_of_worker_count() {
        let (lattice, table, config) = fixture();
        let run = |workers| {
            Ensemble::new(Arc::clone(&lattice), &config, &table, 8)
                .with_workers(workers)
                .run()
                .unwrap()
        };
        let serial = run(1);
        let parallel = run(4);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn final_step_always_percolates() {
        // flipping every TM to Li saturates the lattice
        let (lattice, table, config) = fixture();
        let curve = Ensemble::new(Arc::clone(&lattice), &config, &table, 6)
            .with_workers(2)
            .run()
            .unwrap();
        assert_eq!(curve.samples, 6);
        assert_eq!(curve.percolation_probability.len(), 2);
        assert!((curve.percolation_probability[1] - 1.0).abs() < 1e-12);
        assert!((curve.mean_largest_cluster[1] - 1.0).abs() < 1e-12);
        assert!(curve.mean_tortuosity[1].is_some());
        assert_eq!(curve.percolation_onset(1.0), Some(1));
    }

    #[test]
    fn onset_reports_the_first_step_reaching_the_level() {
        let curve = PercolationCurve {
            samples: 4,
            percolation_probability: vec![0.0, 0.25, 0.75, 1.0],
            wrapping_probability: vec![
                [0.0, 0.0, 0.0],
                [0.25, 0.0, 0.0],
                [0.75, 0.5, 0.0],
                [1.0, 1.0, 0.25],
            ],
            mean_largest_cluster: vec![0.0; 4],
            mean_accessible: vec![0.0; 4],
            mean_tortuosity: vec![None; 4],
        };
        assert_eq!(curve.percolation_onset(0.5), Some(2));
        assert_eq!(curve.percolation_onset(0.0), Some(0));
        assert_eq!(curve.percolation_onset(1.1), None);
        assert_eq!(curve.wrapping_onset(0.5), [Some(2), Some(2), None]);
        assert_eq!(curve.wrapping_onset(1.0), [Some(3), Some(3), None]);
    }

    #[test]
    fn empty_ensemble_yields_a_flat_curve() {
        let (lattice, table, config) = fixture();
        let curve = Ensemble::new(lattice, &config, &table, 0).run().unwrap();
        assert_eq!(curve.samples, 0);
        assert_eq!(curve.percolation_probability, vec![0.0, 0.0]);
        assert_eq!(curve.mean_tortuosity, vec![None, None]);
    }
}
