//! The flip sequencer: ordered species-relabelling steps.
//!
//! A flip step selects sites currently holding the step's `from` species,
//! filters them through the owning sublattice's site rules for the `to`
//! candidate, and relabels a seeded-random subset up to the step limit.
//! If fewer eligible sites exist than requested, every eligible site is
//! flipped and the shortfall is reported in [`AppliedChanges`] — a
//! partial result, not an error. Flips are irreversible within a run.

use crate::occupancy::Occupancy;
use crate::rule::{build_rules, SiteRule};
use percol_core::{ConfigError, FlipLimit, SimulationConfig, SiteId, Species, SpeciesTable};
use percol_lattice::Lattice;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

/// Outcome of applying one flip step.
#[derive(Clone, Debug, PartialEq)]
pub struct AppliedChanges {
    /// Species the flipped sites previously held.
    pub from: Species,
    /// Species the flipped sites now hold.
    pub to: Species,
    /// How many sites were eligible (right species, rules accepted).
    pub eligible: usize,
    /// How many flips the step limit asked for.
    pub requested: usize,
    /// How many sites were actually flipped.
    pub fulfilled: usize,
    /// The flipped sites, in ascending id order.
    pub flipped: Vec<SiteId>,
}

impl AppliedChanges {
    /// True when fewer sites were flipped than the limit requested.
    pub fn is_partial(&self) -> bool {
        self.fulfilled < self.requested
    }
}

/// Resolved flip step: species ids plus the configured limit.
#[derive(Clone, Copy, Debug)]
struct ResolvedStep {
    from: Species,
    to: Species,
    limit: FlipLimit,
}

/// Applies the configured flip sequence to an occupancy snapshot.
///
/// Holds the per-sublattice rule lists (built once, at load time) and the
/// trajectory's RNG. The sequencer owns no occupancy; the caller passes
/// its snapshot to [`apply_next`](Self::apply_next) each step.
#[derive(Debug)]
pub struct FlipSequencer {
    steps: Vec<ResolvedStep>,
    rules: Vec<Vec<Box<dyn SiteRule>>>,
    rng: ChaCha8Rng,
    cursor: usize,
}

impl FlipSequencer {
    /// Resolve the configuration's flip sequence and sublattice rules.
    ///
    /// All name resolution happens here, so unknown rules or species fail
    /// before the first step runs.
    pub fn new(
        lattice: &Lattice,
        config: &SimulationConfig,
        species: &SpeciesTable,
        rng: ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        let mut steps = Vec::with_capacity(config.flip_sequence.len());
        for step in &config.flip_sequence {
            let resolve = |label: &str| -> Result<Species, ConfigError> {
                species.get(label).ok_or_else(|| ConfigError::UnknownSpecies {
                    name: label.to_owned(),
                    context: "flip_sequence".to_owned(),
                })
            };
            steps.push(ResolvedStep {
                from: resolve(&step.from)?,
                to: resolve(&step.to)?,
                limit: step.limit,
            });
        }
        let mut rules = Vec::with_capacity(config.sublattices.len());
        for spec in &config.sublattices {
            rules.push(build_rules(
                &spec.site_rules,
                &spec.name,
                lattice,
                species,
            )?);
        }
        Ok(Self {
            steps,
            rules,
            rng,
            cursor: 0,
        })
    }

    /// Number of steps in the sequence.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True when the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Steps already applied.
    pub fn position(&self) -> usize {
        self.cursor
    }

    /// Apply the next step of the sequence, or `None` when exhausted.
    pub fn apply_next(
        &mut self,
        lattice: &Lattice,
        occupancy: &mut Occupancy,
    ) -> Option<AppliedChanges> {
        let step = *self.steps.get(self.cursor)?;
        self.cursor += 1;
        Some(self.apply(lattice, occupancy, step))
    }

    /// Eligibility and selection for one step.
    ///
    /// Rules are evaluated against the snapshot *before* any flip of this
    /// step is applied, so the step is a pure function of its input
    /// snapshot plus the RNG state.
    fn apply(
        &mut self,
        lattice: &Lattice,
        occupancy: &mut Occupancy,
        step: ResolvedStep,
    ) -> AppliedChanges {
        let mut eligible: Vec<SiteId> = Vec::new();
        for site in lattice.sites() {
            if occupancy.get(site.id) != step.from || lattice.is_ignored(site.id) {
                continue;
            }
            let rules = &self.rules[site.sublattice.index()];
            if rules
                .iter()
                .all(|r| r.evaluate(lattice, site.id, step.to, occupancy))
            {
                eligible.push(site.id);
            }
        }

        let requested = match step.limit {
            FlipLimit::All => eligible.len(),
            FlipLimit::Count(n) => n,
            // ceil: any positive fraction flips at least one site
            FlipLimit::Fraction(f) => (f * eligible.len() as f64).ceil() as usize,
        };
        let take = requested.min(eligible.len());

        let mut flipped: Vec<SiteId> = sample(&mut self.rng, eligible.len(), take)
            .into_iter()
            .map(|i| eligible[i])
            .collect();
        flipped.sort_unstable();
        for &site in &flipped {
            occupancy.set(site, step.to);
        }

        AppliedChanges {
            from: step.from,
            to: step.to,
            eligible: eligible.len(),
            requested,
            fulfilled: take,
            flipped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use percol_core::{
        BondSpec, FlipStep, RuleSpec, ShellCondition, SiteSelector, SublatticeSpec,
    };
    use percol_lattice::{Cell, StructureData};
    use rand::SeedableRng;

    fn fixture(flips: Vec<FlipStep>, rules: Vec<RuleSpec>) -> (Lattice, SimulationConfig, SpeciesTable) {
        let structure = StructureData::new(
            Cell::cubic(1.0).unwrap(),
            vec![[0.0, 0.0, 0.0]],
            vec!["TM".into()],
        )
        .unwrap();
        let mut sub = SublatticeSpec::new(
            "all",
            SiteSelector::Species(vec!["TM".into()]),
            indexmap! { "TM".into() => 1.0, "Li".into() => 0.0 },
        );
        sub.site_rules = rules;
        let config = SimulationConfig {
            formula_units: 3,
            cutoff: 1.1,
            sublattices: vec![sub],
            bonds: vec![BondSpec {
                sublattices: ("all".into(), "all".into()),
            }],
            percolating_species: vec!["Li".into()],
            static_species: vec![],
            flip_sequence: flips,
            seed: 5,
        };
        let mut table = SpeciesTable::new();
        let lattice = Lattice::build(&structure, &config, &mut table).unwrap();
        (lattice, config, table)
    }

    #[test]
    fn flips_all_eligible_sites() {
        let (lattice, config, table) = fixture(vec![FlipStep::all("TM", "Li")], vec![]);
        let mut seq =
            FlipSequencer::new(&lattice, &config, &table, ChaCha8Rng::seed_from_u64(1)).unwrap();
        let mut occ = Occupancy::from_structure(&lattice);
        let changes = seq.apply_next(&lattice, &mut occ).unwrap();
        assert_eq!(changes.eligible, 27);
        assert_eq!(changes.fulfilled, 27);
        assert!(!changes.is_partial());
        let li = table.get("Li").unwrap();
        assert_eq!(occ.sites_with(li).len(), 27);
        assert!(seq.apply_next(&lattice, &mut occ).is_none());
    }

    #[test]
    fn count_limit_selects_a_seeded_subset() {
        let (lattice, config, table) = fixture(
            vec![FlipStep {
                from: "TM".into(),
                to: "Li".into(),
                limit: FlipLimit::Count(5),
            }],
            vec![],
        );
        let run = |seed| {
            let mut seq =
                FlipSequencer::new(&lattice, &config, &table, ChaCha8Rng::seed_from_u64(seed))
                    .unwrap();
            let mut occ = Occupancy::from_structure(&lattice);
            seq.apply_next(&lattice, &mut occ).unwrap().flipped
        };
        let a = run(9);
        assert_eq!(a.len(), 5);
        assert_eq!(a, run(9), "same seed, same selection");
        assert!(a.windows(2).all(|w| w[0] < w[1]), "sorted output");
    }

    #[test]
    fn shortfall_is_partial_not_an_error() {
        let (lattice, config, table) = fixture(
            vec![FlipStep {
                from: "TM".into(),
                to: "Li".into(),
                limit: FlipLimit::Count(100),
            }],
            vec![],
        );
        let mut seq =
            FlipSequencer::new(&lattice, &config, &table, ChaCha8Rng::seed_from_u64(0)).unwrap();
        let mut occ = Occupancy::from_structure(&lattice);
        let changes = seq.apply_next(&lattice, &mut occ).unwrap();
        assert_eq!(changes.requested, 100);
        assert_eq!(changes.fulfilled, 27);
        assert!(changes.is_partial());
    }

    #[test]
    fn rules_filter_eligibility_against_the_pre_step_snapshot() {
        // require 6 TM nearest neighbours: in an all-TM cubic lattice every
        // site qualifies up front, and because evaluation uses the
        // pre-step snapshot the whole lattice still flips in one step.
        let rule = RuleSpec {
            name: crate::rule::STABLE_NEIGHBOUR_SHELL.into(),
            shell_sets: vec![vec![ShellCondition {
                shell: 0,
                sublattice: "all".into(),
                species: vec!["TM".into()],
                min_count: 6,
            }]],
        };
        let (lattice, config, table) = fixture(vec![FlipStep::all("TM", "Li")], vec![rule]);
        let mut seq =
            FlipSequencer::new(&lattice, &config, &table, ChaCha8Rng::seed_from_u64(2)).unwrap();
        let mut occ = Occupancy::from_structure(&lattice);
        let changes = seq.apply_next(&lattice, &mut occ).unwrap();
        assert_eq!(changes.fulfilled, 27);

        // a second identical step finds nothing: no TM sites remain
        let (lattice2, config2, table2) = fixture(
            vec![FlipStep::all("TM", "Li"), FlipStep::all("TM", "Li")],
            vec![],
        );
        let mut seq2 =
            FlipSequencer::new(&lattice2, &config2, &table2, ChaCha8Rng::seed_from_u64(2))
                .unwrap();
        let mut occ2 = Occupancy::from_structure(&lattice2);
        seq2.apply_next(&lattice2, &mut occ2).unwrap();
        let second = seq2.apply_next(&lattice2, &mut occ2).unwrap();
        assert_eq!(second.eligible, 0);
        assert_eq!(second.fulfilled, 0);
    }

    #[test]
    fn fraction_limit_rounds_up() {
        let (lattice, config, table) = fixture(
            vec![FlipStep {
                from: "TM".into(),
                to: "Li".into(),
                limit: FlipLimit::Fraction(0.1),
            }],
            vec![],
        );
        let mut seq =
            FlipSequencer::new(&lattice, &config, &table, ChaCha8Rng::seed_from_u64(3)).unwrap();
        let mut occ = Occupancy::from_structure(&lattice);
        let changes = seq.apply_next(&lattice, &mut occ).unwrap();
        // ceil(0.1 * 27) = 3
        assert_eq!(changes.fulfilled, 3);
    }
}
