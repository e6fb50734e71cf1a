//! Site rules: named predicates over candidate occupancies.
//!
//! A rule decides whether a site may hold a candidate species given the
//! current occupancy snapshot. Rules are pure functions of their inputs —
//! no hidden state, no side effects — so trajectories replay
//! deterministically and rule checks could run in parallel across sites.
//!
//! Rules are constructed from named [`RuleSpec`]s through
//! [`build_rules`]; an unrecognised name is a load-time
//! [`ConfigError::UnknownRule`], never an evaluation-time failure.

use crate::occupancy::Occupancy;
use percol_core::{ConfigError, RuleSpec, SiteId, Species, SpeciesTable, SublatticeId};
use percol_lattice::Lattice;
use smallvec::SmallVec;
use std::fmt;

/// Registry name of [`NeighbourShellRule`].
pub const STABLE_NEIGHBOUR_SHELL: &str = "stable_neighbour_shell";

/// A predicate accepting or rejecting a candidate species for a site.
pub trait SiteRule: fmt::Debug + Send + Sync {
    /// Registry name this rule was built from.
    fn name(&self) -> &str;

    /// True if `site` may hold `candidate` under `occupancy`.
    fn evaluate(
        &self,
        lattice: &Lattice,
        site: SiteId,
        candidate: Species,
        occupancy: &Occupancy,
    ) -> bool;
}

/// One resolved shell condition: at least `min_count` neighbours in
/// distance shell `shell` and sublattice `sublattice` holding one of
/// `species`.
#[derive(Clone, Debug)]
struct ResolvedCondition {
    shell: usize,
    sublattice: SublatticeId,
    species: SmallVec<[Species; 4]>,
    min_count: usize,
}

impl ResolvedCondition {
    fn satisfied(&self, lattice: &Lattice, site: SiteId, occupancy: &Occupancy) -> bool {
        let mut count = 0;
        for nb in lattice.neighbours(site) {
            if nb.shell == self.shell
                && nb.sublattice == self.sublattice
                && self.species.contains(&occupancy.get(nb.site))
            {
                count += 1;
                if count >= self.min_count {
                    return true;
                }
            }
        }
        self.min_count == 0
    }
}

/// The stable-neighbour-shell rule.
///
/// Alternative condition sets are ORed; conditions within one set are
/// ANDed. A tetrahedral lithium site that needs four lithium octahedral
/// neighbours, say, is one set with one condition.
#[derive(Debug)]
pub struct NeighbourShellRule {
    shell_sets: Vec<Vec<ResolvedCondition>>,
}

impl SiteRule for NeighbourShellRule {
    fn name(&self) -> &str {
        STABLE_NEIGHBOUR_SHELL
    }

    fn evaluate(
        &self,
        lattice: &Lattice,
        site: SiteId,
        _candidate: Species,
        occupancy: &Occupancy,
    ) -> bool {
        self.shell_sets.iter().any(|set| {
            set.iter()
                .all(|cond| cond.satisfied(lattice, site, occupancy))
        })
    }
}

/// Build the ordered rule list of one sublattice.
///
/// Resolves sublattice names and species labels in the rule parameters;
/// any unknown reference or unknown rule name fails here, at load time.
pub fn build_rules(
    specs: &[RuleSpec],
    sublattice_name: &str,
    lattice: &Lattice,
    species: &SpeciesTable,
) -> Result<Vec<Box<dyn SiteRule>>, ConfigError> {
    specs
        .iter()
        .map(|spec| build_rule(spec, sublattice_name, lattice, species))
        .collect()
}

fn build_rule(
    spec: &RuleSpec,
    sublattice_name: &str,
    lattice: &Lattice,
    species: &SpeciesTable,
) -> Result<Box<dyn SiteRule>, ConfigError> {
    match spec.name.as_str() {
        STABLE_NEIGHBOUR_SHELL => {
            let mut shell_sets = Vec::with_capacity(spec.shell_sets.len());
            for set in &spec.shell_sets {
                let mut resolved = Vec::with_capacity(set.len());
                for cond in set {
                    let sublattice = lattice
                        .sublattice_by_name(&cond.sublattice)
                        .ok_or_else(|| ConfigError::UnknownSublattice {
                            name: cond.sublattice.clone(),
                        })?;
                    let mut allowed: SmallVec<[Species; 4]> = SmallVec::new();
                    for label in &cond.species {
                        let id =
                            species
                                .get(label)
                                .ok_or_else(|| ConfigError::UnknownSpecies {
                                    name: label.clone(),
                                    context: format!(
                                        "rule '{}' on sublattice '{sublattice_name}'",
                                        spec.name
                                    ),
                                })?;
                        allowed.push(id);
                    }
                    resolved.push(ResolvedCondition {
                        shell: cond.shell,
                        sublattice,
                        species: allowed,
                        min_count: cond.min_count,
                    });
                }
                shell_sets.push(resolved);
            }
            Ok(Box::new(NeighbourShellRule { shell_sets }))
        }
        other => Err(ConfigError::UnknownRule {
            name: other.to_owned(),
            sublattice: sublattice_name.to_owned(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;
    use percol_core::{BondSpec, ShellCondition, SimulationConfig, SiteSelector, SublatticeSpec};
    use percol_lattice::{Cell, StructureData};

    fn chain_fixture() -> (Lattice, SpeciesTable) {
        let structure = StructureData::new(
            Cell::cubic(3.0).unwrap(),
            vec![[0.0, 0.0, 0.0]],
            vec!["Li".into()],
        )
        .unwrap();
        let config = SimulationConfig {
            formula_units: 1,
            cutoff: 1.1,
            sublattices: vec![SublatticeSpec::new(
                "all",
                SiteSelector::Species(vec!["Li".into()]),
                indexmap! { "Li".into() => 0.5, "TM".into() => 0.5 },
            )],
            bonds: vec![BondSpec {
                sublattices: ("all".into(), "all".into()),
            }],
            percolating_species: vec!["Li".into()],
            static_species: vec![],
            flip_sequence: vec![],
            seed: 0,
        };
        let mut table = SpeciesTable::new();
        let lattice =
            Lattice::build_with_images(&structure, &config, [4, 1, 1], &mut table).unwrap();
        (lattice, table)
    }

    fn shell_rule(min_count: usize) -> RuleSpec {
        RuleSpec {
            name: STABLE_NEIGHBOUR_SHELL.into(),
            shell_sets: vec![vec![ShellCondition {
                shell: 0,
                sublattice: "all".into(),
                species: vec!["Li".into()],
                min_count,
            }]],
        }
    }

    #[test]
    fn unknown_rule_name_fails_at_build_time() {
        let (lattice, table) = chain_fixture();
        let spec = RuleSpec {
            name: "does_not_exist".into(),
            shell_sets: vec![vec![]],
        };
        let err = build_rules(&[spec], "all", &lattice, &table).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownRule { .. }));
    }

    #[test]
    fn unknown_species_in_rule_fails_at_build_time() {
        let (lattice, table) = chain_fixture();
        let mut spec = shell_rule(1);
        spec.shell_sets[0][0].species = vec!["Na".into()];
        let err = build_rules(&[spec], "all", &lattice, &table).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSpecies { .. }));
    }

    #[test]
    fn counts_neighbours_holding_allowed_species() {
        let (lattice, table) = chain_fixture();
        let li = table.get("Li").unwrap();
        let tm = table.get("TM").unwrap();
        let rules = build_rules(&[shell_rule(2)], "all", &lattice, &table).unwrap();
        let rule = &rules[0];

        // all Li: every chain site has 2 Li neighbours
        let mut occ = Occupancy::from_structure(&lattice);
        assert!(rule.evaluate(&lattice, SiteId(1), li, &occ));

        // flip one neighbour of site 1 to TM: count drops to 1
        occ.set(SiteId(0), tm);
        assert!(!rule.evaluate(&lattice, SiteId(1), li, &occ));
    }

    #[test]
    fn alternative_shell_sets_are_ored() {
        let (lattice, table) = chain_fixture();
        let li = table.get("Li").unwrap();
        let tm = table.get("TM").unwrap();
        let spec = RuleSpec {
            name: STABLE_NEIGHBOUR_SHELL.into(),
            shell_sets: vec![
                vec![ShellCondition {
                    shell: 0,
                    sublattice: "all".into(),
                    species: vec!["Li".into()],
                    min_count: 2,
                }],
                vec![ShellCondition {
                    shell: 0,
                    sublattice: "all".into(),
                    species: vec!["TM".into()],
                    min_count: 1,
                }],
            ],
        };
        let rules = build_rules(&[spec], "all", &lattice, &table).unwrap();
        let mut occ = Occupancy::from_structure(&lattice);
        occ.set(SiteId(0), tm);
        // first set fails (only 1 Li neighbour) but second set passes
        assert!(rules[0].evaluate(&lattice, SiteId(1), li, &occ));
    }

    #[test]
    fn zero_minimum_is_trivially_satisfied() {
        let (lattice, table) = chain_fixture();
        let li = table.get("Li").unwrap();
        let rules = build_rules(&[shell_rule(0)], "all", &lattice, &table).unwrap();
        let occ = Occupancy::from_structure(&lattice);
        assert!(rules[0].evaluate(&lattice, SiteId(0), li, &occ));
    }
}
