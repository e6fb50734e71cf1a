//! Simulation configuration model and validation.
//!
//! [`SimulationConfig`] is the in-memory contract between an external
//! loader (JSON/YAML deserialization is out of scope) and the simulation
//! core. [`validate()`](SimulationConfig::validate) checks structural
//! invariants up front so every failure in this file is a load-time
//! [`ConfigError`], raised before any trajectory runs.

use crate::error::ConfigError;
use indexmap::IndexMap;

/// Tolerance for the initial-occupancy normalisation check.
pub const OCCUPANCY_TOL: f64 = 1e-6;

/// How the member sites of a sublattice are selected.
#[derive(Clone, Debug, PartialEq)]
pub enum SiteSelector {
    /// Explicit site indices into the *unreplicated* input structure.
    Indices(Vec<usize>),
    /// All sites whose structure species is one of these labels.
    ///
    /// Resolved once against the initial structure; membership is fixed
    /// for the run even if species later change at a site.
    Species(Vec<String>),
}

/// A single neighbour-shell condition within a site rule.
///
/// Satisfied when at least `min_count` neighbours of the evaluated site,
/// in distance shell `shell` and sublattice `sublattice`, currently hold
/// one of the listed `species`.
#[derive(Clone, Debug, PartialEq)]
pub struct ShellCondition {
    /// Distance-shell index (0 = nearest shell).
    pub shell: usize,
    /// Target sublattice whose neighbours are counted.
    pub sublattice: String,
    /// Species labels that count toward the minimum.
    pub species: Vec<String>,
    /// Minimum number of matching neighbours.
    pub min_count: usize,
}

/// Named site-rule specification.
///
/// `name` is resolved against the rule registry at load time; an
/// unrecognised name is a [`ConfigError::UnknownRule`], never an
/// evaluation-time failure. Conditions within one set are ANDed and the
/// sets are ORed: any fully-satisfied set accepts the candidate.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleSpec {
    /// Registry key, e.g. `"stable_neighbour_shell"`.
    pub name: String,
    /// Alternative shell-condition sets.
    pub shell_sets: Vec<Vec<ShellCondition>>,
}

/// Declaration of one sublattice.
#[derive(Clone, Debug, PartialEq)]
pub struct SublatticeSpec {
    /// Unique sublattice name.
    pub name: String,
    /// Free-form description for reports.
    pub description: String,
    /// Member-site selection.
    pub sites: SiteSelector,
    /// Initial occupancy distribution: species label → probability.
    ///
    /// Must sum to 1.0 within [`OCCUPANCY_TOL`]. Insertion order is the
    /// sampling order, so it is part of the determinism contract.
    pub initial_occupancy: IndexMap<String, f64>,
    /// Excluded from percolation analysis and bonding when true.
    pub ignore: bool,
    /// Ordered site rules; all must accept a candidate species.
    pub site_rules: Vec<RuleSpec>,
}

impl SublatticeSpec {
    /// Convenience constructor with empty description, no rules, not ignored.
    pub fn new(name: &str, sites: SiteSelector, occupancy: IndexMap<String, f64>) -> Self {
        Self {
            name: name.to_owned(),
            description: String::new(),
            sites,
            initial_occupancy: occupancy,
            ignore: false,
            site_rules: Vec::new(),
        }
    }
}

/// Declares one pair of sublattices as bond-eligible.
#[derive(Clone, Debug, PartialEq)]
pub struct BondSpec {
    /// The two sublattice names; order is irrelevant and a sublattice may
    /// be paired with itself.
    pub sublattices: (String, String),
}

/// Upper bound on how many eligible sites one flip step relabels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FlipLimit {
    /// Flip every eligible site.
    All,
    /// Flip at most this many sites.
    Count(usize),
    /// Flip at most this fraction of the eligible sites, in (0, 1].
    Fraction(f64),
}

/// One species-relabelling step of the flip sequence.
#[derive(Clone, Debug, PartialEq)]
pub struct FlipStep {
    /// Species a site must currently hold to be eligible.
    pub from: String,
    /// Species assigned to the flipped sites.
    pub to: String,
    /// How many eligible sites to flip this step.
    pub limit: FlipLimit,
}

impl FlipStep {
    /// A step that flips every eligible site.
    pub fn all(from: &str, to: &str) -> Self {
        Self {
            from: from.to_owned(),
            to: to.to_owned(),
            limit: FlipLimit::All,
        }
    }
}

/// Complete simulation configuration (spec of one trajectory family).
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    /// Isotropic supercell replication factor.
    pub formula_units: u32,
    /// Bond-search cutoff distance, in the structure's length units.
    pub cutoff: f64,
    /// Sublattice declarations, in id order.
    pub sublattices: Vec<SublatticeSpec>,
    /// Bond-eligible sublattice pairs.
    pub bonds: Vec<BondSpec>,
    /// Species that participate in percolation.
    pub percolating_species: Vec<String>,
    /// Species that are immobile / always occupied; excluded from the
    /// percolation graph even when also listed as percolating.
    pub static_species: Vec<String>,
    /// Ordered relabelling steps driving the trajectory.
    pub flip_sequence: Vec<FlipStep>,
    /// RNG seed for occupancy sampling and flip selection.
    pub seed: u64,
}

impl SimulationConfig {
    /// Look up a sublattice spec by name.
    pub fn sublattice(&self, name: &str) -> Option<&SublatticeSpec> {
        self.sublattices.iter().find(|s| s.name == name)
    }

    /// Every species label the configuration itself can introduce:
    /// occupancy-distribution keys and species-selector labels, in
    /// first-seen order.
    pub fn declared_species(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for sub in &self.sublattices {
            for label in sub.initial_occupancy.keys() {
                if !seen.contains(&label.as_str()) {
                    seen.push(label);
                }
            }
            if let SiteSelector::Species(labels) = &sub.sites {
                for label in labels {
                    if !seen.contains(&label.as_str()) {
                        seen.push(label);
                    }
                }
            }
        }
        seen
    }

    /// Validate structural invariants that do not need the structure.
    ///
    /// Site-level checks (partition coverage, index bounds) happen when the
    /// configuration is resolved against a concrete structure at lattice
    /// build time; geometry checks (cutoff, cell) are `GeometryError`s there.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sublattices.is_empty() {
            return Err(ConfigError::NoSublattices);
        }
        if self.formula_units == 0 {
            return Err(ConfigError::InvalidSupercell { images: [0, 0, 0] });
        }

        for (i, sub) in self.sublattices.iter().enumerate() {
            if self.sublattices[..i].iter().any(|s| s.name == sub.name) {
                return Err(ConfigError::DuplicateSublattice {
                    name: sub.name.clone(),
                });
            }
            let sum: f64 = sub.initial_occupancy.values().sum();
            if (sum - 1.0).abs() > OCCUPANCY_TOL {
                return Err(ConfigError::OccupancyNotNormalised {
                    sublattice: sub.name.clone(),
                    sum,
                });
            }
            for rule in &sub.site_rules {
                if rule.shell_sets.is_empty() || rule.shell_sets.iter().any(Vec::is_empty) {
                    return Err(ConfigError::InvalidRuleParams {
                        name: rule.name.clone(),
                        sublattice: sub.name.clone(),
                        reason: "empty shell-condition set".into(),
                    });
                }
                for cond in rule.shell_sets.iter().flatten() {
                    if self.sublattice(&cond.sublattice).is_none() {
                        return Err(ConfigError::UnknownSublattice {
                            name: cond.sublattice.clone(),
                        });
                    }
                }
            }
        }

        for bond in &self.bonds {
            for name in [&bond.sublattices.0, &bond.sublattices.1] {
                if self.sublattice(name).is_none() {
                    return Err(ConfigError::UnknownSublattice { name: name.clone() });
                }
            }
        }

        let known = self.declared_species();
        let check = |label: &str, context: &str| -> Result<(), ConfigError> {
            if known.contains(&label) {
                Ok(())
            } else {
                Err(ConfigError::UnknownSpecies {
                    name: label.to_owned(),
                    context: context.to_owned(),
                })
            }
        };
        for label in &self.percolating_species {
            check(label, "percolating_species")?;
        }
        for label in &self.static_species {
            check(label, "static_species")?;
        }

        for (i, step) in self.flip_sequence.iter().enumerate() {
            if step.from == step.to {
                return Err(ConfigError::InvalidFlipStep {
                    step: i,
                    reason: format!("from and to are both '{}'", step.from),
                });
            }
            check(&step.from, "flip_sequence")?;
            check(&step.to, "flip_sequence")?;
            match step.limit {
                FlipLimit::Count(0) => {
                    return Err(ConfigError::InvalidFlipStep {
                        step: i,
                        reason: "count limit of zero".into(),
                    });
                }
                FlipLimit::Fraction(frac) if !(frac > 0.0 && frac <= 1.0) => {
                    return Err(ConfigError::InvalidFlipStep {
                        step: i,
                        reason: format!("fraction limit {frac} outside (0, 1]"),
                    });
                }
                _ => {}
            }
        }

        Ok(())
    }
}
