//! Load-time configuration errors.
//!
//! Everything here is fatal and raised before any simulation step runs:
//! a malformed sublattice partition, a probability distribution that does
//! not normalise, or a reference to an unknown species, sublattice, or
//! rule. Runtime conditions (partial flips, unreachable tortuosity sites)
//! are reported as partial results, never as errors.

use std::error::Error;
use std::fmt;

/// Errors detected while validating a [`SimulationConfig`](crate::SimulationConfig)
/// or while resolving it against a structure.
#[derive(Clone, Debug, PartialEq)]
pub enum ConfigError {
    /// Two sublattices share the same name.
    DuplicateSublattice {
        /// The repeated name.
        name: String,
    },
    /// A bond, rule, or flip referenced a sublattice that was never declared.
    UnknownSublattice {
        /// The missing name.
        name: String,
    },
    /// A site belongs to no sublattice and no `ignore` sublattice claims it.
    SiteUnassigned {
        /// Index of the orphaned site.
        site: usize,
    },
    /// A site was claimed by more than one sublattice.
    SiteInMultipleSublattices {
        /// Index of the contested site.
        site: usize,
        /// First claiming sublattice.
        first: String,
        /// Second claiming sublattice.
        second: String,
    },
    /// An explicit site index is outside the lattice.
    SiteIndexOutOfRange {
        /// The offending index.
        site: usize,
        /// Name of the sublattice that listed it.
        sublattice: String,
        /// Number of sites in the lattice.
        nsites: usize,
    },
    /// A sublattice's initial occupancy probabilities do not sum to 1.
    OccupancyNotNormalised {
        /// Name of the sublattice.
        sublattice: String,
        /// The actual sum.
        sum: f64,
    },
    /// A species label was referenced but appears nowhere in the structure
    /// or in any initial occupancy distribution.
    UnknownSpecies {
        /// The missing label.
        name: String,
        /// Where the reference occurred, e.g. a sublattice or `flip_sequence`.
        context: String,
    },
    /// A site rule name is not in the rule registry. Raised when the
    /// configuration loads, never during a step.
    UnknownRule {
        /// The unrecognised rule name.
        name: String,
        /// Sublattice whose rule list named it.
        sublattice: String,
    },
    /// A flip step is malformed (identical from/to species, or a
    /// non-finite / out-of-range fraction limit).
    InvalidFlipStep {
        /// Position of the step in the flip sequence.
        step: usize,
        /// What is wrong with it.
        reason: String,
    },
    /// `formula_units` (or an explicit supercell axis) is zero.
    InvalidSupercell {
        /// The offending replication factors.
        images: [u32; 3],
    },
    /// No sublattices were declared.
    NoSublattices,
    /// A rule's shell conditions are empty or internally inconsistent.
    InvalidRuleParams {
        /// The rule name.
        name: String,
        /// Sublattice whose rule list named it.
        sublattice: String,
        /// What is wrong with it.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateSublattice { name } => {
                write!(f, "sublattice '{name}' declared more than once")
            }
            Self::UnknownSublattice { name } => {
                write!(f, "reference to unknown sublattice '{name}'")
            }
            Self::SiteUnassigned { site } => {
                write!(f, "site {site} belongs to no sublattice")
            }
            Self::SiteInMultipleSublattices {
                site,
                first,
                second,
            } => {
                write!(
                    f,
                    "site {site} claimed by both sublattice '{first}' and '{second}'"
                )
            }
            Self::SiteIndexOutOfRange {
                site,
                sublattice,
                nsites,
            } => {
                write!(
                    f,
                    "sublattice '{sublattice}' lists site {site}, but the lattice has {nsites} sites"
                )
            }
            Self::OccupancyNotNormalised { sublattice, sum } => {
                write!(
                    f,
                    "initial occupancy of sublattice '{sublattice}' sums to {sum}, expected 1.0"
                )
            }
            Self::UnknownSpecies { name, context } => {
                write!(f, "unknown species '{name}' referenced by {context}")
            }
            Self::UnknownRule { name, sublattice } => {
                write!(
                    f,
                    "unknown site rule '{name}' on sublattice '{sublattice}'"
                )
            }
            Self::InvalidFlipStep { step, reason } => {
                write!(f, "flip step {step} invalid: {reason}")
            }
            Self::InvalidSupercell { images } => {
                write!(
                    f,
                    "supercell replication {images:?} must be positive along every axis"
                )
            }
            Self::NoSublattices => write!(f, "configuration declares no sublattices"),
            Self::InvalidRuleParams {
                name,
                sublattice,
                reason,
            } => {
                write!(
                    f,
                    "rule '{name}' on sublattice '{sublattice}' has invalid parameters: {reason}"
                )
            }
        }
    }
}

impl Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_mentions_the_offender() {
        let e = ConfigError::UnknownRule {
            name: "magic".into(),
            sublattice: "tet".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("magic"));
        assert!(msg.contains("tet"));

        let e = ConfigError::OccupancyNotNormalised {
            sublattice: "oct".into(),
            sum: 0.9,
        };
        assert!(e.to_string().contains("0.9"));
    }
}
