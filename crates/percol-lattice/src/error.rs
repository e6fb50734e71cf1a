//! Error types for lattice geometry and construction.

use percol_core::ConfigError;
use std::error::Error;
use std::fmt;

/// Errors arising from cell geometry or neighbour-search setup.
///
/// All fatal at lattice-build time, per the load-before-run error policy.
#[derive(Clone, Debug, PartialEq)]
pub enum GeometryError {
    /// The 3×3 basis is (numerically) singular.
    DegenerateCell {
        /// The signed cell volume that failed the check.
        volume: f64,
    },
    /// The bond-search cutoff is zero, negative, or non-finite.
    NonPositiveCutoff {
        /// The offending cutoff.
        cutoff: f64,
    },
    /// The structure has no sites.
    EmptyStructure,
    /// Coordinate and species arrays have different lengths.
    CoordSpeciesMismatch {
        /// Number of fractional coordinates.
        ncoords: usize,
        /// Number of species labels.
        nspecies: usize,
    },
    /// A supercell replication factor is zero.
    ZeroSupercell {
        /// The offending replication factors.
        images: [u32; 3],
    },
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DegenerateCell { volume } => {
                write!(f, "degenerate cell: volume {volume} below tolerance")
            }
            Self::NonPositiveCutoff { cutoff } => {
                write!(f, "bond cutoff must be positive and finite, got {cutoff}")
            }
            Self::EmptyStructure => write!(f, "structure has no sites"),
            Self::CoordSpeciesMismatch { ncoords, nspecies } => {
                write!(
                    f,
                    "{ncoords} coordinates but {nspecies} species labels"
                )
            }
            Self::ZeroSupercell { images } => {
                write!(
                    f,
                    "supercell replication {images:?} must be positive along every axis"
                )
            }
        }
    }
}

impl Error for GeometryError {}

/// Errors from [`Lattice::build`](crate::Lattice::build): either the
/// configuration failed to resolve against the structure, or the geometry
/// itself is invalid.
#[derive(Clone, Debug, PartialEq)]
pub enum LatticeError {
    /// Configuration problem (partition, occupancy, references).
    Config(ConfigError),
    /// Geometry problem (cell, cutoff, supercell).
    Geometry(GeometryError),
}

impl fmt::Display for LatticeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Geometry(e) => write!(f, "geometry error: {e}"),
        }
    }
}

impl Error for LatticeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Geometry(e) => Some(e),
        }
    }
}

impl From<ConfigError> for LatticeError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GeometryError> for LatticeError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}
