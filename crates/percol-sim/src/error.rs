//! Simulation build errors.
//!
//! Runtime conditions (partial flips, unreachable tortuosity sites) are
//! results, not errors; everything here is fatal before a trajectory runs.

use percol_core::ConfigError;
use percol_lattice::{GeometryError, LatticeError};
use std::error::Error;
use std::fmt;

/// Errors from assembling a trajectory or ensemble.
#[derive(Clone, Debug, PartialEq)]
pub enum BuildError {
    /// The configuration failed validation or resolution.
    Config(ConfigError),
    /// The lattice geometry is invalid.
    Geometry(GeometryError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "configuration error: {e}"),
            Self::Geometry(e) => write!(f, "geometry error: {e}"),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Geometry(e) => Some(e),
        }
    }
}

impl From<ConfigError> for BuildError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<GeometryError> for BuildError {
    fn from(e: GeometryError) -> Self {
        Self::Geometry(e)
    }
}

impl From<LatticeError> for BuildError {
    fn from(e: LatticeError) -> Self {
        match e {
            LatticeError::Config(c) => Self::Config(c),
            LatticeError::Geometry(g) => Self::Geometry(g),
        }
    }
}
