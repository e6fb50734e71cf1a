//! Strongly-typed identifiers and the [`Offset`] type alias.

use std::fmt;

/// Identifies a site within a lattice.
///
/// Sites are assigned sequential ids at lattice build time; `SiteId(n)`
/// is the n-th site in the lattice's canonical ordering. Sites are never
/// destroyed during a simulation run, so ids stay valid for its lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SiteId(pub u32);

impl SiteId {
    /// The site's position in the lattice's canonical ordering.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for SiteId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a sublattice within a lattice.
///
/// Assigned in configuration order; `SublatticeId(n)` is the n-th
/// sublattice declared in the [`SimulationConfig`](crate::SimulationConfig).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SublatticeId(pub u16);

impl SublatticeId {
    /// Position in the configuration's sublattice list.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SublatticeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for SublatticeId {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// Identifies a connected cluster reported by the connectivity engine.
///
/// Cluster ids are only meaningful within one extraction; rebuilding the
/// engine may renumber clusters while preserving membership sets.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(pub u32);

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ClusterId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// An interned species label.
///
/// Resolved through a [`SpeciesTable`](crate::SpeciesTable); `Species(n)`
/// is the n-th distinct label interned. Copy-cheap so occupancy snapshots
/// are flat `Vec<Species>` arrays.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Species(pub u16);

impl Species {
    /// Position in the species table's interning order.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u16> for Species {
    fn from(v: u16) -> Self {
        Self(v)
    }
}

/// A periodic-image offset: how many cell boundaries a bond or a cluster
/// path crosses along each lattice direction.
pub type Offset = [i32; 3];
