//! Sites, bonded neighbours, and bonds.

use percol_core::{Offset, SiteId, Species, SublatticeId};

/// One lattice site.
///
/// Identity and geometry are fixed at lattice build time; the *current*
/// species of a site lives in the occupancy snapshot, not here.
/// `structure_species` records what the input structure put on the site,
/// which is what species-based sublattice selectors bind against.
#[derive(Clone, Debug)]
pub struct Site {
    /// Canonical site id (index into the lattice's site array).
    pub id: SiteId,
    /// The sublattice this site belongs to.
    pub sublattice: SublatticeId,
    /// Fractional position in the supercell, wrapped to `[0, 1)`.
    pub frac: [f64; 3],
    /// Cartesian position.
    pub cart: [f64; 3],
    /// Species assigned by the input structure.
    pub structure_species: Species,
}

/// A bonded neighbour of a site, as stored in the per-site adjacency.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbour {
    /// The neighbouring site.
    pub site: SiteId,
    /// The neighbour's sublattice, cached for rule evaluation.
    pub sublattice: SublatticeId,
    /// Bond length.
    pub distance: f64,
    /// Periodic-image offset from the owning site to this neighbour.
    pub offset: Offset,
    /// Distance-shell index (0 = nearest shell of the owning site).
    pub shell: usize,
    /// Index of the corresponding entry in the lattice's bond list.
    pub bond: u32,
}

/// An unordered pair of bonded sites with its periodic-image offset.
///
/// Bonds are static geometry; whether a bond is *active* under a given
/// occupancy is the connectivity engine's concern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bond {
    /// First endpoint (canonical: `a <= b`).
    pub a: SiteId,
    /// Second endpoint.
    pub b: SiteId,
    /// Image offset from `a` to `b`: the bond connects `a` to the image
    /// of `b` translated by this many cells along each axis.
    pub offset: Offset,
    /// Bond length.
    pub length: f64,
}
