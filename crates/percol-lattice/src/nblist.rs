//! Periodic neighbour search by translation-image star.
//!
//! For a cutoff sphere in a periodic cell, every pair of sites can be
//! within range through several periodic images. The search enumerates
//! the star of integer translations whose image can still reach the
//! cutoff — sized from the cell's perpendicular widths — and tests each
//! ordered pair against each translation. A pair appears once per
//! distinct in-range image, carrying its integer offset.

use crate::cell::Cell;
use crate::error::GeometryError;
use percol_core::Offset;

/// Slack added to cutoff comparisons to absorb floating-point noise.
pub const DIST_EPS: f64 = 1e-8;

/// One in-range neighbour of a site.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NeighbourHit {
    /// Index of the neighbouring site.
    pub site: usize,
    /// Cartesian distance through this image.
    pub distance: f64,
    /// Periodic-image translation applied to the neighbour.
    pub offset: Offset,
}

/// Cutoff-distance neighbour search over a periodic cell.
#[derive(Clone, Debug)]
pub struct NeighbourSearch {
    cell: Cell,
    cutoff: f64,
    star: Vec<Offset>,
}

impl NeighbourSearch {
    /// Create a search for `cutoff`-distance neighbours in `cell`.
    ///
    /// Returns [`GeometryError::NonPositiveCutoff`] for a zero, negative,
    /// or non-finite cutoff.
    pub fn new(cell: &Cell, cutoff: f64) -> Result<Self, GeometryError> {
        if !cutoff.is_finite() || cutoff <= 0.0 {
            return Err(GeometryError::NonPositiveCutoff { cutoff });
        }
        // |T_axis| <= cutoff / perp_width + 1 bounds every reachable image:
        // site displacements contribute at most one perpendicular width.
        let mut reach = [0i32; 3];
        for (axis, r) in reach.iter_mut().enumerate() {
            *r = (cutoff / cell.perp_width(axis)).ceil() as i32 + 1;
        }
        let mut star = Vec::new();
        for ta in -reach[0]..=reach[0] {
            for tb in -reach[1]..=reach[1] {
                for tc in -reach[2]..=reach[2] {
                    star.push([ta, tb, tc]);
                }
            }
        }
        Ok(Self {
            cell: cell.clone(),
            cutoff,
            star,
        })
    }

    /// The configured cutoff distance.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Number of candidate translations tested per pair.
    pub fn star_len(&self) -> usize {
        self.star.len()
    }

    /// All in-range neighbours of site `i`, including periodic images of
    /// `i` itself (with nonzero offset). Coordinates must be fractional
    /// and wrapped to `[0, 1)`.
    ///
    /// Results are sorted by `(distance, site, offset)` so repeated builds
    /// enumerate identically.
    pub fn neighbours_of(&self, coords: &[[f64; 3]], i: usize) -> Vec<NeighbourHit> {
        let mut hits = Vec::new();
        for (j, &coord) in coords.iter().enumerate() {
            for &t in &self.star {
                if j == i && t == [0, 0, 0] {
                    continue;
                }
                let d = self.cell.distance(coords[i], coord, t);
                if d <= self.cutoff + DIST_EPS {
                    hits.push(NeighbourHit {
                        site: j,
                        distance: d,
                        offset: t,
                    });
                }
            }
        }
        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then(a.site.cmp(&b.site))
                .then(a.offset.cmp(&b.offset))
        });
        hits
    }
}
