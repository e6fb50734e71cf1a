//! Parsed-structure input and supercell replication.
//!
//! Structure-file parsing is an external collaborator; the core receives
//! already-parsed cell vectors, fractional coordinates, and species labels
//! through [`StructureData`].

use crate::cell::Cell;
use crate::error::GeometryError;

/// A crystal structure as handed over by an external parser.
///
/// Fractional coordinates are wrapped into `[0, 1)` at construction so
/// box assignment and image bookkeeping stay canonical.
#[derive(Clone, Debug)]
pub struct StructureData {
    /// Periodic cell of the (unreplicated) structure.
    pub cell: Cell,
    /// Fractional site coordinates, wrapped to `[0, 1)`.
    pub frac_coords: Vec<[f64; 3]>,
    /// Species label per site, parallel to `frac_coords`.
    pub species: Vec<String>,
}

impl StructureData {
    /// Create a structure, validating array lengths and non-emptiness.
    pub fn new(
        cell: Cell,
        frac_coords: Vec<[f64; 3]>,
        species: Vec<String>,
    ) -> Result<Self, GeometryError> {
        if frac_coords.is_empty() {
            return Err(GeometryError::EmptyStructure);
        }
        if frac_coords.len() != species.len() {
            return Err(GeometryError::CoordSpeciesMismatch {
                ncoords: frac_coords.len(),
                nspecies: species.len(),
            });
        }
        let frac_coords = frac_coords.into_iter().map(wrap_frac).collect();
        Ok(Self {
            cell,
            frac_coords,
            species,
        })
    }

    /// Number of sites.
    pub fn len(&self) -> usize {
        self.frac_coords.len()
    }

    /// Always false: construction rejects empty structures.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Replicate the structure `images` times along each lattice vector.
    ///
    /// Replicated site ordering is image-major: image `r` of base site `i`
    /// lands at index `r * len + i`, with image rank `r` enumerating
    /// `(ia, ib, ic)` lexicographically. Explicit-index sublattice
    /// selectors rely on this layout to extend base indices to all images.
    pub fn replicated(&self, images: [u32; 3]) -> Result<StructureData, GeometryError> {
        if images.iter().any(|&n| n == 0) {
            return Err(GeometryError::ZeroSupercell { images });
        }
        let cell = self.cell.supercell(images)?;
        let n_images = (images[0] * images[1] * images[2]) as usize;
        let mut frac_coords = Vec::with_capacity(n_images * self.len());
        let mut species = Vec::with_capacity(n_images * self.len());
        let scale = [
            f64::from(images[0]),
            f64::from(images[1]),
            f64::from(images[2]),
        ];
        for ia in 0..images[0] {
            for ib in 0..images[1] {
                for ic in 0..images[2] {
                    for (coord, label) in self.frac_coords.iter().zip(&self.species) {
                        frac_coords.push(wrap_frac([
                            (coord[0] + f64::from(ia)) / scale[0],
                            (coord[1] + f64::from(ib)) / scale[1],
                            (coord[2] + f64::from(ic)) / scale[2],
                        ]));
                        species.push(label.clone());
                    }
                }
            }
        }
        Ok(StructureData {
            cell,
            frac_coords,
            species,
        })
    }
}

/// Wrap a fractional coordinate into `[0, 1)` componentwise.
pub fn wrap_frac(f: [f64; 3]) -> [f64; 3] {
    let mut out = f;
    for x in out.iter_mut() {
        *x -= x.floor();
        // x.floor() of -1e-17 leaves exactly 1.0 behind
        if *x >= 1.0 {
            *x -= 1.0;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_arrays_and_empty_input() {
        let cell = Cell::cubic(1.0).unwrap();
        assert!(matches!(
            StructureData::new(cell.clone(), vec![[0.0; 3]], vec![]),
            Err(GeometryError::CoordSpeciesMismatch { .. })
        ));
        assert!(matches!(
            StructureData::new(cell, vec![], vec![]),
            Err(GeometryError::EmptyStructure)
        ));
    }

    #[test]
    fn wraps_coordinates_into_unit_interval() {
        let cell = Cell::cubic(1.0).unwrap();
        let s = StructureData::new(
            cell,
            vec![[1.25, -0.25, 0.5]],
            vec!["Li".into()],
        )
        .unwrap();
        let c = s.frac_coords[0];
        assert!((c[0] - 0.25).abs() < 1e-12);
        assert!((c[1] - 0.75).abs() < 1e-12);
        assert!((c[2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn replication_is_image_major() {
        let cell = Cell::cubic(2.0).unwrap();
        let s = StructureData::new(
            cell,
            vec![[0.0, 0.0, 0.0], [0.5, 0.5, 0.5]],
            vec!["Li".into(), "TM".into()],
        )
        .unwrap();
        let sc = s.replicated([2, 1, 1]).unwrap();
        assert_eq!(sc.len(), 4);
        // image 0 holds base sites 0..2, image 1 holds 2..4
        assert_eq!(sc.species, ["Li", "TM", "Li", "TM"]);
        assert!((sc.frac_coords[0][0] - 0.0).abs() < 1e-12);
        assert!((sc.frac_coords[2][0] - 0.5).abs() < 1e-12);
        // fractional y/z are rescaled into the doubled cell
        assert!((sc.frac_coords[3][0] - 0.75).abs() < 1e-12);
    }

    #[test]
    fn replication_rejects_zero_axis() {
        let cell = Cell::cubic(1.0).unwrap();
        let s = StructureData::new(cell, vec![[0.0; 3]], vec!["Li".into()]).unwrap();
        assert!(matches!(
            s.replicated([1, 0, 1]),
            Err(GeometryError::ZeroSupercell { .. })
        ));
    }
}
