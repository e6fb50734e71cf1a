//! Periodic simulation cell: 3×3 basis and coordinate conversions.

use crate::error::GeometryError;

/// Volume below which a cell is considered degenerate.
pub const DEGENERATE_TOL: f64 = 1e-9;

/// A periodic cell defined by three lattice vectors (matrix rows).
///
/// Fractional coordinates `f` map to cartesian as `f · B` where `B` is the
/// basis matrix; the inverse is precomputed at construction so both
/// directions are cheap.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    basis: [[f64; 3]; 3],
    inverse: [[f64; 3]; 3],
    volume: f64,
}

impl Cell {
    /// Create a cell from its three lattice vectors (rows).
    ///
    /// Returns [`GeometryError::DegenerateCell`] when the basis is
    /// numerically singular (|volume| below [`DEGENERATE_TOL`]).
    pub fn new(basis: [[f64; 3]; 3]) -> Result<Self, GeometryError> {
        let det = det3(&basis);
        if !det.is_finite() || det.abs() < DEGENERATE_TOL {
            return Err(GeometryError::DegenerateCell { volume: det });
        }
        Ok(Self {
            basis,
            inverse: invert3(&basis, det),
            volume: det.abs(),
        })
    }

    /// A cubic cell with edge length `a`.
    pub fn cubic(a: f64) -> Result<Self, GeometryError> {
        Self::new([[a, 0.0, 0.0], [0.0, a, 0.0], [0.0, 0.0, a]])
    }

    /// The basis matrix (lattice vectors as rows).
    pub fn basis(&self) -> &[[f64; 3]; 3] {
        &self.basis
    }

    /// Unsigned cell volume.
    pub fn volume(&self) -> f64 {
        self.volume
    }

    /// Cartesian position of a fractional coordinate.
    pub fn cart(&self, frac: [f64; 3]) -> [f64; 3] {
        row_mul(frac, &self.basis)
    }

    /// Fractional coordinate of a cartesian position.
    pub fn frac(&self, cart: [f64; 3]) -> [f64; 3] {
        row_mul(cart, &self.inverse)
    }

    /// Cartesian length of the `axis`-th lattice vector.
    pub fn axis_length(&self, axis: usize) -> f64 {
        norm(self.basis[axis])
    }

    /// Perpendicular width of the cell along `axis`: the distance between
    /// the two cell faces spanned by the other two lattice vectors. This
    /// bounds how many periodic images a cutoff sphere can reach.
    pub fn perp_width(&self, axis: usize) -> f64 {
        let (u, v) = match axis {
            0 => (self.basis[1], self.basis[2]),
            1 => (self.basis[2], self.basis[0]),
            _ => (self.basis[0], self.basis[1]),
        };
        self.volume / norm(cross(u, v))
    }

    /// The cell scaled by integer replication factors along each axis.
    pub fn supercell(&self, images: [u32; 3]) -> Result<Cell, GeometryError> {
        if images.iter().any(|&n| n == 0) {
            return Err(GeometryError::ZeroSupercell { images });
        }
        let mut basis = self.basis;
        for (row, &n) in basis.iter_mut().zip(images.iter()) {
            for x in row.iter_mut() {
                *x *= f64::from(n);
            }
        }
        Cell::new(basis)
    }

    /// Cartesian displacement from fractional `a` to fractional `b`
    /// translated by the periodic image `t`.
    pub fn displacement(&self, a: [f64; 3], b: [f64; 3], t: [i32; 3]) -> [f64; 3] {
        let frac = [
            b[0] + f64::from(t[0]) - a[0],
            b[1] + f64::from(t[1]) - a[1],
            b[2] + f64::from(t[2]) - a[2],
        ];
        self.cart(frac)
    }

    /// Cartesian distance for [`displacement`](Self::displacement).
    pub fn distance(&self, a: [f64; 3], b: [f64; 3], t: [i32; 3]) -> f64 {
        norm(self.displacement(a, b, t))
    }
}

/// Euclidean norm of a 3-vector.
pub fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Cross product of two 3-vectors.
pub fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn det3(m: &[[f64; 3]; 3]) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Inverse of a 3×3 matrix with known nonzero determinant.
fn invert3(m: &[[f64; 3]; 3], det: f64) -> [[f64; 3]; 3] {
    let inv_det = 1.0 / det;
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            // cofactor expansion, transposed
            let a = m[(j + 1) % 3][(i + 1) % 3];
            let b = m[(j + 2) % 3][(i + 2) % 3];
            let c = m[(j + 1) % 3][(i + 2) % 3];
            let d = m[(j + 2) % 3][(i + 1) % 3];
            out[i][j] = (a * b - c * d) * inv_det;
        }
    }
    out
}

fn row_mul(v: [f64; 3], m: &[[f64; 3]; 3]) -> [f64; 3] {
    [
        v[0] * m[0][0] + v[1] * m[1][0] + v[2] * m[2][0],
        v[0] * m[0][1] + v[1] * m[1][1] + v[2] * m[2][1],
        v[0] * m[0][2] + v[1] * m[1][2] + v[2] * m[2][2],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPS: f64 = 1e-10;

    #[test]
    fn rejects_degenerate_basis() {
        let r = Cell::new([[1.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 0.0, 1.0]]);
        assert!(matches!(r, Err(GeometryError::DegenerateCell { .. })));
    }

    #[test]
    fn cubic_cell_round_trips_coordinates() {
        let cell = Cell::cubic(4.0).unwrap();
        let cart = cell.cart([0.25, 0.5, 0.75]);
        assert!((cart[0] - 1.0).abs() < EPS);
        assert!((cart[1] - 2.0).abs() < EPS);
        assert!((cart[2] - 3.0).abs() < EPS);
        let frac = cell.frac(cart);
        assert!((frac[0] - 0.25).abs() < EPS);
        assert!((frac[1] - 0.5).abs() < EPS);
        assert!((frac[2] - 0.75).abs() < EPS);
    }

    #[test]
    fn volume_and_perp_widths_of_cube() {
        let cell = Cell::cubic(3.0).unwrap();
        assert!((cell.volume() - 27.0).abs() < EPS);
        for axis in 0..3 {
            assert!((cell.perp_width(axis) - 3.0).abs() < EPS);
            assert!((cell.axis_length(axis) - 3.0).abs() < EPS);
        }
    }

    #[test]
    fn supercell_scales_rows() {
        let cell = Cell::cubic(2.0).unwrap();
        let sc = cell.supercell([2, 3, 1]).unwrap();
        assert!((sc.axis_length(0) - 4.0).abs() < EPS);
        assert!((sc.axis_length(1) - 6.0).abs() < EPS);
        assert!((sc.axis_length(2) - 2.0).abs() < EPS);
        assert!(matches!(
            cell.supercell([0, 1, 1]),
            Err(GeometryError::ZeroSupercell { .. })
        ));
    }

    #[test]
    fn displacement_crosses_periodic_images() {
        let cell = Cell::cubic(10.0).unwrap();
        // 0.9 -> 0.1 via the +1 image is 2.0 units, not 8.0.
        let d = cell.distance([0.9, 0.0, 0.0], [0.1, 0.0, 0.0], [1, 0, 0]);
        assert!((d - 2.0).abs() < EPS);
        let d = cell.distance([0.9, 0.0, 0.0], [0.1, 0.0, 0.0], [0, 0, 0]);
        assert!((d - 8.0).abs() < EPS);
    }

    proptest! {
        #[test]
        fn frac_cart_round_trip(
            a in 2.0f64..8.0,
            skew in -0.5f64..0.5,
            fx in 0.0f64..1.0,
            fy in 0.0f64..1.0,
            fz in 0.0f64..1.0,
        ) {
            // triclinic-ish cell: cube with one skewed axis
            let cell = Cell::new([
                [a, 0.0, 0.0],
                [skew, a, 0.0],
                [0.0, skew, a],
            ]).unwrap();
            let back = cell.frac(cell.cart([fx, fy, fz]));
            prop_assert!((back[0] - fx).abs() < 1e-9);
            prop_assert!((back[1] - fy).abs() < 1e-9);
            prop_assert!((back[2] - fz).abs() < 1e-9);
        }
    }
}
