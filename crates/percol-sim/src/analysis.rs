//! Derived analyses over a connectivity snapshot: boundary-seeded
//! accessibility and geometric tortuosity.
//!
//! Both walk the active-bond adjacency without touching the engine's
//! union-find state, so they can run against any snapshot.

use crate::percolator::Percolator;
use percol_core::SiteId;
use percol_lattice::Face;
use std::collections::VecDeque;

/// Active sites lying on any boundary face of the supercell.
///
/// These are the natural entry points for accessibility: a guest species
/// entering from outside reaches the interior only through them.
pub fn boundary_seeds(percolator: &Percolator) -> Vec<SiteId> {
    let lattice = percolator.lattice();
    let mut seen = vec![false; lattice.len()];
    let mut seeds = Vec::new();
    for axis in 0..3 {
        for face in [Face::Low, Face::High] {
            for &site in lattice.face_sites(axis, face) {
                if !seen[site.index()] && percolator.site_is_active(site) {
                    seen[site.index()] = true;
                    seeds.push(site);
                }
            }
        }
    }
    seeds.sort_unstable();
    seeds
}

/// BFS reachability from `seeds` through active bonds.
///
/// Returns one flag per site; inactive sites and sites in components
/// that contain no seed come back `false`. Inactive seeds are skipped
/// rather than rejected.
pub fn accessible_sites(percolator: &Percolator, seeds: &[SiteId]) -> Vec<bool> {
    let lattice = percolator.lattice();
    let mut accessible = vec![false; lattice.len()];
    let mut queue = VecDeque::new();
    for &seed in seeds {
        if percolator.site_is_active(seed) && !accessible[seed.index()] {
            accessible[seed.index()] = true;
            queue.push_back(seed);
        }
    }
    while let Some(site) = queue.pop_front() {
        for &bidx in lattice.bonds_of(site) {
            if !percolator.bond_is_active(bidx as usize) {
                continue;
            }
            let bond = lattice.bonds()[bidx as usize];
            let other = if bond.a == site { bond.b } else { bond.a };
            if !accessible[other.index()] {
                accessible[other.index()] = true;
                queue.push_back(other);
            }
        }
    }
    accessible
}

/// Geometric tortuosity of every site relative to a set of entry seeds.
///
/// A hop-minimal BFS grows from the seeds through active bonds,
/// accumulating the geometric path length and the unwrapped displacement
/// from the seed the site was first reached from. The tortuosity of a
/// site is `path_length / straight_line_distance`; by the triangle
/// inequality it is at least 1.0, and seeds report exactly 1.0.
///
/// Sites not reachable from any seed yield `None`. That is a missing
/// value, not an error: disconnected pockets are a legitimate physical
/// outcome.
pub fn tortuosity(percolator: &Percolator, seeds: &[SiteId]) -> Vec<Option<f64>> {
    let lattice = percolator.lattice();
    let n = lattice.len();
    let mut result = vec![None; n];
    // BFS frontier state: path length so far, accumulated image offset,
    // and the Cartesian position of the originating seed
    let mut path_len = vec![0.0f64; n];
    let mut image = vec![[0i32; 3]; n];
    let mut origin = vec![[0.0f64; 3]; n];
    let mut visited = vec![false; n];
    let mut queue = VecDeque::new();

    for &seed in seeds {
        if percolator.site_is_active(seed) && !visited[seed.index()] {
            visited[seed.index()] = true;
            origin[seed.index()] = lattice.site(seed).cart;
            result[seed.index()] = Some(1.0);
            queue.push_back(seed);
        }
    }

    while let Some(site) = queue.pop_front() {
        let i = site.index();
        for &bidx in lattice.bonds_of(site) {
            if !percolator.bond_is_active(bidx as usize) {
                continue;
            }
            let bond = lattice.bonds()[bidx as usize];
            let (other, t) = if bond.a == site {
                (bond.b, bond.offset)
            } else {
                (bond.a, [-bond.offset[0], -bond.offset[1], -bond.offset[2]])
            };
            let j = other.index();
            if visited[j] {
                continue;
            }
            visited[j] = true;
            path_len[j] = path_len[i] + bond.length;
            image[j] = [image[i][0] + t[0], image[i][1] + t[1], image[i][2] + t[2]];
            origin[j] = origin[i];
            let shift = lattice.cell().cart([
                f64::from(image[j][0]),
                f64::from(image[j][1]),
                f64::from(image[j][2]),
            ]);
            let cart = lattice.site(other).cart;
            let disp = [
                cart[0] + shift[0] - origin[j][0],
                cart[1] + shift[1] - origin[j][1],
                cart[2] + shift[2] - origin[j][2],
            ];
            let straight = (disp[0] * disp[0] + disp[1] * disp[1] + disp[2] * disp[2]).sqrt();
            result[j] = if straight > f64::EPSILON {
                // triangle inequality makes the ratio >= 1; max() only
                // absorbs float noise on perfectly straight paths
                Some((path_len[j] / straight).max(1.0))
            } else {
                Some(1.0)
            };
            queue.push_back(other);
        }
    }
    result
}

/// Summary statistics over a per-site tortuosity vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TortuosityStats {
    /// Mean over sites with a finite value.
    pub mean: f64,
    /// Smallest finite value (1.0 whenever any seed is active).
    pub min: f64,
    /// Largest finite value.
    pub max: f64,
    /// Number of sites with a finite value.
    pub finite: usize,
    /// Number of sites with no value (unreachable).
    pub missing: usize,
}

impl TortuosityStats {
    /// Aggregate a tortuosity vector. `None` when no site has a value.
    pub fn aggregate(values: &[Option<f64>]) -> Option<Self> {
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut finite = 0usize;
        let mut missing = 0usize;
        for value in values {
            match value {
                Some(v) => {
                    sum += v;
                    min = min.min(*v);
                    max = max.max(*v);
                    finite += 1;
                }
                None => missing += 1,
            }
        }
        if finite == 0 {
            return None;
        }
        Some(Self {
            mean: sum / finite as f64,
            min,
            max,
            finite,
            missing,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::occupancy::Occupancy;
    use crate::percolator::SpeciesClasses;
    use indexmap::indexmap;
    use percol_core::{BondSpec, SimulationConfig, SiteSelector, SpeciesTable, SublatticeSpec};
    use percol_lattice::{Cell, Lattice, StructureData};
    use std::sync::Arc;

    /// Zigzag chain along x: two sites per cell, corner at (0,0,0) and
    /// centre at Cartesian (1,1,0), bonded only to each other (bond
    /// length sqrt(2), straight-line advance 1.0 per bond).
    fn zigzag(replicas: u32) -> (Arc<Lattice>, SpeciesTable, SimulationConfig) {
        let cell = Cell::new([[2.0, 0.0, 0.0], [0.0, 10.0, 0.0], [0.0, 0.0, 10.0]]).unwrap();
        let structure = StructureData::new(
            cell,
            vec![[0.0, 0.0, 0.0], [0.5, 0.1, 0.0]],
            vec!["Li".into(), "Li".into()],
        )
        .unwrap();
        let config = SimulationConfig {
            formula_units: 1,
            cutoff: 1.5,
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
            Lattice::build_with_images(&structure, &config, [replicas, 1, 1], &mut table).unwrap();
        (Arc::new(lattice), table, config)
    }

    fn engine(
        lattice: &Arc<Lattice>,
        table: &SpeciesTable,
        config: &SimulationConfig,
    ) -> Percolator {
        let classes = SpeciesClasses::from_config(config, table).unwrap();
        Percolator::new(Arc::clone(lattice), classes)
    }

    #[test]
    fn zigzag_tortuosity_is_sqrt_two() {
        let (lattice, table, config) = zigzag(4);
        let mut engine = engine(&lattice, &table, &config);
        let occ = Occupancy::from_structure(&lattice);
        engine.rebuild(&occ);

        // sites: corner of replica r = 2r, centre = 2r + 1
        let tort = tortuosity(&engine, &[SiteId(0)]);
        assert_eq!(tort[0], Some(1.0), "seed reports unity");
        // one hop: path sqrt(2), straight sqrt(2)
        let b0 = tort[1].unwrap();
        assert!((b0 - 1.0).abs() < 1e-9, "single hop is straight, got {b0}");
        // two hops to the next corner: path 2*sqrt(2), straight 2.0
        let a1 = tort[2].unwrap();
        assert!(
            (a1 - std::f64::consts::SQRT_2).abs() < 1e-9,
            "zigzag detour, got {a1}"
        );
        for value in tort.iter().flatten() {
            assert!(*value >= 1.0);
        }
    }

    #[test]
    fn unreachable_sites_report_missing() {
        let (lattice, table, config) = zigzag(4);
        let tm = table.get("TM").unwrap();
        let mut engine = engine(&lattice, &table, &config);
        let mut occ = Occupancy::from_structure(&lattice);
        // cut both centre sites flanking replica 2's corner
        occ.set(SiteId(3), tm);
        occ.set(SiteId(7), tm);
        engine.rebuild(&occ);

        let tort = tortuosity(&engine, &[SiteId(0)]);
        assert!(tort[2].is_some(), "still reachable through replica 0");
        assert!(tort[4].is_none(), "cut off from the seed");
        assert!(tort[3].is_none(), "inactive site has no value");

        let stats = TortuosityStats::aggregate(&tort).unwrap();
        assert_eq!(stats.finite + stats.missing, lattice.len());
        assert!(stats.min >= 1.0);
        assert!(stats.missing >= 3);
    }

    #[test]
    fn accessibility_stops_at_inactive_sites() {
        let (lattice, table, config) = zigzag(4);
        let tm = table.get("TM").unwrap();
        let mut engine = engine(&lattice, &table, &config);
        let mut occ = Occupancy::from_structure(&lattice);
        occ.set(SiteId(3), tm);
        occ.set(SiteId(7), tm);
        engine.rebuild(&occ);

        let reach = accessible_sites(&engine, &[SiteId(0)]);
        assert!(reach[0] && reach[1] && reach[2]);
        assert!(!reach[3], "inactive sites are never accessible");
        assert!(!reach[4] && !reach[5] && !reach[6]);
    }

    #[test]
    fn boundary_seeds_are_active_face_sites() {
        let (lattice, table, config) = zigzag(4);
        let tm = table.get("TM").unwrap();
        let mut engine = engine(&lattice, &table, &config);
        let mut occ = Occupancy::from_structure(&lattice);
        occ.set(SiteId(0), tm);
        engine.rebuild(&occ);

        let seeds = boundary_seeds(&engine);
        assert!(!seeds.contains(&SiteId(0)), "inactive face site excluded");
        assert!(!seeds.is_empty());
        for &seed in &seeds {
            assert!(engine.site_is_active(seed));
        }
    }

    #[test]
    fn aggregate_of_all_missing_is_none() {
        assert_eq!(TortuosityStats::aggregate(&[None, None]), None);
        assert_eq!(TortuosityStats::aggregate(&[]), None);
    }
}
