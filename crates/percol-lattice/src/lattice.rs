//! Lattice construction: sublattice resolution, bonds, shells, faces.
//!
//! [`Lattice::build`] resolves a [`SimulationConfig`] against a parsed
//! structure: it replicates the supercell, assigns every site to exactly
//! one sublattice, enumerates bonds between bond-eligible sublattice
//! pairs within the cutoff, groups each site's bonded neighbours into
//! distance shells, and precomputes the boundary-face site sets used for
//! spanning detection and accessibility seeding.
//!
//! The lattice and its bond set are built once and shared read-only by
//! every downstream component.

use crate::cell::Cell;
use crate::error::LatticeError;
use crate::nblist::NeighbourSearch;
use crate::site::{Bond, Neighbour, Site};
use crate::structure::StructureData;
use percol_core::{
    ConfigError, Offset, SimulationConfig, SiteId, SiteSelector, SpeciesTable, SublatticeId,
};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Width of a distance shell: neighbours within this of the shell's first
/// (shortest) member belong to the same shell. Matches the coordinate
/// fluctuation tolerance used when the neighbour list is built from
/// slightly relaxed structures.
pub const SHELL_TOL: f64 = 0.1;

/// A resolved sublattice: configuration identity plus member sites.
#[derive(Clone, Debug)]
pub struct SublatticeInfo {
    /// Sublattice id (position in the configuration's declaration order).
    pub id: SublatticeId,
    /// Unique name from the configuration.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Excluded from percolation analysis and bonding.
    pub ignore: bool,
    /// Member sites in ascending id order.
    pub sites: Vec<SiteId>,
}

/// Which boundary face of the supercell along an axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Face {
    /// The face at fractional coordinate 0.
    Low,
    /// The face at fractional coordinate 1.
    High,
}

/// An immutable periodic lattice with precomputed bond topology.
#[derive(Clone, Debug)]
pub struct Lattice {
    cell: Cell,
    images: [u32; 3],
    cutoff: f64,
    sites: Vec<Site>,
    sublattices: Vec<SublatticeInfo>,
    neighbours: Vec<Vec<Neighbour>>,
    bonds: Vec<Bond>,
    site_bonds: Vec<SmallVec<[u32; 12]>>,
    face_low: [Vec<SiteId>; 3],
    face_high: [Vec<SiteId>; 3],
}

impl Lattice {
    /// Build a lattice from a structure and configuration, replicating
    /// the structure `formula_units` times along every axis.
    ///
    /// Species labels (from both the configuration and the structure) are
    /// interned into `species` in deterministic order.
    pub fn build(
        structure: &StructureData,
        config: &SimulationConfig,
        species: &mut SpeciesTable,
    ) -> Result<Self, LatticeError> {
        let f = config.formula_units;
        Self::build_with_images(structure, config, [f, f, f], species)
    }

    /// Build with explicit per-axis replication factors.
    pub fn build_with_images(
        structure: &StructureData,
        config: &SimulationConfig,
        images: [u32; 3],
        species: &mut SpeciesTable,
    ) -> Result<Self, LatticeError> {
        config.validate()?;

        // Config-declared species first, then structure labels, so id
        // assignment does not depend on site ordering details.
        for label in config.declared_species() {
            species.intern(label);
        }

        let replicated = structure.replicated(images)?;
        let search = NeighbourSearch::new(&replicated.cell, config.cutoff)?;
        let base_len = structure.len();
        let n_images = (images[0] * images[1] * images[2]) as usize;
        let n = replicated.len();

        let structure_species: Vec<_> = replicated
            .species
            .iter()
            .map(|label| species.intern(label))
            .collect();

        // ── Sublattice resolution ───────────────────────────────────
        let mut assigned: Vec<Option<SublatticeId>> = vec![None; n];
        let mut sublattices = Vec::with_capacity(config.sublattices.len());
        for (k, spec) in config.sublattices.iter().enumerate() {
            let id = SublatticeId(k as u16);
            let mut members: Vec<SiteId> = Vec::new();
            match &spec.sites {
                SiteSelector::Indices(indices) => {
                    for &idx in indices {
                        if idx >= base_len {
                            return Err(ConfigError::SiteIndexOutOfRange {
                                site: idx,
                                sublattice: spec.name.clone(),
                                nsites: base_len,
                            }
                            .into());
                        }
                        for r in 0..n_images {
                            members.push(SiteId((r * base_len + idx) as u32));
                        }
                    }
                }
                SiteSelector::Species(labels) => {
                    for (i, label) in replicated.species.iter().enumerate() {
                        if labels.iter().any(|l| l == label) {
                            members.push(SiteId(i as u32));
                        }
                    }
                }
            }
            members.sort_unstable();
            for &site in &members {
                match assigned[site.index()] {
                    None => assigned[site.index()] = Some(id),
                    Some(prev) => {
                        return Err(ConfigError::SiteInMultipleSublattices {
                            site: site.index(),
                            first: config.sublattices[prev.index()].name.clone(),
                            second: spec.name.clone(),
                        }
                        .into());
                    }
                }
            }
            sublattices.push(SublatticeInfo {
                id,
                name: spec.name.clone(),
                description: spec.description.clone(),
                ignore: spec.ignore,
                sites: members,
            });
        }

        // ── Site table (also enforces full coverage) ────────────────
        let mut sites = Vec::with_capacity(n);
        for i in 0..n {
            let sublattice = match assigned[i] {
                Some(id) => id,
                None => return Err(ConfigError::SiteUnassigned { site: i }.into()),
            };
            let frac = replicated.frac_coords[i];
            sites.push(Site {
                id: SiteId(i as u32),
                sublattice,
                frac,
                cart: replicated.cell.cart(frac),
                structure_species: structure_species[i],
            });
        }

        // ── Bond-eligible sublattice pairs ──────────────────────────
        let mut eligible: Vec<(SublatticeId, SublatticeId)> = Vec::new();
        for bond in &config.bonds {
            let resolve = |name: &str| -> Result<SublatticeId, LatticeError> {
                sublattices
                    .iter()
                    .find(|s| s.name == name)
                    .map(|s| s.id)
                    .ok_or_else(|| {
                        ConfigError::UnknownSublattice {
                            name: name.to_owned(),
                        }
                        .into()
                    })
            };
            let a = resolve(&bond.sublattices.0)?;
            let b = resolve(&bond.sublattices.1)?;
            // ignored sublattices never bond
            if sublattices[a.index()].ignore || sublattices[b.index()].ignore {
                continue;
            }
            let pair = (a.min(b), a.max(b));
            if !eligible.contains(&pair) {
                eligible.push(pair);
            }
        }
        let pair_eligible = |a: SublatticeId, b: SublatticeId| {
            eligible.contains(&(a.min(b), a.max(b)))
        };

        // ── Neighbour lists and canonical bonds ─────────────────────
        let mut neighbours: Vec<Vec<Neighbour>> = vec![Vec::new(); n];
        let mut bonds: Vec<Bond> = Vec::new();
        let mut bond_index: HashMap<(u32, u32, Offset), u32> = HashMap::new();
        for i in 0..n {
            let sub_i = sites[i].sublattice;
            if sublattices[sub_i.index()].ignore {
                continue;
            }
            for hit in search.neighbours_of(&replicated.frac_coords, i) {
                let sub_j = sites[hit.site].sublattice;
                if sublattices[sub_j.index()].ignore || !pair_eligible(sub_i, sub_j) {
                    continue;
                }
                let key = canonical_bond(i as u32, hit.site as u32, hit.offset);
                let bond = *bond_index.entry(key).or_insert_with(|| {
                    bonds.push(Bond {
                        a: SiteId(key.0),
                        b: SiteId(key.1),
                        offset: key.2,
                        length: hit.distance,
                    });
                    (bonds.len() - 1) as u32
                });
                neighbours[i].push(Neighbour {
                    site: SiteId(hit.site as u32),
                    sublattice: sub_j,
                    distance: hit.distance,
                    offset: hit.offset,
                    shell: 0,
                    bond,
                });
            }
            assign_shells(&mut neighbours[i]);
        }

        let mut site_bonds: Vec<SmallVec<[u32; 12]>> = vec![SmallVec::new(); n];
        for (idx, bond) in bonds.iter().enumerate() {
            site_bonds[bond.a.index()].push(idx as u32);
            if bond.b != bond.a {
                site_bonds[bond.b.index()].push(idx as u32);
            }
        }

        // ── Boundary faces: sites within one cutoff of each face ────
        let mut face_low: [Vec<SiteId>; 3] = Default::default();
        let mut face_high: [Vec<SiteId>; 3] = Default::default();
        for axis in 0..3 {
            let depth = (config.cutoff / replicated.cell.axis_length(axis)).min(0.5);
            for site in &sites {
                if sublattices[site.sublattice.index()].ignore {
                    continue;
                }
                if site.frac[axis] < depth {
                    face_low[axis].push(site.id);
                }
                if site.frac[axis] >= 1.0 - depth {
                    face_high[axis].push(site.id);
                }
            }
        }

        Ok(Self {
            cell: replicated.cell,
            images,
            cutoff: config.cutoff,
            sites,
            sublattices,
            neighbours,
            bonds,
            site_bonds,
            face_low,
            face_high,
        })
    }

    /// Number of sites in the supercell.
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Always false: an empty structure is rejected at build time.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The supercell.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Replication factors the supercell was built with.
    pub fn images(&self) -> [u32; 3] {
        self.images
    }

    /// The bond-search cutoff distance.
    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// All sites in canonical order.
    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    /// One site by id.
    pub fn site(&self, id: SiteId) -> &Site {
        &self.sites[id.index()]
    }

    /// All sublattices in declaration order.
    pub fn sublattices(&self) -> &[SublatticeInfo] {
        &self.sublattices
    }

    /// One sublattice by id.
    pub fn sublattice(&self, id: SublatticeId) -> &SublatticeInfo {
        &self.sublattices[id.index()]
    }

    /// Look up a sublattice id by name.
    pub fn sublattice_by_name(&self, name: &str) -> Option<SublatticeId> {
        self.sublattices
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.id)
    }

    /// True if the site's sublattice is excluded from analysis.
    pub fn is_ignored(&self, site: SiteId) -> bool {
        self.sublattices[self.site(site).sublattice.index()].ignore
    }

    /// Bonded neighbours of a site, sorted by (shell, distance, id).
    pub fn neighbours(&self, site: SiteId) -> &[Neighbour] {
        &self.neighbours[site.index()]
    }

    /// Number of distance shells around a site.
    pub fn shell_count(&self, site: SiteId) -> usize {
        self.neighbours[site.index()]
            .last()
            .map_or(0, |n| n.shell + 1)
    }

    /// All bonds in canonical order.
    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    /// Indices into [`bonds`](Self::bonds) of every bond touching `site`.
    pub fn bonds_of(&self, site: SiteId) -> &[u32] {
        &self.site_bonds[site.index()]
    }

    /// Non-ignored sites within one cutoff of a boundary face.
    ///
    /// These are the designated boundary sets for finite-size spanning
    /// detection and the default seeds for accessibility analysis.
    pub fn face_sites(&self, axis: usize, face: Face) -> &[SiteId] {
        match face {
            Face::Low => &self.face_low[axis],
            Face::High => &self.face_high[axis],
        }
    }
}

/// Canonical form of a bond key: `(a, b, T)` with `a <= b`, and for
/// self-image bonds the lexicographically positive translation.
fn canonical_bond(i: u32, j: u32, t: Offset) -> (u32, u32, Offset) {
    let neg = [-t[0], -t[1], -t[2]];
    if i < j {
        (i, j, t)
    } else if i > j {
        (j, i, neg)
    } else {
        (i, i, t.max(neg))
    }
}

/// Assign shell indices to a distance-sorted neighbour list: a new shell
/// starts when the distance exceeds the current shell's first member by
/// more than [`SHELL_TOL`].
fn assign_shells(neighbours: &mut [Neighbour]) {
    let mut shell = 0usize;
    let mut shell_start = f64::NEG_INFINITY;
    for nb in neighbours.iter_mut() {
        if nb.distance > shell_start + SHELL_TOL {
            if shell_start.is_finite() {
                shell += 1;
            }
            shell_start = nb.distance;
        }
        nb.shell = shell;
    }
}
