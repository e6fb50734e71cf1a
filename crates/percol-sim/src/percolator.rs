//! The connectivity engine: incremental union-find over active bonds
//! with periodic-image offset tracking.
//!
//! Every site starts in its own set with zero accumulated offset. Each
//! union through a bond with image offset `T` enforces the constraint
//! `image(b) = image(a) + T` between the cell-image assignments of the
//! two endpoints. When a union closes a cycle whose accumulated offset
//! is nonzero along an axis, the cluster has connected to its own
//! periodic image: it **wraps** along that axis. This is the
//! wrapping-probability signal, detected with exact integer arithmetic.
//!
//! Flips that only *add* active sites are applied incrementally; any
//! deactivation forces a full rebuild, because union-find has no split
//! operation. Supporting fast deletion is an explicit non-goal.

use crate::occupancy::Occupancy;
use indexmap::IndexMap;
use percol_core::{ClusterId, ConfigError, Offset, SimulationConfig, SiteId, Species, SpeciesTable};
use percol_lattice::{Face, Lattice};
use smallvec::SmallVec;
use std::sync::Arc;

/// Which species participate in the percolation graph.
///
/// A site is *active* when its species is percolating and not static;
/// static species are immobile scaffolding that never carries a path.
#[derive(Clone, Debug)]
pub struct SpeciesClasses {
    percolating: SmallVec<[Species; 4]>,
    statics: SmallVec<[Species; 4]>,
}

impl SpeciesClasses {
    /// Resolve the configuration's species class labels.
    pub fn from_config(
        config: &SimulationConfig,
        species: &SpeciesTable,
    ) -> Result<Self, ConfigError> {
        let resolve = |labels: &[String], context: &str| {
            labels
                .iter()
                .map(|l| {
                    species.get(l).ok_or_else(|| ConfigError::UnknownSpecies {
                        name: l.clone(),
                        context: context.to_owned(),
                    })
                })
                .collect::<Result<SmallVec<[Species; 4]>, _>>()
        };
        Ok(Self {
            percolating: resolve(&config.percolating_species, "percolating_species")?,
            statics: resolve(&config.static_species, "static_species")?,
        })
    }

    /// Build from already-resolved species ids.
    pub fn new(percolating: &[Species], statics: &[Species]) -> Self {
        Self {
            percolating: percolating.into(),
            statics: statics.into(),
        }
    }

    /// True when a species carries percolation paths.
    #[inline]
    pub fn is_active(&self, species: Species) -> bool {
        self.percolating.contains(&species) && !self.statics.contains(&species)
    }
}

/// One connected component of the active-bond graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    /// Extraction-local id (stable across identical snapshots).
    pub id: ClusterId,
    /// Member sites in ascending id order.
    pub sites: Vec<SiteId>,
    /// Number of independent wrapping paths per axis. The count depends
    /// on the order bonds were unioned; whether it is zero does not.
    pub wrapping: [u32; 3],
    /// Whether the cluster touches both boundary faces of an axis.
    pub spans: [bool; 3],
}

impl Cluster {
    /// True when the cluster wraps along any axis.
    pub fn is_wrapping(&self) -> bool {
        self.wrapping.iter().any(|&w| w > 0)
    }
}

/// How [`Percolator::update`] absorbed a set of changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Only activations: new sites were unioned in place.
    Incremental,
    /// A deactivation forced a clear-and-re-union of all active bonds.
    Rebuilt,
}

/// Union-find connectivity over the active-bond subgraph.
#[derive(Debug)]
pub struct Percolator {
    lattice: Arc<Lattice>,
    classes: SpeciesClasses,
    parent: Vec<u32>,
    /// Image offset of each node relative to its parent.
    offset: Vec<Offset>,
    /// Cluster size, valid at roots; 0 for inactive sites.
    size: Vec<u32>,
    /// Wrapping-path counts per axis, valid at roots.
    wrap: Vec<[u32; 3]>,
    active: Vec<bool>,
    bond_active: Vec<bool>,
    active_sites: usize,
    active_bonds: usize,
    face_low: [Vec<bool>; 3],
    face_high: [Vec<bool>; 3],
}

impl Percolator {
    /// Create an engine over shared, read-only lattice geometry.
    ///
    /// The engine starts with every site inactive; call
    /// [`rebuild`](Self::rebuild) with the first snapshot.
    pub fn new(lattice: Arc<Lattice>, classes: SpeciesClasses) -> Self {
        let n = lattice.len();
        let nbonds = lattice.bonds().len();
        let mut face_low: [Vec<bool>; 3] = Default::default();
        let mut face_high: [Vec<bool>; 3] = Default::default();
        for axis in 0..3 {
            let mut low = vec![false; n];
            for &s in lattice.face_sites(axis, Face::Low) {
                low[s.index()] = true;
            }
            let mut high = vec![false; n];
            for &s in lattice.face_sites(axis, Face::High) {
                high[s.index()] = true;
            }
            face_low[axis] = low;
            face_high[axis] = high;
        }
        Self {
            lattice,
            classes,
            parent: (0..n as u32).collect(),
            offset: vec![[0; 3]; n],
            size: vec![0; n],
            wrap: vec![[0; 3]; n],
            active: vec![false; n],
            bond_active: vec![false; nbonds],
            active_sites: 0,
            active_bonds: 0,
            face_low,
            face_high,
        }
    }

    /// The shared lattice geometry.
    pub fn lattice(&self) -> &Arc<Lattice> {
        &self.lattice
    }

    /// The species classes this engine filters by.
    pub fn classes(&self) -> &SpeciesClasses {
        &self.classes
    }

    /// Clear all state and re-union every active bond of the snapshot.
    ///
    /// Bonds are processed in canonical order, so two rebuilds from the
    /// same snapshot produce identical cluster membership.
    pub fn rebuild(&mut self, occupancy: &Occupancy) {
        let n = self.lattice.len();
        self.active_sites = 0;
        for i in 0..n {
            let site = SiteId(i as u32);
            let active =
                !self.lattice.is_ignored(site) && self.classes.is_active(occupancy.get(site));
            self.parent[i] = i as u32;
            self.offset[i] = [0; 3];
            self.size[i] = u32::from(active);
            self.wrap[i] = [0; 3];
            self.active[i] = active;
            self.active_sites += usize::from(active);
        }
        self.active_bonds = 0;
        for idx in 0..self.lattice.bonds().len() {
            let bond = self.lattice.bonds()[idx];
            let live = self.active[bond.a.index()] && self.active[bond.b.index()];
            self.bond_active[idx] = live;
            if live {
                self.active_bonds += 1;
                self.union_bond(idx);
            }
        }
    }

    /// Absorb the outcome of a flip step.
    ///
    /// Activations are unioned incrementally; if any changed site left
    /// the active set the whole engine is rebuilt from the snapshot.
    pub fn update(&mut self, occupancy: &Occupancy, changed: &[SiteId]) -> UpdateOutcome {
        let mut added: SmallVec<[SiteId; 16]> = SmallVec::new();
        for &site in changed {
            let now = !self.lattice.is_ignored(site)
                && self.classes.is_active(occupancy.get(site));
            let was = self.active[site.index()];
            if was && !now {
                self.rebuild(occupancy);
                return UpdateOutcome::Rebuilt;
            }
            if !was && now {
                added.push(site);
            }
        }
        for &site in &added {
            self.active[site.index()] = true;
            self.size[site.index()] = 1;
            self.active_sites += 1;
        }
        let lattice = Arc::clone(&self.lattice);
        for &site in &added {
            for &bidx in lattice.bonds_of(site) {
                let bond = lattice.bonds()[bidx as usize];
                if self.bond_active[bidx as usize]
                    || !self.active[bond.a.index()]
                    || !self.active[bond.b.index()]
                {
                    continue;
                }
                self.bond_active[bidx as usize] = true;
                self.active_bonds += 1;
                self.union_bond(bidx as usize);
            }
        }
        UpdateOutcome::Incremental
    }

    /// Union the two endpoints of a bond, tracking image offsets.
    fn union_bond(&mut self, bond_idx: usize) {
        let bond = self.lattice.bonds()[bond_idx];
        let t = bond.offset;
        let (ra, offa) = self.find(bond.a.0);
        let (rb, offb) = self.find(bond.b.0);
        if ra == rb {
            // cycle: a nonzero residual offset means the cluster reached
            // a different periodic image of itself
            let delta = [
                offa[0] + t[0] - offb[0],
                offa[1] + t[1] - offb[1],
                offa[2] + t[2] - offb[2],
            ];
            for axis in 0..3 {
                if delta[axis] != 0 {
                    self.wrap[ra as usize][axis] += 1;
                }
            }
            return;
        }
        // union by size; ties keep the first root for determinism
        let (keep, child, off_child) = if self.size[ra as usize] >= self.size[rb as usize] {
            // image(rb) = image(b) - offb = image(a) + T - offb
            //           = image(ra) + offa + T - offb
            (
                ra,
                rb,
                [
                    offa[0] + t[0] - offb[0],
                    offa[1] + t[1] - offb[1],
                    offa[2] + t[2] - offb[2],
                ],
            )
        } else {
            (
                rb,
                ra,
                [
                    offb[0] - t[0] - offa[0],
                    offb[1] - t[1] - offa[1],
                    offb[2] - t[2] - offa[2],
                ],
            )
        };
        self.parent[child as usize] = keep;
        self.offset[child as usize] = off_child;
        self.size[keep as usize] += self.size[child as usize];
        for axis in 0..3 {
            self.wrap[keep as usize][axis] += self.wrap[child as usize][axis];
        }
        self.wrap[child as usize] = [0; 3];
    }

    /// Find with path compression, returning the root and the node's
    /// accumulated image offset relative to it.
    fn find(&mut self, node: u32) -> (u32, Offset) {
        let mut path: SmallVec<[u32; 16]> = SmallVec::new();
        let mut current = node;
        while self.parent[current as usize] != current {
            path.push(current);
            current = self.parent[current as usize];
        }
        let root = current;
        let mut acc = [0i32; 3];
        // walk back down: each node's offset-to-root is its offset to its
        // parent plus the parent's (already computed) offset to root
        for &n in path.iter().rev() {
            let o = self.offset[n as usize];
            acc = [o[0] + acc[0], o[1] + acc[1], o[2] + acc[2]];
            self.parent[n as usize] = root;
            self.offset[n as usize] = acc;
        }
        (root, if node == root { [0; 3] } else { self.offset[node as usize] })
    }

    /// Read-only root lookup (no compression).
    fn root_of(&self, node: u32) -> u32 {
        let mut current = node;
        while self.parent[current as usize] != current {
            current = self.parent[current as usize];
        }
        current
    }

    /// True when the site's current species participates in percolation.
    pub fn site_is_active(&self, site: SiteId) -> bool {
        self.active[site.index()]
    }

    /// True when both endpoints of the bond are active.
    pub fn bond_is_active(&self, bond: usize) -> bool {
        self.bond_active[bond]
    }

    /// Number of active sites in the current snapshot.
    pub fn active_site_count(&self) -> usize {
        self.active_sites
    }

    /// Number of active bonds in the current snapshot.
    pub fn active_bond_count(&self) -> usize {
        self.active_bonds
    }

    /// Two sites are connected iff both are active and a path of active
    /// bonds joins them.
    pub fn connected(&self, a: SiteId, b: SiteId) -> bool {
        self.active[a.index()] && self.active[b.index()] && self.root_of(a.0) == self.root_of(b.0)
    }

    /// Size of the largest cluster, or 0 with no active sites.
    pub fn largest_cluster_size(&self) -> usize {
        (0..self.parent.len())
            .filter(|&i| self.parent[i] == i as u32 && self.active[i])
            .map(|i| self.size[i] as usize)
            .max()
            .unwrap_or(0)
    }

    /// True when some cluster wraps along `axis`.
    pub fn wraps(&self, axis: usize) -> bool {
        (0..self.parent.len())
            .any(|i| self.parent[i] == i as u32 && self.active[i] && self.wrap[i][axis] > 0)
    }

    /// Per-axis wrapping flags.
    pub fn wrapping_axes(&self) -> [bool; 3] {
        [self.wraps(0), self.wraps(1), self.wraps(2)]
    }

    /// True when some cluster touches both boundary faces of `axis`.
    pub fn spans(&self, axis: usize) -> bool {
        let mut low_roots: SmallVec<[u32; 8]> = SmallVec::new();
        for (i, &on_face) in self.face_low[axis].iter().enumerate() {
            if on_face && self.active[i] {
                let root = self.root_of(i as u32);
                if !low_roots.contains(&root) {
                    low_roots.push(root);
                }
            }
        }
        if low_roots.is_empty() {
            return false;
        }
        self.face_high[axis]
            .iter()
            .enumerate()
            .any(|(i, &on_face)| {
                on_face && self.active[i] && low_roots.contains(&self.root_of(i as u32))
            })
    }

    /// Per-axis spanning flags.
    pub fn spanning_axes(&self) -> [bool; 3] {
        [self.spans(0), self.spans(1), self.spans(2)]
    }

    /// Percolation: any cluster spans a finite axis or wraps through the
    /// periodic boundary along it.
    pub fn percolates(&self) -> bool {
        (0..3).any(|axis| self.spans(axis) || self.wraps(axis))
    }

    /// Extract all clusters, in order of their lowest member site id.
    ///
    /// Membership is a pure function of the snapshot: rebuilding and
    /// re-extracting yields equal sets even if internal tree shapes
    /// differ. Singleton active sites count as clusters of size one.
    pub fn clusters(&self) -> Vec<Cluster> {
        let mut by_root: IndexMap<u32, Vec<SiteId>> = IndexMap::new();
        for i in 0..self.parent.len() {
            if self.active[i] {
                by_root
                    .entry(self.root_of(i as u32))
                    .or_default()
                    .push(SiteId(i as u32));
            }
        }
        by_root
            .into_iter()
            .enumerate()
            .map(|(k, (root, sites))| {
                let mut spans = [false; 3];
                for axis in 0..3 {
                    let low = sites.iter().any(|s| self.face_low[axis][s.index()]);
                    let high = sites.iter().any(|s| self.face_high[axis][s.index()]);
                    spans[axis] = low && high;
                }
                Cluster {
                    id: ClusterId(k as u32),
                    sites,
                    wrapping: self.wrap[root as usize],
                    spans,
                }
            })
            .collect()
    }
}
