//! Mutable per-site species assignment.
//!
//! An [`Occupancy`] is the unit consumed by the connectivity engine: a
//! full mapping from site id to current species. It is initialised by
//! sampling each sublattice's configured species distribution with an
//! injected, seeded RNG, and afterwards mutated only by the flip
//! sequencer.

use indexmap::IndexMap;
use percol_core::{ConfigError, SimulationConfig, SiteId, Species, SpeciesTable};
use percol_lattice::Lattice;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// The current species of every site.
#[derive(Clone, Debug, PartialEq)]
pub struct Occupancy {
    species: Vec<Species>,
}

impl Occupancy {
    /// Sample an initial occupancy from the configuration's per-sublattice
    /// distributions.
    ///
    /// Sites are visited in canonical order and each draws independently
    /// from its sublattice's cumulative distribution, so the result is a
    /// pure function of the RNG seed. Species labels must already be
    /// interned (the lattice build does this).
    pub fn sample(
        lattice: &Lattice,
        config: &SimulationConfig,
        species: &SpeciesTable,
        rng: &mut ChaCha8Rng,
    ) -> Result<Self, ConfigError> {
        // cumulative distribution per sublattice, in declaration order
        let mut tables: Vec<Vec<(Species, f64)>> = Vec::with_capacity(config.sublattices.len());
        for spec in &config.sublattices {
            let mut cumulative = 0.0;
            let mut table = Vec::with_capacity(spec.initial_occupancy.len());
            for (label, &p) in &spec.initial_occupancy {
                let id = species.get(label).ok_or_else(|| ConfigError::UnknownSpecies {
                    name: label.clone(),
                    context: format!("initial_occupancy of sublattice '{}'", spec.name),
                })?;
                cumulative += p;
                table.push((id, cumulative));
            }
            tables.push(table);
        }

        let mut assignment = vec![Species(0); lattice.len()];
        for site in lattice.sites() {
            let table = &tables[site.sublattice.index()];
            let r: f64 = rng.random::<f64>() * table.last().map_or(1.0, |&(_, c)| c);
            let drawn = table
                .iter()
                .find(|&&(_, c)| r <= c)
                .or(table.last())
                .map(|&(s, _)| s)
                .unwrap_or(site.structure_species);
            assignment[site.id.index()] = drawn;
        }
        Ok(Self {
            species: assignment,
        })
    }

    /// An occupancy that simply mirrors the structure's species.
    pub fn from_structure(lattice: &Lattice) -> Self {
        Self {
            species: lattice.sites().iter().map(|s| s.structure_species).collect(),
        }
    }

    /// Current species of a site.
    #[inline]
    pub fn get(&self, site: SiteId) -> Species {
        self.species[site.index()]
    }

    /// Reassign a site's species.
    #[inline]
    pub fn set(&mut self, site: SiteId, species: Species) {
        self.species[site.index()] = species;
    }

    /// Number of sites covered.
    pub fn len(&self) -> usize {
        self.species.len()
    }

    /// True when the snapshot covers no sites.
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }

    /// The full site → species mapping in canonical order.
    pub fn as_slice(&self) -> &[Species] {
        &self.species
    }

    /// Species counts over one sublattice's member sites, in first-seen
    /// species order.
    pub fn census(&self, lattice: &Lattice, sublattice: &str) -> IndexMap<Species, usize> {
        let mut counts: IndexMap<Species, usize> = IndexMap::new();
        if let Some(id) = lattice.sublattice_by_name(sublattice) {
            for &site in &lattice.sublattice(id).sites {
                *counts.entry(self.get(site)).or_insert(0) += 1;
            }
        }
        counts
    }

    /// All sites currently holding `species`, in canonical order.
    pub fn sites_with(&self, species: Species) -> Vec<SiteId> {
        self.species
            .iter()
            .enumerate()
            .filter(|&(_, &s)| s == species)
            .map(|(i, _)| SiteId(i as u32))
            .collect()
    }
}
