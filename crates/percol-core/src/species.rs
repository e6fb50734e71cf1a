//! Insertion-ordered interning of species labels.

use crate::id::Species;
use indexmap::IndexSet;

/// Maps species label strings to compact [`Species`] ids.
///
/// Labels are interned in first-seen order, so two tables built from the
/// same configuration assign identical ids — iteration order is part of
/// the determinism contract.
#[derive(Clone, Debug, Default)]
pub struct SpeciesTable {
    labels: IndexSet<String>,
}

impl SpeciesTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a label, returning its id. Re-interning an existing label
    /// returns the original id.
    pub fn intern(&mut self, label: &str) -> Species {
        let (idx, _) = self.labels.insert_full(label.to_owned());
        Species(idx as u16)
    }

    /// Look up a label without interning.
    pub fn get(&self, label: &str) -> Option<Species> {
        self.labels.get_index_of(label).map(|i| Species(i as u16))
    }

    /// The label for an id, if the id was produced by this table.
    pub fn label(&self, species: Species) -> Option<&str> {
        self.labels.get_index(species.index()).map(String::as_str)
    }

    /// Number of distinct labels interned.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// True if no labels have been interned.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// All interned labels in interning order.
    pub fn iter(&self) -> impl Iterator<Item = (Species, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(i, l)| (Species(i as u16), l.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intern_is_idempotent() {
        let mut t = SpeciesTable::new();
        let li = t.intern("Li");
        let tm = t.intern("TM");
        assert_eq!(t.intern("Li"), li);
        assert_ne!(li, tm);
        assert_eq!(t.len(), 2);
    }

    #[test]
    fn lookup_and_label_round_trip() {
        let mut t = SpeciesTable::new();
        let vac = t.intern("Vac");
        assert_eq!(t.get("Vac"), Some(vac));
        assert_eq!(t.get("O"), None);
        assert_eq!(t.label(vac), Some("Vac"));
        assert_eq!(t.label(Species(99)), None);
    }

    #[test]
    fn interning_order_is_deterministic() {
        let mut a = SpeciesTable::new();
        let mut b = SpeciesTable::new();
        for label in ["Li", "TM", "Vac", "O"] {
            assert_eq!(a.intern(label), b.intern(label));
        }
        let order: Vec<_> = a.iter().map(|(_, l)| l.to_owned()).collect();
        assert_eq!(order, ["Li", "TM", "Vac", "O"]);
    }
}
