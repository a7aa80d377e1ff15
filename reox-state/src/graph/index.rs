//! Dependency Index
//!
//! Forward and reverse edges between state cells and their dependents.
//! Dependents are never removed (computed values and effects live as long
//! as their store), so the index only grows.

use std::collections::HashMap;

use smallvec::SmallVec;

use super::node::Dependent;
use crate::reactive::{ComputedId, EffectId, StateId};

/// Maps state cells to the computed values and effects that read them.
#[derive(Debug, Default)]
pub struct DependencyIndex {
    /// Cell -> dependents that listed it.
    dependents: HashMap<StateId, SmallVec<[Dependent; 4]>>,

    /// Dependent -> cells it listed, deduplicated, in declaration order.
    dependencies: HashMap<Dependent, SmallVec<[StateId; 4]>>,
}

impl DependencyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `dependent` reads every cell in `sources`.
    ///
    /// Duplicate sources collapse to one edge.
    pub fn add(&mut self, dependent: Dependent, sources: &[StateId]) {
        let deps = self.dependencies.entry(dependent).or_default();
        for &source in sources {
            if deps.contains(&source) {
                continue;
            }
            deps.push(source);
            self.dependents.entry(source).or_default().push(dependent);
        }
    }

    /// Everything that depends on `source`.
    pub fn dependents_of(&self, source: StateId) -> &[Dependent] {
        self.dependents
            .get(&source)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// The cells `dependent` listed.
    pub fn dependencies_of(&self, dependent: Dependent) -> &[StateId] {
        self.dependencies
            .get(&dependent)
            .map(|d| d.as_slice())
            .unwrap_or(&[])
    }

    /// Computed values that read `source`.
    pub fn computed_for(&self, source: StateId) -> impl Iterator<Item = ComputedId> + '_ {
        self.dependents_of(source)
            .iter()
            .filter_map(|d| d.as_computed())
    }

    /// Effects that read `source`.
    pub fn effects_for(&self, source: StateId) -> impl Iterator<Item = EffectId> + '_ {
        self.dependents_of(source)
            .iter()
            .filter_map(|d| d.as_effect())
    }

    /// Total number of edges.
    pub fn edge_count(&self) -> usize {
        self.dependencies.values().map(|d| d.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edges_are_indexed_both_ways() {
        let mut index = DependencyIndex::new();
        let a = StateId::from_raw(100);
        let b = StateId::from_raw(101);
        let total = Dependent::Computed(ComputedId::from_raw(200));

        index.add(total, &[a, b]);

        assert_eq!(index.dependencies_of(total), &[a, b]);
        assert_eq!(index.dependents_of(a), &[total]);
        assert_eq!(index.dependents_of(b), &[total]);
        assert_eq!(index.edge_count(), 2);
    }

    #[test]
    fn duplicate_sources_collapse() {
        let mut index = DependencyIndex::new();
        let a = StateId::from_raw(1);
        let effect = Dependent::Effect(EffectId::from_raw(2));

        index.add(effect, &[a, a, a]);

        assert_eq!(index.dependencies_of(effect), &[a]);
        assert_eq!(index.dependents_of(a).len(), 1);
    }

    #[test]
    fn kind_filters_split_dependents() {
        let mut index = DependencyIndex::new();
        let a = StateId::from_raw(1);
        let c = ComputedId::from_raw(2);
        let e = EffectId::from_raw(3);

        index.add(c.into(), &[a]);
        index.add(e.into(), &[a]);

        assert_eq!(index.computed_for(a).collect::<Vec<_>>(), vec![c]);
        assert_eq!(index.effects_for(a).collect::<Vec<_>>(), vec![e]);
    }

    #[test]
    fn unknown_source_has_no_dependents() {
        let index = DependencyIndex::new();
        assert!(index.dependents_of(StateId::from_raw(9)).is_empty());
        assert_eq!(index.edge_count(), 0);
    }
}
