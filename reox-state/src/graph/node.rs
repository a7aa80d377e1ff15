//! Graph Nodes
//!
//! The dependent side of a dependency edge.

use crate::reactive::{ComputedId, EffectId};

/// Something that depends on state cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dependent {
    /// A cached derived value. Re-armed lazily when a source changes.
    Computed(ComputedId),

    /// A side-effect callback. Re-run by `run_effects` when a source is dirty.
    Effect(EffectId),
}

impl Dependent {
    pub fn as_computed(self) -> Option<ComputedId> {
        match self {
            Dependent::Computed(id) => Some(id),
            Dependent::Effect(_) => None,
        }
    }

    pub fn as_effect(self) -> Option<EffectId> {
        match self {
            Dependent::Effect(id) => Some(id),
            Dependent::Computed(_) => None,
        }
    }
}

impl From<ComputedId> for Dependent {
    fn from(id: ComputedId) -> Self {
        Dependent::Computed(id)
    }
}

impl From<EffectId> for Dependent {
    fn from(id: EffectId) -> Self {
        Dependent::Effect(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projections_pick_the_right_kind() {
        let c = ComputedId::from_raw(1);
        let e = EffectId::from_raw(2);

        assert_eq!(Dependent::from(c).as_computed(), Some(c));
        assert_eq!(Dependent::from(c).as_effect(), None);
        assert_eq!(Dependent::from(e).as_effect(), Some(e));
        assert_eq!(Dependent::from(e).as_computed(), None);
    }
}
