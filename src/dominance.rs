use crate::{
    lattice::CoalitionLattice,
    node::{GameNode, NodeId},
};
use std::collections::BTreeSet;

/// Preference orders between two states, all computed on payoffs rounded to two digits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dominance {
    /// Every member strictly better off
    Strict,
    /// No member worse off, at least one strictly better
    Loose,
    /// No member worse off
    BetterOrEqual,
}

impl Dominance {
    pub fn holds(&self, a: &GameNode, b: &GameNode) -> bool {
        match self {
            Dominance::Strict => a.strictly_dominates(b),
            Dominance::Loose => a.loosely_dominates(b),
            Dominance::BetterOrEqual => a.better_or_equal(b),
        }
    }
}

impl CoalitionLattice {
    /// States not dominated under `relation` by any state sharing a player with them.
    ///
    /// Pairs with disjoint coalitions are incomparable. For every other pair, whichever side is
    /// dominated by the other is dropped (both directions are checked, so mutually
    /// better-or-equal states drop each other).
    pub fn dominant_set(&self, relation: Dominance) -> BTreeSet<NodeId> {
        let all: Vec<NodeId> = self.to_set().iter().copied().collect();
        let mut states: BTreeSet<NodeId> = all.iter().copied().collect();
        for (index, &i) in all.iter().enumerate() {
            for &j in &all[index + 1..] {
                let (a, b) = (self.node(i), self.node(j));
                if !a.coalition.intersects(&b.coalition) {
                    continue;
                }
                if relation.holds(a, b) {
                    states.remove(&j);
                }
                if relation.holds(b, a) {
                    states.remove(&i);
                }
            }
        }
        states
    }

    pub fn strictly_dominant_set(&self) -> BTreeSet<NodeId> {
        self.dominant_set(Dominance::Strict)
    }

    pub fn loosely_dominant_set(&self) -> BTreeSet<NodeId> {
        self.dominant_set(Dominance::Loose)
    }

    pub fn better_or_equal_set(&self) -> BTreeSet<NodeId> {
        self.dominant_set(Dominance::BetterOrEqual)
    }

    /// Every state that dominates `node` under `relation`
    pub fn all_dominant(&self, node: NodeId, relation: Dominance) -> BTreeSet<NodeId> {
        let target = self.node(node);
        self.nodes()
            .filter(|(_, state)| relation.holds(state, target))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn all_strictly_dominant(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.all_dominant(node, Dominance::Strict)
    }

    pub fn all_loosely_dominant(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.all_dominant(node, Dominance::Loose)
    }

    pub fn all_better_or_equal(&self, node: NodeId) -> BTreeSet<NodeId> {
        self.all_dominant(node, Dominance::BetterOrEqual)
    }
}
