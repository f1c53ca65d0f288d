use crate::{
    payoff::Payoff,
    types::{Coalition, Player, Value},
};
use rust_decimal::Decimal;
use std::{
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};

/// Index of a node inside its lattice's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One coalition state of the lattice.
///
/// `parents` hold coalitions with one more player, `children` those with one fewer. Edges are
/// plain ids into the owning lattice and never outlive it.
#[derive(Debug, Clone, PartialEq)]
pub struct GameNode {
    pub coalition: Coalition,
    pub payoff: Payoff,
    pub parents: BTreeSet<NodeId>,
    pub children: BTreeSet<NodeId>,
}

impl GameNode {
    pub fn new(coalition: Coalition, payoff: Payoff) -> Self {
        GameNode {
            coalition,
            payoff,
            parents: BTreeSet::new(),
            children: BTreeSet::new(),
        }
    }

    /// Total payoff of the coalition's members
    pub fn value(&self) -> Value {
        self.payoff.sum_over(&self.coalition)
    }

    pub fn round_payoff(&self, player: Player) -> Decimal {
        self.payoff.rounded(player)
    }

    /// Rounded payoff of every member
    pub fn payoff_map(&self) -> BTreeMap<Player, Decimal> {
        self.payoff.rounded_over(&self.coalition)
    }

    /// Every member is at least as well off here, and at least one strictly better
    pub fn loosely_dominates(&self, other: &GameNode) -> bool {
        let mut found_pref = false;
        for p in self.coalition.iter() {
            let (mine, theirs) = (self.round_payoff(p), other.round_payoff(p));
            if mine < theirs {
                return false;
            }
            if mine > theirs {
                found_pref = true;
            }
        }
        found_pref
    }

    /// Every member is strictly better off here
    pub fn strictly_dominates(&self, other: &GameNode) -> bool {
        self.coalition
            .iter()
            .all(|p| self.round_payoff(p) > other.round_payoff(p))
    }

    /// No member is worse off here
    pub fn better_or_equal(&self, other: &GameNode) -> bool {
        self.coalition
            .iter()
            .all(|p| self.round_payoff(p) >= other.round_payoff(p))
    }
}

impl Display for GameNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self
            .payoff_map()
            .iter()
            .map(|(p, v)| format!("{p}: {v:.2}"))
            .collect();
        write!(
            f,
            "GameNode(coalition={}, payoff={{{}}})",
            self.coalition,
            entries.join(", ")
        )
    }
}
