use crate::{
    error::Result,
    game::CharacteristicFunction,
    node::{GameNode, NodeId},
    payoff::Payoff,
    shapley::shapley,
    types::Coalition,
    validation::{validate_coalition, validate_payoff},
};
use derive_builder::Builder;
use std::{
    cell::OnceCell,
    collections::{BTreeMap, BTreeSet},
    fmt::{Display, Formatter},
};
use tracing::{debug, instrument, trace};

/// How a [`CoalitionLattice`] is grown from its root
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct LatticeConfig {
    /// Reference coalition, the grand coalition when unset
    #[builder(default, setter(strip_option))]
    pub root: Option<Coalition>,
    /// Payoff of the root state, its exact Shapley value when unset
    #[builder(default, setter(strip_option))]
    pub root_payoff: Option<Payoff>,
    /// Collapse nodes reached through different removal orders into one
    #[builder(default = "true")]
    pub merge_same_coalition: bool,
    /// Give coalitions that lose value a zero payoff instead of their raw Shapley value
    #[builder(default = "false")]
    pub set_non_profitable_to_zero: bool,
    /// Also grow super-coalitions of the root, up to the grand coalition
    #[builder(default = "false")]
    pub grow_upward: bool,
    /// Re-root at the topmost coalition and fill in every sub-coalition below it
    #[builder(default = "false")]
    pub complete_missing_states: bool,
}

impl LatticeConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(Some(payoff)) = &self.root_payoff {
            if !payoff.is_finite() {
                return Err("root_payoff must only hold finite values".to_string());
            }
        }
        Ok(())
    }
}

impl Default for LatticeConfig {
    fn default() -> Self {
        LatticeConfig {
            root: None,
            root_payoff: None,
            merge_same_coalition: true,
            set_non_profitable_to_zero: false,
            grow_upward: false,
            complete_missing_states: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Down,
    Up,
}

/// DAG of coalition states reachable from a root coalition by adding or removing one player at a
/// time, each state carrying an inferred payoff.
///
/// Nodes live in an arena owned by the lattice; cloning the lattice clones the arena, so a clone
/// shares no node storage with its source.
#[derive(Debug, Clone)]
pub struct CoalitionLattice {
    players: usize,
    nodes: Vec<GameNode>,
    root: NodeId,
    node_set: OnceCell<BTreeSet<NodeId>>,
}

impl CoalitionLattice {
    /// Lattice below the grand coalition of `game`, with default settings
    pub fn new<G>(game: &G) -> Result<Self>
    where
        G: CharacteristicFunction + ?Sized,
    {
        Self::build(game, &LatticeConfig::default())
    }

    #[instrument(skip_all, fields(players = game.players_amount()))]
    pub fn build<G>(game: &G, config: &LatticeConfig) -> Result<Self>
    where
        G: CharacteristicFunction + ?Sized,
    {
        let players = game.players_amount();
        let root_coalition = config.root.unwrap_or_else(|| game.grand_coalition());
        validate_coalition(&root_coalition, players)?;

        let root_payoff = match &config.root_payoff {
            Some(payoff) => {
                validate_payoff(payoff, players)?;
                payoff.clone()
            }
            None => shapley(game, &root_coalition)?,
        };

        let mut lattice = CoalitionLattice {
            players,
            nodes: vec![GameNode::new(root_coalition, root_payoff)],
            root: NodeId(0),
            node_set: OnceCell::new(),
        };

        let zero = config.set_non_profitable_to_zero;
        if config.grow_upward {
            lattice.grow_up(game, lattice.root, zero)?;
        }
        lattice.grow_down(game, lattice.root, zero)?;
        lattice.invalidate();

        let mut merged = 0;
        if config.merge_same_coalition {
            merged = lattice.merge_same_coalition();
        }
        if config.complete_missing_states {
            merged += lattice.complete_missing_states(game, zero)?;
        }

        debug!(
            root = %root_coalition,
            nodes = lattice.len(),
            merged,
            "built coalition lattice"
        );
        Ok(lattice)
    }

    /// Number of players in the game universe
    pub fn players(&self) -> usize {
        self.players
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &GameNode {
        &self.nodes[self.root.0]
    }

    pub fn node(&self, id: NodeId) -> &GameNode {
        &self.nodes[id.0]
    }

    /// Mutable access to a node's payoff; edges stay owned by the lattice
    pub fn payoff_mut(&mut self, id: NodeId) -> &mut Payoff {
        &mut self.nodes[id.0].payoff
    }

    /// Number of reachable states
    pub fn len(&self) -> usize {
        self.to_set().len()
    }

    pub fn is_empty(&self) -> bool {
        self.to_set().is_empty()
    }

    /// Reachable states in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &GameNode)> + '_ {
        self.to_set().iter().map(|&id| (id, &self.nodes[id.0]))
    }

    /// Every state reachable from the root, cached until the graph changes
    pub fn to_set(&self) -> &BTreeSet<NodeId> {
        self.node_set.get_or_init(|| {
            let mut all = self.to_set_down(self.root);
            all.extend(self.to_set_up(self.root));
            all
        })
    }

    /// `start` and every state below it
    pub fn to_set_down(&self, start: NodeId) -> BTreeSet<NodeId> {
        let mut found = self.closure(start, Direction::Down);
        found.insert(start);
        found
    }

    /// Every state above `start`, excluding `start` itself
    pub fn to_set_up(&self, start: NodeId) -> BTreeSet<NodeId> {
        self.closure(start, Direction::Up)
    }

    /// First state for `coalition`, looking below the root and then above it
    pub fn search(&self, coalition: &Coalition) -> Option<NodeId> {
        self.search_from(coalition, self.root)
    }

    pub fn search_from(&self, coalition: &Coalition, start: NodeId) -> Option<NodeId> {
        self.search_down(coalition, start)
            .or_else(|| self.search_up(coalition, start))
    }

    /// Depth-first search through sub-coalitions of `start`, skipping branches that cannot hold
    /// `coalition`
    pub fn search_down(&self, coalition: &Coalition, start: NodeId) -> Option<NodeId> {
        self.search_directed(coalition, start, Direction::Down)
    }

    /// Depth-first search through super-coalitions of `start`, skipping branches that cannot be
    /// held by `coalition`
    pub fn search_up(&self, coalition: &Coalition, start: NodeId) -> Option<NodeId> {
        self.search_directed(coalition, start, Direction::Up)
    }

    /// Every state for `coalition` in either direction from `start`
    pub fn find_all_nodes(&self, coalition: &Coalition, start: NodeId) -> BTreeSet<NodeId> {
        let mut found = self.find_all_nodes_down(coalition, start);
        found.extend(self.find_all_nodes_up(coalition, start));
        found
    }

    pub fn find_all_nodes_down(&self, coalition: &Coalition, start: NodeId) -> BTreeSet<NodeId> {
        self.find_all_directed(coalition, start, Direction::Down)
    }

    pub fn find_all_nodes_up(&self, coalition: &Coalition, start: NodeId) -> BTreeSet<NodeId> {
        self.find_all_directed(coalition, start, Direction::Up)
    }

    /// Collapse every group of states sharing a coalition into one node.
    ///
    /// The surviving node gets the arithmetic mean of the group's payoffs and the union of its
    /// edges; former neighbours are repointed at it. Returns how many nodes were dropped.
    pub fn merge_same_coalition(&mut self) -> usize {
        let mut groups: BTreeMap<Coalition, Vec<NodeId>> = BTreeMap::new();
        for &id in self.to_set() {
            groups.entry(self.nodes[id.0].coalition).or_default().push(id);
        }

        let merged: usize = groups.values().map(|ids| ids.len() - 1).sum();
        if merged == 0 {
            return 0;
        }

        // Survivors are the lowest id of each group, renumbered densely in id order
        let mut survivors: Vec<NodeId> = groups.values().map(|ids| ids[0]).collect();
        survivors.sort();
        let mut remap: Vec<Option<NodeId>> = vec![None; self.nodes.len()];
        for (new_index, survivor) in survivors.iter().enumerate() {
            for &member in &groups[&self.nodes[survivor.0].coalition] {
                remap[member.0] = Some(NodeId(new_index));
            }
        }
        let moved = |ids: &BTreeSet<NodeId>| -> BTreeSet<NodeId> {
            ids.iter().filter_map(|id| remap[id.0]).collect()
        };

        let mut nodes = Vec::with_capacity(survivors.len());
        for survivor in &survivors {
            let group = &groups[&self.nodes[survivor.0].coalition];
            let mut payoff = Payoff::zeros(self.players);
            let mut merged_node = GameNode::new(self.nodes[survivor.0].coalition, Payoff::default());
            for member in group {
                let node = &self.nodes[member.0];
                payoff += &node.payoff;
                merged_node.parents.extend(moved(&node.parents));
                merged_node.children.extend(moved(&node.children));
            }
            payoff *= 1.0 / group.len() as f64;
            merged_node.payoff = payoff;
            if group.len() > 1 {
                trace!(coalition = %merged_node.coalition, copies = group.len(), "merged states");
            }
            nodes.push(merged_node);
        }

        if let Some(root) = remap[self.root.0] {
            self.root = root;
        }
        self.nodes = nodes;
        self.invalidate();
        merged
    }

    /// Re-root at the topmost reachable coalition and grow every sub-coalition below it.
    ///
    /// Only adds states when the lattice was grown upward; the new states are merged with the
    /// existing ones. Returns how many nodes the merge dropped.
    pub fn complete_missing_states<G>(&mut self, game: &G, non_profitable_to_zero: bool) -> Result<usize>
    where
        G: CharacteristicFunction + ?Sized,
    {
        let mut top = self.root;
        while let Some(&parent) = self.nodes[top.0].parents.iter().next() {
            top = parent;
        }
        self.root = top;
        self.grow_down(game, top, non_profitable_to_zero)?;
        self.invalidate();
        Ok(self.merge_same_coalition())
    }

    /// Downward growth: every one-player-smaller coalition of `id` gets a state whose payoff is
    /// interpolated from the best state above it
    fn grow_down<G>(&mut self, game: &G, id: NodeId, non_profitable_to_zero: bool) -> Result<()>
    where
        G: CharacteristicFunction + ?Sized,
    {
        let coalition = self.nodes[id.0].coalition;
        if coalition.len() <= 1 {
            return Ok(());
        }

        for player in coalition.iter() {
            let sub = coalition.without(player);
            if self.search_down(&sub, id).is_some() {
                continue;
            }

            let raw = shapley(game, &sub)?;
            let value = raw.sum();

            let mut current = id;
            for ancestor in self.to_set_up(id) {
                if self.nodes[ancestor.0].loosely_dominates(&self.nodes[current.0]) {
                    current = ancestor;
                }
            }

            let best = &self.nodes[current.0];
            let missing = best.coalition.difference(&sub);
            let diff = value - (best.value() - best.payoff.sum_over(&missing));
            let payoff = if diff >= 0.0 {
                let mut payoff = &best.payoff + &(&raw.normalized() * diff);
                payoff.zero_out(&missing);
                payoff
            } else if non_profitable_to_zero {
                Payoff::zeros(self.players)
            } else {
                raw
            };
            trace!(%sub, from = %best.coalition, diff, %payoff, "grew state downward");

            let child = self.link(id, sub, payoff, Direction::Down);
            self.grow_down(game, child, non_profitable_to_zero)?;
        }
        Ok(())
    }

    /// Upward growth: every one-player-larger coalition of `id` gets a state that spreads the
    /// added worth over the players whose Shapley share grew
    fn grow_up<G>(&mut self, game: &G, id: NodeId, non_profitable_to_zero: bool) -> Result<()>
    where
        G: CharacteristicFunction + ?Sized,
    {
        let coalition = self.nodes[id.0].coalition;
        for player in game.grand_coalition().difference(&coalition).iter() {
            let sup = coalition.with(player);
            if self.search_up(&sup, id).is_some() {
                continue;
            }

            let raw = shapley(game, &sup)?;
            let node = &self.nodes[id.0];
            let diff = raw.sum() - node.value();
            let payoff = if diff >= 0.0 {
                let added = (&raw - &node.payoff).clamped_non_negative();
                &node.payoff + &(&added.normalized() * diff)
            } else if non_profitable_to_zero {
                Payoff::zeros(self.players)
            } else {
                raw
            };
            trace!(%sup, diff, %payoff, "grew state upward");

            let parent = self.link(id, sup, payoff, Direction::Up);
            self.grow_up(game, parent, non_profitable_to_zero)?;
        }
        Ok(())
    }

    /// Add a state next to `from`, below it or above it
    fn link(&mut self, from: NodeId, coalition: Coalition, payoff: Payoff, direction: Direction) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut node = GameNode::new(coalition, payoff);
        match direction {
            Direction::Down => {
                node.parents.insert(from);
                self.nodes[from.0].children.insert(id);
            }
            Direction::Up => {
                node.children.insert(from);
                self.nodes[from.0].parents.insert(id);
            }
        }
        self.nodes.push(node);
        id
    }

    fn invalidate(&mut self) {
        self.node_set.take();
    }

    fn neighbours(&self, id: NodeId, direction: Direction) -> &BTreeSet<NodeId> {
        match direction {
            Direction::Down => &self.nodes[id.0].children,
            Direction::Up => &self.nodes[id.0].parents,
        }
    }

    /// Whether states beyond `id` may still hold `target`
    fn may_reach(&self, id: NodeId, target: &Coalition, direction: Direction) -> bool {
        let coalition = &self.nodes[id.0].coalition;
        match direction {
            Direction::Down => target.is_subset(coalition),
            Direction::Up => coalition.is_subset(target),
        }
    }

    fn closure(&self, start: NodeId, direction: Direction) -> BTreeSet<NodeId> {
        let mut found = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            for &next in self.neighbours(id, direction) {
                if found.insert(next) {
                    stack.push(next);
                }
            }
        }
        found
    }

    fn search_directed(&self, target: &Coalition, start: NodeId, direction: Direction) -> Option<NodeId> {
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if self.nodes[id.0].coalition == *target {
                return Some(id);
            }
            stack.extend(
                self.neighbours(id, direction)
                    .iter()
                    .rev()
                    .filter(|&&next| self.may_reach(next, target, direction)),
            );
        }
        None
    }

    fn find_all_directed(&self, target: &Coalition, start: NodeId, direction: Direction) -> BTreeSet<NodeId> {
        let mut found = BTreeSet::new();
        let mut visited = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            if self.nodes[id.0].coalition == *target {
                found.insert(id);
            }
            stack.extend(
                self.neighbours(id, direction)
                    .iter()
                    .filter(|&&next| self.may_reach(next, target, direction)),
            );
        }
        found
    }
}

/// Same coalitions, and the same rounded payoff for every state
impl PartialEq for CoalitionLattice {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.nodes().all(|(_, state)| match other.search(&state.coalition) {
            Some(id) => other.node(id).payoff_map() == state.payoff_map(),
            None => false,
        })
    }
}

impl Display for CoalitionLattice {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut states: Vec<&GameNode> = self.nodes().map(|(_, node)| node).collect();
        states.sort_by_key(|node| (std::cmp::Reverse(node.coalition.len()), node.coalition));
        for state in states {
            writeln!(f, "{state}")?;
        }
        Ok(())
    }
}
