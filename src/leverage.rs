use crate::{
    error::Result,
    game::CharacteristicFunction,
    lattice::{CoalitionLattice, LatticeConfig},
    node::NodeId,
    payoff::Payoff,
    types::{Player, Value},
    validation::validate_tolerance,
};
use derive_builder::Builder;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, instrument, trace};

/// Tolerances of the threat model
#[derive(Debug, Clone, PartialEq, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct LeverageConfig {
    /// Subtracted from every raw threat before it counts
    #[builder(default)]
    pub leverage_epsilon: Value,
    /// Subtracted from the gain of every helper other than the threatening player
    #[builder(default)]
    pub threat_help_epsilon: Value,
    /// Added to the loss of every affected player other than the threatening player
    #[builder(default)]
    pub threat_enable_epsilon: Value,
}

impl LeverageConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        let tolerances = [
            ("leverage_epsilon", self.leverage_epsilon),
            ("threat_help_epsilon", self.threat_help_epsilon),
            ("threat_enable_epsilon", self.threat_enable_epsilon),
        ];
        for (name, value) in tolerances {
            if let Some(value) = value {
                validate_tolerance(name, value)?;
            }
        }
        Ok(())
    }
}

impl Default for LeverageConfig {
    fn default() -> Self {
        LeverageConfig {
            leverage_epsilon: 0.0,
            threat_help_epsilon: 0.0,
            threat_enable_epsilon: 0.0,
        }
    }
}

/// Outcome of [`LeverageModel::find_stable`]
#[derive(Debug, Clone)]
pub struct Stability {
    /// The fixed point, or the last model produced when none was found
    pub model: LeverageModel,
    /// Iteration at which the fixed point was reached
    pub iteration: Option<usize>,
}

impl Stability {
    pub fn is_stable(&self) -> bool {
        self.iteration.is_some()
    }
}

/// Outcome of [`LeverageModel::find_stable_circulation`]
#[derive(Debug, Clone)]
pub struct Circulation {
    /// The starting model followed by every distinct model produced
    pub models: Vec<LeverageModel>,
    /// `(iteration, earlier index)`: the model produced at `iteration` equals `models[earlier index]`
    pub repeat: Option<(usize, usize)>,
}

/// A coalition lattice plus the bargaining model played over it.
///
/// A player threatens an opponent by proposing a move to another state that does not hurt the
/// player, that the players needed for the move can be compensated for, and that leaves the
/// opponent worse off. Repeatedly settling those threats redistributes payoffs inside every state.
#[derive(Debug, Clone)]
pub struct LeverageModel {
    lattice: CoalitionLattice,
    config: LeverageConfig,
}

impl LeverageModel {
    pub fn new(lattice: CoalitionLattice, config: LeverageConfig) -> Self {
        LeverageModel { lattice, config }
    }

    pub fn build<G>(game: &G, lattice_config: &LatticeConfig, config: LeverageConfig) -> Result<Self>
    where
        G: CharacteristicFunction + ?Sized,
    {
        Ok(Self::new(CoalitionLattice::build(game, lattice_config)?, config))
    }

    pub fn lattice(&self) -> &CoalitionLattice {
        &self.lattice
    }

    pub fn into_lattice(self) -> CoalitionLattice {
        self.lattice
    }

    pub fn config(&self) -> &LeverageConfig {
        &self.config
    }

    /// Collective loss of the players affected by moving from `state` to `new_state`, the
    /// opponent excluded. `player` has to make up for it to make the move.
    pub fn sum_of_losses(&self, state: NodeId, new_state: NodeId, player: Player, opponent: Player) -> Value {
        let (from, to) = (self.lattice.node(state), self.lattice.node(new_state));
        to.coalition
            .intersection(&from.coalition)
            .without(opponent)
            .iter()
            .map(|x| {
                let tolerance = if x != player { self.config.threat_enable_epsilon } else { 0.0 };
                (from.payoff.get(x) - to.payoff.get(x) + tolerance).max(0.0)
            })
            .sum()
    }

    /// Collective gain of the members of `new_state` (the opponent excluded) available to
    /// compensate the losers of the move
    pub fn sum_of_gains(&self, state: NodeId, new_state: NodeId, player: Player, opponent: Player) -> Value {
        let (from, to) = (self.lattice.node(state), self.lattice.node(new_state));
        to.coalition
            .without(opponent)
            .iter()
            .map(|x| {
                let tolerance = if x != player { self.config.threat_help_epsilon } else { 0.0 };
                (to.payoff.get(x) - from.payoff.get(x) - tolerance).max(0.0)
            })
            .sum()
    }

    /// Keep the candidates whose losers can be compensated by the winners
    pub fn filter_incredible_states<I>(&self, state: NodeId, player: Player, opponent: Player, candidates: I) -> BTreeSet<NodeId>
    where
        I: IntoIterator<Item = NodeId>,
    {
        candidates
            .into_iter()
            .filter(|&new_state| new_state != state)
            .filter(|&new_state| {
                self.sum_of_losses(state, new_state, player, opponent)
                    <= self.sum_of_gains(state, new_state, player, opponent)
            })
            .collect()
    }

    /// States `player` can credibly threaten to move to, ignoring counter threats
    pub fn credible_passable_states(&self, state: NodeId, player: Player, opponent: Player) -> BTreeSet<NodeId> {
        let current = self.lattice.node(state).payoff.get(player);
        let with_player = self
            .lattice
            .nodes()
            .filter(|(_, node)| node.coalition.contains(player) && node.payoff.get(player) >= current)
            .map(|(id, _)| id);
        self.filter_incredible_states(state, player, opponent, with_player)
    }

    /// Credible threats of `player` against `opponent` in `state`, each capped by the opponent's
    /// best counter threat
    pub fn threat_states(&self, state: NodeId, player: Player, opponent: Player) -> Vec<(NodeId, Value)> {
        let standing = self.lattice.node(state).payoff.get(opponent);
        let without_player: Vec<NodeId> = self
            .lattice
            .nodes()
            .filter(|(_, node)| node.coalition.contains(opponent) && !node.coalition.contains(player))
            .map(|(id, _)| id)
            .collect();

        let mut threats = Vec::new();
        for target in self.credible_passable_states(state, player, opponent) {
            let target_payoff = self.lattice.node(target).payoff.get(opponent);
            let initial = standing - target_payoff - self.config.leverage_epsilon;
            if initial <= 0.0 {
                continue;
            }

            let mut threat = initial;
            let counters =
                self.filter_incredible_states(target, opponent, player, without_player.iter().copied());
            for counter in counters {
                let accumulated = self.sum_of_losses(target, counter, opponent, player);
                // What the opponent keeps after compensating everyone it needs for the counter move
                let margin = (self.lattice.node(counter).payoff.get(opponent) - target_payoff - accumulated).max(0.0);
                threat = threat.min(initial - margin);
                if threat <= 0.0 {
                    break;
                }
            }
            if threat > 0.0 {
                trace!(%state, %target, player, opponent, threat, "credible threat");
                threats.push((target, threat));
            }
        }
        threats
    }

    /// Threat values of `player` against `opponent`, ascending. Empty when `state` is already the
    /// best `player` can reach relative to `opponent`.
    pub fn leverages(&self, state: NodeId, player: Player, opponent: Player) -> Vec<Value> {
        let mut values: Vec<Value> = self
            .threat_states(state, player, opponent)
            .into_iter()
            .map(|(_, threat)| threat)
            .collect();
        values.sort_by(|a, b| a.total_cmp(b));
        values
    }

    /// Concessions owed inside `state`: for every member, a payoff-shaped vector whose entry `q`
    /// is what that member has to concede to opponent `q`
    pub fn leverage_vector(&self, state: NodeId) -> BTreeMap<Player, Payoff> {
        let players = self.lattice.players();
        let members = self.lattice.node(state).coalition.to_vec();
        let mut owed: BTreeMap<Player, Payoff> = members.iter().map(|&p| (p, Payoff::zeros(players))).collect();

        for (index, &p1) in members.iter().enumerate() {
            for &p2 in &members[index + 1..] {
                let p1_leverage = self.leverages(state, p1, p2);
                let p2_leverage = self.leverages(state, p2, p1);
                let (p1_gets, p2_gets) = match (p1_leverage.first(), p2_leverage.first()) {
                    (None, None) => (0.0, 0.0),
                    (Some(&l1), None) => (l1, 0.0),
                    (None, Some(&l2)) => (0.0, l2),
                    (Some(&l1), Some(&l2)) => handle_double_leverage(l1, l2),
                };
                if let Some(vector) = owed.get_mut(&p2) {
                    vector[p1] = p1_gets;
                }
                if let Some(vector) = owed.get_mut(&p1) {
                    vector[p2] = p2_gets;
                }
            }
        }
        owed
    }

    /// One bargaining round over every state with more than one member.
    ///
    /// Each member pays the largest concession it owes, split among its creditors in proportion
    /// to their claims. Works on a copy; `self` is left untouched.
    #[instrument(skip_all, fields(states = self.lattice.len()))]
    pub fn evaluate_leverage(&self) -> Self {
        let mut next = self.clone();
        for (id, state) in self.lattice.nodes() {
            if state.coalition.len() <= 1 {
                continue;
            }
            let owed = self.leverage_vector(id);
            let payoff = next.lattice.payoff_mut(id);
            for (player, concessions) in owed {
                let max_pay = concessions.max();
                if max_pay <= 0.0 {
                    continue;
                }
                *payoff += &(&concessions.normalized() * max_pay);
                payoff[player] -= max_pay;
            }
        }
        next
    }

    /// Apply [`Self::evaluate_leverage`] until a round reproduces its input, at most `max_iter` times
    #[instrument(skip_all, fields(max_iter = max_iter))]
    pub fn find_stable(&self, max_iter: usize) -> Stability {
        let mut current = self.clone();
        for iteration in 0..max_iter {
            let next = current.evaluate_leverage();
            if next == current {
                debug!(iteration, "found stable state");
                return Stability {
                    model: next,
                    iteration: Some(iteration),
                };
            }
            current = next;
        }
        debug!("no stable state found");
        Stability {
            model: current,
            iteration: None,
        }
    }

    /// Like [`Self::find_stable`], but a round reproducing any earlier model also stops the
    /// search, which catches oscillations as well as fixed points
    #[instrument(skip_all, fields(max_iter = max_iter))]
    pub fn find_stable_circulation(&self, max_iter: usize) -> Circulation {
        let mut models = vec![self.clone()];
        for iteration in 0..max_iter {
            let Some(last) = models.last() else {
                break;
            };
            let next = last.evaluate_leverage();
            if let Some(earlier) = models.iter().position(|model| *model == next) {
                debug!(iteration, earlier, "found circulation");
                return Circulation {
                    models,
                    repeat: Some((iteration, earlier)),
                };
            }
            models.push(next);
        }
        debug!(models = models.len(), "no circulation found");
        Circulation {
            models,
            repeat: None,
        }
    }

    /// Mean payoff of every state over the models of [`Self::find_stable_circulation`]
    pub fn average_stable_tree(&self, max_iter: usize) -> Self {
        let Circulation { models, .. } = self.find_stable_circulation(max_iter);
        average(models).unwrap_or_else(|| self.clone())
    }

    /// Mean payoff of every state over this model and the next `iterations` rounds
    pub fn average_tree(&self, iterations: usize) -> Self {
        let mut models = Vec::with_capacity(iterations + 1);
        models.push(self.clone());
        for _ in 0..iterations {
            if let Some(last) = models.last() {
                let next = last.evaluate_leverage();
                models.push(next);
            }
        }
        average(models).unwrap_or_else(|| self.clone())
    }
}

/// Same coalitions and rounded payoffs, tolerances are not compared
impl PartialEq for LeverageModel {
    fn eq(&self, other: &Self) -> bool {
        self.lattice == other.lattice
    }
}

/// Both players threaten each other: the larger minimal threat wins the difference
fn handle_double_leverage(p1_leverage: Value, p2_leverage: Value) -> (Value, Value) {
    (
        (p1_leverage - p2_leverage).max(0.0),
        (p2_leverage - p1_leverage).max(0.0),
    )
}

fn average(mut models: Vec<LeverageModel>) -> Option<LeverageModel> {
    let mut base = models.pop()?;
    let count = models.len() + 1;
    for model in &models {
        for (_, state) in model.lattice.nodes() {
            if let Some(id) = base.lattice.search(&state.coalition) {
                *base.lattice.payoff_mut(id) += &state.payoff;
            }
        }
    }
    let ids: Vec<NodeId> = base.lattice.to_set().iter().copied().collect();
    for id in ids {
        *base.lattice.payoff_mut(id) *= 1.0 / count as f64;
    }
    Some(base)
}
