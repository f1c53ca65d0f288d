use crate::{
    error::{LatticeError, Result},
    game::CharacteristicFunction,
    payoff::Payoff,
    types::{Coalition, Value},
    utils::{factorial, next_permutation},
    validation::validate_coalition,
};
use std::collections::HashMap;
use tracing::trace;

/// Largest coalition for which join orders are enumerated exhaustively
pub const MAX_SHAPLEY_PLAYERS: usize = 12;

/// Exact Shapley allocation of `coalition` under `game`.
///
/// Validates the coalition first: it must be non-empty, only name players of the game, and be
/// small enough to enumerate every join order.
pub fn shapley<G>(game: &G, coalition: &Coalition) -> Result<Payoff>
where
    G: CharacteristicFunction + ?Sized,
{
    validate_coalition(coalition, game.players_amount())?;
    if coalition.len() > MAX_SHAPLEY_PLAYERS {
        return Err(LatticeError::TooManyPlayers {
            count: coalition.len(),
            limit: MAX_SHAPLEY_PLAYERS,
        });
    }

    let payoff = game.shapley_values(coalition);
    if !payoff.is_finite() {
        return Err(LatticeError::NonFiniteValue {
            coalition: *coalition,
        });
    }
    Ok(payoff)
}

/// Average marginal contribution of every member over all `|coalition|!` join orders.
///
/// No validation is done here; this is the default body of
/// [`CharacteristicFunction::shapley_values`].
pub fn exact_shapley_values<G>(game: &G, coalition: &Coalition) -> Payoff
where
    G: CharacteristicFunction + ?Sized,
{
    let width = coalition
        .max_player()
        .map_or(0, |p| p + 1)
        .max(game.players_amount());
    let mut payoff = Payoff::zeros(width);
    if coalition.is_empty() {
        return payoff;
    }

    // Every join order revisits the same sub-coalitions, so their worth is computed once
    let mut worth: HashMap<Coalition, Value> = HashMap::new();
    let mut value_of = |c: Coalition| *worth.entry(c).or_insert_with(|| game.value(&c));

    let mut order = coalition.to_vec();
    loop {
        let mut running = Coalition::EMPTY;
        let mut running_value = value_of(running);
        for &player in &order {
            let next = running.with(player);
            let next_value = value_of(next);
            payoff[player] += next_value - running_value;
            running = next;
            running_value = next_value;
        }
        if !next_permutation(&mut order) {
            break;
        }
    }

    let orderings = factorial(coalition.len());
    payoff *= 1.0 / orderings;
    trace!(%coalition, %payoff, "computed exact shapley values");
    payoff
}
