use crate::{
    error::{LatticeError, Result},
    payoff::Payoff,
    types::{Coalition, MAX_PLAYERS},
};

/// Validate a coalition against a game of `players` players
pub fn validate_coalition(coalition: &Coalition, players: usize) -> Result<()> {
    if players > MAX_PLAYERS {
        return Err(LatticeError::TooManyPlayers {
            count: players,
            limit: MAX_PLAYERS,
        });
    }
    let Some(highest) = coalition.max_player() else {
        return Err(LatticeError::EmptyCoalition);
    };
    if highest >= players {
        return Err(LatticeError::PlayerOutOfRange {
            player: highest,
            players,
        });
    }
    Ok(())
}

/// Validate a caller supplied payoff vector for a game of `players` players
pub fn validate_payoff(payoff: &Payoff, players: usize) -> Result<()> {
    if payoff.len() != players {
        return Err(LatticeError::PayoffLength {
            expected: players,
            actual: payoff.len(),
        });
    }
    Ok(())
}

/// Reject a sub-population larger than the population it is drawn from.
///
/// Meant for game implementations with a split population (e.g. left and right gloves).
pub fn validate_population(requested: usize, total: usize) -> Result<()> {
    if requested > total {
        return Err(LatticeError::InvalidPopulation { requested, total });
    }
    Ok(())
}

/// Builder-side check shared by the tolerance settings
pub(crate) fn validate_tolerance(name: &str, value: f64) -> std::result::Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{name} must be finite and non-negative, got {value}"));
    }
    Ok(())
}
