use crate::{
    lattice::LatticeConfigBuilderError, leverage::LeverageConfigBuilderError, types::Coalition,
};
use thiserror::Error;

/// Error types for coalition lattice construction and analysis
#[derive(Debug, Error)]
pub enum LatticeError {
    /// Shapley values and lattices need at least one player
    #[error("The coalition must contain at least one player.")]
    EmptyCoalition,

    /// Coalition names a player the game does not have
    #[error("Player {player} is out of range for a game with {players} players.")]
    PlayerOutOfRange { player: usize, players: usize },

    /// Too many players for exact enumeration
    #[error("There are too many players ({count}); the limit is {limit}.")]
    TooManyPlayers { count: usize, limit: usize },

    /// A requested sub-population exceeds the total population
    #[error("Requested {requested} players out of a population of only {total}.")]
    InvalidPopulation { requested: usize, total: usize },

    /// Supplied payoff vector does not cover the game universe
    #[error("Payoff vector has {actual} entries; expected one per player ({expected}).")]
    PayoffLength { expected: usize, actual: usize },

    /// Characteristic function produced NaN or infinity
    #[error("The characteristic function returned a non-finite value for {coalition}.")]
    NonFiniteValue { coalition: Coalition },

    #[error("Lattice configuration build error: {0}")]
    LatticeConfigBuild(#[from] LatticeConfigBuilderError),

    #[error("Leverage configuration build error: {0}")]
    LeverageConfigBuild(#[from] LeverageConfigBuilderError),
}

/// Result type alias for lattice operations
pub type Result<T> = std::result::Result<T, LatticeError>;
