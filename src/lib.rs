//! Coalition lattice analysis for cooperative games
//!
//! This library computes exact Shapley values of characteristic-function games, builds the
//! lattice of sub-coalitions below a reference coalition with an inferred payoff for every state,
//! finds the states that dominate the others, and simulates bargaining in which players use
//! credible threats to shift each state's allocation until it settles or starts repeating.

pub mod dominance;
pub mod error;
pub mod game;
pub mod lattice;
pub mod leverage;
pub mod node;
pub mod payoff;
pub mod shapley;
pub mod types;
pub mod utils;
pub mod validation;

// Re-export main types and functions
pub use dominance::Dominance;
pub use error::{LatticeError, Result};
pub use game::CharacteristicFunction;
pub use lattice::{CoalitionLattice, LatticeConfig, LatticeConfigBuilder};
pub use leverage::{Circulation, LeverageConfig, LeverageConfigBuilder, LeverageModel, Stability};
pub use node::{GameNode, NodeId};
pub use payoff::{Payoff, normalize};
pub use shapley::{MAX_SHAPLEY_PLAYERS, shapley};
pub use types::{Coalition, MAX_PLAYERS, Player, Value};
pub use utils::{ROUNDING_PRECISION, round_decimal, round_value};
