use crate::{
    payoff::Payoff,
    shapley::exact_shapley_values,
    types::{Coalition, Player, Value},
};

/// A cooperative game in characteristic-function form.
///
/// Implementors only supply the universe size and the worth of a coalition. `value` must be
/// total over every subset of the grand coalition (the empty one included, conventionally
/// worth 0), deterministic, and free of side effects.
pub trait CharacteristicFunction {
    /// Total number of players in the game's universe
    fn players_amount(&self) -> usize;

    /// Worth of `coalition`
    fn value(&self, coalition: &Coalition) -> Value;

    /// The set `{0, ..., players_amount - 1}`
    fn grand_coalition(&self) -> Coalition {
        Coalition::grand(self.players_amount())
    }

    /// `value(coalition ∪ {player}) - value(coalition \ {player})`
    fn added_value(&self, coalition: &Coalition, player: Player) -> Value {
        self.value(&coalition.with(player)) - self.value(&coalition.without(player))
    }

    /// Shapley allocation of `coalition`, one entry per player of the universe.
    ///
    /// Defaults to exhaustive enumeration of join orders. Games with a known closed form may
    /// override it, as long as the result stays efficient (sums to `value(coalition)`).
    fn shapley_values(&self, coalition: &Coalition) -> Payoff {
        exact_shapley_values(self, coalition)
    }
}

impl<G: CharacteristicFunction + ?Sized> CharacteristicFunction for &G {
    fn players_amount(&self) -> usize {
        (**self).players_amount()
    }

    fn value(&self, coalition: &Coalition) -> Value {
        (**self).value(coalition)
    }

    fn grand_coalition(&self) -> Coalition {
        (**self).grand_coalition()
    }

    fn added_value(&self, coalition: &Coalition, player: Player) -> Value {
        (**self).added_value(coalition, player)
    }

    fn shapley_values(&self, coalition: &Coalition) -> Payoff {
        (**self).shapley_values(coalition)
    }
}
