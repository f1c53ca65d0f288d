use crate::{
    types::{Coalition, Player, Value},
    utils::round_value,
};
use rust_decimal::Decimal;
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
    ops::{Add, AddAssign, Index, IndexMut, Mul, MulAssign, Sub},
};

/// Per-player allocation, indexed by player id over the whole game universe.
/// Entries for players outside the owning coalition are conventionally zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payoff(Vec<Value>);

impl Payoff {
    pub fn zeros(players: usize) -> Self {
        Payoff(vec![0.0; players])
    }

    pub fn from_vec(values: Vec<Value>) -> Self {
        Payoff(values)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[Value] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.0
    }

    /// Entry for `player`, zero when the player is outside the vector
    pub fn get(&self, player: Player) -> Value {
        self.0.get(player).copied().unwrap_or(0.0)
    }

    pub fn sum(&self) -> Value {
        self.0.iter().sum()
    }

    /// Sum of the entries belonging to `coalition`
    pub fn sum_over(&self, coalition: &Coalition) -> Value {
        coalition.iter().map(|p| self.get(p)).sum()
    }

    pub fn max(&self) -> Value {
        self.0.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    /// Scale so the entries sum to 1, unchanged when they sum to 0
    pub fn normalized(&self) -> Payoff {
        let total = self.sum();
        if total == 0.0 {
            return self.clone();
        }
        Payoff(self.0.iter().map(|v| v / total).collect())
    }

    /// Elementwise `max(v, 0)`
    pub fn clamped_non_negative(&self) -> Payoff {
        Payoff(self.0.iter().map(|v| v.max(0.0)).collect())
    }

    pub fn zero_out(&mut self, coalition: &Coalition) {
        for player in coalition.iter() {
            if let Some(entry) = self.0.get_mut(player) {
                *entry = 0.0;
            }
        }
    }

    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|v| v.is_finite())
    }

    pub fn rounded(&self, player: Player) -> Decimal {
        round_value(self.get(player))
    }

    /// Rounded entries of the members of `coalition`
    pub fn rounded_over(&self, coalition: &Coalition) -> BTreeMap<Player, Decimal> {
        coalition.iter().map(|p| (p, self.rounded(p))).collect()
    }
}

/// Scale so the entries sum to 1, or return the payoff unchanged if the sum is 0
pub fn normalize(payoff: &Payoff) -> Payoff {
    payoff.normalized()
}

impl Index<Player> for Payoff {
    type Output = Value;

    fn index(&self, player: Player) -> &Value {
        &self.0[player]
    }
}

impl IndexMut<Player> for Payoff {
    fn index_mut(&mut self, player: Player) -> &mut Value {
        &mut self.0[player]
    }
}

impl AddAssign<&Payoff> for Payoff {
    fn add_assign(&mut self, other: &Payoff) {
        if self.0.len() < other.0.len() {
            self.0.resize(other.0.len(), 0.0);
        }
        for (lhs, rhs) in self.0.iter_mut().zip(&other.0) {
            *lhs += rhs;
        }
    }
}

impl Add<&Payoff> for &Payoff {
    type Output = Payoff;

    fn add(self, other: &Payoff) -> Payoff {
        let mut sum = self.clone();
        sum += other;
        sum
    }
}

impl Sub<&Payoff> for &Payoff {
    type Output = Payoff;

    fn sub(self, other: &Payoff) -> Payoff {
        let len = self.0.len().max(other.0.len());
        Payoff((0..len).map(|p| self.get(p) - other.get(p)).collect())
    }
}

impl MulAssign<Value> for Payoff {
    fn mul_assign(&mut self, factor: Value) {
        for entry in &mut self.0 {
            *entry *= factor;
        }
    }
}

impl Mul<Value> for &Payoff {
    type Output = Payoff;

    fn mul(self, factor: Value) -> Payoff {
        Payoff(self.0.iter().map(|v| v * factor).collect())
    }
}

impl Display for Payoff {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let entries: Vec<String> = self.0.iter().map(|v| format!("{v:.2}")).collect();
        write!(f, "[{}]", entries.join(", "))
    }
}
