#![allow(dead_code)]

use coalition_leverage::{
    CharacteristicFunction, Coalition, Payoff, Result, Value, validation::validate_population,
};

/// Winning when the coalition holds a left glove and a right glove
pub struct GlovesGame {
    players: usize,
    left: Coalition,
    right: Coalition,
}

impl GlovesGame {
    pub fn new(players: usize, left_amount: usize) -> Result<Self> {
        validate_population(left_amount, players)?;
        let left = Coalition::grand(left_amount);
        Ok(GlovesGame {
            players,
            left,
            right: Coalition::grand(players).difference(&left),
        })
    }
}

impl CharacteristicFunction for GlovesGame {
    fn players_amount(&self) -> usize {
        self.players
    }

    fn value(&self, coalition: &Coalition) -> Value {
        if coalition.intersects(&self.left) && coalition.intersects(&self.right) {
            1.0
        } else {
            0.0
        }
    }
}

/// Worth the number of complete left/right pairs
pub struct ShoesGame {
    players: usize,
    left: Coalition,
    right: Coalition,
}

impl ShoesGame {
    pub fn new(players: usize, left_amount: usize) -> Result<Self> {
        validate_population(left_amount, players)?;
        let left = Coalition::grand(left_amount);
        Ok(ShoesGame {
            players,
            left,
            right: Coalition::grand(players).difference(&left),
        })
    }
}

impl CharacteristicFunction for ShoesGame {
    fn players_amount(&self) -> usize {
        self.players
    }

    fn value(&self, coalition: &Coalition) -> Value {
        let left = coalition.intersection(&self.left).len();
        let right = coalition.intersection(&self.right).len();
        left.min(right) as f64
    }
}

/// Consecutive players form stages; a coalition produces 1 when it staffs every stage
pub struct PipelineGame {
    players: usize,
    stages: Vec<Coalition>,
}

impl PipelineGame {
    pub fn new(stage_sizes: &[usize]) -> Self {
        let mut stages = Vec::with_capacity(stage_sizes.len());
        let mut next = 0;
        for &size in stage_sizes {
            stages.push((next..next + size).collect());
            next += size;
        }
        PipelineGame {
            players: next,
            stages,
        }
    }
}

impl CharacteristicFunction for PipelineGame {
    fn players_amount(&self) -> usize {
        self.players
    }

    fn value(&self, coalition: &Coalition) -> Value {
        if self.stages.iter().all(|stage| stage.intersects(coalition)) {
            1.0
        } else {
            0.0
        }
    }
}

/// Each player brings cookies; larger coalitions bake more efficiently
pub struct CookieGame {
    cookies: Vec<Value>,
    value_factor: Value,
}

impl CookieGame {
    pub fn new(cookies: Vec<Value>, value_factor: Value) -> Self {
        CookieGame {
            cookies,
            value_factor,
        }
    }
}

impl CharacteristicFunction for CookieGame {
    fn players_amount(&self) -> usize {
        self.cookies.len()
    }

    fn value(&self, coalition: &Coalition) -> Value {
        let base: Value = coalition.iter().map(|p| self.cookies[p]).sum();
        (base * self.value_factor.powi(coalition.len() as i32)).round_ties_even()
    }
}

/// Player 0 is the boss; every worker hired adds 1. Without the boss, workers earn
/// `unemployment` each.
pub struct BossGame {
    workers: usize,
    unemployment: Value,
}

impl BossGame {
    pub fn new(workers: usize) -> Self {
        BossGame {
            workers,
            unemployment: 0.0,
        }
    }

    pub fn with_unemployment(workers: usize) -> Self {
        BossGame {
            workers,
            unemployment: 1.0 / 8.0,
        }
    }
}

impl CharacteristicFunction for BossGame {
    fn players_amount(&self) -> usize {
        self.workers + 1
    }

    fn value(&self, coalition: &Coalition) -> Value {
        if coalition.contains(0) {
            (coalition.len() - 1) as f64
        } else {
            coalition.len() as f64 * self.unemployment
        }
    }
}

/// Worth 1 once at least `quota` players join
pub struct MajorityGame {
    players: usize,
    quota: usize,
}

impl MajorityGame {
    pub fn new(players: usize, quota: usize) -> Self {
        MajorityGame { players, quota }
    }
}

impl CharacteristicFunction for MajorityGame {
    fn players_amount(&self) -> usize {
        self.players
    }

    fn value(&self, coalition: &Coalition) -> Value {
        if coalition.len() >= self.quota { 1.0 } else { 0.0 }
    }
}

/// Additive game that supplies its own closed-form Shapley value
pub struct WeightsGame {
    weights: Vec<Value>,
}

impl WeightsGame {
    pub fn new(weights: Vec<Value>) -> Self {
        WeightsGame { weights }
    }
}

impl CharacteristicFunction for WeightsGame {
    fn players_amount(&self) -> usize {
        self.weights.len()
    }

    fn value(&self, coalition: &Coalition) -> Value {
        coalition.iter().map(|p| self.weights[p]).sum()
    }

    fn shapley_values(&self, coalition: &Coalition) -> Payoff {
        let mut payoff = Payoff::zeros(self.weights.len());
        for p in coalition.iter() {
            payoff[p] = self.weights[p];
        }
        payoff
    }
}

/// Game given by an arbitrary closure over coalitions
pub struct FnGame<F> {
    players: usize,
    value: F,
}

impl<F: Fn(&Coalition) -> Value> FnGame<F> {
    pub fn new(players: usize, value: F) -> Self {
        FnGame { players, value }
    }
}

impl<F: Fn(&Coalition) -> Value> CharacteristicFunction for FnGame<F> {
    fn players_amount(&self) -> usize {
        self.players
    }

    fn value(&self, coalition: &Coalition) -> Value {
        (self.value)(coalition)
    }
}

pub fn assert_close(actual: f64, expected: f64, context: &str) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "{context}: expected {expected}, got {actual}"
    );
}

/// Every non-empty sub-coalition of `coalition`
pub fn sub_coalitions(coalition: Coalition) -> impl Iterator<Item = Coalition> {
    let bits = coalition.bits();
    (1..=bits)
        .filter(move |candidate| candidate & !bits == 0)
        .map(Coalition::from_bits)
}
