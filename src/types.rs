use crate::error::{LatticeError, Result};
use std::fmt::{Display, Formatter};

/// Player identifier, dense over `[0, players_amount)`
pub type Player = usize;

/// Worth of a coalition or a single payoff entry
pub type Value = f64;

/// Most players a [`Coalition`] can hold
pub const MAX_PLAYERS: usize = 64;

/// A set of players stored as a bitmap, bit `p` set when player `p` is a member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coalition(u64);

impl Coalition {
    pub const EMPTY: Coalition = Coalition(0);

    /// The coalition `{0, ..., players - 1}`
    pub fn grand(players: usize) -> Self {
        match players {
            0 => Self::EMPTY,
            n if n >= MAX_PLAYERS => Coalition(u64::MAX),
            n => Coalition((1u64 << n) - 1),
        }
    }

    pub fn singleton(player: Player) -> Self {
        Self::EMPTY.with(player)
    }

    pub fn from_bits(bits: u64) -> Self {
        Coalition(bits)
    }

    /// Coalition of `players`, rejecting ids that do not fit in the bitmap
    pub fn try_from_players<I>(players: I) -> Result<Self>
    where
        I: IntoIterator<Item = Player>,
    {
        players
            .into_iter()
            .try_fold(Coalition::EMPTY, |coalition, player| coalition.try_with(player))
    }

    pub fn try_with(&self, player: Player) -> Result<Self> {
        if player >= MAX_PLAYERS {
            return Err(LatticeError::PlayerOutOfRange {
                player,
                players: MAX_PLAYERS,
            });
        }
        Ok(Coalition(self.0 | (1u64 << player)))
    }

    pub fn bits(&self) -> u64 {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn contains(&self, player: Player) -> bool {
        player < MAX_PLAYERS && (self.0 >> player) & 1 == 1
    }

    /// Copy of this coalition with `player` added.
    ///
    /// # Panics
    ///
    /// Panics if `player >= MAX_PLAYERS`; use [`Coalition::try_with`] for ids that may be out of range.
    pub fn with(&self, player: Player) -> Self {
        assert!(
            player < MAX_PLAYERS,
            "player {player} does not fit in a coalition of at most {MAX_PLAYERS} players"
        );
        Coalition(self.0 | (1u64 << player))
    }

    /// Copy of this coalition with `player` removed
    pub fn without(&self, player: Player) -> Self {
        if player >= MAX_PLAYERS {
            return *self;
        }
        Coalition(self.0 & !(1u64 << player))
    }

    pub fn insert(&mut self, player: Player) {
        *self = self.with(player);
    }

    pub fn union(&self, other: &Coalition) -> Self {
        Coalition(self.0 | other.0)
    }

    pub fn intersection(&self, other: &Coalition) -> Self {
        Coalition(self.0 & other.0)
    }

    pub fn difference(&self, other: &Coalition) -> Self {
        Coalition(self.0 & !other.0)
    }

    pub fn is_subset(&self, other: &Coalition) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_superset(&self, other: &Coalition) -> bool {
        other.is_subset(self)
    }

    pub fn intersects(&self, other: &Coalition) -> bool {
        self.0 & other.0 != 0
    }

    /// Highest player id in the coalition, if any
    pub fn max_player(&self) -> Option<Player> {
        match self.0 {
            0 => None,
            bits => Some(63 - bits.leading_zeros() as usize),
        }
    }

    /// Members in ascending order
    pub fn iter(&self) -> impl Iterator<Item = Player> + '_ {
        let bits = self.0;
        (0..MAX_PLAYERS).filter(move |p| (bits >> p) & 1 == 1)
    }

    pub fn to_vec(&self) -> Vec<Player> {
        self.iter().collect()
    }
}

impl FromIterator<Player> for Coalition {
    fn from_iter<I: IntoIterator<Item = Player>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Coalition::EMPTY, |coalition, player| coalition.with(player))
    }
}

impl<const N: usize> From<[Player; N]> for Coalition {
    fn from(players: [Player; N]) -> Self {
        players.into_iter().collect()
    }
}

impl Display for Coalition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let members: Vec<String> = self.iter().map(|p| p.to_string()).collect();
        write!(f, "{{{}}}", members.join(", "))
    }
}
