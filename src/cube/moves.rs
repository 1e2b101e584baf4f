//! Outer-turn alphabet and move sequences.
//!
//! Eighteen moves: a quarter turn, inverse quarter turn, and half turn of
//! each outer face. The discriminant order is the wire order used by the
//! record codec and must not change.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid move input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MoveError {
    #[error("move byte {raw} is outside the move alphabet")]
    InvalidIndex { raw: u8 },
    #[error("`{raw}` is not a cube move")]
    UnknownMove { raw: String },
}

/// An outer face of the cube, named from the solver's perspective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Face {
    U,
    D,
    L,
    R,
    F,
    B,
}

/// A single outer turn in standard notation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    U,
    UPrime,
    U2,
    D,
    DPrime,
    D2,
    L,
    LPrime,
    L2,
    R,
    RPrime,
    R2,
    F,
    FPrime,
    F2,
    B,
    BPrime,
    B2,
}

impl Move {
    pub const ALL: [Move; 18] = [
        Move::U,
        Move::UPrime,
        Move::U2,
        Move::D,
        Move::DPrime,
        Move::D2,
        Move::L,
        Move::LPrime,
        Move::L2,
        Move::R,
        Move::RPrime,
        Move::R2,
        Move::F,
        Move::FPrime,
        Move::F2,
        Move::B,
        Move::BPrime,
        Move::B2,
    ];

    /// Compact wire representation (also the enum discriminant).
    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn from_index(raw: u8) -> Result<Self, MoveError> {
        Self::ALL
            .get(raw as usize)
            .copied()
            .ok_or(MoveError::InvalidIndex { raw })
    }

    pub fn face(self) -> Face {
        match self {
            Move::U | Move::UPrime | Move::U2 => Face::U,
            Move::D | Move::DPrime | Move::D2 => Face::D,
            Move::L | Move::LPrime | Move::L2 => Face::L,
            Move::R | Move::RPrime | Move::R2 => Face::R,
            Move::F | Move::FPrime | Move::F2 => Face::F,
            Move::B | Move::BPrime | Move::B2 => Face::B,
        }
    }

    pub fn is_counterclockwise(self) -> bool {
        self.index() % 3 == 1
    }

    pub fn is_double(self) -> bool {
        self.index() % 3 == 2
    }

    pub fn from_face(face: Face, counterclockwise: bool, double: bool) -> Self {
        let offset = if double {
            2
        } else if counterclockwise {
            1
        } else {
            0
        };
        Self::ALL[(face as usize) * 3 + offset]
    }

    pub fn inverse(self) -> Self {
        if self.is_double() {
            self
        } else {
            Self::from_face(self.face(), !self.is_counterclockwise(), false)
        }
    }

    /// Two moves belong to the same outer block iff they turn the same face,
    /// regardless of direction or half-turn.
    pub fn same_outer_block(a: Move, b: Move) -> bool {
        a.face() == b.face()
    }

    fn notation(self) -> &'static str {
        match self {
            Move::U => "U",
            Move::UPrime => "U'",
            Move::U2 => "U2",
            Move::D => "D",
            Move::DPrime => "D'",
            Move::D2 => "D2",
            Move::L => "L",
            Move::LPrime => "L'",
            Move::L2 => "L2",
            Move::R => "R",
            Move::RPrime => "R'",
            Move::R2 => "R2",
            Move::F => "F",
            Move::FPrime => "F'",
            Move::F2 => "F2",
            Move::B => "B",
            Move::BPrime => "B'",
            Move::B2 => "B2",
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.notation())
    }
}

impl FromStr for Move {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|mv| mv.notation() == s)
            .ok_or_else(|| MoveError::UnknownMove { raw: s.to_string() })
    }
}

/// An ordered list of moves (a scramble or a solution fragment).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoveSequence(Vec<Move>);

impl MoveSequence {
    pub fn new(moves: Vec<Move>) -> Self {
        Self(moves)
    }

    pub fn moves(&self) -> &[Move] {
        &self.0
    }

    pub fn push(&mut self, mv: Move) {
        self.0.push(mv);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Move> + '_ {
        self.0.iter().copied()
    }

    /// Number of outer turns, counting each maximal run of same-face moves
    /// once. A half turn counts as one move.
    pub fn outer_turn_count(&self) -> usize {
        let mut count = 0;
        let mut last: Option<Move> = None;
        for mv in self.iter() {
            if !last.is_some_and(|prev| Move::same_outer_block(prev, mv)) {
                count += 1;
            }
            last = Some(mv);
        }
        count
    }

    /// The sequence that undoes this one.
    pub fn inverse(&self) -> Self {
        Self(self.0.iter().rev().map(|mv| mv.inverse()).collect())
    }
}

impl From<Vec<Move>> for MoveSequence {
    fn from(moves: Vec<Move>) -> Self {
        Self(moves)
    }
}

impl FromIterator<Move> for MoveSequence {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for MoveSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, mv) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{mv}")?;
        }
        Ok(())
    }
}

impl FromStr for MoveSequence {
    type Err = MoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_whitespace().map(Move::from_str).collect()
    }
}

/// A move paired with its timestamp in milliseconds from solve start.
///
/// Timestamps are monotone non-decreasing within a solve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedMove {
    pub mv: Move,
    pub at_ms: u32,
}

impl TimedMove {
    pub fn new(mv: Move, at_ms: u32) -> Self {
        Self { mv, at_ms }
    }
}

/// The full timed move stream of a solve.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimedMoveSequence(Vec<TimedMove>);

impl TimedMoveSequence {
    pub fn new(moves: Vec<TimedMove>) -> Self {
        Self(moves)
    }

    pub fn moves(&self) -> &[TimedMove] {
        &self.0
    }

    pub fn push(&mut self, mv: TimedMove) {
        self.0.push(mv);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Outer-turn count of the underlying move stream.
    pub fn outer_turn_count(&self) -> usize {
        self.to_move_sequence().outer_turn_count()
    }

    pub fn to_move_sequence(&self) -> MoveSequence {
        self.0.iter().map(|tm| tm.mv).collect()
    }
}

impl From<Vec<TimedMove>> for TimedMoveSequence {
    fn from(moves: Vec<TimedMove>) -> Self {
        Self(moves)
    }
}
