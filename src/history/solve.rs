//! Solve records and their identity atoms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::caps::{Clock, IdGenerator};
use crate::cube::{MoveSequence, TimedMoveSequence};
use crate::phase::{
    generate_detailed_split_times, generate_split_times, DetailedSplitTimes, SplitTimes,
};

/// Opaque solve identifier, produced by the injected id generator.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SolveId(String);

impl SolveId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SolveId({:?})", self.0)
    }
}

impl fmt::Display for SolveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque session identifier.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({:?})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Event type of a session's solves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum SolveType {
    Standard3x3x3 = 0,
    OneHanded3x3x3 = 1,
    Blindfolded3x3x3 = 2,
    Standard2x2x2 = 3,
    Standard4x4x4 = 4,
    Blindfolded4x4x4 = 5,
    Standard5x5x5 = 6,
    Blindfolded5x5x5 = 7,
}

impl SolveType {
    pub const ALL: [SolveType; 8] = [
        SolveType::Standard3x3x3,
        SolveType::OneHanded3x3x3,
        SolveType::Blindfolded3x3x3,
        SolveType::Standard2x2x2,
        SolveType::Standard4x4x4,
        SolveType::Blindfolded4x4x4,
        SolveType::Standard5x5x5,
        SolveType::Blindfolded5x5x5,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SolveType::Standard3x3x3 => "3x3x3",
            SolveType::OneHanded3x3x3 => "3x3x3 One Handed",
            SolveType::Blindfolded3x3x3 => "3x3x3 Blindfolded",
            SolveType::Standard2x2x2 => "2x2x2",
            SolveType::Standard4x4x4 => "4x4x4",
            SolveType::Blindfolded4x4x4 => "4x4x4 Blindfolded",
            SolveType::Standard5x5x5 => "5x5x5",
            SolveType::Blindfolded5x5x5 => "5x5x5 Blindfolded",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Compact wire representation (also the enum discriminant).
    pub(crate) fn wire(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_wire(raw: u8) -> Option<Self> {
        Self::ALL.get(raw as usize).copied()
    }
}

/// Per-entity synchronization record: a fresh id and date on every local
/// change, plus an opaque token owned by a future reconciliation layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStamp {
    pub id: String,
    /// Seconds since the Unix epoch.
    pub date: u64,
    pub sync: String,
}

impl SyncStamp {
    /// Stamp a local mutation: fresh id, current date, token untouched.
    pub(crate) fn bump(&mut self, id_gen: &dyn IdGenerator, clock: &dyn Clock) {
        self.id = id_gen.generate_id();
        self.date = clock.now_secs();
    }
}

/// A completed solve attempt. Immutable once recorded, apart from re-analysis
/// of its split times and persistence bookkeeping.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Solve {
    pub id: SolveId,
    pub scramble: MoveSequence,
    /// Creation time, seconds since the Unix epoch.
    pub created: u64,
    /// False marks a DNF.
    pub ok: bool,
    pub time_ms: u32,
    pub penalty_ms: u32,
    /// Identifier of the device that produced the move stream, if any.
    pub device: String,
    pub moves: TimedMoveSequence,
    pub splits: SplitTimes,
    pub update: SyncStamp,
    /// True when the persisted copy is stale.
    pub dirty: bool,
}

impl Solve {
    /// Recorded time, or `None` for a DNF.
    pub fn final_time(&self) -> Option<u32> {
        self.ok.then_some(self.time_ms)
    }

    /// Re-derive the coarse split times from the stored move stream.
    pub fn generate_split_times_from_moves(&mut self) {
        self.splits = generate_split_times(&self.scramble, &self.moves);
    }

    /// Full per-phase breakdown with move-efficiency metrics.
    pub fn detailed_split_times(&self) -> DetailedSplitTimes {
        generate_detailed_split_times(&self.scramble, &self.moves, self.time_ms, self.penalty_ms)
    }
}
