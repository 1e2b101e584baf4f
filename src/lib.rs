#![forbid(unsafe_code)]

pub mod caps;
pub mod cube;
pub mod error;
pub mod history;
pub mod phase;
pub mod store;

pub use error::Error;
pub type Result<T> = std::result::Result<T, Error>;

// Re-export core types at crate root for convenience
pub use caps::{Clock, IdGenerator, ScrambleProvider, SystemClock, UuidIdGenerator};
pub use cube::{
    Color, Cube3x3, Cube3x3Faces, CubeFace, Face, Move, MoveError, MoveSequence, TimedMove,
    TimedMoveSequence,
};
pub use history::{
    History, HistoryError, Session, SessionId, Solve, SolveId, SolveType, SyncStamp,
};
pub use phase::{
    transition_solve_state, DetailedSplit, DetailedSplitTimes, SolveState, SplitTimes,
};
pub use store::{CodecError, Database, LoadReport, RecordKind, StoreError};
