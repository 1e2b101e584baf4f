use thiserror::Error;

use crate::cube::MoveError;
use crate::history::HistoryError;
use crate::store::{CodecError, StoreError};

/// Crate-level convenience error.
///
/// Not a "god error": it is a thin wrapper over capability errors.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
