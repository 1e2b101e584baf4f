//! Persistence: record codec and the rocksdb-backed store.

pub mod codec;
pub mod db;

pub use codec::{CodecError, RecordKind};
pub use db::{Database, LoadReport, StoreError};
