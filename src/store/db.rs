//! rocksdb-backed store.
//!
//! Key layout:
//! - `sessions`             -> session-list record (ordered session ids)
//! - `session:<id>`         -> session record
//! - `session_solves:<id>`  -> solve-list record (ordered solve ids)
//! - `solve:<id>`           -> solve record
//! - `active_session`       -> raw session id string, no envelope
//!
//! Every mutating history operation commits one atomic write batch. The load
//! protocol tolerates per-record damage: broken records are skipped and
//! reported, never fatal.

use std::path::Path;

use rocksdb::{Options, WriteBatch, DB};
use thiserror::Error;
use tracing::warn;

use super::codec::{self, CodecError};
use crate::caps::{Clock, IdGenerator};
use crate::history::{Session, SessionId, Solve, SolveId};

/// Store failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error(transparent)]
    Corrupt(#[from] CodecError),

    #[error("missing record {key}")]
    Missing { key: String },

    #[error("database error: {0}")]
    Db(#[from] rocksdb::Error),
}

pub(crate) mod keys {
    use crate::history::{SessionId, SolveId};

    pub const SESSIONS: &str = "sessions";
    pub const ACTIVE_SESSION: &str = "active_session";

    pub fn session(id: &SessionId) -> String {
        format!("session:{id}")
    }

    pub fn session_solves(id: &SessionId) -> String {
        format!("session_solves:{id}")
    }

    pub fn solve(id: &SolveId) -> String {
        format!("solve:{id}")
    }
}

/// Handle to an open store.
pub struct Database {
    db: DB,
}

impl Database {
    /// Open the store at `path`, creating it if missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let mut options = Options::default();
        options.create_if_missing(true);
        let db = DB::open(&options, path)?;
        Ok(Self { db })
    }

    pub(crate) fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.db.get(key)?)
    }

    pub(crate) fn delete(&self, key: &str) -> Result<(), StoreError> {
        Ok(self.db.delete(key)?)
    }

    pub(crate) fn write(&self, batch: Batch) -> Result<(), StoreError> {
        Ok(self.db.write(batch.inner)?)
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

/// An atomic set of writes.
#[derive(Default)]
pub(crate) struct Batch {
    inner: WriteBatch,
}

impl Batch {
    pub(crate) fn put(&mut self, key: &str, value: impl AsRef<[u8]>) {
        self.inner.put(key, value);
    }

    pub(crate) fn delete(&mut self, key: &str) {
        self.inner.delete(key);
    }
}

/// Which change to the active-session key a commit carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum ActiveChange {
    Unchanged,
    Set(SessionId),
    Clear,
}

/// Outcome of a load: what was skipped and whether the caller cancelled.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// True when the progress callback requested cancellation.
    pub cancelled: bool,
    /// Per-record failures that were skipped during the load.
    pub errors: Vec<StoreError>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        !self.cancelled && self.errors.is_empty()
    }
}

pub(crate) struct LoadedHistory {
    pub sessions: Vec<Session>,
    pub active: Option<SessionId>,
    pub report: LoadReport,
}

fn fetch(db: &Database, key: &str) -> Result<Vec<u8>, StoreError> {
    db.get(key)?.ok_or_else(|| StoreError::Missing {
        key: key.to_string(),
    })
}

/// Load the full session tree.
///
/// A missing session index means a fresh database. An undecodable index is
/// fatal corruption. Everything below the index is loaded best-effort:
/// failures are recorded and the session or solve is skipped. Sessions that
/// end up with zero solves are dropped. The progress callback is invoked per
/// session and per solve with `(sessions done, sessions total)`; returning
/// true aborts the load with whatever has been read so far.
pub(crate) fn load_history(
    db: &Database,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
    progress: &mut dyn FnMut(usize, usize) -> bool,
) -> Result<LoadedHistory, StoreError> {
    let mut report = LoadReport::default();
    let mut sessions: Vec<Session> = Vec::new();

    let Some(index_raw) = db.get(keys::SESSIONS)? else {
        return Ok(LoadedHistory {
            sessions,
            active: None,
            report,
        });
    };
    let session_ids = codec::decode_session_list(&index_raw)?;

    let total = session_ids.len();
    for (done, session_id) in session_ids.into_iter().enumerate() {
        if progress(done, total) {
            report.cancelled = true;
            return Ok(LoadedHistory {
                sessions,
                active: None,
                report,
            });
        }

        let mut session = match load_session(db, &session_id, id_gen, clock) {
            Ok(session) => session,
            Err(err) => {
                warn!(session = %session_id, error = %err, "skipping unreadable session");
                report.errors.push(err);
                continue;
            }
        };
        let solve_ids = match load_solve_list(db, &session_id) {
            Ok(solve_ids) => solve_ids,
            Err(err) => {
                warn!(session = %session_id, error = %err, "skipping session with unreadable solve list");
                report.errors.push(err);
                continue;
            }
        };

        for solve_id in solve_ids {
            if progress(done, total) {
                report.cancelled = true;
                return Ok(LoadedHistory {
                    sessions,
                    active: None,
                    report,
                });
            }
            match load_solve(db, &solve_id, id_gen, clock) {
                Ok(solve) => session.solves.push(solve),
                Err(err) => {
                    warn!(solve = %solve_id, error = %err, "skipping unreadable solve");
                    report.errors.push(err);
                }
            }
        }

        if !session.solves.is_empty() {
            sessions.push(session);
        }
    }

    let active = match db.get(keys::ACTIVE_SESSION) {
        Ok(Some(raw)) => match String::from_utf8(raw) {
            Ok(id) => {
                let id = SessionId::new(id);
                sessions.iter().any(|s| s.id == id).then_some(id)
            }
            Err(_) => {
                warn!("active session key is not valid UTF-8, ignoring");
                None
            }
        },
        Ok(None) => None,
        Err(err) => {
            warn!(error = %err, "failed to read active session key, ignoring");
            None
        }
    };

    progress(total, total);
    Ok(LoadedHistory {
        sessions,
        active,
        report,
    })
}

fn load_session(
    db: &Database,
    id: &SessionId,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<Session, StoreError> {
    let raw = fetch(db, &keys::session(id))?;
    Ok(codec::decode_session(&raw, id.clone(), id_gen, clock)?)
}

fn load_solve_list(db: &Database, id: &SessionId) -> Result<Vec<SolveId>, StoreError> {
    let raw = fetch(db, &keys::session_solves(id))?;
    Ok(codec::decode_solve_list(&raw)?)
}

fn load_solve(
    db: &Database,
    id: &SolveId,
    id_gen: &dyn IdGenerator,
    clock: &dyn Clock,
) -> Result<Solve, StoreError> {
    let raw = fetch(db, &keys::solve(id))?;
    Ok(codec::decode_solve(&raw, id.clone(), id_gen, clock)?)
}

/// Persist the dirty parts of the named sessions in one atomic batch, plus
/// the session index and active-session key when they changed. Dirty flags
/// are cleared only after the batch lands, so a failed write can be retried.
pub(crate) fn commit_sessions(
    db: &Database,
    sessions: &mut [Session],
    dirty_indices: &[usize],
    session_list_dirty: &mut bool,
    active: &ActiveChange,
) -> Result<(), StoreError> {
    let mut batch = Batch::default();
    let mut written_solves: Vec<(usize, usize)> = Vec::new();

    for &index in dirty_indices {
        let session = &sessions[index];
        if !session.dirty {
            continue;
        }
        for (solve_index, solve) in session.solves.iter().enumerate() {
            if !solve.dirty {
                continue;
            }
            batch.put(&keys::solve(&solve.id), codec::encode_solve(solve));
            written_solves.push((index, solve_index));
        }
        batch.put(
            &keys::session_solves(&session.id),
            codec::encode_solve_list(session),
        );
        batch.put(&keys::session(&session.id), codec::encode_session(session));
    }

    if *session_list_dirty {
        batch.put(keys::SESSIONS, codec::encode_session_list(sessions.iter()));
    }

    match active {
        ActiveChange::Set(id) => batch.put(keys::ACTIVE_SESSION, id.as_str()),
        ActiveChange::Clear => batch.delete(keys::ACTIVE_SESSION),
        ActiveChange::Unchanged => {}
    }

    db.write(batch)?;

    for (index, solve_index) in written_solves {
        sessions[index].solves[solve_index].dirty = false;
    }
    for &index in dirty_indices {
        sessions[index].dirty = false;
    }
    *session_list_dirty = false;
    Ok(())
}

/// Remove a session's records: its metadata, its solve list, and exactly the
/// solve records no surviving session references. One atomic batch together
/// with the rewritten session index and active-session clear.
pub(crate) fn remove_session(
    db: &Database,
    removed: &Session,
    orphan_solves: &[SolveId],
    remaining: &[Session],
    session_list_dirty: &mut bool,
    clear_active: bool,
) -> Result<(), StoreError> {
    let mut batch = Batch::default();
    batch.delete(&keys::session(&removed.id));
    batch.delete(&keys::session_solves(&removed.id));
    for solve_id in orphan_solves {
        batch.delete(&keys::solve(solve_id));
    }
    if *session_list_dirty {
        batch.put(keys::SESSIONS, codec::encode_session_list(remaining.iter()));
    }
    if clear_active {
        batch.delete(keys::ACTIVE_SESSION);
    }

    db.write(batch)?;
    *session_list_dirty = false;
    Ok(())
}
