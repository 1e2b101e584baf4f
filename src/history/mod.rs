//! Solve history: sessions, solves, and their persistence.
//!
//! `History` is an explicit handle, not a process-wide singleton: the id
//! generator and clock are injected at construction and the store handle is
//! owned by the aggregate. All operations are single-threaded; the caller
//! serializes access.

use std::collections::BTreeSet;
use std::path::Path;

use thiserror::Error;

use crate::caps::{Clock, IdGenerator, SystemClock, UuidIdGenerator};
use crate::store::db::{self, ActiveChange, Database, LoadReport};
use crate::store::StoreError;

pub mod session;
pub mod solve;

pub use session::Session;
pub use solve::{SessionId, Solve, SolveId, SolveType, SyncStamp};

/// History operation failure.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HistoryError {
    #[error("{op}: {reason}")]
    InvalidArgument { op: &'static str, reason: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

fn invalid(op: &'static str, reason: impl Into<String>) -> HistoryError {
    HistoryError::InvalidArgument {
        op,
        reason: reason.into(),
    }
}

/// The top-level aggregate: an ordered session list, an optional active
/// session, and the optional open store.
pub struct History {
    sessions: Vec<Session>,
    /// Always names an element of `sessions` when set.
    active: Option<SessionId>,
    session_list_dirty: bool,
    id_gen: Box<dyn IdGenerator>,
    clock: Box<dyn Clock>,
    db: Option<Database>,
}

impl History {
    pub fn new(id_gen: Box<dyn IdGenerator>, clock: Box<dyn Clock>) -> Self {
        Self {
            sessions: Vec::new(),
            active: None,
            session_list_dirty: false,
            id_gen,
            clock,
            db: None,
        }
    }

    /// A history with the uuid id generator and system clock.
    pub fn with_defaults() -> Self {
        Self::new(Box::new(UuidIdGenerator), Box::new(SystemClock))
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    pub fn session(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.iter().find(|session| &session.id == id)
    }

    pub fn active_session_id(&self) -> Option<&SessionId> {
        self.active.as_ref()
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.session(self.active.as_ref()?)
    }

    fn index_of(&self, id: &SessionId) -> Option<usize> {
        self.sessions.iter().position(|session| &session.id == id)
    }

    /// Open the store at `path` and hydrate the session tree, replacing any
    /// previously loaded state. See the store module for the load protocol.
    pub fn open_database(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, HistoryError> {
        self.open_database_with_progress(path, |_, _| false)
    }

    /// As `open_database`, reporting `(sessions done, sessions total)` to the
    /// callback at coarse granularity. Returning true cancels the load,
    /// keeping whatever was hydrated so far.
    pub fn open_database_with_progress(
        &mut self,
        path: impl AsRef<Path>,
        mut progress: impl FnMut(usize, usize) -> bool,
    ) -> Result<LoadReport, HistoryError> {
        self.close_database();
        self.sessions.clear();
        self.active = None;
        self.session_list_dirty = false;

        let database = Database::open(path)?;
        let loaded = db::load_history(&database, &*self.id_gen, &*self.clock, &mut progress);
        // The handle stays open even when hydration fails, so the caller can
        // inspect or repair; only the open itself is fatal to the handle.
        self.db = Some(database);
        let loaded = loaded?;
        self.sessions = loaded.sessions;
        self.active = loaded.active;
        Ok(loaded.report)
    }

    pub fn close_database(&mut self) {
        self.db = None;
    }

    pub fn is_database_open(&self) -> bool {
        self.db.is_some()
    }

    /// Record a completed solve. If there is no active session, or the
    /// active session holds a different solve type, a fresh session is
    /// created and becomes active. Commits one atomic batch.
    pub fn record_solve(
        &mut self,
        solve_type: SolveType,
        solve: Solve,
    ) -> Result<(), HistoryError> {
        let mut active_change = ActiveChange::Unchanged;
        let current = self
            .active
            .as_ref()
            .and_then(|id| self.sessions.iter().position(|s| &s.id == id))
            .filter(|&index| self.sessions[index].solve_type == solve_type);
        let index = match current {
            Some(index) => index,
            None => {
                let id = SessionId::new(self.id_gen.generate_id());
                self.sessions.push(Session::new(id.clone(), solve_type));
                self.active = Some(id.clone());
                self.session_list_dirty = true;
                active_change = ActiveChange::Set(id);
                self.sessions.len() - 1
            }
        };

        let mut solve = solve;
        solve.dirty = true;
        {
            let (id_gen, clock) = (&*self.id_gen, &*self.clock);
            let session = &mut self.sessions[index];
            session.solves.push(solve);
            session.update.bump(id_gen, clock);
            session.dirty = true;
        }

        self.commit(&[index], active_change)
    }

    /// Clear the active session. The next recorded solve starts a new one.
    pub fn reset_session(&mut self) -> Result<(), HistoryError> {
        self.active = None;
        if let Some(database) = &self.db {
            database.delete(db::keys::ACTIVE_SESSION)?;
        }
        Ok(())
    }

    /// Delete a session. Solve records referenced only by this session are
    /// removed from the store in the same batch; solves shared with other
    /// sessions are preserved.
    pub fn delete_session(&mut self, id: &SessionId) -> Result<(), HistoryError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| invalid("delete_session", format!("unknown session {id}")))?;
        let removed = self.sessions.remove(index);
        self.session_list_dirty = true;

        let clear_active = self.active.as_ref() == Some(id);
        if clear_active {
            self.active = None;
        }

        if let Some(database) = &self.db {
            let mut orphans: BTreeSet<&SolveId> =
                removed.solves.iter().map(|solve| &solve.id).collect();
            for session in &self.sessions {
                for solve in &session.solves {
                    orphans.remove(&solve.id);
                }
            }
            let orphan_ids: Vec<SolveId> = orphans.into_iter().cloned().collect();
            db::remove_session(
                database,
                &removed,
                &orphan_ids,
                &self.sessions,
                &mut self.session_list_dirty,
                clear_active,
            )?;
        }
        Ok(())
    }

    /// Split a session before `solve_index`, moving the tail solves into a
    /// new session inserted right after it. If the split session was active,
    /// the tail session becomes active.
    pub fn split_session_at_solve(
        &mut self,
        id: &SessionId,
        solve_index: usize,
    ) -> Result<(), HistoryError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| invalid("split_session_at_solve", format!("unknown session {id}")))?;
        let len = self.sessions[index].solves.len();
        if solve_index == 0 || solve_index >= len {
            return Err(invalid(
                "split_session_at_solve",
                format!("solve index {solve_index} out of range 1..{len}"),
            ));
        }

        let split_id = SessionId::new(self.id_gen.generate_id());
        let mut tail = Session::new(split_id.clone(), self.sessions[index].solve_type);
        tail.name = self.sessions[index].name.clone();
        tail.solves = self.sessions[index].solves.split_off(solve_index);
        tail.update.bump(&*self.id_gen, &*self.clock);
        tail.dirty = true;

        {
            let (id_gen, clock) = (&*self.id_gen, &*self.clock);
            let head = &mut self.sessions[index];
            head.update.bump(id_gen, clock);
            head.dirty = true;
        }

        self.sessions.insert(index + 1, tail);
        self.session_list_dirty = true;

        let active_change = if self.active.as_ref() == Some(id) {
            self.active = Some(split_id.clone());
            ActiveChange::Set(split_id)
        } else {
            ActiveChange::Unchanged
        };

        self.commit(&[index, index + 1], active_change)
    }

    /// Merge `first` into `second`: `first`'s solves are prepended to
    /// `second`, which takes the given name; `first` is then deleted. Both
    /// sessions must hold the same solve type.
    pub fn merge_sessions(
        &mut self,
        first: &SessionId,
        second: &SessionId,
        name: &str,
    ) -> Result<(), HistoryError> {
        let first_index = self
            .index_of(first)
            .ok_or_else(|| invalid("merge_sessions", format!("unknown session {first}")))?;
        let second_index = self
            .index_of(second)
            .ok_or_else(|| invalid("merge_sessions", format!("unknown session {second}")))?;
        if first_index == second_index {
            return Err(invalid(
                "merge_sessions",
                "cannot merge a session into itself",
            ));
        }
        if self.sessions[first_index].solve_type != self.sessions[second_index].solve_type {
            return Err(invalid("merge_sessions", "session solve types differ"));
        }

        let first_solves = self.sessions[first_index].solves.clone();
        {
            let (id_gen, clock) = (&*self.id_gen, &*self.clock);
            let target = &mut self.sessions[second_index];
            target.solves.splice(0..0, first_solves);
            target.name = name.to_string();
            target.update.bump(id_gen, clock);
            target.dirty = true;
        }

        self.commit(&[second_index], ActiveChange::Unchanged)?;
        self.delete_session(first)
    }

    fn commit(
        &mut self,
        dirty_indices: &[usize],
        active: ActiveChange,
    ) -> Result<(), HistoryError> {
        let Some(database) = &self.db else {
            // No store open: state stays dirty and in memory only.
            return Ok(());
        };
        db::commit_sessions(
            database,
            &mut self.sessions,
            dirty_indices,
            &mut self.session_list_dirty,
            &active,
        )?;
        Ok(())
    }
}
