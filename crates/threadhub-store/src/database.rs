//! Database connection management.
//!
//! The [`Database`] struct owns a [`rusqlite::Connection`] and guarantees that
//! migrations have run, and that the stored scope policy matches the requested
//! one, before any other operation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use directories::ProjectDirs;
use rusqlite::{
    params, Connection, InterruptHandle, OptionalExtension, Transaction, TransactionBehavior,
};

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::models::ScopePolicy;

/// How long a writer waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a guarded unit of work writes.  Writers take the write lock up
/// front so they queue on `busy_timeout` instead of failing mid-transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

const RUNNING: u8 = 0;
const COMMITTING: u8 = 1;
const ABANDONED: u8 = 2;

/// Decides, exactly once, whether a guarded transaction commits or is
/// abandoned by the caller waiting on it.
///
/// The transaction side claims the commit with [`CommitGate::begin_commit`]
/// right before `COMMIT`; the caller claims abandonment with
/// [`CommitGate::abandon`].  Whichever swap lands first wins and the other
/// side observes it, so an abandoned transaction never commits and a
/// committing one is never reported as abandoned.
#[derive(Debug, Clone, Default)]
pub struct CommitGate {
    state: Arc<AtomicU8>,
    deadline: Option<Instant>,
}

impl CommitGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Abandon automatically once `deadline` passes.
    pub fn with_deadline(mut self, deadline: Option<Instant>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Abandon the transaction unless it already started committing.
    /// Returns `false` when the commit won.
    pub fn abandon(&self) -> bool {
        match self
            .state
            .compare_exchange(RUNNING, ABANDONED, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => true,
            Err(current) => current == ABANDONED,
        }
    }

    /// Whether the transaction has been abandoned, either explicitly or by
    /// its deadline passing.
    pub fn is_abandoned(&self) -> bool {
        if self.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return self.abandon();
        }
        self.state.load(Ordering::Acquire) == ABANDONED
    }

    /// Claim the commit.  Fails if the transaction was abandoned first.
    fn begin_commit(&self) -> bool {
        if self.is_abandoned() {
            return false;
        }
        self.state
            .compare_exchange(RUNNING, COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Wrapper around a [`rusqlite::Connection`].
pub struct Database {
    conn: Connection,
    policy: ScopePolicy,
}

impl Database {
    /// Default database location in the platform data directory:
    /// - Linux:   `~/.local/share/threadhub/registry.db`
    /// - macOS:   `~/Library/Application Support/io.threadhub.threadhub/registry.db`
    /// - Windows: `{FOLDERID_RoamingAppData}\threadhub\threadhub\data\registry.db`
    pub fn default_path() -> Result<PathBuf> {
        let project_dirs =
            ProjectDirs::from("io", "threadhub", "threadhub").ok_or(StoreError::NoDataDir)?;
        Ok(project_dirs.data_dir().join("registry.db"))
    }

    /// Open (or create) a database at an explicit path.
    pub fn open_at(path: &Path, policy: ScopePolicy) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::init(conn, policy)
    }

    /// Open a private in-memory database.  Every call yields a fresh, empty
    /// store, so this is only useful for single-connection tests.
    pub fn open_in_memory(policy: ScopePolicy) -> Result<Self> {
        Self::init(Connection::open_in_memory()?, policy)
    }

    fn init(conn: Connection, policy: ScopePolicy) -> Result<Self> {
        migrations::run_migrations(&conn)?;
        check_scope_policy(&conn, policy)?;

        Ok(Self { conn, policy })
    }

    /// Return a reference to the underlying `rusqlite::Connection`.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// The default-scope policy this database enforces.
    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    /// Handle that aborts whatever statement this connection is running.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.conn.get_interrupt_handle()
    }

    /// Run `f` inside a transaction that commits only if `gate` lets it.
    ///
    /// The gate is checked before `f` runs and claimed just before `COMMIT`.
    /// If the caller abandoned the work first the transaction rolls back and
    /// [`StoreError::Interrupted`] is returned, so an abandoned write never
    /// lands.
    pub fn guarded<T>(
        &self,
        access: Access,
        gate: &CommitGate,
        f: impl FnOnce(&Database) -> Result<T>,
    ) -> Result<T> {
        let behavior = match access {
            Access::Read => TransactionBehavior::Deferred,
            Access::Write => TransactionBehavior::Immediate,
        };
        let tx = Transaction::new_unchecked(&self.conn, behavior)?;
        if gate.is_abandoned() {
            return Err(StoreError::Interrupted);
        }
        let value = f(self)?;
        if !gate.begin_commit() {
            tracing::debug!("transaction abandoned before commit, rolling back");
            return Err(StoreError::Interrupted);
        }
        tx.commit()?;
        Ok(value)
    }

    /// Return the filesystem path of the open database (if any).
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().filter(|p| !p.is_empty()).map(PathBuf::from)
    }
}

/// Record the policy on first open; refuse to reopen under a different one.
fn check_scope_policy(conn: &Connection, requested: ScopePolicy) -> Result<()> {
    let stored = match read_scope_policy(conn)? {
        Some(stored) => stored,
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO registry_meta (key, value) VALUES ('scope_policy', ?1)",
                params![requested.as_str()],
            )?;
            read_scope_policy(conn)?.ok_or(StoreError::NotFound)?
        }
    };

    if stored != requested {
        return Err(StoreError::ScopePolicyMismatch { stored, requested });
    }
    Ok(())
}

fn read_scope_policy(conn: &Connection) -> Result<Option<ScopePolicy>> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT value FROM registry_meta WHERE key = 'scope_policy'",
            [],
            |row| row.get(0),
        )
        .optional()?;
    stored
        .map(|value| value.parse().map_err(StoreError::Corrupt))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        let db = Database::open_at(&path, ScopePolicy::Shared).expect("should open");
        assert!(db.path().is_some());
        assert_eq!(db.policy(), ScopePolicy::Shared);
    }

    #[test]
    fn reopen_with_same_policy() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        drop(Database::open_at(&path, ScopePolicy::PerOwner).unwrap());
        let db = Database::open_at(&path, ScopePolicy::PerOwner).expect("should reopen");
        assert_eq!(db.policy(), ScopePolicy::PerOwner);
    }

    #[test]
    fn reopen_with_other_policy_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.db");

        drop(Database::open_at(&path, ScopePolicy::Shared).unwrap());
        let err = Database::open_at(&path, ScopePolicy::PerOwner)
            .err()
            .expect("policy change must be rejected");
        assert!(matches!(
            err,
            StoreError::ScopePolicyMismatch {
                stored: ScopePolicy::Shared,
                requested: ScopePolicy::PerOwner,
            }
        ));
    }

    fn marker_count(db: &Database) -> i64 {
        db.conn()
            .query_row(
                "SELECT COUNT(*) FROM registry_meta WHERE key = 'marker'",
                [],
                |row| row.get(0),
            )
            .unwrap()
    }

    fn insert_marker(db: &Database) -> Result<()> {
        db.conn().execute(
            "INSERT INTO registry_meta (key, value) VALUES ('marker', 'x')",
            [],
        )?;
        Ok(())
    }

    #[test]
    fn guarded_rolls_back_when_abandoned() {
        let db = Database::open_in_memory(ScopePolicy::Shared).unwrap();
        let gate = CommitGate::new();

        let err = db
            .guarded(Access::Write, &gate, |db| {
                insert_marker(db)?;
                assert!(gate.abandon());
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(marker_count(&db), 0);
    }

    #[test]
    fn guarded_commits() {
        let db = Database::open_in_memory(ScopePolicy::Shared).unwrap();
        let gate = CommitGate::new();
        db.guarded(Access::Write, &gate, insert_marker).unwrap();
        assert_eq!(marker_count(&db), 1);

        // Once committed, the work can no longer be abandoned.
        assert!(!gate.abandon());
        assert!(!gate.is_abandoned());
    }

    #[test]
    fn guarded_refuses_abandoned_gate() {
        let db = Database::open_in_memory(ScopePolicy::Shared).unwrap();
        let gate = CommitGate::new();
        assert!(gate.abandon());

        let err = db.guarded(Access::Write, &gate, insert_marker).unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(marker_count(&db), 0);
    }

    #[test]
    fn guarded_rolls_back_past_deadline() {
        let db = Database::open_in_memory(ScopePolicy::Shared).unwrap();
        let gate = CommitGate::new().with_deadline(Some(Instant::now() + Duration::from_millis(20)));

        let err = db
            .guarded(Access::Write, &gate, |db| {
                insert_marker(db)?;
                std::thread::sleep(Duration::from_millis(40));
                Ok(())
            })
            .unwrap_err();
        assert!(err.is_interrupted());
        assert_eq!(marker_count(&db), 0);
        assert!(gate.abandon());
    }

    #[test]
    fn commit_and_abandon_have_one_winner() {
        let gate = CommitGate::new();
        assert!(gate.begin_commit());
        assert!(!gate.abandon());

        let gate = CommitGate::new();
        assert!(gate.abandon());
        assert!(!gate.begin_commit());
    }

    #[test]
    fn in_memory_has_no_path() {
        let db = Database::open_in_memory(ScopePolicy::Shared).unwrap();
        assert!(db.path().is_none());
    }
}
