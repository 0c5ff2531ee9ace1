//! Idle-connection pool for the registry store.
//!
//! Connections are checked out for exactly one operation and returned only
//! after that operation has finished, so an interrupt aimed at one call can
//! never hit another call's statement.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use threadhub_store::{Database, Result, ScopePolicy};

pub(crate) struct ConnectionPool {
    path: PathBuf,
    policy: ScopePolicy,
    idle: Mutex<Vec<Database>>,
    max_idle: usize,
}

impl ConnectionPool {
    /// Open the first connection eagerly so migrations and the scope-policy
    /// check happen before any caller is served.
    pub fn open(path: &Path, policy: ScopePolicy, max_idle: usize) -> Result<Self> {
        let first = Database::open_at(path, policy)?;
        Ok(Self {
            path: path.to_path_buf(),
            policy,
            idle: Mutex::new(vec![first]),
            max_idle: max_idle.max(1),
        })
    }

    /// Take an idle connection, opening a new one when none is free.
    pub fn checkout(&self) -> Result<Database> {
        let idle = self.lock().pop();
        match idle {
            Some(db) => Ok(db),
            None => {
                tracing::debug!(path = %self.path.display(), "opening extra store connection");
                Database::open_at(&self.path, self.policy)
            }
        }
    }

    /// Return a connection; surplus connections are closed, as is any
    /// connection left inside a transaction.
    pub fn checkin(&self, db: Database) {
        if !db.conn().is_autocommit() {
            tracing::warn!("discarding store connection left mid-transaction");
            return;
        }
        let mut idle = self.lock();
        if idle.len() < self.max_idle {
            idle.push(db);
        }
    }

    pub fn policy(&self) -> ScopePolicy {
        self.policy
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn idle_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Database>> {
        // A panic while holding the lock cannot leave the Vec half-updated.
        self.idle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_reuses_and_caps_idle() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), ScopePolicy::Shared, 2).unwrap();
        assert_eq!(pool.idle_count(), 1);

        let a = pool.checkout().unwrap();
        let b = pool.checkout().unwrap();
        let c = pool.checkout().unwrap();
        assert_eq!(pool.idle_count(), 0);

        pool.checkin(a);
        pool.checkin(b);
        pool.checkin(c);
        assert_eq!(pool.idle_count(), 2);
    }

    #[test]
    fn checkin_drops_connection_mid_transaction() {
        let dir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::open(&dir.path().join("pool.db"), ScopePolicy::Shared, 2).unwrap();

        let db = pool.checkout().unwrap();
        db.conn().execute_batch("BEGIN").unwrap();
        pool.checkin(db);
        assert_eq!(pool.idle_count(), 0);
    }

    #[test]
    fn open_rejects_policy_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pool.db");
        drop(ConnectionPool::open(&path, ScopePolicy::Shared, 1).unwrap());
        assert!(ConnectionPool::open(&path, ScopePolicy::PerOwner, 1).is_err());
    }
}
