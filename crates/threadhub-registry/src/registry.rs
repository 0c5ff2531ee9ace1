//! The thread registry.
//!
//! Each method is one store round-trip run on the blocking pool and raced
//! against the caller's [`Context`].  The store transaction and the waiting
//! caller race for a shared [`CommitGate`]: when the context finishes before
//! the commit is claimed the running statement is interrupted, the
//! transaction rolls back, and the call fails with `Canceled` or
//! `DeadlineExceeded`.  When the commit is claimed first the call reports the
//! store's real result, so a failed call never leaves a record behind.
//!
//! Reads that find a record owned by someone else report `NotFound`, exactly
//! as if the record did not exist.

use std::sync::Arc;
use std::time::Duration;

use threadhub_shared::{OwnerKey, ThreadId};
use threadhub_store::{Access, CommitGate, Database, NewThread, ScopePolicy, StoreError, ThreadRecord};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::config::RegistryConfig;
use crate::context::Context;
use crate::error::{RegistryError, Result};
use crate::pool::ConnectionPool;
use crate::scope::Scope;

/// Handle to the registry.  Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct ThreadRegistry {
    pool: Arc<ConnectionPool>,
    op_timeout: Option<Duration>,
}

impl ThreadRegistry {
    /// Open the registry described by `config`, creating the database and
    /// running migrations if needed.
    pub fn open(config: &RegistryConfig) -> Result<Self> {
        let path = config.resolve_db_path()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| RegistryError::StoreUnavailable(e.to_string()))?;
        }

        let pool = ConnectionPool::open(&path, config.scope_policy, config.max_idle_connections)
            .map_err(|e| match e {
                e @ StoreError::ScopePolicyMismatch { .. } => {
                    RegistryError::InvalidInput(e.to_string())
                }
                e => RegistryError::from(e),
            })?;

        info!(
            path = %pool.path().display(),
            scope_policy = %pool.policy(),
            "thread registry opened"
        );

        Ok(Self {
            pool: Arc::new(pool),
            op_timeout: config.op_timeout,
        })
    }

    pub fn scope_policy(&self) -> ScopePolicy {
        self.pool.policy()
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Register a thread.  The name and API key come from `scope`.
    ///
    /// Fails with [`RegistryError::Conflict`] if the id is already registered
    /// anywhere, or the name is already taken within the scope.
    pub async fn create(
        &self,
        ctx: &Context,
        scope: &Scope,
        id: &ThreadId,
        owner: &OwnerKey,
        is_db: bool,
    ) -> Result<ThreadRecord> {
        if !id.is_defined() {
            return Err(RegistryError::InvalidInput("thread id is empty".to_string()));
        }
        check_owner(owner)?;

        let (id, owner) = (id.clone(), owner.clone());
        let name = scope.name().map(str::to_string);
        let api_key = scope.api_key().map(str::to_string);
        debug!(id = %id.short(), owner = %owner.short(), is_db, ?name, "creating thread");

        self.run(ctx, "create", Access::Write, move |db| {
            db.insert_thread(&NewThread {
                id: &id,
                owner: &owner,
                is_db,
                name: name.as_deref(),
                api_key: api_key.as_deref(),
            })
        })
        .await
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a thread by id, if `owner` owns it.
    pub async fn get(&self, ctx: &Context, id: &ThreadId, owner: &OwnerKey) -> Result<ThreadRecord> {
        let lookup = id.clone();
        let record = self.run(ctx, "get", Access::Read, move |db| db.get_thread(&lookup)).await?;
        owned_by(record, owner)
    }

    /// Fetch a thread by name within the scope's API key (or the default
    /// scope), if `owner` owns it.
    ///
    /// Only `scope.api_key()` is read; the name looked up is always `name`,
    /// whatever name the scope carries.
    pub async fn get_by_name(
        &self,
        ctx: &Context,
        scope: &Scope,
        name: &str,
        owner: &OwnerKey,
    ) -> Result<ThreadRecord> {
        if name.is_empty() {
            return Err(RegistryError::NotFound);
        }
        let api_key = scope.api_key().map(str::to_string);
        let name = name.to_string();
        let scope_owner = owner.clone();

        let record = self
            .run(ctx, "get_by_name", Access::Read, move |db| {
                db.get_thread_by_scoped_name(api_key.as_deref(), &name, &scope_owner)
            })
            .await?;
        owned_by(record, owner)
    }

    /// Every thread owned by `owner`, in no particular order.
    pub async fn list_by_owner(&self, ctx: &Context, owner: &OwnerKey) -> Result<Vec<ThreadRecord>> {
        let owner = owner.clone();
        self.run(ctx, "list_by_owner", Access::Read, move |db| db.list_threads_by_owner(&owner))
            .await
    }

    /// Every thread registered under `api_key`, whoever owns it.
    pub async fn list_by_key(&self, ctx: &Context, api_key: &str) -> Result<Vec<ThreadRecord>> {
        let api_key = api_key.to_string();
        self.run(ctx, "list_by_key", Access::Read, move |db| db.list_threads_by_key(&api_key))
            .await
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete a thread `owner` owns.  Deleting a missing or foreign thread
    /// fails with [`RegistryError::NotFound`].
    pub async fn delete(&self, ctx: &Context, id: &ThreadId, owner: &OwnerKey) -> Result<()> {
        let (id, owner) = (id.clone(), owner.clone());
        let deleted = self
            .run(ctx, "delete", Access::Write, move |db| db.delete_thread(&id, &owner))
            .await?;
        if deleted {
            Ok(())
        } else {
            Err(RegistryError::NotFound)
        }
    }

    /// Delete every thread `owner` owns and return how many went.  Zero is
    /// not an error.
    pub async fn delete_by_owner(&self, ctx: &Context, owner: &OwnerKey) -> Result<usize> {
        let owner = owner.clone();
        let removed = self
            .run(ctx, "delete_by_owner", Access::Write, move |db| db.delete_threads_by_owner(&owner))
            .await?;
        debug!(removed, "deleted threads by owner");
        Ok(removed)
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Run `f` against a pooled connection, racing it against `ctx`.
    async fn run<T, F>(&self, ctx: &Context, op: &'static str, access: Access, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> threadhub_store::Result<T> + Send + 'static,
    {
        let ctx = match (ctx.deadline(), self.op_timeout) {
            (None, Some(timeout)) => ctx.clone().with_timeout(timeout),
            _ => ctx.clone(),
        };
        if let Some(err) = ctx.err() {
            return Err(err);
        }

        let gate = CommitGate::new().with_deadline(ctx.deadline().map(|d| d.into_std()));
        let store_gate = gate.clone();
        let (handle_tx, mut handle_rx) = oneshot::channel();
        let pool = Arc::clone(&self.pool);

        // The connection travels back with the result so it is only reused
        // once this call is completely finished with it.
        let mut task = tokio::task::spawn_blocking(move || {
            let db = pool.checkout()?;
            let _ = handle_tx.send(db.interrupt_handle());
            let result = db.guarded(access, &store_gate, f);
            Ok::<_, StoreError>((db, result))
        });

        let outcome = tokio::select! {
            biased;
            joined = &mut task => Ok(joined),
            err = ctx.done() => Err(err),
        };

        let joined = match outcome {
            Ok(joined) => joined,
            Err(err) if gate.abandon() => {
                if let Ok(handle) = handle_rx.try_recv() {
                    handle.interrupt();
                }

                let pool = Arc::clone(&self.pool);
                tokio::spawn(async move {
                    if let Ok(Ok((db, _))) = task.await {
                        pool.checkin(db);
                    }
                });

                warn!(op, error = %err, "registry operation abandoned");
                return Err(err);
            }
            Err(err) => {
                // The store already claimed the commit; report what it did.
                debug!(op, error = %err, "context finished after commit began");
                task.await
            }
        };

        let (db, result) = joined
            .map_err(|e| RegistryError::StoreUnavailable(format!("store task failed: {e}")))??;
        self.pool.checkin(db);
        result.map_err(|e| {
            if e.is_interrupted() {
                return ctx.err().unwrap_or(RegistryError::Canceled);
            }
            if matches!(e, StoreError::Sqlite(_) | StoreError::Io(_)) {
                warn!(op, error = %e, "store operation failed");
            }
            RegistryError::from(e)
        })
    }
}

/// Collapse "exists but not yours" into `NotFound`.
fn owned_by(record: ThreadRecord, owner: &OwnerKey) -> Result<ThreadRecord> {
    if record.owner == *owner {
        Ok(record)
    } else {
        Err(RegistryError::NotFound)
    }
}

fn check_owner(owner: &OwnerKey) -> Result<()> {
    if owner.as_bytes().is_empty() {
        return Err(RegistryError::InvalidInput("owner key is empty".to_string()));
    }
    Ok(())
}
