//! Typed operations over [`ThreadRecord`] rows.

use chrono::{DateTime, Utc};
use rusqlite::params;
use threadhub_shared::constants::{API_KEY_SCOPE_PREFIX, DEFAULT_SCOPE_KEY, OWNER_SCOPE_PREFIX};
use threadhub_shared::{OwnerKey, ThreadId};

use crate::database::Database;
use crate::error::{map_insert_error, map_query_error, Result};
use crate::models::{NewThread, ScopePolicy, ThreadRecord};

const SELECT_COLUMNS: &str = "SELECT id, owner, is_db, name, api_key, created_at FROM threads";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new thread and return the stored record.
    ///
    /// A single `INSERT`: a clash on the primary key or on the
    /// `(scope, name)` index comes back as [`StoreError::Conflict`](crate::StoreError::Conflict).
    pub fn insert_thread(&self, new: &NewThread<'_>) -> Result<ThreadRecord> {
        let name = non_empty(new.name);
        let api_key = non_empty(new.api_key);
        let scope = scope_key(self.policy(), api_key, new.owner);
        let created_at = Utc::now();

        self.conn()
            .execute(
                "INSERT INTO threads (id, owner, is_db, name, api_key, scope, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    new.id.as_bytes(),
                    new.owner.as_bytes(),
                    new.is_db,
                    name,
                    api_key,
                    scope,
                    created_at.to_rfc3339(),
                ],
            )
            .map_err(map_insert_error)?;

        Ok(ThreadRecord {
            id: new.id.clone(),
            owner: new.owner.clone(),
            is_db: new.is_db,
            name: name.map(str::to_string),
            api_key: api_key.map(str::to_string),
            created_at,
        })
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a thread by id, whoever owns it.
    pub fn get_thread(&self, id: &ThreadId) -> Result<ThreadRecord> {
        self.conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id.as_bytes()],
                row_to_thread,
            )
            .map_err(map_query_error)
    }

    /// Fetch a thread by name within the scope derived from `api_key` (and,
    /// under [`ScopePolicy::PerOwner`], `owner`).
    ///
    /// The owner only selects the scope here; callers still have to check
    /// that the returned record belongs to them.
    pub fn get_thread_by_scoped_name(
        &self,
        api_key: Option<&str>,
        name: &str,
        owner: &OwnerKey,
    ) -> Result<ThreadRecord> {
        let scope = scope_key(self.policy(), non_empty(api_key), owner);
        self.conn()
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE scope = ?1 AND name = ?2"),
                params![scope, name],
                row_to_thread,
            )
            .map_err(map_query_error)
    }

    /// List every thread owned by `owner`, in storage order.
    pub fn list_threads_by_owner(&self, owner: &OwnerKey) -> Result<Vec<ThreadRecord>> {
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} WHERE owner = ?1"))?;
        let rows = stmt.query_map(params![owner.as_bytes()], row_to_thread)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_query_error)
    }

    /// List every thread registered under `api_key`, across owners.
    pub fn list_threads_by_key(&self, api_key: &str) -> Result<Vec<ThreadRecord>> {
        if api_key.is_empty() {
            return Ok(Vec::new());
        }
        let mut stmt = self
            .conn()
            .prepare(&format!("{SELECT_COLUMNS} WHERE api_key = ?1"))?;
        let rows = stmt.query_map(params![api_key], row_to_thread)?;
        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(map_query_error)
    }

    // ------------------------------------------------------------------
    // Delete
    // ------------------------------------------------------------------

    /// Delete the thread with this id if `owner` owns it.  Returns `true` if
    /// a row was deleted.
    pub fn delete_thread(&self, id: &ThreadId, owner: &OwnerKey) -> Result<bool> {
        let affected = self
            .conn()
            .execute(
                "DELETE FROM threads WHERE id = ?1 AND owner = ?2",
                params![id.as_bytes(), owner.as_bytes()],
            )
            .map_err(map_query_error)?;
        Ok(affected > 0)
    }

    /// Delete every thread owned by `owner`.  Returns the number removed.
    pub fn delete_threads_by_owner(&self, owner: &OwnerKey) -> Result<usize> {
        self.conn()
            .execute(
                "DELETE FROM threads WHERE owner = ?1",
                params![owner.as_bytes()],
            )
            .map_err(map_query_error)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Derive the naming scope a record lives in.
pub fn scope_key(policy: ScopePolicy, api_key: Option<&str>, owner: &OwnerKey) -> String {
    match (api_key, policy) {
        (Some(key), _) => format!("{API_KEY_SCOPE_PREFIX}{key}"),
        (None, ScopePolicy::Shared) => DEFAULT_SCOPE_KEY.to_string(),
        (None, ScopePolicy::PerOwner) => format!("{OWNER_SCOPE_PREFIX}{}", owner.to_hex()),
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Map a `rusqlite::Row` to a [`ThreadRecord`].
fn row_to_thread(row: &rusqlite::Row<'_>) -> rusqlite::Result<ThreadRecord> {
    let id: Vec<u8> = row.get(0)?;
    let owner: Vec<u8> = row.get(1)?;
    let is_db: bool = row.get(2)?;
    let name: Option<String> = row.get(3)?;
    let api_key: Option<String> = row.get(4)?;
    let created_str: String = row.get(5)?;

    let created_at: DateTime<Utc> = DateTime::parse_from_rfc3339(&created_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(ThreadRecord {
        id: ThreadId::from_bytes(id),
        owner: OwnerKey::from_bytes(owner),
        is_db,
        name,
        api_key,
        created_at,
    })
}
