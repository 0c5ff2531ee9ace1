//! Domain model structs persisted in the registry database.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use threadhub_shared::{OwnerKey, ThreadId};

// ---------------------------------------------------------------------------
// ThreadRecord
// ---------------------------------------------------------------------------

/// A registered thread.  Records are written once and never updated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ThreadRecord {
    /// Globally unique thread identifier, stored as a BLOB primary key.
    pub id: ThreadId,
    /// Public key of the identity that registered the thread.
    pub owner: OwnerKey,
    /// `true` for a structured database, `false` for a raw log.
    pub is_db: bool,
    /// Optional human-readable name, unique within its naming scope.
    pub name: Option<String>,
    /// API key the thread was registered under, if any.
    pub api_key: Option<String>,
    /// Assigned by the store at insert time.
    pub created_at: DateTime<Utc>,
}

/// Borrowed input for [`Database::insert_thread`](crate::Database::insert_thread).
#[derive(Debug, Clone, Copy)]
pub struct NewThread<'a> {
    pub id: &'a ThreadId,
    pub owner: &'a OwnerKey,
    pub is_db: bool,
    pub name: Option<&'a str>,
    pub api_key: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// ScopePolicy
// ---------------------------------------------------------------------------

/// How names are scoped for records created without an API key.
///
/// Records created under an API key always share that key's naming scope,
/// whichever owner created them.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ScopePolicy {
    /// One naming scope shared by every owner.
    #[default]
    Shared,
    /// Each owner gets a private naming scope.
    PerOwner,
}

impl ScopePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopePolicy::Shared => "shared",
            ScopePolicy::PerOwner => "per-owner",
        }
    }
}

impl FromStr for ScopePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(ScopePolicy::Shared),
            "per-owner" | "per_owner" | "owner" => Ok(ScopePolicy::PerOwner),
            other => Err(format!("unknown scope policy: {other}")),
        }
    }
}

impl std::fmt::Display for ScopePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
