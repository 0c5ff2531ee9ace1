//! v001 -- Initial schema creation.
//!
//! Creates the `threads` table together with the indexes that carry the
//! registry's uniqueness rules.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Threads
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS threads (
    id         BLOB PRIMARY KEY NOT NULL,   -- opaque thread id, globally unique
    owner      BLOB NOT NULL,               -- owner public key bytes
    is_db      INTEGER NOT NULL DEFAULT 0,  -- boolean 0/1
    name       TEXT,                        -- optional scoped name
    api_key    TEXT,                        -- optional issuing API key
    scope      TEXT NOT NULL,               -- derived naming scope
    created_at TEXT NOT NULL                -- RFC-3339
) WITHOUT ROWID;

-- Names are unique per scope; unnamed rows never collide.
CREATE UNIQUE INDEX IF NOT EXISTS idx_threads_scope_name
    ON threads(scope, name) WHERE name IS NOT NULL;

CREATE INDEX IF NOT EXISTS idx_threads_owner   ON threads(owner);
CREATE INDEX IF NOT EXISTS idx_threads_api_key ON threads(api_key);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
