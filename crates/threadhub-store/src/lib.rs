//! # threadhub-store
//!
//! Durable storage for the thread registry, backed by SQLite.
//!
//! The crate exposes a synchronous `Database` handle that wraps a
//! `rusqlite::Connection`, runs schema migrations on open and provides typed
//! helpers over the single `threads` table.  Both uniqueness rules of the
//! registry (thread id, scoped name) live in that table's indexes so they are
//! enforced by SQLite at insert time.

pub mod database;
pub mod migrations;
pub mod models;
pub mod threads;

mod error;

pub use database::{Access, CommitGate, Database};
pub use error::{Result, StoreError};
pub use models::*;
