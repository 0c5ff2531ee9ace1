//! # threadhub-registry
//!
//! The thread registry: the authoritative record of which owner registered
//! which thread, under which name and API key.
//!
//! Every operation takes a [`Context`] (cancellation and deadline) and is a
//! single round-trip to the SQLite store.  Uniqueness of thread ids and of
//! scoped names is enforced by the store's indexes, never by a read followed
//! by a write, so the registry is safe to call from many tasks at once.

pub mod config;
pub mod context;
pub mod error;
pub mod registry;
pub mod scope;

mod pool;

pub use config::RegistryConfig;
pub use context::Context;
pub use error::{RegistryError, Result};
pub use registry::ThreadRegistry;
pub use scope::Scope;

pub use threadhub_store::{ScopePolicy, ThreadRecord};
