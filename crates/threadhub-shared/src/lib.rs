//! # threadhub-shared
//!
//! Primitives shared by every threadhub crate: thread identifiers, owner
//! keys, Ed25519 identities and the constants that tie them together.

pub mod constants;
pub mod error;
pub mod identity;
pub mod types;

pub use error::{IdentityError, ParseError};
pub use identity::Identity;
pub use types::{OwnerKey, ThreadId, ThreadVariant};
