use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use threadhub_registry::ScopePolicy;
use threadhub_shared::{OwnerKey, ThreadId, ThreadVariant};

/// Thread registry command line arguments.
#[derive(Parser, Debug)]
#[command(name = "threadhub")]
#[command(about = "Inspect and manage the thread registry")]
#[command(version)]
pub struct Cli {
    /// Registry database file (overrides THREADHUB_DB_PATH)
    #[arg(long, value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Naming scope for unkeyed records: shared or per-owner
    #[arg(long, value_name = "POLICY", global = true)]
    pub scope_policy: Option<ScopePolicy>,

    /// Give up on the operation after this many milliseconds
    #[arg(long, value_name = "MS", global = true)]
    pub timeout_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate an Ed25519 owner identity
    Keygen,

    /// Print the owner key belonging to a secret printed by `keygen`
    Owner {
        /// Secret key (hex)
        #[arg(long)]
        secret: String,
    },

    /// Register a thread
    Create {
        /// Owner public key (hex)
        #[arg(long)]
        owner: OwnerKey,

        /// Register a structured database rather than a raw log
        #[arg(long)]
        db_thread: bool,

        /// Scoped name
        #[arg(long)]
        name: Option<String>,

        /// API key to register under
        #[arg(long)]
        api_key: Option<String>,

        /// Thread id (hex); a fresh one is minted when omitted
        #[arg(long)]
        id: Option<ThreadId>,

        /// Variant of a freshly minted id
        #[arg(long, value_enum, default_value_t = Variant::Raw)]
        variant: Variant,
    },

    /// Fetch a thread by id
    Get {
        id: ThreadId,
        #[arg(long)]
        owner: OwnerKey,
    },

    /// Fetch a thread by scoped name
    GetByName {
        name: String,
        #[arg(long)]
        owner: OwnerKey,
        #[arg(long)]
        api_key: Option<String>,
    },

    /// List an owner's threads
    List {
        #[arg(long)]
        owner: OwnerKey,
    },

    /// List every thread registered under an API key
    ListKey { api_key: String },

    /// Delete one thread
    Delete {
        id: ThreadId,
        #[arg(long)]
        owner: OwnerKey,
    },

    /// Delete every thread an owner has
    DeleteOwner {
        #[arg(long)]
        owner: OwnerKey,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum Variant {
    Raw,
    AccessControlled,
}

impl From<Variant> for ThreadVariant {
    fn from(v: Variant) -> Self {
        match v {
            Variant::Raw => ThreadVariant::Raw,
            Variant::AccessControlled => ThreadVariant::AccessControlled,
        }
    }
}
