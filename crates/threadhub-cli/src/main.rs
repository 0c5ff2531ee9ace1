//! # threadhub
//!
//! Operator CLI for the thread registry.
//!
//! Every command opens the registry described by the environment (see
//! `RegistryConfig::from_env`), applies any command-line overrides, runs one
//! registry operation and prints the result as JSON on stdout.  Logs go to
//! stderr.  Ctrl+C cancels the in-flight operation.

mod cli;

use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use serde::Serialize;
use threadhub_registry::{Context, RegistryConfig, Scope, ThreadRegistry};
use threadhub_shared::constants::THREAD_ID_RANDOM_LEN;
use threadhub_shared::{Identity, ThreadId};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,threadhub=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Key commands need no registry.
    match &cli.command {
        Command::Keygen => return keygen(),
        Command::Owner { secret } => return owner_of(secret),
        _ => {}
    }

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let mut config = RegistryConfig::from_env();
    if let Some(path) = cli.db.clone() {
        config.db_path = Some(path);
    }
    if let Some(policy) = cli.scope_policy {
        config.scope_policy = policy;
    }
    info!(?config, "Loaded configuration");

    let registry = ThreadRegistry::open(&config).context("opening thread registry")?;

    // -----------------------------------------------------------------------
    // 3. Build the call context: Ctrl+C cancels, --timeout-ms bounds it
    // -----------------------------------------------------------------------
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, canceling");
            on_signal.cancel();
        }
    });

    let mut ctx = Context::with_cancel(cancel);
    if let Some(ms) = cli.timeout_ms {
        ctx = ctx.with_timeout(Duration::from_millis(ms));
    }

    // -----------------------------------------------------------------------
    // 4. Run the command
    // -----------------------------------------------------------------------
    run(&registry, &ctx, cli.command).await
}

async fn run(registry: &ThreadRegistry, ctx: &Context, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Keygen => keygen(),

        Command::Owner { secret } => owner_of(&secret),

        Command::Create {
            owner,
            db_thread,
            name,
            api_key,
            id,
            variant,
        } => {
            let id = id.unwrap_or_else(|| ThreadId::new_v1(variant.into(), THREAD_ID_RANDOM_LEN));
            let mut scope = Scope::new();
            if let Some(name) = name {
                scope = scope.with_name(name);
            }
            if let Some(api_key) = api_key {
                scope = scope.with_api_key(api_key);
            }
            let record = registry.create(ctx, &scope, &id, &owner, db_thread).await?;
            print_json(&record)
        }

        Command::Get { id, owner } => print_json(&registry.get(ctx, &id, &owner).await?),

        Command::GetByName {
            name,
            owner,
            api_key,
        } => {
            let scope = match api_key {
                Some(key) => Scope::new().with_api_key(key),
                None => Scope::new(),
            };
            print_json(&registry.get_by_name(ctx, &scope, &name, &owner).await?)
        }

        Command::List { owner } => print_json(&registry.list_by_owner(ctx, &owner).await?),

        Command::ListKey { api_key } => print_json(&registry.list_by_key(ctx, &api_key).await?),

        Command::Delete { id, owner } => {
            registry.delete(ctx, &id, &owner).await?;
            print_json(&Deleted { deleted: 1 })
        }

        Command::DeleteOwner { owner } => {
            let deleted = registry.delete_by_owner(ctx, &owner).await?;
            print_json(&Deleted { deleted })
        }
    }
}

fn keygen() -> anyhow::Result<()> {
    let identity = Identity::generate();
    print_json(&KeyPair {
        owner: identity.owner_key().to_hex(),
        secret: hex::encode(identity.secret_bytes()),
    })
}

fn owner_of(secret: &str) -> anyhow::Result<()> {
    let identity = Identity::from_secret_hex(secret).context("reading secret key")?;
    print_json(&OwnerOnly {
        owner: identity.owner_key().to_hex(),
    })
}

#[derive(Serialize)]
struct KeyPair {
    owner: String,
    secret: String,
}

#[derive(Serialize)]
struct OwnerOnly {
    owner: String,
}

#[derive(Serialize)]
struct Deleted {
    deleted: usize,
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
