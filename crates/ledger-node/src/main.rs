//! ledger-node — the permissioned-ledger full node binary.
//!
//! Startup sequence:
//!   1. Open the `sled`-backed store.
//!   2. Unlock (or initialize) the keystore.
//!   3. Start the peer network: bootstrap from seeds, accept inbound peers.
//!   4. Idle — all work happens on the network task's connection handlers.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ledger_keystore::Keystore;
use ledger_p2p::{Network, P2pConfig};
use ledger_store::SledStore;

/// CLI surface is a thin convenience wrapper, not a product feature — flags
/// map directly onto `P2pConfig` and the keystore's unlock password.
#[derive(Parser, Debug)]
#[command(name = "ledger-node", version, about = "Permissioned ledger full node")]
struct Args {
    /// Directory for the persistent `sled` database.
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,

    /// TCP port this node listens for peers on.
    #[arg(long, default_value_t = ledger_core::constants::DEFAULT_PORT)]
    listen_port: u16,

    /// Seed peer hosts to bootstrap from (comma-separated, bare hosts —
    /// every node in the network shares the same `listen_port`).
    #[arg(long, value_delimiter = ',')]
    seeds: Vec<String>,

    /// Keystore password. Falls back to the `LEDGER_KEYSTORE_PASSWORD`
    /// environment variable, and finally prompts on stdin, if omitted —
    /// never pass this on a shared machine's command line in production.
    #[arg(long)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,ledger=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("ledger node starting");

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("creating data dir {}", args.data_dir.display()))?;

    let store = Arc::new(SledStore::open(&args.data_dir).context("opening store")?);

    let password = resolve_password(args.password)?;
    let keystore = Arc::new(Keystore::open(password.as_bytes(), &*store).context("unlocking keystore")?);
    info!(keys = keystore.len(), "keystore unlocked");

    let config = P2pConfig {
        listen_port: args.listen_port,
        seeds: args.seeds,
        ..P2pConfig::default()
    };
    let network = Network::spawn(config, store, keystore);
    let addr = network.start().await.context("starting peer network")?;
    info!(%addr, "node ready");

    tokio::signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutting down");
    network.stop();
    Ok(())
}

/// Resolves the keystore password from `--password`, then
/// `LEDGER_KEYSTORE_PASSWORD`, then an interactive stdin prompt.
fn resolve_password(flag: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = flag {
        return Ok(password);
    }
    if let Ok(password) = std::env::var("LEDGER_KEYSTORE_PASSWORD") {
        return Ok(password);
    }
    prompt_password_from_stdin()
}

fn prompt_password_from_stdin() -> anyhow::Result<String> {
    use std::io::Write;
    eprint!("keystore password: ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin().read_line(&mut line).context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
