use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::task;
use tracing::{error, info, warn};

use anchorage::{Node, NodeEvent, NodeSettings};
use daemon::RpcDriver;
use networks::NetworkRegistry;

#[derive(Parser, Debug)]
#[command(name = "anchorage", about = "Block daemon orchestrator")]
struct Args {
    /// Network to run on (livenet, testnet, regtest).
    #[arg(short, long)]
    network: Option<String>,

    /// Data directory holding the daemon config and the database.
    #[arg(short, long)]
    datadir: PathBuf,

    /// Hex-encoded genesis block overriding the built-in one.
    #[arg(long)]
    genesis: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let settings = NodeSettings {
        registry: NetworkRegistry::new(),
        network: args.network,
        data_dir: args.datadir,
        genesis_override: args.genesis,
        config_overrides: BTreeMap::new(),
    };
    let (node, handle, mut events) = Node::new(
        settings,
        Box::new(|config| Arc::new(RpcDriver::new(config))),
    );

    let node_task = task::spawn(node.run());

    let shutdown_handle = handle.clone();
    task::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received");
            shutdown_handle.shutdown();
        }
    });

    while let Some(event) = events.recv().await {
        match event {
            NodeEvent::Ready => info!("node is ready"),
            NodeEvent::Synced { height } => info!(height, "chain synced"),
            NodeEvent::Error(err) => error!(%err, "node error"),
        }
    }

    match node_task.await.context("node task panicked")? {
        Ok(()) => info!("node stopped"),
        Err(err) => {
            warn!(%err, "node exited with failure");
            return Err(err.into());
        }
    }
    Ok(())
}
