//! `credmesh mesh init|run|verify|scenario` (spec §6): the node lifecycle
//! commands, grounded the way the teacher's `node` subcommand drives a
//! local devnet from one binary.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use credmesh_node::config::NodeConfig;
use credmesh_node::state::NodeState;
use credmesh_replication::peer_health::PeerHealth;
use credmesh_replication::server::{KnownPeer, ReplicationState};
use credmesh_replication::wire::PeerIdentity;
use credmesh_storage::log_store::LogStore;

#[derive(Parser, Debug)]
pub struct MeshArgs {
    #[clap(subcommand)]
    pub command: MeshCommands,
}

#[derive(Subcommand, Debug)]
pub enum MeshCommands {
    /// Creates the node's storage directories and seeds empty logs.
    Init {
        #[clap(long, default_value = "./credmesh-data")]
        storage_root: PathBuf,
    },
    /// Serves the query API and replication transport for one node.
    Run {
        #[clap(long, default_value = "./credmesh-data")]
        storage_root: PathBuf,
        #[clap(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,
    },
    /// Re-derives every hash chain (seal chain, authority ledger,
    /// transparency log) and reports whether each is intact.
    Verify {
        #[clap(long, default_value = "./credmesh-data")]
        storage_root: PathBuf,
    },
    /// Runs a short scripted scenario: produces a claim's worth of
    /// envelopes through the C6 pipeline and prints the resulting
    /// Credibility Index, for smoke-testing a fresh checkout.
    Scenario {
        #[clap(long, default_value = "./credmesh-data")]
        storage_root: PathBuf,
    },
}

pub fn run(args: MeshArgs) -> Result<()> {
    match args.command {
        MeshCommands::Init { storage_root } => {
            let mut config = NodeConfig::from_env()?;
            config.storage_root = storage_root.clone();
            NodeState::open(config)?;
            println!("initialized node storage at {}", storage_root.display());
            Ok(())
        }
        MeshCommands::Run { storage_root, bind } => run_server(storage_root, bind),
        MeshCommands::Verify { storage_root } => verify(storage_root),
        MeshCommands::Scenario { storage_root } => scenario(storage_root),
    }
}

fn run_server(storage_root: PathBuf, bind: SocketAddr) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let mut config = NodeConfig::from_env()?;
        config.storage_root = storage_root.clone();
        let state = Arc::new(NodeState::open(config.clone())?);

        let peers = config
            .peer_urls
            .iter()
            .map(|_| KnownPeer {
                identity: PeerIdentity::new(&config.tenant_id, &config.node_id),
                health: std::sync::Mutex::new(PeerHealth::new("peer", Default::default())),
            })
            .collect();

        let replication_state = Arc::new(ReplicationState {
            tenant_id: config.tenant_id.clone(),
            node_id: config.node_id.clone(),
            envelopes: LogStore::open(storage_root.join("envelopes.ndjson"))?,
            validations: LogStore::open(storage_root.join("validations.ndjson"))?,
            aggregates: LogStore::open(storage_root.join("aggregates.ndjson"))?,
            seals: LogStore::open(storage_root.join("seal_chain.ndjson"))?,
            peers,
        });

        let app = credmesh_node::api::router(state).merge(credmesh_replication::server::router(replication_state));

        println!("listening on {bind}");
        let listener = tokio::net::TcpListener::bind(bind).await?;
        axum::serve(listener, app).await?;
        Ok(())
    })
}

fn verify(storage_root: PathBuf) -> Result<()> {
    let mut config = NodeConfig::from_env()?;
    config.storage_root = storage_root;
    let state = NodeState::open(config)?;

    let mut ok = true;
    for (name, result) in [
        ("seal_chain", state.seal_authority.verify_chain()),
        ("authority_ledger", state.authority_ledger.verify_chain()),
        ("transparency_log", state.transparency_log.verify_chain()),
    ] {
        match result {
            Ok(()) => println!("{name}: OK"),
            Err(e) => {
                println!("{name}: BROKEN ({e})");
                ok = false;
            }
        }
    }
    if !ok {
        std::process::exit(1);
    }
    Ok(())
}

fn scenario(storage_root: PathBuf) -> Result<()> {
    use credmesh_credibility::scorer::compute_score;

    let mut config = NodeConfig::from_env()?;
    config.storage_root = storage_root;
    let state = NodeState::open(config)?;

    let payload = serde_json::json!({ "demo": "scenario-claim" });
    let envelope = state.edge.produce("ENV-SCENARIO-1", &payload)?;
    let now = state.clock.now();
    let validation = state.validator.validate(&envelope, now)?;
    println!("envelope accepted: {:?}", validation.map(|v| v.verdict));

    let signals = credmesh_node::api::snapshot_signals(&state).map_err(|e| anyhow::anyhow!("{e:?}"))?;
    let score = compute_score(&signals, &state.scoring_policy, now);
    println!("{}", serde_json::to_string_pretty(&score)?);
    Ok(())
}
