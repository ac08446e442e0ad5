//! `credmesh credibility snapshot` (spec §6).

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use credmesh_credibility::scorer::compute_score;
use credmesh_node::config::NodeConfig;
use credmesh_node::state::NodeState;

#[derive(Parser, Debug)]
pub struct CredibilityArgs {
    #[clap(subcommand)]
    pub command: CredibilityCommands,
}

#[derive(clap::Subcommand, Debug)]
pub enum CredibilityCommands {
    /// Prints the current Credibility Index for the node at `--storage-root`.
    Snapshot {
        #[clap(long, default_value = "./credmesh-data")]
        storage_root: PathBuf,
    },
}

pub fn run(args: CredibilityArgs) -> Result<()> {
    match args.command {
        CredibilityCommands::Snapshot { storage_root } => {
            let mut config = NodeConfig::from_env()?;
            config.storage_root = storage_root;
            let state = NodeState::open(config)?;
            let signals = credmesh_node::api::snapshot_signals(&state)
                .map_err(|e| anyhow::anyhow!("{}", credmesh_api_error_detail(e)))?;
            let score = compute_score(&signals, &state.scoring_policy, state.clock.now());
            println!("{}", serde_json::to_string_pretty(&score)?);
            Ok(())
        }
    }
}

fn credmesh_api_error_detail(e: credmesh_node::api::ApiError) -> String {
    match e {
        credmesh_node::api::ApiError::NotFound(d)
        | credmesh_node::api::ApiError::Forbidden(d)
        | credmesh_node::api::ApiError::Internal(d) => d,
    }
}
