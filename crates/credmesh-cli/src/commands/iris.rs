//! `credmesh iris query` (spec §4.13, §6): WHY, WHAT_DRIFTED, WHAT_CHANGED,
//! RECALL, STATUS over the node's memory graph.

use std::path::PathBuf;

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};

use credmesh_memory::graph::MemoryGraph;
use credmesh_memory::iris;

#[derive(Clone, Debug, ValueEnum)]
pub enum QueryType {
    Why,
    WhatDrifted,
    WhatChanged,
    Recall,
    Status,
}

#[derive(Parser, Debug)]
pub struct IrisArgs {
    #[clap(long, value_enum)]
    pub r#type: QueryType,

    #[clap(long, default_value = "./credmesh-data/memory")]
    pub memory_dir: PathBuf,

    /// `WHY`: the episode's `ref_id`. `RECALL`: the entity tag.
    #[clap(long)]
    pub entity: Option<String>,

    /// `WHAT_CHANGED`: lower bound, RFC3339.
    #[clap(long)]
    pub since: Option<String>,

    /// `WHAT_CHANGED`: upper bound, RFC3339. Defaults to now.
    #[clap(long)]
    pub until: Option<String>,

    /// `STATUS`: worst currently active status light, if known.
    #[clap(long, value_enum)]
    pub worst_light: Option<StatusLightArg>,
}

#[derive(Clone, Debug, ValueEnum)]
pub enum StatusLightArg {
    Green,
    Yellow,
    Red,
}

fn parse_rfc3339(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

pub fn run(args: IrisArgs) -> Result<()> {
    let graph = MemoryGraph::open(&args.memory_dir)?;

    match args.r#type {
        QueryType::Why => {
            let Some(entity) = &args.entity else { bail!("--entity (episode ref_id) is required for WHY") };
            let result = iris::why(&graph, entity);
            println!("{}", serde_json::to_string_pretty(&(result.episode_node, result.causal_chain))?);
        }
        QueryType::WhatDrifted => {
            let groups = iris::what_drifted(&graph);
            for group in &groups {
                println!("{} recurrence={} nodes={}", group.fingerprint, group.recurrence, group.nodes.len());
            }
        }
        QueryType::WhatChanged => {
            let since = args.since.as_deref().map(parse_rfc3339).transpose()?.unwrap_or_else(|| Utc::now() - chrono::Duration::days(1));
            let until = args.until.as_deref().map(parse_rfc3339).transpose()?.unwrap_or_else(Utc::now);
            let nodes = iris::what_changed(&graph, since, until);
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
        QueryType::Recall => {
            let Some(entity) = &args.entity else { bail!("--entity is required for RECALL") };
            let since = args.since.as_deref().map(parse_rfc3339).transpose()?;
            let nodes = iris::recall(&graph, entity, since);
            println!("{}", serde_json::to_string_pretty(&nodes)?);
        }
        QueryType::Status => {
            use credmesh_types::model::StatusLight;
            let worst = args.worst_light.map(|l| match l {
                StatusLightArg::Green => StatusLight::Green,
                StatusLightArg::Yellow => StatusLight::Yellow,
                StatusLightArg::Red => StatusLight::Red,
            });
            let status = iris::status(&graph, worst);
            println!("{}: active_claims={} open_drift={}", status.headline, status.active_claims, status.open_drift);
        }
    }
    Ok(())
}
