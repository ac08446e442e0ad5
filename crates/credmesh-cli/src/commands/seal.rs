//! `credmesh seal` (spec §6): builds and signs a Sealed DecisionEpisode
//! from the command line, the way `ioi-cli keys generate` hands back
//! freshly minted material for the caller to persist.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;

use credmesh_crypto::provider::{Algorithm, CryptoProvider, Ed25519Provider, HmacDemoProvider};
use credmesh_types::model::{Dlr, DriftSummary, HashScope, HashScopeParameters, MemoryGraphDiff, ReflectionSession};

#[derive(Parser, Debug)]
pub struct SealArgs {
    #[clap(long)]
    pub decision_id: String,

    /// RFC3339 timestamp used as both `sealed_at` and the `hash_scope`
    /// clock, so the same flags reproduce the same `commit_hash`.
    #[clap(long)]
    pub clock: String,

    #[clap(long, default_value = "ed25519_a")]
    pub sign_algo: String,

    #[clap(long)]
    pub sign_key_id: String,

    /// Directory the episode and its detached signature are written to.
    #[clap(long, default_value = "./sealed")]
    pub out_dir: PathBuf,
}

pub fn run(args: SealArgs) -> Result<()> {
    let clock: DateTime<Utc> = DateTime::parse_from_rfc3339(&args.clock)
        .context("--clock must be RFC3339")?
        .with_timezone(&Utc);

    let signer: Box<dyn CryptoProvider> = match args.sign_algo.as_str() {
        "ed25519_a" => Box::new(Ed25519Provider::generate(args.sign_key_id.clone(), Algorithm::EdPrimary)?),
        "ed25519_b" => Box::new(Ed25519Provider::generate(args.sign_key_id.clone(), Algorithm::EdAlternate)?),
        "hmac_demo" => Box::new(HmacDemoProvider::new(args.sign_key_id.clone(), args.sign_key_id.clone().into_bytes())),
        other => bail!("unknown --sign-algo: {other}"),
    };

    let hash_scope = HashScope {
        inputs: vec![],
        prompts: vec![],
        policies: vec![],
        schemas: vec![],
        parameters: HashScopeParameters { clock, deterministic_mode: true },
        exclusions: vec!["observed_at".into(), "artifacts_emitted".into()],
    };

    let episode = credmesh_seal::episode::seal_episode(
        format!("EP-{}", args.decision_id),
        Dlr { decision_id: args.decision_id.clone(), summary: String::new(), claim_ids: vec![] },
        ReflectionSession { narrative: String::new(), degradations: vec![] },
        DriftSummary::default(),
        MemoryGraphDiff::default(),
        hash_scope,
        1,
        None,
        None,
        clock,
    )?;

    let signature = signer.sign(episode.commit_hash.as_bytes())?;

    std::fs::create_dir_all(&args.out_dir)?;
    let episode_path = args.out_dir.join(format!("{}.json", episode.episode_id));
    let sig_path = args.out_dir.join(format!("{}.sig", episode.episode_id));
    std::fs::write(&episode_path, serde_json::to_vec_pretty(&episode)?)?;
    std::fs::write(&sig_path, hex::encode(signature))?;

    println!("sealed {} commit_hash={}", episode.episode_id, episode.commit_hash);
    println!("  episode: {}", episode_path.display());
    println!("  signature: {}", sig_path.display());
    Ok(())
}
