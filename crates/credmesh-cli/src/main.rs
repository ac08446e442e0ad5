//! The `credmesh` developer CLI (spec §6).

use anyhow::Result;
use clap::{Parser, Subcommand};

use credmesh_cli::commands::{credibility, drift_patch_cycle, iris, mesh, seal, verify_pack};

#[derive(Parser, Debug)]
#[clap(name = "credmesh", version, about = "Developer CLI for the Credibility Mesh")]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Seals a decision episode and writes it plus a detached signature.
    Seal(seal::SealArgs),
    /// Verifies an admissibility pack and exits with its admissibility code.
    VerifyPack(verify_pack::VerifyPackArgs),
    /// Node lifecycle: init, run, verify, scenario.
    Mesh(mesh::MeshArgs),
    /// Credibility Index queries.
    Credibility(credibility::CredibilityArgs),
    /// IRIS memory-graph queries.
    Iris(iris::IrisArgs),
    /// Runs one drift-detect/patch-propose/patch-apply cycle.
    DriftPatchCycle(drift_patch_cycle::DriftPatchCycleArgs),
}

fn main() -> Result<()> {
    credmesh_telemetry::init::init_tracing()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Seal(args) => seal::run(args),
        Commands::VerifyPack(args) => {
            let exit_code = verify_pack::run(args)?;
            std::process::exit(exit_code);
        }
        Commands::Mesh(args) => mesh::run(args),
        Commands::Credibility(args) => credibility::run(args),
        Commands::Iris(args) => iris::run(args),
        Commands::DriftPatchCycle(args) => drift_patch_cycle::run(args),
    }
}
