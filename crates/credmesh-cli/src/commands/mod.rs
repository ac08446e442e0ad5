pub mod credibility;
pub mod drift_patch_cycle;
pub mod iris;
pub mod mesh;
pub mod seal;
pub mod verify_pack;

/// Shared exit-code mapping: every subcommand that can fail admissibility
/// or verification returns one of these instead of a bare `anyhow::Error`,
/// so `main` can set `std::process::exit` precisely (spec §4.14).
pub fn exit_code_of(code: credmesh_seal::admissibility::ExitCode) -> i32 {
    code as i32
}
