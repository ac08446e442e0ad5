//! Local error alias for the credmesh-crypto crate.

pub use credmesh_api::error::{CmResult, CredMeshError, ErrorKind};
