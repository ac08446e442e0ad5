pub use credmesh_api::error::{CmResult, CredMeshError, ErrorKind};
