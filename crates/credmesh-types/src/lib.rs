#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Data model and canonical serializer for the Credibility Mesh.
//!
//! [`canonical`] is the only sanctioned hashing/signing surface in the
//! workspace; [`model`] defines every content type the mesh moves between
//! nodes.

pub mod canonical;
pub mod model;

pub mod prelude {
    pub use crate::canonical::{
        canonical_hash, canonical_hash_with_blanked_field, sha256_text, to_canonical_bytes,
        to_canonical_string, CanonicalError,
    };
    pub use crate::model::*;
}
