#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Sign/verify capability set (C2) for the Credibility Mesh: Ed25519
//! primary/alternate and an HMAC-SHA256 DEMO fallback, selected at process
//! boot and tracked per signed artifact by `key_id`.

pub mod error;
pub mod provider;
pub mod registry;

pub mod prelude {
    pub use crate::provider::{Algorithm, CryptoProvider, Ed25519Provider, HmacDemoProvider};
    pub use crate::registry::KeyRegistry;
}
