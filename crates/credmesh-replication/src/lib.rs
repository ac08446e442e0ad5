#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! HTTP push/pull replication transport and peer-health state machine (C15).

pub mod client;
pub mod error;
pub mod peer_health;
pub mod server;
pub mod wire;

pub mod prelude {
    pub use crate::client::ReplicationPeer;
    pub use crate::peer_health::{PeerHealth, PeerHealthConfig, PeerState};
    pub use crate::server::{router, KnownPeer, PullQuery, ReplicationApiError, ReplicationState};
    pub use crate::wire::{
        Cursor, NodeStatus, PeerIdentity, PushBatch, PushResult, Topology, TopologyEntry,
    };
}
