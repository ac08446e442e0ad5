#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo
    )
)]

//! Library half of the `credmesh` CLI (spec §6): the binary only parses
//! arguments and dispatches here, the way the teacher's CLI splits
//! `main.rs` from `commands/`.

pub mod commands;
