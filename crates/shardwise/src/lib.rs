//! ## Crate layout
//! - `core`: the sharding engine (rules, algorithms, routing, route cache,
//!   merge).
//! - `config`: TOML configuration loading.
//! - `error`: the public error type.
//!
//! The `prelude` module carries the vocabulary most callers need.

pub use shardwise_core as core;

pub mod config;
pub mod error;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use config::ShardwiseConfig;
pub use error::Error;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{Error, ShardwiseConfig};
    pub use shardwise_core::prelude::*;
}
