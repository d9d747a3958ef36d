//! tally-core library.
//!
//! Medal aggregation and ranking for an intramurals scoreboard, the
//! snapshot store that persists and replicates it, and the read-only view
//! builders the leaderboard renders.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums per module, each mapped to an
//!   [`error::ErrorCode`]; `anyhow::Result` at the config boundary.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod aggregate;
pub mod config;
pub mod error;
pub mod model;
pub mod projection;
pub mod store;
