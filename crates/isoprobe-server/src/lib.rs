//! # isoprobe-server
//!
//! HTTP surface of the isoprobe service: isolation probes, bounded
//! workloads, health endpoints, and the text metrics export.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cli;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod telemetry;

pub use routes::build_router;
pub use state::AppState;
