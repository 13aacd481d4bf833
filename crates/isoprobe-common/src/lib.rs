//! # isoprobe-common
//!
//! Shared configuration, error definitions, input bounds, and constants
//! used across the entire isoprobe workspace.
//!
//! This crate is the leaf of the dependency graph. It depends on no other
//! internal crate and provides the primitives that the inspectors, the
//! workload generator, and the HTTP server build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod bounds;
pub mod config;
pub mod constants;
pub mod error;
pub mod types;
