//! Workload execution and metrics for the isoprobe service.
//!
//! Workloads are synchronous and run to completion once started. The
//! [`engine::StressEngine`] moves them onto blocking threads behind a
//! semaphore so that only a bounded number saturate the host at once.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod engine;
pub mod metrics;
pub mod process;
pub mod workload;
