//! # isoprobe-core
//!
//! Read-only introspection of the isolation a process is running under.
//!
//! This crate provides:
//! - **Namespaces**: identity of the PID, network, mount, UTS, IPC, user,
//!   and cgroup namespaces of a process.
//! - **Cgroups v2**: membership of the current process and the CPU,
//!   memory, and PID limits of its hierarchy.
//! - **System**: hostname, platform, CPUs, memory, and load averages.
//! - **Hardening**: non-root execution and read-only root filesystem checks.
//!
//! Nothing in here fails the caller. A missing facility becomes an
//! `available: false` report and a single unreadable item becomes an
//! absent field.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod cgroup;
pub mod hardening;
pub mod namespace;
pub mod system;
