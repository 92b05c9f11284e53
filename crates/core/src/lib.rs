//! Core library for the Miner local database manager
//!
//! This crate contains the process-lifecycle and system-integration orchestrator
//! behind the `miner` CLI: the FrankenPHP child-process supervisor, the three
//! OS-integration installers (hosts alias, CLI shims, auto-start service), and
//! the orchestrator that composes them into install/run/uninstall flows.

pub mod config;
pub mod elevation;
pub mod errors;
pub mod hosts;
pub mod logging;
pub mod orchestrator;
pub mod platform;
pub mod registry;
pub mod runtime;
pub mod server;
pub mod service;
pub mod shims;
