//! fedlink: federated link resolver
//!
//! Re-exports the workspace crates:
//! - [`core`]: identifier classification, federation table, configuration
//! - [`server`]: resolution cache, federation resolver, redirect planner and
//!   the HTTP server

pub use fedlink_core as core;
pub use fedlink_server as server;
