//! fedlink-server: federated link resolver
//!
//! Redirects requests for storage objects to the federation member that
//! holds them. Content hashes are located by probing members and cached for
//! the life of the process; unique identifiers are routed straight to the
//! member named by their host token.

pub mod cache;
pub mod error;
pub mod metrics;
pub mod planner;
pub mod resolver;
pub mod routes;
pub mod server;
pub mod state;

#[cfg(test)]
mod test_support;

pub use cache::{CacheMap, CacheStats, Location, LocationMap, ResolutionCache};
pub use error::ServerError;
pub use planner::{RedirectPlanner, SplitPath};
pub use resolver::FederationResolver;
pub use routes::create_router;
pub use server::{FedlinkServer, ServerBuilder};
pub use state::{create_shared_state, AppState, ServerStats, SharedState};
