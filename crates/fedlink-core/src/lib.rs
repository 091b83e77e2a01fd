//! fedlink-core: identifier rules and configuration for the federated
//! link resolver
//!
//! Requests name storage objects by one of two identifier shapes:
//! - Content hash (`<md5>+<size>`): content-addressed, may be held by any
//!   federation member, so it has to be located by probing members.
//! - Unique identifier (`<host>-<type>-<suffix>`): owned by the member whose
//!   host token leads the identifier, so it is routed without probing.
//!
//! This crate holds the pure parts: classification, the federation member
//! table, and the configuration it is loaded from. Resolution, caching and
//! the HTTP surface live in `fedlink-server`.

mod config;
mod error;
mod federation;
mod ident;

pub use config::{Config, DEFAULT_CONFIG_FILE, DEFAULT_PORT, DEFAULT_PROBE_TIMEOUT_MS};
pub use error::Error;
pub use federation::{normalize_base_url, FederationMember, FederationTable};
pub use ident::{
    classify, unique_id_kind, IdentifierKind, ObjectType, UniqueId, UniqueIdKind,
    COLLECTION_TYPE_TAG, PROJECT_TYPE_TAG,
};

pub type Result<T> = std::result::Result<T, Error>;
