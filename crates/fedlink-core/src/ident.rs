//! Identifier classification
//!
//! Two disjoint identifier shapes appear as the first segment of a request
//! path:
//! - Content hash: `<32 lowercase hex>+<decimal size>`, e.g.
//!   `d41d8cd98f00b204e9800998ecf8427e+0`. The same value may live on any
//!   number of federation members.
//! - Unique identifier: `<host>-<type>-<suffix>` with group lengths 5, 5, 15
//!   over `[a-z0-9]`. The host token names the member that owns the object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Type tag of a project-class unique identifier
pub const PROJECT_TYPE_TAG: &str = "j7d0g";

/// Type tag of a collection-class unique identifier
pub const COLLECTION_TYPE_TAG: &str = "4zz18";

static CONTENT_HASH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{32}\+[0-9]+$").expect("content hash regex"));

static UNIQUE_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9]{5}-[a-z0-9]{5}-[a-z0-9]{15}$").expect("unique id regex")
});

/// Shape of a request's leading path segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierKind {
    ContentHash,
    UniqueId,
    Unknown,
}

impl IdentifierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::ContentHash => "content_hash",
            IdentifierKind::UniqueId => "unique_id",
            IdentifierKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Object class encoded in a unique identifier's type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UniqueIdKind {
    Project,
    Collection,
    Unrecognized,
}

/// Classify a token. Matching is anchored on the whole string.
pub fn classify(token: &str) -> IdentifierKind {
    if CONTENT_HASH_RE.is_match(token) {
        IdentifierKind::ContentHash
    } else if UNIQUE_ID_RE.is_match(token) {
        IdentifierKind::UniqueId
    } else {
        IdentifierKind::Unknown
    }
}

/// Map a unique identifier's type tag to its object class
pub fn unique_id_kind(type_tag: &str) -> UniqueIdKind {
    match type_tag {
        PROJECT_TYPE_TAG => UniqueIdKind::Project,
        COLLECTION_TYPE_TAG => UniqueIdKind::Collection,
        _ => UniqueIdKind::Unrecognized,
    }
}

/// Borrowed view of a unique identifier split into its three groups
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniqueId<'a> {
    pub host_token: &'a str,
    pub type_tag: &'a str,
    pub rest: &'a str,
}

impl<'a> UniqueId<'a> {
    /// Parse a token that has the unique identifier shape
    pub fn parse(token: &'a str) -> Option<Self> {
        if classify(token) != IdentifierKind::UniqueId {
            return None;
        }
        let mut parts = token.splitn(3, '-');
        Some(Self {
            host_token: parts.next()?,
            type_tag: parts.next()?,
            rest: parts.next()?,
        })
    }

    pub fn kind(&self) -> UniqueIdKind {
        unique_id_kind(self.type_tag)
    }

    /// Federation object type this identifier is served under, if any
    pub fn object_type(&self) -> Option<ObjectType> {
        match self.kind() {
            UniqueIdKind::Project => Some(ObjectType::Projects),
            UniqueIdKind::Collection => Some(ObjectType::Collections),
            UniqueIdKind::Unrecognized => None,
        }
    }
}

/// Object type path segment used when talking to federation members
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectType {
    Collections,
    Projects,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Collections => "collections",
            ObjectType::Projects => "projects",
        }
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
