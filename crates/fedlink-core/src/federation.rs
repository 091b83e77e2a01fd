//! Federation member table: maps host tokens to member base URLs

use std::collections::BTreeMap;

/// A single federation member
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederationMember {
    /// Five character host token (leading group of unique identifiers)
    pub host_token: String,
    /// Base URL without trailing slash, e.g. `https://fed-a.example.org`
    pub base_url: String,
}

/// Immutable host token -> base URL table, built once at startup.
///
/// Iteration order is sorted by host token, so probe order is stable for
/// the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct FederationTable {
    members: BTreeMap<String, String>,
}

impl FederationTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member, normalizing its base URL
    pub fn with_member(mut self, host_token: impl Into<String>, base_url: &str) -> Self {
        self.members
            .insert(host_token.into(), normalize_base_url(base_url));
        self
    }

    /// Base URL for a host token
    pub fn base_url(&self, host_token: &str) -> Option<&str> {
        self.members.get(host_token).map(String::as_str)
    }

    pub fn contains(&self, host_token: &str) -> bool {
        self.members.contains_key(host_token)
    }

    /// Members in probe order
    pub fn members(&self) -> impl Iterator<Item = FederationMember> + '_ {
        self.members.iter().map(|(token, url)| FederationMember {
            host_token: token.clone(),
            base_url: url.clone(),
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

impl FromIterator<(String, String)> for FederationTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::new(), |table, (token, url)| table.with_member(token, &url))
    }
}

/// Turn a configured host into a base URL.
///
/// Bare host names get an `https://` scheme; explicit `http://` or
/// `https://` values are kept. Trailing slashes are dropped.
pub fn normalize_base_url(value: &str) -> String {
    let value = value.trim().trim_end_matches('/');
    if value.starts_with("http://") || value.starts_with("https://") {
        value.to_string()
    } else {
        format!("https://{}", value)
    }
}
