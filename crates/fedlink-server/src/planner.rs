//! Redirect planner: request path -> redirect target

use std::sync::Arc;

use fedlink_core::{classify, FederationTable, IdentifierKind, ObjectType, UniqueId};

use crate::cache::ResolutionCache;
use crate::metrics;
use crate::resolver::FederationResolver;

/// Request path split into its leading identifier and the rest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitPath<'a> {
    /// Path without its leading slash
    pub relative: &'a str,
    /// First segment
    pub lead: &'a str,
    /// Everything after the first segment, starting with `/`, or empty
    pub suffix: &'a str,
}

impl<'a> SplitPath<'a> {
    pub fn new(path: &'a str) -> Self {
        let relative = path.strip_prefix('/').unwrap_or(path);
        match relative.find('/') {
            Some(idx) => Self {
                relative,
                lead: &relative[..idx],
                suffix: &relative[idx..],
            },
            None => Self {
                relative,
                lead: relative,
                suffix: "",
            },
        }
    }
}

/// Computes where a request should be redirected
#[derive(Clone)]
pub struct RedirectPlanner {
    resolver: FederationResolver,
    default_redirect: String,
}

impl RedirectPlanner {
    /// `default_redirect` is the base URL (no trailing slash) used for
    /// anything that cannot be resolved
    pub fn new(resolver: FederationResolver, default_redirect: impl Into<String>) -> Self {
        Self {
            resolver,
            default_redirect: default_redirect.into(),
        }
    }

    pub fn default_redirect(&self) -> &str {
        &self.default_redirect
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        self.resolver.cache()
    }

    pub fn federation(&self) -> &Arc<FederationTable> {
        self.resolver.federation()
    }

    /// Plan the redirect for `path`. Never fails: anything unresolvable goes
    /// to `<default>/<path>`.
    pub async fn plan_redirect(&self, path: &str) -> String {
        let split = SplitPath::new(path);
        let kind = classify(split.lead);

        let planned = match kind {
            IdentifierKind::ContentHash => self.plan_content_hash(&split).await,
            IdentifierKind::UniqueId => self.plan_unique_id(&split),
            IdentifierKind::Unknown => None,
        };
        metrics::record_redirect(kind.as_str(), planned.is_some());

        let target =
            planned.unwrap_or_else(|| format!("{}/{}", self.default_redirect, split.relative));
        tracing::debug!(path, kind = %kind, redirect = %target, "Planned redirect");
        target
    }

    async fn plan_content_hash(&self, split: &SplitPath<'_>) -> Option<String> {
        // Both lookups run: the two object types are cached independently.
        self.resolver
            .resolve(ObjectType::Collections, split.lead)
            .await;
        self.resolver.resolve(ObjectType::Projects, split.lead).await;

        let cache = self.resolver.cache();
        cache
            .unique_id()
            .lookup(split.lead)
            .or_else(|| cache.content_hash().lookup(split.lead))
            .map(|location| format!("{}{}", location.url, split.suffix))
    }

    fn plan_unique_id(&self, split: &SplitPath<'_>) -> Option<String> {
        let id = UniqueId::parse(split.lead)?;
        let object_type = id.object_type()?;
        let base = self.resolver.federation().base_url(id.host_token)?;
        Some(format!("{}/{}/{}{}", base, object_type, split.lead, split.suffix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_member, unreachable_base_url};
    use axum::http::StatusCode;
    use std::time::Duration;

    const DEFAULT: &str = "https://landing.example";
    const HASH: &str = "d41d8cd98f00b204e9800998ecf8427e+0";

    fn planner(table: FederationTable) -> RedirectPlanner {
        let resolver = FederationResolver::new(
            Arc::new(table),
            Arc::new(ResolutionCache::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        RedirectPlanner::new(resolver, DEFAULT)
    }

    #[test]
    fn test_split_path() {
        let split = SplitPath::new("/abc/def/ghi");
        assert_eq!(split.relative, "abc/def/ghi");
        assert_eq!(split.lead, "abc");
        assert_eq!(split.suffix, "/def/ghi");

        let split = SplitPath::new("/abc");
        assert_eq!(split.lead, "abc");
        assert_eq!(split.suffix, "");

        let split = SplitPath::new("/abc/");
        assert_eq!(split.suffix, "/");

        let split = SplitPath::new("");
        assert_eq!(split.lead, "");
        assert_eq!(split.relative, "");

        // only one leading slash is stripped
        let split = SplitPath::new("//abc");
        assert_eq!(split.lead, "");
        assert_eq!(split.suffix, "/abc");
    }

    #[tokio::test]
    async fn test_unique_id_collection_routes_by_host_token() {
        let planner = planner(FederationTable::new().with_member("abcde", "https://fedA.example"));

        let target = planner
            .plan_redirect("/abcde-4zz18-000000000000000/x")
            .await;
        assert_eq!(
            target,
            "https://fedA.example/collections/abcde-4zz18-000000000000000/x"
        );
        assert_eq!(planner.cache().stats().content_hash_entries, 0);
        assert_eq!(planner.cache().stats().unique_id_entries, 0);
    }

    #[tokio::test]
    async fn test_unique_id_never_probes() {
        // an unreachable member would only matter if it were probed
        let dead = unreachable_base_url().await;
        let planner = planner(FederationTable::new().with_member("abcde", &dead));

        let target = planner.plan_redirect("/abcde-j7d0g-0123456789abcde").await;
        assert_eq!(target, format!("{}/projects/abcde-j7d0g-0123456789abcde", dead));
    }

    #[tokio::test]
    async fn test_unique_id_unknown_host_falls_back() {
        let planner = planner(FederationTable::new().with_member("abcde", "https://fedA.example"));

        let target = planner.plan_redirect("/zzzzz-4zz18-000000000000000").await;
        assert_eq!(target, format!("{}/zzzzz-4zz18-000000000000000", DEFAULT));
    }

    #[tokio::test]
    async fn test_unique_id_unrecognized_type_falls_back() {
        let planner = planner(FederationTable::new().with_member("abcde", "https://fedA.example"));

        let target = planner.plan_redirect("/abcde-tpzed-000000000000000/x").await;
        assert_eq!(target, format!("{}/abcde-tpzed-000000000000000/x", DEFAULT));
    }

    #[tokio::test]
    async fn test_unknown_shape_falls_back() {
        let planner = planner(FederationTable::new());
        assert_eq!(
            planner.plan_redirect("/not-an-id").await,
            format!("{}/not-an-id", DEFAULT)
        );
        assert_eq!(
            planner.plan_redirect("/not-an-id/deeper/path").await,
            format!("{}/not-an-id/deeper/path", DEFAULT)
        );
        assert_eq!(planner.plan_redirect("/").await, format!("{}/", DEFAULT));
    }

    #[tokio::test]
    async fn test_content_hash_resolves_with_suffix() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::NOT_FOUND).await;
        let b = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let planner = planner(
            FederationTable::new()
                .with_member("aaaaa", &a.base_url)
                .with_member("bbbbb", &b.base_url),
        );

        let target = planner
            .plan_redirect(&format!("/{}/dir/file.txt", HASH))
            .await;
        assert_eq!(
            target,
            format!("{}/collections/{}/dir/file.txt", b.base_url, HASH)
        );

        // collections cached on b, so the projects lookup is a cache hit
        assert_eq!(a.hits(), 1);
        assert_eq!(b.hits(), 1);

        let again = planner.plan_redirect(&format!("/{}", HASH)).await;
        assert_eq!(again, format!("{}/collections/{}", b.base_url, HASH));
        assert_eq!(a.hits() + b.hits(), 2);
    }

    #[tokio::test]
    async fn test_content_hash_prefers_unique_id_map() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::OK).await;
        let planner = planner(FederationTable::new().with_member("aaaaa", &a.base_url));

        let target = planner.plan_redirect(&format!("/{}", HASH)).await;
        assert_eq!(target, format!("{}/projects/{}", a.base_url, HASH));
        assert!(planner.cache().unique_id().contains(HASH));
    }

    #[tokio::test]
    async fn test_content_hash_unresolved_falls_back() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::NOT_FOUND).await;
        let planner = planner(FederationTable::new().with_member("aaaaa", &a.base_url));

        let target = planner.plan_redirect(&format!("/{}/x", HASH)).await;
        assert_eq!(target, format!("{}/{}/x", DEFAULT, HASH));
        // one probe per object type
        assert_eq!(a.hits(), 2);
    }
}
