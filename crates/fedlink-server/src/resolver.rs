//! Federation resolver: locate an object by probing federation members
//!
//! Members are probed one at a time, in host token order, with
//! `GET <base>/<object type>/<identifier>`. The first success status wins
//! and is cached; cached identifiers are never probed again.

use std::sync::Arc;
use std::time::{Duration, Instant};

use fedlink_core::{FederationTable, ObjectType};
use reqwest::Client;

use crate::cache::{CacheMap, Location, ResolutionCache};
use crate::error::Result;
use crate::metrics;

/// Result of a single member probe
#[derive(Debug)]
enum ProbeOutcome {
    Found,
    Missing(reqwest::StatusCode),
    Failed(reqwest::Error),
}

/// Resolves identifiers against the federation, backed by the shared cache
#[derive(Clone)]
pub struct FederationResolver {
    federation: Arc<FederationTable>,
    cache: Arc<ResolutionCache>,
    http: Client,
}

impl FederationResolver {
    /// Build a resolver whose probes each give up after `probe_timeout`
    pub fn new(
        federation: Arc<FederationTable>,
        cache: Arc<ResolutionCache>,
        probe_timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(probe_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;

        Ok(Self::with_client(federation, cache, http))
    }

    /// Build a resolver on top of an existing HTTP client
    pub fn with_client(
        federation: Arc<FederationTable>,
        cache: Arc<ResolutionCache>,
        http: Client,
    ) -> Self {
        Self {
            federation,
            cache,
            http,
        }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    pub fn federation(&self) -> &Arc<FederationTable> {
        &self.federation
    }

    /// Resolve `identifier` to a member URL.
    ///
    /// Cached entries (unique identifier map first, then content hash map)
    /// are returned with a refreshed timestamp. Otherwise members are probed
    /// in order; a transport failure on one member moves on to the next.
    /// `None` means no member has the object.
    pub async fn resolve(&self, object_type: ObjectType, identifier: &str) -> Option<String> {
        let started = Instant::now();

        for map in [CacheMap::UniqueId, CacheMap::ContentHash] {
            if let Some(cached) = self.cache.map(map).touch(identifier) {
                metrics::record_cache_hit(map);
                metrics::record_resolution(metrics::RESOLUTION_CACHED, started.elapsed());
                return Some(cached.url);
            }
        }

        for member in self.federation.members() {
            let url = format!("{}/{}/{}", member.base_url, object_type, identifier);

            match self.probe(&url).await {
                ProbeOutcome::Found => {
                    metrics::record_probe(metrics::PROBE_OK);
                    let map = match object_type {
                        ObjectType::Collections => CacheMap::ContentHash,
                        ObjectType::Projects => CacheMap::UniqueId,
                    };
                    let stored = self.cache.map(map).upsert(identifier, Location::now(url));

                    tracing::info!(
                        identifier,
                        member = %member.host_token,
                        map = map.as_str(),
                        url = %stored.url,
                        "Cache add"
                    );
                    metrics::set_cache_entries(self.cache.stats());
                    metrics::record_resolution(metrics::RESOLUTION_FOUND, started.elapsed());
                    return Some(stored.url);
                }
                ProbeOutcome::Missing(status) => {
                    metrics::record_probe(metrics::PROBE_MISS);
                    tracing::debug!(
                        member = %member.host_token,
                        url = %url,
                        status = status.as_u16(),
                        "Federation probe miss"
                    );
                }
                ProbeOutcome::Failed(e) => {
                    metrics::record_probe(metrics::PROBE_TRANSPORT_ERROR);
                    tracing::warn!(
                        member = %member.host_token,
                        url = %url,
                        error = %e,
                        "Federation probe failed, trying next member"
                    );
                }
            }
        }

        metrics::record_resolution(metrics::RESOLUTION_NOT_FOUND, started.elapsed());
        None
    }

    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.http.get(url).send().await {
            Ok(resp) if resp.status().is_success() => ProbeOutcome::Found,
            Ok(resp) => ProbeOutcome::Missing(resp.status()),
            Err(e) => ProbeOutcome::Failed(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_member, spawn_member_with_delay, unreachable_base_url};
    use axum::http::StatusCode;

    const HASH: &str = "d41d8cd98f00b204e9800998ecf8427e+0";

    fn resolver(members: &[(&str, &str)], timeout: Duration) -> FederationResolver {
        let table = members
            .iter()
            .fold(FederationTable::new(), |t, (token, url)| t.with_member(*token, url));
        FederationResolver::new(Arc::new(table), Arc::new(ResolutionCache::new()), timeout)
            .unwrap()
    }

    #[tokio::test]
    async fn test_skips_unreachable_member_and_caches() {
        let dead = unreachable_base_url().await;
        let b = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let resolver = resolver(&[("a", dead.as_str()), ("b", b.base_url.as_str())], Duration::from_secs(5));

        let expected = format!("{}/collections/{}", b.base_url, HASH);
        let first = resolver.resolve(ObjectType::Collections, HASH).await;
        assert_eq!(first.as_deref(), Some(expected.as_str()));
        assert_eq!(b.hits(), 1);

        let second = resolver.resolve(ObjectType::Collections, HASH).await;
        assert_eq!(second, first);
        assert_eq!(b.hits(), 1, "cache hit must not probe");

        assert!(resolver.cache().content_hash().contains(HASH));
        assert!(!resolver.cache().unique_id().contains(HASH));
    }

    #[tokio::test]
    async fn test_first_success_in_host_token_order_wins() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::NOT_FOUND).await;
        let b = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let c = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let resolver = resolver(
            &[("ccccc", c.base_url.as_str()), ("aaaaa", a.base_url.as_str()), ("bbbbb", b.base_url.as_str())],
            Duration::from_secs(5),
        );

        let url = resolver.resolve(ObjectType::Collections, HASH).await.unwrap();
        assert_eq!(url, format!("{}/collections/{}", b.base_url, HASH));
        assert_eq!(a.hits(), 1);
        assert_eq!(b.hits(), 1);
        assert_eq!(c.hits(), 0);
    }

    #[tokio::test]
    async fn test_no_member_has_object() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::NOT_FOUND).await;
        let b = spawn_member(StatusCode::INTERNAL_SERVER_ERROR, StatusCode::NOT_FOUND).await;
        let resolver = resolver(&[("a", a.base_url.as_str()), ("b", b.base_url.as_str())], Duration::from_secs(5));

        assert!(resolver.resolve(ObjectType::Collections, HASH).await.is_none());
        assert_eq!(resolver.cache().stats().content_hash_entries, 0);

        // misses are not cached, so every call probes again
        assert!(resolver.resolve(ObjectType::Collections, HASH).await.is_none());
        assert_eq!(a.hits(), 2);
        assert_eq!(b.hits(), 2);
    }

    #[tokio::test]
    async fn test_projects_are_cached_in_unique_id_map() {
        let a = spawn_member(StatusCode::NOT_FOUND, StatusCode::OK).await;
        let resolver = resolver(&[("a", a.base_url.as_str())], Duration::from_secs(5));

        let url = resolver.resolve(ObjectType::Projects, HASH).await.unwrap();
        assert_eq!(url, format!("{}/projects/{}", a.base_url, HASH));
        assert!(resolver.cache().unique_id().contains(HASH));
        assert!(!resolver.cache().content_hash().contains(HASH));
    }

    #[tokio::test]
    async fn test_cached_entry_answers_either_object_type() {
        let a = spawn_member(StatusCode::OK, StatusCode::OK).await;
        let resolver = resolver(&[("a", a.base_url.as_str())], Duration::from_secs(5));

        let collections = resolver.resolve(ObjectType::Collections, HASH).await.unwrap();
        let projects = resolver.resolve(ObjectType::Projects, HASH).await.unwrap();

        assert_eq!(projects, collections);
        assert_eq!(a.hits(), 1);
        assert!(!resolver.cache().unique_id().contains(HASH));
    }

    #[tokio::test]
    async fn test_redirect_is_not_success() {
        let a = spawn_member(StatusCode::FOUND, StatusCode::NOT_FOUND).await;
        let b = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let resolver = resolver(&[("a", a.base_url.as_str()), ("b", b.base_url.as_str())], Duration::from_secs(5));

        let url = resolver.resolve(ObjectType::Collections, HASH).await.unwrap();
        assert!(url.starts_with(b.base_url.as_str()));
    }

    #[tokio::test]
    async fn test_slow_member_times_out() {
        let slow = spawn_member_with_delay(
            StatusCode::OK,
            StatusCode::OK,
            Duration::from_secs(5),
        )
        .await;
        let fast = spawn_member(StatusCode::OK, StatusCode::NOT_FOUND).await;
        let resolver = resolver(
            &[("a", slow.base_url.as_str()), ("b", fast.base_url.as_str())],
            Duration::from_millis(200),
        );

        let started = Instant::now();
        let url = resolver.resolve(ObjectType::Collections, HASH).await.unwrap();
        assert!(url.starts_with(fast.base_url.as_str()));
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_empty_federation() {
        let resolver = resolver(&[], Duration::from_secs(1));
        assert!(resolver.resolve(ObjectType::Collections, HASH).await.is_none());
    }
}
