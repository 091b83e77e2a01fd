//! Prometheus metrics for the link resolver
//!
//! Labels carry identifier kinds, cache maps and outcomes only, never the
//! identifiers themselves.

use metrics::{counter, gauge, histogram};
use std::time::Duration;

use crate::cache::{CacheMap, CacheStats};
use crate::error::{Result, ServerError};

pub const PROBE_OK: &str = "ok";
pub const PROBE_MISS: &str = "miss";
pub const PROBE_TRANSPORT_ERROR: &str = "transport_error";

pub const RESOLUTION_CACHED: &str = "cached";
pub const RESOLUTION_FOUND: &str = "found";
pub const RESOLUTION_NOT_FOUND: &str = "not_found";

pub fn record_redirect(kind: &str, resolved: bool) {
    counter!(
        "fedlink_redirects_total",
        "kind" => kind.to_string(),
        "resolved" => resolved.to_string()
    )
    .increment(1);
}

pub fn record_cache_hit(map: CacheMap) {
    counter!("fedlink_cache_hits_total", "map" => map.as_str()).increment(1);
}

pub fn record_probe(outcome: &str) {
    counter!("fedlink_probes_total", "outcome" => outcome.to_string()).increment(1);
}

pub fn record_resolution(outcome: &str, duration: Duration) {
    counter!("fedlink_resolutions_total", "outcome" => outcome.to_string()).increment(1);
    histogram!("fedlink_resolution_duration_seconds", "outcome" => outcome.to_string())
        .record(duration.as_secs_f64());
}

pub fn set_cache_entries(stats: CacheStats) {
    gauge!("fedlink_cache_entries", "map" => CacheMap::ContentHash.as_str())
        .set(stats.content_hash_entries as f64);
    gauge!("fedlink_cache_entries", "map" => CacheMap::UniqueId.as_str())
        .set(stats.unique_id_entries as f64);
}

pub fn set_federation_members(count: usize) {
    gauge!("fedlink_federation_members").set(count as f64);
}

pub fn init_prometheus_recorder() -> Result<metrics_exporter_prometheus::PrometheusHandle> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| ServerError::Metrics(e.to_string()))
}
