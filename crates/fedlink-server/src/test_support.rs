//! Mock federation members for unit tests

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;

/// A federation member answering every lookup with fixed statuses
pub struct MockMember {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
}

impl MockMember {
    /// Number of lookups this member has served
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Start a member that answers `collections` and `projects` lookups with
/// the given statuses
pub async fn spawn_member(collections: StatusCode, projects: StatusCode) -> MockMember {
    spawn_member_with_delay(collections, projects, Duration::ZERO).await
}

/// Like [`spawn_member`], but every answer is delayed by `delay`
pub async fn spawn_member_with_delay(
    collections: StatusCode,
    projects: StatusCode,
    delay: Duration,
) -> MockMember {
    let hits = Arc::new(AtomicUsize::new(0));

    let collection_hits = hits.clone();
    let project_hits = hits.clone();
    let router = Router::new()
        .route(
            "/collections/{id}",
            get(move || {
                let hits = collection_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    collections
                }
            }),
        )
        .route(
            "/projects/{id}",
            get(move || {
                let hits = project_hits.clone();
                async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(delay).await;
                    projects
                }
            }),
        );

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock member");
    let addr = listener.local_addr().expect("mock member addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    MockMember {
        base_url: format!("http://{}", addr),
        hits,
    }
}

/// Base URL of a port with nothing listening on it
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind probe port");
    let addr: SocketAddr = listener.local_addr().expect("probe port addr");
    drop(listener);
    format!("http://{}", addr)
}
