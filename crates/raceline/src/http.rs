//! Plain-HTTP status surface: a health probe and a service banner.
//!
//! Lives next to the WebSocket endpoint so deployment probes don't need
//! to speak the game protocol.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tokio::net::TcpListener;

use crate::coordinator::{now_ms, SharedState};
use crate::error::RacelineError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Health {
    status: &'static str,
    room_count: usize,
    /// Seconds since the server started.
    uptime: u64,
    /// Current server time, epoch ms.
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct Banner {
    name: &'static str,
    version: &'static str,
    status: &'static str,
}

pub(crate) fn router(shared: Arc<SharedState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/", get(banner))
        .with_state(shared)
}

pub(crate) async fn serve(
    listener: TcpListener,
    shared: Arc<SharedState>,
) -> Result<(), RacelineError> {
    axum::serve(listener, router(shared)).await?;
    Ok(())
}

async fn health(State(shared): State<Arc<SharedState>>) -> Json<Health> {
    Json(Health {
        status: "online",
        room_count: shared.room_count().await,
        uptime: shared.uptime().as_secs(),
        timestamp: now_ms(),
    })
}

async fn banner() -> Json<Banner> {
    Json(Banner {
        name: "Raceline",
        version: env!("CARGO_PKG_VERSION"),
        status: "running",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_reports_live_room_count() {
        let shared = Arc::new(SharedState::new());
        {
            let mut c = shared.coordinator().await;
            let batch =
                c.create_room(raceline_protocol::ConnectionId::new(1), None);
            drop(batch); // nobody registered, nothing to deliver
        }

        let Json(health) = health(State(Arc::clone(&shared))).await;
        assert_eq!(health.status, "online");
        assert_eq!(health.room_count, 1);
        assert!(health.timestamp > 0);
    }

    #[tokio::test]
    async fn test_banner_names_the_service() {
        let Json(banner) = banner().await;
        assert_eq!(banner.name, "Raceline");
        assert_eq!(banner.status, "running");
        assert!(!banner.version.is_empty());
    }
}
