//! HTTP subscribe endpoint
//!
//! One `GET` route that turns the response into a long-lived
//! `text/event-stream`, fed by the frames the relay writes into the
//! connection's sink.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use super::RelayService;

/// Build a router exposing the subscribe endpoint at `/events`
///
/// Nest it under any prefix the surrounding application uses.
pub fn router(service: Arc<RelayService>) -> Router {
    Router::new()
        .route("/events", get(subscribe))
        .with_state(service)
}

async fn subscribe(State(service): State<Arc<RelayService>>) -> Response {
    let (id, stream) = service.subscribe().await;
    tracing::debug!(client_id = id, "Live update stream opened");

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(stream),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use crate::config::RelayConfig;
    use crate::feed::{ChangeFeedSource, MemoryFeed};

    use super::*;

    #[tokio::test]
    async fn test_router_builds() {
        let feed = Arc::new(MemoryFeed::new());
        let service = Arc::new(RelayService::new(
            RelayConfig::default(),
            feed as Arc<dyn ChangeFeedSource>,
        ));

        // Building the router must not open the feed.
        let _router = router(Arc::clone(&service));
        assert!(!service.watcher().is_running().await);
    }
}
