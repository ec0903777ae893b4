//! Axum router construction and shared middleware.

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

/// Default per-request timeout applied to all routes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/records", post(handlers::create).get(handlers::index))
        .route(
            "/records/:id",
            get(handlers::show)
                .put(handlers::edit)
                .delete(handlers::destroy),
        )
        .route("/rotate", post(handlers::rotate))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(CompressionLayer::new())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    use crate::crypto::{FieldEncryptor, KeyMap, KeyedCipher, KEY_LEN};
    use crate::store::RecordStore;

    fn test_state() -> AppState {
        let keys = KeyMap::from([(1, vec![0x42u8; KEY_LEN])]);
        let cipher = Arc::new(KeyedCipher::new(1, &keys).unwrap());
        let store = RecordStore::new(FieldEncryptor::new(cipher.clone()));
        AppState::new(store, cipher)
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(test_state());
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn health_route_exists() {
        let app = build(test_state());
        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 200);
    }
}
