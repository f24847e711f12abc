//! Huddle HTTP Shell
//!
//! Thin HTTP layer in front of the hub, built with Axum.
//!
//! # Endpoints
//!
//! ## WebSocket
//! - `GET /ws` - Upgrade and join the hub
//! - `POST /ws/send` - Push an alert to every client (form or JSON `payload`)
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use huddle::api::{serve, AppState};
//! use huddle::config::Config;
//! use huddle::websocket::Hub;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let (hub, _dispatcher) = Hub::start(config.hub.clone());
//!
//!     serve(AppState::new(hub, config.server)).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::websocket::websocket_handler;

/// Build the router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let ws_routes = Router::new()
        .route("/", get(websocket_handler))
        .route("/send", post(routes::send::send_alert));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let shared_state = Arc::new(state);

    Router::new()
        .nest("/ws", ws_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(shared_state)
}

/// Start the HTTP server and run until a shutdown signal arrives
pub async fn serve(state: AppState) -> Result<(), ApiError> {
    let addr = state.config.addr();
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Huddle listening on {}", addr);

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Huddle shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::websocket::testing::RecordingSink;
    use crate::websocket::{ConnectionId, Hub, HubConfig, Inbound, NotificationKind};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        let (hub, _dispatcher) = Hub::start(HubConfig::default());
        build_router(AppState::new(hub, ServerConfig::default()))
    }

    fn form_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    fn json_post(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/live")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_after_dispatcher_stops() {
        let (hub, dispatcher) = Hub::new(HubConfig::default());
        drop(dispatcher);
        let app = build_router(AppState::new(Arc::new(hub), ServerConfig::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/health/ready")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_send_alert() {
        let app = create_test_app();

        let response = app
            .oneshot(form_post("/ws/send", "payload=server+restart&message_type=warning"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_send_alert_json() {
        let app = create_test_app();

        let response = app
            .oneshot(json_post("/ws/send", r#"{"payload":"hello","message_type":"info"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn test_send_alert_json_empty_payload() {
        let app = create_test_app();

        let response = app
            .oneshot(json_post("/ws/send", r#"{"payload":"   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_alert_malformed_json() {
        let app = create_test_app();

        let response = app.oneshot(json_post("/ws/send", "{payload")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_send_alert_keeps_payload_whitespace() {
        let (hub, mut dispatcher) = Hub::new(HubConfig::default());
        let client = RecordingSink::new();
        dispatcher
            .handle(Inbound::Register {
                id: ConnectionId::new(1),
                sink: client.boxed(),
            })
            .await;
        client.clear();

        let app = build_router(AppState::new(Arc::new(hub), ServerConfig::default()));
        let response = app
            .oneshot(json_post("/ws/send", r#"{"payload":" hi ","message_type":"info"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);

        // the router held the last sender, so the queue drains and closes
        dispatcher.run().await;

        let received = client.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].kind, NotificationKind::Alert);
        assert_eq!(received[0].text, " hi ");
        assert_eq!(received[0].message_type, "info");
    }

    #[tokio::test]
    async fn test_send_alert_empty_payload() {
        let app = create_test_app();

        let response = app.oneshot(form_post("/ws/send", "payload=")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ws_requires_upgrade() {
        let app = create_test_app();

        let response = app
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }
}
