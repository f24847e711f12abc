//! Server Push Route
//!
//! - POST /ws/send - Push an alert to every connected client

use axum::{
    async_trait,
    extract::{FromRequest, Request, State},
    http::{header, StatusCode},
    Form, Json,
};
use std::sync::Arc;

use crate::api::dto::{SendRequest, SendResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::websocket::{Notification, NotificationKind};

/// Accepts a JSON body when the request says so, a form body otherwise
#[async_trait]
impl<S> FromRequest<S> for SendRequest
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|content_type| content_type.starts_with("application/json"));

        if is_json {
            let Json(request) = Json::<SendRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            Ok(request)
        } else {
            let Form(request) = Form::<SendRequest>::from_request(req, state)
                .await
                .map_err(|e| ApiError::Validation(e.body_text()))?;
            Ok(request)
        }
    }
}

/// POST /ws/send
///
/// Queues an `alert` notification with no originating connection. It goes
/// through the same queue as client actions, so it is ordered with them.
pub async fn send_alert(
    State(state): State<Arc<AppState>>,
    request: SendRequest,
) -> ApiResult<(StatusCode, Json<SendResponse>)> {
    if request.payload.trim().is_empty() {
        return Err(ApiError::Validation("payload must not be empty".to_string()));
    }

    tracing::info!(payload = %request.payload, "Pushing server alert");

    let mut notification = Notification::new(NotificationKind::Alert, request.payload);
    if let Some(message_type) = request.message_type {
        notification = notification.message_type(message_type);
    }
    state.hub.publish(notification).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SendResponse {
            queued: true,
            connections: state.ws_connection_count(),
        }),
    ))
}
