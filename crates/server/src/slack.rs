use axum::{
    extract::State,
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::post,
    Extension, Router,
};

use tonecheck_slack::payloads::{COMMANDS_PATH, EVENTS_PATH, INTERACTIONS_PATH, VERIFICATION_PATH};
use tonecheck_slack::VerifiedRequest;

use crate::error::{reply_response, ApiError};
use crate::middleware::require_slack_signature;
use crate::state::AppState;

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(EVENTS_PATH, post(webhook))
        .route(VERIFICATION_PATH, post(webhook))
        .route(COMMANDS_PATH, post(webhook))
        .route(INTERACTIONS_PATH, post(webhook))
        .route_layer(from_fn_with_state(state, require_slack_signature))
}

async fn webhook(
    State(state): State<AppState>,
    Extension(request): Extension<VerifiedRequest>,
) -> Response {
    match state.router.route(&request).await {
        Ok(reply) => reply_response(reply),
        Err(error) => ApiError::from_application(error, request.correlation_id()).into_response(),
    }
}
