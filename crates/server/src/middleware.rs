//! Request gates applied in front of the handlers.

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use secrecy::ExposeSecret;
use tracing::warn;

use tonecheck_core::errors::{ApplicationError, InterfaceError};
use tonecheck_core::signature::constant_time_eq;
use tonecheck_slack::{Endpoint, VerifiedRequest, WebhookEnvelope};

use crate::error::ApiError;
use crate::state::AppState;

pub const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Buffers the body, checks the Slack signature and hands the handler a [`VerifiedRequest`].
pub async fn require_slack_signature(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(endpoint) = Endpoint::from_path(request.uri().path()) else {
        return next.run(request).await;
    };

    let (mut parts, body) = request.into_parts();
    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(error) => {
            return ApiError::from_application(
                ApplicationError::MalformedPayload(format!("unreadable request body: {error}")),
                "unassigned",
            )
            .into_response();
        }
    };

    let headers = parts
        .headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|value| (name.as_str(), value.to_owned())));
    let envelope = WebhookEnvelope::new(endpoint, headers, bytes.to_vec());
    let correlation_id = envelope.correlation_id().to_owned();

    match VerifiedRequest::verify(
        envelope,
        state.signing_secret.expose_secret().as_bytes(),
        state.clock.unix_timestamp(),
    ) {
        Ok(verified) => {
            parts.extensions.insert(verified);
            next.run(Request::from_parts(parts, Body::from(bytes))).await
        }
        Err(error) => {
            warn!(
                event_name = "slack.signature.rejected",
                correlation_id = %correlation_id,
                endpoint = endpoint.path(),
                reason = %error,
                "webhook signature rejected"
            );
            ApiError(ApplicationError::Authentication(error.to_string()).into_interface(correlation_id))
                .into_response()
        }
    }
}

/// Compares the `Authorization` header with the configured API key.
pub async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if presented.is_empty()
        || !constant_time_eq(presented.as_bytes(), state.api_key.expose_secret().as_bytes())
    {
        warn!(
            event_name = "system.http.api_key_rejected",
            correlation_id = "unassigned",
            path = %request.uri().path(),
            "api key rejected"
        );
        return ApiError(InterfaceError::Unauthorized { correlation_id: "unassigned".to_owned() })
            .into_response();
    }

    next.run(request).await
}
