//! `POST /api/v1/sentiment-analysis`: scores arbitrary text for API-key holders.

use axum::{
    body::Bytes, extract::State, middleware::from_fn_with_state, routing::post, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use tonecheck_core::domain::{check_length, ANALYSED_TEXT_MAX_CHARS};
use tonecheck_core::errors::{ApplicationError, ExternalService};
use tonecheck_core::sentiment::{Classification, SentimentModel};

use crate::error::ApiError;
use crate::middleware::require_api_key;
use crate::state::AppState;

pub const SENTIMENT_ANALYSIS_PATH: &str = "/api/v1/sentiment-analysis";

#[derive(Clone, Debug, Deserialize)]
pub struct SentimentRequest {
    pub sentiment_type: SentimentModel,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SentimentResponse {
    pub text: String,
    pub sentiment_result: Classification,
}

pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(SENTIMENT_ANALYSIS_PATH, post(analyze))
        .route_layer(from_fn_with_state(state, require_api_key))
}

async fn analyze(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SentimentResponse>, ApiError> {
    let correlation_id = "sentiment-analysis";
    let request = parse_request(&body)
        .map_err(|error| ApiError::from_application(error, correlation_id))?;

    let scores = state.router.oracle().score(&request.text).await.map_err(|error| {
        ApiError::from_application(
            ApplicationError::External {
                service: ExternalService::SentimentOracle,
                message: error.to_string(),
            },
            correlation_id,
        )
    })?;
    let sentiment_result = scores.select(request.sentiment_type).classify().map_err(|error| {
        ApiError::from_application(
            ApplicationError::External {
                service: ExternalService::SentimentOracle,
                message: error.to_string(),
            },
            correlation_id,
        )
    })?;

    info!(
        event_name = "sentiment.analysis.completed",
        correlation_id,
        model = ?request.sentiment_type,
        classification = %sentiment_result,
        "text scored"
    );
    Ok(Json(SentimentResponse { text: request.text, sentiment_result }))
}

fn parse_request(body: &[u8]) -> Result<SentimentRequest, ApplicationError> {
    let request: SentimentRequest = serde_json::from_slice(body)
        .map_err(|error| ApplicationError::Validation(error.to_string()))?;
    check_length("text", request.text.trim(), 1, ANALYSED_TEXT_MAX_CHARS)?;
    Ok(request)
}
