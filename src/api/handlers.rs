//! HTTP request handlers for the tax engine API.
//!
//! This module contains the handler functions for all API endpoints.

use std::time::Instant;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::calculation::{calculate, compare_income_tax};

use super::request::{CalculationRequest, ComparisonRequest};
use super::response::{
    ApiError, ApiErrorResponse, CalculationResponse, ENGINE_VERSION, HealthResponse,
    TablesResponse,
};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/calculate", post(calculate_handler))
        .route("/compare/income-tax", post(compare_handler))
        .route("/tables", get(tables_handler))
        .route("/health", get(health_handler))
        .with_state(state)
}

/// Handler for POST /calculate.
///
/// Dispatches the request to the adapter named by its `tax` field and
/// wraps the result with a correlation id and the table year.
async fn calculate_handler(
    State(state): State<AppState>,
    payload: Result<Json<CalculationRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing calculation request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match calculate(&request, state.tables()) {
        Ok(result) => {
            info!(
                correlation_id = %correlation_id,
                tax_type = %result.tax_type,
                region = %result.region,
                tax = %result.tax,
                duration_us = start_time.elapsed().as_micros(),
                "Calculation completed successfully"
            );
            let tax_year = &state.config().metadata().tax_year;
            json_response(
                StatusCode::OK,
                CalculationResponse::new(correlation_id, tax_year.as_str(), result),
            )
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                tax_type = %request.tax_type(),
                error = %err,
                "Calculation failed"
            );
            error_response(err.into())
        }
    }
}

/// Handler for POST /compare/income-tax.
async fn compare_handler(
    State(state): State<AppState>,
    payload: Result<Json<ComparisonRequest>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(correlation_id = %correlation_id, "Processing comparison request");

    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(correlation_id, rejection),
    };

    let start_time = Instant::now();
    match compare_income_tax(
        request.income,
        request.eu_country,
        request.us_state,
        request.filing_status,
        state.tables(),
    ) {
        Ok(comparison) => {
            info!(
                correlation_id = %correlation_id,
                income = %comparison.income,
                spread = %comparison.spread,
                duration_us = start_time.elapsed().as_micros(),
                "Comparison completed successfully"
            );
            let tax_year = &state.config().metadata().tax_year;
            json_response(
                StatusCode::OK,
                CalculationResponse::new(correlation_id, tax_year.as_str(), comparison),
            )
        }
        Err(err) => {
            warn!(correlation_id = %correlation_id, error = %err, "Comparison failed");
            error_response(err.into())
        }
    }
}

/// Handler for GET /tables.
async fn tables_handler(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        TablesResponse::from(state.config().metadata()),
    )
}

/// Handler for GET /health.
async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok".to_string(),
            engine_version: ENGINE_VERSION.to_string(),
        },
    )
}

/// Turns a body that failed to deserialize into a `400` response.
///
/// Missing fields are reported as validation errors; anything else the
/// JSON extractor rejects is reported as malformed JSON.
fn rejection_response(correlation_id: Uuid, rejection: JsonRejection) -> Response {
    let error = match rejection {
        JsonRejection::JsonDataError(err) => {
            let body_text = err.body_text();
            warn!(
                correlation_id = %correlation_id,
                error = %body_text,
                "JSON data error"
            );
            if body_text.contains("missing field") {
                ApiError::validation_error(body_text)
            } else {
                ApiError::malformed_json(body_text)
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            warn!(
                correlation_id = %correlation_id,
                error = %err,
                "JSON syntax error"
            );
            ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
        }
        JsonRejection::MissingJsonContentType(_) => {
            warn!(correlation_id = %correlation_id, "Missing JSON content type");
            ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
        }
        _ => {
            warn!(correlation_id = %correlation_id, "Unreadable request body");
            ApiError::malformed_json("Failed to parse request body")
        }
    };
    error_response(ApiErrorResponse::bad_request(error))
}

fn error_response(error: ApiErrorResponse) -> Response {
    json_response(error.status, error.error)
}

fn json_response<T: serde::Serialize>(status: StatusCode, body: T) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        Json(body),
    )
        .into_response()
}
