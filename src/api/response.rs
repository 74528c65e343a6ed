//! Response types for the tax engine API.
//!
//! This module defines the success envelope returned by the calculation
//! endpoints, the error body, and the mapping from engine errors to HTTP
//! status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::TablesMetadata;
use crate::error::EngineError;

/// Version reported in every calculation response.
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Envelope for a successful calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse<T> {
    /// Correlation id, also written to the logs.
    pub calculation_id: Uuid,
    /// When the calculation ran.
    pub timestamp: DateTime<Utc>,
    /// Engine version.
    pub engine_version: String,
    /// Tax year of the tables used.
    pub tax_year: String,
    /// The calculation output.
    pub result: T,
}

impl<T> CalculationResponse<T> {
    /// Wraps `result` with the request's correlation id.
    pub fn new(calculation_id: Uuid, tax_year: impl Into<String>, result: T) -> Self {
        Self {
            calculation_id,
            timestamp: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            tax_year: tax_year.into(),
            result,
        }
    }
}

/// Body of `GET /tables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TablesResponse {
    /// Tax year of the loaded tables.
    pub tax_year: String,
    /// First day the tables apply.
    pub effective_from: NaiveDate,
    /// Where the figures come from.
    pub source: String,
    /// Caveats attached to the table set.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notes: Vec<String>,
}

impl From<&TablesMetadata> for TablesResponse {
    fn from(metadata: &TablesMetadata) -> Self {
        Self {
            tax_year: metadata.tax_year.clone(),
            effective_from: metadata.effective_from,
            source: metadata.source.clone(),
            notes: metadata.notes.clone(),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `"ok"` while the server is up.
    pub status: String,
    /// Engine version.
    pub engine_version: String,
}

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A `400 Bad Request` carrying `error`.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        match error {
            EngineError::ConfigNotFound { .. }
            | EngineError::ConfigParseError { .. }
            | EngineError::InvalidBracketTable { .. } => ApiErrorResponse {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::with_details(
                    "CONFIG_ERROR",
                    "Configuration error",
                    error.to_string(),
                ),
            },
            EngineError::UnsupportedRegion { ref tax, ref selector } => {
                ApiErrorResponse::bad_request(ApiError::with_details(
                    "UNSUPPORTED_REGION",
                    error.to_string(),
                    format!("The rule tables have no {} entry for '{}'", tax, selector),
                ))
            }
            EngineError::InvalidInput { ref field, .. } => {
                ApiErrorResponse::bad_request(ApiError::with_details(
                    "INVALID_INPUT",
                    error.to_string(),
                    format!("Check the value of '{}'", field),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_serialization() {
        let error = ApiError::new("TEST_ERROR", "Test message");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("\"code\":\"TEST_ERROR\""));
        assert!(json.contains("\"message\":\"Test message\""));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_unsupported_region_maps_to_bad_request() {
        let response: ApiErrorResponse = EngineError::UnsupportedRegion {
            tax: "stamp duty".to_string(),
            selector: "Sweden".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "UNSUPPORTED_REGION");
        assert!(response.error.message.contains("Sweden"));
    }

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let response: ApiErrorResponse = EngineError::InvalidInput {
            field: "income".to_string(),
            message: "exceeds maximum".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.error.code, "INVALID_INPUT");
    }

    #[test]
    fn test_config_errors_are_server_errors() {
        let response: ApiErrorResponse = EngineError::InvalidBracketTable {
            message: "gap".to_string(),
        }
        .into();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.error.code, "CONFIG_ERROR");
    }

    #[test]
    fn test_calculation_response_carries_version() {
        let response = CalculationResponse::new(Uuid::new_v4(), "2024-25", 42);
        assert_eq!(response.engine_version, ENGINE_VERSION);
        assert_eq!(response.tax_year, "2024-25");
    }
}
