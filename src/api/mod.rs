//! HTTP API for the tax engine.
//!
//! A thin axum layer over the pure calculation core: one endpoint that
//! dispatches any [`CalculationRequest`], the income tax comparison, and
//! read-only table metadata.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{CalculationRequest, ComparisonRequest};
pub use response::{
    ApiError, ApiErrorResponse, CalculationResponse, ENGINE_VERSION, HealthResponse,
    TablesResponse,
};
pub use state::AppState;
