//! v1 Claim validation handler.

use axum::extract::State;
use std::time::Instant;
use validator::Validate;

use crate::api::extractors::AppJson;
use crate::api::v1::dto::ValidateClaimRequest;
use crate::api::v1::response::{ApiError, ApiResponse, ErrorCode};
use crate::api::AppState;
use crate::models::ValidationReport;

/// `POST /api/v1/claims:validate`
///
/// Runs the full pipeline for one claim. Evidence search failures do not fail
/// the request: the report comes back with `evidenceStatus.status =
/// "unavailable"` and an inconclusive verdict.
#[utoipa::path(
    post,
    path = "/api/v1/claims:validate",
    tag = "claims",
    operation_id = "claims.validate",
    request_body = ValidateClaimRequest,
    responses(
        (status = 200, description = "Validation report", body = ValidationReport),
        (status = 400, description = "Invalid request", body = ApiError),
        (status = 401, description = "Missing or invalid API key", body = ApiError),
        (status = 422, description = "No subject and effect found in the claim", body = ApiError),
        (status = 501, description = "Extraction model not configured", body = ApiError),
        (status = 504, description = "A pipeline step timed out", body = ApiError),
    )
)]
pub async fn validate_claim(
    State(state): State<AppState>,
    AppJson(req): AppJson<ValidateClaimRequest>,
) -> ApiResponse<ValidationReport> {
    if let Err(errors) = req.validate() {
        return ApiResponse::error(ErrorCode::InvalidRequest, errors.to_string());
    }
    if req.claim.trim().is_empty() {
        return ApiResponse::error(ErrorCode::InvalidRequest, "Claim cannot be empty");
    }

    let start = Instant::now();
    match state.validation.validate(&req.claim, &req.options()).await {
        Ok(report) => {
            tracing::debug!(
                report_id = %report.id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Validation request served"
            );
            ApiResponse::success(report)
        }
        Err(e) => ApiResponse::from(e),
    }
}
