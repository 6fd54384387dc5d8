//! # V1 API Response Envelope & Error Contract
//!
//! Every v1 endpoint returns an [`ApiResponse<T>`] envelope with two optional
//! top-level fields:
//!
//! ```json
//! {
//!   "data": { ... },       // present on success, absent on error
//!   "error": { "code": "unprocessable_claim", "message": "..." }  // present on error
//! }
//! ```
//!
//! Report ids are nanoids, 21 characters (e.g. `"V1StGXR8_Z5jdHi6B-myT"`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::CheckError;

/// Machine-readable error code included in every error response.
///
/// Serialized as a snake_case string on the wire (e.g. `"invalid_request"`).
/// Each variant maps to a fixed HTTP status code via [`ErrorCode::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The request was malformed or failed validation. HTTP 400.
    InvalidRequest,
    /// Credentials are missing or invalid. HTTP 401.
    Unauthorized,
    /// No subject and effect could be read from the claim, or PubMed
    /// refused the search built from it. HTTP 422.
    UnprocessableClaim,
    /// An upstream service is throttling us. HTTP 429.
    RateLimited,
    /// An unexpected server-side error occurred. Internal details are never
    /// leaked to the client. HTTP 500.
    InternalError,
    /// A required model is not configured. HTTP 501.
    NotImplemented,
    /// An upstream service failed. HTTP 502.
    UpstreamError,
    /// A pipeline step exceeded its time budget. HTTP 504.
    Timeout,
}

impl ErrorCode {
    /// Returns the HTTP status code corresponding to this error code.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::UnprocessableClaim => StatusCode::UNPROCESSABLE_ENTITY,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotImplemented => StatusCode::NOT_IMPLEMENTED,
            Self::UpstreamError => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRequest => write!(f, "invalid_request"),
            Self::Unauthorized => write!(f, "unauthorized"),
            Self::UnprocessableClaim => write!(f, "unprocessable_claim"),
            Self::RateLimited => write!(f, "rate_limited"),
            Self::InternalError => write!(f, "internal_error"),
            Self::NotImplemented => write!(f, "not_implemented"),
            Self::UpstreamError => write!(f, "upstream_error"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Structured error payload within the API envelope.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ApiError {
    /// Machine-readable error classification.
    pub code: ErrorCode,
    /// Human-readable description safe to display to end users.
    pub message: String,
}

/// Canonical v1 API response envelope.
///
/// On success, `data` is present and `error` is absent. On error, `error` is
/// present and `data` is absent. The HTTP status is derived from the error
/// code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,

    /// HTTP status to use in the response. Not serialized on the wire.
    #[serde(skip)]
    status: StatusCode,
}

impl<T: Serialize> ApiResponse<T> {
    /// Success response with data (HTTP 200).
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            status: StatusCode::OK,
        }
    }

    /// Error response. HTTP status is derived from the [`ErrorCode`].
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        let status = code.status();
        Self {
            data: None,
            error: Some(ApiError {
                code,
                message: message.into(),
            }),
            status,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status = self.status;
        match serde_json::to_value(&self) {
            Ok(body) => (status, Json(body)).into_response(),
            Err(_) => {
                let body = serde_json::json!({
                    "error": {
                        "code": "internal_error",
                        "message": "An internal error occurred"
                    }
                });
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

fn rate_limit_message(retry_after: Option<u64>) -> String {
    match retry_after {
        Some(secs) => format!("Rate limit exceeded, retry after {secs} seconds"),
        None => "Rate limit exceeded".to_string(),
    }
}

impl<T: Serialize> From<CheckError> for ApiResponse<T> {
    /// Convert a [`CheckError`] into a v1 [`ApiResponse`].
    ///
    /// Internal error details are **never** leaked to the client. Transport
    /// errors can carry request URLs (and with them the NCBI key), so they
    /// are logged and replaced by a generic message too.
    fn from(err: CheckError) -> Self {
        match err {
            CheckError::InvalidQuery(ref msg) | CheckError::Validation(ref msg) => {
                ApiResponse::error(ErrorCode::InvalidRequest, msg.clone())
            }

            CheckError::Json(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid JSON: {e}"))
            }

            CheckError::UrlParse(ref e) => {
                ApiResponse::error(ErrorCode::InvalidRequest, format!("Invalid URL: {e}"))
            }

            CheckError::ExtractionFailed(ref msg) | CheckError::SearchRejected(ref msg) => {
                ApiResponse::error(ErrorCode::UnprocessableClaim, msg.clone())
            }

            CheckError::RateLimitExceeded { retry_after }
            | CheckError::LlmRateLimit { retry_after } => {
                ApiResponse::error(ErrorCode::RateLimited, rate_limit_message(retry_after))
            }

            CheckError::LlmUnavailable(ref msg) => {
                ApiResponse::error(ErrorCode::NotImplemented, msg.clone())
            }

            CheckError::Timeout(ref msg) => ApiResponse::error(ErrorCode::Timeout, msg.clone()),

            CheckError::Upstream(ref msg) | CheckError::Publish(ref msg) => {
                ApiResponse::error(ErrorCode::UpstreamError, msg.clone())
            }

            ref upstream @ (CheckError::Http(_) | CheckError::Xml(_) | CheckError::Llm(_)) => {
                tracing::error!(error = %upstream, "Upstream error mapped to v1 response");
                ApiResponse::error(ErrorCode::UpstreamError, "An upstream service failed")
            }

            ref internal @ (CheckError::Config(_) | CheckError::Io(_) | CheckError::Internal(_)) => {
                tracing::error!(error = %internal, "Internal error mapped to v1 response");
                ApiResponse::error(ErrorCode::InternalError, "An internal error occurred")
            }
        }
    }
}

impl IntoResponse for CheckError {
    fn into_response(self) -> Response {
        ApiResponse::<()>::from(self).into_response()
    }
}
