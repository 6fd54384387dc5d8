use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;

use crate::error::CheckError;

/// `axum::Json` whose rejections use the v1 error envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(CheckError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for CheckError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> CheckError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                CheckError::Validation(format!("Missing required field: {field}"))
            } else {
                CheckError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            CheckError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => {
            CheckError::Validation("Missing `Content-Type: application/json` header".to_string())
        }
        JsonRejection::BytesRejection(_) => {
            CheckError::Internal("Failed to read request body".to_string())
        }
        _ => CheckError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
