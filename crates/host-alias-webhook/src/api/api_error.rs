use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

/// Returned when the request body is not an AdmissionReview.
///
/// Rendered as `{"message": "...", "status": <code>}` with the same HTTP status.
#[derive(Debug, Serialize)]
pub(crate) struct ApiError {
    #[serde(skip)]
    pub(crate) status: StatusCode,
    pub(crate) message: String,
    #[serde(rename = "status")]
    code: u16,
}

impl ApiError {
    pub(crate) fn new(status: StatusCode, message: String) -> Self {
        ApiError {
            status,
            message,
            code: status.as_u16(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let error = ApiError::new(rejection.status(), rejection.body_text());
        warn!(
            status = error.code,
            error = error.message.as_str(),
            "cannot parse admission review"
        );
        error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, axum::Json(&self)).into_response()
    }
}
