use axum::{
    Json,
    extract::{FromRequest, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{Span, debug};

use crate::{
    admission_request::AdmissionRequest,
    admission_response::AdmissionResponse,
    api::{
        admission_review::{AdmissionReviewRequest, AdmissionReviewResponse},
        api_error::ApiError,
        state::ApiServerState,
    },
};

// create an extractor that internally uses `axum::Json` but has a custom rejection
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub(crate) struct JsonExtractor<T>(T);

#[tracing::instrument(
    name = "host_alias_mutation",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        kind=tracing::field::Empty,
        resource=tracing::field::Empty,
        dry_run=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Run the host alias mutator against the pod carried by the AdmissionReview.
///
/// The mutator only performs CPU bound work that completes in microseconds,
/// hence it's run straight on the async task.
pub(crate) async fn mutate_handler(
    State(state): State<Arc<ApiServerState>>,
    JsonExtractor(admission_review): JsonExtractor<AdmissionReviewRequest>,
) -> Json<AdmissionReviewResponse> {
    debug!(admission_review = ?admission_review, "admission review received");

    populate_span_with_admission_request_data(&admission_review.request);

    let response = state.mutator.handle(&admission_review.request);

    populate_span_with_mutation_results(&response);
    debug!(response = ?response, "pod reviewed");

    Json(AdmissionReviewResponse::for_review(&admission_review, response))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    let span = Span::current();
    span.record("request_uid", adm_req.uid.as_str());
    span.record("kind", adm_req.kind.kind.as_str());
    span.record("resource", adm_req.resource.resource.as_str());
    span.record("operation", adm_req.operation.as_str());
    span.record("name", adm_req.name.as_deref().unwrap_or_default());
    span.record("namespace", adm_req.namespace.as_deref().unwrap_or_default());
    span.record("dry_run", adm_req.dry_run.unwrap_or_default());
}

fn populate_span_with_mutation_results(response: &AdmissionResponse) {
    let span = Span::current();
    span.record("allowed", response.allowed);
    span.record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            span.record("response_code", code);
        }
        if let Some(message) = &status.message {
            span.record("response_message", message.as_str());
        }
    }
}
