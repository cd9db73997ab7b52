use serde::{Deserialize, Serialize};

use crate::admission_request::AdmissionRequest;
use crate::admission_response::AdmissionResponse;

pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";
pub const ADMISSION_V1: &str = "admission.k8s.io/v1";
pub const ADMISSION_V1BETA1: &str = "admission.k8s.io/v1beta1";

/// The envelope the API server POSTs to the webhook.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,

    pub request: AdmissionRequest,
}

/// The envelope sent back to the API server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReviewResponse {
    pub kind: String,
    pub api_version: String,
    pub response: AdmissionResponse,
}

impl AdmissionReviewResponse {
    /// Wrap `response` using the protocol version of `review`.
    ///
    /// The API server refuses responses whose `apiVersion` differs from the
    /// one it sent. Unknown or missing versions are answered with v1.
    pub fn for_review(review: &AdmissionReviewRequest, response: AdmissionResponse) -> Self {
        let api_version = match review.api_version.as_deref() {
            Some(ADMISSION_V1BETA1) => ADMISSION_V1BETA1,
            _ => ADMISSION_V1,
        };

        AdmissionReviewResponse {
            kind: ADMISSION_REVIEW_KIND.to_owned(),
            api_version: api_version.to_owned(),
            response,
        }
    }
}
