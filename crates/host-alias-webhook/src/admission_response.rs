use crate::errors::ResponseError;

use base64::{Engine as _, engine::general_purpose};
use serde::{Deserialize, Serialize};

/// This models the admission/v1/AdmissionResponse object of Kubernetes
/// See https://pkg.go.dev/k8s.io/kubernetes/pkg/apis/admission#AdmissionResponse
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// UID is an identifier for the individual request/response.
    /// This must be copied over from the corresponding AdmissionRequest.
    pub uid: String,

    /// Allowed indicates whether or not the admission request was permitted.
    pub allowed: bool,

    /// The type of Patch. Currently we only allow "JSONPatch".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch_type: Option<PatchType>,

    /// The patch body, base64 encoded. Currently we only support "JSONPatch" which implements RFC 6902.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,

    /// Status contains extra details into why an admission request was denied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<AdmissionResponseStatus>,
}

/// PatchType is the type of patch being used to represent the mutated object
#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub enum PatchType {
    #[serde(rename = "JSONPatch")]
    #[default]
    JSONPatch,
}

#[derive(Serialize, Deserialize, Debug, Default, PartialEq, Eq, Clone)]
pub struct AdmissionResponseStatus {
    /// A human-readable description of the status of this operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of the outcome. Allowed responses
    /// without a patch carry a short reason here (e.g. "nop").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Suggested HTTP return code for this status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<u16>,
}

impl AdmissionResponse {
    /// Allow the request without changing it.
    pub fn allow(uid: String, reason: &str) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: true,
            status: Some(AdmissionResponseStatus {
                reason: Some(reason.to_owned()),
                code: Some(200),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn reject(uid: String, message: String, code: u16) -> AdmissionResponse {
        AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message),
                code: Some(code),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// Allow the request and ask the API server to apply `patch` to the object.
    pub fn from_patch(uid: String, patch: &json_patch::Patch) -> Result<Self, ResponseError> {
        let encoded = serde_json::to_string(patch)
            .map(|s| general_purpose::STANDARD.encode(s))
            .map_err(ResponseError::Serialize)?;

        Ok(AdmissionResponse {
            uid,
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(encoded),
            status: None,
        })
    }

    /// Decode the base64 patch carried by this response, if any.
    pub fn json_patch(&self) -> Result<Option<json_patch::Patch>, ResponseError> {
        let Some(encoded) = &self.patch else {
            return Ok(None);
        };

        let raw = general_purpose::STANDARD
            .decode(encoded)
            .map_err(ResponseError::Base64)?;
        let patch = serde_json::from_slice(&raw).map_err(ResponseError::Deserialize)?;

        Ok(Some(patch))
    }
}
