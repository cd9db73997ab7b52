use k8s_openapi::Resource;
use serde::{Deserialize, de::DeserializeOwned};

use crate::{admission_request::AdmissionRequest, errors::DecodeError};

/// Turns the raw object carried by an admission request into a typed
/// Kubernetes resource.
///
/// Implementations are shared by all the in-flight requests, hence they must
/// not hold any per-request state.
pub trait Decoder: Send + Sync {
    fn decode<K>(&self, request: &AdmissionRequest) -> Result<K, DecodeError>
    where
        K: Resource + DeserializeOwned;
}

/// Decodes the JSON representation sent by the API server.
///
/// The type metadata is checked against the requested resource when the
/// object carries it; objects without `apiVersion` and `kind` are accepted.
#[derive(Clone, Debug, Default)]
pub struct JsonDecoder;

impl JsonDecoder {
    pub fn new() -> Self {
        JsonDecoder
    }
}

impl Decoder for JsonDecoder {
    fn decode<K>(&self, request: &AdmissionRequest) -> Result<K, DecodeError>
    where
        K: Resource + DeserializeOwned,
    {
        let raw = match &request.object {
            Some(object) if !object.0.is_null() => &object.0,
            _ => return Err(DecodeError::MissingObject),
        };

        if let Some(fields) = raw.as_object() {
            check_type_meta(fields, "apiVersion", K::API_VERSION)?;
            check_type_meta(fields, "kind", K::KIND)?;
        }

        K::deserialize(raw).map_err(DecodeError::Deserialize)
    }
}

fn check_type_meta(
    fields: &serde_json::Map<String, serde_json::Value>,
    field: &str,
    expected: &str,
) -> Result<(), DecodeError> {
    match fields.get(field).and_then(|v| v.as_str()) {
        Some(actual) if actual != expected => Err(DecodeError::TypeMismatch {
            expected: format!("{field} {expected}"),
            actual: format!("{field} {actual}"),
        }),
        _ => Ok(()),
    }
}
