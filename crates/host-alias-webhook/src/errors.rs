use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResponseError {
    #[error("cannot serialize JSONPatch: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("cannot deserialize JSONPatch: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("patch is not valid base64: {0}")]
    Base64(#[source] base64::DecodeError),
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("there is no content to decode")]
    MissingObject,

    #[error("expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("cannot decode object: {0}")]
    Deserialize(#[source] serde_json::Error),
}

/// Every reason the mutator can refuse an admission request.
#[derive(Error, Debug)]
pub enum MutationError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("host network and DNS annotation are mutually exclusive")]
    HostNetworkConflict,

    #[error("cannot encode patch: {0}")]
    Encode(#[from] ResponseError),

    #[error("cannot patch pod: {path} is not a JSON {expected}")]
    UnexpectedShape {
        path: String,
        expected: &'static str,
    },
}

impl MutationError {
    /// HTTP status code reported inside of the AdmissionResponse
    pub fn status_code(&self) -> u16 {
        match self {
            MutationError::Decode(_) | MutationError::HostNetworkConflict => 400,
            MutationError::Encode(_) | MutationError::UnexpectedShape { .. } => 500,
        }
    }
}
