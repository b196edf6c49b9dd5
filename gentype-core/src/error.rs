use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Possible errors when building a request.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to build a request.
    #[error("failed to build request: {0}")]
    BuildRequest(#[source] http::Error),

    /// Failed to serialize body.
    #[error("failed to serialize body: {0}")]
    SerializeBody(#[source] serde_json::Error),

    /// Failed to validate request.
    #[error("failed to validate request: {0}")]
    Validation(String),

    /// Failed to encode parameters through a parameter codec.
    #[error("failed to encode parameters: {0}")]
    Codec(String),
}

/// An error response from the API.
///
/// This is the `Status` kind returned by the apiserver for failed requests,
/// and the payload of `ERROR` events on a watch stream.
#[derive(Error, Deserialize, Serialize, Debug, Clone, Eq, PartialEq)]
#[error("{message}: {reason}")]
pub struct ErrorResponse {
    /// The status
    pub status: String,
    /// A message about the error
    #[serde(default)]
    pub message: String,
    /// The reason for the error
    #[serde(default)]
    pub reason: String,
    /// The error code
    pub code: u16,
    /// Extended data associated with the reason.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<StatusDetails>,
}

impl ErrorResponse {
    /// A `NotFound` response for a named object of a resource
    pub fn not_found(resource: &str, name: &str) -> Self {
        Self {
            status: "Failure".into(),
            message: format!("{resource} \"{name}\" not found"),
            reason: "NotFound".into(),
            code: 404,
            details: Some(StatusDetails {
                name: Some(name.into()),
                kind: Some(resource.into()),
                ..StatusDetails::default()
            }),
        }
    }

    /// An `AlreadyExists` response for a named object of a resource
    pub fn already_exists(resource: &str, name: &str) -> Self {
        Self {
            status: "Failure".into(),
            message: format!("{resource} \"{name}\" already exists"),
            reason: "AlreadyExists".into(),
            code: 409,
            details: Some(StatusDetails {
                name: Some(name.into()),
                kind: Some(resource.into()),
                ..StatusDetails::default()
            }),
        }
    }

    /// Whether the server reported the object as missing
    pub fn is_not_found(&self) -> bool {
        self.code == 404 && self.reason == "NotFound"
    }
}

/// Additional properties the server may attach to a failure.
///
/// The `reason` of the parent [`ErrorResponse`] determines which attributes are set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDetails {
    /// More details associated with the failure, not all reasons provide them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causes: Option<Vec<StatusCause>>,

    /// The group of the resource associated with the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,

    /// The kind of the resource associated with the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,

    /// The name of the resource associated with the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Seconds to wait before the operation should be retried.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_seconds: Option<i32>,

    /// UID of the resource associated with the failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

/// A single cause of a failure, such as one invalid field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCause {
    /// The field that caused the error, as named by its JSON serialization.
    ///
    /// Examples:
    ///   "name" - the field "name" on the current resource
    ///   "items\[0\].name" - the field "name" on the first array entry in "items"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,

    /// A human-readable description of the cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// A machine-readable description of the cause.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
