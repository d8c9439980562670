use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Command that starts the inference backend locally.
pub const BACKEND_START_HINT: &str = "uvicorn app:app --port 8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    Timeout,
    Http { status: u16 },
    Decode,
    Schema,
    ImageDecode,
    Request,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Connection => f.write_str("connection error"),
            FailureKind::Timeout => f.write_str("timeout"),
            FailureKind::Http { status } => write!(f, "http error {status}"),
            FailureKind::Decode => f.write_str("decode error"),
            FailureKind::Schema => f.write_str("schema error"),
            FailureKind::ImageDecode => f.write_str("image decode error"),
            FailureKind::Request => f.write_str("request error"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("backend unreachable: {0}")]
    Connection(String),
    #[error("backend did not answer within {seconds}s")]
    Timeout { seconds: u64 },
    #[error("backend returned HTTP {status}")]
    Http { status: u16 },
    #[error("response body is not valid JSON: {0}")]
    Decode(String),
    #[error("response does not match the expected schema: {0}")]
    Schema(String),
    #[error("overlay image could not be decoded: {0}")]
    ImageDecode(String),
    #[error("request could not be built: {0}")]
    Request(String),
}

impl ClientError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ClientError::Connection(_) => FailureKind::Connection,
            ClientError::Timeout { .. } => FailureKind::Timeout,
            ClientError::Http { status } => FailureKind::Http { status: *status },
            ClientError::Decode(_) => FailureKind::Decode,
            ClientError::Schema(_) => FailureKind::Schema,
            ClientError::ImageDecode(_) => FailureKind::ImageDecode,
            ClientError::Request(_) => FailureKind::Request,
        }
    }

    /// Message shown to the user, with remediation where one exists.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Connection(_) => format!(
                "Cannot connect to the prediction API. Start it with: `{BACKEND_START_HINT}`"
            ),
            ClientError::Timeout { seconds } => format!(
                "The prediction API did not answer within {seconds}s; it may be overloaded. Select the image again to retry."
            ),
            ClientError::Http { status } => format!("API error: HTTP {status}"),
            ClientError::Decode(_) | ClientError::Schema(_) | ClientError::ImageDecode(_) => {
                format!("Unexpected response from the prediction API ({self})")
            }
            ClientError::Request(_) => format!("Could not send the image: {self}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("{filename}: unsupported file type {mime_type} (expected JPEG or PNG)")]
    UnsupportedType { filename: String, mime_type: String },
    #[error("{filename}: file is empty")]
    Empty { filename: String },
}
