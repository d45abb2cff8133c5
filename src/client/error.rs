use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error body returned by the backend on non-2xx responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Errors raised by the config client and the role directory.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The request never produced a response.
    #[error("{0}")]
    Network(String),
    /// The backend answered with a non-2xx status.
    #[error("Request failed with status {status}")]
    Status {
        status: u16,
        body: Option<ApiErrorBody>,
    },
    #[error("Invalid response body: {0}")]
    Decode(String),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// Text shown to the user: the backend's structured message when there is
    /// one, the error's own text otherwise.
    pub fn display_message(&self) -> String {
        match self {
            Self::Status {
                body:
                    Some(ApiErrorBody {
                        message: Some(message),
                        ..
                    }),
                ..
            } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            Self::Status {
                status: status.as_u16(),
                body: None,
            }
        } else {
            Self::Network(e.to_string())
        }
    }
}
