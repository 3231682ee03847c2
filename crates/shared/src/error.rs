use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConfigurationMissing,
    EmptyRecognition,
    RecognitionFailure,
    MalformedResponse,
    Capture,
    InvalidTransition,
}

/// Error shown to the diner, e.g. in the banner above the capture view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserFacingError {
    pub kind: ErrorKind,
    pub message: String,
}

impl UserFacingError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}
