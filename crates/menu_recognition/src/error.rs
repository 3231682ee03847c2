use shared::error::{ErrorKind, UserFacingError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecognitionError {
    #[error(
        "recognition API key is not configured ({reason}); set GEMINI_API_KEY or `api_key` in menu_lens.toml"
    )]
    ConfigurationMissing { reason: String },
    /// Service, transport or credential failure. The message is kept verbatim.
    #[error("{message}")]
    Failure { message: String },
    #[error("recognition response did not match the menu schema: {detail}")]
    MalformedResponse { detail: String },
}

impl RecognitionError {
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure {
            message: message.into(),
        }
    }

    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedResponse {
            detail: detail.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RecognitionError::ConfigurationMissing { .. } => ErrorKind::ConfigurationMissing,
            RecognitionError::Failure { .. } => ErrorKind::RecognitionFailure,
            RecognitionError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
        }
    }
}

impl From<reqwest::Error> for RecognitionError {
    fn from(value: reqwest::Error) -> Self {
        Self::failure(value.to_string())
    }
}

impl From<RecognitionError> for UserFacingError {
    fn from(value: RecognitionError) -> Self {
        UserFacingError::new(value.kind(), value.to_string())
    }
}
