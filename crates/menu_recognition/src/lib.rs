use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::{
    domain::DishRecord,
    protocol::{ImagePayload, RecognizedMenu},
};
use tracing::{debug, info, warn};
use url::Url;

pub mod config;
pub mod error;
pub mod prompt;

pub use config::{load_settings, RecognitionSettings};
pub use error::RecognitionError;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Remote OCR + translation of one or more menu photos.
///
/// All pages of one menu go into a single `recognize` call so the model can
/// merge dishes that appear on several photos.
#[async_trait]
pub trait MenuRecognitionClient: Send + Sync {
    /// Fails with `ConfigurationMissing` when a call could not possibly succeed.
    fn check_ready(&self) -> Result<(), RecognitionError> {
        Ok(())
    }

    async fn recognize(&self, images: &[ImagePayload])
        -> Result<Vec<DishRecord>, RecognitionError>;
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ServiceErrorEnvelope {
    error: ServiceError,
}

#[derive(Debug, Deserialize)]
struct ServiceError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl GenerateContentResponse {
    /// Concatenated text of the first candidate, if the service returned any.
    fn first_text(&self) -> Option<String> {
        let candidate = self.candidates.first()?;
        let text: String = candidate
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }
}

/// `MenuRecognitionClient` backed by the Gemini `generateContent` REST API.
pub struct GeminiClient {
    http: Client,
    settings: RecognitionSettings,
}

impl GeminiClient {
    pub fn new(settings: RecognitionSettings) -> Result<Self, RecognitionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_seconds.max(1)))
            .build()?;
        Ok(Self { http, settings })
    }

    fn generate_url(&self) -> Result<Url, RecognitionError> {
        let mut base = self.settings.endpoint.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base = Url::parse(&base).map_err(|e| {
            RecognitionError::ConfigurationMissing {
                reason: format!("invalid endpoint '{}': {e}", self.settings.endpoint),
            }
        })?;
        base.join(&format!(
            "v1beta/models/{}:generateContent",
            self.settings.model.trim()
        ))
        .map_err(|e| RecognitionError::ConfigurationMissing {
            reason: format!("invalid model name '{}': {e}", self.settings.model),
        })
    }

    fn build_request(&self, images: &[ImagePayload]) -> GenerateContentRequest {
        let mut parts: Vec<Part> = images
            .iter()
            .map(|image| Part::InlineData {
                inline_data: InlineData {
                    mime_type: image.media_type.clone(),
                    data: image.data_b64.clone(),
                },
            })
            .collect();
        parts.push(Part::Text {
            text: prompt::recognition_instruction(
                &self.settings.source_language,
                &self.settings.target_language,
                images.len(),
            ),
        });

        GenerateContentRequest {
            contents: vec![Content { role: "user", parts }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
                response_schema: prompt::response_schema(),
            },
        }
    }
}

#[async_trait]
impl MenuRecognitionClient for GeminiClient {
    fn check_ready(&self) -> Result<(), RecognitionError> {
        self.settings.api_key()?;
        self.generate_url()?;
        Ok(())
    }

    async fn recognize(
        &self,
        images: &[ImagePayload],
    ) -> Result<Vec<DishRecord>, RecognitionError> {
        let api_key = self.settings.api_key()?;
        let url = self.generate_url()?;
        let request = self.build_request(images);
        let started = Instant::now();
        info!(
            images = images.len(),
            model = %self.settings.model,
            "recognition: sending menu photos"
        );

        let response = self
            .http
            .post(url)
            .header(API_KEY_HEADER, api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = service_error_message(status, &body);
            warn!(%status, elapsed_ms = started.elapsed().as_millis() as u64, "recognition: service rejected request");
            return Err(RecognitionError::failure(message));
        }

        let envelope: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| RecognitionError::malformed(format!("unreadable response envelope: {e}")))?;

        let menu = match envelope.first_text() {
            Some(text) => parse_menu_text(&text)?,
            None => {
                if let Some(reason) = envelope
                    .prompt_feedback
                    .as_ref()
                    .and_then(|feedback| feedback.block_reason.as_deref())
                {
                    return Err(RecognitionError::failure(format!(
                        "recognition request was blocked by the service: {reason}"
                    )));
                }
                debug!(
                    finish_reason = ?envelope.candidates.first().and_then(|c| c.finish_reason.as_deref()),
                    "recognition: response carried no text"
                );
                RecognizedMenu::default()
            }
        };

        let dishes = menu.into_dish_records();
        info!(
            dishes = dishes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recognition: completed"
        );
        Ok(dishes)
    }
}

fn service_error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<ServiceErrorEnvelope>(body) {
        Ok(envelope) if !envelope.error.message.is_empty() => match envelope.error.status {
            Some(code) => format!("{status} {code}: {}", envelope.error.message),
            None => format!("{status}: {}", envelope.error.message),
        },
        _ if body.trim().is_empty() => format!("recognition service returned {status}"),
        _ => format!("{status}: {}", body.trim()),
    }
}

/// Parses the model's JSON text, tolerating a surrounding Markdown code fence.
fn parse_menu_text(text: &str) -> Result<RecognizedMenu, RecognitionError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed);
    serde_json::from_str(unfenced.trim()).map_err(|e| RecognitionError::malformed(e.to_string()))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
