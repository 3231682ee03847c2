use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use serde::Deserialize;

use crate::error::RecognitionError;

pub const DEFAULT_CONFIG_FILE: &str = "menu_lens.toml";

/// Values shipped in project templates that are never real credentials.
const PLACEHOLDER_API_KEYS: &[&str] = &[
    "placeholder_api_key",
    "your_api_key",
    "your-api-key",
    "your_api_key_here",
    "<api-key>",
    "changeme",
];

#[derive(Clone)]
pub struct RecognitionSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub source_language: String,
    pub target_language: String,
    pub request_timeout_seconds: u64,
    pub max_image_edge: u32,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            endpoint: "https://generativelanguage.googleapis.com".into(),
            source_language: "Japanese".into(),
            target_language: "Traditional Chinese (繁體中文)".into(),
            request_timeout_seconds: 60,
            max_image_edge: 2048,
        }
    }
}

impl fmt::Debug for RecognitionSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecognitionSettings")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("source_language", &self.source_language)
            .field("target_language", &self.target_language)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_image_edge", &self.max_image_edge)
            .finish()
    }
}

impl RecognitionSettings {
    /// The usable API key, or `ConfigurationMissing` when absent or a template placeholder.
    pub fn api_key(&self) -> Result<&str, RecognitionError> {
        let Some(key) = self.api_key.as_deref().map(str::trim) else {
            return Err(RecognitionError::ConfigurationMissing {
                reason: "no API key provided".into(),
            });
        };
        if key.is_empty() {
            return Err(RecognitionError::ConfigurationMissing {
                reason: "API key is empty".into(),
            });
        }
        if is_placeholder_key(key) {
            return Err(RecognitionError::ConfigurationMissing {
                reason: format!("API key is still the template placeholder '{key}'"),
            });
        }
        Ok(key)
    }
}

pub fn is_placeholder_key(key: &str) -> bool {
    let lower = key.trim().to_ascii_lowercase();
    PLACEHOLDER_API_KEYS.contains(&lower.as_str())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileSettings {
    api_key: Option<String>,
    model: Option<String>,
    endpoint: Option<String>,
    source_language: Option<String>,
    target_language: Option<String>,
    request_timeout_seconds: Option<u64>,
    max_image_edge: Option<u32>,
}

/// Defaults, then the TOML file, then process environment.
pub fn load_settings() -> anyhow::Result<RecognitionSettings> {
    let path = std::env::var("MENU_LENS_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
    let mut settings = RecognitionSettings::default();
    apply_file(&mut settings, &path)?;
    apply_env_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub(crate) fn apply_file(settings: &mut RecognitionSettings, path: &Path) -> anyhow::Result<()> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let file_cfg: FileSettings = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;

    if let Some(v) = file_cfg.api_key {
        settings.api_key = Some(v);
    }
    if let Some(v) = file_cfg.model {
        settings.model = v;
    }
    if let Some(v) = file_cfg.endpoint {
        settings.endpoint = v;
    }
    if let Some(v) = file_cfg.source_language {
        settings.source_language = v;
    }
    if let Some(v) = file_cfg.target_language {
        settings.target_language = v;
    }
    if let Some(v) = file_cfg.request_timeout_seconds {
        settings.request_timeout_seconds = v;
    }
    if let Some(v) = file_cfg.max_image_edge {
        settings.max_image_edge = v;
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut RecognitionSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    for name in ["API_KEY", "GEMINI_API_KEY", "APP__API_KEY"] {
        if let Some(v) = lookup(name) {
            settings.api_key = Some(v);
        }
    }

    if let Some(v) = lookup("APP__MODEL") {
        settings.model = v;
    }
    if let Some(v) = lookup("APP__ENDPOINT") {
        settings.endpoint = v;
    }
    if let Some(v) = lookup("APP__SOURCE_LANGUAGE") {
        settings.source_language = v;
    }
    if let Some(v) = lookup("APP__TARGET_LANGUAGE") {
        settings.target_language = v;
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }
    if let Some(v) = lookup("APP__MAX_IMAGE_EDGE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.max_image_edge = parsed;
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
