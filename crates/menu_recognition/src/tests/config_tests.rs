use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| vars.get(name).cloned()
}

#[test]
fn missing_key_is_configuration_missing() {
    let settings = RecognitionSettings::default();
    let err = settings.api_key().expect_err("no key configured");
    assert!(matches!(err, RecognitionError::ConfigurationMissing { .. }));
}

#[test]
fn placeholder_key_is_configuration_missing() {
    let mut settings = RecognitionSettings::default();
    settings.api_key = Some("PLACEHOLDER_API_KEY".into());
    let err = settings.api_key().expect_err("placeholder key");
    assert!(err.to_string().contains("placeholder"), "unexpected: {err}");

    settings.api_key = Some("   ".into());
    assert!(settings.api_key().is_err());
}

#[test]
fn real_key_is_trimmed() {
    let mut settings = RecognitionSettings::default();
    settings.api_key = Some(" AIzaSyExample \n".into());
    assert_eq!(settings.api_key().expect("key"), "AIzaSyExample");
}

#[test]
fn gemini_key_env_wins_over_generic_api_key() {
    let mut settings = RecognitionSettings::default();
    apply_env_overrides(
        &mut settings,
        env(&[("API_KEY", "generic"), ("GEMINI_API_KEY", "gemini")]),
    );
    assert_eq!(settings.api_key.as_deref(), Some("gemini"));
}

#[test]
fn env_overrides_parse_numbers_and_ignore_garbage() {
    let mut settings = RecognitionSettings::default();
    apply_env_overrides(
        &mut settings,
        env(&[
            ("APP__MODEL", "gemini-test"),
            ("APP__REQUEST_TIMEOUT_SECONDS", "15"),
            ("APP__MAX_IMAGE_EDGE", "not-a-number"),
        ]),
    );
    assert_eq!(settings.model, "gemini-test");
    assert_eq!(settings.request_timeout_seconds, 15);
    assert_eq!(settings.max_image_edge, 2048);
}

#[test]
fn file_settings_are_applied_and_missing_file_is_fine() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let mut settings = RecognitionSettings::default();
    apply_file(&mut settings, &missing).expect("missing file is not an error");
    assert_eq!(settings.model, RecognitionSettings::default().model);

    let path = dir.path().join("menu_lens.toml");
    fs::write(
        &path,
        "api_key = \"from-file\"\ntarget_language = \"English\"\nmax_image_edge = 1024\n",
    )
    .expect("write config");
    apply_file(&mut settings, &path).expect("apply file");
    assert_eq!(settings.api_key.as_deref(), Some("from-file"));
    assert_eq!(settings.target_language, "English");
    assert_eq!(settings.max_image_edge, 1024);
}

#[test]
fn malformed_file_reports_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("menu_lens.toml");
    fs::write(&path, "max_image_edge = \"huge\"").expect("write config");
    let err = apply_file(&mut RecognitionSettings::default(), &path).expect_err("bad toml");
    assert!(format!("{err:#}").contains("menu_lens.toml"));
}

#[test]
fn debug_output_redacts_key() {
    let mut settings = RecognitionSettings::default();
    settings.api_key = Some("super-secret".into());
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("super-secret"));
    assert!(rendered.contains("<redacted>"));
}
