use std::collections::HashMap;

use super::*;

fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let file = tempfile::NamedTempFile::new().expect("temp file");
    fs::write(file.path(), contents).expect("write config");
    file
}

#[test]
fn defaults_apply_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("none.toml");
    assert!(load_settings_with(Some(&missing), env_of(&[])).is_err());

    let empty = write_config("");
    let settings = load_settings_with(Some(empty.path()), env_of(&[])).expect("settings");
    assert_eq!(settings, Settings::default());
    assert_eq!(settings.caption_timeout(), Duration::from_secs(5));
    assert_eq!(settings.caption_endpoint_url().expect("url"), None);
}

#[test]
fn file_values_override_defaults() {
    let file = write_config(
        r#"
caption_endpoint = "http://127.0.0.1:9000/v1/chat/completions"
caption_model = "vision-small"
caption_timeout_ms = 2500
locale = "fr_FR.UTF-8"
export_dir = "/tmp/prints"
viewport_width = 1024.0
viewport_height = 768.0
"#,
    );
    let settings = load_settings_with(Some(file.path()), env_of(&[])).expect("settings");

    assert_eq!(settings.caption_model, "vision-small");
    assert_eq!(settings.caption_timeout(), Duration::from_millis(2500));
    assert_eq!(settings.locale().tag(), "fr-FR");
    assert_eq!(settings.export_dir(), PathBuf::from("/tmp/prints"));
    assert_eq!(settings.viewport(), ViewportSize::new(1024.0, 768.0));
    assert_eq!(
        settings
            .caption_endpoint_url()
            .expect("url")
            .map(|url| url.to_string()),
        Some("http://127.0.0.1:9000/v1/chat/completions".to_string())
    );
}

#[test]
fn env_overrides_file_and_app_prefix_wins() {
    let file = write_config("caption_model = \"from-file\"\ncaption_api_key = \"file-key\"\n");
    let settings = load_settings_with(
        Some(file.path()),
        env_of(&[
            ("CAPTION_MODEL", "short-name"),
            ("APP__CAPTION_MODEL", "prefixed"),
            ("CAPTION_API_KEY", "env-key"),
            ("APP__EXPORT_DIR", "/srv/out"),
        ]),
    )
    .expect("settings");

    assert_eq!(settings.caption_model, "prefixed");
    assert_eq!(settings.caption_api_key.as_deref(), Some("env-key"));
    assert_eq!(settings.export_dir(), PathBuf::from("/srv/out"));
}

#[test]
fn unknown_keys_and_bad_values_are_rejected() {
    let typo = write_config("caption_modle = \"x\"\n");
    assert!(load_settings_with(Some(typo.path()), env_of(&[])).is_err());

    let empty = write_config("");
    assert!(load_settings_with(
        Some(empty.path()),
        env_of(&[("CAPTION_TIMEOUT_MS", "soon")])
    )
    .is_err());
}

#[test]
fn endpoint_must_be_http_url() {
    let mut settings = Settings {
        caption_endpoint: Some("not a url".into()),
        ..Settings::default()
    };
    assert!(settings.caption_endpoint_url().is_err());

    settings.caption_endpoint = Some("ftp://example.com/caption".into());
    assert!(settings.caption_endpoint_url().is_err());

    settings.caption_endpoint = Some("   ".into());
    assert_eq!(settings.caption_endpoint_url().expect("blank"), None);
}

#[test]
fn export_dir_defaults_under_pictures() {
    let settings = Settings::default();
    assert!(settings.export_dir().ends_with(EXPORT_SUBDIR));
}
