// tests/config_loading.rs
use std::{env, fs};

use proptech_digest::config::ai::GenAiConfig;
use proptech_digest::ingest::config::{load_ingest_config_default, load_ingest_config_from, RefreshMode};

#[test]
fn ingest_toml_and_json_files() {
    let dir = tempfile::tempdir().unwrap();

    let p_toml = dir.path().join("ingest.toml");
    fs::write(&p_toml, "bucket_cap = 3\nmode = \"clean\"\n").unwrap();
    let t = load_ingest_config_from(&p_toml).unwrap();
    assert_eq!(t.bucket_cap, 3);
    assert_eq!(t.mode, RefreshMode::Clean);
    assert!(t.shuffle);

    let p_json = dir.path().join("ingest.json");
    fs::write(&p_json, r#"{"shuffle": false, "refresh_interval_secs": 3600}"#).unwrap();
    let j = load_ingest_config_from(&p_json).unwrap();
    assert!(!j.shuffle);
    assert_eq!(j.refresh_interval_secs, 3600);
    assert_eq!(j.mode, RefreshMode::Merge);
}

#[test]
fn oversized_per_category_counts_load_as_five() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("ingest.toml");
    fs::write(&p, "bucket_cap = 8\nitems_per_request = 9\n").unwrap();
    let cfg = load_ingest_config_from(&p).unwrap();
    assert_eq!(cfg.bucket_cap, 5);
    assert_eq!(cfg.items_per_request, 5);
}

#[serial_test::serial]
#[test]
fn ingest_default_uses_env_then_fallbacks() {
    // Isolate CWD so the repo's own config/ is not read.
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var("INGEST_CONFIG_PATH");

    // 1) nothing → defaults
    let d = load_ingest_config_default().unwrap();
    assert_eq!(d.bucket_cap, 5);
    assert_eq!(d.refresh_interval_secs, 86_400);

    // 2) ./config/ingest.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("ingest.toml"), "bucket_cap = 4").unwrap();
    assert_eq!(load_ingest_config_default().unwrap().bucket_cap, 4);

    // 3) env path wins
    let p_env = tmp.path().join("custom.json");
    fs::write(&p_env, r#"{"bucket_cap": 2}"#).unwrap();
    env::set_var("INGEST_CONFIG_PATH", p_env.display().to_string());
    assert_eq!(load_ingest_config_default().unwrap().bucket_cap, 2);

    // 4) env path to nowhere is an error
    env::set_var("INGEST_CONFIG_PATH", tmp.path().join("missing.toml").display().to_string());
    assert!(load_ingest_config_default().is_err());
    env::remove_var("INGEST_CONFIG_PATH");

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn genai_key_resolution() {
    env::set_var("GEMINI_API_KEY", "test-key-123");
    let cfg = GenAiConfig::from_json_str(r#"{"api_key": "ENV"}"#).unwrap();
    assert_eq!(cfg.api_key, "test-key-123");
    assert!(cfg.has_credential());
    assert!(!format!("{cfg:?}").contains("test-key-123"));

    env::remove_var("GEMINI_API_KEY");
    let cfg = GenAiConfig::from_json_str(r#"{"api_key": "ENV"}"#).unwrap();
    assert!(!cfg.has_credential());

    let literal = GenAiConfig::from_json_str(r#"{"api_key": "abc", "enabled": false}"#).unwrap();
    assert_eq!(literal.api_key, "abc");
    assert!(!literal.has_credential());

    assert!(GenAiConfig::from_json_str(r#"{"provider": "openai"}"#).is_err());
}

#[serial_test::serial]
#[test]
fn genai_config_path_env() {
    let tmp = tempfile::tempdir().unwrap();
    let p = tmp.path().join("ai.json");
    fs::write(&p, r#"{"provider": "Gemini", "api_key": "k", "timeout_secs": 0}"#).unwrap();
    env::set_var("GENAI_CONFIG_PATH", p.display().to_string());
    let cfg = GenAiConfig::load_default().unwrap();
    env::remove_var("GENAI_CONFIG_PATH");

    assert_eq!(cfg.provider, "gemini");
    assert_eq!(cfg.timeout_secs, 45);
    assert_eq!(cfg.fast_model, "gemini-2.5-flash");
}
