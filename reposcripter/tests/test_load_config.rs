use reposcripter::load_config::{load_config, load_or_default, DEFAULT_BASE_URL, DEFAULT_MODEL};
use reposcripter_core::{ContextPolicy, FileFilter, SectionPlan, SourceFile};
use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).expect("write temp config");
    file
}

#[test]
#[serial]
fn test_load_config_full_file() {
    env::remove_var("GEMINI_MODEL");
    let file = config_file(
        r#"
generation:
  model: gemini-2.0-pro
  base_url: http://localhost:9999/v1beta/
  timeout_secs: 30
pipeline:
  manifest_path: Cargo.toml
  eligible_extensions: [rs, ".toml"]
  summary_concurrency: 4
  sections:
    - title: Building
      status: Writing build steps...
      context:
        type: manifest
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.generation.model, "gemini-2.0-pro");
    assert_eq!(config.generation.base_url, "http://localhost:9999/v1beta/");
    assert_eq!(config.generation.timeout_secs, 30);

    let pipeline = config.pipeline.pipeline_config();
    assert_eq!(pipeline.manifest_path, "Cargo.toml");
    assert_eq!(pipeline.summary_concurrency, 4);
    assert_eq!(
        pipeline.sections,
        vec![SectionPlan::new("Building", "Writing build steps...", ContextPolicy::Manifest)]
    );

    let filter = config.pipeline.filter();
    assert!(filter.is_eligible(&SourceFile::new("src/lib.rs", "")));
    assert!(filter.is_eligible(&SourceFile::new("Cargo.toml", "")));
    assert!(!filter.is_eligible(&SourceFile::new("server.js", "")));
}

#[test]
#[serial]
fn test_partial_file_keeps_reference_defaults() {
    env::remove_var("GEMINI_MODEL");
    let file = config_file("generation:\n  timeout_secs: 10\n");

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.generation.model, DEFAULT_MODEL);
    assert_eq!(config.generation.base_url, DEFAULT_BASE_URL);
    assert_eq!(config.generation.timeout_secs, 10);
    assert_eq!(config.pipeline.manifest_path, "package.json");
    assert_eq!(config.pipeline.sections, SectionPlan::reference_sections());
}

#[test]
#[serial]
fn test_env_overrides_model() {
    env::set_var("GEMINI_MODEL", "gemini-custom");
    let config = load_or_default(None).expect("defaults should load");
    env::remove_var("GEMINI_MODEL");

    assert_eq!(config.generation.model, "gemini-custom");
}

#[test]
#[serial]
fn test_zero_concurrency_is_rejected() {
    let file = config_file("pipeline:\n  summary_concurrency: 0\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("summary_concurrency"));
}

#[test]
#[serial]
fn test_unknown_keys_are_rejected() {
    let file = config_file("generation:\n  temperature: 0.2\n");
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));
}

#[test]
fn test_missing_file_reports_path() {
    let err = load_config("definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
