/// `load_config` module: Loads a static YAML config and adapts it into the core's pipeline types.
///
/// This module is the only place where user-supplied YAML is parsed. Every key is optional;
/// an absent file or key falls back to the reference configuration for the bundled sample.
///
/// # Responsibilities
/// - Parse YAML into type-safe structs (`serde_yaml`)
/// - Map the `pipeline` section onto [`PipelineConfig`] and an [`ExtensionFilter`]
/// - Apply environment overrides (`GEMINI_MODEL`). Secrets are never read from the file.
///
/// # Example
///
/// ```yaml
/// generation:
///   model: gemini-2.5-flash
///   timeout_secs: 60
/// pipeline:
///   manifest_path: package.json
///   eligible_extensions: [js, ts]
///   summary_concurrency: 2
///   sections:
///     - title: Installation
///       status: Generating installation instructions...
///       context:
///         type: manifest
/// ```
use anyhow::Result;
use reposcripter_core::{ExtensionFilter, PipelineConfig, SectionPlan};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub generation: GenerationSection,
    pub pipeline: PipelineSection,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GenerationSection {
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSection {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub manifest_path: String,
    pub eligible_extensions: Vec<String>,
    pub summary_concurrency: usize,
    pub sections: Vec<SectionPlan>,
}

impl Default for PipelineSection {
    fn default() -> Self {
        let defaults = PipelineConfig::default();
        Self {
            manifest_path: defaults.manifest_path,
            eligible_extensions: vec!["js".to_string()],
            summary_concurrency: defaults.summary_concurrency,
            sections: defaults.sections,
        }
    }
}

impl PipelineSection {
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            manifest_path: self.manifest_path.clone(),
            sections: self.sections.clone(),
            summary_concurrency: self.summary_concurrency,
        }
    }

    pub fn filter(&self) -> ExtensionFilter {
        ExtensionFilter::new(&self.eligible_extensions)
    }
}

impl CliConfig {
    /// Override file values with environment variables where set.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            if !model.trim().is_empty() {
                info!(model = %model, "Model overridden by GEMINI_MODEL");
                self.generation.model = model;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if self.pipeline.summary_concurrency == 0 {
            anyhow::bail!("pipeline.summary_concurrency must be at least 1");
        }
        if self.generation.timeout_secs == 0 {
            anyhow::bail!("generation.timeout_secs must be at least 1");
        }
        if self.pipeline.eligible_extensions.is_empty() {
            anyhow::bail!("pipeline.eligible_extensions must list at least one extension");
        }
        Ok(())
    }
}

/// Loads a static YAML config file (no secrets) and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let mut config: CliConfig = if config_content.trim().is_empty() {
        CliConfig::default()
    } else {
        match serde_yaml::from_str(&config_content) {
            Ok(conf) => {
                info!(config_path = ?path_ref, "Parsed config YAML successfully");
                conf
            }
            Err(e) => {
                error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
                return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
            }
        }
    };

    config.apply_env_overrides();
    config.validate()?;
    info!(
        model = %config.generation.model,
        sections = config.pipeline.sections.len(),
        "Config loaded"
    );
    Ok(config)
}

/// Load `path` if given, else the defaults with environment overrides.
pub fn load_or_default(path: Option<&Path>) -> Result<CliConfig> {
    match path {
        Some(path) => load_config(path),
        None => {
            let mut config = CliConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}
