//! Section writing and the per-section context policies.
//!
//! A [`SectionPlan`] is one entry of the configured section list: the heading, the
//! status reported before writing it, and the [`ContextPolicy`] deciding which
//! supporting material goes into its prompt. Plans deserialize from YAML, e.g.
//!
//! ```yaml
//! - title: Usage
//!   status: Creating usage examples...
//!   context:
//!     type: entry_point
//!     path: server.js
//!     start_command: npm start
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::contract::{FileSummary, GenerationClient, Section};
use crate::error::GenerationError;
use crate::prompts;

/// Substituted when a section's context refers to a file that has no summary.
pub const MISSING_SUMMARY: &str = "No summary is available for this file.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContextPolicy {
    /// The raw dependency manifest in a fenced block.
    Manifest,
    /// The entry-point file's summary plus an inferred start command.
    EntryPoint { path: String, start_command: String },
    /// The routing file's summary plus an instruction to list endpoints.
    Routes { path: String },
    /// Fixed caller-supplied text.
    Literal { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPlan {
    pub title: String,
    pub status: String,
    pub context: ContextPolicy,
}

impl SectionPlan {
    pub fn new(title: impl Into<String>, status: impl Into<String>, context: ContextPolicy) -> Self {
        Self {
            title: title.into(),
            status: status.into(),
            context,
        }
    }

    /// Installation, Usage and API Reference for the bundled sample project.
    pub fn reference_sections() -> Vec<SectionPlan> {
        vec![
            SectionPlan::new(
                "Installation",
                "Generating installation instructions...",
                ContextPolicy::Manifest,
            ),
            SectionPlan::new(
                "Usage",
                "Creating usage examples...",
                ContextPolicy::EntryPoint {
                    path: "server.js".into(),
                    start_command: "npm start".into(),
                },
            ),
            SectionPlan::new(
                "API Reference",
                "Building API reference...",
                ContextPolicy::Routes {
                    path: "routes/users.js".into(),
                },
            ),
        ]
    }
}

/// Everything context construction may draw on.
pub struct ContextSources<'a> {
    pub manifest_path: &'a str,
    pub manifest: Option<&'a str>,
    pub summaries: &'a [FileSummary],
}

impl ContextSources<'_> {
    /// Look up a summary by path, degrading to [`MISSING_SUMMARY`] when absent.
    fn summary_of(&self, path: &str) -> &str {
        match self.summaries.iter().find(|s| s.path == path) {
            Some(found) => &found.summary,
            None => {
                warn!(path, "[SECTION] No summary for referenced file, using placeholder");
                MISSING_SUMMARY
            }
        }
    }
}

impl ContextPolicy {
    pub fn build(&self, sources: &ContextSources<'_>) -> String {
        match self {
            ContextPolicy::Manifest => format!(
                "Dependencies file ({}):\n```\n{}\n```",
                sources.manifest_path,
                sources.manifest.unwrap_or_default()
            ),
            ContextPolicy::EntryPoint {
                path,
                start_command,
            } => format!(
                "The main entry point is `{path}`. Its summary is: \"{}\". Based on the \
dependency manifest, the start command is likely \"{start_command}\".",
                sources.summary_of(path)
            ),
            ContextPolicy::Routes { path } => format!(
                "API routes are defined in `{path}`. The summary is: \"{}\". List the available \
endpoints and their purpose based on this summary.",
                sources.summary_of(path)
            ),
            ContextPolicy::Literal { text } => text.clone(),
        }
    }
}

pub struct SectionWriter<'a> {
    client: &'a dyn GenerationClient,
}

impl<'a> SectionWriter<'a> {
    pub fn new(client: &'a dyn GenerationClient) -> Self {
        Self { client }
    }

    /// Write one section. The body is `## {title}`, a blank line, the generated text
    /// and a trailing blank line, so sections concatenate into valid Markdown.
    pub async fn write_section(
        &self,
        title: &str,
        overview: &str,
        context: &str,
    ) -> Result<Section, GenerationError> {
        let prompt = prompts::section_prompt(title, overview, context);
        debug!(title, "[SECTION] Sending prompt");
        let text = self.client.generate(&prompt).await.map_err(|e| {
            error!(title, error = %e, "[SECTION][ERROR] Generation failed");
            e
        })?;
        Ok(Section {
            title: title.to_string(),
            body: format!("## {title}\n\n{text}\n\n"),
        })
    }
}
