//! Architecture synthesizer: one call over the listing, manifest and all summaries.

use tracing::{debug, error};

use crate::contract::{FileSummary, GenerationClient};
use crate::error::GenerationError;
use crate::prompts;

pub struct ArchitectureSynthesizer<'a> {
    client: &'a dyn GenerationClient,
}

impl<'a> ArchitectureSynthesizer<'a> {
    pub fn new(client: &'a dyn GenerationClient) -> Self {
        Self { client }
    }

    /// `manifest` is `None` when the snapshot has no manifest file; it renders as empty.
    pub async fn synthesize(
        &self,
        listing: &str,
        manifest: Option<&str>,
        summaries: &[FileSummary],
    ) -> Result<String, GenerationError> {
        let prompt = prompts::synthesis_prompt(listing, manifest.unwrap_or_default(), summaries);
        debug!(
            summaries = summaries.len(),
            has_manifest = manifest.is_some(),
            "[SYNTHESIZE] Sending prompt"
        );
        self.client.generate(&prompt).await.map_err(|e| {
            error!(error = %e, "[SYNTHESIZE][ERROR] Generation failed");
            e
        })
    }
}
