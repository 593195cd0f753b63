//! File summarizer: one client call per eligible file.

use tracing::{debug, error};

use crate::contract::{FileSummary, GenerationClient};
use crate::error::GenerationError;
use crate::prompts;

pub struct FileSummarizer<'a> {
    client: &'a dyn GenerationClient,
}

impl<'a> FileSummarizer<'a> {
    pub fn new(client: &'a dyn GenerationClient) -> Self {
        Self { client }
    }

    /// Summarize one file. Client failures propagate unchanged.
    pub async fn summarize(
        &self,
        path: &str,
        content: &str,
    ) -> Result<FileSummary, GenerationError> {
        let prompt = prompts::summary_prompt(path, content);
        debug!(path, prompt_len = prompt.len(), "[SUMMARIZE] Sending prompt");
        match self.client.generate(&prompt).await {
            Ok(summary) => Ok(FileSummary {
                path: path.to_string(),
                summary,
            }),
            Err(e) => {
                error!(path, error = %e, "[SUMMARIZE][ERROR] Generation failed");
                Err(e)
            }
        }
    }
}
