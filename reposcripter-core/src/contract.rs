//! # contract: seams between the pipeline and its remote collaborators
//!
//! This module defines the two traits the orchestrator depends on and the plain
//! data types flowing across them:
//!   - [`GenerationClient`]: given a prompt, return generated text. The only network-facing seam.
//!   - [`SnapshotProvider`]: supply the ordered `(path, content)` pairs of the target project.
//!
//! ## Mocking & Testing
//! - Both traits are annotated for `mockall` so consumers can build deterministic mocks.
//!   The mocks are exported behind the default `test-export-mocks` feature.
//!
//! ## Adding New Backends
//! - Implement [`GenerationClient`] for the backend (see the CLI crate's Gemini client).
//! - Map every upstream failure to a [`GenerationError`] variant; never panic on bad responses.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, SnapshotError};

/// One file of the inspected project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// Relative, slash-separated path. Unique within one snapshot.
    pub path: String,
    pub content: String,
}

impl SourceFile {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Natural-language summary of one eligible file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub path: String,
    pub summary: String,
}

/// One rendered README section. `body` already carries its `## title` heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub title: String,
    pub body: String,
}

/// Trait for text-generation backends.
///
/// Implementations perform no retry, caching or batching: one call, one request.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;
}

/// Trait for supplying the files of the target project.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    /// Enumerate every file in the snapshot, in a stable order.
    async fn enumerate(&self) -> Result<Vec<SourceFile>, SnapshotError>;
}
