//! Error types for the documentation pipeline.

use thiserror::Error;

/// Failure of a single text-generation call.
#[derive(Error, Debug)]
pub enum GenerationError {
    /// The client is missing credentials or other required settings.
    #[error("generation client is not configured: {0}")]
    NotConfigured(String),

    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The service rejected the credentials.
    #[error("authentication rejected (HTTP {status}): {message}")]
    Unauthorized { status: u16, message: String },

    /// The service reported exhausted quota.
    #[error("quota exhausted{}", retry_hint(.retry_after_secs))]
    RateLimited { retry_after_secs: Option<u64> },

    /// Any other non-success status.
    #[error("service returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    /// The response arrived but carried no usable text.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

fn retry_hint(retry_after_secs: &Option<u64>) -> String {
    match retry_after_secs {
        Some(secs) => format!(", retry after {secs}s"),
        None => String::new(),
    }
}

/// Failure to enumerate the project snapshot.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("snapshot unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate path in snapshot: {0}")]
    DuplicatePath(String),
}

/// Terminal error of a generation run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The target identifier was rejected before a run was started.
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// A remote call failed; `stage` names where.
    #[error("{stage} failed: {source}")]
    Generation {
        stage: String,
        #[source]
        source: GenerationError,
    },

    #[error("generation run was cancelled")]
    Cancelled,
}

impl PipelineError {
    /// The underlying client failure, if this error came from one.
    pub fn generation_error(&self) -> Option<&GenerationError> {
        match self {
            PipelineError::Generation { source, .. } => Some(source),
            _ => None,
        }
    }
}
