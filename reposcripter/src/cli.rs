///
/// This module implements the CLI interface for reposcripter: command parsing, target
/// validation, and the consumer side of the pipeline.
///
/// All pipeline logic lives in the [`reposcripter-core`] crate. This module only wires
/// configuration, the Gemini client and the bundled snapshot together, shows status lines
/// on stderr and appends fragments to the output as they arrive.
///
/// ## How To Use
/// - Command line: `reposcripter generate https://github.com/user/repo [--output README.md]`.
/// - Programmatic/integration use: call [`run`] with a constructed [`Cli`], or
///   [`generate_into`] with any pipeline and writer.
///
/// [`reposcripter-core`]: ../../reposcripter-core/
use crate::client::GeminiClient;
use crate::load_config::load_or_default;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reposcripter_core::validate::validate_repo_url;
use reposcripter_core::{FixtureSnapshot, Pipeline, PipelineError};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// URL used by `--sample`.
pub const SAMPLE_REPO_URL: &str = "https://github.com/reactjs/reactjs.org";

/// CLI for reposcripter: generate a README from a repository.
#[derive(Parser)]
#[clap(
    name = "reposcripter",
    version,
    about = "Analyze a repository and generate its README.md with a multi-stage LLM pipeline"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a README for the given repository
    Generate {
        /// Repository URL, e.g. https://github.com/user/repo
        repo_url: Option<String>,
        /// Use the sample repository URL instead of passing one
        #[clap(long, conflicts_with = "repo_url")]
        sample: bool,
        /// Path to an optional YAML config file
        #[clap(long)]
        config: Option<PathBuf>,
        /// Write the document to this file instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
        /// Accept any non-empty identifier instead of requiring a GitHub URL
        #[clap(long)]
        no_validate: bool,
    },
}

/// Pick the target identifier from the arguments and validate it.
pub fn resolve_target(
    repo_url: Option<String>,
    sample: bool,
    no_validate: bool,
) -> Result<String, PipelineError> {
    let raw = if sample {
        SAMPLE_REPO_URL.to_string()
    } else {
        repo_url.unwrap_or_default()
    };
    if no_validate {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::Validation(
                reposcripter_core::validate::MISSING_URL.to_string(),
            ));
        }
        return Ok(trimmed.to_string());
    }
    validate_repo_url(&raw).map(str::to_string)
}

/// Run `pipeline` for `target`, writing and flushing each fragment to `out` as it arrives.
///
/// On failure everything written so far stays in `out`; the error carries the cause.
pub async fn generate_into<W, F>(
    pipeline: &Pipeline,
    target: &str,
    out: &mut W,
    on_status: F,
    cancel: CancellationToken,
) -> Result<String>
where
    W: AsyncWrite + Unpin,
    F: FnMut(&str) + Send,
{
    let mut run = pipeline.run(target, on_status)?.with_cancellation(cancel);
    tracing::info!(run_id = %run.run_id(), repo = target, "Generation started");

    while let Some(fragment) = run.next_fragment().await {
        match fragment {
            Ok(text) => {
                out.write_all(text.as_bytes())
                    .await
                    .context("Failed to write document fragment")?;
                out.flush().await.context("Failed to flush output")?;
            }
            Err(e) => {
                tracing::error!(run_id = %run.run_id(), error = %e, "Generation failed");
                return Err(anyhow::anyhow!("Failed to generate documentation. {e}"));
            }
        }
    }
    tracing::info!(
        run_id = %run.run_id(),
        document_len = run.document().len(),
        "Generation complete"
    );
    Ok(run.document().to_string())
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    // Emit a top-level 'trace_initialised' event at the very start
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Generate {
            repo_url,
            sample,
            config,
            output,
            no_validate,
        } => {
            let target = resolve_target(repo_url, sample, no_validate).map_err(|e| {
                tracing::error!(error = %e, "Rejected repository identifier");
                anyhow::Error::new(e)
            })?;
            let config = load_or_default(config.as_deref())?;
            let client = GeminiClient::from_env(&config.generation)
                .context("Failed to construct generation client")?;
            tracing::info!(command = "generate", model = client.model(), "Starting generation");

            let pipeline = Pipeline::new(Arc::new(client), Arc::new(FixtureSnapshot))
                .with_filter(config.pipeline.filter())
                .with_config(config.pipeline.pipeline_config());

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::warn!("Interrupt received, cancelling generation");
                    on_interrupt.cancel();
                }
            });

            let on_status = |message: &str| eprintln!("{message}");
            let result = match &output {
                Some(path) => {
                    let mut file = tokio::fs::File::create(path)
                        .await
                        .with_context(|| format!("Failed to create output file {path:?}"))?;
                    generate_into(&pipeline, &target, &mut file, on_status, cancel).await
                }
                None => {
                    let mut stdout = tokio::io::stdout();
                    generate_into(&pipeline, &target, &mut stdout, on_status, cancel).await
                }
            };

            let document = result?;
            tracing::info!(command = "generate", bytes = document.len(), "README generated");
            if let Some(path) = &output {
                eprintln!("README written to {}", path.display());
            }
            Ok(())
        }
    }
}
