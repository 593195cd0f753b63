//! High-level pipeline: orchestrates enumerate → summarize → synthesize → write sections.
//!
//! A [`Pipeline`] is an immutable bundle of collaborators and configuration. Each call to
//! [`Pipeline::run`] builds an independent [`Run`]: an explicit state machine over the fixed
//! plan below, advanced one [`Stage`] at a time by [`Run::next_fragment`].
//!
//! 1. `Start`: report status, emit the `# title` line (no remote call).
//! 2. `Enumerate`: report status, read the snapshot, apply the eligibility filter.
//! 3. `Summarize(i)`: one status and one call per eligible file, in enumeration order.
//! 4. `Synthesize`: one call over listing, manifest and summaries; report the introduction
//!    status and emit the overview.
//! 5. `Section(i)`: one call per configured section; emit its body.
//! 6. `Finalize`: report status, end the sequence.
//!
//! # Responsibilities
//! - Fail-fast: the first failing stage ends the run with that error. Nothing is retried.
//! - Fragments already handed out stay with the consumer; the run does not roll back.
//! - Status callbacks fire synchronously before the remote call they describe.
//!
//! # Cancellation
//! Dropping a [`Run`] (or its stream) drops any in-flight call. A [`CancellationToken`]
//! attached with [`Run::with_cancellation`] is checked before every call and raced against
//! the call itself; a result that loses the race is discarded.

use std::future::Future;
use std::sync::Arc;

use futures::stream::{self, Stream, StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument, Span};
use uuid::Uuid;

use crate::contract::{FileSummary, GenerationClient, Section, SnapshotProvider, SourceFile};
use crate::error::PipelineError;
use crate::prompts;
use crate::section::{ContextSources, SectionPlan, SectionWriter};
use crate::snapshot::{ExtensionFilter, FileFilter};
use crate::summarizer::FileSummarizer;
use crate::synthesizer::ArchitectureSynthesizer;

/// Status strings reported to the consumer.
pub mod status {
    pub const START: &str = "Initializing documentation process...";
    pub const ANALYZE_STRUCTURE: &str = "Analyzing repository structure...";
    pub const SYNTHESIZE_ARCHITECTURE: &str = "Synthesizing high-level architecture...";
    pub const WRITE_INTRODUCTION: &str = "Writing project introduction...";
    pub const FINALIZE: &str = "Finalizing README.md...";

    pub fn summarizing(path: &str) -> String {
        format!("Summarizing {path}...")
    }
}

/// Title used when the target identifier has no usable last segment.
pub const FALLBACK_TITLE: &str = "New Project";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Path of the dependency manifest within the snapshot.
    pub manifest_path: String,
    /// Sections in document order.
    pub sections: Vec<SectionPlan>,
    /// Maximum concurrent summarize calls. `1` keeps summarization strictly sequential.
    pub summary_concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            manifest_path: "package.json".to_string(),
            sections: SectionPlan::reference_sections(),
            summary_concurrency: 1,
        }
    }
}

#[derive(Clone)]
pub struct Pipeline {
    client: Arc<dyn GenerationClient>,
    snapshot: Arc<dyn SnapshotProvider>,
    filter: Arc<dyn FileFilter>,
    config: Arc<PipelineConfig>,
}

impl Pipeline {
    /// A pipeline with the reference configuration and the `.js` eligibility filter.
    pub fn new(client: Arc<dyn GenerationClient>, snapshot: Arc<dyn SnapshotProvider>) -> Self {
        Self {
            client,
            snapshot,
            filter: Arc::new(ExtensionFilter::javascript()),
            config: Arc::new(PipelineConfig::default()),
        }
    }

    pub fn with_filter(mut self, filter: impl FileFilter + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Validate `target` and prepare a run. Nothing is reported or called until the
    /// returned [`Run`] is polled.
    pub fn run<F>(&self, target: &str, on_status: F) -> Result<Run<F>, PipelineError>
    where
        F: FnMut(&str) + Send,
    {
        let target = target.trim();
        if target.is_empty() {
            error!("[RUN][ERROR] Rejected empty target identifier");
            return Err(PipelineError::Validation(
                "Please enter a repository identifier.".to_string(),
            ));
        }
        let run_id = Uuid::new_v4();
        let span = info_span!("generation_run", %run_id, repo = target);
        info!(parent: &span, sections = self.config.sections.len(), "[RUN] Prepared generation run");
        Ok(Run {
            pipeline: self.clone(),
            on_status,
            stage: Stage::Start,
            state: RunState::new(target),
            cancel: CancellationToken::new(),
            run_id,
            span,
        })
    }
}

/// Derive the document title: last path segment, or [`FALLBACK_TITLE`].
pub fn derive_title(target: &str) -> &str {
    target
        .trim()
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or(FALLBACK_TITLE)
}

/// Position of a run within the fixed plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Enumerate,
    /// Summarize the i-th eligible file.
    Summarize(usize),
    /// Summarize every eligible file with bounded concurrency.
    SummarizeAll,
    Synthesize,
    /// Write the i-th configured section.
    Section(usize),
    Finalize,
    Done,
}

/// The per-run aggregate. Owned by exactly one [`Run`].
#[derive(Debug, Default)]
struct RunState {
    target: String,
    files: Vec<SourceFile>,
    eligible: Vec<usize>,
    summaries: Vec<FileSummary>,
    overview: Option<String>,
    sections: Vec<Section>,
    output: String,
}

impl RunState {
    fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
            ..Self::default()
        }
    }

    fn eligible_file(&self, i: usize) -> &SourceFile {
        &self.files[self.eligible[i]]
    }
}

/// One generation run: a lazy, finite, non-restartable sequence of document fragments.
pub struct Run<F> {
    pipeline: Pipeline,
    on_status: F,
    stage: Stage,
    state: RunState,
    cancel: CancellationToken,
    run_id: Uuid,
    span: Span,
}

impl<F> Run<F>
where
    F: FnMut(&str) + Send,
{
    /// Attach an external cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// A handle that cancels this run when triggered.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Everything emitted so far, concatenated.
    pub fn document(&self) -> &str {
        &self.state.output
    }

    pub fn summaries(&self) -> &[FileSummary] {
        &self.state.summaries
    }

    pub fn overview(&self) -> Option<&str> {
        self.state.overview.as_deref()
    }

    pub fn sections(&self) -> &[Section] {
        &self.state.sections
    }

    /// Advance until the next fragment is produced.
    ///
    /// Returns `None` once the plan is complete or after a terminal error was returned.
    pub async fn next_fragment(&mut self) -> Option<Result<String, PipelineError>> {
        while self.stage != Stage::Done {
            let span = self.span.clone();
            match self.advance().instrument(span).await {
                Ok(Some(fragment)) => {
                    self.state.output.push_str(&fragment);
                    return Some(Ok(fragment));
                }
                Ok(None) => continue,
                Err(e) => {
                    error!(parent: &self.span, error = %e, "[RUN][ERROR] Run aborted");
                    self.stage = Stage::Done;
                    return Some(Err(e));
                }
            }
        }
        None
    }

    /// Drive the run to completion, returning the full document.
    pub async fn collect_document(mut self) -> Result<String, PipelineError> {
        while let Some(fragment) = self.next_fragment().await {
            fragment?;
        }
        Ok(self.state.output)
    }

    /// View the run as a `Stream` of fragments.
    pub fn into_stream(self) -> impl Stream<Item = Result<String, PipelineError>> + Send {
        stream::unfold(self, |mut run| async move {
            let item = run.next_fragment().await?;
            Some((item, run))
        })
    }

    fn report(&mut self, message: &str) {
        debug!(status = message, "[RUN] Status");
        (self.on_status)(message);
    }

    /// Execute the current stage and move to the next one.
    async fn advance(&mut self) -> Result<Option<String>, PipelineError> {
        let client = Arc::clone(&self.pipeline.client);
        let config = Arc::clone(&self.pipeline.config);

        match self.stage {
            Stage::Start => {
                self.report(status::START);
                let title = derive_title(&self.state.target);
                info!(title, "[RUN] Starting document");
                let fragment = format!("# {title}\n\n");
                self.stage = Stage::Enumerate;
                Ok(Some(fragment))
            }
            Stage::Enumerate => {
                self.report(status::ANALYZE_STRUCTURE);
                let snapshot = Arc::clone(&self.pipeline.snapshot);
                let files = guarded(&self.cancel, async {
                    snapshot.enumerate().await.map_err(PipelineError::from)
                })
                .await?;
                let filter = &self.pipeline.filter;
                self.state.eligible = files
                    .iter()
                    .enumerate()
                    .filter(|(_, f)| filter.is_eligible(f))
                    .map(|(i, _)| i)
                    .collect();
                self.state.files = files;
                info!(
                    files = self.state.files.len(),
                    eligible = self.state.eligible.len(),
                    "[ENUMERATE] Snapshot enumerated"
                );
                self.stage = if self.state.eligible.is_empty() {
                    Stage::Synthesize
                } else if config.summary_concurrency > 1 {
                    Stage::SummarizeAll
                } else {
                    Stage::Summarize(0)
                };
                Ok(None)
            }
            Stage::Summarize(i) => {
                let path = self.state.eligible_file(i).path.clone();
                self.report(&status::summarizing(&path));
                let file = self.state.eligible_file(i);
                let summarizer = FileSummarizer::new(client.as_ref());
                let summary = guarded(&self.cancel, async {
                    summarizer
                        .summarize(&file.path, &file.content)
                        .await
                        .map_err(|source| PipelineError::Generation {
                            stage: format!("summarize {}", file.path),
                            source,
                        })
                })
                .await?;
                info!(path = %summary.path, "[SUMMARIZE] File summarized");
                self.state.summaries.push(summary);
                self.stage = if i + 1 < self.state.eligible.len() {
                    Stage::Summarize(i + 1)
                } else {
                    Stage::Synthesize
                };
                Ok(None)
            }
            Stage::SummarizeAll => {
                let paths: Vec<String> = (0..self.state.eligible.len())
                    .map(|i| self.state.eligible_file(i).path.clone())
                    .collect();
                for path in &paths {
                    self.report(&status::summarizing(path));
                }
                let summarizer = FileSummarizer::new(client.as_ref());
                let state = &self.state;
                let summarizer = &summarizer;
                let calls = (0..state.eligible.len()).map(|i| {
                    let file = state.eligible_file(i);
                    async move {
                        summarizer
                            .summarize(&file.path, &file.content)
                            .await
                            .map_err(|source| PipelineError::Generation {
                                stage: format!("summarize {}", file.path),
                                source,
                            })
                    }
                });
                // `buffered` yields in input order, so summaries keep enumeration order.
                let summaries: Vec<FileSummary> = guarded(
                    &self.cancel,
                    stream::iter(calls)
                        .buffered(config.summary_concurrency)
                        .try_collect(),
                )
                .await?;
                info!(count = summaries.len(), "[SUMMARIZE] All files summarized");
                self.state.summaries = summaries;
                self.stage = Stage::Synthesize;
                Ok(None)
            }
            Stage::Synthesize => {
                self.report(status::SYNTHESIZE_ARCHITECTURE);
                let state = &self.state;
                let listing = prompts::file_listing(state.files.iter().map(|f| f.path.as_str()));
                let manifest = manifest_of(&state.files, &config.manifest_path);
                let synthesizer = ArchitectureSynthesizer::new(client.as_ref());
                let overview = guarded(&self.cancel, async {
                    synthesizer
                        .synthesize(&listing, manifest, &state.summaries)
                        .await
                        .map_err(|source| PipelineError::Generation {
                            stage: "synthesize architecture".to_string(),
                            source,
                        })
                })
                .await?;
                info!(overview_len = overview.len(), "[SYNTHESIZE] Overview produced");
                self.report(status::WRITE_INTRODUCTION);
                let fragment = format!("{overview}\n\n");
                self.state.overview = Some(overview);
                self.stage = if config.sections.is_empty() {
                    Stage::Finalize
                } else {
                    Stage::Section(0)
                };
                Ok(Some(fragment))
            }
            Stage::Section(i) => {
                let plan = &config.sections[i];
                self.report(&plan.status);
                let state = &self.state;
                let context = plan.context.build(&ContextSources {
                    manifest_path: &config.manifest_path,
                    manifest: manifest_of(&state.files, &config.manifest_path),
                    summaries: &state.summaries,
                });
                let overview = state.overview.as_deref().unwrap_or_default();
                let writer = SectionWriter::new(client.as_ref());
                let section = guarded(&self.cancel, async {
                    writer
                        .write_section(&plan.title, overview, &context)
                        .await
                        .map_err(|source| PipelineError::Generation {
                            stage: format!("write section {}", plan.title),
                            source,
                        })
                })
                .await?;
                info!(title = %section.title, "[SECTION] Section written");
                let fragment = section.body.clone();
                self.state.sections.push(section);
                self.stage = if i + 1 < config.sections.len() {
                    Stage::Section(i + 1)
                } else {
                    Stage::Finalize
                };
                Ok(Some(fragment))
            }
            Stage::Finalize => {
                self.report(status::FINALIZE);
                info!(
                    document_len = self.state.output.len(),
                    sections = self.state.sections.len(),
                    "[RUN] Generation complete"
                );
                self.stage = Stage::Done;
                Ok(None)
            }
            Stage::Done => Ok(None),
        }
    }
}

fn manifest_of<'a>(files: &'a [SourceFile], manifest_path: &str) -> Option<&'a str> {
    let manifest = files
        .iter()
        .find(|f| f.path == manifest_path)
        .map(|f| f.content.as_str());
    if manifest.is_none() {
        debug!(manifest_path, "[RUN] No manifest in snapshot, treating as empty");
    }
    manifest
}

/// Check `cancel` before `call` starts and race it while `call` is in flight.
async fn guarded<T>(
    cancel: &CancellationToken,
    call: impl Future<Output = Result<T, PipelineError>>,
) -> Result<T, PipelineError> {
    if cancel.is_cancelled() {
        return Err(PipelineError::Cancelled);
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(PipelineError::Cancelled),
        result = call => result,
    }
}
