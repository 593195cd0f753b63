#![doc = "reposcripter-core: README generation pipeline over a pluggable text-generation service."]

//! This crate contains the data model, collaborator traits and the staged orchestrator.
//! Concrete network clients and the CLI live in the `reposcripter` crate.
//!
//! # Usage
//! Build a [`Pipeline`] from a [`GenerationClient`] and a [`SnapshotProvider`], call
//! [`Pipeline::run`] and consume fragments from the returned [`Run`].

pub mod contract;
pub mod error;
pub mod pipeline;
pub mod prompts;
pub mod section;
pub mod snapshot;
pub mod summarizer;
pub mod synthesizer;
pub mod validate;

pub use contract::{FileSummary, GenerationClient, Section, SnapshotProvider, SourceFile};
pub use error::{GenerationError, PipelineError, SnapshotError};
pub use pipeline::{Pipeline, PipelineConfig, Run, Stage};
pub use section::{ContextPolicy, SectionPlan};
pub use snapshot::{ExtensionFilter, FileFilter, FixtureSnapshot, StaticSnapshot};
