//! Upload, analysis, rendering and export orchestration

pub mod orchestrator;

pub use orchestrator::{regenerate, run, transpose_delta, PipelineResult};
