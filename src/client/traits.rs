//! Analysis service abstraction
//!
//! The pipeline talks to the service through this trait so the transport can
//! be swapped (or faked in tests) without touching the rendering code.

use crate::error::Result;
use crate::types::{AnalysisSettings, AnalyzeResponse, ChordEvent, ServerStatus, TabData};
use crate::upload::UploadFile;
use serde::Serialize;

/// Default time signature for tab regeneration
pub const DEFAULT_TIME_SIGNATURE: &str = "4/4";

/// Body of `POST /generate-tab`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TabRequest {
    pub chords: Vec<ChordEvent>,
    pub arpeggio_ratio: f64,
    /// Beats per minute
    pub tempo: u32,
    pub time_signature: String,
}

impl Default for TabRequest {
    fn default() -> Self {
        Self {
            chords: Vec::new(),
            arpeggio_ratio: AnalysisSettings::default().arpeggio_ratio,
            tempo: 120,
            time_signature: DEFAULT_TIME_SIGNATURE.to_string(),
        }
    }
}

/// Remote audio-to-tab analysis service
///
/// Every call is a single blocking request/response: no streaming, no retry.
pub trait AnalysisBackend {
    /// Liveness check (`GET /`)
    fn status(&self) -> Result<ServerStatus>;

    /// Upload a file for full analysis (`POST /analyze`)
    fn analyze(&self, upload: &UploadFile, settings: &AnalysisSettings) -> Result<AnalyzeResponse>;

    /// Transpose a chord list (`POST /transpose`)
    fn transpose(&self, chords: &[ChordEvent], semitones: i32) -> Result<Vec<ChordEvent>>;

    /// Rebuild tablature from chords (`POST /generate-tab`)
    fn generate_tab(&self, request: &TabRequest) -> Result<TabData>;

    /// Where requests go (for logging)
    fn name(&self) -> &str;
}
