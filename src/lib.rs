//! tabscribe - Guitar tablature from audio recordings
//!
//! A command-line client for a remote audio-to-tab analysis service. It
//! validates and uploads a recording, then renders the returned chords and
//! tablature as aligned ASCII tab, chord timelines and fingering diagrams.
//!
//! # Architecture
//!
//! The library is organized into several key modules:
//!
//! - `config`: CLI argument parsing and runtime settings
//! - `upload`: File inspection and the size/format contract
//! - `client`: Analysis service access (with a swappable backend)
//! - `session`: Request lifecycle as a pure state machine
//! - `render`: ASCII tab, transcript, timeline and diagram rendering
//! - `pipeline`: Upload, regenerate, render and export orchestration
//! - `export`: Text transcript and JSON analysis output
//!
//! # Example
//!
//! ```no_run
//! use tabscribe::client::{HttpBackend, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT};
//! use tabscribe::{config::Settings, pipeline};
//!
//! let backend = HttpBackend::new(DEFAULT_SERVER_URL, DEFAULT_TIMEOUT).expect("HTTP client");
//! let settings = Settings {
//!     input: Some("song.mp3".into()),
//!     ..Settings::default()
//! };
//! let result = pipeline::run(&settings, &backend).expect("Analysis failed");
//! print!("{}", result.display);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod pipeline;
pub mod render;
pub mod session;
pub mod types;
pub mod upload;

// Re-export key types at crate root
pub use error::{Result, TabscribeError};
pub use types::{AnalysisSettings, AnalyzeResponse, ChordEvent, Measure, TabNote, TabResult};
