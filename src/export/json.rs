//! JSON export of the raw analysis, for re-rendering without re-uploading

use super::{export_path, write_atomic};
use crate::error::{Result, TabscribeError};
use crate::types::AnalyzeResponse;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// JSON output schema version
const SCHEMA_VERSION: &str = "1.0";

/// Top-level JSON output structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedAnalysis {
    /// Schema version for forward compatibility
    pub version: String,
    pub metadata: ExportMetadata,
    /// Service response as received
    pub analysis: AnalyzeResponse,
}

/// Export metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    /// tabscribe version that generated this file
    pub generator_version: String,
    /// Timestamp of export
    pub exported_at: String,
    #[serde(default)]
    pub measure_count: usize,
}

/// Either our export wrapper or a response saved straight from the service
#[derive(Deserialize)]
#[serde(untagged)]
enum AnalysisFile {
    Saved(SavedAnalysis),
    Raw(AnalyzeResponse),
}

/// Write an analysis response to `{stem}.json` in `output_dir`
pub fn write_json(response: &AnalyzeResponse, output_dir: &Path) -> Result<PathBuf> {
    let output_path = export_path(output_dir, response.filename.as_deref(), "json");

    let output = SavedAnalysis {
        version: SCHEMA_VERSION.to_string(),
        metadata: ExportMetadata {
            generator_version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: chrono::Utc::now().to_rfc3339(),
            measure_count: response.tab.measures.len(),
        },
        analysis: response.clone(),
    };

    write_atomic(&output_path, |writer| {
        serde_json::to_writer_pretty(writer, &output).map_err(|e| e.to_string())
    })?;

    info!("Wrote analysis to {}", output_path.display());

    Ok(output_path)
}

/// Load a saved analysis
///
/// Accepts both the export wrapper and a bare `/analyze` response body.
pub fn read_analysis(json_path: &Path) -> Result<AnalyzeResponse> {
    let file = File::open(json_path).map_err(|e| TabscribeError::InputError {
        path: json_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let reader = BufReader::new(file);
    let parsed: AnalysisFile =
        serde_json::from_reader(reader).map_err(|e| TabscribeError::InputError {
            path: json_path.to_path_buf(),
            reason: format!("not a saved analysis: {}", e),
        })?;

    let response = match parsed {
        AnalysisFile::Saved(saved) => {
            debug!(
                "Loaded schema {} export from {} (generated by {})",
                saved.version,
                json_path.display(),
                saved.metadata.generator_version
            );
            saved.analysis
        }
        AnalysisFile::Raw(response) => {
            debug!("Loaded raw service response from {}", json_path.display());
            response
        }
    };

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Measure, TabNote};

    fn sample_response() -> AnalyzeResponse {
        let mut response = AnalyzeResponse {
            filename: Some("riff.m4a".to_string()),
            ..AnalyzeResponse::default()
        };
        response.analysis.key = Some("E".to_string());
        response.tab.measures.push(Measure {
            measure_number: 1,
            chords: vec![],
            tab_notation: vec![TabNote::Rest],
        });
        response
    }

    #[test]
    fn test_write_then_read_wrapper() {
        let dir = tempfile::tempdir().unwrap();
        let response = sample_response();

        let path = write_json(&response, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("riff.json"));

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], "1.0");
        assert_eq!(raw["metadata"]["measure_count"], 1);

        assert_eq!(read_analysis(&path).unwrap(), response);
    }

    #[test]
    fn test_read_raw_service_response() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw.json");
        std::fs::write(
            &path,
            r#"{"success": true, "filename": "a.mp3",
                "analysis": {"key": "G", "tempo": 90},
                "chords": [], "tab": {"measures": []}}"#,
        )
        .unwrap();

        let response = read_analysis(&path).unwrap();
        assert_eq!(response.filename.as_deref(), Some("a.mp3"));
        assert_eq!(response.analysis.key.as_deref(), Some("G"));
    }

    #[test]
    fn test_read_missing_or_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let missing = read_analysis(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(missing, TabscribeError::InputError { .. }));

        let garbage = dir.path().join("garbage.json");
        std::fs::write(&garbage, "[1, 2, 3]").unwrap();
        assert!(read_analysis(&garbage).is_err());
    }
}
