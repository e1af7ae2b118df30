//! Pipeline orchestration
//!
//! Obtains an analysis (uploaded, or loaded from a saved export), optionally
//! rebuilds it with new settings, renders it and writes the exports.

use crate::client::{AnalysisBackend, TabRequest};
use crate::config::Settings;
use crate::error::{Result, TabscribeError};
use crate::export::{self, export_path};
use crate::render::{
    render_chord_diagram, render_chord_timeline, render_selection_text, select_measures,
    MeasureSelector,
};
use crate::session::{self, Command, SessionEvent, SessionState};
use crate::types::{AnalysisSettings, AnalyzeResponse, TabResult};
use crate::upload::{self, UploadFile, UploadFormat};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Pipeline result summary
#[derive(Debug, Default)]
pub struct PipelineResult {
    /// Text to show the user
    pub display: String,
    pub total_measures: usize,
    pub shown_measures: usize,
    pub text_path: Option<PathBuf>,
    pub json_path: Option<PathBuf>,
}

/// Run the full pipeline against an analysis backend
pub fn run(settings: &Settings, backend: &dyn AnalysisBackend) -> Result<PipelineResult> {
    let pipeline_start = Instant::now();

    if settings.check_server {
        return check_server(backend);
    }

    if settings.dry_run {
        return run_dry_run(settings, backend);
    }

    let response = obtain_analysis(settings, backend)?;
    let response = if settings.regenerate {
        regenerate(response, &settings.analysis, backend)?
    } else {
        response
    };

    let result = TabResult::from_response(&response);
    let total_measures = result.measures.len();
    let shown_measures = select_measures(&result, settings.measure).len();

    if let MeasureSelector::Number(n) = settings.measure {
        if shown_measures == 0 {
            warn!("Measure {} not found ({} measures in this tab)", n, total_measures);
        }
    }

    let display = render_display(&result, &response, settings);

    let mut summary = PipelineResult {
        display,
        total_measures,
        shown_measures,
        ..PipelineResult::default()
    };

    if let Some(output_dir) = &settings.output {
        std::fs::create_dir_all(output_dir)
            .map_err(|e| TabscribeError::output_error(output_dir.as_path(), e))?;

        summary.text_path = Some(export::write_text(
            &result,
            response.filename.as_deref(),
            output_dir,
        )?);
        if settings.output_json {
            summary.json_path = Some(export::write_json(&response, output_dir)?);
        }
    }

    info!(
        "Total pipeline time: {:.2}s",
        pipeline_start.elapsed().as_secs_f64()
    );

    Ok(summary)
}

fn check_server(backend: &dyn AnalysisBackend) -> Result<PipelineResult> {
    let status = backend.status()?;
    let display = format!(
        "Server at {} is {}: {}\n",
        backend.name(),
        status.status.as_deref().unwrap_or("up"),
        status.message.as_deref().unwrap_or("no message")
    );
    Ok(PipelineResult {
        display,
        ..PipelineResult::default()
    })
}

/// Load the saved analysis, or upload the input file
fn obtain_analysis(settings: &Settings, backend: &dyn AnalysisBackend) -> Result<AnalyzeResponse> {
    if let Some(json_path) = &settings.from_json {
        info!("Loading saved analysis from {}", json_path.display());
        return export::read_analysis(json_path);
    }

    let input = settings
        .input
        .as_ref()
        .ok_or_else(|| TabscribeError::ConfigError("No input file given".to_string()))?;

    let upload = upload::inspect(input)?;
    upload::validate_file(&upload)?;
    analyze_upload(upload, settings, backend)
}

/// Submit one upload through a session and wait for its result
fn analyze_upload(
    upload: UploadFile,
    settings: &Settings,
    backend: &dyn AnalysisBackend,
) -> Result<AnalyzeResponse> {
    let state = SessionState::new(settings.analysis);
    let (state, command) = session::apply(state, SessionEvent::FileSelected(upload));

    let Some(Command::Analyze {
        id,
        upload,
        settings: analysis,
    }) = command
    else {
        let message = state
            .error
            .unwrap_or_else(|| "File was not submitted".to_string());
        return Err(TabscribeError::ConfigError(message));
    };

    debug!("Submitting request {} to {}", id.value(), backend.name());
    let spinner = spinner(settings, format!("Analyzing {}...", upload.name));
    let started = Instant::now();
    let outcome = backend.analyze(&upload, &analysis);
    spinner.finish_and_clear();

    match outcome {
        Ok(response) => {
            info!(
                "Analysis of {} finished in {:.1}s",
                upload.name,
                started.elapsed().as_secs_f64()
            );
            let (state, _) = session::apply(state, SessionEvent::RequestResolved { id, response });
            state
                .result
                .ok_or_else(|| TabscribeError::ConfigError("Analysis result was discarded".to_string()))
        }
        Err(e) => {
            debug!("Request {} failed: {}", id.value(), e);
            Err(e)
        }
    }
}

/// Semitones to move saved chords so they match new settings
///
/// Raising the capo lowers the shapes played by the same amount.
pub fn transpose_delta(saved: &AnalysisSettings, target: &AnalysisSettings) -> i32 {
    let key = target.key_change - saved.key_change;
    let capo = target.capo_position as i32 - saved.capo_position as i32;
    key - capo
}

/// Rebuild a saved analysis with new key change, capo and arpeggio ratio
pub fn regenerate(
    response: AnalyzeResponse,
    target: &AnalysisSettings,
    backend: &dyn AnalysisBackend,
) -> Result<AnalyzeResponse> {
    let info = &response.analysis;
    let saved = AnalysisSettings {
        key_change: info.key_change.unwrap_or(0),
        capo_position: info.capo_position.unwrap_or(0),
        arpeggio_ratio: info
            .arpeggio_ratio
            .unwrap_or(AnalysisSettings::default().arpeggio_ratio),
    };

    let delta = transpose_delta(&saved, target);
    let chords = if delta != 0 {
        info!("Transposing {} chords by {:+} semitones", response.chords.len(), delta);
        backend.transpose(&response.chords, delta)?
    } else {
        response.chords.clone()
    };

    let tempo = info
        .tempo
        .or(response.tab.tempo)
        .filter(|t| t.is_finite() && *t > 0.0)
        .unwrap_or(TabResult::DEFAULT_TEMPO);

    let request = TabRequest {
        chords: chords.clone(),
        arpeggio_ratio: target.arpeggio_ratio,
        tempo: tempo.round() as u32,
        time_signature: info
            .time_signature
            .clone()
            .or_else(|| response.tab.time_signature.clone())
            .unwrap_or_else(|| TabRequest::default().time_signature),
    };

    let tab = backend.generate_tab(&request)?;
    debug!("Regenerated tab with {} measures", tab.measures.len());

    let mut updated = response;
    updated.chords = chords;
    updated.tab = tab;
    updated.analysis.key_change = Some(target.key_change);
    updated.analysis.capo_position = Some(target.capo_position);
    updated.analysis.arpeggio_ratio = Some(target.arpeggio_ratio);
    Ok(updated)
}

/// Selected measures, then the optional timeline and diagrams
fn render_display(result: &TabResult, response: &AnalyzeResponse, settings: &Settings) -> String {
    let mut out = render_selection_text(result, settings.measure);

    if settings.show_chords {
        out.push_str("Chord timeline:\n");
        for line in render_chord_timeline(&response.chords) {
            let _ = writeln!(out, "{}", line);
        }
        out.push('\n');
    }

    if settings.show_diagrams {
        out.push_str("Chord diagrams:\n\n");
        for (name, diagram) in &response.tab.chord_diagrams {
            for line in render_chord_diagram(name, diagram) {
                let _ = writeln!(out, "{}", line);
            }
            out.push('\n');
        }
    }

    out
}

/// Dry run mode - validate locally and describe what would happen
fn run_dry_run(settings: &Settings, backend: &dyn AnalysisBackend) -> Result<PipelineResult> {
    let mut out = String::new();
    let _ = writeln!(out, "=== DRY RUN MODE ===\n");

    let filename = if let Some(json_path) = &settings.from_json {
        let response = export::read_analysis(json_path)?;
        let result = TabResult::from_response(&response);
        let _ = writeln!(
            out,
            "Saved analysis: {} ({} measures)",
            json_path.display(),
            result.measures.len()
        );
        if settings.regenerate {
            let saved = AnalysisSettings {
                key_change: response.analysis.key_change.unwrap_or(0),
                capo_position: response.analysis.capo_position.unwrap_or(0),
                ..settings.analysis
            };
            let delta = transpose_delta(&saved, &settings.analysis);
            let _ = writeln!(out, "Would regenerate via {}", backend.name());
            if delta != 0 {
                let _ = writeln!(out, "  transposing chords by {:+} semitones", delta);
            }
        }
        response.filename
    } else {
        let input = settings
            .input
            .as_ref()
            .ok_or_else(|| TabscribeError::ConfigError("No input file given".to_string()))?;
        let upload = upload::inspect(input)?;
        upload::validate_file(&upload)?;
        let _ = writeln!(
            out,
            "Would upload {} ({:.1} MB, {}) to {}/analyze",
            upload.name,
            upload.size_bytes as f64 / (1024.0 * 1024.0),
            upload.media_type,
            backend.name()
        );
        if UploadFormat::from_file_name(&upload.name).is_some_and(UploadFormat::is_video) {
            let _ = writeln!(out, "  (video: the service extracts the audio track)");
        }
        Some(upload.name)
    };

    let _ = writeln!(
        out,
        "Settings: key change {:+}, capo {}, arpeggio {:.0}%",
        settings.analysis.key_change,
        settings.analysis.capo_position,
        settings.analysis.arpeggio_ratio * 100.0
    );

    if let Some(output_dir) = &settings.output {
        let _ = writeln!(out, "\nWould create:");
        let _ = writeln!(
            out,
            "  {}",
            export_path(output_dir, filename.as_deref(), "txt").display()
        );
        if settings.output_json {
            let _ = writeln!(
                out,
                "  {}",
                export_path(output_dir, filename.as_deref(), "json").display()
            );
        }
    }

    Ok(PipelineResult {
        display: out,
        ..PipelineResult::default()
    })
}

fn spinner(settings: &Settings, message: String) -> ProgressBar {
    if !settings.show_progress {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transpose_delta() {
        let saved = AnalysisSettings::default();
        let up_two = AnalysisSettings {
            key_change: 2,
            ..saved
        };
        assert_eq!(transpose_delta(&saved, &up_two), 2);

        let capo_three = AnalysisSettings {
            capo_position: 3,
            ..saved
        };
        assert_eq!(transpose_delta(&saved, &capo_three), -3);

        let both = AnalysisSettings {
            key_change: 2,
            capo_position: 2,
            ..saved
        };
        assert_eq!(transpose_delta(&saved, &both), 0);
        assert_eq!(transpose_delta(&both, &saved), 0);
        assert_eq!(transpose_delta(&up_two, &saved), -2);
    }
}
