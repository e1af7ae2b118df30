//! Runtime configuration settings

use crate::client::{API_URL_ENV, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT};
use crate::error::{Result, TabscribeError};
use crate::render::MeasureSelector;
use crate::types::AnalysisSettings;
use std::path::PathBuf;
use std::time::Duration;

/// Runtime settings for the tab pipeline
#[derive(Debug, Clone)]
pub struct Settings {
    /// File to upload
    pub input: Option<PathBuf>,
    /// Saved analysis to render instead of uploading
    pub from_json: Option<PathBuf>,
    /// Export directory; nothing is written without one
    pub output: Option<PathBuf>,
    /// Analysis service base URL
    pub server_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Key change, capo and arpeggio ratio
    pub analysis: AnalysisSettings,
    /// Measures to display
    pub measure: MeasureSelector,
    /// Rebuild a saved analysis with `analysis`
    pub regenerate: bool,
    /// Print the chord timeline
    pub show_chords: bool,
    /// Print chord diagrams
    pub show_diagrams: bool,
    /// Output JSON
    pub output_json: bool,
    /// Show progress spinner
    pub show_progress: bool,
    /// Only check that the service is up
    pub check_server: bool,
    /// Dry run mode - validate without uploading
    pub dry_run: bool,
}

impl Settings {
    /// Create settings from CLI arguments
    pub fn from_cli(cli: &super::cli::Cli) -> Self {
        Self {
            input: cli.input.clone(),
            from_json: cli.from_json.clone(),
            output: cli.output.clone(),
            server_url: resolve_server_url(cli.server.as_deref(), std::env::var(API_URL_ENV).ok()),
            timeout: Duration::from_secs(cli.timeout),
            analysis: AnalysisSettings {
                key_change: cli.key_change,
                capo_position: cli.capo,
                arpeggio_ratio: cli.arpeggio_ratio,
            },
            measure: cli.measure,
            regenerate: cli.regenerate,
            show_chords: cli.chords,
            show_diagrams: cli.diagrams,
            output_json: !cli.no_json,
            show_progress: !cli.quiet,
            check_server: cli.check_server,
            dry_run: cli.dry_run,
        }
    }

    /// Check that the settings describe something the pipeline can run
    pub fn validate(&self) -> Result<()> {
        self.analysis.validate()?;

        if self.timeout.is_zero() {
            return Err(TabscribeError::ConfigError(
                "Timeout must be at least one second".to_string(),
            ));
        }

        if self.check_server {
            return Ok(());
        }

        match (&self.input, &self.from_json) {
            (None, None) => Err(TabscribeError::ConfigError(
                "No input given. Pass --input FILE or --from-json FILE".to_string(),
            )),
            (Some(_), Some(_)) => Err(TabscribeError::ConfigError(
                "--input and --from-json cannot be combined".to_string(),
            )),
            (Some(_), None) if self.regenerate => Err(TabscribeError::ConfigError(
                "--regenerate only applies to a saved analysis (--from-json)".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            input: None,
            from_json: None,
            output: None,
            server_url: DEFAULT_SERVER_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            analysis: AnalysisSettings::default(),
            measure: MeasureSelector::All,
            regenerate: false,
            show_chords: false,
            show_diagrams: false,
            output_json: true,
            show_progress: true,
            check_server: false,
            dry_run: false,
        }
    }
}

/// `--server` wins over the environment; blank values are ignored
fn resolve_server_url(flag: Option<&str>, env: Option<String>) -> String {
    flag.map(str::to_string)
        .into_iter()
        .chain(env)
        .map(|url| url.trim().to_string())
        .find(|url| !url.is_empty())
        .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_url_precedence() {
        assert_eq!(
            resolve_server_url(Some("http://flag:1"), Some("http://env:2".to_string())),
            "http://flag:1"
        );
        assert_eq!(resolve_server_url(None, Some("http://env:2".to_string())), "http://env:2");
        assert_eq!(resolve_server_url(None, Some("  ".to_string())), DEFAULT_SERVER_URL);
        assert_eq!(resolve_server_url(None, None), DEFAULT_SERVER_URL);
    }

    #[test]
    fn test_validate_requires_input() {
        let settings = Settings::default();
        assert!(settings.validate().is_err());

        let check = Settings {
            check_server: true,
            ..Settings::default()
        };
        assert!(check.validate().is_ok());

        let input = Settings {
            input: Some(PathBuf::from("song.mp3")),
            ..Settings::default()
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_validate_regenerate_needs_saved_analysis() {
        let settings = Settings {
            input: Some(PathBuf::from("song.mp3")),
            regenerate: true,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_analysis_ranges() {
        let settings = Settings {
            input: Some(PathBuf::from("song.mp3")),
            analysis: AnalysisSettings {
                capo_position: 15,
                ..AnalysisSettings::default()
            },
            ..Settings::default()
        };
        assert!(matches!(settings.validate(), Err(TabscribeError::ConfigError(_))));
    }
}
