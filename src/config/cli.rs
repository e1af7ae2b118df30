//! CLI argument parsing and configuration

use crate::render::MeasureSelector;
use clap::Parser;
use std::path::PathBuf;

/// tabscribe - Guitar tablature from audio recordings
///
/// Uploads an audio or video file to a tab analysis service and prints the
/// resulting tablature, chord timeline and chord diagrams. Saves a plain-text
/// transcript and the raw analysis as JSON.
#[derive(Parser, Debug)]
#[command(name = "tabscribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Audio or video file to analyze (mp3, wav, m4a, mp4, avi, mov)
    #[arg(short, long, value_name = "FILE", conflicts_with = "from_json")]
    pub input: Option<PathBuf>,

    /// Render a previously saved analysis instead of uploading
    #[arg(long, value_name = "FILE")]
    pub from_json: Option<PathBuf>,

    /// Output directory for the .txt and .json exports
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Analysis service URL (defaults to $TABSCRIBE_API_URL, then http://localhost:8000)
    #[arg(long, value_name = "URL")]
    pub server: Option<String>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = 300)]
    pub timeout: u64,

    /// Transpose by this many semitones (-12 to 12)
    #[arg(short, long, value_name = "SEMITONES", default_value_t = 0)]
    #[arg(allow_negative_numbers = true, value_parser = clap::value_parser!(i32).range(-12..=12))]
    pub key_change: i32,

    /// Capo fret (0 to 12)
    #[arg(short, long, value_name = "FRET", default_value_t = 0)]
    #[arg(value_parser = clap::value_parser!(u32).range(0..=12))]
    pub capo: u32,

    /// Share of chords played as arpeggios (0.0 to 1.0)
    #[arg(short, long, value_name = "RATIO", default_value_t = 0.5, value_parser = parse_ratio)]
    pub arpeggio_ratio: f64,

    /// Measure to display: 'all' or a measure number
    #[arg(short, long, value_name = "N", default_value = "all")]
    pub measure: MeasureSelector,

    /// Re-transpose and rebuild a saved analysis with the given settings
    /// (requires --from-json)
    #[arg(long, default_value = "false")]
    pub regenerate: bool,

    /// Print the chord timeline
    #[arg(long, default_value = "false")]
    pub chords: bool,

    /// Print chord fingering diagrams
    #[arg(long, default_value = "false")]
    pub diagrams: bool,

    /// Skip the JSON export
    #[arg(long, default_value = "false")]
    pub no_json: bool,

    /// Only check that the analysis service is reachable
    #[arg(long, default_value = "false")]
    pub check_server: bool,

    /// Verbose output (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress progress spinner)
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Dry run - validate the input and show what would be sent
    #[arg(long, default_value = "false")]
    pub dry_run: bool,
}

impl Cli {
    /// Get the log level based on verbosity flags
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}

fn parse_ratio(s: &str) -> Result<f64, String> {
    let ratio: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&ratio) {
        Ok(ratio)
    } else {
        Err(format!("{} is not between 0.0 and 1.0", ratio))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["tabscribe", "-i", "song.mp3"]).unwrap();
        assert_eq!(cli.key_change, 0);
        assert_eq!(cli.capo, 0);
        assert_eq!(cli.arpeggio_ratio, 0.5);
        assert_eq!(cli.measure, MeasureSelector::All);
        assert_eq!(cli.timeout, 300);
        assert_eq!(cli.log_level(), tracing::Level::WARN);
    }

    #[test]
    fn test_settings_flags() {
        let cli = Cli::try_parse_from([
            "tabscribe", "-i", "song.mp3", "--key-change", "-3", "--capo", "2",
            "--arpeggio-ratio", "0.8", "--measure", "4", "-vv",
        ])
        .unwrap();
        assert_eq!(cli.key_change, -3);
        assert_eq!(cli.capo, 2);
        assert_eq!(cli.arpeggio_ratio, 0.8);
        assert_eq!(cli.measure, MeasureSelector::Number(4));
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--key-change", "13"]).is_err());
        assert!(Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--capo", "13"]).is_err());
        assert!(Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--arpeggio-ratio", "1.5"]).is_err());
        assert!(Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--measure", "first"]).is_err());
    }

    #[test]
    fn test_regenerate_requires_saved_analysis() {
        use crate::config::Settings;

        let upload = Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--regenerate"]).unwrap();
        assert!(upload.regenerate);
        assert!(Settings::from_cli(&upload).validate().is_err());

        let saved = Cli::try_parse_from(["tabscribe", "--from-json", "a.json", "--regenerate"]).unwrap();
        assert!(Settings::from_cli(&saved).validate().is_ok());
    }

    #[test]
    fn test_input_conflicts_with_saved_analysis() {
        assert!(Cli::try_parse_from(["tabscribe", "-i", "a.mp3", "--from-json", "a.json"]).is_err());
    }
}
