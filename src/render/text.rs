//! Plain-text tablature transcript
//!
//! This is the exact byte content of the `.txt` export, so the format must
//! not depend on locale, time or anything but the input.

use super::tab::render_measure_text;
use crate::error::TabscribeError;
use crate::types::{ChordEvent, Measure, TabResult};
use std::fmt;
use std::str::FromStr;

/// Separator between chords on a progression line
pub const CHORD_SEPARATOR: &str = " - ";

/// Which measures to display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MeasureSelector {
    #[default]
    All,
    /// A specific `measure_number`
    Number(u32),
}

impl FromStr for MeasureSelector {
    type Err = TabscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") {
            return Ok(MeasureSelector::All);
        }
        s.parse::<u32>().map(MeasureSelector::Number).map_err(|_| {
            TabscribeError::ConfigError(format!(
                "invalid measure selector '{}' (expected 'all' or a measure number)",
                s
            ))
        })
    }
}

impl fmt::Display for MeasureSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MeasureSelector::All => write!(f, "all"),
            MeasureSelector::Number(n) => write!(f, "{}", n),
        }
    }
}

/// Filter a result's measures for display
///
/// An unknown measure number yields an empty list, never an error.
pub fn select_measures(result: &TabResult, selector: MeasureSelector) -> Vec<&Measure> {
    match selector {
        MeasureSelector::All => result.measures.iter().collect(),
        MeasureSelector::Number(n) => result
            .measures
            .iter()
            .filter(|m| m.measure_number == n)
            .collect(),
    }
}

/// Render the full transcript: header, then every measure in order
pub fn render_result_text(result: &TabResult) -> String {
    render_selection_text(result, MeasureSelector::All)
}

/// Render the header followed by the selected measures only
pub fn render_selection_text(result: &TabResult, selector: MeasureSelector) -> String {
    let mut out = render_header(result);
    for measure in select_measures(result, selector) {
        out.push_str(&render_measure_block(measure));
    }
    out
}

/// Title, metadata and settings lines, followed by a blank line
fn render_header(result: &TabResult) -> String {
    format!(
        "{}\nKey: {} | Tempo: {} BPM\nCapo: {} | Arpeggio: {}%\n\n",
        result.filename,
        result.key,
        round_to_int(result.tempo),
        result.capo_position,
        round_to_int(result.arpeggio_ratio * 100.0),
    )
}

/// Measure header, chord line, six tab lines and a trailing blank line
fn render_measure_block(measure: &Measure) -> String {
    let mut block = format!(
        "Measure {}:\nChords: {}\n",
        measure.measure_number,
        chord_progression_line(&measure.chords)
    );
    for line in render_measure_text(measure) {
        block.push_str(&line);
        block.push('\n');
    }
    block.push('\n');
    block
}

/// Chord names tagged with their style letter, e.g. `C(S) - Am(A)`
pub fn chord_progression_line(chords: &[ChordEvent]) -> String {
    chords
        .iter()
        .map(|c| format!("{}({})", c.chord, c.style.letter()))
        .collect::<Vec<_>>()
        .join(CHORD_SEPARATOR)
}

/// Round half up to an integer; non-finite input renders as 0
fn round_to_int(value: f64) -> i64 {
    if value.is_finite() {
        (value + 0.5).floor() as i64
    } else {
        0
    }
}
