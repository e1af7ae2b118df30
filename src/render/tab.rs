//! Six-line tablature rendering
//!
//! Each event in a measure's notation stream appends one column to all six
//! lines. Every line grows by the same number of characters per event, so
//! reading the lines vertically at any column gives one instant in time.

use crate::types::{Fret, GuitarString, Measure, TabNote};

/// Line prefixes, highest string first
pub const STRING_PREFIXES: [&str; GuitarString::COUNT] = ["e|", "B|", "G|", "D|", "A|", "E|"];

/// Marker for a string that is not sounded
pub const MUTED: &str = "x";

/// Time separator between events
pub const SEPARATOR: char = '-';

/// Width appended by a rest on every line
const REST_WIDTH: usize = 3;

/// Six tab lines under construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabLines {
    lines: [String; GuitarString::COUNT],
}

impl TabLines {
    /// Six lines holding only their string-name prefixes
    pub fn new() -> Self {
        Self {
            lines: STRING_PREFIXES.map(String::from),
        }
    }

    /// Append one event to all six lines
    pub fn push(&mut self, note: &TabNote) {
        match note {
            TabNote::Strum(_) => {
                let mut cells: [String; GuitarString::COUNT] = Default::default();
                for string in GuitarString::all() {
                    cells[string.line_index()] = fret_text(note.fret_on(string));
                }
                let width = cells.iter().map(String::len).max().unwrap_or(1);
                for (line, cell) in self.lines.iter_mut().zip(cells.iter()) {
                    line.push_str(cell);
                    pad(line, width - cell.len() + 1);
                }
            }
            TabNote::Single(note) => {
                let text = fret_text(note.fret);
                let target = note.string.line_index();
                for (index, line) in self.lines.iter_mut().enumerate() {
                    if index == target {
                        line.push_str(&text);
                        line.push(SEPARATOR);
                    } else {
                        pad(line, text.len() + 1);
                    }
                }
            }
            TabNote::Rest => {
                for line in self.lines.iter_mut() {
                    pad(line, REST_WIDTH);
                }
            }
        }
    }

    /// Current lines, highest string first
    pub fn lines(&self) -> &[String; GuitarString::COUNT] {
        &self.lines
    }

    /// Finished lines, highest string first
    pub fn into_lines(self) -> [String; GuitarString::COUNT] {
        self.lines
    }
}

impl Default for TabLines {
    fn default() -> Self {
        Self::new()
    }
}

/// Render a measure's notation stream as six tab lines, highest string first
///
/// An empty notation stream yields the six bare prefixes.
pub fn render_measure_text(measure: &Measure) -> [String; GuitarString::COUNT] {
    let mut lines = TabLines::new();
    for note in &measure.tab_notation {
        lines.push(note);
    }
    lines.into_lines()
}

fn fret_text(fret: Fret) -> String {
    match fret {
        Some(f) => f.to_string(),
        None => MUTED.to_string(),
    }
}

fn pad(line: &mut String, count: usize) {
    line.extend(std::iter::repeat(SEPARATOR).take(count));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::StringFret;

    fn string(n: i64) -> GuitarString {
        GuitarString::new(n).unwrap()
    }

    fn strum(pairs: &[(i64, Fret)]) -> TabNote {
        TabNote::Strum(
            pairs
                .iter()
                .map(|&(s, fret)| StringFret { string: string(s), fret })
                .collect(),
        )
    }

    fn single(s: i64, fret: u8) -> TabNote {
        TabNote::Single(StringFret { string: string(s), fret: Some(fret) })
    }

    fn measure(notes: Vec<TabNote>) -> Measure {
        Measure {
            measure_number: 1,
            chords: vec![],
            tab_notation: notes,
        }
    }

    fn assert_aligned(lines: &[String; 6]) {
        let len = lines[0].len();
        assert!(
            lines.iter().all(|l| l.len() == len),
            "lines not aligned: {:#?}",
            lines
        );
    }

    #[test]
    fn test_empty_measure_is_prefixes_only() {
        let lines = render_measure_text(&measure(vec![]));
        assert_eq!(lines, ["e|", "B|", "G|", "D|", "A|", "E|"]);
    }

    #[test]
    fn test_c_major_strum() {
        let c = strum(&[
            (1, Some(0)),
            (2, Some(1)),
            (3, Some(0)),
            (4, Some(2)),
            (5, Some(3)),
            (6, None),
        ]);
        let lines = render_measure_text(&measure(vec![c]));
        assert_eq!(lines, ["e|0-", "B|1-", "G|0-", "D|2-", "A|3-", "E|x-"]);
    }

    #[test]
    fn test_partial_strum_mutes_missing_strings() {
        let lines = render_measure_text(&measure(vec![strum(&[(1, Some(0)), (3, Some(2))])]));
        assert_eq!(lines, ["e|0-", "B|x-", "G|2-", "D|x-", "A|x-", "E|x-"]);
    }

    #[test]
    fn test_single_pads_other_strings() {
        let lines = render_measure_text(&measure(vec![single(5, 3)]));
        assert_eq!(lines, ["e|--", "B|--", "G|--", "D|--", "A|3-", "E|--"]);
    }

    #[test]
    fn test_rest_pads_every_string() {
        let lines = render_measure_text(&measure(vec![TabNote::Rest]));
        assert!(lines.iter().all(|l| l.ends_with("---") && l.len() == 5));
    }

    #[test]
    fn test_mixed_sequence_stays_aligned() {
        let notes = vec![
            strum(&[(1, Some(0)), (2, Some(1))]),
            single(6, 3),
            TabNote::Rest,
            single(1, 12),
            strum(&[(1, Some(10)), (2, Some(8)), (6, None)]),
        ];

        let mut lines = TabLines::new();
        for note in &notes {
            lines.push(note);
            assert_aligned(lines.lines());
        }

        let lines = lines.into_lines();
        assert_eq!(lines[0], "e|0------12-10-");
        assert_eq!(lines[1], "B|1---------8--");
        assert_aligned(&lines);
    }

    #[test]
    fn test_single_with_muted_fret() {
        let note = TabNote::Single(StringFret { string: string(2), fret: None });
        let lines = render_measure_text(&measure(vec![note]));
        assert_eq!(lines[1], "B|x-");
        assert_eq!(lines[0], "e|--");
    }

    #[test]
    fn test_duplicate_string_in_strum_first_wins() {
        let lines = render_measure_text(&measure(vec![strum(&[(1, Some(3)), (1, Some(5))])]));
        assert_eq!(lines[0], "e|3-");
    }
}
