//! Chord chart rendering: fingering diagrams and the chord timeline

use crate::types::{ChordDiagram, ChordEvent};

/// String names in diagram order (lowest string first)
pub const DIAGRAM_STRING_NAMES: [&str; 6] = ["E", "A", "D", "G", "B", "E"];

/// Fret rows drawn when every fretted note fits in the first position
const MIN_FRET_ROWS: u8 = 4;

/// Human label for a 1-5 difficulty score
pub fn difficulty_label(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "beginner",
        2 => "beginner-intermediate",
        3 => "intermediate",
        4 => "intermediate-advanced",
        5 => "advanced",
        _ => "unknown",
    }
}

/// Render a chord diagram as text
///
/// ```text
/// Am (beginner)
///    E A D G B E
///    x o       o
///  1 | | | | 1 |
///  2 | | 2 3 | |
///  3 | | | | | |
///  4 | | | | | |
/// ```
///
/// Fretted strings show their finger label, or `*` when none is known. When
/// the shape sits above the fourth fret the window starts at its lowest
/// fretted position.
pub fn render_chord_diagram(name: &str, diagram: &ChordDiagram) -> Vec<String> {
    let mut lines = vec![
        format!("{} ({})", name, difficulty_label(diagram.difficulty)),
        format!("   {}", DIAGRAM_STRING_NAMES.join(" ")),
    ];

    let markers: Vec<&str> = diagram
        .positions
        .iter()
        .map(|p| match p {
            None => "x",
            Some(0) => "o",
            Some(_) => " ",
        })
        .collect();
    lines.push(format!("   {}", markers.join(" ")).trim_end().to_string());

    let fretted: Vec<u8> = diagram
        .positions
        .iter()
        .filter_map(|p| p.filter(|&f| f > 0))
        .collect();
    let lowest = fretted.iter().copied().min().unwrap_or(1);
    let highest = fretted.iter().copied().max().unwrap_or(1);
    let first = if highest > MIN_FRET_ROWS { lowest } else { 1 };
    let last = highest.max(first + MIN_FRET_ROWS - 1);

    for fret in first..=last {
        let cells: Vec<String> = diagram
            .positions
            .iter()
            .enumerate()
            .map(|(index, position)| {
                if *position == Some(fret) {
                    finger_label(diagram, index).to_string()
                } else {
                    "|".to_string()
                }
            })
            .collect();
        lines.push(format!("{:>2} {}", fret, cells.join(" ")));
    }

    lines
}

fn finger_label(diagram: &ChordDiagram, index: usize) -> char {
    diagram
        .fingers
        .and_then(|fingers| fingers[index])
        .and_then(|finger| char::from_digit(u32::from(finger), 10))
        .unwrap_or('*')
}

/// Format seconds as `m:ss`
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// One line per chord: start time, name and duration
pub fn render_chord_timeline(chords: &[ChordEvent]) -> Vec<String> {
    chords
        .iter()
        .map(|chord| {
            let mut line = format!(
                "{:>5}  {:<8} {:.1}s",
                format_time(chord.start_time),
                chord.chord,
                chord.duration
            );
            if let Some(original) = chord.original_chord.as_ref().filter(|o| **o != chord.chord) {
                line.push_str(&format!(" (from {})", original));
            }
            line
        })
        .collect()
}
