//! Core data types for tabscribe
//!
//! These types mirror the analysis service's JSON schema and flow from the
//! client through the session into the renderers. Decoding is lenient: a
//! missing or malformed tab field becomes muted/empty data rather than a
//! decode failure, so partial results can always be displayed.

use crate::error::{Result, TabscribeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

// =============================================================================
// Guitar primitives
// =============================================================================

/// One of the six strings of a guitar in standard tuning
///
/// Numbered the way tab sources number them: 1 is the highest-pitched
/// string (high e), 6 the lowest (low E).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GuitarString(u8);

impl GuitarString {
    /// Number of strings on the instrument
    pub const COUNT: usize = 6;

    /// Create from a source string number; `None` outside 1..=6
    pub fn new(number: i64) -> Option<Self> {
        if (1..=Self::COUNT as i64).contains(&number) {
            Some(GuitarString(number as u8))
        } else {
            None
        }
    }

    /// Source string number (1 = highest)
    pub fn number(self) -> u8 {
        self.0
    }

    /// Index of this string's line in six-line tab output.
    ///
    /// Output lines run from the highest string to the lowest, so string 1
    /// is line 0 and string 6 is line 5. Every renderer goes through this
    /// conversion.
    pub fn line_index(self) -> usize {
        usize::from(self.0 - 1)
    }

    /// All strings from highest (1) to lowest (6)
    pub fn all() -> impl Iterator<Item = GuitarString> {
        (1..=Self::COUNT as u8).map(GuitarString)
    }
}

/// A fret position on one string; `None` means the string is muted
pub type Fret = Option<u8>;

/// One sounded (or muted) string within a tab event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringFret {
    pub string: GuitarString,
    pub fret: Fret,
}

// =============================================================================
// Tab notation
// =============================================================================

/// One playable event in a measure's notation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTabNote", into = "RawTabNote")]
pub enum TabNote {
    /// Simultaneous strings; strings not listed are muted
    Strum(Vec<StringFret>),
    /// A single plucked note
    Single(StringFret),
    /// A timing gap with no pitched content
    Rest,
}

impl TabNote {
    /// Fret sounded on `string` by this event, if any
    ///
    /// For strums the first pair naming the string wins.
    pub fn fret_on(&self, string: GuitarString) -> Fret {
        match self {
            TabNote::Strum(pairs) => pairs
                .iter()
                .find(|p| p.string == string)
                .and_then(|p| p.fret),
            TabNote::Single(note) if note.string == string => note.fret,
            _ => None,
        }
    }
}

/// Wire shape of a tab event
///
/// The service emits strums and rests with a `type` tag, but arpeggio picks
/// as bare `{string, fret}` objects. Every field is optional here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawTabNote {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    strings: Option<Vec<RawStringFret>>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    string: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    fret: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawStringFret {
    #[serde(default, deserialize_with = "lenient_int")]
    string: Option<i64>,
    #[serde(default, deserialize_with = "lenient_int")]
    fret: Option<i64>,
}

impl From<RawTabNote> for TabNote {
    fn from(raw: RawTabNote) -> Self {
        match raw.kind.as_deref() {
            Some("strum") => TabNote::Strum(
                raw.strings
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|pair| {
                        let string = pair.string.and_then(GuitarString::new)?;
                        Some(StringFret {
                            string,
                            fret: fret_from_raw(pair.fret),
                        })
                    })
                    .collect(),
            ),
            Some("rest") => TabNote::Rest,
            // Singles may arrive tagged or untagged; without a usable string
            // the event still occupies a time slot, so it degrades to a rest.
            _ => match raw.string.and_then(GuitarString::new) {
                Some(string) => TabNote::Single(StringFret {
                    string,
                    fret: fret_from_raw(raw.fret),
                }),
                None => TabNote::Rest,
            },
        }
    }
}

impl From<TabNote> for RawTabNote {
    fn from(note: TabNote) -> Self {
        match note {
            TabNote::Strum(pairs) => RawTabNote {
                kind: Some("strum".to_string()),
                strings: Some(
                    pairs
                        .into_iter()
                        .map(|p| RawStringFret {
                            string: Some(i64::from(p.string.number())),
                            fret: p.fret.map(i64::from),
                        })
                        .collect(),
                ),
                ..RawTabNote::default()
            },
            TabNote::Single(note) => RawTabNote {
                kind: Some("single".to_string()),
                string: Some(i64::from(note.string.number())),
                fret: note.fret.map(i64::from),
                ..RawTabNote::default()
            },
            TabNote::Rest => RawTabNote {
                kind: Some("rest".to_string()),
                ..RawTabNote::default()
            },
        }
    }
}

fn fret_from_raw(fret: Option<i64>) -> Fret {
    fret.and_then(|f| u8::try_from(f).ok())
}

// =============================================================================
// Chords and measures
// =============================================================================

/// How a chord is played
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlayStyle {
    #[default]
    Strum,
    Arpeggio,
}

impl PlayStyle {
    /// Parse a wire tag; only `arpeggio` is an arpeggio, anything else strums
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("arpeggio") {
            PlayStyle::Arpeggio
        } else {
            PlayStyle::Strum
        }
    }

    /// Wire tag
    pub fn as_str(self) -> &'static str {
        match self {
            PlayStyle::Strum => "strum",
            PlayStyle::Arpeggio => "arpeggio",
        }
    }

    /// Single-letter tag used in chord progression lines
    pub fn letter(self) -> char {
        match self {
            PlayStyle::Strum => 'S',
            PlayStyle::Arpeggio => 'A',
        }
    }
}

impl Serialize for PlayStyle {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PlayStyle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = Option::<String>::deserialize(deserializer)?;
        Ok(tag.as_deref().map(PlayStyle::from_tag).unwrap_or_default())
    }
}

/// One chord occupying a time interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChordEvent {
    /// Chord symbol, e.g. "Am7" ("N.C." for no chord)
    #[serde(default, deserialize_with = "null_as_default")]
    pub chord: String,
    /// Start in seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub start_time: f64,
    /// Duration in seconds
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default)]
    pub style: PlayStyle,
    /// Chord name before a transposition, when the service reports it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_chord: Option<String>,
}

impl ChordEvent {
    pub fn new(chord: impl Into<String>, start_time: f64, duration: f64, style: PlayStyle) -> Self {
        Self {
            chord: chord.into(),
            start_time,
            duration,
            style,
            original_chord: None,
        }
    }
}

/// A measure: its chords and its notation stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// 1-based, unique and increasing within a result
    #[serde(default, deserialize_with = "lenient_u32")]
    pub measure_number: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chords: Vec<ChordEvent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tab_notation: Vec<TabNote>,
}

// =============================================================================
// Chord diagrams
// =============================================================================

/// Fixed fingering of a chord
///
/// `positions` run from the lowest string (6) to the highest (1), the order
/// the service uses for diagrams.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawChordDiagram", into = "RawChordDiagram")]
pub struct ChordDiagram {
    /// Fret per string, 0 = open, `None` = muted
    pub positions: [Fret; GuitarString::COUNT],
    /// Finger label per string
    pub fingers: Option<[Option<u8>; GuitarString::COUNT]>,
    /// 1 (beginner) to 5 (advanced)
    pub difficulty: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawChordDiagram {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    positions: Option<Vec<serde_json::Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fingers: Option<Vec<serde_json::Value>>,
    #[serde(default, deserialize_with = "lenient_int", skip_serializing_if = "Option::is_none")]
    difficulty: Option<i64>,
}

impl From<RawChordDiagram> for ChordDiagram {
    fn from(raw: RawChordDiagram) -> Self {
        Self {
            positions: six_slots(raw.positions.unwrap_or_default()),
            fingers: raw.fingers.map(six_slots),
            difficulty: raw
                .difficulty
                .and_then(|d| u8::try_from(d).ok())
                .unwrap_or(1),
        }
    }
}

impl From<ChordDiagram> for RawChordDiagram {
    fn from(diagram: ChordDiagram) -> Self {
        let to_values = |slots: [Option<u8>; GuitarString::COUNT]| {
            slots
                .iter()
                .map(|slot| slot.map_or(serde_json::Value::Null, serde_json::Value::from))
                .collect()
        };
        Self {
            positions: Some(to_values(diagram.positions)),
            fingers: diagram.fingers.map(to_values),
            difficulty: Some(i64::from(diagram.difficulty)),
        }
    }
}

/// Normalise a wire list to exactly six slots (short lists are padded muted)
fn six_slots(values: Vec<serde_json::Value>) -> [Option<u8>; GuitarString::COUNT] {
    let mut slots = [None; GuitarString::COUNT];
    for (slot, value) in slots.iter_mut().zip(values) {
        *slot = int_from_value(value).and_then(|v| u8::try_from(v).ok());
    }
    slots
}

// =============================================================================
// Service payloads
// =============================================================================

/// Settings sent with an analysis request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalysisSettings {
    /// Transposition in semitones
    pub key_change: i32,
    /// Capo fret
    pub capo_position: u32,
    /// Share of chords played as arpeggios (0.0 - 1.0)
    pub arpeggio_ratio: f64,
}

impl AnalysisSettings {
    pub const KEY_CHANGE_RANGE: std::ops::RangeInclusive<i32> = -12..=12;
    pub const CAPO_RANGE: std::ops::RangeInclusive<u32> = 0..=12;

    /// Check every setting is inside the range the service accepts
    pub fn validate(&self) -> Result<()> {
        if !Self::KEY_CHANGE_RANGE.contains(&self.key_change) {
            return Err(TabscribeError::ConfigError(format!(
                "key change {} is outside -12..=12 semitones",
                self.key_change
            )));
        }
        if !Self::CAPO_RANGE.contains(&self.capo_position) {
            return Err(TabscribeError::ConfigError(format!(
                "capo position {} is outside 0..=12 frets",
                self.capo_position
            )));
        }
        if !(0.0..=1.0).contains(&self.arpeggio_ratio) {
            return Err(TabscribeError::ConfigError(format!(
                "arpeggio ratio {} is outside 0.0..=1.0",
                self.arpeggio_ratio
            )));
        }
        Ok(())
    }
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            key_change: 0,
            capo_position: 0,
            arpeggio_ratio: 0.5,
        }
    }
}

/// Musical analysis block of a response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    /// Track length in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_change: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capo_position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arpeggio_ratio: Option<f64>,
}

/// Generated tablature block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TabData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_signature: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub measures: Vec<Measure>,
    /// Diagrams keyed by chord name (sorted for stable output)
    #[serde(default, deserialize_with = "null_as_default")]
    pub chord_diagrams: BTreeMap<String, ChordDiagram>,
}

/// Full response of `POST /analyze`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub analysis: AnalysisInfo,
    #[serde(default, deserialize_with = "null_as_default")]
    pub chords: Vec<ChordEvent>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tab: TabData,
}

/// Response of `GET /`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

// =============================================================================
// Render input
// =============================================================================

/// Tablature plus the metadata shown above it
#[derive(Debug, Clone, PartialEq)]
pub struct TabResult {
    pub filename: String,
    pub key: String,
    /// Beats per minute
    pub tempo: f64,
    /// Capo fret
    pub capo_position: u32,
    /// 0.0 - 1.0
    pub arpeggio_ratio: f64,
    pub measures: Vec<Measure>,
}

impl TabResult {
    pub const DEFAULT_FILENAME: &'static str = "Untitled";
    pub const DEFAULT_KEY: &'static str = "C";
    pub const DEFAULT_TEMPO: f64 = 120.0;

    /// Build the render input from an analysis response, filling defaults
    pub fn from_response(response: &AnalyzeResponse) -> Self {
        let info = &response.analysis;
        Self {
            filename: response
                .filename
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| Self::DEFAULT_FILENAME.to_string()),
            key: info
                .key
                .clone()
                .filter(|k| !k.is_empty())
                .unwrap_or_else(|| Self::DEFAULT_KEY.to_string()),
            tempo: info
                .tempo
                .or(response.tab.tempo)
                .filter(|t| t.is_finite())
                .unwrap_or(Self::DEFAULT_TEMPO),
            capo_position: info.capo_position.unwrap_or(0),
            arpeggio_ratio: info
                .arpeggio_ratio
                .filter(|r| r.is_finite())
                .unwrap_or(AnalysisSettings::default().arpeggio_ratio),
            measures: response.tab.measures.clone(),
        }
    }
}

// =============================================================================
// Lenient decoding helpers
// =============================================================================

/// Treat an explicit `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept integers, integral floats and numeric strings; anything else is absent
fn lenient_int<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(int_from_value))
}

/// `lenient_int` for non-negative counters; unusable values become 0
fn lenient_u32<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_int(deserializer)?
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or_default())
}

fn int_from_value(value: serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
