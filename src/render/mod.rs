//! Tablature and chord chart rendering
//!
//! Everything here is a pure function of its input: no I/O, no clock, no
//! locale. Identical results always render to identical text.

pub mod diagram;
pub mod tab;
pub mod text;

pub use diagram::{format_time, render_chord_diagram, render_chord_timeline};
pub use tab::{render_measure_text, TabLines};
pub use text::{render_result_text, render_selection_text, select_measures, MeasureSelector};
