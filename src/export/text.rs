//! Plain-text tablature export

use super::{export_path, write_atomic};
use crate::error::Result;
use crate::render::render_result_text;
use crate::types::TabResult;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Write the full transcript to `{stem}.txt` in `output_dir`
///
/// `filename` is the analysis's own filename, before display defaults, so
/// the text export is named like the JSON export. The file content is
/// exactly `render_result_text(result)`.
pub fn write_text(result: &TabResult, filename: Option<&str>, output_dir: &Path) -> Result<PathBuf> {
    let output_path = export_path(output_dir, filename, "txt");
    let text = render_result_text(result);

    write_atomic(&output_path, |writer| {
        writer.write_all(text.as_bytes()).map_err(|e| e.to_string())
    })?;

    info!(
        "Wrote {} measures to {}",
        result.measures.len(),
        output_path.display()
    );

    Ok(output_path)
}
