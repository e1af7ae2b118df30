//! Export modules for the text transcript and JSON analysis

pub mod json;
pub mod text;

pub use json::{read_analysis, write_json, SavedAnalysis};
pub use text::write_text;

use crate::error::{Result, TabscribeError};
use crate::upload::validator::file_stem;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

/// Export name used when the analysis carries no filename
pub const DEFAULT_EXPORT_STEM: &str = "guitar-tab";

/// `{stem}.{extension}` inside `output_dir`
///
/// The filename comes from the service or a saved file, so anything that is
/// not a single plain file name (`/`, `..`, empty) falls back to
/// `DEFAULT_EXPORT_STEM` and the result always stays inside `output_dir`.
pub fn export_path(output_dir: &Path, filename: Option<&str>, extension: &str) -> PathBuf {
    let stem = filename
        .map(str::trim)
        .map(file_stem)
        .filter(|stem| is_plain_file_name(stem))
        .unwrap_or_else(|| DEFAULT_EXPORT_STEM.to_string());
    output_dir.join(format!("{}.{}", stem, extension))
}

fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Write through a temp file in the same directory, then rename into place
///
/// The target is either fully replaced or left untouched.
pub(crate) fn write_atomic<F>(output_path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::result::Result<(), String>,
{
    let mut temp_name = output_path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let cleanup = |reason: String| {
        let _ = std::fs::remove_file(&temp_path);
        TabscribeError::OutputError {
            path: output_path.to_path_buf(),
            reason,
        }
    };

    let file = File::create(&temp_path).map_err(|e| TabscribeError::output_error(output_path, e))?;

    let mut writer = BufWriter::new(file);
    write(&mut writer).map_err(&cleanup)?;
    writer.flush().map_err(|e| cleanup(e.to_string()))?;
    drop(writer);

    std::fs::rename(&temp_path, output_path)
        .map_err(|e| cleanup(format!("Failed to finalize file: {}", e)))?;

    Ok(())
}
