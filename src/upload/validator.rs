//! Upload inspection and validation
//!
//! A file must pass these checks before it is submitted for analysis; a
//! failing file never reaches the network.

use crate::error::{Result, TabscribeError};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Largest upload the analysis service accepts (100 MB)
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Declared media types accepted without looking at the extension
pub const ALLOWED_MEDIA_TYPES: &[&str] = &[
    "audio/mpeg",
    "audio/mp3",
    "audio/wav",
    "audio/m4a",
    "video/mp4",
    "video/avi",
    "video/mov",
    "video/quicktime",
];

/// Media type used when the extension is not recognised
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

/// Audio and video containers the analysis service can decode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadFormat {
    Mp3,
    Wav,
    M4a,
    Mp4,
    Avi,
    Mov,
}

impl UploadFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "mp3" => Some(UploadFormat::Mp3),
            "wav" => Some(UploadFormat::Wav),
            "m4a" => Some(UploadFormat::M4a),
            "mp4" => Some(UploadFormat::Mp4),
            "avi" => Some(UploadFormat::Avi),
            "mov" => Some(UploadFormat::Mov),
            _ => None,
        }
    }

    /// Detect format from the extension of a file name
    pub fn from_file_name(name: &str) -> Option<Self> {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Media type sent with the upload
    pub fn media_type(self) -> &'static str {
        match self {
            UploadFormat::Mp3 => "audio/mpeg",
            UploadFormat::Wav => "audio/wav",
            UploadFormat::M4a => "audio/m4a",
            UploadFormat::Mp4 => "video/mp4",
            UploadFormat::Avi => "video/avi",
            UploadFormat::Mov => "video/quicktime",
        }
    }

    /// Video containers have their audio track extracted server-side
    pub fn is_video(self) -> bool {
        matches!(self, UploadFormat::Mp4 | UploadFormat::Avi | UploadFormat::Mov)
    }
}

/// A file selected for analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub path: PathBuf,
    /// File name sent to the service
    pub name: String,
    pub size_bytes: u64,
    /// Declared media type
    pub media_type: String,
}

impl UploadFile {
    /// Describe an upload without touching the filesystem
    pub fn new(path: impl Into<PathBuf>, size_bytes: u64, media_type: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        Self {
            path,
            name,
            size_bytes,
            media_type: media_type.into(),
        }
    }

    /// File stem used to name exports (`song.mp3` → `song`)
    pub fn stem(&self) -> String {
        file_stem(&self.name)
    }
}

/// Read a file's size and infer its media type from the extension
pub fn inspect(path: &Path) -> Result<UploadFile> {
    if !path.exists() {
        return Err(TabscribeError::FileNotFound(path.to_path_buf()));
    }

    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(TabscribeError::UnsupportedFormat {
            name: path.display().to_string(),
            media_type: "directory".to_string(),
        });
    }

    let media_type = path
        .extension()
        .and_then(|e| e.to_str())
        .and_then(UploadFormat::from_extension)
        .map(UploadFormat::media_type)
        .unwrap_or(UNKNOWN_MEDIA_TYPE);

    let upload = UploadFile::new(path, metadata.len(), media_type);
    debug!(
        "Inspected {}: {} bytes, {}",
        upload.name, upload.size_bytes, upload.media_type
    );
    Ok(upload)
}

/// Check an upload against the service's size and format limits
///
/// A file passes the format check when either its declared media type or its
/// file extension is supported.
pub fn validate_file(upload: &UploadFile) -> Result<()> {
    if upload.size_bytes > MAX_UPLOAD_BYTES {
        return Err(TabscribeError::FileTooLarge {
            name: upload.name.clone(),
            size_bytes: upload.size_bytes,
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }

    let declared = upload.media_type.to_lowercase();
    let type_ok = ALLOWED_MEDIA_TYPES.contains(&declared.as_str());
    let extension_ok = UploadFormat::from_file_name(&upload.name).is_some();

    if !type_ok && !extension_ok {
        return Err(TabscribeError::UnsupportedFormat {
            name: upload.name.clone(),
            media_type: upload.media_type.clone(),
        });
    }

    Ok(())
}

/// Strip the last extension from a file name; names without one are kept
pub fn file_stem(name: &str) -> String {
    Path::new(name)
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MB: u64 = 1024 * 1024;

    #[test]
    fn test_size_limit() {
        let too_big = UploadFile::new("take.wav", 101 * MB, "audio/wav");
        let err = validate_file(&too_big).unwrap_err();
        assert!(matches!(err, TabscribeError::FileTooLarge { .. }));

        let fits = UploadFile::new("take.wav", 99 * MB, "audio/wav");
        assert!(validate_file(&fits).is_ok());

        let exactly = UploadFile::new("take.wav", MAX_UPLOAD_BYTES, "audio/wav");
        assert!(validate_file(&exactly).is_ok());
    }

    #[test]
    fn test_rejects_unsupported_type_and_extension() {
        let doc = UploadFile::new("clip.docx", 10 * MB, "application/octet-stream");
        let err = validate_file(&doc).unwrap_err();
        assert!(matches!(err, TabscribeError::UnsupportedFormat { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_either_type_or_extension_is_enough() {
        // Known extension, generic type
        let by_name = UploadFile::new("Live Take.MOV", MB, "application/octet-stream");
        assert!(validate_file(&by_name).is_ok());

        // Known type, unusual name
        let by_type = UploadFile::new("recording", MB, "audio/mpeg");
        assert!(validate_file(&by_type).is_ok());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(UploadFormat::from_extension("MP3"), Some(UploadFormat::Mp3));
        assert_eq!(UploadFormat::from_file_name("a.b.m4a"), Some(UploadFormat::M4a));
        assert_eq!(UploadFormat::from_file_name("flac.flac"), None);
        assert!(UploadFormat::Mov.is_video());
        assert!(!UploadFormat::Wav.is_video());
    }

    #[test]
    fn test_inspect_reads_size_and_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("riff.wav");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let upload = inspect(&path).unwrap();
        assert_eq!(upload.name, "riff.wav");
        assert_eq!(upload.size_bytes, 2048);
        assert_eq!(upload.media_type, "audio/wav");
        assert_eq!(upload.stem(), "riff");
    }

    #[test]
    fn test_inspect_missing_file() {
        let err = inspect(Path::new("/definitely/not/here.mp3")).unwrap_err();
        assert!(matches!(err, TabscribeError::FileNotFound(_)));
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("song.mp3"), "song");
        assert_eq!(file_stem("no_extension"), "no_extension");
        assert_eq!(file_stem("my.song.wav"), "my.song");
    }
}
