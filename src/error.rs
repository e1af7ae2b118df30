//! Unified error types for tabscribe
//!
//! Error strategy:
//! - Validation errors (file type/size): reported before any request is sent
//! - Transport and server errors: surfaced as the session's single current error
//! - Output errors: fatal for the export step
//!
//! Malformed tab data is never an error; it is absorbed while decoding.

use std::path::PathBuf;
use thiserror::Error;

/// Supported upload formats for helpful error messages
pub const SUPPORTED_FORMATS: &str = "MP3, WAV, M4A, MP4, AVI, MOV";

/// Top-level error type for tabscribe operations
#[derive(Debug, Error)]
pub enum TabscribeError {
    // =========================================================================
    // Validation errors - request is never sent
    // =========================================================================
    #[error("File '{name}' is too large ({size_mb:.1} MB)\n  The analysis service accepts files up to {limit_mb:.0} MB", size_mb = megabytes(.size_bytes), limit_mb = megabytes(.limit_bytes))]
    FileTooLarge {
        name: String,
        size_bytes: u64,
        limit_bytes: u64,
    },

    #[error("Unsupported file format for '{name}' ({media_type})\n  Supported formats: {SUPPORTED_FORMATS}")]
    UnsupportedFormat { name: String, media_type: String },

    #[error("File not found: '{0}'\n  Tip: Check the path exists and is accessible")]
    FileNotFound(PathBuf),

    // =========================================================================
    // Service errors - surfaced to the caller, held result is kept
    // =========================================================================
    #[error("Cannot reach the analysis server at {endpoint}: {reason}\n  Tip: Check the server is running and the network is available (--server or TABSCRIBE_API_URL)")]
    Transport { endpoint: String, reason: String },

    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    // =========================================================================
    // Local errors
    // =========================================================================
    #[error("Cannot write output to '{path}': {reason}\n  Tip: Check write permissions for the output directory")]
    OutputError { path: PathBuf, reason: String },

    #[error("Cannot read saved analysis '{path}': {reason}")]
    InputError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn megabytes<B: std::borrow::Borrow<u64>>(bytes: B) -> f64 {
    *bytes.borrow() as f64 / (1024.0 * 1024.0)
}

/// Result type alias for tabscribe operations
pub type Result<T> = std::result::Result<T, TabscribeError>;

impl TabscribeError {
    /// Returns true if this error was raised before submission
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TabscribeError::FileTooLarge { .. }
                | TabscribeError::UnsupportedFormat { .. }
                | TabscribeError::FileNotFound(_)
        )
    }

    /// Returns true if the server could not be reached at all
    pub fn is_transport(&self) -> bool {
        matches!(self, TabscribeError::Transport { .. })
    }

    /// Build a server error from a non-success status and its response body.
    ///
    /// The payload's `detail` (or `message`) string is surfaced verbatim;
    /// anything else falls back to a status-coded message.
    pub fn from_server_response(status: u16, body: &str) -> Self {
        let payload = serde_json::from_str::<serde_json::Value>(body).ok();
        let message = payload
            .as_ref()
            .and_then(|v| {
                v.get("detail")
                    .and_then(|d| d.as_str())
                    .or_else(|| v.get("message").and_then(|m| m.as_str()))
            })
            .filter(|m| !m.trim().is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Server error ({})", status));

        TabscribeError::Server { status, message }
    }

    /// Create an output error, checking for common issues
    pub fn output_error(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        let reason = match err.kind() {
            std::io::ErrorKind::PermissionDenied => {
                format!("Permission denied. Check that you have write access to {}", path.display())
            }
            std::io::ErrorKind::NotFound => {
                format!("Directory does not exist: {}", path.parent().map(|p| p.display().to_string()).unwrap_or_default())
            }
            _ => err.to_string(),
        };
        TabscribeError::OutputError { path, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_detail_is_verbatim() {
        let err = TabscribeError::from_server_response(400, r#"{"detail":"No file selected"}"#);
        assert_eq!(err.to_string(), "No file selected");
    }

    #[test]
    fn test_server_message_fallback() {
        let err = TabscribeError::from_server_response(500, r#"{"message":"boom"}"#);
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_server_generic_message() {
        // FastAPI validation errors carry a list in `detail`
        let err = TabscribeError::from_server_response(422, r#"{"detail":[{"loc":["body"]}]}"#);
        assert_eq!(err.to_string(), "Server error (422)");

        let err = TabscribeError::from_server_response(502, "<html>Bad Gateway</html>");
        assert_eq!(err.to_string(), "Server error (502)");
    }

    #[test]
    fn test_classification() {
        let err = TabscribeError::UnsupportedFormat {
            name: "clip.docx".into(),
            media_type: "application/octet-stream".into(),
        };
        assert!(err.is_validation());
        assert!(!err.is_transport());

        let err = TabscribeError::Transport {
            endpoint: "http://localhost:8000/".into(),
            reason: "connection refused".into(),
        };
        assert!(err.is_transport());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_file_too_large_message() {
        let err = TabscribeError::FileTooLarge {
            name: "long.wav".into(),
            size_bytes: 101 * 1024 * 1024,
            limit_bytes: 100 * 1024 * 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("101.0 MB"));
        assert!(msg.contains("up to 100 MB"));
    }
}
