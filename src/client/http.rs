//! Blocking HTTP client for the analysis service

use super::traits::{AnalysisBackend, TabRequest};
use crate::error::{Result, TabscribeError};
use crate::types::{AnalysisSettings, AnalyzeResponse, ChordEvent, ServerStatus, TabData};
use crate::upload::UploadFile;
use reqwest::blocking::{multipart, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::time::Duration;
use tracing::{debug, info};

/// Service address used when nothing else is configured
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8000";

/// Environment variable overriding the service address
pub const API_URL_ENV: &str = "TABSCRIBE_API_URL";

/// Analysis can take minutes for long tracks
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Serialize)]
struct TransposeRequest<'a> {
    chords: &'a [ChordEvent],
    semitones: i32,
}

#[derive(Deserialize)]
struct TransposeResponse {
    #[serde(default)]
    chords: Vec<ChordEvent>,
}

#[derive(Deserialize)]
struct GenerateTabResponse {
    #[serde(default)]
    tab: TabData,
}

/// `AnalysisBackend` over HTTP
pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("tabscribe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TabscribeError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a JSON success body
    ///
    /// No response at all is a transport error; a non-2xx status is a server
    /// error carrying the payload's message.
    fn send<T: DeserializeOwned>(&self, endpoint: &str, request: RequestBuilder) -> Result<T> {
        debug!("API request: {}", endpoint);

        let response = request.send().map_err(|e| transport_error(endpoint, e))?;
        let status = response.status();
        debug!("API response: {} {}", status.as_u16(), endpoint);

        let body = response.text().map_err(|e| transport_error(endpoint, e))?;

        if !status.is_success() {
            return Err(TabscribeError::from_server_response(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| TabscribeError::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })
    }
}

impl AnalysisBackend for HttpBackend {
    fn status(&self) -> Result<ServerStatus> {
        let endpoint = self.url("/");
        self.send(&endpoint, self.client.get(&endpoint))
    }

    fn analyze(&self, upload: &UploadFile, settings: &AnalysisSettings) -> Result<AnalyzeResponse> {
        let endpoint = self.url("/analyze");

        let file = File::open(&upload.path)?;
        let part = multipart::Part::reader_with_length(file, upload.size_bytes)
            .file_name(upload.name.clone())
            .mime_str(&upload.media_type)
            .map_err(|e| TabscribeError::UnsupportedFormat {
                name: upload.name.clone(),
                media_type: format!("{} ({})", upload.media_type, e),
            })?;

        let key_change = settings.key_change.to_string();
        let capo_position = settings.capo_position.to_string();
        let arpeggio_ratio = settings.arpeggio_ratio.to_string();

        let form = multipart::Form::new()
            .part("file", part)
            .text("key_change", key_change.clone())
            .text("capo_position", capo_position.clone())
            .text("arpeggio_ratio", arpeggio_ratio.clone());

        // The reference service reads the settings from the query string
        let query = [
            ("key_change", key_change),
            ("capo_position", capo_position),
            ("arpeggio_ratio", arpeggio_ratio),
        ];

        info!(
            "Uploading {} ({:.1} MB) for analysis",
            upload.name,
            upload.size_bytes as f64 / (1024.0 * 1024.0)
        );

        self.send(&endpoint, self.client.post(&endpoint).query(&query).multipart(form))
    }

    fn transpose(&self, chords: &[ChordEvent], semitones: i32) -> Result<Vec<ChordEvent>> {
        let endpoint = self.url("/transpose");
        let body = TransposeRequest { chords, semitones };
        let response: TransposeResponse = self.send(&endpoint, self.client.post(&endpoint).json(&body))?;
        Ok(response.chords)
    }

    fn generate_tab(&self, request: &TabRequest) -> Result<TabData> {
        let endpoint = self.url("/generate-tab");
        let response: GenerateTabResponse =
            self.send(&endpoint, self.client.post(&endpoint).json(request))?;
        Ok(response.tab)
    }

    fn name(&self) -> &str {
        &self.base_url
    }
}

fn transport_error(endpoint: &str, err: reqwest::Error) -> TabscribeError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed ({})", err)
    } else {
        err.to_string()
    };

    TabscribeError::Transport {
        endpoint: endpoint.to_string(),
        reason,
    }
}
