//! Display session state
//!
//! A session is a plain value: each event yields the next state plus, when a
//! request has to go out, the command describing it. Every submission gets a
//! fresh `RequestId` and only the newest one may resolve the session, so a
//! slow response to a superseded request is dropped instead of overwriting
//! newer results.

use crate::types::{AnalysisSettings, AnalyzeResponse, TabResult};
use crate::upload::{validate_file, UploadFile};
use tracing::debug;

/// Identifies one submission to the analysis service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(u64);

impl RequestId {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// What the user is currently looking at
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SessionState {
    pub upload: Option<UploadFile>,
    pub settings: AnalysisSettings,
    /// Last successful analysis
    pub result: Option<AnalyzeResponse>,
    /// Message shown to the user; cleared on the next submission
    pub error: Option<String>,
    /// Submission still awaiting a response
    pub pending: Option<RequestId>,
    next_request: u64,
}

impl SessionState {
    pub fn new(settings: AnalysisSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// Normalized view of the current result
    pub fn tab_result(&self) -> Option<TabResult> {
        self.result.as_ref().map(TabResult::from_response)
    }

    fn submit(mut self) -> (Self, Option<Command>) {
        let Some(upload) = self.upload.clone() else {
            return (self, None);
        };

        let id = RequestId(self.next_request);
        self.next_request += 1;
        self.pending = Some(id);
        self.error = None;

        let command = Command::Analyze {
            id,
            upload,
            settings: self.settings,
        };
        (self, Some(command))
    }
}

/// Inputs that move a session forward
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A new file was chosen; valid files are submitted right away
    FileSelected(UploadFile),
    /// Settings edited; resubmits the current file if there is one
    SettingsChanged(AnalysisSettings),
    RequestResolved {
        id: RequestId,
        response: AnalyzeResponse,
    },
    RequestFailed {
        id: RequestId,
        message: String,
    },
    ErrorDismissed,
    /// Drop the file, result and settings
    Cleared,
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Analyze {
        id: RequestId,
        upload: UploadFile,
        settings: AnalysisSettings,
    },
}

/// Advance the session by one event
pub fn apply(state: SessionState, event: SessionEvent) -> (SessionState, Option<Command>) {
    match event {
        SessionEvent::FileSelected(upload) => {
            if let Err(e) = validate_file(&upload) {
                debug!("Rejected {}: {}", upload.name, e);
                return (
                    SessionState {
                        error: Some(e.to_string()),
                        ..state
                    },
                    None,
                );
            }
            SessionState {
                upload: Some(upload),
                ..state
            }
            .submit()
        }

        SessionEvent::SettingsChanged(settings) => {
            if let Err(e) = settings.validate() {
                return (
                    SessionState {
                        error: Some(e.to_string()),
                        ..state
                    },
                    None,
                );
            }
            SessionState { settings, ..state }.submit()
        }

        SessionEvent::RequestResolved { id, response } => {
            if state.pending != Some(id) {
                debug!("Ignoring stale response for request {}", id.value());
                return (state, None);
            }
            (
                SessionState {
                    result: Some(response),
                    error: None,
                    pending: None,
                    ..state
                },
                None,
            )
        }

        SessionEvent::RequestFailed { id, message } => {
            if state.pending != Some(id) {
                debug!("Ignoring stale failure for request {}", id.value());
                return (state, None);
            }
            (
                SessionState {
                    error: Some(message),
                    pending: None,
                    ..state
                },
                None,
            )
        }

        SessionEvent::ErrorDismissed => (SessionState { error: None, ..state }, None),

        // Ids keep counting so a response to a pre-clear request stays stale
        SessionEvent::Cleared => (
            SessionState {
                next_request: state.next_request,
                ..SessionState::default()
            },
            None,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn song() -> UploadFile {
        UploadFile::new("song.mp3", 4 * 1024 * 1024, "audio/mpeg")
    }

    fn response(key: &str) -> AnalyzeResponse {
        let mut response = AnalyzeResponse::default();
        response.analysis.key = Some(key.to_string());
        response
    }

    fn analyze_id(command: Option<Command>) -> RequestId {
        match command {
            Some(Command::Analyze { id, .. }) => id,
            None => panic!("expected an analyze command"),
        }
    }

    #[test]
    fn test_valid_file_submits() {
        let (state, command) = apply(SessionState::default(), SessionEvent::FileSelected(song()));

        match command {
            Some(Command::Analyze { upload, settings, .. }) => {
                assert_eq!(upload.name, "song.mp3");
                assert_eq!(settings, AnalysisSettings::default());
            }
            None => panic!("expected an analyze command"),
        }
        assert!(state.is_loading());
        assert!(state.error.is_none());
    }

    #[test]
    fn test_invalid_file_sets_error_without_request() {
        let huge = UploadFile::new("take.wav", 101 * 1024 * 1024, "audio/wav");
        let (state, command) = apply(SessionState::default(), SessionEvent::FileSelected(huge));

        assert!(command.is_none());
        assert!(!state.is_loading());
        assert!(state.upload.is_none());
        assert!(state.error.unwrap().contains("100 MB"));
    }

    #[test]
    fn test_resolution_stores_result() {
        let (state, command) = apply(SessionState::default(), SessionEvent::FileSelected(song()));
        let id = analyze_id(command);

        let (state, command) = apply(
            state,
            SessionEvent::RequestResolved {
                id,
                response: response("G"),
            },
        );
        assert!(command.is_none());
        assert!(!state.is_loading());
        assert_eq!(state.tab_result().unwrap().key, "G");
    }

    #[test]
    fn test_settings_change_resubmits_and_latest_wins() {
        let (state, first) = apply(SessionState::default(), SessionEvent::FileSelected(song()));
        let first = analyze_id(first);

        let capo = AnalysisSettings {
            capo_position: 3,
            ..AnalysisSettings::default()
        };
        let (state, second) = apply(state, SessionEvent::SettingsChanged(capo));
        let second_id = analyze_id(second.clone());
        assert_ne!(first, second_id);
        match second {
            Some(Command::Analyze { settings, .. }) => assert_eq!(settings.capo_position, 3),
            None => unreachable!(),
        }

        // Newer request resolves first; the older one arrives late
        let (state, _) = apply(
            state,
            SessionEvent::RequestResolved {
                id: second_id,
                response: response("Am"),
            },
        );
        let (state, _) = apply(
            state,
            SessionEvent::RequestResolved {
                id: first,
                response: response("C"),
            },
        );
        assert_eq!(state.tab_result().unwrap().key, "Am");
    }

    #[test]
    fn test_stale_failure_is_ignored() {
        let (state, first) = apply(SessionState::default(), SessionEvent::FileSelected(song()));
        let first = analyze_id(first);
        let (state, second) = apply(state, SessionEvent::FileSelected(song()));
        let second = analyze_id(second);

        let (state, _) = apply(
            state,
            SessionEvent::RequestFailed {
                id: first,
                message: "timeout".to_string(),
            },
        );
        assert!(state.error.is_none());
        assert_eq!(state.pending, Some(second));
    }

    #[test]
    fn test_failure_keeps_previous_result() {
        let (state, command) = apply(SessionState::default(), SessionEvent::FileSelected(song()));
        let (state, _) = apply(
            state,
            SessionEvent::RequestResolved {
                id: analyze_id(command),
                response: response("E"),
            },
        );

        let (state, command) = apply(state, SessionEvent::SettingsChanged(AnalysisSettings::default()));
        let (state, _) = apply(
            state,
            SessionEvent::RequestFailed {
                id: analyze_id(command),
                message: "Server error (500)".to_string(),
            },
        );
        assert_eq!(state.error.as_deref(), Some("Server error (500)"));
        assert_eq!(state.tab_result().unwrap().key, "E");

        let (state, _) = apply(state, SessionEvent::ErrorDismissed);
        assert!(state.error.is_none());
    }

    #[test]
    fn test_settings_without_file_only_store() {
        let settings = AnalysisSettings {
            key_change: -2,
            ..AnalysisSettings::default()
        };
        let (state, command) = apply(SessionState::default(), SessionEvent::SettingsChanged(settings));
        assert!(command.is_none());
        assert_eq!(state.settings.key_change, -2);
    }

    #[test]
    fn test_out_of_range_settings_rejected() {
        let settings = AnalysisSettings {
            key_change: 13,
            ..AnalysisSettings::default()
        };
        let (state, command) = apply(SessionState::default(), SessionEvent::SettingsChanged(settings));
        assert!(command.is_none());
        assert!(state.error.is_some());
        assert_eq!(state.settings, AnalysisSettings::default());
    }

    #[test]
    fn test_clear_resets_and_old_ids_stay_stale() {
        let (state, command) = apply(SessionState::default(), SessionEvent::FileSelected(song()));
        let id = analyze_id(command);

        let (state, _) = apply(state, SessionEvent::Cleared);
        assert!(state.upload.is_none());
        assert!(!state.is_loading());

        let (state, _) = apply(
            state,
            SessionEvent::RequestResolved {
                id,
                response: response("D"),
            },
        );
        assert!(state.result.is_none());

        let (_, command) = apply(state, SessionEvent::FileSelected(song()));
        assert_ne!(analyze_id(command), id);
    }
}
