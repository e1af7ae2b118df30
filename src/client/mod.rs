//! Analysis service client
//!
//! `AnalysisBackend` is the seam; `HttpBackend` is the production transport.

pub mod http;
pub mod traits;

pub use http::{HttpBackend, API_URL_ENV, DEFAULT_SERVER_URL, DEFAULT_TIMEOUT};
pub use traits::{AnalysisBackend, TabRequest};
