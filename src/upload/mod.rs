//! File selection: inspection and the upload validation contract

pub mod validator;

pub use validator::{inspect, validate_file, UploadFile, UploadFormat, MAX_UPLOAD_BYTES};
