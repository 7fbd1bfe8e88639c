//! Application error types.

use thiserror::Error;

use crate::gesture::Delegate;

/// Application-level errors for constel.
///
/// Initialization errors are all eligible for retry: a retry re-runs the
/// full tracking setup sequence from a clean teardown.
#[derive(Error, Debug)]
pub enum AppError {
    // Detection asset errors
    #[error("detection model too small: {size} bytes (minimum {min}) - re-download required")]
    ModelIntegrity { size: u64, min: u64 },

    #[error("detection model fetch failed: {0}")]
    ModelFetch(String),

    // Detector initialization errors
    #[error("inference runtime failed to load: {0}")]
    RuntimeLoad(String),

    #[error("{delegate} detector initialization failed: {message}")]
    DetectorInit { delegate: Delegate, message: String },

    #[error("detector initialization timed out after {seconds}s")]
    InitTimeout { seconds: u64 },

    // Device errors
    #[error("camera unavailable: {0}")]
    Camera(String),

    // Per-frame detection errors (caught in the sampling loop, never fatal)
    #[error("detection failed: {0}")]
    Detection(String),

    // Graph ingest errors
    #[error("graph file error: {0}")]
    GraphFile(String),

    // Config errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
