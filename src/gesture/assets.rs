//! Detection model retrieval and integrity checking.
//!
//! The model is a binary blob fetched over HTTP (or read locally). A
//! truncated download produces a file that the inference runtime rejects
//! with an opaque crash much later, so the size is verified up front:
//! anything under [`MIN_MODEL_BYTES`] is treated as corrupt and rejected
//! before any backend is constructed.

use tracing::info;

use super::backend::VisionBackend;
use crate::config::ModelSource;
use crate::error::AppError;

/// Smallest plausible detection model. Real hand-landmark models are
/// several megabytes; a smaller blob is a truncated or error-page download.
pub const MIN_MODEL_BYTES: u64 = 1_000_000;

/// Reject undersized model bytes before they reach a runtime.
pub fn verify_model(bytes: &[u8]) -> Result<(), AppError> {
    let size = bytes.len() as u64;
    if size < MIN_MODEL_BYTES {
        return Err(AppError::ModelIntegrity {
            size,
            min: MIN_MODEL_BYTES,
        });
    }
    Ok(())
}

/// Resolve the model source to verified bytes.
pub async fn fetch_model(
    source: &ModelSource,
    backend: &dyn VisionBackend,
) -> Result<Vec<u8>, AppError> {
    let bytes = match source {
        ModelSource::Builtin => backend
            .builtin_model()
            .ok_or_else(|| AppError::ModelFetch("backend bundles no builtin model".to_string()))?,
        ModelSource::Url(url) => {
            let response = reqwest::get(url)
                .await
                .map_err(|e| AppError::ModelFetch(e.to_string()))?;
            if !response.status().is_success() {
                return Err(AppError::ModelFetch(format!(
                    "HTTP {} from {url}",
                    response.status()
                )));
            }
            response
                .bytes()
                .await
                .map_err(|e| AppError::ModelFetch(e.to_string()))?
                .to_vec()
        }
        ModelSource::Path(path) => tokio::fs::read(path)
            .await
            .map_err(|e| AppError::ModelFetch(format!("{}: {e}", path.display())))?,
    };

    verify_model(&bytes)?;
    info!(
        size_mb = format!("{:.2}", bytes.len() as f64 / 1024.0 / 1024.0),
        "detection model verified"
    );
    Ok(bytes)
}
