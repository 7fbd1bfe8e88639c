//! Vision backend seam.
//!
//! The detector stack (inference runtime, hand landmarker, camera device)
//! sits behind traits so concrete integrations can be plugged in without
//! touching the pipeline. The crate ships a synthetic implementation; real
//! backends implement the same traits.

use std::time::Duration;

use async_trait::async_trait;

use super::landmarks::HandLandmarks;
use crate::error::AppError;

/// Compute delegate preference for detector construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegate {
    /// Accelerated backend; tried first, under a hard timeout.
    Gpu,
    /// Fallback backend; tried when the accelerated one fails or times out.
    Cpu,
}

impl std::fmt::Display for Delegate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delegate::Gpu => write!(f, "GPU"),
            Delegate::Cpu => write!(f, "CPU"),
        }
    }
}

/// Fixed target resolution and frame rate requested from the camera.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest {
    pub width: u32,
    pub height: u32,
    pub frame_rate: u32,
}

/// One captured video frame handed to the detector.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Packed RGB pixel data; backends that detect out-of-band may leave
    /// this empty.
    pub rgb: Vec<u8>,
    /// Capture timestamp relative to stream start.
    pub timestamp: Duration,
}

/// Entry point of a vision integration: loads the inference runtime and
/// opens capture devices.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Model bytes bundled with the backend, if any. Used when the
    /// configured model source is `builtin`; the integrity check still
    /// applies to them.
    fn builtin_model(&self) -> Option<Vec<u8>> {
        None
    }

    /// Load the inference runtime from verified model bytes.
    async fn load_runtime(&self, model: &[u8]) -> Result<Box<dyn InferenceRuntime>, AppError>;

    /// Acquire the camera device at the requested resolution/frame-rate.
    /// Denial or unavailability is terminal for the session.
    async fn open_camera(&self, request: &CaptureRequest)
        -> Result<Box<dyn VideoSource>, AppError>;
}

/// A loaded inference runtime that can construct detectors.
#[async_trait]
pub trait InferenceRuntime: Send + Sync {
    async fn create_landmarker(
        &self,
        delegate: Delegate,
    ) -> Result<Box<dyn HandLandmarker>, AppError>;
}

/// A constructed hand-landmark detector. Native resources are released on
/// drop.
pub trait HandLandmarker: Send {
    /// Detect at most one hand in the frame. `Ok(None)` means no hand;
    /// errors are per-frame and never fatal to the sampling loop.
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, AppError>;
}

/// An open capture device delivering frames at its own cadence.
#[async_trait]
pub trait VideoSource: Send {
    async fn next_frame(&mut self) -> Result<VideoFrame, AppError>;

    /// Stop the device's media tracks. Called during ordered teardown,
    /// after the detector has been released.
    fn stop(&mut self);
}
