//! Hand-tracking pipeline: staged initialization, the sampling loop, and
//! ordered teardown.
//!
//! The sampling loop runs as its own task at detector cadence and never
//! blocks the render loop; the two communicate through a single
//! latest-wins slot (a watch channel: one writer here, one reader there).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use super::backend::{CaptureRequest, Delegate, HandLandmarker, VideoSource, VisionBackend};
use super::landmarks::{classify, palm_position};
use super::state::{Debouncer, Gesture, GestureState};
use crate::config::TrackingConfig;
use crate::error::AppError;

/// User-visible pipeline stage / health, published on its own slot so a
/// status readout can follow initialization and steady-state health.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackingStatus {
    CheckingModel,
    LoadingRuntime,
    CreatingDetector(Delegate),
    StartingCamera,
    WaitingForHand,
    Tracking(Gesture),
    Stopped,
}

impl std::fmt::Display for TrackingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackingStatus::CheckingModel => write!(f, "Checking model file..."),
            TrackingStatus::LoadingRuntime => write!(f, "Loading inference runtime..."),
            TrackingStatus::CreatingDetector(delegate) => {
                write!(f, "Creating detector ({delegate})...")
            }
            TrackingStatus::StartingCamera => write!(f, "Starting camera..."),
            TrackingStatus::WaitingForHand => write!(f, "No hand detected"),
            TrackingStatus::Tracking(gesture) => write!(f, "Hand detected ({gesture:?})"),
            TrackingStatus::Stopped => write!(f, "Tracking stopped"),
        }
    }
}

/// Handle to a running hand-tracking pipeline.
///
/// Dropping the handle aborts the sampling task; prefer [`shutdown`] for
/// the ordered teardown (stop sampling, release detector, stop camera).
///
/// [`shutdown`]: HandTracking::shutdown
pub struct HandTracking {
    gesture_rx: watch::Receiver<GestureState>,
    status_rx: watch::Receiver<TrackingStatus>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HandTracking {
    /// Run the full initialization sequence and start the sampling loop.
    ///
    /// Each stage fails with a distinct [`AppError`]; a caller-driven retry
    /// simply calls this again (the previous instance, if any, must be shut
    /// down first). The accelerated delegate is tried under a hard timeout
    /// and falls back to the CPU delegate on failure or timeout; only a
    /// double failure surfaces.
    pub async fn initialize(
        config: &TrackingConfig,
        backend: Arc<dyn VisionBackend>,
    ) -> Result<Self, AppError> {
        let (status_tx, status_rx) = watch::channel(TrackingStatus::CheckingModel);

        // Stage 1: model bytes, integrity-checked before any backend work
        let model = super::assets::fetch_model(&config.model_source(), backend.as_ref()).await?;

        // Stage 2: inference runtime
        status_tx.send_replace(TrackingStatus::LoadingRuntime);
        let runtime = backend.load_runtime(&model).await?;

        // Stage 3: detector, accelerated first with a hard time bound
        status_tx.send_replace(TrackingStatus::CreatingDetector(Delegate::Gpu));
        let timeout = Duration::from_secs(config.load_timeout_secs);
        let detector = match tokio::time::timeout(
            timeout,
            runtime.create_landmarker(Delegate::Gpu),
        )
        .await
        {
            Ok(Ok(detector)) => detector,
            Ok(Err(e)) => {
                warn!("GPU delegate failed, trying CPU: {e}");
                status_tx.send_replace(TrackingStatus::CreatingDetector(Delegate::Cpu));
                runtime.create_landmarker(Delegate::Cpu).await?
            }
            Err(_) => {
                warn!(
                    "GPU delegate timed out after {}s, trying CPU",
                    config.load_timeout_secs
                );
                status_tx.send_replace(TrackingStatus::CreatingDetector(Delegate::Cpu));
                runtime.create_landmarker(Delegate::Cpu).await?
            }
        };

        // Stage 4: camera device at the fixed capture request
        status_tx.send_replace(TrackingStatus::StartingCamera);
        let request = CaptureRequest {
            width: config.capture.width,
            height: config.capture.height,
            frame_rate: config.capture.frame_rate,
        };
        let camera = backend.open_camera(&request).await?;
        info!(
            width = request.width,
            height = request.height,
            frame_rate = request.frame_rate,
            "hand tracking initialized"
        );

        let (gesture_tx, gesture_rx) = watch::channel(GestureState::default());
        let (stop_tx, stop_rx) = watch::channel(false);
        let debouncer = Debouncer::new(config.debounce_frames);

        let task = tokio::spawn(sampling_loop(
            detector, camera, debouncer, gesture_tx, status_tx, stop_rx,
        ));

        Ok(Self {
            gesture_rx,
            status_rx,
            stop_tx,
            task,
        })
    }

    /// Latest-wins gesture slot for the render loop.
    pub fn gesture(&self) -> watch::Receiver<GestureState> {
        self.gesture_rx.clone()
    }

    /// Latest-wins status slot for a readout.
    pub fn status(&self) -> watch::Receiver<TrackingStatus> {
        self.status_rx.clone()
    }

    /// Ordered teardown: stop the sampling task, which releases the
    /// detector and then stops the camera's media tracks before returning.
    pub async fn shutdown(self) {
        let _ = self.stop_tx.send(true);
        let _ = self.task.await;
    }
}

async fn sampling_loop(
    mut detector: Box<dyn HandLandmarker>,
    mut camera: Box<dyn VideoSource>,
    mut debouncer: Debouncer,
    gesture_tx: watch::Sender<GestureState>,
    status_tx: watch::Sender<TrackingStatus>,
    mut stop_rx: watch::Receiver<bool>,
) {
    status_tx.send_replace(TrackingStatus::WaitingForHand);

    loop {
        let frame = tokio::select! {
            _ = stop_rx.changed() => break,
            frame = camera.next_frame() => match frame {
                Ok(frame) => frame,
                Err(e) => {
                    warn!("camera frame error: {e}");
                    continue;
                }
            },
        };

        // One bad frame is not fatal: log, leave the debounce run length
        // untouched, move on
        let detected = match detector.detect(&frame) {
            Ok(detected) => detected,
            Err(e) => {
                warn!("detection frame error: {e}");
                continue;
            }
        };

        let state = match detected {
            Some(hand) => {
                let raw = classify(&hand);
                let (x, y) = palm_position(&hand);
                let gesture = debouncer.observe(raw);
                status_tx.send_replace(TrackingStatus::Tracking(raw));
                GestureState {
                    active: true,
                    x,
                    y,
                    gesture,
                }
            }
            None => {
                status_tx.send_replace(TrackingStatus::WaitingForHand);
                GestureState::default()
            }
        };
        gesture_tx.send_replace(state);
    }

    // Ordered teardown: detector's native resources first, then the
    // capture device's media tracks
    drop(detector);
    camera.stop();
    status_tx.send_replace(TrackingStatus::Stopped);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::backend::{InferenceRuntime, VideoFrame};
    use crate::gesture::landmarks::{HandLandmarks, Landmark, LANDMARK_COUNT};
    use crate::gesture::synthetic::SyntheticBackend;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    fn test_config(model: &str) -> TrackingConfig {
        TrackingConfig {
            model: model.to_string(),
            load_timeout_secs: 1,
            debounce_frames: 5,
            capture: Default::default(),
        }
    }

    /// Backend that records whether any runtime was ever constructed.
    struct RecordingBackend {
        runtime_loaded: Arc<AtomicBool>,
    }

    #[async_trait]
    impl VisionBackend for RecordingBackend {
        async fn load_runtime(
            &self,
            _model: &[u8],
        ) -> Result<Box<dyn InferenceRuntime>, AppError> {
            self.runtime_loaded.store(true, Ordering::SeqCst);
            Err(AppError::RuntimeLoad("not reached in this test".to_string()))
        }

        async fn open_camera(
            &self,
            _request: &CaptureRequest,
        ) -> Result<Box<dyn VideoSource>, AppError> {
            Err(AppError::Camera("not reached in this test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_undersized_model_fails_before_backend_construction() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hand_landmarker.task");
        std::fs::write(&path, vec![0u8; 500]).unwrap();

        let runtime_loaded = Arc::new(AtomicBool::new(false));
        let backend = Arc::new(RecordingBackend {
            runtime_loaded: runtime_loaded.clone(),
        });

        let config = test_config(path.to_str().unwrap());
        let err = match HandTracking::initialize(&config, backend).await {
            Err(err) => err,
            Ok(_) => panic!("undersized model must fail initialization"),
        };

        assert!(matches!(err, AppError::ModelIntegrity { size: 500, .. }));
        assert!(!runtime_loaded.load(Ordering::SeqCst));
    }

    /// Runtime whose GPU delegate hangs forever; CPU succeeds.
    struct HangingGpuRuntime {
        built: Arc<AtomicU32>,
    }

    #[async_trait]
    impl InferenceRuntime for HangingGpuRuntime {
        async fn create_landmarker(
            &self,
            delegate: Delegate,
        ) -> Result<Box<dyn HandLandmarker>, AppError> {
            match delegate {
                Delegate::Gpu => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    unreachable!("GPU construction must be abandoned by the timeout");
                }
                Delegate::Cpu => {
                    self.built.fetch_add(1, Ordering::SeqCst);
                    Ok(Box::new(FixedHand { open: true }))
                }
            }
        }
    }

    struct HangingGpuBackend {
        built: Arc<AtomicU32>,
    }

    #[async_trait]
    impl VisionBackend for HangingGpuBackend {
        fn builtin_model(&self) -> Option<Vec<u8>> {
            SyntheticBackend.builtin_model()
        }

        async fn load_runtime(
            &self,
            _model: &[u8],
        ) -> Result<Box<dyn InferenceRuntime>, AppError> {
            Ok(Box::new(HangingGpuRuntime {
                built: self.built.clone(),
            }))
        }

        async fn open_camera(
            &self,
            request: &CaptureRequest,
        ) -> Result<Box<dyn VideoSource>, AppError> {
            SyntheticBackend.open_camera(request).await
        }
    }

    struct FixedHand {
        open: bool,
    }

    impl HandLandmarker for FixedHand {
        fn detect(&mut self, _frame: &VideoFrame) -> Result<Option<HandLandmarks>, AppError> {
            let mut points = [Landmark {
                x: 0.4,
                y: 0.5,
                z: 0.0,
            }; LANDMARK_COUNT];
            // Stretch or curl every digit relative to the wrist
            let reach = if self.open { 0.3 } else { 0.05 };
            for (tip, joint) in [(4, 2), (8, 5), (12, 9), (16, 13), (20, 17)] {
                points[joint].y -= 0.15;
                points[tip].y -= reach;
            }
            Ok(Some(HandLandmarks::new(points)))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_gpu_timeout_falls_back_to_cpu() {
        let built = Arc::new(AtomicU32::new(0));
        let backend = Arc::new(HangingGpuBackend {
            built: built.clone(),
        });

        let tracking = HandTracking::initialize(&test_config("builtin"), backend)
            .await
            .unwrap();

        assert_eq!(built.load(Ordering::SeqCst), 1);
        tracking.shutdown().await;
    }

    /// Landmarker that errors on every other frame.
    struct FlakyLandmarker {
        frame: u32,
        inner: FixedHand,
    }

    impl HandLandmarker for FlakyLandmarker {
        fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, AppError> {
            self.frame += 1;
            if self.frame % 2 == 0 {
                Err(AppError::Detection("transient frame failure".to_string()))
            } else {
                self.inner.detect(frame)
            }
        }
    }

    struct FlakyBackend;

    #[async_trait]
    impl VisionBackend for FlakyBackend {
        fn builtin_model(&self) -> Option<Vec<u8>> {
            SyntheticBackend.builtin_model()
        }

        async fn load_runtime(
            &self,
            _model: &[u8],
        ) -> Result<Box<dyn InferenceRuntime>, AppError> {
            Ok(Box::new(FlakyRuntime))
        }

        async fn open_camera(
            &self,
            request: &CaptureRequest,
        ) -> Result<Box<dyn VideoSource>, AppError> {
            SyntheticBackend.open_camera(request).await
        }
    }

    struct FlakyRuntime;

    #[async_trait]
    impl InferenceRuntime for FlakyRuntime {
        async fn create_landmarker(
            &self,
            _delegate: Delegate,
        ) -> Result<Box<dyn HandLandmarker>, AppError> {
            Ok(Box::new(FlakyLandmarker {
                frame: 0,
                inner: FixedHand { open: true },
            }))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_frame_detection_errors_are_not_fatal() {
        let tracking = HandTracking::initialize(&test_config("builtin"), Arc::new(FlakyBackend))
            .await
            .unwrap();

        // Enough frames for the debounce to clear despite every other frame
        // erroring: good frames keep the run going because errors leave the
        // debounce state untouched
        let mut gesture_rx = tracking.gesture();
        let mut last = GestureState::default();
        for _ in 0..20 {
            if gesture_rx.changed().await.is_err() {
                break;
            }
            last = *gesture_rx.borrow();
        }

        assert!(last.active);
        assert_eq!(last.gesture, Gesture::Open);
        tracking.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_synthetic_pipeline_reports_states_and_stops() {
        let tracking =
            HandTracking::initialize(&test_config("builtin"), Arc::new(SyntheticBackend))
                .await
                .unwrap();

        let mut gesture_rx = tracking.gesture();
        let mut saw_active = false;
        for _ in 0..30 {
            if gesture_rx.changed().await.is_err() {
                break;
            }
            if gesture_rx.borrow().active {
                saw_active = true;
                break;
            }
        }
        assert!(saw_active);

        let status_rx = tracking.status();
        tracking.shutdown().await;
        assert_eq!(*status_rx.borrow(), TrackingStatus::Stopped);
    }
}
