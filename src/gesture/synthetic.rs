//! Deterministic synthetic vision backend.
//!
//! Produces a scripted hand that sweeps horizontally, alternates open and
//! closed poses, and periodically leaves the frame. Used by the CLI demo
//! (`--hands synthetic`, `constel track`) and by tests; it exercises the
//! whole pipeline - integrity check, delegate construction, sampling loop,
//! debounce - without hardware or a real model.

use std::time::Duration;

use async_trait::async_trait;

use super::backend::{
    CaptureRequest, Delegate, HandLandmarker, InferenceRuntime, VideoFrame, VideoSource,
    VisionBackend,
};
use super::landmarks::{HandLandmarks, Landmark, LANDMARK_COUNT, WRIST};
use crate::error::AppError;
use crate::gesture::assets::MIN_MODEL_BYTES;

/// Length of one scripted motion cycle.
const CYCLE: f32 = 8.0;

pub struct SyntheticBackend;

#[async_trait]
impl VisionBackend for SyntheticBackend {
    fn builtin_model(&self) -> Option<Vec<u8>> {
        // A deterministic blob big enough to pass the integrity check
        Some(vec![0xC5; MIN_MODEL_BYTES as usize + 64])
    }

    async fn load_runtime(&self, _model: &[u8]) -> Result<Box<dyn InferenceRuntime>, AppError> {
        Ok(Box::new(SyntheticRuntime))
    }

    async fn open_camera(
        &self,
        request: &CaptureRequest,
    ) -> Result<Box<dyn VideoSource>, AppError> {
        if request.frame_rate == 0 {
            return Err(AppError::Camera("zero frame rate requested".to_string()));
        }
        Ok(Box::new(SyntheticCamera {
            width: request.width,
            height: request.height,
            frame_interval: Duration::from_secs_f64(1.0 / request.frame_rate as f64),
            frame: 0,
        }))
    }
}

struct SyntheticRuntime;

#[async_trait]
impl InferenceRuntime for SyntheticRuntime {
    async fn create_landmarker(
        &self,
        _delegate: Delegate,
    ) -> Result<Box<dyn HandLandmarker>, AppError> {
        Ok(Box::new(SyntheticLandmarker))
    }
}

struct SyntheticCamera {
    width: u32,
    height: u32,
    frame_interval: Duration,
    frame: u64,
}

#[async_trait]
impl VideoSource for SyntheticCamera {
    async fn next_frame(&mut self) -> Result<VideoFrame, AppError> {
        tokio::time::sleep(self.frame_interval).await;
        let timestamp = self.frame_interval * self.frame as u32;
        self.frame += 1;
        Ok(VideoFrame {
            width: self.width,
            height: self.height,
            rgb: Vec::new(),
            timestamp,
        })
    }

    fn stop(&mut self) {}
}

struct SyntheticLandmarker;

impl HandLandmarker for SyntheticLandmarker {
    fn detect(&mut self, frame: &VideoFrame) -> Result<Option<HandLandmarks>, AppError> {
        let t = frame.timestamp.as_secs_f32() % CYCLE;

        // Final second of each cycle: the hand leaves the frame
        if t > CYCLE - 1.0 {
            return Ok(None);
        }

        // Slow horizontal sweep; closed fist during the middle stretch
        let sweep = 0.5 + 0.4 * (t / CYCLE * std::f32::consts::TAU).sin();
        let open = !(3.0..5.0).contains(&t);
        Ok(Some(scripted_hand(sweep, 0.5, open)))
    }
}

/// Build a hand whose palm-base centroid lands at the given pre-mirror
/// position, with all five digits extended (open) or curled (closed).
fn scripted_hand(x: f32, y: f32, open: bool) -> HandLandmarks {
    let mut points = [Landmark { x, y, z: 0.0 }; LANDMARK_COUNT];
    points[WRIST] = Landmark {
        x,
        y: y + 0.08,
        z: 0.0,
    };

    let digits: [(usize, usize); 5] = [(4, 2), (8, 5), (12, 9), (16, 13), (20, 17)];
    for (i, (tip, joint)) in digits.into_iter().enumerate() {
        let angle = std::f32::consts::PI * (0.3 + 0.1 * i as f32);
        let (dx, dy) = (angle.cos(), -angle.sin());
        let wrist = points[WRIST];
        let tip_reach = if open { 0.32 } else { 0.08 };
        points[joint] = Landmark {
            x: wrist.x + dx * 0.18,
            y: wrist.y + dy * 0.18,
            z: 0.0,
        };
        points[tip] = Landmark {
            x: wrist.x + dx * tip_reach,
            y: wrist.y + dy * tip_reach,
            z: 0.0,
        };
    }
    HandLandmarks::new(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::landmarks::classify;
    use crate::gesture::state::Gesture;

    #[test]
    fn test_builtin_model_passes_integrity() {
        let model = SyntheticBackend.builtin_model().unwrap();
        assert!(crate::gesture::assets::verify_model(&model).is_ok());
    }

    #[test]
    fn test_scripted_hand_classifies_as_requested() {
        assert_eq!(classify(&scripted_hand(0.5, 0.5, true)), Gesture::Open);
        assert_eq!(classify(&scripted_hand(0.5, 0.5, false)), Gesture::Closed);
    }

    #[test]
    fn test_script_leaves_frame_at_cycle_end() {
        let mut landmarker = SyntheticLandmarker;
        let frame = |secs: f32| VideoFrame {
            width: 320,
            height: 240,
            rgb: Vec::new(),
            timestamp: Duration::from_secs_f32(secs),
        };
        assert!(landmarker.detect(&frame(1.0)).unwrap().is_some());
        assert!(landmarker.detect(&frame(CYCLE - 0.5)).unwrap().is_none());
    }
}
