//! Gesture input controller.
//!
//! Samples a hand-landmark detector at its own cadence (independent of,
//! and generally slower than, the render loop), classifies the hand pose,
//! debounces it, and publishes the result through a latest-wins slot the
//! render loop reads each tick.
//!
//! ## Module structure
//!
//! - `state` - gesture state values and the debouncer
//! - `landmarks` - the 21-point hand model and pose classification
//! - `backend` - vision backend traits (runtime, detector, camera)
//! - `assets` - detection model retrieval and integrity checking
//! - `synthetic` - deterministic scripted backend for demos and tests
//! - `pipeline` - staged initialization, sampling loop, ordered teardown

mod assets;
mod backend;
mod landmarks;
mod pipeline;
mod state;
mod synthetic;

pub use assets::{fetch_model, verify_model, MIN_MODEL_BYTES};
pub use backend::{
    CaptureRequest, Delegate, HandLandmarker, InferenceRuntime, VideoFrame, VideoSource,
    VisionBackend,
};
pub use landmarks::{classify, palm_position, HandLandmarks, Landmark, LANDMARK_COUNT, WRIST};
pub use pipeline::{HandTracking, TrackingStatus};
pub use state::{Debouncer, Gesture, GestureState};
pub use synthetic::SyntheticBackend;
