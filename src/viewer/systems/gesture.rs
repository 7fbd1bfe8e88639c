//! Bridge from the tracking pipeline's latest-wins slots into ECS state.

use bevy::prelude::*;

use crate::viewer::components::StatusReadout;
use crate::viewer::resources::{GestureFeed, GestureInput};

/// Copy the most recent gesture sample into the frame's input resource.
/// The slot is single-writer (detection loop) / single-reader (here); the
/// render loop never waits on the detection loop.
pub fn poll_gesture_system(feed: Res<GestureFeed>, mut input: ResMut<GestureInput>) {
    if let Some(receiver) = feed.gesture.as_ref() {
        input.0 = *receiver.borrow();
    }
}

/// Mirror the pipeline's stage/health status into the readout text.
pub fn status_readout_system(
    feed: Res<GestureFeed>,
    mut readouts: Query<&mut Text, With<StatusReadout>>,
) {
    let Some(receiver) = feed.status.as_ref() else {
        return;
    };
    let status = receiver.borrow().to_string();
    for mut text in readouts.iter_mut() {
        if text.0 != status {
            text.0 = status.clone();
        }
    }
}
