//! 3D graph viewer.
//!
//! Renders a live force-laid-out graph of typed entities with Bevy and
//! lets gestures from the tracking pipeline steer the camera.
//!
//! ## Module structure
//!
//! - `components` - ECS components for nodes, edges, hit volumes
//! - `constants` - colors, sizes, camera tuning
//! - `style` - static per-kind visual style table
//! - `resources` - ECS resources (camera orbit, scene index, feeds)
//! - `systems` - ECS systems (scene lifecycle, camera, picking, gesture)
//! - `setup` - scene initialization
//! - `plugin` - Bevy plugin definition and tick ordering

pub mod components;
pub mod constants;
mod plugin;
pub mod resources;
mod setup;
pub mod style;
pub mod systems;

use bevy::prelude::*;

pub use plugin::{ViewerPlugin, ViewerOptions};
pub use resources::SelectFn;

/// Run the viewer window with the given options.
///
/// Blocks until the window is closed. Tracking teardown is the caller's
/// job afterwards (see `HandTracking::shutdown`), keeping the teardown
/// order explicit: sampling task, detector, camera device, then the GPU
/// resources released here.
pub fn run_viewer(options: ViewerOptions) {
    let (width, height) = (
        options.settings.window_width,
        options.settings.window_height,
    );

    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "constel".to_string(),
                resolution: (width, height).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(ClearColor(Color::srgb(0.03, 0.03, 0.06)))
        .add_plugins(ViewerPlugin::new(options))
        .run();
}
