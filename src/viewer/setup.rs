//! Scene initialization: camera, lighting, shared assets, status readout.

use bevy::prelude::*;
use bevy::ui::PositionType;

use super::components::StatusReadout;
use super::resources::{GraphUpdate, InitialGraph, OrbitCamera, SceneAssets, StyleMaterials};

/// Setup the scene with camera, lighting, and shared GPU assets.
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    orbit: Res<OrbitCamera>,
) {
    // Camera
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(orbit.position()).looking_at(orbit.target, Vec3::Y),
    ));

    // Main directional light
    commands.spawn((
        DirectionalLight {
            illuminance: 18000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(12.0, 20.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    // Fill light from the opposite side
    commands.spawn((
        DirectionalLight {
            illuminance: 6000.0,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_xyz(-10.0, 8.0, -8.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::WHITE,
        brightness: 250.0,
    });

    // Shared materials and meshes, created once
    commands.insert_resource(StyleMaterials::build(&mut materials));
    commands.insert_resource(SceneAssets::build(&mut meshes));

    // Tracking status readout, top-left
    commands.spawn((
        Text::new("Hand tracking off"),
        TextFont {
            font_size: 12.0,
            ..default()
        },
        TextColor(Color::srgba(0.6, 0.9, 0.6, 0.85)),
        bevy::ui::Node {
            position_type: PositionType::Absolute,
            left: Val::Px(10.0),
            top: Val::Px(10.0),
            ..default()
        },
        StatusReadout,
    ));
}

/// Feed the initial graph through the same wholesale-update path later
/// updates use.
pub fn seed_initial_graph(
    mut initial: ResMut<InitialGraph>,
    mut events: EventWriter<GraphUpdate>,
) {
    if let Some(data) = initial.0.take() {
        events.send(GraphUpdate(data));
    }
}
