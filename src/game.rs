use avian2d::prelude::*;
use bevy::camera::ScalingMode;
use bevy::prelude::*;
#[cfg(not(target_arch = "wasm32"))]
use bevy_inspector_egui::{bevy_egui::EguiPlugin, quick::WorldInspectorPlugin};

use crate::camera::{CameraFollow, FollowCameraPlugin};
use crate::level::{LevelPlugin, spawn_level};
use crate::player::{Player, PlayerPlugin};

/// Physics step rate. Forces are integrated over one step of this.
pub const FIXED_HZ: f64 = 50.0;

pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default());
        app.insert_resource(Gravity(Vec2::NEG_Y * 20.0));
        app.insert_resource(Time::<Fixed>::from_hz(FIXED_HZ));
        //app.add_plugins(PhysicsDebugPlugin::default());

        #[cfg(not(target_arch = "wasm32"))]
        {
            app.add_plugins(EguiPlugin::default());
            app.add_plugins(WorldInspectorPlugin::new());
        }

        app.add_plugins(LevelPlugin);
        app.add_plugins(PlayerPlugin);
        app.add_plugins(FollowCameraPlugin);
        app.insert_resource(ClearColor(Color::srgb(0.08, 0.09, 0.12)));
        app.add_systems(Startup, (spawn_level, setup));
    }
}

fn setup(mut commands: Commands) {
    commands.spawn((
        Camera2d,
        Projection::Orthographic(OrthographicProjection {
            scaling_mode: ScalingMode::FixedVertical {
                viewport_height: 14.0,
            },
            ..OrthographicProjection::default_2d()
        }),
        CameraFollow { offset: 2.0 },
        Name::new("Camera"),
    ));

    commands.spawn((Player, Transform::from_xyz(0.0, 0.5, 0.0), Name::new("Player")));
}
