use bevy::prelude::*;

use crate::player::Player;

/// Keeps the camera on the player, shifted horizontally by `offset`.
#[derive(Component, Reflect, Debug, Default, Clone)]
#[reflect(Component)]
pub struct CameraFollow {
    pub offset: f32,
}

/// Copies the player's x (plus offset) and y into the camera, leaving z alone.
pub fn follow_player(
    mut camera_query: Query<(&mut Transform, &CameraFollow)>,
    player_query: Query<&Transform, (With<Player>, Without<CameraFollow>)>,
) {
    let Ok(player_transform) = player_query.single() else {
        return;
    };

    for (mut camera_transform, follow) in camera_query.iter_mut() {
        camera_transform.translation.x = player_transform.translation.x + follow.offset;
        camera_transform.translation.y = player_transform.translation.y;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_tracks_player_with_offset_and_keeps_depth() {
        let mut app = App::new();
        app.add_systems(Update, follow_player);

        let camera = app
            .world_mut()
            .spawn((CameraFollow { offset: 2.0 }, Transform::from_xyz(0.0, 0.0, 999.0)))
            .id();
        // no observer registered, so this is a bare marker without a body
        app.world_mut().spawn((Player, Transform::from_xyz(5.0, -3.0, 0.0)));

        app.update();

        let translation = app.world().get::<Transform>(camera).unwrap().translation;
        assert_eq!(translation, Vec3::new(7.0, -3.0, 999.0));
    }

    #[test]
    fn missing_player_leaves_camera_alone() {
        let mut app = App::new();
        app.add_systems(Update, follow_player);
        let camera = app
            .world_mut()
            .spawn((CameraFollow { offset: 2.0 }, Transform::from_xyz(1.0, 1.0, 10.0)))
            .id();

        app.update();

        let translation = app.world().get::<Transform>(camera).unwrap().translation;
        assert_eq!(translation, Vec3::new(1.0, 1.0, 10.0));
    }
}
