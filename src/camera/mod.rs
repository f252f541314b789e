pub mod follow;

pub use follow::*;

use bevy::prelude::*;
use bevy::transform::TransformSystems;

/// Plugin for the side-scrolling follow camera
pub struct FollowCameraPlugin;

impl Plugin for FollowCameraPlugin {
    fn build(&self, app: &mut App) {
        // the body has moved by now, copy it before transforms propagate
        app.add_systems(
            PostUpdate,
            follow::follow_player.before(TransformSystems::Propagate),
        );
    }
}
