use bevy::prelude::*;
use strum_macros::Display;

use crate::links::VisualOf;
use crate::player::controller::{CrouchChanged, Jumped, Landed};
use crate::player::motor::ControllerState;

/// Animator parameters driven by input and controller messages.
#[derive(Component, Reflect, Debug, Default, Clone, PartialEq)]
#[reflect(Component)]
pub struct AnimatorParams {
    pub speed: f32,
    pub is_jumping: bool,
    pub is_double_jump: bool,
    pub is_crouching: bool,
}

#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(test, derive(strum_macros::EnumIter))]
#[reflect(Component)]
pub enum AnimationPose {
    #[default]
    Idle,
    Running,
    Jumping,
    DoubleJumping,
    Crouching,
    WallSliding,
    LedgeHanging,
}

impl AnimationPose {
    pub fn from_params(params: &AnimatorParams, state: &ControllerState) -> Self {
        if state.ledge_hanging {
            Self::LedgeHanging
        } else if state.wall_sliding {
            Self::WallSliding
        } else if params.is_crouching {
            Self::Crouching
        } else if params.is_double_jump {
            Self::DoubleJumping
        } else if params.is_jumping || !state.grounded {
            Self::Jumping
        } else if params.speed > 0.01 {
            Self::Running
        } else {
            Self::Idle
        }
    }

    /// Squash and stretch of the sprite in this pose.
    pub fn scale(self) -> Vec2 {
        match self {
            Self::Idle | Self::Running => Vec2::ONE,
            Self::Jumping => Vec2::new(0.85, 1.15),
            Self::DoubleJumping => Vec2::new(0.8, 1.2),
            Self::Crouching => Vec2::new(1.15, 0.6),
            Self::WallSliding => Vec2::new(0.9, 1.05),
            Self::LedgeHanging => Vec2::new(0.95, 1.1),
        }
    }

    pub fn color(self) -> Color {
        match self {
            Self::Idle => Color::srgb(0.85, 0.75, 0.45),
            Self::Running => Color::srgb(0.95, 0.8, 0.4),
            Self::Jumping => Color::srgb(0.55, 0.8, 0.95),
            Self::DoubleJumping => Color::srgb(0.4, 0.6, 1.0),
            Self::Crouching => Color::srgb(0.75, 0.55, 0.35),
            Self::WallSliding => Color::srgb(0.9, 0.5, 0.5),
            Self::LedgeHanging => Color::srgb(0.6, 0.9, 0.6),
        }
    }
}

pub fn on_landing(mut landed: MessageReader<Landed>, mut q: Query<&mut AnimatorParams>) {
    for Landed { entity } in landed.read() {
        let Ok(mut params) = q.get_mut(*entity) else {
            continue;
        };
        params.is_jumping = false;
        params.is_double_jump = false;
    }
}

pub fn on_crouching(mut crouched: MessageReader<CrouchChanged>, mut q: Query<&mut AnimatorParams>) {
    for CrouchChanged { entity, crouching } in crouched.read() {
        let Ok(mut params) = q.get_mut(*entity) else {
            continue;
        };
        params.is_crouching = *crouching;
    }
}

pub fn on_jump(mut jumped: MessageReader<Jumped>, mut q: Query<&mut AnimatorParams>) {
    for Jumped { entity, air } in jumped.read() {
        let Ok(mut params) = q.get_mut(*entity) else {
            continue;
        };
        params.is_jumping = true;
        if *air {
            params.is_double_jump = true;
        }
    }
}

pub fn update_pose(mut q: Query<(Entity, &AnimatorParams, &ControllerState, &mut AnimationPose)>) {
    for (entity, params, state, mut pose) in q.iter_mut() {
        let next = AnimationPose::from_params(params, state);
        if next != *pose {
            debug!("{entity}: {} -> {next}", *pose);
            *pose = next;
        }
    }
}

/// Eases each visual toward its character's pose and faces it the right way.
pub fn apply_pose(
    mut visuals: Query<(&VisualOf, &mut Transform, &mut Sprite)>,
    characters: Query<(&AnimationPose, &ControllerState)>,
    time: Res<Time>,
) {
    const INTERPOLATION_SPEED: f32 = 12.0;
    let blend = 1.0 - (-time.delta_secs() * INTERPOLATION_SPEED).exp();

    for (VisualOf(character), mut transform, mut sprite) in visuals.iter_mut() {
        let Ok((pose, state)) = characters.get(*character) else {
            continue;
        };

        let target = pose.scale().extend(1.0);
        transform.scale = transform.scale.lerp(target, blend);
        // keep the feet planted while squashing
        transform.translation.y = (transform.scale.y - 1.0) * 0.5;

        sprite.color = pose.color();
        sprite.flip_x = !state.facing_right;
    }
}
