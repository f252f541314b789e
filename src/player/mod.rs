use avian2d::prelude::*;
use bevy::prelude::*;

use crate::level::GameLayer;
use crate::links::{CrouchColliderOf, LinkToRootPlugin, VisualOf};
use crate::player::animations::*;
use crate::player::controller::*;
use crate::player::input::*;
use crate::player::motor::{ControllerConfig, ControllerState, ProbeContacts};

pub mod animations;
pub mod controller;
pub mod input;
pub mod motor;

/// The player character. Spawning it attaches the body, colliders and
/// controller.
#[derive(Component, Default)]
#[require(Transform, InheritedVisibility, ControllerConfig, PlayerInput, AnimatorParams)]
pub struct Player;

/// Sprite child drawing a character.
#[derive(Component, Default)]
pub struct PlayerVisual;

/// Upper body collider, switched off while crouching.
#[derive(Component, Default)]
pub struct CrouchDisableCollider;

#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum ControllerSystems {
    Sense,
    Move,
}

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(LinkToRootPlugin::<PlayerVisual, Player, VisualOf>::default());
        app.add_plugins(
            LinkToRootPlugin::<CrouchDisableCollider, Player, CrouchColliderOf>::default(),
        );
        app.add_message::<Landed>()
            .add_message::<CrouchChanged>()
            .add_message::<Jumped>()
            .add_message::<Dashed>();
        app.add_observer(on_player_spawn);
        app.configure_sets(
            FixedUpdate,
            (ControllerSystems::Sense, ControllerSystems::Move).chain(),
        );
        app.add_systems(Update, read_input);
        app.add_systems(
            FixedUpdate,
            (
                (tick_controller_timers, sense_contacts, update_contacts)
                    .chain()
                    .in_set(ControllerSystems::Sense),
                (move_character, consume_intents)
                    .chain()
                    .in_set(ControllerSystems::Move),
            ),
        );
        app.add_systems(
            Update,
            (on_landing, on_crouching, on_jump, update_pose, apply_pose)
                .chain()
                .after(read_input),
        );
    }
}

const PLAYER_SIZE: Vec2 = Vec2::new(0.6, 1.0);

fn on_player_spawn(
    on: On<Add, Player>,
    mut commands: Commands,
    mut configs: Query<&mut ControllerConfig>,
) -> Result {
    let root = on.event_target();
    let mut config = configs.get_mut(root)?;

    for fix in config.sanitize() {
        warn!("{root}: clamped controller config, {fix}");
    }

    let player_layers =
        CollisionLayers::new(GameLayer::Player, [GameLayer::Default, GameLayer::Ground]);
    let no_friction = Friction::ZERO.with_combine_rule(CoefficientCombine::Min);

    commands.entity(root).insert((
        ControllerState::for_config(&config),
        ProbeContacts::default(),
        AnimationPose::default(),
        RigidBody::Dynamic,
        LockedAxes::ROTATION_LOCKED,
        Mass(1.0),
        NoAutoMass,
        GravityScale(1.0),
    ));

    // lower body, always solid
    commands.spawn((
        Name::new("Lower body"),
        Collider::circle(0.3),
        Transform::from_xyz(0.0, -0.2, 0.0),
        player_layers,
        no_friction,
        ChildOf(root),
    ));

    commands.spawn((
        Name::new("Upper body"),
        CrouchDisableCollider,
        Collider::rectangle(0.5, 0.5),
        Transform::from_xyz(0.0, 0.2, 0.0),
        player_layers,
        no_friction,
        ChildOf(root),
    ));

    commands.spawn((
        Name::new("Sprite"),
        PlayerVisual,
        Sprite::from_color(AnimationPose::default().color(), PLAYER_SIZE),
        Transform::default(),
        ChildOf(root),
    ));

    info!("player {root} spawned");

    Ok(())
}
