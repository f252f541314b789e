use avian2d::prelude::*;
use bevy::ecs::relationship::RelationshipTarget;
use bevy::prelude::*;

use crate::links::HasCrouchCollider;
use crate::player::input::PlayerInput;
use crate::player::motor::{
    self, ControllerConfig, ControllerEvent, ControllerState, MoveIntent, ProbeContacts,
};

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landed {
    pub entity: Entity,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrouchChanged {
    pub entity: Entity,
    pub crouching: bool,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jumped {
    pub entity: Entity,
    pub air: bool,
}

#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dashed {
    pub entity: Entity,
}

pub fn tick_controller_timers(time: Res<Time>, mut q: Query<&mut ControllerState>) {
    let dt = time.delta_secs();
    for mut state in q.iter_mut() {
        motor::tick_timers(&mut state, dt);
    }
}

/// Runs the ground, ceiling, wall and ledge probes against the physics world.
#[allow(clippy::type_complexity)]
pub fn sense_contacts(
    spatial: SpatialQuery,
    mut q: Query<(
        Entity,
        &Transform,
        &ControllerConfig,
        &ControllerState,
        &mut ProbeContacts,
        Option<&RigidBodyColliders>,
        Option<&HasCrouchCollider>,
    )>,
) {
    for (entity, transform, config, state, mut contacts, own_colliders, crouch_collider) in
        q.iter_mut()
    {
        let origin = transform.translation.truncate();
        let probe = |offset: Vec2| motor::probe_point(origin, offset, state.facing_right);

        // the body never counts as its own ground or wall
        let mut excluded = vec![entity];
        excluded.extend(own_colliders.into_iter().flat_map(RelationshipTarget::iter));
        excluded.extend(crouch_collider.map(HasCrouchCollider::target_entity));
        let filter = SpatialQueryFilter::from_mask(config.ground_layers)
            .with_excluded_entities(excluded);

        let overlaps = |offset: Vec2, radius: f32| {
            !spatial
                .shape_intersections(&Collider::circle(radius), probe(offset), 0.0, &filter)
                .is_empty()
        };

        let direction = if state.facing_right { Dir2::X } else { Dir2::NEG_X };
        let ray_hits = |offset: Vec2, distance: f32| {
            spatial
                .cast_ray(probe(offset), direction, distance, true, &filter)
                .is_some()
        };

        let sensed = ProbeContacts {
            ground: overlaps(config.ground_check, config.ground_radius),
            ceiling: overlaps(config.ceiling_check, config.ceiling_radius),
            wall: ray_hits(config.wall_check, config.wall_check_distance),
            ledge: ray_hits(config.ledge_check, config.ledge_check_distance),
        };

        // only write on change so inspectors and change detection stay quiet
        contacts.set_if_neq(sensed);
    }
}

/// Applies grounding, wall slide and ledge hang to the body.
#[allow(clippy::type_complexity)]
pub fn update_contacts(
    mut q: Query<(
        Entity,
        &ControllerConfig,
        &mut ControllerState,
        &ProbeContacts,
        &mut LinearVelocity,
        &mut GravityScale,
    )>,
    mut landed: MessageWriter<Landed>,
) {
    for (entity, config, mut state, contacts, mut velocity, mut gravity) in q.iter_mut() {
        let was_hanging = state.ledge_hanging;

        let outcome = motor::apply_contacts(&mut state, config, *contacts, velocity.0);
        velocity.0 = outcome.velocity;

        if outcome.landed {
            debug!("{entity} landed");
            landed.write(Landed { entity });
        }

        if state.ledge_hanging != was_hanging {
            debug!("{entity} ledge hanging: {}", state.ledge_hanging);
        }
        // a hanging body must not creep down the wall
        gravity.0 = if state.ledge_hanging { 0.0 } else { 1.0 };
    }
}

/// Feeds the latched input to the movement policy and writes the result back.
#[allow(clippy::type_complexity)]
pub fn move_character(
    time: Res<Time>,
    mut commands: Commands,
    mut q: Query<(
        Entity,
        &ControllerConfig,
        &mut ControllerState,
        &ProbeContacts,
        &PlayerInput,
        &mut LinearVelocity,
        &mut GravityScale,
        Option<&ComputedMass>,
        Option<&HasCrouchCollider>,
    )>,
    disabled: Query<Has<ColliderDisabled>>,
    mut crouched: MessageWriter<CrouchChanged>,
    mut jumped: MessageWriter<Jumped>,
    mut dashed: MessageWriter<Dashed>,
) {
    let dt = time.delta_secs();

    for (
        entity,
        config,
        mut state,
        contacts,
        input,
        mut velocity,
        mut gravity,
        mass,
        crouch_collider,
    ) in q.iter_mut()
    {
        let intent = MoveIntent {
            horizontal: input.horizontal_move * dt,
            crouch: input.crouch,
            jump: input.jump,
            dash: input.dash,
        };
        let inverse_mass = mass.map_or(1.0, |m| m.inverse());

        let plan = motor::plan_move(
            &mut state,
            config,
            intent,
            *contacts,
            velocity.0,
            inverse_mass,
            dt,
        );
        velocity.0 = plan.velocity;
        if !state.ledge_hanging {
            gravity.0 = 1.0;
        }

        if plan.flipped {
            let facing = if state.facing_right { "right" } else { "left" };
            debug!("{entity} now facing {facing}");
        }

        if let (Some(enabled), Some(link)) = (plan.upper_collider_enabled, crouch_collider) {
            let collider = link.target_entity();
            let is_disabled = disabled.get(collider).unwrap_or(false);
            if enabled && is_disabled {
                commands.entity(collider).remove::<ColliderDisabled>();
            } else if !enabled && !is_disabled {
                commands.entity(collider).insert(ColliderDisabled);
            }
        }

        for event in plan.events {
            match event {
                ControllerEvent::CrouchChanged(crouching) => {
                    crouched.write(CrouchChanged { entity, crouching });
                }
                ControllerEvent::Jumped { air } => {
                    debug!("{entity} jumped (air: {air})");
                    jumped.write(Jumped { entity, air });
                }
                ControllerEvent::Dashed => {
                    debug!("{entity} dashed");
                    dashed.write(Dashed { entity });
                }
            }
        }
    }
}
