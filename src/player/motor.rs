//! Movement policy for the platformer character.
//!
//! Everything in here is plain arithmetic over the controller's config and
//! state. The ECS systems in [`crate::player::controller`] feed it the probe
//! results and the body's velocity, then write back whatever it decides.

use avian2d::prelude::LayerMask;
use bevy::prelude::*;

use crate::level::GameLayer;

/// Tuning scalars for a character controller.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component, Default)]
pub struct ControllerConfig {
    /// Force added when the character jumps.
    pub jump_force: f32,
    /// Extra force added to a grounded jump while crouching.
    pub crouch_jump_force: f32,
    /// Jumps per ground or wall contact, the grounded one included.
    pub max_jumps: u32,
    /// Fraction of the move speed kept while crouching on the ground.
    pub crouch_speed: f32,
    /// Smoothing time of the horizontal velocity damper.
    pub movement_smoothing: f32,
    /// Whether the character can steer while airborne.
    pub air_control: bool,
    /// Layers the probes treat as ground and walls.
    #[reflect(ignore)]
    pub ground_layers: LayerMask,
    /// Probe positions relative to the body. The x of the wall and ledge
    /// probes is mirrored when the character faces left.
    pub ground_check: Vec2,
    pub ceiling_check: Vec2,
    pub wall_check: Vec2,
    pub ledge_check: Vec2,
    pub ground_radius: f32,
    pub ceiling_radius: f32,
    pub wall_check_distance: f32,
    pub ledge_check_distance: f32,
    /// Fall speed cap while sliding down a wall.
    pub max_wall_slide_speed: f32,
    /// Seconds between two dashes.
    pub dash_cooldown: f32,
    /// Dash force is the current horizontal velocity times this.
    pub dash_force_factor: f32,
    /// Crouching in the air pushes down with `|vy|` times this.
    pub crouch_fall_factor: f32,
    /// Target horizontal velocity per unit of move input.
    pub move_velocity_scale: f32,
    /// Grab ledges when the wall probe hits but the ledge probe doesn't.
    pub ledge_hang: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            jump_force: 400.0,
            crouch_jump_force: 100.0,
            max_jumps: 2,
            crouch_speed: 0.36,
            movement_smoothing: 0.05,
            air_control: false,
            ground_layers: GameLayer::Ground.into(),
            ground_check: Vec2::new(0.0, -0.5),
            ceiling_check: Vec2::new(0.0, 0.5),
            wall_check: Vec2::new(0.3, 0.0),
            ledge_check: Vec2::new(0.3, 0.45),
            ground_radius: 0.2,
            ceiling_radius: 0.2,
            wall_check_distance: 0.15,
            ledge_check_distance: 0.15,
            max_wall_slide_speed: 2.0,
            dash_cooldown: 3.0,
            dash_force_factor: 400.0,
            crouch_fall_factor: 3.0,
            move_velocity_scale: 10.0,
            ledge_hang: true,
        }
    }
}

impl ControllerConfig {
    /// Clamps out of range values, returning a description of each fix.
    pub fn sanitize(&mut self) -> Vec<String> {
        let mut fixes = Vec::new();

        let crouch_speed = self.crouch_speed.clamp(0.0, 1.0);
        if crouch_speed != self.crouch_speed {
            fixes.push(format!("crouch_speed {} -> {crouch_speed}", self.crouch_speed));
            self.crouch_speed = crouch_speed;
        }

        let smoothing = self.movement_smoothing.clamp(0.0, 0.3);
        if smoothing != self.movement_smoothing {
            fixes.push(format!("movement_smoothing {} -> {smoothing}", self.movement_smoothing));
            self.movement_smoothing = smoothing;
        }

        if self.max_jumps == 0 {
            fixes.push("max_jumps 0 -> 1".to_string());
            self.max_jumps = 1;
        }

        if self.dash_cooldown < 0.0 {
            fixes.push(format!("dash_cooldown {} -> 0", self.dash_cooldown));
            self.dash_cooldown = 0.0;
        }

        fixes
    }

    pub fn air_jumps(&self) -> u32 {
        self.max_jumps.saturating_sub(1)
    }
}

/// Transient movement state, owned by the controller.
#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct ControllerState {
    pub grounded: bool,
    pub facing_right: bool,
    pub air_jumps_remaining: u32,
    /// Zero means a dash is available.
    pub dash_cooldown_remaining: f32,
    pub was_crouching: bool,
    pub wall_sliding: bool,
    pub ledge_hanging: bool,
    /// Set after a grounded jump, cleared once the body stops rising.
    /// Ground contacts are ignored while it is set.
    pub rising_from_jump: bool,
    /// Set after letting go of a ledge, cleared once the wall is left.
    pub ledge_hang_suppressed: bool,
    /// Internal velocity of the smoothing damper.
    pub smoothing_velocity: Vec2,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            grounded: false,
            facing_right: true,
            air_jumps_remaining: 0,
            dash_cooldown_remaining: 0.0,
            was_crouching: false,
            wall_sliding: false,
            ledge_hanging: false,
            rising_from_jump: false,
            ledge_hang_suppressed: false,
            smoothing_velocity: Vec2::ZERO,
        }
    }
}

impl ControllerState {
    pub fn for_config(config: &ControllerConfig) -> Self {
        Self {
            air_jumps_remaining: config.air_jumps(),
            ..default()
        }
    }

    pub fn facing_sign(&self) -> f32 {
        if self.facing_right { 1.0 } else { -1.0 }
    }

    pub fn dash_ready(&self) -> bool {
        self.dash_cooldown_remaining <= 0.0
    }

    fn refill_jumps(&mut self, config: &ControllerConfig) {
        self.air_jumps_remaining = config.air_jumps();
    }
}

/// What the four probes saw this step.
#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct ProbeContacts {
    pub ground: bool,
    pub ceiling: bool,
    pub wall: bool,
    pub ledge: bool,
}

/// One fixed step worth of player intent.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    /// Horizontal move already scaled by the fixed delta.
    pub horizontal: f32,
    pub crouch: bool,
    pub jump: bool,
    pub dash: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerEvent {
    CrouchChanged(bool),
    Jumped { air: bool },
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContactOutcome {
    pub velocity: Vec2,
    pub landed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MovePlan {
    pub velocity: Vec2,
    /// `Some` when the crouch-disable collider should be switched.
    pub upper_collider_enabled: Option<bool>,
    pub flipped: bool,
    pub events: Vec<ControllerEvent>,
}

/// World-space position of a probe placed at `offset` from `origin`.
pub fn probe_point(origin: Vec2, offset: Vec2, facing_right: bool) -> Vec2 {
    let sign = if facing_right { 1.0 } else { -1.0 };
    origin + Vec2::new(offset.x * sign, offset.y)
}

/// Critically damped spring toward `target`, never overshooting it.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    let smooth_time = smooth_time.max(0.0001);
    let omega = 2.0 / smooth_time;

    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;

    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = if dt > 0.0 { (output - target) / dt } else { 0.0 };
    }

    output
}

pub fn smooth_damp_vec2(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f32,
    dt: f32,
) -> Vec2 {
    Vec2::new(
        smooth_damp(current.x, target.x, &mut velocity.x, smooth_time, dt),
        smooth_damp(current.y, target.y, &mut velocity.y, smooth_time, dt),
    )
}

/// Counts the dash cooldown down.
pub fn tick_timers(state: &mut ControllerState, dt: f32) {
    state.dash_cooldown_remaining = (state.dash_cooldown_remaining - dt).max(0.0);
}

/// Updates grounding, wall slide and ledge hang from the probe results.
pub fn apply_contacts(
    state: &mut ControllerState,
    config: &ControllerConfig,
    contacts: ProbeContacts,
    mut velocity: Vec2,
) -> ContactOutcome {
    let was_grounded = state.grounded;

    if state.rising_from_jump && velocity.y <= 0.0 {
        state.rising_from_jump = false;
    }

    state.grounded = contacts.ground && !state.rising_from_jump;

    let mut landed = false;
    if state.grounded {
        state.refill_jumps(config);
        landed = !was_grounded;
    }

    state.wall_sliding = contacts.wall && velocity.y <= 0.0 && !state.grounded;
    if state.wall_sliding {
        velocity.x = 0.0;
        velocity.y = velocity.y.max(-config.max_wall_slide_speed);
        state.refill_jumps(config);
    }

    if !contacts.wall || state.grounded {
        state.ledge_hang_suppressed = false;
    }

    state.ledge_hanging = config.ledge_hang
        && !state.ledge_hang_suppressed
        && contacts.wall
        && !contacts.ledge
        && !state.grounded
        && velocity.y <= 0.0;
    if state.ledge_hanging {
        velocity = Vec2::ZERO;
    }

    ContactOutcome { velocity, landed }
}

/// Decides the body's velocity for this step.
///
/// Forces (jump, dash, airborne crouch) are integrated over `dt` with the
/// body's inverse mass, the same way the physics step would.
pub fn plan_move(
    state: &mut ControllerState,
    config: &ControllerConfig,
    intent: MoveIntent,
    contacts: ProbeContacts,
    velocity: Vec2,
    inverse_mass: f32,
    dt: f32,
) -> MovePlan {
    let mut plan = MovePlan {
        velocity,
        upper_collider_enabled: None,
        flipped: false,
        events: Vec::new(),
    };

    let mut crouch = intent.crouch;
    let mut horizontal = intent.horizontal;
    let mut force = Vec2::ZERO;

    // can't stand up under a ceiling
    if !crouch && contacts.ceiling {
        crouch = true;
    }

    if state.ledge_hanging && intent.crouch {
        state.ledge_hanging = false;
        state.ledge_hang_suppressed = true;
    }

    if state.grounded || config.air_control {
        if crouch {
            if !state.was_crouching {
                state.was_crouching = true;
                plan.events.push(ControllerEvent::CrouchChanged(true));
            }

            if state.grounded {
                horizontal *= config.crouch_speed;
                plan.upper_collider_enabled = Some(false);
            } else {
                force.y -= velocity.y.abs() * config.crouch_fall_factor;
            }
        } else {
            plan.upper_collider_enabled = Some(true);

            if state.was_crouching {
                state.was_crouching = false;
                plan.events.push(ControllerEvent::CrouchChanged(false));
            }
        }

        let mut target = Vec2::new(horizontal * config.move_velocity_scale, velocity.y);
        if state.wall_sliding {
            target.x = 0.0;
        }
        if state.ledge_hanging {
            target = Vec2::ZERO;
        }

        plan.velocity = smooth_damp_vec2(
            velocity,
            target,
            &mut state.smoothing_velocity,
            config.movement_smoothing,
            dt,
        );

        if (horizontal > 0.0 && !state.facing_right) || (horizontal < 0.0 && state.facing_right) {
            state.facing_right = !state.facing_right;
            plan.flipped = true;
        }
    }

    if intent.dash && state.dash_ready() {
        force.x += plan.velocity.x * config.dash_force_factor;
        state.dash_cooldown_remaining = config.dash_cooldown;
        plan.events.push(ControllerEvent::Dashed);
    }

    if intent.jump {
        let from_ground = state.grounded || state.ledge_hanging;
        if from_ground {
            force.y += if crouch {
                config.jump_force + config.crouch_jump_force
            } else {
                config.jump_force
            };
            if state.ledge_hanging {
                state.ledge_hanging = false;
                state.ledge_hang_suppressed = true;
            }
            state.grounded = false;
            state.rising_from_jump = true;
            plan.events.push(ControllerEvent::Jumped { air: false });
        } else if state.air_jumps_remaining > 0 {
            state.air_jumps_remaining -= 1;
            force.y += config.jump_force;
            plan.events.push(ControllerEvent::Jumped { air: true });
        }
    }

    plan.velocity += force * inverse_mass * dt;
    plan
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 0.02;

    fn grounded() -> ProbeContacts {
        ProbeContacts {
            ground: true,
            ..default()
        }
    }

    fn landed_state(config: &ControllerConfig) -> ControllerState {
        let mut state = ControllerState::for_config(config);
        apply_contacts(&mut state, config, grounded(), Vec2::ZERO);
        state
    }

    fn jump() -> MoveIntent {
        MoveIntent {
            jump: true,
            ..default()
        }
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let mut velocity = 0.0;
        let mut value = 0.0;
        for _ in 0..200 {
            value = smooth_damp(value, 8.0, &mut velocity, 0.05, DT);
            assert!(value <= 8.0, "overshot to {value}");
        }
        assert!((value - 8.0).abs() < 1e-3);
    }

    #[test]
    fn smooth_damp_with_zero_smoothing_snaps() {
        let mut velocity = 0.0;
        let value = smooth_damp(0.0, 5.0, &mut velocity, 0.0, DT);
        assert!((value - 5.0).abs() < 1e-3);
    }

    #[test]
    fn probes_mirror_with_facing() {
        let origin = Vec2::new(10.0, 2.0);
        let offset = Vec2::new(0.3, 0.45);
        assert_eq!(probe_point(origin, offset, true), Vec2::new(10.3, 2.45));
        assert_eq!(probe_point(origin, offset, false), Vec2::new(9.7, 2.45));
    }

    #[test]
    fn landing_fires_once_and_refills_jumps() {
        let config = ControllerConfig::default();
        let mut state = ControllerState {
            air_jumps_remaining: 0,
            ..default()
        };

        let first = apply_contacts(&mut state, &config, grounded(), Vec2::ZERO);
        assert!(first.landed);
        assert!(state.grounded);
        assert_eq!(state.air_jumps_remaining, 1);

        let second = apply_contacts(&mut state, &config, grounded(), Vec2::ZERO);
        assert!(!second.landed);
    }

    #[test]
    fn exactly_one_air_jump_with_two_jumps() {
        let config = ControllerConfig::default();
        let mut state = landed_state(&config);

        let plan = plan_move(&mut state, &config, jump(), grounded(), Vec2::ZERO, 1.0, DT);
        assert_eq!(plan.events, vec![ControllerEvent::Jumped { air: false }]);
        assert!((plan.velocity.y - 8.0).abs() < 1e-4);

        // still overlapping the ground while rising: not grounded again
        apply_contacts(&mut state, &config, grounded(), plan.velocity);
        assert!(!state.grounded);

        let air = ProbeContacts::default();
        apply_contacts(&mut state, &config, air, Vec2::new(0.0, 2.0));
        let plan = plan_move(&mut state, &config, jump(), air, Vec2::new(0.0, 2.0), 1.0, DT);
        assert_eq!(plan.events, vec![ControllerEvent::Jumped { air: true }]);
        assert_eq!(state.air_jumps_remaining, 0);

        let plan = plan_move(&mut state, &config, jump(), air, Vec2::new(0.0, 2.0), 1.0, DT);
        assert!(plan.events.is_empty());
    }

    #[test]
    fn single_jump_config_has_no_air_jump() {
        let config = ControllerConfig {
            max_jumps: 1,
            ..default()
        };
        let mut state = ControllerState::for_config(&config);
        let air = ProbeContacts::default();
        apply_contacts(&mut state, &config, air, Vec2::new(0.0, -1.0));

        let plan = plan_move(&mut state, &config, jump(), air, Vec2::new(0.0, -1.0), 1.0, DT);
        assert!(plan.events.is_empty());
    }

    #[test]
    fn crouch_jump_adds_extra_force() {
        let config = ControllerConfig::default();
        let mut state = landed_state(&config);
        let intent = MoveIntent {
            jump: true,
            crouch: true,
            ..default()
        };

        let plan = plan_move(&mut state, &config, intent, grounded(), Vec2::ZERO, 1.0, DT);
        assert!((plan.velocity.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn dash_respects_cooldown() {
        let config = ControllerConfig {
            movement_smoothing: 0.0,
            ..default()
        };
        let mut state = landed_state(&config);
        let intent = MoveIntent {
            horizontal: 0.8,
            dash: true,
            ..default()
        };

        let plan = plan_move(&mut state, &config, intent, grounded(), Vec2::new(8.0, 0.0), 1.0, DT);
        assert!(plan.events.contains(&ControllerEvent::Dashed));
        assert!(plan.velocity.x > 8.0);
        assert_eq!(state.dash_cooldown_remaining, 3.0);

        let plan = plan_move(&mut state, &config, intent, grounded(), Vec2::new(8.0, 0.0), 1.0, DT);
        assert!(!plan.events.contains(&ControllerEvent::Dashed));

        for _ in 0..160 {
            tick_timers(&mut state, DT);
        }
        assert!(state.dash_ready());
    }

    #[test]
    fn crouching_on_ground_slows_and_disables_collider() {
        let config = ControllerConfig {
            movement_smoothing: 0.0,
            ..default()
        };
        let mut state = landed_state(&config);
        let intent = MoveIntent {
            horizontal: 1.0,
            crouch: true,
            ..default()
        };

        let plan = plan_move(&mut state, &config, intent, grounded(), Vec2::ZERO, 1.0, DT);
        assert!((plan.velocity.x - 3.6).abs() < 1e-3);
        assert_eq!(plan.upper_collider_enabled, Some(false));
        assert_eq!(plan.events, vec![ControllerEvent::CrouchChanged(true)]);

        // held crouch doesn't re-fire
        let plan = plan_move(&mut state, &config, intent, grounded(), Vec2::ZERO, 1.0, DT);
        assert!(plan.events.is_empty());

        let stand = MoveIntent::default();
        let plan = plan_move(&mut state, &config, stand, grounded(), Vec2::ZERO, 1.0, DT);
        assert_eq!(plan.upper_collider_enabled, Some(true));
        assert_eq!(plan.events, vec![ControllerEvent::CrouchChanged(false)]);
    }

    #[test]
    fn ceiling_keeps_character_crouched() {
        let config = ControllerConfig::default();
        let mut state = landed_state(&config);
        state.was_crouching = true;
        let contacts = ProbeContacts {
            ground: true,
            ceiling: true,
            ..default()
        };

        let stand = MoveIntent::default();
        let plan = plan_move(&mut state, &config, stand, contacts, Vec2::ZERO, 1.0, DT);
        assert_eq!(plan.upper_collider_enabled, Some(false));
        assert!(plan.events.is_empty());
        assert!(state.was_crouching);
    }

    #[test]
    fn no_steering_in_air_without_air_control() {
        let config = ControllerConfig::default();
        let mut state = ControllerState::for_config(&config);
        let intent = MoveIntent {
            horizontal: -1.0,
            ..default()
        };

        let velocity = Vec2::new(3.0, -1.0);
        let air = ProbeContacts::default();
        let plan = plan_move(&mut state, &config, intent, air, velocity, 1.0, DT);
        assert_eq!(plan.velocity, velocity);
        assert!(state.facing_right);
    }

    #[test]
    fn air_control_crouch_pushes_down() {
        let config = ControllerConfig {
            air_control: true,
            ..default()
        };
        let mut state = ControllerState::for_config(&config);
        let intent = MoveIntent {
            crouch: true,
            ..default()
        };

        let air = ProbeContacts::default();
        let velocity = Vec2::new(0.0, -5.0);
        let plan = plan_move(&mut state, &config, intent, air, velocity, 1.0, DT);
        assert!(plan.velocity.y < -5.0);
        assert_eq!(plan.upper_collider_enabled, None);
    }

    #[test]
    fn facing_flips_on_direction_change() {
        let config = ControllerConfig::default();
        let mut state = landed_state(&config);
        let left = MoveIntent {
            horizontal: -0.8,
            ..default()
        };

        let plan = plan_move(&mut state, &config, left, grounded(), Vec2::ZERO, 1.0, DT);
        assert!(plan.flipped);
        assert!(!state.facing_right);

        let plan = plan_move(&mut state, &config, left, grounded(), Vec2::ZERO, 1.0, DT);
        assert!(!plan.flipped);
    }

    #[test]
    fn wall_slide_caps_fall_and_refills_jumps() {
        let config = ControllerConfig {
            ledge_hang: false,
            ..default()
        };
        let mut state = ControllerState {
            air_jumps_remaining: 0,
            ..default()
        };
        let contacts = ProbeContacts {
            wall: true,
            ledge: true,
            ..default()
        };

        let outcome = apply_contacts(&mut state, &config, contacts, Vec2::new(4.0, -9.0));
        assert!(state.wall_sliding);
        assert_eq!(outcome.velocity, Vec2::new(0.0, -2.0));
        assert_eq!(state.air_jumps_remaining, 1);

        // rising along the wall is not sliding
        apply_contacts(&mut state, &config, contacts, Vec2::new(0.0, 3.0));
        assert!(!state.wall_sliding);
    }

    #[test]
    fn ledge_hang_only_without_ledge_hit() {
        let config = ControllerConfig::default();
        let mut state = ControllerState::for_config(&config);
        let wall_only = ProbeContacts {
            wall: true,
            ..default()
        };

        let outcome = apply_contacts(&mut state, &config, wall_only, Vec2::new(0.0, -3.0));
        assert!(state.ledge_hanging);
        assert_eq!(outcome.velocity, Vec2::ZERO);

        let full_wall = ProbeContacts {
            wall: true,
            ledge: true,
            ..default()
        };
        apply_contacts(&mut state, &config, full_wall, Vec2::new(0.0, -3.0));
        assert!(!state.ledge_hanging);
    }

    #[test]
    fn dropping_from_ledge_suppresses_regrab_until_wall_is_left() {
        let config = ControllerConfig::default();
        let mut state = ControllerState::for_config(&config);
        let wall_only = ProbeContacts {
            wall: true,
            ..default()
        };
        apply_contacts(&mut state, &config, wall_only, Vec2::ZERO);
        assert!(state.ledge_hanging);

        let drop = MoveIntent {
            crouch: true,
            ..default()
        };
        plan_move(&mut state, &config, drop, wall_only, Vec2::ZERO, 1.0, DT);
        assert!(!state.ledge_hanging);

        apply_contacts(&mut state, &config, wall_only, Vec2::new(0.0, -1.0));
        assert!(!state.ledge_hanging);

        apply_contacts(&mut state, &config, ProbeContacts::default(), Vec2::new(0.0, -1.0));
        apply_contacts(&mut state, &config, wall_only, Vec2::new(0.0, -1.0));
        assert!(state.ledge_hanging);
    }

    #[test]
    fn jumping_off_a_ledge_counts_as_ground_jump() {
        let config = ControllerConfig::default();
        let mut state = ControllerState {
            air_jumps_remaining: 0,
            ..default()
        };
        let wall_only = ProbeContacts {
            wall: true,
            ..default()
        };
        apply_contacts(&mut state, &config, wall_only, Vec2::ZERO);

        let plan = plan_move(&mut state, &config, jump(), wall_only, Vec2::ZERO, 1.0, DT);
        assert_eq!(plan.events, vec![ControllerEvent::Jumped { air: false }]);
        assert!(!state.ledge_hanging);
        assert!(plan.velocity.y > 0.0);
    }

    #[test]
    fn sanitize_clamps_ranges() {
        let mut config = ControllerConfig {
            crouch_speed: 1.5,
            movement_smoothing: -0.1,
            max_jumps: 0,
            ..default()
        };

        let fixes = config.sanitize();
        assert_eq!(fixes.len(), 3);
        assert_eq!(config.crouch_speed, 1.0);
        assert_eq!(config.movement_smoothing, 0.0);
        assert_eq!(config.max_jumps, 1);
        assert!(ControllerConfig::default().sanitize().is_empty());
    }
}
