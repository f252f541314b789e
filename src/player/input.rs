use bevy::prelude::*;

use crate::player::animations::AnimatorParams;

/// Intent sampled from the keyboard and gamepads every frame.
///
/// `jump` and `dash` stay latched until a fixed step has consumed them, so a
/// press is never lost when a frame runs no fixed step.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct PlayerInput {
    pub run_speed: f32,
    pub horizontal_move: f32,
    pub jump: bool,
    pub crouch: bool,
    pub dash: bool,
}

impl Default for PlayerInput {
    fn default() -> Self {
        Self {
            run_speed: 40.0,
            horizontal_move: 0.0,
            jump: false,
            crouch: false,
            dash: false,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Buttons {
    axis: f32,
    jump_pressed: bool,
    crouch_pressed: bool,
    crouch_released: bool,
    dash_pressed: bool,
}

fn keyboard_buttons(keyboard: &ButtonInput<KeyCode>) -> Buttons {
    let mut axis = 0.0;
    if keyboard.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]) {
        axis -= 1.0;
    }
    if keyboard.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]) {
        axis += 1.0;
    }

    Buttons {
        axis,
        jump_pressed: keyboard.just_pressed(KeyCode::Space),
        crouch_pressed: keyboard.any_just_pressed([KeyCode::KeyS, KeyCode::ArrowDown]),
        crouch_released: keyboard.any_just_released([KeyCode::KeyS, KeyCode::ArrowDown]),
        dash_pressed: keyboard.any_just_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
    }
}

fn gamepad_buttons(gamepad: &Gamepad) -> Buttons {
    let mut axis = gamepad.left_stick().x;
    if gamepad.pressed(GamepadButton::DPadLeft) {
        axis = -1.0;
    }
    if gamepad.pressed(GamepadButton::DPadRight) {
        axis = 1.0;
    }

    Buttons {
        axis,
        jump_pressed: gamepad.just_pressed(GamepadButton::South),
        crouch_pressed: gamepad.just_pressed(GamepadButton::East),
        crouch_released: gamepad.just_released(GamepadButton::East),
        dash_pressed: gamepad.just_pressed(GamepadButton::West),
    }
}

fn merge(a: Buttons, b: Buttons) -> Buttons {
    Buttons {
        // the stronger axis wins
        axis: if b.axis.abs() > a.axis.abs() { b.axis } else { a.axis },
        jump_pressed: a.jump_pressed || b.jump_pressed,
        crouch_pressed: a.crouch_pressed || b.crouch_pressed,
        crouch_released: a.crouch_released || b.crouch_released,
        dash_pressed: a.dash_pressed || b.dash_pressed,
    }
}

pub fn read_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    gamepads: Query<&Gamepad>,
    mut q: Query<(&mut PlayerInput, &mut AnimatorParams)>,
) {
    let buttons = gamepads
        .iter()
        .map(gamepad_buttons)
        .fold(keyboard_buttons(&keyboard), merge);

    for (mut input, mut params) in q.iter_mut() {
        input.horizontal_move = buttons.axis.clamp(-1.0, 1.0) * input.run_speed;
        params.speed = input.horizontal_move.abs();

        if buttons.jump_pressed {
            input.jump = true;
            params.is_jumping = true;
        }

        if buttons.crouch_pressed {
            input.crouch = true;
        } else if buttons.crouch_released {
            input.crouch = false;
        }

        if buttons.dash_pressed {
            input.dash = true;
        }
    }
}

/// Clears the one-shot intents after the controller has seen them.
pub fn consume_intents(mut q: Query<&mut PlayerInput>) {
    for mut input in q.iter_mut() {
        input.jump = false;
        input.dash = false;
    }
}
