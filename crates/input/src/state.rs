use std::collections::HashSet;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use crate::bindings::{Direction, KeyBindings};

/// Which device drives per-frame motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputMode {
    #[default]
    Keyboard,
    Joystick,
}

/// Raw device state between frames.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CameraInputState {
    pressed_keys: HashSet<KeyCode>,
    movement_vector: Vec2,
    joystick_active: bool,
    mode: InputMode,
}

impl CameraInputState {
    pub fn new(mode: InputMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    /// Switch modes. Changing mode drops held keys and the stick vector.
    pub fn set_mode(&mut self, mode: InputMode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.pressed_keys.clear();
        self.movement_vector = Vec2::ZERO;
        true
    }

    pub fn pressed_keys(&self) -> &HashSet<KeyCode> {
        &self.pressed_keys
    }

    pub fn is_pressed(&self, code: KeyCode) -> bool {
        self.pressed_keys.contains(&code)
    }

    pub fn press(&mut self, code: KeyCode) {
        self.pressed_keys.insert(code);
    }

    pub fn release(&mut self, code: KeyCode) {
        self.pressed_keys.remove(&code);
    }

    pub fn clear_keys(&mut self) {
        self.pressed_keys.clear();
    }

    pub fn movement_vector(&self) -> Vec2 {
        self.movement_vector
    }

    pub fn is_joystick_active(&self) -> bool {
        self.joystick_active
    }

    pub fn joystick_start(&mut self) {
        self.joystick_active = true;
    }

    pub fn joystick_move(&mut self, vector: Vec2) {
        self.movement_vector = vector;
    }

    pub fn joystick_end(&mut self) {
        self.movement_vector = Vec2::ZERO;
        self.joystick_active = false;
    }

    /// Drop all device state but keep the mode.
    pub fn clear(&mut self) {
        self.pressed_keys.clear();
        self.movement_vector = Vec2::ZERO;
        self.joystick_active = false;
    }

    /// Camera-local displacement for one frame, before handedness correction.
    pub fn local_displacement(&self, bindings: &KeyBindings, speed: f32) -> Vec3 {
        match self.mode {
            InputMode::Keyboard => self.keyboard_displacement(bindings, speed),
            InputMode::Joystick => self.joystick_displacement(speed),
        }
    }

    // Every held key contributes on its own; two keys bound to the same
    // direction move twice as far.
    fn keyboard_displacement(&self, bindings: &KeyBindings, speed: f32) -> Vec3 {
        let mut local = Vec3::ZERO;
        for direction in Direction::ALL {
            let held = self
                .pressed_keys
                .iter()
                .filter(|code| bindings.direction_of(**code) == Some(direction))
                .count();
            local += direction.local_axis() * speed * held as f32;
        }
        local
    }

    fn joystick_displacement(&self, speed: f32) -> Vec3 {
        if !self.joystick_active {
            return Vec3::ZERO;
        }
        Vec3::new(
            self.movement_vector.x * speed,
            0.0,
            self.movement_vector.y * speed,
        )
    }
}
