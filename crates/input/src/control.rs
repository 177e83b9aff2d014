use std::rc::Rc;

use glam::Vec3;
use pinpoint_scene::Scene;

use crate::controller::{CameraInput, InputConfig, InputError};
use crate::state::InputMode;

/// Scene-level switchboard for camera input.
///
/// Builds the [`CameraInput`] lazily on first enable and remembers whether
/// the virtual joystick should drive it, so the two toggles can be flipped in
/// any order.
#[derive(Debug)]
pub struct CameraControl {
    scene: Rc<Scene>,
    config: InputConfig,
    input: Option<CameraInput>,
    joystick: bool,
}

impl CameraControl {
    pub fn new(scene: Rc<Scene>, config: InputConfig) -> Self {
        let joystick = config.mode == InputMode::Joystick;
        Self {
            scene,
            config,
            input: None,
            joystick,
        }
    }

    pub fn input(&self) -> Option<&CameraInput> {
        self.input.as_ref()
    }

    pub fn is_joystick_enabled(&self) -> bool {
        self.joystick
    }

    fn mode(&self) -> InputMode {
        if self.joystick {
            InputMode::Joystick
        } else {
            InputMode::Keyboard
        }
    }

    pub fn enable_keyboard_controls(&mut self) -> Result<(), InputError> {
        let mode = self.mode();
        let input = self.input.get_or_insert_with(|| CameraInput::new(self.config.clone()));
        input.set_mode(mode);
        input.attach(&self.scene)
    }

    /// Stop listening and fall back to keyboard mode. Works even after the
    /// camera it was attached to has left the scene.
    pub fn disable_keyboard_controls(&mut self) {
        if let Some(input) = self.input.as_mut() {
            input.set_mode(InputMode::Keyboard);
            input.detach();
        }
    }

    pub fn enable_joystick(&mut self) {
        self.joystick = true;
        if let Some(input) = &self.input {
            input.set_mode(InputMode::Joystick);
        }
    }

    pub fn disable_joystick(&mut self) {
        self.joystick = false;
        if let Some(input) = &self.input {
            input.set_mode(InputMode::Keyboard);
        }
    }

    /// Per-frame hook for the render loop.
    pub fn poll(&self) -> Vec3 {
        self.input.as_ref().map_or(Vec3::ZERO, CameraInput::poll)
    }
}
