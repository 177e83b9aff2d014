use std::cell::RefCell;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use pinpoint_scene::{Camera, CameraKind, Scene, SubscriptionHandle};
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;

use crate::bindings::KeyBindings;
use crate::state::{CameraInputState, InputMode};

/// Angular speed in radians per second used by [`CameraInput::local_rotation`].
pub const ROTATION_SPEED: f32 = 0.5;

/// Errors from attaching input to a scene.
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("scene has no active camera")]
    NoActiveCamera,
    #[error("camera input needs a free camera, got {0:?}")]
    IncompatibleCamera(CameraKind),
}

/// Controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub bindings: KeyBindings,
    pub mode: InputMode,
    /// Mark consumed key events so the host does not act on them too.
    pub prevent_default: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bindings: KeyBindings::default(),
            mode: InputMode::Keyboard,
            prevent_default: true,
        }
    }
}

// State shared with the listeners registered on the scene.
#[derive(Debug)]
struct Shared {
    bindings: KeyBindings,
    prevent_default: bool,
    state: RefCell<CameraInputState>,
}

impl Shared {
    fn handle_key(&self, code: KeyCode, is_down: bool, has_modifier: bool) -> bool {
        if !self.bindings.is_tracked(code) {
            return false;
        }
        let mut state = self.state.borrow_mut();
        if is_down {
            if has_modifier {
                return false;
            }
            state.press(code);
        } else {
            state.release(code);
        }
        self.prevent_default
    }

    fn lose_focus(&self) {
        self.state.borrow_mut().clear_keys();
    }
}

#[derive(Debug)]
struct Attachment {
    scene: Rc<Scene>,
    camera: Rc<Camera>,
    keyboard: SubscriptionHandle,
    canvas_blur: SubscriptionHandle,
    window_blur: SubscriptionHandle,
    pointer_up: SubscriptionHandle,
}

/// First-person camera input merging keyboard and virtual joystick.
///
/// Device events only mutate [`CameraInputState`]. Once per frame the host
/// calls [`CameraInput::poll`], which turns that state into a world-space
/// displacement on the camera's pending movement delta.
#[derive(Debug)]
pub struct CameraInput {
    shared: Rc<Shared>,
    attachment: Option<Attachment>,
}

impl Default for CameraInput {
    fn default() -> Self {
        Self::new(InputConfig::default())
    }
}

impl CameraInput {
    pub fn new(config: InputConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                bindings: config.bindings,
                prevent_default: config.prevent_default,
                state: RefCell::new(CameraInputState::new(config.mode)),
            }),
            attachment: None,
        }
    }

    pub fn bindings(&self) -> &KeyBindings {
        &self.shared.bindings
    }

    /// Snapshot of the device state.
    pub fn state(&self) -> CameraInputState {
        self.shared.state.borrow().clone()
    }

    pub fn is_attached(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn camera(&self) -> Option<&Rc<Camera>> {
        self.attachment.as_ref().map(|a| &a.camera)
    }

    /// Bind to the scene's active camera and start listening for devices.
    ///
    /// Attaching an already attached controller is a no-op.
    pub fn attach(&mut self, scene: &Rc<Scene>) -> Result<(), InputError> {
        if self.attachment.is_some() {
            return Ok(());
        }
        let camera = scene.active_camera().ok_or(InputError::NoActiveCamera)?;
        if camera.kind() != CameraKind::Free {
            return Err(InputError::IncompatibleCamera(camera.kind()));
        }

        let shared = Rc::clone(&self.shared);
        let keyboard = scene.on_keyboard.subscribe(move |event| {
            if shared.handle_key(event.code, event.is_down(), event.meta) {
                event.prevent_default();
            }
        });
        let canvas_blur = {
            let shared = Rc::clone(&self.shared);
            scene.on_canvas_blur.subscribe(move |_| shared.lose_focus())
        };
        // Keys released outside the canvas never reach the keyboard listener.
        let window_blur = {
            let shared = Rc::clone(&self.shared);
            scene.window().on_blur.subscribe(move |_| shared.lose_focus())
        };
        let pointer_up = {
            let shared = Rc::clone(&self.shared);
            scene.window().on_pointer_up.subscribe(move |_| shared.lose_focus())
        };

        tracing::debug!(mode = ?self.mode(), "camera input attached");
        self.attachment = Some(Attachment {
            scene: Rc::clone(scene),
            camera,
            keyboard,
            canvas_blur,
            window_blur,
            pointer_up,
        });
        Ok(())
    }

    /// Remove every listener, clear device state and release the camera.
    ///
    /// Detaching a detached controller is a no-op.
    pub fn detach(&mut self) {
        let Some(att) = self.attachment.take() else {
            return;
        };
        att.scene.on_keyboard.unsubscribe(att.keyboard);
        att.scene.on_canvas_blur.unsubscribe(att.canvas_blur);
        att.scene.window().on_blur.unsubscribe(att.window_blur);
        att.scene.window().on_pointer_up.unsubscribe(att.pointer_up);
        self.shared.state.borrow_mut().clear();
        tracing::debug!("camera input detached");
    }

    pub fn mode(&self) -> InputMode {
        self.shared.state.borrow().mode()
    }

    pub fn set_mode(&self, mode: InputMode) {
        if self.shared.state.borrow_mut().set_mode(mode) {
            tracing::debug!(?mode, "camera input mode switched");
        }
    }

    /// Feed a key event. Returns true when the event should not reach the host.
    pub fn on_key_event(&self, code: KeyCode, is_down: bool, has_modifier: bool) -> bool {
        self.shared.handle_key(code, is_down, has_modifier)
    }

    /// Forget held keys, e.g. when the canvas loses focus.
    pub fn lose_focus(&self) {
        self.shared.lose_focus();
    }

    pub fn on_joystick_start(&self) {
        self.shared.state.borrow_mut().joystick_start();
    }

    /// Stick deflection in [-1, 1] on both axes; anything else is dropped.
    pub fn on_joystick_move(&self, vector: Vec2) {
        if !vector.is_finite() || vector.abs().max_element() > 1.0 {
            tracing::warn!(?vector, "ignoring out-of-range joystick vector");
            return;
        }
        self.shared.state.borrow_mut().joystick_move(vector);
    }

    pub fn on_joystick_end(&self) {
        self.shared.state.borrow_mut().joystick_end();
    }

    /// Push this frame's motion into the camera. Returns the world-space delta.
    pub fn poll(&self) -> Vec3 {
        let Some(att) = &self.attachment else {
            return Vec3::ZERO;
        };
        let _span = tracing::trace_span!("camera_input_poll").entered();

        let elapsed = att.scene.delta_time().as_secs_f32();
        let speed = att.camera.speed() * elapsed;
        let mut local = self
            .shared
            .state
            .borrow()
            .local_displacement(&self.shared.bindings, speed);
        if local == Vec3::ZERO {
            return Vec3::ZERO;
        }
        local.z *= att.scene.handedness().z_sign();

        let world = att.camera.inverse_view_matrix().transform_vector3(local);
        att.camera.add_pending_motion(world);
        tracing::trace!(?local, ?world, "camera input motion");
        world
    }

    /// Frame-scaled rotation step for consumers that rotate continuously.
    ///
    /// Negated in right-handed scenes and again under a mirrored parent.
    pub fn local_rotation(&self) -> f32 {
        let Some(att) = &self.attachment else {
            return 0.0;
        };
        let elapsed_ms = att.scene.delta_time().as_secs_f32() * 1000.0;
        let mut rotation = ROTATION_SPEED * elapsed_ms / 1000.0;
        if att.scene.use_right_handed_system() {
            rotation = -rotation;
        }
        if att.camera.parent_determinant().is_some_and(|d| d < 0.0) {
            rotation = -rotation;
        }
        rotation
    }
}

impl Drop for CameraInput {
    fn drop(&mut self) {
        self.detach();
    }
}
