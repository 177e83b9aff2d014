use std::cell::{Cell, RefCell};

use glam::{Mat4, Vec3};
use pinpoint_common::Handedness;
use serde::{Deserialize, Serialize};

use crate::signal::Observable;

/// Pending motion below this length is dropped instead of decaying forever.
const MOTION_EPSILON: f32 = 1e-6;

const PITCH_LIMIT: f32 = 89.0 * std::f32::consts::PI / 180.0;

/// Fly camera pose and lens: position, yaw, pitch, and projection parameters.
///
/// Plain data. The shared, observable scene object is [`Camera`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlyCamera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Base movement speed in world units per second.
    pub speed: f32,
    /// Fraction of the pending motion carried into the next frame.
    pub inertia: f32,
    pub sensitivity: f32,
}

impl Default for FlyCamera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            yaw: 90.0_f32.to_radians(),
            pitch: 0.0,
            fov: 60.0_f32.to_radians(),
            near: 0.1,
            far: 1000.0,
            speed: 10.0,
            inertia: 0.0,
            sensitivity: 0.003,
        }
    }
}

impl FlyCamera {
    /// Camera at `position` oriented toward `target`.
    pub fn looking_at(position: Vec3, target: Vec3) -> Self {
        let mut cam = Self {
            position,
            ..Self::default()
        };
        cam.look_at(target);
        cam
    }

    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize()
    }

    pub fn look_at(&mut self, target: Vec3) {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return;
        }
        self.pitch = dir.y.clamp(-1.0, 1.0).asin().clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.yaw = dir.z.atan2(dir.x);
    }

    /// Mouse-look style rotation from pointer deltas.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch -= dy * self.sensitivity;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    pub fn view_matrix(&self, handedness: Handedness) -> Mat4 {
        let target = self.position + self.forward();
        match handedness {
            Handedness::Left => Mat4::look_at_lh(self.position, target, Vec3::Y),
            Handedness::Right => Mat4::look_at_rh(self.position, target, Vec3::Y),
        }
    }

    pub fn projection_matrix(&self, handedness: Handedness, aspect: f32) -> Mat4 {
        match handedness {
            Handedness::Left => Mat4::perspective_lh(self.fov, aspect, self.near, self.far),
            Handedness::Right => Mat4::perspective_rh(self.fov, aspect, self.near, self.far),
        }
    }
}

/// What kind of rig a camera is. Only free cameras accept first-person input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraKind {
    #[default]
    Free,
    Orbit,
}

/// A scene camera shared between the render loop, input and overlays.
///
/// Input never moves the camera directly: it accumulates into a pending
/// movement delta that [`Camera::update`] integrates once per frame.
/// View-matrix listeners fire from `update` only when the view actually changed.
#[derive(Debug)]
pub struct Camera {
    kind: CameraKind,
    handedness: Handedness,
    rig: RefCell<FlyCamera>,
    pending_motion: Cell<Vec3>,
    parent: Cell<Option<Mat4>>,
    last_view: Cell<Mat4>,
    view_changed: Observable<Mat4>,
}

impl Camera {
    pub fn new(kind: CameraKind, handedness: Handedness, rig: FlyCamera) -> Self {
        let view = rig.view_matrix(handedness);
        Self {
            kind,
            handedness,
            rig: RefCell::new(rig),
            pending_motion: Cell::new(Vec3::ZERO),
            parent: Cell::new(None),
            last_view: Cell::new(view),
            view_changed: Observable::new(),
        }
    }

    pub fn kind(&self) -> CameraKind {
        self.kind
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    /// Copy of the current pose and lens.
    pub fn rig(&self) -> FlyCamera {
        self.rig.borrow().clone()
    }

    pub fn position(&self) -> Vec3 {
        self.rig.borrow().position
    }

    pub fn set_position(&self, position: Vec3) {
        self.rig.borrow_mut().position = position;
    }

    pub fn forward(&self) -> Vec3 {
        self.rig.borrow().forward()
    }

    pub fn look_at(&self, target: Vec3) {
        self.rig.borrow_mut().look_at(target);
    }

    pub fn rotate_yaw(&self, angle: f32) {
        self.rig.borrow_mut().yaw += angle;
    }

    pub fn rotate(&self, dx: f32, dy: f32) {
        self.rig.borrow_mut().rotate(dx, dy);
    }

    pub fn speed(&self) -> f32 {
        self.rig.borrow().speed
    }

    pub fn set_speed(&self, speed: f32) {
        self.rig.borrow_mut().speed = speed;
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.rig.borrow().view_matrix(self.handedness)
    }

    /// Maps camera-local directions into world space.
    pub fn inverse_view_matrix(&self) -> Mat4 {
        self.view_matrix().inverse()
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        self.rig.borrow().projection_matrix(self.handedness, aspect)
    }

    /// World matrix of the node this camera hangs from, if any.
    pub fn set_parent(&self, parent: Option<Mat4>) {
        self.parent.set(parent);
    }

    pub fn parent_determinant(&self) -> Option<f32> {
        self.parent.get().map(|m| m.determinant())
    }

    /// Accumulate a world-space displacement to apply on the next update.
    pub fn add_pending_motion(&self, delta: Vec3) {
        self.pending_motion.set(self.pending_motion.get() + delta);
    }

    pub fn pending_motion(&self) -> Vec3 {
        self.pending_motion.get()
    }

    pub fn on_view_matrix_changed(&self) -> &Observable<Mat4> {
        &self.view_changed
    }

    /// Integrate pending motion and announce a changed view matrix.
    pub fn update(&self) {
        let pending = self.pending_motion.get();
        if pending != Vec3::ZERO {
            let inertia = {
                let mut rig = self.rig.borrow_mut();
                rig.position += pending;
                rig.inertia
            };
            let carried = pending * inertia;
            self.pending_motion.set(if carried.length() < MOTION_EPSILON {
                Vec3::ZERO
            } else {
                carried
            });
        }

        let view = self.view_matrix();
        if view != self.last_view.get() {
            self.last_view.set(view);
            tracing::trace!(position = ?self.position(), "camera view changed");
            self.view_changed.notify(&view);
        }
    }
}
