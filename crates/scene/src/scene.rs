use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use glam::{Mat4, Vec3};
use pinpoint_common::{EntityId, Handedness, Transform, Viewport};

use crate::camera::{Camera, CameraKind, FlyCamera};
use crate::entities::EntityTable;
use crate::keyboard::KeyboardEvent;
use crate::signal::Observable;

/// Passed to before-render listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    pub frame: u64,
    pub elapsed: Duration,
}

/// Window and document level notifications owned by the host.
#[derive(Debug, Default)]
pub struct HostWindow {
    pub on_blur: Observable<()>,
    pub on_pointer_up: Observable<()>,
    pub on_resize: Observable<Viewport>,
}

impl HostWindow {
    pub fn blur(&self) {
        self.on_blur.notify(&());
    }

    pub fn pointer_up(&self) {
        self.on_pointer_up.notify(&());
    }

    pub fn listener_count(&self) -> usize {
        self.on_blur.observer_count()
            + self.on_pointer_up.observer_count()
            + self.on_resize.observer_count()
    }
}

/// Scene context: cameras, entities, viewport, frame timing and notifications.
///
/// A frame is driven as `begin_frame` → input polling → `render`. `render`
/// integrates the active camera first (firing view-matrix listeners), then
/// notifies before-render listeners, so per-frame consumers always see the
/// camera transform of the frame being drawn.
#[derive(Debug)]
pub struct Scene {
    handedness: Handedness,
    viewport: Cell<Viewport>,
    cameras: RefCell<Vec<Rc<Camera>>>,
    active_camera: RefCell<Option<Rc<Camera>>>,
    entities: RefCell<EntityTable>,
    frame: Cell<u64>,
    elapsed: Cell<Duration>,
    window: HostWindow,
    pub on_keyboard: Observable<KeyboardEvent>,
    pub on_canvas_blur: Observable<()>,
    pub on_before_render: Observable<FrameInfo>,
    /// Fired with the new active camera whenever it changes, including to none.
    pub on_active_camera_changed: Observable<Option<Rc<Camera>>>,
}

impl Scene {
    pub fn new(handedness: Handedness, viewport: Viewport) -> Self {
        Self {
            handedness,
            viewport: Cell::new(viewport),
            cameras: RefCell::new(Vec::new()),
            active_camera: RefCell::new(None),
            entities: RefCell::new(EntityTable::new()),
            frame: Cell::new(0),
            elapsed: Cell::new(Duration::ZERO),
            window: HostWindow::default(),
            on_keyboard: Observable::new(),
            on_canvas_blur: Observable::new(),
            on_before_render: Observable::new(),
            on_active_camera_changed: Observable::new(),
        }
    }

    pub fn handedness(&self) -> Handedness {
        self.handedness
    }

    pub fn use_right_handed_system(&self) -> bool {
        self.handedness.is_right_handed()
    }

    pub fn window(&self) -> &HostWindow {
        &self.window
    }

    // --- Cameras ---

    /// Add a camera. The first camera added becomes the active one.
    pub fn add_camera(&self, kind: CameraKind, rig: FlyCamera) -> Rc<Camera> {
        let camera = Rc::new(Camera::new(kind, self.handedness, rig));
        self.cameras.borrow_mut().push(Rc::clone(&camera));
        if self.active_camera.borrow().is_none() {
            self.set_active_camera(Some(Rc::clone(&camera)));
        }
        camera
    }

    pub fn active_camera(&self) -> Option<Rc<Camera>> {
        self.active_camera.borrow().clone()
    }

    /// Switch the active camera. Listeners run only when the camera actually changes.
    pub fn set_active_camera(&self, camera: Option<Rc<Camera>>) {
        let same = match (&*self.active_camera.borrow(), &camera) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        };
        if same {
            return;
        }
        *self.active_camera.borrow_mut() = camera.clone();
        tracing::debug!(has_camera = camera.is_some(), "active camera changed");
        self.on_active_camera_changed.notify(&camera);
    }

    pub fn remove_camera(&self, camera: &Rc<Camera>) {
        self.cameras.borrow_mut().retain(|c| !Rc::ptr_eq(c, camera));
        let was_active = self
            .active_camera
            .borrow()
            .as_ref()
            .is_some_and(|c| Rc::ptr_eq(c, camera));
        if was_active {
            self.set_active_camera(None);
        }
    }

    /// Projection × view of the active camera at the current viewport aspect.
    pub fn transform_matrix(&self) -> Option<Mat4> {
        let camera = self.active_camera()?;
        let aspect = self.viewport.get().aspect();
        Some(camera.projection_matrix(aspect) * camera.view_matrix())
    }

    // --- Viewport ---

    pub fn viewport(&self) -> Viewport {
        self.viewport.get()
    }

    /// Change the render size and tell resize listeners.
    pub fn resize(&self, viewport: Viewport) {
        tracing::debug!(width = viewport.width, height = viewport.height, "viewport resized");
        self.viewport.set(viewport);
        self.window.on_resize.notify(&viewport);
    }

    // --- Entities ---

    pub fn spawn_entity(&self, transform: Transform) -> EntityId {
        self.entities.borrow_mut().spawn(transform)
    }

    pub fn despawn_entity(&self, id: EntityId) -> bool {
        self.entities.borrow_mut().despawn(id).is_some()
    }

    pub fn entity_position(&self, id: EntityId) -> Option<Vec3> {
        self.entities.borrow().position(id)
    }

    pub fn set_entity_position(&self, id: EntityId, position: Vec3) -> bool {
        self.entities.borrow_mut().set_position(id, position)
    }

    pub fn entity_count(&self) -> usize {
        self.entities.borrow().len()
    }

    // --- Frame loop ---

    pub fn frame(&self) -> u64 {
        self.frame.get()
    }

    /// Time elapsed since the previous frame.
    pub fn delta_time(&self) -> Duration {
        self.elapsed.get()
    }

    pub fn begin_frame(&self, elapsed: Duration) {
        self.frame.set(self.frame.get() + 1);
        self.elapsed.set(elapsed);
    }

    pub fn render(&self) {
        let frame = self.frame.get();
        let _span = tracing::trace_span!("scene_render", frame).entered();
        if let Some(camera) = self.active_camera() {
            camera.update();
        }
        self.on_before_render.notify(&FrameInfo {
            frame,
            elapsed: self.elapsed.get(),
        });
    }

    // --- Device events ---

    /// Deliver a key event. Returns true when a listener consumed it.
    pub fn dispatch_key(&self, event: &KeyboardEvent) -> bool {
        self.on_keyboard.notify(event);
        event.default_prevented()
    }

    pub fn blur_canvas(&self) {
        self.on_canvas_blur.notify(&());
    }

    /// Every listener registered on the scene, its window and its cameras.
    pub fn listener_count(&self) -> usize {
        let cameras: usize = self
            .cameras
            .borrow()
            .iter()
            .map(|c| c.on_view_matrix_changed().observer_count())
            .sum();
        self.on_keyboard.observer_count()
            + self.on_canvas_blur.observer_count()
            + self.on_before_render.observer_count()
            + self.on_active_camera_changed.observer_count()
            + self.window.listener_count()
            + cameras
    }
}
