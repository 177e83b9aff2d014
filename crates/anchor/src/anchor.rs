use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use glam::Vec3;
use pinpoint_common::{EntityId, ScreenPosition};
use pinpoint_scene::{Camera, Scene, SubscriptionHandle};
use serde::{Deserialize, Serialize};

use crate::projection::world_to_screen;
use crate::target::OverlayTarget;

/// What an anchor follows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSource {
    /// A fixed world point.
    Point(Vec3),
    /// An entity in the scene's table, resolved on every update.
    Entity(EntityId),
}

/// When an anchor recomputes its placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateTrigger {
    #[default]
    EveryFrame,
    OnCameraChangeOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnchorOptions {
    pub trigger: UpdateTrigger,
    pub centered: bool,
}

/// Errors from creating an anchor.
#[derive(Debug, thiserror::Error)]
pub enum AnchorError {
    #[error("scene has no active camera")]
    NoActiveCamera,
}

// View-changed subscription on the camera currently followed.
struct CameraLink {
    camera: Weak<Camera>,
    handle: SubscriptionHandle,
}

// Shared with listeners. Holds the scene weakly: the scene owns the listeners.
struct Tracker {
    scene: Weak<Scene>,
    source: Cell<AnchorSource>,
    target: Rc<dyn OverlayTarget>,
    trigger: Cell<UpdateTrigger>,
    camera_link: RefCell<Option<CameraLink>>,
    last: Cell<Option<ScreenPosition>>,
    refreshes: Cell<u64>,
}

impl Tracker {
    fn refresh(&self) {
        let position = match self.scene.upgrade() {
            Some(scene) => match self.source.get() {
                AnchorSource::Point(point) => world_to_screen(&scene, point),
                AnchorSource::Entity(id) => match scene.entity_position(id) {
                    Some(point) => world_to_screen(&scene, point),
                    None => {
                        tracing::trace!(?id, "anchored entity is gone, parking off-screen");
                        ScreenPosition::OFF_SCREEN
                    }
                },
            },
            None => ScreenPosition::OFF_SCREEN,
        };
        self.target.place(position);
        self.last.set(Some(position));
        self.refreshes.set(self.refreshes.get() + 1);
    }

    /// Listen to `camera`'s view changes in place of the previous camera's.
    fn follow_camera(self: &Rc<Self>, camera: Option<&Rc<Camera>>) {
        self.unfollow_camera();
        let Some(camera) = camera else {
            return;
        };
        let listener = Rc::clone(self);
        let handle = camera
            .on_view_matrix_changed()
            .subscribe(move |_| listener.refresh());
        *self.camera_link.borrow_mut() = Some(CameraLink {
            camera: Rc::downgrade(camera),
            handle,
        });
    }

    fn unfollow_camera(&self) {
        let Some(link) = self.camera_link.borrow_mut().take() else {
            return;
        };
        if let Some(camera) = link.camera.upgrade() {
            camera.on_view_matrix_changed().unsubscribe(link.handle);
        }
    }

    fn active_camera_changed(self: &Rc<Self>, camera: Option<&Rc<Camera>>) {
        if self.trigger.get() == UpdateTrigger::OnCameraChangeOnly {
            self.follow_camera(camera);
        }
        self.refresh();
    }
}

struct Subscriptions {
    resize: SubscriptionHandle,
    camera_switch: SubscriptionHandle,
    // Set only for `UpdateTrigger::EveryFrame`.
    frame: Option<SubscriptionHandle>,
}

/// Keeps an overlay element pinned to a world point or entity.
///
/// Listens to window resize and to active-camera switches, plus either every
/// rendered frame or the active camera's view-matrix changes.
/// [`ScreenAnchor::dispose`] (or dropping the anchor) removes those listeners
/// and unmounts the element.
pub struct ScreenAnchor {
    scene: Rc<Scene>,
    tracker: Rc<Tracker>,
    subscriptions: Option<Subscriptions>,
}

impl fmt::Debug for ScreenAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScreenAnchor")
            .field("source", &self.tracker.source.get())
            .field("trigger", &self.trigger())
            .field("position", &self.tracker.last.get())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl ScreenAnchor {
    /// Mount `target` and start tracking `source` against the active camera.
    pub fn create(
        scene: &Rc<Scene>,
        target: Rc<dyn OverlayTarget>,
        source: AnchorSource,
        options: AnchorOptions,
    ) -> Result<Self, AnchorError> {
        let camera = scene.active_camera().ok_or(AnchorError::NoActiveCamera)?;

        target.mount();
        if options.centered {
            target.set_centered(true);
        }

        let tracker = Rc::new(Tracker {
            scene: Rc::downgrade(scene),
            source: Cell::new(source),
            target,
            trigger: Cell::new(options.trigger),
            camera_link: RefCell::new(None),
            last: Cell::new(None),
            refreshes: Cell::new(0),
        });

        let resize = {
            let tracker = Rc::clone(&tracker);
            scene.window().on_resize.subscribe(move |_| tracker.refresh())
        };
        let camera_switch = {
            let tracker = Rc::clone(&tracker);
            scene
                .on_active_camera_changed
                .subscribe(move |camera| tracker.active_camera_changed(camera.as_ref()))
        };
        let frame = match options.trigger {
            UpdateTrigger::EveryFrame => Some(subscribe_frames(scene, &tracker)),
            UpdateTrigger::OnCameraChangeOnly => {
                tracker.follow_camera(Some(&camera));
                None
            }
        };
        tracker.refresh();

        tracing::debug!(?source, trigger = ?options.trigger, "screen anchor created");
        Ok(Self {
            scene: Rc::clone(scene),
            tracker,
            subscriptions: Some(Subscriptions {
                resize,
                camera_switch,
                frame,
            }),
        })
    }

    pub fn source(&self) -> AnchorSource {
        self.tracker.source.get()
    }

    pub fn trigger(&self) -> UpdateTrigger {
        self.tracker.trigger.get()
    }

    /// Last placement written to the target.
    pub fn position(&self) -> Option<ScreenPosition> {
        self.tracker.last.get()
    }

    /// Number of placements computed so far.
    pub fn refresh_count(&self) -> u64 {
        self.tracker.refreshes.get()
    }

    pub fn is_disposed(&self) -> bool {
        self.subscriptions.is_none()
    }

    /// Recompute placement now.
    pub fn refresh(&self) {
        if !self.is_disposed() {
            self.tracker.refresh();
        }
    }

    /// Track something else. Listeners stay as they are.
    pub fn set_source(&self, source: AnchorSource) {
        self.tracker.source.set(source);
        self.refresh();
    }

    /// Move what is tracked: replaces a fixed point, or moves the entity itself.
    pub fn set_world_position(&self, position: Vec3) {
        match self.tracker.source.get() {
            AnchorSource::Point(_) => self.tracker.source.set(AnchorSource::Point(position)),
            AnchorSource::Entity(id) => {
                if !self.scene.set_entity_position(id, position) {
                    tracing::debug!(?id, "cannot move a despawned entity");
                }
            }
        }
        self.refresh();
    }

    /// Swap the update cadence.
    ///
    /// OnCameraChangeOnly follows whichever camera is active, now and after
    /// later switches.
    pub fn set_update_trigger(&mut self, trigger: UpdateTrigger) {
        if trigger == self.tracker.trigger.get() {
            return;
        }
        self.tracker.trigger.set(trigger);
        let Some(subs) = self.subscriptions.as_mut() else {
            return;
        };
        match trigger {
            UpdateTrigger::EveryFrame => {
                self.tracker.unfollow_camera();
                subs.frame = Some(subscribe_frames(&self.scene, &self.tracker));
            }
            UpdateTrigger::OnCameraChangeOnly => {
                if let Some(handle) = subs.frame.take() {
                    self.scene.on_before_render.unsubscribe(handle);
                }
                self.tracker
                    .follow_camera(self.scene.active_camera().as_ref());
            }
        }
        tracing::debug!(?trigger, "screen anchor cadence changed");
    }

    /// Remove every listener and unmount the target. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        let Some(subs) = self.subscriptions.take() else {
            return;
        };
        self.scene.window().on_resize.unsubscribe(subs.resize);
        self.scene
            .on_active_camera_changed
            .unsubscribe(subs.camera_switch);
        if let Some(handle) = subs.frame {
            self.scene.on_before_render.unsubscribe(handle);
        }
        self.tracker.unfollow_camera();
        self.tracker.target.unmount();
        tracing::debug!(source = ?self.tracker.source.get(), "screen anchor disposed");
    }
}

impl Drop for ScreenAnchor {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn subscribe_frames(scene: &Scene, tracker: &Rc<Tracker>) -> SubscriptionHandle {
    let listener = Rc::clone(tracker);
    scene.on_before_render.subscribe(move |_| listener.refresh())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::OverlayElement;
    use pinpoint_common::{Handedness, Transform, Viewport};
    use pinpoint_scene::{CameraKind, FlyCamera};
    use std::f32::consts::PI;
    use std::time::Duration;

    fn close(a: ScreenPosition, b: ScreenPosition) -> bool {
        (a.x - b.x).abs() < 1e-2 && (a.y - b.y).abs() < 1e-2
    }

    fn scene() -> Rc<Scene> {
        let scene = Rc::new(Scene::new(Handedness::Right, Viewport::new(800.0, 600.0)));
        scene.add_camera(CameraKind::Free, FlyCamera::default());
        scene
    }

    fn frame(scene: &Scene) {
        scene.begin_frame(Duration::from_millis(16));
        scene.render();
    }

    fn anchor(
        scene: &Rc<Scene>,
        source: AnchorSource,
        options: AnchorOptions,
    ) -> (ScreenAnchor, Rc<OverlayElement>) {
        let el = Rc::new(OverlayElement::new("label"));
        let anchor = ScreenAnchor::create(scene, el.clone(), source, options).unwrap();
        (anchor, el)
    }

    #[test]
    fn create_without_camera_fails() {
        let scene = Rc::new(Scene::new(Handedness::Left, Viewport::default()));
        let el = Rc::new(OverlayElement::new("label"));
        let err = ScreenAnchor::create(
            &scene,
            el.clone(),
            AnchorSource::Point(Vec3::Z),
            AnchorOptions::default(),
        );
        assert!(matches!(err, Err(AnchorError::NoActiveCamera)));
        assert!(!el.is_mounted());
        assert_eq!(scene.listener_count(), 0);
    }

    #[test]
    fn center_scenario_then_turn_around() {
        let scene = scene();
        let (anchor, el) = anchor(
            &scene,
            AnchorSource::Point(Vec3::new(0.0, 0.0, 10.0)),
            AnchorOptions::default(),
        );
        assert!(el.is_mounted());
        assert!(close(anchor.position().unwrap(), ScreenPosition::new(400.0, 300.0)));

        scene.active_camera().unwrap().rotate_yaw(PI);
        frame(&scene);
        assert_eq!(el.position(), Some(ScreenPosition::OFF_SCREEN));
    }

    #[test]
    fn every_frame_recomputes_each_render() {
        let scene = scene();
        let (anchor, _el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 5.0), AnchorOptions::default());
        let start = anchor.refresh_count();
        frame(&scene);
        frame(&scene);
        assert_eq!(anchor.refresh_count(), start + 2);
    }

    #[test]
    fn camera_change_only_skips_idle_frames() {
        let scene = scene();
        let options = AnchorOptions {
            trigger: UpdateTrigger::OnCameraChangeOnly,
            centered: false,
        };
        let (anchor, el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 5.0), options);
        assert_eq!(el.placements(), 1);

        frame(&scene);
        frame(&scene);
        assert_eq!(el.placements(), 1);

        scene.active_camera().unwrap().add_pending_motion(Vec3::X);
        frame(&scene);
        assert_eq!(anchor.refresh_count(), 2);
    }

    #[test]
    fn switching_to_camera_change_only_stops_per_frame_updates() {
        let scene = scene();
        let (mut anchor, _el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z * 5.0), AnchorOptions::default());
        let listeners = scene.listener_count();

        anchor.set_update_trigger(UpdateTrigger::OnCameraChangeOnly);
        assert_eq!(scene.listener_count(), listeners);

        let after_toggle = anchor.refresh_count();
        frame(&scene);
        frame(&scene);
        assert_eq!(anchor.refresh_count(), after_toggle);

        scene.active_camera().unwrap().set_position(Vec3::new(0.0, 1.0, 0.0));
        frame(&scene);
        assert_eq!(anchor.refresh_count(), after_toggle + 1);
    }

    #[test]
    fn camera_change_only_follows_camera_switch() {
        let scene = scene();
        let first = scene.active_camera().unwrap();
        let second = scene.add_camera(CameraKind::Free, FlyCamera::default());
        let options = AnchorOptions {
            trigger: UpdateTrigger::OnCameraChangeOnly,
            centered: false,
        };
        let (_anchor, el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), options);
        assert!(el.is_visible());

        scene.set_active_camera(Some(Rc::clone(&second)));
        assert_eq!(first.on_view_matrix_changed().observer_count(), 0);
        assert_eq!(second.on_view_matrix_changed().observer_count(), 1);

        second.rotate_yaw(PI);
        frame(&scene);
        assert_eq!(el.position(), Some(ScreenPosition::OFF_SCREEN));
        assert_eq!(
            el.position(),
            Some(world_to_screen(&scene, Vec3::Z * 10.0))
        );

        first.set_position(Vec3::new(0.0, 5.0, 0.0));
        let placed = el.placements();
        first.update();
        assert_eq!(el.placements(), placed);
    }

    #[test]
    fn switching_camera_refreshes_immediately() {
        let scene = scene();
        let behind = FlyCamera::looking_at(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0));
        let other = scene.add_camera(CameraKind::Free, behind);
        let (_anchor, el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), AnchorOptions::default());
        assert!(el.is_visible());

        scene.set_active_camera(Some(other));
        assert_eq!(el.position(), Some(ScreenPosition::OFF_SCREEN));
    }

    #[test]
    fn losing_the_camera_parks_off_screen_and_keeps_listening() {
        let scene = scene();
        let options = AnchorOptions {
            trigger: UpdateTrigger::OnCameraChangeOnly,
            centered: false,
        };
        let (_anchor, el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), options);
        let camera = scene.active_camera().unwrap();

        scene.remove_camera(&camera);
        assert_eq!(el.position(), Some(ScreenPosition::OFF_SCREEN));
        assert_eq!(camera.on_view_matrix_changed().observer_count(), 0);

        let replacement = scene.add_camera(CameraKind::Free, FlyCamera::default());
        assert!(close(el.position().unwrap(), ScreenPosition::new(400.0, 300.0)));
        assert_eq!(replacement.on_view_matrix_changed().observer_count(), 1);
    }

    #[test]
    fn round_trip_camera_reproduces_position() {
        let scene = scene();
        let (anchor, _el) = anchor(
            &scene,
            AnchorSource::Point(Vec3::new(1.5, -0.5, 12.0)),
            AnchorOptions::default(),
        );
        let camera = scene.active_camera().unwrap();
        let placed = anchor.position().unwrap();
        let home = camera.position();

        camera.set_position(Vec3::new(3.0, 2.0, -1.0));
        frame(&scene);
        assert_ne!(anchor.position().unwrap(), placed);

        camera.set_position(home);
        frame(&scene);
        assert_eq!(anchor.position().unwrap(), placed);
    }

    #[test]
    fn resize_refreshes_with_new_viewport() {
        let scene = scene();
        let options = AnchorOptions {
            trigger: UpdateTrigger::OnCameraChangeOnly,
            centered: false,
        };
        let (anchor, _el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), options);
        scene.resize(Viewport::new(1024.0, 768.0));
        assert!(close(anchor.position().unwrap(), ScreenPosition::new(512.0, 384.0)));
    }

    #[test]
    fn entity_source_follows_entity() {
        let scene = scene();
        let id = scene.spawn_entity(Transform::from_position(Vec3::Z * 10.0));
        let (anchor, _el) = anchor(&scene, AnchorSource::Entity(id), AnchorOptions::default());
        let before = anchor.position().unwrap();

        scene.set_entity_position(id, Vec3::new(0.0, 3.0, 10.0));
        frame(&scene);
        let after = anchor.position().unwrap();
        assert!(after.y < before.y);
    }

    #[test]
    fn despawned_entity_parks_off_screen() {
        let scene = scene();
        let id = scene.spawn_entity(Transform::from_position(Vec3::Z * 10.0));
        let (anchor, el) = anchor(&scene, AnchorSource::Entity(id), AnchorOptions::default());
        assert!(el.is_visible());

        scene.despawn_entity(id);
        frame(&scene);
        assert_eq!(anchor.position(), Some(ScreenPosition::OFF_SCREEN));
        assert!(!el.is_visible());
    }

    #[test]
    fn set_source_keeps_listeners() {
        let scene = scene();
        let (anchor, _el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), AnchorOptions::default());
        let listeners = scene.listener_count();
        anchor.set_source(AnchorSource::Point(Vec3::new(0.0, 0.0, -10.0)));
        assert_eq!(scene.listener_count(), listeners);
        assert_eq!(anchor.position(), Some(ScreenPosition::OFF_SCREEN));
    }

    #[test]
    fn set_world_position_moves_point_or_entity() {
        let scene = scene();
        let (anchor, _el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z), AnchorOptions::default());
        anchor.set_world_position(Vec3::Z * 4.0);
        assert_eq!(anchor.source(), AnchorSource::Point(Vec3::Z * 4.0));

        let id = scene.spawn_entity(Transform::default());
        anchor.set_source(AnchorSource::Entity(id));
        anchor.set_world_position(Vec3::new(0.0, 0.0, 8.0));
        assert_eq!(scene.entity_position(id), Some(Vec3::new(0.0, 0.0, 8.0)));
        assert!(close(anchor.position().unwrap(), ScreenPosition::new(400.0, 300.0)));
    }

    #[test]
    fn centering_is_applied_once_at_creation() {
        let scene = scene();
        let options = AnchorOptions {
            trigger: UpdateTrigger::EveryFrame,
            centered: true,
        };
        let (_anchor, el) = anchor(&scene, AnchorSource::Point(Vec3::Z * 10.0), options);
        assert!(el.is_centered());
        assert!(el.style().contains("translate(-50%, -50%)"));
    }

    #[test]
    fn dispose_twice_leaves_no_listeners() {
        let scene = scene();
        let (mut anchor, el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z), AnchorOptions::default());
        assert_eq!(scene.listener_count(), 3);

        anchor.dispose();
        assert_eq!(scene.listener_count(), 0);
        assert!(!el.is_mounted());
        anchor.dispose();
        assert_eq!(scene.listener_count(), 0);

        let placed = el.placements();
        frame(&scene);
        anchor.refresh();
        assert_eq!(el.placements(), placed);
    }

    #[test]
    fn dispose_camera_change_anchor_releases_camera_listener() {
        let scene = scene();
        let options = AnchorOptions {
            trigger: UpdateTrigger::OnCameraChangeOnly,
            centered: false,
        };
        let (mut anchor, _el) = anchor(&scene, AnchorSource::Point(Vec3::Z), options);
        let camera = scene.active_camera().unwrap();
        assert_eq!(camera.on_view_matrix_changed().observer_count(), 1);
        anchor.dispose();
        assert_eq!(camera.on_view_matrix_changed().observer_count(), 0);
    }

    #[test]
    fn drop_disposes() {
        let scene = scene();
        let el = Rc::new(OverlayElement::new("label"));
        {
            let _anchor = ScreenAnchor::create(
                &scene,
                el.clone(),
                AnchorSource::Point(Vec3::Z),
                AnchorOptions::default(),
            )
            .unwrap();
            assert!(el.is_mounted());
        }
        assert!(!el.is_mounted());
        assert_eq!(scene.listener_count(), 0);
    }

    #[test]
    fn create_after_dispose_starts_clean() {
        let scene = scene();
        let (mut first, _el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z), AnchorOptions::default());
        first.dispose();
        let (_second, el) =
            anchor(&scene, AnchorSource::Point(Vec3::Z * 3.0), AnchorOptions::default());
        assert!(el.is_mounted());
        assert_eq!(scene.listener_count(), 3);
    }
}
