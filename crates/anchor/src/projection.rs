use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use pinpoint_common::{ScreenPosition, Viewport};
use pinpoint_scene::Scene;

/// True when `point` lies more than 90° away from the camera's forward axis.
///
/// A point sitting exactly on the camera has no direction and counts as behind.
pub fn is_behind_camera(point: Vec3, camera_position: Vec3, camera_forward: Vec3) -> bool {
    let to_point = (point - camera_position).normalize_or_zero();
    if to_point == Vec3::ZERO {
        return true;
    }
    let dot = to_point
        .dot(camera_forward.normalize_or_zero())
        .clamp(-1.0, 1.0);
    dot.acos() > FRAC_PI_2
}

/// Map a world point through `view_projection` into viewport pixels.
///
/// NDC x in [-1, 1] maps to [0, width]; NDC y is flipped because screen space
/// grows downward.
pub fn project_to_screen(point: Vec3, view_projection: Mat4, viewport: Viewport) -> ScreenPosition {
    let ndc = view_projection.project_point3(point);
    ScreenPosition::new(
        (ndc.x * 0.5 + 0.5) * viewport.width,
        (-ndc.y * 0.5 + 0.5) * viewport.height,
    )
}

/// Screen position of `point` for the scene's active camera.
pub fn world_to_screen(scene: &Scene, point: Vec3) -> ScreenPosition {
    let Some(camera) = scene.active_camera() else {
        return ScreenPosition::OFF_SCREEN;
    };
    if is_behind_camera(point, camera.position(), camera.forward()) {
        return ScreenPosition::OFF_SCREEN;
    }
    let Some(view_projection) = scene.transform_matrix() else {
        return ScreenPosition::OFF_SCREEN;
    };
    let position = project_to_screen(point, view_projection, scene.viewport());
    if position.x.is_finite() && position.y.is_finite() {
        position
    } else {
        ScreenPosition::OFF_SCREEN
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinpoint_common::Handedness;
    use pinpoint_scene::{CameraKind, FlyCamera};
    use std::f32::consts::PI;

    fn close(a: ScreenPosition, b: ScreenPosition) -> bool {
        (a.x - b.x).abs() < 1e-2 && (a.y - b.y).abs() < 1e-2
    }

    fn scene(handedness: Handedness) -> Scene {
        let scene = Scene::new(handedness, Viewport::new(800.0, 600.0));
        scene.add_camera(CameraKind::Free, FlyCamera::default());
        scene
    }

    #[test]
    fn behind_test_uses_angle_from_forward() {
        let fwd = Vec3::Z;
        assert!(!is_behind_camera(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, fwd));
        assert!(is_behind_camera(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, fwd));
        assert!(!is_behind_camera(Vec3::new(5.0, 0.0, 0.1), Vec3::ZERO, fwd));
        assert!(is_behind_camera(Vec3::new(5.0, 0.0, -0.1), Vec3::ZERO, fwd));
    }

    #[test]
    fn behind_test_is_relative_to_camera_position() {
        let cam = Vec3::new(0.0, 0.0, 20.0);
        assert!(is_behind_camera(Vec3::new(0.0, 0.0, 10.0), cam, Vec3::Z));
        assert!(!is_behind_camera(Vec3::new(0.0, 0.0, 30.0), cam, Vec3::Z));
    }

    #[test]
    fn point_on_camera_counts_as_behind() {
        assert!(is_behind_camera(Vec3::ONE, Vec3::ONE, Vec3::Z));
    }

    #[test]
    fn identity_projection_maps_ndc_corners() {
        let vp = Viewport::new(800.0, 600.0);
        assert!(close(
            project_to_screen(Vec3::ZERO, Mat4::IDENTITY, vp),
            ScreenPosition::new(400.0, 300.0)
        ));
        assert!(close(
            project_to_screen(Vec3::new(1.0, 1.0, 0.0), Mat4::IDENTITY, vp),
            ScreenPosition::new(800.0, 0.0)
        ));
        assert!(close(
            project_to_screen(Vec3::new(-1.0, -1.0, 0.0), Mat4::IDENTITY, vp),
            ScreenPosition::new(0.0, 600.0)
        ));
    }

    #[test]
    fn point_on_forward_axis_lands_at_center() {
        for handedness in [Handedness::Left, Handedness::Right] {
            let s = scene(handedness);
            let p = world_to_screen(&s, Vec3::new(0.0, 0.0, 10.0));
            assert!(close(p, ScreenPosition::new(400.0, 300.0)), "{p:?}");
        }
    }

    #[test]
    fn turned_around_camera_yields_sentinel() {
        let s = scene(Handedness::Right);
        s.active_camera().unwrap().rotate_yaw(PI);
        assert_eq!(
            world_to_screen(&s, Vec3::new(0.0, 0.0, 10.0)),
            ScreenPosition::OFF_SCREEN
        );
    }

    #[test]
    fn screen_axes_follow_convention() {
        let s = scene(Handedness::Left);
        let right = world_to_screen(&s, Vec3::new(2.0, 0.0, 10.0));
        let up = world_to_screen(&s, Vec3::new(0.0, 2.0, 10.0));
        assert!(right.x > 400.0);
        assert!(up.y < 300.0);
    }

    #[test]
    fn uses_scene_transform_matrix() {
        let s = scene(Handedness::Right);
        let point = Vec3::new(1.0, -2.0, 10.0);
        let expected = project_to_screen(point, s.transform_matrix().unwrap(), s.viewport());
        assert_eq!(world_to_screen(&s, point), expected);

        s.resize(Viewport::new(400.0, 800.0));
        let expected = project_to_screen(point, s.transform_matrix().unwrap(), s.viewport());
        assert_eq!(world_to_screen(&s, point), expected);
    }

    #[test]
    fn no_camera_means_off_screen() {
        let s = Scene::new(Handedness::Left, Viewport::default());
        assert_eq!(world_to_screen(&s, Vec3::Z), ScreenPosition::OFF_SCREEN);
    }

    #[test]
    fn point_beside_camera_stays_finite() {
        let s = scene(Handedness::Left);
        // Roughly 90° off the forward axis: w is ~0, must not leak inf/NaN.
        let p = world_to_screen(&s, Vec3::new(5.0, 0.0, 0.0));
        assert!(p.x.is_finite() && p.y.is_finite());
    }
}
