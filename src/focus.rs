// Zoom-to-object camera focus with eased tweens

use glam::Vec3;

use crate::camera::{OrbitControls, PerspectiveCamera};
use crate::math::Aabb;

/// Framing distance as a multiple of the object's largest dimension.
pub const FOCUS_DISTANCE_FACTOR: f32 = 2.0;

/// Cubic ease-in-out over linear progress in 0..=1.
pub fn ease_in_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        let f = -2.0 * t + 2.0;
        1.0 - f * f * f / 2.0
    }
}

/// Where the camera sits and what it orbits around.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn capture(camera: &PerspectiveCamera, controls: &OrbitControls) -> Self {
        Self {
            position: camera.position,
            target: controls.target,
        }
    }

    fn apply(&self, camera: &mut PerspectiveCamera, controls: &mut OrbitControls) {
        camera.position = self.position;
        camera.target = self.target;
        controls.target = self.target;
    }
}

/// A running interpolation between two camera poses.
#[derive(Debug, Clone, Copy)]
pub struct CameraTween {
    from: CameraPose,
    to: CameraPose,
    elapsed: f32,
    duration: f32,
}

impl CameraTween {
    pub fn new(from: CameraPose, to: CameraPose, duration: f32) -> Self {
        Self {
            from,
            to,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.elapsed >= self.duration
    }

    /// Advances by `dt` seconds and returns the pose for this instant. The
    /// final step lands exactly on the destination.
    pub fn advance(&mut self, dt: f32) -> CameraPose {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        if self.is_finished() {
            return self.to;
        }
        let k = ease_in_out_cubic(self.elapsed / self.duration);
        CameraPose {
            position: self.from.position.lerp(self.to.position, k),
            target: self.from.target.lerp(self.to.target, k),
        }
    }
}

/// Drives zoom-on-select and the return to the startup pose.
#[derive(Debug, Clone)]
pub struct FocusController {
    home: CameraPose,
    tween: Option<CameraTween>,
    focused: bool,
    duration: f32,
}

impl FocusController {
    /// `home` is the pose restored by [`FocusController::release`].
    pub fn new(home: CameraPose, duration: f32) -> Self {
        Self {
            home,
            tween: None,
            focused: false,
            duration,
        }
    }

    #[cfg(test)]
    pub fn is_focused(&self) -> bool {
        self.focused
    }

    #[cfg(test)]
    pub fn is_animating(&self) -> bool {
        self.tween.is_some()
    }

    /// Pose that frames `bounds` from the camera's current side, on the line
    /// from the camera to the box centre.
    pub fn framing_pose(camera: &PerspectiveCamera, bounds: &Aabb) -> CameraPose {
        let center = bounds.center();
        let distance = bounds.max_dimension() * FOCUS_DISTANCE_FACTOR;
        let towards_camera = (camera.position - center)
            .try_normalize()
            .unwrap_or(Vec3::Z);
        CameraPose {
            position: center + towards_camera * distance,
            target: center,
        }
    }

    /// Starts a tween framing `bounds`. Pan and zoom stay off while focused.
    pub fn focus_on(
        &mut self,
        bounds: &Aabb,
        camera: &PerspectiveCamera,
        controls: &mut OrbitControls,
    ) {
        if bounds.is_empty() {
            return;
        }
        let to = Self::framing_pose(camera, bounds);
        self.start(CameraPose::capture(camera, controls), to, controls);
        self.focused = true;
        controls.enable_pan = false;
        controls.enable_zoom = false;
        controls.enable_rotate = true;
        log::info!("Focusing camera on {:?}", to.target);
    }

    /// Tweens back to the home pose and restores full navigation. Does
    /// nothing unless a focus is active.
    pub fn release(&mut self, camera: &PerspectiveCamera, controls: &mut OrbitControls) {
        if !self.focused {
            return;
        }
        self.start(CameraPose::capture(camera, controls), self.home, controls);
        self.focused = false;
        controls.enable_all();
        log::info!("Camera focus released");
    }

    /// Starting a tween replaces whatever tween was running and drops orbit
    /// motion still coasting from earlier input.
    fn start(&mut self, from: CameraPose, to: CameraPose, controls: &mut OrbitControls) {
        controls.reset();
        self.tween = Some(CameraTween::new(from, to, self.duration));
    }

    /// Per-frame step. Returns true while a tween moved the camera.
    pub fn update(
        &mut self,
        dt: f32,
        camera: &mut PerspectiveCamera,
        controls: &mut OrbitControls,
    ) -> bool {
        let Some(tween) = self.tween.as_mut() else {
            return false;
        };
        tween.advance(dt).apply(camera, controls);
        if tween.is_finished() {
            self.tween = None;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn setup() -> (PerspectiveCamera, OrbitControls, FocusController) {
        let mut camera = PerspectiveCamera::new(75.0, 1.5, 0.1, 1000.0);
        camera.position = Vec3::new(5.0, 5.0, 7.0);
        let controls = OrbitControls::default();
        let focus = FocusController::new(CameraPose::capture(&camera, &controls), 0.8);
        (camera, controls, focus)
    }

    #[test]
    fn easing_endpoints() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_eq!(ease_in_out_cubic(2.0), 1.0);
        assert_relative_eq!(ease_in_out_cubic(0.5), 0.5);
        assert!(ease_in_out_cubic(0.25) < 0.25);
    }

    #[test]
    fn tween_lands_exactly_on_destination() {
        let from = CameraPose {
            position: Vec3::new(0.1, 0.2, 0.3),
            target: Vec3::ZERO,
        };
        let to = CameraPose {
            position: Vec3::new(5.0, 5.0, 7.0),
            target: Vec3::new(1.0, 0.0, 0.0),
        };
        let mut tween = CameraTween::new(from, to, 0.8);
        let mid = tween.advance(0.4);
        assert_ne!(mid, to);
        for _ in 0..10 {
            tween.advance(1.0 / 60.0);
        }
        assert_eq!(tween.advance(1.0), to);
        assert!(tween.is_finished());
    }

    #[test]
    fn focus_frames_object_and_escape_restores_home() {
        let (mut camera, mut controls, mut focus) = setup();
        let bounds = Aabb {
            min: Vec3::new(-2.5, 1.0, 7.5),
            max: Vec3::new(2.5, 3.0, 8.5),
        };
        let direction = (bounds.center() - camera.position).normalize();

        focus.focus_on(&bounds, &camera, &mut controls);
        assert!(!controls.enable_pan && !controls.enable_zoom && controls.enable_rotate);
        while focus.update(1.0 / 60.0, &mut camera, &mut controls) {}

        let offset = bounds.center() - camera.position;
        assert_relative_eq!(offset.length(), 10.0, epsilon = 1e-4);
        let along = offset.normalize();
        assert_relative_eq!(along.dot(direction), 1.0, epsilon = 1e-5);
        assert_eq!(controls.target, bounds.center());

        focus.release(&camera, &mut controls);
        while focus.update(1.0 / 60.0, &mut camera, &mut controls) {}
        assert_eq!(camera.position, Vec3::new(5.0, 5.0, 7.0));
        assert_eq!(controls.target, Vec3::ZERO);
        assert!(controls.enable_pan && controls.enable_zoom && controls.enable_rotate);
        assert!(!focus.is_focused());
    }

    #[test]
    fn new_focus_supersedes_running_tween() {
        let (mut camera, mut controls, mut focus) = setup();
        let first = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        let second = Aabb {
            min: Vec3::new(4.0, 0.0, -1.0),
            max: Vec3::new(6.0, 2.0, 1.0),
        };
        focus.focus_on(&first, &camera, &mut controls);
        focus.update(0.1, &mut camera, &mut controls);
        focus.focus_on(&second, &camera, &mut controls);
        while focus.update(1.0 / 30.0, &mut camera, &mut controls) {}
        assert_eq!(controls.target, second.center());
    }

    #[test]
    fn release_without_focus_keeps_camera() {
        let (mut camera, mut controls, mut focus) = setup();
        camera.position = Vec3::new(1.0, 2.0, 3.0);
        focus.release(&camera, &mut controls);
        assert!(!focus.update(1.0 / 60.0, &mut camera, &mut controls));
        assert_eq!(camera.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn empty_bounds_do_not_focus() {
        let (camera, mut controls, mut focus) = setup();
        focus.focus_on(&Aabb::EMPTY, &camera, &mut controls);
        assert!(!focus.is_animating());
        assert!(controls.enable_pan);
    }

    #[test]
    fn release_drops_coasting_orbit_motion() {
        let (mut camera, mut controls, mut focus) = setup();
        let bounds = Aabb {
            min: Vec3::splat(-1.0),
            max: Vec3::splat(1.0),
        };
        focus.focus_on(&bounds, &camera, &mut controls);
        while focus.update(1.0 / 60.0, &mut camera, &mut controls) {}

        controls.rotate_by_pixels(glam::Vec2::new(100.0, 0.0));
        assert!(controls.update(&mut camera));
        focus.release(&camera, &mut controls);
        while focus.update(1.0 / 60.0, &mut camera, &mut controls) {}

        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, Vec3::new(5.0, 5.0, 7.0));
    }
}
