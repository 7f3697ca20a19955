// Camera, orbit controls and WASD fly movement

use glam::{Mat4, Vec2, Vec3};
use winit::keyboard::KeyCode;

use crate::math::Ray;

/// Perspective camera looking from `position` at `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl PerspectiveCamera {
    pub fn new(fov_y: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y,
            aspect,
            near,
            far,
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    /// Projection with the 0..1 depth range wgpu expects.
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect.max(1e-4), self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Unit vector the camera looks along.
    pub fn world_direction(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    /// Ray through a point in normalized device coordinates (-1..1, y up).
    pub fn ray_from_ndc(&self, ndc: Vec2) -> Ray {
        let inverse = self.view_projection().inverse();
        let near = inverse * ndc.extend(0.0).extend(1.0);
        let far = inverse * ndc.extend(1.0).extend(1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;
        Ray::new(near, far - near)
    }

    /// Ray through a pixel of a viewport whose origin is the top-left corner.
    pub fn ray_from_screen(&self, pointer: Vec2, viewport: Vec2) -> Ray {
        self.ray_from_ndc(pointer_to_ndc(pointer, viewport))
    }
}

/// Pixel coordinates to normalized device coordinates.
pub fn pointer_to_ndc(pointer: Vec2, viewport: Vec2) -> Vec2 {
    let viewport = viewport.max(Vec2::ONE);
    Vec2::new(
        (pointer.x / viewport.x) * 2.0 - 1.0,
        -(pointer.y / viewport.y) * 2.0 + 1.0,
    )
}

/// Rotation delta in spherical coordinates.
#[derive(Debug, Clone, Copy, Default)]
struct SphericalDelta {
    theta: f32,
    phi: f32,
}

/// Orbit controls allowing camera rotation around a target point.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    /// Target point to orbit around.
    pub target: Vec3,
    /// Master switch, off while an object is dragged or a menu is open.
    pub enabled: bool,
    pub enable_rotate: bool,
    pub enable_pan: bool,
    pub enable_zoom: bool,
    pub enable_damping: bool,
    /// Damping factor (0-1, lower = more damping).
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub rotate_speed: f32,
    pub pan_speed: f32,
    pub zoom_speed: f32,
    spherical_delta: SphericalDelta,
    pan_offset: Vec3,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enabled: true,
            enable_rotate: true,
            enable_pan: true,
            enable_zoom: true,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 0.1,
            max_distance: 1000.0,
            rotate_speed: 1.0,
            pan_speed: 1.0,
            zoom_speed: 1.0,
            spherical_delta: SphericalDelta::default(),
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn with_target(target: Vec3) -> Self {
        Self {
            target,
            ..Self::default()
        }
    }

    /// Turns every navigation mode back on.
    pub fn enable_all(&mut self) {
        self.enable_rotate = true;
        self.enable_pan = true;
        self.enable_zoom = true;
    }

    /// Drops any accumulated rotate, pan and zoom input.
    pub fn reset(&mut self) {
        self.spherical_delta = SphericalDelta::default();
        self.pan_offset = Vec3::ZERO;
        self.scale = 1.0;
    }

    /// Rotate the camera by delta angles (in radians).
    pub fn rotate(&mut self, delta_theta: f32, delta_phi: f32) {
        if self.enabled && self.enable_rotate {
            // Inverted for natural "grab and drag" feel
            self.spherical_delta.theta -= delta_theta * self.rotate_speed;
            self.spherical_delta.phi += delta_phi * self.rotate_speed;
        }
    }

    /// Rotate based on mouse movement (pixels).
    pub fn rotate_by_pixels(&mut self, delta: Vec2) {
        let rotate_scale = 0.005;
        self.rotate(delta.x * rotate_scale, delta.y * rotate_scale);
    }

    /// Pan the target in the camera plane, scaled by distance to the target.
    pub fn pan_by_pixels(&mut self, delta: Vec2, camera: &PerspectiveCamera) {
        if !self.enabled || !self.enable_pan {
            return;
        }
        let offset = camera.position - self.target;
        let target_distance = offset.length() * (camera.fov_y.to_radians() / 2.0).tan();
        let pan = delta * target_distance * self.pan_speed * 0.002;

        let forward = (self.target - camera.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        self.pan_offset += right * -pan.x + up * pan.y;
    }

    /// Positive values zoom in.
    pub fn zoom(&mut self, delta: f32) {
        if !self.enabled || !self.enable_zoom {
            return;
        }
        if delta > 0.0 {
            self.scale /= 1.0 + delta * self.zoom_speed * 0.1;
        } else {
            self.scale *= 1.0 - delta * self.zoom_speed * 0.1;
        }
    }

    fn has_pending_motion(&self) -> bool {
        const EPS: f32 = 1e-6;
        self.spherical_delta.theta.abs() > EPS
            || self.spherical_delta.phi.abs() > EPS
            || self.pan_offset.length_squared() > EPS * EPS
            || (self.scale - 1.0).abs() > EPS
    }

    /// Applies accumulated input to the camera. Returns false and leaves the
    /// camera untouched when there is nothing to apply.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        if !self.has_pending_motion() {
            self.reset();
            camera.target = self.target;
            return false;
        }

        let offset = camera.position - self.target;
        let radius = offset.length().max(1e-4);
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = (offset.y / radius).clamp(-1.0, 1.0).asin();

        let step = if self.enable_damping { self.damping_factor } else { 1.0 };
        theta += self.spherical_delta.theta * step;
        phi += self.spherical_delta.phi * step;
        phi = phi.clamp(
            -std::f32::consts::FRAC_PI_2 + 0.1,
            std::f32::consts::FRAC_PI_2 - 0.1,
        );

        let new_radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);
        self.scale = 1.0;

        self.target += self.pan_offset * step;

        if self.enable_damping {
            self.spherical_delta.theta *= 1.0 - self.damping_factor;
            self.spherical_delta.phi *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = SphericalDelta::default();
            self.pan_offset = Vec3::ZERO;
        }

        let new_offset = Vec3::new(
            new_radius * phi.cos() * theta.sin(),
            new_radius * phi.sin(),
            new_radius * phi.cos() * theta.cos(),
        );
        camera.position = self.target + new_offset;
        camera.target = self.target;
        true
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct KeyboardState {
    pub w: bool,
    pub a: bool,
    pub s: bool,
    pub d: bool,
}

impl KeyboardState {
    pub fn handle_key(&mut self, keycode: KeyCode, is_pressed: bool) {
        match keycode {
            KeyCode::KeyW => self.w = is_pressed,
            KeyCode::KeyA => self.a = is_pressed,
            KeyCode::KeyS => self.s = is_pressed,
            KeyCode::KeyD => self.d = is_pressed,
            _ => {}
        }
    }

    /// Ground-plane displacement for this frame: forward follows the camera
    /// direction flattened onto XZ.
    pub fn movement(&self, camera: &PerspectiveCamera, distance: f32) -> Vec3 {
        let mut forward = camera.world_direction();
        forward.y = 0.0;
        let forward = forward.normalize_or_zero();
        let right = forward.cross(camera.up).normalize_or_zero();

        let mut step = Vec3::ZERO;
        if self.w {
            step += forward * distance;
        }
        if self.s {
            step -= forward * distance;
        }
        if self.a {
            step -= right * distance;
        }
        if self.d {
            step += right * distance;
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn startup_camera() -> PerspectiveCamera {
        let mut camera = PerspectiveCamera::new(75.0, 16.0 / 9.0, 0.1, 1000.0);
        camera.position = Vec3::new(5.0, 5.0, 7.0);
        camera
    }

    #[test]
    fn center_ray_points_at_target() {
        let camera = startup_camera();
        let ray = camera.ray_from_screen(Vec2::new(400.0, 300.0), Vec2::new(800.0, 600.0));
        let expected = camera.world_direction();
        assert_relative_eq!(ray.direction.x, expected.x, epsilon = 1e-3);
        assert_relative_eq!(ray.direction.y, expected.y, epsilon = 1e-3);
        assert_relative_eq!(ray.direction.z, expected.z, epsilon = 1e-3);
    }

    #[test]
    fn pointer_to_ndc_corners() {
        let viewport = Vec2::new(200.0, 100.0);
        assert_eq!(pointer_to_ndc(Vec2::ZERO, viewport), Vec2::new(-1.0, 1.0));
        assert_eq!(pointer_to_ndc(viewport, viewport), Vec2::new(1.0, -1.0));
    }

    #[test]
    fn idle_update_leaves_pose_exact() {
        let mut camera = startup_camera();
        let before = camera;
        let mut controls = OrbitControls::default();
        assert!(!controls.update(&mut camera));
        assert_eq!(camera, before);
    }

    #[test]
    fn orbit_keeps_distance_to_target() {
        let mut camera = startup_camera();
        let mut controls = OrbitControls::default();
        controls.enable_damping = false;
        let distance = camera.position.length();
        controls.rotate_by_pixels(Vec2::new(120.0, 0.0));
        assert!(controls.update(&mut camera));
        assert_relative_eq!(camera.position.length(), distance, epsilon = 1e-4);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut camera = startup_camera();
        let mut controls = OrbitControls::default();
        controls.enabled = false;
        controls.rotate_by_pixels(Vec2::new(50.0, 50.0));
        controls.zoom(1.0);
        assert!(!controls.update(&mut camera));

        controls.enabled = true;
        controls.enable_zoom = false;
        controls.zoom(1.0);
        assert!(!controls.update(&mut camera));
    }

    #[test]
    fn reset_stops_coasting() {
        let mut camera = startup_camera();
        let start = camera.position;
        let mut controls = OrbitControls::default();
        controls.rotate_by_pixels(Vec2::new(100.0, 0.0));
        controls.pan_by_pixels(Vec2::new(10.0, 10.0), &camera);
        controls.zoom(1.0);
        assert!(controls.update(&mut camera));
        let moved = camera.position;
        assert_ne!(moved, start);

        controls.reset();
        assert!(!controls.update(&mut camera));
        assert_eq!(camera.position, moved);
    }

    #[test]
    fn wasd_moves_on_ground_plane() {
        let camera = startup_camera();
        let keys = KeyboardState {
            w: true,
            d: true,
            ..KeyboardState::default()
        };
        let step = keys.movement(&camera, 1.0);
        assert_eq!(step.y, 0.0);
        assert_relative_eq!(step.length(), 2.0_f32.sqrt(), epsilon = 1e-5);
    }
}
