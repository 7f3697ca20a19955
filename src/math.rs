// Math utilities for the room scene

use glam::{Mat4, Quat, Vec3};

/// Represents a 3D transformation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    /// Create a new transform
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Create an identity transform
    pub fn identity() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }

    /// Translation plus a rotation around the vertical axis.
    pub fn from_position_yaw(position: Vec3, yaw: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_rotation_y(yaw),
            scale: Vec3::ONE,
        }
    }

    /// Generate transformation matrix
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    #[cfg(test)]
    /// Rotation around the world Y axis, in radians.
    pub fn yaw(&self) -> f32 {
        let (yaw, _, _) = self.rotation.to_euler(glam::EulerRot::YXZ);
        yaw
    }

    /// Applies an extra rotation around the vertical axis on top of the current one.
    pub fn rotate_yaw(&mut self, angle: f32) {
        self.rotation = (Quat::from_rotation_y(angle) * self.rotation).normalize();
    }

    pub fn set_uniform_scale(&mut self, scale: f32) {
        self.scale = Vec3::splat(scale);
    }
}

/// A ray in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// The direction is normalized on construction.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any point expands.
    pub const EMPTY: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Center of the bounding box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        if self.is_empty() {
            Vec3::ZERO
        } else {
            self.max - self.min
        }
    }

    /// Largest of the three box dimensions.
    pub fn max_dimension(&self) -> f32 {
        self.size().max_element()
    }
}

/// Möller-Trumbore ray-triangle intersection. Front faces wind
/// counter-clockwise; back faces only count when `double_sided` is set.
/// Returns the distance along the ray if hit.
pub fn ray_triangle(ray: &Ray, v0: Vec3, v1: Vec3, v2: Vec3, double_sided: bool) -> Option<f32> {
    const EPSILON: f32 = 1e-7;

    let edge1 = v1 - v0;
    let edge2 = v2 - v0;
    let h = ray.direction.cross(edge2);
    let a = edge1.dot(h);

    // Parallel to the triangle, or looking at its back
    if a.abs() < EPSILON || (!double_sided && a < 0.0) {
        return None;
    }

    let f = 1.0 / a;
    let s = ray.origin - v0;
    let u = f * s.dot(h);
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = s.cross(edge1);
    let v = f * ray.direction.dot(q);
    if v < 0.0 || u + v > 1.0 {
        return None;
    }

    let t = f * edge2.dot(q);
    (t > EPSILON).then_some(t)
}

/// Converts a 0xRRGGBB colour into normalized RGB.
pub fn color_from_hex(hex: u32) -> Vec3 {
    Vec3::new(
        ((hex >> 16) & 0xFF) as f32 / 255.0,
        ((hex >> 8) & 0xFF) as f32 / 255.0,
        (hex & 0xFF) as f32 / 255.0,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn yaw_roundtrips_through_rotation() {
        let mut transform = Transform::from_position_yaw(Vec3::ZERO, 0.3);
        assert_relative_eq!(transform.yaw(), 0.3, epsilon = 1e-5);
        transform.rotate_yaw(PI / 12.0);
        assert_relative_eq!(transform.yaw(), 0.3 + PI / 12.0, epsilon = 1e-5);
    }

    #[test]
    fn back_faces_only_hit_when_double_sided() {
        // Counter-clockwise seen from above, so the front faces +Y.
        let (v0, v1, v2) = (
            Vec3::new(-1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, -1.0),
        );
        let down = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let up = Ray::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y);
        assert_relative_eq!(ray_triangle(&down, v0, v1, v2, false).unwrap(), 5.0);
        assert!(ray_triangle(&up, v0, v1, v2, false).is_none());
        assert_relative_eq!(ray_triangle(&up, v0, v1, v2, true).unwrap(), 2.0);

        let miss = Ray::new(Vec3::new(3.0, 5.0, 0.0), Vec3::NEG_Y);
        assert!(ray_triangle(&miss, v0, v1, v2, true).is_none());
    }

    #[test]
    fn triangle_behind_ray_is_ignored() {
        let ray = Ray::new(Vec3::new(0.0, 1.0, 0.0), Vec3::Y);
        let hit = ray_triangle(
            &ray,
            Vec3::new(-1.0, 0.0, -1.0),
            Vec3::new(1.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            true,
        );
        assert!(hit.is_none());
    }

    #[test]
    fn empty_box_has_zero_size() {
        assert!(Aabb::EMPTY.is_empty());
        assert_eq!(Aabb::EMPTY.size(), Vec3::ZERO);

        let mut aabb = Aabb::EMPTY;
        aabb.expand_to(Vec3::new(1.0, -2.0, 0.5));
        aabb.expand_to(Vec3::new(-1.0, 3.0, 0.0));
        assert_eq!(aabb.size(), Vec3::new(2.0, 5.0, 0.5));
        assert_relative_eq!(aabb.max_dimension(), 5.0);
    }

    #[test]
    fn hex_colour_channels() {
        let c = color_from_hex(0x333333);
        assert_relative_eq!(c.x, 0.2, epsilon = 1e-6);
        assert_eq!(color_from_hex(0xffffff), Vec3::ONE);
    }
}
