use glam::{Mat4, Vec2, Vec3};

use crate::math::bounds::AABB;

const EPSILON: f32 = 1e-7;

#[derive(Debug, Copy, Clone)]
pub struct Ray {
    pub origin: Vec3,
    /// Always normalized.
    pub direction: Vec3,
}

impl Ray {
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Unprojects a point in normalized device coordinates through the inverse view-projection.
    /// Depth runs from 0 (near) to 1 (far), as in wgpu.
    pub fn from_ndc(inverse_view_projection: &Mat4, ndc: Vec2) -> Self {
        let near = inverse_view_projection.project_point3(ndc.extend(0.0));
        let far = inverse_view_projection.project_point3(ndc.extend(1.0));
        Self::new(near, far - near)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray in the space described by `matrix`. The direction is renormalized, so distances
    /// along the returned ray are not comparable with the original when `matrix` scales.
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }

    /// Slab test. Returns entry and exit distances, entry clamped to zero when the origin is
    /// inside the box.
    pub fn intersect_aabb(&self, aabb: &AABB) -> Option<(f32, f32)> {
        let inv_dir = self.direction.recip();

        let t1 = (aabb.min - self.origin) * inv_dir;
        let t2 = (aabb.max - self.origin) * inv_dir;

        let t_enter = t1.min(t2).max_element();
        let t_exit = t1.max(t2).min_element();

        if t_enter <= t_exit && t_exit >= 0.0 {
            Some((t_enter.max(0.0), t_exit))
        } else {
            None
        }
    }

    /// Möller–Trumbore, both faces.
    pub fn intersect_triangle(&self, a: Vec3, b: Vec3, c: Vec3) -> Option<f32> {
        let edge1 = b - a;
        let edge2 = c - a;
        let p = self.direction.cross(edge2);
        let det = edge1.dot(p);

        if det.abs() < EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;
        let s = self.origin - a;
        let u = s.dot(p) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }

        let q = s.cross(edge1);
        let v = self.direction.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }

        let t = edge2.dot(q) * inv_det;
        (t > EPSILON).then_some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn hits_triangle_in_front() {
        let ray = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::NEG_Z);
        let t = ray
            .intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y)
            .expect("should hit");

        assert_approx_eq!(t, 5.0);
    }

    #[test]
    fn misses_triangle_behind_or_outside() {
        let behind = Ray::new(Vec3::new(0.25, 0.25, 5.0), Vec3::Z);
        let outside = Ray::new(Vec3::new(2.0, 2.0, 5.0), Vec3::NEG_Z);

        assert!(behind.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
        assert!(outside.intersect_triangle(Vec3::ZERO, Vec3::X, Vec3::Y).is_none());
    }

    #[test]
    fn slab_test_reports_entry_and_exit() {
        let aabb = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let (enter, exit) = ray.intersect_aabb(&aabb).expect("should hit");

        assert_approx_eq!(enter, 4.0);
        assert_approx_eq!(exit, 6.0);

        let miss = Ray::new(Vec3::new(3.0, 0.0, -5.0), Vec3::Z);
        assert!(miss.intersect_aabb(&aabb).is_none());
    }

    #[test]
    fn unprojects_screen_center_along_view_axis() {
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 10.0), Vec3::ZERO, Vec3::Y);
        let projection = Mat4::perspective_rh(45f32.to_radians(), 1.0, 0.1, 100.0);
        let inverse = (projection * view).inverse();

        let ray = Ray::from_ndc(&inverse, Vec2::ZERO);

        assert_approx_eq!(ray.direction.z, -1.0, 1e-4);
        assert_approx_eq!(ray.origin.x, 0.0, 1e-4);
        assert_approx_eq!(ray.origin.y, 0.0, 1e-4);
    }
}
