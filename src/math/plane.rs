use glam::{Vec3, Vec4};

/// Plane in Hessian normal form: `dot(normal, p) + distance = 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Plane {
    pub normal: Vec3,
    pub distance: f32,
}

impl Plane {
    /// Plane through `point` facing along `normal`.
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Horizontal plane that keeps everything at or below `height`.
    pub fn keep_below(height: f32) -> Self {
        Self::from_point_normal(Vec3::new(0.0, height, 0.0), Vec3::NEG_Y)
    }

    /// Packed form uploaded to shaders.
    pub fn to_vec4(self) -> Vec4 {
        self.normal.extend(self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    // Same test the shaders run: a point is clipped when this goes negative.
    fn side(plane: Plane, point: Vec3) -> f32 {
        plane.to_vec4().dot(point.extend(1.0))
    }

    #[test]
    fn keep_below_matches_point_normal_form() {
        assert_eq!(
            Plane::keep_below(8.0),
            Plane::from_point_normal(Vec3::new(0.0, 8.0, 0.0), Vec3::NEG_Y)
        );
        assert!(side(Plane::keep_below(-1.0), Vec3::ZERO) < 0.0);
    }

    #[test]
    fn point_normal_plane_keeps_points_below() {
        let plane = Plane::from_point_normal(Vec3::new(0.0, 8.0, 0.0), Vec3::NEG_Y);

        assert!(side(plane, Vec3::new(3.0, 2.0, -1.0)) > 0.0);
        assert!(side(plane, Vec3::new(0.0, 9.0, 0.0)) < 0.0);
        assert_approx_eq!(side(plane, Vec3::new(5.0, 8.0, 5.0)), 0.0);
    }

    #[test]
    fn packs_normal_and_distance() {
        let plane = Plane::from_point_normal(Vec3::new(3.0, 4.0, 0.0), Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(plane.to_vec4(), Vec4::new(0.0, 1.0, 0.0, -4.0));
    }
}
