use glam::{Mat4, Vec3};

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AABB {
    pub min: Vec3,
    pub max: Vec3,
}

impl AABB {
    /// Inverted box that any point extends.
    pub const EMPTY: AABB = AABB {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(point1: Vec3, point2: Vec3) -> AABB {
        let min = point1.min(point2);
        let max = point1.max(point2);
        AABB { min, max }
    }

    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> AABB {
        points
            .into_iter()
            .fold(AABB::EMPTY, |aabb, point| aabb.extend(point))
    }

    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    pub fn extend(self, point: Vec3) -> AABB {
        AABB {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    pub fn union(self, other: AABB) -> AABB {
        if other.is_empty() {
            return self;
        }

        self.extend(other.min).extend(other.max)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn corners(&self) -> [Vec3; 8] {
        [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ]
    }

    /// Axis-aligned box enclosing this box after `transform`.
    pub fn transform(&self, transform: &Mat4) -> AABB {
        if self.is_empty() {
            return *self;
        }

        AABB::from_points(
            self.corners()
                .map(|corner| transform.transform_point3(corner)),
        )
    }
}

/// Line-list indices over [`AABB::corners`], two per edge.
pub const AABB_EDGE_INDICES: [u32; 24] = [
    0, 1, 2, 3, 4, 5, 6, 7, // along x
    0, 2, 1, 3, 4, 6, 5, 7, // along y
    0, 4, 1, 5, 2, 6, 3, 7, // along z
];

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn from_points_encloses_all() {
        let aabb = AABB::from_points([
            Vec3::new(1.0, -2.0, 0.5),
            Vec3::new(-3.0, 4.0, 0.0),
            Vec3::new(0.0, 0.0, 2.0),
        ]);

        assert_eq!(aabb.min, Vec3::new(-3.0, -2.0, 0.0));
        assert_eq!(aabb.max, Vec3::new(1.0, 4.0, 2.0));
        assert_eq!(aabb.size(), Vec3::new(4.0, 6.0, 2.0));
    }

    #[test]
    fn empty_box_is_identity_for_union() {
        let aabb = AABB::new(Vec3::ZERO, Vec3::ONE);

        assert!(AABB::EMPTY.is_empty());
        assert_eq!(aabb.union(AABB::EMPTY), aabb);
        assert_eq!(AABB::EMPTY.union(aabb), aabb);
    }

    #[test]
    fn transform_rotated_box_grows() {
        let aabb = AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let rotation = Mat4::from_quat(Quat::from_rotation_y(std::f32::consts::FRAC_PI_4));
        let rotated = aabb.transform(&rotation);

        assert!(rotated.max.x > 1.4 && rotated.max.x < 1.42);
        assert_eq!(rotated.max.y, 1.0);
    }

    #[test]
    fn edge_indices_connect_corners_differing_in_one_axis() {
        let aabb = AABB::new(Vec3::ZERO, Vec3::ONE);
        let corners = aabb.corners();

        for edge in AABB_EDGE_INDICES.chunks(2) {
            let delta = corners[edge[1] as usize] - corners[edge[0] as usize];
            assert_eq!(delta.abs().element_sum(), 1.0);
        }
    }
}
