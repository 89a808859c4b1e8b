use glam::{Vec3, Vec4};

use crate::math::plane::Plane;

/// Per-node parameters of the per-pixel lighting shader.
#[derive(Debug, Clone, PartialEq)]
pub struct LightingMaterial {
    pub base_color: Vec4,
    pub light_position: Vec3,
    pub highlight: Option<Vec4>,
    pub wireframe: bool,
    pub clipping_plane: Option<Plane>,
}

impl LightingMaterial {
    pub fn new(base_color: Vec4, light_position: Vec3) -> Self {
        Self {
            base_color,
            light_position,
            highlight: None,
            wireframe: false,
            clipping_plane: None,
        }
    }

    /// Color the shader receives: the highlight while selected, otherwise the base color.
    pub fn color(&self) -> Vec4 {
        self.highlight.unwrap_or(self.base_color)
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight.is_some()
    }
}

impl Default for LightingMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE, Vec3::new(0.0, 10.0, 0.0))
    }
}
