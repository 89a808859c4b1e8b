use std::path::PathBuf;

use glam::{Vec3, Vec4};

use crate::math::plane::Plane;
use crate::scene_graph::metadata::ClassificationMode;

/// What a successful pick does to the picked node.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum PickMode {
    /// Recolor the picked node with the highlight color.
    Highlight,
    /// Outline the picked node's bounding box and report its extents.
    #[default]
    Outline,
}

#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub asset_path: PathBuf,
    pub light_position: Vec3,
    pub base_color: Vec4,
    pub highlight_color: Vec4,
    pub outline_color: Vec4,
    pub explode_step: f32,
    pub clipping_plane: Plane,
    pub pick_mode: PickMode,
    pub classification: ClassificationMode,
    pub pick_hidden_nodes: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            asset_path: PathBuf::from("assets/models/building.glb"),
            light_position: Vec3::new(30.0, 40.0, 30.0),
            base_color: Vec4::new(0.75, 0.75, 0.8, 1.0),
            highlight_color: Vec4::new(1.0, 0.55, 0.1, 1.0),
            outline_color: Vec4::new(1.0, 1.0, 0.0, 1.0),
            explode_step: 2.0,
            clipping_plane: Plane::keep_below(8.0),
            pick_mode: PickMode::default(),
            classification: ClassificationMode::default(),
            pick_hidden_nodes: true,
        }
    }
}

fn parse_components(value: &str) -> Result<Vec<f32>, String> {
    value
        .split(',')
        .map(|component| {
            component
                .trim()
                .parse::<f32>()
                .map_err(|e| format!("`{}` is not a number: {}", component.trim(), e))
        })
        .collect()
}

/// Parses `x,y,z`.
pub fn parse_vec3(value: &str) -> Result<Vec3, String> {
    match parse_components(value)?.as_slice() {
        &[x, y, z] => Ok(Vec3::new(x, y, z)),
        other => Err(format!("expected 3 components, got {}", other.len())),
    }
}

/// Parses `r,g,b` or `r,g,b,a` with components in 0..=1. Alpha defaults to 1.
pub fn parse_color(value: &str) -> Result<Vec4, String> {
    let color = match parse_components(value)?.as_slice() {
        &[r, g, b] => Vec4::new(r, g, b, 1.0),
        &[r, g, b, a] => Vec4::new(r, g, b, a),
        other => return Err(format!("expected 3 or 4 components, got {}", other.len())),
    };

    if color.cmplt(Vec4::ZERO).any() || color.cmpgt(Vec4::ONE).any() {
        return Err(format!("color components must lie in 0..=1, got {}", value));
    }

    Ok(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_parse_with_spaces() {
        assert_eq!(parse_vec3("30, 40,30"), Ok(Vec3::new(30.0, 40.0, 30.0)));
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec3("1,x,3").is_err());
    }

    #[test]
    fn colors_default_to_opaque() {
        assert_eq!(parse_color("1,0.5,0"), Ok(Vec4::new(1.0, 0.5, 0.0, 1.0)));
        assert_eq!(parse_color("0,0,0,0.5"), Ok(Vec4::new(0.0, 0.0, 0.0, 0.5)));
        assert!(parse_color("2,0,0").is_err());
        assert!(parse_color("1,1").is_err());
    }
}
