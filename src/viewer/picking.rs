use std::fmt;

use glam::{Mat4, Vec2};
use rayon::prelude::*;

use crate::config::PickMode;
use crate::math::{bounds::AABB, ray::Ray};
use crate::model::Model;
use crate::scene_graph::ObjectId;
use crate::viewer::{Viewport, ViewerState};

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub selected: Option<ObjectId>,
    /// Name and extents of the outlined node.
    pub readout: Option<SelectionInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionInfo {
    pub name: String,
    /// Semantic tag from the node's metadata, if it had one.
    pub semantic: Option<String>,
    pub bounds: AABB,
}

impl fmt::Display for SelectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let size = self.bounds.size();
        write!(f, "{}", self.name)?;
        if let Some(semantic) = &self.semantic {
            write!(f, " [{}]", semantic)?;
        }
        write!(
            f,
            ": {:.2} x {:.2} x {:.2} (min {:.2} {:.2} {:.2}, max {:.2} {:.2} {:.2})",
            size.x,
            size.y,
            size.z,
            self.bounds.min.x,
            self.bounds.min.y,
            self.bounds.min.z,
            self.bounds.max.x,
            self.bounds.max.y,
            self.bounds.max.z,
        )
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PickHit {
    pub object: ObjectId,
    /// World-space distance from the ray origin.
    pub distance: f32,
}

/// Physical pixel position to normalized device coordinates, y up.
pub fn pointer_to_ndc(pointer: Vec2, viewport: Viewport) -> Vec2 {
    Vec2::new(
        2.0 * pointer.x / viewport.width.max(1) as f32 - 1.0,
        1.0 - 2.0 * pointer.y / viewport.height.max(1) as f32,
    )
}

fn intersect_object(ray: &Ray, world_matrix: &Mat4, model: &Model) -> Option<f32> {
    let local_ray = ray.transform(&world_matrix.inverse());
    let t = model.intersect_ray(&local_ray)?;
    let world_hit = world_matrix.transform_point3(local_ray.at(t));
    Some((world_hit - ray.origin).length())
}

impl ViewerState {
    pub fn pick_ray(&self, pointer: Vec2) -> Ray {
        let view_projection = self
            .current_camera()
            .get_vp_matrix(self.viewport.aspect_ratio());
        Ray::from_ndc(
            &view_projection.inverse(),
            pointer_to_ndc(pointer, self.viewport),
        )
    }

    /// Nearest node along `ray`. Hidden nodes take part unless the config excludes them.
    pub fn raycast(&self, ray: &Ray) -> Option<PickHit> {
        self.scene.update_transforms();

        let candidates: Vec<(ObjectId, Mat4, &Model)> = self
            .nodes
            .iter()
            .filter_map(|&id| {
                let object = self.scene.get_object(id)?;
                if !object.visible && !self.config.pick_hidden_nodes {
                    return None;
                }
                let model = self.scene.object_model(id)?;
                Some((id, object.transform.world_matrix(), model))
            })
            .collect();

        candidates
            .par_iter()
            .filter_map(|(id, world_matrix, model)| {
                intersect_object(ray, world_matrix, model).map(|distance| PickHit {
                    object: *id,
                    distance,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Selects the nearest node under `pointer`. A miss leaves the selection untouched.
    pub fn pick(&mut self, pointer: Vec2) -> Option<ObjectId> {
        let ray = self.pick_ray(pointer);
        let hit = self.raycast(&ray)?;

        match self.config.pick_mode {
            PickMode::Highlight => self.select_highlight(hit.object),
            PickMode::Outline => self.select_outline(hit.object),
        }

        Some(hit.object)
    }

    fn select_highlight(&mut self, id: ObjectId) {
        if let Some(previous) = self.selection.selected.take() {
            if let Some(object) = self.scene.get_object_mut(previous) {
                object.material.highlight = None;
            }
        }

        if let Some(object) = self.scene.get_object_mut(id) {
            object.material.highlight = Some(self.config.highlight_color);
            log::debug!("Highlighted {}", object.name);
        }

        self.selection.selected = Some(id);
    }

    fn select_outline(&mut self, id: ObjectId) {
        let Some(object) = self.scene.get_object(id) else {
            return;
        };
        let bounds = self.scene.world_bounds(id).unwrap_or(AABB::EMPTY);

        let info = SelectionInfo {
            name: object.name.clone(),
            semantic: object.metadata.semantic.clone(),
            bounds,
        };
        log::debug!("Outlined {}", info);

        self.selection.selected = Some(id);
        self.selection.readout = Some(info);
    }

    /// World box of the outlined node, tracking the node if it has moved since it was picked.
    pub fn outline_bounds(&self) -> Option<AABB> {
        if self.config.pick_mode != PickMode::Outline {
            return None;
        }

        let selected = self.selection.selected?;
        self.scene.update_transforms();
        self.scene.world_bounds(selected)
    }
}
