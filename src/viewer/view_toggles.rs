use glam::Vec3;

use crate::scene_graph::ObjectId;
use crate::viewer::ViewerState;

#[derive(Debug, Clone, Default)]
pub struct ViewToggles {
    pub wireframe: bool,
    pub clipping: bool,
    /// Offsets applied by the last explode, undone exactly on collapse.
    explode_offsets: Option<Vec<(ObjectId, Vec3)>>,
}

impl ViewToggles {
    pub fn exploded(&self) -> bool {
        self.explode_offsets.is_some()
    }
}

impl ViewerState {
    pub fn toggle_wireframe(&mut self) {
        self.view.wireframe = !self.view.wireframe;

        for &id in &self.nodes {
            if let Some(object) = self.scene.get_object_mut(id) {
                object.material.wireframe = self.view.wireframe;
            }
        }
    }

    pub fn toggle_clipping(&mut self) {
        self.view.clipping = !self.view.clipping;
        let plane = self.view.clipping.then_some(self.config.clipping_plane);

        for &id in &self.nodes {
            if let Some(object) = self.scene.get_object_mut(id) {
                object.material.clipping_plane = plane;
            }
        }
    }

    /// Pushes every node outward along its position vector, or pulls it back.
    pub fn toggle_explode(&mut self) {
        match self.view.explode_offsets.take() {
            Some(offsets) => {
                for (id, offset) in offsets {
                    self.scene.translate_object(id, -offset);
                }
            }
            None => {
                let offsets = self
                    .nodes
                    .iter()
                    .map(|&id| (id, self.explode_direction(id) * self.config.explode_step))
                    .collect::<Vec<_>>();

                for &(id, offset) in &offsets {
                    self.scene.translate_object(id, offset);
                }

                self.view.explode_offsets = Some(offsets);
            }
        }

        self.scene.update_transforms();
        log::debug!("Exploded: {}", self.view.exploded());
    }

    /// Nodes placed at the origin with baked geometry move along their geometry's center instead.
    fn explode_direction(&self, id: ObjectId) -> Vec3 {
        let Some(object) = self.scene.get_object(id) else {
            return Vec3::ZERO;
        };

        let direction = object.transform.translation().normalize_or_zero();
        if direction != Vec3::ZERO {
            return direction;
        }

        self.scene
            .object_model(id)
            .map(|model| model.bounds.center().normalize_or_zero())
            .unwrap_or(Vec3::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ViewerConfig;
    use crate::viewer::tests::{building_state, node_named, placed_quads};
    use crate::viewer::Command;
    use assert_approx_eq::assert_approx_eq;

    fn translations(state: &ViewerState) -> Vec<Vec3> {
        state
            .nodes
            .iter()
            .map(|&id| state.scene.get_object(id).unwrap().transform.translation())
            .collect()
    }

    #[test]
    fn explode_round_trip_restores_positions() {
        let state = building_state(ViewerConfig::default());
        let before = translations(&state);

        let state = state.dispatch(&Command::ToggleExplode);
        assert!(state.view.exploded());
        assert_ne!(translations(&state), before);

        let state = state.dispatch(&Command::ToggleExplode);
        assert!(!state.view.exploded());
        for (after, before) in translations(&state).iter().zip(&before) {
            assert_approx_eq!(after.distance(*before), 0.0, 1e-5);
        }
    }

    #[test]
    fn explode_moves_each_node_by_the_step() {
        let config = ViewerConfig {
            explode_step: 3.0,
            ..Default::default()
        };
        let state = building_state(config);
        let before = translations(&state);

        let state = state.dispatch(&Command::ToggleExplode);
        for (after, before) in translations(&state).iter().zip(&before) {
            assert_approx_eq!(after.distance(*before), 3.0, 1e-4);
        }
    }

    fn world_origin(state: &ViewerState, name: &str) -> Vec3 {
        let object = state.scene.get_object(node_named(state, name)).unwrap();
        object.transform.world_matrix().transform_point3(Vec3::ZERO)
    }

    fn assert_near(actual: Vec3, expected: Vec3) {
        assert_approx_eq!(actual.distance(expected), 0.0, 1e-4);
    }

    #[test]
    fn explode_pushes_along_the_node_translation() {
        let config = ViewerConfig {
            explode_step: 2.0,
            ..Default::default()
        };
        let state = placed_quads(config).dispatch(&Command::ToggleExplode);

        // (3, 0, 4) has length 5, so the unit direction is (0.6, 0, 0.8).
        assert_near(world_origin(&state, "Offset"), Vec3::new(4.2, 0.0, 5.6));
        assert_near(world_origin(&state, "Near"), Vec3::new(0.0, 0.0, 4.0));
        assert_near(world_origin(&state, "Far"), Vec3::new(0.0, 0.0, -5.0));

        let far_bounds = state.scene.world_bounds(node_named(&state, "Far")).unwrap();
        assert_near(far_bounds.center(), Vec3::new(0.0, 0.0, -5.0));
        assert_near(far_bounds.size(), Vec3::new(4.0, 4.0, 0.0));
    }

    #[test]
    fn exploded_child_moves_with_its_parent() {
        let state = placed_quads(ViewerConfig::default()).dispatch(&Command::ToggleExplode);

        // Parent goes from y = 3 to y = 5; the child adds its own push along local z.
        assert_near(world_origin(&state, "Parent"), Vec3::new(0.0, 5.0, 0.0));
        assert_near(world_origin(&state, "Child"), Vec3::new(0.0, 5.0, 3.0));

        let child = state.scene.get_object(node_named(&state, "Child")).unwrap();
        assert_near(child.transform.translation(), Vec3::new(0.0, 0.0, 3.0));
    }

    #[test]
    fn placed_nodes_return_after_collapse() {
        let state = placed_quads(ViewerConfig::default());
        let names = ["Near", "Far", "Parent", "Child", "Offset"];
        let before: Vec<Vec3> = names.iter().map(|name| world_origin(&state, name)).collect();

        let state = state
            .dispatch(&Command::ToggleExplode)
            .dispatch(&Command::ToggleExplode);

        assert!(!state.view.exploded());
        for (name, before) in names.iter().zip(before) {
            assert_near(world_origin(&state, name), before);
        }
        assert_near(world_origin(&state, "Child"), Vec3::new(0.0, 3.0, 1.0));
    }

    #[test]
    fn collapse_keeps_moves_made_while_exploded() {
        let mut state = building_state(ViewerConfig::default()).dispatch(&Command::ToggleExplode);
        let moved = state.nodes[0];
        let original = translations(&building_state(ViewerConfig::default()))[0];

        state.scene.translate_object(moved, Vec3::new(0.0, 0.0, 5.0));
        let state = state.dispatch(&Command::ToggleExplode);

        let translation = state.scene.get_object(moved).unwrap().transform.translation();
        assert_approx_eq!(translation.distance(original + Vec3::new(0.0, 0.0, 5.0)), 0.0, 1e-5);
    }

    #[test]
    fn exploded_world_bounds_are_updated() {
        let state = building_state(ViewerConfig::default());
        let id = state.nodes[0];
        let before = state.scene.world_bounds(id).unwrap();

        let state = state.dispatch(&Command::ToggleExplode);
        let after = state.scene.world_bounds(id).unwrap();

        assert_approx_eq!(after.center().distance(before.center()), 2.0, 1e-4);
    }

    #[test]
    fn wireframe_and_clipping_sweep_every_node() {
        let state = building_state(ViewerConfig::default())
            .dispatch(&Command::ToggleWireframe)
            .dispatch(&Command::ToggleClipping);
        let plane = state.config.clipping_plane;

        for &id in &state.nodes {
            let material = &state.scene.get_object(id).unwrap().material;
            assert!(material.wireframe);
            assert_eq!(material.clipping_plane, Some(plane));
        }

        let state = state
            .dispatch(&Command::ToggleWireframe)
            .dispatch(&Command::ToggleClipping);

        for &id in &state.nodes {
            let material = &state.scene.get_object(id).unwrap().material;
            assert!(!material.wireframe);
            assert_eq!(material.clipping_plane, None);
        }
    }

    #[test]
    fn toggles_also_reach_hidden_nodes() {
        let state = building_state(ViewerConfig::default())
            .dispatch(&Command::ShowLod(crate::scene_graph::LodLevel::Lod0))
            .dispatch(&Command::ToggleWireframe);

        for &id in state.layers().lod(crate::scene_graph::LodLevel::Lod1) {
            let object = state.scene.get_object(id).unwrap();
            assert!(!object.visible);
            assert!(object.material.wireframe);
        }
    }
}
