use crate::scene_graph::{Layer, LodLevel, ObjectId, Scene};
use crate::viewer::ViewerState;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LayerFilter {
    StructuralOnly,
    SpatialOnly,
    Both,
}

impl LayerFilter {
    fn shows(self, layer: Layer) -> bool {
        match (self, layer) {
            (LayerFilter::Both, _) => true,
            (LayerFilter::StructuralOnly, Layer::Structural) => true,
            (LayerFilter::SpatialOnly, Layer::Spatial) => true,
            _ => false,
        }
    }
}

fn set_visible(scene: &mut Scene, ids: &[ObjectId], visible: bool) {
    for &id in ids {
        if let Some(object) = scene.get_object_mut(id) {
            object.visible = visible;
        }
    }
}

impl ViewerState {
    /// Nodes outside both layers keep their visibility.
    pub fn show_layers(&mut self, filter: LayerFilter) {
        for layer in [Layer::Structural, Layer::Spatial] {
            set_visible(&mut self.scene, self.layers.layer(layer), filter.shows(layer));
        }
    }

    /// Shows one LOD bucket and hides the other. Nodes in neither bucket keep their visibility.
    pub fn show_lod(&mut self, level: LodLevel) {
        set_visible(&mut self.scene, self.layers.lod(level), true);
        set_visible(&mut self.scene, self.layers.lod(level.other()), false);
    }

    pub fn visible_nodes(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.nodes.iter().copied().filter(|&id| {
            self.scene
                .get_object(id)
                .is_some_and(|object| object.visible)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::building_generator::tagged_boxes;
    use crate::config::ViewerConfig;
    use crate::scene_graph::metadata::ClassificationMode;
    use crate::viewer::tests::{building_state, node_named, state_from_glb};
    use crate::viewer::Command;
    use glam::Vec3;
    use serde_json::json;

    fn visible(state: &ViewerState, ids: &[ObjectId]) -> Vec<bool> {
        ids.iter()
            .map(|&id| state.scene.get_object(id).unwrap().visible)
            .collect()
    }

    fn is_visible(state: &ViewerState, name: &str) -> bool {
        state.scene.get_object(node_named(state, name)).unwrap().visible
    }

    /// Tagged slabs and zones next to a furniture node with a foreign tag and an untagged note.
    fn partially_tagged_state() -> ViewerState {
        let glb = tagged_boxes(&[
            ("Slab_L0", Vec3::ZERO, Some(json!({ "semantic": "structure", "lod": 0 }))),
            ("Slab_L1", Vec3::ZERO, Some(json!({ "semantic": "structure", "lod": 1 }))),
            ("Zone_L0", Vec3::Y, Some(json!({ "semantic": "spatial", "lod": 0 }))),
            ("Furniture", Vec3::X, Some(json!({ "semantic": "furniture" }))),
            ("Note", Vec3::NEG_X, None),
        ]);
        let config = ViewerConfig {
            classification: ClassificationMode::Metadata,
            ..Default::default()
        };

        state_from_glb(config, &glb)
    }

    #[test]
    fn structural_only_hides_spatial_layer() {
        let state = building_state(ViewerConfig::default())
            .dispatch(&Command::ShowLayers(LayerFilter::StructuralOnly));

        assert!(visible(&state, state.layers().layer(Layer::Structural)).iter().all(|&v| v));
        assert!(visible(&state, state.layers().layer(Layer::Spatial)).iter().all(|&v| !v));
    }

    #[test]
    fn both_restores_after_single_layer_views() {
        let state = building_state(ViewerConfig::default())
            .dispatch(&Command::ShowLayers(LayerFilter::StructuralOnly))
            .dispatch(&Command::ShowLayers(LayerFilter::SpatialOnly))
            .dispatch(&Command::ShowLayers(LayerFilter::Both));

        assert_eq!(state.visible_nodes().count(), state.nodes.len());
    }

    #[test]
    fn lod_switch_hides_the_other_bucket() {
        let state = building_state(ViewerConfig::default()).dispatch(&Command::ShowLod(LodLevel::Lod1));

        assert!(visible(&state, state.layers().lod(LodLevel::Lod1)).iter().all(|&v| v));
        assert!(visible(&state, state.layers().lod(LodLevel::Lod0)).iter().all(|&v| !v));

        let state = state.dispatch(&Command::ShowLod(LodLevel::Lod0));
        assert!(visible(&state, state.layers().lod(LodLevel::Lod0)).iter().all(|&v| v));
        assert!(visible(&state, state.layers().lod(LodLevel::Lod1)).iter().all(|&v| !v));
    }

    #[test]
    fn lod_switch_leaves_untagged_nodes_alone() {
        let mut state = partially_tagged_state();
        let note = node_named(&state, "Note");
        let furniture = node_named(&state, "Furniture");

        assert_eq!(state.layers().lod(LodLevel::Lod0).len(), 2);
        assert_eq!(state.layers().lod(LodLevel::Lod1).len(), 1);
        for level in [LodLevel::Lod0, LodLevel::Lod1] {
            assert!(!state.layers().lod(level).contains(&note));
            assert!(!state.layers().lod(level).contains(&furniture));
        }

        state.scene.get_object_mut(note).unwrap().visible = false;

        let state = state.dispatch(&Command::ShowLod(LodLevel::Lod1));
        assert!(is_visible(&state, "Slab_L1"));
        assert!(!is_visible(&state, "Slab_L0"));
        assert!(!is_visible(&state, "Zone_L0"));

        let state = state.dispatch(&Command::ShowLod(LodLevel::Lod0));
        assert!(!is_visible(&state, "Slab_L1"));
        assert!(is_visible(&state, "Slab_L0"));
        assert!(is_visible(&state, "Furniture"));
        assert!(!is_visible(&state, "Note"));
    }

    #[test]
    fn layer_views_leave_unclassified_nodes_alone() {
        let state = partially_tagged_state();
        let furniture = state.scene.get_object(node_named(&state, "Furniture")).unwrap();
        assert_eq!(furniture.membership.layer, None);
        assert_eq!(state.layers().layer(Layer::Structural).len(), 2);
        assert_eq!(state.layers().layer(Layer::Spatial).len(), 1);

        let state = state.dispatch(&Command::ShowLayers(LayerFilter::StructuralOnly));
        assert!(is_visible(&state, "Slab_L0"));
        assert!(!is_visible(&state, "Zone_L0"));
        assert!(is_visible(&state, "Furniture"));
        assert!(is_visible(&state, "Note"));

        let state = state.dispatch(&Command::ShowLayers(LayerFilter::SpatialOnly));
        assert!(!is_visible(&state, "Slab_L0"));
        assert!(is_visible(&state, "Zone_L0"));
        assert!(is_visible(&state, "Furniture"));
        assert!(is_visible(&state, "Note"));
    }
}
