use std::path::Path;

use thiserror::Error;

use crate::material::LightingMaterial;
use crate::model::{Buffers, ModelError};
use crate::scene_graph::metadata::{Classifier, Layer, LayerSets, LodLevel};
use crate::scene_graph::object3d::ObjectId;
use crate::scene_graph::scene::{Scene, SpawnOptions};

#[derive(Debug, Error)]
pub enum SceneLoadError {
    #[error("failed to import {source_name}")]
    Import {
        source_name: String,
        #[source]
        source: gltf::Error,
    },
    #[error("{source_name} contains no scene")]
    NoScene { source_name: String },
    #[error("failed to build the mesh of node {node}")]
    Mesh {
        node: String,
        #[source]
        source: ModelError,
    },
}

/// A scene fresh from an asset, with its unfiltered drawable list and membership sets.
pub struct LoadedScene {
    pub scene: Scene,
    pub nodes: Vec<ObjectId>,
    pub layers: LayerSets,
}

impl LoadedScene {
    /// Loading succeeded but nothing can be drawn.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub struct SceneLoader {
    options: SpawnOptions,
}

impl SceneLoader {
    pub fn new(classifier: Classifier, material: LightingMaterial) -> Self {
        Self {
            options: SpawnOptions {
                classifier,
                material,
            },
        }
    }

    pub fn load_path(&self, path: &Path) -> Result<LoadedScene, SceneLoadError> {
        let source_name = path.display().to_string();
        log::info!("Loading {}", source_name);

        let (document, buffers, _images) =
            gltf::import(path).map_err(|source| SceneLoadError::Import {
                source_name: source_name.clone(),
                source,
            })?;

        self.load_document(&source_name, &document, &buffers)
    }

    /// Loads a glTF or GLB document held in memory. Only embedded buffers can be resolved.
    pub fn load_slice(&self, source_name: &str, bytes: &[u8]) -> Result<LoadedScene, SceneLoadError> {
        let (document, buffers, _images) =
            gltf::import_slice(bytes).map_err(|source| SceneLoadError::Import {
                source_name: source_name.to_string(),
                source,
            })?;

        self.load_document(source_name, &document, &buffers)
    }

    fn load_document(
        &self,
        source_name: &str,
        document: &gltf::Document,
        buffers: Buffers,
    ) -> Result<LoadedScene, SceneLoadError> {
        let gltf_scene = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .ok_or_else(|| SceneLoadError::NoScene {
                source_name: source_name.to_string(),
            })?;

        let mut scene = Scene::new();
        let nodes = scene.spawn_gltf_scene(buffers, &gltf_scene, &self.options)?;

        let mut layers = LayerSets::default();
        for &id in &nodes {
            if let Some(object) = scene.get_object(id) {
                layers.insert(id, object.membership);
            }
        }

        scene.update_transforms();

        let loaded = LoadedScene {
            scene,
            nodes,
            layers,
        };

        if loaded.is_empty() {
            log::warn!("{} loaded, but the scene is empty", source_name);
        } else {
            log::info!(
                "{}: {} nodes ({} structural, {} spatial, {} LOD 0, {} LOD 1)",
                source_name,
                loaded.nodes.len(),
                loaded.layers.layer(Layer::Structural).len(),
                loaded.layers.layer(Layer::Spatial).len(),
                loaded.layers.lod(LodLevel::Lod0).len(),
                loaded.layers.lod(LodLevel::Lod1).len(),
            );
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset_pipeline::building_generator::{
        generate_building, tagged_boxes, BuildingParameters,
    };
    use crate::scene_graph::metadata::ClassificationMode;
    use serde_json::json;

    fn find_by_name(loaded: &LoadedScene, name: &str) -> Option<ObjectId> {
        loaded
            .scene
            .objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    fn load(parameters: &BuildingParameters, mode: ClassificationMode) -> LoadedScene {
        let glb = generate_building(parameters).unwrap();
        SceneLoader::new(Classifier::new(mode), LightingMaterial::default())
            .load_slice("building.glb", &glb)
            .unwrap()
    }

    #[test]
    fn tagged_building_is_classified_from_metadata() {
        let loaded = load(&BuildingParameters::default(), ClassificationMode::Metadata);

        // Six parts per LOD.
        assert_eq!(loaded.nodes.len(), 12);
        assert_eq!(loaded.layers.layer(Layer::Structural).len(), 10);
        assert_eq!(loaded.layers.layer(Layer::Spatial).len(), 2);
        assert_eq!(loaded.layers.lod(LodLevel::Lod0).len(), 6);
        assert_eq!(loaded.layers.lod(LodLevel::Lod1).len(), 6);

        let columns = find_by_name(&loaded, "Columns_LOD1").unwrap();
        let columns = loaded.scene.get_object(columns).unwrap();
        assert_eq!(columns.membership.layer, Some(Layer::Structural));
        assert_eq!(columns.membership.lod, Some(LodLevel::Lod1));
    }

    #[test]
    fn untagged_building_falls_back_to_names() {
        let parameters = BuildingParameters {
            with_metadata: false,
            ..Default::default()
        };
        let loaded = load(&parameters, ClassificationMode::Auto);

        // Columns and Beams per LOD are structural, everything else defaults to spatial.
        assert_eq!(loaded.layers.layer(Layer::Structural).len(), 4);
        assert_eq!(loaded.layers.layer(Layer::Spatial).len(), 8);
        assert!(loaded.layers.lod(LodLevel::Lod0).is_empty());
        assert!(loaded.layers.lod(LodLevel::Lod1).is_empty());

        for &id in &loaded.nodes {
            let in_structural = loaded.layers.layer(Layer::Structural).contains(&id);
            let in_spatial = loaded.layers.layer(Layer::Spatial).contains(&id);
            assert!(in_structural ^ in_spatial);
        }
    }

    #[test]
    fn untagged_building_has_no_layers_in_metadata_mode() {
        let parameters = BuildingParameters {
            with_metadata: false,
            ..Default::default()
        };
        let loaded = load(&parameters, ClassificationMode::Metadata);

        assert_eq!(loaded.nodes.len(), 12);
        assert!(loaded.layers.layer(Layer::Structural).is_empty());
        assert!(loaded.layers.layer(Layer::Spatial).is_empty());
    }

    #[test]
    fn mistyped_lod_tag_keeps_layer_tag() {
        let glb = tagged_boxes(&[(
            "Slab_A",
            glam::Vec3::ZERO,
            Some(json!({ "semantic": "structure", "lod": "1" })),
        )]);
        let loaded = SceneLoader::new(
            Classifier::new(ClassificationMode::Metadata),
            LightingMaterial::default(),
        )
        .load_slice("slab.glb", &glb)
        .unwrap();

        let slab = loaded.nodes[0];
        let membership = loaded.scene.get_object(slab).unwrap().membership;
        assert_eq!(membership.layer, Some(Layer::Structural));
        assert_eq!(membership.lod, None);
        assert_eq!(loaded.layers.layer(Layer::Structural), &[slab]);
        assert!(loaded.layers.lod(LodLevel::Lod1).is_empty());
    }

    #[test]
    fn every_node_gets_the_lighting_material() {
        let material = LightingMaterial::new(glam::Vec4::new(0.2, 0.4, 0.6, 1.0), glam::Vec3::ONE);
        let glb = generate_building(&BuildingParameters::default()).unwrap();
        let loaded = SceneLoader::new(Classifier::default(), material.clone())
            .load_slice("building.glb", &glb)
            .unwrap();

        for &id in &loaded.nodes {
            assert_eq!(loaded.scene.get_object(id).unwrap().material, material);
        }
    }

    #[test]
    fn garbage_is_a_load_error_not_an_empty_scene() {
        let loader = SceneLoader::new(Classifier::default(), LightingMaterial::default());

        assert!(matches!(
            loader.load_slice("garbage", b"not a gltf file"),
            Err(SceneLoadError::Import { .. })
        ));
    }

    #[test]
    fn scene_without_meshes_loads_as_empty() {
        let json = br#"{"asset":{"version":"2.0"},"nodes":[{"name":"Empty"}],"scenes":[{"nodes":[0]}],"scene":0}"#;
        let loaded = SceneLoader::new(Classifier::default(), LightingMaterial::default())
            .load_slice("empty.gltf", json)
            .unwrap();

        assert!(loaded.is_empty());
        assert!(find_by_name(&loaded, "Empty").is_some());
    }

    #[test]
    fn document_without_scenes_is_an_error() {
        let json = br#"{"asset":{"version":"2.0"}}"#;
        let loader = SceneLoader::new(Classifier::default(), LightingMaterial::default());

        assert!(matches!(
            loader.load_slice("noscene.gltf", json),
            Err(SceneLoadError::NoScene { .. })
        ));
    }
}
