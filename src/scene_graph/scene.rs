use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use crate::material::LightingMaterial;
use crate::math::bounds::AABB;
use crate::model::{Buffers, Model};
use crate::scene_graph::loader::SceneLoadError;
use crate::scene_graph::metadata::{Classifier, NodeMetadata};
use crate::scene_graph::object3d::{Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};
use crate::scene_graph::transform::Transform;

/// How spawned glTF nodes are dressed.
#[derive(Debug, Clone)]
pub struct SpawnOptions {
    pub classifier: Classifier,
    pub material: LightingMaterial,
}

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Geometry drawn by `object_id`, if it is drawable.
    pub fn object_model(&self, object_id: ObjectId) -> Option<&Model> {
        let model_id = self.objects.get(object_id)?.model_id?;
        self.models.get(model_id).map(|scene_model| &scene_model.model)
    }

    /// Spawns every root node of `scene` and returns the drawable nodes in load order.
    pub fn spawn_gltf_scene(
        &mut self,
        buffers: Buffers,
        scene: &gltf::Scene,
        options: &SpawnOptions,
    ) -> Result<Vec<ObjectId>, SceneLoadError> {
        let mut drawables = Vec::new();

        for node in scene.nodes() {
            self.spawn_gltf_node(buffers, &node, None, options, &mut drawables)?;
        }

        Ok(drawables)
    }

    fn spawn_gltf_node(
        &mut self,
        buffers: Buffers,
        node: &gltf::Node,
        parent: Option<ObjectId>,
        options: &SpawnOptions,
        drawables: &mut Vec<ObjectId>,
    ) -> Result<ObjectId, SceneLoadError> {
        let node_name = node
            .name()
            .map(String::from)
            .unwrap_or_else(|| format!("Node {}", node.index()));
        let (translation, rotation, scale) = node.transform().decomposed();

        let metadata = NodeMetadata::from_extras(&node_name, node.extras());
        let membership = options.classifier.classify(&node_name, &metadata);

        let mut object = Object3D {
            name: node_name.clone(),
            transform: Transform::from_trs(
                translation.into(),
                Quat::from_array(rotation),
                scale.into(),
            ),
            material: options.material.clone(),
            metadata,
            membership,
            ..Default::default()
        };

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => model_id,
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    let model = Model::from_gltf(mesh_name, mesh, buffers).map_err(|source| {
                        SceneLoadError::Mesh {
                            node: node_name.clone(),
                            source,
                        }
                    })?;
                    let model_id = self.add_model(SceneModel::new(model));
                    self.gltf_mesh_to_model.insert(mesh_index, model_id);

                    model_id
                }
            };

            object.model_id = Some(model_id);
        }

        let is_drawable = object.is_drawable();
        let object_id = self.add_object(object);

        if is_drawable {
            drawables.push(object_id);
        }

        if let Some(parent_id) = parent {
            self.set_object_parent(object_id, Some(parent_id));
        }

        for child in node.children() {
            self.spawn_gltf_node(buffers, &child, Some(object_id), options, drawables)?;
        }

        Ok(object_id)
    }

    /// Updates all object transforms in hierarchical order
    pub fn update_transforms(&self) {
        let root_objects = self
            .objects
            .iter()
            .filter(|(_, object)| object.parent_id.is_none())
            .map(|(id, _)| id);

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let world_matrix = parent_world_matrix * object.transform.local_matrix();
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = object.transform.world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    /// Invalidates world transforms for an object and all its descendants
    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(old_parent_id) = self.objects.get(child_id).and_then(|child| child.parent_id) {
            if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                old_parent.child_ids.retain(|&id| id != child_id);
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;
        }

        if let Some(new_parent) = new_parent_id.and_then(|id| self.objects.get_mut(id)) {
            new_parent.child_ids.push(child_id);
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn translate_object(&mut self, object_id: ObjectId, delta: Vec3) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.translate(delta);
        }
        self.invalidate_object_hierarchy(object_id);
    }

    /// World-space bounds of a drawable. Valid after [`Scene::update_transforms`].
    pub fn world_bounds(&self, object_id: ObjectId) -> Option<AABB> {
        let world_matrix = self.objects.get(object_id)?.transform.world_matrix();
        let model = self.object_model(object_id)?;
        Some(model.bounds.transform(&world_matrix))
    }

    pub fn bounds_of(&self, object_ids: &[ObjectId]) -> AABB {
        object_ids
            .iter()
            .filter_map(|&id| self.world_bounds(id))
            .fold(AABB::EMPTY, AABB::union)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}
