use id_arena::Id;

use crate::material::LightingMaterial;
use crate::scene_graph::metadata::{LayerMembership, NodeMetadata};
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
    pub visible: bool,
    pub material: LightingMaterial,
    pub metadata: NodeMetadata,
    pub membership: LayerMembership,
}

impl Object3D {
    pub fn is_drawable(&self) -> bool {
        self.model_id.is_some()
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::default(),
            model_id: None,
            parent_id: None,
            child_ids: Vec::new(),
            visible: true,
            material: LightingMaterial::default(),
            metadata: NodeMetadata::default(),
            membership: LayerMembership::default(),
        }
    }
}
