pub mod loader;
pub mod metadata;
pub mod object3d;
pub mod scene;
pub mod scene_model;
pub mod transform;

pub use loader::{LoadedScene, SceneLoadError, SceneLoader};
pub use metadata::{ClassificationMode, Classifier, Layer, LayerSets, LodLevel};
pub use object3d::{Object3D, ObjectId};
pub use scene::Scene;
