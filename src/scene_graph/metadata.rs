use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::scene_graph::object3d::ObjectId;

/// Names containing one of these are structural under the name heuristic.
const STRUCTURAL_NAME_MARKERS: [&str; 2] = ["column", "beam"];

/// Semantic fields read from a glTF node's `extras`. Each tag is read on its own, so a
/// mistyped `lod` does not cost the node its `semantic` tag.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NodeMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub semantic: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub lod: Option<f64>,
}

/// A field of the wrong type reads as absent.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match serde_json::from_value(value) {
        Ok(field) => Ok(field),
        Err(e) => {
            log::warn!("Ignoring mistyped node tag: {}", e);
            Ok(None)
        }
    }
}

impl NodeMetadata {
    pub fn from_extras(node_name: &str, extras: &gltf::json::Extras) -> Self {
        let Some(raw) = extras else {
            return Self::default();
        };

        match serde_json::from_str(raw.get()) {
            Ok(metadata) => metadata,
            Err(e) => {
                log::warn!("Ignoring unreadable extras on node {}: {}", node_name, e);
                Self::default()
            }
        }
    }

    fn layer(&self) -> Option<Layer> {
        match self.semantic.as_deref()? {
            "structure" | "structural" => Some(Layer::Structural),
            "spatial" => Some(Layer::Spatial),
            _ => None,
        }
    }

    fn lod_level(&self) -> Option<LodLevel> {
        match self.lod? {
            lod if lod == 0.0 => Some(LodLevel::Lod0),
            lod if lod == 1.0 => Some(LodLevel::Lod1),
            _ => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Layer {
    Structural,
    Spatial,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum LodLevel {
    Lod0,
    Lod1,
}

impl LodLevel {
    pub fn other(self) -> LodLevel {
        match self {
            LodLevel::Lod0 => LodLevel::Lod1,
            LodLevel::Lod1 => LodLevel::Lod0,
        }
    }
}

/// Decided once at load time, never changed afterwards.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct LayerMembership {
    pub layer: Option<Layer>,
    pub lod: Option<LodLevel>,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ClassificationMode {
    /// Metadata tag when present, name heuristic otherwise.
    #[default]
    Auto,
    /// Metadata tags only; untagged nodes join no layer.
    Metadata,
    /// Name heuristic only.
    Names,
}

#[derive(Debug, Copy, Clone, Default)]
pub struct Classifier {
    pub mode: ClassificationMode,
}

impl Classifier {
    pub fn new(mode: ClassificationMode) -> Self {
        Self { mode }
    }

    pub fn classify(&self, name: &str, metadata: &NodeMetadata) -> LayerMembership {
        let layer = match self.mode {
            ClassificationMode::Metadata => metadata.layer(),
            ClassificationMode::Names => Some(layer_from_name(name)),
            ClassificationMode::Auto => match metadata.semantic {
                Some(_) => metadata.layer(),
                None => Some(layer_from_name(name)),
            },
        };

        LayerMembership {
            layer,
            lod: metadata.lod_level(),
        }
    }
}

fn layer_from_name(name: &str) -> Layer {
    let name = name.to_lowercase();

    if STRUCTURAL_NAME_MARKERS
        .iter()
        .any(|marker| name.contains(marker))
    {
        Layer::Structural
    } else {
        Layer::Spatial
    }
}

/// Node ids grouped by membership, in load order. Filled once by the loader and read-only
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct LayerSets {
    structural: Vec<ObjectId>,
    spatial: Vec<ObjectId>,
    lod0: Vec<ObjectId>,
    lod1: Vec<ObjectId>,
}

impl LayerSets {
    pub(crate) fn insert(&mut self, id: ObjectId, membership: LayerMembership) {
        match membership.layer {
            Some(Layer::Structural) => self.structural.push(id),
            Some(Layer::Spatial) => self.spatial.push(id),
            None => {}
        }

        match membership.lod {
            Some(LodLevel::Lod0) => self.lod0.push(id),
            Some(LodLevel::Lod1) => self.lod1.push(id),
            None => {}
        }
    }

    pub fn layer(&self, layer: Layer) -> &[ObjectId] {
        match layer {
            Layer::Structural => &self.structural,
            Layer::Spatial => &self.spatial,
        }
    }

    pub fn lod(&self, level: LodLevel) -> &[ObjectId] {
        match level {
            LodLevel::Lod0 => &self.lod0,
            LodLevel::Lod1 => &self.lod1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(semantic: Option<&str>, lod: Option<f64>) -> NodeMetadata {
        NodeMetadata {
            semantic: semantic.map(String::from),
            lod,
        }
    }

    #[test]
    fn name_heuristic_is_total_and_exclusive() {
        let classifier = Classifier::new(ClassificationMode::Names);

        for (name, expected) in [
            ("Columns_LOD0", Layer::Structural),
            ("steel BEAM 12", Layer::Structural),
            ("Slabs_LOD1", Layer::Spatial),
            ("SpatialZones_LOD0", Layer::Spatial),
            ("", Layer::Spatial),
        ] {
            let membership = classifier.classify(name, &NodeMetadata::default());
            assert_eq!(membership.layer, Some(expected), "{}", name);
        }
    }

    #[test]
    fn metadata_mode_may_leave_node_unclassified() {
        let classifier = Classifier::new(ClassificationMode::Metadata);

        assert_eq!(
            classifier
                .classify("Columns", &metadata(Some("structure"), None))
                .layer,
            Some(Layer::Structural)
        );
        assert_eq!(
            classifier
                .classify("Columns", &NodeMetadata::default())
                .layer,
            None
        );
        assert_eq!(
            classifier
                .classify("Furniture", &metadata(Some("furniture"), None))
                .layer,
            None
        );
    }

    #[test]
    fn auto_mode_prefers_metadata_over_name() {
        let classifier = Classifier::default();

        let tagged = classifier.classify("Columns_LOD0", &metadata(Some("spatial"), None));
        let untagged = classifier.classify("Columns_LOD0", &NodeMetadata::default());

        assert_eq!(tagged.layer, Some(Layer::Spatial));
        assert_eq!(untagged.layer, Some(Layer::Structural));
    }

    #[test]
    fn lod_tag_is_independent_of_layer() {
        let classifier = Classifier::default();

        assert_eq!(
            classifier.classify("a", &metadata(None, Some(1.0))).lod,
            Some(LodLevel::Lod1)
        );
        assert_eq!(classifier.classify("a", &metadata(None, Some(2.0))).lod, None);
        assert_eq!(classifier.classify("a", &NodeMetadata::default()).lod, None);
    }

    #[test]
    fn parses_extras_json() {
        let raw = serde_json::value::RawValue::from_string(
            r#"{"semantic":"structure","lod":0,"author":"x"}"#.to_string(),
        )
        .unwrap();
        let parsed = NodeMetadata::from_extras("node", &Some(raw));

        assert_eq!(parsed, metadata(Some("structure"), Some(0.0)));
    }

    fn extras(json: &str) -> gltf::json::Extras {
        Some(serde_json::value::RawValue::from_string(json.to_string()).unwrap())
    }

    #[test]
    fn mistyped_lod_keeps_semantic_tag() {
        let parsed = NodeMetadata::from_extras("Slab_A", &extras(r#"{"semantic":"structure","lod":"1"}"#));

        assert_eq!(parsed, metadata(Some("structure"), None));

        let membership = Classifier::default().classify("Slab_A", &parsed);
        assert_eq!(membership.layer, Some(Layer::Structural));
        assert_eq!(membership.lod, None);

        let membership = Classifier::new(ClassificationMode::Metadata).classify("Slab_A", &parsed);
        assert_eq!(membership.layer, Some(Layer::Structural));
    }

    #[test]
    fn mistyped_semantic_keeps_lod_tag() {
        let parsed = NodeMetadata::from_extras("Beam_B", &extras(r#"{"semantic":7,"lod":1}"#));

        assert_eq!(parsed, metadata(None, Some(1.0)));
        assert_eq!(
            Classifier::default().classify("Beam_B", &parsed),
            LayerMembership {
                layer: Some(Layer::Structural),
                lod: Some(LodLevel::Lod1),
            }
        );
    }

    #[test]
    fn non_object_extras_read_as_untagged() {
        let parsed = NodeMetadata::from_extras("node", &extras("[1, 2, 3]"));

        assert_eq!(parsed, NodeMetadata::default());
    }

    #[test]
    fn sets_follow_membership() {
        let mut arena = id_arena::Arena::<crate::scene_graph::Object3D>::new();
        let tagged = arena.alloc(Default::default());
        let untagged = arena.alloc(Default::default());

        let mut sets = LayerSets::default();
        sets.insert(
            tagged,
            LayerMembership {
                layer: Some(Layer::Spatial),
                lod: Some(LodLevel::Lod1),
            },
        );
        sets.insert(untagged, LayerMembership::default());

        assert_eq!(sets.layer(Layer::Spatial), &[tagged]);
        assert!(sets.layer(Layer::Structural).is_empty());
        assert_eq!(sets.lod(LodLevel::Lod1), &[tagged]);
        assert!(sets.lod(LodLevel::Lod0).is_empty());
    }
}
