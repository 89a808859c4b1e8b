// Procedural BIM-style building: one mesh node per structural part and LOD, tagged through
// node extras so the viewer can split structure from spatial zones and switch detail levels.

use std::borrow::Cow;
use std::path::Path;

use anyhow::Context;
use glam::Vec3;
use serde_json::{json, Value};

use crate::math::bounds::AABB;
use crate::model::compute_vertex_normals;

const BOX_INDICES: [u32; 36] = [
    0, 1, 2, 2, 3, 0, //
    1, 5, 6, 6, 2, 1, //
    5, 4, 7, 7, 6, 5, //
    4, 0, 3, 3, 7, 4, //
    3, 2, 6, 6, 7, 3, //
    4, 5, 1, 1, 0, 4,
];

const GL_FLOAT: u32 = 5126;
const GL_UNSIGNED_INT: u32 = 5125;

#[derive(Debug, Clone)]
pub struct BuildingParameters {
    pub floors: u32,
    pub floor_height: f32,
    pub building_width: f32,
    pub lod0_grid: u32,
    pub lod1_grid: u32,
    pub column_size: f32,
    pub beam_height: f32,
    pub beam_width: f32,
    pub slab_thickness: f32,
    pub core_size: f32,
    pub wall_thickness: f32,
    /// Write `semantic` and `lod` extras on every node.
    pub with_metadata: bool,
}

impl Default for BuildingParameters {
    fn default() -> Self {
        Self {
            floors: 5,
            floor_height: 3.5,
            building_width: 20.0,
            lod0_grid: 5,
            lod1_grid: 3,
            column_size: 0.4,
            beam_height: 0.5,
            beam_width: 0.4,
            slab_thickness: 0.3,
            core_size: 4.0,
            wall_thickness: 0.3,
            with_metadata: true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Semantic {
    Structure,
    Spatial,
}

impl Semantic {
    fn tag(self) -> &'static str {
        match self {
            Semantic::Structure => "structure",
            Semantic::Spatial => "spatial",
        }
    }
}

#[derive(Default)]
struct MeshPart {
    positions: Vec<Vec3>,
    indices: Vec<u32>,
}

impl MeshPart {
    fn add_box(&mut self, size: Vec3, center: Vec3) {
        let h = size * 0.5;
        let offset = self.positions.len() as u32;

        self.positions.extend(
            [
                Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(h.x, -h.y, h.z),
                Vec3::new(h.x, h.y, h.z),
                Vec3::new(-h.x, h.y, h.z),
                Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(h.x, -h.y, -h.z),
                Vec3::new(h.x, h.y, -h.z),
                Vec3::new(-h.x, h.y, -h.z),
            ]
            .map(|corner| corner + center),
        );
        self.indices
            .extend(BOX_INDICES.iter().map(|index| index + offset));
    }
}

struct Part {
    name: &'static str,
    semantic: Semantic,
    mesh: MeshPart,
}

fn build_structure(parameters: &BuildingParameters, grid_size: u32) -> Vec<Part> {
    let p = parameters;
    let width = p.building_width;
    let spacing = width / (grid_size.max(2) - 1) as f32;

    let mut slabs = MeshPart::default();
    let mut columns = MeshPart::default();
    let mut beams = MeshPart::default();
    let mut spatial = MeshPart::default();
    let mut core = MeshPart::default();
    let mut walls = MeshPart::default();

    for floor in 0..p.floors {
        let y = floor as f32 * p.floor_height;

        slabs.add_box(
            Vec3::new(width, p.slab_thickness, width),
            Vec3::new(0.0, y, 0.0),
        );
        spatial.add_box(
            Vec3::new(width * 0.9, p.floor_height * 0.8, width * 0.9),
            Vec3::new(0.0, y + p.floor_height / 2.0, 0.0),
        );

        // No storey above the roof slab.
        if floor + 1 == p.floors {
            continue;
        }

        for gx in 0..grid_size {
            for gz in 0..grid_size {
                let x = -width / 2.0 + gx as f32 * spacing;
                let z = -width / 2.0 + gz as f32 * spacing;
                columns.add_box(
                    Vec3::new(p.column_size, p.floor_height, p.column_size),
                    Vec3::new(x, y + p.floor_height / 2.0, z),
                );
            }
        }

        for gz in 0..grid_size {
            let z = -width / 2.0 + gz as f32 * spacing;
            for gx in 0..grid_size.saturating_sub(1) {
                let x = -width / 2.0 + (gx as f32 + 0.5) * spacing;
                beams.add_box(
                    Vec3::new(spacing, p.beam_height, p.beam_width),
                    Vec3::new(x, y + p.floor_height - p.beam_height / 2.0, z),
                );
            }
        }

        let storey_center = y + p.floor_height / 2.0;
        core.add_box(
            Vec3::new(p.core_size, p.floor_height, p.core_size),
            Vec3::new(0.0, storey_center, 0.0),
        );
        walls.add_box(
            Vec3::new(p.wall_thickness, p.floor_height, width),
            Vec3::new(-width / 2.0, storey_center, 0.0),
        );
    }

    vec![
        Part {
            name: "Slabs",
            semantic: Semantic::Structure,
            mesh: slabs,
        },
        Part {
            name: "Columns",
            semantic: Semantic::Structure,
            mesh: columns,
        },
        Part {
            name: "Beams",
            semantic: Semantic::Structure,
            mesh: beams,
        },
        Part {
            name: "Core",
            semantic: Semantic::Structure,
            mesh: core,
        },
        Part {
            name: "Walls",
            semantic: Semantic::Structure,
            mesh: walls,
        },
        Part {
            name: "SpatialZones",
            semantic: Semantic::Spatial,
            mesh: spatial,
        },
    ]
}

/// Accumulates the binary chunk and the JSON arrays that index into it.
#[derive(Default)]
struct GltfWriter {
    bin: Vec<u8>,
    buffer_views: Vec<Value>,
    accessors: Vec<Value>,
    meshes: Vec<Value>,
    nodes: Vec<Value>,
}

impl GltfWriter {
    fn push_view(&mut self, bytes: &[u8]) -> usize {
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        self.buffer_views.push(json!({
            "buffer": 0,
            "byteOffset": offset,
            "byteLength": bytes.len(),
        }));
        self.buffer_views.len() - 1
    }

    fn push_accessor(&mut self, accessor: Value) -> usize {
        self.accessors.push(accessor);
        self.accessors.len() - 1
    }

    fn push_vec3s(&mut self, values: &[Vec3], with_bounds: bool) -> usize {
        let view = self.push_view(bytemuck::cast_slice(values));
        let mut accessor = json!({
            "bufferView": view,
            "componentType": GL_FLOAT,
            "count": values.len(),
            "type": "VEC3",
        });

        if with_bounds {
            let bounds = AABB::from_points(values.iter().copied());
            accessor["min"] = json!(bounds.min.to_array());
            accessor["max"] = json!(bounds.max.to_array());
        }

        self.push_accessor(accessor)
    }

    fn push_indices(&mut self, indices: &[u32]) -> usize {
        let view = self.push_view(bytemuck::cast_slice(indices));
        self.push_accessor(json!({
            "bufferView": view,
            "componentType": GL_UNSIGNED_INT,
            "count": indices.len(),
            "type": "SCALAR",
        }))
    }

    fn push_part(&mut self, part: &Part, lod: u32, with_metadata: bool) {
        let extras = with_metadata.then(|| json!({ "semantic": part.semantic.tag(), "lod": lod }));
        self.push_mesh_node(&format!("{}_LOD{}", part.name, lod), &part.mesh, extras);
    }

    fn push_mesh_node(&mut self, name: &str, mesh: &MeshPart, extras: Option<Value>) {
        if mesh.indices.is_empty() {
            return;
        }

        let normals = compute_vertex_normals(&mesh.positions, &mesh.indices);
        let positions = self.push_vec3s(&mesh.positions, true);
        let normals = self.push_vec3s(&normals, false);
        let indices = self.push_indices(&mesh.indices);

        self.meshes.push(json!({
            "name": name,
            "primitives": [{
                "attributes": { "POSITION": positions, "NORMAL": normals },
                "indices": indices,
            }],
        }));

        let mut node = json!({
            "mesh": self.meshes.len() - 1,
            "name": name,
        });
        if let Some(extras) = extras {
            node["extras"] = extras;
        }
        self.nodes.push(node);
    }

    fn into_glb(self) -> anyhow::Result<Vec<u8>> {
        let node_indices: Vec<usize> = (0..self.nodes.len()).collect();
        let document = json!({
            "asset": { "version": "2.0", "generator": "bimview building generator" },
            "buffers": [{ "byteLength": self.bin.len() }],
            "bufferViews": self.buffer_views,
            "accessors": self.accessors,
            "meshes": self.meshes,
            "nodes": self.nodes,
            "scenes": [{ "nodes": node_indices }],
            "scene": 0,
        });

        let json = serde_json::to_vec(&document).context("Failed to serialize glTF JSON")?;
        let length = 12 + 8 + json.len().next_multiple_of(4) + 8 + self.bin.len().next_multiple_of(4);

        let glb = gltf::binary::Glb {
            header: gltf::binary::Header {
                magic: *b"glTF",
                version: 2,
                length: length as u32,
            },
            json: Cow::Owned(json),
            bin: Some(Cow::Owned(self.bin)),
        };

        glb.to_vec().context("Failed to encode GLB")
    }
}

/// Builds the LOD 0 (full grid) and LOD 1 (reduced grid) variants into one GLB document.
pub fn generate_building(parameters: &BuildingParameters) -> anyhow::Result<Vec<u8>> {
    let mut writer = GltfWriter::default();

    for (lod, grid_size) in [(0, parameters.lod0_grid), (1, parameters.lod1_grid)] {
        for part in build_structure(parameters, grid_size) {
            writer.push_part(&part, lod, parameters.with_metadata);
        }
    }

    writer.into_glb()
}

/// Unit boxes at `center`, each carrying the given `extras` verbatim.
#[cfg(test)]
pub(crate) fn tagged_boxes(nodes: &[(&str, Vec3, Option<Value>)]) -> Vec<u8> {
    let mut writer = GltfWriter::default();

    for (name, center, extras) in nodes {
        let mut mesh = MeshPart::default();
        mesh.add_box(Vec3::ONE, *center);
        writer.push_mesh_node(name, &mesh, extras.clone());
    }

    writer.into_glb().unwrap()
}

pub fn write_building(path: &Path, parameters: &BuildingParameters) -> anyhow::Result<()> {
    let glb = generate_building(parameters)?;
    std::fs::write(path, &glb).with_context(|| format!("Failed to write {}", path.display()))?;
    log::info!("Wrote {} ({} bytes)", path.display(), glb.len());
    Ok(())
}
