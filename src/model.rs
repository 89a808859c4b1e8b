use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use gltf::buffer;
use itertools::izip;
use thiserror::Error;

use crate::math::{bounds::AABB, ray::Ray};

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
}

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("mesh {mesh} uses unsupported primitive mode {mode:?}")]
    UnsupportedMode {
        mesh: String,
        mode: gltf::mesh::Mode,
    },
    #[error("mesh {mesh} has a primitive without positions")]
    MissingPositions { mesh: String },
    #[error("mesh {mesh} has no primitives")]
    NoPrimitives { mesh: String },
}

pub struct ModelPrimitive {
    pub index: usize,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub bounds: AABB,
}

pub struct Model {
    pub name: String,
    pub primitives: Vec<ModelPrimitive>,
    pub bounds: AABB,
}

pub type Buffers<'a> = &'a [buffer::Data];

impl Model {
    pub fn from_gltf(
        name: impl Into<String>,
        mesh: gltf::Mesh,
        buffers: Buffers,
    ) -> Result<Model, ModelError> {
        let name = name.into();
        let mut primitives = Vec::new();

        for primitive in mesh.primitives() {
            if primitive.mode() != gltf::mesh::Mode::Triangles {
                return Err(ModelError::UnsupportedMode {
                    mesh: name,
                    mode: primitive.mode(),
                });
            }

            let reader = primitive
                .reader(|buffer| buffers.get(buffer.index()).map(|data| &data[..]));

            let positions: Vec<Vec3> = reader
                .read_positions()
                .ok_or_else(|| ModelError::MissingPositions { mesh: name.clone() })?
                .map(Vec3::from)
                .collect();

            let indices: Vec<u32> = match reader.read_indices() {
                Some(indices) => indices.into_u32().collect(),
                None => (0..positions.len() as u32).collect(),
            };

            let normals: Vec<Vec3> = match reader.read_normals() {
                Some(normals) => normals.map(Vec3::from).collect(),
                None => compute_vertex_normals(&positions, &indices),
            };

            primitives.push(ModelPrimitive::new(
                primitive.index(),
                &positions,
                &normals,
                indices,
            ));
        }

        Model::from_primitives(name, primitives)
    }

    pub fn from_primitives(
        name: impl Into<String>,
        primitives: Vec<ModelPrimitive>,
    ) -> Result<Model, ModelError> {
        let name = name.into();

        if primitives.is_empty() {
            return Err(ModelError::NoPrimitives { mesh: name });
        }

        let bounds = primitives
            .iter()
            .fold(AABB::EMPTY, |bounds, primitive| bounds.union(primitive.bounds));

        Ok(Model {
            name,
            primitives,
            bounds,
        })
    }

    /// Distance along `ray` (model space) to the nearest triangle.
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_aabb(&self.bounds)?;

        self.primitives
            .iter()
            .filter_map(|primitive| primitive.intersect_ray(ray))
            .min_by(f32::total_cmp)
    }
}

impl ModelPrimitive {
    pub fn new(index: usize, positions: &[Vec3], normals: &[Vec3], indices: Vec<u32>) -> Self {
        let vertices = izip!(positions, normals)
            .map(|(&position, &normal)| Vertex { position, normal })
            .collect::<Vec<Vertex>>();

        let bounds = AABB::from_points(positions.iter().copied());

        Self {
            index,
            vertices,
            indices,
            bounds,
        }
    }

    fn triangle(&self, triangle: &[u32]) -> Option<(Vec3, Vec3, Vec3)> {
        let position = |i: u32| self.vertices.get(i as usize).map(|v| v.position);
        Some((
            position(triangle[0])?,
            position(triangle[1])?,
            position(triangle[2])?,
        ))
    }

    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        ray.intersect_aabb(&self.bounds)?;

        self.indices
            .chunks_exact(3)
            .filter_map(|triangle| self.triangle(triangle))
            .filter_map(|(a, b, c)| ray.intersect_triangle(a, b, c))
            .min_by(f32::total_cmp)
    }

    /// Line-list indices with every triangle edge once, for wireframe drawing.
    pub fn edge_indices(&self) -> Vec<u32> {
        let mut seen = HashSet::new();
        let mut lines = Vec::new();

        for triangle in self.indices.chunks_exact(3) {
            for (a, b) in [
                (triangle[0], triangle[1]),
                (triangle[1], triangle[2]),
                (triangle[2], triangle[0]),
            ] {
                if seen.insert((a.min(b), a.max(b))) {
                    lines.push(a);
                    lines.push(b);
                }
            }
        }

        lines
    }
}

/// Per-vertex normals from accumulated (area weighted) face normals.
pub fn compute_vertex_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];

    for triangle in indices.chunks_exact(3) {
        let [i0, i1, i2] = [
            triangle[0] as usize,
            triangle[1] as usize,
            triangle[2] as usize,
        ];
        if i0.max(i1).max(i2) >= positions.len() {
            continue;
        }

        let face = (positions[i1] - positions[i0]).cross(positions[i2] - positions[i0]);
        normals[i0] += face;
        normals[i1] += face;
        normals[i2] += face;
    }

    normals.into_iter().map(Vec3::normalize_or_zero).collect()
}
