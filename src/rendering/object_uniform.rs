use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};
use wgpu::util::DeviceExt;

use crate::material::LightingMaterial;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct ObjectUniform {
    model: Mat4,
    normal_matrix: Mat4,
    color: Vec4,
    light_position: Vec4,
    clip_plane: Vec4,
    flags: [u32; 4],
}

impl ObjectUniform {
    pub fn new(world_matrix: Mat4, material: &LightingMaterial) -> Self {
        let (clip_plane, clipping) = match material.clipping_plane {
            Some(plane) => (plane.to_vec4(), 1),
            None => (Vec4::ZERO, 0),
        };

        Self {
            model: world_matrix,
            normal_matrix: world_matrix.inverse().transpose(),
            color: material.color(),
            light_position: material.light_position.extend(1.0),
            clip_plane,
            flags: [clipping, 0, 0, 0],
        }
    }

    /// Flat color in world space, never clipped.
    pub fn unlit(color: Vec4) -> Self {
        Self {
            model: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
            color,
            light_position: Vec4::ZERO,
            clip_plane: Vec4::ZERO,
            flags: [0; 4],
        }
    }
}

/// A uniform buffer and bind group for one drawn object.
pub struct ObjectBinding {
    buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

impl ObjectBinding {
    pub fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(label),
            contents: bytemuck::cast_slice(&[ObjectUniform::unlit(Vec4::ONE)]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(label),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self { buffer, bind_group }
    }

    pub fn update(&self, queue: &wgpu::Queue, uniform: ObjectUniform) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[uniform]));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::plane::Plane;
    use glam::Vec3;

    #[test]
    fn uniform_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 192);
    }

    #[test]
    fn highlight_and_clipping_reach_the_uniform() {
        let mut material = LightingMaterial::new(Vec4::ONE, Vec3::Y);
        material.highlight = Some(Vec4::new(1.0, 0.0, 0.0, 1.0));
        material.clipping_plane = Some(Plane::from_point_normal(Vec3::ZERO, Vec3::NEG_Y));

        let uniform = ObjectUniform::new(Mat4::IDENTITY, &material);

        assert_eq!(uniform.color, Vec4::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(uniform.flags[0], 1);
        assert_eq!(uniform.clip_plane, Vec4::new(0.0, -1.0, 0.0, 0.0));
    }
}
