use glam::{Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::math::bounds::{AABB, AABB_EDGE_INDICES};
use crate::model::Vertex;
use crate::rendering::object_uniform::{ObjectBinding, ObjectUniform};

/// World-space wire box around the selected node.
pub struct OutlineBox {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    binding: ObjectBinding,
}

impl OutlineBox {
    pub fn new(device: &wgpu::Device, object_layout: &wgpu::BindGroupLayout) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Outline vertex buffer"),
            size: std::mem::size_of::<[Vertex; 8]>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Outline index buffer"),
            contents: bytemuck::cast_slice(&AABB_EDGE_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let binding = ObjectBinding::new(device, object_layout, "Outline uniform");

        Self {
            vertex_buffer,
            index_buffer,
            binding,
        }
    }

    pub fn update(&self, queue: &wgpu::Queue, bounds: &AABB, color: Vec4) {
        let vertices = bounds.corners().map(|position| Vertex {
            position,
            normal: Vec3::ZERO,
        });

        queue.write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&vertices));
        self.binding.update(queue, ObjectUniform::unlit(color));
    }

    pub fn draw(&self, render_pass: &mut wgpu::RenderPass) {
        render_pass.set_bind_group(1, &self.binding.bind_group, &[]);
        render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        render_pass.draw_indexed(0..AABB_EDGE_INDICES.len() as u32, 0, 0..1);
    }
}
