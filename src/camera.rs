use std::ops::Range;

use glam::{Mat4, Vec2, Vec3, Vec4};
use wgpu::util::DeviceExt;

use crate::math::bounds::AABB;

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn get_vp_matrix(&self, aspect_ratio: f32) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target, self.up);
        let projection = Mat4::perspective_rh(self.fov_y, aspect_ratio, self.near, self.far);
        projection * view
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            eye: Vec3::new(30.0, 25.0, 30.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 500.0,
        }
    }
}

/// Orbits a target point. Drag rotates, scroll dollies.
#[derive(Debug, Clone)]
pub struct OrbitController {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
    pub radius_range: Range<f32>,
    pub rotation_speed: f32,
    pub zoom_speed: f32,
}

impl OrbitController {
    const PITCH_LIMIT: f32 = 89f32 * std::f32::consts::PI / 180.0;

    pub fn new(target: Vec3, radius: f32) -> Self {
        Self {
            target,
            yaw: std::f32::consts::FRAC_PI_4,
            pitch: 0.5,
            radius,
            radius_range: 1.0..1000.0,
            rotation_speed: 0.005,
            zoom_speed: 0.1,
        }
    }

    /// Centers on `bounds` at a distance where the whole box fits.
    pub fn frame(&mut self, bounds: &AABB) {
        if bounds.is_empty() {
            return;
        }

        let extent = bounds.size().length().max(1.0);
        self.target = bounds.center();
        self.radius = extent * 1.5;
        self.radius_range = (extent * 0.05)..(extent * 10.0);
    }

    pub fn orbit(&mut self, delta: Vec2) {
        self.yaw -= delta.x * self.rotation_speed;
        self.pitch = (self.pitch + delta.y * self.rotation_speed)
            .clamp(-Self::PITCH_LIMIT, Self::PITCH_LIMIT);
    }

    /// Positive `delta` moves closer.
    pub fn zoom(&mut self, delta: f32) {
        let radius = self.radius * (1.0 - delta * self.zoom_speed);
        self.radius = radius.clamp(self.radius_range.start, self.radius_range.end);
    }

    pub fn eye(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        self.target + Vec3::new(cos_pitch * sin_yaw, sin_pitch, cos_pitch * cos_yaw) * self.radius
    }

    pub fn camera(&self) -> Camera {
        Camera {
            eye: self.eye(),
            target: self.target,
            far: (self.radius * 4.0).max(100.0),
            ..Default::default()
        }
    }
}

impl Default for OrbitController {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 40.0)
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    eye: Vec4,
}

impl CameraUniform {
    pub fn update(&mut self, aspect_ratio: f32, camera: &Camera) {
        self.view_proj = camera.get_vp_matrix(aspect_ratio);
        self.eye = camera.eye.extend(1.0);
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}
