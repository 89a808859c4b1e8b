use std::collections::HashMap;
use std::sync::Arc;

use id_arena::Arena;
use thiserror::Error;
use winit::{dpi::PhysicalSize, window::Window};

use crate::{
    camera::CameraUniform,
    rendering::{
        imgui_renderer::ImguiRenderer,
        object_uniform::{ObjectBinding, ObjectUniform},
        passes::{
            outline::OutlineBox,
            scene_pass::{SceneDraw, ScenePass, SceneTextureViews},
        },
        render_common::RenderCommon,
        render_model::RenderModel,
        shader_loader::{PipelineCacheBuilder, ShaderLoader},
        texture::DepthTexture,
    },
    scene_graph::ObjectId,
    viewer::{frame_driver::FrameSink, ViewerState},
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Surface(#[from] wgpu::SurfaceError),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub struct Renderer {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,

    common: Arc<RenderCommon>,
    depth_texture: DepthTexture,
    render_models: Arena<RenderModel>,
    object_bindings: HashMap<ObjectId, ObjectBinding>,

    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,

    shader_loader: ShaderLoader,
    scene_pass: ScenePass,
    outline: OutlineBox,
    imgui_renderer: ImguiRenderer,
}

impl Renderer {
    pub async fn new(
        window: Arc<Window>,
        imgui_context: &mut imgui::Context,
    ) -> anyhow::Result<Renderer> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await?;

        let camera_uniform = CameraUniform::default();
        let camera_buffer = camera_uniform.create_buffer(&device);

        let common = Arc::new(RenderCommon::new(
            &device,
            &adapter,
            &surface,
            size,
            &camera_buffer,
        )?);

        let depth_texture = DepthTexture::new(&device, size, "Depth texture");

        let mut cache_builder = PipelineCacheBuilder::new();
        let scene_pass = ScenePass::create(&device, common.clone(), &mut cache_builder);
        let shader_loader = ShaderLoader::new(device.clone(), cache_builder)?;

        let outline = OutlineBox::new(&device, &common.object_bind_group_layout);
        let imgui_renderer =
            ImguiRenderer::new(&device, &queue, common.surface_format(), imgui_context);

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            common,
            depth_texture,
            render_models: Arena::new(),
            object_bindings: HashMap::new(),
            camera_uniform,
            camera_buffer,
            shader_loader,
            scene_pass,
            outline,
            imgui_renderer,
        })
    }

    /// Uploads every model of the scene and allocates a uniform per drawable node.
    pub fn load_models(&mut self, state: &mut ViewerState) {
        for (_id, scene_model) in state.scene.models.iter_mut() {
            let render_model = RenderModel::from_model(&self.device, &scene_model.model);
            scene_model.render_model = Some(self.render_models.alloc(render_model));
            log::debug!(
                "Uploaded model {} with {} primitives",
                scene_model.model.name,
                scene_model.model.primitives.len()
            );
        }

        for &id in &state.nodes {
            let label = state
                .scene
                .get_object(id)
                .map(|object| format!("Object uniform ({})", object.name))
                .unwrap_or_else(|| "Object uniform".to_string());
            let binding =
                ObjectBinding::new(&self.device, &self.common.object_bind_group_layout, &label);
            self.object_bindings.insert(id, binding);
        }

        log::info!(
            "Uploaded {} models for {} nodes",
            self.render_models.len(),
            self.object_bindings.len()
        );
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }

        let Ok(mut config) = self.common.output_surface_config.write() else {
            log::error!("Surface configuration lock poisoned");
            return;
        };

        self.size = new_size;
        config.width = new_size.width;
        config.height = new_size.height;
        self.surface.configure(&self.device, &config);
        self.depth_texture.resize(&self.device, new_size);
    }

    fn gather_draws<'a>(&'a self, state: &ViewerState) -> Vec<SceneDraw<'a>> {
        state
            .visible_nodes()
            .filter_map(|id| {
                let object = state.scene.get_object(id)?;
                let render_model_id = state.scene.models.get(object.model_id?)?.render_model?;
                let model = self.render_models.get(render_model_id)?;
                let binding = self.object_bindings.get(&id)?;

                binding.update(
                    &self.queue,
                    ObjectUniform::new(object.transform.world_matrix(), &object.material),
                );

                Some(SceneDraw {
                    model,
                    binding,
                    wireframe: object.material.wireframe,
                })
            })
            .collect()
    }

    pub fn render(
        &mut self,
        state: &ViewerState,
        imgui_context: &mut imgui::Context,
    ) -> Result<(), RenderError> {
        self.shader_loader.load_pending_shaders();

        self.camera_uniform
            .update(state.viewport.aspect_ratio(), &state.current_camera());
        self.camera_uniform
            .update_buffer(&self.queue, &self.camera_buffer);

        state.scene.update_transforms();

        let outline = state.outline_bounds().map(|bounds| {
            self.outline
                .update(&self.queue, &bounds, state.config.outline_color);
            &self.outline
        });

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render encoder"),
            });

        let draws = self.gather_draws(state);

        self.scene_pass.render(
            &SceneTextureViews {
                color: view.clone(),
                depth: self.depth_texture.view().clone(),
            },
            &mut encoder,
            &self.shader_loader.cache,
            &self.common.camera_bind_group,
            &draws,
            outline,
        );
        drop(draws);

        self.imgui_renderer.render(
            &view,
            imgui_context,
            &self.device,
            &self.queue,
            &mut encoder,
        )?;

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}

/// Pairs the renderer with the imgui context whose frame is being drawn.
pub struct FrameTarget<'a> {
    pub renderer: &'a mut Renderer,
    pub imgui: &'a mut imgui::Context,
}

impl FrameSink for FrameTarget<'_> {
    type Error = RenderError;

    fn render_frame(&mut self, state: &ViewerState) -> Result<(), Self::Error> {
        self.renderer.render(state, self.imgui)
    }
}
