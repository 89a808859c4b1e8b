use std::sync::Arc;

use wgpu::{
    DepthBiasState, Device, MultisampleState, PipelineCompilationOptions, RenderPassDescriptor,
    ShaderSource, StencilState,
};

use crate::rendering::{
    object_uniform::ObjectBinding,
    passes::outline::OutlineBox,
    render_common::RenderCommon,
    render_model::{RenderModel, RENDER_MODEL_VBL},
    shader_loader::{PipelineCache, PipelineCacheBuilder, PipelineId, ShaderDefinition},
    texture::DepthTexture,
};

const MESH_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Lit mesh",
    path: "mesh.wgsl",
};

const LINE_SHADER: ShaderDefinition = ShaderDefinition {
    name: "Lines",
    path: "lines.wgsl",
};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.08,
    g: 0.09,
    b: 0.11,
    a: 1.0,
};

pub struct SceneTextureViews {
    pub color: wgpu::TextureView,
    pub depth: wgpu::TextureView,
}

/// One visible node for this frame.
pub struct SceneDraw<'a> {
    pub model: &'a RenderModel,
    pub binding: &'a ObjectBinding,
    pub wireframe: bool,
}

/// Draws lit meshes, wireframe edges and the selection outline into the output surface.
pub struct ScenePass {
    mesh_pipeline_id: PipelineId,
    line_pipeline_id: PipelineId,
}

fn register_pipeline(
    cache_builder: &mut PipelineCacheBuilder,
    shader: ShaderDefinition,
    layout: wgpu::PipelineLayout,
    format: wgpu::TextureFormat,
    topology: wgpu::PrimitiveTopology,
) -> PipelineId {
    cache_builder.add_shader(
        shader,
        Box::new(
            move |device: &Device, shader_def: &ShaderDefinition, source: &str| {
                let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
                    label: Some(shader_def.name),
                    source: ShaderSource::Wgsl(source.into()),
                });

                let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                    label: Some(shader_def.name),
                    layout: Some(&layout),
                    vertex: wgpu::VertexState {
                        module: &shader,
                        entry_point: Some("vs_main"),
                        buffers: &[RENDER_MODEL_VBL],
                        compilation_options: PipelineCompilationOptions::default(),
                    },
                    fragment: Some(wgpu::FragmentState {
                        module: &shader,
                        entry_point: Some("fs_main"),
                        targets: &[Some(wgpu::ColorTargetState {
                            format,
                            blend: Some(wgpu::BlendState::REPLACE),
                            write_mask: wgpu::ColorWrites::ALL,
                        })],
                        compilation_options: PipelineCompilationOptions::default(),
                    }),
                    primitive: wgpu::PrimitiveState {
                        topology,
                        strip_index_format: None,
                        front_face: wgpu::FrontFace::Ccw,
                        // Exported boxes are not consistently wound and sections expose back faces.
                        cull_mode: None,
                        polygon_mode: wgpu::PolygonMode::Fill,
                        unclipped_depth: false,
                        conservative: false,
                    },
                    depth_stencil: Some(wgpu::DepthStencilState {
                        format: DepthTexture::DEPTH_FORMAT,
                        depth_write_enabled: true,
                        depth_compare: wgpu::CompareFunction::LessEqual,
                        stencil: StencilState::default(),
                        bias: DepthBiasState::default(),
                    }),
                    multisample: MultisampleState::default(),
                    multiview: None,
                    cache: None,
                });

                Ok(pipeline)
            },
        ),
    )
}

impl ScenePass {
    pub fn create(
        device: &wgpu::Device,
        common: Arc<RenderCommon>,
        cache_builder: &mut PipelineCacheBuilder,
    ) -> Self {
        let pipeline_layout = || {
            device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
                label: Some("Scene pipeline layout"),
                bind_group_layouts: &[
                    &common.camera_bind_group_layout,
                    &common.object_bind_group_layout,
                ],
                push_constant_ranges: &[],
            })
        };
        let format = common.surface_format();

        let mesh_pipeline_id = register_pipeline(
            cache_builder,
            MESH_SHADER,
            pipeline_layout(),
            format,
            wgpu::PrimitiveTopology::TriangleList,
        );
        let line_pipeline_id = register_pipeline(
            cache_builder,
            LINE_SHADER,
            pipeline_layout(),
            format,
            wgpu::PrimitiveTopology::LineList,
        );

        Self {
            mesh_pipeline_id,
            line_pipeline_id,
        }
    }

    pub fn render(
        &self,
        texture_views: &SceneTextureViews,
        encoder: &mut wgpu::CommandEncoder,
        pipeline_cache: &PipelineCache,
        camera_bind_group: &wgpu::BindGroup,
        draws: &[SceneDraw],
        outline: Option<&OutlineBox>,
    ) {
        let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
            label: Some("Scene pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &texture_views.color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &texture_views.depth,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let (Some(mesh_pipeline), Some(line_pipeline)) = (
            pipeline_cache.get(self.mesh_pipeline_id),
            pipeline_cache.get(self.line_pipeline_id),
        ) else {
            return;
        };

        render_pass.set_bind_group(0, camera_bind_group, &[]);

        render_pass.set_pipeline(mesh_pipeline);
        for draw in draws.iter().filter(|draw| !draw.wireframe) {
            render_pass.set_bind_group(1, &draw.binding.bind_group, &[]);
            for primitive in &draw.model.primitives {
                primitive.draw_triangles(&mut render_pass);
            }
        }

        render_pass.set_pipeline(line_pipeline);
        for draw in draws.iter().filter(|draw| draw.wireframe) {
            render_pass.set_bind_group(1, &draw.binding.bind_group, &[]);
            for primitive in &draw.model.primitives {
                primitive.draw_edges(&mut render_pass);
            }
        }

        if let Some(outline) = outline {
            outline.draw(&mut render_pass);
        }
    }
}
