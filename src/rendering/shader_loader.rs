use std::{
    path::Path,
    sync::{
        mpsc::{self, channel},
        Arc, RwLock,
    },
    time::Duration,
};

use anyhow::Context;
use id_arena::{Arena, Id};
use naga::{
    back::wgsl::WriterFlags,
    valid::{Capabilities, ValidationFlags},
};
use naga_oil::compose::{
    ComposableModuleDescriptor, Composer, NagaModuleDescriptor, ShaderLanguage,
};
use notify_debouncer_mini::{
    new_debouncer_opt, notify::*, DebounceEventResult, DebouncedEventKind, Debouncer,
};
use pollster::block_on;
use wgpu::PollType;

const SHADER_FOLDER: &str = "assets/shaders";
const SHARED_MODULES_FOLDER: &str = "assets/shaders/shared";

pub type PipelineFactory = Box<
    dyn Sync
        + Send
        + Fn(&wgpu::Device, &ShaderDefinition, &str) -> anyhow::Result<wgpu::RenderPipeline>,
>;

#[derive(Debug, Clone)]
pub struct ShaderDefinition {
    pub name: &'static str,
    /// Relative to the shader folder.
    pub path: &'static str,
}

struct RegisteredShader {
    pipeline_id: PipelineId,
    def: ShaderDefinition,
    factory: PipelineFactory,
}

pub type PipelineId = Id<PipelineSlot>;

#[derive(Default)]
pub struct PipelineSlot(Option<wgpu::RenderPipeline>);

#[derive(Default)]
pub struct PipelineCacheBuilder {
    shaders: Arena<RegisteredShader>,
    pipelines: Arena<PipelineSlot>,
}

impl PipelineCacheBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_shader(&mut self, def: ShaderDefinition, factory: PipelineFactory) -> PipelineId {
        let pipeline_id = self.pipelines.alloc(PipelineSlot::default());
        self.shaders.alloc(RegisteredShader {
            pipeline_id,
            def,
            factory,
        });
        pipeline_id
    }
}

pub struct PipelineCache {
    shaders: Arc<Arena<RegisteredShader>>,
    pipelines: Arena<PipelineSlot>,
}

impl PipelineCache {
    pub fn get(&self, id: PipelineId) -> Option<&wgpu::RenderPipeline> {
        self.pipelines.get(id)?.0.as_ref()
    }

    fn set(&mut self, id: PipelineId, pipeline: wgpu::RenderPipeline) {
        if let Some(slot) = self.pipelines.get_mut(id) {
            slot.0 = Some(pipeline);
        }
    }
}

/// Compiles pipelines up front and recompiles them on a watcher thread when their source changes.
pub struct ShaderLoader {
    pub cache: PipelineCache,
    receiver: mpsc::Receiver<(&'static str, PipelineId, wgpu::RenderPipeline)>,
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ShaderLoader {
    pub fn new(device: wgpu::Device, builder: PipelineCacheBuilder) -> anyhow::Result<Self> {
        let composer = Arc::new(RwLock::new(create_composer()?));

        let mut cache = PipelineCache {
            shaders: Arc::new(builder.shaders),
            pipelines: builder.pipelines,
        };

        let shaders = cache.shaders.clone();
        for (_, shader) in shaders.iter() {
            let pipeline = compile_file(&device, &shader.def, &shader.factory, &composer)
                .with_context(|| format!("Failed to compile shader: {}", shader.def.name))?;
            cache.set(shader.pipeline_id, pipeline);
        }

        let (sender, receiver) = channel();

        let mut debouncer = new_debouncer_opt(
            notify_debouncer_mini::Config::default().with_timeout(Duration::from_millis(100)),
            move |result: DebounceEventResult| {
                let events = match result {
                    Ok(events) => events,
                    Err(e) => {
                        log::warn!("Error watching shader folder: {}", e);
                        return;
                    }
                };

                for event in events {
                    if event.kind != DebouncedEventKind::Any {
                        continue;
                    }

                    let Some((_, shader)) = shaders
                        .iter()
                        .find(|(_, shader)| event.path.ends_with(shader.def.path))
                    else {
                        continue;
                    };

                    match compile_file(&device, &shader.def, &shader.factory, &composer) {
                        Ok(pipeline) => {
                            if sender
                                .send((shader.def.name, shader.pipeline_id, pipeline))
                                .is_err()
                            {
                                return;
                            }
                        }
                        Err(e) => {
                            log::error!("Failed to reload shader {}: {:?}", shader.def.name, e)
                        }
                    }
                }
            },
        )
        .context("Failed to create shader watcher")?;

        let shader_folder = Path::new(SHADER_FOLDER)
            .canonicalize()
            .with_context(|| format!("Shader folder {} not found", SHADER_FOLDER))?;

        debouncer
            .watcher()
            .watch(&shader_folder, RecursiveMode::Recursive)
            .context("Failed to watch shader folder")?;

        Ok(Self {
            cache,
            receiver,
            _debouncer: debouncer,
        })
    }

    /// Swaps in pipelines recompiled since the last frame.
    pub fn load_pending_shaders(&mut self) {
        while let Ok((name, pipeline_id, pipeline)) = self.receiver.try_recv() {
            log::info!("Shader reloaded: {}", name);
            self.cache.set(pipeline_id, pipeline);
        }
    }
}

fn compile_file(
    device: &wgpu::Device,
    def: &ShaderDefinition,
    factory: &PipelineFactory,
    composer: &RwLock<Composer>,
) -> anyhow::Result<wgpu::RenderPipeline> {
    let path = Path::new(SHADER_FOLDER).join(def.path);
    let source = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read shader file {}", path.display()))?;
    let file_path = path.to_string_lossy().to_string();

    let module = {
        let mut composer = composer
            .write()
            .map_err(|_| anyhow::anyhow!("Shader composer lock poisoned"))?;

        composer
            .make_naga_module(NagaModuleDescriptor {
                file_path: &file_path,
                source: &source,
                ..Default::default()
            })
            .with_context(|| format!("Failed to compose {}", file_path))?
    };

    // wgpu validates again when the module is created.
    let info = naga::valid::Validator::new(ValidationFlags::empty(), Capabilities::all())
        .validate(&module)
        .context("Failed to validate composed module")?;

    let wgsl = naga::back::wgsl::write_string(&module, &info, WriterFlags::empty())
        .context("Failed to write composed module as WGSL")?;

    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let pipeline = factory(device, def, &wgsl);

    device
        .poll(PollType::Wait)
        .context("Failed to poll device after shader compilation")?;

    if let Some(error) = block_on(device.pop_error_scope()) {
        anyhow::bail!("Shader compilation failed for {}: {}", def.name, error);
    }

    pipeline
}

fn create_composer() -> anyhow::Result<Composer> {
    let mut composer = Composer::default();

    let entries = std::fs::read_dir(SHARED_MODULES_FOLDER)
        .with_context(|| format!("Failed to read {}", SHARED_MODULES_FOLDER))?;

    for entry in entries {
        let path = entry?.path();

        if !path.is_file() || path.extension().map_or(true, |ext| ext != "wgsl") {
            continue;
        }

        let source = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let file_path = path.to_string_lossy().to_string();

        composer
            .add_composable_module(ComposableModuleDescriptor {
                source: &source,
                file_path: &file_path,
                language: ShaderLanguage::Wgsl,
                ..Default::default()
            })
            .with_context(|| format!("Failed to add shared shader module: {}", file_path))?;
    }

    Ok(composer)
}
