//! GPU-free viewer state. Every UI action is a [`Command`] applied to a [`ViewerState`];
//! rendering only ever reads the state.

pub mod frame_driver;
pub mod picking;
pub mod view_toggles;
pub mod visibility;

use glam::Vec2;

use crate::camera::{Camera, OrbitController};
use crate::config::ViewerConfig;
use crate::material::LightingMaterial;
use crate::scene_graph::{
    Classifier, LayerSets, LoadedScene, LodLevel, ObjectId, Scene, SceneLoadError, SceneLoader,
};

pub use picking::{Selection, SelectionInfo};
pub use view_toggles::ViewToggles;
pub use visibility::LayerFilter;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width.max(1) as f32 / self.height.max(1) as f32
    }
}

#[derive(Debug, Clone, Default)]
pub struct FrameStats {
    /// Last published frames-per-second estimate.
    pub fps: Option<f32>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ToggleWireframe,
    ShowLayers(LayerFilter),
    ShowLod(LodLevel),
    ToggleExplode,
    ToggleClipping,
    /// Pointer position in physical pixels, origin at the top left.
    Pick { pointer: Vec2 },
    Resize { width: u32, height: u32 },
    Orbit { delta: Vec2 },
    Zoom { delta: f32 },
}

pub struct ViewerState {
    pub config: ViewerConfig,
    pub scene: Scene,
    /// Every drawable node, regardless of visibility or membership.
    pub nodes: Vec<ObjectId>,
    layers: LayerSets,
    pub selection: Selection,
    pub view: ViewToggles,
    pub camera: OrbitController,
    pub viewport: Viewport,
    pub stats: FrameStats,
}

impl ViewerState {
    pub fn new(config: ViewerConfig, loaded: LoadedScene, viewport: Viewport) -> Self {
        let LoadedScene {
            scene,
            nodes,
            layers,
        } = loaded;

        let mut camera = OrbitController::default();
        camera.frame(&scene.bounds_of(&nodes));

        Self {
            config,
            scene,
            nodes,
            layers,
            selection: Selection::default(),
            view: ViewToggles::default(),
            camera,
            viewport,
            stats: FrameStats::default(),
        }
    }

    /// Loads `config.asset_path` and builds the initial state around it.
    pub fn load(config: ViewerConfig, viewport: Viewport) -> Result<Self, SceneLoadError> {
        let loader = SceneLoader::new(
            Classifier::new(config.classification),
            LightingMaterial::new(config.base_color, config.light_position),
        );
        let loaded = loader.load_path(&config.asset_path)?;

        Ok(Self::new(config, loaded, viewport))
    }

    /// Pure transition: consumes the state and returns the next one.
    pub fn dispatch(mut self, command: &Command) -> Self {
        self.apply(command);
        self
    }

    pub fn apply(&mut self, command: &Command) {
        log::debug!("Applying {:?}", command);

        match *command {
            Command::ToggleWireframe => self.toggle_wireframe(),
            Command::ShowLayers(filter) => self.show_layers(filter),
            Command::ShowLod(level) => self.show_lod(level),
            Command::ToggleExplode => self.toggle_explode(),
            Command::ToggleClipping => self.toggle_clipping(),
            Command::Pick { pointer } => {
                self.pick(pointer);
            }
            Command::Resize { width, height } => {
                if width > 0 && height > 0 {
                    self.viewport = Viewport::new(width, height);
                }
            }
            Command::Orbit { delta } => self.camera.orbit(delta),
            Command::Zoom { delta } => self.camera.zoom(delta),
        }
    }

    /// Layer and LOD membership as decided at load time.
    pub fn layers(&self) -> &LayerSets {
        &self.layers
    }

    pub fn current_camera(&self) -> Camera {
        self.camera.camera()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn status_line(&self) -> String {
        if self.is_empty() {
            format!("{}: scene is empty", self.config.asset_path.display())
        } else {
            format!(
                "{}: {} nodes",
                self.config.asset_path.display(),
                self.nodes.len()
            )
        }
    }
}
