use std::{sync::Arc, time::Instant};

use anyhow::Context;
use glam::Vec2;
use imgui::{FontConfig, FontSource};
use imgui_winit_support::WinitPlatform;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, Event, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, EventLoop},
    window::{Window, WindowId},
};

use crate::{
    config::ViewerConfig,
    rendering::renderer::{FrameTarget, RenderError, Renderer},
    ui,
    viewer::{
        frame_driver::{FrameDriver, SystemClock},
        Command, ViewerState, Viewport,
    },
};

/// Pointer travel, in pixels, below which a press and release count as a click.
const CLICK_TOLERANCE: f32 = 4.0;
const PIXELS_PER_SCROLL_LINE: f32 = 50.0;

struct ImguiState {
    context: imgui::Context,
    platform: WinitPlatform,
}

/// Left-button gesture tracking. A press turns into an orbit drag only once the pointer
/// leaves the click tolerance; otherwise the release is a pick.
#[derive(Debug, Default)]
struct PointerState {
    position: Vec2,
    pressed_at: Option<Vec2>,
    dragging: bool,
}

impl PointerState {
    fn press(&mut self) {
        self.pressed_at = Some(self.position);
        self.dragging = false;
    }

    fn move_to(&mut self, position: Vec2) -> Option<Command> {
        let previous = std::mem::replace(&mut self.position, position);
        let pressed_at = self.pressed_at?;

        if self.dragging {
            return Some(Command::Orbit {
                delta: position - previous,
            });
        }

        if pressed_at.distance(position) > CLICK_TOLERANCE {
            self.dragging = true;
            return Some(Command::Orbit {
                delta: position - pressed_at,
            });
        }

        None
    }

    fn release(&mut self) -> Option<Command> {
        self.pressed_at.take()?;

        if std::mem::take(&mut self.dragging) {
            None
        } else {
            Some(Command::Pick {
                pointer: self.position,
            })
        }
    }
}

struct App {
    state: ViewerState,
    renderer: Option<Renderer>,
    imgui: Option<ImguiState>,
    driver: FrameDriver<SystemClock>,
    pointer: PointerState,
    last_frame: Instant,
}

impl App {
    fn new(state: ViewerState) -> Self {
        Self {
            state,
            renderer: None,
            imgui: None,
            driver: FrameDriver::new(SystemClock::new()),
            pointer: PointerState::default(),
            last_frame: Instant::now(),
        }
    }

    fn setup_imgui(window: &Window) -> ImguiState {
        let mut context = imgui::Context::create();
        let mut platform = WinitPlatform::new(&mut context);
        platform.attach_window(
            context.io_mut(),
            window,
            imgui_winit_support::HiDpiMode::Default,
        );

        context.fonts().add_font(&[FontSource::DefaultFontData {
            config: Some(FontConfig {
                oversample_h: 1,
                pixel_snap_h: true,
                size_pixels: 14.0,
                ..Default::default()
            }),
        }]);

        // The published imgui build mishandles ini files.
        context.set_ini_filename(None);

        ImguiState { context, platform }
    }

    fn create_renderer(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let attributes = Window::default_attributes().with_title(format!(
            "bimview - {}",
            self.state.config.asset_path.display()
        ));
        let window = Arc::new(event_loop.create_window(attributes)?);

        let mut imgui = Self::setup_imgui(&window);
        let mut renderer = pollster::block_on(Renderer::new(window.clone(), &mut imgui.context))
            .context("Failed to create renderer")?;

        renderer.load_models(&mut self.state);
        self.driver.restart();

        let size = window.inner_size();
        self.state.apply(&Command::Resize {
            width: size.width,
            height: size.height,
        });

        window.request_redraw();
        self.renderer = Some(renderer);
        self.imgui = Some(imgui);

        Ok(())
    }

    fn wants_mouse(&self) -> bool {
        self.imgui
            .as_ref()
            .is_some_and(|imgui| imgui.context.io().want_capture_mouse)
    }

    fn handle_pointer(&mut self, event: &WindowEvent) {
        match *event {
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vec2::new(position.x as f32, position.y as f32);
                if let Some(command) = self.pointer.move_to(position) {
                    self.state.apply(&command);
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } => {
                if !self.wants_mouse() {
                    self.pointer.press();
                }
            }
            WindowEvent::MouseInput {
                state: ElementState::Released,
                button: MouseButton::Left,
                ..
            } => {
                if let Some(command) = self.pointer.release() {
                    self.state.apply(&command);
                }
            }
            WindowEvent::MouseWheel { delta, .. } => {
                if self.wants_mouse() {
                    return;
                }

                let delta = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(position) => {
                        position.y as f32 / PIXELS_PER_SCROLL_LINE
                    }
                };
                self.state.apply(&Command::Zoom { delta });
            }
            _ => {}
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(renderer), Some(imgui)) = (self.renderer.as_mut(), self.imgui.as_mut()) else {
            return;
        };

        let now = Instant::now();
        imgui
            .context
            .io_mut()
            .update_delta_time(now - self.last_frame);
        self.last_frame = now;

        if let Err(e) = imgui
            .platform
            .prepare_frame(imgui.context.io_mut(), &renderer.window)
        {
            log::error!("Failed to prepare imgui frame: {}", e);
            return;
        }

        let frame = imgui.context.new_frame();
        let commands = ui::control_panel(frame, &self.state);
        imgui.platform.prepare_render(frame, &renderer.window);

        for command in &commands {
            self.state.apply(command);
        }

        let mut target = FrameTarget {
            renderer: &mut *renderer,
            imgui: &mut imgui.context,
        };

        match self.driver.tick(&mut self.state, &mut target) {
            Ok(()) => {}
            Err(RenderError::Surface(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                renderer.resize(renderer.size);
            }
            Err(RenderError::Surface(wgpu::SurfaceError::OutOfMemory)) => {
                log::error!("Out of memory");
                event_loop.exit();
            }
            Err(RenderError::Surface(wgpu::SurfaceError::Timeout)) => {
                log::warn!("Surface timeout");
            }
            Err(e) => {
                log::error!("Rendering failed: {:?}", e);
            }
        }

        renderer.window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.renderer.is_some() {
            return;
        }

        if let Err(e) = self.create_renderer(event_loop) {
            log::error!("{:?}", e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let (Some(renderer), Some(imgui)) = (self.renderer.as_ref(), self.imgui.as_mut()) {
            imgui.platform.handle_event::<()>(
                imgui.context.io_mut(),
                &renderer.window,
                &Event::WindowEvent {
                    window_id,
                    event: event.clone(),
                },
            );
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    renderer.resize(new_size);
                }
                self.state.apply(&Command::Resize {
                    width: new_size.width,
                    height: new_size.height,
                });
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            ref pointer_event => self.handle_pointer(pointer_event),
        }
    }
}

pub fn run(config: ViewerConfig) -> anyhow::Result<()> {
    let state = ViewerState::load(config, Viewport::new(1280, 720))?;
    if state.is_empty() {
        log::warn!("{}", state.status_line());
    }

    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(state);
    event_loop.run_app(&mut app)?;

    Ok(())
}
