//! glaze: a minimal Vulkan mesh renderer.
//!
//! Usage: `glaze [model.obj]`. Without an argument a built-in textured cube
//! is rendered. Controls: WASD + Space/Shift to fly, hold right mouse to
//! look, Escape to quit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use glam::Vec3;
use tracing::{error, info};
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::WindowId;

use glaze_core::FrameTimer;
use glaze_platform::{InputState, KeyCode, Window};
use glaze_renderer::Renderer;
use glaze_resources::{MeshData, TexturePixels, TextureRegistry, load_obj};

const WINDOW_TITLE: &str = "glaze";
const WINDOW_WIDTH: u32 = 1280;
const WINDOW_HEIGHT: u32 = 720;

/// Scene assets loaded before any GPU object exists.
struct Scene {
    mesh: MeshData,
    texture_pixels: Vec<TexturePixels>,
}

impl Scene {
    /// Load an OBJ scene, or fall back to the built-in cube.
    fn load(model_path: Option<&Path>) -> Result<Self> {
        let mut mesh = MeshData::new();
        let mut registry = TextureRegistry::new();

        let base_dir = match model_path {
            Some(path) => {
                load_obj(path, &mut mesh, &mut registry, Vec3::ZERO, 1.0)
                    .with_context(|| format!("loading model {path:?}"))?;
                path.parent().unwrap_or(Path::new(".")).to_path_buf()
            }
            None => {
                info!("No model given, rendering the built-in cube");
                mesh = MeshData::unit_cube();
                PathBuf::from(".")
            }
        };

        let texture_pixels = registry
            .load_pixels(&base_dir)
            .context("decoding textures")?;

        Ok(Self {
            mesh,
            texture_pixels,
        })
    }
}

struct App {
    scene: Scene,
    window: Option<Window>,
    renderer: Option<Renderer>,
    input: InputState,
    timer: FrameTimer,
}

impl App {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            window: None,
            renderer: None,
            input: InputState::new(),
            timer: FrameTimer::new(),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let window =
            match Window::new(event_loop, WINDOW_WIDTH, WINDOW_HEIGHT, WINDOW_TITLE) {
                Ok(window) => window,
                Err(e) => {
                    error!("Failed to create window: {e}");
                    event_loop.exit();
                    return;
                }
            };

        match Renderer::new(&window, &self.scene.mesh, &self.scene.texture_pixels) {
            Ok(renderer) => {
                info!("Initialization complete, entering main loop");
                self.renderer = Some(renderer);
                self.window = Some(window);
            }
            Err(e) => {
                error!("Failed to initialize the renderer: {e}");
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("Close requested, shutting down");
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(ref mut window) = self.window {
                    window.resize(size.width, size.height);
                }
                if let Some(ref mut renderer) = self.renderer {
                    renderer.resize(size.width, size.height);
                }
            }
            WindowEvent::RedrawRequested => {
                let delta = self.timer.tick();

                if let Some(ref mut renderer) = self.renderer {
                    renderer.update(&self.input, delta);

                    match renderer.render_frame() {
                        Ok(true) => {
                            if let Some(ref window) = self.window {
                                window.set_title(&format!(
                                    "{} - {:.0} FPS",
                                    WINDOW_TITLE,
                                    self.timer.fps()
                                ));
                            }
                        }
                        Ok(false) => {}
                        Err(e) => {
                            // Per-frame errors abandon the frame, not the run
                            error!("Render error: {e}");
                        }
                    }
                }

                self.input.begin_frame();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key) = event.physical_key {
                    if event.state.is_pressed() {
                        if key == KeyCode::Escape {
                            info!("Escape pressed, exiting");
                            event_loop.exit();
                            return;
                        }
                        self.input.on_key_pressed(key);
                    } else {
                        self.input.on_key_released(key);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if state.is_pressed() {
                    self.input.on_mouse_pressed(button.into());
                } else {
                    self.input.on_mouse_released(button.into());
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.input
                    .on_mouse_moved(position.x as f32, position.y as f32);
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(ref window) = self.window {
            window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    glaze_core::init_logging();
    info!("Starting {}", WINDOW_TITLE);

    let model_path = std::env::args().nth(1).map(PathBuf::from);
    let scene = Scene::load(model_path.as_deref())?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
