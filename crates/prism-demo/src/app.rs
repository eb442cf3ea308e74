use std::sync::Arc;

use anyhow::{Context as _, Result};
use glam::Vec3;
use prism_engine::assets::AssetLoader;
use prism_engine::camera::{CameraControl, GpuCamera};
use prism_engine::device::{Context, ContextInit, SurfaceErrorAction};
use prism_engine::render::{RenderError, Renderer};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{Window, WindowId};

use crate::controls;
use crate::mesh;
use crate::scene::{self, QuadScene};

const FOV_DEGREES: f32 = 90.0;

/// Demo configuration.
#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub title: String,
    pub initial_size: LogicalSize<f64>,
    pub texture_path: Option<String>,
    pub context: ContextInit,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            title: "prism".to_string(),
            initial_size: LogicalSize::new(1280.0, 720.0),
            texture_path: None,
            context: ContextInit::default(),
        }
    }
}

/// Runs the event loop until the window closes.
pub fn run(config: DemoConfig) -> Result<()> {
    let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
    let mut app = DemoApp {
        config,
        state: None,
        error: None,
    };

    event_loop
        .run_app(&mut app)
        .context("winit event loop terminated with error")?;

    app.error.map_or(Ok(()), Err)
}

struct DemoApp {
    config: DemoConfig,
    state: Option<DemoState>,
    /// Fatal startup error, reported once the loop has exited.
    error: Option<anyhow::Error>,
}

struct DemoState {
    ctx: Context,
    renderer: Renderer,
    camera: GpuCamera,
    scene: QuadScene,
}

impl DemoState {
    async fn new(window: Arc<Window>, config: &DemoConfig) -> Result<Self> {
        let mut ctx = Context::init(window, config.context.clone()).await?;
        let renderer = Renderer::new(&ctx);

        let mut camera = GpuCamera::perspective(&ctx, Some(FOV_DEGREES));
        camera.translate(Vec3::Z);

        let mut loader = AssetLoader::new();
        let material =
            scene::load_material(&ctx, &mut loader, config.texture_path.as_deref()).await?;
        let material = material.asset(&loader)?;

        let transforms = mesh::grid_transforms(mesh::GRID_SIDE);
        let scene = QuadScene::new(&mut ctx, &camera, material, &transforms).await?;

        camera.upload(ctx.queue());
        log::info!("{} quads ready", transforms.count());

        Ok(Self {
            ctx,
            renderer,
            camera,
            scene,
        })
    }

    fn resize(&mut self) {
        self.ctx.rescale();

        let size = self.ctx.canvas_size();
        if size.width == 0 || size.height == 0 {
            return;
        }

        self.camera.init_projection(self.ctx.window_size());
        // The depth attachment keeps its construction size; rebuild it.
        self.renderer = Renderer::new(&self.ctx);
    }

    fn frame(&mut self) -> Result<(), RenderError> {
        self.camera.upload(self.ctx.queue());

        let pass = self.renderer.begin_render_pass(&self.ctx, &self.camera)?;
        self.scene.draw(pass);
        self.renderer.end_render_pass(&self.ctx)
    }
}

impl ApplicationHandler for DemoApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.initial_size);

        let state = event_loop
            .create_window(attrs)
            .context("failed to create window")
            .and_then(|window| pollster::block_on(DemoState::new(Arc::new(window), &self.config)));

        match state {
            Ok(state) => {
                if let Some(window) = state.ctx.window() {
                    window.request_redraw();
                }
                self.state = Some(state);
            }
            Err(err) => {
                log::error!("startup failed: {err:#}");
                self.error = Some(err);
                event_loop.exit();
            }
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        event_loop.set_control_flow(ControlFlow::Wait);

        if let Some(window) = self.state.as_ref().and_then(|s| s.ctx.window()) {
            window.request_redraw();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => state.resize(),

            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Pressed => {
                if let PhysicalKey::Code(code) = event.physical_key {
                    if let Some(delta) = controls::key_translation(code) {
                        state.camera.translate(delta);
                    }
                }
            }

            WindowEvent::MouseWheel { delta, .. } => {
                state.camera.translate(controls::wheel_translation(delta));
            }

            WindowEvent::RedrawRequested => match state.frame() {
                Ok(()) => {}
                Err(RenderError::Surface {
                    action: SurfaceErrorAction::Fatal,
                    source,
                }) => {
                    log::error!("surface lost for good: {source}");
                    event_loop.exit();
                }
                Err(err) => log::warn!("frame skipped: {err}"),
            },

            _ => {}
        }
    }
}
