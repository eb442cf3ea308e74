use std::collections::VecDeque;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use futures::future::join_all;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::coords::Viewport;
use crate::shader::{BatchCompileError, Shader, ShaderSource};

use super::errors::{self, ErrorScope};
use super::surface::{self, SurfaceErrorAction};
use super::ContextInit;

/// Owns the wgpu adapter, device and queue, the presentation target, and the
/// queue of shaders waiting for their batched compile.
///
/// Every other GPU object in the crate is created from a `Context` after
/// [`Context::init`] (or [`Context::headless`]) has resolved.
pub struct Context {
    adapter: wgpu::Adapter,
    device: wgpu::Device,
    queue: wgpu::Queue,

    target: Target,
    format: wgpu::TextureFormat,

    /// Device pixels per logical pixel.
    scale_factor: f64,
    /// Window size in logical pixels.
    window_size: Viewport,
    /// Back-buffer size in physical pixels.
    canvas_size: PhysicalSize<u32>,

    pending: VecDeque<Shader>,
}

enum Target {
    Surface {
        window: Arc<Window>,
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    Offscreen {
        texture: wgpu::Texture,
    },
}

/// The texture a render pass draws into this frame.
#[derive(Debug)]
pub(crate) struct FrameTarget {
    pub view: wgpu::TextureView,
    pub surface_texture: Option<wgpu::SurfaceTexture>,
}

impl Context {
    /// Acquires an adapter and device and binds a presentation surface to
    /// `window`.
    ///
    /// Any failure here is fatal: the returned error describes which step
    /// could not complete.
    pub async fn init(window: Arc<Window>, init: ContextInit) -> Result<Self> {
        let size = window.inner_size();
        anyhow::ensure!(size.width > 0 && size.height > 0, "window has zero size");

        let instance = wgpu::Instance::new(&init.instance_descriptor());

        log::debug!("creating surface");
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create wgpu surface")?;

        let adapter = request_adapter(&instance, &init, Some(&surface)).await?;
        let (device, queue) = request_device(&adapter, &init).await?;
        errors::install_uncaptured_handler(&device);

        let caps = surface.get_capabilities(&adapter);
        let format = surface::choose_surface_format(&caps, init.prefer_srgb)
            .context("no supported surface formats")?;

        let config = wgpu::SurfaceConfiguration {
            usage: surface::choose_usage(&caps),
            format,
            width: size.width,
            height: size.height,
            present_mode: init.present_mode,
            alpha_mode: surface::choose_alpha_mode(&caps, init.alpha_mode),
            view_formats: vec![],
            desired_maximum_frame_latency: init.desired_maximum_frame_latency,
        };

        log::debug!("configuring surface: {config:?}");
        let scope = ErrorScope::push(&device, wgpu::ErrorFilter::Validation);
        surface.configure(&device, &config);
        if let Some(err) = scope.pop().await {
            anyhow::bail!("failed to configure surface: {err}");
        }

        let scale_factor = window.scale_factor();
        let window_size = logical_size(size, scale_factor);
        log_scaling(window_size, size);

        Ok(Self {
            adapter,
            device,
            queue,
            target: Target::Surface {
                window,
                surface,
                config,
            },
            format,
            scale_factor,
            window_size,
            canvas_size: size,
            pending: VecDeque::new(),
        })
    }

    /// Creates a context that renders into an owned `width x height` texture
    /// instead of a window surface.
    pub async fn headless(init: ContextInit, width: u32, height: u32) -> Result<Self> {
        anyhow::ensure!(width > 0 && height > 0, "offscreen target has zero size");

        let instance = wgpu::Instance::new(&init.instance_descriptor());
        let adapter = request_adapter(&instance, &init, None).await?;
        let (device, queue) = request_device(&adapter, &init).await?;
        errors::install_uncaptured_handler(&device);

        let format = if init.prefer_srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };

        let canvas_size = PhysicalSize::new(width, height);
        let texture = create_offscreen_texture(&device, format, canvas_size);

        let window_size = logical_size(canvas_size, 1.0);
        log_scaling(window_size, canvas_size);

        Ok(Self {
            adapter,
            device,
            queue,
            target: Target::Offscreen { texture },
            format,
            scale_factor: 1.0,
            window_size,
            canvas_size,
            pending: VecDeque::new(),
        })
    }

    pub fn adapter(&self) -> &wgpu::Adapter {
        &self.adapter
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Format of the presentation target; color targets of every pipeline
    /// use it.
    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Window size in logical pixels.
    pub fn window_size(&self) -> Viewport {
        self.window_size
    }

    /// Back-buffer size in physical pixels (window size x scale factor).
    pub fn canvas_size(&self) -> PhysicalSize<u32> {
        self.canvas_size
    }

    /// The window the surface is bound to, if any.
    pub fn window(&self) -> Option<&Arc<Window>> {
        match &self.target {
            Target::Surface { window, .. } => Some(window),
            Target::Offscreen { .. } => None,
        }
    }

    /// Recomputes window and canvas dimensions and resizes the surface.
    ///
    /// The context does not observe resize events itself; call this from the
    /// window's resize/scale-factor handlers.
    pub fn rescale(&mut self) {
        let Target::Surface {
            window,
            surface,
            config,
        } = &mut self.target
        else {
            log::debug!("rescale ignored for offscreen target");
            return;
        };

        let size = window.inner_size();
        self.scale_factor = window.scale_factor();
        self.window_size = logical_size(size, self.scale_factor);
        self.canvas_size = size;

        surface::apply_resize(surface, &self.device, config, size);
        log_scaling(self.window_size, self.canvas_size);
    }

    /// Pushes a validation error scope.
    pub fn check_validation(&self) -> ErrorScope {
        ErrorScope::push(&self.device, wgpu::ErrorFilter::Validation)
    }

    /// Pushes an internal error scope.
    pub fn check_internal(&self) -> ErrorScope {
        ErrorScope::push(&self.device, wgpu::ErrorFilter::Internal)
    }

    /// Pushes an out-of-memory error scope.
    pub fn check_out_of_memory(&self) -> ErrorScope {
        ErrorScope::push(&self.device, wgpu::ErrorFilter::OutOfMemory)
    }

    /// Wraps `source` in a [`Shader`] and queues it for [`compile_all`].
    ///
    /// The returned reference is meant for configuring bind-group and vertex
    /// layouts before the batch compile.
    ///
    /// [`compile_all`]: Self::compile_all
    pub fn register_shader(&mut self, source: ShaderSource) -> &mut Shader {
        self.pending.push_back(Shader::new(source));
        let last = self.pending.len() - 1;
        &mut self.pending[last]
    }

    /// Number of shaders registered but not yet compiled.
    pub fn pending_shaders(&self) -> usize {
        self.pending.len()
    }

    /// Drains the pending queue and compiles every shader concurrently.
    ///
    /// Resolves once all compiles have finished. The shaders are handed back
    /// in registration order, on failure inside the [`BatchCompileError`];
    /// the context keeps no reference to them.
    pub async fn compile_all(&mut self) -> Result<Vec<Shader>, BatchCompileError> {
        let mut shaders: Vec<Shader> = self.pending.drain(..).collect();
        log::info!("compiling {} shader(s)", shaders.len());

        let ctx: &Self = self;
        let results = join_all(
            shaders
                .iter_mut()
                .map(|shader| async move { shader.compile(ctx).await.map(|_| ()) }),
        )
        .await;

        let mut failed = 0;
        let mut first = None;
        for (index, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                log::error!("shader #{index} failed to compile: {err}");
                failed += 1;
                first.get_or_insert(err);
            }
        }

        match first {
            None => Ok(shaders),
            Some(first) => Err(BatchCompileError {
                shaders,
                failed,
                first,
            }),
        }
    }

    /// Acquires the texture to render into this frame.
    pub(crate) fn acquire_frame(&self) -> Result<FrameTarget, wgpu::SurfaceError> {
        match &self.target {
            Target::Surface { surface, .. } => {
                let surface_texture = surface.get_current_texture()?;
                let view = surface_texture
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                Ok(FrameTarget {
                    view,
                    surface_texture: Some(surface_texture),
                })
            }
            Target::Offscreen { texture } => Ok(FrameTarget {
                view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
                surface_texture: None,
            }),
        }
    }

    /// Presents a frame after its commands were submitted.
    pub(crate) fn present(&self, frame: FrameTarget) {
        drop(frame.view);
        if let Some(surface_texture) = frame.surface_texture {
            if let Some(window) = self.window() {
                window.pre_present_notify();
            }
            surface_texture.present();
        }
    }

    /// Converts a `SurfaceError` into a higher-level action, reconfiguring the
    /// surface when it was lost or outdated.
    pub fn handle_surface_error(&self, err: wgpu::SurfaceError) -> SurfaceErrorAction {
        match &self.target {
            Target::Surface {
                surface, config, ..
            } => surface::map_surface_error(surface, &self.device, config, err),
            Target::Offscreen { .. } => SurfaceErrorAction::SkipFrame,
        }
    }
}

async fn request_adapter(
    instance: &wgpu::Instance,
    init: &ContextInit,
    compatible_surface: Option<&wgpu::Surface<'_>>,
) -> Result<wgpu::Adapter> {
    log::debug!("requesting adapter");
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: init.power_preference,
            compatible_surface,
            force_fallback_adapter: false,
        })
        .await
        .context("failed to find a suitable GPU adapter")?;

    log::info!("adapter: {:?}", adapter.get_info());
    Ok(adapter)
}

async fn request_device(
    adapter: &wgpu::Adapter,
    init: &ContextInit,
) -> Result<(wgpu::Device, wgpu::Queue)> {
    log::debug!("requesting device");
    let pair = adapter
        .request_device(&wgpu::DeviceDescriptor {
            label: Some("prism device"),
            required_features: init.required_features,
            required_limits: init.required_limits.clone(),
            experimental_features: wgpu::ExperimentalFeatures::disabled(),
            memory_hints: wgpu::MemoryHints::Performance,
            trace: wgpu::Trace::Off,
        })
        .await
        .context("failed to create wgpu device/queue")?;

    log::debug!("device obtained");
    Ok(pair)
}

fn create_offscreen_texture(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    size: PhysicalSize<u32>,
) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("prism offscreen target"),
        size: wgpu::Extent3d {
            width: size.width,
            height: size.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

fn logical_size(size: PhysicalSize<u32>, scale_factor: f64) -> Viewport {
    let logical = size.to_logical::<f64>(scale_factor);
    Viewport::new(logical.width as f32, logical.height as f32)
}

fn log_scaling(window: Viewport, canvas: PhysicalSize<u32>) {
    log::debug!(
        "scaling: window {}x{} (logical), canvas {}x{} (physical)",
        window.width,
        window.height,
        canvas.width,
        canvas.height
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{noop_context, triangle_source};
    use crate::shader::{vec3, ShaderError, VertexLayout};

    #[test]
    fn logical_size_divides_by_scale() {
        let v = logical_size(PhysicalSize::new(1600, 1200), 2.0);
        assert_eq!(v, Viewport::new(800.0, 600.0));
    }

    #[test]
    fn headless_context_reports_its_size() {
        let Some(ctx) = noop_context() else { return };

        assert_eq!(ctx.canvas_size(), PhysicalSize::new(800, 600));
        assert_eq!(ctx.window_size(), Viewport::new(800.0, 600.0));
        assert_eq!(ctx.scale_factor(), 1.0);
        assert!(ctx.window().is_none());
    }

    #[test]
    fn register_shader_queues_in_order() {
        let Some(mut ctx) = noop_context() else { return };

        ctx.register_shader(ShaderSource::new("").with_label("a"))
            .set_label("first");
        ctx.register_shader(ShaderSource::new("").with_label("b"))
            .set_label("second");

        assert_eq!(ctx.pending_shaders(), 2);
    }

    #[test]
    fn compile_all_drains_the_queue() {
        let Some(mut ctx) = noop_context() else { return };

        for label in ["one", "two"] {
            ctx.register_shader(triangle_source(label))
                .set_label(label)
                .layout(VertexLayout::create(vec3(0)));
        }

        let shaders = pollster::block_on(ctx.compile_all()).unwrap();

        assert_eq!(ctx.pending_shaders(), 0);
        assert_eq!(shaders.len(), 2);
        assert_eq!(shaders[0].label(), Some("one"));
        assert_eq!(shaders[1].label(), Some("two"));
        assert!(shaders.iter().all(Shader::is_compiled));
    }

    #[test]
    fn compile_all_fails_on_unlabelled_shader() {
        let Some(mut ctx) = noop_context() else { return };

        ctx.register_shader(triangle_source("src"));
        let err = pollster::block_on(ctx.compile_all()).unwrap_err();

        assert!(matches!(err.first, ShaderError::MissingLabel { .. }));
        assert_eq!(err.failed, 1);
        assert_eq!(ctx.pending_shaders(), 0);
    }

    #[test]
    fn compile_all_hands_back_the_whole_batch_on_failure() {
        let Some(mut ctx) = noop_context() else { return };

        ctx.register_shader(triangle_source("good"))
            .set_label("good")
            .layout(VertexLayout::create(vec3(0)));
        ctx.register_shader(triangle_source("bad"));

        let err = pollster::block_on(ctx.compile_all()).unwrap_err();

        assert_eq!(ctx.pending_shaders(), 0);
        assert_eq!(err.failed, 1);
        assert_eq!(err.shaders.len(), 2);
        assert_eq!(err.shaders[0].label(), Some("good"));
        assert!(err.shaders[0].is_compiled());
        assert!(err.shaders[0].pipeline().is_some());
        assert!(!err.shaders[1].is_compiled());
    }

    #[test]
    fn error_scopes_pop_clean_when_nothing_failed() {
        let Some(ctx) = noop_context() else { return };

        let scope = ctx.check_validation();
        assert_eq!(scope.filter(), wgpu::ErrorFilter::Validation);
        assert!(pollster::block_on(scope.pop()).is_none());
    }
}
