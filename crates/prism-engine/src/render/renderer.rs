use winit::dpi::PhysicalSize;

use crate::camera::GpuCamera;
use crate::device::{Context, FrameTarget, SurfaceErrorAction};
use crate::shader::DEPTH_FORMAT;

/// Render-pass protocol violations and back-buffer failures.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("no render pass is active")]
    NoActivePass,
    #[error("a render pass is already active")]
    PassAlreadyActive,
    #[error("could not acquire the back buffer ({action:?})")]
    Surface {
        #[source]
        source: wgpu::SurfaceError,
        action: SurfaceErrorAction,
    },
}

/// Clear color of every pass unless changed with
/// [`Renderer::set_clear_color`].
pub const DEFAULT_CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 1.0,
    g: 0.0,
    b: 1.0,
    a: 1.0,
};

/// Drives one render pass per frame against the context's target.
///
/// The depth-stencil attachment is allocated once, at the canvas size seen by
/// [`Renderer::new`]. It is not reallocated when the window is resized.
#[derive(Debug)]
pub struct Renderer {
    clear_color: wgpu::Color,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    active: Option<ActivePass>,
}

/// Field order is drop order: the pass must end before its encoder goes.
#[derive(Debug)]
struct ActivePass {
    pass: wgpu::RenderPass<'static>,
    encoder: wgpu::CommandEncoder,
    frame: FrameTarget,
}

impl Renderer {
    pub fn new(ctx: &Context) -> Self {
        let size = ctx.canvas_size();
        let depth_texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
            label: Some("depth stencil buffer"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        let depth_view = depth_texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some("depth stencil view"),
            format: Some(DEPTH_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            ..Default::default()
        });

        log::debug!("depth stencil buffer {}x{}", size.width, size.height);

        Self {
            clear_color: DEFAULT_CLEAR_COLOR,
            depth_texture,
            depth_view,
            active: None,
        }
    }

    pub fn clear_color(&self) -> wgpu::Color {
        self.clear_color
    }

    pub fn set_clear_color(&mut self, color: wgpu::Color) -> &mut Self {
        self.clear_color = color;
        self
    }

    /// Size of the depth-stencil attachment in physical pixels.
    pub fn depth_size(&self) -> PhysicalSize<u32> {
        let size = self.depth_texture.size();
        PhysicalSize::new(size.width, size.height)
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The pass opened by the last [`begin_render_pass`](Self::begin_render_pass).
    pub fn pass_encoder(&mut self) -> Option<&mut wgpu::RenderPass<'static>> {
        self.active.as_mut().map(|active| &mut active.pass)
    }

    /// Opens a pass on this frame's back buffer and binds `camera`.
    ///
    /// Color is cleared to the clear color, depth to 1.0. Pipelines, other
    /// bind groups and buffers are the caller's to set on the returned pass.
    pub fn begin_render_pass(
        &mut self,
        ctx: &Context,
        camera: &GpuCamera,
    ) -> Result<&mut wgpu::RenderPass<'static>, RenderError> {
        if self.active.is_some() {
            return Err(RenderError::PassAlreadyActive);
        }

        let frame = ctx.acquire_frame().map_err(|source| RenderError::Surface {
            action: ctx.handle_surface_error(source.clone()),
            source,
        })?;

        let mut encoder = ctx
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        let mut pass = encoder
            .begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(0),
                        store: wgpu::StoreOp::Discard,
                    }),
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            })
            .forget_lifetime();

        pass.set_bind_group(camera.bind_group_index(), camera.bind_group(), &[]);

        let active = self.active.insert(ActivePass {
            pass,
            encoder,
            frame,
        });
        Ok(&mut active.pass)
    }

    /// Ends the active pass, submits its commands and presents the frame.
    pub fn end_render_pass(&mut self, ctx: &Context) -> Result<(), RenderError> {
        let ActivePass {
            pass,
            encoder,
            frame,
        } = self.active.take().ok_or(RenderError::NoActivePass)?;

        drop(pass);
        ctx.queue().submit(std::iter::once(encoder.finish()));
        ctx.present(frame);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::noop_context;

    #[test]
    fn end_without_begin_is_an_error() {
        let Some(ctx) = noop_context() else { return };

        let mut renderer = Renderer::new(&ctx);
        let err = renderer.end_render_pass(&ctx).unwrap_err();

        assert!(matches!(err, RenderError::NoActivePass));
        assert!(renderer.pass_encoder().is_none());
    }

    #[test]
    fn depth_buffer_matches_canvas_at_construction() {
        let Some(ctx) = noop_context() else { return };

        let renderer = Renderer::new(&ctx);

        assert_eq!(renderer.depth_size(), ctx.canvas_size());
        assert_eq!(renderer.clear_color(), DEFAULT_CLEAR_COLOR);
    }

    #[test]
    fn begin_and_end_one_frame() {
        let Some(ctx) = noop_context() else { return };

        let camera = GpuCamera::perspective(&ctx, None);
        camera.upload(ctx.queue());

        let mut renderer = Renderer::new(&ctx);
        renderer.set_clear_color(wgpu::Color::BLACK);

        renderer.begin_render_pass(&ctx, &camera).unwrap();
        assert!(renderer.is_active());
        assert!(renderer.pass_encoder().is_some());

        let err = renderer.begin_render_pass(&ctx, &camera).unwrap_err();
        assert!(matches!(err, RenderError::PassAlreadyActive));

        renderer.end_render_pass(&ctx).unwrap();
        assert!(!renderer.is_active());
        assert!(matches!(
            renderer.end_render_pass(&ctx),
            Err(RenderError::NoActivePass)
        ));
    }
}
