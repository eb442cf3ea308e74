use std::ops::{Deref, DerefMut};

use glam::Vec3;

use crate::coords::Viewport;
use crate::device::Context;

use super::{Camera, CameraBuffer, CameraControl};

/// A [`Camera`] with a uniform buffer and the bind group exposing it to the
/// vertex stage.
///
/// Matrix changes stay on the CPU until [`upload`](Self::upload) runs.
#[derive(Debug)]
pub struct GpuCamera {
    camera: Camera,
    uniform_buffer: wgpu::Buffer,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    bind_group_index: u32,
}

impl GpuCamera {
    pub fn new(ctx: &Context, camera: Camera) -> Self {
        let device = ctx.device();

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera uniform buffer"),
            size: CameraBuffer::byte_length(),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(CameraBuffer::byte_length()),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("camera bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        log::debug!("camera uniform buffer created");

        Self {
            camera,
            uniform_buffer,
            bind_group_layout,
            bind_group,
            bind_group_index: 0,
        }
    }

    /// Perspective camera sized to the context's window.
    pub fn perspective(ctx: &Context, fov_degrees: Option<f32>) -> Self {
        Self::new(ctx, Camera::perspective(fov_degrees, ctx.window_size()))
    }

    pub fn orthographic(ctx: &Context) -> Self {
        Self::new(ctx, Camera::orthographic(ctx.window_size()))
    }

    pub fn uniform_buffer(&self) -> &wgpu::Buffer {
        &self.uniform_buffer
    }

    pub fn bind_group_layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// The `@group` index the renderer binds the camera at.
    pub fn bind_group_index(&self) -> u32 {
        self.bind_group_index
    }

    pub fn set_bind_group_index(&mut self, index: u32) -> &mut Self {
        self.bind_group_index = index;
        self
    }

    /// Writes both matrices into the uniform buffer.
    pub fn upload(&self, queue: &wgpu::Queue) {
        queue.write_buffer(&self.uniform_buffer, 0, self.camera.buffer().as_bytes());
    }
}

impl Deref for GpuCamera {
    type Target = Camera;

    fn deref(&self) -> &Camera {
        &self.camera
    }
}

impl DerefMut for GpuCamera {
    fn deref_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }
}

impl CameraControl for GpuCamera {
    fn init_projection(&mut self, window: Viewport) {
        self.camera.init_projection(window);
    }

    fn recalculate(&mut self) {
        self.camera.recalculate();
    }

    fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.camera.translate(delta);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::noop_context;

    #[test]
    fn perspective_camera_uses_window_aspect() {
        let Some(ctx) = noop_context() else { return };

        let camera = GpuCamera::perspective(&ctx, None);
        let expected = Camera::perspective(None, Viewport::new(800.0, 600.0));

        assert_eq!(*camera, expected);
        assert_eq!(camera.bind_group_index(), 0);
        assert_eq!(camera.uniform_buffer().size(), 128);
    }

    #[test]
    fn translate_through_wrapper_moves_inner_camera() {
        let Some(ctx) = noop_context() else { return };

        let mut camera = GpuCamera::orthographic(&ctx);
        camera.translate(Vec3::Z).set_bind_group_index(2);

        assert_eq!(camera.position(), Vec3::Z);
        assert_eq!(camera.bind_group_index(), 2);
        camera.upload(ctx.queue());
    }
}
