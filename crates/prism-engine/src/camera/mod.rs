//! Cameras: a view/projection matrix pair kept in one buffer, optionally
//! mirrored into a GPU uniform.

mod buffer;
mod cpu;
mod gpu;
mod projection;

pub use buffer::CameraBuffer;
pub use cpu::{Camera, CameraControl};
pub use gpu::GpuCamera;
pub use projection::{
    Orthographic, Perspective, Projection, DEFAULT_FOV_DEGREES, PERSPECTIVE_FAR, PERSPECTIVE_NEAR,
};

/// WGSL declaration of the camera uniform at `@group(0) @binding(0)`.
///
/// Prepend it with [`ShaderSource::compose`](crate::shader::ShaderSource::compose).
pub const CAMERA_WGSL: &str = r"
struct Camera {
  view: mat4x4<f32>,
  projection: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> camera: Camera;
";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CameraError {
    #[error("field of view only applies to perspective cameras")]
    NotPerspective,
    #[error("bounds only apply to orthographic cameras")]
    NotOrthographic,
}
