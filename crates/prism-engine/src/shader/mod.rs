//! Shader text, vertex layouts and the pipelines built from them.

mod pipeline;
mod source;
mod vertex_layout;

pub use pipeline::{Shader, DEPTH_FORMAT};
pub use source::{ShaderSource, DEFAULT_FRAGMENT_ENTRY, DEFAULT_VERTEX_ENTRY};
pub use vertex_layout::{
    float, vec2, vec3, vec4, CalculatedLayout, VertexAttribute, VertexAttributeType, VertexLayout,
};

/// Errors returned when a shader cannot be compiled at all.
///
/// WGSL and pipeline validation failures are not reported here; they are
/// logged when the device reports them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShaderError {
    #[error("{kind} must have a label before it is compiled")]
    MissingLabel { kind: &'static str },
}

/// Returned by [`Context::compile_all`](crate::device::Context::compile_all)
/// when at least one shader of the batch could not be compiled.
///
/// Every shader of the batch is handed back in registration order, compiled
/// or not, so the ones that succeeded stay usable.
#[derive(Debug, thiserror::Error)]
#[error("{failed} of {} shader(s) failed to compile", .shaders.len())]
pub struct BatchCompileError {
    pub shaders: Vec<Shader>,
    pub failed: usize,
    #[source]
    pub first: ShaderError,
}
