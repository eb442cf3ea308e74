//! Fixtures for tests that need a live device.

use super::{Context, ContextInit};
use crate::shader::ShaderSource;

/// Headless 800x600 context on the no-op backend.
///
/// Returns `None` when the platform offers no such adapter, so callers can
/// skip instead of failing.
pub(crate) fn noop_context() -> Option<Context> {
    let init = ContextInit {
        backends: wgpu::Backends::NOOP,
        ..ContextInit::default()
    };

    match pollster::block_on(Context::headless(init, 800, 600)) {
        Ok(ctx) => Some(ctx),
        Err(err) => {
            log::warn!("no-op adapter unavailable, skipping: {err:#}");
            None
        }
    }
}

pub(crate) const TRIANGLE_WGSL: &str = r"
struct VertexOutput {
  @builtin(position) position: vec4<f32>,
}

@vertex
fn vertexMain(@location(0) pos: vec3<f32>) -> VertexOutput {
  var out: VertexOutput;
  out.position = vec4<f32>(pos, 1.0);
  return out;
}

@fragment
fn fragmentMain() -> @location(0) vec4<f32> {
  return vec4<f32>(1.0, 1.0, 1.0, 1.0);
}
";

/// Labelled source for a single-attribute triangle pipeline.
pub(crate) fn triangle_source(label: &str) -> ShaderSource {
    ShaderSource::new(TRIANGLE_WGSL).with_label(label)
}
