//! Per-frame render-pass orchestration.

mod renderer;

pub use renderer::{RenderError, Renderer, DEFAULT_CLEAR_COLOR};
