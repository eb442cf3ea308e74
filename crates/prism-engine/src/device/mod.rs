//! GPU device + presentation management.
//!
//! This module is responsible for:
//! - acquiring the wgpu Adapter/Device/Queue
//! - creating & configuring the Surface (or an offscreen target)
//! - queueing shaders for one batched compile
//! - routing deferred GPU errors into the log

mod context;
pub mod errors;
mod init;
mod surface;

#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub(crate) use context::FrameTarget;
pub use errors::ErrorScope;
pub use init::ContextInit;
pub use surface::SurfaceErrorAction;
