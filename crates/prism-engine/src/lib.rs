//! prism engine crate.
//!
//! A thin retained-mode layer over wgpu: a [`device::Context`] owning the
//! adapter, device and presentation target; shaders compiled in one batch;
//! cameras mirrored into uniform buffers; a [`render::Renderer`] driving one
//! pass per frame; and textures loaded through an [`assets::AssetLoader`].

pub mod assets;
pub mod buffers;
pub mod camera;
pub mod coords;
pub mod device;
pub mod logging;
pub mod render;
pub mod shader;
