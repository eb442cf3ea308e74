//! Asset loading: textures and the loader that tracks them.

mod fetch;
mod loader;
mod material;

pub use fetch::{Fetch, FileFetch};
pub use loader::{Asset, AssetHandle, AssetLoader, HandleId};
pub use material::{Material, MATERIAL_FORMAT};

/// Failed handle lookups.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssetError {
    #[error("no asset registered under {id:?}")]
    Missing { id: HandleId },
    #[error("handle for {id:?} was issued by a different loader")]
    ForeignLoader { id: HandleId },
}
