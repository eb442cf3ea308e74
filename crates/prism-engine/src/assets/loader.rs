use std::collections::HashMap;
use std::future::Future;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::stream::{FuturesUnordered, StreamExt};

use super::AssetError;

pub type HandleId = String;

/// Something an [`AssetLoader`] can load.
///
/// `id` doubles as the cache key; two assets reporting the same id collide.
pub trait Asset {
    /// Whatever `load` needs from the outside, e.g. the GPU context.
    type Context;

    fn id(&self) -> &str;

    fn loaded(&self) -> bool;

    /// Loads the asset. On success `loaded` must report `true` afterwards.
    fn load(&mut self, ctx: &Self::Context) -> impl Future<Output = anyhow::Result<()>>;
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
struct LoaderId(u64);

impl LoaderId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lightweight reference to an asset owned by an [`AssetLoader`].
///
/// The handle remembers which loader issued it; it never owns the asset.
pub struct AssetHandle<A> {
    loader: LoaderId,
    id: HandleId,
    _asset: PhantomData<fn() -> A>,
}

impl<A> Clone for AssetHandle<A> {
    fn clone(&self) -> Self {
        Self {
            loader: self.loader,
            id: self.id.clone(),
            _asset: PhantomData,
        }
    }
}

impl<A> std::fmt::Debug for AssetHandle<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetHandle")
            .field("loader", &self.loader.0)
            .field("id", &self.id)
            .finish()
    }
}

impl<A: Asset> AssetHandle<A> {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn asset<'l>(&self, loader: &'l AssetLoader<A>) -> Result<&'l A, AssetError> {
        loader.get(self)
    }

    pub fn asset_mut<'l>(&self, loader: &'l mut AssetLoader<A>) -> Result<&'l mut A, AssetError> {
        loader.get_mut(self)
    }
}

/// Owns assets by id and loads the outstanding ones concurrently.
pub struct AssetLoader<A> {
    id: LoaderId,
    assets: HashMap<HandleId, A>,
    total: usize,
    loaded: usize,
}

impl<A: Asset> Default for AssetLoader<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Asset> AssetLoader<A> {
    pub fn new() -> Self {
        Self {
            id: LoaderId::next(),
            assets: HashMap::new(),
            total: 0,
            loaded: 0,
        }
    }

    /// Registers `asset` under its id and returns a handle to it.
    ///
    /// Every call counts toward [`total_count`](Self::total_count). An asset
    /// already registered under the same id is replaced, and handles to that
    /// id resolve to the new one.
    pub fn add(&mut self, asset: A) -> AssetHandle<A> {
        let id = asset.id().to_owned();

        self.total += 1;
        if asset.loaded() {
            self.loaded += 1;
        }
        if self.assets.insert(id.clone(), asset).is_some() {
            log::warn!("asset {id} already registered; replacing it");
        }

        self.handle(id)
    }

    /// A handle for `id` on this loader, whether or not `id` is registered.
    pub fn handle(&self, id: impl Into<HandleId>) -> AssetHandle<A> {
        AssetHandle {
            loader: self.id,
            id: id.into(),
            _asset: PhantomData,
        }
    }

    pub fn get(&self, handle: &AssetHandle<A>) -> Result<&A, AssetError> {
        self.check_owner(handle)?;
        self.assets.get(&handle.id).ok_or_else(|| AssetError::Missing {
            id: handle.id.clone(),
        })
    }

    pub fn get_mut(&mut self, handle: &AssetHandle<A>) -> Result<&mut A, AssetError> {
        self.check_owner(handle)?;
        self.assets
            .get_mut(&handle.id)
            .ok_or_else(|| AssetError::Missing {
                id: handle.id.clone(),
            })
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Number of [`add`](Self::add) calls, duplicates included.
    pub fn total_count(&self) -> usize {
        self.total
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded
    }

    /// Fraction of registered assets loaded so far; 0.0 when empty.
    pub fn progress(&self) -> f32 {
        match self.total_count() {
            0 => 0.0,
            total => self.loaded as f32 / total as f32,
        }
    }

    /// Loads every registered asset that is not loaded yet.
    ///
    /// All loads run to completion even if some fail; progress advances as
    /// each one succeeds. The first failure is returned once all are done.
    pub async fn load(&mut self, ctx: &A::Context) -> anyhow::Result<()> {
        let total = self.total;
        let mut pending: FuturesUnordered<_> = self
            .assets
            .values_mut()
            .filter(|asset| !asset.loaded())
            .map(|asset| async move {
                let id = asset.id().to_owned();
                let result = asset.load(ctx).await;
                (id, result)
            })
            .collect();

        log::info!("loading {} asset(s)", pending.len());

        let mut first_err = None;
        while let Some((id, result)) = pending.next().await {
            match result {
                Ok(()) => {
                    self.loaded += 1;
                    log::debug!("asset {id} loaded ({}/{total})", self.loaded);
                }
                Err(err) => {
                    log::error!("asset {id} failed to load: {err:#}");
                    first_err.get_or_insert(err.context(format!("failed to load asset {id}")));
                }
            }
        }

        first_err.map_or(Ok(()), Err)
    }

    fn check_owner(&self, handle: &AssetHandle<A>) -> Result<(), AssetError> {
        if handle.loader == self.id {
            Ok(())
        } else {
            Err(AssetError::ForeignLoader {
                id: handle.id.clone(),
            })
        }
    }
}
