use std::sync::Arc;
use std::time::Instant;

use anyhow::Context as _;
use image::RgbaImage;

use crate::device::Context;

use super::{Asset, Fetch, FileFetch};

/// Format textures are uploaded in.
pub const MATERIAL_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

enum Source {
    Fetched(Arc<dyn Fetch>),
    Decoded(RgbaImage),
}

impl std::fmt::Debug for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fetched(_) => f.write_str("Fetched"),
            Self::Decoded(img) => write!(f, "Decoded({}x{})", img.width(), img.height()),
        }
    }
}

#[derive(Debug)]
struct Gpu {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
}

/// A sampled 2D texture identified by its source string.
///
/// Nothing touches the GPU until [`load`](Asset::load) runs.
#[derive(Debug)]
pub struct Material {
    src: String,
    source: Source,
    gpu: Option<Gpu>,
}

impl Material {
    /// Material whose source is a file path.
    pub fn new(src: impl Into<String>) -> Self {
        Self::with_fetch(src, FileFetch)
    }

    /// Material whose bytes come from `fetch`.
    pub fn with_fetch(src: impl Into<String>, fetch: impl Fetch + 'static) -> Self {
        Self {
            src: src.into(),
            source: Source::Fetched(Arc::new(fetch)),
            gpu: None,
        }
    }

    /// Material built from pixels that are already decoded.
    pub fn from_image(id: impl Into<String>, image: RgbaImage) -> Self {
        Self {
            src: id.into(),
            source: Source::Decoded(image),
            gpu: None,
        }
    }

    /// Builds a file-backed material and loads it.
    pub async fn init(ctx: &Context, src: impl Into<String>) -> anyhow::Result<Self> {
        let mut material = Self::new(src);
        material.load(ctx).await?;
        Ok(material)
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn texture(&self) -> Option<&wgpu::Texture> {
        self.gpu.as_ref().map(|gpu| &gpu.texture)
    }

    pub fn view(&self) -> Option<&wgpu::TextureView> {
        self.gpu.as_ref().map(|gpu| &gpu.view)
    }

    pub fn sampler(&self) -> Option<&wgpu::Sampler> {
        self.gpu.as_ref().map(|gpu| &gpu.sampler)
    }

    fn pixels(&self) -> anyhow::Result<std::borrow::Cow<'_, RgbaImage>> {
        match &self.source {
            Source::Decoded(image) => Ok(std::borrow::Cow::Borrowed(image)),
            Source::Fetched(fetch) => {
                let bytes = fetch.fetch(&self.src)?;
                log::debug!("material {} fetched {} bytes", self.src, bytes.len());

                let image = image::load_from_memory(&bytes)
                    .with_context(|| format!("failed to decode {}", self.src))?;
                Ok(std::borrow::Cow::Owned(image.to_rgba8()))
            }
        }
    }

    fn upload(&self, ctx: &Context, image: &RgbaImage) -> Gpu {
        let (width, height) = image.dimensions();
        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let texture = ctx.device().create_texture(&wgpu::TextureDescriptor {
            label: Some(&self.src),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: MATERIAL_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });

        log::debug!("copying {width}x{height} image to texture {}", self.src);
        ctx.queue().write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(&self.src),
            format: Some(MATERIAL_FORMAT),
            dimension: Some(wgpu::TextureViewDimension::D2),
            aspect: wgpu::TextureAspect::All,
            base_mip_level: 0,
            mip_level_count: Some(1),
            base_array_layer: 0,
            array_layer_count: Some(1),
            ..Default::default()
        });

        let sampler = ctx.device().create_sampler(&wgpu::SamplerDescriptor {
            label: Some(&self.src),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Nearest,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            anisotropy_clamp: 1,
            ..Default::default()
        });

        Gpu {
            texture,
            view,
            sampler,
        }
    }
}

impl Asset for Material {
    type Context = Context;

    fn id(&self) -> &str {
        &self.src
    }

    fn loaded(&self) -> bool {
        self.gpu.is_some()
    }

    /// Fetches, decodes and uploads the texture.
    ///
    /// Fetch and decode failures are returned. GPU validation failures are
    /// only logged, and the material still counts as loaded.
    async fn load(&mut self, ctx: &Context) -> anyhow::Result<()> {
        let started = Instant::now();
        log::debug!("loading material {}", self.src);

        let image = self.pixels()?;

        let scope = ctx.check_validation();
        let gpu = self.upload(ctx, &image);
        scope
            .report(&format!("error occurred creating texture {}", self.src))
            .await;

        drop(image);
        self.gpu = Some(gpu);

        log::info!("material {} loaded in {:?}", self.src, started.elapsed());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgba};

    use super::*;
    use crate::assets::AssetLoader;
    use crate::device::testing::noop_context;

    fn checker() -> RgbaImage {
        RgbaImage::from_fn(4, 2, |x, y| {
            if (x + y) % 2 == 0 {
                Rgba([255, 255, 255, 255])
            } else {
                Rgba([0, 0, 0, 255])
            }
        })
    }

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        checker()
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn id_is_the_source() {
        let material = Material::new("textures/wall.png");
        assert_eq!(material.id(), "textures/wall.png");
        assert!(!material.loaded());
        assert!(material.texture().is_none());
    }

    #[test]
    fn decoded_image_uploads_at_its_size() {
        let Some(ctx) = noop_context() else { return };

        let mut material = Material::from_image("checker", checker());
        pollster::block_on(material.load(&ctx)).unwrap();

        assert!(material.loaded());
        let texture = material.texture().unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
        assert_eq!(texture.format(), MATERIAL_FORMAT);
        assert!(material.view().is_some());
        assert!(material.sampler().is_some());
    }

    #[test]
    fn fetched_bytes_are_decoded() {
        let Some(ctx) = noop_context() else { return };

        let bytes = png_bytes();
        let mut material = Material::with_fetch("mem://checker.png", move |_: &str| -> anyhow::Result<Vec<u8>> {
            Ok(bytes.clone())
        });
        pollster::block_on(material.load(&ctx)).unwrap();

        let texture = material.texture().unwrap();
        assert_eq!((texture.width(), texture.height()), (4, 2));
    }

    #[test]
    fn undecodable_bytes_leave_material_unloaded() {
        let Some(ctx) = noop_context() else { return };

        let mut material =
            Material::with_fetch("mem://garbage", |_: &str| -> anyhow::Result<Vec<u8>> {
                Ok(vec![1, 2, 3, 4])
            });
        let err = pollster::block_on(material.load(&ctx)).unwrap_err();

        assert!(format!("{err:#}").contains("mem://garbage"));
        assert!(!material.loaded());
    }

    #[test]
    fn loader_tracks_material_progress() {
        let Some(ctx) = noop_context() else { return };

        let mut loader = AssetLoader::new();
        let good = loader.add(Material::from_image("checker", checker()));
        loader.add(Material::new("does/not/exist.png"));

        assert!(pollster::block_on(loader.load(&ctx)).is_err());

        assert_eq!(loader.progress(), 0.5);
        assert!(good.asset(&loader).unwrap().loaded());
    }
}
