//! GPU resources for the quad grid and the per-frame draw.

use anyhow::Context as _;
use image::{Rgba, RgbaImage};
use prism_engine::assets::{Asset, AssetHandle, AssetLoader, Material};
use prism_engine::buffers::StorageBuffer;
use prism_engine::camera::{CAMERA_WGSL, GpuCamera};
use prism_engine::device::Context;
use prism_engine::shader::{Shader, ShaderSource, VertexLayout, vec2, vec3};
use wgpu::util::DeviceExt;

use crate::mesh;

pub const CHECKERBOARD_ID: &str = "checkerboard";

const QUAD_WGSL: &str = include_str!("shaders/quad.wgsl");

/// 8x8 tiles of 32 px, used when no texture could be loaded.
pub fn checkerboard() -> RgbaImage {
    RgbaImage::from_fn(256, 256, |x, y| {
        if (x / 32 + y / 32) % 2 == 0 {
            Rgba([235, 235, 235, 255])
        } else {
            Rgba([40, 40, 48, 255])
        }
    })
}

/// Registers and loads the quad texture.
///
/// `path` is tried first; if it is missing or cannot be decoded the
/// checkerboard is used instead.
pub async fn load_material(
    ctx: &Context,
    loader: &mut AssetLoader<Material>,
    path: Option<&str>,
) -> anyhow::Result<AssetHandle<Material>> {
    if let Some(path) = path {
        let handle = loader.add(Material::new(path));
        match loader.load(ctx).await {
            Ok(()) => return Ok(handle),
            Err(err) => log::warn!("{err:#}; falling back to {CHECKERBOARD_ID}"),
        }
    }

    let handle = loader.add(Material::from_image(CHECKERBOARD_ID, checkerboard()));
    if let Err(err) = loader.load(ctx).await {
        // The failed path is retried by every load; only the fallback matters.
        if !handle.asset(loader)?.loaded() {
            return Err(err);
        }
    }
    Ok(handle)
}

/// Everything needed to draw the instanced grid.
pub struct QuadScene {
    shader: Shader,
    positions: wgpu::Buffer,
    colors: wgpu::Buffer,
    tex_coords: wgpu::Buffer,
    indices: wgpu::Buffer,
    transform_group: wgpu::BindGroup,
    texture_group: wgpu::BindGroup,
    instances: u32,
}

impl QuadScene {
    pub async fn new(
        ctx: &mut Context,
        camera: &GpuCamera,
        material: &Material,
        transforms: &StorageBuffer,
    ) -> anyhow::Result<Self> {
        let device = ctx.device().clone();

        let positions = vertex_buffer(&device, "quad positions", &mesh::POSITIONS);
        let colors = vertex_buffer(&device, "quad colors", &mesh::COLORS);
        let tex_coords = vertex_buffer(&device, "quad tex coords", &mesh::TEX_COORDS);
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad indices"),
            contents: bytemuck::cast_slice(&mesh::INDICES),
            usage: wgpu::BufferUsages::INDEX,
        });

        let transform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("quad transforms"),
            contents: transforms.as_bytes(),
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
        });

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("transform"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Storage { read_only: true },
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let transform_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("transform"),
            layout: &transform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buffer.as_entire_binding(),
            }],
        });

        let view = material.view().context("material is not loaded")?;
        let sampler = material.sampler().context("material is not loaded")?;
        let texture_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("texture"),
            layout: &texture_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        let source = ShaderSource::compose(&[CAMERA_WGSL, QUAD_WGSL])
            .with_label("basic")
            .with_vertex_entry("vMain")
            .with_fragment_entry("fMain");

        ctx.register_shader(source)
            .set_label("quad")
            .bind_group(camera.bind_group_layout())
            .bind_group(&transform_layout)
            .bind_group(&texture_layout)
            .layout(VertexLayout::create(vec3(0)))
            .layout(VertexLayout::create(vec3(1)))
            .layout(VertexLayout::create(vec2(2)));

        let shader = ctx
            .compile_all()
            .await?
            .pop()
            .context("no shader came back from the batch compile")?;

        let instances = u32::try_from(transforms.count()).context("too many quad instances")?;

        Ok(Self {
            shader,
            positions,
            colors,
            tex_coords,
            indices,
            transform_group,
            texture_group,
            instances,
        })
    }

    /// Records the grid into a pass whose camera group is already bound.
    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        let Some(pipeline) = self.shader.pipeline() else {
            return;
        };

        pass.set_bind_group(1, &self.transform_group, &[]);
        pass.set_bind_group(2, &self.texture_group, &[]);
        pass.set_pipeline(pipeline);

        pass.set_vertex_buffer(0, self.positions.slice(..));
        pass.set_vertex_buffer(1, self.colors.slice(..));
        pass.set_vertex_buffer(2, self.tex_coords.slice(..));
        pass.set_index_buffer(self.indices.slice(..), wgpu::IndexFormat::Uint16);
        pass.draw_indexed(0..mesh::INDICES.len() as u32, 0, 0..self.instances);
    }
}

fn vertex_buffer(device: &wgpu::Device, label: &str, data: &[f32]) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents: bytemuck::cast_slice(data),
        usage: wgpu::BufferUsages::VERTEX,
    })
}
