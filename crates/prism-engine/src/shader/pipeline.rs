use crate::device::Context;

use super::{ShaderError, ShaderSource, VertexLayout};

/// Depth format shared by every pipeline and the renderer's depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24PlusStencil8;

/// A [`ShaderSource`] plus the resource and vertex layouts it is drawn with,
/// compiled once into a render pipeline.
///
/// Bind-group layouts are bound in push order (`@group(0)`, `@group(1)`, ...);
/// vertex layouts map to vertex buffer slots in push order.
#[derive(Debug)]
pub struct Shader {
    source: ShaderSource,
    label: Option<String>,
    bind_group_layouts: Vec<wgpu::BindGroupLayout>,
    vertex_layouts: Vec<VertexLayout>,
    pipeline: Option<wgpu::RenderPipeline>,
}

impl Shader {
    pub fn new(source: ShaderSource) -> Self {
        Self {
            source,
            label: None,
            bind_group_layouts: Vec::new(),
            vertex_layouts: Vec::new(),
            pipeline: None,
        }
    }

    pub fn set_label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    /// Appends the layout for the next bind-group index.
    pub fn bind_group(&mut self, layout: &wgpu::BindGroupLayout) -> &mut Self {
        self.bind_group_layouts.push(layout.clone());
        self
    }

    /// Appends the layout for the next vertex buffer slot.
    pub fn layout(&mut self, layout: VertexLayout) -> &mut Self {
        self.vertex_layouts.push(layout);
        self
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn source(&self) -> &ShaderSource {
        &self.source
    }

    pub fn vertex_layouts(&self) -> &[VertexLayout] {
        &self.vertex_layouts
    }

    pub fn pipeline(&self) -> Option<&wgpu::RenderPipeline> {
        self.pipeline.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.pipeline.is_some()
    }

    /// Compiles the source and builds the render pipeline.
    ///
    /// Only the first call does any device work; later calls return the
    /// pipeline built by the first one.
    pub async fn compile(&mut self, ctx: &Context) -> Result<&wgpu::RenderPipeline, ShaderError> {
        let label = self
            .label
            .clone()
            .ok_or(ShaderError::MissingLabel { kind: "Shader" })?;

        let pipeline = match self.pipeline.take() {
            Some(pipeline) => pipeline,
            None => self.build_pipeline(ctx, &label).await?,
        };

        Ok(self.pipeline.insert(pipeline))
    }

    async fn build_pipeline(
        &mut self,
        ctx: &Context,
        label: &str,
    ) -> Result<wgpu::RenderPipeline, ShaderError> {
        let module = self.source.compile(ctx).await?.clone();
        let device = ctx.device();

        log::debug!("building pipeline {label}");

        let bind_group_layouts: Vec<&wgpu::BindGroupLayout> =
            self.bind_group_layouts.iter().collect();
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &bind_group_layouts,
            immediate_size: 0,
        });

        // Buffer layouts borrow their attribute arrays; keep them alive here.
        let calculated: Vec<_> = self.vertex_layouts.iter().map(VertexLayout::calculate).collect();
        let buffers: Vec<wgpu::VertexBufferLayout<'_>> =
            calculated.iter().map(|layout| layout.buffer_layout()).collect();

        let scope = ctx.check_validation();
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &module,
                entry_point: Some(self.source.vertex_entry()),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &module,
                entry_point: Some(self.source.fragment_entry()),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: ctx.surface_format(),
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },

            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        });
        scope.report(&format!("pipeline {label}")).await;

        log::info!("shader {label} compiled");
        Ok(pipeline)
    }
}
