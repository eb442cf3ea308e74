/// Scalar/vector shape of one vertex attribute.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum VertexAttributeType {
    Float,
    Vec2,
    Vec3,
    Vec4,
}

impl VertexAttributeType {
    /// Size in bytes of one attribute of this type.
    pub const fn size(self) -> u64 {
        match self {
            Self::Float => 4,
            Self::Vec2 => 4 * 2,
            Self::Vec3 => 4 * 3,
            Self::Vec4 => 4 * 4,
        }
    }

    /// Wire format the pipeline reads this attribute with.
    pub const fn format(self) -> wgpu::VertexFormat {
        match self {
            Self::Float => wgpu::VertexFormat::Float32,
            Self::Vec2 => wgpu::VertexFormat::Float32x2,
            Self::Vec3 => wgpu::VertexFormat::Float32x3,
            Self::Vec4 => wgpu::VertexFormat::Float32x4,
        }
    }
}

/// One attribute bound to a shader `@location`.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VertexAttribute {
    pub ty: VertexAttributeType,
    pub location: u32,
    pub count: u32,
}

impl VertexAttribute {
    pub const fn new(ty: VertexAttributeType, location: u32, count: u32) -> Self {
        Self { ty, location, count }
    }

    #[inline]
    pub const fn size(&self) -> u64 {
        self.ty.size()
    }

    #[inline]
    pub const fn format(&self) -> wgpu::VertexFormat {
        self.ty.format()
    }
}

pub const fn float(location: u32) -> VertexAttribute {
    VertexAttribute::new(VertexAttributeType::Float, location, 1)
}

pub const fn vec2(location: u32) -> VertexAttribute {
    VertexAttribute::new(VertexAttributeType::Vec2, location, 1)
}

pub const fn vec3(location: u32) -> VertexAttribute {
    VertexAttribute::new(VertexAttributeType::Vec3, location, 1)
}

pub const fn vec4(location: u32) -> VertexAttribute {
    VertexAttribute::new(VertexAttributeType::Vec4, location, 1)
}

/// Memory layout of one vertex buffer.
///
/// Attribute order matters: offsets are assigned as the running byte sum in
/// insertion order and must match the shader's input declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct VertexLayout {
    attributes: Vec<VertexAttribute>,
    step_mode: wgpu::VertexStepMode,
}

impl Default for VertexLayout {
    fn default() -> Self {
        Self {
            attributes: Vec::new(),
            step_mode: wgpu::VertexStepMode::Vertex,
        }
    }
}

impl VertexLayout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layout holding a single attribute.
    pub fn create(attribute: VertexAttribute) -> Self {
        let mut layout = Self::new();
        layout.add(attribute);
        layout
    }

    pub fn from_attributes(attributes: impl IntoIterator<Item = VertexAttribute>) -> Self {
        let mut layout = Self::new();
        layout.extend(attributes);
        layout
    }

    pub fn add(&mut self, attribute: VertexAttribute) -> &mut Self {
        self.attributes.push(attribute);
        self
    }

    pub fn extend(&mut self, attributes: impl IntoIterator<Item = VertexAttribute>) -> &mut Self {
        self.attributes.extend(attributes);
        self
    }

    /// Sets whether the buffer advances per vertex or per instance.
    pub fn mode(mut self, step_mode: wgpu::VertexStepMode) -> Self {
        self.step_mode = step_mode;
        self
    }

    pub fn attributes(&self) -> &[VertexAttribute] {
        &self.attributes
    }

    pub fn step_mode(&self) -> wgpu::VertexStepMode {
        self.step_mode
    }

    /// Computes offsets and stride from the current attribute list.
    ///
    /// Nothing is cached; call again after adding attributes.
    pub fn calculate(&self) -> CalculatedLayout {
        let mut offset = 0;
        let attributes = self
            .attributes
            .iter()
            .map(|attribute| {
                let out = wgpu::VertexAttribute {
                    format: attribute.format(),
                    offset,
                    shader_location: attribute.location,
                };
                offset += attribute.size();
                out
            })
            .collect();

        CalculatedLayout {
            attributes,
            array_stride: offset,
            step_mode: self.step_mode,
        }
    }
}

/// Owned result of [`VertexLayout::calculate`].
///
/// `wgpu::VertexBufferLayout` borrows its attribute slice, so this type keeps
/// the attributes alive for the duration of pipeline creation.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculatedLayout {
    pub attributes: Vec<wgpu::VertexAttribute>,
    pub array_stride: wgpu::BufferAddress,
    pub step_mode: wgpu::VertexStepMode,
}

impl CalculatedLayout {
    pub fn buffer_layout(&self) -> wgpu::VertexBufferLayout<'_> {
        wgpu::VertexBufferLayout {
            array_stride: self.array_stride,
            step_mode: self.step_mode,
            attributes: &self.attributes,
        }
    }

    pub fn offsets(&self) -> Vec<wgpu::BufferAddress> {
        self.attributes.iter().map(|a| a.offset).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_sizes_and_formats() {
        assert_eq!(float(0).size(), 4);
        assert_eq!(vec2(0).size(), 8);
        assert_eq!(vec3(0).size(), 12);
        assert_eq!(vec4(0).size(), 16);

        assert_eq!(float(0).format(), wgpu::VertexFormat::Float32);
        assert_eq!(vec2(0).format(), wgpu::VertexFormat::Float32x2);
        assert_eq!(vec3(0).format(), wgpu::VertexFormat::Float32x3);
        assert_eq!(vec4(0).format(), wgpu::VertexFormat::Float32x4);
    }

    #[test]
    fn vec3_then_vec2() {
        let layout = VertexLayout::from_attributes([vec3(0), vec2(1)]);
        let calc = layout.calculate();

        assert_eq!(calc.offsets(), vec![0, 12]);
        assert_eq!(calc.array_stride, 20);
        assert_eq!(calc.attributes[0].shader_location, 0);
        assert_eq!(calc.attributes[1].shader_location, 1);
        assert_eq!(calc.attributes[1].format, wgpu::VertexFormat::Float32x2);
    }

    #[test]
    fn offsets_start_at_zero_and_increase() {
        let layout = VertexLayout::from_attributes([vec4(3), float(1), vec3(0), vec2(2)]);
        let calc = layout.calculate();
        let offsets = calc.offsets();

        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));

        let total: u64 = layout.attributes().iter().map(VertexAttribute::size).sum();
        assert_eq!(calc.array_stride, total);

        // insertion order, not location order
        let locations: Vec<u32> = calc.attributes.iter().map(|a| a.shader_location).collect();
        assert_eq!(locations, vec![3, 1, 0, 2]);
    }

    #[test]
    fn recalculates_after_mutation() {
        let mut layout = VertexLayout::create(vec3(0));
        assert_eq!(layout.calculate().array_stride, 12);

        layout.add(vec4(1));
        assert_eq!(layout.calculate().array_stride, 28);
    }

    #[test]
    fn step_mode_defaults_to_vertex() {
        let layout = VertexLayout::create(float(0));
        assert_eq!(layout.calculate().step_mode, wgpu::VertexStepMode::Vertex);

        let instanced = layout.mode(wgpu::VertexStepMode::Instance);
        let calc = instanced.calculate();
        assert_eq!(calc.buffer_layout().step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn empty_layout_has_zero_stride() {
        let calc = VertexLayout::new().calculate();
        assert!(calc.attributes.is_empty());
        assert_eq!(calc.array_stride, 0);
    }
}
