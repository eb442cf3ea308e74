use crate::device::{errors, Context};

use super::ShaderError;

pub const DEFAULT_VERTEX_ENTRY: &str = "vertexMain";
pub const DEFAULT_FRAGMENT_ENTRY: &str = "fragmentMain";

/// WGSL text plus the entry points a pipeline should use from it.
///
/// The text is compiled into a `wgpu::ShaderModule` the first time
/// [`compile`](Self::compile) runs; later calls return the cached module.
#[derive(Debug, Clone)]
pub struct ShaderSource {
    source: String,
    label: Option<String>,
    vertex_entry: String,
    fragment_entry: String,
    module: Option<wgpu::ShaderModule>,
}

impl ShaderSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            label: None,
            vertex_entry: DEFAULT_VERTEX_ENTRY.to_string(),
            fragment_entry: DEFAULT_FRAGMENT_ENTRY.to_string(),
            module: None,
        }
    }

    /// Concatenates snippets into one source, e.g. a shared uniform
    /// declaration followed by the stage functions.
    pub fn compose(parts: &[&str]) -> Self {
        Self::new(parts.concat())
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_vertex_entry(mut self, name: impl Into<String>) -> Self {
        self.vertex_entry = name.into();
        self
    }

    pub fn with_fragment_entry(mut self, name: impl Into<String>) -> Self {
        self.fragment_entry = name.into();
        self
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn vertex_entry(&self) -> &str {
        &self.vertex_entry
    }

    pub fn fragment_entry(&self) -> &str {
        &self.fragment_entry
    }

    /// The compiled module, once [`compile`](Self::compile) has run.
    pub fn module(&self) -> Option<&wgpu::ShaderModule> {
        self.module.as_ref()
    }

    pub fn is_compiled(&self) -> bool {
        self.module.is_some()
    }

    /// Compiles the source into a shader module.
    ///
    /// Compiler diagnostics are logged, not returned: a source with WGSL
    /// errors still yields a (invalid) module.
    pub async fn compile(&mut self, ctx: &Context) -> Result<&wgpu::ShaderModule, ShaderError> {
        let label = self
            .label
            .clone()
            .ok_or(ShaderError::MissingLabel { kind: "ShaderSource" })?;

        let module = match self.module.take() {
            Some(module) => module,
            None => self.create_module(ctx, &label).await,
        };

        Ok(self.module.insert(module))
    }

    async fn create_module(&self, ctx: &Context, label: &str) -> wgpu::ShaderModule {
        log::debug!("compiling shader source {label}");

        let scope = ctx.check_internal();
        let module = ctx
            .device()
            .create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(label),
                source: wgpu::ShaderSource::Wgsl(self.source.as_str().into()),
            });
        scope.report(&format!("shader {label}")).await;

        errors::log_compilation_info(&module, label).await;
        module
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::testing::{noop_context, triangle_source};

    #[test]
    fn entry_points_default_and_override() {
        let src = ShaderSource::new("");
        assert_eq!(src.vertex_entry(), "vertexMain");
        assert_eq!(src.fragment_entry(), "fragmentMain");

        let src = src.with_vertex_entry("vMain").with_fragment_entry("fMain");
        assert_eq!(src.vertex_entry(), "vMain");
        assert_eq!(src.fragment_entry(), "fMain");
    }

    #[test]
    fn compose_concatenates_in_order() {
        let src = ShaderSource::compose(&["struct A {}\n", "fn main() {}\n"]);
        assert_eq!(src.source(), "struct A {}\nfn main() {}\n");
        assert!(src.label().is_none());
    }

    #[test]
    fn compile_requires_a_label() {
        let Some(ctx) = noop_context() else { return };

        let mut src = ShaderSource::new("");
        let err = pollster::block_on(src.compile(&ctx)).unwrap_err();

        assert_eq!(err, ShaderError::MissingLabel { kind: "ShaderSource" });
        assert!(!src.is_compiled());
    }

    #[test]
    fn compile_caches_the_module() {
        let Some(ctx) = noop_context() else { return };

        let mut src = triangle_source("triangle");
        let first = pollster::block_on(src.compile(&ctx)).unwrap().clone();
        let second = pollster::block_on(src.compile(&ctx)).unwrap().clone();

        assert!(src.is_compiled());
        assert_eq!(first, second);
    }
}
