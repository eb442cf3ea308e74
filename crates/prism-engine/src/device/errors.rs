//! Deferred GPU diagnostics.
//!
//! wgpu reports most errors asynchronously. This module wraps the three ways
//! they surface:
//! - error scopes, pushed around a group of calls and popped later
//! - shader compilation info, queried after module creation
//! - the device-wide uncaptured error callback
//!
//! All of them log; none of them turn a GPU error into an `Err`.

use std::future::Future;
use std::sync::Arc;

/// A pushed error scope awaiting its pop.
///
/// Scopes are thread-local and strictly nested. [`pop`](Self::pop) and
/// [`report`](Self::report) take the scope off the stack as soon as they are
/// called, so only the returned future outlives the call; it may be held
/// across `.await` points while other scopes are pushed.
#[must_use = "error scopes must be popped"]
pub struct ErrorScope {
    filter: wgpu::ErrorFilter,
    guard: wgpu::ErrorScopeGuard,
}

impl ErrorScope {
    pub(crate) fn push(device: &wgpu::Device, filter: wgpu::ErrorFilter) -> Self {
        Self {
            filter,
            guard: device.push_error_scope(filter),
        }
    }

    pub fn filter(&self) -> wgpu::ErrorFilter {
        self.filter
    }

    /// Pops the scope now and resolves to the first error captured inside it.
    pub fn pop(self) -> impl Future<Output = Option<wgpu::Error>> {
        self.guard.pop()
    }

    /// Pops the scope now and logs a captured error against `what`.
    ///
    /// Resolves to `true` when an error was captured.
    pub fn report(self, what: &str) -> impl Future<Output = bool> + use<> {
        let filter = self.filter;
        let what = what.to_owned();
        let popped = self.pop();

        async move {
            match popped.await {
                Some(err) => {
                    log::error!("{what}: {filter:?} error: {err}");
                    true
                }
                None => false,
            }
        }
    }
}

/// Logs every message the compiler attached to `module`.
pub async fn log_compilation_info(module: &wgpu::ShaderModule, label: &str) {
    let info = module.get_compilation_info().await;

    for message in &info.messages {
        let (line, pos) = message
            .location
            .map_or((0, 0), |loc| (loc.line_number, loc.line_position));

        match message.message_type {
            wgpu::CompilationMessageType::Info => {
                log::info!("[INFO] {label}: {} ({line}:{pos})", message.message);
            }
            wgpu::CompilationMessageType::Warning => {
                log::warn!("[WARNING] {label}: {} ({line}:{pos})", message.message);
            }
            wgpu::CompilationMessageType::Error => {
                log::error!("[ERROR] {label}: {} ({line}:{pos})", message.message);
            }
        }
    }
}

/// Logs errors that no active scope claimed.
pub(crate) fn install_uncaptured_handler(device: &wgpu::Device) {
    device.on_uncaptured_error(Arc::new(|error: wgpu::Error| {
        log::error!("uncaptured wgpu error: {error}");
    }));
}

#[cfg(test)]
mod tests {
    use crate::device::testing::noop_context;

    #[test]
    fn scopes_resolve_in_any_order_once_popped() {
        let Some(ctx) = noop_context() else { return };

        let validation = ctx.check_validation().report("first");
        let internal = ctx.check_internal().pop();

        assert!(!pollster::block_on(validation));
        assert!(pollster::block_on(internal).is_none());
    }

    #[test]
    fn report_is_false_for_clean_scope() {
        let Some(ctx) = noop_context() else { return };

        let scope = ctx.check_out_of_memory();
        assert_eq!(scope.filter(), wgpu::ErrorFilter::OutOfMemory);
        assert!(!pollster::block_on(scope.report("nothing")));
    }
}
