//! Renders a 150x150 grid of textured quads.
//!
//! Usage: `prism-demo [texture]`. Without a readable texture a checkerboard
//! is used. WASD pans, the mouse wheel dollies.

mod app;
mod controls;
mod mesh;
mod scene;

use prism_engine::logging::{LoggingConfig, init_logging};

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default());

    let config = app::DemoConfig {
        texture_path: std::env::args().nth(1),
        ..app::DemoConfig::default()
    };

    app::run(config)
}
