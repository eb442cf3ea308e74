//! Window dimensions as seen by cameras and the context.

mod viewport;

pub use viewport::Viewport;
