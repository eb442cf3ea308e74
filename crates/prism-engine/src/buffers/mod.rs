//! CPU-side buffers laid out for direct GPU upload.

mod storage;

pub use storage::StorageBuffer;
