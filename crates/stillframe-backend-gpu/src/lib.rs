//! Stillframe GPU Backend
//!
//! Hardware rendering through wgpu. Scenes are drawn into an `Rgba8Unorm`
//! texture that is never presented, then copied into a mappable buffer and
//! read back row by row.

pub mod context;
pub mod error;
pub mod pipeline;
pub mod renderer;

pub use context::GpuContext;
pub use error::GpuError;
pub use renderer::{GpuBackend, GpuScene, GpuSurface};

/// WGSL shader sources
pub mod shaders {
    pub const MESH: &str = include_str!("shaders/mesh.wgsl");
}
