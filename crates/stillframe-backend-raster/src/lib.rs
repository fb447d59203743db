//! Stillframe Raster Backend
//!
//! CPU rendering of scene descriptions into an offscreen framebuffer.
//! Triangles are clipped against the near plane, depth tested and flat shaded
//! with a two-sided headlight; wireframe actors are drawn as depth-tested lines.

pub mod framebuffer;
pub mod rasterizer;
pub mod renderer;
pub mod shading;

pub use framebuffer::{Framebuffer, FramebufferError};
pub use renderer::{RasterBackend, RasterScene, RasterSurface};
