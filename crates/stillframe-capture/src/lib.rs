//! Stillframe Capture - Offscreen capture pipeline
//!
//! One capture is one request/response round trip:
//!
//! ```text
//! idle → allocating → rendering → encoding → releasing → done | failed
//! ```
//!
//! The pipeline is generic over a [`RenderBackend`], which supplies the
//! surface allocation, scene graph, render and read-back capabilities. All
//! backend resources are scoped to a single call to
//! [`OffscreenCapture::capture`] and released on every exit path.

pub mod backend;
pub mod capture;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use backend::{BackendError, RenderBackend};
pub use capture::{capture, OffscreenCapture};
pub use config::CaptureConfig;
pub use error::{CaptureError, CaptureErrorKind};
