//! Rendering backend capability interface
//!
//! Any graphics backend that can allocate an offscreen surface, build a scene
//! graph, render it and read the pixels back can drive a capture.

use async_trait::async_trait;
use stillframe_core::{
    encode, BackendInfo, BackendType, EncodeError, EncodeOptions, GeometryError, ImageFrame,
    ImagePayload, SceneDescription, SurfaceLimits,
};
use thiserror::Error;

/// Errors reported by a backend
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Surface allocation failed: {0}")]
    Allocation(String),

    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    #[error("Render pass failed: {0}")]
    Render(String),

    #[error("Read-back failed: {0}")]
    ReadBack(String),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl From<GeometryError> for BackendError {
    fn from(err: GeometryError) -> Self {
        BackendError::InvalidScene(err.to_string())
    }
}

/// A rendering backend
///
/// Surfaces and scene graphs are owned values: dropping them must release
/// everything the backend allocated for them.
#[async_trait]
pub trait RenderBackend: Send + Sync {
    /// Offscreen render target
    type Surface: Send;

    /// Backend-side scene graph (top-level container, background, actors, camera)
    type SceneGraph: Send + Sync;

    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Backend type
    fn backend_type(&self) -> BackendType;

    /// Largest surface this backend can allocate
    fn limits(&self) -> SurfaceLimits;

    /// Description for capability reporting
    fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.backend_type(),
            adapter: self.name().to_string(),
            limits: self.limits(),
        }
    }

    /// Allocate an offscreen surface of exactly `width` x `height`
    fn allocate_surface(&self, width: u32, height: u32) -> Result<Self::Surface, BackendError>;

    /// Build the scene graph for a description
    fn build_scene(&self, scene: &SceneDescription) -> Result<Self::SceneGraph, BackendError>;

    /// Attach the surface to the scene graph (viewport size, aspect)
    fn bind(&self, graph: &mut Self::SceneGraph, surface: &Self::Surface);

    /// Fit the camera to all visible geometry
    fn reset_camera(&self, graph: &mut Self::SceneGraph);

    /// Execute one render pass; resolves once the backend has finished
    async fn render(
        &self,
        surface: &mut Self::Surface,
        graph: &Self::SceneGraph,
    ) -> Result<(), BackendError>;

    /// Copy the rendered pixels back to the CPU
    async fn read_back(&self, surface: &Self::Surface) -> Result<ImageFrame, BackendError>;

    /// Encode a read-back frame
    fn encode(
        &self,
        frame: &ImageFrame,
        options: &EncodeOptions,
    ) -> Result<ImagePayload, EncodeError> {
        encode(frame, options)
    }
}
