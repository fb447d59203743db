//! Stillframe Core - Scene and image types for offscreen capture
//!
//! Stillframe turns a declarative 3D scene description into a single encoded
//! still image without ever touching a visible window.
//!
//! ```text
//! SceneDescription → [allocate surface] → [build scene graph] → [auto-fit camera]
//!                  → [render pass] → [read back] → ImagePayload
//! ```
//!
//! This crate holds everything that is shared between the capture pipeline
//! and the rendering backends:
//!
//! - **Scene description**: actors (visual wrappers) each owning one geometry
//!   generator plus surface properties
//! - **Geometry**: parametric generators and their tessellated meshes
//! - **Camera**: automatic framing of the visible geometry
//! - **Output**: raw read-back frames and immutable encoded payloads
//! - **Tracking**: live-resource counters used to prove that every capture
//!   releases what it allocated

pub mod camera;
pub mod capability;
pub mod encode;
pub mod geometry;
pub mod output;
pub mod scene;
pub mod tracker;

// Re-export commonly used types
pub use camera::Camera;
pub use capability::{BackendInfo, BackendType, LimitViolation, SurfaceLimits};
pub use encode::{encode, EncodeError, EncodeOptions};
pub use geometry::{
    Bounds, ConeSource, CubeSource, GeometryError, GeometrySource, Mesh, MeshVertex, SphereSource,
};
pub use output::{ImageFormat, ImageFrame, ImagePayload};
pub use scene::{Actor, Representation, SceneDescription, SurfaceProperty};
pub use tracker::{ResourceKind, ResourceTracker, TrackedResource};
