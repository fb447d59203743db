//! CPU implementation of the capture backend interface

use async_trait::async_trait;
use glam::{Mat4, Vec3};
use std::sync::Arc;
use stillframe_capture::{BackendError, RenderBackend};
use stillframe_core::{
    BackendType, Bounds, Camera, ImageFrame, Mesh, Representation, ResourceKind, ResourceTracker,
    SceneDescription, SurfaceLimits, SurfaceProperty, TrackedResource,
};
use tracing::{debug, info};

use crate::framebuffer::Framebuffer;
use crate::rasterizer::{draw_line, draw_triangle};
use crate::shading::{flat, shade};

/// Software rendering backend
#[derive(Debug, Clone)]
pub struct RasterBackend {
    tracker: ResourceTracker,
    limits: SurfaceLimits,
}

impl Default for RasterBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RasterBackend {
    /// Create a backend with the default surface limits
    pub fn new() -> Self {
        Self::with_limits(SurfaceLimits::default())
    }

    /// Create a backend with custom surface limits
    pub fn with_limits(limits: SurfaceLimits) -> Self {
        info!(
            max_width = limits.max_width,
            max_height = limits.max_height,
            "Raster backend initialized"
        );
        Self {
            tracker: ResourceTracker::new(),
            limits,
        }
    }

    /// Counters for surfaces and scene graphs created by this backend
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }
}

/// Offscreen framebuffer owned by one capture
#[derive(Debug)]
pub struct RasterSurface {
    framebuffer: Framebuffer,
    width: u32,
    height: u32,
    _token: TrackedResource,
}

impl RasterSurface {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Actor geometry in world space, ready to draw
#[derive(Debug)]
struct PreparedActor {
    mesh: Mesh,
    edges: Vec<[Vec3; 2]>,
    property: SurfaceProperty,
}

/// Scene graph: background, prepared actors and the camera
#[derive(Debug)]
pub struct RasterScene {
    background: [u8; 4],
    actors: Arc<Vec<PreparedActor>>,
    bounds: Bounds,
    camera: Camera,
    aspect: f32,
    _token: TrackedResource,
}

impl RasterScene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// World-space bounds of all visible actors
    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn actor_count(&self) -> usize {
        self.actors.len()
    }
}

fn rasterize(
    fb: &mut Framebuffer,
    background: [u8; 4],
    actors: &[PreparedActor],
    camera: &Camera,
    aspect: f32,
) {
    fb.clear(background);

    let view_projection: Mat4 = camera.view_projection(aspect);
    let to_eye = camera.view_plane_normal();

    for actor in actors {
        match actor.property.representation {
            Representation::Surface => {
                for [a, b, c] in actor.mesh.triangles() {
                    let rgba = shade(&actor.property, Vec3::from(a.normal), to_eye);
                    let clip = [a, b, c]
                        .map(|v| view_projection * Vec3::from(v.position).extend(1.0));
                    draw_triangle(fb, clip, rgba);
                }
            }
            Representation::Wireframe => {
                let rgba = flat(&actor.property);
                for [a, b] in &actor.edges {
                    draw_line(
                        fb,
                        view_projection * a.extend(1.0),
                        view_projection * b.extend(1.0),
                        rgba,
                    );
                }
            }
        }
    }
}

#[async_trait]
impl RenderBackend for RasterBackend {
    type Surface = RasterSurface;
    type SceneGraph = RasterScene;

    fn name(&self) -> &'static str {
        "raster"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Raster
    }

    fn limits(&self) -> SurfaceLimits {
        self.limits
    }

    fn allocate_surface(&self, width: u32, height: u32) -> Result<RasterSurface, BackendError> {
        let framebuffer = Framebuffer::try_new(width, height)
            .map_err(|e| BackendError::Allocation(e.to_string()))?;

        Ok(RasterSurface {
            framebuffer,
            width,
            height,
            _token: self.tracker.track(ResourceKind::Surface),
        })
    }

    fn build_scene(&self, scene: &SceneDescription) -> Result<RasterScene, BackendError> {
        let mut actors = Vec::new();
        let mut bounds = Bounds::EMPTY;

        for actor in scene.visible_actors() {
            let mesh = actor.world_mesh()?;
            bounds = bounds.union(mesh.bounds());

            let edges = match actor.property.representation {
                Representation::Wireframe => mesh.edges(),
                Representation::Surface => Vec::new(),
            };

            debug!(
                source = actor.source.name(),
                triangles = mesh.triangle_count(),
                "Prepared actor"
            );

            actors.push(PreparedActor {
                mesh,
                edges,
                property: actor.property,
            });
        }

        Ok(RasterScene {
            background: scene.background_rgba8(),
            actors: Arc::new(actors),
            bounds,
            camera: Camera::new(),
            aspect: 1.0,
            _token: self.tracker.track(ResourceKind::SceneGraph),
        })
    }

    fn bind(&self, graph: &mut RasterScene, surface: &RasterSurface) {
        graph.aspect = surface.width as f32 / surface.height as f32;
    }

    fn reset_camera(&self, graph: &mut RasterScene) {
        graph.camera.reset_to_bounds(&graph.bounds, graph.aspect);
    }

    async fn render(
        &self,
        surface: &mut RasterSurface,
        graph: &RasterScene,
    ) -> Result<(), BackendError> {
        let mut framebuffer = std::mem::take(&mut surface.framebuffer);
        let actors = Arc::clone(&graph.actors);
        let camera = graph.camera.clone();
        let (background, aspect) = (graph.background, graph.aspect);

        let framebuffer = tokio::task::spawn_blocking(move || {
            rasterize(&mut framebuffer, background, &actors, &camera, aspect);
            framebuffer
        })
        .await
        .map_err(|e| BackendError::Render(e.to_string()))?;

        surface.framebuffer = framebuffer;
        Ok(())
    }

    async fn read_back(&self, surface: &RasterSurface) -> Result<ImageFrame, BackendError> {
        if surface.framebuffer.is_empty() {
            return Err(BackendError::ReadBack(
                "framebuffer lost during render".to_string(),
            ));
        }
        Ok(surface.framebuffer.to_frame())
    }
}
