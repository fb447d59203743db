//! wgpu implementation of the capture backend interface

use async_trait::async_trait;
use std::sync::Arc;
use stillframe_capture::{BackendError, RenderBackend};
use stillframe_core::{
    BackendInfo, BackendType, Bounds, Camera, ImageFrame, MeshVertex, Representation,
    ResourceKind, ResourceTracker, SceneDescription, SurfaceLimits, TrackedResource,
};
use tracing::{debug, info};
use wgpu::util::{BufferInitDescriptor, DeviceExt};
use wgpu::{
    BindGroup, BindGroupDescriptor, BindGroupEntry, Buffer, BufferDescriptor, BufferUsages, Color,
    CommandEncoderDescriptor, Extent3d, ImageCopyBuffer, ImageCopyTexture, ImageDataLayout,
    LoadOp, Maintain, MapMode, Operations, Origin3d, RenderPassColorAttachment,
    RenderPassDepthStencilAttachment, RenderPassDescriptor, StoreOp, Texture, TextureAspect,
    TextureDescriptor, TextureDimension, TextureUsages, TextureView, TextureViewDescriptor,
    COPY_BYTES_PER_ROW_ALIGNMENT,
};

use crate::context::GpuContext;
use crate::error::GpuError;
use crate::pipeline::{
    CameraUniform, MaterialUniform, MeshPipelines, COLOR_FORMAT, DEPTH_FORMAT,
};

/// Row pitch of the read-back buffer for a given width
pub fn padded_bytes_per_row(width: u32) -> u32 {
    let unpadded = width * 4;
    unpadded.div_ceil(COPY_BYTES_PER_ROW_ALIGNMENT) * COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Hardware rendering backend
#[derive(Debug, Clone)]
pub struct GpuBackend {
    context: GpuContext,
    pipelines: Arc<MeshPipelines>,
    tracker: ResourceTracker,
}

impl GpuBackend {
    /// Initialize wgpu and build the pipelines
    pub async fn new() -> Result<Self, GpuError> {
        let context = GpuContext::new().await?;
        Self::with_context(context)
    }

    /// Build the pipelines on an existing context
    pub fn with_context(context: GpuContext) -> Result<Self, GpuError> {
        let pipelines = context.scoped(MeshPipelines::new)?;

        info!(
            adapter = context.adapter_name(),
            "GPU backend initialized"
        );

        Ok(Self {
            context,
            pipelines: Arc::new(pipelines),
            tracker: ResourceTracker::new(),
        })
    }

    pub fn context(&self) -> &GpuContext {
        &self.context
    }

    /// Counters for surfaces and scene graphs created by this backend
    pub fn tracker(&self) -> &ResourceTracker {
        &self.tracker
    }

    /// Run `Device::poll` on the blocking pool until queued work completes
    async fn wait_idle(&self) -> Result<(), BackendError> {
        let device = Arc::clone(&self.context.device);
        tokio::task::spawn_blocking(move || {
            let _ = device.poll(Maintain::Wait);
        })
        .await
        .map_err(|e| BackendError::Render(e.to_string()))
    }
}

/// Offscreen colour + depth textures and the buffer they are copied into
pub struct GpuSurface {
    color: Texture,
    color_view: TextureView,
    _depth: Texture,
    depth_view: TextureView,
    readback: Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    _token: TrackedResource,
}

impl GpuSurface {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl std::fmt::Debug for GpuSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("padded_bytes_per_row", &self.padded_bytes_per_row)
            .finish()
    }
}

struct DrawItem {
    vertices: Buffer,
    vertex_count: u32,
    material: BindGroup,
    _material_buffer: Buffer,
    representation: Representation,
}

/// Scene graph: GPU buffers for every visible actor plus the camera
pub struct GpuScene {
    background: Color,
    draws: Vec<DrawItem>,
    bounds: Bounds,
    camera: Camera,
    aspect: f32,
    camera_buffer: Buffer,
    camera_bind_group: BindGroup,
    _token: TrackedResource,
}

impl GpuScene {
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }
}

impl std::fmt::Debug for GpuScene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuScene")
            .field("draws", &self.draws.len())
            .field("camera", &self.camera)
            .field("aspect", &self.aspect)
            .finish()
    }
}

fn line_vertices(edges: &[[glam::Vec3; 2]]) -> Vec<MeshVertex> {
    edges
        .iter()
        .flat_map(|[a, b]| [*a, *b])
        .map(|p| MeshVertex {
            position: p.into(),
            normal: [0.0; 3],
        })
        .collect()
}

#[async_trait]
impl RenderBackend for GpuBackend {
    type Surface = GpuSurface;
    type SceneGraph = GpuScene;

    fn name(&self) -> &'static str {
        "gpu"
    }

    fn backend_type(&self) -> BackendType {
        BackendType::Gpu
    }

    fn limits(&self) -> SurfaceLimits {
        self.context.surface_limits()
    }

    fn info(&self) -> BackendInfo {
        BackendInfo {
            backend: self.backend_type(),
            adapter: self.context.adapter_name().to_string(),
            limits: self.limits(),
        }
    }

    fn allocate_surface(&self, width: u32, height: u32) -> Result<GpuSurface, BackendError> {
        let padded = padded_bytes_per_row(width);
        let readback_size = padded as u64 * height as u64;
        if readback_size > self.context.limits().max_buffer_size {
            return Err(BackendError::Allocation(format!(
                "read-back buffer of {} bytes exceeds device maximum {}",
                readback_size,
                self.context.limits().max_buffer_size
            )));
        }

        let size = Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };

        let (color, depth, readback) = self
            .context
            .scoped(|device| {
                let color = device.create_texture(&TextureDescriptor {
                    label: Some("Capture Color"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: TextureDimension::D2,
                    format: COLOR_FORMAT,
                    usage: TextureUsages::RENDER_ATTACHMENT | TextureUsages::COPY_SRC,
                    view_formats: &[],
                });
                let depth = device.create_texture(&TextureDescriptor {
                    label: Some("Capture Depth"),
                    size,
                    mip_level_count: 1,
                    sample_count: 1,
                    dimension: TextureDimension::D2,
                    format: DEPTH_FORMAT,
                    usage: TextureUsages::RENDER_ATTACHMENT,
                    view_formats: &[],
                });
                let readback = device.create_buffer(&BufferDescriptor {
                    label: Some("Capture Read-back"),
                    size: readback_size,
                    usage: BufferUsages::MAP_READ | BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                (color, depth, readback)
            })
            .map_err(|e| BackendError::Allocation(e.to_string()))?;

        debug!(width, height, padded, "Allocated GPU surface");

        Ok(GpuSurface {
            color_view: color.create_view(&TextureViewDescriptor::default()),
            color,
            depth_view: depth.create_view(&TextureViewDescriptor::default()),
            _depth: depth,
            readback,
            width,
            height,
            padded_bytes_per_row: padded,
            _token: self.tracker.track(ResourceKind::Surface),
        })
    }

    fn build_scene(&self, scene: &SceneDescription) -> Result<GpuScene, BackendError> {
        let mut meshes = Vec::new();
        let mut bounds = Bounds::EMPTY;

        for actor in scene.visible_actors() {
            let mesh = actor.world_mesh()?;
            bounds = bounds.union(mesh.bounds());

            let vertices = match actor.property.representation {
                Representation::Surface => mesh.vertices,
                Representation::Wireframe => line_vertices(&mesh.edges()),
            };
            meshes.push((vertices, actor.property));
        }

        let camera = Camera::new();
        let pipelines = &self.pipelines;

        let (draws, camera_buffer, camera_bind_group) = self.context.scoped(|device| {
            let camera_buffer = device.create_buffer_init(&BufferInitDescriptor {
                label: Some("Capture Camera"),
                contents: bytemuck::bytes_of(&CameraUniform::new(&camera, 1.0)),
                usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
            });
            let camera_bind_group = device.create_bind_group(&BindGroupDescriptor {
                label: Some("Capture Camera Bind Group"),
                layout: &pipelines.camera_layout,
                entries: &[BindGroupEntry {
                    binding: 0,
                    resource: camera_buffer.as_entire_binding(),
                }],
            });

            let draws: Vec<DrawItem> = meshes
                .iter()
                .filter(|(vertices, _)| !vertices.is_empty())
                .map(|(vertices, property)| {
                    let material_buffer = device.create_buffer_init(&BufferInitDescriptor {
                        label: Some("Actor Material"),
                        contents: bytemuck::bytes_of(&MaterialUniform::from(property)),
                        usage: BufferUsages::UNIFORM,
                    });
                    let material = device.create_bind_group(&BindGroupDescriptor {
                        label: Some("Actor Material Bind Group"),
                        layout: &pipelines.material_layout,
                        entries: &[BindGroupEntry {
                            binding: 0,
                            resource: material_buffer.as_entire_binding(),
                        }],
                    });

                    DrawItem {
                        vertices: device.create_buffer_init(&BufferInitDescriptor {
                            label: Some("Actor Vertices"),
                            contents: bytemuck::cast_slice(vertices),
                            usage: BufferUsages::VERTEX,
                        }),
                        vertex_count: vertices.len() as u32,
                        material,
                        _material_buffer: material_buffer,
                        representation: property.representation,
                    }
                })
                .collect();

            (draws, camera_buffer, camera_bind_group)
        })?;

        debug!(draws = draws.len(), "Uploaded scene to GPU");

        Ok(GpuScene {
            background: Color {
                r: scene.background[0].clamp(0.0, 1.0) as f64,
                g: scene.background[1].clamp(0.0, 1.0) as f64,
                b: scene.background[2].clamp(0.0, 1.0) as f64,
                a: 1.0,
            },
            draws,
            bounds,
            camera,
            aspect: 1.0,
            camera_buffer,
            camera_bind_group,
            _token: self.tracker.track(ResourceKind::SceneGraph),
        })
    }

    fn bind(&self, graph: &mut GpuScene, surface: &GpuSurface) {
        graph.aspect = surface.width as f32 / surface.height as f32;
    }

    fn reset_camera(&self, graph: &mut GpuScene) {
        graph.camera.reset_to_bounds(&graph.bounds, graph.aspect);
    }

    async fn render(&self, surface: &mut GpuSurface, graph: &GpuScene) -> Result<(), BackendError> {
        let context = &self.context;
        let pipelines = &self.pipelines;

        context.scoped(|device| {
            context.queue.write_buffer(
                &graph.camera_buffer,
                0,
                bytemuck::bytes_of(&CameraUniform::new(&graph.camera, graph.aspect)),
            );

            let mut encoder = device.create_command_encoder(&CommandEncoderDescriptor {
                label: Some("Capture Encoder"),
            });

            {
                let mut pass = encoder.begin_render_pass(&RenderPassDescriptor {
                    label: Some("Capture Pass"),
                    color_attachments: &[Some(RenderPassColorAttachment {
                        view: &surface.color_view,
                        resolve_target: None,
                        ops: Operations {
                            load: LoadOp::Clear(graph.background),
                            store: StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: Some(RenderPassDepthStencilAttachment {
                        view: &surface.depth_view,
                        depth_ops: Some(Operations {
                            load: LoadOp::Clear(1.0),
                            store: StoreOp::Discard,
                        }),
                        stencil_ops: None,
                    }),
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });

                pass.set_bind_group(0, &graph.camera_bind_group, &[]);
                for draw in &graph.draws {
                    let pipeline = match draw.representation {
                        Representation::Surface => &pipelines.triangles,
                        Representation::Wireframe => &pipelines.lines,
                    };
                    pass.set_pipeline(pipeline);
                    pass.set_bind_group(1, &draw.material, &[]);
                    pass.set_vertex_buffer(0, draw.vertices.slice(..));
                    pass.draw(0..draw.vertex_count, 0..1);
                }
            }

            encoder.copy_texture_to_buffer(
                ImageCopyTexture {
                    texture: &surface.color,
                    mip_level: 0,
                    origin: Origin3d::ZERO,
                    aspect: TextureAspect::All,
                },
                ImageCopyBuffer {
                    buffer: &surface.readback,
                    layout: ImageDataLayout {
                        offset: 0,
                        bytes_per_row: Some(surface.padded_bytes_per_row),
                        rows_per_image: Some(surface.height),
                    },
                },
                Extent3d {
                    width: surface.width,
                    height: surface.height,
                    depth_or_array_layers: 1,
                },
            );

            context.queue.submit(Some(encoder.finish()));
        })?;

        let (tx, rx) = flume::bounded(1);
        context.queue.on_submitted_work_done(move || {
            let _ = tx.send(());
        });

        self.wait_idle().await?;
        rx.recv_async()
            .await
            .map_err(|_| GpuError::DeviceLost("submission never completed".to_string()))?;

        Ok(())
    }

    async fn read_back(&self, surface: &GpuSurface) -> Result<ImageFrame, BackendError> {
        let (tx, rx) = flume::bounded(1);
        surface
            .readback
            .slice(..)
            .map_async(MapMode::Read, move |result| {
                let _ = tx.send(result);
            });

        self.wait_idle().await?;
        rx.recv_async()
            .await
            .map_err(|_| GpuError::BufferMap("map callback dropped".to_string()))?
            .map_err(|e| GpuError::BufferMap(e.to_string()))?;

        let row_bytes = surface.width as usize * 4;
        let padded = surface.padded_bytes_per_row as usize;
        let mut data = Vec::with_capacity(row_bytes * surface.height as usize);

        {
            let mapped = surface.readback.slice(..).get_mapped_range();
            for row in mapped.chunks_exact(padded).take(surface.height as usize) {
                data.extend_from_slice(&row[..row_bytes]);
            }
        }
        surface.readback.unmap();

        ImageFrame::from_raw(surface.width, surface.height, data)
            .ok_or_else(|| BackendError::ReadBack("read-back buffer too short".to_string()))
    }
}
