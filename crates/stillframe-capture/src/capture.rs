//! Offscreen capture orchestration

use crate::backend::RenderBackend;
use crate::config::CaptureConfig;
use crate::error::CaptureError;
use std::time::Instant;
use stillframe_core::{ImagePayload, SceneDescription, SurfaceLimits};
use tracing::{debug, debug_span, info, Instrument};

/// Capture a scene with the default configuration
pub async fn capture<B: RenderBackend>(
    backend: &B,
    scene: &SceneDescription,
    width: u32,
    height: u32,
) -> Result<ImagePayload, CaptureError> {
    run_capture(backend, &CaptureConfig::default(), scene, width, height).await
}

/// Offscreen capture pipeline bound to one backend
pub struct OffscreenCapture<B: RenderBackend> {
    backend: B,
    config: CaptureConfig,
}

impl<B: RenderBackend> OffscreenCapture<B> {
    /// Create a pipeline with the default configuration
    pub fn new(backend: B) -> Self {
        Self::with_config(backend, CaptureConfig::default())
    }

    /// Create a pipeline with a custom configuration
    pub fn with_config(backend: B, config: CaptureConfig) -> Self {
        info!(
            backend = backend.name(),
            format = ?config.format,
            max_dimension = ?config.max_dimension,
            "Building capture pipeline"
        );
        Self { backend, config }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// Limits enforced on `capture` dimensions
    pub fn limits(&self) -> SurfaceLimits {
        self.config.effective_limits(&self.backend.limits())
    }

    /// Render `scene` off-screen at `width` x `height` and encode the result.
    ///
    /// Every surface and scene graph allocated here is released before this
    /// returns, whether it succeeds or fails.
    pub async fn capture(
        &self,
        scene: &SceneDescription,
        width: u32,
        height: u32,
    ) -> Result<ImagePayload, CaptureError> {
        run_capture(&self.backend, &self.config, scene, width, height).await
    }
}

async fn run_capture<B: RenderBackend>(
    backend: &B,
    config: &CaptureConfig,
    scene: &SceneDescription,
    width: u32,
    height: u32,
) -> Result<ImagePayload, CaptureError> {
    let span = debug_span!("capture", backend = backend.name(), width, height);
    capture_steps(backend, config, scene, width, height)
        .instrument(span)
        .await
}

async fn capture_steps<B: RenderBackend>(
    backend: &B,
    config: &CaptureConfig,
    scene: &SceneDescription,
    width: u32,
    height: u32,
) -> Result<ImagePayload, CaptureError> {
    let name = backend.name();
    let start = Instant::now();

    config
        .effective_limits(&backend.limits())
        .check(width, height)
        .map_err(|v| CaptureError::limit(width, height, v))?;

    // Surface and scene graph live only inside this block; every early
    // return drops them (graph first, then surface).
    let frame = {
        let mut surface = backend
            .allocate_surface(width, height)
            .map_err(|e| CaptureError::allocation(width, height, e))?;
        debug!("Surface allocated");

        let mut graph = backend
            .build_scene(scene)
            .map_err(|e| CaptureError::render(name, e))?;
        debug!(
            actors = scene.actors.len(),
            visible = scene.visible_actors().count(),
            "Scene graph built"
        );

        backend.bind(&mut graph, &surface);
        backend.reset_camera(&mut graph);

        let render_start = Instant::now();
        backend
            .render(&mut surface, &graph)
            .await
            .map_err(|e| CaptureError::render(name, e))?;
        debug!(
            duration_ms = render_start.elapsed().as_secs_f64() * 1000.0,
            "Render pass completed"
        );

        let frame = backend
            .read_back(&surface)
            .await
            .map_err(|e| CaptureError::render(name, e))?;

        if frame.width != width || frame.height != height {
            return Err(CaptureError::RenderExecutionFailed {
                backend: name,
                reason: format!(
                    "read back {}x{} from a {}x{} surface",
                    frame.width, frame.height, width, height
                ),
            });
        }

        drop(graph);
        drop(surface);
        debug!("Surface and scene graph released");

        frame
    };

    let payload = backend.encode(&frame, &config.encode_options())?;

    debug!(
        total_ms = start.elapsed().as_secs_f64() * 1000.0,
        bytes = payload.bytes().len(),
        "Capture completed"
    );

    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::error::CaptureErrorKind;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use stillframe_core::{
        BackendType, ImageFormat, ImageFrame, ResourceKind, ResourceTracker, TrackedResource,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum FailAt {
        Allocate,
        Build,
        Render,
        ReadBack,
        Encode,
    }

    struct MockSurface {
        width: u32,
        height: u32,
        frame: ImageFrame,
        _token: TrackedResource,
    }

    struct MockGraph {
        background: [u8; 4],
        bound: Option<(u32, u32)>,
        camera_reset: bool,
        _token: TrackedResource,
    }

    struct MockBackend {
        tracker: ResourceTracker,
        limits: SurfaceLimits,
        fail_at: Option<FailAt>,
        live_during_render: AtomicUsize,
    }

    impl MockBackend {
        fn new() -> Self {
            Self {
                tracker: ResourceTracker::new(),
                limits: SurfaceLimits::default(),
                fail_at: None,
                live_during_render: AtomicUsize::new(0),
            }
        }

        fn failing(stage: FailAt) -> Self {
            Self {
                fail_at: Some(stage),
                ..Self::new()
            }
        }

        fn fails(&self, stage: FailAt) -> bool {
            self.fail_at == Some(stage)
        }
    }

    #[async_trait]
    impl RenderBackend for MockBackend {
        type Surface = MockSurface;
        type SceneGraph = MockGraph;

        fn name(&self) -> &'static str {
            "mock"
        }

        fn backend_type(&self) -> BackendType {
            BackendType::Raster
        }

        fn limits(&self) -> SurfaceLimits {
            self.limits
        }

        fn allocate_surface(&self, width: u32, height: u32) -> Result<MockSurface, BackendError> {
            if self.fails(FailAt::Allocate) {
                return Err(BackendError::Allocation("out of memory".into()));
            }
            Ok(MockSurface {
                width,
                height,
                frame: ImageFrame::new(width, height),
                _token: self.tracker.track(ResourceKind::Surface),
            })
        }

        fn build_scene(&self, scene: &SceneDescription) -> Result<MockGraph, BackendError> {
            if self.fails(FailAt::Build) {
                return Err(BackendError::InvalidScene("bad geometry".into()));
            }
            Ok(MockGraph {
                background: scene.background_rgba8(),
                bound: None,
                camera_reset: false,
                _token: self.tracker.track(ResourceKind::SceneGraph),
            })
        }

        fn bind(&self, graph: &mut MockGraph, surface: &MockSurface) {
            graph.bound = Some((surface.width, surface.height));
        }

        fn reset_camera(&self, graph: &mut MockGraph) {
            graph.camera_reset = true;
        }

        async fn render(
            &self,
            surface: &mut MockSurface,
            graph: &MockGraph,
        ) -> Result<(), BackendError> {
            tokio::task::yield_now().await;
            self.live_during_render
                .store(self.tracker.live_total(), Ordering::SeqCst);

            if self.fails(FailAt::Render) {
                return Err(BackendError::Render("shader compile failed".into()));
            }
            assert_eq!(graph.bound, Some((surface.width, surface.height)));
            assert!(graph.camera_reset);

            surface.frame.fill(graph.background);
            Ok(())
        }

        async fn read_back(&self, surface: &MockSurface) -> Result<ImageFrame, BackendError> {
            if self.fails(FailAt::ReadBack) {
                return Err(BackendError::ReadBack("map failed".into()));
            }
            if self.fails(FailAt::Encode) {
                // Right dimensions, truncated pixel data
                return Ok(ImageFrame {
                    width: surface.width,
                    height: surface.height,
                    data: vec![0; 3],
                });
            }
            Ok(surface.frame.clone())
        }
    }

    #[tokio::test]
    async fn test_capture_dimensions() {
        let pipeline = OffscreenCapture::new(MockBackend::new());
        let payload = pipeline
            .capture(&SceneDescription::cone_demo(), 256, 128)
            .await
            .unwrap();

        assert_eq!(payload.width(), 256);
        assert_eq!(payload.height(), 128);
        assert_eq!(payload.format(), ImageFormat::Png);
        assert!(!payload.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_resources_released_on_success() {
        let pipeline = OffscreenCapture::new(MockBackend::new());
        pipeline
            .capture(&SceneDescription::cone_demo(), 32, 32)
            .await
            .unwrap();

        let backend = pipeline.backend();
        assert_eq!(backend.live_during_render.load(Ordering::SeqCst), 2);
        assert_eq!(backend.tracker.live_total(), 0);
        assert_eq!(backend.tracker.allocated(ResourceKind::Surface), 1);
        assert_eq!(backend.tracker.allocated(ResourceKind::SceneGraph), 1);
    }

    #[tokio::test]
    async fn test_failures_map_to_kinds_and_release() {
        let cases = [
            (FailAt::Allocate, CaptureErrorKind::SurfaceAllocationFailed),
            (FailAt::Build, CaptureErrorKind::RenderExecutionFailed),
            (FailAt::Render, CaptureErrorKind::RenderExecutionFailed),
            (FailAt::ReadBack, CaptureErrorKind::RenderExecutionFailed),
            (FailAt::Encode, CaptureErrorKind::EncodingFailed),
        ];

        for (stage, kind) in cases {
            let pipeline = OffscreenCapture::new(MockBackend::failing(stage));
            let err = pipeline
                .capture(&SceneDescription::cone_demo(), 64, 64)
                .await
                .unwrap_err();

            assert_eq!(err.kind(), kind, "stage {:?}", stage);
            assert_eq!(
                pipeline.backend().tracker.live_total(),
                0,
                "leak after {:?}",
                stage
            );
        }
    }

    #[tokio::test]
    async fn test_oversized_request_rejected_before_allocation() {
        let pipeline = OffscreenCapture::new(MockBackend::new());
        let err = pipeline
            .capture(&SceneDescription::cone_demo(), 16385, 16385)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), CaptureErrorKind::SurfaceAllocationFailed);
        assert_eq!(pipeline.backend().tracker.allocated(ResourceKind::Surface), 0);
    }

    #[tokio::test]
    async fn test_zero_dimension_rejected() {
        let pipeline = OffscreenCapture::new(MockBackend::new());
        let err = pipeline
            .capture(&SceneDescription::new(), 0, 64)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CaptureErrorKind::SurfaceAllocationFailed);
    }

    #[tokio::test]
    async fn test_config_max_dimension() {
        let pipeline =
            OffscreenCapture::with_config(MockBackend::new(), CaptureConfig::png().with_max_dimension(100));
        assert_eq!(pipeline.limits().max_width, 100);

        assert!(pipeline.capture(&SceneDescription::new(), 100, 100).await.is_ok());
        let err = pipeline
            .capture(&SceneDescription::new(), 101, 100)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CaptureErrorKind::SurfaceAllocationFailed);
    }

    #[tokio::test]
    async fn test_empty_scene_is_background() {
        let backend = MockBackend::new();
        let scene = SceneDescription::new().with_background([0.2, 0.3, 0.4]);
        let payload = capture(&backend, &scene, 16, 16).await.unwrap();

        assert_eq!(payload.dimensions(), (16, 16));
        assert_eq!(backend.tracker.live_total(), 0);

        let image = image::load_from_memory(payload.bytes()).unwrap().to_rgba8();
        assert_eq!(image.dimensions(), (16, 16));
        assert!(image.pixels().all(|p| p.0 == [51, 77, 102, 255]));
    }

    #[tokio::test]
    async fn test_idempotent_shape_and_format() {
        let pipeline = OffscreenCapture::with_config(MockBackend::new(), CaptureConfig::jpeg(75));
        let scene = SceneDescription::cone_demo();

        let a = pipeline.capture(&scene, 40, 30).await.unwrap();
        let b = pipeline.capture(&scene, 40, 30).await.unwrap();

        assert_eq!(a.dimensions(), b.dimensions());
        assert_eq!(a.format(), ImageFormat::Jpeg);
        assert_eq!(a.format(), b.format());
    }

    #[tokio::test]
    async fn test_concurrent_captures_are_independent() {
        let pipeline = OffscreenCapture::new(MockBackend::new());
        let scene = SceneDescription::cone_demo();

        let (a, b) = tokio::join!(
            pipeline.capture(&scene, 10, 20),
            pipeline.capture(&scene, 30, 40)
        );

        assert_eq!(a.unwrap().dimensions(), (10, 20));
        assert_eq!(b.unwrap().dimensions(), (30, 40));
        assert_eq!(pipeline.backend().tracker.live_total(), 0);
    }
}
