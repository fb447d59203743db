//! Capture command

use crate::{BackendArg, FormatArg};
use std::fs;
use stillframe_backend_raster::RasterBackend;
use stillframe_capture::{CaptureConfig, OffscreenCapture, RenderBackend};
use stillframe_core::{ImageFormat, SceneDescription};
use tracing::info;

/// Options for one capture
pub struct CaptureArgs {
    pub scene: Option<String>,
    pub width: u32,
    pub height: u32,
    pub format: FormatArg,
    pub quality: u8,
    pub output: Option<String>,
    pub data_url: bool,
    pub max_dimension: Option<u32>,
}

impl CaptureArgs {
    fn config(&self) -> CaptureConfig {
        let config = match self.format {
            FormatArg::Png => CaptureConfig::png(),
            FormatArg::Jpeg => CaptureConfig::jpeg(self.quality),
        };
        match self.max_dimension {
            Some(max) => config.with_max_dimension(max),
            None => config,
        }
    }
}

/// Load a scene file, or the cone demo when none is given
pub fn load_scene(path: Option<&str>) -> Result<SceneDescription, Box<dyn std::error::Error>> {
    match path {
        Some(path) => {
            info!("Loading scene from {}", path);
            let json = fs::read_to_string(path)?;
            let scene: SceneDescription = serde_json::from_str(&json)?;
            info!("Loaded scene with {} actors", scene.actors.len());
            Ok(scene)
        }
        None => Ok(SceneDescription::cone_demo()),
    }
}

pub async fn run(backend: BackendArg, args: CaptureArgs) -> Result<(), Box<dyn std::error::Error>> {
    match backend {
        BackendArg::Raster => capture_with(RasterBackend::new(), args).await,
        #[cfg(feature = "gpu")]
        BackendArg::Gpu => {
            let backend = stillframe_backend_gpu::GpuBackend::new().await?;
            capture_with(backend, args).await
        }
        #[cfg(not(feature = "gpu"))]
        BackendArg::Gpu => Err("stillframe was built without the `gpu` feature".into()),
    }
}

async fn capture_with<B: RenderBackend>(
    backend: B,
    args: CaptureArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let scene = load_scene(args.scene.as_deref())?;
    let pipeline = OffscreenCapture::with_config(backend, args.config());

    info!(
        "Capturing {}x{} with the {} backend",
        args.width,
        args.height,
        pipeline.backend().name()
    );

    let payload = pipeline.capture(&scene, args.width, args.height).await?;

    if args.data_url {
        println!("{}", payload.to_data_url());
    }

    let path = match (&args.output, args.data_url) {
        (Some(path), _) => Some(path.clone()),
        (None, false) => Some(format!("capture.{}", payload.format().extension())),
        (None, true) => None,
    };

    if let Some(path) = path {
        fs::write(&path, payload.bytes())?;
        let kind = match payload.format() {
            ImageFormat::Png => "PNG",
            ImageFormat::Jpeg => "JPEG",
        };
        println!(
            "{} {}x{} ({} bytes) written to {}",
            kind,
            payload.width(),
            payload.height(),
            payload.bytes().len(),
            path
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(format: FormatArg) -> CaptureArgs {
        CaptureArgs {
            scene: None,
            width: 16,
            height: 16,
            format,
            quality: 150,
            output: None,
            data_url: true,
            max_dimension: Some(512),
        }
    }

    #[test]
    fn test_args_config() {
        let config = args(FormatArg::Jpeg).config();
        assert_eq!(config.format, ImageFormat::Jpeg);
        assert_eq!(config.jpeg_quality, 100);
        assert_eq!(config.max_dimension, Some(512));

        assert_eq!(args(FormatArg::Png).config().format, ImageFormat::Png);
    }

    #[test]
    fn test_default_scene() {
        let scene = load_scene(None).unwrap();
        assert_eq!(scene, SceneDescription::cone_demo());
    }

    #[test]
    fn test_missing_scene_file() {
        assert!(load_scene(Some("/nonexistent/scene.json")).is_err());
    }
}
