//! Capabilities command

use crate::BackendArg;
use stillframe_backend_raster::RasterBackend;
use stillframe_capture::RenderBackend;
use stillframe_core::BackendInfo;

fn print_info(info: &BackendInfo) {
    println!("{}:", info.backend.name());
    println!("  Description: {}", info.backend.description());
    println!("  Adapter:     {}", info.adapter);
    println!(
        "  Max surface: {}x{}",
        info.limits.max_width, info.limits.max_height
    );
    if let Some(max) = info.limits.max_pixels {
        println!("  Max pixels:  {}", max);
    }
}

pub async fn run(backend: Option<BackendArg>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Stillframe Capture Backends");
    println!("===========================\n");

    if backend != Some(BackendArg::Gpu) {
        print_info(&RasterBackend::new().info());
        println!();
    }

    if backend != Some(BackendArg::Raster) {
        gpu(backend.is_some()).await?;
    }

    Ok(())
}

#[cfg(feature = "gpu")]
async fn gpu(required: bool) -> Result<(), Box<dyn std::error::Error>> {
    match stillframe_backend_gpu::GpuBackend::new().await {
        Ok(backend) => print_info(&backend.info()),
        Err(e) if !required => println!("GPU: Not available ({})", e),
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(not(feature = "gpu"))]
async fn gpu(required: bool) -> Result<(), Box<dyn std::error::Error>> {
    if required {
        return Err("stillframe was built without the `gpu` feature".into());
    }
    println!("GPU: Not compiled in");
    Ok(())
}
