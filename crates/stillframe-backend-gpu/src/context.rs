//! Shared GPU context
//!
//! Holds the wgpu device and queue used for offscreen rendering. No surface
//! or window is ever created; the adapter is requested headless.

use std::sync::{Arc, Mutex};
use stillframe_core::SurfaceLimits;
use wgpu::{
    AdapterInfo, Backends, Device, DeviceDescriptor, ErrorFilter, Features, Instance,
    InstanceDescriptor, Limits, PowerPreference, Queue, RequestAdapterOptions,
};

use crate::error::{GpuError, Result};

/// Shared GPU context (device + queue)
#[derive(Clone)]
pub struct GpuContext {
    pub device: Arc<Device>,
    pub queue: Arc<Queue>,
    info: AdapterInfo,
    limits: Limits,
    /// Error scopes form one stack per device; held from push to pop
    scope_lock: Arc<Mutex<()>>,
}

impl GpuContext {
    /// Create a new GPU context
    ///
    /// Requests a high-performance adapter and a device with the adapter's
    /// full limits, so the largest supported texture can be allocated.
    pub async fn new() -> Result<Self> {
        let instance = Instance::new(InstanceDescriptor {
            backends: Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &DeviceDescriptor {
                    label: Some("Stillframe Capture Device"),
                    required_features: Features::empty(),
                    required_limits: limits.clone(),
                },
                None,
            )
            .await
            .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        tracing::info!(
            adapter = %info.name,
            backend = ?info.backend,
            max_texture = limits.max_texture_dimension_2d,
            "GPU context initialized"
        );

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            info,
            limits,
            scope_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Adapter name as reported by the driver
    pub fn adapter_name(&self) -> &str {
        &self.info.name
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Largest capture surface this device can back
    pub fn surface_limits(&self) -> SurfaceLimits {
        SurfaceLimits::square(self.limits.max_texture_dimension_2d)
            .with_max_pixels(self.limits.max_buffer_size / 4)
    }

    /// Run `f` inside out-of-memory and validation error scopes.
    ///
    /// Scoped regions on one context never interleave, so each caller only
    /// sees errors raised by its own `f`. On native backends the scopes
    /// resolve as soon as they are popped, so blocking on them does not stall
    /// the caller.
    pub fn scoped<T>(&self, f: impl FnOnce(&Device) -> T) -> Result<T> {
        let _guard = self
            .scope_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        self.device.push_error_scope(ErrorFilter::OutOfMemory);
        self.device.push_error_scope(ErrorFilter::Validation);

        let value = f(&self.device);

        let validation = pollster::block_on(self.device.pop_error_scope());
        let out_of_memory = pollster::block_on(self.device.pop_error_scope());

        if let Some(err) = out_of_memory {
            return Err(GpuError::OutOfMemory(err.to_string()));
        }
        if let Some(err) = validation {
            return Err(GpuError::Validation(err.to_string()));
        }

        Ok(value)
    }
}

impl std::fmt::Debug for GpuContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpuContext")
            .field("adapter", &self.info.name)
            .field("backend", &self.info.backend)
            .field("max_texture_dimension_2d", &self.limits.max_texture_dimension_2d)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_context_limits() {
        let Ok(context) = GpuContext::new().await else {
            eprintln!("No GPU adapter available, skipping");
            return;
        };

        let limits = context.surface_limits();
        assert_eq!(limits.max_width, context.limits().max_texture_dimension_2d);
        assert!(limits.check(1, 1).is_ok());
        assert!(limits.check(limits.max_width + 1, 1).is_err());
    }

    #[tokio::test]
    async fn test_validation_error_is_scoped() {
        let Ok(context) = GpuContext::new().await else {
            return;
        };

        // MAP_READ may only be combined with COPY_DST
        let result = context.scoped(|device| {
            device.create_buffer(&wgpu::BufferDescriptor {
                label: None,
                size: 16,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX,
                mapped_at_creation: false,
            })
        });
        assert!(matches!(result, Err(GpuError::Validation(_))));

        // The scope is gone afterwards
        assert!(context.scoped(|_| ()).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_scopes_report_their_own_errors() {
        let Ok(context) = GpuContext::new().await else {
            return;
        };

        let buffer = |usage: wgpu::BufferUsages| wgpu::BufferDescriptor {
            label: None,
            size: 16,
            usage,
            mapped_at_creation: false,
        };

        let mut tasks = Vec::new();
        for i in 0..32 {
            let context = context.clone();
            tasks.push(tokio::spawn(async move {
                let invalid = i % 2 == 0;
                let usage = if invalid {
                    wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::VERTEX
                } else {
                    wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST
                };
                let result = context.scoped(|device| {
                    let _ = device.create_buffer(&buffer(usage));
                    std::thread::yield_now();
                });
                (invalid, result.is_err())
            }));
        }

        for task in tasks {
            let (invalid, failed) = task.await.unwrap();
            assert_eq!(invalid, failed);
        }
    }
}
