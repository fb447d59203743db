//! Error types for GPU rendering

use stillframe_capture::BackendError;
use thiserror::Error;

/// GPU-specific errors
#[derive(Debug, Error)]
pub enum GpuError {
    /// No suitable GPU adapter found
    #[error("No suitable GPU adapter found")]
    NoAdapter,

    /// GPU device request failed
    #[error("GPU device request failed: {0}")]
    DeviceRequest(String),

    /// The device ran out of memory inside an error scope
    #[error("GPU out of memory: {0}")]
    OutOfMemory(String),

    /// A wgpu validation error was raised inside an error scope
    #[error("GPU validation failed: {0}")]
    Validation(String),

    /// Buffer mapping failed
    #[error("Buffer mapping failed: {0}")]
    BufferMap(String),

    /// The device stopped responding
    #[error("GPU device lost: {0}")]
    DeviceLost(String),
}

impl From<GpuError> for BackendError {
    fn from(err: GpuError) -> Self {
        match err {
            GpuError::NoAdapter | GpuError::DeviceRequest(_) => {
                BackendError::Unavailable(err.to_string())
            }
            GpuError::BufferMap(_) => BackendError::ReadBack(err.to_string()),
            GpuError::OutOfMemory(_) | GpuError::Validation(_) | GpuError::DeviceLost(_) => {
                BackendError::Render(err.to_string())
            }
        }
    }
}

/// Result type for GPU operations
pub type Result<T> = std::result::Result<T, GpuError>;
