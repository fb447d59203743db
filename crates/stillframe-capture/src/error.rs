//! Capture errors

use crate::backend::BackendError;
use stillframe_core::{EncodeError, LimitViolation};
use thiserror::Error;

/// Errors surfaced by a capture. None are retried internally.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// Dimensions exceed backend capability, or the backend refused allocation
    #[error("Surface allocation failed for {width}x{height}: {reason}")]
    SurfaceAllocationFailed {
        width: u32,
        height: u32,
        reason: String,
    },

    /// The backend failed while building, rendering or reading back the scene
    #[error("Render execution failed on {backend}: {reason}")]
    RenderExecutionFailed {
        backend: &'static str,
        reason: String,
    },

    /// The pixel buffer could not be serialized
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),
}

/// Error kind without details
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CaptureErrorKind {
    SurfaceAllocationFailed,
    RenderExecutionFailed,
    EncodingFailed,
}

impl CaptureError {
    pub fn kind(&self) -> CaptureErrorKind {
        match self {
            Self::SurfaceAllocationFailed { .. } => CaptureErrorKind::SurfaceAllocationFailed,
            Self::RenderExecutionFailed { .. } => CaptureErrorKind::RenderExecutionFailed,
            Self::EncodingFailed(_) => CaptureErrorKind::EncodingFailed,
        }
    }

    pub(crate) fn limit(width: u32, height: u32, violation: LimitViolation) -> Self {
        Self::SurfaceAllocationFailed {
            width,
            height,
            reason: violation.to_string(),
        }
    }

    pub(crate) fn allocation(width: u32, height: u32, err: BackendError) -> Self {
        Self::SurfaceAllocationFailed {
            width,
            height,
            reason: err.to_string(),
        }
    }

    pub(crate) fn render(backend: &'static str, err: BackendError) -> Self {
        Self::RenderExecutionFailed {
            backend,
            reason: err.to_string(),
        }
    }
}

impl From<EncodeError> for CaptureError {
    fn from(err: EncodeError) -> Self {
        CaptureError::EncodingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = CaptureError::limit(
            16385,
            16385,
            LimitViolation::TooLarge {
                width: 16385,
                height: 16385,
                max_width: 16384,
                max_height: 16384,
            },
        );
        assert_eq!(err.kind(), CaptureErrorKind::SurfaceAllocationFailed);
        assert!(err.to_string().contains("16385x16385"));

        let err = CaptureError::render("raster", BackendError::Render("boom".into()));
        assert_eq!(err.kind(), CaptureErrorKind::RenderExecutionFailed);
        assert!(err.to_string().contains("boom"));

        let err = CaptureError::EncodingFailed("bad".into());
        assert_eq!(err.kind(), CaptureErrorKind::EncodingFailed);
    }
}
