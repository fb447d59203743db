//! Backend capability reporting
//!
//! Backends report the largest offscreen surface they can allocate. Requests
//! beyond these limits are rejected up front instead of being clamped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum edge length of an offscreen surface
pub const DEFAULT_MAX_DIMENSION: u32 = 16384;

/// Largest offscreen surface a backend supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurfaceLimits {
    /// Maximum width in pixels
    pub max_width: u32,
    /// Maximum height in pixels
    pub max_height: u32,
    /// Optional cap on width * height (e.g. from a maximum buffer size)
    pub max_pixels: Option<u64>,
}

impl Default for SurfaceLimits {
    fn default() -> Self {
        Self::square(DEFAULT_MAX_DIMENSION)
    }
}

impl SurfaceLimits {
    /// Limits with the same maximum on both axes
    pub fn square(max_dimension: u32) -> Self {
        Self {
            max_width: max_dimension,
            max_height: max_dimension,
            max_pixels: None,
        }
    }

    /// Set a pixel-count cap
    pub fn with_max_pixels(mut self, max_pixels: u64) -> Self {
        self.max_pixels = Some(max_pixels);
        self
    }

    /// The stricter of two limit sets
    pub fn intersect(&self, other: &SurfaceLimits) -> SurfaceLimits {
        let max_pixels = match (self.max_pixels, other.max_pixels) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        SurfaceLimits {
            max_width: self.max_width.min(other.max_width),
            max_height: self.max_height.min(other.max_height),
            max_pixels,
        }
    }

    /// Check a requested surface size against these limits
    pub fn check(&self, width: u32, height: u32) -> Result<(), LimitViolation> {
        if width == 0 || height == 0 {
            return Err(LimitViolation::ZeroDimension { width, height });
        }

        if width > self.max_width || height > self.max_height {
            return Err(LimitViolation::TooLarge {
                width,
                height,
                max_width: self.max_width,
                max_height: self.max_height,
            });
        }

        if let Some(max) = self.max_pixels {
            let pixels = width as u64 * height as u64;
            if pixels > max {
                return Err(LimitViolation::TooManyPixels { pixels, max });
            }
        }

        Ok(())
    }
}

/// Reason a surface size was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LimitViolation {
    #[error("Surface dimensions must be positive, got {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("Surface {width}x{height} exceeds maximum {max_width}x{max_height}")]
    TooLarge {
        width: u32,
        height: u32,
        max_width: u32,
        max_height: u32,
    },

    #[error("Surface of {pixels} pixels exceeds maximum of {max} pixels")]
    TooManyPixels { pixels: u64, max: u64 },
}

/// Available rendering backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BackendType {
    /// Software rasterization on the CPU
    Raster,
    /// Hardware rendering through wgpu
    Gpu,
}

impl BackendType {
    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Raster => "Raster",
            Self::Gpu => "GPU",
        }
    }

    /// Get description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Raster => "Z-buffered software rasterizer, always available",
            Self::Gpu => "Offscreen texture rendering via wgpu",
        }
    }
}

/// What a backend reports about itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendInfo {
    /// Backend type
    pub backend: BackendType,
    /// Adapter or implementation name
    pub adapter: String,
    /// Surface limits
    pub limits: SurfaceLimits,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits() {
        let limits = SurfaceLimits::default();
        assert_eq!(limits.max_width, 16384);
        assert_eq!(limits.max_height, 16384);
        assert!(limits.check(16384, 16384).is_ok());
    }

    #[test]
    fn test_limits_boundary() {
        let limits = SurfaceLimits::default();
        assert!(matches!(
            limits.check(16385, 16385),
            Err(LimitViolation::TooLarge { .. })
        ));
        assert!(limits.check(16385, 1).is_err());
        assert!(limits.check(1, 16385).is_err());
    }

    #[test]
    fn test_zero_dimension() {
        let limits = SurfaceLimits::default();
        assert!(matches!(
            limits.check(0, 10),
            Err(LimitViolation::ZeroDimension { .. })
        ));
    }

    #[test]
    fn test_max_pixels() {
        let limits = SurfaceLimits::square(1024).with_max_pixels(1000);
        assert!(limits.check(10, 100).is_ok());
        assert!(matches!(
            limits.check(10, 101),
            Err(LimitViolation::TooManyPixels { pixels: 1010, max: 1000 })
        ));
    }

    #[test]
    fn test_intersect() {
        let a = SurfaceLimits::square(4096).with_max_pixels(1 << 20);
        let b = SurfaceLimits {
            max_width: 8192,
            max_height: 2048,
            max_pixels: None,
        };

        let c = a.intersect(&b);
        assert_eq!(c.max_width, 4096);
        assert_eq!(c.max_height, 2048);
        assert_eq!(c.max_pixels, Some(1 << 20));
    }

    #[test]
    fn test_backend_names() {
        assert_eq!(BackendType::Raster.name(), "Raster");
        assert!(!BackendType::Gpu.description().is_empty());
    }
}
