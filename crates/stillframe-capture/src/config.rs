//! Capture configuration

use serde::{Deserialize, Serialize};
use stillframe_core::{EncodeOptions, ImageFormat, SurfaceLimits};

/// Capture configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Encoded output format
    pub format: ImageFormat,
    /// JPEG quality (1 - 100)
    pub jpeg_quality: u8,
    /// Caller-side cap on either surface edge; the backend limit still applies
    pub max_dimension: Option<u32>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            format: ImageFormat::Png,
            jpeg_quality: 90,
            max_dimension: None,
        }
    }
}

impl CaptureConfig {
    /// PNG output, backend limits only
    pub fn png() -> Self {
        Self::default()
    }

    /// JPEG output at the given quality
    pub fn jpeg(quality: u8) -> Self {
        Self {
            format: ImageFormat::Jpeg,
            jpeg_quality: quality.clamp(1, 100),
            max_dimension: None,
        }
    }

    /// Cap surface edges below what the backend allows
    pub fn with_max_dimension(mut self, max_dimension: u32) -> Self {
        self.max_dimension = Some(max_dimension);
        self
    }

    /// Encoder settings for this configuration
    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            format: self.format,
            jpeg_quality: self.jpeg_quality.clamp(1, 100),
        }
    }

    /// Limits that apply once the backend limits are known
    pub fn effective_limits(&self, backend: &SurfaceLimits) -> SurfaceLimits {
        match self.max_dimension {
            Some(max) => backend.intersect(&SurfaceLimits::square(max)),
            None => *backend,
        }
    }
}
