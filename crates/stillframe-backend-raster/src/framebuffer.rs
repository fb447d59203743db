//! Colour + depth render target

use stillframe_core::ImageFrame;
use thiserror::Error;

/// Depth value of a cleared buffer (far plane)
pub const CLEAR_DEPTH: f32 = 1.0;

/// Framebuffer allocation errors
#[derive(Debug, Error)]
pub enum FramebufferError {
    #[error("Framebuffer {width}x{height} overflows the address space")]
    TooLarge { width: u32, height: u32 },

    #[error("Could not reserve {bytes} bytes for a {width}x{height} framebuffer")]
    OutOfMemory { width: u32, height: u32, bytes: usize },
}

/// RGBA8 colour buffer with a matching f32 depth buffer
#[derive(Debug, Default)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    color: Vec<u8>,
    depth: Vec<f32>,
}

impl Framebuffer {
    /// Allocate a framebuffer, reporting failure instead of aborting
    pub fn try_new(width: u32, height: u32) -> Result<Self, FramebufferError> {
        let too_large = || FramebufferError::TooLarge { width, height };

        let pixels = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(too_large)?;
        let color_bytes = pixels.checked_mul(4).ok_or_else(too_large)?;

        let mut color = Vec::new();
        color
            .try_reserve_exact(color_bytes)
            .map_err(|_| FramebufferError::OutOfMemory {
                width,
                height,
                bytes: color_bytes,
            })?;
        color.resize(color_bytes, 0);

        let mut depth = Vec::new();
        depth
            .try_reserve_exact(pixels)
            .map_err(|_| FramebufferError::OutOfMemory {
                width,
                height,
                bytes: pixels.saturating_mul(std::mem::size_of::<f32>()),
            })?;
        depth.resize(pixels, CLEAR_DEPTH);

        Ok(Self {
            width,
            height,
            color,
            depth,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.color.is_empty()
    }

    /// Fill colour with `rgba` and reset depth to the far plane
    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.color.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        self.depth.fill(CLEAR_DEPTH);
    }

    /// Write a fragment if it passes the depth test (less-or-equal).
    /// Returns whether the fragment was written.
    pub fn plot(&mut self, x: i32, y: i32, depth: f32, rgba: [u8; 4]) -> bool {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return false;
        }
        if !(0.0..=CLEAR_DEPTH).contains(&depth) {
            return false;
        }

        let i = y as usize * self.width as usize + x as usize;
        if depth > self.depth[i] {
            return false;
        }

        self.depth[i] = depth;
        self.color[i * 4..i * 4 + 4].copy_from_slice(&rgba);
        true
    }

    pub fn depth_at(&self, x: u32, y: u32) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.depth[y as usize * self.width as usize + x as usize])
    }

    /// Copy the colour buffer out as a frame
    pub fn to_frame(&self) -> ImageFrame {
        ImageFrame {
            width: self.width,
            height: self.height,
            data: self.color.clone(),
        }
    }
}
