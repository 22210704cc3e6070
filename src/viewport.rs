//! Surface dimensions.
//!
//! A [`Viewport`] is never smaller than 1×1. Container sizes come in as
//! signed values because layout can report zero or negative extents while a
//! window is collapsing; those are rejected with [`ViewportError`].

use thiserror::Error;

/// Largest surface area accepted, in pixels (512 MiB of RGBA8).
pub const MAX_VIEWPORT_PIXELS: u64 = 1 << 27;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportError {
    #[error("viewport must be at least 1x1, got {width}x{height}")]
    Degenerate { width: i64, height: i64 },
    #[error("viewport {width}x{height} exceeds the maximum surface area")]
    TooLarge { width: i64, height: i64 },
}

/// Pixel dimensions of the render surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    width: u32,
    height: u32,
}

impl Viewport {
    pub fn new(width: i64, height: i64) -> Result<Self, ViewportError> {
        if width < 1 || height < 1 {
            return Err(ViewportError::Degenerate { width, height });
        }
        let too_large = ViewportError::TooLarge { width, height };
        let (Ok(w), Ok(h)) = (u32::try_from(width), u32::try_from(height)) else {
            return Err(too_large);
        };
        if u64::from(w) * u64::from(h) > MAX_VIEWPORT_PIXELS {
            return Err(too_large);
        }
        Ok(Self {
            width: w,
            height: h,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn center(&self) -> (f64, f64) {
        (self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}
