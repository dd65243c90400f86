pub mod magick;
pub mod native;

use crate::config::{AppConfig, Backend};
use crate::error::{Error, Result};
use std::fmt;
use std::path::Path;

pub use magick::MagickTool;
pub use native::NativeTool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Pixel rectangle with its origin at the top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    /// The `width`x`height` rectangle in the bottom-right corner of an image.
    pub fn bottom_right(image: Dimensions, width: u32, height: u32) -> Result<Self> {
        if image.width < width || image.height < height {
            return Err(Error::TooSmall {
                width: image.width,
                height: image.height,
                crop_width: width,
                crop_height: height,
            });
        }
        Ok(Self {
            x: image.width - width,
            y: image.height - height,
            width,
            height,
        })
    }

    pub fn fits_within(&self, image: Dimensions) -> bool {
        self.x as u64 + self.width as u64 <= image.width as u64
            && self.y as u64 + self.height as u64 <= image.height as u64
    }
}

/// Pixel operations the batch processor needs. Every call blocks.
pub trait ImageTool {
    fn dimensions(&self, path: &Path) -> Result<Dimensions>;

    /// Cut `crop` out of `base` and paste it onto `overlay_target` with its
    /// top-left corner at `paste_at`, writing the result to `output`.
    /// Neither input is modified.
    fn crop_and_composite(
        &self,
        base: &Path,
        overlay_target: &Path,
        crop: CropRect,
        paste_at: (u32, u32),
        output: &Path,
    ) -> Result<()>;
}

/// Build the backend selected in `config`.
pub fn tool_for(config: &AppConfig) -> Box<dyn ImageTool> {
    match config.backend {
        Backend::Magick => Box::new(MagickTool::new(&config.magick_binary)),
        Backend::Native => Box::new(NativeTool),
    }
}
