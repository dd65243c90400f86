use super::{CropRect, Dimensions, ImageTool};
use crate::error::{Error, Result};
use image::imageops;
use std::path::Path;

/// In-process backend built on the `image` crate.
pub struct NativeTool;

impl ImageTool for NativeTool {
    fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        let (width, height) = image::image_dimensions(path)?;
        Ok(Dimensions::new(width, height))
    }

    fn crop_and_composite(
        &self,
        base: &Path,
        overlay_target: &Path,
        crop: CropRect,
        paste_at: (u32, u32),
        output: &Path,
    ) -> Result<()> {
        let base_img = image::open(base)?;
        let base_dims = Dimensions::new(base_img.width(), base_img.height());
        if !crop.fits_within(base_dims) {
            return Err(Error::Image(format!(
                "crop {}x{}+{}+{} exceeds {} image {}",
                crop.width,
                crop.height,
                crop.x,
                crop.y,
                base_dims,
                base.display()
            )));
        }
        let patch = base_img.crop_imm(crop.x, crop.y, crop.width, crop.height);

        let mut target = image::open(overlay_target)?;
        imageops::overlay(&mut target, &patch, paste_at.0 as i64, paste_at.1 as i64);
        target.save(output)?;
        Ok(())
    }
}
