use super::{CropRect, Dimensions, ImageTool};
use crate::error::{Error, Result};
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};
use tracing::debug;

/// ImageMagick 7 driven through its `magick` entry point.
pub struct MagickTool {
    binary: String,
}

impl MagickTool {
    pub fn new(binary: &str) -> Self {
        Self {
            binary: binary.to_string(),
        }
    }

    fn run(&self, command: &mut Command) -> Result<Output> {
        debug!("Running {:?}", command);
        let output = command
            .output()
            .map_err(|e| Error::Image(format!("failed to run {}: {}", self.binary, e)))?;
        if !output.status.success() {
            return Err(Error::Image(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(output)
    }
}

impl ImageTool for MagickTool {
    fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        let output = self.run(
            Command::new(&self.binary)
                .args(["identify", "-quiet", "-format", "%w %h"])
                .arg(path),
        )?;
        parse_identify_output(&String::from_utf8_lossy(&output.stdout))
    }

    fn crop_and_composite(
        &self,
        base: &Path,
        overlay_target: &Path,
        crop: CropRect,
        paste_at: (u32, u32),
        output: &Path,
    ) -> Result<()> {
        let args = composite_args(base, overlay_target, crop, paste_at, output);
        self.run(Command::new(&self.binary).args(args))?;
        Ok(())
    }
}

/// `target ( base -crop WxH+X+Y +repage ) -geometry +PX+PY -composite output`:
/// the crop and the paste happen in one invocation, without a temporary file.
fn composite_args(
    base: &Path,
    overlay_target: &Path,
    crop: CropRect,
    paste_at: (u32, u32),
    output: &Path,
) -> Vec<OsString> {
    vec![
        overlay_target.into(),
        "(".into(),
        base.into(),
        "-crop".into(),
        format!("{}x{}+{}+{}", crop.width, crop.height, crop.x, crop.y).into(),
        "+repage".into(),
        ")".into(),
        "-geometry".into(),
        format!("+{}+{}", paste_at.0, paste_at.1).into(),
        "-composite".into(),
        output.into(),
    ]
}

/// Parse `identify -format "%w %h"` output. Multi-frame files print one pair
/// per frame; the first frame wins.
fn parse_identify_output(stdout: &str) -> Result<Dimensions> {
    let mut fields = stdout.split_whitespace();
    let parse = |field: Option<&str>| -> Result<u32> {
        field
            .and_then(|f| f.parse().ok())
            .ok_or_else(|| Error::Image(format!("unexpected identify output '{}'", stdout.trim())))
    };
    let width = parse(fields.next())?;
    let height = parse(fields.next())?;
    Ok(Dimensions::new(width, height))
}
