use crate::error::Result;
use chrono::{DateTime, TimeZone};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The three holding folders under a work directory.
#[derive(Debug, Clone)]
pub struct Folders {
    pub processed: PathBuf,
    pub error: PathBuf,
    pub done: PathBuf,
}

impl Folders {
    pub fn new(work_dir: &Path) -> Self {
        Self {
            processed: work_dir.join("processed"),
            error: work_dir.join("error"),
            done: work_dir.join("done"),
        }
    }

    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.processed, &self.error, &self.done] {
            fs::create_dir_all(dir)?;
        }
        debug!("Ensured holding folders exist");
        Ok(())
    }
}

/// Move `file` into `dir`, keeping its name unless that name is already taken.
/// Returns the new path.
pub fn move_into(file: &Path, dir: &Path) -> Result<PathBuf> {
    let file_name = file.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", file.display()),
        )
    })?;
    let target = unique_path(&dir.join(file_name));
    move_file(file, &target)?;
    Ok(target)
}

/// `done/merged_<YYYYMMDDHHMMSSmmm>.png` for the given instant.
pub fn merged_output_path<Tz: TimeZone>(done: &Path, now: &DateTime<Tz>) -> PathBuf
where
    Tz::Offset: std::fmt::Display,
{
    let name = format!("merged_{}.png", now.format("%Y%m%d%H%M%S%3f"));
    unique_path(&done.join(name))
}

/// `path` if it is free, else the first free `stem_<n>.ext`.
fn unique_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    let mut n = 1u32;
    loop {
        let candidate = parent.join(format!("{}_{}{}", stem, n, ext));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) => {
            // rename cannot cross filesystems; fall back to copy + remove
            if !from.is_file() {
                return Err(rename_err);
            }
            fs::copy(from, to).map_err(|_| rename_err)?;
            fs::remove_file(from)
        }
    }
}
