use std::fs;
use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// Source of file creation times.
pub trait CreationClock {
    fn created(&self, path: &Path) -> io::Result<SystemTime>;
}

/// Reads the filesystem birth time, or the modification time on platforms and
/// filesystems that do not record one.
pub struct FsClock;

impl CreationClock for FsClock {
    fn created(&self, path: &Path) -> io::Result<SystemTime> {
        let metadata = fs::metadata(path)?;
        metadata.created().or_else(|_| metadata.modified())
    }
}

/// Absolute distance between two instants.
pub fn abs_diff(a: SystemTime, b: SystemTime) -> Duration {
    match a.duration_since(b) {
        Ok(d) => d,
        Err(e) => e.duration(),
    }
}
