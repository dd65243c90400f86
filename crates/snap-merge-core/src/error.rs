use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Failed to scan {}: {source}", .dir.display())]
    Scan {
        dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Image error: {0}")]
    Image(String),

    #[error("Image {width}x{height} is smaller than the {crop_width}x{crop_height} crop region")]
    TooSmall {
        width: u32,
        height: u32,
        crop_width: u32,
        crop_height: u32,
    },

    #[error("Cannot read creation time of {}", .0.display())]
    Timestamp(PathBuf),

    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(err: image::ImageError) -> Self {
        Error::Image(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
