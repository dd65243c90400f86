use crate::error::{Error, Result};
use crate::i18n::Lang;
use crate::ratio::{self, AspectRatio, DEFAULT_ALLOWED_RATIOS};
use config::{Config, ConfigError, Environment, File as ConfigFile};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Which implementation performs the pixel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Shell out to ImageMagick.
    Magick,
    /// Decode and composite in-process.
    Native,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "magick" => Ok(Backend::Magick),
            "native" => Ok(Backend::Native),
            other => Err(format!("unknown backend '{}'", other)),
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Magick => write!(f, "magick"),
            Backend::Native => write!(f, "native"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub work_dir: PathBuf,
    /// Extension of candidate files, without the dot.
    pub extension: String,
    /// Glob patterns matched against file names; matching files are never candidates.
    pub ignore_patterns: Vec<String>,
    pub max_time_delta_secs: f64,
    pub crop_width: u32,
    pub crop_height: u32,
    pub allowed_ratios: Vec<String>,
    pub backend: Backend,
    pub magick_binary: String,
    /// `zh`, `en` or `auto`.
    pub lang: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            extension: "png".to_string(),
            ignore_patterns: Vec::new(),
            max_time_delta_secs: 60.0,
            crop_width: 150,
            crop_height: 75,
            allowed_ratios: DEFAULT_ALLOWED_RATIOS.iter().map(|r| r.to_string()).collect(),
            backend: Backend::Magick,
            magick_binary: "magick".to_string(),
            lang: "auto".to_string(),
        }
    }
}

impl AppConfig {
    /// Config for processing `work_dir` with every other value defaulted.
    pub fn for_dir(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(Error::Other("extension must not be empty".to_string()));
        }
        if self.crop_width == 0 || self.crop_height == 0 {
            return Err(Error::Other(format!(
                "crop region {}x{} must have non-zero sides",
                self.crop_width, self.crop_height
            )));
        }
        if self.max_time_delta_secs.is_nan() || self.max_time_delta_secs <= 0.0 {
            return Err(Error::Other(format!(
                "max_time_delta_secs must be positive, got {}",
                self.max_time_delta_secs
            )));
        }
        if !self.lang.trim().eq_ignore_ascii_case("auto") && self.lang.parse::<Lang>().is_err() {
            return Err(Error::Other(format!(
                "lang must be zh, en or auto, got '{}'",
                self.lang
            )));
        }
        self.ratios()?;
        for pattern in &self.ignore_patterns {
            glob::Pattern::new(pattern)
                .map_err(|e| Error::Other(format!("invalid ignore pattern '{}': {}", pattern, e)))?;
        }
        Ok(())
    }

    /// The allow-list, reduced to lowest terms.
    pub fn ratios(&self) -> Result<Vec<AspectRatio>> {
        ratio::parse_ratios(&self.allowed_ratios).map_err(Error::Other)
    }

    pub fn extension(&self) -> &str {
        self.extension.trim_start_matches('.')
    }
}

fn default_work_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join("Downloads"))
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Layer an optional `Config.toml` (or the given file, which must then exist)
/// under `SNAP_MERGE_*` environment variables.
pub fn load_configuration(path: Option<&Path>) -> std::result::Result<AppConfig, ConfigError> {
    let file_source = match path {
        Some(p) => ConfigFile::from(p).required(true),
        None => ConfigFile::with_name("Config").required(false),
    };
    let builder = Config::builder()
        .add_source(file_source)
        .add_source(
            Environment::with_prefix("SNAP_MERGE")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("allowed_ratios")
                .with_list_parse_key("ignore_patterns"),
        )
        .build()?;
    builder.try_deserialize::<AppConfig>()
}
