pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod filing;
pub mod i18n;
pub mod imaging;
pub mod matcher;
pub mod progress;
pub mod ratio;
pub mod scanner;

pub use crate::config::{AppConfig, Backend};
pub use crate::engine::{BatchProcessor, Disposition, Outcome, RunReport, RunStats};
pub use crate::error::Error;
pub use i18n::Lang;
pub use crate::progress::{RunReporter, SilentReporter};
