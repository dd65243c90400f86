use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Interface language. Chosen once at start-up and passed down explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    Zh,
    En,
}

/// Fixed user-facing phrases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    AppTitle,
    WorkDir,
    Success,
    Failure,
    NoFiles,
    Found,
    Merged,
    MovedToError,
    Skipped,
    StatsTitle,
    StatsTotal,
    StatsMerged,
    StatsErrors,
    StatsSkipped,
    StatsEvaluated,
    StatsDuration,
}

impl Lang {
    /// Resolve a `zh`, `en` or `auto` request. `auto` looks at the locale string,
    /// typically `$LANG`.
    pub fn resolve(requested: &str, locale: Option<&str>) -> Lang {
        match requested.parse::<Lang>() {
            Ok(lang) => lang,
            Err(_) => match locale {
                Some(l) if l.to_ascii_lowercase().starts_with("zh") => Lang::Zh,
                _ => Lang::En,
            },
        }
    }

    /// Resolve against the process environment (`LANG`, then `LANGUAGE`).
    pub fn from_env(requested: &str) -> Lang {
        let locale = std::env::var("LANG")
            .ok()
            .filter(|l| !l.is_empty())
            .or_else(|| std::env::var("LANGUAGE").ok());
        Lang::resolve(requested, locale.as_deref())
    }

    pub fn text(self, text: Text) -> &'static str {
        match self {
            Lang::Zh => match text {
                Text::AppTitle => "图片合并工具启动",
                Text::WorkDir => "工作目录",
                Text::Success => "处理完成!",
                Text::Failure => "处理失败:",
                Text::NoFiles => "未找到图片文件",
                Text::Found => "找到图片文件",
                Text::Merged => "成功合并",
                Text::MovedToError => "移动到error",
                Text::Skipped => "跳过文件",
                Text::StatsTitle => "处理统计:",
                Text::StatsTotal => "总文件数",
                Text::StatsMerged => "成功合并",
                Text::StatsErrors => "错误文件",
                Text::StatsSkipped => "跳过文件",
                Text::StatsEvaluated => "已处理",
                Text::StatsDuration => "耗时",
            },
            Lang::En => match text {
                Text::AppTitle => "Image Merge Tool Started",
                Text::WorkDir => "Work Directory",
                Text::Success => "Processing completed!",
                Text::Failure => "Processing failed:",
                Text::NoFiles => "No image files found",
                Text::Found => "Image files found",
                Text::Merged => "Successfully merged",
                Text::MovedToError => "Moved to error",
                Text::Skipped => "Skipped file",
                Text::StatsTitle => "Processing Statistics:",
                Text::StatsTotal => "Total files",
                Text::StatsMerged => "Successfully merged",
                Text::StatsErrors => "Error files",
                Text::StatsSkipped => "Skipped files",
                Text::StatsEvaluated => "Processed",
                Text::StatsDuration => "Duration",
            },
        }
    }
}

impl FromStr for Lang {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" => Ok(Lang::Zh),
            "en" => Ok(Lang::En),
            other => Err(format!("unknown language '{}'", other)),
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lang::Zh => write!(f, "zh"),
            Lang::En => write!(f, "en"),
        }
    }
}
