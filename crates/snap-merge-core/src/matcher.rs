use crate::error::Result;
use crate::i18n::Lang;
use crate::imaging::Dimensions;
use crate::ratio::AspectRatio;

/// Why a lead file was not merged.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    UnsupportedRatio(AspectRatio),
    DifferentSizes(Dimensions, Dimensions),
    TimeExceeded { delta_secs: f64, limit_secs: f64 },
    SingleRemaining,
    Failed(String),
}

impl RejectReason {
    pub fn describe(&self, lang: Lang) -> String {
        match (self, lang) {
            (RejectReason::UnsupportedRatio(r), Lang::Zh) => format!("宽高比不支持: {}", r),
            (RejectReason::UnsupportedRatio(r), Lang::En) => {
                format!("Unsupported aspect ratio: {}", r)
            }
            (RejectReason::DifferentSizes(a, b), Lang::Zh) => {
                format!("尺寸不同: {} vs {}", a, b)
            }
            (RejectReason::DifferentSizes(a, b), Lang::En) => {
                format!("Different sizes: {} vs {}", a, b)
            }
            (RejectReason::TimeExceeded { delta_secs, limit_secs }, Lang::Zh) => {
                format!("时间差超过{}秒: {:.1}秒", limit_secs, delta_secs)
            }
            (RejectReason::TimeExceeded { delta_secs, limit_secs }, Lang::En) => format!(
                "Time difference exceeds {} seconds: {:.1}s",
                limit_secs, delta_secs
            ),
            (RejectReason::SingleRemaining, Lang::Zh) => "队列中剩余单个文件".to_string(),
            (RejectReason::SingleRemaining, Lang::En) => {
                "Single file remaining in queue".to_string()
            }
            (RejectReason::Failed(msg), _) => msg.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchVerdict {
    /// Merge the pair.
    Proceed,
    /// Leave the lead file where it is.
    Discard(RejectReason),
    /// Move the lead file to `error/`.
    Archive(RejectReason),
}

/// The gates a pair must pass, checked in order: ratio, size, time.
#[derive(Debug, Clone)]
pub struct MatchRules {
    pub allowed: Vec<AspectRatio>,
    pub max_delta_secs: f64,
}

impl MatchRules {
    pub fn is_allowed(&self, dims: Dimensions) -> bool {
        self.allowed.contains(&AspectRatio::of(dims.width, dims.height))
    }

    /// `time_delta` is only consulted once the size gate has passed.
    pub fn check<F>(
        &self,
        lead: Dimensions,
        trailing: Dimensions,
        time_delta: F,
    ) -> Result<MatchVerdict>
    where
        F: FnOnce() -> Result<f64>,
    {
        let ratio = AspectRatio::of(lead.width, lead.height);
        if !self.allowed.contains(&ratio) {
            return Ok(MatchVerdict::Discard(RejectReason::UnsupportedRatio(ratio)));
        }

        if lead != trailing {
            return Ok(MatchVerdict::Archive(RejectReason::DifferentSizes(lead, trailing)));
        }

        let delta_secs = time_delta()?;
        if delta_secs >= self.max_delta_secs {
            return Ok(MatchVerdict::Archive(RejectReason::TimeExceeded {
                delta_secs,
                limit_secs: self.max_delta_secs,
            }));
        }

        Ok(MatchVerdict::Proceed)
    }
}
