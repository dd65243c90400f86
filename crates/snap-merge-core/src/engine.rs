use crate::clock::{self, CreationClock, FsClock};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::filing::{self, Folders};
use crate::i18n::Lang;
use crate::imaging::{self, CropRect, Dimensions, ImageTool};
use crate::matcher::{MatchRules, MatchVerdict, RejectReason};
use crate::progress::RunReporter;
use crate::ratio::AspectRatio;
use crate::scanner::{self, Candidate};
use chrono::Local;
use glob::Pattern;
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Pairs, merges and files the screenshots of one work directory.
pub struct BatchProcessor {
    config: AppConfig,
    lang: Lang,
    rules: MatchRules,
    ignore_patterns: Vec<Pattern>,
    tool: Box<dyn ImageTool>,
    clock: Box<dyn CreationClock>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunStats {
    /// Candidates found by the scan.
    pub total: usize,
    /// Pairs merged.
    pub merged: usize,
    /// Files moved to `error/`.
    pub errors: usize,
    /// Files left in place because of their ratio.
    pub skipped: usize,
    /// Loop iterations, i.e. pairs looked at.
    pub evaluated: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Merged,
    Archived,
    Discarded,
}

/// What happened to one input file.
#[derive(Debug, Clone)]
pub struct Disposition {
    pub file: PathBuf,
    pub outcome: Outcome,
    pub reason: Option<String>,
    /// Where the file ended up; `None` when it was left in place.
    pub destination: Option<PathBuf>,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub stats: RunStats,
    pub dispositions: Vec<Disposition>,
    pub outputs: Vec<PathBuf>,
    pub duration: Duration,
}

struct RunContext<'r> {
    folders: Folders,
    report: RunReport,
    reporter: &'r dyn RunReporter,
}

impl BatchProcessor {
    pub fn new(config: AppConfig, lang: Lang, tool: Box<dyn ImageTool>) -> Result<Self> {
        config.validate()?;
        let rules = MatchRules {
            allowed: config.ratios()?,
            max_delta_secs: config.max_time_delta_secs,
        };
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .map(|p| Pattern::new(p).map_err(|e| Error::Other(e.to_string())))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            config,
            lang,
            rules,
            ignore_patterns,
            tool,
            clock: Box::new(FsClock),
        })
    }

    /// Processor using the image backend named in `config`.
    pub fn from_config(config: AppConfig, lang: Lang) -> Result<Self> {
        let tool = imaging::tool_for(&config);
        Self::new(config, lang, tool)
    }

    pub fn with_clock(mut self, clock: Box<dyn CreationClock>) -> Self {
        self.clock = clock;
        self
    }

    /// One pass over the work directory:
    /// 1. Ensure the holding folders and list candidates
    /// 2. Sort by creation time
    /// 3. Pair off from the oldest end, merging or disposing of each lead file
    /// 4. Dispose of a final unpaired file
    pub fn run(&self, reporter: &dyn RunReporter) -> Result<RunReport> {
        let started = Instant::now();
        let work_dir = &self.config.work_dir;

        let folders = Folders::new(work_dir);
        folders.ensure()?;

        info!("Scanning {} for *.{} files...", work_dir.display(), self.config.extension());
        let paths =
            scanner::list_candidates(work_dir, self.config.extension(), &self.ignore_patterns)?;
        let mut queue: VecDeque<Candidate> =
            scanner::order_by_creation(paths, self.clock.as_ref()).into();

        let mut ctx = RunContext {
            folders,
            report: RunReport::default(),
            reporter,
        };
        ctx.report.stats.total = queue.len();
        reporter.on_scan_complete(queue.len());
        debug!("{} candidates queued", queue.len());

        while queue.len() >= 2 {
            let Some(mut lead) = queue.pop_front() else {
                break;
            };
            let Some(trailing) = queue.front_mut() else {
                break;
            };
            reporter.on_pair_start(&lead.path, &trailing.path);
            debug!("Checking pair: {} & {}", lead.file_name(), trailing.file_name());

            match self.process_pair(&mut lead, trailing, &mut ctx) {
                Ok(true) => {
                    queue.pop_front();
                }
                Ok(false) => {}
                Err(err) => self.recover(&mut lead, err, &mut ctx),
            }
            ctx.report.stats.evaluated += 1;
        }

        if let Some(mut last) = queue.pop_front() {
            self.dispose_of_remaining(&mut last, &mut ctx);
        }

        ctx.report.duration = started.elapsed();
        reporter.on_run_complete(&ctx.report.stats);
        Ok(ctx.report)
    }

    /// Returns whether `trailing` was consumed along with `lead`.
    fn process_pair(
        &self,
        lead: &mut Candidate,
        trailing: &mut Candidate,
        ctx: &mut RunContext<'_>,
    ) -> Result<bool> {
        let lead_dims = self.dimensions(lead)?;
        let trailing_dims = self.dimensions(trailing)?;

        let verdict = self
            .rules
            .check(lead_dims, trailing_dims, || time_delta_secs(lead, trailing))?;

        match verdict {
            MatchVerdict::Proceed => {
                debug!("Match successful");
                let output = self.merge(lead, trailing, lead_dims, &ctx.folders)?;
                // The output exists from here on, so both inputs are consumed
                // even if filing one of them fails.
                ctx.report.outputs.push(output.clone());
                ctx.report.stats.merged += 1;
                self.file_merged(lead, ctx);
                self.file_merged(trailing, ctx);

                info!("Successfully merged: {} + {}", lead.file_name(), trailing.file_name());
                ctx.reporter.on_merged(&lead.path, &trailing.path, &output);
                Ok(true)
            }
            MatchVerdict::Discard(reason) => {
                self.discard(lead, &reason, ctx);
                Ok(false)
            }
            MatchVerdict::Archive(reason) => {
                self.archive(lead, &reason, ctx)?;
                Ok(false)
            }
        }
    }

    fn merge(
        &self,
        lead: &Candidate,
        trailing: &Candidate,
        dims: Dimensions,
        folders: &Folders,
    ) -> Result<PathBuf> {
        let crop = CropRect::bottom_right(dims, self.config.crop_width, self.config.crop_height)?;
        let output = filing::merged_output_path(&folders.done, &Local::now());
        self.tool
            .crop_and_composite(&lead.path, &trailing.path, crop, (crop.x, crop.y), &output)
            .map_err(|e| Error::Image(format!("failed to merge images: {}", e)))?;
        debug!("Merge completed: {}", output.display());
        Ok(output)
    }

    /// A pair failed unexpectedly; file the lead according to its ratio.
    fn recover(&self, lead: &mut Candidate, err: Error, ctx: &mut RunContext<'_>) {
        error!("Processing error: {}", err);
        let reason = RejectReason::Failed(err.to_string());
        match self.dimensions(lead) {
            Ok(dims) if !self.rules.is_allowed(dims) => {
                let ratio = AspectRatio::of(dims.width, dims.height);
                self.discard(lead, &RejectReason::UnsupportedRatio(ratio), ctx);
            }
            Ok(_) => self.archive_or_log(lead, &reason, ctx),
            Err(size_err) => {
                warn!("Cannot read dimensions of {}: {}", lead.file_name(), size_err);
                self.archive_or_log(lead, &reason, ctx);
            }
        }
    }

    fn dispose_of_remaining(&self, last: &mut Candidate, ctx: &mut RunContext<'_>) {
        match self.dimensions(last) {
            Ok(dims) if !self.rules.is_allowed(dims) => {
                let ratio = AspectRatio::of(dims.width, dims.height);
                self.discard(last, &RejectReason::UnsupportedRatio(ratio), ctx);
            }
            Ok(_) => self.archive_or_log(last, &RejectReason::SingleRemaining, ctx),
            Err(err) => {
                warn!("Cannot read dimensions of {}: {}", last.file_name(), err);
                self.archive_or_log(last, &RejectReason::SingleRemaining, ctx);
            }
        }
    }

    fn archive(
        &self,
        candidate: &Candidate,
        reason: &RejectReason,
        ctx: &mut RunContext<'_>,
    ) -> Result<()> {
        let text = reason.describe(self.lang);
        let dest = filing::move_into(&candidate.path, &ctx.folders.error)?;
        info!("Moved to error: {} ({})", candidate.file_name(), text);
        ctx.reporter.on_archived(&candidate.path, &text);
        ctx.record(candidate, Outcome::Archived, Some(text), Some(dest));
        ctx.report.stats.errors += 1;
        Ok(())
    }

    /// Move one input of a completed merge into `processed/`. A failed move
    /// is recorded with the error as reason and no destination.
    fn file_merged(&self, candidate: &Candidate, ctx: &mut RunContext<'_>) {
        match filing::move_into(&candidate.path, &ctx.folders.processed) {
            Ok(dest) => ctx.record(candidate, Outcome::Merged, None, Some(dest)),
            Err(err) => {
                error!(
                    "Error moving merged file {} to processed folder: {}",
                    candidate.path.display(),
                    err
                );
                ctx.record(candidate, Outcome::Merged, Some(err.to_string()), None);
            }
        }
    }

    fn archive_or_log(
        &self,
        candidate: &Candidate,
        reason: &RejectReason,
        ctx: &mut RunContext<'_>,
    ) {
        if let Err(err) = self.archive(candidate, reason, ctx) {
            error!("Error moving {} to error folder: {}", candidate.path.display(), err);
        }
    }

    fn discard(&self, candidate: &Candidate, reason: &RejectReason, ctx: &mut RunContext<'_>) {
        let text = reason.describe(self.lang);
        info!("Skipped file: {} ({})", candidate.file_name(), text);
        ctx.reporter.on_discarded(&candidate.path, &text);
        ctx.record(candidate, Outcome::Discarded, Some(text), None);
        ctx.report.stats.skipped += 1;
    }

    fn dimensions(&self, candidate: &mut Candidate) -> Result<Dimensions> {
        if let Some(dims) = candidate.dimensions {
            return Ok(dims);
        }
        let dims = self.tool.dimensions(&candidate.path).map_err(|e| {
            Error::Image(format!("failed to get size of {}: {}", candidate.file_name(), e))
        })?;
        candidate.dimensions = Some(dims);
        Ok(dims)
    }
}

impl RunContext<'_> {
    fn record(
        &mut self,
        candidate: &Candidate,
        outcome: Outcome,
        reason: Option<String>,
        destination: Option<PathBuf>,
    ) {
        self.report.dispositions.push(Disposition {
            file: candidate.path.clone(),
            outcome,
            reason,
            destination,
        });
    }
}

fn time_delta_secs(a: &Candidate, b: &Candidate) -> Result<f64> {
    let a_time = a.created.ok_or_else(|| Error::Timestamp(a.path.clone()))?;
    let b_time = b.created.ok_or_else(|| Error::Timestamp(b.path.clone()))?;
    Ok(clock::abs_diff(a_time, b_time).as_secs_f64())
}
