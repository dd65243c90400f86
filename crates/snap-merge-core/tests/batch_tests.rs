use image::{Rgba, RgbaImage};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::tempdir;

use snap_merge_core::clock::CreationClock;
use snap_merge_core::error::Result;
use snap_merge_core::imaging::{CropRect, Dimensions, ImageTool, NativeTool};
use snap_merge_core::{
    AppConfig, BatchProcessor, Error, Lang, Outcome, RunReporter, RunStats, SilentReporter,
};

const RED: [u8; 4] = [255, 0, 0, 255];
const BLUE: [u8; 4] = [0, 0, 255, 255];

/// Creation times keyed by file name; unknown names fail like an unreadable stat.
struct FixedClock(HashMap<String, SystemTime>);

impl FixedClock {
    fn new(offsets: &[(&str, u64)]) -> Self {
        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        FixedClock(
            offsets
                .iter()
                .map(|(name, secs)| (name.to_string(), base + Duration::from_secs(*secs)))
                .collect(),
        )
    }
}

impl CreationClock for FixedClock {
    fn created(&self, path: &Path) -> io::Result<SystemTime> {
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        self.0
            .get(&name)
            .copied()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::Other, format!("no birth time for {}", name))
            })
    }
}

/// Reads real dimensions but every merge fails.
struct BrokenMerge;

impl ImageTool for BrokenMerge {
    fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        NativeTool.dimensions(path)
    }

    fn crop_and_composite(
        &self,
        _base: &Path,
        _overlay_target: &Path,
        _crop: CropRect,
        _paste_at: (u32, u32),
        _output: &Path,
    ) -> Result<()> {
        Err(Error::Image("disk full".to_string()))
    }
}

/// Merges for real, then deletes the overlay target so it cannot be filed.
struct VanishingTarget;

impl ImageTool for VanishingTarget {
    fn dimensions(&self, path: &Path) -> Result<Dimensions> {
        NativeTool.dimensions(path)
    }

    fn crop_and_composite(
        &self,
        base: &Path,
        overlay_target: &Path,
        crop: CropRect,
        paste_at: (u32, u32),
        output: &Path,
    ) -> Result<()> {
        NativeTool.crop_and_composite(base, overlay_target, crop, paste_at, output)?;
        fs::remove_file(overlay_target)?;
        Ok(())
    }
}

#[derive(Default)]
struct RecordingReporter {
    events: RefCell<Vec<String>>,
}

impl RunReporter for RecordingReporter {
    fn on_scan_complete(&self, candidates: usize) {
        self.events.borrow_mut().push(format!("scan {}", candidates));
    }
    fn on_merged(&self, lead: &Path, trailing: &Path, _output: &Path) {
        self.events
            .borrow_mut()
            .push(format!("merged {} {}", name(lead), name(trailing)));
    }
    fn on_archived(&self, file: &Path, _reason: &str) {
        self.events.borrow_mut().push(format!("archived {}", name(file)));
    }
    fn on_discarded(&self, file: &Path, _reason: &str) {
        self.events.borrow_mut().push(format!("discarded {}", name(file)));
    }
    fn on_run_complete(&self, stats: &RunStats) {
        self.events.borrow_mut().push(format!("done {}", stats.evaluated));
    }
}

fn name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

fn write_png(dir: &Path, file: &str, width: u32, height: u32, color: [u8; 4]) -> PathBuf {
    let path = dir.join(file);
    RgbaImage::from_pixel(width, height, Rgba(color)).save(&path).unwrap();
    path
}

fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .flatten()
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn processor_with(
    dir: &Path,
    lang: Lang,
    tool: Box<dyn ImageTool>,
    clock: FixedClock,
) -> BatchProcessor {
    BatchProcessor::new(AppConfig::for_dir(dir), lang, tool)
        .unwrap()
        .with_clock(Box::new(clock))
}

fn processor(dir: &Path, clock: FixedClock) -> BatchProcessor {
    processor_with(dir, Lang::En, Box::new(NativeTool), clock)
}

#[test]
fn test_matching_pair_is_merged_and_filed() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 10)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(
        report.stats,
        RunStats { total: 2, merged: 1, errors: 0, skipped: 0, evaluated: 1 }
    );
    assert_eq!(names_in(&dir.join("processed")), vec!["a.png", "b.png"]);
    assert!(names_in(&dir.join("error")).is_empty());

    let done = names_in(&dir.join("done"));
    assert_eq!(done.len(), 1, "expected one output, got {:?}", done);
    assert!(done[0].starts_with("merged_") && done[0].ends_with(".png"));
    // merged_ + 17 digit timestamp + .png
    assert_eq!(done[0].len(), "merged_".len() + 17 + ".png".len());

    // bottom-right 150x75 comes from a, the rest from b
    let merged = image::open(&report.outputs[0]).unwrap().to_rgba8();
    assert_eq!(merged.get_pixel(299, 299), &Rgba(RED));
    assert_eq!(merged.get_pixel(150, 225), &Rgba(RED));
    assert_eq!(merged.get_pixel(149, 299), &Rgba(BLUE));
    assert_eq!(merged.get_pixel(299, 224), &Rgba(BLUE));

    assert_eq!(names_in(dir), vec!["done", "error", "processed"]);
}

#[test]
fn test_time_exceeded_archives_lead_and_keeps_trailing() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);
    write_png(dir, "c.png", 300, 300, RED);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 61), ("c.png", 70)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(report.stats.merged, 1);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.evaluated, 2);
    assert_eq!(names_in(&dir.join("error")), vec!["a.png"]);
    assert_eq!(names_in(&dir.join("processed")), vec!["b.png", "c.png"]);

    let archived = &report.dispositions[0];
    assert_eq!(archived.outcome, Outcome::Archived);
    assert!(archived.file.ends_with("a.png"));
    let reason = archived.reason.as_deref().unwrap();
    assert!(reason.contains("60 seconds"), "reason: {}", reason);
    assert!(reason.contains("61.0s"), "reason: {}", reason);
}

#[test]
fn test_exactly_sixty_seconds_is_too_late() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 60)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(report.stats.merged, 0);
    // a fails the time gate, b is then the lone remaining file
    assert_eq!(report.stats.errors, 2);
    assert_eq!(names_in(&dir.join("error")), vec!["a.png", "b.png"]);
    assert_eq!(
        report.dispositions[1].reason.as_deref(),
        Some("Single file remaining in queue")
    );
}

#[test]
fn test_different_sizes_archives_lead() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 400, 400, BLUE);
    write_png(dir, "c.png", 400, 400, RED);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 5), ("c.png", 10)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(names_in(&dir.join("error")), vec!["a.png"]);
    assert_eq!(names_in(&dir.join("processed")), vec!["b.png", "c.png"]);
    assert_eq!(
        report.dispositions[0].reason.as_deref(),
        Some("Different sizes: 300x300 vs 400x400")
    );
    assert_eq!(report.stats.merged, 1);
}

#[test]
fn test_unsupported_ratio_lead_is_left_in_place() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "odd.png", 50, 70, RED);
    write_png(dir, "b.png", 300, 300, BLUE);
    write_png(dir, "c.png", 300, 300, RED);

    let clock = FixedClock::new(&[("odd.png", 0), ("b.png", 1), ("c.png", 2)]);
    let reporter = RecordingReporter::default();
    let report = processor(dir, clock).run(&reporter).unwrap();

    assert!(dir.join("odd.png").exists());
    assert_eq!(names_in(&dir.join("processed")), vec!["b.png", "c.png"]);
    assert!(names_in(&dir.join("error")).is_empty());
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(
        report.dispositions[0].reason.as_deref(),
        Some("Unsupported aspect ratio: 5:7")
    );
    assert_eq!(
        *reporter.events.borrow(),
        vec!["scan 3", "discarded odd.png", "merged b.png c.png", "done 2"]
    );
}

#[test]
fn test_single_unsupported_file_is_untouched() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    let path = write_png(dir, "odd.png", 50, 70, RED);
    let before = fs::read(&path).unwrap();

    let clock = FixedClock::new(&[("odd.png", 0)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(fs::read(&path).unwrap(), before);
    assert!(names_in(&dir.join("error")).is_empty());
    assert!(names_in(&dir.join("processed")).is_empty());
    assert_eq!(report.stats.total, 1);
    assert_eq!(report.stats.errors, 0);
    assert_eq!(report.stats.evaluated, 0);
}

#[test]
fn test_single_allowed_file_is_archived() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "alone.png", 300, 300, RED);

    let clock = FixedClock::new(&[("alone.png", 0)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(names_in(&dir.join("error")), vec!["alone.png"]);
    assert_eq!(report.stats.errors, 1);
}

#[test]
fn test_empty_directory_only_creates_folders() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();

    let report = processor(dir, FixedClock::new(&[])).run(&SilentReporter).unwrap();

    assert_eq!(report.stats, RunStats::default());
    assert_eq!(names_in(dir), vec!["done", "error", "processed"]);
    for sub in ["done", "error", "processed"] {
        assert!(names_in(&dir.join(sub)).is_empty());
    }
}

#[test]
fn test_rerun_after_drain_is_noop() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 1)]);
    let processor = processor(dir, clock);
    processor.run(&SilentReporter).unwrap();
    let done_before = names_in(&dir.join("done"));

    let second = processor.run(&SilentReporter).unwrap();
    assert_eq!(second.stats, RunStats::default());
    assert_eq!(names_in(&dir.join("done")), done_before);
    assert_eq!(names_in(&dir.join("processed")), vec!["a.png", "b.png"]);
}

#[test]
fn test_merge_failure_archives_lead_with_error() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 1)]);
    let report = processor_with(dir, Lang::En, Box::new(BrokenMerge), clock)
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(report.stats.merged, 0);
    assert_eq!(report.stats.errors, 2);
    assert_eq!(report.stats.evaluated, 1);
    assert_eq!(names_in(&dir.join("error")), vec!["a.png", "b.png"]);
    assert!(names_in(&dir.join("done")).is_empty());
    let reason = report.dispositions[0].reason.as_deref().unwrap();
    assert!(reason.contains("disk full"), "reason: {}", reason);
}

#[test]
fn test_image_too_small_for_crop_is_archived() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 100, 100, RED);
    write_png(dir, "b.png", 100, 100, BLUE);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 1)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(names_in(&dir.join("error")), vec!["a.png", "b.png"]);
    assert!(names_in(&dir.join("done")).is_empty());
    let reason = report.dispositions[0].reason.as_deref().unwrap();
    assert!(reason.contains("smaller than"), "reason: {}", reason);
}

#[test]
fn test_unreadable_lead_is_archived() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    fs::write(dir.join("broken.png"), b"definitely not a png").unwrap();
    write_png(dir, "b.png", 300, 300, BLUE);
    write_png(dir, "c.png", 300, 300, RED);

    let clock = FixedClock::new(&[("broken.png", 0), ("b.png", 1), ("c.png", 2)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    assert_eq!(names_in(&dir.join("error")), vec!["broken.png"]);
    assert_eq!(names_in(&dir.join("processed")), vec!["b.png", "c.png"]);
    assert_eq!(report.stats.errors, 1);
    assert_eq!(report.stats.merged, 1);
}

#[test]
fn test_unreadable_trailing_archives_lead() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    fs::write(dir.join("broken.png"), b"nope").unwrap();

    let clock = FixedClock::new(&[("a.png", 0), ("broken.png", 1)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    // a cannot be paired; broken.png is then alone and its size is unknown
    assert_eq!(names_in(&dir.join("error")), vec!["a.png", "broken.png"]);
    assert_eq!(report.stats.errors, 2);
}

#[test]
fn test_unknown_creation_time_sorts_last_and_fails_pair() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);
    write_png(dir, "c.png", 300, 300, RED);
    write_png(dir, "d.png", 300, 300, BLUE);

    // d has no readable creation time
    let clock = FixedClock::new(&[("c.png", 0), ("a.png", 1), ("b.png", 2)]);
    let report = processor(dir, clock).run(&SilentReporter).unwrap();

    // (c, a) merge, then (b, d) fails on the time check
    assert_eq!(names_in(&dir.join("processed")), vec!["a.png", "c.png"]);
    assert_eq!(names_in(&dir.join("error")), vec!["b.png", "d.png"]);
    let reason = report.dispositions[2].reason.as_deref().unwrap();
    assert!(reason.contains("creation time"), "reason: {}", reason);
}

#[test]
fn test_reasons_follow_configured_language() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);

    let clock = FixedClock::new(&[("a.png", 0)]);
    let report = processor_with(dir, Lang::Zh, Box::new(NativeTool), clock)
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(report.dispositions[0].reason.as_deref(), Some("队列中剩余单个文件"));
}

#[test]
fn test_other_extensions_and_ignored_names_are_not_candidates() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    fs::write(dir.join("notes.txt"), b"hello").unwrap();
    write_png(dir, "keep_out.png", 300, 300, BLUE);

    let mut config = AppConfig::for_dir(dir);
    config.ignore_patterns = vec!["keep_*".to_string()];
    let clock = FixedClock::new(&[("a.png", 0), ("keep_out.png", 1)]);
    let report = BatchProcessor::new(config, Lang::En, Box::new(NativeTool))
        .unwrap()
        .with_clock(Box::new(clock))
        .run(&SilentReporter)
        .unwrap();

    assert_eq!(report.stats.total, 1);
    assert!(dir.join("notes.txt").exists());
    assert!(dir.join("keep_out.png").exists());
}

#[test]
fn test_invalid_config_is_rejected() {
    let tmp = tempdir().unwrap();
    let mut config = AppConfig::for_dir(tmp.path());
    config.allowed_ratios = vec!["square".to_string()];
    assert!(BatchProcessor::new(config, Lang::En, Box::new(NativeTool)).is_err());
}

#[test]
fn test_missing_work_dir_parent_is_fatal() {
    let tmp = tempdir().unwrap();
    let file = tmp.path().join("not_a_dir");
    fs::write(&file, b"").unwrap();

    let result = processor(&file, FixedClock::new(&[])).run(&SilentReporter);
    assert!(result.is_err());
}

#[test]
fn test_filing_failure_after_merge_still_counts_merge() {
    let tmp = tempdir().unwrap();
    let dir = tmp.path();
    write_png(dir, "a.png", 300, 300, RED);
    write_png(dir, "b.png", 300, 300, BLUE);
    write_png(dir, "c.png", 300, 300, RED);

    let clock = FixedClock::new(&[("a.png", 0), ("b.png", 1), ("c.png", 2)]);
    let report = processor_with(dir, Lang::En, Box::new(VanishingTarget), clock)
        .run(&SilentReporter)
        .unwrap();

    // the output exists, so the run reports it and never reuses b
    let done = names_in(&dir.join("done"));
    assert_eq!(done.len(), 1, "expected one output, got {:?}", done);
    assert_eq!(report.outputs.len(), 1);
    assert_eq!(report.stats.merged, 1);
    assert_eq!(report.stats.evaluated, 1);

    assert_eq!(names_in(&dir.join("processed")), vec!["a.png"]);
    let lead = &report.dispositions[0];
    assert!(lead.file.ends_with("a.png"));
    assert_eq!(lead.outcome, Outcome::Merged);
    assert!(lead.destination.is_some());

    let trailing = &report.dispositions[1];
    assert!(trailing.file.ends_with("b.png"));
    assert_eq!(trailing.outcome, Outcome::Merged);
    assert!(trailing.destination.is_none());
    assert!(trailing.reason.is_some());

    // c is left alone and archived as the single remaining file
    assert_eq!(names_in(&dir.join("error")), vec!["c.png"]);
    assert_eq!(report.stats.errors, 1);
}
