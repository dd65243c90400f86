use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use snap_merge_core::i18n::{Lang, Text};
use snap_merge_core::{RunReporter, RunStats};
use std::cell::RefCell;
use std::path::Path;

/// CLI progress reporter: one bar over consumed files, with a line per
/// merged, archived or skipped file printed above it.
pub struct CliReporter {
    lang: Lang,
    show_bar: bool,
    bar: RefCell<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new(lang: Lang, show_bar: bool) -> Self {
        Self {
            lang,
            show_bar,
            bar: RefCell::new(None),
        }
    }

    fn line(&self, msg: String) {
        match self.bar.borrow().as_ref() {
            Some(pb) => pb.println(msg),
            None => println!("{}", msg),
        }
    }

    fn advance(&self, files: u64) {
        if let Some(pb) = self.bar.borrow().as_ref() {
            pb.inc(files);
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl RunReporter for CliReporter {
    fn on_scan_complete(&self, candidates: usize) {
        if candidates == 0 {
            println!("{}", self.lang.text(Text::NoFiles).yellow());
            return;
        }
        println!(
            "{}: {}",
            self.lang.text(Text::Found).cyan(),
            candidates.to_string().cyan()
        );
        if !self.show_bar {
            return;
        }
        let pb = ProgressBar::new(candidates as u64);
        pb.set_style(
            ProgressStyle::with_template(
                "  {spinner:.cyan} [{bar:30.cyan/dim}] {pos}/{len} files",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
        );
        pb.enable_steady_tick(std::time::Duration::from_millis(80));
        *self.bar.borrow_mut() = Some(pb);
    }

    fn on_merged(&self, lead: &Path, trailing: &Path, output: &Path) {
        let msg = format!(
            "✅ {}: {} + {} -> {}",
            self.lang.text(Text::Merged),
            file_name(lead),
            file_name(trailing),
            file_name(output)
        );
        self.line(msg.green().to_string());
        self.advance(2);
    }

    fn on_archived(&self, file: &Path, reason: &str) {
        let msg = format!(
            "🗑️  {}: {} ({})",
            self.lang.text(Text::MovedToError),
            file_name(file),
            reason
        );
        self.line(msg.red().to_string());
        self.advance(1);
    }

    fn on_discarded(&self, file: &Path, reason: &str) {
        let msg = format!(
            "⚠️  {}: {} ({})",
            self.lang.text(Text::Skipped),
            file_name(file),
            reason
        );
        self.line(msg.yellow().to_string());
        self.advance(1);
    }

    fn on_run_complete(&self, _stats: &RunStats) {
        if let Some(pb) = self.bar.borrow_mut().take() {
            pb.finish_and_clear();
        }
    }
}
