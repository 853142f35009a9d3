use crate::importer::ImportObserver;
use crate::loader::{FileLoad, SkippedFile};
use crate::output::is_quiet;
use crate::resolver::RunDir;
use crate::ui::{output, theme, Icons};
use crate::view::ViewOutcome;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Prints import progress. Draws a bar per run directory on a terminal and
/// falls back to plain lines otherwise.
pub struct ConsoleProgress {
    interactive: bool,
    quiet: bool,
    bar: Option<ProgressBar>,
}

impl ConsoleProgress {
    pub fn new() -> Self {
        Self {
            interactive: console::Term::stdout().is_term(),
            quiet: is_quiet(),
            bar: None,
        }
    }

    fn line(&self, text: String) {
        if self.quiet {
            return;
        }
        match &self.bar {
            Some(bar) => bar.println(text),
            None => println!("{}", text),
        }
    }

    /// Clear the bar of the last run directory
    pub fn finish(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}

impl Default for ConsoleProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportObserver for ConsoleProgress {
    fn directory_started(&mut self, run: &RunDir, files: usize) {
        self.finish();
        if self.quiet {
            return;
        }
        println!();
        println!(
            "{} {} {}",
            Icons::FOLDER,
            format!("Run {}", run.index).style(theme().heading.clone()),
            run.path.display()
        );
        if self.interactive && files > 0 {
            let bar = ProgressBar::new(files as u64);
            if let Ok(style) = ProgressStyle::with_template("  {bar:30} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            bar.enable_steady_tick(Duration::from_millis(100));
            self.bar = Some(bar);
        }
    }

    fn file_skipped(&mut self, file: &SkippedFile) {
        let name = file.path.file_name().unwrap_or_default().to_string_lossy();
        self.line(output::file_skipped_line(&name, &file.reason.to_string()));
    }

    fn file_loaded(&mut self, load: &FileLoad, committed: bool) {
        self.line(output::file_loaded_line(&load.file, load.rows, committed));
        if let Some(bar) = &self.bar {
            bar.set_message(load.file.clone());
            bar.inc(1);
        }
    }

    fn directory_committed(&mut self, run: &RunDir) {
        self.line(output::directory_committed_line(&run.path.display().to_string()));
    }

    fn view_finished(&mut self, outcome: &ViewOutcome) {
        self.finish();
        match outcome {
            ViewOutcome::Created { .. } => output::success(&outcome.to_string()),
            ViewOutcome::Failed { .. } => output::warn(&outcome.to_string()),
        }
    }
}
