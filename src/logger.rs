//! Terminal output: prefixed log lines, the transform progress line and the
//! failure list printed when a build does not publish.
//!
//! ```ignore
//! log!("build"; "{} in {}", plural_count(n, "asset"), plural_count(e, "entry"));
//! debug!("plugin"; "{} @ {}", name, point);   // only with --verbose
//!
//! let progress = ProgressLine::new(&[("script", 12), ("style", 3)]);
//! progress.inc("script");
//! progress.fail("style");
//! progress.finish();   // [transform] script(1/12) style(1/3) 1 failed 0.41s
//! ```

use crossterm::{
    cursor, execute,
    terminal::{Clear, ClearType},
};
use owo_colors::OwoColorize;
use parking_lot::Mutex;
use std::{
    io::{Write, stdout},
    sync::atomic::{AtomicBool, Ordering},
    time::Instant,
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

/// Set while a progress line owns the last terminal line.
static PROGRESS_ACTIVE: AtomicBool = AtomicBool::new(false);

// ============================================================================
// Log Macros
// ============================================================================

/// Log a message with a colored module prefix
///
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

/// Write one prefixed line. An active progress line is redrawn below it.
pub fn log(module: &str, message: &str) {
    let mut stdout = stdout().lock();
    execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
    writeln!(stdout, "{} {message}", prefix(module)).ok();

    if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
        if let Some(line) = CURRENT_PROGRESS.lock().as_deref() {
            write!(stdout, "{} {line}", prefix(PROGRESS_MODULE)).ok();
        }
    }
    stdout.flush().ok();
}

/// `[module]`, colored by the phase it belongs to.
fn prefix(module: &str) -> String {
    let tag = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "build" | "transform" | "emit" => tag.bright_blue().bold().to_string(),
        "done" => tag.bright_green().bold().to_string(),
        "error" => tag.bright_red().bold().to_string(),
        "warning" => tag.bright_magenta().bold().to_string(),
        _ => tag.bright_yellow().bold().to_string(),
    }
}

// ============================================================================
// Failure Report
// ============================================================================

/// Print an aggregated failure list: one `✗ summary` line per entry,
/// followed by its indented detail.
pub fn print_failures<'a>(failures: impl IntoIterator<Item = (&'a str, &'a str)>) {
    let mut stdout = stdout().lock();
    for (summary, detail) in failures {
        writeln!(stdout, "{} {}", "✗".red(), summary.bold()).ok();
        for line in detail.lines() {
            writeln!(stdout, "  {}", line.dimmed()).ok();
        }
    }
    stdout.flush().ok();
}

// ============================================================================
// Progress Line
// ============================================================================

const PROGRESS_MODULE: &str = "transform";

/// Last rendered progress text, redrawn after interleaved log lines.
static CURRENT_PROGRESS: Mutex<Option<String>> = parking_lot::const_mutex(None);

/// Per-kind counters on one self-updating line:
/// `[transform] script(42/69) style(5/10) 2 failed`.
///
/// Updates come from rayon workers. A worker that finds the display busy
/// skips the redraw; the next update or `finish` catches up.
pub struct ProgressLine {
    counters: Vec<Counter>,
    failed: std::sync::atomic::AtomicUsize,
    started: Instant,
    display: Mutex<()>,
}

struct Counter {
    name: &'static str,
    total: usize,
    done: std::sync::atomic::AtomicUsize,
}

impl ProgressLine {
    /// Counters with a zero total are left out.
    pub fn new(items: &[(&'static str, usize)]) -> Self {
        let counters = items
            .iter()
            .filter(|(_, total)| *total > 0)
            .map(|&(name, total)| Counter {
                name,
                total,
                done: Default::default(),
            })
            .collect();

        let progress = Self {
            counters,
            failed: Default::default(),
            started: Instant::now(),
            display: Mutex::new(()),
        };
        PROGRESS_ACTIVE.store(true, Ordering::SeqCst);
        progress.redraw();
        progress
    }

    /// One unit of `name` finished.
    pub fn inc(&self, name: &str) {
        self.advance(name, false);
    }

    /// One unit of `name` finished with an error.
    pub fn fail(&self, name: &str) {
        self.advance(name, true);
    }

    fn advance(&self, name: &str, failed: bool) {
        let Some(counter) = self.counters.iter().find(|c| c.name == name) else {
            return;
        };
        counter.done.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
        if let Some(_guard) = self.display.try_lock() {
            self.redraw();
        }
    }

    fn line(&self) -> String {
        let mut line = self
            .counters
            .iter()
            .map(|c| format!("{}({}/{})", c.name, c.done.load(Ordering::Relaxed), c.total))
            .collect::<Vec<_>>()
            .join(" ");
        let failed = self.failed.load(Ordering::Relaxed);
        if failed > 0 {
            line.push_str(&format!(" {failed} failed"));
        }
        line
    }

    fn redraw(&self) {
        let line = self.line();
        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        write!(stdout, "{} {line}", prefix(PROGRESS_MODULE)).ok();
        stdout.flush().ok();
        *CURRENT_PROGRESS.lock() = Some(line);
    }

    /// Keep the final counts (plus elapsed time) and release the line.
    pub fn finish(self) {
        let _guard = self.display.lock();
        let summary = format!("{} {:.2?}", self.line(), self.started.elapsed());
        self.release();

        let mut stdout = stdout().lock();
        execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
        writeln!(stdout, "{} {summary}", prefix(PROGRESS_MODULE)).ok();
        stdout.flush().ok();
    }

    fn release(&self) {
        PROGRESS_ACTIVE.store(false, Ordering::SeqCst);
        *CURRENT_PROGRESS.lock() = None;
    }
}

impl Drop for ProgressLine {
    fn drop(&mut self) {
        // finish() already released; an unfinished line is cleared
        if PROGRESS_ACTIVE.load(Ordering::SeqCst) {
            self.release();
            let mut stdout = stdout().lock();
            execute!(stdout, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine)).ok();
            stdout.flush().ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_and_failures() {
        let progress = ProgressLine::new(&[("script", 2), ("style", 0), ("file", 1)]);
        assert_eq!(progress.counters.len(), 2);
        progress.inc("script");
        progress.inc("style");
        progress.fail("file");
        assert_eq!(progress.line(), "script(1/2) file(1/1) 1 failed");
        progress.finish();
    }

    #[test]
    fn test_verbose_toggle() {
        set_verbose(true);
        assert!(is_verbose());
        set_verbose(false);
        assert!(!is_verbose());
    }
}
