//! Console output for the sync engine, the resolver and the CLI
//!
//! Components receive a cloned [`Logger`] instead of printing directly, so a
//! `--quiet` run only prints results and errors. Verbose lines carry the
//! time since the logger was created, which makes slow refresh cycles and
//! batches easy to spot.

use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct Logger {
    pub verbose: bool,
    pub quiet: bool,
    started: Instant,
}

impl Logger {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            quiet: false,
            started: Instant::now(),
        }
    }

    pub fn new_quiet() -> Self {
        Self {
            verbose: false,
            quiet: true,
            started: Instant::now(),
        }
    }

    fn shows_verbose(&self) -> bool {
        self.verbose && !self.quiet
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {} ===", title);
        }
    }

    pub fn subsection(&self, title: &str) {
        if !self.quiet {
            println!("\n--- {} ---", title);
        }
    }

    /// Progress detail, shown with `--verbose` only
    pub fn verbose(&self, message: &str) {
        if self.shows_verbose() {
            let offset = self.started.elapsed().as_secs_f64();
            println!("[{:8.3}s] {}", offset, message);
        }
    }

    /// Indented follow-up to a verbose line
    pub fn detail(&self, message: &str) {
        if self.shows_verbose() {
            println!("           {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("ℹ️  {}", message);
        }
    }

    /// Recoverable problems: failed lookups, skipped components
    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("⚠️  WARNING: {}", message);
        }
    }

    /// Always printed, to stderr
    pub fn error(&self, message: &str) {
        eprintln!("❌ ERROR: {}", message);
    }

    pub fn summary_kv(&self, title: &str, items: &[(&str, String)]) {
        if self.quiet {
            return;
        }
        self.subsection(title);
        let width = items.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
        for (key, value) in items {
            println!("  {:<width$}  {}", key, value, width = width);
        }
    }

    /// Compact duration such as `42s`, `2m5s` or `12h0m0s`
    pub fn format_duration(&self, duration: Duration) -> String {
        let secs = duration.as_secs();
        match secs {
            0..60 => format!("{}s", secs),
            60..3600 => format!("{}m{}s", secs / 60, secs % 60),
            _ => format!("{}h{}m{}s", secs / 3600, (secs % 3600) / 60, secs % 60),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new(false)
    }
}
