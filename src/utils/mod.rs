//! Utilities module for LaTeX Studio
//!
//! Shared helper functions and utilities including:
//! - Debouncing
//! - Path utilities
//! - Text utilities

use std::time::{Duration, Instant};

/// Debounce helper for rate-limiting operations
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    last_trigger: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            delay: Duration::from_millis(delay_ms),
            last_trigger: None,
        }
    }

    /// Check if enough time has passed since last trigger
    pub fn should_trigger(&mut self) -> bool {
        self.should_trigger_at(Instant::now())
    }

    fn should_trigger_at(&mut self, now: Instant) -> bool {
        match self.last_trigger {
            Some(last) if now.duration_since(last) < self.delay => false,
            _ => {
                self.last_trigger = Some(now);
                true
            }
        }
    }

    /// Time left before the next trigger is allowed
    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    fn remaining_at(&self, now: Instant) -> Duration {
        self.last_trigger
            .map(|last| self.delay.saturating_sub(now.duration_since(last)))
            .unwrap_or(Duration::ZERO)
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Reset the debouncer
    pub fn reset(&mut self) {
        self.last_trigger = None;
    }
}

/// Path utilities
pub mod path {
    use std::path::Path;

    /// Last segment of a path, split on both `/` and `\`
    ///
    /// Dialogs may hand back Windows-style paths even when the process runs
    /// elsewhere, so this does not rely on `Path::file_name`.
    pub fn display_name(path: &Path) -> String {
        let raw = path.to_string_lossy();
        raw.rsplit(|c| c == '/' || c == '\\')
            .find(|segment| !segment.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| raw.to_string())
    }

    /// Get the file extension
    pub fn extension(name: &str) -> Option<&str> {
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            None
        } else {
            Some(ext)
        }
    }
}

/// Text utilities
pub mod text {
    /// Count words in text
    pub fn word_count(text: &str) -> usize {
        text.split_whitespace().count()
    }

    /// Count lines in text
    pub fn line_count(text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            text.lines().count()
        }
    }

    /// Turn `\n` and `\t` escapes typed on one line into real characters
    pub fn unescape(input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut chars = input.chars();
        while let Some(c) = chars.next() {
            if c != '\\' {
                out.push(c);
                continue;
            }
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        }
        out
    }
}
