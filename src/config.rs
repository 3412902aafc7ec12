//! Configuration for LaTeX Studio
//!
//! All settings are in-memory defaults assembled at startup from constants and
//! command line flags. Nothing here is read from or written to disk.

use serde::{Deserialize, Serialize};

/// Human readable application name
pub const APP_NAME: &str = "LaTeX Studio";

/// Name shown for a document with no associated file
pub const DEFAULT_FILE_NAME: &str = "Untitled.md";

/// Maximum file size to open (in bytes) - 10MB
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Minimum spacing between two save shortcut deliveries
pub const SAVE_DEBOUNCE_MS: u64 = 250;

/// Content of a fresh document
pub const DEFAULT_CONTENT: &str = r#"# Welcome to LaTeX Studio

Start typing on the left to see your document render on the right.

## Math Example

Here is an inline equation: $E = mc^2$.

And here is a block equation:

$$
\frac{1}{\sigma\sqrt{2\pi}} \exp\left( -\frac{1}{2} \left( \frac{x-\mu}{\sigma} \right)^2 \right)
$$

## Features
- **Markdown** support
- **LaTeX** rendering
- Live preview
"#;

/// A named group of file extensions offered by open and save pickers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFilter {
    /// Label shown in the picker
    pub name: String,

    /// Extensions without the leading dot
    pub extensions: Vec<String>,
}

impl FileFilter {
    pub fn new(name: &str, extensions: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
        }
    }

    /// Whether `extension` (without dot, any case) belongs to this filter
    pub fn accepts(&self, extension: &str) -> bool {
        self.extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(extension))
    }
}

/// Whether any filter accepts the extension of file name `name`
pub fn accepts_file_name(filters: &[FileFilter], name: &str) -> bool {
    crate::utils::path::extension(name)
        .map(|ext| filters.iter().any(|f| f.accepts(ext)))
        .unwrap_or(false)
}

/// Markdown and plain text, in that order
pub fn default_filters() -> Vec<FileFilter> {
    vec![
        FileFilter::new("Markdown", &["md", "markdown"]),
        FileFilter::new("Text", &["txt"]),
    ]
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display name of a fresh document
    pub default_file_name: String,

    /// Text of a fresh document
    pub initial_content: String,

    /// Filters for open and save pickers
    pub filters: Vec<FileFilter>,

    /// Largest file the native backend will read
    pub max_file_size: u64,

    /// Debounce window for the save shortcut in milliseconds
    pub save_debounce_ms: u64,

    /// Skip capability detection and use the browser-only backend
    pub force_browser_only: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_file_name: DEFAULT_FILE_NAME.to_string(),
            initial_content: DEFAULT_CONTENT.to_string(),
            filters: default_filters(),
            max_file_size: MAX_FILE_SIZE,
            save_debounce_ms: SAVE_DEBOUNCE_MS,
            force_browser_only: false,
        }
    }
}
