//! The single live document
//!
//! Holds text, identity and dirty state. Mutation goes through a handful of
//! methods that each leave the document fully consistent; the lifecycle
//! manager decides when to call them.

use crate::utils::{path, text};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// The open document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    display_name: String,
    backing_location: Option<PathBuf>,
    dirty: bool,
    version: Version,
}

/// Identifies one state of the document's content
///
/// `generation` changes when the document is replaced wholesale, `revision`
/// when it is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub generation: u64,
    pub revision: u64,
}

impl Document {
    /// A clean document with no associated file
    pub fn new(display_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            display_name: display_name.into(),
            backing_location: None,
            dirty: false,
            version: Version::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn backing_location(&self) -> Option<&Path> {
        self.backing_location.as_deref()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Current version; a save compares it to tell whether it raced a change
    pub fn version(&self) -> Version {
        self.version
    }

    /// Replace the text; always marks the document dirty
    pub fn edit(&mut self, new_text: String) {
        self.text = new_text;
        self.dirty = true;
        self.version.revision += 1;
    }

    fn next_generation(&self) -> Version {
        Version {
            generation: self.version.generation + 1,
            revision: 0,
        }
    }

    /// Replace everything with a file read from `location`
    pub fn replace_from_file(&mut self, location: PathBuf, text: String) {
        *self = Self {
            text,
            display_name: path::display_name(&location),
            backing_location: Some(location),
            dirty: false,
            version: self.next_generation(),
        };
    }

    /// Replace everything with an external blob; drops any path association
    pub fn replace_from_blob(&mut self, name: String, text: String) {
        *self = Self {
            text,
            display_name: name,
            backing_location: None,
            dirty: false,
            version: self.next_generation(),
        };
    }

    /// Record that `saved` was written to `location`
    ///
    /// Ignored if the document was replaced in the meantime. Otherwise the
    /// location is adopted, and the document only becomes clean if nothing
    /// was edited since the content was handed to the writer. Returns whether
    /// the save applied to this document.
    pub fn mark_saved_to(&mut self, location: PathBuf, saved: Version) -> bool {
        if saved.generation != self.version.generation {
            return false;
        }
        self.display_name = path::display_name(&location);
        self.backing_location = Some(location);
        self.mark_saved(saved)
    }

    /// Record a save that established no location
    pub fn mark_saved(&mut self, saved: Version) -> bool {
        if saved.generation != self.version.generation {
            return false;
        }
        if saved.revision == self.version.revision {
            self.dirty = false;
        }
        true
    }

    /// Title for display (with modification indicator)
    pub fn title(&self) -> String {
        if self.dirty {
            format!("• {}", self.display_name)
        } else {
            self.display_name.clone()
        }
    }

    /// Seed for the save picker: the backing path if known, else the name
    pub fn save_seed(&self) -> PathBuf {
        self.backing_location
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.display_name))
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            text: self.text.clone(),
            display_name: self.display_name.clone(),
            backing_location: self.backing_location.clone(),
            dirty: self.dirty,
            words: text::word_count(&self.text),
            lines: text::line_count(&self.text),
        }
    }
}

/// Point-in-time copy of the document for display and reporting
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSnapshot {
    pub text: String,
    pub display_name: String,
    pub backing_location: Option<PathBuf>,
    pub dirty: bool,
    pub words: usize,
    pub lines: usize,
}
