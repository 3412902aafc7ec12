//! Application message types
//!
//! Everything the shell reacts to is a [`Message`]: parsed command lines and
//! the results of operations that ran as background tasks. Messages are
//! organized by category for clear handling and routing.

use crate::state::Outcome;
use std::path::PathBuf;

/// Main application message enum
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// File operations
    File(FileMessage),

    /// Text edits
    Editor(EditorMessage),

    /// Output-only commands
    View(ViewMessage),

    /// Process-level commands
    System(SystemMessage),

    /// Internal async operation results
    Internal(InternalMessage),

    /// No-op message (blank input line)
    None,
}

/// File-related messages
#[derive(Debug, Clone, PartialEq)]
pub enum FileMessage {
    /// Open a file through the backend's picker
    Open,

    /// Save the document through the backend
    Save,

    /// A file was dropped onto the editor
    Drop(PathBuf),

    /// Answer a pending browser file picker
    Pick(PathBuf),

    /// Dismiss a pending browser file picker
    CancelPick,
}

/// Editing messages
#[derive(Debug, Clone, PartialEq)]
pub enum EditorMessage {
    /// Replace the whole text
    Set(String),

    /// Add a line at the end
    Append(String),
}

/// Messages that only print
#[derive(Debug, Clone, PartialEq)]
pub enum ViewMessage {
    /// Print the raw document text
    Show,

    /// Print the rendered preview
    Preview,

    /// Print the status line, or the snapshot as JSON
    Status { json: bool },

    /// Print the command list
    Help,
}

/// Process-level messages
#[derive(Debug, Clone, PartialEq)]
pub enum SystemMessage {
    /// Leave the shell; `force` skips the unsaved-changes check
    Quit { force: bool },
}

/// Results of spawned operations, fed back into the update loop
#[derive(Debug, Clone, PartialEq)]
pub enum InternalMessage {
    /// An open finished (picker, command-line file)
    Opened(Result<Outcome, String>),

    /// A save finished
    Saved(Result<Outcome, String>),

    /// Something the user should see that did not come from an operation
    Notice(String),

    /// The save shortcut's window closed with a press still owed
    TrailingSave,
}

impl From<FileMessage> for Message {
    fn from(msg: FileMessage) -> Self {
        Message::File(msg)
    }
}

impl From<EditorMessage> for Message {
    fn from(msg: EditorMessage) -> Self {
        Message::Editor(msg)
    }
}

impl From<ViewMessage> for Message {
    fn from(msg: ViewMessage) -> Self {
        Message::View(msg)
    }
}

impl From<SystemMessage> for Message {
    fn from(msg: SystemMessage) -> Self {
        Message::System(msg)
    }
}

impl From<InternalMessage> for Message {
    fn from(msg: InternalMessage) -> Self {
        Message::Internal(msg)
    }
}
