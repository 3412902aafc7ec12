//! Shell commands and the save shortcut
//!
//! Maps `:command` words to actions, turns input lines into [`Message`]s and
//! rate-limits the save shortcut.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::CommandError;
use crate::message::{
    EditorMessage, FileMessage, Message, SystemMessage, ViewMessage,
};
use crate::utils::{text::unescape, Debouncer};

/// Actions that can be triggered from the command line
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Action {
    // File actions
    Open,
    Save,
    Drop,
    Pick,
    CancelPick,

    // Edit actions
    Set,
    Append,

    // View actions
    Show,
    Preview,
    Status,
    Help,

    // System actions
    Quit,
    ForceQuit,
}

impl Action {
    /// Convert action plus its argument text to an application message
    pub fn to_message(self, arg: &str) -> Result<Message, CommandError> {
        let arg = arg.trim();
        let message: Message = match self {
            // File
            Action::Open => FileMessage::Open.into(),
            Action::Save => FileMessage::Save.into(),
            Action::Drop => FileMessage::Drop(required_path(arg, "drop")?).into(),
            Action::Pick => FileMessage::Pick(required_path(arg, "pick")?).into(),
            Action::CancelPick => FileMessage::CancelPick.into(),

            // Edit
            Action::Set => EditorMessage::Set(unescape(arg)).into(),
            Action::Append => EditorMessage::Append(unescape(arg)).into(),

            // View
            Action::Show => ViewMessage::Show.into(),
            Action::Preview => ViewMessage::Preview.into(),
            Action::Status => ViewMessage::Status {
                json: arg.eq_ignore_ascii_case("json"),
            }
            .into(),
            Action::Help => ViewMessage::Help.into(),

            // System
            Action::Quit => SystemMessage::Quit { force: false }.into(),
            Action::ForceQuit => SystemMessage::Quit { force: true }.into(),
        };
        Ok(message)
    }
}

fn required_path(arg: &str, command: &'static str) -> Result<PathBuf, CommandError> {
    if arg.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            what: "a file path",
        });
    }
    Ok(PathBuf::from(arg))
}

/// Create default command words
pub fn command_binds() -> HashMap<&'static str, Action> {
    let mut binds = HashMap::new();

    // File commands
    binds.insert("open", Action::Open);
    binds.insert("o", Action::Open);
    binds.insert("save", Action::Save);
    binds.insert("w", Action::Save);
    binds.insert("drop", Action::Drop);
    binds.insert("pick", Action::Pick);
    binds.insert("cancel", Action::CancelPick);

    // Edit commands
    binds.insert("set", Action::Set);
    binds.insert("append", Action::Append);
    binds.insert("a", Action::Append);

    // View commands
    binds.insert("show", Action::Show);
    binds.insert("preview", Action::Preview);
    binds.insert("status", Action::Status);
    binds.insert("help", Action::Help);
    binds.insert("h", Action::Help);

    // System commands
    binds.insert("quit", Action::Quit);
    binds.insert("q", Action::Quit);
    binds.insert("quit!", Action::ForceQuit);
    binds.insert("q!", Action::ForceQuit);

    binds
}

/// Parse one input line
///
/// Lines starting with `:` are commands; anything else is appended to the
/// document as a new line. Blank lines do nothing.
pub fn parse_line(
    binds: &HashMap<&'static str, Action>,
    line: &str,
) -> Result<Message, CommandError> {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Ok(Message::None);
    }

    let Some(command) = line.strip_prefix(':') else {
        return Ok(Message::Editor(EditorMessage::Append(line.to_string())));
    };

    let (word, arg) = command
        .trim_start()
        .split_once(char::is_whitespace)
        .unwrap_or((command.trim(), ""));

    match binds.get(word) {
        Some(action) => action.to_message(arg),
        None => Err(CommandError::Unknown(word.to_string())),
    }
}

/// Help sections: `(title, [(usage, description)])`
pub type MenuItems = Vec<(&'static str, Vec<(&'static str, &'static str)>)>;

/// Create the help listing
pub fn menu_items() -> MenuItems {
    vec![
        (
            "File",
            vec![
                (":open, :o", "Open a file"),
                (":save, :w", "Save the document"),
                (":drop PATH", "Load a dropped file (name and contents only)"),
                (":pick PATH", "Answer a pending file picker"),
                (":cancel", "Dismiss a pending file picker"),
            ],
        ),
        (
            "Edit",
            vec![
                (":set TEXT", "Replace the document text (\\n for newlines)"),
                (":append TEXT, :a", "Append a line"),
                ("TEXT", "Any line without a leading ':' is appended"),
            ],
        ),
        (
            "View",
            vec![
                (":show", "Print the document text"),
                (":preview", "Print the rendered preview"),
                (":status [json]", "Print the document status"),
                (":help, :h", "Show this help"),
            ],
        ),
        (
            "Quit",
            vec![
                (":quit, :q", "Quit (refused with unsaved changes)"),
                (":quit!, :q!", "Quit and discard unsaved changes"),
            ],
        ),
    ]
}

/// Render [`menu_items`] for the terminal
pub fn help_text() -> String {
    let mut out = String::new();
    for (title, items) in menu_items() {
        out.push_str(title);
        out.push('\n');
        for (usage, description) in items {
            out.push_str(&format!("    {:<20}{}\n", usage, description));
        }
    }
    out
}

/// What to do with one press of the save shortcut
#[derive(Debug, Clone, PartialEq)]
pub enum SaveDelivery {
    /// Deliver this message now
    Now(Message),
    /// Schedule one trailing save after this long
    Later(Duration),
    /// A trailing save is already scheduled and will cover this press
    Coalesced,
}

/// The save keyboard shortcut
///
/// The first press in a window saves at once. Later presses inside the window
/// collapse into one trailing save when it closes, so a press is never lost.
/// The save reads the document when it runs, so the newest text is written.
#[derive(Debug)]
pub struct SaveShortcut {
    debouncer: Debouncer,
    trailing: bool,
}

impl SaveShortcut {
    pub fn new(delay_ms: u64) -> Self {
        Self {
            debouncer: Debouncer::new(delay_ms),
            trailing: false,
        }
    }

    pub fn press(&mut self) -> SaveDelivery {
        if self.trailing {
            return SaveDelivery::Coalesced;
        }
        if self.debouncer.should_trigger() {
            return SaveDelivery::Now(Message::File(FileMessage::Save));
        }
        self.trailing = true;
        SaveDelivery::Later(self.debouncer.remaining())
    }

    /// Length of one debounce window
    pub fn window(&self) -> Duration {
        self.debouncer.delay()
    }

    /// The trailing window closed; returns the save to deliver
    pub fn fire_trailing(&mut self) -> Message {
        self.trailing = false;
        self.debouncer.reset();
        Message::File(FileMessage::Save)
    }
}
