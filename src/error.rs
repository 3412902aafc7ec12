//! Error types for LaTeX Studio
//!
//! Errors are grouped by where they originate: native file I/O, blob
//! decoding, the document lifecycle, and the application shell. A cancelled
//! dialog is never an error; see [`crate::state::Outcome`].

use std::path::PathBuf;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Document lifecycle errors
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Terminal I/O errors in the shell itself
    #[error("Terminal I/O error: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Native file I/O errors (the `IOError` class)
#[derive(Error, Debug)]
pub enum FileError {
    /// File not found at specified path
    #[error("File not found: {path}")]
    NotFound { path: PathBuf },

    /// Permission denied when accessing file
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// File is too large to open
    #[error("File too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    /// File is not valid text
    #[error("Unable to read file as text. File may be binary or use unsupported encoding: {path}")]
    EncodingError {
        path: PathBuf,
        #[source]
        source: DecodeError,
    },

    /// Error reading file
    #[error("Could not read file: {path}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing file
    #[error("Could not save file: {path}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No directory to place downloads in
    #[error("No download directory is available")]
    DownloadDirUnavailable,
}

impl FileError {
    /// Classify an `io::Error` raised while reading `path`
    pub fn from_read(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => FileError::NotFound { path },
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::ReadError { path, source },
        }
    }

    /// Classify an `io::Error` raised while writing `path`
    pub fn from_write(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => FileError::PermissionDenied { path },
            _ => FileError::WriteError { path, source },
        }
    }

    /// Create a user-friendly error message suitable for notifications
    pub fn user_message(&self) -> String {
        match self {
            FileError::NotFound { .. } => {
                "The file could not be found. It may have been moved or deleted.".to_string()
            }
            FileError::PermissionDenied { .. } => {
                "You don't have permission to access this file. Check file permissions.".to_string()
            }
            FileError::FileTooLarge { max_size, .. } => {
                format!(
                    "This file is too large to open. Maximum file size is {} bytes.",
                    max_size
                )
            }
            FileError::EncodingError { .. } => {
                "This file cannot be opened as text. It may be a binary file or use an unsupported encoding.".to_string()
            }
            FileError::WriteError { .. } => {
                "Could not save the file. Check disk space and permissions.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// A blob could not be interpreted as text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// Bytes are not valid UTF-8
    #[error("content is not valid UTF-8 (first bad byte at offset {offset})")]
    InvalidUtf8 { offset: usize },

    /// Bytes carry a UTF-16 byte order mark but do not decode
    #[error("content is not valid UTF-16")]
    InvalidUtf16,
}

/// Errors surfaced by document lifecycle operations
#[derive(Error, Debug)]
pub enum DocumentError {
    /// Native read/write failure
    #[error(transparent)]
    Io(#[from] FileError),

    /// A selected or dropped blob was not text
    #[error("Could not decode {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: DecodeError,
    },

    /// A selected or dropped file is not one of the accepted types
    #[error("Unsupported file type: {name}")]
    UnsupportedType { name: String },

    /// Another open/save is still pending
    #[error("Another file operation is already in progress")]
    Busy,
}

impl DocumentError {
    /// Create a user-friendly error message suitable for notifications
    pub fn user_message(&self) -> String {
        match self {
            DocumentError::Io(e) => e.user_message(),
            DocumentError::Decode { name, .. } => {
                format!("\"{}\" cannot be opened as text.", name)
            }
            DocumentError::UnsupportedType { name } => {
                format!("\"{}\" is not a Markdown or text file.", name)
            }
            DocumentError::Busy => {
                "Please wait for the current open or save to finish.".to_string()
            }
        }
    }
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Unknown command line flag
    #[error("Unknown option: {0}")]
    UnknownOption(String),

    /// More than one file given on the command line
    #[error("Only one file can be opened at a time (got {0})")]
    TooManyFiles(usize),
}

/// Errors from parsing a shell command line
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: :{0} (try :help)")]
    Unknown(String),

    #[error(":{command} needs {what}")]
    MissingArgument {
        command: &'static str,
        what: &'static str,
    },
}

/// Result type alias for operations that can fail with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for file operations
pub type FileResult<T> = Result<T, FileError>;

/// Result type alias for document lifecycle operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
