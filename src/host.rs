//! Terminal stand-in for a browser page
//!
//! Implements [`BrowserHost`] for the shell: the file picker is answered by
//! `:pick PATH` or `:cancel`, and downloads land in the download directory
//! under a name that never replaces an existing file.

use std::cell::RefCell;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::backend::{Blob, BrowserHost};
use crate::error::{FileError, FileResult};
use crate::message::{InternalMessage, Message};
use crate::utils::path::extension;

/// Browser primitives backed by the terminal and the download directory
pub struct TerminalHost {
    download_dir: Option<PathBuf>,
    pending_pick: RefCell<Option<oneshot::Sender<Option<PathBuf>>>>,
    notices: mpsc::UnboundedSender<Message>,
}

impl TerminalHost {
    /// Host that downloads into the user's download directory
    pub fn new(notices: mpsc::UnboundedSender<Message>) -> Self {
        Self::with_download_dir(dirs::download_dir(), notices)
    }

    pub fn with_download_dir(
        download_dir: Option<PathBuf>,
        notices: mpsc::UnboundedSender<Message>,
    ) -> Self {
        Self {
            download_dir,
            pending_pick: RefCell::new(None),
            notices,
        }
    }

    pub fn is_picking(&self) -> bool {
        self.pending_pick.borrow().is_some()
    }

    /// Answer the pending picker; returns false when nothing was waiting
    pub fn answer_pick(&self, choice: Option<PathBuf>) -> bool {
        match self.pending_pick.borrow_mut().take() {
            Some(sender) => sender.send(choice).is_ok(),
            None => false,
        }
    }

    fn notify(&self, text: String) {
        // The receiver only goes away during shutdown
        let _ = self.notices.send(InternalMessage::Notice(text).into());
    }

    // Blocking std::fs: trigger_download is synchronous and the files are small
    fn write_download(&self, name: &str, text: &str) -> FileResult<PathBuf> {
        let dir = self
            .download_dir
            .as_deref()
            .ok_or(FileError::DownloadDirUnavailable)?;
        std::fs::create_dir_all(dir).map_err(|e| FileError::from_write(dir.to_path_buf(), e))?;

        // create_new fails if another writer takes the name first; retry with the next one
        loop {
            let path = unique_download_path(dir, name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(text.as_bytes())
                        .map_err(|e| FileError::from_write(path.clone(), e))?;
                    return Ok(path);
                }
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(FileError::from_write(path, e)),
            }
        }
    }
}

#[async_trait(?Send)]
impl BrowserHost for TerminalHost {
    async fn request_blob_selection(&self) -> Option<Blob> {
        let (sender, receiver) = oneshot::channel();
        if let Some(previous) = self.pending_pick.borrow_mut().replace(sender) {
            let _ = previous.send(None);
        }
        self.notify("Choose a file with :pick PATH, or :cancel".to_string());

        let path = receiver.await.ok().flatten()?;
        match Blob::from_path(&path).await {
            Ok(blob) => Some(blob),
            Err(e) => {
                log::error!("Failed to read picked file {}: {}", path.display(), e);
                self.notify(format!("Could not read {}: {}", path.display(), e));
                None
            }
        }
    }

    fn trigger_download(&self, name: &str, text: &str) {
        match self.write_download(name, text) {
            Ok(path) => {
                log::info!("Downloaded {} to {}", name, path.display());
                self.notify(format!("Downloaded to {}", path.display()));
            }
            Err(e) => {
                log::error!("Download of {} failed: {}", name, e);
                self.notify(e.user_message());
            }
        }
    }
}

impl std::fmt::Debug for TerminalHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerminalHost")
            .field("download_dir", &self.download_dir)
            .field("picking", &self.is_picking())
            .finish()
    }
}

/// First free name in `dir`: `name`, then `stem (1).ext`, `stem (2).ext`, ...
///
/// Any directory entry counts as taken, including a dangling symlink.
pub fn unique_download_path(dir: &Path, name: &str) -> PathBuf {
    let candidate = dir.join(name);
    if !is_taken(&candidate) {
        return candidate;
    }

    let (stem, ext) = match extension(name) {
        Some(ext) => (&name[..name.len() - ext.len() - 1], Some(ext)),
        None => (name, None),
    };
    (1..)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !is_taken(path))
        .unwrap_or(candidate)
}

fn is_taken(path: &Path) -> bool {
    path.symlink_metadata().is_ok()
}
