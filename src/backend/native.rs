//! Native I/O backend
//!
//! Wraps the platform open/save dialogs and path-based reads and writes.
//! Nothing in here touches document state; the lifecycle manager decides what
//! to do with the results.

use super::encoding::decode_text;
use crate::config::FileFilter;
use crate::error::{FileError, FileResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

/// Native open/save pickers. `None` means the user cancelled.
#[async_trait(?Send)]
pub trait FileDialogs {
    /// Ask for an existing file to open
    async fn pick_open_location(&self, filters: &[FileFilter]) -> Option<PathBuf>;

    /// Ask where to save, starting from `default_path`
    ///
    /// `default_path` is either a full path (document already has a backing
    /// location) or a bare file name.
    async fn pick_save_location(
        &self,
        filters: &[FileFilter],
        default_path: &Path,
    ) -> Option<PathBuf>;
}

/// Desktop dialogs through `rfd`
#[derive(Debug, Default)]
pub struct SystemDialogs;

impl SystemDialogs {
    fn dialog(filters: &[FileFilter]) -> rfd::AsyncFileDialog {
        filters
            .iter()
            .fold(rfd::AsyncFileDialog::new(), |dialog, filter| {
                dialog.add_filter(filter.name.as_str(), &filter.extensions[..])
            })
    }
}

#[async_trait(?Send)]
impl FileDialogs for SystemDialogs {
    async fn pick_open_location(&self, filters: &[FileFilter]) -> Option<PathBuf> {
        Self::dialog(filters)
            .set_title("Open Document")
            .pick_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }

    async fn pick_save_location(
        &self,
        filters: &[FileFilter],
        default_path: &Path,
    ) -> Option<PathBuf> {
        let mut dialog = Self::dialog(filters).set_title("Save Document");
        if let Some(parent) = default_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            dialog = dialog.set_directory(parent);
        }
        if let Some(name) = default_path.file_name() {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        dialog
            .save_file()
            .await
            .map(|handle| handle.path().to_path_buf())
    }
}

/// Dialogs plus raw read/write by path
#[derive(Clone)]
pub struct NativeBackend {
    dialogs: Rc<dyn FileDialogs>,
    max_file_size: u64,
}

impl NativeBackend {
    pub fn new(dialogs: Rc<dyn FileDialogs>, max_file_size: u64) -> Self {
        Self {
            dialogs,
            max_file_size,
        }
    }

    pub async fn pick_open_location(&self, filters: &[FileFilter]) -> Option<PathBuf> {
        self.dialogs.pick_open_location(filters).await
    }

    pub async fn pick_save_location(
        &self,
        filters: &[FileFilter],
        default_path: &Path,
    ) -> Option<PathBuf> {
        self.dialogs.pick_save_location(filters, default_path).await
    }

    /// Read a whole file as text
    pub async fn read_all(&self, path: &Path) -> FileResult<String> {
        let path_buf = path.to_path_buf();

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| FileError::from_read(path_buf.clone(), e))?;

        let size = metadata.len();
        if size > self.max_file_size {
            return Err(FileError::FileTooLarge {
                path: path_buf,
                size,
                max_size: self.max_file_size,
            });
        }

        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| FileError::from_read(path_buf.clone(), e))?;

        decode_text(&bytes).map_err(|source| FileError::EncodingError {
            path: path_buf,
            source,
        })
    }

    /// Write `text` to `path` atomically
    ///
    /// The content goes to a temporary sibling first and is renamed over the
    /// target, so a failed write leaves any existing file untouched. A symlink
    /// is followed and the existing file's permissions carry over.
    pub async fn write_all(&self, path: &Path, text: &str) -> FileResult<()> {
        let path_buf = path.to_path_buf();
        let target = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        let permissions = tokio::fs::metadata(&target)
            .await
            .ok()
            .map(|metadata| metadata.permissions());
        let temp_path = temp_sibling(&target);

        let write_result = async {
            let mut file = tokio::fs::File::create(&temp_path).await?;
            file.write_all(text.as_bytes()).await?;
            file.flush().await?;
            file.sync_all().await?;
            if let Some(permissions) = permissions {
                tokio::fs::set_permissions(&temp_path, permissions).await?;
            }
            Ok::<(), std::io::Error>(())
        }
        .await;

        if let Err(e) = write_result {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(FileError::from_write(path_buf, e));
        }

        if let Err(e) = tokio::fs::rename(&temp_path, &target).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(FileError::from_write(path_buf, e));
        }

        Ok(())
    }
}

impl std::fmt::Debug for NativeBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeBackend")
            .field("max_file_size", &self.max_file_size)
            .finish_non_exhaustive()
    }
}

fn temp_sibling(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or(Path::new("."));
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "document".to_string());

    let timestamp = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);

    parent.join(format!(".{}.{}.tmp", filename, timestamp))
}
