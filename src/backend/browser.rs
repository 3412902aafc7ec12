//! Browser-only I/O backend
//!
//! Everything is in memory: a picked file arrives as a [`Blob`] and saving is
//! a fresh download. Blobs from any source are decoded with [`read_blob`].
//! There is no path, so no backing location is ever set.

use super::encoding::decode_text;
use crate::error::DecodeError;
use async_trait::async_trait;
use std::path::Path;
use std::rc::Rc;

/// File data the user handed over, without a filesystem path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    /// Name reported by the picker or drop source
    pub name: String,
    /// Raw, undecoded content
    pub bytes: Vec<u8>,
}

impl Blob {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Capture a file the host surface gave us by path (drop, picker)
    ///
    /// Only the file name survives; the path is discarded.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::new(crate::utils::path::display_name(path), bytes))
    }
}

/// Decode a blob into `(name, text)`
pub fn read_blob(blob: &Blob) -> Result<(String, String), DecodeError> {
    let text = decode_text(&blob.bytes)?;
    Ok((blob.name.clone(), text))
}

/// The two primitives a browser page offers
#[async_trait(?Send)]
pub trait BrowserHost {
    /// Surface a file picker; `None` when the user cancels
    async fn request_blob_selection(&self) -> Option<Blob>;

    /// Offer `text` as a download named `name`
    ///
    /// Fire and forget: the page cannot tell whether the user kept the file.
    fn trigger_download(&self, name: &str, text: &str);
}

/// Blob reads and downloads through a [`BrowserHost`]
#[derive(Clone)]
pub struct BrowserBackend {
    host: Rc<dyn BrowserHost>,
}

impl BrowserBackend {
    pub fn new(host: Rc<dyn BrowserHost>) -> Self {
        Self { host }
    }

    pub async fn request_blob_selection(&self) -> Option<Blob> {
        self.host.request_blob_selection().await
    }

    pub fn trigger_download(&self, name: &str, text: &str) {
        self.host.trigger_download(name, text);
    }
}

impl std::fmt::Debug for BrowserBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserBackend").finish_non_exhaustive()
    }
}
