//! Document lifecycle manager
//!
//! Owns the single [`Document`] and routes open/save through whichever backend
//! was selected at startup. Every failure leaves the document exactly as it
//! was; a cancelled picker is a normal outcome, not an error.
//!
//! The manager is a cheap `Rc` handle so the shell can hand clones to spawned
//! local tasks. Only one open or save may be pending at a time; `edit` is
//! always allowed and a save writes whatever text is current when the write
//! is issued.

use super::document::{Document, DocumentSnapshot};
use crate::backend::{read_blob, Backend, Blob, Capability, NativeBackend};
use crate::config::{accepts_file_name, Config, FileFilter};
use crate::error::{DocumentError, DocumentResult, FileError};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// How a lifecycle operation ended, when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The document was loaded or saved
    Completed,
    /// The user dismissed the picker; nothing changed
    Cancelled,
}

/// Handle to the live document and its backend
#[derive(Clone)]
pub struct DocumentManager {
    inner: Rc<Inner>,
}

struct Inner {
    document: RefCell<Document>,
    backend: Backend,
    filters: Vec<FileFilter>,
    in_flight: Cell<bool>,
}

/// Clears the in-flight flag however the operation ends
struct InFlightGuard<'a>(&'a Cell<bool>);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl DocumentManager {
    /// Start with the default document from `config`
    pub fn new(backend: Backend, config: &Config) -> Self {
        let document = Document::new(
            config.default_file_name.clone(),
            config.initial_content.clone(),
        );
        log::debug!(
            "Document manager ready with {} backend",
            backend.capability()
        );
        Self {
            inner: Rc::new(Inner {
                document: RefCell::new(document),
                backend,
                filters: config.filters.clone(),
                in_flight: Cell::new(false),
            }),
        }
    }

    pub fn capability(&self) -> Capability {
        self.inner.backend.capability()
    }

    /// Whether an open or save is pending
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.get()
    }

    pub fn text(&self) -> String {
        self.inner.document.borrow().text().to_string()
    }

    pub fn display_name(&self) -> String {
        self.inner.document.borrow().display_name().to_string()
    }

    pub fn backing_location(&self) -> Option<PathBuf> {
        self.inner
            .document
            .borrow()
            .backing_location()
            .map(Path::to_path_buf)
    }

    pub fn is_dirty(&self) -> bool {
        self.inner.document.borrow().is_dirty()
    }

    pub fn title(&self) -> String {
        self.inner.document.borrow().title()
    }

    pub fn snapshot(&self) -> DocumentSnapshot {
        self.inner.document.borrow().snapshot()
    }

    /// Replace the text; the document becomes dirty unconditionally
    pub fn edit(&self, new_text: impl Into<String>) {
        self.inner.document.borrow_mut().edit(new_text.into());
    }

    /// Load text that arrived outside the native reader (drop, blob picker)
    ///
    /// Any native path association is dropped, even under the native backend.
    pub fn load_from_external_blob(&self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        log::debug!("Loading external blob {}", name);
        self.inner
            .document
            .borrow_mut()
            .replace_from_blob(name, text.into());
    }

    /// Decode a raw blob and load it
    ///
    /// A blob whose name no filter accepts, or that is not text, leaves the
    /// document alone.
    pub fn load_blob(&self, blob: &Blob) -> DocumentResult<()> {
        if !accepts_file_name(&self.inner.filters, &blob.name) {
            log::debug!("Rejected blob {} by extension", blob.name);
            return Err(DocumentError::UnsupportedType {
                name: blob.name.clone(),
            });
        }
        let (name, text) = read_blob(blob).map_err(|source| {
            DocumentError::Decode {
                name: blob.name.clone(),
                source,
            }
        })?;
        self.load_from_external_blob(name, text);
        Ok(())
    }

    /// Let the user pick a document and load it
    pub async fn open(&self) -> DocumentResult<Outcome> {
        let _guard = self.begin()?;

        match &self.inner.backend {
            Backend::Native(native) => {
                let Some(path) = native.pick_open_location(&self.inner.filters).await else {
                    log::debug!("Open cancelled");
                    return Ok(Outcome::Cancelled);
                };
                self.read_into_document(native, path).await
            }
            Backend::BrowserOnly(browser) => {
                let Some(blob) = browser.request_blob_selection().await else {
                    log::debug!("Blob selection cancelled");
                    return Ok(Outcome::Cancelled);
                };
                self.load_blob(&blob)?;
                log::info!("Opened {}", blob.name);
                Ok(Outcome::Completed)
            }
        }
    }

    /// Load a known path without showing a picker
    ///
    /// Under the browser-only backend there is no path-based read, so the
    /// file is taken in the same way a dropped file would be.
    pub async fn open_path(&self, path: impl Into<PathBuf>) -> DocumentResult<Outcome> {
        let _guard = self.begin()?;
        let path = path.into();

        match &self.inner.backend {
            Backend::Native(native) => self.read_into_document(native, path).await,
            Backend::BrowserOnly(_) => {
                let blob = Blob::from_path(&path)
                    .await
                    .map_err(|e| FileError::from_read(path.clone(), e))?;
                self.load_blob(&blob)?;
                Ok(Outcome::Completed)
            }
        }
    }

    /// Save the current text
    ///
    /// Native: asks for a location seeded with the backing path (or the
    /// display name) and writes there. Browser-only: downloads under the
    /// display name.
    pub async fn save(&self) -> DocumentResult<Outcome> {
        let _guard = self.begin()?;

        match &self.inner.backend {
            Backend::Native(native) => {
                let seed = self.inner.document.borrow().save_seed();
                let Some(path) = native
                    .pick_save_location(&self.inner.filters, &seed)
                    .await
                else {
                    log::debug!("Save cancelled");
                    return Ok(Outcome::Cancelled);
                };

                let (text, version) = {
                    let document = self.inner.document.borrow();
                    (document.text().to_string(), document.version())
                };
                native.write_all(&path, &text).await?;

                let applied = self
                    .inner
                    .document
                    .borrow_mut()
                    .mark_saved_to(path.clone(), version);
                if !applied {
                    log::warn!(
                        "Document was replaced while saving to {}",
                        path.display()
                    );
                }
                log::info!("Saved {}", path.display());
                Ok(Outcome::Completed)
            }
            Backend::BrowserOnly(browser) => {
                let mut document = self.inner.document.borrow_mut();
                let version = document.version();
                browser.trigger_download(document.display_name(), document.text());
                document.mark_saved(version);
                log::info!("Downloaded {}", document.display_name());
                Ok(Outcome::Completed)
            }
        }
    }

    fn begin(&self) -> DocumentResult<InFlightGuard<'_>> {
        if self.inner.in_flight.replace(true) {
            log::debug!("Rejected file operation while another is pending");
            return Err(DocumentError::Busy);
        }
        Ok(InFlightGuard(&self.inner.in_flight))
    }

    async fn read_into_document(
        &self,
        native: &NativeBackend,
        path: PathBuf,
    ) -> DocumentResult<Outcome> {
        let text = native.read_all(&path).await?;
        log::info!("Opened {}", path.display());
        self.inner
            .document
            .borrow_mut()
            .replace_from_file(path, text);
        Ok(Outcome::Completed)
    }
}

impl std::fmt::Debug for DocumentManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentManager")
            .field("document", &self.inner.document)
            .field("backend", &self.inner.backend)
            .field("in_flight", &self.inner.in_flight)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BrowserBackend, BrowserHost, FileDialogs};
    use crate::config::{MAX_FILE_SIZE, DEFAULT_CONTENT};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Dialogs that answer from a queue and remember how they were seeded
    #[derive(Default)]
    struct ScriptedDialogs {
        open_answers: RefCell<VecDeque<Option<PathBuf>>>,
        save_answers: RefCell<VecDeque<Option<PathBuf>>>,
        save_seeds: RefCell<Vec<PathBuf>>,
        save_gate: Option<Rc<Notify>>,
    }

    impl ScriptedDialogs {
        fn answer_open(&self, answer: Option<&Path>) {
            self.open_answers
                .borrow_mut()
                .push_back(answer.map(Path::to_path_buf));
        }

        fn answer_save(&self, answer: Option<&Path>) {
            self.save_answers
                .borrow_mut()
                .push_back(answer.map(Path::to_path_buf));
        }
    }

    #[async_trait(?Send)]
    impl FileDialogs for ScriptedDialogs {
        async fn pick_open_location(&self, filters: &[FileFilter]) -> Option<PathBuf> {
            assert_eq!(filters.len(), 2);
            self.open_answers.borrow_mut().pop_front().flatten()
        }

        async fn pick_save_location(
            &self,
            _filters: &[FileFilter],
            default_path: &Path,
        ) -> Option<PathBuf> {
            self.save_seeds.borrow_mut().push(default_path.to_path_buf());
            if let Some(gate) = &self.save_gate {
                gate.notified().await;
            }
            self.save_answers.borrow_mut().pop_front().flatten()
        }
    }

    /// Browser host that hands out queued blobs and records downloads
    #[derive(Default)]
    struct RecordingHost {
        blobs: RefCell<VecDeque<Option<Blob>>>,
        downloads: RefCell<Vec<(String, String)>>,
    }

    #[async_trait(?Send)]
    impl BrowserHost for RecordingHost {
        async fn request_blob_selection(&self) -> Option<Blob> {
            self.blobs.borrow_mut().pop_front().flatten()
        }

        fn trigger_download(&self, name: &str, text: &str) {
            self.downloads
                .borrow_mut()
                .push((name.to_string(), text.to_string()));
        }
    }

    fn native_manager(dialogs: Rc<ScriptedDialogs>) -> DocumentManager {
        let backend = Backend::Native(NativeBackend::new(dialogs, MAX_FILE_SIZE));
        DocumentManager::new(backend, &Config::default())
    }

    fn browser_manager(host: Rc<RecordingHost>) -> DocumentManager {
        let backend = Backend::BrowserOnly(BrowserBackend::new(host));
        DocumentManager::new(backend, &Config::default())
    }

    #[test]
    fn test_fresh_document_then_edit() {
        let manager = native_manager(Rc::default());
        assert_eq!(manager.text(), DEFAULT_CONTENT);
        assert_eq!(manager.display_name(), "Untitled.md");
        assert!(!manager.is_dirty());

        manager.edit("hello");
        assert!(manager.is_dirty());
        assert_eq!(manager.text(), "hello");
    }

    #[tokio::test]
    async fn test_native_open_replaces_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# Title").unwrap();

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_open(Some(&path));
        let manager = native_manager(dialogs);
        manager.edit("unsaved");

        assert_eq!(manager.open().await.unwrap(), Outcome::Completed);
        assert_eq!(manager.text(), "# Title");
        assert_eq!(manager.display_name(), "a.md");
        assert_eq!(manager.backing_location(), Some(path));
        assert!(!manager.is_dirty());
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_native_save_reuses_backing_location() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# Title").unwrap();

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_open(Some(&path));
        dialogs.answer_save(Some(&path));
        let manager = native_manager(dialogs.clone());

        manager.open().await.unwrap();
        manager.edit("# Title\nmore");
        assert_eq!(manager.save().await.unwrap(), Outcome::Completed);

        assert_eq!(dialogs.save_seeds.borrow().as_slice(), &[path.clone()]);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Title\nmore");
        assert!(!manager.is_dirty());
        assert_eq!(manager.display_name(), "a.md");
    }

    #[tokio::test]
    async fn test_unbacked_save_is_seeded_with_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("chosen.md");

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_save(Some(&target));
        let manager = native_manager(dialogs.clone());
        manager.edit("draft");

        manager.save().await.unwrap();
        assert_eq!(
            dialogs.save_seeds.borrow().as_slice(),
            &[PathBuf::from("Untitled.md")]
        );
        assert_eq!(manager.backing_location(), Some(target.clone()));
        assert_eq!(manager.display_name(), "chosen.md");
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "draft");
    }

    #[tokio::test]
    async fn test_save_then_open_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("round.md");

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_save(Some(&path));
        dialogs.answer_open(Some(&path));
        let manager = native_manager(dialogs);

        manager.edit("$$x^2$$\n");
        manager.save().await.unwrap();
        manager.edit("scratch");
        manager.open().await.unwrap();

        assert_eq!(manager.text(), "$$x^2$$\n");
        assert_eq!(manager.backing_location(), Some(path));
        assert_eq!(manager.display_name(), "round.md");
    }

    #[tokio::test]
    async fn test_repeated_save_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("twice.md");

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_save(Some(&path));
        dialogs.answer_save(Some(&path));
        let manager = native_manager(dialogs);
        manager.edit("same");

        assert_eq!(manager.save().await.unwrap(), Outcome::Completed);
        let first = std::fs::read(&path).unwrap();
        assert_eq!(manager.save().await.unwrap(), Outcome::Completed);
        assert_eq!(std::fs::read(&path).unwrap(), first);
        assert!(!manager.is_dirty());
    }

    #[tokio::test]
    async fn test_cancelled_pickers_change_nothing() {
        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_open(None);
        dialogs.answer_save(None);
        let manager = native_manager(dialogs);
        manager.edit("keep me");
        let before = manager.snapshot();

        assert_eq!(manager.open().await.unwrap(), Outcome::Cancelled);
        assert_eq!(manager.snapshot(), before);
        assert_eq!(manager.save().await.unwrap(), Outcome::Cancelled);
        assert_eq!(manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_read_failure_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let deleted = dir.path().join("deleted.md");

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_open(Some(&deleted));
        let manager = native_manager(dialogs);
        manager.edit("still here");
        let before = manager.snapshot();

        let err = manager.open().await.unwrap_err();
        assert!(matches!(err, DocumentError::Io(FileError::NotFound { .. })));
        assert_eq!(manager.snapshot(), before);
        assert!(!manager.is_busy());
    }

    #[tokio::test]
    async fn test_write_failure_keeps_document() {
        let dir = tempfile::tempdir().unwrap();
        let unwritable = dir.path().join("missing").join("a.md");

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_save(Some(&unwritable));
        let manager = native_manager(dialogs);
        manager.edit("precious");
        let before = manager.snapshot();

        let err = manager.save().await.unwrap_err();
        assert!(matches!(err, DocumentError::Io(_)));
        assert_eq!(manager.snapshot(), before);
        assert!(manager.is_dirty());
    }

    #[tokio::test]
    async fn test_browser_blob_load_then_download() {
        let host = Rc::new(RecordingHost::default());
        let manager = browser_manager(host.clone());

        manager.load_from_external_blob("notes.txt", "abc");
        assert_eq!(manager.text(), "abc");
        assert_eq!(manager.display_name(), "notes.txt");
        assert_eq!(manager.backing_location(), None);
        assert!(!manager.is_dirty());

        assert_eq!(manager.save().await.unwrap(), Outcome::Completed);
        assert_eq!(
            host.downloads.borrow().as_slice(),
            &[("notes.txt".to_string(), "abc".to_string())]
        );
        assert_eq!(manager.backing_location(), None);
    }

    #[tokio::test]
    async fn test_browser_save_clears_dirty() {
        let host = Rc::new(RecordingHost::default());
        let manager = browser_manager(host.clone());
        manager.edit("typed");

        manager.save().await.unwrap();
        assert!(!manager.is_dirty());
        assert_eq!(host.downloads.borrow()[0].0, "Untitled.md");
    }

    #[tokio::test]
    async fn test_browser_open_uses_blob_picker() {
        let host = Rc::new(RecordingHost::default());
        host.blobs.borrow_mut().push_back(None);
        host.blobs
            .borrow_mut()
            .push_back(Some(Blob::new("picked.md", "# Picked")));
        let manager = browser_manager(host);
        let before = manager.snapshot();

        assert_eq!(manager.open().await.unwrap(), Outcome::Cancelled);
        assert_eq!(manager.snapshot(), before);

        assert_eq!(manager.open().await.unwrap(), Outcome::Completed);
        assert_eq!(manager.text(), "# Picked");
        assert_eq!(manager.display_name(), "picked.md");
        assert_eq!(manager.backing_location(), None);
    }

    #[tokio::test]
    async fn test_browser_open_rejects_binary_blob() {
        let host = Rc::new(RecordingHost::default());
        host.blobs
            .borrow_mut()
            .push_back(Some(Blob::new("scan.txt", vec![0x89, b'P', 0xFF])));
        let manager = browser_manager(host);
        manager.edit("mine");
        let before = manager.snapshot();

        let err = manager.open().await.unwrap_err();
        assert!(matches!(err, DocumentError::Decode { .. }));
        assert_eq!(manager.snapshot(), before);
    }

    #[test]
    fn test_load_blob_rejects_unlisted_extension() {
        let manager = browser_manager(Rc::new(RecordingHost::default()));
        manager.edit("mine");
        let before = manager.snapshot();

        let err = manager
            .load_blob(&Blob::new("notes.json", "{\"a\": 1}"))
            .unwrap_err();
        assert!(matches!(err, DocumentError::UnsupportedType { .. }));
        assert_eq!(manager.snapshot(), before);

        manager.load_blob(&Blob::new("NOTES.MARKDOWN", "ok")).unwrap();
        assert_eq!(manager.display_name(), "NOTES.MARKDOWN");
    }

    #[tokio::test]
    async fn test_native_drop_discards_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.md");
        std::fs::write(&path, "# Title").unwrap();

        let dialogs = Rc::new(ScriptedDialogs::default());
        dialogs.answer_open(Some(&path));
        let manager = native_manager(dialogs);
        manager.open().await.unwrap();

        manager.load_blob(&Blob::new("dropped.md", "dropped")).unwrap();
        assert_eq!(manager.backing_location(), None);
        assert_eq!(manager.display_name(), "dropped.md");
        assert!(!manager.is_dirty());
    }

    #[tokio::test]
    async fn test_open_path_without_picker() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cli.md");
        std::fs::write(&path, "from the command line").unwrap();

        let manager = native_manager(Rc::default());
        assert_eq!(manager.open_path(&path).await.unwrap(), Outcome::Completed);
        assert_eq!(manager.backing_location(), Some(path));

        let host = Rc::new(RecordingHost::default());
        let browser = browser_manager(host);
        browser.open_path(dir.path().join("cli.md")).await.unwrap();
        assert_eq!(browser.display_name(), "cli.md");
        assert_eq!(browser.backing_location(), None);
    }

    #[tokio::test]
    async fn test_pending_save_rejects_second_operation_and_writes_latest_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("race.md");
        let gate = Rc::new(Notify::new());

        let dialogs = Rc::new(ScriptedDialogs {
            save_gate: Some(gate.clone()),
            ..ScriptedDialogs::default()
        });
        dialogs.answer_save(Some(&path));
        let manager = native_manager(dialogs);
        manager.edit("typed before shortcut");

        let (saved, competing) = tokio::join!(manager.save(), async {
            assert!(manager.is_busy());
            let competing = manager.open().await;
            manager.edit("typed while dialog was open");
            gate.notify_one();
            competing
        });

        assert_eq!(saved.unwrap(), Outcome::Completed);
        assert!(matches!(competing, Err(DocumentError::Busy)));
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "typed while dialog was open"
        );
        assert!(!manager.is_dirty());
        assert!(!manager.is_busy());
    }
}
