//! Main application
//!
//! The terminal front-end of LaTeX Studio. Input lines become [`Message`]s;
//! open and save run as local tasks whose results come back through the same
//! message channel, so editing keeps working while a picker is up.

use std::collections::HashMap;
use std::future::Future;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::backend::{detect, Backend, Blob, BrowserBackend, Capability, NativeBackend, SystemDialogs};
use crate::config::{Config, APP_NAME};
use crate::error::{AppResult, DocumentResult};
use crate::host::TerminalHost;
use crate::markdown::{render_plain, PreviewRenderer};
use crate::menu::{command_binds, help_text, parse_line, Action, SaveDelivery, SaveShortcut};
use crate::message::{
    EditorMessage, FileMessage, InternalMessage, Message, SystemMessage, ViewMessage,
};
use crate::state::{DocumentManager, Outcome};

/// Startup flags from the command line
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub config: Config,
    /// File to open on startup
    pub file: Option<PathBuf>,
}

/// Resolve the backend, open the startup file and run the shell until quit
pub async fn run(flags: Flags) -> AppResult<()> {
    let capability = if flags.config.force_browser_only {
        detect::force(Capability::BrowserOnly)
    } else {
        detect::detect()
    };
    log::info!("Using {} backend", capability);

    let (sender, receiver) = mpsc::unbounded_channel();
    let (backend, host) = build_backend(capability, &flags.config, sender.clone());
    let manager = DocumentManager::new(backend, &flags.config);
    let mut studio = Studio::new(manager, host, &flags.config, sender, receiver);

    if let Some(path) = flags.file {
        studio.open_path(path);
    }
    studio.run().await
}

/// Backend for `capability`, plus the terminal host when it is browser-only
pub fn build_backend(
    capability: Capability,
    config: &Config,
    sender: mpsc::UnboundedSender<Message>,
) -> (Backend, Option<Rc<TerminalHost>>) {
    match capability {
        Capability::Native => {
            let native = NativeBackend::new(Rc::new(SystemDialogs), config.max_file_size);
            (Backend::Native(native), None)
        }
        Capability::BrowserOnly => {
            let host = Rc::new(TerminalHost::new(sender));
            let browser = BrowserBackend::new(host.clone());
            (Backend::BrowserOnly(browser), Some(host))
        }
    }
}

/// The shell: one document, one input stream, one message loop
pub struct Studio {
    manager: DocumentManager,
    /// Present only with the browser-only backend
    host: Option<Rc<TerminalHost>>,
    renderer: PreviewRenderer,
    binds: HashMap<&'static str, Action>,
    save_shortcut: SaveShortcut,
    sender: mpsc::UnboundedSender<Message>,
    receiver: mpsc::UnboundedReceiver<Message>,
    running: bool,
}

impl Studio {
    pub fn new(
        manager: DocumentManager,
        host: Option<Rc<TerminalHost>>,
        config: &Config,
        sender: mpsc::UnboundedSender<Message>,
        receiver: mpsc::UnboundedReceiver<Message>,
    ) -> Self {
        Self {
            manager,
            host,
            renderer: PreviewRenderer::new(),
            binds: command_binds(),
            save_shortcut: SaveShortcut::new(config.save_debounce_ms),
            sender,
            receiver,
            running: true,
        }
    }

    /// Read stdin until `:quit` or end of input
    ///
    /// Must run inside a `LocalSet`; operations are spawned with `spawn_local`.
    pub async fn run(&mut self) -> AppResult<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        println!(
            "{} ({} backend). Type :help for commands.",
            APP_NAME,
            self.manager.capability()
        );
        println!("{}", self.status_line());

        while self.running {
            tokio::select! {
                line = lines.next_line() => match line? {
                    Some(line) => self.handle_input(&line),
                    None => {
                        if self.manager.is_dirty() {
                            log::warn!("Input closed with unsaved changes in {}", self.manager.display_name());
                        }
                        break;
                    }
                },
                Some(message) = self.receiver.recv() => self.update(message),
            }
        }

        log::info!("Shutting down");
        Ok(())
    }

    /// Handle one line of user input
    pub fn handle_input(&mut self, line: &str) {
        match parse_line(&self.binds, line) {
            Ok(Message::File(FileMessage::Save)) => match self.save_shortcut.press() {
                SaveDelivery::Now(message) => self.update(message),
                SaveDelivery::Later(delay) => self.schedule_trailing_save(delay),
                SaveDelivery::Coalesced => log::debug!("Save shortcut already scheduled"),
            },
            Ok(message) => self.update(message),
            Err(e) => eprintln!("{}", e),
        }
    }

    /// Update application state based on message
    pub fn update(&mut self, message: Message) {
        match message {
            Message::File(msg) => self.handle_file_message(msg),
            Message::Editor(msg) => self.handle_editor_message(msg),
            Message::View(msg) => self.handle_view_message(msg),
            Message::System(msg) => self.handle_system_message(msg),
            Message::Internal(msg) => self.handle_internal_message(msg),
            Message::None => {}
        }
    }

    /// Open `path` directly, without a picker
    pub fn open_path(&self, path: PathBuf) {
        let manager = self.manager.clone();
        self.spawn(async move {
            InternalMessage::Opened(report("Open", manager.open_path(path).await))
        });
    }

    // ========================================================================
    // Message Handlers
    // ========================================================================

    fn handle_file_message(&mut self, msg: FileMessage) {
        match msg {
            FileMessage::Open => {
                let manager = self.manager.clone();
                self.spawn(async move { InternalMessage::Opened(report("Open", manager.open().await)) });
            }

            FileMessage::Save => {
                let manager = self.manager.clone();
                self.spawn(async move { InternalMessage::Saved(report("Save", manager.save().await)) });
            }

            FileMessage::Drop(path) => {
                // Dropped files are taken as name plus bytes under either backend
                let manager = self.manager.clone();
                self.spawn(async move {
                    let result = match Blob::from_path(&path).await {
                        Ok(blob) => manager
                            .load_blob(&blob)
                            .map(|()| Outcome::Completed)
                            .map_err(|e| {
                                log::error!("Drop of {} failed: {}", path.display(), e);
                                e.user_message()
                            }),
                        Err(e) => {
                            log::error!("Failed to read dropped file {}: {}", path.display(), e);
                            Err(format!("Could not read {}: {}", path.display(), e))
                        }
                    };
                    InternalMessage::Opened(result)
                });
            }

            FileMessage::Pick(path) => self.answer_pick(Some(path)),

            FileMessage::CancelPick => self.answer_pick(None),
        }
    }

    fn handle_editor_message(&mut self, msg: EditorMessage) {
        match msg {
            EditorMessage::Set(text) => self.manager.edit(text),

            EditorMessage::Append(line) => {
                let mut text = self.manager.text();
                if !text.is_empty() && !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&line);
                self.manager.edit(text);
            }
        }
    }

    fn handle_view_message(&mut self, msg: ViewMessage) {
        match msg {
            ViewMessage::Show => println!("{}", self.manager.text()),

            ViewMessage::Preview => {
                println!("{}", render_plain(&self.renderer, &self.manager.text()))
            }

            ViewMessage::Status { json: true } => {
                match serde_json::to_string_pretty(&self.manager.snapshot()) {
                    Ok(json) => println!("{}", json),
                    Err(e) => log::error!("Failed to serialize status: {}", e),
                }
            }

            ViewMessage::Status { json: false } => println!("{}", self.status_line()),

            ViewMessage::Help => print!("{}", help_text()),
        }
    }

    fn handle_system_message(&mut self, msg: SystemMessage) {
        match msg {
            SystemMessage::Quit { force } => {
                if self.manager.is_dirty() && !force {
                    eprintln!(
                        "{} has unsaved changes. Use :save, or :quit! to discard them.",
                        self.manager.display_name()
                    );
                    return;
                }
                self.running = false;
            }
        }
    }

    fn handle_internal_message(&mut self, msg: InternalMessage) {
        match msg {
            InternalMessage::Opened(Ok(Outcome::Completed)) => {
                println!("Opened {}", self.manager.display_name())
            }
            InternalMessage::Saved(Ok(Outcome::Completed)) => {
                println!("Saved {}", self.manager.display_name())
            }
            InternalMessage::Opened(Ok(Outcome::Cancelled)) => println!("Open cancelled"),
            InternalMessage::Saved(Ok(Outcome::Cancelled)) => println!("Save cancelled"),
            InternalMessage::Opened(Err(error)) | InternalMessage::Saved(Err(error)) => {
                eprintln!("Error: {}", error)
            }
            InternalMessage::Notice(text) => println!("{}", text),

            InternalMessage::TrailingSave => {
                if self.manager.is_busy() {
                    // Saving now would be rejected as busy; wait another window
                    self.schedule_trailing_save(self.save_shortcut.window());
                } else {
                    let message = self.save_shortcut.fire_trailing();
                    self.update(message);
                }
            }
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = InternalMessage> + 'static,
    {
        let sender = self.sender.clone();
        tokio::task::spawn_local(async move {
            // The receiver only goes away during shutdown
            let _ = sender.send(task.await.into());
        });
    }

    fn schedule_trailing_save(&self, delay: Duration) {
        log::debug!("Save shortcut coalesced, saving in {:?}", delay);
        self.spawn(async move {
            tokio::time::sleep(delay).await;
            InternalMessage::TrailingSave
        });
    }

    fn answer_pick(&self, choice: Option<PathBuf>) {
        let answered = self
            .host
            .as_ref()
            .map(|host| host.answer_pick(choice))
            .unwrap_or(false);
        if !answered {
            eprintln!("No file picker is waiting for an answer");
        }
    }

    fn status_line(&self) -> String {
        let snapshot = self.manager.snapshot();
        let location = snapshot
            .backing_location
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "not on disk".to_string());
        format!(
            "{} | {} | {} words, {} lines{}",
            self.manager.title(),
            location,
            snapshot.words,
            snapshot.lines,
            if self.manager.is_busy() { " | busy" } else { "" }
        )
    }
}

/// Log a failed operation and reduce it to what the user is shown
fn report(operation: &str, result: DocumentResult<Outcome>) -> Result<Outcome, String> {
    result.map_err(|e| {
        log::error!("{} failed: {}", operation, e);
        e.user_message()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    struct Fixture {
        studio: Studio,
        host: Rc<TerminalHost>,
        downloads: tempfile::TempDir,
    }

    fn browser_studio() -> Fixture {
        browser_studio_with(Config::default())
    }

    fn browser_studio_with(config: Config) -> Fixture {
        let downloads = tempfile::tempdir().unwrap();
        let (sender, receiver) = mpsc::unbounded_channel();
        let host = Rc::new(TerminalHost::with_download_dir(
            Some(downloads.path().to_path_buf()),
            sender.clone(),
        ));
        let manager = DocumentManager::new(
            Backend::BrowserOnly(BrowserBackend::new(host.clone())),
            &config,
        );
        let studio = Studio::new(manager, Some(host.clone()), &config, sender, receiver);
        Fixture {
            studio,
            host,
            downloads,
        }
    }

    /// Feed channel messages back into the studio until one matches
    async fn pump_until(studio: &mut Studio, done: impl Fn(&Message) -> bool) {
        loop {
            let message = studio.receiver.recv().await.unwrap();
            let finished = done(&message);
            studio.update(message);
            if finished {
                return;
            }
        }
    }

    fn is_opened(message: &Message) -> bool {
        matches!(message, Message::Internal(InternalMessage::Opened(_)))
    }

    fn is_saved(message: &Message) -> bool {
        matches!(message, Message::Internal(InternalMessage::Saved(_)))
    }

    #[test]
    fn test_edits_from_input_lines() {
        let mut fx = browser_studio();
        fx.studio.handle_input(":set # Notes");
        fx.studio.handle_input("$a^2 + b^2 = c^2$");

        assert_eq!(fx.studio.manager.text(), "# Notes\n$a^2 + b^2 = c^2$");
        assert!(fx.studio.manager.is_dirty());
    }

    #[test]
    fn test_quit_requires_force_when_dirty() {
        let mut fx = browser_studio();
        fx.studio.handle_input(":quit");
        assert!(!fx.studio.running);

        let mut fx = browser_studio();
        fx.studio.handle_input("new line");
        fx.studio.handle_input(":q");
        assert!(fx.studio.running);
        fx.studio.handle_input(":q!");
        assert!(!fx.studio.running);
    }

    #[tokio::test]
    async fn test_drop_loads_name_and_text() {
        let mut fx = browser_studio();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dropped.md");
        std::fs::write(&path, "Dropped $x$").unwrap();

        LocalSet::new()
            .run_until(async {
                fx.studio.update(Message::File(FileMessage::Drop(path.clone())));
                pump_until(&mut fx.studio, is_opened).await;
            })
            .await;

        assert_eq!(fx.studio.manager.display_name(), "dropped.md");
        assert_eq!(fx.studio.manager.text(), "Dropped $x$");
        assert_eq!(fx.studio.manager.backing_location(), None);
        assert!(!fx.studio.manager.is_dirty());
    }

    #[tokio::test]
    async fn test_open_through_terminal_picker() {
        let mut fx = browser_studio();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("picked.md");
        std::fs::write(&path, "# Picked").unwrap();

        LocalSet::new()
            .run_until(async {
                fx.studio.handle_input(":open");
                while !fx.host.is_picking() {
                    tokio::task::yield_now().await;
                }
                // Edits stay live while the picker is up
                fx.studio.handle_input("typed meanwhile");
                fx.studio.handle_input(&format!(":pick {}", path.display()));
                pump_until(&mut fx.studio, is_opened).await;
            })
            .await;

        assert_eq!(fx.studio.manager.display_name(), "picked.md");
        assert_eq!(fx.studio.manager.text(), "# Picked");
        assert!(!fx.studio.manager.is_dirty());
    }

    #[tokio::test]
    async fn test_cancelled_picker_keeps_document() {
        let mut fx = browser_studio();
        let before = fx.studio.manager.snapshot();

        LocalSet::new()
            .run_until(async {
                fx.studio.handle_input(":open");
                while !fx.host.is_picking() {
                    tokio::task::yield_now().await;
                }
                fx.studio.handle_input(":cancel");
                pump_until(&mut fx.studio, |m| {
                    *m == Message::Internal(InternalMessage::Opened(Ok(Outcome::Cancelled)))
                })
                .await;
            })
            .await;

        assert_eq!(fx.studio.manager.snapshot(), before);
    }

    #[tokio::test]
    async fn test_save_downloads_and_marks_clean() {
        let mut fx = browser_studio();
        fx.studio.handle_input(":set Final text");

        LocalSet::new()
            .run_until(async {
                fx.studio.handle_input(":w");
                pump_until(&mut fx.studio, is_saved).await;
            })
            .await;

        assert!(!fx.studio.manager.is_dirty());
        assert_eq!(
            std::fs::read_to_string(fx.downloads.path().join("Untitled.md")).unwrap(),
            "Final text"
        );
    }

    #[tokio::test]
    async fn test_save_pressed_twice_in_window_writes_latest_text() {
        let mut fx = browser_studio_with(Config {
            save_debounce_ms: 200,
            ..Config::default()
        });

        LocalSet::new()
            .run_until(async {
                fx.studio.handle_input(":set first");
                fx.studio.handle_input(":w");
                pump_until(&mut fx.studio, is_saved).await;

                fx.studio.handle_input(":set second");
                fx.studio.handle_input(":w");
                fx.studio.handle_input(":w");
                pump_until(&mut fx.studio, is_saved).await;
            })
            .await;

        assert!(!fx.studio.manager.is_dirty());
        assert_eq!(
            std::fs::read_to_string(fx.downloads.path().join("Untitled.md")).unwrap(),
            "first"
        );
        assert_eq!(
            std::fs::read_to_string(fx.downloads.path().join("Untitled (1).md")).unwrap(),
            "second"
        );
        assert!(!fx.downloads.path().join("Untitled (2).md").exists());
    }

    #[tokio::test]
    async fn test_drop_of_unlisted_type_keeps_document() {
        let mut fx = browser_studio();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.json");
        std::fs::write(&path, "{\"title\": \"notes\"}").unwrap();
        fx.studio.handle_input("my edit");
        let before = fx.studio.manager.snapshot();

        LocalSet::new()
            .run_until(async {
                fx.studio.handle_input(&format!(":drop {}", path.display()));
                pump_until(&mut fx.studio, |m| {
                    matches!(m, Message::Internal(InternalMessage::Opened(Err(_))))
                })
                .await;
            })
            .await;

        assert_eq!(fx.studio.manager.snapshot(), before);
    }
}
