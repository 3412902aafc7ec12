//! I/O backends for LaTeX Studio
//!
//! Two mutually exclusive ways of getting text in and out:
//! - `native`: dialogs plus read/write by path
//! - `browser`: picked blobs in, downloads out
//!
//! `detect` decides once which one the host supports.

pub mod browser;
pub mod detect;
pub mod encoding;
pub mod native;

pub use browser::{read_blob, Blob, BrowserBackend, BrowserHost};
pub use detect::Capability;
pub use native::{FileDialogs, NativeBackend, SystemDialogs};

/// The backend selected for this run
#[derive(Debug, Clone)]
pub enum Backend {
    Native(NativeBackend),
    BrowserOnly(BrowserBackend),
}

impl Backend {
    pub fn capability(&self) -> Capability {
        match self {
            Backend::Native(_) => Capability::Native,
            Backend::BrowserOnly(_) => Capability::BrowserOnly,
        }
    }
}
