//! Backend capability detection
//!
//! The host is inspected once per process. Later calls return the cached answer,
//! so the backend cannot change underneath an open document.

use std::sync::OnceLock;

static CAPABILITY: OnceLock<Capability> = OnceLock::new();

/// Which I/O backend the host supports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Capability {
    /// Native dialogs and path-based file access
    Native,
    /// In-memory blobs and client-side downloads only
    #[default]
    BrowserOnly,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Capability::Native => "native",
            Capability::BrowserOnly => "browser-only",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// What the host environment looks like, as far as detection cares
#[derive(Debug, Clone, Copy, Default)]
pub struct HostTraits {
    /// Built for a browser (wasm) target
    pub wasm: bool,
    /// Platform always has a desktop session (Windows, macOS)
    pub desktop_platform: bool,
    /// A Wayland or X11 display is reachable
    pub display_server: bool,
}

impl HostTraits {
    /// Inspect the current process
    pub fn current() -> Self {
        let has_var = |name: &str| std::env::var_os(name).is_some_and(|v| !v.is_empty());
        Self {
            wasm: cfg!(target_arch = "wasm32"),
            desktop_platform: cfg!(any(target_os = "windows", target_os = "macos")),
            display_server: has_var("WAYLAND_DISPLAY") || has_var("DISPLAY"),
        }
    }
}

/// Decide the capability from host traits; inconclusive means browser-only
pub fn detect_from(traits: HostTraits) -> Capability {
    if traits.wasm {
        return Capability::BrowserOnly;
    }
    if traits.desktop_platform || traits.display_server {
        Capability::Native
    } else {
        Capability::BrowserOnly
    }
}

/// Process-wide capability, computed on first call
pub fn detect() -> Capability {
    *CAPABILITY.get_or_init(|| {
        let capability = detect_from(HostTraits::current());
        log::debug!("Detected {} backend capability", capability);
        capability
    })
}

/// Pin the capability before anything has detected it
///
/// Returns the capability actually in effect, which is the earlier value if
/// detection already ran.
pub fn force(capability: Capability) -> Capability {
    let effective = *CAPABILITY.get_or_init(|| capability);
    if effective != capability {
        log::warn!(
            "Backend already resolved as {}, ignoring request for {}",
            effective,
            capability
        );
    }
    effective
}
