//! Markdown module for LaTeX Studio
//!
//! Turns document text into the preview pane's content:
//! - `preview`: pulldown-cmark parsing into a tree with math spans
//! - `math`: Unicode approximation of TeX for terminal output
//! - `export`: plain-text layout of a preview tree

pub mod export;
pub mod math;
pub mod preview;

pub use export::to_plain_text;
pub use preview::PreviewRenderer;

/// Render document text straight to terminal text
pub fn render_plain(renderer: &PreviewRenderer, markdown: &str) -> String {
    to_plain_text(&renderer.render(markdown))
}
