//! State management module for LaTeX Studio
//!
//! - `document`: the single live document and its dirty/identity rules
//! - `lifecycle`: open/save/load routing through the selected backend

mod document;
mod lifecycle;

pub use lifecycle::*;
