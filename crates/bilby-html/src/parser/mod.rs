//! HTML tree construction.
//!
//! Implements [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//! of the WHATWG HTML Living Standard.

/// Tree builder state and construction primitives.
pub mod core;
/// Foreign content (SVG, MathML) support.
pub mod foreign_content;
/// The insertion-mode handlers.
mod modes;
/// Quirks-mode determination from the DOCTYPE.
pub mod quirks;
/// Element category tables.
pub mod tag_sets;

pub use core::{FragmentContext, InsertionMode, TreeBuilder};
pub use quirks::QuirksMode;
