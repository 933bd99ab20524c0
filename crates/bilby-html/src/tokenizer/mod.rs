//! HTML tokenizer module.
//!
//! Implements [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//! of the WHATWG HTML Living Standard.

/// Flush-time character reference decoding per § 13.2.5.72.
pub mod character_reference;
/// Named character reference lookup tables per § 13.2.5.73.
pub mod named_character_references;
/// Token types and the tree-builder sink seam.
pub mod token;
/// The tokenizer state machine itself.
pub mod tokenizer;

pub use token::{Position, SinkResult, Token, TokenSink};
pub use tokenizer::{Tokenizer, TokenizerOpts, TokenizerState};
