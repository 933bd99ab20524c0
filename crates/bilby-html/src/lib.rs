//! Spec-conformant WHATWG HTML parsing for the Bilby toolkit.
//!
//! # Scope
//!
//! This crate implements:
//! - **Encoding sniffing** ([WHATWG § 13.2.3](https://html.spec.whatwg.org/multipage/parsing.html#the-input-byte-stream))
//!   - transport label, BOM, and bounded `<meta charset>` prescan
//! - **HTML Tokenizer** ([WHATWG § 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization))
//!   - Data, RCDATA, RAWTEXT, PLAINTEXT, CDATA, and the script-escape states
//!   - DOCTYPE, comment, and attribute parsing with per-position errors
//!   - flush-time character reference decoding (full named-entity table)
//! - **HTML Tree Builder** ([WHATWG § 13.2.6](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction))
//!   - all insertion modes, foster parenting, the adoption agency
//!     algorithm, the active-formatting list, templates, and foreign
//!     content integration points
//! - **Fragment parsing** with an element context and `iframe srcdoc`
//!   handling
//!
//! The output is an arena tree from [`bilby_dom`] plus an ordered list of
//! parse errors.
//!
//! # Example
//!
//! ```ignore
//! use bilby_html::{ParseOpts, parse_document};
//!
//! let parsed = parse_document("<p>Hello <b>world</b></p>", &ParseOpts::default()).unwrap();
//! let html = bilby_dom::serialize::to_html(&parsed.dom, parsed.dom.root(), false, 2);
//! ```

/// Encoding sniffing and decoding.
pub mod encoding;
/// Parse error types and message definitions.
pub mod errors;
/// HTML tree construction.
pub mod parser;
/// HTML tokenizer.
pub mod tokenizer;

use bilby_dom::DomTree;

pub use crate::errors::{ParseError, StrictModeError};
pub use crate::parser::{FragmentContext, TreeBuilder};
pub use crate::tokenizer::{Tokenizer, TokenizerOpts, TokenizerState};

/// Options controlling a parse.
#[derive(Debug, Clone, Default)]
pub struct ParseOpts {
    /// Collect parse errors (with positions) into the result.
    pub collect_errors: bool,
    /// Raise a [`StrictModeError`] for the first parse error (implies
    /// `collect_errors`).
    pub strict: bool,
    /// The document is an `iframe srcdoc` document: a non-HTML doctype does
    /// not force quirks mode.
    pub iframe_srcdoc: bool,
    /// Transport-layer encoding label (e.g. from a Content-Type header);
    /// wins over BOM and meta sniffing when recognized.
    pub transport_encoding: Option<String>,
}

/// The result of a parse: the tree, the errors, and (for byte input) the
/// encoding that was chosen.
#[derive(Debug)]
pub struct ParsedDocument {
    /// The document (or fragment) tree.
    pub dom: DomTree,
    /// Parse errors in emission order (empty unless collection was enabled).
    pub errors: Vec<ParseError>,
    /// The sniffed encoding, for byte input.
    pub encoding: Option<&'static str>,
}

fn run(
    html: &str,
    fragment_context: Option<&FragmentContext>,
    opts: &ParseOpts,
    encoding: Option<&'static str>,
) -> Result<ParsedDocument, StrictModeError> {
    let collect = opts.collect_errors || opts.strict;

    let builder = TreeBuilder::new(fragment_context.cloned(), opts.iframe_srcdoc, collect);

    let mut tokenizer_opts = TokenizerOpts::default();
    if let Some(context) = fragment_context {
        if context.namespace.is_none() {
            // Rawtext and plaintext context elements change what the
            // tokenizer does with the very first character.
            let name = context.tag_name.to_ascii_lowercase();
            match name.as_str() {
                "textarea" | "title" | "style" => {
                    tokenizer_opts.initial_state = Some(TokenizerState::RAWTEXT);
                    tokenizer_opts.initial_rawtext_tag = Some(name);
                }
                "plaintext" | "script" => {
                    tokenizer_opts.initial_state = Some(TokenizerState::PLAINTEXT);
                }
                _ => {}
            }
        }
    }

    let mut tokenizer = Tokenizer::new(builder, tokenizer_opts, collect);
    tokenizer.run(html);

    let tokenizer_errors = std::mem::take(&mut tokenizer.errors);
    let (dom, builder_errors) = tokenizer.sink.finish();

    let mut errors = tokenizer_errors;
    errors.extend(builder_errors);

    if opts.strict {
        if let Some(first) = errors.first() {
            return Err(StrictModeError::new(first.clone(), html));
        }
    }

    Ok(ParsedDocument {
        dom,
        errors,
        encoding,
    })
}

/// Parse a complete HTML document from a string.
///
/// # Errors
///
/// Returns [`StrictModeError`] only when `opts.strict` is set and the input
/// contains a parse error; malformed input otherwise always yields a tree.
pub fn parse_document(html: &str, opts: &ParseOpts) -> Result<ParsedDocument, StrictModeError> {
    run(html, None, opts, None)
}

/// Parse a complete HTML document from bytes, sniffing the encoding.
///
/// # Errors
///
/// Returns [`StrictModeError`] only when `opts.strict` is set and the input
/// contains a parse error.
pub fn parse_document_bytes(
    bytes: &[u8],
    opts: &ParseOpts,
) -> Result<ParsedDocument, StrictModeError> {
    let (html, chosen) = encoding::decode_html(bytes, opts.transport_encoding.as_deref());
    run(&html, None, opts, Some(chosen))
}

/// Parse an HTML fragment in the given element context.
///
/// The result tree is rooted at a `DocumentFragment` node.
///
/// # Errors
///
/// Returns [`StrictModeError`] only when `opts.strict` is set and the input
/// contains a parse error.
pub fn parse_fragment(
    html: &str,
    context: &FragmentContext,
    opts: &ParseOpts,
) -> Result<ParsedDocument, StrictModeError> {
    run(html, Some(context), opts, None)
}
