//! Token types produced by the tokenizer and the sink seam the tree builder
//! plugs into.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! "The output of the tokenization step is a series of zero or more of the
//! following tokens: DOCTYPE, start tag, end tag, comment, character,
//! end-of-file."

use core::fmt;

use bilby_dom::{AttrList, DoctypeData, Namespace};

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer emits tokens of these types to the tree construction stage.
/// Character data arrives as whole runs (the tokenizer buffers and flushes at
/// tag/comment/doctype boundaries), not per-character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// "DOCTYPE tokens have a name, a public identifier, a system
    /// identifier, and a force-quirks flag."
    Doctype(DoctypeData),

    /// "Start and end tag tokens have a tag name, a self-closing flag, and a
    /// list of attributes."
    StartTag {
        /// "a tag name" (ASCII-lowercased by the tokenizer)
        name: String,
        /// "a list of attributes" (duplicates already rejected)
        attrs: AttrList,
        /// "a self-closing flag"
        self_closing: bool,
    },

    /// End tag token. Attributes on end tags are parsed but carry no meaning
    /// for tree construction.
    EndTag {
        /// "a tag name" (ASCII-lowercased by the tokenizer)
        name: String,
        /// "a list of attributes"
        attrs: AttrList,
    },

    /// A run of character data, already CR/LF-normalized and (for the DATA
    /// and RCDATA content models) entity-decoded.
    Characters {
        /// "data"
        data: String,
    },

    /// "Comment and character tokens have data."
    Comment {
        /// "data"
        data: String,
    },

    /// End-of-file token signals the end of input.
    EndOfFile,
}

impl Token {
    /// Tag name of a start or end tag token.
    #[must_use]
    pub fn tag_name(&self) -> Option<&str> {
        match self {
            Self::StartTag { name, .. } | Self::EndTag { name, .. } => Some(name.as_str()),
            _ => None,
        }
    }

    /// Returns true if this is an end-of-file token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EndOfFile)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Doctype(data) => {
                write!(f, "DOCTYPE")?;
                if let Some(name) = &data.name {
                    write!(f, " {name}")?;
                }
                if let Some(public_id) = &data.public_id {
                    write!(f, " PUBLIC \"{public_id}\"")?;
                }
                if let Some(system_id) = &data.system_id {
                    write!(f, " SYSTEM \"{system_id}\"")?;
                }
                if data.force_quirks {
                    write!(f, " (force-quirks)")?;
                }
                Ok(())
            }
            Self::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                write!(f, "<{name}")?;
                for attr in attrs {
                    write!(f, " {}=\"{}\"", attr.name, attr.value.as_deref().unwrap_or(""))?;
                }
                if *self_closing {
                    write!(f, " /")?;
                }
                write!(f, ">")
            }
            Self::EndTag { name, .. } => write!(f, "</{name}>"),
            Self::Characters { data } => write!(f, "Characters({data:?})"),
            Self::Comment { data } => write!(f, "<!--{data}-->"),
            Self::EndOfFile => write!(f, "EOF"),
        }
    }
}

/// End position of an emitted token, 1-indexed line, 0-indexed column
/// pointing after the token's last character.
///
/// Zeroed when error collection is disabled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Position {
    /// 1-indexed line.
    pub line: u32,
    /// 0-indexed column after the last character of the token.
    pub column: u32,
}

/// The sink's reply to an emitted token.
///
/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The tree builder can direct the tokenizer into PLAINTEXT (for
/// `<plaintext>`); the RCDATA/RAWTEXT switches are keyed off the tag name
/// and the sink's namespace instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkResult {
    /// Keep tokenizing normally.
    Continue,
    /// Switch the tokenizer to the PLAINTEXT state.
    Plaintext,
}

/// The receiver of the token stream.
///
/// The tokenizer calls the sink synchronously for every token; tokens are
/// moved into the sink, so anything it retains it owns. The sink also
/// answers the namespace question that drives content-model switching.
pub trait TokenSink {
    /// Process one non-character token.
    fn process_token(&mut self, token: Token, pos: Position) -> SinkResult;

    /// Process a run of character data.
    fn process_characters(&mut self, data: String, pos: Position) -> SinkResult;

    /// Namespace of the adjusted current node.
    ///
    /// Used by the tokenizer to gate the RCDATA/RAWTEXT/PLAINTEXT switches
    /// (HTML namespace only) and CDATA sections (foreign content only).
    fn adjusted_current_namespace(&self) -> Namespace {
        Namespace::Html
    }
}
