//! Parse error types and human-readable message definitions.
//!
//! [§ 13.2.2 Parse errors](https://html.spec.whatwg.org/multipage/parsing.html#parse-errors)
//!
//! "The error handling for parse errors is well-defined... this
//! specification defines the parsing rules for all inputs."
//!
//! Every recoverable problem becomes a [`ParseError`] with a stable
//! kebab-case code and a 1-indexed source position. Parsing never aborts on
//! its own; strict mode surfaces the first collected error as a
//! [`StrictModeError`] after the parse completes.

use std::fmt;

use thiserror::Error;

/// A recoverable parse error with location information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// Stable kebab-case identifier (e.g. `eof-in-tag`, `duplicate-attribute`).
    pub code: &'static str,
    /// 1-indexed line of the offending position, when known.
    pub line: Option<u32>,
    /// 1-indexed column of the offending position, when known.
    pub column: Option<u32>,
    /// Human-readable message for the code.
    pub message: String,
}

impl ParseError {
    /// Build an error from a code and optional position.
    #[must_use]
    pub fn new(code: &'static str, line: Option<u32>, column: Option<u32>, message: String) -> Self {
        Self {
            code,
            line,
            column,
            message,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (Some(line), Some(column)) => {
                if self.message == self.code {
                    write!(f, "({line},{column}): {}", self.code)
                } else {
                    write!(f, "({line},{column}): {} - {}", self.code, self.message)
                }
            }
            _ => {
                if self.message == self.code {
                    write!(f, "{}", self.code)
                } else {
                    write!(f, "{} - {}", self.code, self.message)
                }
            }
        }
    }
}

/// Raised by strict mode when the input contains any parse error.
///
/// Carries the first collected [`ParseError`] plus the offending source line
/// and a column span for caret highlighting.
#[derive(Debug, Clone, Error)]
pub struct StrictModeError {
    /// The first parse error encountered.
    pub error: ParseError,
    /// The full text of the source line the error points at, when available.
    pub source_line: Option<String>,
    /// 1-indexed half-open column span to highlight within `source_line`.
    pub span: Option<(u32, u32)>,
}

impl StrictModeError {
    /// Build the abort error for the first collected parse error.
    ///
    /// When the error has a position, the offending line is excerpted from
    /// `source` and a highlight span is derived: the span runs from the
    /// nearest `<` at or before the error column through the closing `>`
    /// (or the error column itself when no tag is found nearby).
    #[must_use]
    pub fn new(error: ParseError, source: &str) -> Self {
        let (source_line, span) = match (error.line, error.column) {
            (Some(line), Some(column)) => {
                let text = source.split('\n').nth(line as usize - 1).map(str::to_string);
                let span = text.as_deref().map(|text| highlight_span(text, column));
                (text, span)
            }
            _ => (None, None),
        };
        Self {
            error,
            source_line,
            span,
        }
    }

}

impl fmt::Display for StrictModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;
        if let (Some(line), Some((start, end))) = (&self.source_line, self.span) {
            writeln!(f)?;
            writeln!(f, "{line}")?;
            let indent = start.saturating_sub(1) as usize;
            let width = (end.saturating_sub(start).max(1)) as usize;
            write!(f, "{}{}", " ".repeat(indent), "^".repeat(width))?;
        }
        Ok(())
    }
}

/// Derive the highlight span for an error at `column` (1-indexed) on `line`.
///
/// Looks backwards (bounded) for a `<` opening the offending tag, then
/// forwards for the closing `>`.
fn highlight_span(line: &str, column: u32) -> (u32, u32) {
    let chars: Vec<char> = line.chars().collect();
    let col_idx = (column as usize).saturating_sub(1).min(chars.len());

    let mut start_idx = col_idx;
    if chars.get(start_idx) != Some(&'<') {
        let mut looked = 0;
        while start_idx > 0 && chars.get(start_idx - 1) != Some(&'<') {
            start_idx -= 1;
            looked += 1;
            if looked > 10 {
                start_idx = col_idx;
                break;
            }
        }
        if start_idx > 0 && chars.get(start_idx - 1) == Some(&'<') {
            start_idx -= 1;
        } else if chars.get(start_idx) != Some(&'<') {
            start_idx = col_idx;
        }
    }

    let mut end_idx = col_idx;
    while end_idx < chars.len() && chars[end_idx] != '>' {
        end_idx += 1;
    }
    if end_idx < chars.len() {
        end_idx += 1;
    }

    (start_idx as u32 + 1, end_idx as u32 + 1)
}

/// Generate a human-readable error message from an error code.
///
/// Falls back to the code itself for unknown codes. `tag_name` contextualizes
/// tag-related tree-builder errors.
#[must_use]
pub fn generate_error_message(code: &str, tag_name: Option<&str>) -> String {
    let tag = tag_name.unwrap_or("?");
    let message: String = match code {
        // ================================================================
        // TOKENIZER ERRORS
        // ================================================================
        // DOCTYPE errors
        "eof-in-doctype" => "Unexpected end of file in DOCTYPE declaration".into(),
        "eof-in-doctype-name" => "Unexpected end of file while reading DOCTYPE name".into(),
        "eof-in-doctype-public-identifier" => {
            "Unexpected end of file in DOCTYPE public identifier".into()
        }
        "eof-in-doctype-system-identifier" => {
            "Unexpected end of file in DOCTYPE system identifier".into()
        }
        "expected-doctype-name-but-got-right-bracket" => "Expected DOCTYPE name but got >".into(),
        "missing-whitespace-before-doctype-name" => "Missing whitespace after <!DOCTYPE".into(),
        "abrupt-doctype-public-identifier" => "DOCTYPE public identifier ended abruptly".into(),
        "abrupt-doctype-system-identifier" => "DOCTYPE system identifier ended abruptly".into(),
        "missing-quote-before-doctype-public-identifier" => {
            "Missing quote before DOCTYPE public identifier".into()
        }
        "missing-quote-before-doctype-system-identifier" => {
            "Missing quote before DOCTYPE system identifier".into()
        }
        "missing-doctype-public-identifier" => "Missing DOCTYPE public identifier".into(),
        "missing-doctype-system-identifier" => "Missing DOCTYPE system identifier".into(),
        "missing-whitespace-after-doctype-public-identifier" => {
            "Missing whitespace after DOCTYPE public identifier".into()
        }
        "missing-whitespace-between-doctype-public-and-system-identifiers" => {
            "Missing whitespace between DOCTYPE identifiers".into()
        }
        "missing-whitespace-after-doctype-name" => "Missing whitespace after DOCTYPE name".into(),
        "unexpected-character-after-doctype-public-keyword" => {
            "Unexpected character after PUBLIC keyword".into()
        }
        "unexpected-character-after-doctype-system-keyword" => {
            "Unexpected character after SYSTEM keyword".into()
        }
        "unexpected-character-after-doctype-public-identifier" => {
            "Unexpected character after public identifier".into()
        }
        "unexpected-character-after-doctype-system-identifier" => {
            "Unexpected character after system identifier".into()
        }
        // Comment errors
        "eof-in-comment" => "Unexpected end of file in comment".into(),
        "abrupt-closing-of-empty-comment" => "Comment ended abruptly with -->".into(),
        "incorrectly-closed-comment" => "Comment ended with --!> instead of -->".into(),
        // Tag errors
        "eof-in-tag" => "Unexpected end of file in tag".into(),
        "eof-before-tag-name" => "Unexpected end of file before tag name".into(),
        "empty-end-tag" => "Empty end tag </> is not allowed".into(),
        "invalid-first-character-of-tag-name" => "Invalid first character of tag name".into(),
        "unexpected-question-mark-instead-of-tag-name" => {
            "Unexpected ? instead of tag name".into()
        }
        "unexpected-character-after-solidus-in-tag" => {
            "Unexpected character after / in tag".into()
        }
        // Attribute errors
        "duplicate-attribute" => "Duplicate attribute name".into(),
        "missing-attribute-value" => "Missing attribute value".into(),
        "unexpected-character-in-attribute-name" => {
            "Unexpected character in attribute name".into()
        }
        "unexpected-character-in-unquoted-attribute-value" => {
            "Unexpected character in unquoted attribute value".into()
        }
        "missing-whitespace-between-attributes" => "Missing whitespace between attributes".into(),
        "unexpected-equals-sign-before-attribute-name" => {
            "Unexpected = before attribute name".into()
        }
        // Script errors
        "eof-in-script-html-comment-like-text" => {
            "Unexpected end of file in script with HTML-like comment".into()
        }
        // CDATA errors
        "eof-in-cdata" => "Unexpected end of file in CDATA section".into(),
        "cdata-in-html-content" => "CDATA section only allowed in SVG/MathML content".into(),
        // NULL character errors
        "unexpected-null-character" => "Unexpected NULL character (U+0000)".into(),
        // Markup declaration errors
        "incorrectly-opened-comment" => "Incorrectly opened comment".into(),
        // Character reference errors
        "missing-semicolon-after-character-reference" => {
            "Missing semicolon after character reference".into()
        }
        // ================================================================
        // TREE BUILDER ERRORS
        // ================================================================
        // DOCTYPE errors
        "unexpected-doctype" => "Unexpected DOCTYPE declaration".into(),
        "unknown-doctype" => "Unknown DOCTYPE (expected <!DOCTYPE html>)".into(),
        "expected-doctype-but-got-chars" => "Expected DOCTYPE but got text content".into(),
        "expected-doctype-but-got-eof" => "Expected DOCTYPE but reached end of file".into(),
        "expected-doctype-but-got-start-tag" => {
            format!("Expected DOCTYPE but got <{tag}> tag")
        }
        "expected-doctype-but-got-end-tag" => {
            format!("Expected DOCTYPE but got </{tag}> tag")
        }
        // Unexpected tag errors
        "unexpected-start-tag" => format!("Unexpected <{tag}> start tag"),
        "unexpected-end-tag" => format!("Unexpected </{tag}> end tag"),
        "unexpected-end-tag-before-html" => {
            format!("Unexpected </{tag}> end tag before <html>")
        }
        "unexpected-end-tag-before-head" => {
            format!("Unexpected </{tag}> end tag before <head>")
        }
        "unexpected-end-tag-after-head" => {
            format!("Unexpected </{tag}> end tag after <head>")
        }
        "unexpected-start-tag-ignored" => {
            format!("<{tag}> start tag ignored in current context")
        }
        "unexpected-start-tag-implies-end-tag" => {
            format!("<{tag}> start tag implicitly closes previous element")
        }
        // EOF errors
        "expected-closing-tag-but-got-eof" | "expected-named-closing-tag-but-got-eof" => {
            format!("Expected </{tag}> closing tag but reached end of file")
        }
        // Invalid character errors
        "invalid-codepoint" => "Invalid character (U+0000 NULL or U+000C FORM FEED)".into(),
        "invalid-codepoint-before-head" => "Invalid character before <head>".into(),
        "invalid-codepoint-in-body" => "Invalid character in <body>".into(),
        "invalid-codepoint-in-table-text" => "Invalid character in table text".into(),
        "invalid-codepoint-in-select" => "Invalid character in <select>".into(),
        "invalid-codepoint-in-foreign-content" => "Invalid character in SVG/MathML content".into(),
        // Foster parenting / table errors
        "foster-parenting-character" => "Text content in table requires foster parenting".into(),
        "unexpected-start-tag-implies-table-voodoo" => {
            format!("<{tag}> start tag in table triggers foster parenting")
        }
        "unexpected-end-tag-implies-table-voodoo" => {
            format!("</{tag}> end tag in table triggers foster parenting")
        }
        "unexpected-cell-in-table-body" => "Unexpected table cell outside of table row".into(),
        "unexpected-form-in-table" => "Form element not allowed in table context".into(),
        "unexpected-hidden-input-in-table" => {
            "Hidden input in table triggers foster parenting".into()
        }
        // Context-specific errors
        "unexpected-hidden-input-after-head" => "Unexpected hidden input after <head>".into(),
        "unexpected-token-in-frameset" => "Unexpected content in <frameset>".into(),
        "unexpected-token-after-frameset" => "Unexpected content after <frameset>".into(),
        "unexpected-token-after-after-frameset" => {
            "Unexpected content after frameset closed".into()
        }
        "unexpected-token-after-body" => "Unexpected content after </body>".into(),
        "unexpected-char-after-body" => "Unexpected character after </body>".into(),
        "unexpected-characters-in-column-group" => "Text not allowed in <colgroup>".into(),
        "unexpected-characters-in-template-column-group" => {
            "Text not allowed in template column group".into()
        }
        "unexpected-start-tag-in-column-group" => {
            format!("<{tag}> start tag not allowed in <colgroup>")
        }
        "unexpected-start-tag-in-template-column-group" => {
            format!("<{tag}> start tag not allowed in template column group")
        }
        "unexpected-start-tag-in-template-table-context" => {
            format!("<{tag}> start tag not allowed in template table context")
        }
        "unexpected-start-tag-in-cell-fragment" => {
            format!("<{tag}> start tag not allowed in cell fragment context")
        }
        // Foreign content errors
        "unexpected-html-element-in-foreign-content" => {
            "HTML element breaks out of SVG/MathML content".into()
        }
        "unexpected-end-tag-in-foreign-content" => {
            format!("Mismatched </{tag}> end tag in SVG/MathML content")
        }
        "unexpected-end-tag-in-fragment-context" => {
            format!("</{tag}> end tag not allowed in fragment parsing context")
        }
        // Miscellaneous errors
        "end-tag-too-early" => format!("</{tag}> end tag closed early (unclosed children)"),
        "adoption-agency-1.3" => "Misnested tags require adoption agency algorithm".into(),
        "non-void-html-element-start-tag-with-trailing-solidus" => {
            format!("<{tag}/> self-closing syntax on non-void element")
        }
        "image-start-tag" => format!("Deprecated <{tag}> tag (use <img> instead)"),
        other => other.into(),
    };
    message
}
