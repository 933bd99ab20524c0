//! Integration tests for the HTML tokenizer.
//!
//! A collecting sink stands in for the tree builder; raw-mode switching and
//! CDATA gating are driven by the sink's reported namespace.

use bilby_dom::Namespace;
use bilby_html::tokenizer::{Position, SinkResult, Token, TokenSink, Tokenizer, TokenizerOpts};

/// A sink that records every token it is handed.
struct VecSink {
    tokens: Vec<Token>,
    namespace: Namespace,
}

impl VecSink {
    fn new() -> Self {
        Self {
            tokens: Vec::new(),
            namespace: Namespace::Html,
        }
    }
}

impl TokenSink for VecSink {
    fn process_token(&mut self, token: Token, _pos: Position) -> SinkResult {
        self.tokens.push(token);
        SinkResult::Continue
    }

    fn process_characters(&mut self, data: String, _pos: Position) -> SinkResult {
        self.tokens.push(Token::Characters { data });
        SinkResult::Continue
    }

    fn adjusted_current_namespace(&self) -> Namespace {
        self.namespace
    }
}

/// Helper to tokenize a string and return the tokens.
fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(VecSink::new(), TokenizerOpts::default(), false);
    tokenizer.run(input);
    tokenizer.sink.tokens
}

/// Helper to tokenize with error collection; returns tokens and error codes.
fn tokenize_with_errors(input: &str) -> (Vec<Token>, Vec<&'static str>) {
    let mut tokenizer = Tokenizer::new(VecSink::new(), TokenizerOpts::default(), true);
    tokenizer.run(input);
    let codes = tokenizer.errors.iter().map(|e| e.code).collect();
    (tokenizer.sink.tokens, codes)
}

fn start_tag(tokens: &[Token], index: usize) -> (&str, &bilby_dom::AttrList, bool) {
    match &tokens[index] {
        Token::StartTag {
            name,
            attrs,
            self_closing,
        } => (name, attrs, *self_closing),
        other => panic!("expected StartTag, got {other}"),
    }
}

#[test]
fn test_plain_text() {
    let tokens = tokenize("Hello");
    assert_eq!(tokens.len(), 2); // one character run + EOF
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "Hello"));
    assert!(matches!(tokens[1], Token::EndOfFile));
}

#[test]
fn test_start_tag() {
    let tokens = tokenize("<div>");
    let (name, attrs, self_closing) = start_tag(&tokens, 0);
    assert_eq!(name, "div");
    assert!(attrs.is_empty());
    assert!(!self_closing);
    assert!(matches!(tokens[1], Token::EndOfFile));
}

#[test]
fn test_tag_name_is_lowercased() {
    let tokens = tokenize("<DiV><P>");
    assert_eq!(start_tag(&tokens, 0).0, "div");
    assert_eq!(start_tag(&tokens, 1).0, "p");
}

#[test]
fn test_end_tag() {
    let tokens = tokenize("</div>");
    assert!(matches!(&tokens[0], Token::EndTag { name, .. } if name == "div"));
}

#[test]
fn test_self_closing_tag() {
    let tokens = tokenize("<br/>");
    let (name, _, self_closing) = start_tag(&tokens, 0);
    assert_eq!(name, "br");
    assert!(self_closing);
}

#[test]
fn test_attributes_all_quote_styles() {
    let tokens = tokenize(r#"<div a="1" b='2' c=3 d>"#);
    let (_, attrs, _) = start_tag(&tokens, 0);
    assert_eq!(attrs.len(), 4);
    assert_eq!(attrs.get("a"), Some("1"));
    assert_eq!(attrs.get("b"), Some("2"));
    assert_eq!(attrs.get("c"), Some("3"));
    // Valueless attribute.
    assert_eq!(attrs.get("d"), Some(""));
}

#[test]
fn test_attribute_names_are_lowercased() {
    let tokens = tokenize("<div CLASS=x DATA-Foo=y>");
    let (_, attrs, _) = start_tag(&tokens, 0);
    assert_eq!(attrs.get("class"), Some("x"));
    assert_eq!(attrs.get("data-foo"), Some("y"));
}

#[test]
fn test_duplicate_attribute_dropped_with_error() {
    let (tokens, errors) = tokenize_with_errors("<div id=a id=b>");
    let (_, attrs, _) = start_tag(&tokens, 0);
    assert_eq!(attrs.len(), 1);
    assert_eq!(attrs.get("id"), Some("a"));
    assert!(errors.contains(&"duplicate-attribute"));
}

#[test]
fn test_unquoted_value_rejects_backtick() {
    let (tokens, errors) = tokenize_with_errors("<div a=b`c>");
    let (_, attrs, _) = start_tag(&tokens, 0);
    assert_eq!(attrs.get("a"), Some("b`c"));
    assert!(errors.contains(&"unexpected-character-in-unquoted-attribute-value"));
}

#[test]
fn test_comment() {
    let tokens = tokenize("<!-- hello -->");
    assert!(matches!(&tokens[0], Token::Comment { data } if data == " hello "));
}

#[test]
fn test_comment_end_bang() {
    let (tokens, errors) = tokenize_with_errors("<!--x--!>");
    assert!(matches!(&tokens[0], Token::Comment { data } if data == "x"));
    assert!(errors.contains(&"incorrectly-closed-comment"));
}

#[test]
fn test_abrupt_empty_comment() {
    let (tokens, errors) = tokenize_with_errors("<!-->");
    assert!(matches!(&tokens[0], Token::Comment { data } if data.is_empty()));
    assert!(errors.contains(&"abrupt-closing-of-empty-comment"));
}

#[test]
fn test_bogus_comment_from_question_mark() {
    let (tokens, errors) = tokenize_with_errors("<?php echo ?>");
    assert!(matches!(&tokens[0], Token::Comment { data } if data == "?php echo ?"));
    assert!(errors.contains(&"unexpected-question-mark-instead-of-tag-name"));
}

#[test]
fn test_empty_end_tag_ignored() {
    let (tokens, errors) = tokenize_with_errors("a</>b");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "a"));
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "b"));
    assert!(errors.contains(&"empty-end-tag"));
}

#[test]
fn test_doctype_simple() {
    let tokens = tokenize("<!DOCTYPE html>");
    match &tokens[0] {
        Token::Doctype(data) => {
            assert_eq!(data.name.as_deref(), Some("html"));
            assert_eq!(data.public_id, None);
            assert_eq!(data.system_id, None);
            assert!(!data.force_quirks);
        }
        other => panic!("expected Doctype, got {other}"),
    }
}

#[test]
fn test_doctype_public_and_system() {
    let tokens = tokenize(
        "<!DOCTYPE html PUBLIC \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">",
    );
    match &tokens[0] {
        Token::Doctype(data) => {
            assert_eq!(data.name.as_deref(), Some("html"));
            assert_eq!(data.public_id.as_deref(), Some("-//W3C//DTD HTML 4.01//EN"));
            assert_eq!(
                data.system_id.as_deref(),
                Some("http://www.w3.org/TR/html4/strict.dtd")
            );
            assert!(!data.force_quirks);
        }
        other => panic!("expected Doctype, got {other}"),
    }
}

#[test]
fn test_doctype_missing_name_forces_quirks() {
    let (tokens, errors) = tokenize_with_errors("<!DOCTYPE>");
    match &tokens[0] {
        Token::Doctype(data) => {
            assert_eq!(data.name, None);
            assert!(data.force_quirks);
        }
        other => panic!("expected Doctype, got {other}"),
    }
    assert!(errors.contains(&"expected-doctype-name-but-got-right-bracket"));
}

#[test]
fn test_doctype_bogus_after_name() {
    let (tokens, errors) = tokenize_with_errors("<!DOCTYPE html bogus>");
    match &tokens[0] {
        Token::Doctype(data) => {
            assert_eq!(data.name.as_deref(), Some("html"));
            assert!(data.force_quirks);
        }
        other => panic!("expected Doctype, got {other}"),
    }
    assert!(errors.contains(&"missing-whitespace-after-doctype-name"));
}

// ========== character references ==========

#[test]
fn test_named_entity_in_text() {
    let tokens = tokenize("a&amp;b");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "a&b"));
}

#[test]
fn test_legacy_entity_without_semicolon() {
    let tokens = tokenize("&amp x");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "& x"));
}

#[test]
fn test_legacy_prefix_match() {
    // &notit; resolves &not + "it;".
    let tokens = tokenize("&notit;");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "\u{00AC}it;"));
}

#[test]
fn test_unknown_entity_left_alone() {
    let tokens = tokenize("&zzznope; &");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "&zzznope; &"));
}

#[test]
fn test_numeric_entities() {
    let tokens = tokenize("&#60;&#x3C;&#x3e;");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "<<>"));
}

#[test]
fn test_numeric_entity_c1_substitution() {
    // 0x80 maps to the euro sign per the windows-1252 substitution table.
    let tokens = tokenize("&#128;");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "\u{20AC}"));
}

#[test]
fn test_numeric_entity_out_of_range() {
    let tokens = tokenize("&#x110000;&#xD800;");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "\u{FFFD}\u{FFFD}"));
}

#[test]
fn test_attribute_entity_rules() {
    // In attribute values, a semicolonless legacy match followed by '=' or
    // an alphanumeric is suppressed.
    let tokens = tokenize("<a p=\"&amp;x\" q=\"&amp=x\" r=\"&ampx\">");
    let (_, attrs, _) = start_tag(&tokens, 0);
    assert_eq!(attrs.get("p"), Some("&x"));
    assert_eq!(attrs.get("q"), Some("&amp=x"));
    assert_eq!(attrs.get("r"), Some("&ampx"));
}

// ========== raw content models ==========

#[test]
fn test_rcdata_title_decodes_entities() {
    let tokens = tokenize("<title>a<b>&amp;</title>");
    assert_eq!(start_tag(&tokens, 0).0, "title");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "a<b>&"));
    assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "title"));
}

#[test]
fn test_rawtext_style_does_not_decode() {
    let tokens = tokenize("<style>a &amp; b</style>");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "a &amp; b"));
    assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "style"));
}

#[test]
fn test_raw_end_tag_requires_sentinel_match() {
    // A </div> inside <style> is just text, original case preserved.
    let tokens = tokenize("<style>x</DIV>y</style>");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "x</DIV>y"));
}

#[test]
fn test_raw_end_tag_with_attributes() {
    let tokens = tokenize("<style>x</style foo=bar>");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "x"));
    match &tokens[2] {
        Token::EndTag { name, attrs } => {
            assert_eq!(name, "style");
            assert_eq!(attrs.get("foo"), Some("bar"));
        }
        other => panic!("expected EndTag, got {other}"),
    }
}

#[test]
fn test_script_escape_ladder() {
    let tokens = tokenize("<script><!--<b>--></script>");
    assert_eq!(start_tag(&tokens, 0).0, "script");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "<!--<b>-->"));
    assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
}

#[test]
fn test_script_double_escape() {
    // An inner <script> inside an escaped run keeps </script> from closing
    // the element until the inner one is closed.
    let tokens = tokenize("<script><!--<script>a</script>--></script>");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "<!--<script>a</script>-->"));
    assert!(matches!(&tokens[2], Token::EndTag { name, .. } if name == "script"));
}

#[test]
fn test_plaintext_consumes_everything() {
    let tokens = tokenize("<plaintext>a</b><c>");
    assert_eq!(start_tag(&tokens, 0).0, "plaintext");
    assert!(matches!(&tokens[1], Token::Characters { data } if data == "a</b><c>"));
    assert!(matches!(tokens[2], Token::EndOfFile));
}

#[test]
fn test_rawtext_switch_skipped_in_foreign_content() {
    // When the sink reports a foreign namespace, <title> does not switch
    // the content model.
    let mut sink = VecSink::new();
    sink.namespace = Namespace::Svg;
    let mut tokenizer = Tokenizer::new(sink, TokenizerOpts::default(), false);
    tokenizer.run("<title><b></title>");
    let tokens = tokenizer.sink.tokens;
    assert_eq!(start_tag(&tokens, 0).0, "title");
    // <b> parsed as a real tag, not text.
    assert_eq!(start_tag(&tokens, 1).0, "b");
}

// ========== CDATA ==========

#[test]
fn test_cdata_in_html_is_bogus_comment() {
    let (tokens, errors) = tokenize_with_errors("<![CDATA[x]]>");
    assert!(matches!(&tokens[0], Token::Comment { data } if data == "[CDATA[x]]"));
    assert!(errors.contains(&"cdata-in-html-content"));
}

#[test]
fn test_cdata_in_foreign_content_is_text() {
    let mut sink = VecSink::new();
    sink.namespace = Namespace::Svg;
    let mut tokenizer = Tokenizer::new(sink, TokenizerOpts::default(), false);
    tokenizer.run("<![CDATA[a ]] b]]>");
    let tokens = tokenizer.sink.tokens;
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "a ]] b"));
}

// ========== input normalization ==========

#[test]
fn test_crlf_normalization() {
    let tokens = tokenize("a\r\nb\rc");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "a\nb\nc"));
}

#[test]
fn test_bom_is_discarded() {
    let tokens = tokenize("\u{FEFF}x");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "x"));
}

#[test]
fn test_null_in_data_reported_but_preserved() {
    let (tokens, errors) = tokenize_with_errors("a\0b");
    assert!(matches!(&tokens[0], Token::Characters { data } if data == "a\0b"));
    assert!(errors.contains(&"unexpected-null-character"));
}

// ========== positions ==========

#[test]
fn test_error_positions_are_sane() {
    let input = "<div>\n<div foo=1 foo=2>\n";
    let (_, _) = tokenize_with_errors(input);
    let mut tokenizer = Tokenizer::new(VecSink::new(), TokenizerOpts::default(), true);
    tokenizer.run(input);
    let lines: Vec<&str> = input.split('\n').collect();
    for error in &tokenizer.errors {
        let line = error.line.expect("line recorded") as usize;
        let column = error.column.expect("column recorded") as usize;
        assert!(line >= 1 && line <= lines.len());
        assert!(column <= lines[line - 1].len() + 1);
    }
    assert_eq!(tokenizer.errors[0].code, "duplicate-attribute");
    assert_eq!(tokenizer.errors[0].line, Some(2));
}

#[test]
fn test_eof_in_tag_discards_tag() {
    let (tokens, errors) = tokenize_with_errors("<div foo");
    assert!(matches!(tokens[0], Token::EndOfFile));
    assert!(errors.contains(&"eof-in-tag"));
}
