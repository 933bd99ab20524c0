//! The HTML tokenizer state machine.
//!
//! [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
//!
//! "Implementations must act as if they used the following state machine to
//! tokenize HTML."
//!
//! Character data accumulates in a text buffer and is flushed at tag,
//! comment, and doctype boundaries (and at EOF and content-model switches);
//! on flush, text from the DATA and RCDATA content models is run through the
//! character-reference decoder. Attribute values are decoded on attribute
//! finalization with the stricter in-attribute rules. There are therefore no
//! per-character reference states in this machine.

use bilby_dom::{AttrList, Attribute, DoctypeData, Namespace};
use strum_macros::Display;

use super::character_reference::decode_entities_in_text;
use super::token::{Position, SinkResult, Token, TokenSink};
use crate::errors::{ParseError, generate_error_message};

/// Start tags that switch the tokenizer out of the DATA state when the
/// current node is in the HTML namespace.
const RAWTEXT_SWITCH_TAGS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "textarea", "title",
];

/// The subset of [`RAWTEXT_SWITCH_TAGS`] whose content model is RCDATA
/// (entities decoded) rather than RAWTEXT.
const RCDATA_ELEMENTS: &[&str] = &["title", "textarea"];

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer state machine. Each state corresponds to a section in
/// § 13.2.5. Character-reference states are intentionally absent; see the
/// module docs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TokenizerState {
    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    Data,
    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    TagOpen,
    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    EndTagOpen,
    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    TagName,
    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    BeforeAttributeName,
    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    AttributeName,
    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    AfterAttributeName,
    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    BeforeAttributeValue,
    /// [§ 13.2.5.36 Attribute value (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    AttributeValueDoubleQuoted,
    /// [§ 13.2.5.37 Attribute value (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(single-quoted)-state)
    AttributeValueSingleQuoted,
    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    AttributeValueUnquoted,
    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    AfterAttributeValueQuoted,
    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    SelfClosingStartTag,
    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    MarkupDeclarationOpen,
    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    CommentStart,
    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    CommentStartDash,
    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    Comment,
    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    CommentEndDash,
    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    CommentEnd,
    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    CommentEndBang,
    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    BogusComment,
    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    DOCTYPE,
    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    BeforeDOCTYPEName,
    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    DOCTYPEName,
    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    AfterDOCTYPEName,
    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    BogusDOCTYPE,
    /// [§ 13.2.5.57 After DOCTYPE public keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-keyword-state)
    AfterDOCTYPEPublicKeyword,
    /// [§ 13.2.5.63 After DOCTYPE system keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-keyword-state)
    AfterDOCTYPESystemKeyword,
    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    BeforeDOCTYPEPublicIdentifier,
    /// [§ 13.2.5.59 DOCTYPE public identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    DOCTYPEPublicIdentifierDoubleQuoted,
    /// [§ 13.2.5.60 DOCTYPE public identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(single-quoted)-state)
    DOCTYPEPublicIdentifierSingleQuoted,
    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    AfterDOCTYPEPublicIdentifier,
    /// [§ 13.2.5.62 Between DOCTYPE public and system identifiers state](https://html.spec.whatwg.org/multipage/parsing.html#between-doctype-public-and-system-identifiers-state)
    BetweenDOCTYPEPublicAndSystemIdentifiers,
    /// [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    BeforeDOCTYPESystemIdentifier,
    /// [§ 13.2.5.65 DOCTYPE system identifier (double-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(double-quoted)-state)
    DOCTYPESystemIdentifierDoubleQuoted,
    /// [§ 13.2.5.66 DOCTYPE system identifier (single-quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(single-quoted)-state)
    DOCTYPESystemIdentifierSingleQuoted,
    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    AfterDOCTYPESystemIdentifier,
    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    CDATASection,
    /// [§ 13.2.5.70 CDATA section bracket state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-bracket-state)
    CDATASectionBracket,
    /// [§ 13.2.5.71 CDATA section end state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-end-state)
    CDATASectionEnd,
    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
    RCDATA,
    /// [§ 13.2.5.9 RCDATA less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-less-than-sign-state)
    RCDATALessThanSign,
    /// [§ 13.2.5.10 RCDATA end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-open-state)
    RCDATAEndTagOpen,
    /// [§ 13.2.5.11 RCDATA end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state)
    RCDATAEndTagName,
    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    RAWTEXT,
    /// [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    RAWTEXTLessThanSign,
    /// [§ 13.2.5.13 RAWTEXT end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state)
    RAWTEXTEndTagOpen,
    /// [§ 13.2.5.14 RAWTEXT end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-name-state)
    RAWTEXTEndTagName,
    /// [§ 13.2.5.5 PLAINTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#plaintext-state)
    PLAINTEXT,
    /// [§ 13.2.5.20 Script data escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-state)
    ScriptDataEscaped,
    /// [§ 13.2.5.21 Script data escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-state)
    ScriptDataEscapedDash,
    /// [§ 13.2.5.22 Script data escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-dash-state)
    ScriptDataEscapedDashDash,
    /// [§ 13.2.5.23 Script data escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-less-than-sign-state)
    ScriptDataEscapedLessThanSign,
    /// [§ 13.2.5.24 Script data escaped end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-open-state)
    ScriptDataEscapedEndTagOpen,
    /// [§ 13.2.5.25 Script data escaped end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-name-state)
    ScriptDataEscapedEndTagName,
    /// [§ 13.2.5.26 Script data double escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-start-state)
    ScriptDataDoubleEscapeStart,
    /// [§ 13.2.5.27 Script data double escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-state)
    ScriptDataDoubleEscaped,
    /// [§ 13.2.5.28 Script data double escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-state)
    ScriptDataDoubleEscapedDash,
    /// [§ 13.2.5.29 Script data double escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-dash-state)
    ScriptDataDoubleEscapedDashDash,
    /// [§ 13.2.5.30 Script data double escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-less-than-sign-state)
    ScriptDataDoubleEscapedLessThanSign,
    /// [§ 13.2.5.31 Script data double escape end state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-end-state)
    ScriptDataDoubleEscapeEnd,
}

/// Tokenizer configuration.
pub struct TokenizerOpts {
    /// Discard a leading U+FEFF byte order mark.
    pub discard_bom: bool,
    /// Start in a state other than DATA (used by fragment parsing for
    /// rawtext/plaintext context elements).
    pub initial_state: Option<TokenizerState>,
    /// The remembered rawtext element name when `initial_state` is a
    /// RAWTEXT/RCDATA state.
    pub initial_rawtext_tag: Option<String>,
}

impl Default for TokenizerOpts {
    fn default() -> Self {
        Self {
            discard_bom: true,
            initial_state: None,
            initial_rawtext_tag: None,
        }
    }
}

/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// The tokenizer drives the whole parse: it consumes the decoded input and
/// synchronously hands tokens to its sink (normally the tree builder).
pub struct Tokenizer<S: TokenSink> {
    /// The receiver of the token stream.
    pub sink: S,
    opts: TokenizerOpts,
    collect_errors: bool,
    /// Parse errors recorded by the tokenizer, in emission order.
    pub errors: Vec<ParseError>,

    state: TokenizerState,
    chars: Vec<char>,
    pos: usize,
    // "Reconsume in the X state" sets this flag; the next consume returns
    // current_char again.
    reconsume: bool,
    current_char: Option<char>,
    // Set after consuming '\r' so an immediately following '\n' is skipped.
    ignore_lf: bool,

    // Reusable buffers, cleared between tokens.
    text_buffer: String,
    text_start_pos: usize,
    current_tag_name: String,
    current_tag_attrs: AttrList,
    current_tag_is_end: bool,
    current_tag_self_closing: bool,
    current_attr_name: String,
    current_attr_value: String,
    current_attr_has_value: bool,
    current_attr_value_has_amp: bool,
    current_comment: String,
    current_doctype_name: String,
    current_doctype_public: Option<String>,
    current_doctype_system: Option<String>,
    current_doctype_force_quirks: bool,

    /// [§ 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
    /// "The last start tag token emitted is used as part of the tree
    /// construction stage and in the RCDATA, RAWTEXT, and script data states."
    last_start_tag_name: Option<String>,
    /// The element whose end tag terminates the current RCDATA/RAWTEXT run.
    rawtext_tag_name: Option<String>,
    /// Original-case spelling of a candidate raw-mode end tag, re-emitted as
    /// text when the candidate does not match the sentinel.
    original_tag_name: String,
    /// [§ 13.2.5](https://html.spec.whatwg.org/multipage/parsing.html#temporary-buffer)
    /// "The temporary buffer is used to temporarily store characters during
    /// certain tokenization operations."
    temp_buffer: String,

    // Position tracking (populated only when collecting errors).
    newline_positions: Vec<usize>,
    last_token_line: u32,
    last_token_column: u32,
}

impl<S: TokenSink> Tokenizer<S> {
    /// Create a tokenizer feeding `sink`.
    pub fn new(sink: S, opts: TokenizerOpts, collect_errors: bool) -> Self {
        Tokenizer {
            sink,
            opts,
            collect_errors,
            errors: Vec::new(),
            state: TokenizerState::Data,
            chars: Vec::new(),
            pos: 0,
            reconsume: false,
            current_char: None,
            ignore_lf: false,
            text_buffer: String::new(),
            text_start_pos: 0,
            current_tag_name: String::new(),
            current_tag_attrs: AttrList::new(),
            current_tag_is_end: false,
            current_tag_self_closing: false,
            current_attr_name: String::new(),
            current_attr_value: String::new(),
            current_attr_has_value: false,
            current_attr_value_has_amp: false,
            current_comment: String::new(),
            current_doctype_name: String::new(),
            current_doctype_public: None,
            current_doctype_system: None,
            current_doctype_force_quirks: false,
            last_start_tag_name: None,
            rawtext_tag_name: None,
            original_tag_name: String::new(),
            temp_buffer: String::new(),
            newline_positions: Vec::new(),
            last_token_line: 1,
            last_token_column: 0,
        }
    }

    /// Reset all state and load `html` as the input.
    pub fn initialize(&mut self, html: &str) {
        let mut chars: Vec<char> = html.chars().collect();
        if self.opts.discard_bom && chars.first() == Some(&'\u{FEFF}') {
            chars.remove(0);
        }
        self.chars = chars;

        self.pos = 0;
        self.reconsume = false;
        self.current_char = None;
        self.ignore_lf = false;
        self.errors.clear();
        self.text_buffer.clear();
        self.text_start_pos = 0;
        self.current_tag_name.clear();
        self.current_tag_attrs = AttrList::new();
        self.current_tag_is_end = false;
        self.current_tag_self_closing = false;
        self.current_attr_name.clear();
        self.current_attr_value.clear();
        self.current_attr_has_value = false;
        self.current_attr_value_has_amp = false;
        self.current_comment.clear();
        self.current_doctype_name.clear();
        self.current_doctype_public = None;
        self.current_doctype_system = None;
        self.current_doctype_force_quirks = false;
        self.last_start_tag_name = None;
        self.rawtext_tag_name = self.opts.initial_rawtext_tag.clone();
        self.original_tag_name.clear();
        self.temp_buffer.clear();
        self.state = self.opts.initial_state.unwrap_or(TokenizerState::Data);
        self.last_token_line = 1;
        self.last_token_column = 0;

        // Pre-compute newline positions for O(log n) line lookups.
        self.newline_positions.clear();
        if self.collect_errors {
            for (index, &ch) in self.chars.iter().enumerate() {
                if ch == '\n' {
                    self.newline_positions.push(index);
                }
            }
        }
    }

    /// Tokenize `html` to completion, feeding the sink as tokens are formed.
    pub fn run(&mut self, html: &str) {
        self.initialize(html);
        loop {
            if self.step() {
                break;
            }
        }
    }

    /// Run one step of the state machine. Returns true once EOF is emitted.
    fn step(&mut self) -> bool {
        match self.state {
            TokenizerState::Data => self.handle_data_state(),
            TokenizerState::TagOpen => self.handle_tag_open_state(),
            TokenizerState::EndTagOpen => self.handle_end_tag_open_state(),
            TokenizerState::TagName => self.handle_tag_name_state(),
            TokenizerState::BeforeAttributeName => self.handle_before_attribute_name_state(),
            TokenizerState::AttributeName => self.handle_attribute_name_state(),
            TokenizerState::AfterAttributeName => self.handle_after_attribute_name_state(),
            TokenizerState::BeforeAttributeValue => self.handle_before_attribute_value_state(),
            TokenizerState::AttributeValueDoubleQuoted => {
                self.handle_attribute_value_quoted_state('"')
            }
            TokenizerState::AttributeValueSingleQuoted => {
                self.handle_attribute_value_quoted_state('\'')
            }
            TokenizerState::AttributeValueUnquoted => self.handle_attribute_value_unquoted_state(),
            TokenizerState::AfterAttributeValueQuoted => {
                self.handle_after_attribute_value_quoted_state()
            }
            TokenizerState::SelfClosingStartTag => self.handle_self_closing_start_tag_state(),
            TokenizerState::MarkupDeclarationOpen => self.handle_markup_declaration_open_state(),
            TokenizerState::CommentStart => self.handle_comment_start_state(),
            TokenizerState::CommentStartDash => self.handle_comment_start_dash_state(),
            TokenizerState::Comment => self.handle_comment_state(),
            TokenizerState::CommentEndDash => self.handle_comment_end_dash_state(),
            TokenizerState::CommentEnd => self.handle_comment_end_state(),
            TokenizerState::CommentEndBang => self.handle_comment_end_bang_state(),
            TokenizerState::BogusComment => self.handle_bogus_comment_state(),
            TokenizerState::DOCTYPE => self.handle_doctype_state(),
            TokenizerState::BeforeDOCTYPEName => self.handle_before_doctype_name_state(),
            TokenizerState::DOCTYPEName => self.handle_doctype_name_state(),
            TokenizerState::AfterDOCTYPEName => self.handle_after_doctype_name_state(),
            TokenizerState::BogusDOCTYPE => self.handle_bogus_doctype_state(),
            TokenizerState::AfterDOCTYPEPublicKeyword => {
                self.handle_after_doctype_public_keyword_state()
            }
            TokenizerState::AfterDOCTYPESystemKeyword => {
                self.handle_after_doctype_system_keyword_state()
            }
            TokenizerState::BeforeDOCTYPEPublicIdentifier => {
                self.handle_before_doctype_public_identifier_state()
            }
            TokenizerState::DOCTYPEPublicIdentifierDoubleQuoted => {
                self.handle_doctype_public_identifier_state('"')
            }
            TokenizerState::DOCTYPEPublicIdentifierSingleQuoted => {
                self.handle_doctype_public_identifier_state('\'')
            }
            TokenizerState::AfterDOCTYPEPublicIdentifier => {
                self.handle_after_doctype_public_identifier_state()
            }
            TokenizerState::BetweenDOCTYPEPublicAndSystemIdentifiers => {
                self.handle_between_doctype_public_and_system_identifiers_state()
            }
            TokenizerState::BeforeDOCTYPESystemIdentifier => {
                self.handle_before_doctype_system_identifier_state()
            }
            TokenizerState::DOCTYPESystemIdentifierDoubleQuoted => {
                self.handle_doctype_system_identifier_state('"')
            }
            TokenizerState::DOCTYPESystemIdentifierSingleQuoted => {
                self.handle_doctype_system_identifier_state('\'')
            }
            TokenizerState::AfterDOCTYPESystemIdentifier => {
                self.handle_after_doctype_system_identifier_state()
            }
            TokenizerState::CDATASection => self.handle_cdata_section_state(),
            TokenizerState::CDATASectionBracket => self.handle_cdata_section_bracket_state(),
            TokenizerState::CDATASectionEnd => self.handle_cdata_section_end_state(),
            TokenizerState::RCDATA => self.handle_rcdata_state(),
            TokenizerState::RCDATALessThanSign => self.handle_rcdata_less_than_sign_state(),
            TokenizerState::RCDATAEndTagOpen => self.handle_rcdata_end_tag_open_state(),
            TokenizerState::RCDATAEndTagName => self.handle_raw_end_tag_name_state(false),
            TokenizerState::RAWTEXT => self.handle_rawtext_state(),
            TokenizerState::RAWTEXTLessThanSign => self.handle_rawtext_less_than_sign_state(),
            TokenizerState::RAWTEXTEndTagOpen => self.handle_rawtext_end_tag_open_state(),
            TokenizerState::RAWTEXTEndTagName => self.handle_raw_end_tag_name_state(true),
            TokenizerState::PLAINTEXT => self.handle_plaintext_state(),
            TokenizerState::ScriptDataEscaped => self.handle_script_data_escaped_state(),
            TokenizerState::ScriptDataEscapedDash => self.handle_script_data_escaped_dash_state(),
            TokenizerState::ScriptDataEscapedDashDash => {
                self.handle_script_data_escaped_dash_dash_state()
            }
            TokenizerState::ScriptDataEscapedLessThanSign => {
                self.handle_script_data_escaped_less_than_sign_state()
            }
            TokenizerState::ScriptDataEscapedEndTagOpen => {
                self.handle_script_data_escaped_end_tag_open_state()
            }
            TokenizerState::ScriptDataEscapedEndTagName => {
                self.handle_script_data_escaped_end_tag_name_state()
            }
            TokenizerState::ScriptDataDoubleEscapeStart => {
                self.handle_script_data_double_escape_start_state()
            }
            TokenizerState::ScriptDataDoubleEscaped => self.handle_script_data_double_escaped_state(),
            TokenizerState::ScriptDataDoubleEscapedDash => {
                self.handle_script_data_double_escaped_dash_state()
            }
            TokenizerState::ScriptDataDoubleEscapedDashDash => {
                self.handle_script_data_double_escaped_dash_dash_state()
            }
            TokenizerState::ScriptDataDoubleEscapedLessThanSign => {
                self.handle_script_data_double_escaped_less_than_sign_state()
            }
            TokenizerState::ScriptDataDoubleEscapeEnd => {
                self.handle_script_data_double_escape_end_state()
            }
        }
    }

    // ---------------------
    // Input helpers
    // ---------------------

    /// "Consume the next input character", normalizing `\r\n` and bare `\r`
    /// to `\n` on the way.
    fn get_char(&mut self) -> Option<char> {
        if self.reconsume {
            self.reconsume = false;
            return self.current_char;
        }

        loop {
            if self.pos >= self.chars.len() {
                self.current_char = None;
                return None;
            }
            let c = self.chars[self.pos];
            self.pos += 1;

            if c == '\r' {
                self.ignore_lf = true;
                self.current_char = Some('\n');
                return Some('\n');
            }
            if c == '\n' {
                if self.ignore_lf {
                    self.ignore_lf = false;
                    continue;
                }
            } else {
                self.ignore_lf = false;
            }

            self.current_char = Some(c);
            return Some(c);
        }
    }

    /// "Reconsume in the X state" - the next consume returns the current
    /// input character again.
    fn reconsume_current(&mut self) {
        self.reconsume = true;
    }

    /// Peek at the character `offset` positions ahead without consuming.
    fn peek_char(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    /// Consume `literal` if the next characters match it exactly.
    fn consume_if(&mut self, literal: &str) -> bool {
        let mut count = 0;
        for (offset, expected) in literal.chars().enumerate() {
            match self.peek_char(offset) {
                Some(ch) if ch == expected => count += 1,
                _ => return false,
            }
        }
        self.pos += count;
        true
    }

    /// Consume `literal` if the next characters match it ASCII
    /// case-insensitively.
    fn consume_case_insensitive(&mut self, literal: &str) -> bool {
        let mut count = 0;
        for (offset, expected) in literal.chars().enumerate() {
            match self.peek_char(offset) {
                Some(ch) if ch.eq_ignore_ascii_case(&expected) => count += 1,
                _ => return false,
            }
        }
        self.pos += count;
        true
    }

    const fn is_whitespace_char(c: char) -> bool {
        matches!(c, ' ' | '\t' | '\n' | '\x0C')
    }

    // ---------------------
    // Text buffering
    // ---------------------

    /// Append a character to the pending text run, recording where the run
    /// started for position reporting.
    fn append_text(&mut self, c: char) {
        if self.text_buffer.is_empty() {
            self.text_start_pos = self.pos.saturating_sub(1);
        }
        self.text_buffer.push(c);
    }

    fn append_text_str(&mut self, s: &str) {
        if self.text_buffer.is_empty() {
            self.text_start_pos = self.pos.saturating_sub(1);
        }
        self.text_buffer.push_str(s);
    }

    /// Whether a flush in the current state runs the character-reference
    /// decoder. RAWTEXT, PLAINTEXT, CDATA, and the script-escaped ladder
    /// never decode; DATA and RCDATA (and everything that flushes on their
    /// behalf) do.
    const fn flush_decodes_entities(&self) -> bool {
        !matches!(
            self.state,
            TokenizerState::CDATASection
                | TokenizerState::CDATASectionBracket
                | TokenizerState::CDATASectionEnd
                | TokenizerState::RAWTEXT
                | TokenizerState::RAWTEXTLessThanSign
                | TokenizerState::RAWTEXTEndTagOpen
                | TokenizerState::RAWTEXTEndTagName
                | TokenizerState::PLAINTEXT
                | TokenizerState::ScriptDataEscaped
                | TokenizerState::ScriptDataEscapedDash
                | TokenizerState::ScriptDataEscapedDashDash
                | TokenizerState::ScriptDataEscapedLessThanSign
                | TokenizerState::ScriptDataEscapedEndTagOpen
                | TokenizerState::ScriptDataEscapedEndTagName
                | TokenizerState::ScriptDataDoubleEscapeStart
                | TokenizerState::ScriptDataDoubleEscaped
                | TokenizerState::ScriptDataDoubleEscapedDash
                | TokenizerState::ScriptDataDoubleEscapedDashDash
                | TokenizerState::ScriptDataDoubleEscapedLessThanSign
                | TokenizerState::ScriptDataDoubleEscapeEnd
        )
    }

    /// Flush the pending text run to the sink.
    fn flush_text(&mut self) {
        if self.text_buffer.is_empty() {
            return;
        }

        let mut data = std::mem::take(&mut self.text_buffer);
        let raw_len = data.chars().count();

        if self.flush_decodes_entities() && data.contains('&') {
            data = decode_entities_in_text(&data, false);
        }

        let pos = self.record_text_end_position(raw_len);
        // The sink never requests a state switch for bare characters.
        let _ = self.sink.process_characters(data, pos);
    }

    // ---------------------
    // Token emission
    // ---------------------

    /// Emit the current tag token. Returns true when the emission switched
    /// the tokenizer into a raw content model (so callers must not reset the
    /// state to DATA).
    fn emit_current_tag(&mut self) -> bool {
        let name = std::mem::take(&mut self.current_tag_name);
        let attrs = std::mem::take(&mut self.current_tag_attrs);
        let self_closing = self.current_tag_self_closing;
        let is_end = self.current_tag_is_end;

        self.current_attr_name.clear();
        self.current_attr_value.clear();
        self.current_attr_has_value = false;
        self.current_attr_value_has_amp = false;
        self.current_tag_self_closing = false;
        self.current_tag_is_end = false;

        let mut switched = false;
        let token = if is_end {
            Token::EndTag { name, attrs }
        } else {
            self.last_start_tag_name = Some(name.clone());

            // [§ 13.2.6.2](https://html.spec.whatwg.org/multipage/parsing.html#generic-rcdata-element-parsing-algorithm)
            // The content-model switch only applies when the adjusted current
            // node is in the HTML namespace; a <title> inside <svg> stays in
            // the DATA state.
            if matches!(self.sink.adjusted_current_namespace(), Namespace::Html) {
                if RCDATA_ELEMENTS.contains(&name.as_str()) {
                    self.state = TokenizerState::RCDATA;
                    self.rawtext_tag_name = Some(name.clone());
                    switched = true;
                } else if RAWTEXT_SWITCH_TAGS.contains(&name.as_str()) {
                    self.state = TokenizerState::RAWTEXT;
                    self.rawtext_tag_name = Some(name.clone());
                    switched = true;
                } else if name == "plaintext" {
                    self.state = TokenizerState::PLAINTEXT;
                    switched = true;
                }
            }

            Token::StartTag {
                name,
                attrs,
                self_closing,
            }
        };

        let pos = self.record_token_position();
        if self.sink.process_token(token, pos) == SinkResult::Plaintext {
            self.state = TokenizerState::PLAINTEXT;
            switched = true;
        }
        switched
    }

    /// Emit a raw-mode end tag that matched the remembered sentinel.
    fn emit_raw_end_tag(&mut self, name: String) {
        self.flush_text();
        let pos = self.record_token_position();
        let _ = self.sink.process_token(
            Token::EndTag {
                name,
                attrs: AttrList::new(),
            },
            pos,
        );
    }

    fn emit_comment(&mut self) {
        let data = std::mem::take(&mut self.current_comment);
        self.emit_token(Token::Comment { data });
    }

    fn emit_doctype(&mut self) {
        let name = std::mem::take(&mut self.current_doctype_name);
        let doctype = DoctypeData {
            name: if name.is_empty() { None } else { Some(name) },
            public_id: self.current_doctype_public.take(),
            system_id: self.current_doctype_system.take(),
            force_quirks: self.current_doctype_force_quirks,
        };
        self.current_doctype_force_quirks = false;
        self.emit_token(Token::Doctype(doctype));
    }

    fn emit_eof(&mut self) {
        self.emit_token(Token::EndOfFile);
    }

    fn emit_token(&mut self, token: Token) {
        let pos = self.record_token_position();
        let _ = self.sink.process_token(token, pos);
    }

    // ---------------------
    // Attribute bookkeeping
    // ---------------------

    fn start_new_attribute(&mut self) {
        self.current_attr_name.clear();
        self.current_attr_value.clear();
        self.current_attr_has_value = false;
        self.current_attr_value_has_amp = false;
    }

    /// Commit the in-progress attribute to the current tag.
    ///
    /// [§ 13.2.5.33](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    /// "if there is already an attribute on the token with the exact same
    /// name, then this is a duplicate-attribute parse error and the new
    /// attribute must be removed from the token."
    fn finish_attribute(&mut self) {
        if self.current_attr_name.is_empty() {
            return;
        }
        let name = std::mem::take(&mut self.current_attr_name);

        if self.current_tag_attrs.contains(&name) {
            self.emit_error("duplicate-attribute");
            self.current_attr_value.clear();
            self.current_attr_has_value = false;
            self.current_attr_value_has_amp = false;
            return;
        }

        let mut value = std::mem::take(&mut self.current_attr_value);
        if self.current_attr_value_has_amp {
            value = decode_entities_in_text(&value, true);
        }
        let value = if self.current_attr_has_value {
            Some(value)
        } else {
            None
        };
        self.current_tag_attrs.push(Attribute::new(name, value));
        self.current_attr_has_value = false;
        self.current_attr_value_has_amp = false;
    }

    // ---------------------
    // Positions and errors
    // ---------------------

    /// Line number (1-indexed) for a character position, via binary search
    /// over the precomputed newline index.
    fn line_at(&self, pos: usize) -> u32 {
        let count = self.newline_positions.partition_point(|&n| n < pos);
        count as u32 + 1
    }

    /// Record the end position of the token about to be emitted. The column
    /// is 0-indexed and points just past the token's last character.
    fn record_token_position(&mut self) -> Position {
        if !self.collect_errors {
            return Position::default();
        }
        let pos = self.pos;
        let before = self.newline_positions.partition_point(|&n| n < pos);
        let column = if before == 0 {
            pos
        } else {
            pos - self.newline_positions[before - 1] - 1
        };
        self.last_token_line = self.line_at(pos);
        self.last_token_column = column as u32;
        Position {
            line: self.last_token_line,
            column: self.last_token_column,
        }
    }

    /// Record the position of the end of a text run (start + raw length).
    fn record_text_end_position(&mut self, raw_len: usize) -> Position {
        if !self.collect_errors {
            return Position::default();
        }
        let end_pos = self.text_start_pos + raw_len;
        let before = self.newline_positions.partition_point(|&n| n < end_pos);
        let column = if before == 0 {
            end_pos
        } else {
            end_pos - self.newline_positions[before - 1] - 1
        };
        self.last_token_line = self.line_at(end_pos);
        self.last_token_column = column as u32;
        Position {
            line: self.last_token_line,
            column: self.last_token_column,
        }
    }

    /// Record a parse error at the position of the character being processed.
    fn emit_error(&mut self, code: &'static str) {
        if !self.collect_errors {
            return;
        }
        let pos = self.pos.saturating_sub(1);
        let at_or_before = self.newline_positions.partition_point(|&n| n <= pos);
        let column = if at_or_before == 0 {
            pos + 1
        } else {
            pos - self.newline_positions[at_or_before - 1]
        };
        let line = self.line_at(self.pos);
        self.errors.push(ParseError::new(
            code,
            Some(line),
            Some(column as u32),
            generate_error_message(code, None),
        ));
    }

    // ---------------------
    // State handlers
    // ---------------------

    /// [§ 13.2.5.1 Data state](https://html.spec.whatwg.org/multipage/parsing.html#data-state)
    fn handle_data_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                // "U+003C LESS-THAN SIGN (<) - Switch to the tag open state."
                Some('<') => {
                    self.flush_text();
                    self.state = TokenizerState::TagOpen;
                    return false;
                }
                // "U+0000 NULL - This is an unexpected-null-character parse
                // error. Emit the current input character as a character
                // token." The NUL survives into the token; the tree builder
                // strips or replaces it per insertion mode.
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.append_text('\0');
                }
                // "EOF - Emit an end-of-file token."
                None => {
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                // "Anything else - Emit the current input character as a
                // character token." ('&' is buffered too; the flush decodes.)
                Some(c) => self.append_text(c),
            }
        }
    }

    /// [§ 13.2.5.6 Tag open state](https://html.spec.whatwg.org/multipage/parsing.html#tag-open-state)
    fn handle_tag_open_state(&mut self) -> bool {
        match self.get_char() {
            // "U+0021 EXCLAMATION MARK (!) - Switch to the markup declaration
            // open state."
            Some('!') => {
                self.state = TokenizerState::MarkupDeclarationOpen;
                false
            }
            // "U+002F SOLIDUS (/) - Switch to the end tag open state."
            Some('/') => {
                self.state = TokenizerState::EndTagOpen;
                false
            }
            // "ASCII alpha - Create a new start tag token... Reconsume in
            // the tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag_is_end = false;
                self.current_tag_name.clear();
                self.current_tag_attrs = AttrList::new();
                self.start_new_attribute();
                self.current_tag_self_closing = false;
                self.reconsume_current();
                self.state = TokenizerState::TagName;
                false
            }
            // "U+003F QUESTION MARK (?) - This is an
            // unexpected-question-mark-instead-of-tag-name parse error.
            // Create a comment token... Reconsume in the bogus comment state."
            Some('?') => {
                self.emit_error("unexpected-question-mark-instead-of-tag-name");
                self.current_comment.clear();
                self.reconsume_current();
                self.state = TokenizerState::BogusComment;
                false
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a
            // U+003C LESS-THAN SIGN character token and an end-of-file token."
            None => {
                self.emit_error("eof-before-tag-name");
                self.append_text('<');
                self.flush_text();
                self.emit_eof();
                true
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Emit a U+003C LESS-THAN SIGN character token.
            // Reconsume in the data state."
            Some(_) => {
                self.emit_error("invalid-first-character-of-tag-name");
                self.append_text('<');
                self.reconsume_current();
                self.state = TokenizerState::Data;
                false
            }
        }
    }

    /// [§ 13.2.5.7 End tag open state](https://html.spec.whatwg.org/multipage/parsing.html#end-tag-open-state)
    fn handle_end_tag_open_state(&mut self) -> bool {
        match self.get_char() {
            // "ASCII alpha - Create a new end tag token... Reconsume in the
            // tag name state."
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag_is_end = true;
                self.current_tag_name.clear();
                self.current_tag_attrs = AttrList::new();
                self.start_new_attribute();
                self.current_tag_self_closing = false;
                self.reconsume_current();
                self.state = TokenizerState::TagName;
                false
            }
            // "U+003E GREATER-THAN SIGN (>) - This is a missing-end-tag-name
            // parse error. Switch to the data state."
            Some('>') => {
                self.emit_error("empty-end-tag");
                self.state = TokenizerState::Data;
                false
            }
            // "EOF - This is an eof-before-tag-name parse error. Emit a
            // U+003C LESS-THAN SIGN character token, a U+002F SOLIDUS
            // character token and an end-of-file token."
            None => {
                self.emit_error("eof-before-tag-name");
                self.append_text('<');
                self.append_text('/');
                self.flush_text();
                self.emit_eof();
                true
            }
            // "Anything else - This is an invalid-first-character-of-tag-name
            // parse error. Create a comment token... Reconsume in the bogus
            // comment state."
            Some(_) => {
                self.emit_error("invalid-first-character-of-tag-name");
                self.current_comment.clear();
                self.reconsume_current();
                self.state = TokenizerState::BogusComment;
                false
            }
        }
    }

    /// [§ 13.2.5.8 Tag name state](https://html.spec.whatwg.org/multipage/parsing.html#tag-name-state)
    fn handle_tag_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {
                    self.state = TokenizerState::BeforeAttributeName;
                    return false;
                }
                Some('/') => {
                    self.state = TokenizerState::SelfClosingStartTag;
                    return false;
                }
                Some('>') => {
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                Some(c) if c.is_ascii_uppercase() => {
                    self.current_tag_name.push(c.to_ascii_lowercase());
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_tag_name.push('\u{FFFD}');
                }
                // "EOF - This is an eof-in-tag parse error. Emit an
                // end-of-file token." The incomplete tag is discarded.
                None => {
                    self.emit_error("eof-in-tag");
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_tag_name.push(c),
            }
        }
    }

    /// [§ 13.2.5.32 Before attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-name-state)
    fn handle_before_attribute_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                // "Ignore the character."
                Some(c) if Self::is_whitespace_char(c) => {}
                None => {
                    self.emit_error("eof-in-tag");
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some('/') => {
                    self.state = TokenizerState::SelfClosingStartTag;
                    return false;
                }
                Some('>') => {
                    self.finish_attribute();
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                // "U+003D EQUALS SIGN (=) - This is an
                // unexpected-equals-sign-before-attribute-name parse error.
                // Start a new attribute... Set that attribute's name to the
                // current input character."
                Some('=') => {
                    self.emit_error("unexpected-equals-sign-before-attribute-name");
                    self.start_new_attribute();
                    self.current_attr_name.push('=');
                    self.state = TokenizerState::AttributeName;
                    return false;
                }
                // "Anything else - Start a new attribute in the current tag
                // token... Reconsume in the attribute name state."
                Some(c) => {
                    self.start_new_attribute();
                    if c == '\0' {
                        self.emit_error("unexpected-null-character");
                        self.current_attr_name.push('\u{FFFD}');
                    } else {
                        self.current_attr_name.push(c.to_ascii_lowercase());
                    }
                    self.state = TokenizerState::AttributeName;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.33 Attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-name-state)
    fn handle_attribute_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {
                    self.finish_attribute();
                    self.state = TokenizerState::AfterAttributeName;
                    return false;
                }
                Some('/') => {
                    self.finish_attribute();
                    self.state = TokenizerState::SelfClosingStartTag;
                    return false;
                }
                Some('=') => {
                    self.current_attr_has_value = true;
                    self.state = TokenizerState::BeforeAttributeValue;
                    return false;
                }
                Some('>') => {
                    self.finish_attribute();
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                Some(c) if c.is_ascii_uppercase() => {
                    self.current_attr_name.push(c.to_ascii_lowercase());
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_attr_name.push('\u{FFFD}');
                }
                // "U+0022 ("), U+0027 ('), U+003C (<) - This is an
                // unexpected-character-in-attribute-name parse error. Treat
                // it as per the 'anything else' entry below."
                Some(c @ ('"' | '\'' | '<')) => {
                    self.emit_error("unexpected-character-in-attribute-name");
                    self.current_attr_name.push(c);
                }
                None => {
                    self.emit_error("eof-in-tag");
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_attr_name.push(c),
            }
        }
    }

    /// [§ 13.2.5.34 After attribute name state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-name-state)
    fn handle_after_attribute_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('/') => {
                    self.finish_attribute();
                    self.state = TokenizerState::SelfClosingStartTag;
                    return false;
                }
                Some('=') => {
                    self.current_attr_has_value = true;
                    self.state = TokenizerState::BeforeAttributeValue;
                    return false;
                }
                Some('>') => {
                    self.finish_attribute();
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                None => {
                    self.emit_error("eof-in-tag");
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                // "Anything else - Start a new attribute... Reconsume in the
                // attribute name state."
                Some(c) => {
                    self.finish_attribute();
                    self.start_new_attribute();
                    if c == '\0' {
                        self.emit_error("unexpected-null-character");
                        self.current_attr_name.push('\u{FFFD}');
                    } else {
                        self.current_attr_name.push(c.to_ascii_lowercase());
                    }
                    self.state = TokenizerState::AttributeName;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.35 Before attribute value state](https://html.spec.whatwg.org/multipage/parsing.html#before-attribute-value-state)
    fn handle_before_attribute_value_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('"') => {
                    self.state = TokenizerState::AttributeValueDoubleQuoted;
                    return false;
                }
                Some('\'') => {
                    self.state = TokenizerState::AttributeValueSingleQuoted;
                    return false;
                }
                // "U+003E GREATER-THAN SIGN (>) - This is a
                // missing-attribute-value parse error... Emit the current
                // tag token."
                Some('>') => {
                    self.emit_error("missing-attribute-value");
                    self.finish_attribute();
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                None => {
                    self.emit_error("eof-in-tag");
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.reconsume_current();
                    self.state = TokenizerState::AttributeValueUnquoted;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.36/37 Attribute value (quoted) states](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(double-quoted)-state)
    ///
    /// Double- and single-quoted differ only in the closing quote.
    fn handle_attribute_value_quoted_state(&mut self, quote: char) -> bool {
        loop {
            match self.get_char() {
                Some(c) if c == quote => {
                    self.state = TokenizerState::AfterAttributeValueQuoted;
                    return false;
                }
                // Entities in attribute values are decoded on finalization,
                // with the stricter legacy rules.
                Some('&') => {
                    self.current_attr_value.push('&');
                    self.current_attr_value_has_amp = true;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_attr_value.push('\u{FFFD}');
                }
                None => {
                    self.emit_error("eof-in-tag");
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_attr_value.push(c),
            }
        }
    }

    /// [§ 13.2.5.38 Attribute value (unquoted) state](https://html.spec.whatwg.org/multipage/parsing.html#attribute-value-(unquoted)-state)
    fn handle_attribute_value_unquoted_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {
                    self.finish_attribute();
                    self.state = TokenizerState::BeforeAttributeName;
                    return false;
                }
                Some('>') => {
                    self.finish_attribute();
                    if !self.emit_current_tag() {
                        self.state = TokenizerState::Data;
                    }
                    return false;
                }
                Some('&') => {
                    self.current_attr_value.push('&');
                    self.current_attr_value_has_amp = true;
                }
                // "U+0022 ("), U+0027 ('), U+003C (<), U+003D (=), U+0060 (`)
                // - This is an unexpected-character-in-unquoted-attribute-value
                // parse error. Treat it as per the 'anything else' entry."
                Some(c @ ('"' | '\'' | '<' | '=' | '`')) => {
                    self.emit_error("unexpected-character-in-unquoted-attribute-value");
                    self.current_attr_value.push(c);
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_attr_value.push('\u{FFFD}');
                }
                None => {
                    self.emit_error("eof-in-tag");
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_attr_value.push(c),
            }
        }
    }

    /// [§ 13.2.5.39 After attribute value (quoted) state](https://html.spec.whatwg.org/multipage/parsing.html#after-attribute-value-(quoted)-state)
    fn handle_after_attribute_value_quoted_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) => {
                self.finish_attribute();
                self.state = TokenizerState::BeforeAttributeName;
                false
            }
            Some('/') => {
                self.finish_attribute();
                self.state = TokenizerState::SelfClosingStartTag;
                false
            }
            Some('>') => {
                self.finish_attribute();
                if !self.emit_current_tag() {
                    self.state = TokenizerState::Data;
                }
                false
            }
            None => {
                self.emit_error("eof-in-tag");
                self.flush_text();
                self.emit_eof();
                true
            }
            // "Anything else - This is a missing-whitespace-between-attributes
            // parse error. Reconsume in the before attribute name state."
            Some(_) => {
                self.emit_error("missing-whitespace-between-attributes");
                self.finish_attribute();
                self.reconsume_current();
                self.state = TokenizerState::BeforeAttributeName;
                false
            }
        }
    }

    /// [§ 13.2.5.40 Self-closing start tag state](https://html.spec.whatwg.org/multipage/parsing.html#self-closing-start-tag-state)
    fn handle_self_closing_start_tag_state(&mut self) -> bool {
        match self.get_char() {
            Some('>') => {
                self.current_tag_self_closing = true;
                if !self.emit_current_tag() {
                    self.state = TokenizerState::Data;
                }
                false
            }
            None => {
                self.emit_error("eof-in-tag");
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.emit_error("unexpected-character-after-solidus-in-tag");
                self.reconsume_current();
                self.state = TokenizerState::BeforeAttributeName;
                false
            }
        }
    }

    /// [§ 13.2.5.42 Markup declaration open state](https://html.spec.whatwg.org/multipage/parsing.html#markup-declaration-open-state)
    ///
    /// This state uses lookahead instead of consuming characters one at a
    /// time.
    fn handle_markup_declaration_open_state(&mut self) -> bool {
        // "If the next two characters are both U+002D HYPHEN-MINUS (-)..."
        if self.consume_if("--") {
            self.current_comment.clear();
            self.state = TokenizerState::CommentStart;
            return false;
        }
        // "...an ASCII case-insensitive match for the word 'DOCTYPE'..."
        if self.consume_case_insensitive("DOCTYPE") {
            self.current_doctype_name.clear();
            self.current_doctype_public = None;
            self.current_doctype_system = None;
            self.current_doctype_force_quirks = false;
            self.state = TokenizerState::DOCTYPE;
            return false;
        }
        // "...if there is an adjusted current node and it is not an element
        // in the HTML namespace and the next seven characters are a
        // case-sensitive match for '[CDATA['..."
        if self.consume_if("[CDATA[") {
            if !matches!(self.sink.adjusted_current_namespace(), Namespace::Html) {
                self.state = TokenizerState::CDATASection;
                return false;
            }
            // In HTML content the section becomes a bogus comment that keeps
            // the "[CDATA[" prefix.
            self.emit_error("cdata-in-html-content");
            self.current_comment.clear();
            self.current_comment.push_str("[CDATA[");
            self.state = TokenizerState::BogusComment;
            return false;
        }
        // "Otherwise... this is an incorrectly-opened-comment parse error...
        // Switch to the bogus comment state (don't consume anything in the
        // current state)."
        self.emit_error("incorrectly-opened-comment");
        self.current_comment.clear();
        self.state = TokenizerState::BogusComment;
        false
    }

    /// [§ 13.2.5.43 Comment start state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-state)
    fn handle_comment_start_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.state = TokenizerState::CommentStartDash;
                false
            }
            Some('>') => {
                self.emit_error("abrupt-closing-of-empty-comment");
                self.emit_comment();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("eof-in-comment");
                self.emit_comment();
                self.emit_eof();
                true
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.current_comment.push('\u{FFFD}');
                self.state = TokenizerState::Comment;
                false
            }
            Some(c) => {
                self.current_comment.push(c);
                self.state = TokenizerState::Comment;
                false
            }
        }
    }

    /// [§ 13.2.5.44 Comment start dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-start-dash-state)
    fn handle_comment_start_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.state = TokenizerState::CommentEnd;
                false
            }
            Some('>') => {
                self.emit_error("abrupt-closing-of-empty-comment");
                self.emit_comment();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("eof-in-comment");
                self.emit_comment();
                self.emit_eof();
                true
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.current_comment.push('-');
                self.current_comment.push('\u{FFFD}');
                self.state = TokenizerState::Comment;
                false
            }
            Some(c) => {
                self.current_comment.push('-');
                self.current_comment.push(c);
                self.state = TokenizerState::Comment;
                false
            }
        }
    }

    /// [§ 13.2.5.45 Comment state](https://html.spec.whatwg.org/multipage/parsing.html#comment-state)
    fn handle_comment_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some('-') => {
                    self.state = TokenizerState::CommentEndDash;
                    return false;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_comment.push('\u{FFFD}');
                }
                None => {
                    self.emit_error("eof-in-comment");
                    self.emit_comment();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_comment.push(c),
            }
        }
    }

    /// [§ 13.2.5.50 Comment end dash state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-dash-state)
    fn handle_comment_end_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.state = TokenizerState::CommentEnd;
                false
            }
            None => {
                self.emit_error("eof-in-comment");
                self.emit_comment();
                self.emit_eof();
                true
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.current_comment.push('-');
                self.current_comment.push('\u{FFFD}');
                self.state = TokenizerState::Comment;
                false
            }
            Some(c) => {
                self.current_comment.push('-');
                self.current_comment.push(c);
                self.state = TokenizerState::Comment;
                false
            }
        }
    }

    /// [§ 13.2.5.51 Comment end state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-state)
    fn handle_comment_end_state(&mut self) -> bool {
        match self.get_char() {
            Some('>') => {
                self.emit_comment();
                self.state = TokenizerState::Data;
                false
            }
            Some('!') => {
                self.state = TokenizerState::CommentEndBang;
                false
            }
            // "U+002D HYPHEN-MINUS (-) - Append a U+002D HYPHEN-MINUS
            // character (-) to the comment token's data."
            Some('-') => {
                self.current_comment.push('-');
                false
            }
            None => {
                self.emit_error("eof-in-comment");
                self.emit_comment();
                self.emit_eof();
                true
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.current_comment.push_str("--");
                self.current_comment.push('\u{FFFD}');
                self.state = TokenizerState::Comment;
                false
            }
            Some(c) => {
                self.emit_error("incorrectly-closed-comment");
                self.current_comment.push_str("--");
                self.current_comment.push(c);
                self.state = TokenizerState::Comment;
                false
            }
        }
    }

    /// [§ 13.2.5.52 Comment end bang state](https://html.spec.whatwg.org/multipage/parsing.html#comment-end-bang-state)
    fn handle_comment_end_bang_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.current_comment.push_str("--!");
                self.state = TokenizerState::CommentEndDash;
                false
            }
            Some('>') => {
                self.emit_error("incorrectly-closed-comment");
                self.emit_comment();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("eof-in-comment");
                self.emit_comment();
                self.emit_eof();
                true
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.current_comment.push_str("--!");
                self.current_comment.push('\u{FFFD}');
                self.state = TokenizerState::Comment;
                false
            }
            Some(c) => {
                self.current_comment.push_str("--!");
                self.current_comment.push(c);
                self.state = TokenizerState::Comment;
                false
            }
        }
    }

    /// [§ 13.2.5.41 Bogus comment state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-comment-state)
    fn handle_bogus_comment_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some('>') => {
                    self.emit_comment();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_comment();
                    self.emit_eof();
                    return true;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_comment.push('\u{FFFD}');
                }
                Some(c) => self.current_comment.push(c),
            }
        }
    }

    /// [§ 13.2.5.53 DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-state)
    fn handle_doctype_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) => {
                self.state = TokenizerState::BeforeDOCTYPEName;
                false
            }
            Some('>') => {
                self.emit_error("expected-doctype-name-but-got-right-bracket");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("eof-in-doctype");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.emit_error("missing-whitespace-before-doctype-name");
                self.reconsume_current();
                self.state = TokenizerState::BeforeDOCTYPEName;
                false
            }
        }
    }

    /// [§ 13.2.5.54 Before DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-name-state)
    fn handle_before_doctype_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('>') => {
                    self.emit_error("expected-doctype-name-but-got-right-bracket");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-doctype-name");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(c) => {
                    if c.is_ascii_uppercase() {
                        self.current_doctype_name.push(c.to_ascii_lowercase());
                    } else if c == '\0' {
                        self.emit_error("unexpected-null-character");
                        self.current_doctype_name.push('\u{FFFD}');
                    } else {
                        self.current_doctype_name.push(c);
                    }
                    self.state = TokenizerState::DOCTYPEName;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.55 DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#doctype-name-state)
    fn handle_doctype_name_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {
                    self.state = TokenizerState::AfterDOCTYPEName;
                    return false;
                }
                Some('>') => {
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                Some(c) if c.is_ascii_uppercase() => {
                    self.current_doctype_name.push(c.to_ascii_lowercase());
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.current_doctype_name.push('\u{FFFD}');
                }
                None => {
                    self.emit_error("eof-in-doctype-name");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.current_doctype_name.push(c),
            }
        }
    }

    /// [§ 13.2.5.56 After DOCTYPE name state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-name-state)
    ///
    /// "If the six characters starting from the current input character are
    /// an ASCII case-insensitive match for the word 'PUBLIC' / 'SYSTEM'..."
    fn handle_after_doctype_name_state(&mut self) -> bool {
        if self.consume_case_insensitive("PUBLIC") {
            self.state = TokenizerState::AfterDOCTYPEPublicKeyword;
            return false;
        }
        if self.consume_case_insensitive("SYSTEM") {
            self.state = TokenizerState::AfterDOCTYPESystemKeyword;
            return false;
        }
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('>') => {
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-doctype");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.emit_error("missing-whitespace-after-doctype-name");
                    self.current_doctype_force_quirks = true;
                    self.reconsume_current();
                    self.state = TokenizerState::BogusDOCTYPE;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.57 After DOCTYPE public keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-keyword-state)
    fn handle_after_doctype_public_keyword_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) => {
                self.state = TokenizerState::BeforeDOCTYPEPublicIdentifier;
                false
            }
            Some('"') => {
                self.emit_error("missing-whitespace-before-doctype-public-identifier");
                self.current_doctype_public = Some(String::new());
                self.state = TokenizerState::DOCTYPEPublicIdentifierDoubleQuoted;
                false
            }
            Some('\'') => {
                self.emit_error("missing-whitespace-before-doctype-public-identifier");
                self.current_doctype_public = Some(String::new());
                self.state = TokenizerState::DOCTYPEPublicIdentifierSingleQuoted;
                false
            }
            Some('>') => {
                self.emit_error("missing-doctype-public-identifier");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("missing-quote-before-doctype-public-identifier");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.emit_error("unexpected-character-after-doctype-public-keyword");
                self.current_doctype_force_quirks = true;
                self.reconsume_current();
                self.state = TokenizerState::BogusDOCTYPE;
                false
            }
        }
    }

    /// [§ 13.2.5.63 After DOCTYPE system keyword state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-keyword-state)
    fn handle_after_doctype_system_keyword_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) => {
                self.state = TokenizerState::BeforeDOCTYPESystemIdentifier;
                false
            }
            Some('"') => {
                self.emit_error("missing-whitespace-after-doctype-public-identifier");
                self.current_doctype_system = Some(String::new());
                self.state = TokenizerState::DOCTYPESystemIdentifierDoubleQuoted;
                false
            }
            Some('\'') => {
                self.emit_error("missing-whitespace-after-doctype-public-identifier");
                self.current_doctype_system = Some(String::new());
                self.state = TokenizerState::DOCTYPESystemIdentifierSingleQuoted;
                false
            }
            Some('>') => {
                self.emit_error("missing-doctype-system-identifier");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.state = TokenizerState::Data;
                false
            }
            None => {
                self.emit_error("missing-quote-before-doctype-system-identifier");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.emit_error("unexpected-character-after-doctype-system-keyword");
                self.current_doctype_force_quirks = true;
                self.reconsume_current();
                self.state = TokenizerState::BogusDOCTYPE;
                false
            }
        }
    }

    /// [§ 13.2.5.58 Before DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-public-identifier-state)
    fn handle_before_doctype_public_identifier_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('"') => {
                    self.current_doctype_public = Some(String::new());
                    self.state = TokenizerState::DOCTYPEPublicIdentifierDoubleQuoted;
                    return false;
                }
                Some('\'') => {
                    self.current_doctype_public = Some(String::new());
                    self.state = TokenizerState::DOCTYPEPublicIdentifierSingleQuoted;
                    return false;
                }
                Some('>') => {
                    self.emit_error("missing-doctype-public-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("missing-doctype-public-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.emit_error("missing-quote-before-doctype-public-identifier");
                    self.current_doctype_force_quirks = true;
                    self.reconsume_current();
                    self.state = TokenizerState::BogusDOCTYPE;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.59/60 DOCTYPE public identifier (quoted) states](https://html.spec.whatwg.org/multipage/parsing.html#doctype-public-identifier-(double-quoted)-state)
    fn handle_doctype_public_identifier_state(&mut self, quote: char) -> bool {
        loop {
            match self.get_char() {
                Some(c) if c == quote => {
                    self.state = TokenizerState::AfterDOCTYPEPublicIdentifier;
                    return false;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    if let Some(public) = self.current_doctype_public.as_mut() {
                        public.push('\u{FFFD}');
                    }
                }
                Some('>') => {
                    self.emit_error("abrupt-doctype-public-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-doctype-public-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(c) => {
                    if let Some(public) = self.current_doctype_public.as_mut() {
                        public.push(c);
                    }
                }
            }
        }
    }

    /// [§ 13.2.5.61 After DOCTYPE public identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-public-identifier-state)
    fn handle_after_doctype_public_identifier_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) => {
                self.state = TokenizerState::BetweenDOCTYPEPublicAndSystemIdentifiers;
                false
            }
            Some('>') => {
                self.emit_doctype();
                self.state = TokenizerState::Data;
                false
            }
            Some('"') => {
                self.emit_error("missing-whitespace-between-doctype-public-and-system-identifiers");
                self.current_doctype_system = Some(String::new());
                self.state = TokenizerState::DOCTYPESystemIdentifierDoubleQuoted;
                false
            }
            Some('\'') => {
                self.emit_error("missing-whitespace-between-doctype-public-and-system-identifiers");
                self.current_doctype_system = Some(String::new());
                self.state = TokenizerState::DOCTYPESystemIdentifierSingleQuoted;
                false
            }
            None => {
                self.emit_error("missing-whitespace-between-doctype-public-and-system-identifiers");
                self.current_doctype_force_quirks = true;
                self.emit_doctype();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.emit_error("unexpected-character-after-doctype-public-identifier");
                self.current_doctype_force_quirks = true;
                self.reconsume_current();
                self.state = TokenizerState::BogusDOCTYPE;
                false
            }
        }
    }

    /// [§ 13.2.5.62 Between DOCTYPE public and system identifiers state](https://html.spec.whatwg.org/multipage/parsing.html#between-doctype-public-and-system-identifiers-state)
    fn handle_between_doctype_public_and_system_identifiers_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('>') => {
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                Some('"') => {
                    self.current_doctype_system = Some(String::new());
                    self.state = TokenizerState::DOCTYPESystemIdentifierDoubleQuoted;
                    return false;
                }
                Some('\'') => {
                    self.current_doctype_system = Some(String::new());
                    self.state = TokenizerState::DOCTYPESystemIdentifierSingleQuoted;
                    return false;
                }
                None => {
                    self.emit_error("missing-quote-before-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.emit_error("missing-quote-before-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.reconsume_current();
                    self.state = TokenizerState::BogusDOCTYPE;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.64 Before DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#before-doctype-system-identifier-state)
    fn handle_before_doctype_system_identifier_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('"') => {
                    self.current_doctype_system = Some(String::new());
                    self.state = TokenizerState::DOCTYPESystemIdentifierDoubleQuoted;
                    return false;
                }
                Some('\'') => {
                    self.current_doctype_system = Some(String::new());
                    self.state = TokenizerState::DOCTYPESystemIdentifierSingleQuoted;
                    return false;
                }
                Some('>') => {
                    self.emit_error("missing-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("missing-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.emit_error("missing-quote-before-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.reconsume_current();
                    self.state = TokenizerState::BogusDOCTYPE;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.65/66 DOCTYPE system identifier (quoted) states](https://html.spec.whatwg.org/multipage/parsing.html#doctype-system-identifier-(double-quoted)-state)
    fn handle_doctype_system_identifier_state(&mut self, quote: char) -> bool {
        loop {
            match self.get_char() {
                Some(c) if c == quote => {
                    self.state = TokenizerState::AfterDOCTYPESystemIdentifier;
                    return false;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    if let Some(system) = self.current_doctype_system.as_mut() {
                        system.push('\u{FFFD}');
                    }
                }
                Some('>') => {
                    self.emit_error("abrupt-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-doctype-system-identifier");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(c) => {
                    if let Some(system) = self.current_doctype_system.as_mut() {
                        system.push(c);
                    }
                }
            }
        }
    }

    /// [§ 13.2.5.67 After DOCTYPE system identifier state](https://html.spec.whatwg.org/multipage/parsing.html#after-doctype-system-identifier-state)
    fn handle_after_doctype_system_identifier_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(c) if Self::is_whitespace_char(c) => {}
                Some('>') => {
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-doctype");
                    self.current_doctype_force_quirks = true;
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {
                    self.emit_error("unexpected-character-after-doctype-system-identifier");
                    self.reconsume_current();
                    self.state = TokenizerState::BogusDOCTYPE;
                    return false;
                }
            }
        }
    }

    /// [§ 13.2.5.68 Bogus DOCTYPE state](https://html.spec.whatwg.org/multipage/parsing.html#bogus-doctype-state)
    fn handle_bogus_doctype_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some('>') => {
                    self.emit_doctype();
                    self.state = TokenizerState::Data;
                    return false;
                }
                None => {
                    self.emit_doctype();
                    self.emit_eof();
                    return true;
                }
                Some(_) => {}
            }
        }
    }

    /// [§ 13.2.5.69 CDATA section state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-state)
    fn handle_cdata_section_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some(']') => {
                    self.state = TokenizerState::CDATASectionBracket;
                    return false;
                }
                None => {
                    self.emit_error("eof-in-cdata");
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.append_text(c),
            }
        }
    }

    /// [§ 13.2.5.70 CDATA section bracket state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-bracket-state)
    fn handle_cdata_section_bracket_state(&mut self) -> bool {
        match self.get_char() {
            Some(']') => {
                self.state = TokenizerState::CDATASectionEnd;
                false
            }
            None => {
                self.append_text(']');
                self.emit_error("eof-in-cdata");
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.append_text(']');
                self.reconsume_current();
                self.state = TokenizerState::CDATASection;
                false
            }
        }
    }

    /// [§ 13.2.5.71 CDATA section end state](https://html.spec.whatwg.org/multipage/parsing.html#cdata-section-end-state)
    fn handle_cdata_section_end_state(&mut self) -> bool {
        match self.get_char() {
            Some('>') => {
                self.flush_text();
                self.state = TokenizerState::Data;
                false
            }
            // "U+005D RIGHT SQUARE BRACKET (]) - Emit a U+005D RIGHT SQUARE
            // BRACKET character token."
            Some(']') => {
                self.append_text(']');
                false
            }
            None => {
                self.append_text(']');
                self.append_text(']');
                self.emit_error("eof-in-cdata");
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(_) => {
                self.append_text(']');
                self.append_text(']');
                self.reconsume_current();
                self.state = TokenizerState::CDATASection;
                false
            }
        }
    }

    /// [§ 13.2.5.2 RCDATA state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-state)
    fn handle_rcdata_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                // Ampersands are buffered; the flush decodes RCDATA text.
                Some('&') => self.append_text('&'),
                Some('<') => {
                    self.state = TokenizerState::RCDATALessThanSign;
                    return false;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.append_text('\u{FFFD}');
                }
                None => {
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.append_text(c),
            }
        }
    }

    /// [§ 13.2.5.9 RCDATA less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-less-than-sign-state)
    fn handle_rcdata_less_than_sign_state(&mut self) -> bool {
        match self.get_char() {
            Some('/') => {
                self.current_tag_name.clear();
                self.original_tag_name.clear();
                self.state = TokenizerState::RCDATAEndTagOpen;
                false
            }
            _ => {
                self.append_text('<');
                self.reconsume_current();
                self.state = TokenizerState::RCDATA;
                false
            }
        }
    }

    /// [§ 13.2.5.10 RCDATA end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-open-state)
    fn handle_rcdata_end_tag_open_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag_name.push(c.to_ascii_lowercase());
                self.original_tag_name.push(c);
                self.state = TokenizerState::RCDATAEndTagName;
                false
            }
            _ => {
                self.append_text_str("</");
                self.reconsume_current();
                self.state = TokenizerState::RCDATA;
                false
            }
        }
    }

    /// [§ 13.2.5.3 RAWTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-state)
    fn handle_rawtext_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some('<') => {
                    // A <!-- inside <script> enters the script-escaped
                    // ladder; the "<!--" itself is script text.
                    if self.rawtext_tag_name.as_deref() == Some("script")
                        && self.peek_char(0) == Some('!')
                        && self.peek_char(1) == Some('-')
                        && self.peek_char(2) == Some('-')
                    {
                        self.append_text_str("<!--");
                        self.get_char();
                        self.get_char();
                        self.get_char();
                        self.state = TokenizerState::ScriptDataEscaped;
                        return false;
                    }
                    self.state = TokenizerState::RAWTEXTLessThanSign;
                    return false;
                }
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.append_text('\u{FFFD}');
                }
                None => {
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.append_text(c),
            }
        }
    }

    /// [§ 13.2.5.12 RAWTEXT less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-less-than-sign-state)
    fn handle_rawtext_less_than_sign_state(&mut self) -> bool {
        match self.get_char() {
            Some('/') => {
                self.current_tag_name.clear();
                self.original_tag_name.clear();
                self.state = TokenizerState::RAWTEXTEndTagOpen;
                false
            }
            _ => {
                self.append_text('<');
                self.reconsume_current();
                self.state = TokenizerState::RAWTEXT;
                false
            }
        }
    }

    /// [§ 13.2.5.13 RAWTEXT end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#rawtext-end-tag-open-state)
    fn handle_rawtext_end_tag_open_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag_name.push(c.to_ascii_lowercase());
                self.original_tag_name.push(c);
                self.state = TokenizerState::RAWTEXTEndTagName;
                false
            }
            _ => {
                self.append_text_str("</");
                self.reconsume_current();
                self.state = TokenizerState::RAWTEXT;
                false
            }
        }
    }

    /// [§ 13.2.5.11/14 RCDATA / RAWTEXT end tag name states](https://html.spec.whatwg.org/multipage/parsing.html#rcdata-end-tag-name-state)
    ///
    /// A candidate end tag closes the raw mode only when its lowercased name
    /// equals the remembered sentinel and terminates with whitespace, `/`,
    /// or `>`. Anything else is re-emitted as text with its original case.
    fn handle_raw_end_tag_name_state(&mut self, rawtext: bool) -> bool {
        let text_state = if rawtext {
            TokenizerState::RAWTEXT
        } else {
            TokenizerState::RCDATA
        };
        loop {
            let c = self.get_char();
            if let Some(ch) = c {
                if ch.is_ascii_alphabetic() {
                    self.current_tag_name.push(ch.to_ascii_lowercase());
                    self.original_tag_name.push(ch);
                    continue;
                }
            }

            let is_appropriate =
                Some(self.current_tag_name.as_str()) == self.rawtext_tag_name.as_deref();

            if is_appropriate {
                match c {
                    Some('>') => {
                        let name = std::mem::take(&mut self.current_tag_name);
                        self.original_tag_name.clear();
                        self.emit_raw_end_tag(name);
                        self.state = TokenizerState::Data;
                        self.rawtext_tag_name = None;
                        return false;
                    }
                    Some(ch) if Self::is_whitespace_char(ch) => {
                        // Attributes on a raw-mode end tag parse normally;
                        // flush the pending text while the content model is
                        // still in force so entity handling stays right.
                        self.flush_text();
                        self.current_tag_is_end = true;
                        self.current_tag_attrs = AttrList::new();
                        self.original_tag_name.clear();
                        self.state = TokenizerState::BeforeAttributeName;
                        return false;
                    }
                    Some('/') => {
                        self.flush_text();
                        self.current_tag_is_end = true;
                        self.current_tag_attrs = AttrList::new();
                        self.original_tag_name.clear();
                        self.state = TokenizerState::SelfClosingStartTag;
                        return false;
                    }
                    _ => {}
                }
            }

            // Not an appropriate end tag: the "</" and the candidate's
            // characters (original case) are text.
            if c.is_none() {
                self.append_text_str("</");
                let original = std::mem::take(&mut self.original_tag_name);
                self.append_text_str(&original);
                self.current_tag_name.clear();
                self.flush_text();
                self.emit_eof();
                return true;
            }

            self.append_text_str("</");
            let original = std::mem::take(&mut self.original_tag_name);
            self.append_text_str(&original);
            self.current_tag_name.clear();
            self.reconsume_current();
            self.state = text_state;
            return false;
        }
    }

    /// [§ 13.2.5.5 PLAINTEXT state](https://html.spec.whatwg.org/multipage/parsing.html#plaintext-state)
    ///
    /// "There is no way to switch out of the PLAINTEXT state."
    fn handle_plaintext_state(&mut self) -> bool {
        loop {
            match self.get_char() {
                Some('\0') => {
                    self.emit_error("unexpected-null-character");
                    self.append_text('\u{FFFD}');
                }
                None => {
                    self.flush_text();
                    self.emit_eof();
                    return true;
                }
                Some(c) => self.append_text(c),
            }
        }
    }

    /// [§ 13.2.5.20 Script data escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-state)
    fn handle_script_data_escaped_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                self.state = TokenizerState::ScriptDataEscapedDash;
                false
            }
            Some('<') => {
                self.state = TokenizerState::ScriptDataEscapedLessThanSign;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                false
            }
        }
    }

    /// [§ 13.2.5.21 Script data escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-state)
    fn handle_script_data_escaped_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                self.state = TokenizerState::ScriptDataEscapedDashDash;
                false
            }
            Some('<') => {
                self.state = TokenizerState::ScriptDataEscapedLessThanSign;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.22 Script data escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-dash-dash-state)
    fn handle_script_data_escaped_dash_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                false
            }
            Some('<') => {
                self.append_text('<');
                self.state = TokenizerState::ScriptDataEscapedLessThanSign;
                false
            }
            // "U+003E GREATER-THAN SIGN (>) - Switch to the script data
            // state." (Script data is RAWTEXT here; the sentinel is still
            // "script".)
            Some('>') => {
                self.append_text('>');
                self.state = TokenizerState::RAWTEXT;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.23 Script data escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-less-than-sign-state)
    fn handle_script_data_escaped_less_than_sign_state(&mut self) -> bool {
        match self.get_char() {
            Some('/') => {
                self.temp_buffer.clear();
                self.state = TokenizerState::ScriptDataEscapedEndTagOpen;
                false
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.temp_buffer.clear();
                self.append_text('<');
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataDoubleEscapeStart;
                false
            }
            _ => {
                self.append_text('<');
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.24 Script data escaped end tag open state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-open-state)
    fn handle_script_data_escaped_end_tag_open_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.current_tag_name.clear();
                self.original_tag_name.clear();
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataEscapedEndTagName;
                false
            }
            _ => {
                self.append_text_str("</");
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.25 Script data escaped end tag name state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-escaped-end-tag-name-state)
    fn handle_script_data_escaped_end_tag_name_state(&mut self) -> bool {
        loop {
            let c = self.get_char();
            if let Some(ch) = c {
                if ch.is_ascii_alphabetic() {
                    self.current_tag_name.push(ch.to_ascii_lowercase());
                    self.original_tag_name.push(ch);
                    self.temp_buffer.push(ch);
                    continue;
                }
            }

            let is_appropriate =
                Some(self.current_tag_name.as_str()) == self.rawtext_tag_name.as_deref();

            if is_appropriate {
                match c {
                    Some(ch) if Self::is_whitespace_char(ch) => {
                        self.flush_text();
                        self.current_tag_is_end = true;
                        self.current_tag_attrs = AttrList::new();
                        self.state = TokenizerState::BeforeAttributeName;
                        return false;
                    }
                    Some('/') => {
                        self.flush_text();
                        self.current_tag_is_end = true;
                        self.current_tag_attrs = AttrList::new();
                        self.state = TokenizerState::SelfClosingStartTag;
                        return false;
                    }
                    Some('>') => {
                        let name = std::mem::take(&mut self.current_tag_name);
                        self.original_tag_name.clear();
                        self.emit_raw_end_tag(name);
                        self.state = TokenizerState::Data;
                        self.rawtext_tag_name = None;
                        return false;
                    }
                    _ => {}
                }
            }

            // Not an appropriate end tag.
            self.append_text_str("</");
            let temp = std::mem::take(&mut self.temp_buffer);
            self.append_text_str(&temp);
            self.current_tag_name.clear();
            self.original_tag_name.clear();
            if c.is_none() {
                self.flush_text();
                self.emit_eof();
                return true;
            }
            self.reconsume_current();
            self.state = TokenizerState::ScriptDataEscaped;
            return false;
        }
    }

    /// [§ 13.2.5.26 Script data double escape start state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-start-state)
    fn handle_script_data_double_escape_start_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) || c == '/' || c == '>' => {
                // "If the temporary buffer is the string 'script'..."
                if self.temp_buffer.eq_ignore_ascii_case("script") {
                    self.state = TokenizerState::ScriptDataDoubleEscaped;
                } else {
                    self.state = TokenizerState::ScriptDataEscaped;
                }
                self.append_text(c);
                false
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.temp_buffer.push(c);
                self.append_text(c);
                false
            }
            _ => {
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.27 Script data double escaped state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-state)
    fn handle_script_data_double_escaped_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                self.state = TokenizerState::ScriptDataDoubleEscapedDash;
                false
            }
            Some('<') => {
                self.append_text('<');
                self.state = TokenizerState::ScriptDataDoubleEscapedLessThanSign;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                false
            }
        }
    }

    /// [§ 13.2.5.28 Script data double escaped dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-state)
    fn handle_script_data_double_escaped_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                self.state = TokenizerState::ScriptDataDoubleEscapedDashDash;
                false
            }
            Some('<') => {
                self.append_text('<');
                self.state = TokenizerState::ScriptDataDoubleEscapedLessThanSign;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.29 Script data double escaped dash dash state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-dash-dash-state)
    fn handle_script_data_double_escaped_dash_dash_state(&mut self) -> bool {
        match self.get_char() {
            Some('-') => {
                self.append_text('-');
                false
            }
            Some('<') => {
                self.append_text('<');
                self.state = TokenizerState::ScriptDataDoubleEscapedLessThanSign;
                false
            }
            Some('>') => {
                self.append_text('>');
                self.state = TokenizerState::RAWTEXT;
                false
            }
            Some('\0') => {
                self.emit_error("unexpected-null-character");
                self.append_text('\u{FFFD}');
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
            None => {
                self.flush_text();
                self.emit_eof();
                true
            }
            Some(c) => {
                self.append_text(c);
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.30 Script data double escaped less-than sign state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escaped-less-than-sign-state)
    fn handle_script_data_double_escaped_less_than_sign_state(&mut self) -> bool {
        match self.get_char() {
            Some('/') => {
                self.temp_buffer.clear();
                self.append_text('/');
                self.state = TokenizerState::ScriptDataDoubleEscapeEnd;
                false
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.temp_buffer.clear();
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataDoubleEscapeStart;
                false
            }
            _ => {
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
        }
    }

    /// [§ 13.2.5.31 Script data double escape end state](https://html.spec.whatwg.org/multipage/parsing.html#script-data-double-escape-end-state)
    fn handle_script_data_double_escape_end_state(&mut self) -> bool {
        match self.get_char() {
            Some(c) if Self::is_whitespace_char(c) || c == '/' || c == '>' => {
                if self.temp_buffer.eq_ignore_ascii_case("script") {
                    self.state = TokenizerState::ScriptDataEscaped;
                } else {
                    self.state = TokenizerState::ScriptDataDoubleEscaped;
                }
                self.append_text(c);
                false
            }
            Some(c) if c.is_ascii_alphabetic() => {
                self.temp_buffer.push(c);
                self.append_text(c);
                false
            }
            _ => {
                self.reconsume_current();
                self.state = TokenizerState::ScriptDataDoubleEscaped;
                false
            }
        }
    }
}
