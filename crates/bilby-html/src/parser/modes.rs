//! The insertion-mode handlers of the tree builder.
//!
//! [§ 13.2.6.4 The rules for parsing tokens in HTML content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhtml)
//!
//! One handler per insertion mode, plus the in-body start/end tag dispatch.
//! A handler returns `None` when the token is consumed, or a [`Reprocess`]
//! telling the dispatcher to try again in another mode.

use bilby_dom::{AttrList, DoctypeData, Namespace, NodeId, NodeType};

use super::core::{
    FormattingEntry, InsertionMode, ModeResult, Reprocess, TreeBuilder, is_all_whitespace,
};
use super::quirks::{QuirksMode, doctype_error_and_quirks};
use super::tag_sets::{FORMATTING_ELEMENTS, HEADING_ELEMENTS};
use crate::tokenizer::{SinkResult, Token};

impl TreeBuilder {
    pub(crate) fn run_mode(&mut self, mode: InsertionMode, token: Token) -> ModeResult {
        match mode {
            InsertionMode::Initial => self.mode_initial(token),
            InsertionMode::BeforeHtml => self.mode_before_html(token),
            InsertionMode::BeforeHead => self.mode_before_head(token),
            InsertionMode::InHead => self.mode_in_head(token),
            InsertionMode::InHeadNoscript => self.mode_in_head_noscript(token),
            InsertionMode::AfterHead => self.mode_after_head(token),
            InsertionMode::Text => self.mode_text(token),
            InsertionMode::InBody => self.mode_in_body(token),
            InsertionMode::AfterBody => self.mode_after_body(token),
            InsertionMode::AfterAfterBody => self.mode_after_after_body(token),
            InsertionMode::InTable => self.mode_in_table(token),
            InsertionMode::InTableText => self.mode_in_table_text(token),
            InsertionMode::InCaption => self.mode_in_caption(token),
            InsertionMode::InColumnGroup => self.mode_in_column_group(token),
            InsertionMode::InTableBody => self.mode_in_table_body(token),
            InsertionMode::InRow => self.mode_in_row(token),
            InsertionMode::InCell => self.mode_in_cell(token),
            InsertionMode::InFrameset => self.mode_in_frameset(token),
            InsertionMode::AfterFrameset => self.mode_after_frameset(token),
            InsertionMode::AfterAfterFrameset => self.mode_after_after_frameset(token),
            InsertionMode::InSelect => self.mode_in_select(token),
            InsertionMode::InTemplate => self.mode_in_template(token),
        }
    }

    /// [§ 13.2.6.4.1](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    /// (DOCTYPE tokens are routed here by the dispatcher.)
    pub(crate) fn handle_doctype(&mut self, doctype: &DoctypeData) {
        if self.mode != InsertionMode::Initial {
            self.parse_error("unexpected-doctype", None);
            return;
        }

        let (parse_error, quirks) = doctype_error_and_quirks(doctype, self.iframe_srcdoc);

        let node = self.tree.alloc(NodeType::Doctype(doctype.clone()));
        self.tree.append_child(NodeId::ROOT, node);

        if parse_error {
            self.parse_error("unknown-doctype", None);
        }

        self.quirks_mode = quirks;
        self.mode = InsertionMode::BeforeHtml;
    }

    /// [§ 13.2.6.4.1 The "initial" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    fn mode_initial(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                if is_all_whitespace(&data) {
                    return None;
                }
                self.parse_error("expected-doctype-but-got-chars", None);
                self.quirks_mode = QuirksMode::Quirks;
                Some(Reprocess::new(
                    InsertionMode::BeforeHtml,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                self.append_comment_to_document(&data);
                None
            }
            Token::EndOfFile => {
                self.parse_error("expected-doctype-but-got-eof", None);
                self.quirks_mode = QuirksMode::Quirks;
                self.mode = InsertionMode::BeforeHtml;
                Some(Reprocess::new(InsertionMode::BeforeHtml, Token::EndOfFile))
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => {
                self.parse_error_at_tag(
                    "expected-doctype-but-got-start-tag",
                    &name,
                    &attrs,
                    false,
                    self_closing,
                );
                self.quirks_mode = QuirksMode::Quirks;
                Some(Reprocess::new(
                    InsertionMode::BeforeHtml,
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    },
                ))
            }
            Token::EndTag { name, attrs } => {
                self.parse_error_at_tag("expected-doctype-but-got-end-tag", &name, &attrs, true, false);
                self.quirks_mode = QuirksMode::Quirks;
                Some(Reprocess::new(
                    InsertionMode::BeforeHtml,
                    Token::EndTag { name, attrs },
                ))
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.2 The "before html" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    fn mode_before_html(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } if is_all_whitespace(&data) => None,
            Token::Comment { data } => {
                self.append_comment_to_document(&data);
                None
            }
            Token::StartTag { name, attrs, .. } if name == "html" => {
                self.create_root(attrs);
                self.mode = InsertionMode::BeforeHead;
                None
            }
            Token::EndTag { name, attrs } => {
                if matches!(name.as_str(), "head" | "body" | "html" | "br") {
                    self.create_root(AttrList::new());
                    self.mode = InsertionMode::BeforeHead;
                    return Some(Reprocess::new(
                        InsertionMode::BeforeHead,
                        Token::EndTag { name, attrs },
                    ));
                }
                // Ignore any other end tag.
                self.parse_error("unexpected-end-tag-before-html", Some(&name));
                None
            }
            Token::EndOfFile => {
                self.create_root(AttrList::new());
                self.mode = InsertionMode::BeforeHead;
                Some(Reprocess::new(InsertionMode::BeforeHead, Token::EndOfFile))
            }
            Token::Characters { data } => {
                let stripped = data.trim_start_matches(['\t', '\n', '\x0C', '\r', ' ']);
                let token = Token::Characters {
                    data: stripped.to_string(),
                };
                self.create_root(AttrList::new());
                self.mode = InsertionMode::BeforeHead;
                Some(Reprocess::new(InsertionMode::BeforeHead, token))
            }
            other => {
                self.create_root(AttrList::new());
                self.mode = InsertionMode::BeforeHead;
                Some(Reprocess::new(InsertionMode::BeforeHead, other))
            }
        }
    }

    /// [§ 13.2.6.4.3 The "before head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    fn mode_before_head(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                let mut data = data;
                if data.contains('\0') {
                    self.parse_error("invalid-codepoint-before-head", None);
                    data = data.replace('\0', "");
                    if data.is_empty() {
                        return None;
                    }
                }
                if is_all_whitespace(&data) {
                    return None;
                }
                self.head_element = Some(self.insert_phantom("head"));
                self.mode = InsertionMode::InHead;
                Some(Reprocess::new(
                    InsertionMode::InHead,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag { name, attrs, .. } if name == "html" => {
                // Duplicate html tag: merge attributes into the existing
                // root (open_elements[0] is always html here).
                let html = self.open_elements[0];
                self.add_missing_attributes(html, attrs);
                None
            }
            Token::StartTag { name, attrs, .. } if name == "head" => {
                let head = self.insert_element(&name, attrs, Namespace::Html, true);
                self.head_element = Some(head);
                self.mode = InsertionMode::InHead;
                None
            }
            Token::EndTag { name, attrs } => {
                if matches!(name.as_str(), "head" | "body" | "html" | "br") {
                    self.head_element = Some(self.insert_phantom("head"));
                    self.mode = InsertionMode::InHead;
                    return Some(Reprocess::new(
                        InsertionMode::InHead,
                        Token::EndTag { name, attrs },
                    ));
                }
                self.parse_error("unexpected-end-tag-before-head", Some(&name));
                None
            }
            other => {
                self.head_element = Some(self.insert_phantom("head"));
                self.mode = InsertionMode::InHead;
                Some(Reprocess::new(InsertionMode::InHead, other))
            }
        }
    }

    /// [§ 13.2.6.4.4 The "in head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    fn mode_in_head(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                if is_all_whitespace(&data) {
                    self.append_text(&data);
                    return None;
                }
                // Split off leading whitespace: it stays in the head (when
                // the head already has content), the rest reprocesses after
                // the head.
                let split = data
                    .find(|c: char| !matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
                    .unwrap_or(data.len());
                let (leading_ws, remaining) = data.split_at(split);
                if !leading_ws.is_empty() {
                    let has_children = self
                        .open_elements
                        .last()
                        .is_some_and(|&node| !self.tree.children(node).is_empty());
                    if has_children {
                        let ws = leading_ws.to_string();
                        self.append_text(&ws);
                    }
                }
                let remaining = remaining.to_string();
                self.pop_current();
                self.mode = InsertionMode::AfterHead;
                Some(Reprocess::new(
                    InsertionMode::AfterHead,
                    Token::Characters { data: remaining },
                ))
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => {
                    self.pop_current();
                    self.mode = InsertionMode::AfterHead;
                    Some(Reprocess::new(
                        InsertionMode::AfterHead,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" => {
                    self.insert_element(&name, attrs, Namespace::Html, false);
                    None
                }
                "template" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.push_formatting_marker();
                    self.frameset_ok = false;
                    self.mode = InsertionMode::InTemplate;
                    self.template_modes.push(InsertionMode::InTemplate);
                    None
                }
                "title" | "style" | "script" | "noframes" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.original_mode = Some(self.mode);
                    self.mode = InsertionMode::Text;
                    None
                }
                // Scripting is disabled: noscript content parses as HTML.
                "noscript" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InHeadNoscript;
                    None
                }
                _ => {
                    self.pop_current();
                    self.mode = InsertionMode::AfterHead;
                    Some(Reprocess::new(
                        InsertionMode::AfterHead,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "template" => {
                    // Check the raw stack (a table would block the scope
                    // predicate).
                    let has_template = self
                        .open_elements
                        .iter()
                        .any(|&node| self.element_name_of(node) == "template");
                    if !has_template {
                        return None;
                    }
                    self.generate_implied_end_tags(None);
                    self.pop_until_inclusive("template");
                    self.clear_active_formatting_up_to_marker();
                    self.template_modes.pop();
                    self.reset_insertion_mode();
                    None
                }
                "head" => {
                    self.pop_current();
                    self.mode = InsertionMode::AfterHead;
                    None
                }
                "body" | "html" | "br" => {
                    self.pop_current();
                    self.mode = InsertionMode::AfterHead;
                    Some(Reprocess::new(
                        InsertionMode::AfterHead,
                        Token::EndTag { name, attrs },
                    ))
                }
                _ => {
                    self.pop_current();
                    self.mode = InsertionMode::AfterHead;
                    Some(Reprocess::new(
                        InsertionMode::AfterHead,
                        Token::EndTag { name, attrs },
                    ))
                }
            },
            other => {
                self.pop_current();
                self.mode = InsertionMode::AfterHead;
                Some(Reprocess::new(InsertionMode::AfterHead, other))
            }
        }
    }

    /// [§ 13.2.6.4.5 The "in head noscript" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    fn mode_in_head_noscript(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                if is_all_whitespace(&data) {
                    return self.mode_in_head(Token::Characters { data });
                }
                self.parse_error("unexpected-start-tag", Some("text"));
                self.pop_current();
                self.mode = InsertionMode::InHead;
                Some(Reprocess::new(
                    InsertionMode::InHead,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => self.mode_in_head(Token::Comment { data }),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => self.mode_in_body(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                "basefont" | "bgsound" | "link" | "meta" | "noframes" | "style" => self
                    .mode_in_head(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    }),
                "head" | "noscript" => {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    None
                }
                _ => {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    self.pop_current();
                    self.mode = InsertionMode::InHead;
                    Some(Reprocess::new(
                        InsertionMode::InHead,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "noscript" => {
                    self.pop_current();
                    self.mode = InsertionMode::InHead;
                    None
                }
                "br" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    self.pop_current();
                    self.mode = InsertionMode::InHead;
                    Some(Reprocess::new(
                        InsertionMode::InHead,
                        Token::EndTag { name, attrs },
                    ))
                }
                _ => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
            },
            Token::EndOfFile => {
                self.parse_error("expected-closing-tag-but-got-eof", Some("noscript"));
                self.pop_current();
                self.mode = InsertionMode::InHead;
                Some(Reprocess::new(InsertionMode::InHead, Token::EndOfFile))
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.6 The "after head" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    fn mode_after_head(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                let mut data = data;
                if data.contains('\0') {
                    self.parse_error("invalid-codepoint-in-body", None);
                    data = data.replace('\0', "");
                }
                if data.contains('\x0C') {
                    self.parse_error("invalid-codepoint-in-body", None);
                    data = data.replace('\x0C', "");
                }
                if data.is_empty() || is_all_whitespace(&data) {
                    if !data.is_empty() {
                        self.append_text(&data);
                    }
                    return None;
                }
                self.insert_body_if_missing();
                Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => {
                    self.insert_body_if_missing();
                    Some(Reprocess::new(
                        InsertionMode::InBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "body" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InBody;
                    self.frameset_ok = false;
                    None
                }
                "frameset" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InFrameset;
                    None
                }
                // <input type=hidden> does not synthesize a body here.
                "input" => {
                    let input_type = attrs.get("type").map(str::to_ascii_lowercase);
                    if input_type.as_deref() == Some("hidden") {
                        self.parse_error("unexpected-hidden-input-after-head", None);
                        return None;
                    }
                    self.insert_body_if_missing();
                    Some(Reprocess::new(
                        InsertionMode::InBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" | "title" | "style"
                | "script" | "noscript" => {
                    // Re-open the head for the straggler, then pull it back
                    // off the stack (it may no longer be on top).
                    let Some(head) = self.head_element else {
                        return None;
                    };
                    self.open_elements.push(head);
                    let result = self.mode_in_head(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    });
                    self.remove_from_open_elements(head);
                    result
                }
                "template" => {
                    let Some(head) = self.head_element else {
                        return None;
                    };
                    self.open_elements.push(head);
                    self.mode = InsertionMode::InHead;
                    Some(Reprocess::new(
                        InsertionMode::InHead,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                _ => {
                    self.insert_body_if_missing();
                    Some(Reprocess::new(
                        InsertionMode::InBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "template" => self.mode_in_head(Token::EndTag { name, attrs }),
                "body" | "html" | "br" => {
                    self.insert_body_if_missing();
                    Some(Reprocess::new(
                        InsertionMode::InBody,
                        Token::EndTag { name, attrs },
                    ))
                }
                _ => {
                    self.parse_error("unexpected-end-tag-after-head", Some(&name));
                    None
                }
            },
            Token::EndOfFile => {
                self.insert_body_if_missing();
                self.mode = InsertionMode::InBody;
                Some(Reprocess::new(InsertionMode::InBody, Token::EndOfFile))
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.8 The "text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    fn mode_text(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                self.append_text(&data);
                None
            }
            Token::EndOfFile => {
                let tag_name = self
                    .open_elements
                    .last()
                    .map(|&node| self.element_name_of(node).to_string());
                self.parse_error("expected-named-closing-tag-but-got-eof", tag_name.as_deref());
                self.pop_current();
                self.mode = self.original_mode.unwrap_or(InsertionMode::InBody);
                Some(Reprocess::new(self.mode, Token::EndOfFile))
            }
            // The matching end tag (the tokenizer only emits the sentinel's).
            _ => {
                self.pop_current();
                self.mode = self.original_mode.unwrap_or(InsertionMode::InBody);
                None
            }
        }
    }

    // ---------------------
    // In body
    // ---------------------

    /// [§ 13.2.6.4.7 The "in body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    pub(crate) fn mode_in_body(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                self.handle_characters_in_body(data);
                None
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => self.handle_body_start_tag(name, attrs, self_closing),
            Token::EndTag { name, .. } => self.handle_body_end_tag(&name),
            Token::EndOfFile => self.handle_eof_in_body(),
            Token::Doctype(_) => None,
        }
    }

    fn handle_characters_in_body(&mut self, data: String) {
        let mut data = data;
        if data.contains('\0') {
            self.parse_error("invalid-codepoint", None);
            data = data.replace('\0', "");
        }
        if is_all_whitespace(&data) {
            self.reconstruct_active_formatting_elements();
            self.append_text(&data);
            return;
        }
        self.reconstruct_active_formatting_elements();
        self.frameset_ok = false;
        self.append_text(&data);
    }

    fn handle_eof_in_body(&mut self) -> ModeResult {
        // Inside a template, EOF unwinds the template first.
        if !self.template_modes.is_empty() {
            return self.mode_in_template(Token::EndOfFile);
        }
        for &node in &self.open_elements {
            if !matches!(
                self.element_name_of(node),
                "dd" | "dt"
                    | "li"
                    | "optgroup"
                    | "option"
                    | "p"
                    | "rb"
                    | "rp"
                    | "rt"
                    | "rtc"
                    | "tbody"
                    | "td"
                    | "tfoot"
                    | "th"
                    | "thead"
                    | "tr"
                    | "body"
                    | "html"
            ) {
                let name = self.element_name_of(node).to_string();
                self.parse_error("expected-closing-tag-but-got-eof", Some(&name));
                break;
            }
        }
        self.mode = InsertionMode::AfterBody;
        Some(Reprocess::new(InsertionMode::AfterBody, Token::EndOfFile))
    }

    /// In-body start tag dispatch.
    #[allow(clippy::too_many_lines)]
    fn handle_body_start_tag(
        &mut self,
        name: String,
        attrs: AttrList,
        self_closing: bool,
    ) -> ModeResult {
        match name.as_str() {
            "html" => {
                if !self.template_modes.is_empty() {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    return None;
                }
                let html = self.open_elements[0];
                self.add_missing_attributes(html, attrs);
                None
            }
            "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script" | "style"
            | "template" | "title" => self.mode_in_head(Token::StartTag {
                name,
                attrs,
                self_closing,
            }),
            "body" => {
                if !self.template_modes.is_empty() {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    return None;
                }
                if self.open_elements.len() > 1 {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    let body = self.open_elements[1];
                    if self.element_name_of(body) == "body" {
                        self.add_missing_attributes(body, attrs);
                    }
                }
                self.frameset_ok = false;
                None
            }
            "frameset" => self.handle_body_start_frameset(&name, attrs),
            "address" | "article" | "aside" | "blockquote" | "center" | "details" | "dialog"
            | "dir" | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer" | "header"
            | "hgroup" | "main" | "menu" | "nav" | "ol" | "p" | "search" | "section" | "summary"
            | "ul" => {
                self.close_p_element();
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                self.close_p_element();
                if self
                    .open_elements
                    .last()
                    .is_some_and(|&node| HEADING_ELEMENTS.contains(&self.element_name_of(node)))
                {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    self.pop_current();
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.frameset_ok = false;
                None
            }
            "pre" | "listing" => {
                self.close_p_element();
                self.insert_element(&name, attrs, Namespace::Html, true);
                // The first newline of the content is dropped.
                self.ignore_lf = true;
                self.frameset_ok = false;
                None
            }
            "form" => {
                let template_on_stack = self
                    .open_elements
                    .iter()
                    .any(|&node| self.element_name_of(node) == "template");
                if self.form_element.is_some() && !template_on_stack {
                    self.parse_error("unexpected-start-tag", Some(&name));
                    return None;
                }
                self.close_p_element();
                let node = self.insert_element(&name, attrs, Namespace::Html, true);
                if !template_on_stack {
                    self.form_element = Some(node);
                }
                self.frameset_ok = false;
                None
            }
            "li" => {
                self.frameset_ok = false;
                self.close_p_element();
                if self.has_in_list_item_scope("li") {
                    self.pop_until_any_inclusive(&["li"]);
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "dd" | "dt" => {
                self.frameset_ok = false;
                self.close_p_element();
                if name == "dd" {
                    if self.has_in_definition_scope("dd") {
                        self.pop_until_any_inclusive(&["dd"]);
                    }
                    if self.has_in_definition_scope("dt") {
                        self.pop_until_any_inclusive(&["dt"]);
                    }
                } else {
                    if self.has_in_definition_scope("dt") {
                        self.pop_until_any_inclusive(&["dt"]);
                    }
                    if self.has_in_definition_scope("dd") {
                        self.pop_until_any_inclusive(&["dd"]);
                    }
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "plaintext" | "xmp" => {
                self.close_p_element();
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.frameset_ok = false;
                if name == "plaintext" {
                    self.tokenizer_state_override = Some(SinkResult::Plaintext);
                } else {
                    self.original_mode = Some(self.mode);
                    self.mode = InsertionMode::Text;
                }
                None
            }
            "button" => {
                if self.has_in_scope("button") {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    self.close_element_by_name("button");
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.frameset_ok = false;
                None
            }
            "a" => self.handle_body_start_a(&name, attrs),
            "b" | "big" | "code" | "em" | "font" | "i" | "nobr" | "s" | "small" | "strike"
            | "strong" | "tt" | "u" => self.handle_body_start_formatting(&name, attrs),
            "applet" | "marquee" | "object" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.push_formatting_marker();
                self.frameset_ok = false;
                None
            }
            "table" => {
                // Quirks mode changes exactly one parser decision: no
                // implied </p> before a table.
                if self.quirks_mode != QuirksMode::Quirks {
                    self.close_p_element();
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.frameset_ok = false;
                self.mode = InsertionMode::InTable;
                None
            }
            "area" | "br" | "embed" | "img" | "keygen" | "wbr" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&name, attrs, Namespace::Html, false);
                self.frameset_ok = false;
                None
            }
            "input" => {
                let input_type = attrs.get("type").map(str::to_ascii_lowercase);
                self.insert_element(&name, attrs, Namespace::Html, false);
                if input_type.as_deref() != Some("hidden") {
                    self.frameset_ok = false;
                }
                None
            }
            "param" | "source" | "track" => {
                self.insert_element(&name, attrs, Namespace::Html, false);
                None
            }
            "hr" => {
                self.close_p_element();
                self.insert_element(&name, attrs, Namespace::Html, false);
                self.frameset_ok = false;
                None
            }
            // <image> is silently rewritten to <img>.
            "image" => {
                self.parse_error("image-start-tag", Some(&name));
                self.reconstruct_active_formatting_elements();
                self.insert_element("img", attrs, Namespace::Html, false);
                self.frameset_ok = false;
                None
            }
            "textarea" => {
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.ignore_lf = true;
                self.frameset_ok = false;
                None
            }
            "select" => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.frameset_ok = false;
                self.reset_insertion_mode();
                None
            }
            "option" | "optgroup" => {
                if self
                    .open_elements
                    .last()
                    .is_some_and(|&node| self.element_name_of(node) == "option")
                {
                    self.open_elements.pop();
                }
                self.reconstruct_active_formatting_elements();
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "rp" | "rt" => {
                self.generate_implied_end_tags(Some("rtc"));
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "rb" | "rtc" => {
                if self.open_elements.last().is_some_and(|&node| {
                    matches!(self.element_name_of(node), "rb" | "rp" | "rt" | "rtc")
                }) {
                    self.generate_implied_end_tags(None);
                }
                self.insert_element(&name, attrs, Namespace::Html, true);
                None
            }
            "math" => {
                self.reconstruct_active_formatting_elements();
                let attrs = Self::prepare_foreign_attributes(Namespace::MathMl, &attrs);
                self.insert_element(&name, attrs, Namespace::MathMl, !self_closing);
                None
            }
            "svg" => {
                self.reconstruct_active_formatting_elements();
                let adjusted_name = super::foreign_content::adjust_svg_tag_name(&name).to_string();
                let attrs = Self::prepare_foreign_attributes(Namespace::Svg, &attrs);
                self.insert_element(&adjusted_name, attrs, Namespace::Svg, !self_closing);
                None
            }
            "caption" => {
                self.parse_error("unexpected-start-tag", Some(&name));
                None
            }
            "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead" | "tr" => {
                self.parse_error("unexpected-start-tag-ignored", Some(&name));
                None
            }
            "col" | "frame" => {
                // Only meaningful in fragment parsing contexts.
                if self.fragment_context.is_none() {
                    self.parse_error("unexpected-start-tag-ignored", Some(&name));
                    return None;
                }
                self.insert_element(&name, attrs, Namespace::Html, false);
                None
            }
            "head" => {
                self.parse_error("unexpected-start-tag", Some(&name));
                None
            }
            _ => {
                self.reconstruct_active_formatting_elements();
                self.insert_element(&name, attrs, Namespace::Html, true);
                if self_closing {
                    self.parse_error(
                        "non-void-html-element-start-tag-with-trailing-solidus",
                        Some(&name),
                    );
                }
                self.frameset_ok = false;
                None
            }
        }
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    /// "A start tag whose tag name is 'a'": an open `a` is misnested, run
    /// the adoption agency before inserting the new one.
    fn handle_body_start_a(&mut self, name: &str, attrs: AttrList) -> ModeResult {
        if self.has_active_formatting_entry("a") {
            self.adoption_agency("a");
            self.remove_last_active_formatting_by_name("a");
            self.remove_last_open_element_by_name("a");
        }
        self.reconstruct_active_formatting_elements();
        let node = self.insert_element(name, attrs.iter().cloned().collect(), Namespace::Html, true);
        self.append_active_formatting_entry("a", &attrs, node);
        None
    }

    fn handle_body_start_formatting(&mut self, name: &str, attrs: AttrList) -> ModeResult {
        if name == "nobr" && self.has_in_scope("nobr") {
            self.adoption_agency("nobr");
            self.remove_last_active_formatting_by_name("nobr");
            self.remove_last_open_element_by_name("nobr");
        }
        self.reconstruct_active_formatting_elements();
        // Noah's Ark: at most three identical entries between markers.
        if let Some(duplicate_index) = self.find_active_formatting_duplicate(name, &attrs) {
            self.active_formatting.remove(duplicate_index);
        }
        let node = self.insert_element(name, attrs.iter().cloned().collect(), Namespace::Html, true);
        self.append_active_formatting_entry(name, &attrs, node);
        None
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    /// A `<frameset>` is only honored while frameset-ok holds; the body is
    /// detached and replaced.
    fn handle_body_start_frameset(&mut self, name: &str, attrs: AttrList) -> ModeResult {
        if !self.frameset_ok {
            self.parse_error("unexpected-start-tag-ignored", Some(name));
            return None;
        }
        let Some(body_index) = self
            .open_elements
            .iter()
            .position(|&node| self.element_name_of(node) == "body")
        else {
            self.parse_error("unexpected-start-tag-ignored", Some(name));
            return None;
        };
        let body = self.open_elements[body_index];
        self.tree.detach(body);
        self.open_elements.truncate(body_index);
        self.insert_element(name, attrs, Namespace::Html, true);
        self.mode = InsertionMode::InFrameset;
        None
    }

    /// In-body end tag dispatch.
    fn handle_body_end_tag(&mut self, name: &str) -> ModeResult {
        match name {
            // </br> is treated as a <br> start tag.
            "br" => {
                self.parse_error("unexpected-end-tag", Some(name));
                self.handle_body_start_tag("br".to_string(), AttrList::new(), false)
            }
            _ if FORMATTING_ELEMENTS.contains(&name) => {
                self.adoption_agency(name);
                None
            }
            "body" => {
                if self.has_in_scope("body") {
                    self.mode = InsertionMode::AfterBody;
                }
                None
            }
            "html" => {
                if self.has_in_scope("body") {
                    return Some(Reprocess::new(
                        InsertionMode::AfterBody,
                        Token::EndTag {
                            name: name.to_string(),
                            attrs: AttrList::new(),
                        },
                    ));
                }
                None
            }
            "p" => {
                if !self.close_p_element() {
                    self.parse_error("unexpected-end-tag", Some(name));
                    self.insert_phantom("p");
                    self.close_p_element();
                }
                None
            }
            "li" => {
                if self.has_in_list_item_scope("li") {
                    self.pop_until_any_inclusive(&["li"]);
                } else {
                    self.parse_error("unexpected-end-tag", Some(name));
                }
                None
            }
            "dd" | "dt" => {
                if self.has_in_definition_scope(name) {
                    self.pop_until_any_inclusive(&["dd", "dt"]);
                } else {
                    self.parse_error("unexpected-end-tag", Some(name));
                }
                None
            }
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if !self.has_any_in_scope(HEADING_ELEMENTS) {
                    self.parse_error("unexpected-end-tag", Some(name));
                    return None;
                }
                self.generate_implied_end_tags(None);
                if self
                    .open_elements
                    .last()
                    .is_some_and(|&node| self.element_name_of(node) != name)
                {
                    self.parse_error("end-tag-too-early", Some(name));
                }
                while let Some(node) = self.open_elements.pop() {
                    if HEADING_ELEMENTS.contains(&self.element_name_of(node)) {
                        break;
                    }
                }
                None
            }
            "applet" | "marquee" | "object" => {
                if !self.has_in_scope(name) {
                    self.parse_error("unexpected-end-tag", Some(name));
                    return None;
                }
                self.pop_until_inclusive(name);
                self.clear_active_formatting_up_to_marker();
                None
            }
            "form" => {
                let Some(form) = self.form_element else {
                    self.parse_error("unexpected-end-tag", Some(name));
                    return None;
                };
                let removed = self.remove_from_open_elements(form);
                self.form_element = None;
                if !removed {
                    self.parse_error("unexpected-end-tag", Some(name));
                }
                None
            }
            "template" => {
                let has_template = self
                    .open_elements
                    .iter()
                    .any(|&node| self.element_name_of(node) == "template");
                if !has_template {
                    return None;
                }
                self.generate_implied_end_tags(None);
                self.pop_until_inclusive("template");
                self.clear_active_formatting_up_to_marker();
                self.template_modes.pop();
                self.reset_insertion_mode();
                None
            }
            "address" | "article" | "aside" | "blockquote" | "button" | "center" | "details"
            | "dialog" | "dir" | "div" | "dl" | "fieldset" | "figcaption" | "figure" | "footer"
            | "header" | "hgroup" | "listing" | "main" | "menu" | "nav" | "ol" | "pre"
            | "search" | "section" | "summary" | "table" | "ul" => {
                if !self.has_in_scope(name) {
                    self.parse_error("unexpected-end-tag", Some(name));
                    return None;
                }
                self.generate_implied_end_tags(None);
                if self
                    .open_elements
                    .last()
                    .is_some_and(|&node| self.element_name_of(node) != name)
                {
                    self.parse_error("end-tag-too-early", Some(name));
                }
                self.pop_until_any_inclusive(&[name]);
                None
            }
            _ => {
                self.any_other_end_tag(name);
                None
            }
        }
    }

    // ---------------------
    // After body
    // ---------------------

    /// [§ 13.2.6.4.19 The "after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    fn mode_after_body(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                if is_all_whitespace(&data) {
                    // Whitespace is processed using the in-body rules, but
                    // the mode stays AfterBody.
                    self.mode_in_body(Token::Characters { data });
                    return None;
                }
                Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                // "Insert a comment as the last child of the first element
                // in the stack of open elements (the html element)."
                let html = self.open_elements[0];
                self.append_comment(&data, Some(html));
                None
            }
            Token::StartTag { name, attrs, self_closing } if name == "html" => Some(
                Reprocess::new(InsertionMode::InBody, Token::StartTag { name, attrs, self_closing }),
            ),
            Token::EndTag { name, .. } if name == "html" => {
                self.mode = InsertionMode::AfterAfterBody;
                None
            }
            Token::EndOfFile => None,
            other => Some(Reprocess::new(InsertionMode::InBody, other)),
        }
    }

    /// [§ 13.2.6.4.22 The "after after body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    fn mode_after_after_body(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                if is_all_whitespace(&data) {
                    self.mode_in_body(Token::Characters { data });
                    return None;
                }
                self.parse_error("unexpected-char-after-body", None);
                Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                if self.fragment_context.is_some() {
                    let html = self.find_last_on_stack("html");
                    self.append_comment(&data, html);
                } else {
                    self.append_comment_to_document(&data);
                }
                None
            }
            Token::StartTag { name, attrs, self_closing } if name == "html" => Some(
                Reprocess::new(InsertionMode::InBody, Token::StartTag { name, attrs, self_closing }),
            ),
            Token::EndOfFile => None,
            other => {
                self.parse_error("unexpected-token-after-body", None);
                Some(Reprocess::new(InsertionMode::InBody, other))
            }
        }
    }

    // ---------------------
    // Tables
    // ---------------------

    /// [§ 13.2.6.4.9 The "in table" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    #[allow(clippy::too_many_lines)]
    fn mode_in_table(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                let mut data = data;
                if data.contains('\0') {
                    self.parse_error("unexpected-null-character", None);
                    data = data.replace('\0', "");
                    if data.is_empty() {
                        return None;
                    }
                }
                self.pending_table_text.clear();
                self.table_text_original_mode = Some(self.mode);
                self.mode = InsertionMode::InTableText;
                Some(Reprocess::new(
                    InsertionMode::InTableText,
                    Token::Characters { data },
                ))
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "caption" => {
                    self.clear_stack_until(&["table", "template", "html"]);
                    self.push_formatting_marker();
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InCaption;
                    None
                }
                "colgroup" => {
                    self.clear_stack_until(&["table", "template", "html"]);
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InColumnGroup;
                    None
                }
                "col" => {
                    self.clear_stack_until(&["table", "template", "html"]);
                    self.insert_phantom("colgroup");
                    self.mode = InsertionMode::InColumnGroup;
                    Some(Reprocess::new(
                        InsertionMode::InColumnGroup,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "tbody" | "tfoot" | "thead" => {
                    self.clear_stack_until(&["table", "template", "html"]);
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InTableBody;
                    None
                }
                "td" | "th" | "tr" => {
                    self.clear_stack_until(&["table", "template", "html"]);
                    self.insert_phantom("tbody");
                    self.mode = InsertionMode::InTableBody;
                    Some(Reprocess::new(
                        InsertionMode::InTableBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "table" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    if self.close_table_element() {
                        return Some(Reprocess::new(
                            self.mode,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    None
                }
                // style and script are inserted directly into the table.
                "style" | "script" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.original_mode = Some(self.mode);
                    self.mode = InsertionMode::Text;
                    None
                }
                "template" => self.mode_in_head(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                "input"
                    if attrs.get("type").map(str::to_ascii_lowercase).as_deref()
                        == Some("hidden") =>
                {
                    // A hidden input is inserted in place and popped
                    // immediately.
                    self.parse_error("unexpected-hidden-input-in-table", None);
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.open_elements.pop();
                    None
                }
                "form" => {
                    // A stray form records the pointer but is not pushed.
                    self.parse_error("unexpected-form-in-table", None);
                    if self.form_element.is_none() {
                        let node = self.insert_element(&name, attrs, Namespace::Html, true);
                        self.form_element = Some(node);
                        self.open_elements.pop();
                    }
                    None
                }
                _ => {
                    self.parse_error("unexpected-start-tag-implies-table-voodoo", Some(&name));
                    let previous = self.insert_from_table;
                    self.insert_from_table = true;
                    let result = self.mode_in_body(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "table" => {
                    self.close_table_element();
                    None
                }
                "body" | "caption" | "col" | "colgroup" | "html" | "tbody" | "td" | "tfoot"
                | "th" | "thead" | "tr" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                _ => {
                    self.parse_error("unexpected-end-tag-implies-table-voodoo", Some(&name));
                    let previous = self.insert_from_table;
                    self.insert_from_table = true;
                    let result = self.mode_in_body(Token::EndTag { name, attrs });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndOfFile => {
                if !self.template_modes.is_empty() {
                    return self.mode_in_template(Token::EndOfFile);
                }
                if self.has_in_table_scope("table") {
                    self.parse_error("expected-closing-tag-but-got-eof", Some("table"));
                }
                None
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.10 The "in table text" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    fn mode_in_table_text(&mut self, token: Token) -> ModeResult {
        if let Token::Characters { data } = token {
            let mut data = data;
            if data.contains('\x0C') {
                self.parse_error("invalid-codepoint-in-table-text", None);
                data = data.replace('\x0C', "");
            }
            if !data.is_empty() {
                self.pending_table_text.push(data);
            }
            return None;
        }
        self.flush_pending_table_text();
        let original = self
            .table_text_original_mode
            .take()
            .unwrap_or(InsertionMode::InTable);
        self.mode = original;
        Some(Reprocess::new(original, token))
    }

    /// [§ 13.2.6.4.11 The "in caption" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    fn mode_in_caption(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { .. } => self.mode_in_body(token),
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr" | "td"
                | "th" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    if self.close_caption_element() {
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    // Fragment parsing with a caption context: no caption on
                    // the stack, ignore table structure tags.
                    None
                }
                "table" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    if self.close_caption_element() {
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    self.mode_in_body(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    })
                }
                _ => self.mode_in_body(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "caption" => {
                    self.close_caption_element();
                    None
                }
                "table" => {
                    if self.close_caption_element() {
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::EndTag { name, attrs },
                        ));
                    }
                    None
                }
                "tbody" | "tfoot" | "thead" => {
                    // Never in table scope while a caption is open.
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                _ => self.mode_in_body(Token::EndTag { name, attrs }),
            },
            Token::EndOfFile => self.mode_in_body(Token::EndOfFile),
            Token::Doctype(_) => None,
        }
    }

    fn close_caption_element(&mut self) -> bool {
        if !self.has_in_table_scope("caption") {
            self.parse_error("unexpected-end-tag", Some("caption"));
            return false;
        }
        self.generate_implied_end_tags(None);
        self.pop_until_inclusive("caption");
        self.clear_active_formatting_up_to_marker();
        self.mode = InsertionMode::InTable;
        true
    }

    /// [§ 13.2.6.4.12 The "in column group" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolgroup)
    #[allow(clippy::too_many_lines)]
    fn mode_in_column_group(&mut self, token: Token) -> ModeResult {
        let current = self.open_elements.last().copied();
        let current_name = current.map(|node| self.element_name_of(node).to_string());
        match token {
            Token::Characters { data } => {
                let stripped = data.trim_start_matches([' ', '\t', '\n', '\r', '\x0C']);

                if stripped.len() < data.len() {
                    let ws = data[..data.len() - stripped.len()].to_string();
                    self.append_text(&ws);
                }

                let non_ws = stripped.to_string();
                if non_ws.is_empty() {
                    return None;
                }
                if current_name.as_deref() == Some("html") {
                    // Fragment parsing with a colgroup context drops
                    // non-whitespace characters.
                    self.parse_error("unexpected-characters-in-column-group", None);
                    return None;
                }
                if current_name.as_deref() == Some("template") {
                    self.parse_error("unexpected-characters-in-template-column-group", None);
                    return None;
                }
                self.parse_error("unexpected-characters-in-column-group", None);
                self.pop_current();
                self.mode = InsertionMode::InTable;
                Some(Reprocess::new(
                    InsertionMode::InTable,
                    Token::Characters { data: non_ws },
                ))
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => self.mode_in_body(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                "col" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.open_elements.pop();
                    None
                }
                "template" => self.mode_in_head(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                "colgroup" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    if current_name.as_deref() == Some("colgroup") {
                        self.pop_current();
                        self.mode = InsertionMode::InTable;
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    None
                }
                _ => {
                    if self
                        .fragment_context
                        .as_ref()
                        .is_some_and(|ctx| ctx.tag_name.eq_ignore_ascii_case("colgroup"))
                        && !self.has_in_table_scope("table")
                    {
                        self.parse_error("unexpected-start-tag-in-column-group", Some(&name));
                        return None;
                    }
                    if current_name.as_deref() == Some("colgroup") {
                        self.pop_current();
                        self.mode = InsertionMode::InTable;
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    // In a template column group, non-column content is
                    // ignored.
                    self.parse_error("unexpected-start-tag-in-template-column-group", Some(&name));
                    None
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "colgroup" => {
                    if current_name.as_deref() == Some("colgroup") {
                        self.pop_current();
                        self.mode = InsertionMode::InTable;
                    } else {
                        self.parse_error("unexpected-end-tag", Some(&name));
                    }
                    None
                }
                "col" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                "template" => self.mode_in_head(Token::EndTag { name, attrs }),
                _ => {
                    if current_name.as_deref() != Some("html") {
                        self.pop_current();
                        self.mode = InsertionMode::InTable;
                    }
                    Some(Reprocess::new(
                        InsertionMode::InTable,
                        Token::EndTag { name, attrs },
                    ))
                }
            },
            Token::EndOfFile => {
                if current_name.as_deref() == Some("colgroup") {
                    self.pop_current();
                    self.mode = InsertionMode::InTable;
                    return Some(Reprocess::new(InsertionMode::InTable, Token::EndOfFile));
                }
                if current_name.as_deref() == Some("template") {
                    return self.mode_in_template(Token::EndOfFile);
                }
                None
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.13 The "in table body" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    fn mode_in_table_body(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { .. } | Token::Comment { .. } => self.mode_in_table(token),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "tr" => {
                    self.clear_stack_until(&["tbody", "tfoot", "thead", "template", "html"]);
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.mode = InsertionMode::InRow;
                    None
                }
                "td" | "th" => {
                    self.parse_error("unexpected-cell-in-table-body", None);
                    self.clear_stack_until(&["tbody", "tfoot", "thead", "template", "html"]);
                    self.insert_phantom("tr");
                    self.mode = InsertionMode::InRow;
                    Some(Reprocess::new(
                        InsertionMode::InRow,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "table" => {
                    let current_name = self
                        .open_elements
                        .last()
                        .map(|&node| self.element_name_of(node).to_string());
                    // In a template these tags would create invalid
                    // structure.
                    if current_name.as_deref() == Some("template") {
                        self.parse_error(
                            "unexpected-start-tag-in-template-table-context",
                            Some(&name),
                        );
                        return None;
                    }
                    // Fragment parsing with a tbody/tfoot/thead context and
                    // no section on the stack: ignore.
                    if self.fragment_context.as_ref().is_some_and(|ctx| {
                        matches!(
                            ctx.tag_name.to_ascii_lowercase().as_str(),
                            "tbody" | "tfoot" | "thead"
                        )
                    }) && current_name.as_deref() == Some("html")
                    {
                        self.parse_error("unexpected-start-tag", None);
                        return None;
                    }
                    if !self.open_elements.is_empty() {
                        self.open_elements.pop();
                        self.mode = InsertionMode::InTable;
                        return Some(Reprocess::new(
                            InsertionMode::InTable,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    self.mode = InsertionMode::InTable;
                    None
                }
                _ => self.mode_in_table(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "tbody" | "tfoot" | "thead" => {
                    if !self.has_in_table_scope(&name) {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    self.clear_stack_until(&["tbody", "tfoot", "thead", "template", "html"]);
                    self.pop_current();
                    self.mode = InsertionMode::InTable;
                    None
                }
                "table" => {
                    let current_name = self
                        .open_elements
                        .last()
                        .map(|&node| self.element_name_of(node).to_string());
                    if current_name.as_deref() == Some("template") {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    if self.fragment_context.as_ref().is_some_and(|ctx| {
                        matches!(
                            ctx.tag_name.to_ascii_lowercase().as_str(),
                            "tbody" | "tfoot" | "thead"
                        )
                    }) && current_name.as_deref() == Some("html")
                    {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    if matches!(current_name.as_deref(), Some("tbody" | "tfoot" | "thead")) {
                        self.open_elements.pop();
                    }
                    self.mode = InsertionMode::InTable;
                    Some(Reprocess::new(
                        InsertionMode::InTable,
                        Token::EndTag { name, attrs },
                    ))
                }
                "caption" | "col" | "colgroup" | "td" | "th" | "tr" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                _ => self.mode_in_table(Token::EndTag { name, attrs }),
            },
            Token::EndOfFile => self.mode_in_table(Token::EndOfFile),
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.14 The "in row" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    fn mode_in_row(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { .. } | Token::Comment { .. } => self.mode_in_table(token),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "td" | "th" => {
                    self.clear_stack_until(&["tr", "template", "html"]);
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.push_formatting_marker();
                    self.mode = InsertionMode::InCell;
                    None
                }
                "caption" | "col" | "colgroup" | "tbody" | "tfoot" | "thead" | "tr" | "table" => {
                    if !self.has_in_table_scope("tr") {
                        self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                        return None;
                    }
                    self.end_tr_element();
                    Some(Reprocess::new(
                        self.mode,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                _ => {
                    let previous = self.insert_from_table;
                    self.insert_from_table = true;
                    let result = self.mode_in_body(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "tr" => {
                    if !self.has_in_table_scope("tr") {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    self.end_tr_element();
                    None
                }
                "table" | "tbody" | "tfoot" | "thead" => {
                    if self.has_in_table_scope(&name) {
                        self.end_tr_element();
                        return Some(Reprocess::new(self.mode, Token::EndTag { name, attrs }));
                    }
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                "caption" | "col" | "colgroup" | "td" | "th" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
                _ => {
                    let previous = self.insert_from_table;
                    self.insert_from_table = true;
                    let result = self.mode_in_body(Token::EndTag { name, attrs });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndOfFile => self.mode_in_table(Token::EndOfFile),
            Token::Doctype(_) => None,
        }
    }

    fn end_tr_element(&mut self) {
        self.clear_stack_until(&["tr", "template", "html"]);
        if self
            .open_elements
            .last()
            .is_some_and(|&node| self.element_name_of(node) == "tr")
        {
            self.open_elements.pop();
        }
        // Inside a template, restore the template mode instead.
        if let Some(&mode) = self.template_modes.last() {
            self.mode = mode;
        } else {
            self.mode = InsertionMode::InTableBody;
        }
    }

    /// [§ 13.2.6.4.15 The "in cell" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    fn mode_in_cell(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { .. } => {
                let previous = self.insert_from_table;
                self.insert_from_table = false;
                let result = self.mode_in_body(token);
                self.insert_from_table = previous;
                result
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                | "tr" => {
                    if self.close_table_cell() {
                        return Some(Reprocess::new(
                            self.mode,
                            Token::StartTag {
                                name,
                                attrs,
                                self_closing,
                            },
                        ));
                    }
                    // Fragment parsing with a td/th context element and no
                    // table structure.
                    self.parse_error("unexpected-start-tag-in-cell-fragment", Some(&name));
                    None
                }
                _ => {
                    let previous = self.insert_from_table;
                    self.insert_from_table = false;
                    let result = self.mode_in_body(Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "td" | "th" => {
                    if !self.has_in_table_scope(&name) {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    self.end_table_cell(&name);
                    None
                }
                "table" | "tbody" | "tfoot" | "thead" | "tr" => {
                    if !self.has_in_table_scope(&name) {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    self.close_table_cell();
                    Some(Reprocess::new(self.mode, Token::EndTag { name, attrs }))
                }
                _ => {
                    let previous = self.insert_from_table;
                    self.insert_from_table = false;
                    let result = self.mode_in_body(Token::EndTag { name, attrs });
                    self.insert_from_table = previous;
                    result
                }
            },
            Token::EndOfFile => {
                if self.close_table_cell() {
                    return Some(Reprocess::new(self.mode, Token::EndOfFile));
                }
                self.mode_in_table(Token::EndOfFile)
            }
            Token::Doctype(_) => None,
        }
    }

    // ---------------------
    // Select
    // ---------------------

    /// [§ 13.2.6.4.16 The "in select" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    ///
    /// Beyond the classic select content model, a curated set of elements
    /// (paragraphs, divs, buttons, formatting, `selectedcontent`...) is
    /// permitted as HTML content.
    #[allow(clippy::too_many_lines)]
    fn mode_in_select(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                let mut data = data;
                if data.contains('\0') {
                    self.parse_error("invalid-codepoint-in-select", None);
                    data = data.replace('\0', "");
                }
                if data.contains('\x0C') {
                    self.parse_error("invalid-codepoint-in-select", None);
                    data = data.replace('\x0C', "");
                }
                if !data.is_empty() {
                    self.reconstruct_active_formatting_elements();
                    self.append_text(&data);
                }
                None
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    },
                )),
                "option" => {
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "option")
                    {
                        self.open_elements.pop();
                    }
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    None
                }
                "optgroup" => {
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "option")
                    {
                        self.open_elements.pop();
                    }
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "optgroup")
                    {
                        self.open_elements.pop();
                    }
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    None
                }
                "select" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    self.pop_until_any_inclusive(&["select"]);
                    self.reset_insertion_mode();
                    None
                }
                "input" | "textarea" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    self.pop_until_any_inclusive(&["select"]);
                    self.reset_insertion_mode();
                    Some(Reprocess::new(
                        self.mode,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "keygen" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, false);
                    None
                }
                "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                | "tr" | "table" => {
                    self.parse_error("unexpected-start-tag-implies-end-tag", Some(&name));
                    self.pop_until_any_inclusive(&["select"]);
                    self.reset_insertion_mode();
                    Some(Reprocess::new(
                        self.mode,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "script" | "template" => self.mode_in_head(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                "svg" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Svg, !self_closing);
                    None
                }
                "math" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::MathMl, !self_closing);
                    None
                }
                _ if FORMATTING_ELEMENTS.contains(&name.as_str()) => {
                    self.reconstruct_active_formatting_elements();
                    let node = self.insert_element(
                        &name,
                        attrs.iter().cloned().collect(),
                        Namespace::Html,
                        true,
                    );
                    self.append_active_formatting_entry(&name, &attrs, node);
                    None
                }
                "hr" => {
                    // hr becomes a sibling: pop any open option/optgroup
                    // first.
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "option")
                    {
                        self.open_elements.pop();
                    }
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "optgroup")
                    {
                        self.open_elements.pop();
                    }
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, false);
                    None
                }
                "menuitem" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    None
                }
                "p" | "div" | "span" | "button" | "datalist" | "selectedcontent" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, !self_closing);
                    None
                }
                "br" | "img" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, false);
                    None
                }
                "plaintext" => {
                    self.reconstruct_active_formatting_elements();
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    None
                }
                _ => None,
            },
            Token::EndTag { name, attrs } => match name.as_str() {
                "optgroup" => {
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "option")
                    {
                        self.open_elements.pop();
                    }
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "optgroup")
                    {
                        self.open_elements.pop();
                    } else {
                        self.parse_error("unexpected-end-tag", Some(&name));
                    }
                    None
                }
                "option" => {
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "option")
                    {
                        self.open_elements.pop();
                    } else {
                        self.parse_error("unexpected-end-tag", Some(&name));
                    }
                    None
                }
                "select" => {
                    self.pop_until_any_inclusive(&["select"]);
                    self.reset_insertion_mode();
                    None
                }
                _ if name == "a" || FORMATTING_ELEMENTS.contains(&name.as_str()) => {
                    // Do not let the adoption agency reach formatting
                    // elements opened outside the select.
                    let select_node = self.find_last_on_stack("select");
                    if let Some(fmt_index) = self.find_active_formatting_index(&name) {
                        let target = match &self.active_formatting[fmt_index] {
                            FormattingEntry::Element { node, .. } => Some(*node),
                            FormattingEntry::Marker => None,
                        };
                        if let (Some(select_node), Some(target)) = (select_node, target) {
                            let select_index =
                                self.open_elements.iter().position(|&n| n == select_node);
                            let target_index =
                                self.open_elements.iter().position(|&n| n == target);
                            if let (Some(select_index), Some(target_index)) =
                                (select_index, target_index)
                            {
                                if target_index < select_index {
                                    self.parse_error("unexpected-end-tag", Some(&name));
                                    return None;
                                }
                            }
                        }
                    }
                    self.adoption_agency(&name);
                    None
                }
                "p" | "div" | "span" | "button" | "datalist" | "selectedcontent" => {
                    // Close the element only when it lives inside the
                    // select; never pop across the select boundary.
                    let mut select_idx = None;
                    let mut target_idx = None;
                    for (index, &node) in self.open_elements.iter().enumerate() {
                        let node_name = self.element_name_of(node);
                        if node_name == "select" && select_idx.is_none() {
                            select_idx = Some(index);
                        }
                        if node_name == name {
                            target_idx = Some(index);
                        }
                    }
                    match (target_idx, select_idx) {
                        (Some(target), select) if select.is_none_or(|s| target > s) => {
                            while let Some(node) = self.open_elements.pop() {
                                if self.element_name_of(node) == name {
                                    break;
                                }
                            }
                        }
                        _ => self.parse_error("unexpected-end-tag", Some(&name)),
                    }
                    None
                }
                "caption" | "col" | "colgroup" | "tbody" | "td" | "tfoot" | "th" | "thead"
                | "tr" | "table" => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    self.pop_until_any_inclusive(&["select"]);
                    self.reset_insertion_mode();
                    Some(Reprocess::new(self.mode, Token::EndTag { name, attrs }))
                }
                _ => {
                    self.parse_error("unexpected-end-tag", Some(&name));
                    None
                }
            },
            Token::EndOfFile => self.mode_in_body(Token::EndOfFile),
            Token::Doctype(_) => None,
        }
    }

    // ---------------------
    // Templates
    // ---------------------

    /// [§ 13.2.6.4.18 The "in template" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    fn mode_in_template(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { .. } | Token::Comment { .. } => self.mode_in_body(token),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "caption" | "colgroup" | "tbody" | "tfoot" | "thead" => {
                    self.template_modes.pop();
                    self.template_modes.push(InsertionMode::InTable);
                    self.mode = InsertionMode::InTable;
                    Some(Reprocess::new(
                        InsertionMode::InTable,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "col" => {
                    self.template_modes.pop();
                    self.template_modes.push(InsertionMode::InColumnGroup);
                    self.mode = InsertionMode::InColumnGroup;
                    Some(Reprocess::new(
                        InsertionMode::InColumnGroup,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "tr" => {
                    self.template_modes.pop();
                    self.template_modes.push(InsertionMode::InTableBody);
                    self.mode = InsertionMode::InTableBody;
                    Some(Reprocess::new(
                        InsertionMode::InTableBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "td" | "th" => {
                    self.template_modes.pop();
                    self.template_modes.push(InsertionMode::InRow);
                    self.mode = InsertionMode::InRow;
                    Some(Reprocess::new(
                        InsertionMode::InRow,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
                "base" | "basefont" | "bgsound" | "link" | "meta" | "noframes" | "script"
                | "style" | "template" | "title" => self.mode_in_head(Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                }),
                _ => {
                    self.template_modes.pop();
                    self.template_modes.push(InsertionMode::InBody);
                    self.mode = InsertionMode::InBody;
                    Some(Reprocess::new(
                        InsertionMode::InBody,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
            },
            Token::EndTag { name, attrs } => {
                if name == "template" {
                    return self.mode_in_head(Token::EndTag { name, attrs });
                }
                None
            }
            Token::EndOfFile => {
                let has_template = self
                    .open_elements
                    .iter()
                    .any(|&node| self.element_name_of(node) == "template");
                if !has_template {
                    return None;
                }
                self.parse_error("expected-closing-tag-but-got-eof", Some("template"));
                self.pop_until_inclusive("template");
                self.clear_active_formatting_up_to_marker();
                self.template_modes.pop();
                self.reset_insertion_mode();
                Some(Reprocess::new(self.mode, Token::EndOfFile))
            }
            Token::Doctype(_) => None,
        }
    }

    // ---------------------
    // Framesets
    // ---------------------

    /// [§ 13.2.6.4.20 The "in frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    fn mode_in_frameset(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                // Only whitespace characters are kept.
                let whitespace: String = data
                    .chars()
                    .filter(|c| matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
                    .collect();
                if !whitespace.is_empty() {
                    self.append_text(&whitespace);
                }
                None
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    },
                )),
                "frameset" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    None
                }
                "frame" => {
                    self.insert_element(&name, attrs, Namespace::Html, false);
                    None
                }
                "noframes" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.original_mode = Some(self.mode);
                    self.mode = InsertionMode::Text;
                    None
                }
                _ => {
                    self.parse_error("unexpected-token-in-frameset", None);
                    None
                }
            },
            Token::EndTag { name, .. } => {
                if name == "frameset" {
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) == "html")
                    {
                        self.parse_error("unexpected-end-tag", Some(&name));
                        return None;
                    }
                    self.open_elements.pop();
                    if self
                        .open_elements
                        .last()
                        .is_some_and(|&node| self.element_name_of(node) != "frameset")
                    {
                        self.mode = InsertionMode::AfterFrameset;
                    }
                    return None;
                }
                self.parse_error("unexpected-token-in-frameset", None);
                None
            }
            Token::EndOfFile => {
                if let Some(&node) = self.open_elements.last() {
                    if self.element_name_of(node) != "html" {
                        let name = self.element_name_of(node).to_string();
                        self.parse_error("expected-closing-tag-but-got-eof", Some(&name));
                    }
                }
                None
            }
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.21 The "after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    fn mode_after_frameset(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } => {
                let whitespace: String = data
                    .chars()
                    .filter(|c| matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
                    .collect();
                if !whitespace.is_empty() {
                    self.append_text(&whitespace);
                }
                None
            }
            Token::Comment { data } => {
                self.append_comment(&data, None);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } => match name.as_str() {
                "html" => Some(Reprocess::new(
                    InsertionMode::InBody,
                    Token::StartTag {
                        name,
                        attrs,
                        self_closing,
                    },
                )),
                "noframes" => {
                    self.insert_element(&name, attrs, Namespace::Html, true);
                    self.original_mode = Some(self.mode);
                    self.mode = InsertionMode::Text;
                    None
                }
                _ => {
                    self.parse_error("unexpected-token-after-frameset", None);
                    self.mode = InsertionMode::InFrameset;
                    Some(Reprocess::new(
                        InsertionMode::InFrameset,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ))
                }
            },
            Token::EndTag { name, attrs } => {
                if name == "html" {
                    self.mode = InsertionMode::AfterAfterFrameset;
                    return None;
                }
                self.parse_error("unexpected-token-after-frameset", None);
                self.mode = InsertionMode::InFrameset;
                Some(Reprocess::new(
                    InsertionMode::InFrameset,
                    Token::EndTag { name, attrs },
                ))
            }
            Token::EndOfFile => None,
            Token::Doctype(_) => None,
        }
    }

    /// [§ 13.2.6.4.23 The "after after frameset" insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    fn mode_after_after_frameset(&mut self, token: Token) -> ModeResult {
        match token {
            Token::Characters { data } if is_all_whitespace(&data) => {
                self.mode_in_body(Token::Characters { data });
                None
            }
            Token::Comment { data } => {
                self.append_comment_to_document(&data);
                None
            }
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } if name == "html" => Some(Reprocess::new(
                InsertionMode::InBody,
                Token::StartTag {
                    name,
                    attrs,
                    self_closing,
                },
            )),
            Token::StartTag {
                name,
                attrs,
                self_closing,
            } if name == "noframes" => {
                self.insert_element(&name, attrs, Namespace::Html, true);
                self.original_mode = Some(self.mode);
                self.mode = InsertionMode::Text;
                None
            }
            Token::EndOfFile => None,
            other => {
                self.parse_error("unexpected-token-after-after-frameset", None);
                self.mode = InsertionMode::InFrameset;
                Some(Reprocess::new(InsertionMode::InFrameset, other))
            }
        }
    }
}
