//! The HTML tree builder: shared state and construction primitives.
//!
//! [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
//!
//! The insertion-mode handlers themselves live in `modes.rs`; this file
//! holds the builder state, the token dispatcher, element insertion (with
//! foster parenting and template-content redirection), the scope predicates,
//! the active-formatting list, the adoption agency algorithm, and the
//! foreign-content algorithm.

use bilby_common::warning::warn_once;
use bilby_dom::{AttrList, DomTree, ElementData, Namespace, NodeId, NodeType};
use strum_macros::Display;

use super::foreign_content::{
    adjust_foreign_attributes, adjust_mathml_attributes, adjust_svg_attributes,
    adjust_svg_tag_name,
};
use super::quirks::QuirksMode;
use super::tag_sets::{
    BUTTON_SCOPE_TERMINATORS, DEFAULT_SCOPE_TERMINATORS, DEFINITION_SCOPE_TERMINATORS,
    FOREIGN_BREAKOUT_ELEMENTS, LIST_ITEM_SCOPE_TERMINATORS, MATHML_TEXT_INTEGRATION_POINTS,
    IMPLIED_END_TAGS, SPECIAL_ELEMENTS, SVG_HTML_INTEGRATION_POINTS, TABLE_ALLOWED_CHILDREN,
    TABLE_FOSTER_TARGETS, TABLE_SCOPE_TERMINATORS,
};
use crate::errors::{ParseError, generate_error_message};
use crate::tokenizer::{Position, SinkResult, Token, TokenSink};

/// [§ 13.2.4.1 The insertion mode](https://html.spec.whatwg.org/multipage/parsing.html#the-insertion-mode)
///
/// "The insertion mode is a state variable that controls the primary
/// operation of the tree construction stage."
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum InsertionMode {
    /// [§ 13.2.6.4.1](https://html.spec.whatwg.org/multipage/parsing.html#the-initial-insertion-mode)
    Initial,
    /// [§ 13.2.6.4.2](https://html.spec.whatwg.org/multipage/parsing.html#the-before-html-insertion-mode)
    BeforeHtml,
    /// [§ 13.2.6.4.3](https://html.spec.whatwg.org/multipage/parsing.html#the-before-head-insertion-mode)
    BeforeHead,
    /// [§ 13.2.6.4.4](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inhead)
    InHead,
    /// [§ 13.2.6.4.5](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inheadnoscript)
    InHeadNoscript,
    /// [§ 13.2.6.4.6](https://html.spec.whatwg.org/multipage/parsing.html#the-after-head-insertion-mode)
    AfterHead,
    /// [§ 13.2.6.4.8](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incdata)
    Text,
    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    InBody,
    /// [§ 13.2.6.4.19](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterbody)
    AfterBody,
    /// [§ 13.2.6.4.22](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-body-insertion-mode)
    AfterAfterBody,
    /// [§ 13.2.6.4.9](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    InTable,
    /// [§ 13.2.6.4.10](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intabletext)
    InTableText,
    /// [§ 13.2.6.4.11](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incaption)
    InCaption,
    /// [§ 13.2.6.4.12](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-incolgroup)
    InColumnGroup,
    /// [§ 13.2.6.4.13](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intbody)
    InTableBody,
    /// [§ 13.2.6.4.14](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intr)
    InRow,
    /// [§ 13.2.6.4.15](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intd)
    InCell,
    /// [§ 13.2.6.4.20](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inframeset)
    InFrameset,
    /// [§ 13.2.6.4.21](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-afterframeset)
    AfterFrameset,
    /// [§ 13.2.6.4.23](https://html.spec.whatwg.org/multipage/parsing.html#the-after-after-frameset-insertion-mode)
    AfterAfterFrameset,
    /// [§ 13.2.6.4.16](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inselect)
    InSelect,
    /// [§ 13.2.6.4.18](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intemplate)
    InTemplate,
}

/// Context for fragment parsing: the element the fragment is being parsed
/// inside of.
///
/// [§ 13.2.10 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
#[derive(Debug, Clone)]
pub struct FragmentContext {
    /// The context element's tag name.
    pub tag_name: String,
    /// The context element's namespace; `None` means HTML.
    pub namespace: Option<Namespace>,
}

impl FragmentContext {
    /// An HTML-namespace fragment context.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            namespace: None,
        }
    }

    /// A fragment context in the given namespace.
    #[must_use]
    pub fn with_namespace(tag_name: &str, namespace: Namespace) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            namespace: Some(namespace),
        }
    }

    fn is_html(&self) -> bool {
        matches!(self.namespace, None | Some(Namespace::Html))
    }
}

/// An entry in the list of active formatting elements.
///
/// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
///
/// "The list contains elements in the formatting category, and markers."
#[derive(Debug, Clone)]
pub(crate) enum FormattingEntry {
    /// "A marker is an entry... that is distinct from any element."
    /// Markers are pushed when entering applet, object, marquee, template,
    /// td, th, and caption elements.
    Marker,
    /// A formatting element entry; the attribute signature (sorted
    /// name/value pairs) backs the Noah's Ark clause.
    Element {
        name: String,
        attrs: AttrList,
        node: NodeId,
        signature: Vec<(String, String)>,
    },
}

/// A mode handler's request to reprocess the token in another mode.
/// `force_html` skips the foreign-content dispatch once after a breakout.
pub(crate) struct Reprocess {
    pub mode: InsertionMode,
    pub token: Token,
    pub force_html: bool,
}

impl Reprocess {
    pub(crate) fn new(mode: InsertionMode, token: Token) -> Self {
        Self {
            mode,
            token,
            force_html: false,
        }
    }

    pub(crate) fn forced(mode: InsertionMode, token: Token) -> Self {
        Self {
            mode,
            token,
            force_html: true,
        }
    }
}

/// `None` means the token was fully handled.
pub(crate) type ModeResult = Option<Reprocess>;

/// [§ 13.2.6 Tree construction](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction)
///
/// The tree builder consumes the token stream and constructs the document
/// tree in an arena.
pub struct TreeBuilder {
    /// The tree under construction.
    pub(crate) tree: DomTree,
    /// Parse errors recorded by the tree builder, in emission order.
    pub errors: Vec<ParseError>,

    pub(crate) mode: InsertionMode,
    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#original-insertion-mode)
    pub(crate) original_mode: Option<InsertionMode>,
    pub(crate) table_text_original_mode: Option<InsertionMode>,
    /// [§ 13.2.4.2 The stack of open elements](https://html.spec.whatwg.org/multipage/parsing.html#the-stack-of-open-elements)
    pub(crate) open_elements: Vec<NodeId>,
    /// [§ 13.2.4.4 The element pointers](https://html.spec.whatwg.org/multipage/parsing.html#the-element-pointers)
    pub(crate) head_element: Option<NodeId>,
    pub(crate) form_element: Option<NodeId>,
    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#the-list-of-active-formatting-elements)
    pub(crate) active_formatting: Vec<FormattingEntry>,
    /// "the frameset-ok flag"
    pub(crate) frameset_ok: bool,
    pub(crate) quirks_mode: QuirksMode,
    /// Drop the first newline of a pre/listing/textarea.
    pub(crate) ignore_lf: bool,
    /// Foster-parenting bit: set while a table mode delegates to in-body.
    pub(crate) insert_from_table: bool,
    /// [§ 13.2.6.4.9](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-intable)
    /// "the pending table character tokens list"
    pub(crate) pending_table_text: Vec<String>,
    /// [§ 13.2.4.1](https://html.spec.whatwg.org/multipage/parsing.html#stack-of-template-insertion-modes)
    pub(crate) template_modes: Vec<InsertionMode>,
    pub(crate) tokenizer_state_override: Option<SinkResult>,

    pub(crate) fragment_context: Option<FragmentContext>,
    pub(crate) fragment_context_element: Option<NodeId>,
    pub(crate) iframe_srcdoc: bool,
    pub(crate) collect_errors: bool,
    /// End position of the most recently delivered token.
    pub(crate) last_pos: Position,
}

impl TokenSink for TreeBuilder {
    fn process_token(&mut self, token: Token, pos: Position) -> SinkResult {
        self.last_pos = pos;
        self.dispatch(token)
    }

    /// Optimized path for character runs.
    fn process_characters(&mut self, data: String, pos: Position) -> SinkResult {
        self.last_pos = pos;

        let is_html_namespace = self
            .open_elements
            .last()
            .is_none_or(|&node| self.is_html_node(node));
        if !is_html_namespace {
            return self.dispatch(Token::Characters { data });
        }

        if self.mode == InsertionMode::InBody {
            let mut data = data;
            if data.contains('\0') {
                self.parse_error("invalid-codepoint", None);
                data = data.replace('\0', "");
            }
            if data.is_empty() {
                return SinkResult::Continue;
            }
            if is_all_whitespace(&data) {
                self.reconstruct_active_formatting_elements();
                self.append_text(&data);
                return SinkResult::Continue;
            }
            self.reconstruct_active_formatting_elements();
            self.frameset_ok = false;
            self.append_text(&data);
            return SinkResult::Continue;
        }

        self.dispatch(Token::Characters { data })
    }

    fn adjusted_current_namespace(&self) -> Namespace {
        self.open_elements
            .last()
            .and_then(|&node| self.tree.as_element(node))
            .map_or(Namespace::Html, |data| data.namespace)
    }
}

/// True if `text` is nothing but ASCII whitespace.
pub(crate) fn is_all_whitespace(text: &str) -> bool {
    text.chars().all(|c| matches!(c, '\t' | '\n' | '\x0C' | '\r' | ' '))
}

impl TreeBuilder {
    /// Create a tree builder, optionally for fragment parsing.
    pub fn new(
        fragment_context: Option<FragmentContext>,
        iframe_srcdoc: bool,
        collect_errors: bool,
    ) -> Self {
        let tree = if fragment_context.is_some() {
            DomTree::new_fragment()
        } else {
            DomTree::new()
        };

        let mut builder = TreeBuilder {
            tree,
            errors: Vec::new(),
            mode: InsertionMode::Initial,
            original_mode: None,
            table_text_original_mode: None,
            open_elements: Vec::new(),
            head_element: None,
            form_element: None,
            active_formatting: Vec::new(),
            frameset_ok: true,
            quirks_mode: QuirksMode::NoQuirks,
            ignore_lf: false,
            insert_from_table: false,
            pending_table_text: Vec::new(),
            template_modes: Vec::new(),
            tokenizer_state_override: None,
            fragment_context: fragment_context.clone(),
            fragment_context_element: None,
            iframe_srcdoc,
            collect_errors,
            last_pos: Position::default(),
        };

        if let Some(context) = fragment_context {
            // [§ 13.2.10](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
            // Fragment parsing wraps everything in a synthetic html root,
            // unwrapped again by finish().
            let root = builder.create_element("html", Namespace::Html, AttrList::new());
            builder.tree.append_child(NodeId::ROOT, root);
            builder.open_elements.push(root);

            let name = context.tag_name.to_ascii_lowercase();

            // A foreign context element is materialized so the foreign
            // content rules see the right adjusted current node.
            if let Some(namespace) = context.namespace {
                if !matches!(namespace, Namespace::Html) {
                    let adjusted_name = if matches!(namespace, Namespace::Svg) {
                        adjust_svg_tag_name(&context.tag_name).to_string()
                    } else {
                        context.tag_name.clone()
                    };
                    let element =
                        builder.create_element(&adjusted_name, namespace, AttrList::new());
                    builder.tree.append_child(root, element);
                    builder.open_elements.push(element);
                    builder.fragment_context_element = Some(element);
                }
            }

            builder.mode = if name == "html" {
                InsertionMode::BeforeHead
            } else if context.is_html() && matches!(name.as_str(), "tbody" | "thead" | "tfoot") {
                InsertionMode::InTableBody
            } else if context.is_html() && name == "tr" {
                InsertionMode::InRow
            } else if context.is_html() && matches!(name.as_str(), "td" | "th") {
                InsertionMode::InCell
            } else if context.is_html() && name == "caption" {
                InsertionMode::InCaption
            } else if context.is_html() && name == "colgroup" {
                InsertionMode::InColumnGroup
            } else if context.is_html() && name == "table" {
                InsertionMode::InTable
            } else {
                InsertionMode::InBody
            };

            // Fragments never honor <frameset>.
            builder.frameset_ok = false;
        }

        builder
    }

    // Dispatch ---------------------------------------------------------------

    /// [§ 13.2.6 Tree construction dispatcher](https://html.spec.whatwg.org/multipage/parsing.html#tree-construction-dispatcher)
    fn dispatch(&mut self, token: Token) -> SinkResult {
        if let Token::Doctype(data) = token {
            // A DOCTYPE in SVG/MathML content is just a parse error.
            if let Some(&current) = self.open_elements.last() {
                if !self.is_html_node(current) {
                    self.parse_error("unexpected-doctype", None);
                    return SinkResult::Continue;
                }
            }
            self.handle_doctype(&data);
            return SinkResult::Continue;
        }

        let mut current_token = token;
        let mut force_html = false;

        loop {
            let current_node = self.open_elements.last().copied();
            let is_html_namespace = current_node.is_none_or(|node| self.is_html_node(node));

            let result = if force_html || is_html_namespace {
                force_html = false;
                self.run_mode(self.mode, current_token)
            } else if self.should_use_foreign_content(&current_token) {
                self.process_foreign_content(current_token)
            } else {
                let current = current_node.expect("foreign dispatch requires a current node");

                match current_token {
                    // Text at a MathML text integration point inserts
                    // directly, bypassing mode dispatch.
                    Token::Characters { data }
                        if self.is_mathml_text_integration_point(current) =>
                    {
                        let mut data = data;
                        if data.contains('\0') {
                            self.parse_error("invalid-codepoint", None);
                            data = data.replace('\0', "");
                        }
                        if data.contains('\x0C') {
                            self.parse_error("invalid-codepoint", None);
                            data = data.replace('\x0C', "");
                        }
                        if !data.is_empty() {
                            if !is_all_whitespace(&data) {
                                self.reconstruct_active_formatting_elements();
                                self.frameset_ok = false;
                            }
                            self.append_text(&data);
                        }
                        None
                    }
                    other => {
                        // At integration points inside foreign content,
                        // table modes without an actual table in scope fall
                        // back to in-body handling for start tags.
                        let at_integration_point = self.is_mathml_text_integration_point(current)
                            || self.is_html_integration_point(current);
                        let is_start_tag = matches!(other, Token::StartTag { .. });
                        let is_table_mode = matches!(
                            self.mode,
                            InsertionMode::InTable
                                | InsertionMode::InTableBody
                                | InsertionMode::InRow
                                | InsertionMode::InCell
                                | InsertionMode::InCaption
                                | InsertionMode::InColumnGroup
                        );

                        if at_integration_point
                            && is_start_tag
                            && self.mode != InsertionMode::InBody
                            && is_table_mode
                            && !self.has_in_table_scope("table")
                        {
                            let saved_mode = self.mode;
                            self.mode = InsertionMode::InBody;
                            let result = self.run_mode(InsertionMode::InBody, other);
                            if self.mode == InsertionMode::InBody {
                                self.mode = saved_mode;
                            }
                            result
                        } else {
                            self.run_mode(self.mode, other)
                        }
                    }
                }
            };

            match result {
                None => {
                    return self
                        .tokenizer_state_override
                        .take()
                        .unwrap_or(SinkResult::Continue);
                }
                Some(reprocess) => {
                    self.mode = reprocess.mode;
                    current_token = reprocess.token;
                    force_html = reprocess.force_html;
                }
            }
        }
    }

    /// Finish parsing: unwrap the synthetic fragment root (when fragment
    /// parsing) and run the selectedcontent post-pass. Returns the tree and
    /// the collected errors.
    pub fn finish(mut self) -> (DomTree, Vec<ParseError>) {
        if self.fragment_context.is_some() {
            // The html wrapper is always children[0]; promote its children
            // (skipping past the materialized foreign context element).
            let root = self.tree.children(NodeId::ROOT)[0];
            if let Some(context_element) = self.fragment_context_element {
                if self.tree.parent(context_element) == Some(root) {
                    self.tree.move_children(context_element, root);
                    // move_children appended them after the context element;
                    // remove the wrapper itself.
                    self.tree.remove_child(root, context_element);
                }
            }
            self.tree.move_children(root, NodeId::ROOT);
            self.tree.remove_child(NodeId::ROOT, root);
        }

        self.populate_selectedcontent(NodeId::ROOT);

        (self.tree, self.errors)
    }

    // Errors -----------------------------------------------------------------

    pub(crate) fn parse_error(&mut self, code: &'static str, tag_name: Option<&str>) {
        if !self.collect_errors {
            return;
        }
        let message = generate_error_message(code, tag_name);
        warn_once("HTML Parser", code);
        self.errors.push(ParseError::new(
            code,
            Some(self.last_pos.line),
            Some(self.last_pos.column),
            message,
        ));
    }

    /// Like [`parse_error`], but rewinds the column to the start of the
    /// offending tag (the recorded position points just past its `>`).
    pub(crate) fn parse_error_at_tag(
        &mut self,
        code: &'static str,
        name: &str,
        attrs: &AttrList,
        is_end: bool,
        self_closing: bool,
    ) {
        if !self.collect_errors {
            return;
        }
        let mut tag_len = name.chars().count() as u32 + 2;
        if is_end {
            tag_len += 1;
        }
        for attr in attrs {
            tag_len += 1 + attr.name.chars().count() as u32;
            if let Some(value) = &attr.value {
                if !value.is_empty() {
                    tag_len += 3 + value.chars().count() as u32;
                }
            }
        }
        if self_closing {
            tag_len += 1;
        }
        let column = self.last_pos.column.saturating_sub(tag_len) + 1;
        let message = generate_error_message(code, Some(name));
        warn_once("HTML Parser", code);
        self.errors.push(ParseError::new(
            code,
            Some(self.last_pos.line),
            Some(column),
            message,
        ));
    }

    // Node inspection --------------------------------------------------------

    pub(crate) fn element_name_of(&self, node: NodeId) -> &str {
        self.tree.element_name(node).unwrap_or("")
    }

    pub(crate) fn is_html_node(&self, node: NodeId) -> bool {
        self.tree.as_element(node).is_none_or(ElementData::is_html)
    }

    pub(crate) fn namespace_of(&self, node: NodeId) -> Namespace {
        self.tree
            .as_element(node)
            .map_or(Namespace::Html, |data| data.namespace)
    }

    /// [§ 13.2.6.2](https://html.spec.whatwg.org/multipage/parsing.html#special)
    pub(crate) fn is_special_element(&self, node: NodeId) -> bool {
        self.is_html_node(node) && SPECIAL_ELEMENTS.contains(&self.element_name_of(node))
    }

    pub(crate) fn node_attribute_value(&self, node: NodeId, name: &str) -> Option<String> {
        let target = name.to_ascii_lowercase();
        self.tree.as_element(node).and_then(|data| {
            data.attrs
                .iter()
                .find(|attr| attr.name.to_ascii_lowercase() == target)
                .map(|attr| attr.value.clone().unwrap_or_default())
        })
    }

    /// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#html-integration-point)
    pub(crate) fn is_html_integration_point(&self, node: NodeId) -> bool {
        let Some(data) = self.tree.as_element(node) else {
            return false;
        };
        // annotation-xml is an HTML integration point only with specific
        // encoding values.
        if matches!(data.namespace, Namespace::MathMl) && data.name == "annotation-xml" {
            return self
                .node_attribute_value(node, "encoding")
                .is_some_and(|encoding| {
                    matches!(
                        encoding.to_ascii_lowercase().as_str(),
                        "text/html" | "application/xhtml+xml"
                    )
                });
        }
        matches!(data.namespace, Namespace::Svg)
            && SVG_HTML_INTEGRATION_POINTS.contains(&data.name.as_str())
    }

    /// [§ 13.2.6.5](https://html.spec.whatwg.org/multipage/parsing.html#mathml-text-integration-point)
    pub(crate) fn is_mathml_text_integration_point(&self, node: NodeId) -> bool {
        self.tree.as_element(node).is_some_and(|data| {
            matches!(data.namespace, Namespace::MathMl)
                && MATHML_TEXT_INTEGRATION_POINTS.contains(&data.name.as_str())
        })
    }

    // Scope predicates -------------------------------------------------------

    /// [§ 13.2.4.2](https://html.spec.whatwg.org/multipage/parsing.html#has-an-element-in-the-specific-scope)
    ///
    /// Walks the stack top-to-bottom: true on a name match, false on a
    /// terminator (or an integration point, for the non-table variants).
    pub(crate) fn has_element_in_scope_with(
        &self,
        target: &str,
        terminators: &[&str],
        check_integration_points: bool,
    ) -> bool {
        for &node in self.open_elements.iter().rev() {
            if self.element_name_of(node) == target {
                return true;
            }
            if self.is_html_node(node) {
                if terminators.contains(&self.element_name_of(node)) {
                    return false;
                }
            } else if check_integration_points
                && (self.is_html_integration_point(node)
                    || self.is_mathml_text_integration_point(node))
            {
                return false;
            }
        }
        false
    }

    pub(crate) fn has_in_scope(&self, target: &str) -> bool {
        self.has_element_in_scope_with(target, DEFAULT_SCOPE_TERMINATORS, true)
    }

    pub(crate) fn has_in_list_item_scope(&self, target: &str) -> bool {
        self.has_element_in_scope_with(target, LIST_ITEM_SCOPE_TERMINATORS, true)
    }

    pub(crate) fn has_in_button_scope(&self, target: &str) -> bool {
        self.has_element_in_scope_with(target, BUTTON_SCOPE_TERMINATORS, true)
    }

    pub(crate) fn has_in_definition_scope(&self, target: &str) -> bool {
        self.has_element_in_scope_with(target, DEFINITION_SCOPE_TERMINATORS, true)
    }

    pub(crate) fn has_in_table_scope(&self, target: &str) -> bool {
        self.has_element_in_scope_with(target, TABLE_SCOPE_TERMINATORS, false)
    }

    pub(crate) fn has_any_in_scope(&self, names: &[&str]) -> bool {
        for &node in self.open_elements.iter().rev() {
            let name = self.element_name_of(node);
            if names.contains(&name) {
                return true;
            }
            if self.is_html_node(node) && DEFAULT_SCOPE_TERMINATORS.contains(&name) {
                return false;
            }
        }
        false
    }

    // Stack manipulation -----------------------------------------------------

    pub(crate) fn pop_current(&mut self) -> Option<NodeId> {
        self.open_elements.pop()
    }

    /// Pop elements through the first one named `name`. Callers ensure the
    /// element is on the stack.
    pub(crate) fn pop_until_inclusive(&mut self, name: &str) {
        while let Some(node) = self.open_elements.pop() {
            if self.element_name_of(node) == name {
                break;
            }
        }
    }

    pub(crate) fn pop_until_any_inclusive(&mut self, names: &[&str]) {
        while let Some(node) = self.open_elements.pop() {
            if names.contains(&self.element_name_of(node)) {
                break;
            }
        }
    }

    /// Pop until the current node is one of `names` (HTML namespace). All
    /// callers include "html", so this always terminates with a match.
    pub(crate) fn clear_stack_until(&mut self, names: &[&str]) {
        while let Some(&node) = self.open_elements.last() {
            if names.contains(&self.element_name_of(node)) && self.is_html_node(node) {
                break;
            }
            self.open_elements.pop();
        }
    }

    /// [§ 13.2.6.3](https://html.spec.whatwg.org/multipage/parsing.html#generate-implied-end-tags)
    pub(crate) fn generate_implied_end_tags(&mut self, exclude: Option<&str>) {
        while let Some(&node) = self.open_elements.last() {
            let name = self.element_name_of(node);
            if IMPLIED_END_TAGS.contains(&name) && Some(name) != exclude {
                self.open_elements.pop();
                continue;
            }
            break;
        }
    }

    pub(crate) fn find_last_on_stack(&self, name: &str) -> Option<NodeId> {
        self.open_elements
            .iter()
            .rev()
            .copied()
            .find(|&node| self.element_name_of(node) == name)
    }

    pub(crate) fn remove_from_open_elements(&mut self, node: NodeId) -> bool {
        if let Some(index) = self.open_elements.iter().position(|&n| n == node) {
            self.open_elements.remove(index);
            return true;
        }
        false
    }

    pub(crate) fn remove_last_open_element_by_name(&mut self, name: &str) {
        if let Some(index) = self
            .open_elements
            .iter()
            .rposition(|&node| self.element_name_of(node) == name)
        {
            self.open_elements.remove(index);
        }
    }

    /// Close an element by name via direct pop (used when a start tag closes
    /// an open element of the same kind, e.g. button).
    pub(crate) fn close_element_by_name(&mut self, name: &str) {
        if let Some(index) = self
            .open_elements
            .iter()
            .rposition(|&node| self.element_name_of(node) == name)
        {
            self.open_elements.truncate(index);
        }
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#close-a-p-element)
    pub(crate) fn close_p_element(&mut self) -> bool {
        if self.has_in_button_scope("p") {
            self.generate_implied_end_tags(Some("p"));
            if self
                .open_elements
                .last()
                .is_some_and(|&node| self.element_name_of(node) != "p")
            {
                self.parse_error("end-tag-too-early", Some("p"));
            }
            self.pop_until_inclusive("p");
            return true;
        }
        false
    }

    /// "Any other end tag" in the in-body insertion mode.
    pub(crate) fn any_other_end_tag(&mut self, name: &str) {
        let mut index = self.open_elements.len();
        while index > 0 {
            index -= 1;
            let node = self.open_elements[index];

            if self.element_name_of(node) == name {
                if index != self.open_elements.len() - 1 {
                    self.parse_error("end-tag-too-early", None);
                }
                self.open_elements.truncate(index);
                return;
            }

            if self.is_special_element(node) {
                self.parse_error("unexpected-end-tag", Some(name));
                return;
            }
        }
    }

    // Node creation and insertion --------------------------------------------

    pub(crate) fn create_element(
        &mut self,
        name: &str,
        namespace: Namespace,
        attrs: AttrList,
    ) -> NodeId {
        self.tree.alloc(NodeType::Element(ElementData {
            name: name.to_string(),
            namespace,
            attrs,
            template_contents: None,
        }))
    }

    /// The current node, or the html element when the stack is empty
    /// (tokens can arrive after </html>).
    pub(crate) fn current_node_or_html(&self) -> Option<NodeId> {
        if let Some(&node) = self.open_elements.last() {
            return Some(node);
        }
        let children = self.tree.children(NodeId::ROOT);
        children
            .iter()
            .copied()
            .find(|&child| self.tree.element_name(child) == Some("html"))
            .or_else(|| children.first().copied())
    }

    pub(crate) fn append_comment_to_document(&mut self, text: &str) {
        let node = self.tree.alloc(NodeType::Comment(text.to_string()));
        self.tree.append_child(NodeId::ROOT, node);
    }

    pub(crate) fn append_comment(&mut self, text: &str, parent: Option<NodeId>) {
        let Some(mut parent) = parent.or_else(|| self.current_node_or_html()) else {
            return;
        };
        // If the parent is a template, insert into its content fragment.
        if let Some(contents) = self.tree.template_contents(parent) {
            parent = contents;
        }
        let node = self.tree.alloc(NodeType::Comment(text.to_string()));
        self.tree.append_child(parent, node);
    }

    /// Insert a character run, honoring foster parenting and coalescing with
    /// the preceding text sibling.
    pub(crate) fn append_text(&mut self, text: &str) {
        let mut text = text;
        if self.ignore_lf {
            self.ignore_lf = false;
            if let Some(stripped) = text.strip_prefix('\n') {
                if stripped.is_empty() {
                    return;
                }
                text = stripped;
            }
        }
        if text.is_empty() {
            return;
        }

        let Some(&target) = self.open_elements.last() else {
            return;
        };

        // Fast path: the current node is not a foster-parenting target and
        // not a template.
        let target_is_table_part =
            TABLE_FOSTER_TARGETS.contains(&self.element_name_of(target));
        let target_is_template = self.tree.template_contents(target).is_some();
        if !target_is_table_part && !target_is_template {
            if let Some(&last_child) = self.tree.children(target).last() {
                if self.tree.as_text(last_child).is_some() {
                    self.tree.push_text(last_child, text);
                    return;
                }
            }
            let node = self.tree.alloc(NodeType::Text(text.to_string()));
            self.tree.append_child(target, node);
            return;
        }

        let foster_parenting = self.should_foster_parenting(target, None, true);

        // Reconstruct active formatting BEFORE computing the insertion
        // location when foster parenting.
        if foster_parenting {
            self.reconstruct_active_formatting_elements();
        }

        let (parent, position) = self.appropriate_insertion_location(None, foster_parenting);

        // Coalesce with the preceding text sibling if possible.
        if position > 0 {
            let prev = self.tree.children(parent)[position - 1];
            if self.tree.as_text(prev).is_some() {
                self.tree.push_text(prev, text);
                return;
            }
        }

        let node = self.tree.alloc(NodeType::Text(text.to_string()));
        self.tree.insert_child_at(parent, position, node);
    }

    /// Insert an element for a tag token.
    pub(crate) fn insert_element(
        &mut self,
        name: &str,
        attrs: AttrList,
        namespace: Namespace,
        push: bool,
    ) -> NodeId {
        let node = self.create_element(name, namespace, attrs);

        // Fast path for the common case: not inserting from a table.
        if !self.insert_from_table {
            if let Some(target) = self.current_node_or_html() {
                let parent = self.tree.template_contents(target).unwrap_or(target);
                self.tree.append_child(parent, node);
            }
            if push {
                self.open_elements.push(node);
            }
            return node;
        }

        let foster_parenting = self
            .current_node_or_html()
            .is_some_and(|target| self.should_foster_parenting(target, Some(name), false));
        let (parent, position) = self.appropriate_insertion_location(None, foster_parenting);
        self.tree.insert_child_at(parent, position, node);
        if push {
            self.open_elements.push(node);
        }
        node
    }

    /// Insert an implied element (no token of its own).
    pub(crate) fn insert_phantom(&mut self, name: &str) -> NodeId {
        self.insert_element(name, AttrList::new(), Namespace::Html, true)
    }

    /// Synthesize a body element directly under html when a body token is
    /// missing.
    pub(crate) fn insert_body_if_missing(&mut self) {
        let node = self.create_element("body", Namespace::Html, AttrList::new());
        if let Some(html_node) = self.find_last_on_stack("html") {
            self.tree.append_child(html_node, node);
        }
        self.open_elements.push(node);
    }

    pub(crate) fn create_root(&mut self, attrs: AttrList) -> NodeId {
        let node = self.create_element("html", Namespace::Html, attrs);
        self.tree.append_child(NodeId::ROOT, node);
        self.open_elements.push(node);
        node
    }

    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    /// Merge attributes from a duplicate html/body tag into the existing
    /// element.
    pub(crate) fn add_missing_attributes(&mut self, node: NodeId, attrs: AttrList) {
        if let Some(data) = self.tree.as_element_mut(node) {
            for attr in &attrs {
                data.attrs.push_if_missing(attr.clone());
            }
        }
    }

    /// [§ 13.2.6.1](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    pub(crate) fn should_foster_parenting(
        &self,
        target: NodeId,
        for_tag: Option<&str>,
        is_text: bool,
    ) -> bool {
        if !self.insert_from_table {
            return false;
        }
        if !TABLE_FOSTER_TARGETS.contains(&self.element_name_of(target)) {
            return false;
        }
        if is_text {
            return true;
        }
        if let Some(tag) = for_tag {
            if TABLE_ALLOWED_CHILDREN.contains(&tag) {
                return false;
            }
        }
        true
    }

    /// [§ 13.2.6.1 Appropriate place for inserting a node](https://html.spec.whatwg.org/multipage/parsing.html#appropriate-place-for-inserting-a-node)
    ///
    /// Returns the parent node and child index to insert at. With foster
    /// parenting: inside the most recent template's contents if it is more
    /// recent than the last table, otherwise in the table's parent
    /// immediately before the table.
    pub(crate) fn appropriate_insertion_location(
        &self,
        override_target: Option<NodeId>,
        foster_parenting: bool,
    ) -> (NodeId, usize) {
        let Some(target) = override_target.or_else(|| self.current_node_or_html()) else {
            return (NodeId::ROOT, 0);
        };

        if foster_parenting && TABLE_FOSTER_TARGETS.contains(&self.element_name_of(target)) {
            let last_template = self.find_last_on_stack("template");
            let last_table = self.find_last_on_stack("table");

            if let Some(template) = last_template {
                let template_newer = match last_table {
                    None => true,
                    Some(table) => {
                        let template_index =
                            self.open_elements.iter().position(|&n| n == template);
                        let table_index = self.open_elements.iter().position(|&n| n == table);
                        template_index > table_index
                    }
                };
                if template_newer {
                    if let Some(contents) = self.tree.template_contents(template) {
                        return (contents, self.tree.children(contents).len());
                    }
                }
            }

            let Some(table) = last_table else {
                // No table on stack: fall back to inserting in the target.
                return (target, self.tree.children(target).len());
            };
            let Some(parent) = self.tree.parent(table) else {
                return (target, self.tree.children(target).len());
            };
            let position = self
                .tree
                .child_index(parent, table)
                .unwrap_or_else(|| self.tree.children(parent).len());
            return (parent, position);
        }

        // A template element redirects insertion into its content fragment.
        if let Some(contents) = self.tree.template_contents(target) {
            return (contents, self.tree.children(contents).len());
        }

        (target, self.tree.children(target).len())
    }

    // Active formatting elements ---------------------------------------------

    pub(crate) fn attrs_signature(attrs: &AttrList) -> Vec<(String, String)> {
        let mut items: Vec<(String, String)> = attrs
            .iter()
            .map(|attr| {
                (
                    attr.name.clone(),
                    attr.value.clone().unwrap_or_default(),
                )
            })
            .collect();
        items.sort();
        items
    }

    pub(crate) fn push_formatting_marker(&mut self) {
        self.active_formatting.push(FormattingEntry::Marker);
    }

    pub(crate) fn append_active_formatting_entry(
        &mut self,
        name: &str,
        attrs: &AttrList,
        node: NodeId,
    ) {
        let attrs: AttrList = attrs.iter().cloned().collect();
        let signature = Self::attrs_signature(&attrs);
        self.active_formatting.push(FormattingEntry::Element {
            name: name.to_string(),
            attrs,
            node,
            signature,
        });
    }

    /// Find the last entry for `name` above the last marker.
    pub(crate) fn find_active_formatting_index(&self, name: &str) -> Option<usize> {
        for (index, entry) in self.active_formatting.iter().enumerate().rev() {
            match entry {
                FormattingEntry::Marker => break,
                FormattingEntry::Element {
                    name: entry_name, ..
                } => {
                    if entry_name == name {
                        return Some(index);
                    }
                }
            }
        }
        None
    }

    pub(crate) fn find_active_formatting_index_by_node(&self, node: NodeId) -> Option<usize> {
        for (index, entry) in self.active_formatting.iter().enumerate().rev() {
            if let FormattingEntry::Element {
                node: entry_node, ..
            } = entry
            {
                if *entry_node == node {
                    return Some(index);
                }
            }
        }
        None
    }

    pub(crate) fn has_active_formatting_entry(&self, name: &str) -> bool {
        self.find_active_formatting_index(name).is_some()
    }

    pub(crate) fn remove_last_active_formatting_by_name(&mut self, name: &str) {
        for index in (0..self.active_formatting.len()).rev() {
            match &self.active_formatting[index] {
                FormattingEntry::Marker => break,
                FormattingEntry::Element {
                    name: entry_name, ..
                } => {
                    if entry_name == name {
                        self.active_formatting.remove(index);
                        return;
                    }
                }
            }
        }
    }

    /// The Noah's Ark clause: find the oldest of three entries matching
    /// `name` and the attribute signature between the last marker and the
    /// tail.
    pub(crate) fn find_active_formatting_duplicate(
        &self,
        name: &str,
        attrs: &AttrList,
    ) -> Option<usize> {
        let signature = Self::attrs_signature(attrs);
        let mut matches: Vec<usize> = Vec::new();
        for (index, entry) in self.active_formatting.iter().enumerate() {
            match entry {
                FormattingEntry::Marker => matches.clear(),
                FormattingEntry::Element {
                    name: entry_name,
                    signature: entry_signature,
                    ..
                } => {
                    if entry_name == name && *entry_signature == signature {
                        matches.push(index);
                    }
                }
            }
        }
        if matches.len() >= 3 {
            return Some(matches[0]);
        }
        None
    }

    /// [§ 13.2.4.3](https://html.spec.whatwg.org/multipage/parsing.html#clear-the-list-of-active-formatting-elements-up-to-the-last-marker)
    pub(crate) fn clear_active_formatting_up_to_marker(&mut self) {
        while let Some(entry) = self.active_formatting.pop() {
            if matches!(entry, FormattingEntry::Marker) {
                break;
            }
        }
    }

    /// [§ 13.2.6.3 Reconstruct the active formatting elements](https://html.spec.whatwg.org/multipage/parsing.html#reconstruct-the-active-formatting-elements)
    pub(crate) fn reconstruct_active_formatting_elements(&mut self) {
        let Some(last_entry) = self.active_formatting.last() else {
            return;
        };
        match last_entry {
            FormattingEntry::Marker => return,
            FormattingEntry::Element { node, .. } => {
                if self.open_elements.contains(node) {
                    return;
                }
            }
        }

        // Walk back to the first entry that is a marker or already open.
        let mut index = self.active_formatting.len() as isize - 1;
        loop {
            index -= 1;
            if index < 0 {
                break;
            }
            match &self.active_formatting[index as usize] {
                FormattingEntry::Marker => {
                    index += 1;
                    break;
                }
                FormattingEntry::Element { node, .. } => {
                    if self.open_elements.contains(node) {
                        index += 1;
                        break;
                    }
                }
            }
        }
        let mut index = index.max(0) as usize;

        // Re-create the remaining entries as fresh elements.
        while index < self.active_formatting.len() {
            let (name, attrs) = match &self.active_formatting[index] {
                FormattingEntry::Element { name, attrs, .. } => {
                    (name.clone(), attrs.iter().cloned().collect::<AttrList>())
                }
                FormattingEntry::Marker => unreachable!("markers never need reconstruction"),
            };
            let new_node = self.insert_element(&name, attrs, Namespace::Html, true);
            if let FormattingEntry::Element { node, .. } = &mut self.active_formatting[index] {
                *node = new_node;
            }
            index += 1;
        }
    }

    // Adoption agency --------------------------------------------------------

    /// [§ 13.2.6.4.7 The adoption agency algorithm](https://html.spec.whatwg.org/multipage/parsing.html#adoption-agency-algorithm)
    pub(crate) fn adoption_agency(&mut self, subject: &str) {
        // 1. If the current node is the subject and has no active-formatting
        // entry, a plain pop suffices.
        if let Some(&current) = self.open_elements.last() {
            if self.element_name_of(current) == subject
                && !self.has_active_formatting_entry(subject)
            {
                self.pop_until_inclusive(subject);
                return;
            }
        }

        // 2. Outer loop, capped at 8 iterations.
        for _ in 0..8 {
            // 3. Find the formatting element.
            let Some(formatting_index) = self.find_active_formatting_index(subject) else {
                return;
            };
            let formatting_element = match &self.active_formatting[formatting_index] {
                FormattingEntry::Element { node, .. } => *node,
                FormattingEntry::Marker => return,
            };

            // 4. Formatting element no longer open: drop the stale entry.
            if !self.open_elements.contains(&formatting_element) {
                self.parse_error("adoption-agency-1.3", None);
                self.active_formatting.remove(formatting_index);
                return;
            }

            // 5. Open but not in scope: ignore the token.
            let formatting_name = self.element_name_of(formatting_element).to_string();
            if !self.has_in_scope(&formatting_name) {
                self.parse_error("adoption-agency-1.3", None);
                return;
            }

            // 6. Not the current node: parse error (but continue).
            if self.open_elements.last() != Some(&formatting_element) {
                self.parse_error("adoption-agency-1.3", None);
            }

            // 7. Find the furthest block: the first special element deeper
            // on the stack than the formatting element.
            let formatting_stack_index = self
                .open_elements
                .iter()
                .position(|&n| n == formatting_element)
                .expect("formatting element is on the stack");

            let furthest_block = self.open_elements[formatting_stack_index + 1..]
                .iter()
                .copied()
                .find(|&node| self.is_special_element(node));

            let Some(furthest_block) = furthest_block else {
                // No furthest block: pop through the formatting element and
                // drop its entry.
                while let Some(popped) = self.open_elements.pop() {
                    if popped == formatting_element {
                        break;
                    }
                }
                self.active_formatting.remove(formatting_index);
                return;
            };

            // 8. Bookmark where the rebuilt entry must land.
            let mut bookmark = formatting_index + 1;

            // 9-10. Inner loop: clone intermediate elements and reparent
            // last_node step by step.
            let mut node = furthest_block;
            let mut last_node = furthest_block;
            let mut inner_loop_counter = 0;

            loop {
                inner_loop_counter += 1;

                // 10.1 Node is the element above node on the stack.
                let node_index = self
                    .open_elements
                    .iter()
                    .position(|&n| n == node)
                    .expect("inner-loop node is on the stack");
                node = self.open_elements[node_index - 1];

                // 10.2 Stop at the formatting element.
                if node == formatting_element {
                    break;
                }

                let mut node_formatting_index = self.find_active_formatting_index_by_node(node);

                // 10.3 After three iterations, stale entries are dropped.
                if inner_loop_counter > 3 {
                    if let Some(index) = node_formatting_index {
                        self.active_formatting.remove(index);
                        if index < bookmark {
                            bookmark -= 1;
                        }
                        node_formatting_index = None;
                    }
                }

                let Some(node_formatting_index) = node_formatting_index else {
                    // Not a formatting element: remove from the stack and
                    // continue with the element that took its slot.
                    let index = self
                        .open_elements
                        .iter()
                        .position(|&n| n == node)
                        .expect("node is on the stack");
                    self.open_elements.remove(index);
                    node = self.open_elements[index];
                    continue;
                };

                // 10.4 Replace the entry (and the stack slot) with a clone.
                let (entry_name, entry_attrs) =
                    match &self.active_formatting[node_formatting_index] {
                        FormattingEntry::Element { name, attrs, .. } => {
                            (name.clone(), attrs.iter().cloned().collect::<AttrList>())
                        }
                        FormattingEntry::Marker => unreachable!("entry was found by node"),
                    };
                let namespace = self.namespace_of(node);
                let new_element = self.create_element(&entry_name, namespace, entry_attrs);
                if let FormattingEntry::Element {
                    node: entry_node, ..
                } = &mut self.active_formatting[node_formatting_index]
                {
                    *entry_node = new_element;
                }
                let stack_slot = self
                    .open_elements
                    .iter()
                    .position(|&n| n == node)
                    .expect("node is on the stack");
                self.open_elements[stack_slot] = new_element;
                node = new_element;

                // 10.5 First pass: the bookmark follows this entry.
                if last_node == furthest_block {
                    bookmark = node_formatting_index + 1;
                }

                // 10.6 Reparent last_node under the clone.
                self.tree.detach(last_node);
                self.tree.append_child(node, last_node);

                // 10.7
                last_node = node;
            }

            // 11. Insert last_node under the common ancestor (honoring
            // foster parenting).
            let common_ancestor = self.open_elements[formatting_stack_index - 1];
            self.tree.detach(last_node);

            let last_node_name = self.element_name_of(last_node).to_string();
            if self.should_foster_parenting(common_ancestor, Some(&last_node_name), false) {
                let (parent, position) =
                    self.appropriate_insertion_location(Some(common_ancestor), true);
                self.tree.insert_child_at(parent, position, last_node);
            } else if let Some(contents) = self.tree.template_contents(common_ancestor) {
                self.tree.append_child(contents, last_node);
            } else {
                self.tree.append_child(common_ancestor, last_node);
            }

            // 12. A fresh formatting-element clone wraps the furthest
            // block's former children.
            let (entry_name, entry_attrs) = match &self.active_formatting[formatting_index] {
                FormattingEntry::Element { name, attrs, .. } => {
                    (name.clone(), attrs.iter().cloned().collect::<AttrList>())
                }
                FormattingEntry::Marker => unreachable!("entry was found by name"),
            };
            let namespace = self.namespace_of(formatting_element);
            let new_formatting_element = self.create_element(&entry_name, namespace, entry_attrs);
            if let FormattingEntry::Element { node, .. } =
                &mut self.active_formatting[formatting_index]
            {
                *node = new_formatting_element;
            }

            // 13. Move the furthest block's children into the clone.
            self.tree.move_children(furthest_block, new_formatting_element);
            self.tree.append_child(furthest_block, new_formatting_element);

            // 14. Move the entry to the bookmark position.
            let entry = self.active_formatting.remove(formatting_index);
            bookmark -= 1;
            self.active_formatting.insert(bookmark, entry);

            // 15. Replace the stack entry: the clone sits just above the
            // furthest block.
            self.remove_from_open_elements(formatting_element);
            let furthest_index = self
                .open_elements
                .iter()
                .position(|&n| n == furthest_block)
                .expect("furthest block is on the stack");
            self.open_elements
                .insert(furthest_index + 1, new_formatting_element);
        }
    }

    // Tables -----------------------------------------------------------------

    pub(crate) fn close_table_cell(&mut self) -> bool {
        if self.has_in_table_scope("td") {
            self.end_table_cell("td");
            return true;
        }
        if self.has_in_table_scope("th") {
            self.end_table_cell("th");
            return true;
        }
        false
    }

    pub(crate) fn end_table_cell(&mut self, name: &str) {
        self.generate_implied_end_tags(Some(name));
        while let Some(node) = self.open_elements.pop() {
            if self.element_name_of(node) == name && self.is_html_node(node) {
                break;
            }
        }
        self.clear_active_formatting_up_to_marker();
        self.mode = InsertionMode::InRow;
    }

    /// Drain the pending table text: pure whitespace inserts normally,
    /// anything else engages foster parenting.
    pub(crate) fn flush_pending_table_text(&mut self) {
        let data = self.pending_table_text.concat();
        self.pending_table_text.clear();
        if data.is_empty() {
            return;
        }
        if is_all_whitespace(&data) {
            self.append_text(&data);
            return;
        }
        self.parse_error("foster-parenting-character", None);
        let previous = self.insert_from_table;
        self.insert_from_table = true;
        self.reconstruct_active_formatting_elements();
        self.append_text(&data);
        self.insert_from_table = previous;
    }

    pub(crate) fn close_table_element(&mut self) -> bool {
        if !self.has_in_table_scope("table") {
            self.parse_error("unexpected-end-tag", Some("table"));
            return false;
        }
        self.generate_implied_end_tags(None);
        self.pop_until_inclusive("table");
        self.reset_insertion_mode();
        true
    }

    /// [§ 13.2.4.1 Reset the insertion mode appropriately](https://html.spec.whatwg.org/multipage/parsing.html#reset-the-insertion-mode-appropriately)
    pub(crate) fn reset_insertion_mode(&mut self) {
        for &node in self.open_elements.iter().rev() {
            match self.element_name_of(node) {
                "select" => {
                    self.mode = InsertionMode::InSelect;
                    return;
                }
                "td" | "th" => {
                    self.mode = InsertionMode::InCell;
                    return;
                }
                "tr" => {
                    self.mode = InsertionMode::InRow;
                    return;
                }
                "tbody" | "tfoot" | "thead" => {
                    self.mode = InsertionMode::InTableBody;
                    return;
                }
                "caption" => {
                    self.mode = InsertionMode::InCaption;
                    return;
                }
                "table" => {
                    self.mode = InsertionMode::InTable;
                    return;
                }
                "template" => {
                    if let Some(&mode) = self.template_modes.last() {
                        self.mode = mode;
                        return;
                    }
                }
                "head" => {
                    self.mode = InsertionMode::InHead;
                    return;
                }
                "html" => {
                    self.mode = InsertionMode::InBody;
                    return;
                }
                _ => {}
            }
        }
        self.mode = InsertionMode::InBody;
    }

    // Foreign content --------------------------------------------------------

    pub(crate) fn adjusted_current_node(&self) -> Option<NodeId> {
        self.open_elements.last().copied()
    }

    /// Whether the token runs the foreign-content algorithm rather than the
    /// current insertion mode.
    pub(crate) fn should_use_foreign_content(&self, token: &Token) -> bool {
        let Some(current) = self.adjusted_current_node() else {
            return false;
        };
        if self.is_html_node(current) {
            return false;
        }

        if token.is_eof() {
            return false;
        }

        if self.is_mathml_text_integration_point(current) {
            if matches!(token, Token::Characters { .. }) {
                return false;
            }
            if let Token::StartTag { name, .. } = token {
                if !matches!(name.as_str(), "mglyph" | "malignmark") {
                    return false;
                }
            }
        }

        if matches!(self.namespace_of(current), Namespace::MathMl)
            && self.element_name_of(current) == "annotation-xml"
        {
            if let Token::StartTag { name, .. } = token {
                if name == "svg" {
                    return false;
                }
            }
        }

        if self.is_html_integration_point(current)
            && matches!(token, Token::Characters { .. } | Token::StartTag { .. })
        {
            return false;
        }

        true
    }

    fn foreign_breakout_font(attrs: &AttrList) -> bool {
        attrs.iter().any(|attr| {
            matches!(
                attr.name.to_ascii_lowercase().as_str(),
                "color" | "face" | "size"
            )
        })
    }

    fn pop_until_html_or_integration_point(&mut self) {
        while let Some(&node) = self.open_elements.last() {
            if self.is_html_node(node) {
                return;
            }
            if self.is_html_integration_point(node) {
                return;
            }
            if self.fragment_context_element == Some(node) {
                return;
            }
            self.open_elements.pop();
        }
    }

    pub(crate) fn prepare_foreign_attributes(namespace: Namespace, attrs: &AttrList) -> AttrList {
        let mut adjusted: AttrList = attrs.iter().cloned().collect();
        match namespace {
            Namespace::MathMl => adjust_mathml_attributes(&mut adjusted),
            Namespace::Svg => adjust_svg_attributes(&mut adjusted),
            Namespace::Html => {}
        }
        adjust_foreign_attributes(&mut adjusted);
        adjusted
    }

    /// [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
    pub(crate) fn process_foreign_content(&mut self, token: Token) -> ModeResult {
        let current = self
            .adjusted_current_node()
            .expect("foreign content requires a current node");

        match token {
            Token::Characters { data } => {
                // "U+0000 NULL - This is an unexpected-null-character parse
                // error. Insert a U+FFFD REPLACEMENT CHARACTER."
                let mut cleaned = String::with_capacity(data.len());
                let mut has_non_null_non_ws = false;
                for ch in data.chars() {
                    if ch == '\0' {
                        self.parse_error("invalid-codepoint-in-foreign-content", None);
                        cleaned.push('\u{FFFD}');
                        continue;
                    }
                    cleaned.push(ch);
                    if !matches!(ch, '\t' | '\n' | '\x0C' | '\r' | ' ') {
                        has_non_null_non_ws = true;
                    }
                }
                if has_non_null_non_ws {
                    self.frameset_ok = false;
                }
                self.append_text(&cleaned);
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
            } => {
                let name_lower = name.to_ascii_lowercase();
                // A start tag in the breakout set (or font with color/face/
                // size) pops foreign elements and reprocesses as HTML.
                if FOREIGN_BREAKOUT_ELEMENTS.contains(&name_lower.as_str())
                    || (name_lower == "font" && Self::foreign_breakout_font(&attrs))
                {
                    self.parse_error("unexpected-html-element-in-foreign-content", None);
                    self.pop_until_html_or_integration_point();
                    self.reset_insertion_mode();
                    return Some(Reprocess::forced(
                        self.mode,
                        Token::StartTag {
                            name,
                            attrs,
                            self_closing,
                        },
                    ));
                }

                let namespace = self.namespace_of(current);
                let adjusted_name = if matches!(namespace, Namespace::Svg) {
                    adjust_svg_tag_name(&name).to_string()
                } else {
                    name
                };
                let attrs = Self::prepare_foreign_attributes(namespace, &attrs);
                // Self-closing foreign elements are not pushed.
                self.insert_element(&adjusted_name, attrs, namespace, !self_closing);
                None
            }
            Token::EndTag { name, attrs } => {
                let name_lower = name.to_ascii_lowercase();

                // </br> and </p> break out of foreign content.
                if matches!(name_lower.as_str(), "br" | "p") {
                    self.parse_error("unexpected-html-element-in-foreign-content", None);
                    self.pop_until_html_or_integration_point();
                    self.reset_insertion_mode();
                    return Some(Reprocess::forced(self.mode, Token::EndTag { name, attrs }));
                }

                // Walk the stack case-insensitively looking for a match.
                let mut first = true;
                let mut index = self.open_elements.len();
                while index > 0 {
                    index -= 1;
                    let node = self.open_elements[index];
                    let is_html = self.is_html_node(node);
                    let name_eq =
                        self.element_name_of(node).to_ascii_lowercase() == name_lower;

                    if name_eq {
                        if self.fragment_context_element == Some(node) {
                            self.parse_error("unexpected-end-tag-in-fragment-context", Some(&name));
                            return None;
                        }
                        if is_html {
                            return Some(Reprocess::forced(
                                self.mode,
                                Token::EndTag { name, attrs },
                            ));
                        }
                        self.open_elements.truncate(index);
                        return None;
                    }

                    if first {
                        self.parse_error("unexpected-end-tag-in-foreign-content", Some(&name));
                        first = false;
                    }

                    if is_html {
                        return Some(Reprocess::forced(self.mode, Token::EndTag { name, attrs }));
                    }
                }
                None
            }
            Token::Doctype(_) | Token::EndOfFile => None,
        }
    }

    // selectedcontent post-pass ----------------------------------------------

    /// Populate `selectedcontent` elements with a deep clone of the selected
    /// (or first) option's children. Not part of the targeted WHATWG
    /// snapshot; see DESIGN notes.
    pub(crate) fn populate_selectedcontent(&mut self, root: NodeId) {
        let mut selects = Vec::new();
        self.find_elements(root, "select", &mut selects);

        for select in selects {
            let Some(selectedcontent) = self.find_element(select, "selectedcontent") else {
                continue;
            };

            let mut options = Vec::new();
            self.find_elements(select, "option", &mut options);

            let selected_option = options
                .iter()
                .copied()
                .find(|&option| {
                    self.tree
                        .as_element(option)
                        .is_some_and(|data| data.attrs.contains("selected"))
                })
                .or_else(|| options.first().copied());

            if let Some(option) = selected_option {
                let children: Vec<NodeId> = self.tree.children(option).to_vec();
                for child in children {
                    let clone = self.tree.clone_subtree(child);
                    self.tree.append_child(selectedcontent, clone);
                }
            }
        }
    }

    fn find_elements(&self, node: NodeId, name: &str, result: &mut Vec<NodeId>) {
        if self.tree.element_name(node) == Some(name) {
            result.push(node);
        }
        for &child in self.tree.children(node) {
            self.find_elements(child, name, result);
        }
    }

    fn find_element(&self, node: NodeId, name: &str) -> Option<NodeId> {
        if self.tree.element_name(node) == Some(name) {
            return Some(node);
        }
        for &child in self.tree.children(node) {
            if let Some(found) = self.find_element(child, name) {
                return Some(found);
            }
        }
        None
    }
}
