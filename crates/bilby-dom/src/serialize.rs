//! HTML serialization for Bilby DOM trees.
//!
//! Two output formats live here:
//! - [`to_html`] renders a subtree back to HTML source, matching the
//!   html5lib serializer's choices for attribute quoting and text escaping.
//! - [`to_test_format`] renders the html5lib-tests canonical tree dump
//!   (`| `-prefixed, two-space indents) used by the parser's own tests.

use crate::{AttrList, DomTree, Namespace, NodeId, NodeType};

/// [§ 13.1.2 Elements](https://html.spec.whatwg.org/multipage/syntax.html#void-elements)
///
/// "Void elements only have a start tag; end tags must not be specified for
/// void elements."
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Foreign attribute names that were namespace-adjusted during parsing.
/// The test dump displays these with the colon replaced by a space
/// (`xlink:href` becomes `xlink href`).
const ADJUSTED_FOREIGN_ATTRIBUTES: &[&str] = &[
    "xlink:actuate",
    "xlink:arcrole",
    "xlink:href",
    "xlink:role",
    "xlink:show",
    "xlink:title",
    "xlink:type",
    "xml:lang",
    "xml:space",
    "xmlns",
    "xmlns:xlink",
];

fn is_void_element(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

fn escape_text(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Prefer unquoted values; fall back to whichever quote the value does not
/// contain (double wins ties).
fn choose_attr_quote(value: &str) -> char {
    if value.contains('"') && !value.contains('\'') {
        '\''
    } else {
        '"'
    }
}

fn escape_attr_value(value: &str, quote: char) -> String {
    let value = value.replace('&', "&amp;");
    // The html5lib serializer does not escape '>' in attribute values.
    if quote == '"' {
        value.replace('"', "&quot;")
    } else {
        value.replace('\'', "&#39;")
    }
}

/// A value can go unquoted when nothing in it could terminate or ambiguate
/// the value.
fn can_unquote_attr_value(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|ch| matches!(ch, '>' | '"' | '\'' | '=' | ' ' | '\t' | '\n' | '\x0C' | '\r'))
}

/// Render a start tag (`<name attr=value ...>`).
#[must_use]
pub fn serialize_start_tag(name: &str, attrs: &AttrList) -> String {
    let mut out = String::new();
    out.push('<');
    out.push_str(name);
    for attr in attrs {
        out.push(' ');
        out.push_str(&attr.name);
        let value = attr.value.as_deref().unwrap_or("");
        if value.is_empty() {
            continue;
        }
        out.push('=');
        if can_unquote_attr_value(value) {
            out.push_str(&value.replace('&', "&amp;"));
        } else {
            let quote = choose_attr_quote(value);
            out.push(quote);
            out.push_str(&escape_attr_value(value, quote));
            out.push(quote);
        }
    }
    out.push('>');
    out
}

/// Render an end tag (`</name>`).
#[must_use]
pub fn serialize_end_tag(name: &str) -> String {
    format!("</{name}>")
}

/// Convert a subtree to an HTML string.
///
/// With `pretty`, children are indented by `indent_size` spaces per level and
/// text-only elements render inline.
#[must_use]
pub fn to_html(tree: &DomTree, id: NodeId, pretty: bool, indent_size: usize) -> String {
    match tree.get(id).map(|n| &n.node_type) {
        Some(NodeType::Document | NodeType::DocumentFragment) => {
            let parts: Vec<String> = tree
                .children(id)
                .iter()
                .map(|&child| node_to_html(tree, child, 0, indent_size, pretty))
                .filter(|s| !s.is_empty())
                .collect();
            if pretty {
                parts.join("\n")
            } else {
                parts.concat()
            }
        }
        _ => node_to_html(tree, id, 0, indent_size, pretty),
    }
}

fn node_to_html(tree: &DomTree, id: NodeId, indent: usize, indent_size: usize, pretty: bool) -> String {
    let prefix = if pretty {
        " ".repeat(indent * indent_size)
    } else {
        String::new()
    };
    let newline = if pretty { "\n" } else { "" };

    let node = match tree.get(id) {
        Some(node) => node,
        None => return String::new(),
    };

    match &node.node_type {
        NodeType::Text(data) => {
            if pretty {
                let trimmed = data.trim();
                if trimmed.is_empty() {
                    String::new()
                } else {
                    format!("{prefix}{}", escape_text(trimmed))
                }
            } else {
                escape_text(data)
            }
        }
        NodeType::Comment(data) => format!("{prefix}<!--{data}-->"),
        NodeType::Doctype(_) => format!("{prefix}<!DOCTYPE html>"),
        NodeType::Document | NodeType::DocumentFragment => {
            let parts: Vec<String> = node
                .children
                .iter()
                .map(|&child| node_to_html(tree, child, indent, indent_size, pretty))
                .filter(|s| !s.is_empty())
                .collect();
            if pretty {
                parts.join(newline)
            } else {
                parts.concat()
            }
        }
        NodeType::Element(data) => {
            let open_tag = serialize_start_tag(&data.name, &data.attrs);

            if data.is_html() && is_void_element(&data.name) {
                return format!("{prefix}{open_tag}");
            }

            if node.children.is_empty() {
                return format!("{prefix}{open_tag}{}", serialize_end_tag(&data.name));
            }

            let all_text = node
                .children
                .iter()
                .all(|&child| matches!(tree.get(child).map(|n| &n.node_type), Some(NodeType::Text(_))));

            if all_text && pretty {
                let text: String = node
                    .children
                    .iter()
                    .filter_map(|&child| tree.as_text(child))
                    .collect();
                return format!(
                    "{prefix}{open_tag}{}{}",
                    escape_text(&text),
                    serialize_end_tag(&data.name)
                );
            }

            let mut parts = vec![format!("{prefix}{open_tag}")];
            for &child in &node.children {
                let child_html = node_to_html(tree, child, indent + 1, indent_size, pretty);
                if !child_html.is_empty() {
                    parts.push(child_html);
                }
            }
            parts.push(format!("{prefix}{}", serialize_end_tag(&data.name)));
            if pretty {
                parts.join(newline)
            } else {
                parts.concat()
            }
        }
    }
}

/// Convert a subtree to the html5lib-tests canonical format.
///
/// This format is used by html5lib-tests for validating parser output:
/// `| ` prefixes, two-space indents, attributes sorted by display name,
/// foreign elements prefixed with their namespace, template contents under a
/// `content` pseudo-node indented two extra levels.
#[must_use]
pub fn to_test_format(tree: &DomTree, id: NodeId) -> String {
    match tree.get(id).map(|n| &n.node_type) {
        Some(NodeType::Document | NodeType::DocumentFragment) => {
            let parts: Vec<String> = tree
                .children(id)
                .iter()
                .map(|&child| node_to_test_format(tree, child, 0))
                .collect();
            parts.join("\n")
        }
        _ => node_to_test_format(tree, id, 0),
    }
}

fn node_to_test_format(tree: &DomTree, id: NodeId, indent: usize) -> String {
    let pad = " ".repeat(indent);
    let node = match tree.get(id) {
        Some(node) => node,
        None => return String::new(),
    };

    match &node.node_type {
        NodeType::Comment(data) => format!("| {pad}<!-- {data} -->"),
        NodeType::Doctype(data) => doctype_to_test_format(data),
        NodeType::Text(data) => format!("| {pad}\"{data}\""),
        NodeType::Document | NodeType::DocumentFragment => {
            let parts: Vec<String> = node
                .children
                .iter()
                .map(|&child| node_to_test_format(tree, child, indent))
                .collect();
            parts.join("\n")
        }
        NodeType::Element(data) => {
            let qualified = match data.namespace.test_prefix() {
                Some(ns) => format!("{ns} {}", data.name),
                None => data.name.clone(),
            };
            let mut sections = vec![format!("| {pad}<{qualified}>")];
            sections.extend(attrs_to_test_format(&data.attrs, data.namespace, indent));

            if let Some(contents) = data.template_contents {
                sections.push(format!("| {pad}  content"));
                for &child in tree.children(contents) {
                    sections.push(node_to_test_format(tree, child, indent + 4));
                }
            }

            for &child in &node.children {
                sections.push(node_to_test_format(tree, child, indent + 2));
            }
            sections.join("\n")
        }
    }
}

fn attrs_to_test_format(attrs: &AttrList, namespace: Namespace, indent: usize) -> Vec<String> {
    if attrs.is_empty() {
        return Vec::new();
    }

    let pad = " ".repeat(indent + 2);
    let mut display: Vec<(String, String)> = attrs
        .iter()
        .map(|attr| {
            let mut name = attr.name.clone();
            if !matches!(namespace, Namespace::Html)
                && ADJUSTED_FOREIGN_ATTRIBUTES.contains(&attr.name.to_ascii_lowercase().as_str())
            {
                name = name.replace(':', " ");
            }
            (name, attr.value.clone().unwrap_or_default())
        })
        .collect();

    // Sorted by display name for canonical test output
    display.sort();

    display
        .into_iter()
        .map(|(name, value)| format!("| {pad}{name}=\"{value}\""))
        .collect()
}

fn doctype_to_test_format(data: &crate::DoctypeData) -> String {
    let mut out = String::from("| <!DOCTYPE");
    match &data.name {
        Some(name) if !name.is_empty() => {
            out.push(' ');
            out.push_str(name);
        }
        _ => out.push(' '),
    }

    if data.public_id.is_some() || data.system_id.is_some() {
        let public = data.public_id.as_deref().unwrap_or("");
        let system = data.system_id.as_deref().unwrap_or("");
        out.push_str(&format!(" \"{public}\" \"{system}\""));
    }

    out.push('>');
    out
}
