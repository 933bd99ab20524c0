//! Tests for the HTML serializer and the html5lib-format tree dump.

use bilby_dom::serialize::{serialize_start_tag, to_html, to_test_format};
use bilby_dom::{AttrList, Attribute, DoctypeData, DomTree, ElementData, Namespace, NodeId, NodeType};

fn element(tree: &mut DomTree, tag: &str, attrs: AttrList) -> NodeId {
    tree.alloc(NodeType::Element(ElementData {
        name: tag.to_string(),
        namespace: Namespace::Html,
        attrs,
        template_contents: None,
    }))
}

fn attr(name: &str, value: Option<&str>) -> Attribute {
    Attribute::new(name.to_string(), value.map(str::to_string))
}

// ========== start tags ==========

#[test]
fn test_start_tag_unquoted_value() {
    let mut attrs = AttrList::new();
    attrs.push(attr("id", Some("main")));
    assert_eq!(serialize_start_tag("div", &attrs), "<div id=main>");
}

#[test]
fn test_start_tag_quotes_whitespace_values() {
    let mut attrs = AttrList::new();
    attrs.push(attr("class", Some("a b")));
    assert_eq!(serialize_start_tag("div", &attrs), "<div class=\"a b\">");
}

#[test]
fn test_start_tag_single_quotes_when_value_has_double() {
    let mut attrs = AttrList::new();
    attrs.push(attr("title", Some("say \"hi\"")));
    assert_eq!(
        serialize_start_tag("span", &attrs),
        "<span title='say \"hi\"'>"
    );
}

#[test]
fn test_start_tag_escapes_amp_and_matching_quote() {
    let mut attrs = AttrList::new();
    attrs.push(attr("data-x", Some("a&b \"c\" 'd'")));
    // Both quote kinds present: double quotes win, embedded doubles escape.
    assert_eq!(
        serialize_start_tag("i", &attrs),
        "<i data-x=\"a&amp;b &quot;c&quot; 'd'\">"
    );
}

#[test]
fn test_start_tag_valueless_attribute() {
    let mut attrs = AttrList::new();
    attrs.push(attr("disabled", None));
    attrs.push(attr("checked", Some("")));
    assert_eq!(serialize_start_tag("input", &attrs), "<input disabled checked>");
}

// ========== full serialization ==========

#[test]
fn test_to_html_escapes_text() {
    let mut tree = DomTree::new();
    let p = element(&mut tree, "p", AttrList::new());
    tree.append_child(NodeId::ROOT, p);
    let text = tree.alloc(NodeType::Text("1 < 2 & 3 > 2".to_string()));
    tree.append_child(p, text);

    assert_eq!(
        to_html(&tree, NodeId::ROOT, false, 2),
        "<p>1 &lt; 2 &amp; 3 &gt; 2</p>"
    );
}

#[test]
fn test_to_html_void_elements_have_no_end_tag() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, "body", AttrList::new());
    tree.append_child(NodeId::ROOT, body);
    let br = element(&mut tree, "br", AttrList::new());
    tree.append_child(body, br);
    let hr = element(&mut tree, "hr", AttrList::new());
    tree.append_child(body, hr);

    assert_eq!(to_html(&tree, NodeId::ROOT, false, 2), "<body><br><hr></body>");
}

#[test]
fn test_to_html_comment_and_doctype() {
    let mut tree = DomTree::new();
    let doctype = tree.alloc(NodeType::Doctype(DoctypeData {
        name: Some("html".to_string()),
        ..DoctypeData::default()
    }));
    tree.append_child(NodeId::ROOT, doctype);
    let comment = tree.alloc(NodeType::Comment(" hi ".to_string()));
    tree.append_child(NodeId::ROOT, comment);

    assert_eq!(
        to_html(&tree, NodeId::ROOT, false, 2),
        "<!DOCTYPE html><!-- hi -->"
    );
}

// ========== test format ==========

#[test]
fn test_dump_sorts_attributes() {
    let mut tree = DomTree::new();
    let mut attrs = AttrList::new();
    attrs.push(attr("zeta", Some("1")));
    attrs.push(attr("alpha", Some("2")));
    let div = element(&mut tree, "div", attrs);
    tree.append_child(NodeId::ROOT, div);

    assert_eq!(
        to_test_format(&tree, NodeId::ROOT),
        "| <div>\n|   alpha=\"2\"\n|   zeta=\"1\""
    );
}

#[test]
fn test_dump_foreign_namespace_prefix() {
    let mut tree = DomTree::new();
    let svg = tree.alloc(NodeType::Element(ElementData {
        name: "svg".to_string(),
        namespace: Namespace::Svg,
        attrs: AttrList::new(),
        template_contents: None,
    }));
    tree.append_child(NodeId::ROOT, svg);
    let mut attrs = AttrList::new();
    attrs.push(attr("xlink:href", Some("#a")));
    let a = tree.alloc(NodeType::Element(ElementData {
        name: "a".to_string(),
        namespace: Namespace::Svg,
        attrs,
        template_contents: None,
    }));
    tree.append_child(svg, a);

    assert_eq!(
        to_test_format(&tree, NodeId::ROOT),
        "| <svg svg>\n|   <svg a>\n|     xlink href=\"#a\""
    );
}

#[test]
fn test_dump_doctype_with_identifiers() {
    let mut tree = DomTree::new();
    let doctype = tree.alloc(NodeType::Doctype(DoctypeData {
        name: Some("html".to_string()),
        public_id: Some("-//W3C//DTD HTML 4.01//EN".to_string()),
        system_id: Some("http://www.w3.org/TR/html4/strict.dtd".to_string()),
        force_quirks: false,
    }));
    tree.append_child(NodeId::ROOT, doctype);

    assert_eq!(
        to_test_format(&tree, NodeId::ROOT),
        "| <!DOCTYPE html \"-//W3C//DTD HTML 4.01//EN\" \"http://www.w3.org/TR/html4/strict.dtd\">"
    );
}

#[test]
fn test_dump_template_contents() {
    let mut tree = DomTree::new();
    let template = element(&mut tree, "template", AttrList::new());
    tree.append_child(NodeId::ROOT, template);
    let contents = tree.template_contents(template).expect("contents");
    let span = element(&mut tree, "span", AttrList::new());
    tree.append_child(contents, span);

    assert_eq!(
        to_test_format(&tree, NodeId::ROOT),
        "| <template>\n|   content\n|     <span>"
    );
}

#[test]
fn test_dump_text_and_comment() {
    let mut tree = DomTree::new();
    let body = element(&mut tree, "body", AttrList::new());
    tree.append_child(NodeId::ROOT, body);
    let text = tree.alloc(NodeType::Text("x".to_string()));
    tree.append_child(body, text);
    let comment = tree.alloc(NodeType::Comment("note".to_string()));
    tree.append_child(body, comment);

    assert_eq!(
        to_test_format(&tree, NodeId::ROOT),
        "| <body>\n|   \"x\"\n|   <!-- note -->"
    );
}
