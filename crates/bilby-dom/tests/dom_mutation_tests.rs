//! Tests for DOM tree mutation methods: remove_child, insert_child_at,
//! move_children, clone_subtree.

use bilby_dom::{AttrList, Attribute, DomTree, ElementData, Namespace, NodeId, NodeType};

/// Helper to create an element node and return its NodeId.
fn alloc_element(tree: &mut DomTree, tag: &str) -> NodeId {
    tree.alloc(NodeType::Element(ElementData {
        name: tag.to_string(),
        namespace: Namespace::Html,
        attrs: AttrList::new(),
        template_contents: None,
    }))
}

fn alloc_text(tree: &mut DomTree, data: &str) -> NodeId {
    tree.alloc(NodeType::Text(data.to_string()))
}

// ========== append_child / remove_child ==========

#[test]
fn test_append_and_remove_single_child() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let child = alloc_element(&mut tree, "p");
    tree.append_child(parent, child);

    assert_eq!(tree.children(parent).len(), 1);
    assert_eq!(tree.parent(child), Some(parent));

    tree.remove_child(parent, child);

    assert_eq!(tree.children(parent).len(), 0);
    assert_eq!(tree.parent(child), None);
}

#[test]
fn test_append_child_reparents() {
    let mut tree = DomTree::new();
    let first = alloc_element(&mut tree, "div");
    let second = alloc_element(&mut tree, "section");
    tree.append_child(NodeId::ROOT, first);
    tree.append_child(NodeId::ROOT, second);

    let child = alloc_element(&mut tree, "p");
    tree.append_child(first, child);
    tree.append_child(second, child);

    assert_eq!(tree.children(first).len(), 0);
    assert_eq!(tree.children(second), &[child]);
    assert_eq!(tree.parent(child), Some(second));
}

#[test]
fn test_remove_middle_child_preserves_order() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let a = alloc_element(&mut tree, "a");
    let b = alloc_element(&mut tree, "b");
    let c = alloc_element(&mut tree, "i");
    tree.append_child(parent, a);
    tree.append_child(parent, b);
    tree.append_child(parent, c);

    tree.remove_child(parent, b);

    assert_eq!(tree.children(parent), &[a, c]);
}

// ========== insert_child_at ==========

#[test]
fn test_insert_child_at_front() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "body");
    tree.append_child(NodeId::ROOT, parent);

    let table = alloc_element(&mut tree, "table");
    tree.append_child(parent, table);

    // Foster parenting inserts immediately before the table.
    let text = alloc_text(&mut tree, "fostered");
    tree.insert_child_at(parent, 0, text);

    assert_eq!(tree.children(parent), &[text, table]);
    assert_eq!(tree.parent(text), Some(parent));
}

#[test]
fn test_insert_child_at_clamps_to_end() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);

    let child = alloc_element(&mut tree, "p");
    tree.insert_child_at(parent, 42, child);

    assert_eq!(tree.children(parent), &[child]);
}

// ========== move_children ==========

#[test]
fn test_move_children_preserves_order() {
    let mut tree = DomTree::new();
    let from = alloc_element(&mut tree, "b");
    let to = alloc_element(&mut tree, "i");
    tree.append_child(NodeId::ROOT, from);
    tree.append_child(NodeId::ROOT, to);

    let x = alloc_text(&mut tree, "x");
    let y = alloc_text(&mut tree, "y");
    tree.append_child(from, x);
    tree.append_child(from, y);

    tree.move_children(from, to);

    assert_eq!(tree.children(from).len(), 0);
    assert_eq!(tree.children(to), &[x, y]);
    assert_eq!(tree.parent(x), Some(to));
    assert_eq!(tree.parent(y), Some(to));
}

// ========== clone_subtree ==========

#[test]
fn test_clone_subtree_is_deep_and_detached() {
    let mut tree = DomTree::new();
    let parent = alloc_element(&mut tree, "div");
    tree.append_child(NodeId::ROOT, parent);
    let child = alloc_element(&mut tree, "em");
    tree.append_child(parent, child);
    let text = alloc_text(&mut tree, "hello");
    tree.append_child(child, text);

    let clone = tree.clone_subtree(parent);

    assert_ne!(clone, parent);
    assert_eq!(tree.parent(clone), None);
    assert_eq!(tree.element_name(clone), Some("div"));

    let clone_child = tree.children(clone)[0];
    assert_eq!(tree.element_name(clone_child), Some("em"));
    let clone_text = tree.children(clone_child)[0];
    assert_eq!(tree.as_text(clone_text), Some("hello"));

    // Mutating the clone leaves the original alone.
    tree.push_text(clone_text, "!");
    assert_eq!(tree.as_text(text), Some("hello"));
}

#[test]
fn test_clone_subtree_clones_template_contents() {
    let mut tree = DomTree::new();
    let template = tree.alloc(NodeType::Element(ElementData {
        name: "template".to_string(),
        namespace: Namespace::Html,
        attrs: AttrList::new(),
        template_contents: None,
    }));
    tree.append_child(NodeId::ROOT, template);

    let contents = tree.template_contents(template).expect("content fragment");
    let inner = alloc_element(&mut tree, "span");
    tree.append_child(contents, inner);

    let clone = tree.clone_subtree(template);
    let clone_contents = tree.template_contents(clone).expect("cloned contents");
    assert_ne!(clone_contents, contents);
    assert_eq!(tree.children(clone_contents).len(), 1);
    assert_eq!(
        tree.element_name(tree.children(clone_contents)[0]),
        Some("span")
    );
}

// ========== attributes ==========

#[test]
fn test_attr_list_order_and_lookup() {
    let mut attrs = AttrList::new();
    attrs.push(Attribute::new("id".to_string(), Some("main".to_string())));
    attrs.push(Attribute::new("disabled".to_string(), None));
    attrs.push(Attribute::new("class".to_string(), Some("x y".to_string())));

    assert_eq!(attrs.len(), 3);
    assert_eq!(attrs.get("id"), Some("main"));
    // Valueless attributes report the empty string.
    assert_eq!(attrs.get("disabled"), Some(""));
    assert_eq!(attrs.get("missing"), None);

    // Insertion order is observable.
    let names: Vec<&str> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, vec!["id", "disabled", "class"]);

    attrs.push_if_missing(Attribute::new("id".to_string(), Some("other".to_string())));
    assert_eq!(attrs.get("id"), Some("main"));
    assert_eq!(attrs.len(), 3);
}
