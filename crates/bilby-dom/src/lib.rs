//! DOM tree implementation for the Bilby HTML parser.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/), shaped for
//! construction by the HTML tree builder.
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all
//! relationships, providing O(1) access and traversal without borrow checker
//! issues. Tree construction (foster parenting, the adoption agency
//! algorithm) reparents nodes freely, so all mutation primitives work on
//! `NodeId`s and fix up parent/sibling links in place.

pub mod serialize;

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node (Document or DocumentFragment) is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// Element namespaces the HTML parser can produce.
///
/// [§ 13.2.6.5 The rules for parsing tokens in foreign content](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inforeign)
///
/// HTML parsing only ever creates elements in these three namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// The HTML namespace, `http://www.w3.org/1999/xhtml`.
    Html,
    /// The SVG namespace, `http://www.w3.org/2000/svg`.
    Svg,
    /// The MathML namespace, `http://www.w3.org/1998/Math/MathML`.
    MathMl,
}

impl Namespace {
    /// The short prefix used by the html5lib tree-dump format (`svg circle`,
    /// `math mi`). HTML-namespace elements carry no prefix.
    #[must_use]
    pub const fn test_prefix(self) -> Option<&'static str> {
        match self {
            Self::Html => None,
            Self::Svg => Some("svg"),
            Self::MathMl => Some("math"),
        }
    }
}

/// An attribute on an element.
///
/// Per [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization):
/// "a list of attributes, each of which has a name and a value"
///
/// A `None` value models a valueless attribute (`<input disabled>`), which is
/// distinct from an explicit empty value (`disabled=""`). Both serialize the
/// same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// "each of which has a name"
    pub name: String,
    /// "and a value"
    pub value: Option<String>,
}

impl Attribute {
    /// Create a new attribute with the given name and value.
    #[must_use]
    pub const fn new(name: String, value: Option<String>) -> Self {
        Self { name, value }
    }
}

/// Insertion-ordered attribute list.
///
/// [§ 4.9.2 Interface `NamedNodeMap`](https://dom.spec.whatwg.org/#interface-namednodemap)
///
/// Attribute order is observable (serialization and the adoption agency's
/// attribute signatures both read it), so a plain ordered list is used rather
/// than a hash map. Duplicate names are rejected by the tokenizer before
/// attributes ever reach the tree, so lookups can stop at the first match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrList(Vec<Attribute>);

impl AttrList {
    /// Create an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the list has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up an attribute value by exact name.
    ///
    /// A valueless attribute reports an empty string, matching
    /// `getAttribute`'s observable behavior for boolean attributes.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_deref().unwrap_or(""))
    }

    /// True if an attribute with this exact name is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|attr| attr.name == name)
    }

    /// Append an attribute, keeping insertion order.
    pub fn push(&mut self, attr: Attribute) {
        self.0.push(attr);
    }

    /// Append an attribute only if the name is not already present.
    ///
    /// [§ 13.2.6.4.7](https://html.spec.whatwg.org/multipage/parsing.html#parsing-main-inbody)
    /// "for each attribute on the token, check to see if the attribute is
    /// already present on the element... If it is not, add the attribute"
    pub fn push_if_missing(&mut self, attr: Attribute) {
        if !self.contains(&attr.name) {
            self.0.push(attr);
        }
    }

    /// Iterate over the attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.0.iter()
    }

    /// Mutable iteration, used by foreign-content attribute adjustment.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Attribute> {
        self.0.iter_mut()
    }
}

impl FromIterator<Attribute> for AttrList {
    fn from_iter<T: IntoIterator<Item = Attribute>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AttrList {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Element-specific data.
///
/// Per [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element):
/// - "Elements have an associated namespace, namespace prefix, local name..."
/// - "When an element is created, its local name is always given."
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name". Always ASCII-lowercase for HTML-namespace
    /// elements; foreign elements keep their adjusted case (`foreignObject`).
    pub name: String,
    /// The element's namespace.
    pub namespace: Namespace,
    /// "An element has an associated attribute list"
    pub attrs: AttrList,
    /// [§ 4.12.3 The template element](https://html.spec.whatwg.org/multipage/scripting.html#the-template-element)
    ///
    /// "The template contents of a template element are not children of the
    /// element itself." Only HTML-namespace `template` elements carry a
    /// content fragment; it points at a `DocumentFragment` node in the same
    /// arena.
    pub template_contents: Option<NodeId>,
}

impl ElementData {
    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id")
    }

    /// True for HTML-namespace elements.
    #[must_use]
    pub const fn is_html(&self) -> bool {
        matches!(self.namespace, Namespace::Html)
    }
}

/// Doctype-specific data.
///
/// [§ 13.2.5 Tokenization](https://html.spec.whatwg.org/multipage/parsing.html#tokenization)
///
/// "DOCTYPE tokens have a name, a public identifier, a system identifier,
/// and a force-quirks flag."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DoctypeData {
    /// "a name"
    pub name: Option<String>,
    /// "a public identifier"
    pub public_id: Option<String>,
    /// "a system identifier"
    pub system_id: Option<String>,
    /// "a force-quirks flag"
    pub force_quirks: bool,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.7 Interface DocumentFragment](https://dom.spec.whatwg.org/#interface-documentfragment)
    ///
    /// The root of a fragment parse, and the content holder of `template`
    /// elements.
    DocumentFragment,
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    Doctype(DoctypeData),
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.12 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// This node stores indices for parent/child relationships, enabling O(1)
/// traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,
}

/// Arena-based DOM tree with O(1) node access.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree. A tree is a finite hierarchical
/// tree structure."
///
/// All nodes live in a contiguous vector addressed by [`NodeId`]. Detached
/// nodes stay in the arena (the adoption agency detaches and reattaches
/// freely); nothing is freed until the whole tree is dropped.
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The root node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node at the root.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(NodeType::Document)
    }

    /// Create a new tree rooted at a `DocumentFragment`, used for fragment
    /// parsing.
    ///
    /// [§ 13.2.10 Parsing HTML fragments](https://html.spec.whatwg.org/multipage/parsing.html#parsing-html-fragments)
    #[must_use]
    pub fn new_fragment() -> Self {
        Self::with_root(NodeType::DocumentFragment)
    }

    fn with_root(node_type: NodeType) -> Self {
        Self {
            nodes: vec![Node {
                node_type,
                parent: None,
                children: Vec::new(),
            }],
        }
    }

    /// Get the root node ID.
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Get the number of nodes in the arena (including detached ones).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the arena is empty (never true: the root always exists).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node in the arena and return its ID.
    ///
    /// The node is not yet attached to the tree (no parent). An allocated
    /// HTML `template` element automatically receives its content fragment.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let needs_contents = matches!(
            &node_type,
            NodeType::Element(data) if data.name == "template" && data.is_html()
        );

        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
        });

        // [§ 4.12.3](https://html.spec.whatwg.org/multipage/scripting.html#the-template-element)
        // "the template contents... a DocumentFragment"
        if needs_contents {
            let contents = NodeId(self.nodes.len());
            self.nodes.push(Node {
                node_type: NodeType::DocumentFragment,
                parent: None,
                children: Vec::new(),
            });
            if let Some(NodeType::Element(data)) = self.get_mut(id).map(|n| &mut n.node_type) {
                data.template_contents = Some(contents);
            }
        }
        id
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before
    /// null." Detaches the child from any previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// [§ 4.2.1 Insert](https://dom.spec.whatwg.org/#concept-node-insert)
    ///
    /// Insert `child` into `parent`'s child list at `index` (clamped to the
    /// end). Foster parenting uses this to place nodes immediately before a
    /// table.
    pub fn insert_child_at(&mut self, parent: NodeId, index: usize, child: NodeId) {
        self.detach(child);
        let children = &mut self.nodes[parent.0].children;
        let index = index.min(children.len());
        children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Remove `child` from `parent`'s child list. No-op when the node is not
    /// actually a child of `parent`.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let children = &mut self.nodes[parent.0].children;
        if let Some(position) = children.iter().position(|&id| id == child) {
            children.remove(position);
            self.nodes[child.0].parent = None;
        }
    }

    /// Detach a node from its parent, if it has one.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.nodes[id.0].parent {
            self.remove_child(parent, id);
        }
    }

    /// Move every child of `from` onto the end of `to`'s child list,
    /// preserving order.
    ///
    /// Used by the adoption agency (moving the furthest block's children into
    /// the fresh formatting clone) and by fragment finish (promoting the
    /// synthetic root's children).
    pub fn move_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.nodes[from.0].children);
        for child in &children {
            self.nodes[child.0].parent = Some(to);
        }
        self.nodes[to.0].children.extend(children);
    }

    /// Deep-clone a subtree (the node, its children, and any template
    /// contents) into the same arena. The clone is detached.
    pub fn clone_subtree(&mut self, id: NodeId) -> NodeId {
        let node_type = self.nodes[id.0].node_type.clone();
        let clone = self.alloc(match node_type {
            // alloc() recreates a fresh (empty) content fragment for
            // templates; the original's contents are cloned below.
            NodeType::Element(mut data) => {
                data.template_contents = None;
                NodeType::Element(data)
            }
            other => other,
        });

        let children = self.nodes[id.0].children.clone();
        for child in children {
            let child_clone = self.clone_subtree(child);
            self.append_child(clone, child_clone);
        }

        if let Some(source_contents) = self.template_contents(id) {
            let target_contents = self.template_contents(clone);
            let source_children = self.nodes[source_contents.0].children.clone();
            if let Some(target) = target_contents {
                for child in source_children {
                    let child_clone = self.clone_subtree(child);
                    self.append_child(target, child_clone);
                }
            }
        }
        clone
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the last child of a node.
    #[must_use]
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.last().copied())
    }

    /// Index of `child` within `parent`'s child list.
    #[must_use]
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        self.children(parent).iter().position(|&id| id == child)
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Append to a text node's data. Panics on non-text nodes, which would
    /// indicate a tree-builder bug.
    pub fn push_text(&mut self, id: NodeId, data: &str) {
        match &mut self.nodes[id.0].node_type {
            NodeType::Text(s) => s.push_str(data),
            _ => panic!("push_text called on a non-text node"),
        }
    }

    /// Element local name, when `id` is an element.
    #[must_use]
    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|data| data.name.as_str())
    }

    /// The content fragment of an HTML `template` element, if any.
    #[must_use]
    pub fn template_contents(&self, id: NodeId) -> Option<NodeId> {
        self.as_element(id).and_then(|data| data.template_contents)
    }

    /// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
    ///
    /// Check if `descendant` is a descendant of `ancestor` by walking up the
    /// parent chain.
    #[must_use]
    pub fn is_descendant_of(&self, descendant: NodeId, ancestor: NodeId) -> bool {
        let mut current = self.parent(descendant);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    /// [§ 4.2.5 Ancestor](https://dom.spec.whatwg.org/#concept-tree-ancestor)
    ///
    /// Returns an iterator over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// [§ 4.2.4 Tree order](https://dom.spec.whatwg.org/#concept-tree-order)
    ///
    /// Returns a depth-first, pre-order traversal of the descendants of a
    /// node (not including the node itself). Template contents are not
    /// visited; they are not children of the template.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            stack: self.children(id).iter().rev().copied().collect(),
        }
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is
    /// that document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| matches!(self.get(id).map(|n| &n.node_type), Some(NodeType::Element(_))))
            .copied()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// [§ 4.2.5 Ancestor](https://dom.spec.whatwg.org/#concept-tree-ancestor)
///
/// Iterator that walks up the tree from a node to the root.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// [§ 4.2.6 Descendant](https://dom.spec.whatwg.org/#concept-tree-descendant)
///
/// Iterator that walks the tree in document order (depth-first, pre-order).
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    /// Stack of nodes to visit (children are pushed in reverse order so we
    /// process them left-to-right).
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let children = self.tree.children(id);
        self.stack.extend(children.iter().rev().copied());
        Some(id)
    }
}
