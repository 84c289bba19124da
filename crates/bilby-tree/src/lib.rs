//! Styleable node capability and arena element tree for the Bilby styling engine.
//!
//! The styling core never owns the element tree it styles. Everything it needs
//! from a node is expressed by the [`Styleable`] trait: identity, type name and
//! namespace, id, classes, attributes, the current pseudo-class state, and
//! enough tree navigation to evaluate combinators and structural pseudo-classes.
//!
//! # Design
//!
//! [`ElementTree`] is the reference implementation: an arena with [`NodeId`]
//! indices, providing O(1) access and traversal without borrow checker issues.
//! Embedders with their own widget hierarchy implement [`Styleable`] directly
//! and never touch the arena.

use std::collections::{HashMap, HashSet};

/// Map of attribute names to values for an element.
pub type AttributesMap = HashMap<String, String>;

/// A node in an element tree, as seen by the styling engine.
///
/// Navigation methods return owned handles (`Self` is expected to be a cheap
/// `Copy` reference type such as [`ElementRef`]). All accessors must be pure:
/// repeated calls between mutations return the same answers, which is what
/// makes selector matching deterministic and cacheable.
pub trait Styleable: Sized {
    /// Stable identity of this node, used as the style cache key.
    ///
    /// Two live nodes must never share a key; a key may be reused after the
    /// node it belonged to is dropped (the embedder then invalidates it).
    fn key(&self) -> u64;

    /// The element type name, e.g. `button` or `slider`.
    fn type_name(&self) -> &str;

    /// The namespace URI this element belongs to, if any.
    fn namespace_uri(&self) -> Option<&str> {
        None
    }

    /// The style id of this element (the `#id` selector target), if any.
    fn style_id(&self) -> Option<&str>;

    /// The set of style classes on this element.
    fn style_classes(&self) -> HashSet<&str>;

    /// Look up an attribute value by name.
    fn attribute_value(&self, name: &str) -> Option<&str>;

    /// The pseudo-class state this node is currently in (e.g. `hover`),
    /// or `None` for the default state.
    fn pseudo_class_state(&self) -> Option<&str> {
        None
    }

    /// The parent node, or `None` at the root.
    fn parent(&self) -> Option<Self>;

    /// The element children of this node, in document order.
    fn children(&self) -> Vec<Self>;

    /// The immediately preceding sibling, or `None` for a first child.
    fn previous_sibling(&self) -> Option<Self>;
}

/// Sibling position bookkeeping for one node, used by the structural
/// pseudo-classes (`:first-child`, `:nth-of-type(..)`, …).
///
/// Positions are 1-indexed per the selector grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildrenInfo {
    /// 1-indexed position of the node among its parent's children.
    pub index: usize,
    /// Total number of children of the node's parent.
    pub count: usize,
    /// 1-indexed position among siblings sharing the node's type name.
    pub index_of_type: usize,
    /// Number of siblings sharing the node's type name (including the node).
    pub count_of_type: usize,
}

/// Compute sibling positions and counts for a node.
///
/// A node without a parent is treated as an only child, so `:first-child`
/// and `:last-child` both hold at the root.
#[must_use]
pub fn children_info<N: Styleable>(node: &N) -> ChildrenInfo {
    let Some(parent) = node.parent() else {
        return ChildrenInfo {
            index: 1,
            count: 1,
            index_of_type: 1,
            count_of_type: 1,
        };
    };

    let mut info = ChildrenInfo {
        index: 0,
        count: 0,
        index_of_type: 0,
        count_of_type: 0,
    };

    for child in parent.children() {
        info.count += 1;
        let same_type = child.type_name() == node.type_name();
        if same_type {
            info.count_of_type += 1;
        }
        if child.key() == node.key() {
            info.index = info.count;
            info.index_of_type = info.count_of_type;
        }
    }

    info
}

/// Visit `node` and every descendant exactly once, in document order.
///
/// The callback may return [`Descend::Skip`] to prune a subtree (used by the
/// save-for-subtree cache mode) or [`Descend::Stop`] to abort the walk.
/// Returns `false` when the walk was aborted.
pub fn enumerate_with_descendants<N: Styleable, F>(node: &N, visit: &mut F) -> bool
where
    F: FnMut(&N) -> Descend,
{
    match visit(node) {
        Descend::Stop => false,
        Descend::Skip => true,
        Descend::Continue => {
            for child in node.children() {
                if !enumerate_with_descendants(&child, visit) {
                    return false;
                }
            }
            true
        }
    }
}

/// Control value returned by the visitor of [`enumerate_with_descendants`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Descend {
    /// Continue into this node's children.
    Continue,
    /// Do not visit this node's children.
    Skip,
    /// Abort the whole walk.
    Stop,
}

/// A type-safe index into an [`ElementTree`].
///
/// `NodeId` provides O(1) access to any node in the tree without borrowing
/// issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root node is always at index 0.
    pub const ROOT: NodeId = NodeId(0);
}

/// Element-specific data stored for each node of an [`ElementTree`].
#[derive(Debug, Clone)]
pub struct ElementData {
    /// The element type name (e.g. `button`).
    pub type_name: String,
    /// The namespace URI this element belongs to, if any.
    pub namespace: Option<String>,
    /// The element's attribute list. The `id` and `class` attributes double
    /// as the style id and style class set.
    pub attrs: AttributesMap,
    /// The pseudo-class state the element is currently in, if any.
    pub state: Option<String>,
}

impl ElementData {
    /// Create element data with the given type name and no attributes.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            namespace: None,
            attrs: AttributesMap::new(),
            state: None,
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").map(String::as_str)
    }

    /// Returns the set of class names from the class attribute.
    #[must_use]
    pub fn classes(&self) -> HashSet<&str> {
        match self.attrs.get("class") {
            Some(classlist) => classlist.split_ascii_whitespace().collect(),
            None => HashSet::new(),
        }
    }
}

/// One node of an [`ElementTree`].
///
/// Stores indices for parent/child/sibling relationships, enabling O(1)
/// traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// The element payload.
    pub data: ElementData,
    /// The parent node, or `None` at the root.
    pub parent: Option<NodeId>,
    /// Children in document order.
    pub children: Vec<NodeId>,
    /// The node immediately following this one among its siblings.
    pub next_sibling: Option<NodeId>,
    /// The node immediately preceding this one among its siblings.
    pub prev_sibling: Option<NodeId>,
}

/// Arena-based element tree with O(1) node access and traversal.
///
/// All nodes live in a contiguous vector, using indices for relationships.
/// This gives O(1) access by [`NodeId`], O(1) parent/sibling traversal, and
/// no borrowing issues (indices instead of references).
#[derive(Debug, Clone)]
pub struct ElementTree {
    /// All nodes in the tree, indexed by `NodeId`.
    /// The root node is always at index 0 (`NodeId::ROOT`).
    nodes: Vec<Node>,
}

impl ElementTree {
    /// Create a new tree whose root has the given type name.
    #[must_use]
    pub fn new(root_type: impl Into<String>) -> Self {
        let root = Node {
            data: ElementData::new(root_type),
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        ElementTree { nodes: vec![root] }
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

    /// Get the number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (it never is; the root always exists).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, data: ElementData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            data,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Append `child` as the last child of `parent`, updating all
    /// parent/sibling relationships.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// Set an attribute on a node. The caller is responsible for reporting
    /// the mutation to the style engine so cached styles are dropped.
    pub fn set_attribute(&mut self, id: NodeId, name: impl Into<String>, value: impl Into<String>) {
        if let Some(node) = self.get_mut(id) {
            let _ = node.data.attrs.insert(name.into(), value.into());
        }
    }

    /// Set the pseudo-class state of a node (`None` = default state). The
    /// caller is responsible for reporting the mutation to the style engine.
    pub fn set_state(&mut self, id: NodeId, state: Option<String>) {
        if let Some(node) = self.get_mut(id) {
            node.data.state = state;
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Borrow a [`Styleable`] handle for a node.
    #[must_use]
    pub fn element(&self, id: NodeId) -> ElementRef<'_> {
        ElementRef { tree: self, id }
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'tree> {
    tree: &'tree ElementTree,
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

/// A cheap `(tree, id)` handle implementing [`Styleable`].
#[derive(Clone, Copy, Debug)]
pub struct ElementRef<'tree> {
    tree: &'tree ElementTree,
    id: NodeId,
}

impl ElementRef<'_> {
    /// The node ID this handle points at.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    fn data(&self) -> &ElementData {
        &self
            .tree
            .get(self.id)
            .expect("ElementRef points at a live node")
            .data
    }
}

impl Styleable for ElementRef<'_> {
    fn key(&self) -> u64 {
        self.id.0 as u64
    }

    fn type_name(&self) -> &str {
        &self.data().type_name
    }

    fn namespace_uri(&self) -> Option<&str> {
        self.data().namespace.as_deref()
    }

    fn style_id(&self) -> Option<&str> {
        self.data().id()
    }

    fn style_classes(&self) -> HashSet<&str> {
        self.data().classes()
    }

    fn attribute_value(&self, name: &str) -> Option<&str> {
        self.data().attrs.get(name).map(String::as_str)
    }

    fn pseudo_class_state(&self) -> Option<&str> {
        self.data().state.as_deref()
    }

    fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| self.tree.element(id))
    }

    fn children(&self) -> Vec<Self> {
        self.tree
            .children(self.id)
            .iter()
            .map(|&id| self.tree.element(id))
            .collect()
    }

    fn previous_sibling(&self) -> Option<Self> {
        self.tree
            .prev_sibling(self.id)
            .map(|id| self.tree.element(id))
    }
}
