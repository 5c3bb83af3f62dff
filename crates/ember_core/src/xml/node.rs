//! Markup tree node types.
//!
//! An [`XmlNode`] owns its children outright. The link back to the parent is
//! a [`NodePath`] (the route of child indices from the document root), so a
//! node never holds a reference to anything above it and dropping the root
//! drops the whole tree.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Route of child indices from the document root to a node.
///
/// The root has an empty path. `/0/2` is the third child of the root's
/// first child.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    /// Path of the document root.
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Child indices from the root, outermost first.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Nesting depth (0 for the root).
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of the enclosing node, `None` for the root.
    pub fn parent(&self) -> Option<NodePath> {
        match self.0.split_last() {
            Some((_, rest)) => Some(Self(rest.to_vec())),
            None => None,
        }
    }

    /// Path of the `index`-th child of this node.
    pub fn child(&self, index: usize) -> NodePath {
        let mut indices = Vec::with_capacity(self.0.len() + 1);
        indices.extend_from_slice(&self.0);
        indices.push(index);
        Self(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

/// A single node of a parsed markup document.
///
/// A node carries either child nodes or a text payload, never both. Nodes
/// without children keep the raw text found between their header and
/// trailer in [`data`](Self::data) (possibly empty).
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct XmlNode {
    /// Tag name from the header
    name: String,

    /// Attributes from the header, keyed by attribute name
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    attributes: BTreeMap<String, String>,

    /// Raw text between header and trailer (leaf nodes only)
    #[serde(skip_serializing_if = "String::is_empty")]
    data: String,

    /// Child nodes in document order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<XmlNode>,

    /// Position in the tree; the parent is this path minus its last index
    #[serde(skip)]
    path: NodePath,
}

impl XmlNode {
    /// Create an empty, unattached node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty node that will be attached at `path`.
    pub(crate) fn with_path(path: NodePath) -> Self {
        Self {
            path,
            ..Self::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Look up a single attribute. Returns `None` if it is not set.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Look up an attribute and parse it, e.g. `node.attribute_as::<f32>("scale")`.
    ///
    /// Returns `None` if the attribute is missing or does not parse.
    pub fn attribute_as<T: FromStr>(&self, key: &str) -> Option<T> {
        self.attribute(key).and_then(|value| value.trim().parse().ok())
    }

    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Set an attribute, returning the value it replaced.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.attributes.insert(key.into(), value.into())
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    /// Raw text payload. Always empty for nodes with children.
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn set_data(&mut self, data: impl Into<String>) {
        self.data = data.into();
    }

    /// Append `child` as the last child of this node.
    ///
    /// The child (and its whole subtree) is re-pointed at this node.
    pub fn append_child(&mut self, mut child: XmlNode) {
        let path = self.path.child(self.children.len());
        if child.path != path {
            child.reroot(path);
        }
        self.children.push(child);
    }

    /// Children in document order.
    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> + 'a {
        self.children.iter().filter(move |child| child.name == name)
    }

    /// True if the node has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Path of the parent node, `None` for a root or unattached node.
    pub fn parent(&self) -> Option<NodePath> {
        self.path.parent()
    }

    pub fn path(&self) -> &NodePath {
        &self.path
    }

    /// Depth-first, document-order traversal starting with this node.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    /// Find the node at `path` within this node's subtree.
    ///
    /// `path` is absolute; it must start with this node's own path.
    pub fn resolve(&self, path: &NodePath) -> Option<&XmlNode> {
        let relative = path.indices().strip_prefix(self.path.indices())?;
        let mut node = self;
        for &index in relative {
            node = node.children.get(index)?;
        }
        Some(node)
    }

    /// Find the parent of `node` within this node's subtree.
    pub fn parent_of(&self, node: &XmlNode) -> Option<&XmlNode> {
        self.resolve(&node.parent()?)
    }

    fn reroot(&mut self, path: NodePath) {
        self.path = path;
        for (index, child) in self.children.iter_mut().enumerate() {
            child.reroot(self.path.child(index));
        }
    }
}

/// Iterator returned by [`XmlNode::descendants`].
pub struct Descendants<'a> {
    stack: Vec<&'a XmlNode>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a XmlNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}
