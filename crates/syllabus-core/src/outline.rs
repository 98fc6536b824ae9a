use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// One numbered item of a course content outline.
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineNode {
    /// Dotted id, e.g. `"2.1.3"`.
    pub number: String,
    pub title: String,
    pub body: Option<String>,
    children: Vec<String>,
}

impl OutlineNode {
    fn new(number: &str, title: &str) -> Self {
        Self {
            number: number.to_string(),
            title: title.to_string(),
            body: None,
            children: Vec::new(),
        }
    }

    /// Keys of this node's children, in insertion order.
    pub fn child_numbers(&self) -> &[String] {
        &self.children
    }

    pub fn depth(&self) -> usize {
        self.number.split('.').count()
    }
}

/// Content outline stored as an arena keyed by dotted number.
///
/// A node is only accepted when its parent prefix (`"2.1"` for `"2.1.3"`)
/// is already present. Roots are kept in insertion order, as are each
/// node's children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentOutline {
    nodes: HashMap<String, OutlineNode>,
    roots: Vec<String>,
}

/// Parent key of a dotted number, `None` for a top-level number.
fn parent_of(number: &str) -> Option<&str> {
    number.rsplit_once('.').map(|(parent, _)| parent)
}

impl ContentOutline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Returns `false` when the node was dropped because its
    /// parent does not exist.
    ///
    /// Re-inserting an existing number replaces its title and clears its
    /// body; position and children are kept.
    pub fn insert(&mut self, number: &str, title: &str) -> bool {
        if let Some(existing) = self.nodes.get_mut(number) {
            existing.title = title.to_string();
            existing.body = None;
            return true;
        }

        match parent_of(number) {
            None => self.roots.push(number.to_string()),
            Some(parent) => match self.nodes.get_mut(parent) {
                Some(parent_node) => parent_node.children.push(number.to_string()),
                None => return false,
            },
        }
        self.nodes
            .insert(number.to_string(), OutlineNode::new(number, title));
        true
    }

    /// Append a wrapped line to a node's body, separated by a single space.
    pub fn append_body(&mut self, number: &str, line: &str) -> bool {
        let Some(node) = self.nodes.get_mut(number) else {
            return false;
        };
        match node.body.as_mut() {
            Some(body) => {
                body.push(' ');
                body.push_str(line);
            }
            None => node.body = Some(line.to_string()),
        }
        true
    }

    pub fn get(&self, number: &str) -> Option<&OutlineNode> {
        self.nodes.get(number)
    }

    pub fn contains(&self, number: &str) -> bool {
        self.nodes.contains_key(number)
    }

    /// Top-level nodes in document order.
    pub fn roots(&self) -> impl Iterator<Item = &OutlineNode> {
        self.roots.iter().filter_map(|n| self.nodes.get(n))
    }

    pub fn children(&self, number: &str) -> impl Iterator<Item = &OutlineNode> {
        self.nodes
            .get(number)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|n| self.nodes.get(n))
    }

    /// Depth-first walk in document order.
    pub fn walk(&self) -> Vec<&OutlineNode> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<&str> = self.roots.iter().rev().map(String::as_str).collect();
        while let Some(number) = stack.pop() {
            if let Some(node) = self.nodes.get(number) {
                out.push(node);
                stack.extend(node.children.iter().rev().map(String::as_str));
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

struct NodeView<'a> {
    outline: &'a ContentOutline,
    node: &'a OutlineNode,
}

impl Serialize for NodeView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("title", &self.node.title)?;
        if let Some(body) = &self.node.body {
            map.serialize_entry("body", body)?;
        }
        if !self.node.children.is_empty() {
            map.serialize_entry(
                "children",
                &ChildrenView {
                    outline: self.outline,
                    keys: &self.node.children,
                },
            )?;
        }
        map.end()
    }
}

struct ChildrenView<'a> {
    outline: &'a ContentOutline,
    keys: &'a [String],
}

impl Serialize for ChildrenView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.keys.len()))?;
        for key in self.keys {
            if let Some(node) = self.outline.nodes.get(key) {
                map.serialize_entry(
                    key,
                    &NodeView {
                        outline: self.outline,
                        node,
                    },
                )?;
            }
        }
        map.end()
    }
}

/// Serializes as `{ "1": { "title": .., "children": { "1.1": {..} } } }`
/// in document order.
impl Serialize for ContentOutline {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        ChildrenView {
            outline: self,
            keys: &self.roots,
        }
        .serialize(serializer)
    }
}
