//! ComponentNode type definition

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Prop map of a node. Insertion order is kept for deterministic output,
/// equality ignores it.
pub type Props = serde_json::Map<String, Value>;

/// A node in the UI component tree.
///
/// Children are owned exclusively by their parent, so the tree is acyclic
/// and subtrees are never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentNode {
    /// Component type; whitelisted after validation.
    #[serde(rename = "type")]
    pub component_type: String,
    /// Props; empty means "no props" and is omitted on the wire.
    #[serde(default, skip_serializing_if = "Props::is_empty")]
    pub props: Props,
    /// Ordered children; empty means "no children" and is omitted on the wire.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
}

/// A child of a component: another node or literal text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Child {
    Text(String),
    Node(ComponentNode),
}

impl ComponentNode {
    /// Create a node without props or children.
    pub fn new(component_type: impl Into<String>) -> Self {
        Self {
            component_type: component_type.into(),
            props: Props::new(),
            children: Vec::new(),
        }
    }

    /// Set a prop (builder style).
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Append a child node (builder style).
    pub fn with_child(mut self, child: ComponentNode) -> Self {
        self.children.push(Child::Node(child));
        self
    }

    /// Append a text child (builder style).
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Child::Text(text.into()));
        self
    }

    /// Get a prop value.
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Iterate over child nodes, skipping text children.
    pub fn child_nodes(&self) -> impl Iterator<Item = &ComponentNode> {
        self.children.iter().filter_map(|child| match child {
            Child::Node(node) => Some(node),
            Child::Text(_) => None,
        })
    }

    /// Depth-first pre-order walk over this node and all descendant nodes.
    pub fn walk(&self) -> Vec<&ComponentNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            let children: Vec<&ComponentNode> = node.child_nodes().collect();
            stack.extend(children.into_iter().rev());
        }
        out
    }

    /// Find the first node (pre-order) of the given type.
    pub fn find_first(&self, component_type: &str) -> Option<&ComponentNode> {
        self.walk()
            .into_iter()
            .find(|n| n.component_type == component_type)
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        self.walk().len()
    }
}

impl From<ComponentNode> for Child {
    fn from(value: ComponentNode) -> Self {
        Child::Node(value)
    }
}

impl From<&str> for Child {
    fn from(value: &str) -> Self {
        Child::Text(value.to_string())
    }
}
