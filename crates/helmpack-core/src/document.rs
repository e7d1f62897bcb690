//! Loosely structured documents
//!
//! Chart values and rendered manifests are arbitrary YAML. Discovery only
//! cares about three shapes: scalars, ordered lists and keyed mappings, so
//! documents are lowered into the closed [`Node`] type and walked with a
//! [`Visitor`].

use serde_yaml::Value;

/// A scalar leaf
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(String),
    String(String),
}

/// A document node
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Scalar),
    List(Vec<Node>),
    /// Entries in document order. Non-scalar keys are dropped.
    Map(Vec<(String, Node)>),
}

impl Node {
    /// Parse a single YAML document
    pub fn from_yaml_str(content: &str) -> Result<Self, serde_yaml::Error> {
        let value: Value = serde_yaml::from_str(content)?;
        Ok(Node::from(value))
    }

    /// Returns the string value if this node is a string scalar
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether the node is a list or a map
    pub fn is_container(&self) -> bool {
        matches!(self, Node::List(_) | Node::Map(_))
    }

    /// Walk the node depth-first
    ///
    /// Every map entry is offered to the visitor, then the walk descends
    /// into container values. Scalars inside lists are not offered since
    /// they have no key.
    pub fn walk<V: Visitor + ?Sized>(&self, visitor: &mut V) {
        match self {
            Node::Map(entries) => {
                for (key, value) in entries {
                    visitor.visit_entry(key, value);
                    if value.is_container() {
                        value.walk(visitor);
                    }
                }
            }
            Node::List(items) => {
                for item in items {
                    item.walk(visitor);
                }
            }
            Node::Scalar(_) => {}
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Scalar(Scalar::Null),
            Value::Bool(b) => Node::Scalar(Scalar::Bool(b)),
            Value::Number(n) => Node::Scalar(Scalar::Number(n.to_string())),
            Value::String(s) => Node::Scalar(Scalar::String(s)),
            Value::Sequence(items) => Node::List(items.into_iter().map(Node::from).collect()),
            Value::Mapping(mapping) => Node::Map(
                mapping
                    .into_iter()
                    .filter_map(|(k, v)| key_text(&k).map(|k| (k, Node::from(v))))
                    .collect(),
            ),
            Value::Tagged(tagged) => Node::from(tagged.value),
        }
    }
}

fn key_text(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Tagged(tagged) => key_text(&tagged.value),
        _ => None,
    }
}

/// Receives map entries during a walk
pub trait Visitor {
    fn visit_entry(&mut self, key: &str, value: &Node);
}

/// Collects string values stored under an `image` key (any case)
#[derive(Debug, Default)]
pub struct ImageKeyCollector {
    pub found: Vec<String>,
}

impl Visitor for ImageKeyCollector {
    fn visit_entry(&mut self, key: &str, value: &Node) {
        if key.eq_ignore_ascii_case("image") {
            if let Some(s) = value.as_str() {
                self.found.push(s.to_string());
            }
        }
    }
}

/// Collect every string under an `image` key, in document order
pub fn collect_image_strings(node: &Node) -> Vec<String> {
    let mut collector = ImageKeyCollector::default();
    node.walk(&mut collector);
    collector.found
}
