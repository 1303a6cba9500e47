//! Containment tree traversal.
//!
//! The walk is the first of two aggregation phases: it only enumerates leaf
//! entities together with the chain of containers above them and leaves all
//! accumulation to `Aggregator`. Children are visited in lexicographic order
//! of their names, ties keeping document order, so the same inventory always
//! yields leaves in the same order however it was serialized.

use serde_json;
use std::collections::BTreeMap;

/// What a node of the containment tree stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// A plain container.
    Folder,
    /// A datacenter. Folders below a datacenter form the folder path.
    Datacenter,
    /// A concrete, measured entity such as a virtual machine.
    #[serde(alias = "vm")]
    Entity,
}

impl Default for Kind {
    fn default() -> Kind {
        Kind::Folder
    }
}

/// One node of a containment tree.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Node {
    /// Name of the node, unique among its siblings in practice but not
    /// required to be.
    pub name: String,
    /// Container or entity.
    #[serde(default)]
    pub kind: Kind,
    /// Raw entity properties, keyed by property path.
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
    /// Contained nodes.
    #[serde(default)]
    pub children: Vec<Node>,
}

impl Node {
    /// Create a container node.
    pub fn folder<S>(name: S, children: Vec<Node>) -> Node
    where
        S: Into<String>,
    {
        Node {
            name: name.into(),
            kind: Kind::Folder,
            properties: BTreeMap::new(),
            children: children,
        }
    }

    /// Create a datacenter node.
    pub fn datacenter<S>(name: S, children: Vec<Node>) -> Node
    where
        S: Into<String>,
    {
        let mut node = Node::folder(name, children);
        node.kind = Kind::Datacenter;
        node
    }

    /// Create an entity node.
    pub fn entity<S>(name: S, properties: BTreeMap<String, serde_json::Value>) -> Node
    where
        S: Into<String>,
    {
        Node {
            name: name.into(),
            kind: Kind::Entity,
            properties: properties,
            children: Vec::new(),
        }
    }
}

/// A leaf entity found by `walk`, with every node from the root down to and
/// including the entity itself.
#[derive(Debug)]
pub struct Visit<'a> {
    /// Root first, the entity last.
    pub lineage: Vec<&'a Node>,
}

impl<'a> Visit<'a> {
    /// The entity node.
    pub fn entity(&self) -> &'a Node {
        self.lineage[self.lineage.len() - 1]
    }

    /// Slash-delimited path of names from the root to the entity.
    pub fn path(&self) -> String {
        let names: Vec<&str> = self.lineage.iter().map(|n| n.name.as_str()).collect();
        names.join("/")
    }

    /// The closest datacenter above the entity, if any.
    pub fn datacenter(&self) -> Option<&'a Node> {
        self.lineage
            .iter()
            .rev()
            .find(|n| n.kind == Kind::Datacenter)
            .cloned()
    }

    /// Names of the folders between the closest datacenter and the entity.
    /// Without a datacenter, every container below the root.
    pub fn folders(&self) -> Vec<&'a str> {
        let containers = &self.lineage[..self.lineage.len() - 1];
        let start = match containers.iter().rposition(|n| n.kind == Kind::Datacenter) {
            Some(idx) => idx + 1,
            None => 1,
        };
        containers
            .iter()
            .skip(start)
            .map(|n| n.name.as_str())
            .collect()
    }
}

// untyped childless nodes below the root count when they carry properties
fn is_entity(node: &Node, depth: usize) -> bool {
    node.kind == Kind::Entity
        || (depth > 1 && node.children.is_empty() && !node.properties.is_empty())
}

/// Enumerate every entity below `root`, depth first.
pub fn walk(root: &Node) -> Vec<Visit> {
    let mut visits = Vec::new();
    let mut stack: Vec<Vec<&Node>> = vec![vec![root]];
    while let Some(lineage) = stack.pop() {
        let node = lineage[lineage.len() - 1];
        if is_entity(node, lineage.len()) {
            visits.push(Visit { lineage: lineage });
            continue;
        }
        let mut children: Vec<&Node> = node.children.iter().collect();
        children.sort_by(|l, r| l.name.cmp(&r.name));
        // reversed so the smallest name is popped first
        for child in children.into_iter().rev() {
            let mut next = lineage.clone();
            next.push(child);
            stack.push(next);
        }
    }
    visits
}
