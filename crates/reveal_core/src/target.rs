//! Reveal targets: a selector or explicit nodes

use crate::host::Host;
use crate::id::NodeId;

/// What a `reveal`/`clean` call applies to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Target {
    Selector(String),
    Nodes(Vec<NodeId>),
}

impl Target {
    /// Nodes currently matching the target, deduplicated, in order
    pub fn resolve(&self, host: &dyn Host) -> Vec<NodeId> {
        let nodes = match self {
            Target::Selector(selector) => host.query(selector),
            Target::Nodes(nodes) => nodes.clone(),
        };
        let mut seen = rustc_hash::FxHashSet::default();
        nodes.into_iter().filter(|n| seen.insert(*n)).collect()
    }

    /// Human-readable description for logs
    pub fn describe(&self) -> String {
        match self {
            Target::Selector(selector) => format!("`{selector}`"),
            Target::Nodes(nodes) => format!("{} node(s)", nodes.len()),
        }
    }
}

impl From<&str> for Target {
    fn from(selector: &str) -> Self {
        Target::Selector(selector.to_string())
    }
}

impl From<String> for Target {
    fn from(selector: String) -> Self {
        Target::Selector(selector)
    }
}

impl From<NodeId> for Target {
    fn from(node: NodeId) -> Self {
        Target::Nodes(vec![node])
    }
}

impl From<Vec<NodeId>> for Target {
    fn from(nodes: Vec<NodeId>) -> Self {
        Target::Nodes(nodes)
    }
}

impl From<&[NodeId]> for Target {
    fn from(nodes: &[NodeId]) -> Self {
        Target::Nodes(nodes.to_vec())
    }
}
