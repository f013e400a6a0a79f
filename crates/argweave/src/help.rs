//! Help data for external renderers.
//!
//! The core does not format usage text. It exposes the data a renderer
//! needs: the focused entry, its parent, and its direct command and flag
//! children, all serializable so embedders can also ship them as JSON.

use serde::Serialize;

use crate::registry::{Node, NodeKind, Registry};
use crate::value::Value;

/// One entry, flattened for display purposes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntryHelp {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Literal tokens that address the entry (empty for the root).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    pub required: bool,
    pub multiple: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    pub kind: &'static str,
}

impl EntryHelp {
    fn from_node(node: &Node) -> Self {
        let (kind, multiple) = match &node.kind {
            NodeKind::Root => ("root", false),
            NodeKind::Command { .. } => ("command", false),
            NodeKind::Flag { multiple, .. } => ("flag", *multiple),
        };
        Self {
            name: node.name.clone(),
            description: node.description.clone(),
            tokens: node
                .tokens
                .as_ref()
                .map(|t| t.iter().map(str::to_string).collect())
                .unwrap_or_default(),
            required: node.required,
            multiple,
            default_value: node.default.clone(),
            kind,
        }
    }
}

/// Display context for one entry: itself, its parent, and its direct
/// children split into commands and flags.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct HelpContext {
    pub entry: EntryHelp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<EntryHelp>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<EntryHelp>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<EntryHelp>,
}

impl HelpContext {
    /// Build the context for `index`, or `None` when it is not registered.
    pub fn new(registry: &Registry, index: usize) -> Option<Self> {
        let node = registry.entry(index)?;
        // The root's parent is itself; display it as having none.
        let parent = (node.parent != node.index)
            .then(|| registry.entry(node.parent))
            .flatten()
            .map(EntryHelp::from_node);

        let mut commands = Vec::new();
        let mut flags = Vec::new();
        for &child in registry.children_of(index) {
            let Some(child_node) = registry.entry(child) else {
                continue;
            };
            match child_node.kind {
                NodeKind::Command { .. } => commands.push(EntryHelp::from_node(child_node)),
                NodeKind::Flag { .. } => flags.push(EntryHelp::from_node(child_node)),
                NodeKind::Root => {}
            }
        }

        Some(Self {
            entry: EntryHelp::from_node(node),
            parent,
            commands,
            flags,
        })
    }
}
