//! Append-only arena of registered entries.
//!
//! Every entry lives in a flat node list; its index is its identity.
//! Parent links are plain indices and the root's parent is itself, so no
//! node ever holds a nullable or cyclic reference. Nothing is removed or
//! re-indexed after registration, which keeps the adjacency indices
//! (`children`, `requires`, `with_defaults`) trivially consistent.

use std::collections::{BTreeSet, HashMap};

use crate::entry::{CommandAction, CommandDef, Contract, FlagDef, RootDef};
use crate::error::Error;
use crate::tokens::{Prefixes, TokenSet};
use crate::value::Value;

/// Index of the synthetic root entry.
pub const ROOT: usize = 0;

/// What a registered node is, with the data only that kind carries.
#[derive(Clone)]
pub enum NodeKind {
    Root,
    Command { action: Option<CommandAction> },
    Flag { contract: Contract, multiple: bool },
}

impl std::fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Root => f.write_str("Root"),
            Self::Command { action } => f
                .debug_struct("Command")
                .field("action", &action.is_some())
                .finish(),
            Self::Flag { contract, multiple } => f
                .debug_struct("Flag")
                .field("contract", contract)
                .field("multiple", multiple)
                .finish(),
        }
    }
}

/// A registered entry.
#[derive(Debug, Clone)]
pub struct Node {
    pub index: usize,
    pub parent: usize,
    /// Nesting depth; the root sits at 0. Used to prefer the innermost
    /// scope when several reachable entries match one token.
    pub depth: usize,
    pub name: String,
    pub description: String,
    pub required: bool,
    pub default: Option<Value>,
    /// `None` only for the root, which no input token can address.
    pub tokens: Option<TokenSet>,
    pub kind: NodeKind,
}

impl Node {
    pub fn is_command(&self) -> bool {
        matches!(self.kind, NodeKind::Command { .. })
    }

    pub fn is_flag(&self) -> bool {
        matches!(self.kind, NodeKind::Flag { .. })
    }

    pub fn matches(&self, token: &str) -> bool {
        self.tokens.as_ref().is_some_and(|t| t.matches(token))
    }
}

/// The grammar: all registered entries plus the derived indices the
/// resolver and reconciler work from. Built once, read-only during
/// parsing, reusable across any number of parses.
#[derive(Debug, Clone)]
pub struct Registry {
    nodes: Vec<Node>,
    children: HashMap<usize, Vec<usize>>,
    requires: HashMap<usize, Vec<usize>>,
    with_defaults: BTreeSet<usize>,
}

impl Registry {
    /// Create a registry holding only the synthetic root at index 0.
    pub fn new(root: RootDef) -> Self {
        let root = Node {
            index: ROOT,
            parent: ROOT,
            depth: 0,
            name: root.name,
            description: root.description,
            required: false,
            default: None,
            tokens: None,
            kind: NodeKind::Root,
        };
        Self {
            nodes: vec![root],
            children: HashMap::new(),
            requires: HashMap::new(),
            with_defaults: BTreeSet::new(),
        }
    }

    /// Register a command under `parent`, cascading registration of every
    /// nested flag and subcommand. Returns the command's index.
    pub fn register_command(
        &mut self,
        parent: usize,
        def: impl Into<CommandDef>,
    ) -> Result<usize, Error> {
        let def = def.into();
        let tokens = TokenSet::build(&def.name, &def.aliases, &Prefixes::bare())?;
        let index = self.append(
            parent,
            def.name,
            def.description,
            def.required,
            None,
            tokens,
            NodeKind::Command { action: def.action },
        )?;
        for flag in def.flags {
            self.register_flag(index, flag)?;
        }
        for command in def.commands {
            self.register_command(index, command)?;
        }
        Ok(index)
    }

    /// Register a flag under `parent` and return its index.
    pub fn register_flag(&mut self, parent: usize, def: impl Into<FlagDef>) -> Result<usize, Error> {
        let def = def.into();
        let tokens = TokenSet::build(&def.name, &def.aliases, &def.prefixes)?;
        self.append(
            parent,
            def.name,
            def.description,
            def.required,
            def.default,
            tokens,
            NodeKind::Flag {
                contract: def.contract,
                multiple: def.multiple,
            },
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn append(
        &mut self,
        parent: usize,
        name: String,
        description: String,
        required: bool,
        default: Option<Value>,
        tokens: TokenSet,
        kind: NodeKind,
    ) -> Result<usize, Error> {
        // Parents must already exist; the arena admits no forward references.
        let Some(parent_node) = self.entry(parent) else {
            return Err(Error::UnknownParent { index: parent });
        };
        let depth = parent_node.depth + 1;
        let parent_name = parent_node.name.clone();

        // Siblings may not share any matching token.
        for &sibling in self.children_of(parent) {
            let Some(existing) = self.entry(sibling) else {
                continue;
            };
            if let Some(shared) = existing
                .tokens
                .as_ref()
                .and_then(|t| tokens.collides_with(t))
            {
                return Err(Error::DuplicateToken {
                    token: shared.to_string(),
                    existing: existing.name.clone(),
                    parent: parent_name,
                });
            }
        }

        let index = self.nodes.len();
        tracing::debug!(index, parent, name = %name, "registering entry");
        self.nodes.push(Node {
            index,
            parent,
            depth,
            name,
            description,
            required,
            default: default.clone(),
            tokens: Some(tokens),
            kind,
        });

        self.children.entry(parent).or_default().push(index);
        if required {
            self.requires.entry(parent).or_default().push(index);
        }
        if default.is_some() {
            self.with_defaults.insert(index);
        }
        Ok(index)
    }

    /// Bounds-checked lookup. Out-of-range indices answer `None`; asking
    /// about an unknown index is a query, not a bug.
    pub fn entry(&self, index: usize) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All registered nodes in index order.
    pub fn entries(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Direct children of `index`, in registration order.
    pub fn children_of(&self, index: usize) -> &[usize] {
        self.children.get(&index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `(parent, required children)` pairs, ordered by parent index.
    pub(crate) fn required_pairs(&self) -> Vec<(usize, &[usize])> {
        let mut parents: Vec<usize> = self.requires.keys().copied().collect();
        parents.sort_unstable();
        parents
            .into_iter()
            .map(|p| (p, self.requires[&p].as_slice()))
            .collect()
    }

    pub fn has_default(&self, index: usize) -> bool {
        self.with_defaults.contains(&index)
    }

    /// Whether `token` identifies any registered entry, in any scope.
    pub fn is_registered_token(&self, token: &str) -> bool {
        self.nodes.iter().any(|n| n.matches(token))
    }

    /// First registered entry matching `token`, regardless of scope.
    pub fn find_match(&self, token: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.matches(token))
    }
}
