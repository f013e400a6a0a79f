//! The token-consumption state machine.
//!
//! There is no named state enum; the state *is* the combination of three
//! index sets plus the value bookkeeping:
//!
//! - `expected`: entries legal to appear next, seeded from the root's
//!   children and widened as commands activate.
//! - `excluded`: parents whose command branches are committed; sibling
//!   subcommands of those parents are no longer reachable.
//! - `current`: entries matched so far (doubles as duplicate detection).
//!
//! Each parse owns a fresh [`ParseState`]; the registry is never written
//! to, so one registry serves repeated or concurrent parses.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use indexmap::IndexMap;

use crate::entry::{CommandAction, Contract, ParsedFlags};
use crate::error::Error;
use crate::reconcile;
use crate::registry::{Node, NodeKind, ROOT, Registry};
use crate::scope;
use crate::value::{Value, ValueError, ValueRequest};

/// Ephemeral working state for one `parse()` invocation.
pub(crate) struct ParseState {
    pub(crate) expected: BTreeSet<usize>,
    pub(crate) excluded: BTreeSet<usize>,
    pub(crate) current: BTreeSet<usize>,
    /// Activation order of matched entries.
    pub(crate) order: Vec<usize>,
    /// Input position -> entry index that consumed it as a value.
    pub(crate) value_map: HashMap<usize, usize>,
    /// Captured values, keyed by entry index. Values live here rather than
    /// on the registry so parsing never mutates shared definitions.
    pub(crate) values: HashMap<usize, Value>,
}

impl ParseState {
    pub(crate) fn seed(registry: &Registry) -> Self {
        let expected = registry.children_of(ROOT).iter().copied().collect();
        // The root scope is always active: no token addresses it, but its
        // required children are enforced like any entered scope's.
        let mut current = BTreeSet::new();
        current.insert(ROOT);
        Self {
            expected,
            excluded: BTreeSet::new(),
            current,
            order: Vec::new(),
            value_map: HashMap::new(),
            values: HashMap::new(),
        }
    }

    /// Commit a matched entry: record it, close it to re-matching, and for
    /// commands open the nested scope while sealing the sibling branch.
    pub(crate) fn activate(&mut self, registry: &Registry, index: usize) {
        let Some(node) = registry.entry(index) else {
            return;
        };
        self.current.insert(index);
        self.order.push(index);
        self.expected.remove(&index);
        if node.is_command() {
            for &child in registry.children_of(index) {
                self.expected.insert(child);
            }
            self.excluded.insert(node.parent);
        }
    }
}

/// A command matched during parsing, in activation order, with its action
/// handle for the embedder's dispatcher.
#[derive(Clone)]
pub struct TriggeredCommand {
    pub name: String,
    pub action: Option<CommandAction>,
}

impl TriggeredCommand {
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

impl fmt::Debug for TriggeredCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggeredCommand")
            .field("name", &self.name)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Successful parse: flag values (after defaults) and triggered commands.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub flags: ParsedFlags,
    pub commands: Vec<TriggeredCommand>,
}

/// Resolve `input` against `registry`.
///
/// Tokens are processed strictly in order; a flag's value contract may be
/// asynchronous and is awaited before the next token is looked at, because
/// each token's legality depends on the state the previous one left
/// behind. Any violation aborts the whole parse; there are no partial
/// results.
pub async fn parse(registry: &Registry, input: &[String]) -> Result<ParseOutput, Error> {
    let mut state = ParseState::seed(registry);

    for (position, token) in input.iter().enumerate() {
        // Already consumed as some flag's value.
        if state.value_map.contains_key(&position) {
            continue;
        }

        let node = scope::resolve(registry, &state, token)?;
        let index = node.index;
        tracing::trace!(position, token = %token, index, "token resolved");
        state.activate(registry, index);

        if let NodeKind::Flag { contract, multiple } = &node.kind {
            consume_flag_value(registry, &mut state, node, contract, *multiple, input, position)
                .await?;
        }
    }

    reconcile::apply_defaults(registry, &mut state);
    reconcile::enforce_requirements(registry, &state)?;

    Ok(assemble(registry, state))
}

/// Apply a matched flag's value contract against the tokens after it.
async fn consume_flag_value(
    registry: &Registry,
    state: &mut ParseState,
    node: &Node,
    contract: &Contract,
    multiple: bool,
    input: &[String],
    position: usize,
) -> Result<(), Error> {
    match contract {
        Contract::Presence => {
            state.values.insert(node.index, Value::Bool(true));
            Ok(())
        }
        Contract::Undeclared => Err(Error::ParserFailure {
            flag: node.name.clone(),
            message: "flag has no declared value contract".to_string(),
        }),
        Contract::Parser(parser) => {
            let rest = &input[position + 1..];
            let registered = |token: &str| registry.is_registered_token(token);
            let request = ValueRequest::new(rest, node.default.as_ref(), multiple, &registered);
            match parser.parse(request).await {
                Ok(reply) => {
                    for offset in 0..reply.consumed {
                        state.value_map.insert(position + 1 + offset, node.index);
                    }
                    state.values.insert(node.index, reply.value);
                    Ok(())
                }
                // A declared default silently covers a missing or invalid
                // value, but never a parser that itself failed.
                Err(err) => {
                    let recoverable = !matches!(err, ValueError::Failure { .. });
                    match &node.default {
                        Some(default) if recoverable => {
                            state.values.insert(node.index, default.clone());
                            Ok(())
                        }
                        _ => Err(value_error(node, err)),
                    }
                }
            }
        }
    }
}

fn value_error(node: &Node, err: ValueError) -> Error {
    match err {
        ValueError::Missing => Error::MissingValue {
            flag: node.name.clone(),
        },
        ValueError::Invalid { token } => Error::InvalidValue {
            flag: node.name.clone(),
            value: token,
        },
        ValueError::Failure { message } => Error::ParserFailure {
            flag: node.name.clone(),
            message,
        },
    }
}

fn assemble(registry: &Registry, state: ParseState) -> ParseOutput {
    let mut flags: ParsedFlags = IndexMap::new();
    for node in registry.entries() {
        if !node.is_flag() {
            continue;
        }
        if let Some(value) = state.values.get(&node.index) {
            flags.insert(node.name.clone(), value.clone());
        }
    }

    let mut commands = Vec::new();
    for &index in &state.order {
        let Some(node) = registry.entry(index) else {
            continue;
        };
        if let NodeKind::Command { action } = &node.kind {
            commands.push(TriggeredCommand {
                name: node.name.clone(),
                action: action.clone(),
            });
        }
    }

    ParseOutput { flags, commands }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{RootDef, cmd, flag};

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn demo_registry() -> Registry {
        let mut reg = Registry::new(RootDef::new("demo"));
        reg.register_flag(ROOT, flag("verbose").alias("v").switch())
            .unwrap();
        reg.register_command(
            ROOT,
            cmd("serve").flag(flag("port").number().default_value(8080.0)),
        )
        .unwrap();
        reg.register_command(ROOT, cmd("greet").flag(flag("name").string().required(true)))
            .unwrap();
        reg
    }

    #[tokio::test]
    async fn presence_flag_records_true() {
        let reg = demo_registry();
        let out = parse(&reg, &args(&["--verbose"])).await.unwrap();
        assert_eq!(out.flags.get("verbose"), Some(&Value::Bool(true)));
        assert!(out.commands.is_empty());
    }

    #[tokio::test]
    async fn alias_resolves_like_primary_name() {
        let reg = demo_registry();
        let out = parse(&reg, &args(&["-v"])).await.unwrap();
        assert_eq!(out.flags.get("verbose"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn command_opens_its_scope() {
        let reg = demo_registry();
        let out = parse(&reg, &args(&["serve", "--port", "3000"])).await.unwrap();
        assert_eq!(out.flags.get("port"), Some(&Value::Num(3000.0)));
        assert_eq!(out.commands.len(), 1);
        assert_eq!(out.commands[0].name, "serve");
    }

    #[tokio::test]
    async fn undeclared_contract_refuses_input() {
        let mut reg = Registry::new(RootDef::new("demo"));
        reg.register_flag(ROOT, flag("mystery")).unwrap();
        let err = parse(&reg, &args(&["--mystery"])).await.unwrap_err();
        assert!(matches!(err, Error::ParserFailure { flag, .. } if flag == "mystery"));
    }

    #[tokio::test]
    async fn invalid_value_with_default_is_covered_silently() {
        let reg = demo_registry();
        let err = parse(&reg, &args(&["serve", "--port", "eighty"]))
            .await
            .unwrap_err();
        // "eighty" is not a value, and not a registered token either: the
        // default covers the port, then the loop trips over "eighty".
        assert!(matches!(err, Error::TokenNotFound { token } if token == "eighty"));
    }

    #[tokio::test]
    async fn missing_value_without_default_fails() {
        let reg = demo_registry();
        let err = parse(&reg, &args(&["greet", "--name"])).await.unwrap_err();
        assert!(matches!(err, Error::MissingValue { flag } if flag == "name"));
    }

    #[tokio::test]
    async fn triggered_commands_keep_activation_order() {
        let mut reg = Registry::new(RootDef::new("demo"));
        reg.register_command(ROOT, cmd("db").command(cmd("init").action(|_| {})))
            .unwrap();
        let out = parse(&reg, &args(&["db", "init"])).await.unwrap();
        let names: Vec<&str> = out.commands.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["db", "init"]);
        assert!(!out.commands[0].has_action());
        assert!(out.commands[1].has_action());
    }
}
