//! Scope-aware token resolution.
//!
//! A token is only allowed to match an entry that is currently reachable:
//! seeded from the root's children and widened each time a command opens
//! its own children. When several reachable entries match, the innermost
//! scope wins. Tokens that match something registered but unreachable get
//! a context error rather than "not found", so the caller can tell a typo
//! from a misplaced entry.

use crate::error::Error;
use crate::parser::ParseState;
use crate::registry::{Node, Registry};

/// Resolve `token` against the currently reachable scopes, or classify the
/// failure.
pub(crate) fn resolve<'r>(
    registry: &'r Registry,
    state: &ParseState,
    token: &str,
) -> Result<&'r Node, Error> {
    let mut found: Option<&Node> = None;
    for &index in &state.expected {
        let Some(node) = registry.entry(index) else {
            continue;
        };
        if !node.matches(token) {
            continue;
        }
        if found.is_none_or(|prev| node.depth > prev.depth) {
            found = Some(node);
        }
    }

    if let Some(node) = found {
        // A sibling branch under this parent has already committed.
        if node.is_command() && state.excluded.contains(&node.parent) {
            return Err(context_error(registry, node));
        }
        return Ok(node);
    }

    // Not reachable. Work out whether this is a re-match, a misplaced
    // entry, or plain unknown; an already-matched entry wins even when an
    // unreachable sibling elsewhere shares the token.
    let mut misplaced: Option<&Node> = None;
    for node in registry.entries() {
        if !node.matches(token) {
            continue;
        }
        if state.current.contains(&node.index) {
            return Err(Error::TokenDuplicate {
                token: token.to_string(),
                name: node.name.clone(),
            });
        }
        if misplaced.is_none() {
            misplaced = Some(node);
        }
    }
    match misplaced {
        Some(node) => Err(context_error(registry, node)),
        None => Err(Error::TokenNotFound {
            token: token.to_string(),
        }),
    }
}

fn context_error(registry: &Registry, node: &Node) -> Error {
    match registry.entry(node.parent) {
        Some(parent) => Error::InvalidParent {
            name: node.name.clone(),
            parent: parent.name.clone(),
        },
        None => Error::InvalidContext {
            name: node.name.clone(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{RootDef, cmd, flag};
    use crate::registry::ROOT;

    fn fixture() -> (Registry, ParseState) {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_flag(ROOT, flag("verbose").switch()).unwrap();
        reg.register_command(
            ROOT,
            cmd("db")
                .command(cmd("init"))
                .command(cmd("migrate"))
                .flag(flag("url").string()),
        )
        .unwrap();
        let state = ParseState::seed(&reg);
        (reg, state)
    }

    #[test]
    fn resolves_expected_entries() {
        let (reg, state) = fixture();
        assert_eq!(resolve(&reg, &state, "--verbose").unwrap().name, "verbose");
        assert_eq!(resolve(&reg, &state, "db").unwrap().name, "db");
    }

    #[test]
    fn unregistered_token_is_not_found() {
        let (reg, state) = fixture();
        assert!(matches!(
            resolve(&reg, &state, "--nope"),
            Err(Error::TokenNotFound { .. })
        ));
    }

    #[test]
    fn unreachable_entry_is_a_context_error() {
        let (reg, state) = fixture();
        // `init` exists but `db` has not been activated.
        let err = resolve(&reg, &state, "init").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParent { name, parent } if name == "init" && parent == "db"
        ));
    }

    #[test]
    fn rematching_a_current_entry_is_a_duplicate() {
        let (reg, mut state) = fixture();
        let verbose = resolve(&reg, &state, "--verbose").unwrap().index;
        state.activate(&reg, verbose);
        assert!(matches!(
            resolve(&reg, &state, "--verbose"),
            Err(Error::TokenDuplicate { .. })
        ));
    }

    #[test]
    fn committed_branch_excludes_siblings() {
        let (reg, mut state) = fixture();
        let db = resolve(&reg, &state, "db").unwrap().index;
        state.activate(&reg, db);
        let init = resolve(&reg, &state, "init").unwrap().index;
        state.activate(&reg, init);
        assert!(matches!(
            resolve(&reg, &state, "migrate"),
            Err(Error::InvalidParent { .. })
        ));
    }

    #[test]
    fn innermost_scope_wins_for_shared_tokens() {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_flag(ROOT, flag("out").string()).unwrap();
        let build = reg
            .register_command(ROOT, cmd("build").flag(flag("out").string()))
            .unwrap();
        let mut state = ParseState::seed(&reg);
        state.activate(&reg, build);
        let node = resolve(&reg, &state, "--out").unwrap();
        assert_eq!(node.parent, build);
    }
}
