//! Post-parse reconciliation: defaults, then requirements.
//!
//! The order is load-bearing. Defaults are applied first so a required
//! entry satisfied purely by its own default does not fail the
//! requirements check. Both passes are idempotent.

use crate::error::Error;
use crate::parser::ParseState;
use crate::registry::Registry;

/// Fill in declared defaults for entries that stayed reachable but were
/// never matched. Entries in scopes that never opened are left alone.
pub(crate) fn apply_defaults(registry: &Registry, state: &mut ParseState) {
    let pending: Vec<usize> = state
        .expected
        .iter()
        .copied()
        .filter(|index| !state.current.contains(index) && registry.has_default(*index))
        .collect();
    for index in pending {
        let Some(default) = registry.entry(index).and_then(|n| n.default.clone()) else {
            continue;
        };
        tracing::trace!(index, "applying default value");
        state.values.insert(index, default);
        state.current.insert(index);
    }
}

/// Verify that every required child of an activated scope was matched (or
/// defaulted). The first violation aborts.
pub(crate) fn enforce_requirements(registry: &Registry, state: &ParseState) -> Result<(), Error> {
    for (parent, required) in registry.required_pairs() {
        if !state.current.contains(&parent) {
            continue;
        }
        for &child in required {
            if state.current.contains(&child) {
                continue;
            }
            let name = registry
                .entry(child)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            let parent = registry
                .entry(parent)
                .map(|n| n.name.clone())
                .unwrap_or_default();
            return Err(Error::RequiredMissing { name, parent });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::{RootDef, cmd, flag};
    use crate::registry::ROOT;
    use crate::value::Value;

    #[test]
    fn defaults_fill_unmatched_reachable_entries() {
        let mut reg = Registry::new(RootDef::new("app"));
        let port = reg
            .register_flag(ROOT, flag("port").number().default_value(8080.0))
            .unwrap();
        let mut state = ParseState::seed(&reg);
        apply_defaults(&reg, &mut state);
        assert_eq!(state.values.get(&port), Some(&Value::Num(8080.0)));
        assert!(state.current.contains(&port));

        // Running the pass again changes nothing.
        apply_defaults(&reg, &mut state);
        assert_eq!(state.values.len(), 1);
    }

    #[test]
    fn defaults_skip_unopened_scopes() {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_command(
            ROOT,
            cmd("serve").flag(flag("port").number().default_value(8080.0)),
        )
        .unwrap();
        let mut state = ParseState::seed(&reg);
        apply_defaults(&reg, &mut state);
        assert!(state.values.is_empty());
    }

    #[test]
    fn root_level_requirements_are_enforced() {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_flag(ROOT, flag("token").string().required(true))
            .unwrap();
        let state = ParseState::seed(&reg);
        let err = enforce_requirements(&reg, &state).unwrap_err();
        assert!(matches!(err, Error::RequiredMissing { name, .. } if name == "token"));
    }

    #[test]
    fn default_satisfies_requirement() {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_flag(
            ROOT,
            flag("token").string().required(true).default_value("anon"),
        )
        .unwrap();
        let mut state = ParseState::seed(&reg);
        apply_defaults(&reg, &mut state);
        assert!(enforce_requirements(&reg, &state).is_ok());
    }

    #[test]
    fn unopened_scope_owes_nothing() {
        let mut reg = Registry::new(RootDef::new("app"));
        reg.register_command(
            ROOT,
            cmd("greet").flag(flag("name").string().required(true)),
        )
        .unwrap();
        let state = ParseState::seed(&reg);
        assert!(enforce_requirements(&reg, &state).is_ok());
    }
}
