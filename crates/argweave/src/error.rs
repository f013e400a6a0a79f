//! Error taxonomy and default message rendering.
//!
//! Every failure the library can raise is a variant of [`Error`], grouped
//! into kinds by [`ErrorKind`]. The `Display` strings are the default
//! messages; embedders that want different wording install per-kind
//! overrides on an [`ErrorRenderer`] instead of string-matching.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    // Definition errors: raised at registration time, programmer errors.
    #[error("invalid token format {name:?}: tokens cannot be empty or include whitespace")]
    BadToken { name: String },

    #[error("token {token:?} is already taken by {existing:?} under {parent:?}: sibling tokens must be unique")]
    DuplicateToken {
        token: String,
        existing: String,
        parent: String,
    },

    #[error("parent index {index} is not registered")]
    UnknownParent { index: usize },

    // Token errors.
    #[error("unable to resolve token {token:?}: this token is not registered")]
    TokenNotFound { token: String },

    #[error("token {token:?} already matched {name:?}: commands and flags are single-use")]
    TokenDuplicate { token: String, name: String },

    // Context errors.
    #[error("{name:?} is not valid in the current context")]
    InvalidContext { name: String },

    #[error("{name:?} is not valid here: it can only be used with {parent:?}")]
    InvalidParent { name: String, parent: String },

    // Argument errors.
    #[error("missing value for {flag:?}: this flag requires a value")]
    MissingValue { flag: String },

    #[error("invalid value {value:?} for {flag:?}: check the expected type and format")]
    InvalidValue { flag: String, value: String },

    #[error("value parser for {flag:?} failed: {message}")]
    ParserFailure { flag: String, message: String },

    // Requirement errors.
    #[error("{name:?} is required when using {parent:?}")]
    RequiredMissing { name: String, parent: String },
}

/// The kind of an [`Error`], used for renderer overrides and matching
/// without destructuring variant payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Definition,
    TokenNotFound,
    TokenDuplicate,
    InvalidContext,
    InvalidParent,
    MissingValue,
    InvalidValue,
    ParserFailure,
    RequiredMissing,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::BadToken { .. } | Self::DuplicateToken { .. } | Self::UnknownParent { .. } => {
                ErrorKind::Definition
            }
            Self::TokenNotFound { .. } => ErrorKind::TokenNotFound,
            Self::TokenDuplicate { .. } => ErrorKind::TokenDuplicate,
            Self::InvalidContext { .. } => ErrorKind::InvalidContext,
            Self::InvalidParent { .. } => ErrorKind::InvalidParent,
            Self::MissingValue { .. } => ErrorKind::MissingValue,
            Self::InvalidValue { .. } => ErrorKind::InvalidValue,
            Self::ParserFailure { .. } => ErrorKind::ParserFailure,
            Self::RequiredMissing { .. } => ErrorKind::RequiredMissing,
        }
    }
}

type RenderFn = Arc<dyn Fn(&Error) -> String + Send + Sync>;

/// Renders errors to human-readable strings, with per-kind overrides.
#[derive(Clone, Default)]
pub struct ErrorRenderer {
    overrides: HashMap<ErrorKind, RenderFn>,
}

impl ErrorRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install an override for one error kind.
    pub fn on(
        mut self,
        kind: ErrorKind,
        render: impl Fn(&Error) -> String + Send + Sync + 'static,
    ) -> Self {
        self.overrides.insert(kind, Arc::new(render));
        self
    }

    /// Render `error`, preferring the installed override for its kind and
    /// falling back to the default `Display` message.
    pub fn render(&self, error: &Error) -> String {
        match self.overrides.get(&error.kind()) {
            Some(render) => render(error),
            None => error.to_string(),
        }
    }
}

impl fmt::Debug for ErrorRenderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds: Vec<&ErrorKind> = self.overrides.keys().collect();
        f.debug_struct("ErrorRenderer")
            .field("overrides", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_group_definition_variants() {
        let err = Error::BadToken { name: "".into() };
        assert_eq!(err.kind(), ErrorKind::Definition);
        let err = Error::UnknownParent { index: 9 };
        assert_eq!(err.kind(), ErrorKind::Definition);
    }

    #[test]
    fn renderer_falls_back_to_display() {
        let renderer = ErrorRenderer::new();
        let err = Error::TokenNotFound {
            token: "--nope".into(),
        };
        assert!(renderer.render(&err).contains("--nope"));
    }

    #[test]
    fn renderer_prefers_overrides() {
        let renderer = ErrorRenderer::new().on(ErrorKind::RequiredMissing, |err| {
            let Error::RequiredMissing { name, parent } = err else {
                return err.to_string();
            };
            format!("{parent} needs --{name}")
        });
        let err = Error::RequiredMissing {
            name: "name".into(),
            parent: "greet".into(),
        };
        assert_eq!(renderer.render(&err), "greet needs --name");

        let other = Error::MissingValue {
            flag: "port".into(),
        };
        assert!(renderer.render(&other).contains("port"));
    }
}
