//! Declarative CLI grammar and scope-aware argument resolution.
//!
//! A caller declares commands, subcommands and flags into a [`Registry`]
//! (an append-only arena; indices are identity), then resolves raw
//! argument lists against it with [`parse`]. Resolution walks the input
//! token by token, honoring nesting: a command's children only become
//! matchable once the command itself has been matched, and committing to
//! one subcommand seals off its siblings. After the walk, defaults are
//! filled in and required entries checked.
//!
//! The crate deliberately stops at structured data. Help/usage rendering,
//! action dispatch and error presentation are the embedder's business;
//! the library hands over [`HelpContext`] data, [`TriggeredCommand`]
//! action handles and typed [`Error`]s (with an overridable
//! [`ErrorRenderer`] for default messages).
//!
//! ```no_run
//! use argweave::{Registry, RootDef, ROOT, cmd, flag, parse};
//!
//! # async fn demo() -> Result<(), argweave::Error> {
//! let mut registry = Registry::new(RootDef::new("app"));
//! registry.register_flag(ROOT, flag("verbose").alias("v").switch())?;
//! registry.register_command(
//!     ROOT,
//!     cmd("greet").flag(flag("name").string().required(true)),
//! )?;
//!
//! let input = vec!["greet".to_string(), "--name".to_string(), "Ada".to_string()];
//! let output = parse(&registry, &input).await?;
//! assert_eq!(output.flags["name"].as_str(), Some("Ada"));
//! # Ok(())
//! # }
//! ```

pub mod entry;
pub mod error;
pub mod help;
pub mod parser;
mod reconcile;
pub mod registry;
mod scope;
pub mod tokens;
pub mod value;

pub use entry::{
    CommandAction, CommandBuilder, CommandDef, Contract, FlagBuilder, FlagDef, ParsedFlags,
    RootDef, cmd, flag,
};
pub use error::{Error, ErrorKind, ErrorRenderer};
pub use help::{EntryHelp, HelpContext};
pub use parser::{ParseOutput, TriggeredCommand, parse};
pub use registry::{Node, NodeKind, ROOT, Registry};
pub use tokens::{Prefixes, TokenSet};
pub use value::{Value, ValueError, ValueFuture, ValueParser, ValueReply, ValueRequest};
