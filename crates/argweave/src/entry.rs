//! Entry definitions and their builders.
//!
//! Definitions are plain descriptors: they carry no identity until they are
//! registered, at which point the registry assigns the index that serves as
//! identity from then on. Command definitions nest, and registering a
//! command cascades registration of everything it contains.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::tokens::Prefixes;
use crate::value::{BoolParser, NumParser, StrParser, Value, ValueParser};

/// Final parsed-flags mapping, in registration order.
pub type ParsedFlags = IndexMap<String, Value>;

/// Callback attached to a command. The core never invokes these; it hands
/// them back on triggered commands for the embedder's dispatcher.
pub type CommandAction = Arc<dyn Fn(&ParsedFlags) + Send + Sync>;

/// Root configuration for a new registry.
#[derive(Debug, Clone, Default)]
pub struct RootDef {
    pub name: String,
    pub description: String,
}

impl RootDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
        }
    }

    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.description = text.into();
        self
    }
}

/// Value-parsing contract attached to a flag.
#[derive(Clone)]
pub enum Contract {
    /// Presence alone is the value (`true`); consumes no following tokens.
    Presence,
    /// Declared value parser.
    Parser(Arc<dyn ValueParser>),
    /// Nothing declared. Matching the flag is an error, so an untyped flag
    /// can never silently accept input.
    Undeclared,
}

impl fmt::Debug for Contract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Presence => f.write_str("Presence"),
            Self::Parser(_) => f.write_str("Parser(..)"),
            Self::Undeclared => f.write_str("Undeclared"),
        }
    }
}

/// A declared flag, not yet registered.
#[derive(Debug, Clone)]
pub struct FlagDef {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) required: bool,
    pub(crate) default: Option<Value>,
    pub(crate) multiple: bool,
    pub(crate) prefixes: Prefixes,
    pub(crate) contract: Contract,
}

/// Start building a flag definition.
pub fn flag(name: impl Into<String>) -> FlagBuilder {
    FlagBuilder {
        def: FlagDef {
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            required: false,
            default: None,
            multiple: false,
            prefixes: Prefixes::flag(),
            contract: Contract::Undeclared,
        },
    }
}

#[derive(Debug, Clone)]
pub struct FlagBuilder {
    def: FlagDef,
}

impl FlagBuilder {
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.def.description = text.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.def.aliases.push(alias.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.def.required = required;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.def.default = Some(value.into());
        self
    }

    /// Allow the flag to collect several following values into a list.
    pub fn multiple(mut self, multiple: bool) -> Self {
        self.def.multiple = multiple;
        self
    }

    /// Override the `--`/`-` prefix convention for this flag.
    pub fn prefixes(mut self, main: impl Into<String>, alias: impl Into<String>) -> Self {
        self.def.prefixes = Prefixes {
            main: main.into(),
            alias: alias.into(),
        };
        self
    }

    /// Presence-only flag: being on the command line is the value.
    pub fn switch(mut self) -> Self {
        self.def.contract = Contract::Presence;
        self
    }

    /// Boolean flag accepting an optional explicit `true`/`false` token.
    pub fn boolean(mut self) -> Self {
        self.def.contract = Contract::Parser(Arc::new(BoolParser));
        self
    }

    /// String flag consuming the next token.
    pub fn string(mut self) -> Self {
        self.def.contract = Contract::Parser(Arc::new(StrParser));
        self
    }

    /// Numeric flag consuming the next token.
    pub fn number(mut self) -> Self {
        self.def.contract = Contract::Parser(Arc::new(NumParser));
        self
    }

    /// Attach a custom value contract.
    pub fn parser(mut self, parser: Arc<dyn ValueParser>) -> Self {
        self.def.contract = Contract::Parser(parser);
        self
    }

    pub fn build(self) -> FlagDef {
        self.def
    }
}

impl From<FlagBuilder> for FlagDef {
    fn from(builder: FlagBuilder) -> Self {
        builder.build()
    }
}

/// A declared command, not yet registered.
#[derive(Clone)]
pub struct CommandDef {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) aliases: Vec<String>,
    pub(crate) required: bool,
    pub(crate) flags: Vec<FlagDef>,
    pub(crate) commands: Vec<CommandDef>,
    pub(crate) action: Option<CommandAction>,
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("required", &self.required)
            .field("flags", &self.flags.len())
            .field("commands", &self.commands.len())
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Start building a command definition.
pub fn cmd(name: impl Into<String>) -> CommandBuilder {
    CommandBuilder {
        def: CommandDef {
            name: name.into(),
            description: String::new(),
            aliases: Vec::new(),
            required: false,
            flags: Vec::new(),
            commands: Vec::new(),
            action: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct CommandBuilder {
    def: CommandDef,
}

impl CommandBuilder {
    pub fn describe(mut self, text: impl Into<String>) -> Self {
        self.def.description = text.into();
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.def.aliases.push(alias.into());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.def.required = required;
        self
    }

    /// Nest a flag under this command.
    pub fn flag(mut self, def: impl Into<FlagDef>) -> Self {
        self.def.flags.push(def.into());
        self
    }

    /// Nest a subcommand under this command.
    pub fn command(mut self, def: impl Into<CommandDef>) -> Self {
        self.def.commands.push(def.into());
        self
    }

    /// Attach an action invoked by the embedder's dispatcher when this
    /// command is triggered.
    pub fn action(mut self, action: impl Fn(&ParsedFlags) + Send + Sync + 'static) -> Self {
        self.def.action = Some(Arc::new(action));
        self
    }

    pub fn build(self) -> CommandDef {
        self.def
    }
}

impl From<CommandBuilder> for CommandDef {
    fn from(builder: CommandBuilder) -> Self {
        builder.build()
    }
}
