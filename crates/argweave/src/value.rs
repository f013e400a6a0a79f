//! Typed flag values and the value-parsing contract.
//!
//! A flag's value contract receives the tokens that follow the flag and
//! reports back both the converted value and how many of those tokens it
//! consumed. Making the consumption width part of the reply keeps the
//! parser's cursor handling in one place instead of spreading it across
//! callbacks.

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// A parsed flag value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Num(f64),
    Str(String),
    List(Vec<Value>),
}

impl Value {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_num(&self) -> Option<f64> {
        match self {
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Num(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

/// Lookahead handed to a flag's value contract.
///
/// `rest` starts at the token *after* the flag itself. The request also
/// exposes whether a token is registered anywhere in the grammar, so that
/// a following flag or command always terminates value collection.
pub struct ValueRequest<'a> {
    rest: &'a [String],
    default: Option<&'a Value>,
    multiple: bool,
    registered: &'a (dyn Fn(&str) -> bool + Sync),
}

impl<'a> ValueRequest<'a> {
    pub fn new(
        rest: &'a [String],
        default: Option<&'a Value>,
        multiple: bool,
        registered: &'a (dyn Fn(&str) -> bool + Sync),
    ) -> Self {
        Self {
            rest,
            default,
            multiple,
            registered,
        }
    }

    /// Remaining input, starting at the token after the flag.
    pub fn rest(&self) -> &'a [String] {
        self.rest
    }

    /// The immediately following token, if any.
    pub fn next(&self) -> Option<&'a str> {
        self.rest.first().map(String::as_str)
    }

    /// The flag's declared default, if any.
    pub fn default(&self) -> Option<&'a Value> {
        self.default
    }

    /// Whether the flag collects repeated values into a list.
    pub fn multiple(&self) -> bool {
        self.multiple
    }

    /// Whether `token` identifies any registered entry.
    pub fn is_registered(&self, token: &str) -> bool {
        (self.registered)(token)
    }
}

/// Successful value consumption: the converted value plus the number of
/// following tokens it swallowed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueReply {
    pub value: Value,
    pub consumed: usize,
}

impl ValueReply {
    pub fn new(value: impl Into<Value>, consumed: usize) -> Self {
        Self {
            value: value.into(),
            consumed,
        }
    }
}

/// Failure reported by a value contract.
///
/// `Missing` and `Invalid` fall back to the flag's default when one is
/// declared; `Failure` never does.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueError {
    /// No token was available to consume.
    Missing,
    /// A token was present but is not a valid value.
    Invalid { token: String },
    /// The contract itself failed.
    Failure { message: String },
}

pub type ValueFuture<'a> = BoxFuture<'a, Result<ValueReply, ValueError>>;

/// Value-parsing capability attached to a flag.
///
/// The contract is uniformly asynchronous so validators that need I/O
/// (checking a path exists, say) share the same suspension point as the
/// built-in coercers. Tokens are always resolved strictly in order; the
/// resolution loop awaits each contract before looking at the next token.
pub trait ValueParser: Send + Sync {
    fn parse<'a>(&'a self, req: ValueRequest<'a>) -> ValueFuture<'a>;
}

/// `true`/`false` literals, with `1`/`0` accepted as shorthand.
fn bool_token(token: &str) -> Option<bool> {
    match token {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// A token is a number only if it survives a finite round-trip. The
/// literal string `"NaN"` parses but is rejected here, as are empty and
/// whitespace-only tokens.
fn num_token(token: &str) -> Option<f64> {
    if token.trim().is_empty() {
        return None;
    }
    token.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn str_token(token: &str) -> Option<&str> {
    if token.is_empty() { None } else { Some(token) }
}

/// Consume exactly one following token.
fn single(req: &ValueRequest<'_>, accept: impl Fn(&str) -> Option<Value>) -> Result<ValueReply, ValueError> {
    let Some(token) = req.next() else {
        return Err(ValueError::Missing);
    };
    // A registered token means the value was omitted, not mistyped.
    if req.is_registered(token) {
        return Err(ValueError::Missing);
    }
    match accept(token) {
        Some(value) => Ok(ValueReply::new(value, 1)),
        None => Err(ValueError::Invalid {
            token: token.to_string(),
        }),
    }
}

/// Greedily consume tokens while each is a valid value and none of them
/// identifies a registered entry.
fn collect(req: &ValueRequest<'_>, accept: impl Fn(&str) -> Option<Value>) -> Result<ValueReply, ValueError> {
    let mut items = Vec::new();
    for token in req.rest() {
        if req.is_registered(token) {
            break;
        }
        match accept(token) {
            Some(value) => items.push(value),
            None if items.is_empty() => {
                return Err(ValueError::Invalid {
                    token: token.clone(),
                });
            }
            // An invalid tail token ends collection; the main loop will
            // resolve it (and report it) as an ordinary token.
            None => break,
        }
    }
    if items.is_empty() {
        return Err(ValueError::Missing);
    }
    let consumed = items.len();
    Ok(ValueReply::new(Value::List(items), consumed))
}

fn consume(req: &ValueRequest<'_>, accept: impl Fn(&str) -> Option<Value>) -> Result<ValueReply, ValueError> {
    if req.multiple() {
        collect(req, accept)
    } else {
        single(req, accept)
    }
}

/// Boolean coercion. An explicit `true`/`false`/`1`/`0` token is consumed;
/// anything else means "no explicit value supplied" and the flag falls
/// through to its default, or `true` when it has none.
pub(crate) struct BoolParser;

impl ValueParser for BoolParser {
    fn parse<'a>(&'a self, req: ValueRequest<'a>) -> ValueFuture<'a> {
        Box::pin(async move {
            if req.multiple() {
                if let Ok(reply) = collect(&req, |t| bool_token(t).map(Value::Bool)) {
                    return Ok(reply);
                }
                return Ok(bool_fallthrough(&req));
            }
            match req.next().and_then(bool_token) {
                Some(explicit) => Ok(ValueReply::new(explicit, 1)),
                None => Ok(bool_fallthrough(&req)),
            }
        })
    }
}

fn bool_fallthrough(req: &ValueRequest<'_>) -> ValueReply {
    let value = req.default().cloned().unwrap_or(Value::Bool(true));
    ValueReply { value, consumed: 0 }
}

/// String coercion: any non-empty token that is not itself registered.
pub(crate) struct StrParser;

impl ValueParser for StrParser {
    fn parse<'a>(&'a self, req: ValueRequest<'a>) -> ValueFuture<'a> {
        Box::pin(async move { consume(&req, |t| str_token(t).map(Value::from)) })
    }
}

/// Numeric coercion, see [`num_token`] for what counts as a number.
pub(crate) struct NumParser;

impl ValueParser for NumParser {
    fn parse<'a>(&'a self, req: ValueRequest<'a>) -> ValueFuture<'a> {
        Box::pin(async move { consume(&req, |t| num_token(t).map(Value::Num)) })
    }
}
