//! Literal token matching for registered entries.

use crate::error::Error;

/// Prefixes applied when deriving an entry's literal tokens: one for the
/// primary name, one for every alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefixes {
    pub main: String,
    pub alias: String,
}

impl Prefixes {
    /// Conventional flag prefixes: `--name`, `-alias`.
    pub fn flag() -> Self {
        Self {
            main: "--".to_string(),
            alias: "-".to_string(),
        }
    }

    /// No prefixes; commands match their bare names.
    pub fn bare() -> Self {
        Self {
            main: String::new(),
            alias: String::new(),
        }
    }
}

/// The complete set of literal strings identifying one entry.
///
/// Matching is exact string membership. No partial matching, no prefix
/// matching, no case folding; anything fuzzier belongs in error-path
/// suggestion helpers, not here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    tokens: Vec<String>,
}

impl TokenSet {
    pub fn build(name: &str, aliases: &[String], prefixes: &Prefixes) -> Result<Self, Error> {
        let mut tokens = vec![join(&prefixes.main, name)?];
        for alias in aliases {
            let token = join(&prefixes.alias, alias)?;
            if !tokens.contains(&token) {
                tokens.push(token);
            }
        }
        Ok(Self { tokens })
    }

    /// The prefixed primary name.
    pub fn primary(&self) -> &str {
        &self.tokens[0]
    }

    pub fn matches(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str)
    }

    /// First token shared with `other`, if any.
    pub fn collides_with(&self, other: &TokenSet) -> Option<&str> {
        self.tokens
            .iter()
            .find(|t| other.matches(t))
            .map(String::as_str)
    }
}

/// Whitespace is the path-segment separator used internally, so a name or
/// alias may not be empty or contain any.
fn join(prefix: &str, input: &str) -> Result<String, Error> {
    if input.trim().is_empty() || input.contains(char::is_whitespace) {
        return Err(Error::BadToken {
            name: input.to_string(),
        });
    }
    Ok(format!("{prefix}{input}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_prefixed_name_and_aliases() {
        let set = TokenSet::build(
            "verbose",
            &["v".to_string(), "vv".to_string()],
            &Prefixes::flag(),
        )
        .unwrap();
        assert_eq!(set.primary(), "--verbose");
        assert!(set.matches("--verbose"));
        assert!(set.matches("-v"));
        assert!(set.matches("-vv"));
        assert!(!set.matches("verbose"));
    }

    #[test]
    fn matching_is_exact() {
        let set = TokenSet::build("serve", &[], &Prefixes::bare()).unwrap();
        assert!(set.matches("serve"));
        assert!(!set.matches("serv"));
        assert!(!set.matches("server"));
        assert!(!set.matches("SERVE"));
    }

    #[test]
    fn rejects_empty_and_whitespace_names() {
        assert!(matches!(
            TokenSet::build("", &[], &Prefixes::bare()),
            Err(Error::BadToken { .. })
        ));
        assert!(matches!(
            TokenSet::build("two words", &[], &Prefixes::bare()),
            Err(Error::BadToken { .. })
        ));
        assert!(matches!(
            TokenSet::build("ok", &[" ".to_string()], &Prefixes::flag()),
            Err(Error::BadToken { .. })
        ));
    }

    #[test]
    fn collision_detection_spans_aliases() {
        let a = TokenSet::build("port", &["p".to_string()], &Prefixes::flag()).unwrap();
        let b = TokenSet::build("profile", &["p".to_string()], &Prefixes::flag()).unwrap();
        assert_eq!(a.collides_with(&b), Some("-p"));
        let c = TokenSet::build("quiet", &["q".to_string()], &Prefixes::flag()).unwrap();
        assert_eq!(a.collides_with(&c), None);
    }
}
