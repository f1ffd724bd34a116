//! Defines the Scope type and parsing/formatting according to the rfc.
use std::collections::BTreeSet;
use std::{cmp, fmt, str};

use serde::{Deserialize, Serialize};

/// Scope of a request, grant or consent, a set of scope-tokens separated by spaces.
///
/// Scopes are interpreted as a conjunction of scope tokens. This induces a partial ordering on
/// scopes where scope `A` is less or equal than scope `B` if all scope tokens of `A` are also
/// found in `B`. A consent with scope `B` covers a request for scope `A` iff `A <= B`.
///
/// ```
/// # use oxide_openid::primitives::scope::Scope;
/// let consent   = "openid profile email".parse::<Scope>().unwrap();
/// let requested = "openid email".parse::<Scope>().unwrap();
/// let other     = "openid address".parse::<Scope>().unwrap();
///
/// assert!(requested <= consent);
/// assert!(consent.privileged_to(&requested));
/// assert!(!(other <= consent));
/// ```
///
/// Tokens are kept sorted, so the formatted scope does not depend on the request order.
///
/// Scope-tokens are restricted to the following subset of ascii:
///   - The character '!'
///   - The character range '\x23' to '\x5b' which includes numbers and upper case letters
///   - The character range '\x5d' to '\x7e' which includes lower case letters
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Scope {
    tokens: BTreeSet<String>,
}

/// The scope-token requesting OpenID authentication.
pub const OPENID: &str = "openid";

impl Scope {
    fn invalid_scope_char(ch: char) -> bool {
        match ch {
            '\x21' => false,
            ch if ('\x23'..='\x5b').contains(&ch) => false,
            ch if ('\x5d'..='\x7e').contains(&ch) => false,
            ' ' => false,
            _ => true,
        }
    }

    /// Determines if this scope covers everything required by the scope on the right side. This
    /// operation is equivalent to comparison via `>=`.
    pub fn privileged_to(&self, rhs: &Scope) -> bool {
        rhs <= self
    }

    /// Determines if this scope is covered by the scope on the right side. This operation is
    /// equivalent to comparison via `<=`.
    pub fn allow_access(&self, rhs: &Scope) -> bool {
        self <= rhs
    }

    /// If the token is part of the scope.
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.contains(token)
    }

    /// If the scope requests OpenID authentication.
    pub fn is_openid(&self) -> bool {
        self.contains(OPENID)
    }

    /// Create an iterator over the individual scopes, in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(AsRef::as_ref)
    }

    /// Number of scope-tokens.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// If there is no scope-token at all.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

/// Error returned from parsing a scope as encoded in an authorization request.
#[derive(Debug)]
pub enum ParseScopeErr {
    /// A character was encountered which is not allowed to appear in scope strings.
    ///
    /// In particular, the characters '\x22' (`"`) and '\x5c' (`\`)  are not allowed.
    InvalidCharacter(char),
}

impl str::FromStr for Scope {
    type Err = ParseScopeErr;

    fn from_str(string: &str) -> Result<Scope, ParseScopeErr> {
        if let Some(ch) = string.chars().find(|&ch| Scope::invalid_scope_char(ch)) {
            return Err(ParseScopeErr::InvalidCharacter(ch));
        }
        let tokens = string.split(' ').filter(|s| !s.is_empty());
        Ok(Scope {
            tokens: tokens.map(str::to_string).collect(),
        })
    }
}

impl<S: Into<String>> FromIterator<S> for Scope {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Scope {
            tokens: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for ParseScopeErr {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            ParseScopeErr::InvalidCharacter(chr) => {
                write!(fmt, "Encountered invalid character in scope: {}", chr)
            }
        }
    }
}

impl std::error::Error for ParseScopeErr {}

impl fmt::Debug for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple("Scope").field(&self.tokens).finish()
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let output = self.iter().collect::<Vec<_>>().join(" ");
        fmt.write_str(&output)
    }
}

impl PartialOrd for Scope {
    fn partial_cmp(&self, rhs: &Self) -> Option<cmp::Ordering> {
        match (self.tokens.is_subset(&rhs.tokens), rhs.tokens.is_subset(&self.tokens)) {
            (true, true) => Some(cmp::Ordering::Equal),
            (true, false) => Some(cmp::Ordering::Less),
            (false, true) => Some(cmp::Ordering::Greater),
            (false, false) => None,
        }
    }
}

impl Serialize for Scope {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Scope {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parsing() {
        let scope: Scope = ["openid", "profile", "email"].iter().copied().collect();
        let formatted = scope.to_string();
        assert_eq!(formatted, "email openid profile");
        let parsed = formatted.parse::<Scope>().unwrap();
        assert_eq!(scope, parsed);

        let from_string = "profile  email openid openid".parse::<Scope>().unwrap();
        assert_eq!(scope, from_string);
        assert!("open\"id".parse::<Scope>().is_err());
    }

    #[test]
    fn test_compare() {
        let scope_base = "cap1 cap2".parse::<Scope>().unwrap();
        let scope_less = "cap1".parse::<Scope>().unwrap();
        let scope_uncmp = "cap1 cap3".parse::<Scope>().unwrap();

        assert_eq!(scope_base.partial_cmp(&scope_less), Some(cmp::Ordering::Greater));
        assert_eq!(scope_less.partial_cmp(&scope_base), Some(cmp::Ordering::Less));
        assert_eq!(scope_base.partial_cmp(&scope_uncmp), None);
        assert_eq!(scope_base.partial_cmp(&scope_base), Some(cmp::Ordering::Equal));

        assert!(scope_base.privileged_to(&scope_less));
        assert!(scope_less.allow_access(&scope_base));
        assert!(!scope_less.privileged_to(&scope_base));
        assert!(!scope_uncmp.allow_access(&scope_base));

        // The empty scope is covered by everything.
        assert!(Scope::default() <= scope_less);
    }

    #[test]
    fn openid_marker() {
        assert!("profile openid".parse::<Scope>().unwrap().is_openid());
        assert!(!"profile".parse::<Scope>().unwrap().is_openid());
    }

    #[test]
    fn serialization() {
        let scope = "cap1 cap2 cap3".parse::<Scope>().unwrap();
        let serialized = serde_json::to_string(&scope).unwrap();
        assert_eq!(serialized, "\"cap1 cap2 cap3\"");
        let deserialized = serde_json::from_str::<Scope>(&serialized).unwrap();
        assert_eq!(scope, deserialized);
        assert!(serde_json::from_str::<Scope>("\"\\\\\"").is_err());
    }
}
