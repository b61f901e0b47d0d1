//! Request verbs a route file can declare.

use std::fmt;
use std::str::FromStr;

use axum::http::Method;

/// One of the six verbs a route file may be named after.
///
/// Variants are declared in lexical order so the derived `Ord` groups
/// same-verb files the same way sorting the verb strings would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Verb {
    All,
    Delete,
    Get,
    Patch,
    Post,
    Put,
}

impl Verb {
    pub const ALL: [Verb; 6] = [
        Verb::All,
        Verb::Delete,
        Verb::Get,
        Verb::Patch,
        Verb::Post,
        Verb::Put,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Verb::All => "all",
            Verb::Delete => "delete",
            Verb::Get => "get",
            Verb::Patch => "patch",
            Verb::Post => "post",
            Verb::Put => "put",
        }
    }

    /// The HTTP method this verb is bound to, `None` for `all`.
    pub fn method(self) -> Option<Method> {
        match self {
            Verb::All => None,
            Verb::Delete => Some(Method::DELETE),
            Verb::Get => Some(Method::GET),
            Verb::Patch => Some(Method::PATCH),
            Verb::Post => Some(Method::POST),
            Verb::Put => Some(Method::PUT),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown verb '{0}'")]
pub struct UnknownVerb(pub String);

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Verb::ALL
            .into_iter()
            .find(|v| v.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownVerb(s.to_string()))
    }
}
