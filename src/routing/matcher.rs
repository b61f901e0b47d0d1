//! Request matching for registered layers.
//!
//! # Responsibilities
//! - Match the request method against a layer's verb
//! - Match the request path against a path pattern and capture params
//!
//! # Design Decisions
//! - Literal segments match case-insensitively
//! - A single trailing `/` on the request path is tolerated
//! - `:name` captures exactly one non-empty segment
//! - A trailing `*` makes the final segment a prefix match; the remainder is captured as `"0"`
//! - No regex to guarantee O(n) matching

use std::collections::BTreeMap;

use axum::http::Method;

use crate::routing::verb::Verb;

/// Captured path parameters.
pub type Params = BTreeMap<String, String>;

/// Which methods a layer answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodMatcher {
    Any,
    Only(Method),
}

impl MethodMatcher {
    pub fn matches(&self, method: &Method) -> bool {
        match self {
            MethodMatcher::Any => true,
            // GET layers also answer HEAD.
            MethodMatcher::Only(expected) => {
                expected == method || (*expected == Method::GET && *method == Method::HEAD)
            }
        }
    }
}

impl From<Verb> for MethodMatcher {
    fn from(verb: Verb) -> Self {
        match verb.method() {
            Some(method) => MethodMatcher::Only(method),
            None => MethodMatcher::Any,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
}

/// A compiled path pattern such as `/account/:id` or `/files*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
    wildcard: bool,
}

impl PathPattern {
    pub fn parse(pattern: &str) -> Self {
        let (body, wildcard) = match pattern.strip_suffix('*') {
            Some(body) => (body, true),
            None => (pattern, false),
        };

        let segments = body
            .split('/')
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_prefix(':') {
                Some(name) if !name.is_empty() => Segment::Param(name.to_string()),
                _ => Segment::Literal(s.to_ascii_lowercase()),
            })
            .collect();

        Self {
            source: pattern.to_string(),
            segments,
            wildcard,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns captured params if `path` matches.
    pub fn matches(&self, path: &str) -> Option<Params> {
        let trimmed = path.strip_suffix('/').unwrap_or(path);
        let parts: Vec<&str> = trimmed.split('/').skip(1).collect();
        // "//" leaves a single empty piece behind.
        let parts: Vec<&str> = if parts == [""] { Vec::new() } else { parts };

        let mut params = Params::new();

        if !self.wildcard {
            if parts.len() != self.segments.len() {
                return None;
            }
            for (segment, part) in self.segments.iter().zip(&parts) {
                match_segment(segment, part, &mut params)?;
            }
            return Some(params);
        }

        let Some((last, leading)) = self.segments.split_last() else {
            params.insert("0".to_string(), path.to_string());
            return Some(params);
        };
        if parts.len() < self.segments.len() {
            return None;
        }
        for (segment, part) in leading.iter().zip(&parts) {
            match_segment(segment, part, &mut params)?;
        }

        let tail_start = leading.len();
        let tail = parts[tail_start..].join("/");
        let remainder = match last {
            Segment::Literal(prefix) => {
                let head = tail.get(..prefix.len())?;
                if !head.eq_ignore_ascii_case(prefix) {
                    return None;
                }
                tail[prefix.len()..].to_string()
            }
            Segment::Param(name) => {
                let first = parts[tail_start];
                if first.is_empty() {
                    return None;
                }
                params.insert(name.clone(), first.to_string());
                tail[first.len()..].to_string()
            }
        };
        params.insert("0".to_string(), remainder);
        Some(params)
    }
}

fn match_segment(segment: &Segment, part: &str, params: &mut Params) -> Option<()> {
    match segment {
        Segment::Literal(expected) => {
            if part.eq_ignore_ascii_case(expected) {
                Some(())
            } else {
                None
            }
        }
        Segment::Param(name) => {
            if part.is_empty() {
                return None;
            }
            params.insert(name.clone(), part.to_string());
            Some(())
        }
    }
}
