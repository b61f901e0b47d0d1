//! Registration ordering for one directory.
//!
//! # Responsibilities
//! - Parse `<verb>[-<order>].<ext>` filenames
//! - Order sibling route files (numbered first, then unnumbered; grouped by verb)
//! - Split wildcard routes out so they can be hoisted
//!
//! # Design Decisions
//! - Pure functions only: ordering depends on names and flags, never on I/O
//! - Verb is a secondary key; it groups files but says nothing about specificity
//! - All sorts are stable so ties keep their case-insensitive listing order

use std::cmp::Ordering;

use crate::routing::verb::Verb;

/// A filename that follows the route naming convention.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFileName {
    pub verb: Verb,
    /// Explicit intra-verb order; `None` sorts after every numbered file.
    pub order: Option<u64>,
    pub filename: String,
}

/// Parse a route filename. Returns `None` for anything that is not a route file.
///
/// The hyphen before the order is optional, so `get12.js` carries order 12.
pub fn parse_route_filename(filename: &str, extension: &str) -> Option<RouteFileName> {
    let extension = extension.trim_start_matches('.');
    let stem = filename
        .strip_suffix(extension)?
        .strip_suffix('.')?;

    let verb_len = stem
        .find(|c: char| !c.is_ascii_alphabetic())
        .unwrap_or(stem.len());
    if verb_len == 0 {
        return None;
    }
    let (verb, rest) = stem.split_at(verb_len);
    let digits = rest.strip_prefix('-').unwrap_or(rest);

    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Orders too large for u64 saturate, so they still sort after every smaller number.
    let order = if digits.is_empty() {
        None
    } else {
        Some(digits.parse::<u64>().unwrap_or(u64::MAX))
    };

    Some(RouteFileName {
        verb: verb.parse().ok()?,
        order,
        filename: filename.to_string(),
    })
}

/// Sibling order: verb, then explicit order ascending, unnumbered last.
pub fn compare(a: &RouteFileName, b: &RouteFileName) -> Ordering {
    a.verb
        .cmp(&b.verb)
        .then_with(|| compare_order(a.order, b.order))
}

fn compare_order(a: Option<u64>, b: Option<u64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Parse and order the candidate files of one directory, dropping non-route names.
pub fn order_route_files<S: AsRef<str>>(names: &[S], extension: &str) -> Vec<RouteFileName> {
    let mut files: Vec<RouteFileName> = names
        .iter()
        .filter_map(|name| parse_route_filename(name.as_ref(), extension))
        .collect();
    files.sort_by(compare);
    files
}

/// Stable case-insensitive sort of directory entry names.
pub fn sort_case_insensitive(names: &mut [String]) {
    names.sort_by(|a, b| {
        a.to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b))
    });
}

/// Split `items` into (wildcard, rest), each keeping its relative order.
pub fn partition_wildcards<T>(items: Vec<T>, is_wildcard: impl Fn(&T) -> bool) -> (Vec<T>, Vec<T>) {
    items.into_iter().partition(|item| is_wildcard(item))
}
