//! Placeholder spelling normalization
//!
//! Filter strings arrive in two dialects:
//!
//! - inline: `CompanyID = {Company.ID}`
//! - positional: `CompanyID = {0} | [Company.ID]`, where each `| [a, b]`
//!   section appends names to a binding list and `{N}` refers to its N-th
//!   entry
//!
//! [`canonicalize`] rewrites both into the inline dialect.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

static BINDING_SECTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\|\s*\[([^\]]*)\]").expect("binding pattern is valid"));

static POSITIONAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\d+)\}").expect("positional pattern is valid"));

static INLINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{([^}]+)\}").expect("inline pattern is valid"));

static STATIC_KEY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{(\w+)\}").expect("static key pattern is valid"));

/// A filter string rewritten to inline placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Canonicalized {
    /// The filter with every placeholder spelled `{Entity.Attribute}`
    pub normalized: String,
    /// Placeholder names in binding (or first-occurrence) order
    pub variables: Vec<String>,
}

/// Rewrite positional placeholders to inline ones and list the names used.
///
/// A positional index without a binding becomes `{placeholderN}`.
#[must_use]
pub fn canonicalize(input: &str) -> Canonicalized {
    let Some(first) = BINDING_SECTION.find(input) else {
        return Canonicalized {
            normalized: input.to_string(),
            variables: inline_names(input),
        };
    };

    let bindings: Vec<String> = BINDING_SECTION
        .captures_iter(input)
        .flat_map(|caps| {
            caps[1]
                .split(',')
                .map(|name| name.trim().to_string())
                .collect::<Vec<_>>()
        })
        .collect();

    let main = input[..first.start()].trim();
    let normalized = POSITIONAL
        .replace_all(main, |caps: &Captures| {
            let index = &caps[1];
            match index.parse::<usize>().ok().and_then(|i| bindings.get(i)) {
                Some(name) if !name.is_empty() => format!("{{{name}}}"),
                _ => format!("{{placeholder{index}}}"),
            }
        })
        .into_owned();

    let mut variables: Vec<String> = Vec::with_capacity(bindings.len());
    for name in bindings {
        if !name.is_empty() && !variables.contains(&name) {
            variables.push(name);
        }
    }

    log::debug!("canonicalized {:?} -> {:?}", input, normalized);
    Canonicalized {
        normalized,
        variables,
    }
}

fn inline_names(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for caps in INLINE.captures_iter(input) {
        let name = caps[1].trim();
        if !name.is_empty() && !names.iter().any(|known| known == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Substitute concrete text into a filter string.
///
/// `{key}` (word characters only) is replaced from `statics` when present.
/// Each `| [a, b]` binding section is replaced by the next values of
/// `dynamic`, joined with `", "`; names with no value left stay as `{name}`.
#[must_use]
pub fn replace_placeholders(
    sql: &str,
    statics: &HashMap<String, String>,
    dynamic: &[String],
) -> String {
    let with_statics = STATIC_KEY.replace_all(sql, |caps: &Captures| {
        statics
            .get(&caps[1])
            .cloned()
            .unwrap_or_else(|| caps[0].to_string())
    });

    let mut remaining = dynamic.iter();
    BINDING_SECTION
        .replace_all(&with_statics, |caps: &Captures| {
            caps[1]
                .split(',')
                .map(|key| {
                    remaining
                        .next()
                        .cloned()
                        .unwrap_or_else(|| format!("{{{}}}", key.trim()))
                })
                .collect::<Vec<_>>()
                .join(", ")
        })
        .into_owned()
}
