// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Field selector parsing and matching
//!
//! Field selectors filter heartbeats by exact field values, using the same
//! syntax as `kubectl --field-selector`.
//!
//! ## Field Selector Basics
//!
//! - Only `=`, `==` and `!=` are supported (no `in`, `notin`, exists)
//! - Terms are comma-separated and must all match
//! - Every heartbeat field is available, booleans as `true`/`false` and
//!   alert tags joined with commas under `alertTags`
//! - Values must escape `,`, `=` and `\` with a backslash:
//!   `alertTags=a\,b` matches tags `["a", "b"]`. An unescaped `=` in a
//!   value is an error, so a typo like `alertPriority!==P3` is rejected
//!   instead of comparing against `=P3`

use std::fmt;

use super::{Predicate, SelectionError, View};

/// Operators checked in this order at each position of a term
const OPERATORS: [(&str, FieldSelectorOperator); 3] = [
    ("!=", FieldSelectorOperator::NotEquals),
    ("==", FieldSelectorOperator::Equals),
    ("=", FieldSelectorOperator::Equals),
];

/// Represents a field selector operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldSelectorOperator {
    /// Equals operator (= or ==)
    Equals,
    /// Not equals operator (!=)
    NotEquals,
}

/// A single `path op value` term
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRequirement {
    /// Field name, e.g. "alertPriority" or "ownerTeam/name"
    pub path: String,
    pub operator: FieldSelectorOperator,
    /// Unescaped value to compare against
    pub value: String,
}

impl FieldRequirement {
    /// Fields missing from the view compare as the empty string
    pub fn matches(&self, view: &dyn View) -> bool {
        let actual = view.get(&self.path).unwrap_or("");
        match self.operator {
            FieldSelectorOperator::Equals => actual == self.value,
            FieldSelectorOperator::NotEquals => actual != self.value,
        }
    }
}

impl fmt::Display for FieldRequirement {
    /// Examples:
    /// - `FieldRequirement { path: "alertPriority", operator: Equals, value: "P3" }`
    ///   → `"alertPriority=P3"`
    /// - `FieldRequirement { path: "enabled", operator: NotEquals, value: "true" }`
    ///   → `"enabled!=true"`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = escape_value(&self.value);
        match self.operator {
            FieldSelectorOperator::Equals => write!(f, "{}={}", self.path, value),
            FieldSelectorOperator::NotEquals => write!(f, "{}!={}", self.path, value),
        }
    }
}

/// Parsed field selector; matches when every requirement matches
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSelector {
    requirements: Vec<FieldRequirement>,
}

impl FieldSelector {
    pub fn everything() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn requirements(&self) -> &[FieldRequirement] {
        &self.requirements
    }
}

impl Predicate for FieldSelector {
    fn matches(&self, view: &dyn View) -> bool {
        self.requirements.iter().all(|r| r.matches(view))
    }

    fn is_everything(&self) -> bool {
        self.requirements.is_empty()
    }
}

impl fmt::Display for FieldSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let terms: Vec<String> = self.requirements.iter().map(|r| r.to_string()).collect();
        f.write_str(&terms.join(","))
    }
}

/// Parse a field selector; empty text selects everything
pub fn parse(selector: &str) -> Result<FieldSelector, SelectionError> {
    if selector.is_empty() {
        return Ok(FieldSelector::everything());
    }
    let mut requirements = Vec::new();

    for term in split_terms(selector) {
        if term.is_empty() {
            continue;
        }
        let (path, operator, raw_value) = split_term(&term).ok_or_else(|| {
            SelectionError::field(
                selector,
                format!("can't understand '{}', expected: '=', '==' or '!='", term),
            )
        })?;
        let value = unescape_value(raw_value).map_err(|reason| SelectionError::field(selector, reason))?;
        requirements.push(FieldRequirement {
            path: path.to_string(),
            operator,
            value,
        });
    }

    Ok(FieldSelector { requirements })
}

/// Split on commas that are not escaped; escapes are kept for [`split_term`]
fn split_terms(selector: &str) -> Vec<String> {
    let mut terms = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in selector.chars() {
        match c {
            _ if escaped => {
                current.push(c);
                escaped = false;
            }
            '\\' => {
                current.push(c);
                escaped = true;
            }
            ',' => terms.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    terms.push(current);
    terms
}

/// Split around the first operator found scanning left to right
///
/// Escapes are not considered here: keys never carry them, and an operator
/// character left over in the value is rejected by [`unescape_value`].
fn split_term(term: &str) -> Option<(&str, FieldSelectorOperator, &str)> {
    for (i, _) in term.char_indices() {
        let rest = &term[i..];
        for (symbol, operator) in OPERATORS {
            if rest.starts_with(symbol) {
                return Some((&term[..i], operator, &rest[symbol.len()..]));
            }
        }
    }
    None
}

fn unescape_value(raw: &str) -> Result<String, String> {
    let mut value = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {}
            ',' | '=' => {
                return Err(format!("unescaped character '{}' in value '{}'", c, raw));
            }
            _ => {
                value.push(c);
                continue;
            }
        }
        match chars.next() {
            Some(escaped @ ('\\' | ',' | '=')) => value.push(escaped),
            Some(other) => {
                return Err(format!("invalid escape sequence '\\{}' in '{}'", other, raw));
            }
            None => return Err(format!("unterminated escape sequence in '{}'", raw)),
        }
    }
    Ok(value)
}

fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ',' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
