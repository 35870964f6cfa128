// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Heartbeat selection
//!
//! Turns a [`SelectorConfig`] (name patterns, kubectl-style label selector,
//! kubectl-style field selector) into the exact set of heartbeats an
//! operation acts on.
//!
//! ## Views
//!
//! Each heartbeat is projected twice (see [`projector`]):
//! - a sparse [`LabelSet`](projector::LabelSet) for label selectors (false booleans omitted,
//!   alert tags split into their own labels)
//! - a dense [`FieldSet`](projector::FieldSet) for field selectors (every field present,
//!   alert tags joined under `alertTags`)
//!
//! The two selector grammars live in separate modules and share nothing
//! except the [`Predicate`] trait.

pub mod batch;
pub mod engine;
pub mod fields;
pub mod labels;
pub mod names;
pub mod projector;

pub use batch::{BatchOutcome, apply_to_each};
pub use engine::{Selection, require_non_empty};
pub use projector::{to_fields, to_labels};

use std::fmt;

/// Selector options restricting which heartbeats an operation targets
///
/// Heartbeats matching any of the name expressions are kept; the label and
/// field selectors, when given, must match as well.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectorConfig {
    /// Regular expressions matched against the whole heartbeat name
    pub name_expressions: Vec<String>,
    /// kubectl-compatible label selector; empty accepts everything
    pub label_selector: String,
    /// kubectl-compatible field selector; empty accepts everything
    pub field_selector: String,
}

impl SelectorConfig {
    /// True when nothing restricts the selection, i.e. every heartbeat is targeted
    pub fn is_empty(&self) -> bool {
        self.name_expressions.is_empty()
            && self.label_selector.is_empty()
            && self.field_selector.is_empty()
    }
}

/// Which selector grammar an error came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorKind {
    Label,
    Field,
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorKind::Label => f.write_str("label"),
            SelectorKind::Field => f.write_str("field"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SelectionError {
    #[error("invalid name expression: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid {kind} selector '{selector}': {reason}")]
    InvalidSelector {
        kind: SelectorKind,
        selector: String,
        reason: String,
    },

    #[error("no selector options given, to target all heartbeats pass '.*' name expression explicitly")]
    EmptySelector,
}

impl SelectionError {
    pub(crate) fn label(selector: &str, reason: impl Into<String>) -> Self {
        SelectionError::InvalidSelector {
            kind: SelectorKind::Label,
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn field(selector: &str, reason: impl Into<String>) -> Self {
        SelectionError::InvalidSelector {
            kind: SelectorKind::Field,
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }
}

/// String-keyed read access to a projected heartbeat
pub trait View {
    fn get(&self, key: &str) -> Option<&str>;
}

/// A parsed selector that can be evaluated against any [`View`]
pub trait Predicate: Send + Sync + fmt::Debug {
    fn matches(&self, view: &dyn View) -> bool;

    /// True when the predicate accepts every view
    fn is_everything(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_config_empty() {
        assert!(SelectorConfig::default().is_empty());
        assert!(
            !SelectorConfig {
                name_expressions: vec!["foo".to_string()],
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !SelectorConfig {
                label_selector: "enabled".to_string(),
                ..Default::default()
            }
            .is_empty()
        );
        assert!(
            !SelectorConfig {
                field_selector: "alertPriority=P3".to_string(),
                ..Default::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_invalid_selector_message() {
        let err = SelectionError::label("a b", "unexpected token 'b'");
        assert_eq!(
            err.to_string(),
            "invalid label selector 'a b': unexpected token 'b'"
        );
    }
}
