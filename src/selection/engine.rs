// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Combining name expressions, label and field selectors

use tracing::debug;

use super::names::NameMatcher;
use super::{Predicate, SelectionError, SelectorConfig, fields, labels, to_fields, to_labels};
use crate::heartbeat::Heartbeat;

/// A compiled [`SelectorConfig`]
///
/// Compiling up front surfaces bad patterns and selectors before any remote
/// call is made.
#[derive(Debug)]
pub struct Selection {
    names: Option<NameMatcher>,
    labels: Box<dyn Predicate>,
    fields: Box<dyn Predicate>,
}

impl Selection {
    pub fn compile(config: &SelectorConfig) -> Result<Self, SelectionError> {
        // No name expressions means no name restriction, not "match nothing"
        let names = if config.name_expressions.is_empty() {
            None
        } else {
            Some(NameMatcher::new(&config.name_expressions)?)
        };
        let labels = labels::parse(&config.label_selector)?;
        let fields = fields::parse(&config.field_selector)?;

        debug!(
            names = names.as_ref().map(|n| n.as_str()),
            labels = %labels,
            fields = %fields,
            "Compiled selection"
        );

        Ok(Self {
            names,
            labels: Box::new(labels),
            fields: Box::new(fields),
        })
    }

    /// True when name, label and field restrictions all hold
    pub fn matches(&self, hb: &Heartbeat) -> bool {
        if let Some(names) = &self.names
            && !names.is_match(&hb.name)
        {
            return false;
        }
        // skip building a view nobody looks at
        (self.labels.is_everything() || self.labels.matches(&to_labels(hb)))
            && (self.fields.is_everything() || self.fields.matches(&to_fields(hb)))
    }

    /// Keep matching heartbeats, sorted by name
    pub fn apply(&self, heartbeats: Vec<Heartbeat>) -> Vec<Heartbeat> {
        let total = heartbeats.len();
        let mut selected: Vec<Heartbeat> =
            heartbeats.into_iter().filter(|hb| self.matches(hb)).collect();
        selected.sort_by(|a, b| a.name.cmp(&b.name));

        debug!(total, selected = selected.len(), "Applied selection");
        selected
    }
}

/// Filter `heartbeats` by `config`, sorted by name
#[cfg(test)]
pub fn select(
    heartbeats: Vec<Heartbeat>,
    config: &SelectorConfig,
) -> Result<Vec<Heartbeat>, SelectionError> {
    Ok(Selection::compile(config)?.apply(heartbeats))
}

/// Reject selector configs that would target every heartbeat
///
/// Mutating operations call this first; to really target everything pass
/// the `.*` name expression.
pub fn require_non_empty(config: &SelectorConfig) -> Result<(), SelectionError> {
    if config.is_empty() {
        return Err(SelectionError::EmptySelector);
    }
    Ok(())
}
