// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Label and field projections of a heartbeat
//!
//! | key              | labels                 | fields            |
//! |------------------|------------------------|-------------------|
//! | `name`, `description`, `interval`, `intervalUnit`, `ownerTeam/id`, `ownerTeam/name`, `alertPriority`, `alertMessage` | always | always |
//! | `enabled`, `expired` | only when true (`"true"`) | always (`"true"`/`"false"`) |
//! | alert tags       | one label per tag      | `alertTags`, comma-joined |
//!
//! Tag `foo` becomes label `foo=true`, tag `foo: bar` becomes label `foo=bar`.
//! A tag never overrides a field label or an earlier tag with the same key.

use std::collections::BTreeMap;

use super::View;
use crate::heartbeat::Heartbeat;

/// Sparse projection used by label selectors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet(BTreeMap<String, String>);

/// Dense projection used by field selectors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet(BTreeMap<String, String>);

impl View for LabelSet {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl View for FieldSet {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for LabelSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Fields shared verbatim by both projections
fn common_entries(hb: &Heartbeat) -> [(&'static str, String); 8] {
    [
        ("name", hb.name.clone()),
        ("description", hb.description.clone()),
        ("interval", hb.interval.to_string()),
        ("intervalUnit", hb.interval_unit.clone()),
        ("ownerTeam/id", hb.owner_team.id.clone()),
        ("ownerTeam/name", hb.owner_team.name.clone()),
        ("alertPriority", hb.alert_priority.clone()),
        ("alertMessage", hb.alert_message.clone()),
    ]
}

/// Split an alert tag into its label key and value
fn tag_label(tag: &str) -> (&str, &str) {
    match tag.split_once(':') {
        Some((key, value)) => (key.trim(), value.trim()),
        None => (tag, "true"),
    }
}

/// Project a heartbeat into its label view
pub fn to_labels(hb: &Heartbeat) -> LabelSet {
    let mut labels: BTreeMap<String, String> = common_entries(hb)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    if hb.enabled {
        labels.insert("enabled".to_string(), "true".to_string());
    }
    if hb.expired {
        labels.insert("expired".to_string(), "true".to_string());
    }

    for tag in &hb.alert_tags {
        let (key, value) = tag_label(tag);
        labels
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    LabelSet(labels)
}

/// Project a heartbeat into its field view
pub fn to_fields(hb: &Heartbeat) -> FieldSet {
    let mut fields: BTreeMap<String, String> = common_entries(hb)
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

    fields.insert("enabled".to_string(), hb.enabled.to_string());
    fields.insert("expired".to_string(), hb.expired.to_string());
    fields.insert("alertTags".to_string(), hb.alert_tags.join(","));

    FieldSet(fields)
}
