// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Heartbeat records and the remote API they come from
//!
//! The types here mirror the OpsGenie heartbeat API payloads. Everything the
//! selection engine and controller need from the remote service goes through
//! the [`HeartbeatApi`] trait so tests can substitute an in-memory fake.

mod client;

pub use client::{DEFAULT_API_URL, OpsGenieClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Team owning a heartbeat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerTeam {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Snapshot of a heartbeat as returned by the remote service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Heartbeat {
    pub name: String,
    pub description: String,
    pub interval: u32,
    pub interval_unit: String,
    pub enabled: bool,
    pub expired: bool,
    pub owner_team: OwnerTeam,
    pub alert_tags: Vec<String>,
    pub alert_priority: String,
    pub alert_message: String,
}

impl Heartbeat {
    pub fn status(&self) -> HeartbeatStatus {
        HeartbeatStatus::of(self)
    }
}

/// Post-mutation snapshot returned by enable/disable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeartbeatInfo {
    pub name: String,
    pub enabled: bool,
    pub expired: bool,
}

/// Outcome of a ping request
///
/// A successful ping does not prove the heartbeat exists; OpsGenie answers
/// pings for unknown names too.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    pub message: String,
}

/// Coarse status shown by `list`/`get` and used by `list --status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum HeartbeatStatus {
    Active,
    Disabled,
    Expired,
}

impl HeartbeatStatus {
    /// Disabled wins over expired: a disabled heartbeat is never reported expired
    pub fn of(hb: &Heartbeat) -> Self {
        if !hb.enabled {
            HeartbeatStatus::Disabled
        } else if hb.expired {
            HeartbeatStatus::Expired
        } else {
            HeartbeatStatus::Active
        }
    }
}

impl fmt::Display for HeartbeatStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HeartbeatStatus::Active => "ACTIVE",
            HeartbeatStatus::Disabled => "DISABLED",
            HeartbeatStatus::Expired => "EXPIRED",
        };
        f.write_str(s)
    }
}

/// Errors from the remote heartbeat API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
}

/// Remote operations the controller relies on
#[async_trait]
pub trait HeartbeatApi: Send + Sync {
    /// List all heartbeats. The `expired` flag in this listing is unreliable;
    /// use [`HeartbeatApi::get`] for an accurate record.
    async fn list(&self) -> Result<Vec<Heartbeat>, ApiError>;

    /// Fetch a single heartbeat by name
    async fn get(&self, name: &str) -> Result<Heartbeat, ApiError>;

    /// Enable or disable a heartbeat
    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<HeartbeatInfo, ApiError>;

    /// Send a ping to a heartbeat
    async fn ping(&self, name: &str) -> Result<PingResult, ApiError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heartbeat_deserialize_camel_case() {
        let json = r#"{
            "name": "foo",
            "description": "Heartbeat for foo",
            "interval": 5,
            "intervalUnit": "minutes",
            "enabled": true,
            "expired": false,
            "ownerTeam": {"id": "f000", "name": "a-team"},
            "alertTags": ["managed-by: foobricator"],
            "alertPriority": "P2",
            "alertMessage": "foo has no heartbeat"
        }"#;
        let hb: Heartbeat = serde_json::from_str(json).unwrap();
        assert_eq!(hb.name, "foo");
        assert_eq!(hb.interval, 5);
        assert_eq!(hb.interval_unit, "minutes");
        assert_eq!(hb.owner_team.name, "a-team");
        assert_eq!(hb.alert_tags, vec!["managed-by: foobricator"]);
    }

    #[test]
    fn test_heartbeat_deserialize_missing_fields() {
        let hb: Heartbeat = serde_json::from_str(r#"{"name": "baz"}"#).unwrap();
        assert_eq!(hb.name, "baz");
        assert_eq!(hb.interval, 0);
        assert!(!hb.enabled);
        assert!(hb.alert_tags.is_empty());
        assert_eq!(hb.owner_team, OwnerTeam::default());
    }

    #[test]
    fn test_status() {
        let mut hb = Heartbeat {
            enabled: true,
            ..Default::default()
        };
        assert_eq!(hb.status(), HeartbeatStatus::Active);
        hb.expired = true;
        assert_eq!(hb.status(), HeartbeatStatus::Expired);
        hb.enabled = false;
        assert_eq!(hb.status(), HeartbeatStatus::Disabled);
        assert_eq!(HeartbeatStatus::Disabled.to_string(), "DISABLED");
    }
}
