// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! heartbeatctl operations
//!
//! Every operation fetches a fresh snapshot of all heartbeats, narrows it
//! down with a [`Selection`] and, for mutating operations, applies the
//! remote call to each selected heartbeat in name order.

use futures::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::heartbeat::{
    ApiError, Heartbeat, HeartbeatApi, HeartbeatInfo, HeartbeatStatus, PingResult,
};
use crate::selection::batch::RemoteError;
use crate::selection::{
    BatchOutcome, Selection, SelectionError, SelectorConfig, apply_to_each, require_non_empty,
};

#[derive(Debug, thiserror::Error)]
pub enum CtlError {
    #[error(transparent)]
    Selection(#[from] SelectionError),

    #[error("failed to list heartbeats: {0}")]
    Listing(#[source] ApiError),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// Application entry point wrapping a [`HeartbeatApi`]
pub struct Ctl<A: ?Sized> {
    api: Arc<A>,
}

impl<A: HeartbeatApi + ?Sized> Ctl<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    /// Heartbeats matching `config`, sorted by name
    ///
    /// An empty config returns every heartbeat.
    pub async fn get(&self, config: &SelectorConfig) -> Result<Vec<Heartbeat>, CtlError> {
        let selection = Selection::compile(config)?;
        let heartbeats = self.fetch_all().await?;
        Ok(selection.apply(heartbeats))
    }

    /// Like [`Ctl::get`], additionally keeping only heartbeats in `status`
    pub async fn list(
        &self,
        config: &SelectorConfig,
        status: Option<HeartbeatStatus>,
    ) -> Result<Vec<Heartbeat>, CtlError> {
        let mut heartbeats = self.get(config).await?;
        if let Some(status) = status {
            heartbeats.retain(|hb| hb.status() == status);
        }
        Ok(heartbeats)
    }

    /// A single heartbeat by exact name
    pub async fn get_one(&self, name: &str) -> Result<Heartbeat, CtlError> {
        self.api.get(name).await.map_err(|source| {
            CtlError::Remote(RemoteError {
                record: name.to_string(),
                source,
            })
        })
    }

    /// Enable every heartbeat selected by a non-empty `config`
    pub async fn enable(
        &self,
        config: &SelectorConfig,
    ) -> Result<BatchOutcome<HeartbeatInfo>, CtlError> {
        self.set_enabled(config, true).await
    }

    /// Disable every heartbeat selected by a non-empty `config`
    pub async fn disable(
        &self,
        config: &SelectorConfig,
    ) -> Result<BatchOutcome<HeartbeatInfo>, CtlError> {
        self.set_enabled(config, false).await
    }

    /// Ping every heartbeat selected by a non-empty `config`
    pub async fn ping(
        &self,
        config: &SelectorConfig,
    ) -> Result<BatchOutcome<(String, PingResult)>, CtlError> {
        let heartbeats = self.select_for_mutation(config).await?;
        let api = &self.api;
        Ok(apply_to_each(&heartbeats, |hb| async move {
            api.ping(&hb.name)
                .await
                .map(|result| (hb.name.clone(), result))
        })
        .await)
    }

    async fn set_enabled(
        &self,
        config: &SelectorConfig,
        enabled: bool,
    ) -> Result<BatchOutcome<HeartbeatInfo>, CtlError> {
        let heartbeats = self.select_for_mutation(config).await?;
        info!(count = heartbeats.len(), enabled, "Updating heartbeats");
        let api = &self.api;
        Ok(apply_to_each(&heartbeats, |hb| api.set_enabled(&hb.name, enabled)).await)
    }

    async fn select_for_mutation(
        &self,
        config: &SelectorConfig,
    ) -> Result<Vec<Heartbeat>, CtlError> {
        require_non_empty(config)?;
        self.get(config).await
    }

    /// List all heartbeats, then re-fetch each one concurrently
    ///
    /// The bulk listing reports stale `expired` flags, so every record is
    /// replaced with its individually fetched version. Any failed fetch
    /// fails the whole read.
    async fn fetch_all(&self) -> Result<Vec<Heartbeat>, CtlError> {
        let start = Instant::now();
        let listed = self.api.list().await.map_err(CtlError::Listing)?;
        debug!(count = listed.len(), "Listed heartbeats");

        let fetches = listed.iter().map(|hb| async move {
            self.api.get(&hb.name).await.map_err(|source| RemoteError {
                record: hb.name.clone(),
                source,
            })
        });
        let results = join_all(fetches).await;

        let heartbeats = results.into_iter().collect::<Result<Vec<_>, _>>()?;
        debug!(
            count = heartbeats.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Fetched heartbeat details"
        );
        Ok(heartbeats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heartbeat::fake::FakeApi;

    fn hb(name: &str, priority: &str, enabled: bool, expired: bool, tags: &[&str]) -> Heartbeat {
        Heartbeat {
            name: name.to_string(),
            interval: 5,
            interval_unit: "minutes".to_string(),
            enabled,
            expired,
            alert_priority: priority.to_string(),
            alert_tags: tags.iter().map(|t| t.to_string()).collect(),
            ..Default::default()
        }
    }

    fn fleet() -> Vec<Heartbeat> {
        vec![
            hb("foo-rab1", "P2", false, false, &["managed-by: foobricator"]),
            hb("bar", "P4", true, true, &[]),
            hb("foo", "P2", true, false, &[]),
            hb("bar-rab2", "P2", false, false, &["managed-by: foobricator"]),
            hb("foo-oof1", "P3", true, true, &["managed-by: foobricator"]),
            hb("bar-oof2", "P3", true, false, &["managed-by: foobricator"]),
        ]
    }

    fn ctl(api: FakeApi) -> (Ctl<FakeApi>, Arc<FakeApi>) {
        let api = Arc::new(api);
        (Ctl::new(Arc::clone(&api)), api)
    }

    fn hb_names(heartbeats: &[Heartbeat]) -> Vec<&str> {
        heartbeats.iter().map(|h| h.name.as_str()).collect()
    }

    fn info_names(infos: &[HeartbeatInfo]) -> Vec<&str> {
        infos.iter().map(|i| i.name.as_str()).collect()
    }

    fn labels(selector: &str) -> SelectorConfig {
        SelectorConfig {
            label_selector: selector.to_string(),
            ..Default::default()
        }
    }

    fn names(expressions: &[&str]) -> SelectorConfig {
        SelectorConfig {
            name_expressions: expressions.iter().map(|e| e.to_string()).collect(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_get_all_sorted_with_detail() {
        let (ctl, api) = ctl(FakeApi::new(fleet()));
        let all = ctl.get(&SelectorConfig::default()).await.unwrap();
        assert_eq!(
            hb_names(&all),
            vec!["bar", "bar-oof2", "bar-rab2", "foo", "foo-oof1", "foo-rab1"]
        );
        // expired comes from the per-record fetch, not the bulk listing
        let expired: Vec<_> = all
            .iter()
            .filter(|h| h.expired)
            .map(|h| h.name.as_str())
            .collect();
        assert_eq!(expired, vec!["bar", "foo-oof1"]);
        assert_eq!(api.calls().len(), 6);
    }

    #[tokio::test]
    async fn test_get_expired_label() {
        let (ctl, _) = ctl(FakeApi::new(fleet()));
        let expired = ctl.get(&labels("expired")).await.unwrap();
        assert_eq!(hb_names(&expired), vec!["bar", "foo-oof1"]);
    }

    #[tokio::test]
    async fn test_get_fails_when_any_detail_fetch_fails() {
        let (ctl, _) = ctl(FakeApi::new(fleet()).failing_get("foo"));
        let err = ctl.get(&SelectorConfig::default()).await.unwrap_err();
        match err {
            CtlError::Remote(e) => assert_eq!(e.record, "foo"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_listing_failure() {
        let mut api = FakeApi::new(fleet());
        api.fail_list = true;
        let (ctl, _) = ctl(api);
        let err = ctl.get(&SelectorConfig::default()).await.unwrap_err();
        assert!(matches!(err, CtlError::Listing(_)));
    }

    #[tokio::test]
    async fn test_invalid_selector_makes_no_calls() {
        let (ctl, api) = ctl(FakeApi::new(fleet()));
        let err = ctl.get(&labels("a in (b")).await.unwrap_err();
        assert!(matches!(
            err,
            CtlError::Selection(SelectionError::InvalidSelector { .. })
        ));

        let err = ctl.enable(&names(&["foo("])).await.unwrap_err();
        assert!(matches!(
            err,
            CtlError::Selection(SelectionError::InvalidPattern(_))
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_list_by_status() {
        let (ctl, _) = ctl(FakeApi::new(fleet()));
        let cfg = SelectorConfig::default();
        let disabled = ctl.list(&cfg, Some(HeartbeatStatus::Disabled)).await.unwrap();
        assert_eq!(hb_names(&disabled), vec!["bar-rab2", "foo-rab1"]);
        let expired = ctl.list(&cfg, Some(HeartbeatStatus::Expired)).await.unwrap();
        assert_eq!(hb_names(&expired), vec!["bar", "foo-oof1"]);
        let active = ctl.list(&cfg, Some(HeartbeatStatus::Active)).await.unwrap();
        assert_eq!(hb_names(&active), vec!["bar-oof2", "foo"]);
        let all = ctl.list(&cfg, None).await.unwrap();
        assert_eq!(all.len(), 6);
    }

    #[tokio::test]
    async fn test_get_one() {
        let (ctl, _) = ctl(FakeApi::new(fleet()));
        assert_eq!(ctl.get_one("foo").await.unwrap().alert_priority, "P2");
        let err = ctl.get_one("missing").await.unwrap_err();
        assert!(err.to_string().contains("\"missing\""));
    }

    #[tokio::test]
    async fn test_mutations_require_selector() {
        let (ctl, api) = ctl(FakeApi::new(fleet()));
        let empty = SelectorConfig::default();
        let results = [
            ctl.enable(&empty).await.map(|_| ()),
            ctl.disable(&empty).await.map(|_| ()),
            ctl.ping(&empty).await.map(|_| ()),
        ];
        for result in results {
            assert!(matches!(
                result,
                Err(CtlError::Selection(SelectionError::EmptySelector))
            ));
        }
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_enable_disabled_managed() {
        let (ctl, api) = ctl(FakeApi::new(fleet()));
        let outcome = ctl
            .enable(&labels("!enabled,managed-by=foobricator"))
            .await
            .unwrap();
        assert!(outcome.is_complete());
        assert_eq!(info_names(&outcome.completed), vec!["bar-rab2", "foo-rab1"]);
        assert!(outcome.completed.iter().all(|i| i.enabled));
        assert_eq!(api.mutations(), vec!["enable:bar-rab2", "enable:foo-rab1"]);
    }

    #[tokio::test]
    async fn test_disable_stops_at_first_failure() {
        let (ctl, api) = ctl(FakeApi::new(fleet()).failing_mutation("bar-oof2"));
        let outcome = ctl.disable(&names(&["bar.*"])).await.unwrap();

        assert_eq!(info_names(&outcome.completed), vec!["bar"]);
        assert!(!outcome.completed[0].enabled);
        let failure = outcome.failure.expect("disable should fail on bar-oof2");
        assert_eq!(failure.record, "bar-oof2");
        // bar-rab2 comes after the failure and is never attempted
        assert_eq!(api.mutations(), vec!["disable:bar", "disable:bar-oof2"]);
    }

    #[tokio::test]
    async fn test_ping_selected() {
        let (ctl, _) = ctl(FakeApi::new(fleet()));
        let cfg = SelectorConfig {
            field_selector: "alertPriority=P3".to_string(),
            ..names(&["foo", ".*-oof[12]"])
        };
        let outcome = ctl.ping(&cfg).await.unwrap();
        assert!(outcome.is_complete());
        let pinged: Vec<_> = outcome.completed.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(pinged, vec!["bar-oof2", "foo-oof1"]);
        assert_eq!(outcome.completed[0].1.message, "PONG - Heartbeat received");
    }

    #[tokio::test]
    async fn test_ping_is_fail_fast() {
        let (ctl, api) = ctl(FakeApi::new(fleet()).failing_mutation("foo"));
        let outcome = ctl.ping(&names(&["foo.*"])).await.unwrap();
        assert!(outcome.completed.is_empty());
        assert_eq!(outcome.failure.unwrap().record, "foo");
        assert_eq!(api.mutations(), vec!["ping:foo"]);
    }
}
