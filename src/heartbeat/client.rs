// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! OpsGenie heartbeat API client
//!
//! Endpoints (all under `/v2/heartbeats`):
//! - `GET /` - list, payload in `data.heartbeats`
//! - `GET /{name}` - single heartbeat, payload in `data`
//! - `POST /{name}/enable`, `POST /{name}/disable` - payload in `data`
//! - `GET /{name}/ping` - message in `result`

use async_trait::async_trait;
use reqwest::{Client, Method, Response, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use super::{ApiError, Heartbeat, HeartbeatApi, HeartbeatInfo, PingResult};

/// Default OpsGenie API endpoint (EU accounts use https://api.eu.opsgenie.com)
pub const DEFAULT_API_URL: &str = "https://api.opsgenie.com";

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
struct HeartbeatList {
    #[serde(default)]
    heartbeats: Vec<Heartbeat>,
}

#[derive(Deserialize)]
struct PingEnvelope {
    #[serde(default)]
    result: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}

/// [`HeartbeatApi`] implementation talking to OpsGenie over HTTPS
pub struct OpsGenieClient {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl OpsGenieClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(base_url).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            base_url,
            api_key: api_key.into(),
        })
    }

    /// Build `<base>/v2/heartbeats/<segments..>`, encoding each segment
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            path.pop_if_empty().extend(["v2", "heartbeats"]).extend(segments);
        }
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, url: Url) -> Result<T, ApiError> {
        debug!(method = %method, url = %url, "OpsGenie request");
        let response = self
            .http
            .request(method, url)
            .header("Authorization", format!("GenieKey {}", self.api_key))
            .send()
            .await?;
        let response = Self::check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn check_status(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        trace!(status = status.as_u16(), body = %body, "OpsGenie error response");
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .ok()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl HeartbeatApi for OpsGenieClient {
    async fn list(&self) -> Result<Vec<Heartbeat>, ApiError> {
        let url = self.endpoint(&[])?;
        let envelope: DataEnvelope<HeartbeatList> = self.send(Method::GET, url).await?;
        Ok(envelope.data.heartbeats)
    }

    async fn get(&self, name: &str) -> Result<Heartbeat, ApiError> {
        let url = self.endpoint(&[name])?;
        let envelope: DataEnvelope<Heartbeat> = self.send(Method::GET, url).await?;
        Ok(envelope.data)
    }

    async fn set_enabled(&self, name: &str, enabled: bool) -> Result<HeartbeatInfo, ApiError> {
        let action = if enabled { "enable" } else { "disable" };
        let url = self.endpoint(&[name, action])?;
        let envelope: DataEnvelope<HeartbeatInfo> = self.send(Method::POST, url).await?;
        Ok(envelope.data)
    }

    async fn ping(&self, name: &str) -> Result<PingResult, ApiError> {
        let url = self.endpoint(&[name, "ping"])?;
        let envelope: PingEnvelope = self.send(Method::GET, url).await?;
        Ok(PingResult {
            message: envelope.result,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_paths() {
        let client = OpsGenieClient::new(DEFAULT_API_URL, "key").unwrap();
        assert_eq!(
            client.endpoint(&[]).unwrap().as_str(),
            "https://api.opsgenie.com/v2/heartbeats"
        );
        assert_eq!(
            client.endpoint(&["foo", "enable"]).unwrap().as_str(),
            "https://api.opsgenie.com/v2/heartbeats/foo/enable"
        );
    }

    #[test]
    fn test_endpoint_encodes_names() {
        let client = OpsGenieClient::new("https://api.eu.opsgenie.com/", "key").unwrap();
        let url = client.endpoint(&["my heartbeat/1", "ping"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.eu.opsgenie.com/v2/heartbeats/my%20heartbeat%2F1/ping"
        );
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            OpsGenieClient::new("not a url", "key"),
            Err(ApiError::InvalidUrl(_))
        ));
        assert!(matches!(
            OpsGenieClient::new("mailto:ops@example.com", "key"),
            Err(ApiError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_decode_list_envelope() {
        let json = r#"{
            "data": {"heartbeats": [
                {"name": "foo", "enabled": true, "interval": 5, "intervalUnit": "minutes"},
                {"name": "bar", "enabled": false, "alertTags": ["x"]}
            ]},
            "took": 0.1,
            "requestId": "abc"
        }"#;
        let envelope: DataEnvelope<HeartbeatList> = serde_json::from_str(json).unwrap();
        let names: Vec<_> = envelope.data.heartbeats.iter().map(|h| h.name.as_str()).collect();
        assert_eq!(names, vec!["foo", "bar"]);
    }

    #[test]
    fn test_decode_info_and_ping() {
        let info: DataEnvelope<HeartbeatInfo> =
            serde_json::from_str(r#"{"data": {"name": "foo", "enabled": true, "expired": false}}"#)
                .unwrap();
        assert_eq!(info.data.name, "foo");
        assert!(info.data.enabled);

        let ping: PingEnvelope =
            serde_json::from_str(r#"{"result": "PONG - Heartbeat received", "took": 0.0}"#).unwrap();
        assert_eq!(ping.result, "PONG - Heartbeat received");
    }
}
