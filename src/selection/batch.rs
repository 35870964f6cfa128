// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Sequential fail-fast application of a remote call to selected heartbeats
//!
//! Heartbeats are processed one at a time in the given order. The first
//! failure stops the batch; results gathered before it are kept so callers
//! can report exactly which heartbeats were changed.

use std::future::Future;

use tracing::{debug, warn};

use crate::heartbeat::{ApiError, Heartbeat};

/// A per-heartbeat remote call failed
#[derive(Debug, thiserror::Error)]
#[error("heartbeat \"{record}\" failed: {source}")]
pub struct RemoteError {
    pub record: String,
    #[source]
    pub source: ApiError,
}

/// Results of a batch, possibly cut short by a failure
#[derive(Debug)]
pub struct BatchOutcome<R> {
    /// Successful results, in processing order
    pub completed: Vec<R>,
    /// The failure that stopped the batch, if any
    pub failure: Option<RemoteError>,
}

impl<R> BatchOutcome<R> {
    #[cfg(test)]
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Apply `op` to each heartbeat in order, stopping at the first error
pub async fn apply_to_each<'a, R, F, Fut>(heartbeats: &'a [Heartbeat], mut op: F) -> BatchOutcome<R>
where
    F: FnMut(&'a Heartbeat) -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
{
    let mut completed = Vec::with_capacity(heartbeats.len());

    for (idx, hb) in heartbeats.iter().enumerate() {
        match op(hb).await {
            Ok(result) => {
                debug!(heartbeat = %hb.name, "Batch step succeeded");
                completed.push(result);
            }
            Err(e) => {
                warn!(
                    heartbeat = %hb.name,
                    done = idx,
                    skipped = heartbeats.len() - idx - 1,
                    error = %e,
                    "Batch stopped"
                );
                return BatchOutcome {
                    completed,
                    failure: Some(RemoteError {
                        record: hb.name.clone(),
                        source: e,
                    }),
                };
            }
        }
    }

    BatchOutcome {
        completed,
        failure: None,
    }
}
