//! Replication client (spec §4.15, §6): pushes and pulls against a peer's
//! `/mesh/{tenant}/{node}/*` endpoints, retrying with exponential backoff
//! and feeding every outcome into that peer's [`PeerHealth`].

use std::sync::Mutex;

use reqwest::{Client, StatusCode};

use crate::error::{CmResult, CredMeshError, ErrorKind};
use crate::peer_health::PeerHealth;
use crate::wire::{NodeStatus, PushBatch, PushResult, Topology};

/// One peer's HTTP endpoint plus its tracked health, guarded by a mutex
/// since multiple calls against the same peer may be in flight (spec §5:
/// "replication transport uses its own worker pool with peer-health
/// state").
pub struct ReplicationPeer {
    pub base_url: String,
    pub tenant_id: String,
    pub node_id: String,
    pub health: Mutex<PeerHealth>,
    http: Client,
}

impl ReplicationPeer {
    pub fn new(base_url: impl Into<String>, tenant_id: impl Into<String>, node_id: impl Into<String>, health: PeerHealth) -> Self {
        Self {
            base_url: base_url.into(),
            tenant_id: tenant_id.into(),
            node_id: node_id.into(),
            health: Mutex::new(health),
            http: Client::new(),
        }
    }

    pub async fn push(&self, batch: &PushBatch) -> CmResult<PushResult> {
        let url = format!(
            "{}/mesh/{}/{}/push",
            self.base_url, self.tenant_id, self.node_id
        );
        self.with_retry(|| async {
            let response = self
                .http
                .post(&url)
                .json(batch)
                .send()
                .await
                .map_err(transport_err)?;
            decode(response).await
        })
        .await
    }

    pub async fn pull(&self, since_query: &str) -> CmResult<PushBatch> {
        let url = format!(
            "{}/mesh/{}/{}/pull?{}",
            self.base_url, self.tenant_id, self.node_id, since_query
        );
        self.with_retry(|| async {
            let response = self.http.get(&url).send().await.map_err(transport_err)?;
            decode(response).await
        })
        .await
    }

    pub async fn status(&self) -> CmResult<NodeStatus> {
        let url = format!(
            "{}/mesh/{}/{}/status",
            self.base_url, self.tenant_id, self.node_id
        );
        self.with_retry(|| async {
            let response = self.http.get(&url).send().await.map_err(transport_err)?;
            decode(response).await
        })
        .await
    }

    pub async fn topology(&self) -> CmResult<Topology> {
        let url = format!("{}/mesh/{}/topology", self.base_url, self.tenant_id);
        self.with_retry(|| async {
            let response = self.http.get(&url).send().await.map_err(transport_err)?;
            decode(response).await
        })
        .await
    }

    async fn with_retry<F, Fut, T>(&self, mut call: F) -> CmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = CmResult<T>>,
    {
        let max_retries = self.health.lock().map_err(poisoned)?.max_retries();
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => {
                    self.health.lock().map_err(poisoned)?.record_success();
                    return Ok(value);
                }
                Err(err) => {
                    let mut health = self.health.lock().map_err(poisoned)?;
                    health.record_failure();
                    if attempt >= max_retries {
                        return Err(err);
                    }
                    let backoff = health.backoff_for_attempt(attempt);
                    drop(health);
                    attempt += 1;
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

fn poisoned(_: std::sync::PoisonError<std::sync::MutexGuard<'_, PeerHealth>>) -> CredMeshError {
    CredMeshError::new(ErrorKind::Filesystem, "peer health lock poisoned")
}

fn transport_err(e: reqwest::Error) -> CredMeshError {
    CredMeshError::new(ErrorKind::TransportUnreachable, e.to_string())
}

async fn decode<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> CmResult<T> {
    match response.status() {
        StatusCode::OK => response
            .json::<T>()
            .await
            .map_err(|e| CredMeshError::new(ErrorKind::InputInvalid, e.to_string())),
        StatusCode::CONFLICT => Err(CredMeshError::new(ErrorKind::ChainBreak, "peer reported chain break")),
        StatusCode::FORBIDDEN => Err(CredMeshError::new(ErrorKind::AuthorityDeny, "peer refused request")),
        other => Err(CredMeshError::new(
            ErrorKind::TransportUnreachable,
            format!("unexpected status {other}"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer_health::{PeerHealthConfig, PeerState};
    use std::time::Duration;

    #[tokio::test]
    async fn exhausting_retries_against_an_unreachable_peer_marks_it_offline() {
        let peer = ReplicationPeer::new(
            "http://127.0.0.1:1",
            "acme",
            "node-1",
            PeerHealth::new(
                "node-1",
                PeerHealthConfig {
                    suspect_after_failures: 1,
                    offline_after_failures: 2,
                    recovery_successes: 1,
                    max_retries: 1,
                    backoff_base: Duration::from_millis(1),
                },
            ),
        );
        let result = peer.status().await;
        assert!(result.is_err());
        assert_eq!(peer.health.lock().unwrap().state(), PeerState::Offline);
    }
}
