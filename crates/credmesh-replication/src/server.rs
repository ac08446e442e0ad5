//! Replication HTTP server (spec §6): `push`, `pull`, `status`, and
//! `topology` for one node, built the way the kernel's gateway crates
//! assemble an axum [`Router`] from a shared [`ReplicationState`].

use std::sync::{Arc, Mutex};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;

use credmesh_storage::log_store::LogStore;

use crate::peer_health::{PeerHealth, PeerState};
use crate::wire::{Cursor, NodeStatus, PeerIdentity, PushBatch, PushResult, Topology, TopologyEntry};

pub enum ReplicationApiError {
    NotFound(String),
    ChainBreak(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for ReplicationApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match self {
            ReplicationApiError::NotFound(d) => (StatusCode::NOT_FOUND, "NOT_FOUND", d),
            ReplicationApiError::ChainBreak(d) => (StatusCode::CONFLICT, "CHAIN_BREAK", d),
            ReplicationApiError::Forbidden(d) => (StatusCode::FORBIDDEN, "AUTHORITY_DENY", d),
            ReplicationApiError::Internal(d) => {
                tracing::error!(target: "credmesh-replication", detail = %d, "replication server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "FILESYSTEM", d)
            }
        };
        (status, Json(serde_json::json!({ "error": kind, "detail": detail }))).into_response()
    }
}

/// One known peer plus this node's last-observed view of its health.
pub struct KnownPeer {
    pub identity: PeerIdentity,
    pub health: Mutex<PeerHealth>,
}

/// Shared state behind every route: this node's own four logs plus the
/// peer set used to answer `/topology` (spec §5: "process-wide lifecycle
/// registry"; replication's slice of it is its log handles and peer
/// health table).
pub struct ReplicationState {
    pub tenant_id: String,
    pub node_id: String,
    pub envelopes: LogStore,
    pub validations: LogStore,
    pub aggregates: LogStore,
    pub seals: LogStore,
    pub peers: Vec<KnownPeer>,
}

pub fn router(state: Arc<ReplicationState>) -> Router {
    Router::new()
        .route("/mesh/:tenant/:node/push", post(push))
        .route("/mesh/:tenant/:node/pull", get(pull))
        .route("/mesh/:tenant/:node/status", get(status))
        .route("/mesh/:tenant/topology", get(topology))
        .with_state(state)
}

fn check_identity(
    state: &ReplicationState,
    tenant: &str,
    node: &str,
) -> Result<(), ReplicationApiError> {
    if state.tenant_id != tenant || state.node_id != node {
        return Err(ReplicationApiError::NotFound(format!(
            "no such node {tenant}/{node}"
        )));
    }
    Ok(())
}

async fn push(
    State(state): State<Arc<ReplicationState>>,
    Path((tenant, node)): Path<(String, String)>,
    Json(batch): Json<PushBatch>,
) -> Result<Json<PushResult>, ReplicationApiError> {
    check_identity(&state, &tenant, &node)?;

    let internal = |e: credmesh_api::error::CredMeshError| ReplicationApiError::Internal(e.to_string());

    for envelope in &batch.envelopes {
        state.envelopes.append(envelope).map_err(internal)?;
    }
    for validation in &batch.validations {
        state.validations.append(validation).map_err(internal)?;
    }
    for aggregate in &batch.aggregates {
        state.aggregates.append(aggregate).map_err(internal)?;
    }
    for seal in &batch.seals {
        state.seals.append(seal).map_err(internal)?;
    }

    Ok(Json(PushResult {
        accepted_envelopes: batch.envelopes.len(),
        accepted_validations: batch.validations.len(),
        accepted_aggregates: batch.aggregates.len(),
        accepted_seals: batch.seals.len(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct PullQuery {
    #[serde(default)]
    pub since_envelopes: usize,
    #[serde(default)]
    pub since_validations: usize,
    #[serde(default)]
    pub since_aggregates: usize,
    #[serde(default)]
    pub since_seals: usize,
}

async fn pull(
    State(state): State<Arc<ReplicationState>>,
    Path((tenant, node)): Path<(String, String)>,
    Query(since): Query<PullQuery>,
) -> Result<Json<PushBatch>, ReplicationApiError> {
    check_identity(&state, &tenant, &node)?;

    let internal = |e: credmesh_api::error::CredMeshError| ReplicationApiError::Internal(e.to_string());

    let envelopes: Vec<credmesh_types::model::Envelope> =
        state.envelopes.load_all().map_err(internal)?.into_iter().skip(since.since_envelopes).collect();
    let validations: Vec<credmesh_types::model::Validation> =
        state.validations.load_all().map_err(internal)?.into_iter().skip(since.since_validations).collect();
    let aggregates: Vec<credmesh_types::model::Aggregate> =
        state.aggregates.load_all().map_err(internal)?.into_iter().skip(since.since_aggregates).collect();
    let seals: Vec<credmesh_types::model::Seal> =
        state.seals.load_all().map_err(internal)?.into_iter().skip(since.since_seals).collect();

    Ok(Json(PushBatch { envelopes, validations, aggregates, seals }))
}

async fn status(
    State(state): State<Arc<ReplicationState>>,
    Path((tenant, node)): Path<(String, String)>,
) -> Result<Json<NodeStatus>, ReplicationApiError> {
    check_identity(&state, &tenant, &node)?;
    let internal = |e: credmesh_api::error::CredMeshError| ReplicationApiError::Internal(e.to_string());

    let cursor = Cursor {
        envelopes: state.envelopes.count::<credmesh_types::model::Envelope>().map_err(internal)?,
        validations: state.validations.count::<credmesh_types::model::Validation>().map_err(internal)?,
        aggregates: state.aggregates.count::<credmesh_types::model::Aggregate>().map_err(internal)?,
        seals: state.seals.count::<credmesh_types::model::Seal>().map_err(internal)?,
    };
    Ok(Json(NodeStatus {
        tenant_id: state.tenant_id.clone(),
        node_id: state.node_id.clone(),
        cursor,
        observed_at: Utc::now(),
    }))
}

async fn topology(
    State(state): State<Arc<ReplicationState>>,
    Path(tenant): Path<String>,
) -> Result<Json<Topology>, ReplicationApiError> {
    if state.tenant_id != tenant {
        return Err(ReplicationApiError::NotFound(format!("no such tenant {tenant}")));
    }
    let peers = state
        .peers
        .iter()
        .map(|p| {
            let health_state = p
                .health
                .lock()
                .map(|h| h.state())
                .unwrap_or(PeerState::Offline);
            TopologyEntry {
                peer_id: p.identity.spiffe_id.clone(),
                identity: p.identity.clone(),
                state: health_state,
            }
        })
        .collect();
    Ok(Json(Topology { tenant_id: state.tenant_id.clone(), peers }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state(dir: &std::path::Path) -> Arc<ReplicationState> {
        Arc::new(ReplicationState {
            tenant_id: "acme".into(),
            node_id: "node-1".into(),
            envelopes: LogStore::open(dir.join("envelopes.ndjson")).unwrap(),
            validations: LogStore::open(dir.join("validations.ndjson")).unwrap(),
            aggregates: LogStore::open(dir.join("aggregates.ndjson")).unwrap(),
            seals: LogStore::open(dir.join("seals.ndjson")).unwrap(),
            peers: vec![],
        })
    }

    #[tokio::test]
    async fn status_reports_zero_cursor_on_empty_logs() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mesh/acme/node-1/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_node_returns_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = router(test_state(dir.path()));
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/mesh/acme/node-9/status")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
