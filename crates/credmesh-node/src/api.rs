//! Query API (spec §6): read endpoints for dashboards/CLI plus the two
//! packet-sealing mutations, gated by an `X-Role` header the way the
//! teacher's gateway crates gate admin routes by a header-carried claim.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use credmesh_credibility::scorer::{compute_score, CredibilityScore, SnapshotSignals};
use credmesh_types::model::{Claim, DriftSignal, HashScope, HashScopeParameters, InputHash, Tier};

use crate::state::NodeState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Exec,
    TruthOwner,
    Dri,
    CoherenceSteward,
}

impl Role {
    fn from_header(headers: &HeaderMap) -> Option<Self> {
        match headers.get("X-Role")?.to_str().ok()? {
            "exec" => Some(Self::Exec),
            "truth_owner" => Some(Self::TruthOwner),
            "dri" => Some(Self::Dri),
            "coherence_steward" => Some(Self::CoherenceSteward),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Forbidden(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, detail) = match self {
            ApiError::NotFound(d) => (StatusCode::NOT_FOUND, "NOT_FOUND", d),
            ApiError::Forbidden(d) => (StatusCode::FORBIDDEN, "AUTHORITY_DENY", d),
            ApiError::Internal(d) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL", d),
        };
        (status, Json(serde_json::json!({ "error": kind, "detail": detail }))).into_response()
    }
}

fn internal(e: credmesh_api::error::CredMeshError) -> ApiError {
    ApiError::Internal(e.to_string())
}

fn check_tenant(state: &NodeState, tenant: &str) -> Result<(), ApiError> {
    if tenant != state.config.tenant_id {
        return Err(ApiError::NotFound(format!("unknown tenant: {tenant}")));
    }
    Ok(())
}

pub fn router(state: Arc<NodeState>) -> Router {
    Router::new()
        .route("/api/:tenant/credibility/snapshot", get(snapshot))
        .route("/api/:tenant/credibility/claims/tier0", get(claims_tier0))
        .route("/api/:tenant/credibility/drift/24h", get(drift_24h))
        .route("/api/:tenant/credibility/correlation", get(correlation))
        .route("/api/:tenant/credibility/sync", get(sync))
        .route("/api/:tenant/credibility/packet/generate", post(packet_generate))
        .route("/api/:tenant/credibility/packet/seal", post(packet_seal))
        .with_state(state)
}

/// Builds the raw scoring signals from current claims/drift state. Kept
/// here rather than in `credmesh-credibility` since it reads node-local
/// state the scorer crate has no business depending on.
pub fn snapshot_signals(state: &NodeState) -> Result<SnapshotSignals, ApiError> {
    let claims = state.claims.read().map_err(|_| ApiError::Internal("claims lock poisoned".into()))?;
    let tiers = state
        .evidence_tiers
        .read()
        .map_err(|_| ApiError::Internal("evidence_tiers lock poisoned".into()))?;

    let mut tier_integrity: std::collections::HashMap<u8, (u32, u32)> = std::collections::HashMap::new();
    let now = state.clock.now();
    for claim in &claims.claims {
        let tier = claim
            .evidence
            .iter()
            .filter_map(|id| tiers.get(id))
            .min_by_key(|t| t.as_u8())
            .copied()
            .unwrap_or(Tier::Tier3);
        let entry = tier_integrity.entry(tier.as_u8()).or_insert((0, 0));
        entry.1 += 1;
        if claim.decayed_confidence(now) >= state.scoring_policy.integrity_confidence_threshold {
            entry.0 += 1;
        }
    }

    let active_drift: Vec<_> = state
        .recent_drift(Duration::hours(24))
        .map_err(internal)?
        .iter()
        .map(|d| (d.severity, 0))
        .collect();

    Ok(SnapshotSignals {
        tier_integrity: tier_integrity.into_iter().map(|(t, (m, total))| (t, m, total)).collect(),
        active_drift,
        ..SnapshotSignals::default()
    })
}

async fn snapshot(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<CredibilityScore>, ApiError> {
    check_tenant(&state, &tenant)?;
    let signals = snapshot_signals(&state)?;
    let score = compute_score(&signals, &state.scoring_policy, state.clock.now());
    Ok(Json(score))
}

async fn claims_tier0(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<Claim>>, ApiError> {
    check_tenant(&state, &tenant)?;
    let claims = state.claims.read().map_err(|_| ApiError::Internal("claims lock poisoned".into()))?;
    let tiers = state
        .evidence_tiers
        .read()
        .map_err(|_| ApiError::Internal("evidence_tiers lock poisoned".into()))?;
    let tier0: Vec<Claim> = claims
        .claims
        .iter()
        .filter(|c| c.evidence.iter().any(|id| tiers.get(id) == Some(&Tier::Tier0)))
        .cloned()
        .collect();
    Ok(Json(tier0))
}

async fn drift_24h(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<DriftSignal>>, ApiError> {
    check_tenant(&state, &tenant)?;
    let signals = state.recent_drift(Duration::hours(24)).map_err(internal)?;
    Ok(Json(signals))
}

#[derive(Debug, Serialize)]
struct CorrelationGroupSummary {
    correlation_group: String,
    claim_count: usize,
}

async fn correlation(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<Vec<CorrelationGroupSummary>>, ApiError> {
    check_tenant(&state, &tenant)?;
    let claims = state.claims.read().map_err(|_| ApiError::Internal("claims lock poisoned".into()))?;
    let mut by_group: std::collections::HashMap<String, usize> = std::collections::HashMap::new();
    for claim in &claims.claims {
        for source in &claim.sources {
            *by_group.entry(source.clone()).or_insert(0) += 1;
        }
    }
    let mut out: Vec<_> = by_group
        .into_iter()
        .map(|(correlation_group, claim_count)| CorrelationGroupSummary { correlation_group, claim_count })
        .collect();
    out.sort_by(|a, b| a.correlation_group.cmp(&b.correlation_group));
    Ok(Json(out))
}

#[derive(Debug, Serialize)]
struct SyncStatus {
    tenant_id: String,
    node_id: String,
    envelope_count: usize,
    seal_chain_length: usize,
    observed_at: chrono::DateTime<Utc>,
}

async fn sync(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<SyncStatus>, ApiError> {
    check_tenant(&state, &tenant)?;
    let seal_chain_length = state
        .seal_log
        .count::<credmesh_types::model::Seal>()
        .map_err(internal)?;
    let envelope_count = state
        .envelope_log
        .count::<credmesh_types::model::Envelope>()
        .map_err(internal)?;
    Ok(Json(SyncStatus {
        tenant_id: state.config.tenant_id.clone(),
        node_id: state.config.node_id.clone(),
        envelope_count,
        seal_chain_length,
        observed_at: state.clock.now(),
    }))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PacketResponse {
    pub hash_scope: HashScope,
    pub commit_hash: String,
}

async fn packet_generate(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
) -> Result<Json<PacketResponse>, ApiError> {
    check_tenant(&state, &tenant)?;
    let claims = state.claims.read().map_err(|_| ApiError::Internal("claims lock poisoned".into()))?;
    let inputs = claims
        .claims
        .iter()
        .map(|c| InputHash {
            path: format!("claim:{}", c.claim_id),
            sha256: credmesh_types::canonical::canonical_hash(c).unwrap_or_default(),
        })
        .collect();

    let hash_scope = HashScope {
        inputs,
        prompts: vec![],
        policies: vec![state.scoring_policy.hash()],
        schemas: vec!["credibility_snapshot.v1".into()],
        parameters: HashScopeParameters {
            clock: state.clock.now(),
            deterministic_mode: matches!(state.config.clock_mode, crate::config::ClockMode::Fixed),
        },
        exclusions: vec!["observed_at".into(), "artifacts_emitted".into()],
    };
    let commit_hash = credmesh_seal::episode::commit_hash(&hash_scope).map_err(internal)?;
    Ok(Json(PacketResponse { hash_scope, commit_hash }))
}

#[derive(Debug, Serialize)]
struct PacketSealResponse {
    commit_hash: String,
    log_hash: String,
}

async fn packet_seal(
    State(state): State<Arc<NodeState>>,
    Path(tenant): Path<String>,
    headers: HeaderMap,
    Json(packet): Json<PacketResponse>,
) -> Result<Json<PacketSealResponse>, ApiError> {
    check_tenant(&state, &tenant)?;
    if Role::from_header(&headers) != Some(Role::CoherenceSteward) {
        return Err(ApiError::Forbidden("packet/seal requires the coherence_steward role".into()));
    }
    if !state.abp_gate_check().map_err(internal)? {
        return Err(ApiError::Forbidden("installed ABP fails one or more gate checks".into()));
    }
    let recomputed = credmesh_seal::episode::commit_hash(&packet.hash_scope).map_err(internal)?;
    if recomputed != packet.commit_hash {
        return Err(ApiError::Forbidden("commit_hash does not match hash_scope".into()));
    }
    let entry = state
        .transparency_log
        .append(state.clock.now(), packet.commit_hash.clone())
        .map_err(internal)?;
    Ok(Json(PacketSealResponse { commit_hash: packet.commit_hash, log_hash: entry.log_hash }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<NodeState> {
        let dir = tempfile::tempdir().unwrap();
        let config = crate::config::NodeConfig {
            tenant_id: "acme".into(),
            node_id: "node-1".into(),
            node_role: "edge".into(),
            storage_root: dir.path().to_path_buf(),
            crypto_backend: crate::config::CryptoBackend::Ed25519A,
            peer_urls: vec![],
            max_retries: 5,
            backoff_base: std::time::Duration::from_millis(250),
            suspect_after_failures: 2,
            offline_after_failures: 5,
            recovery_successes: 3,
            scoring_policy_hash: None,
            clock_mode: crate::config::ClockMode::System,
            fixed_clock: None,
        };
        let state = NodeState::open(config).unwrap();
        std::mem::forget(dir);
        Arc::new(state)
    }

    #[tokio::test]
    async fn snapshot_on_empty_state_returns_stable_band() {
        let state = test_state();
        let app = router(state);
        let response = app
            .oneshot(Request::get("/api/acme/credibility/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn packet_seal_without_role_header_is_forbidden() {
        let state = test_state();
        let app = router(state);
        let generate = app
            .clone()
            .oneshot(
                Request::post("/api/acme/credibility/packet/generate")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(generate.status(), StatusCode::OK);
        let body = axum::body::to_bytes(generate.into_body(), usize::MAX).await.unwrap();
        let packet: PacketResponse = serde_json::from_slice(&body).unwrap();

        let seal = app
            .oneshot(
                Request::post("/api/acme/credibility/packet/seal")
                    .header("content-type", "application/json")
                    .body(Body::from(serde_json::to_vec(&packet).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(seal.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let state = test_state();
        let app = router(state);
        let response = app
            .oneshot(Request::get("/api/other/credibility/snapshot").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
