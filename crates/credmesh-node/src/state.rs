//! Process wiring (spec §5): constructs every component singleton from
//! [`NodeConfig`] and registers the five mandated ones in the shared
//! [`LifecycleRegistry`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use credmesh_abp::gate::VerificationCache;
use credmesh_api::registry::{slots, LifecycleRegistry};
use credmesh_credibility::policy::ScoringPolicy;
use credmesh_crypto::provider::{Algorithm, CryptoProvider, Ed25519Provider, HmacDemoProvider};
use credmesh_crypto::registry::KeyRegistry;
use credmesh_drift::patch_engine::{apply_patch, ApprovalState};
use credmesh_envelope::aggregator::Aggregator;
use credmesh_envelope::edge::Edge;
use credmesh_envelope::seal_authority::SealAuthority;
use credmesh_envelope::validator::{AllowAll, Validator};
use credmesh_ledger::ledger::AuthorityLedger;
use credmesh_memory::graph::MemoryGraph;
use credmesh_seal::episode::seal_episode;
use credmesh_seal::transparency_log::TransparencyLog;
use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{
    Abp, ClaimGraph, Dlr, DriftSignal, DriftSummary, HashScope, HashScopeParameters,
    MemoryEdgeKind, MemoryGraphDiff, MemoryNodeKind, Patch, ReflectionSession,
    SealedDecisionEpisode, StatusLight, Tier,
};

use crate::clock::Clock;
use crate::config::{CryptoBackend, NodeConfig};
use crate::error::CmResult;

/// Everything one node needs to serve the query API and participate in
/// replication. Holds no network sockets itself; [`crate::api`] and
/// [`credmesh_replication::server`] wrap this in their own `Arc`.
pub struct NodeState {
    pub config: NodeConfig,
    pub clock: Clock,
    pub crypto: Arc<KeyRegistry>,
    pub edge: Edge,
    pub validator: Validator,
    pub aggregator: Aggregator,
    pub seal_authority: SealAuthority,
    pub authority_ledger: AuthorityLedger,
    pub transparency_log: TransparencyLog,
    pub scoring_policy: ScoringPolicy,
    pub memory_graph: RwLock<MemoryGraph>,
    pub claims: RwLock<ClaimGraph>,
    pub drift_log: LogStore,
    /// Sealed decision episodes, including the re-seal episodes
    /// [`NodeState::apply_patch_and_reseal`] produces (spec §4.12, §4.14).
    pub episode_log: LogStore,
    /// Read-only handles onto the same files `edge`/`seal_authority` own,
    /// used only for record counts in the sync-status endpoint.
    pub envelope_log: LogStore,
    pub seal_log: LogStore,
    /// Tier of the evidence backing each known evidence id, used to derive
    /// `tier_integrity` signals without re-reading every evidence node on
    /// every snapshot request.
    pub evidence_tiers: RwLock<HashMap<String, Tier>>,
    pub abp: RwLock<Option<Abp>>,
    /// TTL'd cache over the ABP gate's eight checks (spec §4.5), invalidated
    /// per-authority whenever [`AuthorityLedger::append`] touches it.
    pub abp_gate: VerificationCache,
    pub lifecycle: LifecycleRegistry,
}

impl NodeState {
    pub fn open(config: NodeConfig) -> CmResult<Self> {
        std::fs::create_dir_all(&config.storage_root).map_err(|e| {
            credmesh_api::error::CredMeshError::new(
                credmesh_api::error::ErrorKind::Filesystem,
                e.to_string(),
            )
        })?;

        let provider: Arc<dyn CryptoProvider> = match config.crypto_backend {
            CryptoBackend::Ed25519A => {
                Arc::new(Ed25519Provider::generate(config.node_id.clone(), Algorithm::EdPrimary)?)
            }
            CryptoBackend::Ed25519B => {
                Arc::new(Ed25519Provider::generate(config.node_id.clone(), Algorithm::EdAlternate)?)
            }
            CryptoBackend::HmacDemo => Arc::new(HmacDemoProvider::new(
                config.node_id.clone(),
                config.node_id.clone().into_bytes(),
            )),
        };
        let crypto = Arc::new(KeyRegistry::new(provider.clone()));

        let root = &config.storage_root;
        let envelope_log = LogStore::open(root.join("envelopes.ndjson"))?;
        let edge = Edge::new(
            config.tenant_id.clone(),
            config.node_id.clone(),
            provider.clone(),
            LogStore::open(root.join("envelopes.ndjson"))?,
        );
        let validator = Validator::new(
            config.node_id.clone(),
            crypto.clone(),
            Arc::new(AllowAll),
            LogStore::open(root.join("validations.ndjson"))?,
        );
        let aggregator = Aggregator::new(LogStore::open(root.join("aggregates.ndjson"))?);
        let seal_log = LogStore::open(root.join("seal_chain.ndjson"))?;
        let seal_authority = SealAuthority::new(LogStore::open(root.join("seal_chain.ndjson"))?);
        let authority_ledger = AuthorityLedger::open(root.join("authority_ledger.ndjson"))?;
        let transparency_log = TransparencyLog::open(root.join("transparency_log.ndjson"))?;
        let memory_graph = MemoryGraph::open(root.join("memory"))?;
        let drift_log = LogStore::open(root.join("drift_signals.ndjson"))?;
        let episode_log = LogStore::open(root.join("episodes.ndjson"))?;

        let scoring_policy = ScoringPolicy::default();

        let lifecycle = LifecycleRegistry::new();
        lifecycle.register(slots::CRYPTO_PROVIDER, crypto.clone());
        lifecycle.register(slots::CREDIBILITY_SCORER, Arc::new(scoring_policy.clone()));

        let clock = Clock::from_config(&config);

        Ok(Self {
            config,
            clock,
            crypto,
            edge,
            validator,
            aggregator,
            seal_authority,
            authority_ledger,
            transparency_log,
            scoring_policy,
            memory_graph: RwLock::new(memory_graph),
            claims: RwLock::new(ClaimGraph::new()),
            drift_log,
            episode_log,
            envelope_log,
            seal_log,
            evidence_tiers: RwLock::new(HashMap::new()),
            abp: RwLock::new(None),
            abp_gate: VerificationCache::default(),
            lifecycle,
        })
    }

    /// Runs the currently-installed ABP (if any) through the gate cache,
    /// returning `true` when there is no ABP installed (nothing to deny).
    pub fn abp_gate_check(&self) -> CmResult<bool> {
        let abp = self.abp.read().map_err(|_| poisoned("abp"))?;
        match &*abp {
            Some(abp) => self.abp_gate.gate_pass(abp, &self.authority_ledger, self.clock.now()),
            None => Ok(true),
        }
    }

    /// Installs (or replaces) the node's active ABP, invalidating any
    /// cached gate verdict for the authority it supersedes so the new
    /// boundary is re-checked on the next gate call rather than served
    /// stale from the previous ABP's cache entry.
    pub fn install_abp(&self, new_abp: Abp) -> CmResult<()> {
        let mut abp = self.abp.write().map_err(|_| poisoned("abp"))?;
        if let Some(old) = abp.as_ref() {
            self.abp_gate.invalidate_authority(&old.authority_ref);
        }
        self.abp_gate.invalidate_authority(&new_abp.authority_ref);
        *abp = Some(new_abp);
        Ok(())
    }

    /// Applies an approved patch (spec §4.12): clears its approval gate,
    /// seals the correction as a brand-new episode superseding
    /// `patch.supersedes_episode_id` (the original is never modified), and
    /// adds a `PATCH` node with a `RESOLVED_BY` edge to the drift signal it
    /// resolves.
    pub fn apply_patch_and_reseal(
        &self,
        patch: Patch,
        severity: StatusLight,
        approvals: &ApprovalState,
    ) -> CmResult<SealedDecisionEpisode> {
        let patch = apply_patch(patch, severity, approvals)?;
        let existing = self.episode_log.load_all::<SealedDecisionEpisode>()?;
        let prev_hash_chain = existing.last().map(|e| e.hash_chain.clone());
        let version = existing
            .iter()
            .filter(|e| e.episode_id == patch.supersedes_episode_id)
            .map(|e| e.version)
            .max()
            .unwrap_or(1)
            + 1;

        let now = self.clock.now();
        let hash_scope = HashScope {
            inputs: vec![],
            prompts: vec![],
            policies: vec![self.scoring_policy.hash()],
            schemas: vec!["patch_reseal.v1".into()],
            parameters: HashScopeParameters {
                clock: now,
                deterministic_mode: matches!(self.config.clock_mode, crate::config::ClockMode::Fixed),
            },
            exclusions: vec!["observed_at".into()],
        };
        let episode = seal_episode(
            format!("EP-{}", patch.patch_id),
            Dlr {
                decision_id: patch.patch_id.clone(),
                summary: patch.description.clone(),
                claim_ids: vec![],
            },
            ReflectionSession {
                narrative: format!("patch {} resolves drift {}", patch.patch_id, patch.drift_id),
                degradations: vec![],
            },
            DriftSummary { drift_ids: vec![patch.drift_id.clone()] },
            MemoryGraphDiff::default(),
            hash_scope,
            version,
            Some(patch.supersedes_episode_id.clone()),
            prev_hash_chain.as_deref(),
            now,
        )?;
        self.episode_log.append(&episode)?;

        let mut graph = self
            .memory_graph
            .write()
            .map_err(|_| poisoned("memory_graph"))?;
        let patch_node = graph.add_node(
            MemoryNodeKind::Patch,
            patch.patch_id.clone(),
            vec![format!("episode:{}", episode.episode_id)],
        )?;
        if let Some(drift_node) = graph.find_by_ref(&patch.drift_id).cloned() {
            graph.add_edge(patch_node.node_id, drift_node.node_id, MemoryEdgeKind::ResolvedBy)?;
        }

        Ok(episode)
    }

    /// Appends a drift signal and mirrors it into the memory graph as a
    /// `DRIFT` node (spec §4.12: "Memory Graph adds `PATCH` node with
    /// `RESOLVED_BY` edge to DS node").
    pub fn record_drift(&self, signal: &DriftSignal) -> CmResult<()> {
        self.drift_log.append(signal)?;
        let mut graph = self
            .memory_graph
            .write()
            .map_err(|_| poisoned("memory_graph"))?;
        graph.add_node(
            credmesh_types::model::MemoryNodeKind::Drift,
            signal.drift_id.clone(),
            vec![format!("fp:{}", signal.fingerprint.key)],
        )?;
        Ok(())
    }

    /// Recent drift signals within `window`, newest last.
    pub fn recent_drift(&self, window: chrono::Duration) -> CmResult<Vec<DriftSignal>> {
        let now = self.clock.now();
        let all = self.drift_log.load_all::<DriftSignal>()?;
        Ok(all.into_iter().filter(|d| now - d.detected_at <= window).collect())
    }
}

fn poisoned(what: &'static str) -> credmesh_api::error::CredMeshError {
    credmesh_api::error::CredMeshError::new(
        credmesh_api::error::ErrorKind::Filesystem,
        format!("{what} lock poisoned"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClockMode;

    fn test_config(dir: &std::path::Path) -> NodeConfig {
        NodeConfig {
            tenant_id: "acme".into(),
            node_id: "node-1".into(),
            node_role: "edge".into(),
            storage_root: dir.to_path_buf(),
            crypto_backend: CryptoBackend::Ed25519A,
            peer_urls: vec![],
            max_retries: 5,
            backoff_base: std::time::Duration::from_millis(250),
            suspect_after_failures: 2,
            offline_after_failures: 5,
            recovery_successes: 3,
            scoring_policy_hash: None,
            clock_mode: ClockMode::System,
            fixed_clock: None,
        }
    }

    #[test]
    fn open_wires_every_component_and_persists_directories() {
        let dir = tempfile::tempdir().unwrap();
        let state = NodeState::open(test_config(dir.path())).unwrap();
        assert!(dir.path().join("envelopes.ndjson").exists());
        assert!(dir.path().join("authority_ledger.ndjson").exists());
        assert_eq!(state.crypto.active_key_id(), "node-1");
    }

    #[test]
    fn abp_gate_check_passes_with_no_abp_installed_and_rejects_an_unauthorized_one() {
        use credmesh_abp::builder::{build_abp, AbpConfig};
        use credmesh_types::model::{
            AbpApprovals, AbpData, AbpEscalation, AbpObjectives, AbpProof, AbpRuntime, AbpTools,
        };

        let dir = tempfile::tempdir().unwrap();
        let state = NodeState::open(test_config(dir.path())).unwrap();
        assert!(state.abp_gate_check().unwrap());

        let abp = build_abp(
            "finance",
            "auth-unknown",
            AbpConfig {
                abp_version: "1".into(),
                objectives: AbpObjectives::default(),
                tools: AbpTools::default(),
                data: AbpData::default(),
                approvals: AbpApprovals::default(),
                escalation: AbpEscalation::default(),
                runtime: AbpRuntime::default(),
                proof: AbpProof::default(),
                delegation_review: None,
                effective_at: None,
                expires_at: None,
            },
            state.clock.now(),
        )
        .unwrap();
        state.install_abp(abp).unwrap();
        assert!(!state.abp_gate_check().unwrap());
    }

    #[test]
    fn record_drift_appends_log_and_memory_node() {
        use credmesh_types::model::{DriftSignal, DriftType, Fingerprint, RecommendedPatchType, StatusLight};

        let dir = tempfile::tempdir().unwrap();
        let state = NodeState::open(test_config(dir.path())).unwrap();
        let signal = DriftSignal {
            drift_id: "DS-1".into(),
            episode_id: "EP-1".into(),
            drift_type: DriftType::Freshness,
            severity: StatusLight::Yellow,
            detected_at: state.clock.now(),
            evidence_refs: vec![],
            recommended_patch_type: RecommendedPatchType::TtlChange,
            fingerprint: Fingerprint { key: "abc12345".into(), version: 1 },
            notes: None,
        };
        state.record_drift(&signal).unwrap();
        assert_eq!(state.drift_log.count::<DriftSignal>().unwrap(), 1);
        assert_eq!(state.memory_graph.read().unwrap().node_count(), 1);
    }

    #[test]
    fn apply_patch_and_reseal_seals_a_new_episode_and_links_patch_to_drift() {
        use credmesh_drift::patch_engine::{propose_patch, ApprovalRole};
        use credmesh_types::model::{DriftSignal, DriftType, Fingerprint, RecommendedPatchType};

        let dir = tempfile::tempdir().unwrap();
        let state = NodeState::open(test_config(dir.path())).unwrap();

        let drift = DriftSignal {
            drift_id: "DS-1".into(),
            episode_id: "EP-1".into(),
            drift_type: DriftType::Freshness,
            severity: StatusLight::Yellow,
            detected_at: state.clock.now(),
            evidence_refs: vec![],
            recommended_patch_type: RecommendedPatchType::TtlChange,
            fingerprint: Fingerprint { key: "abc12345".into(), version: 1 },
            notes: None,
        };
        state.record_drift(&drift).unwrap();

        let patch = propose_patch(
            "PATCH-1",
            "DS-1",
            RecommendedPatchType::TtlChange,
            "extend Tier-0 evidence TTL",
            "EP-1",
            "revert TTL to prior value",
            5.0,
            state.clock.now(),
        );
        let mut approvals = ApprovalState::default();
        approvals.approve(ApprovalRole::Owner);

        let episode = state
            .apply_patch_and_reseal(patch, StatusLight::Yellow, &approvals)
            .unwrap();
        assert_eq!(episode.supersedes_episode_id, Some("EP-1".into()));
        assert_eq!(episode.version, 2);
        assert_eq!(state.episode_log.count::<SealedDecisionEpisode>().unwrap(), 1);

        let graph = state.memory_graph.read().unwrap();
        assert_eq!(graph.node_count(), 2);
        let patch_node = graph.find_by_ref("PATCH-1").unwrap();
        let drift_node = graph.find_by_ref("DS-1").unwrap();
        let resolved: Vec<_> = graph.edges_into(&drift_node.node_id).collect();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].from_node_id, patch_node.node_id);
        assert_eq!(resolved[0].kind, MemoryEdgeKind::ResolvedBy);
    }
}
