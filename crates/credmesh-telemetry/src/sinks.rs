//! Abstract metrics-sink traits, decoupling the mesh's core logic from the
//! Prometheus backend in [`crate::prometheus`].

use once_cell::sync::OnceCell;

/// A no-op sink used in tests and whenever telemetry has not been wired up.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

/// Lazily-initialized static reference to the process's configured sink.
pub static SINK: OnceCell<&'static dyn MetricsSink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Installs the process-wide sink. Fails if a sink was already installed —
/// this is meant to be called exactly once during node startup (spec §5:
/// "process-wide lifecycle-managed registry").
pub fn install_sink(sink: &'static dyn MetricsSink) -> Result<(), &'static dyn MetricsSink> {
    SINK.set(sink)
}

pub fn ledger_metrics() -> &'static dyn LedgerMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn credibility_metrics() -> &'static dyn CredibilityMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn drift_metrics() -> &'static dyn DriftMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn replication_metrics() -> &'static dyn ReplicationMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

pub fn error_metrics() -> &'static dyn ErrorMetricsSink {
    SINK.get().copied().unwrap_or(&NOP_SINK)
}

/// Metrics for append-only logs: the authority ledger, transparency log,
/// and seal chain (spec §4.3-§4.4, §4.14).
pub trait LedgerMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_entries_appended(&self, log: &'static str);
    fn inc_chain_breaks_detected(&self, log: &'static str);
    fn observe_append_duration(&self, log: &'static str, duration_secs: f64);
}
impl LedgerMetricsSink for NopSink {
    fn inc_entries_appended(&self, _log: &'static str) {}
    fn inc_chain_breaks_detected(&self, _log: &'static str) {}
    fn observe_append_duration(&self, _log: &'static str, _duration_secs: f64) {}
}

/// Metrics for the Composite Credibility Index Scorer (spec §4.13).
pub trait CredibilityMetricsSink: Send + Sync + std::fmt::Debug {
    fn set_credibility_score(&self, tenant_id: &str, score: f64);
    fn inc_band_transition(&self, tenant_id: &str, from: &'static str, to: &'static str);
    fn observe_scoring_duration(&self, duration_secs: f64);
}
impl CredibilityMetricsSink for NopSink {
    fn set_credibility_score(&self, _tenant_id: &str, _score: f64) {}
    fn inc_band_transition(&self, _tenant_id: &str, _from: &'static str, _to: &'static str) {}
    fn observe_scoring_duration(&self, _duration_secs: f64) {}
}

/// Metrics for the Drift Detector and Patch & Re-seal Engine (spec
/// §4.11-§4.12).
pub trait DriftMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_drift_detected(&self, drift_type: &'static str, severity: &'static str);
    fn inc_recurrence_threshold_triggered(&self, drift_type: &'static str);
    fn inc_patch_applied(&self, patch_type: &'static str);
    fn inc_patch_rejected(&self, gate: &'static str);
}
impl DriftMetricsSink for NopSink {
    fn inc_drift_detected(&self, _drift_type: &'static str, _severity: &'static str) {}
    fn inc_recurrence_threshold_triggered(&self, _drift_type: &'static str) {}
    fn inc_patch_applied(&self, _patch_type: &'static str) {}
    fn inc_patch_rejected(&self, _gate: &'static str) {}
}

/// Metrics for the replication transport and peer-health state machine
/// (spec §4.15).
pub trait ReplicationMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_push_records(&self, kind: &'static str, count: u64);
    fn inc_pull_records(&self, kind: &'static str, count: u64);
    fn set_peer_state(&self, peer_id: &str, state: &'static str);
    fn inc_retry_attempts(&self, peer_id: &str);
}
impl ReplicationMetricsSink for NopSink {
    fn inc_push_records(&self, _kind: &'static str, _count: u64) {}
    fn inc_pull_records(&self, _kind: &'static str, _count: u64) {}
    fn set_peer_state(&self, _peer_id: &str, _state: &'static str) {}
    fn inc_retry_attempts(&self, _peer_id: &str) {}
}

/// Metrics for the stable error taxonomy (spec §7).
pub trait ErrorMetricsSink: Send + Sync + std::fmt::Debug {
    fn inc_error(&self, kind: &'static str);
}
impl ErrorMetricsSink for NopSink {
    fn inc_error(&self, _kind: &'static str) {}
}

/// A unified sink implementing every domain trait, providing one
/// implementation point for a metrics backend.
pub trait MetricsSink:
    LedgerMetricsSink
    + CredibilityMetricsSink
    + DriftMetricsSink
    + ReplicationMetricsSink
    + ErrorMetricsSink
{
}

impl<T> MetricsSink for T where
    T: LedgerMetricsSink
        + CredibilityMetricsSink
        + DriftMetricsSink
        + ReplicationMetricsSink
        + ErrorMetricsSink
{
}
