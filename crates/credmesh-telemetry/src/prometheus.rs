//! The Prometheus-backed implementation of every [`crate::sinks`] trait.

use prometheus::{
    register_counter_vec, register_gauge_vec, register_histogram, register_histogram_vec,
    CounterVec, GaugeVec, Histogram, HistogramVec,
};

use crate::sinks::{
    CredibilityMetricsSink, DriftMetricsSink, ErrorMetricsSink, LedgerMetricsSink,
    ReplicationMetricsSink,
};

#[derive(Debug)]
pub struct PrometheusSink {
    entries_appended: CounterVec,
    chain_breaks: CounterVec,
    append_duration: HistogramVec,
    credibility_score: GaugeVec,
    band_transitions: CounterVec,
    scoring_duration: Histogram,
    drift_detected: CounterVec,
    recurrence_triggered: CounterVec,
    patch_applied: CounterVec,
    patch_rejected: CounterVec,
    push_records: CounterVec,
    pull_records: CounterVec,
    peer_state: GaugeVec,
    retry_attempts: CounterVec,
    errors: CounterVec,
}

impl PrometheusSink {
    /// Registers every metric with the default Prometheus registry.
    /// Panics if called more than once per process (registration
    /// collision), mirroring the teacher crate's `register_*!` usage.
    pub fn install() -> anyhow::Result<&'static Self> {
        let sink = Self {
            entries_appended: register_counter_vec!(
                "credmesh_ledger_entries_appended_total",
                "Entries appended to an append-only log",
                &["log"]
            )?,
            chain_breaks: register_counter_vec!(
                "credmesh_ledger_chain_breaks_total",
                "Chain continuity breaks detected on verification",
                &["log"]
            )?,
            append_duration: register_histogram_vec!(
                "credmesh_ledger_append_duration_seconds",
                "Latency of a single log append, including fsync",
                &["log"]
            )?,
            credibility_score: register_gauge_vec!(
                "credmesh_credibility_score",
                "Current Composite Credibility Index, 0-100",
                &["tenant_id"]
            )?,
            band_transitions: register_counter_vec!(
                "credmesh_credibility_band_transitions_total",
                "Credibility band transitions",
                &["tenant_id", "from", "to"]
            )?,
            scoring_duration: register_histogram!(
                "credmesh_credibility_scoring_duration_seconds",
                "Latency of a credibility scoring pass"
            )?,
            drift_detected: register_counter_vec!(
                "credmesh_drift_detected_total",
                "Drift signals detected, by type and severity",
                &["drift_type", "severity"]
            )?,
            recurrence_triggered: register_counter_vec!(
                "credmesh_drift_recurrence_threshold_triggered_total",
                "DRT-001 recurrence-threshold delegation review triggers",
                &["drift_type"]
            )?,
            patch_applied: register_counter_vec!(
                "credmesh_drift_patch_applied_total",
                "Patches applied, by recommended patch type",
                &["patch_type"]
            )?,
            patch_rejected: register_counter_vec!(
                "credmesh_drift_patch_rejected_total",
                "Patches rejected for not clearing their approval gate",
                &["gate"]
            )?,
            push_records: register_counter_vec!(
                "credmesh_replication_push_records_total",
                "Records sent via replication push, by record kind",
                &["kind"]
            )?,
            pull_records: register_counter_vec!(
                "credmesh_replication_pull_records_total",
                "Records received via replication pull, by record kind",
                &["kind"]
            )?,
            peer_state: register_gauge_vec!(
                "credmesh_replication_peer_state",
                "Peer health state (0=online, 1=suspect, 2=offline)",
                &["peer_id"]
            )?,
            retry_attempts: register_counter_vec!(
                "credmesh_replication_retry_attempts_total",
                "Replication retry attempts, by peer",
                &["peer_id"]
            )?,
            errors: register_counter_vec!(
                "credmesh_errors_total",
                "Errors raised, by stable error kind (spec §7)",
                &["kind"]
            )?,
        };
        let sink: &'static Self = Box::leak(Box::new(sink));
        crate::sinks::install_sink(sink)
            .map_err(|_| anyhow::anyhow!("a metrics sink is already installed"))?;
        Ok(sink)
    }
}

impl LedgerMetricsSink for PrometheusSink {
    fn inc_entries_appended(&self, log: &'static str) {
        self.entries_appended.with_label_values(&[log]).inc();
    }
    fn inc_chain_breaks_detected(&self, log: &'static str) {
        self.chain_breaks.with_label_values(&[log]).inc();
    }
    fn observe_append_duration(&self, log: &'static str, duration_secs: f64) {
        self.append_duration.with_label_values(&[log]).observe(duration_secs);
    }
}

impl CredibilityMetricsSink for PrometheusSink {
    fn set_credibility_score(&self, tenant_id: &str, score: f64) {
        self.credibility_score.with_label_values(&[tenant_id]).set(score);
    }
    fn inc_band_transition(&self, tenant_id: &str, from: &'static str, to: &'static str) {
        self.band_transitions.with_label_values(&[tenant_id, from, to]).inc();
    }
    fn observe_scoring_duration(&self, duration_secs: f64) {
        self.scoring_duration.observe(duration_secs);
    }
}

impl DriftMetricsSink for PrometheusSink {
    fn inc_drift_detected(&self, drift_type: &'static str, severity: &'static str) {
        self.drift_detected.with_label_values(&[drift_type, severity]).inc();
    }
    fn inc_recurrence_threshold_triggered(&self, drift_type: &'static str) {
        self.recurrence_triggered.with_label_values(&[drift_type]).inc();
    }
    fn inc_patch_applied(&self, patch_type: &'static str) {
        self.patch_applied.with_label_values(&[patch_type]).inc();
    }
    fn inc_patch_rejected(&self, gate: &'static str) {
        self.patch_rejected.with_label_values(&[gate]).inc();
    }
}

impl ReplicationMetricsSink for PrometheusSink {
    fn inc_push_records(&self, kind: &'static str, count: u64) {
        self.push_records.with_label_values(&[kind]).inc_by(count as f64);
    }
    fn inc_pull_records(&self, kind: &'static str, count: u64) {
        self.pull_records.with_label_values(&[kind]).inc_by(count as f64);
    }
    fn set_peer_state(&self, peer_id: &str, state: &'static str) {
        let value = match state {
            "online" => 0.0,
            "suspect" => 1.0,
            _ => 2.0,
        };
        self.peer_state.with_label_values(&[peer_id]).set(value);
    }
    fn inc_retry_attempts(&self, peer_id: &str) {
        self.retry_attempts.with_label_values(&[peer_id]).inc();
    }
}

impl ErrorMetricsSink for PrometheusSink {
    fn inc_error(&self, kind: &'static str) {
        self.errors.with_label_values(&[kind]).inc();
    }
}
