//! Aggregator role (spec §4.6): counts ACCEPTs per claim, grouped by
//! validator region and correlation group.

use std::collections::HashMap;

use chrono::Utc;

use credmesh_storage::log_store::LogStore;
use credmesh_types::model::{Aggregate, RegionGroupCount, Validation, Verdict};

use crate::error::CmResult;

pub struct Aggregator {
    log: LogStore,
    next_seq: std::sync::atomic::AtomicU64,
}

/// Associates a validator node with the region/correlation-group pair its
/// accepts should be bucketed under.
pub struct ValidatorLocation {
    pub validator_node_id: String,
    pub region: String,
    pub correlation_group: String,
}

impl Aggregator {
    pub fn new(log: LogStore) -> Self {
        Self {
            log,
            next_seq: std::sync::atomic::AtomicU64::new(1),
        }
    }

    /// Builds and persists an aggregate snapshot for `claim_id` from the
    /// given validations, bucketing ACCEPTs by `(region, correlation_group)`
    /// per `locations` (spec §4.6).
    pub fn aggregate(
        &self,
        claim_id: impl Into<String>,
        validations: &[Validation],
        locations: &[ValidatorLocation],
    ) -> CmResult<Aggregate> {
        let location_by_node: HashMap<&str, &ValidatorLocation> = locations
            .iter()
            .map(|l| (l.validator_node_id.as_str(), l))
            .collect();

        let mut counts: HashMap<(String, String), u64> = HashMap::new();
        let mut envelope_ids = Vec::new();
        for v in validations {
            if v.verdict != Verdict::Accept {
                continue;
            }
            envelope_ids.push(v.envelope_id.clone());
            if let Some(loc) = location_by_node.get(v.validator_node_id.as_str()) {
                *counts
                    .entry((loc.region.clone(), loc.correlation_group.clone()))
                    .or_insert(0) += 1;
            }
        }

        let mut accepts_by_region_group: Vec<RegionGroupCount> = counts
            .into_iter()
            .map(|((region, correlation_group), accepts)| RegionGroupCount {
                region,
                correlation_group,
                accepts,
            })
            .collect();
        accepts_by_region_group.sort_by(|a, b| (&a.region, &a.correlation_group).cmp(&(&b.region, &b.correlation_group)));

        let seq = self.next_seq.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let aggregate = Aggregate {
            aggregate_id: format!("AGG-{seq:06}"),
            claim_id: claim_id.into(),
            accepts_by_region_group,
            envelope_ids,
            computed_at: Utc::now(),
        };

        self.log.append(&aggregate)?;
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn validation(node: &str, verdict: Verdict) -> Validation {
        Validation {
            envelope_id: "ENV-1".into(),
            validator_node_id: node.into(),
            verdict,
            reason: None,
            validated_at: Utc::now(),
        }
    }

    #[test]
    fn accepts_grouped_by_region_and_correlation_group() {
        let dir = tempfile::tempdir().unwrap();
        let log = LogStore::open(dir.path().join("aggregates.ndjson")).unwrap();
        let aggregator = Aggregator::new(log);

        let locations = vec![
            ValidatorLocation {
                validator_node_id: "v1".into(),
                region: "us-east".into(),
                correlation_group: "g1".into(),
            },
            ValidatorLocation {
                validator_node_id: "v2".into(),
                region: "us-east".into(),
                correlation_group: "g1".into(),
            },
            ValidatorLocation {
                validator_node_id: "v3".into(),
                region: "eu-west".into(),
                correlation_group: "g2".into(),
            },
        ];
        let validations = vec![
            validation("v1", Verdict::Accept),
            validation("v2", Verdict::Accept),
            validation("v3", Verdict::Reject),
        ];

        let agg = aggregator.aggregate("CLAIM-2026-0001", &validations, &locations).unwrap();
        assert_eq!(agg.accepts_by_region_group.len(), 1);
        assert_eq!(agg.accepts_by_region_group[0].accepts, 2);
    }
}
