// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use prometheus_client::{
    encoding::{EncodeLabelKey, EncodeLabelSet, EncodeLabelValue, LabelSetEncoder},
    metrics::{counter::Counter, family::Family, gauge::Gauge},
};
use std::sync::LazyLock;

pub static INVENTORY_PIECES: LazyLock<Gauge> = LazyLock::new(|| {
    let metric = Gauge::default();
    crate::metrics::default_registry().register(
        "replicator_inventory_pieces",
        "Number of pieces of interest awaiting replication",
        metric.clone(),
    );
    metric
});
pub static PENDING_RETRIEVALS: LazyLock<Gauge> = LazyLock::new(|| {
    let metric = Gauge::default();
    crate::metrics::default_registry().register(
        "replicator_pending_retrievals",
        "Number of pieces with a retrieval in flight",
        metric.clone(),
    );
    metric
});
pub static PENDING_DEALS: LazyLock<Gauge> = LazyLock::new(|| {
    let metric = Gauge::default();
    crate::metrics::default_registry().register(
        "replicator_pending_deals",
        "Number of deals started by the replicator that are not active yet",
        metric.clone(),
    );
    metric
});
pub static SCAN_CURSOR: LazyLock<Gauge> = LazyLock::new(|| {
    let metric = Gauge::default();
    crate::metrics::default_registry().register(
        "replicator_scan_cursor",
        "Next chain epoch to be indexed",
        metric.clone(),
    );
    metric
});
pub static RETRIEVAL_QUERY_FAILURE_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let metric = Counter::default();
    crate::metrics::default_registry().register(
        "replicator_retrieval_query_failure",
        "Total number of failed retrieval queries",
        metric.clone(),
    );
    metric
});
pub static DEALS_STARTED_TOTAL: LazyLock<Counter> = LazyLock::new(|| {
    let metric = Counter::default();
    crate::metrics::default_registry().register(
        "replicator_deals_started",
        "Total number of storage deals started against the local miner",
        metric.clone(),
    );
    metric
});
pub static PHASE_ERROR_TOTAL: LazyLock<Family<PhaseLabel, Counter>> = LazyLock::new(|| {
    let metric = Family::default();
    crate::metrics::default_registry().register(
        "replicator_phase_error",
        "Total number of failed driver phases by phase",
        metric.clone(),
    );
    metric
});

#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct PhaseLabel(&'static str);

impl EncodeLabelSet for PhaseLabel {
    fn encode(&self, mut encoder: LabelSetEncoder) -> Result<(), std::fmt::Error> {
        let mut label_encoder = encoder.encode_label();
        let mut label_key_encoder = label_encoder.encode_label_key()?;
        EncodeLabelKey::encode(&"phase", &mut label_key_encoder)?;
        let mut label_value_encoder = label_key_encoder.encode_label_value()?;
        EncodeLabelValue::encode(&self.0, &mut label_value_encoder)?;
        label_value_encoder.finish()
    }
}

pub mod values {
    use super::PhaseLabel;

    pub const INDEX: PhaseLabel = PhaseLabel("index");
    pub const RETRIEVE: PhaseLabel = PhaseLabel("retrieve");
    pub const DEAL: PhaseLabel = PhaseLabel("deal");
}

/// Saturating conversion for gauge values.
pub fn gauge_value<T: TryInto<i64>>(v: T) -> i64 {
    v.try_into().unwrap_or(i64::MAX)
}
