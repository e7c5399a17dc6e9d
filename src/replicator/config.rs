// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::num::NonZeroUsize;
use std::time::Duration;

use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};
use serde_with::{DurationSeconds, serde_as};

use crate::shim::clock::ChainEpoch;
use crate::utils::misc::env::env_parse;

const LOOP_WAITING_SECS_ENV: &str = "FOREST_REPLICATOR_LOOP_WAITING_SECS";
const RETRIEVE_PARALLEL_ENV: &str = "FOREST_REPLICATOR_RETRIEVE_PARALLEL";
const DEAL_PARALLEL_ENV: &str = "FOREST_REPLICATOR_DEAL_PARALLEL";
const RETRIEVE_TRY_MAX_ENV: &str = "FOREST_REPLICATOR_RETRIEVE_TRY_MAX";
const SCAN_START_ENV: &str = "FOREST_REPLICATOR_SCAN_START";
const INVENTORY_CAPACITY_ENV: &str = "FOREST_REPLICATOR_INVENTORY_CAPACITY";

/// Tuning knobs of the replication loop.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, smart_default::SmartDefault)]
#[serde(default)]
pub struct ReplicatorConfig {
    /// Pause between two ticks of the driver.
    #[default(Duration::from_secs(10))]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub loop_waiting: Duration,
    /// Soft cap on pieces with a retrieval in flight.
    #[default(16)]
    pub retrieve_parallel_num: usize,
    /// Soft cap on deals published but not yet active.
    #[default(16)]
    pub deal_parallel_num: usize,
    /// Failed retrieval queries per provider after which a warning is raised.
    /// Providers are never dropped because of it.
    #[default(50)]
    pub retrieve_try_count_max: u64,
    /// First epoch the chain indexer looks at.
    #[default(10)]
    pub scan_start: ChainEpoch,
    /// Bound of the piece inventory and of the retrieval and deal sets.
    #[default(nonzero!(1_000_000usize))]
    pub inventory_capacity: NonZeroUsize,
    /// Skip chain indexing for a tick while the node reports an active sync
    /// with epochs still to fetch.
    pub pause_while_syncing: bool,
}

impl ReplicatorConfig {
    /// Default configuration with any `FOREST_REPLICATOR_*` environment
    /// overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Applies `FOREST_REPLICATOR_*` environment overrides on top of `self`.
    /// Invalid values are logged and ignored.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(secs) = env_parse::<u64>(LOOP_WAITING_SECS_ENV, |s| *s > 0) {
            self.loop_waiting = Duration::from_secs(secs);
        }
        if let Some(n) = env_parse::<usize>(RETRIEVE_PARALLEL_ENV, |n| *n > 0) {
            self.retrieve_parallel_num = n;
        }
        if let Some(n) = env_parse::<usize>(DEAL_PARALLEL_ENV, |n| *n > 0) {
            self.deal_parallel_num = n;
        }
        if let Some(n) = env_parse::<u64>(RETRIEVE_TRY_MAX_ENV, |_| true) {
            self.retrieve_try_count_max = n;
        }
        if let Some(epoch) = env_parse::<ChainEpoch>(SCAN_START_ENV, |e| *e >= 0) {
            self.scan_start = epoch;
        }
        if let Some(cap) = env_parse::<NonZeroUsize>(INVENTORY_CAPACITY_ENV, |_| true) {
            self.inventory_capacity = cap;
        }
        self
    }

    pub fn with_loop_waiting(mut self, loop_waiting: Duration) -> Self {
        self.loop_waiting = loop_waiting;
        self
    }

    pub fn with_retrieve_parallel_num(mut self, n: usize) -> Self {
        self.retrieve_parallel_num = n;
        self
    }

    pub fn with_deal_parallel_num(mut self, n: usize) -> Self {
        self.deal_parallel_num = n;
        self
    }

    pub fn with_retrieve_try_count_max(mut self, n: u64) -> Self {
        self.retrieve_try_count_max = n;
        self
    }

    pub fn with_scan_start(mut self, epoch: ChainEpoch) -> Self {
        self.scan_start = epoch;
        self
    }

    pub fn with_inventory_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.inventory_capacity = capacity;
        self
    }

    pub fn with_pause_while_syncing(mut self, pause: bool) -> Self {
        self.pause_while_syncing = pause;
        self
    }
}
