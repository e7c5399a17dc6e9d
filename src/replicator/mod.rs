// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! The replication loop.
//!
//! Each tick of the driver runs three phases in order:
//! 1. the chain indexer folds newly proved sectors of other miners into the
//!    piece inventory,
//! 2. the retrieval scheduler asks providers to serve pieces that are not
//!    stored locally yet,
//! 3. the deal scheduler publishes a storage deal against the local miner for
//!    every piece that has arrived locally.
//!
//! The driver task exclusively owns the inventory, the retrieval and deal sets
//! and the scan cursor. It hands them back through its [`JoinHandle`] when it
//! stops, so restarting resumes where the previous run left off.

mod config;
mod deal;
mod errors;
mod indexer;
mod inventory;
mod metrics;
mod retrieval;

pub use config::ReplicatorConfig;
pub use errors::Error;

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument as _, debug, error, info, info_span, warn};

use self::inventory::{DealSet, PieceInventory, RetrievalSet};
use self::metrics::{gauge_value, values};
use crate::api::NodeApi;
use crate::shim::{address::Address, clock::ChainEpoch};

/// Sizes of the replicator's containers and its scan cursor, as of the end of
/// the last driver tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplicatorStats {
    pub scan_cursor: ChainEpoch,
    pub pieces: usize,
    pub pending_retrievals: usize,
    pub pending_deals: usize,
}

/// State owned by the driver task.
pub(crate) struct Worker<A> {
    api: Arc<A>,
    miner: Address,
    config: ReplicatorConfig,
    /// Next epoch to index. Never decreases.
    check_height: ChainEpoch,
    pieces: PieceInventory,
    retrievals: RetrievalSet,
    deals: DealSet,
}

impl<A: NodeApi> Worker<A> {
    fn new(api: Arc<A>, miner: Address, config: ReplicatorConfig) -> Self {
        let capacity = config.inventory_capacity;
        Self {
            api,
            miner,
            check_height: config.scan_start,
            config,
            pieces: PieceInventory::new(capacity),
            retrievals: RetrievalSet::new(capacity),
            deals: DealSet::new(capacity),
        }
    }

    fn stats(&self) -> ReplicatorStats {
        ReplicatorStats {
            scan_cursor: self.check_height,
            pieces: self.pieces.len(),
            pending_retrievals: self.retrievals.len(),
            pending_deals: self.deals.len(),
        }
    }

    fn publish_stats(&self, stats: &RwLock<ReplicatorStats>) {
        let snapshot = self.stats();
        metrics::SCAN_CURSOR.set(snapshot.scan_cursor);
        metrics::INVENTORY_PIECES.set(gauge_value(snapshot.pieces));
        metrics::PENDING_RETRIEVALS.set(gauge_value(snapshot.pending_retrievals));
        metrics::PENDING_DEALS.set(gauge_value(snapshot.pending_deals));
        *stats.write() = snapshot;
    }

    /// Whether the indexer should run this tick. Only consults the node's
    /// sync state when `pause_while_syncing` is set.
    async fn needs_check_data(&self) -> Result<bool, Error> {
        if !self.config.pause_while_syncing {
            return Ok(true);
        }
        let sync = self.api.sync_state().await.map_err(Error::Transport)?;
        Ok(!sync.is_catching_up())
    }

    /// Runs the three phases once. Phase errors are logged, never propagated.
    async fn tick(&mut self, stop: &CancellationToken) {
        match self.needs_check_data().await {
            Ok(true) => {
                if let Err(e) = self.check_chain_data(stop).await {
                    error!("failed to check chain data: {e}");
                    metrics::PHASE_ERROR_TOTAL
                        .get_or_create(&values::INDEX)
                        .inc();
                }
            }
            Ok(false) => debug!("node is catching up, skipping chain indexing"),
            Err(e) => {
                error!("failed to read sync state: {e}");
                metrics::PHASE_ERROR_TOTAL
                    .get_or_create(&values::INDEX)
                    .inc();
            }
        }

        if let Err(e) = self.retrieve_chain_data().await {
            warn!("failed to retrieve data: {e}");
            metrics::PHASE_ERROR_TOTAL
                .get_or_create(&values::RETRIEVE)
                .inc();
        }

        if let Err(e) = self.deal_chain_data().await {
            error!("failed to deal chain data: {e}");
            metrics::PHASE_ERROR_TOTAL
                .get_or_create(&values::DEAL)
                .inc();
        }
    }
}

impl<A: NodeApi + 'static> Worker<A> {
    /// Driver loop. Returns the worker once `stop` has been cancelled.
    async fn drive(mut self, stop: CancellationToken, stats: Arc<RwLock<ReplicatorStats>>) -> Self {
        info!("replicator started at epoch {}", self.check_height);
        loop {
            if stop.is_cancelled() {
                break;
            }
            self.tick(&stop).await;
            self.publish_stats(&stats);

            tokio::select! {
                _ = tokio::time::sleep(self.config.loop_waiting) => {}
                _ = stop.cancelled() => {}
            }
        }
        info!("replicator stopped at epoch {}", self.check_height);
        self
    }
}

struct Running<A> {
    stop: CancellationToken,
    driver: JoinHandle<Worker<A>>,
}

struct Lifecycle<A> {
    /// `None` while the driver owns the worker.
    worker: Option<Worker<A>>,
    running: Option<Running<A>>,
}

/// Replicates pieces proved by other miners into deals with `miner`.
pub struct Replicator<A> {
    api: Arc<A>,
    miner: Address,
    config: ReplicatorConfig,
    lifecycle: Mutex<Lifecycle<A>>,
    stats: Arc<RwLock<ReplicatorStats>>,
}

impl<A: NodeApi + 'static> Replicator<A> {
    pub fn new(api: Arc<A>, miner: Address, config: ReplicatorConfig) -> Self {
        let worker = Worker::new(api.clone(), miner, config.clone());
        let stats = Arc::new(RwLock::new(worker.stats()));
        Self {
            api,
            miner,
            config,
            lifecycle: Mutex::new(Lifecycle {
                worker: Some(worker),
                running: None,
            }),
            stats,
        }
    }

    /// Address of the local miner that new deals are made with.
    pub fn miner(&self) -> &Address {
        &self.miner
    }

    pub fn config(&self) -> &ReplicatorConfig {
        &self.config
    }

    /// Spawns the driver. Fails with [`Error::AlreadyStarted`] if it is
    /// already running.
    pub async fn start(&self) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.lock().await;
        if lifecycle.running.is_some() {
            return Err(Error::AlreadyStarted);
        }
        let worker = lifecycle
            .worker
            .take()
            .unwrap_or_else(|| Worker::new(self.api.clone(), self.miner, self.config.clone()));
        let stop = CancellationToken::new();
        let span = info_span!("replicator", miner = %self.miner);
        let driver = tokio::spawn(
            worker
                .drive(stop.clone(), self.stats.clone())
                .instrument(span),
        );
        lifecycle.running = Some(Running { stop, driver });
        Ok(())
    }

    /// Requests the driver to stop and waits until it has drained, or until
    /// `ctx` is cancelled. In the latter case [`Error::Cancelled`] is
    /// returned and a later call can wait for the drain again.
    pub async fn stop(&self, ctx: &CancellationToken) -> Result<(), Error> {
        let mut lifecycle = self.lifecycle.lock().await;
        let Some(running) = lifecycle.running.as_mut() else {
            return Err(Error::NotStarted);
        };
        running.stop.cancel();

        let drained = tokio::select! {
            biased;
            res = &mut running.driver => Some(res),
            _ = ctx.cancelled() => None,
        };
        let Some(res) = drained else {
            return Err(Error::Cancelled);
        };
        lifecycle.running = None;
        lifecycle.worker = Some(res?);
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.lifecycle.lock().await.running.is_some()
    }

    /// Container sizes and scan cursor as published by the last driver tick.
    pub fn stats(&self) -> ReplicatorStats {
        *self.stats.read()
    }
}
