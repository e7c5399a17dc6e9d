// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

/// Replicator error.
#[derive(Debug, Error)]
pub enum Error {
    /// A chain read failed while indexing. The scan resumes from the first
    /// unprocessed epoch on the next tick.
    #[error("chain query failed: {0:#}")]
    ChainQuery(anyhow::Error),
    /// Any other failure talking to the node.
    #[error("node API call failed: {0:#}")]
    Transport(anyhow::Error),
    #[error("the miner hasn't initialized yet")]
    MinerNotInitialized,
    #[error("replicator already started")]
    AlreadyStarted,
    #[error("replicator is not running")]
    NotStarted,
    /// The caller of `stop` gave up before the driver drained.
    #[error("cancelled while waiting for the replicator to stop")]
    Cancelled,
    #[error("replicator driver failed: {0}")]
    Driver(#[from] tokio::task::JoinError),
}
