// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Miner data replication.
//!
//! The [`Replicator`] watches the chain for sectors proved by other miners,
//! retrieves the pieces stored in them and publishes new storage deals for
//! those pieces against a local miner.

mod api;
mod blocks;
mod market;
mod message;
mod metrics;
mod miner;
mod replicator;
mod shim;
#[cfg(test)]
mod test_utils;
mod utils;

pub use api::{ActiveSync, NodeApi, SyncStatus};
pub use blocks::{Tipset, TipsetKey};
pub use market::{
    DataRef, DealInfo, DealProposal, DealState, MarketDeal, PublishStorageDataRef, QueryOffer,
    QueryResponse, QueryResponseStatus, StartDealParams, StorageDealStatus, TransferType,
};
pub use message::{ApiMessage, Message};
pub use metrics::{default_registry, encode_metrics};
pub use miner::{
    MinerInfo, ProveCommitSectorParams, SectorOnChainInfo, SectorPreCommitInfo,
    SectorPreCommitOnChainInfo,
};
pub use replicator::{Error, Replicator, ReplicatorConfig, ReplicatorStats};
pub use shim::{
    address::Address,
    clock::ChainEpoch,
    deal::DealID,
    sector::SectorNumber,
};
pub use utils::logger::setup_logger;
