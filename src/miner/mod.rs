// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Storage miner actor state and parameters consumed by the replicator.

use cid::Cid;
use fvm_ipld_encoding::{RawBytes, tuple::*};

use crate::shim::{address::Address, clock::ChainEpoch, deal::DealID, sector::SectorNumber};

/// Peer ID a miner reports before it has been configured.
pub const UNINITIALIZED_PEER_ID: &str = "SETME";

/// Parameters of the miner actor's `ProveCommitSector` method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize_tuple, Deserialize_tuple)]
pub struct ProveCommitSectorParams {
    pub sector_number: SectorNumber,
    pub proof: RawBytes,
}

/// Information provided by a miner when pre-committing a sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorPreCommitInfo {
    pub sector_number: SectorNumber,
    /// `CommR`
    pub sealed_cid: Cid,
    pub seal_rand_epoch: ChainEpoch,
    pub deal_ids: Vec<DealID>,
    pub expiration: ChainEpoch,
}

/// Information stored on-chain for a pre-committed sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorPreCommitOnChainInfo {
    pub info: SectorPreCommitInfo,
    pub pre_commit_epoch: ChainEpoch,
}

/// Information stored on-chain for a proven sector.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectorOnChainInfo {
    pub sector_number: SectorNumber,
    pub sealed_cid: Cid,
    pub deal_ids: Vec<DealID>,
    pub activation: ChainEpoch,
    pub expiration: ChainEpoch,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MinerInfo {
    pub owner: Address,
    pub worker: Address,
    /// Libp2p identity of the miner, as a string.
    pub peer_id: Option<String>,
    pub sector_size: u64,
}

impl MinerInfo {
    /// A miner is usable as a deal counterparty once it has published a real
    /// peer ID.
    pub fn is_initialized(&self) -> bool {
        matches!(&self.peer_id, Some(id) if id != UNINITIALIZED_PEER_ID)
    }
}
