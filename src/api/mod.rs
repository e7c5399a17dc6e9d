// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use async_trait::async_trait;
use cid::Cid;

use crate::blocks::{Tipset, TipsetKey};
use crate::market::{DealInfo, MarketDeal, QueryOffer, QueryResponse, StartDealParams};
use crate::message::ApiMessage;
use crate::miner::{MinerInfo, SectorOnChainInfo, SectorPreCommitOnChainInfo};
use crate::shim::{address::Address, clock::ChainEpoch, deal::DealID, sector::SectorNumber};

/// The full-node API surface the replicator depends on. Every method maps to
/// one Lotus-compatible RPC call; errors are transport or node failures.
///
/// Implementations must be safe for concurrent reads.
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// `ChainHead`
    async fn chain_head(&self) -> anyhow::Result<Tipset>;

    /// `ChainGetTipSetByHeight` relative to the current head. For a null
    /// round the node returns a neighbouring non-null tipset, whose epoch
    /// differs from `height`.
    async fn chain_get_tipset_by_height(&self, height: ChainEpoch) -> anyhow::Result<Tipset>;

    /// `ChainGetParentMessages`
    async fn chain_get_parent_messages(&self, block: &Cid) -> anyhow::Result<Vec<ApiMessage>>;

    /// `StateSectorPreCommitInfo`. `Ok(None)` if no pre-commit exists.
    async fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipsetKey,
    ) -> anyhow::Result<Option<SectorPreCommitOnChainInfo>>;

    /// `StateSectorGetInfo`. `Ok(None)` if the sector does not exist.
    async fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        tsk: &TipsetKey,
    ) -> anyhow::Result<Option<SectorOnChainInfo>>;

    /// `StateMarketStorageDeal`
    async fn state_market_storage_deal(
        &self,
        deal_id: DealID,
        tsk: &TipsetKey,
    ) -> anyhow::Result<MarketDeal>;

    /// `ClientListDeals`
    async fn client_list_deals(&self) -> anyhow::Result<Vec<DealInfo>>;

    /// `ClientHasLocal`
    async fn client_has_local(&self, root: &Cid) -> anyhow::Result<bool>;

    /// `ClientQuery`: ask `provider` whether it will serve `root`.
    async fn client_query(&self, root: &Cid, provider: &Address) -> anyhow::Result<QueryResponse>;

    /// `ClientMinerQueryOffer`
    async fn client_miner_query_offer(
        &self,
        miner: &Address,
        root: &Cid,
    ) -> anyhow::Result<QueryOffer>;

    /// `StateMinerInfo` at the current head.
    async fn state_miner_info(&self, miner: &Address) -> anyhow::Result<MinerInfo>;

    /// `ClientStartDeal`. Returns the proposal CID of the new deal.
    async fn client_start_deal(&self, params: &StartDealParams) -> anyhow::Result<Cid>;

    /// `ClientGetDealInfo`
    async fn client_get_deal_info(&self, proposal: &Cid) -> anyhow::Result<DealInfo>;

    /// `SyncState`
    async fn sync_state(&self) -> anyhow::Result<SyncStatus>;
}

/// A single in-progress sync between two tipsets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ActiveSync {
    pub base: Option<Tipset>,
    pub target: Option<Tipset>,
}

impl ActiveSync {
    /// Number of epochs between base and target. Zero when the target is
    /// unknown.
    pub fn height_gap(&self) -> ChainEpoch {
        match &self.target {
            Some(target) => {
                target.epoch() - self.base.as_ref().map(Tipset::epoch).unwrap_or_default()
            }
            None => 0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub active_syncs: Vec<ActiveSync>,
}

impl SyncStatus {
    /// `true` while any worker still has epochs left to sync.
    pub fn is_catching_up(&self) -> bool {
        self.active_syncs.iter().any(|s| s.height_gap() > 0)
    }
}
