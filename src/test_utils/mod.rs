// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! In-memory node used by the replicator tests.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use cid::Cid;
use fvm_ipld_encoding::{DAG_CBOR, RawBytes};
use multihash_codetable::{Code, MultihashDigest as _};
use parking_lot::Mutex;

use crate::api::{NodeApi, SyncStatus};
use crate::blocks::{Tipset, TipsetKey};
use crate::market::{
    DealInfo, DealProposal, DealState, MarketDeal, PublishStorageDataRef, QueryOffer,
    QueryResponse, QueryResponseStatus, StartDealParams, StorageDealStatus,
};
use crate::message::{ApiMessage, Message};
use crate::miner::{
    MinerInfo, ProveCommitSectorParams, SectorOnChainInfo, SectorPreCommitInfo,
    SectorPreCommitOnChainInfo,
};
use crate::shim::{
    address::Address, clock::ChainEpoch, deal::DealID, message::miner_methods,
    sector::SectorNumber,
};

/// The miner that replicated deals are made with.
pub const LOCAL_MINER: Address = Address::new_id(1000);

pub fn cid_of(data: &[u8]) -> Cid {
    Cid::new_v1(DAG_CBOR, Code::Blake2b256.digest(data))
}

/// Payload root published for `piece` by [`market_deal`].
pub fn root_of(piece: &Cid) -> Cid {
    cid_of(&[b"root-".as_slice(), &piece.to_bytes()].concat())
}

fn block_cid(epoch: ChainEpoch) -> Cid {
    cid_of(format!("block-{epoch}").as_bytes())
}

/// Single block tipset at `epoch` whose parent is the block at `epoch - 1`.
pub fn tipset_at(epoch: ChainEpoch) -> Tipset {
    Tipset::new(vec![block_cid(epoch)], epoch, vec![block_cid(epoch - 1)]).unwrap()
}

pub fn market_deal(piece: Cid, provider: Address, sector_start_epoch: ChainEpoch) -> MarketDeal {
    MarketDeal {
        proposal: DealProposal {
            piece_cid: piece,
            piece_size: 2048,
            verified_deal: false,
            client: Address::new_id(100),
            provider,
            label: String::new(),
            start_epoch: 0,
            end_epoch: 100_000,
        },
        state: DealState {
            sector_start_epoch,
            last_updated_epoch: -1,
            slash_epoch: -1,
        },
        data_ref: PublishStorageDataRef {
            root_cid: root_of(&piece),
            expert: "expert".into(),
        },
    }
}

/// A `ProveCommitSector` message to `to`. `None` yields undecodable params.
pub fn prove_commit(to: Address, sector: Option<SectorNumber>) -> ApiMessage {
    let params = match sector {
        Some(sector_number) => RawBytes::serialize(ProveCommitSectorParams {
            sector_number,
            proof: RawBytes::new(vec![0; 8]),
        })
        .unwrap(),
        None => RawBytes::new(vec![0xff, 0x00]),
    };
    ApiMessage {
        cid: cid_of(format!("prove-commit-{to}-{sector:?}").as_bytes()),
        message: Message {
            from: Address::new_id(100),
            to,
            sequence: 0,
            method_num: miner_methods::PROVE_COMMIT_SECTOR,
            params,
        },
    }
}

struct Deal {
    params: StartDealParams,
    state: StorageDealStatus,
}

struct State {
    head: ChainEpoch,
    null_rounds: HashSet<ChainEpoch>,
    failing_tipsets: HashSet<ChainEpoch>,
    hang_head: bool,
    parent_messages: HashMap<Cid, Vec<ApiMessage>>,
    sectors: HashMap<(Address, SectorNumber), Vec<DealID>>,
    dropped_precommits: HashSet<(Address, SectorNumber)>,
    market_deals: HashMap<DealID, MarketDeal>,
    local_deals: Vec<DealInfo>,
    local: HashSet<Cid>,
    fail_has_local: bool,
    query_status: HashMap<Address, QueryResponseStatus>,
    failing_providers: HashSet<Address>,
    queries: Vec<(Cid, Address)>,
    local_offers: HashSet<Cid>,
    peer_id: Option<String>,
    deals: HashMap<Cid, Deal>,
    started: Vec<StartDealParams>,
    failing_starts: HashSet<Cid>,
    sync: SyncStatus,
    calls: HashMap<&'static str, usize>,
}

/// [`NodeApi`] backed by a synthetic chain of single block tipsets.
pub struct MockNodeApi {
    state: Mutex<State>,
}

impl MockNodeApi {
    pub fn with_head(head: ChainEpoch) -> Self {
        Self {
            state: Mutex::new(State {
                head,
                null_rounds: HashSet::new(),
                failing_tipsets: HashSet::new(),
                hang_head: false,
                parent_messages: HashMap::new(),
                sectors: HashMap::new(),
                dropped_precommits: HashSet::new(),
                market_deals: HashMap::new(),
                local_deals: Vec::new(),
                local: HashSet::new(),
                fail_has_local: false,
                query_status: HashMap::new(),
                failing_providers: HashSet::new(),
                queries: Vec::new(),
                local_offers: HashSet::new(),
                peer_id: Some("12D3KooWGzxzKZYveHXtpG6AsrUJBcWxHBFS2HsEoGTxrMLvKXtf".into()),
                deals: HashMap::new(),
                started: Vec::new(),
                failing_starts: HashSet::new(),
                sync: SyncStatus::default(),
                calls: HashMap::new(),
            }),
        }
    }

    fn record(&self, method: &'static str) {
        *self.state.lock().calls.entry(method).or_default() += 1;
    }

    pub fn calls(&self, method: &str) -> usize {
        self.state.lock().calls.get(method).copied().unwrap_or_default()
    }

    /// Snapshot of the per-method call counters.
    pub fn call_counts(&self) -> HashMap<&'static str, usize> {
        self.state.lock().calls.clone()
    }

    pub fn set_head(&self, head: ChainEpoch) {
        self.state.lock().head = head;
    }

    /// Makes `chain_head` block forever.
    pub fn hang_head(&self) {
        self.state.lock().hang_head = true;
    }

    pub fn set_null_round(&self, epoch: ChainEpoch) {
        self.state.lock().null_rounds.insert(epoch);
    }

    pub fn fail_tipset_at(&self, epoch: ChainEpoch) {
        self.state.lock().failing_tipsets.insert(epoch);
    }

    pub fn heal_tipset_at(&self, epoch: ChainEpoch) {
        self.state.lock().failing_tipsets.remove(&epoch);
    }

    /// Places a `ProveCommitSector` message among the parent messages of the
    /// tipset at `epoch`, sealing `deals` of `(deal id, piece, sector start
    /// epoch)` into `sector` of `provider`.
    pub fn add_prove_commit(
        &self,
        epoch: ChainEpoch,
        provider: Address,
        sector: SectorNumber,
        deals: Vec<(DealID, Cid, ChainEpoch)>,
    ) {
        let mut state = self.state.lock();
        let mut deal_ids = Vec::with_capacity(deals.len());
        for (deal_id, piece, start) in deals {
            state
                .market_deals
                .insert(deal_id, market_deal(piece, provider, start));
            deal_ids.push(deal_id);
        }
        state.sectors.insert((provider, sector), deal_ids);
        state
            .parent_messages
            .entry(block_cid(epoch))
            .or_default()
            .push(prove_commit(provider, Some(sector)));
    }

    pub fn add_parent_message(&self, epoch: ChainEpoch, msg: ApiMessage) {
        self.state
            .lock()
            .parent_messages
            .entry(block_cid(epoch))
            .or_default()
            .push(msg);
    }

    /// Forgets the pre-commit of a sector so that only its sector info is
    /// left on chain.
    pub fn drop_precommit(&self, provider: Address, sector: SectorNumber) {
        self.state
            .lock()
            .dropped_precommits
            .insert((provider, sector));
    }

    pub fn add_local_deal(&self, piece: Cid, state: StorageDealStatus) {
        let mut st = self.state.lock();
        let n = st.local_deals.len();
        st.local_deals.push(DealInfo {
            proposal_cid: cid_of(format!("local-deal-{n}").as_bytes()),
            state,
            message: String::new(),
            provider: Address::new_id(4000),
            piece_cid: piece,
            size: 2048,
            deal_id: 0,
        });
    }

    pub fn set_local(&self, root: Cid) {
        self.state.lock().local.insert(root);
    }

    pub fn fail_has_local(&self) {
        self.state.lock().fail_has_local = true;
    }

    pub fn set_query_status(&self, provider: Address, status: QueryResponseStatus) {
        self.state.lock().query_status.insert(provider, status);
    }

    pub fn fail_queries_to(&self, provider: Address) {
        self.state.lock().failing_providers.insert(provider);
    }

    /// Every retrieval query attempted so far, failed ones included.
    pub fn queries(&self) -> Vec<(Cid, Address)> {
        self.state.lock().queries.clone()
    }

    /// Makes the local miner report an offer for `root`.
    pub fn set_local_offer(&self, root: Cid) {
        self.state.lock().local_offers.insert(root);
    }

    pub fn set_miner_peer_id(&self, peer_id: Option<String>) {
        self.state.lock().peer_id = peer_id;
    }

    pub fn set_deal_state(&self, proposal: Cid, status: StorageDealStatus) {
        if let Some(deal) = self.state.lock().deals.get_mut(&proposal) {
            deal.state = status;
        }
    }

    pub fn fail_start_deal_for(&self, root: Cid) {
        self.state.lock().failing_starts.insert(root);
    }

    pub fn started_deals(&self) -> Vec<StartDealParams> {
        self.state.lock().started.clone()
    }

    pub fn set_sync(&self, sync: SyncStatus) {
        self.state.lock().sync = sync;
    }
}

#[async_trait]
impl NodeApi for MockNodeApi {
    async fn chain_head(&self) -> anyhow::Result<Tipset> {
        self.record("chain_head");
        let (head, hang) = {
            let state = self.state.lock();
            (state.head, state.hang_head)
        };
        if hang {
            std::future::pending::<()>().await;
        }
        Ok(tipset_at(head))
    }

    async fn chain_get_tipset_by_height(&self, height: ChainEpoch) -> anyhow::Result<Tipset> {
        self.record("chain_get_tipset_by_height");
        let state = self.state.lock();
        anyhow::ensure!(
            !state.failing_tipsets.contains(&height),
            "failed to load tipset at {height}"
        );
        anyhow::ensure!(height <= state.head, "height {height} is in the future");
        let mut epoch = height;
        while state.null_rounds.contains(&epoch) {
            epoch += 1;
        }
        Ok(tipset_at(epoch))
    }

    async fn chain_get_parent_messages(&self, block: &Cid) -> anyhow::Result<Vec<ApiMessage>> {
        self.record("chain_get_parent_messages");
        Ok(self
            .state
            .lock()
            .parent_messages
            .get(block)
            .cloned()
            .unwrap_or_default())
    }

    async fn state_sector_precommit_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<Option<SectorPreCommitOnChainInfo>> {
        self.record("state_sector_precommit_info");
        let state = self.state.lock();
        if state.dropped_precommits.contains(&(*miner, sector)) {
            return Ok(None);
        }
        Ok(state
            .sectors
            .get(&(*miner, sector))
            .map(|deal_ids| SectorPreCommitOnChainInfo {
                info: SectorPreCommitInfo {
                    sector_number: sector,
                    sealed_cid: cid_of(b"sealed"),
                    seal_rand_epoch: 0,
                    deal_ids: deal_ids.clone(),
                    expiration: 100_000,
                },
                pre_commit_epoch: 0,
            }))
    }

    async fn state_sector_get_info(
        &self,
        miner: &Address,
        sector: SectorNumber,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<Option<SectorOnChainInfo>> {
        self.record("state_sector_get_info");
        Ok(self
            .state
            .lock()
            .sectors
            .get(&(*miner, sector))
            .map(|deal_ids| SectorOnChainInfo {
                sector_number: sector,
                sealed_cid: cid_of(b"sealed"),
                deal_ids: deal_ids.clone(),
                activation: 0,
                expiration: 100_000,
            }))
    }

    async fn state_market_storage_deal(
        &self,
        deal_id: DealID,
        _tsk: &TipsetKey,
    ) -> anyhow::Result<MarketDeal> {
        self.record("state_market_storage_deal");
        self.state
            .lock()
            .market_deals
            .get(&deal_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("deal {deal_id} not found"))
    }

    async fn client_list_deals(&self) -> anyhow::Result<Vec<DealInfo>> {
        self.record("client_list_deals");
        Ok(self.state.lock().local_deals.clone())
    }

    async fn client_has_local(&self, root: &Cid) -> anyhow::Result<bool> {
        self.record("client_has_local");
        let state = self.state.lock();
        anyhow::ensure!(!state.fail_has_local, "blockstore unavailable");
        Ok(state.local.contains(root))
    }

    async fn client_query(&self, root: &Cid, provider: &Address) -> anyhow::Result<QueryResponse> {
        self.record("client_query");
        let mut state = self.state.lock();
        state.queries.push((*root, *provider));
        anyhow::ensure!(
            !state.failing_providers.contains(provider),
            "failed to dial {provider}"
        );
        Ok(QueryResponse {
            status: state
                .query_status
                .get(provider)
                .copied()
                .unwrap_or(QueryResponseStatus::Success),
            message: String::new(),
            size: 2048,
        })
    }

    async fn client_miner_query_offer(
        &self,
        miner: &Address,
        root: &Cid,
    ) -> anyhow::Result<QueryOffer> {
        self.record("client_miner_query_offer");
        let available = self.state.lock().local_offers.contains(root);
        Ok(QueryOffer {
            err: if available {
                String::new()
            } else {
                "retrieval query offer errored: not found".into()
            },
            root: *root,
            size: 2048,
            miner: *miner,
        })
    }

    async fn state_miner_info(&self, miner: &Address) -> anyhow::Result<MinerInfo> {
        self.record("state_miner_info");
        Ok(MinerInfo {
            owner: *miner,
            worker: *miner,
            peer_id: self.state.lock().peer_id.clone(),
            sector_size: 2048,
        })
    }

    async fn client_start_deal(&self, params: &StartDealParams) -> anyhow::Result<Cid> {
        self.record("client_start_deal");
        let mut state = self.state.lock();
        anyhow::ensure!(
            !state.failing_starts.contains(&params.data.root),
            "deal proposal rejected by {}",
            params.miner
        );
        let proposal = cid_of(format!("proposal-{}", state.started.len()).as_bytes());
        state.started.push(params.clone());
        state.deals.insert(
            proposal,
            Deal {
                params: params.clone(),
                state: StorageDealStatus::StartDataTransfer,
            },
        );
        Ok(proposal)
    }

    async fn client_get_deal_info(&self, proposal: &Cid) -> anyhow::Result<DealInfo> {
        self.record("client_get_deal_info");
        let state = self.state.lock();
        let deal = state
            .deals
            .get(proposal)
            .ok_or_else(|| anyhow::anyhow!("unknown deal {proposal}"))?;
        Ok(DealInfo {
            proposal_cid: *proposal,
            state: deal.state,
            message: String::new(),
            provider: deal.params.miner,
            piece_cid: deal.params.data.piece_cid.unwrap_or(deal.params.data.root),
            size: deal.params.data.piece_size,
            deal_id: 0,
        })
    }

    async fn sync_state(&self) -> anyhow::Result<SyncStatus> {
        self.record("sync_state");
        Ok(self.state.lock().sync.clone())
    }
}
