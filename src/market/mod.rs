// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

//! Storage and retrieval market types as seen through the node API.

use cid::Cid;

use crate::shim::{address::Address, clock::ChainEpoch, deal::DealID};

/// An on-chain deal proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealProposal {
    pub piece_cid: Cid,
    pub piece_size: u64,
    pub verified_deal: bool,
    pub client: Address,
    pub provider: Address,
    pub label: String,
    pub start_epoch: ChainEpoch,
    pub end_epoch: ChainEpoch,
}

/// Market actor bookkeeping for a published deal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DealState {
    /// `-1` if not yet included in a proven sector.
    pub sector_start_epoch: ChainEpoch,
    /// `-1` if deal state never updated.
    pub last_updated_epoch: ChainEpoch,
    /// `-1` if deal never slashed.
    pub slash_epoch: ChainEpoch,
}

impl DealState {
    /// Whether the deal has been activated in a proven sector.
    pub fn is_active(&self) -> bool {
        self.sector_start_epoch > 0
    }
}

/// Reference to the payload that was published alongside a deal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublishStorageDataRef {
    /// Root of the payload DAG.
    pub root_cid: Cid,
    pub expert: String,
}

/// A deal as returned by `StateMarketStorageDeal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarketDeal {
    pub proposal: DealProposal,
    pub state: DealState,
    pub data_ref: PublishStorageDataRef,
}

/// Client side states of a storage deal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum StorageDealStatus {
    Unknown,
    ProposalNotFound,
    ProposalRejected,
    ProposalAccepted,
    Staged,
    Sealing,
    Finalizing,
    Active,
    Expired,
    Slashed,
    Rejecting,
    Failing,
    FundsReserved,
    CheckForAcceptance,
    Validating,
    AcceptWait,
    StartDataTransfer,
    Transferring,
    WaitingForData,
    VerifyData,
    ReserveProviderFunds,
    ReserveClientFunds,
    ProviderFunding,
    ClientFunding,
    Publish,
    Publishing,
    Error,
    ProviderTransferAwaitRestart,
    ClientTransferRestart,
    AwaitingPreCommit,
}

impl StorageDealStatus {
    /// States from which a deal will never become active. A piece whose deal
    /// ended in one of these is eligible for another attempt.
    pub fn is_terminal_failure(&self) -> bool {
        matches!(
            self,
            Self::ProposalNotFound | Self::ProposalRejected | Self::Failing | Self::Error
        )
    }
}

/// A client deal tracked by the local node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealInfo {
    pub proposal_cid: Cid,
    pub state: StorageDealStatus,
    pub message: String,
    pub provider: Address,
    pub piece_cid: Cid,
    pub size: u64,
    pub deal_id: DealID,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum TransferType {
    #[strum(to_string = "graphsync")]
    GraphSync,
    #[strum(to_string = "manual")]
    Manual,
}

/// Describes the payload a client wants to store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataRef {
    pub transfer_type: TransferType,
    pub root: Cid,
    /// Optional for non-manual transfers.
    pub piece_cid: Option<Cid>,
    pub piece_size: u64,
    pub expert: String,
}

/// Parameters of `ClientStartDeal`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StartDealParams {
    pub data: DataRef,
    /// `None` selects the node's default wallet.
    pub wallet: Option<Address>,
    pub miner: Address,
    pub fast_retrieval: bool,
    pub verified_deal: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum QueryResponseStatus {
    /// The provider has the payload and will serve it.
    Success,
    Unavailable,
    Error,
}

/// Answer of a storage provider to a retrieval query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryResponse {
    pub status: QueryResponseStatus,
    pub message: String,
    pub size: u64,
}

/// Retrieval offer of a single miner, as returned by `ClientMinerQueryOffer`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueryOffer {
    /// Empty when the miner can serve the root.
    pub err: String,
    pub root: Cid,
    pub size: u64,
    pub miner: Address,
}

impl QueryOffer {
    pub fn is_available(&self) -> bool {
        self.err.is_empty()
    }
}
