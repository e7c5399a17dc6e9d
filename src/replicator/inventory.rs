// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::num::NonZeroUsize;

use cid::Cid;
use hashlink::LruCache;

use crate::market::{DealProposal, DealState, MarketDeal, PublishStorageDataRef, QueryResponse};
use crate::shim::{address::Address, deal::DealID};

/// Pieces of interest, keyed by piece CID.
pub type PieceInventory = BoundedMap<PieceEntry>;
/// Last retrieval query response of every piece whose retrieval is pending.
pub type RetrievalSet = BoundedMap<QueryResponse>;
/// Proposal CID of the last deal this node started for a piece.
pub type DealSet = BoundedMap<Cid>;

/// A map keyed by piece CID holding at most `capacity` entries. Inserting a
/// new key into a full map evicts the least recently used entry.
#[derive(Debug)]
pub struct BoundedMap<V> {
    inner: LruCache<Cid, V>,
}

impl<V> BoundedMap<V> {
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            inner: LruCache::new(capacity.get()),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&mut self, key: &Cid) -> bool {
        self.inner.contains_key(key)
    }

    pub fn get(&mut self, key: &Cid) -> Option<&V> {
        self.inner.get(key)
    }

    pub fn get_mut(&mut self, key: &Cid) -> Option<&mut V> {
        self.inner.get_mut(key)
    }

    pub fn insert(&mut self, key: Cid, value: V) -> Option<V> {
        self.inner.insert(key, value)
    }

    pub fn remove(&mut self, key: &Cid) -> Option<V> {
        self.inner.remove(key)
    }

    /// Snapshot of the current keys, least recently used first. Iterating the
    /// snapshot leaves the map free to be mutated.
    pub fn keys(&self) -> Vec<Cid> {
        self.inner.iter().map(|(k, _)| *k).collect()
    }
}

/// One on-chain deal for a piece of interest, stored by some other provider.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DealRecord {
    pub deal_id: DealID,
    pub proposal: DealProposal,
    pub data_ref: PublishStorageDataRef,
    pub state: DealState,
    /// Failed retrieval queries against this record's provider.
    pub try_count: u64,
}

impl DealRecord {
    pub fn new(deal_id: DealID, deal: MarketDeal) -> Self {
        Self {
            deal_id,
            proposal: deal.proposal,
            data_ref: deal.data_ref,
            state: deal.state,
            try_count: 0,
        }
    }

    pub fn provider(&self) -> &Address {
        &self.proposal.provider
    }

    pub fn root(&self) -> &Cid {
        &self.data_ref.root_cid
    }

    /// Whether the provider should be able to serve this piece: the deal has
    /// an ID and is active in a proven sector.
    pub fn is_retrievable(&self) -> bool {
        self.deal_id > 0 && self.state.is_active()
    }
}

/// A piece of interest together with every known deal storing it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PieceEntry {
    records: Vec<DealRecord>,
}

impl PieceEntry {
    pub fn new(record: DealRecord) -> Self {
        Self {
            records: vec![record],
        }
    }

    pub fn records(&self) -> &[DealRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [DealRecord] {
        &mut self.records
    }

    pub fn contains_deal(&self, deal_id: DealID) -> bool {
        self.records.iter().any(|r| r.deal_id == deal_id)
    }

    /// Appends `record` unless a record with the same deal ID is already
    /// known. Returns `true` if the record was added.
    pub fn add(&mut self, record: DealRecord) -> bool {
        if self.contains_deal(record.deal_id) {
            return false;
        }
        self.records.push(record);
        true
    }

    /// Payload reference of the piece, taken from its first known deal.
    pub fn data_ref(&self) -> Option<&PublishStorageDataRef> {
        self.records.first().map(|r| &r.data_ref)
    }

    /// Indices of the records that can currently be retrieved from.
    pub fn retrievable(&self) -> Vec<usize> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_retrievable())
            .map(|(i, _)| i)
            .collect()
    }
}
