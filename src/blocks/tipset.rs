// Copyright 2019-2026 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use std::fmt;

use cid::Cid;
use itertools::Itertools as _;

use super::Error;
use crate::shim::clock::ChainEpoch;

/// A set of CIDs forming a unique key for a tipset.
/// Equal keys will have equivalent iteration order, but note that the CIDs
/// are *not* maintained in the same order as the canonical iteration order
/// of blocks in a tipset (which is by ticket).
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, derive_more::From, derive_more::Into)]
pub struct TipsetKey(Vec<Cid>);

impl TipsetKey {
    /// The empty key, which node APIs interpret as "the current head".
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn cids(&self) -> &[Cid] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TipsetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(","))
    }
}

/// An immutable set of blocks at the same height with the same parent set.
/// Blocks in a tipset are canonically ordered by ticket size.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tipset {
    key: TipsetKey,
    epoch: ChainEpoch,
    parents: TipsetKey,
}

impl Tipset {
    /// Builds a tipset from the CIDs of its blocks. Fails if `blocks` is empty.
    pub fn new(
        blocks: impl Into<TipsetKey>,
        epoch: ChainEpoch,
        parents: impl Into<TipsetKey>,
    ) -> Result<Self, Error> {
        let key = blocks.into();
        if key.is_empty() {
            return Err(Error::NoBlocks);
        }
        Ok(Self {
            key,
            epoch,
            parents: parents.into(),
        })
    }

    /// Returns the epoch of the tipset.
    pub fn epoch(&self) -> ChainEpoch {
        self.epoch
    }

    pub fn key(&self) -> &TipsetKey {
        &self.key
    }

    /// Returns the CIDs of the blocks in this tipset, in canonical order.
    pub fn cids(&self) -> &[Cid] {
        self.key.cids()
    }

    /// The first block in canonical order. Parent messages of a tipset are
    /// queried through this block.
    pub fn first_block(&self) -> Option<&Cid> {
        self.key.cids().first()
    }

    /// Returns the key of the parent tipset.
    pub fn parents(&self) -> &TipsetKey {
        &self.parents
    }
}
